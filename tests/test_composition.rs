//! Tests for class construction: member merging, the parent chain and the
//! initializer cascade.

extern crate modkit;

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use modkit::ds::definition::{Definition, MixinRef};
use modkit::ds::error::CoreError;
use modkit::ds::value::Value;
use modkit::registry::Registry;

type Trace = Rc<RefCell<Vec<&'static str>>>;

fn tracing_definition(trace: &Trace, label: &'static str) -> Definition {
    let trace = trace.clone();
    Definition::new().with_initializer(move |_, _| {
        trace.borrow_mut().push(label);
        Ok(())
    })
}

fn map_of(entries: &[(&str, Value)]) -> Value {
    let mut m = IndexMap::new();
    for (k, v) in entries {
        m.insert(k.to_string(), v.clone());
    }
    Value::Map(m)
}

// ============================================================================
// member merging
// ============================================================================

mod merge_tests {
    use super::*;

    #[test]
    fn identity_composition_preserves_all_members() {
        let registry = Registry::new();
        let class = registry.build_class(
            Definition::new()
                .add_member("name", "widget")
                .add_member("count", 0i64)
                .add_method("noop", |_, _| Ok(Value::Undefined)),
        );
        let instance = class.new_instance(&[]).unwrap();
        assert_eq!(instance.get("name"), Value::from("widget"));
        assert_eq!(instance.get("count"), Value::Int(0));
        assert!(instance.get("noop").is_callable());
    }

    #[test]
    fn base_member_wins_for_any_mixin_order() {
        let registry = Registry::new();
        for flipped in &[false, true] {
            let shadow = Definition::new().add_member("m", "mixin");
            let other = Definition::new().add_member("unrelated", 1i64);
            let mut base = Definition::new().add_member("m", "base");
            base = if *flipped {
                base.with_mixin(other).with_mixin(shadow)
            } else {
                base.with_mixin(shadow).with_mixin(other)
            };
            let class = registry.build_class(base);
            assert_eq!(class.member("m"), Some(Value::from("base")));
        }
    }

    #[test]
    fn container_defaults_are_not_shared_between_instances() {
        let registry = Registry::new();
        let class = registry.build_class(
            Definition::new().add_member("options", map_of(&[("interval", Value::Int(50))])),
        );
        let a = class.new_instance(&[]).unwrap();
        let b = class.new_instance(&[]).unwrap();

        a.set("options", map_of(&[("interval", Value::Int(10))]));
        assert_eq!(a.get("options").path("interval"), Value::Int(10));
        assert_eq!(b.get("options").path("interval"), Value::Int(50));
        // the prototype default is untouched as well
        assert_eq!(
            class.member("options").unwrap().path("interval"),
            Value::Int(50)
        );
    }

    #[test]
    fn named_mixins_resolve_through_the_registry() {
        let mut registry = Registry::new();
        registry.register(
            "countable",
            Definition::new().add_member("count", 0i64).add_method(
                "incr",
                |my, _| {
                    let next = my.get("count").as_int().unwrap_or(0) + 1;
                    my.set("count", next);
                    Ok(Value::Int(next))
                },
            ),
            false,
        );

        let class = registry.build_class(Definition::new().with_mixin_named("countable"));
        let instance = class.new_instance(&[]).unwrap();
        assert_eq!(instance.call("incr", &[]).unwrap(), Value::Int(1));
        assert_eq!(instance.call("incr", &[]).unwrap(), Value::Int(2));
        assert_eq!(instance.get("count"), Value::Int(2));
    }
}

// ============================================================================
// initializer cascade
// ============================================================================

mod cascade_tests {
    use super::*;

    #[test]
    fn mixin_initializers_run_in_reverse_append_order_base_last() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let registry = Registry::new();

        let base = {
            let t = trace.clone();
            Definition::new()
                .with_initializer(move |_, _| {
                    t.borrow_mut().push("base");
                    Ok(())
                })
                .with_mixin(tracing_definition(&trace, "m1"))
                .with_mixin(tracing_definition(&trace, "m2"))
        };
        registry.build_class(base).new_instance(&[]).unwrap();
        assert_eq!(*trace.borrow(), vec!["m2", "m1", "base"]);
    }

    #[test]
    fn cascade_order_holds_for_longer_chains() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let registry = Registry::new();

        let mut base = {
            let t = trace.clone();
            Definition::new().with_initializer(move |_, _| {
                t.borrow_mut().push("base");
                Ok(())
            })
        };
        for label in &["m1", "m2", "m3", "m4"] {
            base = base.with_mixin(tracing_definition(&trace, *label));
        }
        registry.build_class(base).new_instance(&[]).unwrap();
        assert_eq!(*trace.borrow(), vec!["m4", "m3", "m2", "m1", "base"]);
    }

    #[test]
    fn nested_class_mixin_cascades_depth_first_then_reruns_its_own_slot() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();

        let inner = registry.build_class(tracing_definition(&trace, "c1"));
        registry.register("inner", inner, false);

        let base = {
            let t = trace.clone();
            Definition::new()
                .with_initializer(move |_, _| {
                    t.borrow_mut().push("base");
                    Ok(())
                })
                .with_mixin_named("inner")
        };
        registry.build_class(base).new_instance(&[]).unwrap();
        // The nested class's base initializer runs from its own chain and
        // again from its prototype slot, before the outer base runs last.
        assert_eq!(*trace.borrow(), vec!["c1", "c1", "base"]);
    }

    #[test]
    fn constructor_args_reach_every_initializer() {
        let registry = Registry::new();
        let mixin = Definition::new().with_initializer(|my, args| {
            my.set("seen_by_mixin", args[0].clone());
            Ok(())
        });
        let class = registry.build_class(
            Definition::new()
                .with_initializer(|my, args| {
                    my.set("seen_by_base", args[0].clone());
                    Ok(())
                })
                .with_mixin(mixin),
        );
        let instance = class.new_instance(&[Value::Int(42)]).unwrap();
        assert_eq!(instance.get("seen_by_mixin"), Value::Int(42));
        assert_eq!(instance.get("seen_by_base"), Value::Int(42));
    }

    #[test]
    fn failing_initializer_aborts_the_remaining_cascade() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let registry = Registry::new();

        let failing = Definition::new().with_initializer(|_, _| Err(CoreError::msg("broken")));
        let base = {
            let t = trace.clone();
            Definition::new()
                .with_initializer(move |_, _| {
                    t.borrow_mut().push("base");
                    Ok(())
                })
                .with_mixin(tracing_definition(&trace, "m1"))
                .with_mixin(failing)
        };
        let result = registry.build_class(base).new_instance(&[]);
        assert!(result.is_err());
        // m2 (the failing one) ran first and aborted everything after it.
        assert!(trace.borrow().is_empty());
    }

    #[test]
    fn base_initializer_sees_state_established_by_mixins() {
        let registry = Registry::new();
        let mixin = Definition::new().with_initializer(|my, _| {
            my.set("prepared", true);
            Ok(())
        });
        let class = registry.build_class(
            Definition::new()
                .with_initializer(|my, _| {
                    assert_eq!(my.get("prepared"), Value::Bool(true));
                    my.set("prepared", Value::from("overridden"));
                    Ok(())
                })
                .with_mixin(mixin),
        );
        let instance = class.new_instance(&[]).unwrap();
        assert_eq!(instance.get("prepared"), Value::from("overridden"));
    }
}

// ============================================================================
// post-construction extend
// ============================================================================

mod extend_tests {
    use super::*;

    #[test]
    fn extend_affects_future_instances() {
        let trace: Trace = Rc::new(RefCell::new(Vec::new()));
        let registry = Registry::new();

        let class = registry.build_class({
            let t = trace.clone();
            Definition::new().with_initializer(move |_, _| {
                t.borrow_mut().push("base");
                Ok(())
            })
        });

        class.new_instance(&[]).unwrap();
        assert_eq!(*trace.borrow(), vec!["base"]);

        trace.borrow_mut().clear();
        class.extend(
            &registry,
            MixinRef::Inline(Rc::new(
                tracing_definition(&trace, "late").add_member("added", 1i64),
            )),
            false,
        );

        let instance = class.new_instance(&[]).unwrap();
        // the appended entry is walked first in the reverse cascade
        assert_eq!(*trace.borrow(), vec!["late", "base"]);
        assert_eq!(instance.get("added"), Value::Int(1));
    }

    #[test]
    fn extend_by_registered_name() {
        let mut registry = Registry::new();
        registry.register(
            "labelled",
            Definition::new().add_member("label", "tag"),
            false,
        );
        let class = registry.build_class(Definition::new());
        class.extend(&registry, MixinRef::Named("labelled".to_string()), false);
        assert_eq!(class.member("label"), Some(Value::from("tag")));
    }
}
