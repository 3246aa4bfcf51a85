use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::compose::base;
use crate::ds::definition::{Definition, Initializer, MixinRef};
use crate::ds::error::CoreError;
use crate::ds::instance::Instance;
use crate::ds::value::Value;
use crate::registry::{Module, Registry};

/// The flat, conflict-resolved member mapping of a built class.
///
/// The `initializer` slot is populated only by overwrite merges (the base
/// definition at construction, or a later `extend` with overwrite). The
/// top-level cascade never reads it directly; it is consulted when this
/// class is itself used as a mixin of another class.
pub(crate) struct Prototype {
    members: IndexMap<String, Value>,
    initializer: Option<Initializer>,
    bound: Vec<String>,
}

/// One entry of a class's parent chain: a raw blueprint, or a previously
/// built class whose own chain is walked recursively during the cascade.
pub enum Parent {
    Blueprint(Rc<Definition>),
    Class(Class),
}

impl Clone for Parent {
    fn clone(&self) -> Self {
        match self {
            Parent::Blueprint(d) => Parent::Blueprint(d.clone()),
            Parent::Class(c) => Parent::Class(c.clone()),
        }
    }
}

enum Source {
    Blueprint(Rc<Definition>),
    Class(Class),
}

struct ClassState {
    proto: RefCell<Prototype>,
    parents: RefCell<Vec<Parent>>,
}

/// An invocable composed type: a merged prototype plus the ordered parent
/// chain of the blueprints that contributed to it.
///
/// The two are kept distinct on purpose: merging never promotes a mixin's
/// initializer into the prototype, so the chain is the only place each
/// blueprint's setup logic survives for the instantiation cascade.
///
/// The handle is reference counted; clones refer to the same class.
pub struct Class(Rc<ClassState>);

impl Class {
    fn empty() -> Class {
        Class(Rc::new(ClassState {
            proto: RefCell::new(Prototype {
                members: IndexMap::new(),
                initializer: None,
                bound: Vec::new(),
            }),
            parents: RefCell::new(Vec::new()),
        }))
    }

    /// Build a class from a base definition.
    ///
    /// The base definition is merged with overwrite (the only merge allowed
    /// to carry an initializer into the prototype slot) and becomes the first
    /// parent-chain entry. The built-in base-capability mixin follows, then
    /// each entry of the definition's mixin list in order, all merged without
    /// overwrite so that earlier members always win.
    pub(crate) fn build(registry: &Registry, definition: Definition) -> Class {
        let class = Class::empty();
        let base_def = Rc::new(definition);
        class.merge_overwrite(
            base_def.members(),
            base_def.initializer().cloned(),
            base_def.bound_members(),
        );
        class.push_parent(Parent::Blueprint(base_def.clone()));

        let capability = base::capability();
        class.merge_masked(capability.members(), capability.bound_members());
        class.push_parent(Parent::Blueprint(capability));

        for mixin in base_def.mixins() {
            class.merge_from(registry, mixin.clone(), false);
        }
        class
    }

    /// Merge another definition or registered module into this class after
    /// construction. With `overwrite` the source deep-overwrites existing
    /// members (and may replace the prototype initializer slot); without it
    /// the usual first-registered-wins policy applies. Either way the source
    /// is appended to the parent chain, so its initializer participates in
    /// the cascade of future instances.
    pub fn extend(&self, registry: &Registry, source: MixinRef, overwrite: bool) -> &Self {
        self.merge_from(registry, source, overwrite);
        self
    }

    /// Produce a fresh instance and run the initializer cascade.
    ///
    /// The parent chain is walked in reverse append order; a nested class
    /// entry recurses into its own chain first (depth first, innermost
    /// first) and then runs its prototype initializer slot. The base
    /// definition's initializer therefore always runs last. A failing
    /// initializer aborts the remaining cascade and surfaces here; a
    /// partially initialized instance is never returned.
    pub fn new_instance(&self, args: &[Value]) -> Result<Instance, CoreError> {
        let instance = Instance::allocate(self);
        // Snapshot the chain so an initializer may extend this class
        // without invalidating the walk.
        let parents: Vec<Parent> = self.0.parents.borrow().clone();
        for parent in parents.iter().rev() {
            run_initializers(parent, &instance, args)?;
        }
        Ok(instance)
    }

    /// Look up a member of the merged prototype.
    pub fn member(&self, name: &str) -> Option<Value> {
        self.0.proto.borrow().members.get(name).cloned()
    }

    /// Member names of the merged prototype, in merge order.
    pub fn member_names(&self) -> Vec<String> {
        self.0.proto.borrow().members.keys().cloned().collect()
    }

    /// Members declared as requiring stable-receiver binding, merged across
    /// every contributing blueprint.
    pub fn bound_members(&self) -> Vec<String> {
        self.0.proto.borrow().bound.clone()
    }

    pub fn has_own_initializer(&self) -> bool {
        self.0.proto.borrow().initializer.is_some()
    }

    /// Number of parent-chain entries.
    pub fn parent_count(&self) -> usize {
        self.0.parents.borrow().len()
    }

    /// Whether two handles refer to the same class.
    pub fn same(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn members_snapshot(&self) -> Vec<(String, Value)> {
        self.0
            .proto
            .borrow()
            .members
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn proto_snapshot(&self) -> (IndexMap<String, Value>, Option<Initializer>, Vec<String>) {
        let proto = self.0.proto.borrow();
        (proto.members.clone(), proto.initializer.clone(), proto.bound.clone())
    }

    fn push_parent(&self, parent: Parent) {
        self.0.parents.borrow_mut().push(parent);
    }

    pub(crate) fn parents_snapshot(&self) -> Vec<Parent> {
        self.0.parents.borrow().clone()
    }

    fn merge_from(&self, registry: &Registry, source: MixinRef, overwrite: bool) {
        match resolve(registry, &source) {
            Some(Source::Blueprint(def)) => {
                if overwrite {
                    self.merge_overwrite(
                        def.members(),
                        def.initializer().cloned(),
                        def.bound_members(),
                    );
                } else {
                    self.merge_masked(def.members(), def.bound_members());
                }
                self.push_parent(Parent::Blueprint(def));
            }
            Some(Source::Class(other)) => {
                let (members, initializer, bound) = other.proto_snapshot();
                if overwrite {
                    self.merge_overwrite(&members, initializer, &bound);
                } else {
                    self.merge_masked(&members, &bound);
                }
                self.push_parent(Parent::Class(other));
            }
            // An unresolved mixin contributes zero members and zero
            // initializer; composition stays permissive.
            None => {}
        }
    }

    fn merge_overwrite(
        &self,
        members: &IndexMap<String, Value>,
        initializer: Option<Initializer>,
        bound: &[String],
    ) {
        let mut proto = self.0.proto.borrow_mut();
        for (name, value) in members {
            let merged_in_place = match (proto.members.get_mut(name), value) {
                (Some(Value::Map(existing)), Value::Map(incoming)) => {
                    deep_merge_map(existing, incoming);
                    true
                }
                _ => false,
            };
            if !merged_in_place {
                proto.members.insert(name.to_string(), value.clone());
            }
        }
        if let Some(initializer) = initializer {
            proto.initializer = Some(initializer);
        }
        merge_bound(&mut proto.bound, bound);
    }

    fn merge_masked(&self, members: &IndexMap<String, Value>, bound: &[String]) {
        let mut proto = self.0.proto.borrow_mut();
        for (name, value) in members {
            if proto.members.contains_key(name) {
                continue;
            }
            proto.members.insert(name.to_string(), value.clone());
        }
        merge_bound(&mut proto.bound, bound);
    }

    pub(crate) fn own_initializer(&self) -> Option<Initializer> {
        self.0.proto.borrow().initializer.clone()
    }
}

impl Clone for Class {
    fn clone(&self) -> Self {
        Class(self.0.clone())
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Class(members: {}, parents: {})",
            self.0.proto.borrow().members.len(),
            self.0.parents.borrow().len()
        )
    }
}

fn resolve(registry: &Registry, source: &MixinRef) -> Option<Source> {
    match source {
        MixinRef::Inline(def) => Some(Source::Blueprint(def.clone())),
        MixinRef::Named(name) => match registry.lookup(name) {
            Some(Module::Definition(def)) => Some(Source::Blueprint(def.clone())),
            Some(Module::Class(class)) => Some(Source::Class(class.clone())),
            Some(Module::Value(_)) => {
                registry.report(&format!("mixin '{}' is not a definition or class", name));
                None
            }
            None => {
                registry.report(&format!("mixin '{}' does not exist", name));
                None
            }
        },
    }
}

fn run_initializers(parent: &Parent, instance: &Instance, args: &[Value]) -> Result<(), CoreError> {
    match parent {
        Parent::Class(class) => {
            let nested = class.parents_snapshot();
            for entry in nested.iter().rev() {
                run_initializers(entry, instance, args)?;
            }
            if let Some(initializer) = class.own_initializer() {
                initializer(instance, args)?;
            }
        }
        Parent::Blueprint(def) => {
            if let Some(initializer) = def.initializer() {
                initializer(instance, args)?;
            }
        }
    }
    Ok(())
}

fn deep_merge_map(existing: &mut IndexMap<String, Value>, incoming: &IndexMap<String, Value>) {
    for (name, value) in incoming {
        let merged_in_place = match (existing.get_mut(name), value) {
            (Some(Value::Map(dst)), Value::Map(src)) => {
                deep_merge_map(dst, src);
                true
            }
            _ => false,
        };
        if !merged_in_place {
            existing.insert(name.to_string(), value.clone());
        }
    }
}

fn merge_bound(existing: &mut Vec<String>, incoming: &[String]) {
    for name in incoming {
        if !existing.contains(name) {
            existing.push(name.to_string());
        }
    }
}
