//! # modkit - a named-module registry and mixin composition engine
//!
//! A minimal object-composition runtime:
//! - A **module registry** mapping names to plain values, blueprint
//!   definitions or composed classes, with lookup, instantiation and a
//!   singleton-instance cache
//! - A **composition engine** building classes from a base definition plus
//!   an ordered list of mixins, with first-registered-wins member merging at
//!   definition time and an independent initializer cascade at instantiation
//!   time
//! - A **binding helper** giving instances stable-receiver methods that can
//!   be passed around as bare values
//!
//! ## Quick Start
//!
//! ### Registering and resolving modules
//!
//! ```
//! use modkit::ds::value::Value;
//! use modkit::registry::{Module, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register("greeting", Value::from("hello"), false);
//!
//! match registry.lookup("greeting") {
//!     Some(Module::Value(v)) => assert_eq!(v.as_str(), Some("hello")),
//!     _ => panic!("expected a value module"),
//! }
//! ```
//!
//! ### Composing a class from mixins
//!
//! ```
//! use modkit::ds::definition::Definition;
//! use modkit::ds::value::Value;
//! use modkit::registry::Registry;
//!
//! let mut registry = Registry::new();
//!
//! // A reusable mixin, registered under a name.
//! registry.register(
//!     "greeter",
//!     Definition::new()
//!         .add_member("name", "world")
//!         .add_method("greet", |my, _args| {
//!             let name = my.get("name");
//!             Ok(Value::from(format!("hello, {}", name.as_str().unwrap_or(""))))
//!         }),
//!     false,
//! );
//!
//! // A class mixing it in. The mixin's initializer (if any) runs before the
//! // base definition's own.
//! let class = registry.build_class(
//!     Definition::new()
//!         .with_initializer(|my, _args| {
//!             my.set("ready", true);
//!             Ok(())
//!         })
//!         .with_mixin_named("greeter"),
//! );
//!
//! let instance = class.new_instance(&[]).unwrap();
//! assert_eq!(instance.get("ready"), Value::Bool(true));
//! assert_eq!(
//!     instance.call("greet", &[]).unwrap(),
//!     Value::from("hello, world"),
//! );
//! ```
//!
//! ## Composition contract
//!
//! A [`ds::definition::Definition`] bundles ordinary members (data and
//! methods) with a reserved vocabulary the engine honours: an *initializer*
//! run once per instance, a *mixins* list of further definitions or
//! registered names, and a *bound* list naming members that need
//! stable-receiver binding.
//!
//! Building a class merges members under a deterministic precedence rule:
//! the base definition always wins, and earlier mixins win over later ones.
//! Initializers are deliberately excluded from that merge; instead every
//! contributing blueprint is kept on the class's parent chain, and
//! instantiation walks that chain in reverse so mixin setup runs first and
//! the base definition's setup runs last, over state the mixins already
//! established. A failing initializer aborts instantiation; a partially
//! initialized instance is never handed out.
//!
//! ## Architecture
//!
//! - **[`ds`]** - Data structures (dynamic values, definitions, instances,
//!   errors)
//! - **[`compose`]** - The composition engine (classes, merge policies, the
//!   initializer cascade, the shipped base-capability mixin)
//! - **[`registry`]** - The named-module registry and instance cache

pub mod compose;
pub mod ds;
pub mod registry;
