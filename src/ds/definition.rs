use std::rc::Rc;

use indexmap::IndexMap;

use crate::ds::error::CoreError;
use crate::ds::instance::Instance;
use crate::ds::value::{Method, Value};

/// Signature of a per-blueprint setup function, run once per instance.
pub type Initializer = Rc<dyn Fn(&Instance, &[Value]) -> Result<(), CoreError>>;

/// One source to merge into a class: either a literal blueprint or the name
/// of a registered module, resolved against the registry at composition time.
pub enum MixinRef {
    Inline(Rc<Definition>),
    Named(String),
}

impl Clone for MixinRef {
    fn clone(&self) -> Self {
        match self {
            MixinRef::Inline(d) => MixinRef::Inline(d.clone()),
            MixinRef::Named(n) => MixinRef::Named(n.to_string()),
        }
    }
}

/// A blueprint: ordinary members plus the reserved composition vocabulary.
///
/// The reserved parts (`initializer`, `mixins`) are separate typed fields
/// rather than magic member names, so they can never collide with ordinary
/// members and are never promoted into a merged prototype. The `bound` list
/// names the members that require stable-receiver binding; the shipped
/// base-capability mixin binds them on every new instance.
///
/// A definition is never mutated after being handed to the engine; the
/// builder methods below consume and return `self`.
pub struct Definition {
    members: IndexMap<String, Value>,
    initializer: Option<Initializer>,
    mixins: Vec<MixinRef>,
    bound: Vec<String>,
}

impl Definition {
    pub fn new() -> Self {
        Definition {
            members: IndexMap::new(),
            initializer: None,
            mixins: Vec::new(),
            bound: Vec::new(),
        }
    }

    /// Add an ordinary data member.
    pub fn add_member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), value.into());
        self
    }

    /// Add a native method member.
    pub fn add_method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&Instance, &[Value]) -> Result<Value, CoreError> + 'static,
    ) -> Self {
        self.members.insert(name.into(), Value::Method(Method::native(func)));
        self
    }

    /// Add a native method member and mark it for stable-receiver binding.
    pub fn bound_method(
        self,
        name: impl Into<String>,
        func: impl Fn(&Instance, &[Value]) -> Result<Value, CoreError> + 'static,
    ) -> Self {
        let name = name.into();
        self.add_method(name.clone(), func).bind_member(name)
    }

    /// Mark a member as requiring stable-receiver binding.
    pub fn bind_member(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.bound.contains(&name) {
            self.bound.push(name);
        }
        self
    }

    /// Set the setup function run once per instance.
    pub fn with_initializer(
        mut self,
        func: impl Fn(&Instance, &[Value]) -> Result<(), CoreError> + 'static,
    ) -> Self {
        self.initializer = Some(Rc::new(func));
        self
    }

    /// Mix in a literal blueprint.
    pub fn with_mixin(mut self, definition: Definition) -> Self {
        self.mixins.push(MixinRef::Inline(Rc::new(definition)));
        self
    }

    /// Mix in a registered module by name.
    pub fn with_mixin_named(mut self, name: impl Into<String>) -> Self {
        self.mixins.push(MixinRef::Named(name.into()));
        self
    }

    pub fn members(&self) -> &IndexMap<String, Value> {
        &self.members
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }

    pub fn mixins(&self) -> &[MixinRef] {
        &self.mixins
    }

    pub fn bound_members(&self) -> &[String] {
        &self.bound
    }
}

impl Default for Definition {
    fn default() -> Self {
        Self::new()
    }
}
