//! Named-module registry and instance cache.
//!
//! The registry is an explicit context object: create one with
//! [`Registry::new`] and hand references to whatever needs lookup or
//! require. There is no ambient global state.
//!
//! Everything here is single-owner, single-threaded state (`Rc`/`RefCell`
//! underneath, so none of these types are `Send`). Registration, require and
//! class building are plain synchronous read-modify-write sequences; callers
//! on a multi-threaded host must serialize access behind one exclusive
//! critical section.

use std::collections::HashMap;
use std::rc::Rc;

use crate::compose::class::Class;
use crate::ds::definition::Definition;
use crate::ds::error::CoreError;
use crate::ds::instance::Instance;
use crate::ds::value::Value;

/// A stored module: plain shared data, a blueprint, or a composed class.
///
/// Only a class is constructible; the other two are handed back as-is by
/// [`Registry::instantiate`], so data and utility modules can be registered
/// alongside classes and consumed uniformly.
pub enum Module {
    Value(Rc<Value>),
    Definition(Rc<Definition>),
    Class(Class),
}

impl Clone for Module {
    fn clone(&self) -> Self {
        match self {
            Module::Value(v) => Module::Value(v.clone()),
            Module::Definition(d) => Module::Definition(d.clone()),
            Module::Class(c) => Module::Class(c.clone()),
        }
    }
}

impl From<Value> for Module {
    fn from(value: Value) -> Self {
        Module::Value(Rc::new(value))
    }
}

impl From<Definition> for Module {
    fn from(definition: Definition) -> Self {
        Module::Definition(Rc::new(definition))
    }
}

impl From<Rc<Definition>> for Module {
    fn from(definition: Rc<Definition>) -> Self {
        Module::Definition(definition)
    }
}

impl From<Class> for Module {
    fn from(class: Class) -> Self {
        Module::Class(class)
    }
}

/// Result of resolving a module: an instance for class modules, the stored
/// value or blueprint unchanged for everything else.
pub enum Resolved {
    Value(Rc<Value>),
    Definition(Rc<Definition>),
    Instance(Instance),
}

impl Clone for Resolved {
    fn clone(&self) -> Self {
        match self {
            Resolved::Value(v) => Resolved::Value(v.clone()),
            Resolved::Definition(d) => Resolved::Definition(d.clone()),
            Resolved::Instance(i) => Resolved::Instance(i.clone()),
        }
    }
}

impl Resolved {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Resolved::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_definition(&self) -> Option<&Rc<Definition>> {
        match self {
            Resolved::Definition(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Resolved::Instance(i) => Some(i),
            _ => None,
        }
    }
}

/// Process-wide mapping from name to module, plus the per-name cache of the
/// most recently produced non-forced instance.
pub struct Registry {
    modules: HashMap<String, Module>,
    instances: HashMap<String, Resolved>,
    logging: bool,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            modules: HashMap::new(),
            instances: HashMap::new(),
            logging: false,
        }
    }

    /// Toggle diagnostic reporting. Disabled by default; when enabled,
    /// reported conditions are emitted through the `log` facade and never
    /// fail the reporting call.
    pub fn set_logging(&mut self, enabled: bool) -> &mut Self {
        self.logging = enabled;
        self
    }

    pub fn logging(&self) -> bool {
        self.logging
    }

    /// Store a module under a name.
    ///
    /// A duplicate name without `overwrite` leaves the store unchanged and
    /// reports a diagnostic; there is no failure signal by design, callers
    /// that care should [`lookup`](Registry::lookup) first.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        module: impl Into<Module>,
        overwrite: bool,
    ) -> &mut Self {
        let name = name.into();
        if self.modules.contains_key(&name) && !overwrite {
            self.report(&format!("module '{}' already exists", name));
        } else {
            self.modules.insert(name, module.into());
        }
        self
    }

    /// Find a module by name. Pure read; absent names yield `None`.
    pub fn lookup(&self, name: &str) -> Option<&Module> {
        self.modules.get(name)
    }

    /// Build a class from a definition, resolving its named mixins against
    /// this registry.
    pub fn build_class(&self, definition: Definition) -> Class {
        Class::build(self, definition)
    }

    /// Resolve a module to a usable object.
    ///
    /// A class module is invoked to produce a fresh instance (running its
    /// initializer cascade; a failing initializer surfaces here). Any other
    /// module is returned unchanged. An unregistered name is absence, not a
    /// failure.
    pub fn instantiate(&self, name: &str) -> Result<Option<Resolved>, CoreError> {
        match self.modules.get(name) {
            None => Ok(None),
            Some(Module::Class(class)) => {
                let instance = class.new_instance(&[])?;
                Ok(Some(Resolved::Instance(instance)))
            }
            Some(Module::Definition(def)) => Ok(Some(Resolved::Definition(def.clone()))),
            Some(Module::Value(value)) => Ok(Some(Resolved::Value(value.clone()))),
        }
    }

    /// Cache-aware resolution.
    ///
    /// Without `force`, a cached result for the name is returned when present
    /// and a fresh one is cached before being returned otherwise. With
    /// `force` the cache is never read or written, so callers get a private
    /// instance of a shared class.
    pub fn require(&mut self, name: &str, force: bool) -> Result<Option<Resolved>, CoreError> {
        if !force {
            if let Some(cached) = self.instances.get(name) {
                return Ok(Some(cached.clone()));
            }
        }
        let resolved = self.instantiate(name)?;
        if !force {
            if let Some(resolved) = &resolved {
                self.instances.insert(name.to_string(), resolved.clone());
            }
        }
        Ok(resolved)
    }

    /// Emit a diagnostic when logging is enabled. Never fails.
    pub(crate) fn report(&self, message: &str) {
        if self.logging {
            log::error!("{}", message);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
