use std::cell::RefCell;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::compose::class::Class;
use crate::ds::error::CoreError;
use crate::ds::value::Value;

pub(crate) struct InstanceState {
    class: Class,
    id: String,
    fields: IndexMap<String, Value>,
}

/// A live object produced by a class.
///
/// Member lookup checks the instance's own fields first and falls back to the
/// class's merged prototype. Container-valued prototype defaults are
/// deep-cloned into own fields at allocation so instances never share mutable
/// state; `set` always writes an own field, shadowing the prototype.
///
/// The handle is reference counted; clones refer to the same object.
pub struct Instance(Rc<RefCell<InstanceState>>);

impl Instance {
    pub(crate) fn allocate(class: &Class) -> Instance {
        let mut fields = IndexMap::new();
        for (name, value) in class.members_snapshot() {
            if value.is_container() {
                fields.insert(name, value);
            }
        }
        Instance(Rc::new(RefCell::new(InstanceState {
            class: class.clone(),
            id: Uuid::new_v4().to_hyphenated().to_string(),
            fields,
        })))
    }

    pub(crate) fn from_state(state: Rc<RefCell<InstanceState>>) -> Instance {
        Instance(state)
    }

    pub(crate) fn state(&self) -> &Rc<RefCell<InstanceState>> {
        &self.0
    }

    pub fn class(&self) -> Class {
        self.0.borrow().class.clone()
    }

    /// Unique identity token, minted at allocation.
    pub fn id(&self) -> String {
        self.0.borrow().id.to_string()
    }

    /// Whether two handles refer to the same object.
    pub fn same(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Resolve a member: own field first, then the class prototype.
    /// Absent members are `Undefined`, never an error.
    pub fn get(&self, name: &str) -> Value {
        let class = {
            let state = self.0.borrow();
            if let Some(value) = state.fields.get(name) {
                return value.clone();
            }
            state.class.clone()
        };
        class.member(name).unwrap_or(Value::Undefined)
    }

    pub fn has(&self, name: &str) -> bool {
        !self.get(name).is_undefined()
    }

    /// Write an own field, shadowing any prototype member of the same name.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.0.borrow_mut().fields.insert(name.into(), value.into());
        self
    }

    /// Invoke a method member with this instance as receiver. A bound method
    /// keeps its own receiver regardless.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CoreError> {
        match self.get(name) {
            Value::Method(method) => method.call(self, args),
            _ => Err(CoreError::NotCallable(name.to_string())),
        }
    }

    /// Rebind a method member to permanently execute with this instance as
    /// receiver, storing the bound copy as an own field. Absent or
    /// non-callable members are left untouched.
    pub fn bind(&self, name: &str) -> &Self {
        if let Value::Method(method) = self.get(name) {
            let bound = method.bind_to(self);
            self.0
                .borrow_mut()
                .fields
                .insert(name.to_string(), Value::Method(bound));
        }
        self
    }

    pub fn bind_all(&self, names: &[String]) -> &Self {
        for name in names {
            self.bind(name);
        }
        self
    }

    /// Names of own fields, in insertion order.
    pub fn own_member_names(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }
}

impl Clone for Instance {
    fn clone(&self) -> Self {
        Instance(self.0.clone())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.0.borrow().id)
    }
}
