use std::cell::RefCell;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::ds::error::CoreError;
use crate::ds::instance::{Instance, InstanceState};

/// Signature shared by every native method stored in a definition.
pub type NativeFn = Rc<dyn Fn(&Instance, &[Value]) -> Result<Value, CoreError>>;

pub enum Value {
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Method(Method),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Method(_) => "method",
        }
    }

    /// Container values hold mutable state and are deep-cloned per instance.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Method(_))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Find a descendant by dot syntax expression, e.g. `"the.path.to"`.
    /// List steps accept numeric segments. Any absent step yields `Undefined`.
    pub fn path(&self, key: &str) -> Value {
        let mut current = self;
        for part in key.split('.') {
            match current {
                Value::Map(m) => match m.get(part) {
                    Some(v) => current = v,
                    None => return Value::Undefined,
                },
                Value::List(l) => match part.parse::<usize>().ok().and_then(|i| l.get(i)) {
                    Some(v) => current = v,
                    None => return Value::Undefined,
                },
                _ => return Value::Undefined,
            }
        }
        current.clone()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        match self {
            Value::Undefined => Value::Undefined,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Str(s) => Value::Str(s.to_string()),
            Value::List(l) => Value::List(l.clone()),
            Value::Map(m) => Value::Map(m.clone()),
            Value::Method(m) => Value::Method(m.clone()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Str(s) => write!(f, "\"{}\"", s),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Method(m) => {
                if m.is_bound() {
                    write!(f, "method(bound)")
                } else {
                    write!(f, "method")
                }
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Value::Undefined"),
            Value::Bool(b) => write!(f, "Value::Bool({})", b),
            Value::Int(i) => write!(f, "Value::Int({})", i),
            Value::Float(n) => write!(f, "Value::Float({})", n),
            Value::Str(s) => write!(f, "Value::Str({:?})", s),
            Value::List(l) => write!(f, "Value::List({:?})", l),
            Value::Map(m) => write!(f, "Value::Map({:?})", m),
            Value::Method(_) => write!(f, "Value::Method(...)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::List(l)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Map(m)
    }
}

impl From<Method> for Value {
    fn from(m: Method) -> Self {
        Value::Method(m)
    }
}

/// A callable member value, optionally bound to a fixed receiver.
///
/// An unbound method executes against whatever receiver the call site passes.
/// Once bound (see [`Instance::bind`]) the receiver argument is ignored and
/// the method permanently executes against the instance it was bound to.
pub struct Method {
    func: NativeFn,
    bound: Option<Weak<RefCell<InstanceState>>>,
}

impl Method {
    pub fn native(func: impl Fn(&Instance, &[Value]) -> Result<Value, CoreError> + 'static) -> Self {
        Method {
            func: Rc::new(func),
            bound: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    pub(crate) fn bind_to(&self, target: &Instance) -> Method {
        Method {
            func: self.func.clone(),
            bound: Some(Rc::downgrade(target.state())),
        }
    }

    pub fn call(&self, receiver: &Instance, args: &[Value]) -> Result<Value, CoreError> {
        match &self.bound {
            Some(target) => {
                let state = target.upgrade().ok_or(CoreError::DeadReceiver)?;
                (self.func)(&Instance::from_state(state), args)
            }
            None => (self.func)(receiver, args),
        }
    }
}

impl Clone for Method {
    fn clone(&self) -> Self {
        Method {
            func: self.func.clone(),
            bound: self.bound.clone(),
        }
    }
}

impl PartialEq for Method {
    fn eq(&self, other: &Self) -> bool {
        let same_func = Rc::ptr_eq(&self.func, &other.func);
        let same_target = match (&self.bound, &other.bound) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        same_func && same_target
    }
}
