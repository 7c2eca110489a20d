//! The boundary between expressions and the embedding application.
//!
//! Widgets, windows and other application objects enter an evaluation as
//! [`HostObject`]s. Everything that crosses the boundary in either
//! direction travels as a [`Native`], a plain owned value the host can
//! inspect without knowing about [`Value`]s.

use std::fmt;
use std::rc::Rc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use tks_lexer::{Position, Span};

use crate::config::EvalConfig;
use crate::context::{Context, SymbolTable};
use crate::interpreter::Interpreter;
use crate::value::Value;
use crate::Error;

/// An application object reachable from expressions.
///
/// Only [`describe`](HostObject::describe) is required. A member chain
/// `w.a.b` calls [`get_member`](HostObject::get_member) once per step and
/// `w['k']` calls [`index`](HostObject::index).
pub trait HostObject {
    /// Text shown when the object is displayed.
    fn describe(&self) -> String;

    fn get_member(&self, _name: &str) -> Option<Native> {
        None
    }

    fn index(&self, _key: &str) -> Option<Native> {
        None
    }

    fn is_callable(&self) -> bool {
        false
    }

    fn call(&self, _args: Vec<Native>) -> Result<Native, HostError> {
        Err(HostError::new("object is not callable"))
    }
}

/// Failure reported by a host callable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A value in host form.
#[derive(Clone)]
pub enum Native {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Native>),
    /// Entries in insertion order, keys unique.
    Dict(Vec<(Native, Native)>),
    Callable(NativeCallable),
    Host(Rc<dyn HostObject>),
}

impl Native {
    pub fn host(object: impl HostObject + 'static) -> Self {
        Self::Host(Rc::new(object))
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => a == b,
            (Self::Host(a), Self::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Dict(entries) => f.debug_tuple("Dict").field(entries).finish(),
            Self::Callable(c) => f.debug_tuple("Callable").field(&c.to_string()).finish(),
            Self::Host(h) => f.debug_tuple("Host").field(&h.describe()).finish(),
        }
    }
}

impl Serialize for Native {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f64(*n),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Dict(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Callable(c) => serializer.serialize_str(&c.to_string()),
            Self::Host(h) => serializer.serialize_str(&h.describe()),
        }
    }
}

/// An expression function handed to the host. Calling it runs the
/// function body with the arguments converted back into values.
#[derive(Clone)]
pub struct NativeCallable {
    value: Value,
    config: EvalConfig,
}

impl NativeCallable {
    pub(crate) fn new(value: Value, config: EvalConfig) -> Self {
        Self { value, config }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn call(&self, args: Vec<Native>) -> Result<Native, Error> {
        let caller = self.value.context().unwrap_or_else(|| {
            Context::root(&self.config.program_name, SymbolTable::new().into_ref())
        });
        let span = self
            .value
            .span
            .clone()
            .unwrap_or_else(|| Span::empty(Position::start("<native>", "")));
        let args = args.into_iter().map(Value::from_native).collect();
        let result = Interpreter::new(&self.config).call_value(&self.value, args, &span, &caller)?;
        Ok(result.to_native_with(&self.config))
    }
}

impl PartialEq for NativeCallable {
    fn eq(&self, other: &Self) -> bool {
        self.value.same_object(&other.value)
    }
}

impl fmt::Display for NativeCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

/// A host object backed by a fixed member map, for tests and simple hosts.
#[derive(Default)]
pub struct Record {
    name: String,
    members: Vec<(String, Native)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with(mut self, member: impl Into<String>, value: Native) -> Self {
        self.members.push((member.into(), value));
        self
    }
}

impl HostObject for Record {
    fn describe(&self) -> String {
        format!("<{}>", self.name)
    }

    fn get_member(&self, name: &str) -> Option<Native> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| value.clone())
    }

    fn index(&self, key: &str) -> Option<Native> {
        self.get_member(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_record_members() {
        let record = Record::new("Label").with("text", Native::Str("hi".into()));
        assert_eq!(record.describe(), "<Label>");
        assert_eq!(record.get_member("text"), Some(Native::Str("hi".into())));
        assert_eq!(record.get_member("width"), None);
        assert_eq!(record.index("text"), Some(Native::Str("hi".into())));
    }

    #[test]
    fn test_default_host_is_not_callable() {
        let record = Record::new("Frame");
        assert!(!record.is_callable());
        assert_eq!(
            record.call(vec![]),
            Err(HostError::new("object is not callable"))
        );
    }

    #[test]
    fn test_host_equality_is_identity() {
        let shared: Rc<dyn HostObject> = Rc::new(Record::new("Frame"));
        let a = Native::Host(Rc::clone(&shared));
        let b = Native::Host(shared);
        let c = Native::host(Record::new("Frame"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_debug_uses_description() {
        let native = Native::List(vec![Native::Int(1), Native::host(Record::new("Tk"))]);
        assert_eq!(format!("{native:?}"), "List([Int(1), Host(\"<Tk>\")])");
    }
}
