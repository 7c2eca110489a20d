//! Runtime values.
//!
//! A [`Value`] pairs a [`ValueKind`] with where it was produced: the source
//! span and the context that produced it. Lists and dicts hold their
//! elements behind `Rc`, so cloning a value shares the buffer rather than
//! copying it.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};

use tks_lexer::Span;
use tks_parser::{BinaryOp, FuncDef};

use crate::builtins::BuiltIn;
use crate::config::EvalConfig;
use crate::context::{Context, SymbolTable, SymbolTableRef};
use crate::host::{HostObject, Native, NativeCallable};
use crate::number::Number;

#[derive(Clone)]
pub struct Value {
    pub kind: ValueKind,
    pub span: Option<Span>,
    context: Option<Weak<Context>>,
}

#[derive(Clone)]
pub enum ValueKind {
    Number(Number),
    String(String),
    List(Rc<Vec<Value>>),
    Dict(Rc<Dict>),
    Function(Rc<Function>),
    BuiltIn(&'static BuiltIn),
    /// An application object. `None` is the host's null.
    Host(Option<Rc<dyn HostObject>>),
}

/// Dict entries as parallel key and value lists. Duplicate keys are kept
/// here and resolved when converting to host form.
#[derive(Default)]
pub struct Dict {
    keys: Vec<Value>,
    values: Vec<Value>,
}

impl Dict {
    pub fn new(keys: Vec<Value>, values: Vec<Value>) -> Self {
        Self { keys, values }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.keys.iter().zip(&self.values)
    }

    pub fn len(&self) -> usize {
        self.keys.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A user-defined function: a lambda plus the scope it was defined in.
pub struct Function {
    pub def: Rc<FuncDef>,
    scope: Scope,
}

/// A named lambda's binding of itself holds its scope weakly, since that
/// scope owns the binding.
enum Scope {
    Strong(SymbolTableRef),
    Weak(Weak<RefCell<SymbolTable>>),
}

impl Function {
    pub fn new(def: Rc<FuncDef>, scope: SymbolTableRef) -> Self {
        Self {
            def,
            scope: Scope::Strong(scope),
        }
    }

    /// The defining scope, unless it has been dropped.
    pub fn scope(&self) -> Option<SymbolTableRef> {
        match &self.scope {
            Scope::Strong(scope) => Some(Rc::clone(scope)),
            Scope::Weak(scope) => scope.upgrade(),
        }
    }

    /// A copy that can be stored in its own defining scope.
    pub(crate) fn self_binding(&self) -> Self {
        let scope = match &self.scope {
            Scope::Strong(scope) => Rc::downgrade(scope),
            Scope::Weak(scope) => Weak::clone(scope),
        };
        Self {
            def: Rc::clone(&self.def),
            scope: Scope::Weak(scope),
        }
    }

    /// A self-binding turned back into an ordinary function.
    fn upgraded(&self) -> Option<Self> {
        match &self.scope {
            Scope::Strong(_) => None,
            Scope::Weak(scope) => Some(Self::new(Rc::clone(&self.def), scope.upgrade()?)),
        }
    }

    pub fn name(&self) -> &str {
        self.def
            .name
            .as_ref()
            .map_or("<lambda>", |name| name.text.as_str())
    }

    pub fn arity(&self) -> usize {
        self.def.params.len()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// Why a binary or unary operation could not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpError {
    IllegalOperation,
    DivisionByZero,
    /// A repetition whose result could not be allocated.
    TooLarge,
}

impl Value {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            span: None,
            context: None,
        }
    }

    pub fn number(n: Number) -> Self {
        Self::new(ValueKind::Number(n))
    }

    pub fn int(n: i64) -> Self {
        Self::number(Number::Int(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::new(ValueKind::String(s.into()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Self::new(ValueKind::List(Rc::new(items)))
    }

    pub fn dict(keys: Vec<Value>, values: Vec<Value>) -> Self {
        Self::new(ValueKind::Dict(Rc::new(Dict::new(keys, values))))
    }

    pub fn null() -> Self {
        Self::new(ValueKind::Host(None))
    }

    pub fn host(object: Rc<dyn HostObject>) -> Self {
        Self::new(ValueKind::Host(Some(object)))
    }

    /// The context this value was last placed in, if it is still alive.
    pub fn context(&self) -> Option<Rc<Context>> {
        self.context.as_ref()?.upgrade()
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, context: &Rc<Context>) -> Self {
        self.context = Some(Rc::downgrade(context));
        self
    }

    /// Places the value at `span` inside `context`.
    pub fn at(self, span: &Span, context: &Rc<Context>) -> Self {
        self.with_span(span.clone()).with_context(context)
    }

    /// Swaps a function's self-binding for a value that keeps its scope alive.
    pub(crate) fn resolved(self) -> Self {
        let upgraded = match &self.kind {
            ValueKind::Function(func) => func.upgraded(),
            _ => None,
        };
        match upgraded {
            Some(func) => Self {
                kind: ValueKind::Function(Rc::new(func)),
                ..self
            },
            None => self,
        }
    }

    /// True when both values are the same list, dict, function or host object.
    pub fn same_object(&self, other: &Value) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::List(a), ValueKind::List(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Dict(a), ValueKind::Dict(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Function(a), ValueKind::Function(b)) => Rc::ptr_eq(a, b),
            (ValueKind::BuiltIn(a), ValueKind::BuiltIn(b)) => std::ptr::eq(*a, *b),
            (ValueKind::Host(Some(a)), ValueKind::Host(Some(b))) => Rc::ptr_eq(a, b),
            (ValueKind::Host(None), ValueKind::Host(None)) => true,
            _ => false,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self.kind {
            ValueKind::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        match &self.kind {
            ValueKind::Function(_) | ValueKind::BuiltIn(_) => true,
            ValueKind::Host(Some(host)) => host.is_callable(),
            _ => false,
        }
    }

    /// Applies `op` with `self` on the left.
    pub fn binary(&self, op: BinaryOp, other: &Value) -> Result<ValueKind, OpError> {
        use ValueKind as K;

        let kind = match (&self.kind, &other.kind) {
            (K::Number(a), K::Number(b)) => K::Number(arithmetic(op, *a, *b)?),
            (K::String(a), K::String(b)) if op == BinaryOp::Add => K::String(format!("{a}{b}")),
            (K::String(s), K::Number(n)) if op == BinaryOp::Mul => {
                K::String(repeat_str(s, count(*n)?)?)
            }
            (K::List(a), K::List(b)) if op == BinaryOp::Add => {
                K::List(Rc::new(a.iter().chain(b.iter()).cloned().collect()))
            }
            (K::List(items), K::Number(n)) if op == BinaryOp::Mul => {
                K::List(Rc::new(repeat_list(items, count(*n)?)?))
            }
            _ => return Err(OpError::IllegalOperation),
        };
        Ok(kind)
    }

    pub fn negated(&self) -> Result<ValueKind, OpError> {
        self.binary(BinaryOp::Mul, &Value::int(-1))
    }

    pub fn notted(&self) -> Result<ValueKind, OpError> {
        match self.kind {
            ValueKind::Number(n) => Ok(ValueKind::Number(n.not())),
            _ => Err(OpError::IllegalOperation),
        }
    }

    /// One step of a member chain.
    pub fn member(&self, name: &str) -> Option<Value> {
        match &self.kind {
            ValueKind::Host(Some(host)) => host.get_member(name).map(Value::from_native),
            _ => None,
        }
    }

    /// Trailing `['key']` of a member chain.
    pub fn index(&self, key: &str) -> Option<Value> {
        match &self.kind {
            ValueKind::Host(Some(host)) => host.index(key).map(Value::from_native),
            _ => None,
        }
    }

    pub fn to_native(&self) -> Native {
        self.to_native_with(&EvalConfig::default())
    }

    /// Host form of this value. Functions become [`NativeCallable`]s that
    /// evaluate under `config`.
    pub fn to_native_with(&self, config: &EvalConfig) -> Native {
        match &self.kind {
            ValueKind::Number(Number::Int(n)) => Native::Int(*n),
            ValueKind::Number(Number::Float(n)) => Native::Float(*n),
            ValueKind::String(s) => Native::Str(s.clone()),
            ValueKind::List(items) => {
                Native::List(items.iter().map(|item| item.to_native_with(config)).collect())
            }
            ValueKind::Dict(dict) => {
                let mut entries: Vec<(Native, Native)> = Vec::with_capacity(dict.len());
                for (key, value) in dict.entries() {
                    let key = key.to_native_with(config);
                    let value = value.to_native_with(config);
                    match entries.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(entry) => entry.1 = value,
                        None => entries.push((key, value)),
                    }
                }
                Native::Dict(entries)
            }
            ValueKind::Function(_) | ValueKind::BuiltIn(_) => {
                Native::Callable(NativeCallable::new(self.clone(), config.clone()))
            }
            ValueKind::Host(Some(host)) => Native::Host(Rc::clone(host)),
            ValueKind::Host(None) => Native::Null,
        }
    }

    pub fn from_native(native: Native) -> Self {
        match native {
            Native::Null => Self::null(),
            Native::Int(n) => Self::int(n),
            Native::Float(n) => Self::number(Number::Float(n)),
            Native::Str(s) => Self::string(s),
            Native::List(items) => Self::list(items.into_iter().map(Self::from_native).collect()),
            Native::Dict(entries) => {
                let (keys, values) = entries
                    .into_iter()
                    .map(|(k, v)| (Self::from_native(k), Self::from_native(v)))
                    .unzip();
                Self::dict(keys, values)
            }
            Native::Callable(callable) => callable.value().clone(),
            Native::Host(host) => Self::host(host),
        }
    }
}

fn arithmetic(op: BinaryOp, a: Number, b: Number) -> Result<Number, OpError> {
    let ordering = || a.compare(b);
    let number = match op {
        BinaryOp::Add => a.add(b),
        BinaryOp::Sub => a.sub(b),
        BinaryOp::Mul => a.mul(b),
        BinaryOp::Div => a.div(b).ok_or(OpError::DivisionByZero)?,
        BinaryOp::Pow => a.pow(b).ok_or(OpError::DivisionByZero)?,
        BinaryOp::Eq => Number::from(ordering() == Some(Ordering::Equal)),
        BinaryOp::Ne => Number::from(ordering() != Some(Ordering::Equal)),
        BinaryOp::Lt => Number::from(ordering() == Some(Ordering::Less)),
        BinaryOp::Gt => Number::from(ordering() == Some(Ordering::Greater)),
        BinaryOp::Lte => Number::from(matches!(ordering(), Some(Ordering::Less | Ordering::Equal))),
        BinaryOp::Gte => {
            Number::from(matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)))
        }
        BinaryOp::And => a.and(b),
        BinaryOp::Or => a.or(b),
    };
    Ok(number)
}

/// Repeat count for `*`. Negative counts repeat nothing.
fn count(n: Number) -> Result<usize, OpError> {
    let n = n.as_count().ok_or(OpError::IllegalOperation)?;
    Ok(usize::try_from(n.max(0)).unwrap_or(usize::MAX))
}

fn repeat_str(s: &str, times: usize) -> Result<String, OpError> {
    if s.is_empty() {
        return Ok(String::new());
    }
    let len = s.len().checked_mul(times).ok_or(OpError::TooLarge)?;
    let mut out = String::new();
    out.try_reserve_exact(len).map_err(|_| OpError::TooLarge)?;
    for _ in 0..times {
        out.push_str(s);
    }
    Ok(out)
}

fn repeat_list(items: &[Value], times: usize) -> Result<Vec<Value>, OpError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let len = items.len().checked_mul(times).ok_or(OpError::TooLarge)?;
    let mut out = Vec::new();
    out.try_reserve_exact(len).map_err(|_| OpError::TooLarge)?;
    for _ in 0..times {
        out.extend(items.iter().cloned());
    }
    Ok(out)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Number(n) => write!(f, "{n}"),
            ValueKind::String(s) => write!(f, "\"{s}\""),
            ValueKind::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ValueKind::Dict(dict) => {
                f.write_str("{")?;
                for (i, (key, value)) in dict.entries().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}:{value}")?;
                }
                f.write_str("}")
            }
            ValueKind::Function(func) => write!(f, "<Function '{}'>", func.name()),
            ValueKind::BuiltIn(builtin) => write!(f, "<built-in function {}>", builtin.name),
            ValueKind::Host(Some(host)) => f.write_str(&host.describe()),
            ValueKind::Host(None) => f.write_str("None"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Record;
    use pretty_assertions::assert_eq;

    fn float(n: f64) -> Value {
        Value::number(Number::Float(n))
    }

    fn strs(items: &[&str]) -> Value {
        Value::list(items.iter().map(|s| Value::string(*s)).collect())
    }

    fn apply(left: &Value, op: BinaryOp, right: &Value) -> Result<String, OpError> {
        left.binary(op, right).map(|kind| Value::new(kind).to_string())
    }

    // ===================================================================
    // Display
    // ===================================================================

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::int(7).to_string(), "7");
        assert_eq!(float(3.5).to_string(), "3.5");
        assert_eq!(float(2.0).to_string(), "2.0");
        assert_eq!(Value::string("ab").to_string(), "\"ab\"");
        assert_eq!(Value::null().to_string(), "None");
    }

    #[test]
    fn test_display_collections() {
        let list = Value::list(vec![Value::int(1), Value::int(2)]);
        assert_eq!(list.to_string(), "[1, 2]");
        let dict = Value::dict(
            vec![Value::string("a"), Value::string("b")],
            vec![Value::int(1), Value::int(2)],
        );
        assert_eq!(dict.to_string(), "{\"a\":1, \"b\":2}");
        assert_eq!(Value::list(vec![]).to_string(), "[]");
    }

    #[test]
    fn test_display_host() {
        let value = Value::host(Rc::new(Record::new("Button")));
        assert_eq!(value.to_string(), "<Button>");
    }

    // ===================================================================
    // Operators
    // ===================================================================

    #[test]
    fn test_number_comparisons_are_integers() {
        assert_eq!(apply(&Value::int(1), BinaryOp::Lt, &Value::int(2)), Ok("1".into()));
        assert_eq!(apply(&Value::int(1), BinaryOp::Eq, &float(1.0)), Ok("1".into()));
        assert_eq!(apply(&Value::int(3), BinaryOp::Gte, &Value::int(4)), Ok("0".into()));
        assert_eq!(apply(&Value::int(3), BinaryOp::Ne, &Value::int(4)), Ok("1".into()));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            apply(&Value::int(1), BinaryOp::Div, &Value::int(0)),
            Err(OpError::DivisionByZero)
        );
        assert_eq!(
            apply(&Value::int(0), BinaryOp::Pow, &Value::int(-2)),
            Err(OpError::DivisionByZero)
        );
    }

    #[test]
    fn test_string_concat_and_repeat() {
        let ab = Value::string("ab");
        assert_eq!(apply(&ab, BinaryOp::Add, &Value::string("c")), Ok("\"abc\"".into()));
        assert_eq!(apply(&ab, BinaryOp::Mul, &Value::int(3)), Ok("\"ababab\"".into()));
        assert_eq!(apply(&ab, BinaryOp::Mul, &Value::int(-1)), Ok("\"\"".into()));
    }

    #[test]
    fn test_repeat_beyond_memory_fails() {
        let huge = Value::int(i64::MAX);
        assert_eq!(apply(&Value::string("ab"), BinaryOp::Mul, &huge), Err(OpError::TooLarge));
        assert_eq!(apply(&strs(&["a", "b"]), BinaryOp::Mul, &huge), Err(OpError::TooLarge));
        assert_eq!(apply(&Value::string(""), BinaryOp::Mul, &huge), Ok("\"\"".into()));
        assert_eq!(apply(&strs(&[]), BinaryOp::Mul, &huge), Ok("[]".into()));
    }

    #[test]
    fn test_repeat_needs_integer_count() {
        assert_eq!(
            apply(&Value::string("ab"), BinaryOp::Mul, &float(2.0)),
            Err(OpError::IllegalOperation)
        );
        assert_eq!(
            apply(&strs(&["a"]), BinaryOp::Mul, &float(2.0)),
            Err(OpError::IllegalOperation)
        );
    }

    #[test]
    fn test_list_concat_and_repeat() {
        let list = strs(&["a", "b"]);
        assert_eq!(
            apply(&list, BinaryOp::Add, &strs(&["c"])),
            Ok("[\"a\", \"b\", \"c\"]".into())
        );
        assert_eq!(
            apply(&list, BinaryOp::Mul, &Value::int(2)),
            Ok("[\"a\", \"b\", \"a\", \"b\"]".into())
        );
        assert_eq!(apply(&list, BinaryOp::Mul, &Value::int(0)), Ok("[]".into()));
    }

    #[test]
    fn test_list_concat_builds_new_buffer() {
        let list = strs(&["a"]);
        let joined = Value::new(list.binary(BinaryOp::Add, &strs(&[])).unwrap());
        assert!(!joined.same_object(&list));
    }

    #[test]
    fn test_mismatched_operands_are_illegal() {
        let cases = [
            (Value::string("a"), BinaryOp::Add, Value::int(1)),
            (Value::int(1), BinaryOp::Add, Value::string("a")),
            (Value::string("a"), BinaryOp::Eq, Value::string("a")),
            (Value::string("a"), BinaryOp::Sub, Value::string("a")),
            (strs(&[]), BinaryOp::Add, Value::int(1)),
            (Value::null(), BinaryOp::Add, Value::int(1)),
        ];
        for (left, op, right) in cases {
            assert_eq!(apply(&left, op, &right), Err(OpError::IllegalOperation), "{left} {op} {right}");
        }
    }

    #[test]
    fn test_unary() {
        assert_eq!(Value::new(Value::int(5).negated().unwrap()).to_string(), "-5");
        assert_eq!(Value::string("a").negated().err(), Some(OpError::IllegalOperation));
        assert_eq!(Value::new(Value::int(0).notted().unwrap()).to_string(), "1");
        assert_eq!(Value::string("").notted().err(), Some(OpError::IllegalOperation));
    }

    // ===================================================================
    // Sharing and host conversion
    // ===================================================================

    #[test]
    fn test_clone_shares_list_buffer() {
        let list = strs(&["a"]);
        let copy = list.clone();
        assert!(copy.same_object(&list));
    }

    #[test]
    fn test_to_native_dict_last_value_wins() {
        let dict = Value::dict(
            vec![Value::string("a"), Value::string("b"), Value::string("a")],
            vec![Value::int(1), Value::int(2), Value::int(3)],
        );
        assert_eq!(
            dict.to_native(),
            Native::Dict(vec![
                (Native::Str("a".into()), Native::Int(3)),
                (Native::Str("b".into()), Native::Int(2)),
            ])
        );
    }

    #[test]
    fn test_native_conversion() {
        let native = Native::List(vec![Native::Null, Native::Float(1.5), Native::Str("x".into())]);
        let value = Value::from_native(native.clone());
        assert_eq!(value.to_string(), "[None, 1.5, \"x\"]");
        assert_eq!(value.to_native(), native);
    }

    #[test]
    fn test_member_lookup_on_host() {
        let record = Record::new("Tk").with("title", Native::Str("main".into()));
        let value = Value::host(Rc::new(record));
        assert_eq!(value.member("title").map(|v| v.to_string()), Some("\"main\"".into()));
        assert!(value.member("missing").is_none());
        assert!(Value::int(1).member("title").is_none());
        assert!(Value::null().index("title").is_none());
    }
}
