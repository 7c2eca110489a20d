//! Scopes and call frames.
//!
//! Two chains run through an evaluation. [`SymbolTable`]s link lexically:
//! a function body's table sits on top of the table the function was
//! defined in. [`Context`]s link by call: each one remembers who called it
//! and from where, which is what a traceback walks.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tks_lexer::Position;

use crate::value::Value;

pub type SymbolTableRef = Rc<RefCell<SymbolTable>>;

/// Name bindings for one scope, with an optional enclosing scope.
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Value>,
    parent: Option<SymbolTableRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: SymbolTableRef) -> Self {
        Self {
            symbols: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn into_ref(self) -> SymbolTableRef {
        Rc::new(RefCell::new(self))
    }

    /// Looks `name` up here, then in each enclosing scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.symbols.get(name) {
            Some(value) => Some(value.clone().resolved()),
            None => self.parent.as_ref()?.borrow().get(name),
        }
    }

    /// Binds `name` in this scope only, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.symbols.insert(name.into(), value);
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.symbols.keys().collect();
        names.sort();
        f.debug_struct("SymbolTable")
            .field("names", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// One frame of the call chain.
pub struct Context {
    /// Display name: the program name, a function name or `<lambda>`.
    pub name: String,
    /// The calling frame.
    pub parent: Option<Rc<Context>>,
    /// Where in the parent this frame was entered.
    pub parent_pos: Option<Position>,
    pub symbols: SymbolTableRef,
}

impl Context {
    pub fn root(name: impl Into<String>, symbols: SymbolTableRef) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parent: None,
            parent_pos: None,
            symbols,
        })
    }

    pub fn child(
        name: impl Into<String>,
        parent: &Rc<Context>,
        entered_at: Position,
        symbols: SymbolTableRef,
    ) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            parent: Some(Rc::clone(parent)),
            parent_pos: Some(entered_at),
            symbols,
        })
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.symbols.borrow().get(name)
    }

    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.symbols.borrow_mut().set(name, value);
    }

    /// Number of frames from here to the root, inclusive.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.parent.as_deref();
        while let Some(ctx) = current {
            depth += 1;
            current = ctx.parent.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;
    use pretty_assertions::assert_eq;

    fn int(n: i64) -> Value {
        Value::number(Number::Int(n))
    }

    #[test]
    fn test_get_walks_parents() {
        let outer = SymbolTable::new().into_ref();
        outer.borrow_mut().set("x", int(1));
        let inner = SymbolTable::with_parent(Rc::clone(&outer));
        assert_eq!(inner.get("x").map(|v| v.to_string()), Some("1".to_string()));
        assert!(inner.get("y").is_none());
    }

    #[test]
    fn test_set_is_local() {
        let outer = SymbolTable::new().into_ref();
        outer.borrow_mut().set("x", int(1));
        let mut inner = SymbolTable::with_parent(Rc::clone(&outer));
        inner.set("x", int(2));
        assert_eq!(inner.get("x").map(|v| v.to_string()), Some("2".to_string()));
        assert_eq!(outer.borrow().get("x").map(|v| v.to_string()), Some("1".to_string()));
    }

    #[test]
    fn test_context_chain() {
        let root = Context::root("<program>", SymbolTable::new().into_ref());
        let pos = Position::start("<test>", "f(1)");
        let child = Context::child("f", &root, pos, SymbolTable::new().into_ref());
        assert_eq!(root.depth(), 1);
        assert_eq!(child.depth(), 2);
        assert_eq!(child.parent.as_ref().map(|p| p.name.as_str()), Some("<program>"));
    }
}
