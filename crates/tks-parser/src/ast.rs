//! Abstract Syntax Tree for property expressions.
//!
//! Every node owns the [`Span`] of source text it was parsed from, so any
//! failure while evaluating it can be pointed back at that text.

use std::fmt;
use std::rc::Rc;

use tks_lexer::Span;

/// A complete expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Numeric literal: `42`, `3.5`
    Number(NumberLit),

    /// String literal: `"hello"`, `'world'`
    String(String),

    /// Binary operation: `a + b`, `n <= 3`, `x and y`
    BinOp {
        left: Box<Node>,
        op: BinaryOp,
        right: Box<Node>,
    },

    /// Unary operation: `-x`, `not x`
    UnaryOp { op: UnaryOp, operand: Box<Node> },

    /// Variable reference: `self`, `rgb`
    VarAccess(Name),

    /// Member chain on a variable: `self.master`, `top.label['text']`
    MethodAccess {
        base: Name,
        methods: Vec<Name>,
        attribute: Option<Name>,
    },

    /// Lambda: `lambda (x) -> x * 2`, `lambda twice(x) -> x * 2`
    FuncDef(Rc<FuncDef>),

    /// Call: `rgb(255, 0, 0)`
    Call { callee: Box<Node>, args: Vec<Node> },

    /// List literal: `[1, 2, 3]`
    List(Vec<Node>),

    /// Dict literal: `{"side": "left"}`. Keys and values pair up by index.
    Dict { keys: Vec<Node>, values: Vec<Node> },
}

/// An identifier together with where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLit {
    Int(i64),
    Float(f64),
}

/// The parts of a lambda. Shared behind `Rc` so function values can hold
/// their body after the surrounding tree is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDef {
    pub name: Option<Name>,
    pub params: Vec<Name>,
    pub body: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::And => "and",
            Self::Or => "or",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Pos,
    Neg,
    Not,
}
