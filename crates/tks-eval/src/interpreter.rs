//! Tree-walking evaluation of a parsed expression.
//!
//! Every value produced is placed at the span of the node that produced it
//! and in the context it was produced in, so a failure further up can point
//! at the right text.

use std::cmp::Ordering;
use std::rc::Rc;

use tks_lexer::Span;
use tks_parser::{BinaryOp, FuncDef, Name, Node, NodeKind, NumberLit, UnaryOp};

use crate::builtins::BuiltIn;
use crate::config::EvalConfig;
use crate::context::{Context, SymbolTable, SymbolTableRef};
use crate::error::{Error, RuntimeError, RuntimeErrorKind};
use crate::number::Number;
use crate::stack::ensure_sufficient_stack;
use crate::value::{Function, OpError, Value, ValueKind};

pub struct Interpreter<'a> {
    config: &'a EvalConfig,
    /// Function calls currently active.
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(config: &'a EvalConfig) -> Self {
        Self { config, depth: 0 }
    }

    pub fn visit(&mut self, node: &Node, ctx: &Rc<Context>) -> Result<Value, Error> {
        ensure_sufficient_stack(|| self.visit_node(node, ctx))
    }

    fn visit_node(&mut self, node: &Node, ctx: &Rc<Context>) -> Result<Value, Error> {
        let value = match &node.kind {
            NodeKind::Number(NumberLit::Int(n)) => Value::int(*n),
            NodeKind::Number(NumberLit::Float(n)) => Value::number(Number::Float(*n)),
            NodeKind::String(s) => Value::string(s.as_str()),
            NodeKind::VarAccess(name) => lookup(name, &node.span, ctx)?,
            NodeKind::BinOp { left, op, right } => self.binary_op(left, *op, right, ctx)?,
            NodeKind::UnaryOp { op, operand } => self.unary_op(*op, operand, &node.span, ctx)?,
            NodeKind::MethodAccess {
                base,
                methods,
                attribute,
            } => method_access(base, methods, attribute.as_ref(), &node.span, ctx)?,
            NodeKind::FuncDef(def) => func_def(def, &node.span, ctx),
            NodeKind::Call { callee, args } => self.call(callee, args, &node.span, ctx)?,
            NodeKind::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.visit(item, ctx))
                    .collect::<Result<_, _>>()?;
                Value::list(items)
            }
            NodeKind::Dict { keys, values } => {
                let mut key_values = Vec::with_capacity(keys.len());
                let mut value_values = Vec::with_capacity(values.len());
                for (key, value) in keys.iter().zip(values) {
                    key_values.push(self.visit(key, ctx)?);
                    value_values.push(self.visit(value, ctx)?);
                }
                Value::dict(key_values, value_values)
            }
        };
        Ok(value.at(&node.span, ctx))
    }

    fn binary_op(
        &mut self,
        left: &Node,
        op: BinaryOp,
        right: &Node,
        ctx: &Rc<Context>,
    ) -> Result<Value, Error> {
        let lhs = self.visit(left, ctx)?;
        let rhs = self.visit(right, ctx)?;
        match lhs.binary(op, &rhs) {
            Ok(kind) => Ok(Value::new(kind)),
            Err(OpError::IllegalOperation) => Err(illegal_operation(left.span.to(&right.span), ctx)),
            Err(OpError::DivisionByZero) => Err(RuntimeError::new(
                RuntimeErrorKind::DivisionByZero,
                "Division by Zero",
                right.span.clone(),
                ctx,
            )
            .into()),
            Err(OpError::TooLarge) => Err(RuntimeError::new(
                RuntimeErrorKind::TooLarge,
                "Result too large",
                left.span.to(&right.span),
                ctx,
            )
            .into()),
        }
    }

    fn unary_op(
        &mut self,
        op: UnaryOp,
        operand: &Node,
        span: &Span,
        ctx: &Rc<Context>,
    ) -> Result<Value, Error> {
        let value = self.visit(operand, ctx)?;
        let result = match op {
            UnaryOp::Pos => return Ok(value),
            UnaryOp::Neg => value.negated(),
            UnaryOp::Not => value.notted(),
        };
        result
            .map(Value::new)
            .map_err(|_| illegal_operation(span.clone(), ctx))
    }

    fn call(
        &mut self,
        callee: &Node,
        args: &[Node],
        span: &Span,
        ctx: &Rc<Context>,
    ) -> Result<Value, Error> {
        let target = self.visit(callee, ctx)?.at(span, ctx);
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.visit(arg, ctx)?);
        }
        self.call_value(&target, values, span, ctx)
    }

    /// Calls `callee` from `caller`. `span` is the call expression.
    pub fn call_value(
        &mut self,
        callee: &Value,
        args: Vec<Value>,
        span: &Span,
        caller: &Rc<Context>,
    ) -> Result<Value, Error> {
        match &callee.kind {
            ValueKind::Function(func) => self.call_function(func, args, span, caller),
            ValueKind::BuiltIn(builtin) => self.call_builtin(*builtin, args, span, caller),
            ValueKind::Host(Some(host)) if host.is_callable() => {
                tracing::trace!(host = %host.describe(), argc = args.len(), "calling host object");
                let args = args
                    .iter()
                    .map(|arg| arg.to_native_with(self.config))
                    .collect();
                host.call(args).map(Value::from_native).map_err(|e| {
                    RuntimeError::new(RuntimeErrorKind::BadArgument, e.message, span.clone(), caller)
                        .into()
                })
            }
            _ => Err(RuntimeError::new(
                RuntimeErrorKind::NotCallable,
                format!("'{callee}' is not callable"),
                span.clone(),
                caller,
            )
            .into()),
        }
    }

    #[tracing::instrument(level = "trace", skip_all, fields(function = func.name()))]
    fn call_function(
        &mut self,
        func: &Rc<Function>,
        args: Vec<Value>,
        span: &Span,
        caller: &Rc<Context>,
    ) -> Result<Value, Error> {
        check_arity(func.name(), func.arity(), args.len(), span, caller)?;
        let scope = func.scope().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::NotCallable,
                format!("'{}' outlived the scope it was defined in", func.name()),
                span.clone(),
                caller,
            )
        })?;
        let symbols = SymbolTable::with_parent(scope).into_ref();
        let frame = self.enter(func.name(), span, caller, symbols)?;
        for (param, arg) in func.def.params.iter().zip(args) {
            frame.define(param.text.as_str(), arg.with_context(&frame));
        }

        self.depth += 1;
        let result = self.visit(&func.def.body, &frame);
        self.depth -= 1;
        result
    }

    fn call_builtin(
        &mut self,
        builtin: &'static BuiltIn,
        args: Vec<Value>,
        span: &Span,
        caller: &Rc<Context>,
    ) -> Result<Value, Error> {
        check_arity(builtin.name, builtin.params.len(), args.len(), span, caller)?;
        let symbols = SymbolTable::with_parent(Rc::clone(&caller.symbols)).into_ref();
        let frame = self.enter(builtin.name, span, caller, symbols)?;
        for (param, arg) in builtin.params.iter().zip(&args) {
            frame.define(*param, arg.clone().with_context(&frame));
        }
        (builtin.func)(&args).map_err(|details| {
            RuntimeError::new(RuntimeErrorKind::BadArgument, details, span.clone(), &frame).into()
        })
    }

    /// New frame for a call, refused once the configured depth is reached.
    fn enter(
        &self,
        name: &str,
        span: &Span,
        caller: &Rc<Context>,
        symbols: SymbolTableRef,
    ) -> Result<Rc<Context>, Error> {
        if let Some(max) = self.config.max_call_depth {
            if self.depth >= max {
                tracing::debug!(max, function = name, "call depth limit reached");
                return Err(RuntimeError::new(
                    RuntimeErrorKind::RecursionLimit,
                    "maximum recursion depth exceeded",
                    span.clone(),
                    caller,
                )
                .into());
            }
        }
        Ok(Context::child(name, caller, span.start.clone(), symbols))
    }
}

fn lookup(name: &Name, span: &Span, ctx: &Rc<Context>) -> Result<Value, Error> {
    tracing::trace!(ident = %name.text, context = %ctx.name, "resolving name");
    ctx.lookup(&name.text).ok_or_else(|| {
        RuntimeError::new(
            RuntimeErrorKind::UndefinedName,
            format!("'{}' is not defined", name.text),
            span.clone(),
            ctx,
        )
        .into()
    })
}

/// `base.m1.m2['attr']`: each method step asks the host for a member, the
/// attribute asks it for an indexed value.
fn method_access(
    base: &Name,
    methods: &[Name],
    attribute: Option<&Name>,
    span: &Span,
    ctx: &Rc<Context>,
) -> Result<Value, Error> {
    let mut value = lookup(base, span, ctx)?;
    let mut path = base.text.clone();

    for method in methods {
        value = value.member(&method.text).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::NoMember,
                format!("'{path}' has no method '{}'", method.text),
                method.span.clone(),
                ctx,
            )
        })?;
        path.push('.');
        path.push_str(&method.text);
    }

    if let Some(attribute) = attribute {
        value = value.index(&attribute.text).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::NoMember,
                format!("'{path}' has no attribute '{}'", attribute.text),
                attribute.span.clone(),
                ctx,
            )
        })?;
    }
    Ok(value)
}

/// A lambda closes over the symbols of `ctx`. A named lambda is also bound
/// in them.
fn func_def(def: &Rc<FuncDef>, span: &Span, ctx: &Rc<Context>) -> Value {
    let func = Function::new(Rc::clone(def), Rc::clone(&ctx.symbols));
    if let Some(name) = &def.name {
        let binding = Value::new(ValueKind::Function(Rc::new(func.self_binding())));
        ctx.define(name.text.as_str(), binding.at(span, ctx));
    }
    Value::new(ValueKind::Function(Rc::new(func)))
}

fn check_arity(
    name: &str,
    expected: usize,
    given: usize,
    span: &Span,
    caller: &Rc<Context>,
) -> Result<(), RuntimeError> {
    let amount = match given.cmp(&expected) {
        Ordering::Greater => "too many",
        Ordering::Less => "too few",
        Ordering::Equal => return Ok(()),
    };
    Err(RuntimeError::new(
        RuntimeErrorKind::Arity,
        format!("{amount} args passed into '{name}'. Expected {expected}"),
        span.clone(),
        caller,
    ))
}

fn illegal_operation(span: Span, ctx: &Rc<Context>) -> Error {
    RuntimeError::new(RuntimeErrorKind::IllegalOperation, "Illegal operation", span, ctx).into()
}
