//! TkSystem Evaluator
//!
//! Runs property expressions against a set of host bindings:
//!
//! ```text
//! source ─→ tks-lexer ─→ tks-parser ─→ Interpreter ─→ Value
//! ```
//!
//! A [`Session`] owns the global scope. Names bound by one evaluation
//! (host bindings, named lambdas) stay visible to the next.
//!
//! ```
//! use tks_eval::{evaluate, Bindings};
//!
//! let value = evaluate("<TkSystem>", "rgb(255, 0, 0)", &Bindings::new()).unwrap();
//! assert_eq!(value.to_string(), "\"#FF0000\"");
//! ```

pub mod builtins;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod interpreter;
pub mod number;
mod stack;
pub mod value;

use std::collections::BTreeMap;
use std::rc::Rc;

use tks_lexer::{Position, Scanner, Span};
use tks_parser::Parser;
use tracing::debug;

pub use config::EvalConfig;
pub use context::{Context, SymbolTable, SymbolTableRef};
pub use error::{Error, ErrorKind, RuntimeError, RuntimeErrorKind};
pub use host::{HostError, HostObject, Native, NativeCallable, Record};
pub use interpreter::Interpreter;
pub use number::Number;
pub use value::{Value, ValueKind};

/// Host values to bind before evaluating, by name.
pub type Bindings = BTreeMap<String, Native>;

/// Evaluates `text` in a fresh [`Session`] with default settings.
pub fn evaluate(source_name: &str, text: &str, bindings: &Bindings) -> Result<Value, Error> {
    Session::new().evaluate(source_name, text, bindings)
}

/// A global scope shared by a sequence of evaluations.
pub struct Session {
    config: EvalConfig,
    globals: SymbolTableRef,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        let mut globals = SymbolTable::new();
        builtins::register_globals(&mut globals);
        Self {
            config,
            globals: globals.into_ref(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Binds a host value globally, replacing any earlier binding.
    pub fn bind(&self, name: impl Into<String>, value: Native) {
        self.define(name, Value::from_native(value));
    }

    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.globals.borrow_mut().set(name, value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get(name)
    }

    /// Lexes and parses `text`, binds `bindings`, then evaluates.
    ///
    /// Input with no tokens evaluates to the empty string. Bindings are left
    /// untouched when `text` fails to lex or parse.
    #[tracing::instrument(level = "debug", skip(self, text, bindings))]
    pub fn evaluate(
        &self,
        source_name: &str,
        text: &str,
        bindings: &Bindings,
    ) -> Result<Value, Error> {
        let tokens = Scanner::tokenize(source_name, text)?;
        let node = if tokens.len() > 1 {
            Some(Parser::parse(tokens)?)
        } else {
            None
        };

        for (name, value) in bindings {
            self.bind(name.as_str(), value.clone());
        }
        let Some(node) = node else {
            return Ok(Value::string(""));
        };

        let context = Context::root(self.config.program_name.as_str(), Rc::clone(&self.globals));
        let value = Interpreter::new(&self.config).visit(&node, &context)?;
        debug!(result = %value, "evaluated");
        Ok(value)
    }

    /// Calls a function value from the top level of this session.
    pub fn call(&self, callee: &Value, args: Vec<Value>) -> Result<Value, Error> {
        let context = Context::root(self.config.program_name.as_str(), Rc::clone(&self.globals));
        let span = callee
            .span
            .clone()
            .unwrap_or_else(|| Span::empty(Position::start("<native>", "")));
        Interpreter::new(&self.config).call_value(callee, args, &span, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_evaluate() {
        let value = evaluate("<test>", "1 + 2 * 3", &Bindings::new()).unwrap();
        assert_eq!(value.to_string(), "7");
        assert_eq!(value.span.map(|s| s.slice()), Some("1 + 2 * 3".to_string()));
    }

    #[test]
    fn test_empty_input_is_empty_string() {
        for src in ["", "   ", "# just a comment"] {
            let value = evaluate("<test>", src, &Bindings::new()).unwrap();
            assert_eq!(value.to_string(), "\"\"", "{src:?}");
        }
    }

    #[test]
    fn test_comment_runs_to_end_of_input() {
        let value = evaluate("<test>", "1 # one\n+ 2", &Bindings::new()).unwrap();
        assert_eq!(value.to_string(), "1");
    }

    #[test]
    fn test_bindings_persist_across_evaluations() {
        let session = Session::new();
        let mut bindings = Bindings::new();
        bindings.insert("width".to_string(), Native::Int(40));
        session.evaluate("<test>", "width", &bindings).unwrap();
        let value = session.evaluate("<test>", "width / 4", &Bindings::new()).unwrap();
        assert_eq!(value.to_string(), "10.0");
    }

    #[test]
    fn test_bindings_can_overwrite_globals() {
        let session = Session::new();
        let mut bindings = Bindings::new();
        bindings.insert("True".to_string(), Native::Str("yes".into()));
        let value = session.evaluate("<test>", "True", &bindings).unwrap();
        assert_eq!(value.to_string(), "\"yes\"");
    }

    #[test]
    fn test_failed_parse_leaves_globals_untouched() {
        let session = Session::new();
        let mut bindings = Bindings::new();
        bindings.insert("width".to_string(), Native::Int(40));
        assert!(session.evaluate("<test>", "width +", &bindings).is_err());
        assert!(session.evaluate("<test>", "width $", &bindings).is_err());
        assert!(session.lookup("width").is_none());

        session.evaluate("<test>", "", &bindings).unwrap();
        assert!(session.lookup("width").is_some());
    }

    #[test]
    fn test_sessions_are_isolated() {
        let first = Session::new();
        first.bind("x", Native::Int(1));
        assert!(first.lookup("x").is_some());
        assert!(Session::new().lookup("x").is_none());
    }

    #[test]
    fn test_program_name_in_traceback() {
        let session = Session::with_config(EvalConfig::default().with_program_name("<layout>"));
        let e = session.evaluate("main.tk", "nope", &Bindings::new()).unwrap_err();
        assert!(e.render(Some(12)).contains("  File main.tk, line 12 in <layout>\n"));
    }

    #[test]
    fn test_call_from_host() {
        let session = Session::new();
        let f = session
            .evaluate("<test>", "lambda (a, b) -> a - b", &Bindings::new())
            .unwrap();
        let value = session.call(&f, vec![Value::int(5), Value::int(7)]).unwrap();
        assert_eq!(value.to_string(), "-2");
    }
}
