//! Built-in functions and the global names every program starts with.

use crate::context::SymbolTable;
use crate::number::Number;
use crate::value::{Value, ValueKind};

/// A built-in receives its arguments already checked against its
/// parameter list. An `Err` carries the message for the runtime error.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

/// Defines the built-in table from `name => { params, func }` entries.
macro_rules! builtin_functions {
    (
        $(
            $name:literal => {
                params: [$($param:literal),* $(,)?],
                func: $func:expr $(,)?
            }
        ),* $(,)?
    ) => {
        static BUILTIN_TABLE: &[BuiltIn] = &[
            $(
                BuiltIn { name: $name, params: &[$($param),*], func: $func },
            )*
        ];

        /// Names of every built-in function.
        pub const BUILTIN_FUNCTIONS: &[&str] = &[
            $($name,)*
        ];
    };
}

pub struct BuiltIn {
    pub name: &'static str,
    /// Parameter names, used for arity checks and the call's local scope.
    pub params: &'static [&'static str],
    pub func: BuiltinFn,
}

builtin_functions! {
    "rgb" => { params: ["r", "g", "b"], func: rgb },
}

pub fn lookup(name: &str) -> Option<&'static BuiltIn> {
    BUILTIN_TABLE.iter().find(|builtin| builtin.name == name)
}

/// Binds `True`, `False`, `None` and every built-in function.
pub fn register_globals(table: &mut SymbolTable) {
    table.set("True", Value::int(1));
    table.set("False", Value::int(0));
    table.set("None", Value::null());
    for builtin in BUILTIN_TABLE {
        table.set(builtin.name, Value::new(ValueKind::BuiltIn(builtin)));
    }
}

/// `rgb(r, g, b)`: a `#RRGGBB` color string.
fn rgb(args: &[Value]) -> Result<Value, String> {
    let mut color = String::from("#");
    for arg in args {
        match arg.as_number() {
            Some(Number::Int(n)) => color.push_str(&hex_byte(n)),
            _ => return Err("Arguments must be integers".to_string()),
        }
    }
    Ok(Value::string(color))
}

/// Uppercase hex, zero-padded to two digits. Negative values keep a sign.
fn hex_byte(n: i64) -> String {
    if n < 0 {
        format!("-{:X}", n.unsigned_abs())
    } else {
        format!("{n:02X}")
    }
}
