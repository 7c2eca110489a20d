//! WASM bindings for the TkSystem expression engine.
//!
//! Exposes `evaluate()` to JavaScript via wasm-bindgen. Bindings are plain
//! JS values; objects and functions are reached through `js_sys::Reflect`.
//! Returns a JS object `{ value, error }`, exactly one of them non-null.

use std::rc::Rc;

use serde::Serialize;
use tks_eval::{Bindings, HostError, HostObject, Native};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Result of one evaluation, as handed to JavaScript.
#[derive(Debug, PartialEq, Serialize)]
pub struct Evaluation {
    pub value: Option<Native>,
    pub error: Option<String>,
}

/// Evaluate one expression with `bindings` as global names. `source_name`
/// is the file name shown in error reports.
///
/// Throws only if the result cannot be converted to a JS value.
#[wasm_bindgen]
pub fn evaluate(
    source_name: &str,
    source: &str,
    bindings: &js_sys::Object,
) -> Result<JsValue, JsError> {
    let mut names = Bindings::new();
    for entry in js_sys::Object::entries(bindings).iter() {
        let pair = js_sys::Array::from(&entry);
        if let Some(name) = pair.get(0).as_string() {
            names.insert(name, js_to_native(pair.get(1)));
        }
    }

    let output = run(source_name, source, &names);
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    output
        .serialize(&serializer)
        .map_err(|e| JsError::new(&e.to_string()))
}

/// Get the engine version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// The evaluation itself, independent of any JS value.
pub fn run(source_name: &str, source: &str, bindings: &Bindings) -> Evaluation {
    match tks_eval::evaluate(source_name, source, bindings) {
        Ok(value) => Evaluation {
            value: Some(value.to_native()),
            error: None,
        },
        Err(e) => Evaluation {
            value: None,
            error: Some(e.to_string()),
        },
    }
}

/// A JS object or function bound into an evaluation.
struct JsHost {
    value: JsValue,
}

impl HostObject for JsHost {
    fn describe(&self) -> String {
        let kind = self.value.js_typeof().as_string().unwrap_or_default();
        format!("<{kind}>")
    }

    fn get_member(&self, name: &str) -> Option<Native> {
        let member = js_sys::Reflect::get(&self.value, &JsValue::from_str(name)).ok()?;
        if member.is_undefined() {
            return None;
        }
        Some(js_to_native(member))
    }

    fn index(&self, key: &str) -> Option<Native> {
        self.get_member(key)
    }

    fn is_callable(&self) -> bool {
        self.value.is_function()
    }

    fn call(&self, args: Vec<Native>) -> Result<Native, HostError> {
        let function = self
            .value
            .dyn_ref::<js_sys::Function>()
            .ok_or_else(|| HostError::new("object is not callable"))?;
        let array = js_sys::Array::new();
        for arg in &args {
            array.push(&native_to_js(arg));
        }
        function
            .apply(&JsValue::UNDEFINED, &array)
            .map(js_to_native)
            .map_err(|e| {
                HostError::new(e.as_string().unwrap_or_else(|| "JavaScript call failed".to_string()))
            })
    }
}

fn js_to_native(value: JsValue) -> Native {
    if value.is_null() || value.is_undefined() {
        return Native::Null;
    }
    if let Some(n) = value.as_f64() {
        let integral = n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0;
        return if integral {
            Native::Int(n as i64)
        } else {
            Native::Float(n)
        };
    }
    if let Some(s) = value.as_string() {
        return Native::Str(s);
    }
    if let Some(b) = value.as_bool() {
        return Native::Int(i64::from(b));
    }
    if js_sys::Array::is_array(&value) {
        let items = js_sys::Array::from(&value).iter().map(js_to_native).collect();
        return Native::List(items);
    }
    Native::Host(Rc::new(JsHost { value }))
}

fn native_to_js(native: &Native) -> JsValue {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    native.serialize(&serializer).unwrap_or(JsValue::UNDEFINED)
}
