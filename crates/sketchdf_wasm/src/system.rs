//! Formula compilation and field sampling exposed to JS.

use std::rc::Rc;

use serde_wasm_bindgen::{from_value, to_value};
use sketchdf_core::equation_engine::{parse_with_variable, DEFAULT_VARIABLE};
use sketchdf_core::field::{slope_field, FieldSettings, Window};
use sketchdf_core::CompiledFunction;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEquation {
    pub(crate) function: Rc<CompiledFunction>,
    formula: String,
    variable: char,
}

/// Reads the bound variable name; an empty name means the default `x`.
pub(crate) fn variable_from_name(name: &str) -> Result<char, String> {
    let mut chars = name.trim().chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(DEFAULT_VARIABLE),
        (Some(c), None) if c.is_ascii_alphabetic() => Ok(c.to_ascii_lowercase()),
        _ => Err(format!(
            "Variable name must be a single letter, got \"{}\".",
            name.trim()
        )),
    }
}

/// Parses and compiles a formula, with errors worded for the user.
pub(crate) fn build_function(formula: &str, variable: char) -> Result<CompiledFunction, String> {
    let ast = parse_with_variable(formula, variable).map_err(|err| format!("Syntax error: {err}."))?;
    Ok(sketchdf_core::evaluate(&ast))
}

pub(crate) fn value_or_default<T: Default + serde::de::DeserializeOwned>(
    value: JsValue,
    what: &str,
) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    from_value(value).map_err(|err| JsValue::from_str(&format!("Invalid {what}: {err}")))
}

#[wasm_bindgen]
impl WasmEquation {
    #[wasm_bindgen(constructor)]
    pub fn new(formula: String, variable: &str) -> Result<WasmEquation, JsValue> {
        console_error_panic_hook::set_once();

        let variable = variable_from_name(variable).map_err(|err| JsValue::from_str(&err))?;
        let function = build_function(&formula, variable).map_err(|err| JsValue::from_str(&err))?;

        Ok(WasmEquation {
            function: Rc::new(function),
            formula,
            variable,
        })
    }

    pub fn formula(&self) -> String {
        self.formula.clone()
    }

    pub fn variable(&self) -> String {
        self.variable.to_string()
    }

    /// Evaluates the formula at every sample.
    pub fn evaluate(&self, xs: &[f64]) -> Vec<f64> {
        self.function.call(xs)
    }

    /// Field geometry for the window. Either argument may be left undefined to
    /// use the defaults.
    pub fn slope_field(&self, window: JsValue, settings: JsValue) -> Result<JsValue, JsValue> {
        let window: Window = value_or_default(window, "window")?;
        let settings: FieldSettings = value_or_default(settings, "field settings")?;
        let field = slope_field(&*self.function, &window, &settings)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        to_value(&field)
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize field: {err}")))
    }
}
