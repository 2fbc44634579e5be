//! Integral curves exposed to JS, one per clicked seed point.

use std::rc::Rc;

use serde_wasm_bindgen::to_value;
use sketchdf_core::field::Window;
use sketchdf_core::solvers::{Curve, Method};
use sketchdf_core::{CompiledFunction, IntegralCurve};
use wasm_bindgen::prelude::*;

use crate::system::WasmEquation;

#[wasm_bindgen]
pub struct WasmCurve {
    curve: IntegralCurve<Rc<CompiledFunction>>,
}

impl WasmCurve {
    pub(crate) fn samples(&self, t_min: f64, t_max: f64) -> Curve {
        self.curve.solve(t_min, t_max)
    }
}

#[wasm_bindgen]
impl WasmCurve {
    /// `method` is `"rk4"` or `"euler"`; an empty string selects RK4.
    #[wasm_bindgen(constructor)]
    pub fn new(
        equation: &WasmEquation,
        t_init: f64,
        x_init: f64,
        method: &str,
    ) -> Result<WasmCurve, JsValue> {
        let method = if method.is_empty() {
            Method::default()
        } else {
            method
                .parse::<Method>()
                .map_err(|err| JsValue::from_str(&err.to_string()))?
        };

        Ok(WasmCurve {
            curve: IntegralCurve::new(Rc::clone(&equation.function), t_init, x_init, method),
        })
    }

    pub fn t_init(&self) -> f64 {
        self.curve.t_init()
    }

    pub fn x_init(&self) -> f64 {
        self.curve.x_init()
    }

    pub fn method(&self) -> String {
        self.curve.method().to_string()
    }

    /// The curve across `[t_min, t_max]` as `{ times, values }`.
    pub fn solve(&self, t_min: f64, t_max: f64) -> Result<JsValue, JsValue> {
        to_value(&self.samples(t_min, t_max))
            .map_err(|err| JsValue::from_str(&format!("Failed to serialize curve: {err}")))
    }

    pub fn seed_in_view(&self, t_min: f64, t_max: f64, x_min: f64, x_max: f64) -> bool {
        self.curve.seed_in_view(&Window {
            t_min,
            t_max,
            x_min,
            x_max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equation(formula: &str) -> WasmEquation {
        WasmEquation::new(formula.to_string(), "x").expect("equation should build")
    }

    #[test]
    fn wasm_curve_defaults_to_runge_kutta() {
        let curve = WasmCurve::new(&equation("x"), 0.0, 1.0, "").expect("curve");
        assert_eq!(curve.method(), "rk4");

        let samples = curve.samples(-1.0, 1.0);
        assert_eq!(samples.times.len(), samples.values.len());
        for (t, x) in samples.points() {
            assert!((x - t.exp()).abs() < 1e-9);
        }
    }

    #[test]
    fn wasm_curve_keeps_its_seed() {
        let curve = WasmCurve::new(&equation("-x"), 2.0, 3.0, "euler").expect("curve");
        assert_eq!(curve.t_init(), 2.0);
        assert_eq!(curve.x_init(), 3.0);
        assert_eq!(curve.method(), "euler");
        assert!(curve.seed_in_view(-5.0, 5.0, -5.0, 5.0));
        assert!(!curve.seed_in_view(-1.0, 1.0, -5.0, 5.0));
    }

    #[test]
    fn wasm_curves_share_the_equation_function() {
        let equation = equation("sin(x)");
        let first = WasmCurve::new(&equation, 0.0, 1.0, "rk4").expect("curve");
        let second = WasmCurve::new(&equation, 1.0, 2.0, "rk4").expect("curve");
        assert_eq!(Rc::strong_count(&equation.function), 3);
        drop(first);
        drop(second);
        assert_eq!(Rc::strong_count(&equation.function), 1);
    }

    #[test]
    #[cfg(target_arch = "wasm32")]
    fn wasm_curve_rejects_unknown_solver() {
        let result = WasmCurve::new(&equation("x"), 0.0, 1.0, "tsit5");
        assert!(result.is_err(), "expected unknown solver error");
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::WasmCurve;
    use crate::system::WasmEquation;
    use serde_wasm_bindgen::from_value;
    use sketchdf_core::solvers::Curve;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn solve_serializes_times_and_values() {
        let equation = WasmEquation::new("x".to_string(), "x").expect("equation");
        let curve = WasmCurve::new(&equation, 0.0, 1.0, "rk4").expect("curve");
        let value = curve.solve(-2.0, 2.0).expect("solve");
        let samples: Curve = from_value(value).expect("curve should deserialize");
        assert_eq!(samples.times.len(), samples.values.len());
        assert!(samples.times.contains(&0.0));
    }
}
