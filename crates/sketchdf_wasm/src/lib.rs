//! WASM bindings for the SketchDF core.
//!
//! The browser front end owns the plot, the mouse and the dialogs; it talks to
//! the core through `WasmEquation` (parse a formula, sample its field) and
//! `WasmCurve` (the solution through a clicked point).

mod curve;
mod system;

pub use curve::WasmCurve;
pub use system::WasmEquation;
