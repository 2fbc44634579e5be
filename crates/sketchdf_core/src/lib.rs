pub mod curve;
pub mod equation_engine;
pub mod field;
pub mod solvers;
/// The `sketchdf_core` crate provides the engine behind SketchDF, a sketcher for
/// first-order autonomous equations `x' = f(x)`.
///
/// Key components:
/// - **Traits**: `Scalar` (numeric type abstraction), `ScalarField` (the right-hand side), `Steppable` (Solvers).
/// - **Equation Engine**: Lexer, recursive-descent parser and a bytecode VM evaluating formulas over sample batches.
/// - **Solvers**: Fixed-step integrators (RK4, Euler) tracing a curve both ways from a seed point.
/// - **Curve**: `IntegralCurve`, a seed plus a method, re-solved for each visible window.
/// - **Field**: Slope and direction field geometry for a window.
pub mod traits;

pub use curve::IntegralCurve;
pub use equation_engine::{evaluate, parse, parse_with_variable, CompiledFunction, Expr, ParseError};
pub use field::{slope_field, FieldKind, FieldSettings, SlopeField, Window};
pub use solvers::{euler, runge_kutta, Curve, Method, SolverSettings};
