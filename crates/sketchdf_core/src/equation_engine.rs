//! Formula front end: lexer, recursive-descent parser, and the bytecode VM
//! that evaluates parsed formulas over batches of samples.
//!
//! ```
//! use sketchdf_core::equation_engine::{evaluate, parse};
//!
//! let ast = parse("-x^2").unwrap();
//! let f = evaluate(&ast);
//! assert_eq!(f.call(&[3.0]), vec![-9.0]);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod vm;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use error::{ErrorKind, ParseError};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{Parser, MAX_DEPTH};
pub use vm::{compile, Bytecode, CompiledFunction, OpCode, VM};

/// Name of the bound variable when none is given.
pub const DEFAULT_VARIABLE: char = 'x';

/// Parses a formula in the default variable `x`.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    parse_with_variable(input, DEFAULT_VARIABLE)
}

/// Parses a formula whose only variable is `variable` (case-insensitive).
pub fn parse_with_variable(input: &str, variable: char) -> Result<Expr, ParseError> {
    let result = Parser::new(input, variable).parse();
    match &result {
        Ok(ast) => log::debug!("parsed `{input}` as {ast}"),
        Err(err) => log::debug!("failed to parse `{input}`: {err}"),
    }
    result
}

/// Compiles an AST into a function from samples to values.
pub fn evaluate(ast: &Expr) -> CompiledFunction {
    let function = CompiledFunction::compile(ast);
    log::debug!(
        "compiled {} node(s) into {} op(s)",
        ast.size(),
        function.bytecode().ops().len()
    );
    function
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ScalarField;

    fn at(input: &str, x: f64) -> f64 {
        let f = evaluate(&parse(input).expect("formula should parse"));
        f.call(&[x])[0]
    }

    #[test]
    fn hand_computed_values() {
        assert_eq!(at("2+3*4", -7.0), 14.0);
        assert_eq!(at("x^2", 3.0), 9.0);
        assert_eq!(at("-x^2", 3.0), -9.0);
        assert_eq!(at("2^3^2", 0.0), 512.0);
        assert_eq!(at("2-3-4", 0.0), -5.0);
        assert_eq!(at("x ** 3 / 2", 2.0), 4.0);
        assert_eq!(at("(1 - x) * (1 + x)", 0.5), 0.75);
    }

    #[test]
    fn every_function_evaluates() {
        let x = 0.5_f64;
        let cases: &[(&str, f64)] = &[
            ("abs(-x)", x),
            ("sin(x)", x.sin()),
            ("cos(x)", x.cos()),
            ("tan(x)", x.tan()),
            ("tg(x)", x.tan()),
            ("arcsin(x)", x.asin()),
            ("arccos(x)", x.acos()),
            ("arctan(x)", x.atan()),
            ("arctg(x)", x.atan()),
            ("sinh(x)", x.sinh()),
            ("cosh(x)", x.cosh()),
            ("tanh(x)", x.tanh()),
            ("arcsinh(x)", x.asinh()),
            ("arccosh(x + 1)", (x + 1.0).acosh()),
            ("arctanh(x)", x.atanh()),
            ("arctgh(x)", x.atanh()),
            ("log(x)", x.ln()),
            ("ln(x)", x.ln()),
            ("exp(x)", x.exp()),
            ("e", std::f64::consts::E),
            ("pi * x", std::f64::consts::PI * x),
        ];
        for (input, expected) in cases {
            let got = at(input, x);
            assert!(
                (got - expected).abs() < 1e-15,
                "{input}: expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn arcsin_is_not_sin_of_arc() {
        assert!((at("arcsin(x)", 1.0) - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
    }

    #[test]
    fn domain_edges_produce_nan_and_infinity() {
        let f = evaluate(&parse("log(x) + 1/x").expect("parse"));
        let out = f.call(&[-1.0, 0.0]);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan(), "-inf + inf is NaN");
        assert_eq!(at("1/x", 0.0), f64::INFINITY);
    }

    #[test]
    fn re_evaluation_is_bit_identical() {
        let f = evaluate(&parse("sin(x)^2 - 1 + exp(-x/3)").expect("parse"));
        let xs: Vec<f64> = (0..64).map(|i| -4.0 + i as f64 * 0.125).collect();
        let first = f.call(&xs);
        let second = f.call(&xs);
        assert_eq!(
            first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert_eq!(f.eval(xs[5]).to_bits(), first[5].to_bits());
    }

    #[test]
    fn custom_variable_name() {
        let ast = parse_with_variable("t*T", 't').expect("parse");
        assert_eq!(evaluate(&ast).call(&[3.0]), vec![9.0]);
        assert!(parse_with_variable("x", 't').is_err());
    }
}
