//! Expression tree produced by the parser, and the operator tables it uses.

use std::fmt;

use crate::traits::Scalar;

/// Functions of one argument, including negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Negate,
    Abs,
    Ln,
    Exp,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Asinh,
    Acosh,
    Atanh,
}

impl UnaryOp {
    /// Canonical spelling used in formulas and messages.
    pub fn name(self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Abs => "abs",
            UnaryOp::Ln => "log",
            UnaryOp::Exp => "exp",
            UnaryOp::Sin => "sin",
            UnaryOp::Cos => "cos",
            UnaryOp::Tan => "tan",
            UnaryOp::Asin => "arcsin",
            UnaryOp::Acos => "arccos",
            UnaryOp::Atan => "arctan",
            UnaryOp::Sinh => "sinh",
            UnaryOp::Cosh => "cosh",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Asinh => "arcsinh",
            UnaryOp::Acosh => "arccosh",
            UnaryOp::Atanh => "arctanh",
        }
    }

    /// Applies the operator to one value. Out-of-domain inputs yield NaN or infinities.
    #[inline]
    pub fn apply<T: Scalar>(self, x: T) -> T {
        match self {
            UnaryOp::Negate => -x,
            UnaryOp::Abs => x.abs(),
            UnaryOp::Ln => x.ln(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Tan => x.tan(),
            UnaryOp::Asin => x.asin(),
            UnaryOp::Acos => x.acos(),
            UnaryOp::Atan => x.atan(),
            UnaryOp::Sinh => x.sinh(),
            UnaryOp::Cosh => x.cosh(),
            UnaryOp::Tanh => x.tanh(),
            UnaryOp::Asinh => x.asinh(),
            UnaryOp::Acosh => x.acosh(),
            UnaryOp::Atanh => x.atanh(),
        }
    }
}

/// Arithmetic operators of two arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
            BinaryOp::Power => '^',
        }
    }

    #[inline]
    pub fn apply<T: Scalar>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            BinaryOp::Multiply => a * b,
            BinaryOp::Divide => a / b,
            BinaryOp::Power => a.powf(b),
        }
    }
}

/// Abstract Syntax Tree nodes for formulas in one variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    /// The bound variable, stored lowercase.
    Variable(char),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn unary(op: UnaryOp, child: Expr) -> Self {
        Expr::Unary(op, Box::new(child))
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    /// Evaluates the tree at a single point by walking it depth-first.
    pub fn eval<T: Scalar>(&self, x: T) -> T {
        match self {
            Expr::Const(value) => T::from_f64(*value).unwrap_or_else(T::nan),
            Expr::Variable(_) => x,
            Expr::Unary(op, child) => op.apply(child.eval(x)),
            Expr::Binary(op, left, right) => op.apply(left.eval(x), right.eval(x)),
        }
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Const(_) | Expr::Variable(_) => 1,
            Expr::Unary(_, child) => 1 + child.size(),
            Expr::Binary(_, left, right) => 1 + left.size() + right.size(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(value) => write!(f, "{value}"),
            Expr::Variable(name) => write!(f, "{name}"),
            Expr::Unary(UnaryOp::Negate, child) => write!(f, "-({child})"),
            Expr::Unary(op, child) => write!(f, "{}({child})", op.name()),
            Expr::Binary(op, left, right) => write!(f, "({left} {} {right})", op.symbol()),
        }
    }
}
