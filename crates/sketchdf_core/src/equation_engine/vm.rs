use std::cell::RefCell;

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::traits::{Scalar, ScalarField};

/// OpCodes for the stack-based virtual machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpCode {
    /// Pushes a constant onto the stack.
    LoadConst(f64),
    /// Pushes the value of the bound variable.
    LoadVar,
    /// Pops a, pushes op(a).
    Unary(UnaryOp),
    /// Pops top two values (b, a), pushes op(a, b).
    Binary(BinaryOp),
}

/// A compiled sequence of operations in postfix order.
///
/// Only `compile` builds bytecode, so every sequence leaves exactly one
/// value on the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Bytecode {
    ops: Vec<OpCode>,
}

impl Bytecode {
    pub fn ops(&self) -> &[OpCode] {
        &self.ops
    }

    /// Deepest stack the sequence reaches.
    pub fn max_stack_depth(&self) -> usize {
        let mut depth = 0usize;
        let mut max = 0usize;
        for op in &self.ops {
            match op {
                OpCode::LoadConst(_) | OpCode::LoadVar => depth += 1,
                OpCode::Unary(_) => {}
                OpCode::Binary(_) => depth = depth.saturating_sub(1),
            }
            max = max.max(depth);
        }
        max
    }
}

/// Compiles an AST into bytecode by a depth-first walk.
pub fn compile(expr: &Expr) -> Bytecode {
    let mut ops = Vec::with_capacity(expr.size());
    compile_recursive(expr, &mut ops);
    Bytecode { ops }
}

fn compile_recursive(expr: &Expr, ops: &mut Vec<OpCode>) {
    match expr {
        Expr::Const(value) => ops.push(OpCode::LoadConst(*value)),
        Expr::Variable(_) => ops.push(OpCode::LoadVar),
        Expr::Unary(op, child) => {
            compile_recursive(child, ops);
            ops.push(OpCode::Unary(*op));
        }
        Expr::Binary(op, left, right) => {
            compile_recursive(left, ops);
            compile_recursive(right, ops);
            ops.push(OpCode::Binary(*op));
        }
    }
}

fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// Stack-based virtual machine for evaluating compiled formulas.
///
/// The VM is stateless; callers pass the scratch stack so repeated calls do
/// not allocate.
pub struct VM;

impl VM {
    /// Executes the bytecode at a single point.
    pub fn execute<T: Scalar>(bytecode: &Bytecode, x: T, stack: &mut Vec<T>) -> T {
        stack.clear();

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(value) => stack.push(constant(*value)),
                OpCode::LoadVar => stack.push(x),
                OpCode::Unary(op) => {
                    if let Some(top) = stack.last_mut() {
                        *top = op.apply(*top);
                    }
                }
                OpCode::Binary(op) => {
                    let b = stack.pop().unwrap_or_else(T::nan);
                    if let Some(a) = stack.last_mut() {
                        *a = op.apply(*a, b);
                    }
                }
            }
        }

        stack.pop().unwrap_or_else(T::nan)
    }

    /// Executes the bytecode over a whole batch of samples.
    ///
    /// Each operation runs over a full column before the next one starts.
    /// When `xs` and `out` differ in length only the shorter prefix is
    /// evaluated; the rest of `out` is left as it was.
    pub fn execute_batch<T: Scalar>(
        bytecode: &Bytecode,
        xs: &[T],
        stack: &mut Vec<Vec<T>>,
        out: &mut [T],
    ) {
        let len = xs.len().min(out.len());
        let (xs, out) = (&xs[..len], &mut out[..len]);
        stack.clear();

        for op in &bytecode.ops {
            match op {
                OpCode::LoadConst(value) => stack.push(vec![constant(*value); xs.len()]),
                OpCode::LoadVar => stack.push(xs.to_vec()),
                OpCode::Unary(op) => {
                    if let Some(column) = stack.last_mut() {
                        column.iter_mut().for_each(|v| *v = op.apply(*v));
                    }
                }
                OpCode::Binary(op) => {
                    let rhs = stack.pop().unwrap_or_default();
                    if let Some(lhs) = stack.last_mut() {
                        lhs.iter_mut()
                            .zip(rhs)
                            .for_each(|(a, b)| *a = op.apply(*a, b));
                    }
                }
            }
        }

        match stack.pop() {
            Some(column) => out.copy_from_slice(&column),
            None => out.iter_mut().for_each(|v| *v = T::nan()),
        }
    }
}

/// A formula compiled for repeated evaluation.
///
/// Evaluation is pure: the result depends only on the input samples. The
/// scalar path keeps its scratch stack in a `RefCell`, which makes this type
/// `!Sync`.
#[derive(Debug, Clone)]
pub struct CompiledFunction<T: Scalar = f64> {
    bytecode: Bytecode,
    stack: RefCell<Vec<T>>,
}

impl<T: Scalar> CompiledFunction<T> {
    pub fn new(bytecode: Bytecode) -> Self {
        let depth = bytecode.max_stack_depth();
        Self {
            bytecode,
            stack: RefCell::new(Vec::with_capacity(depth)),
        }
    }

    pub fn compile(expr: &Expr) -> Self {
        Self::new(compile(expr))
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    /// Evaluates the formula at every sample, returning a vector of the same length.
    pub fn call(&self, xs: &[T]) -> Vec<T> {
        let mut out = vec![T::zero(); xs.len()];
        self.apply(xs, &mut out);
        out
    }
}

impl<T: Scalar> ScalarField<T> for CompiledFunction<T> {
    fn apply(&self, xs: &[T], out: &mut [T]) {
        let mut stack = Vec::with_capacity(self.bytecode.max_stack_depth());
        VM::execute_batch(&self.bytecode, xs, &mut stack, out);
    }

    fn eval(&self, x: T) -> T {
        let mut stack = self.stack.borrow_mut();
        VM::execute(&self.bytecode, x, &mut stack)
    }
}
