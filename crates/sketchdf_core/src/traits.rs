use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;
use std::rc::Rc;

/// A trait for types that can be used as scalars in formulas and integrators.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// The right-hand side `f` of an autonomous equation `dx/dt = f(x)`.
pub trait ScalarField<T: Scalar> {
    /// Evaluates the field at every sample in `xs`.
    /// xs: sampled values of the bound variable
    /// out: buffer receiving f(xs); only the first min(xs.len(), out.len())
    /// entries are written
    fn apply(&self, xs: &[T], out: &mut [T]);

    /// Evaluates the field at a single point.
    fn eval(&self, x: T) -> T {
        let mut out = [x];
        self.apply(&[x], &mut out);
        out[0]
    }
}

impl<T: Scalar, F: ScalarField<T> + ?Sized> ScalarField<T> for &F {
    fn apply(&self, xs: &[T], out: &mut [T]) {
        (**self).apply(xs, out)
    }

    fn eval(&self, x: T) -> T {
        (**self).eval(x)
    }
}

impl<T: Scalar, F: ScalarField<T> + ?Sized> ScalarField<T> for Rc<F> {
    fn apply(&self, xs: &[T], out: &mut [T]) {
        (**self).apply(xs, out)
    }

    fn eval(&self, x: T) -> T {
        (**self).eval(x)
    }
}

/// Adapts a plain closure `x -> f(x)` into a `ScalarField`.
#[derive(Debug, Clone, Copy)]
pub struct FnField<F>(pub F);

impl<T: Scalar, F: Fn(T) -> T> ScalarField<T> for FnField<F> {
    fn apply(&self, xs: &[T], out: &mut [T]) {
        for (o, &x) in out.iter_mut().zip(xs) {
            *o = (self.0)(x);
        }
    }

    fn eval(&self, x: T) -> T {
        (self.0)(x)
    }
}

/// A trait for fixed-step schemes that advance a scalar state.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size dt and returns the new state.
    /// dt may be negative, which integrates backward in time.
    fn step(&self, field: &impl ScalarField<T>, x: T, dt: T) -> T;
}
