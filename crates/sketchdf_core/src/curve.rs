use crate::field::Window;
use crate::solvers::{Curve, Method, SolverSettings};
use crate::traits::{Scalar, ScalarField};

/// The solution through one seed point, re-solved on demand for whatever
/// time window is currently visible.
///
/// The field, the seed and the method are fixed at construction.
#[derive(Debug, Clone)]
pub struct IntegralCurve<F, T: Scalar = f64> {
    field: F,
    t_init: T,
    x_init: T,
    method: Method,
    settings: SolverSettings,
}

impl<F: ScalarField<T>, T: Scalar> IntegralCurve<F, T> {
    pub fn new(field: F, t_init: T, x_init: T, method: Method) -> Self {
        Self {
            field,
            t_init,
            x_init,
            method,
            settings: SolverSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn t_init(&self) -> T {
        self.t_init
    }

    pub fn x_init(&self) -> T {
        self.x_init
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Samples of the curve across `[t_min, t_max]`.
    ///
    /// A seed outside the window still yields up to `steps` samples per
    /// direction, none of which may be visible; check `seed_in_view` first.
    pub fn solve(&self, t_min: T, t_max: T) -> Curve<T> {
        let curve = self.method.solve(
            &self.settings,
            t_min,
            t_max,
            &self.field,
            self.t_init,
            self.x_init,
        );
        log::debug!(
            "{} curve through ({:?}, {:?}) over [{t_min:?}, {t_max:?}]: {} sample(s)",
            self.method,
            self.t_init,
            self.x_init,
            curve.len()
        );
        curve
    }
}

impl<F: ScalarField<f64>> IntegralCurve<F, f64> {
    /// Whether the seed is inside `window`. Curves whose seed has scrolled out
    /// of view are not redrawn.
    pub fn seed_in_view(&self, window: &Window) -> bool {
        window.contains(self.t_init, self.x_init)
    }

    pub fn solve_in(&self, window: &Window) -> Curve {
        self.solve(window.t_min, window.t_max)
    }
}
