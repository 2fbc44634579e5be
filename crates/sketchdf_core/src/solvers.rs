use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::traits::{Scalar, ScalarField, Steppable};

/// Number of steps spanning the requested window when no settings are given.
pub const DEFAULT_STEPS: usize = 1000;

/// Settings shared by the fixed-step integrators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// The window `[tmin, tmax]` is divided into this many steps. Each
    /// direction from the seed takes at most this many steps.
    pub steps: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            bail!("Solver needs at least one step.");
        }
        Ok(())
    }
}

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4;

impl<T: Scalar> Steppable<T> for RK4 {
    fn step(&self, field: &impl ScalarField<T>, x: T, dt: T) -> T {
        let two = T::one() + T::one();
        let half = T::one() / two;
        let sixth = T::one() / (two + two + two);

        // k1 = f(x)
        let k1 = field.eval(x);
        // k2 = f(x + dt*k1/2)
        let k2 = field.eval(x + dt * k1 * half);
        // k3 = f(x + dt*k2/2)
        let k3 = field.eval(x + dt * k2 * half);
        // k4 = f(x + dt*k3)
        let k4 = field.eval(x + dt * k3);

        // x_next = x + dt/6 * (k1 + 2k2 + 2k3 + k4)
        x + dt * sixth * (k1 + two * k2 + two * k3 + k4)
    }
}

/// Explicit Euler Stepper
/// x_next = x + f(x) * dt. With a negative dt this is x - f(x) * |dt|.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl<T: Scalar> Steppable<T> for Euler {
    fn step(&self, field: &impl ScalarField<T>, x: T, dt: T) -> T {
        x + field.eval(x) * dt
    }
}

/// Samples of an integral curve, ascending in time.
///
/// `times` and `values` always have the same length and contain the seed once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve<T = f64> {
    pub times: Vec<T>,
    pub values: Vec<T>,
}

impl<T: Scalar> Curve<T> {
    fn seed(t0: T, x0: T) -> Self {
        Self {
            times: vec![t0],
            values: vec![x0],
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// `(t, x)` pairs in time order.
    pub fn points(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    /// The last sample, at the largest time.
    pub fn last(&self) -> Option<(T, T)> {
        Some((*self.times.last()?, *self.values.last()?))
    }
}

/// Steps away from the seed in one direction until the next sample would leave
/// the window. Samples are returned in the order they were produced.
fn march<T, F, S>(
    stepper: &S,
    field: &F,
    t0: T,
    x0: T,
    dt: T,
    inside: impl Fn(T) -> bool,
    max_steps: usize,
) -> Vec<(T, T)>
where
    T: Scalar,
    F: ScalarField<T>,
    S: Steppable<T>,
{
    let mut samples = Vec::new();
    let mut x = x0;
    let mut k = T::zero();
    for _ in 0..max_steps {
        k = k + T::one();
        // Times from the step index, so rounding does not accumulate.
        let t = t0 + k * dt;
        if !inside(t) {
            break;
        }
        x = stepper.step(field, x, dt);
        samples.push((t, x));
    }
    samples
}

/// Traces the curve through `(t0, x0)` across `[tmin, tmax]` with a fixed step
/// of `(tmax - tmin) / settings.steps`, forward and backward from the seed.
///
/// Windows that are empty or not finite yield only the seed. Non-finite values
/// produced along the way are kept as they are.
pub fn integrate<T, F, S>(
    stepper: &S,
    settings: &SolverSettings,
    tmin: T,
    tmax: T,
    field: &F,
    t0: T,
    x0: T,
) -> Curve<T>
where
    T: Scalar,
    F: ScalarField<T>,
    S: Steppable<T>,
{
    let Some(steps) = T::from_usize(settings.steps) else {
        return Curve::seed(t0, x0);
    };
    let h = (tmax - tmin) / steps;
    if !h.is_finite() || h <= T::zero() || !t0.is_finite() {
        log::debug!("degenerate window [{tmin:?}, {tmax:?}], returning the seed only");
        return Curve::seed(t0, x0);
    }

    let after = march(stepper, field, t0, x0, h, |t| t < tmax, settings.steps);
    let before = march(stepper, field, t0, x0, -h, |t| t > tmin, settings.steps);
    log::trace!(
        "seed ({t0:?}, {x0:?}): {} step(s) forward, {} step(s) backward",
        after.len(),
        before.len()
    );

    let len = before.len() + 1 + after.len();
    let mut times = Vec::with_capacity(len);
    let mut values = Vec::with_capacity(len);
    for (t, x) in before.into_iter().rev() {
        times.push(t);
        values.push(x);
    }
    times.push(t0);
    values.push(x0);
    for (t, x) in after {
        times.push(t);
        values.push(x);
    }

    Curve { times, values }
}

/// Fourth-order Runge-Kutta over `[tmin, tmax]` with the default step count.
pub fn runge_kutta<T: Scalar, F: ScalarField<T>>(
    tmin: T,
    tmax: T,
    field: &F,
    t0: T,
    x0: T,
) -> Curve<T> {
    integrate(&RK4, &SolverSettings::default(), tmin, tmax, field, t0, x0)
}

/// Explicit Euler over `[tmin, tmax]` with the default step count.
pub fn euler<T: Scalar, F: ScalarField<T>>(
    tmin: T,
    tmax: T,
    field: &F,
    t0: T,
    x0: T,
) -> Curve<T> {
    integrate(&Euler, &SolverSettings::default(), tmin, tmax, field, t0, x0)
}

/// Choice of integrator for an integral curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    RungeKutta,
    Euler,
}

impl Method {
    pub fn solve<T: Scalar, F: ScalarField<T>>(
        self,
        settings: &SolverSettings,
        tmin: T,
        tmax: T,
        field: &F,
        t0: T,
        x0: T,
    ) -> Curve<T> {
        match self {
            Method::RungeKutta => integrate(&RK4, settings, tmin, tmax, field, t0, x0),
            Method::Euler => integrate(&Euler, settings, tmin, tmax, field, t0, x0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::RungeKutta => "rk4",
            Method::Euler => "euler",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rk4" | "runge_kutta" | "runge-kutta" => Ok(Method::RungeKutta),
            "euler" => Ok(Method::Euler),
            _ => Err(anyhow!("Unknown solver: {name}")),
        }
    }
}
