//! Slope and direction field sampling.
//!
//! For an autonomous equation `dx/dt = f(x)` the slope at a grid point only
//! depends on its `x` coordinate, so `f` is evaluated once per grid row as a
//! single batch. The output is plain geometry; drawing it is left to the caller.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::traits::ScalarField;

/// The visible rectangle: time on the horizontal axis, the solution on the vertical one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Window {
    pub t_min: f64,
    pub t_max: f64,
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            t_min: -5.0,
            t_max: 5.0,
            x_min: -5.0,
            x_max: 5.0,
        }
    }
}

impl Window {
    pub fn validate(&self) -> Result<()> {
        let bounds = [self.t_min, self.t_max, self.x_min, self.x_max];
        if bounds.iter().any(|b| !b.is_finite()) {
            bail!("Window bounds must be finite.");
        }
        if self.t_min >= self.t_max {
            bail!(
                "Window time range is empty: t_min ({}) must be below t_max ({}).",
                self.t_min,
                self.t_max
            );
        }
        if self.x_min >= self.x_max {
            bail!(
                "Window value range is empty: x_min ({}) must be below x_max ({}).",
                self.x_min,
                self.x_max
            );
        }
        Ok(())
    }

    /// Whether `(t, x)` lies inside the window, edges included.
    pub fn contains(&self, t: f64, x: f64) -> bool {
        (self.t_min..=self.t_max).contains(&t) && (self.x_min..=self.x_max).contains(&x)
    }

    pub fn diagonal(&self) -> f64 {
        (self.t_max - self.t_min).hypot(self.x_max - self.x_min)
    }
}

/// Segments with or without arrow heads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Direction,
    Slope,
}

pub const DEFAULT_DENSITY: usize = 15;
/// Largest grid accepted per axis.
pub const MAX_DENSITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSettings {
    /// Grid points per axis.
    pub density: usize,
    #[serde(default)]
    pub kind: FieldKind,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self {
            density: DEFAULT_DENSITY,
            kind: FieldKind::Direction,
        }
    }
}

impl FieldSettings {
    pub fn validate(&self) -> Result<()> {
        if self.density < 2 {
            bail!("Field density must be at least 2, got {}.", self.density);
        }
        if self.density > MAX_DENSITY {
            bail!(
                "Field density must be at most {MAX_DENSITY}, got {}.",
                self.density
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub t: f64,
    pub x: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    /// The slope `f(x)` at the segment's centre.
    pub slope: f64,
}

/// Arrow head dimensions in window units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrowHead {
    pub width: f64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlopeField {
    pub kind: FieldKind,
    /// Row-major: one row per grid value of `x`, ascending, each row ascending in `t`.
    pub segments: Vec<Segment>,
    /// Present for direction fields only.
    pub arrow_head: Option<ArrowHead>,
}

/// `n` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Samples `field` on a `density × density` grid over `window`.
///
/// Each segment is centred on a grid point, points along the slope there, and
/// is shorter where the slope is steep so all segments look about the same
/// length on screen. Non-finite slopes are kept as NaN segments so the grid
/// stays rectangular.
pub fn slope_field(
    field: &impl ScalarField<f64>,
    window: &Window,
    settings: &FieldSettings,
) -> Result<SlopeField> {
    window.validate()?;
    settings.validate()?;

    let ts = linspace(window.t_min, window.t_max, settings.density);
    let xs = linspace(window.x_min, window.x_max, settings.density);
    let mut ks = vec![0.0; xs.len()];
    field.apply(&xs, &mut ks);

    let scale = window.diagonal() / 200.0;
    let mut segments = Vec::with_capacity(ts.len() * xs.len());
    for (&x, &k) in xs.iter().zip(&ks) {
        let delta = (scale / (1.0 + k * k)).sqrt() / 2.0;
        for &t in &ts {
            segments.push(Segment {
                start: Point {
                    t: t - delta,
                    x: x - delta * k,
                },
                end: Point {
                    t: t + delta,
                    x: x + delta * k,
                },
                slope: k,
            });
        }
    }

    let arrow_head = match settings.kind {
        FieldKind::Direction => Some(ArrowHead {
            width: scale,
            length: 2.0 * scale,
        }),
        FieldKind::Slope => None,
    };

    log::debug!(
        "sampled {} field segment(s) over {window:?}",
        segments.len()
    );

    Ok(SlopeField {
        kind: settings.kind,
        segments,
        arrow_head,
    })
}
