//! Axis extents covering every method of a run.

use serde::{Deserialize, Serialize};

use super::SimulationData;

/// Fraction of the span added on each side of the physical-space axes.
pub const SPACE_MARGIN_FRACTION: f64 = 0.1;

/// Absolute padding on each side of the phase-space axes.
pub const PHASE_MARGIN: f64 = 0.3;

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    /// Lower end.
    pub min: f64,
    /// Upper end.
    pub max: f64,
}

impl Extent {
    /// Smallest interval containing all `values`, or `None` if empty.
    #[must_use]
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| {
            Some(match acc {
                None => Self { min: v, max: v },
                Some(e) => Self {
                    min: e.min.min(v),
                    max: e.max.max(v),
                },
            })
        })
    }

    /// Width of the interval.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Grow both ends by `amount`.
    #[must_use]
    pub fn padded(&self, amount: f64) -> Self {
        Self {
            min: self.min - amount,
            max: self.max + amount,
        }
    }

    /// Whether `v` lies inside.
    #[must_use]
    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

/// Axis limits for the physical-space and phase-space views of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotBounds {
    /// Horizontal position.
    pub x: Extent,
    /// Vertical position.
    pub y: Extent,
    /// Angle.
    pub phi: Extent,
    /// Angular velocity.
    pub phi_dot: Extent,
}

impl PlotBounds {
    /// Bounds over all trajectories of `data` plus the attachment point.
    ///
    /// Position axes are padded by 10% of their span, phase-space axes by
    /// 0.3 in their own units.
    #[must_use]
    pub fn from_data(data: &SimulationData) -> Self {
        let anchor = data.arm.attachment;
        let positions = || data.trajectories.values().flat_map(|t| t.r.iter().copied());

        let x = Extent::of(positions().map(|r| r.x).chain([anchor.x]))
            .unwrap_or(Extent { min: anchor.x, max: anchor.x });
        let y = Extent::of(positions().map(|r| r.y).chain([anchor.y]))
            .unwrap_or(Extent { min: anchor.y, max: anchor.y });

        let phi = Extent::of(data.trajectories.values().flat_map(|t| t.phi.iter().copied()))
            .unwrap_or(Extent { min: 0.0, max: 0.0 });
        let phi_dot =
            Extent::of(data.trajectories.values().flat_map(|t| t.phi_dot.iter().copied()))
                .unwrap_or(Extent { min: 0.0, max: 0.0 });

        Self {
            x: x.padded(SPACE_MARGIN_FRACTION * x.span().abs()),
            y: y.padded(SPACE_MARGIN_FRACTION * y.span().abs()),
            phi: phi.padded(PHASE_MARGIN),
            phi_dot: phi_dot.padded(PHASE_MARGIN),
        }
    }
}
