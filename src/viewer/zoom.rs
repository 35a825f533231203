//! Zoom state for the document viewer
//!
//! Scale moves in fixed additive steps and is clamped to a closed range.
//! Clamping is silent: stepping past a bound leaves the scale on the bound.

/// Zoom factor applied uniformly to every page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    /// Current zoom factor (1.0 = 100%)
    factor: f32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: Self::DEFAULT_SCALE,
        }
    }
}

impl Zoom {
    /// Additive step per zoom action - 10 percentage points
    pub const STEP: f32 = 0.1;
    /// Minimum allowed zoom factor
    pub const MIN_SCALE: f32 = 0.7;
    /// Maximum allowed zoom factor
    pub const MAX_SCALE: f32 = 2.0;
    /// Factor used before any zoom action
    pub const DEFAULT_SCALE: f32 = 1.0;

    /// Create a zoom state starting at `factor`, clamped into range
    #[must_use]
    pub fn new(factor: f32) -> Self {
        Self {
            factor: Self::clamp_factor(factor),
        }
    }

    /// Returns the current zoom factor
    #[must_use]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Zoom in by one step
    pub fn step_in(&mut self) {
        self.factor = Self::MAX_SCALE.min(self.factor + Self::STEP);
    }

    /// Zoom out by one step
    pub fn step_out(&mut self) {
        self.factor = Self::MIN_SCALE.max(self.factor - Self::STEP);
    }

    /// Percentage label, `round(factor * 100)` followed by `%`.
    ///
    /// Rounds half away from zero; the scale is always positive so this is
    /// the same as rounding half up.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}%", (self.factor * 100.0).round() as i32)
    }

    /// Clamp factor to valid range, handling NaN/Inf
    #[must_use]
    pub fn clamp_factor(factor: f32) -> f32 {
        if !factor.is_finite() {
            Self::DEFAULT_SCALE
        } else {
            factor.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        }
    }
}
