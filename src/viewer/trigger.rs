//! One-shot visibility trigger
//!
//! Observes the visible ratio of the region that contains the viewer and
//! fires exactly once, the first time that ratio reaches the threshold.
//! After firing it stops observing for good.

/// Default fraction of the region that must be on screen before loading
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 0.15;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerState {
    /// Still observing
    Armed,
    /// Disengaged, terminal
    Fired,
}

#[derive(Debug)]
pub struct VisibilityTrigger {
    threshold: f32,
    state: TriggerState,
}

impl Default for VisibilityTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

impl VisibilityTrigger {
    #[must_use]
    pub fn new(threshold: f32) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            DEFAULT_VISIBILITY_THRESHOLD
        };
        Self {
            threshold,
            state: TriggerState::Armed,
        }
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state == TriggerState::Armed
    }

    /// Feed an observed intersection ratio.
    ///
    /// Returns `true` only on the Armed -> Fired transition. A ratio of zero
    /// never fires, even with a zero threshold, since nothing is on screen.
    pub fn observe(&mut self, visible_ratio: f32) -> bool {
        if self.state == TriggerState::Fired {
            return false;
        }
        if visible_ratio > 0.0 && visible_ratio >= self.threshold {
            self.state = TriggerState::Fired;
            return true;
        }
        false
    }
}
