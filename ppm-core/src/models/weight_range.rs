use serde::{Deserialize, Serialize};

/// Inclusive bounds, in pounds, for the weight-estimate slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRange {
    pub min: i64,
    pub max: i64,
}

impl WeightRange {
    pub const fn new(
        min: i64,
        max: i64,
    ) -> Self {
        Self { min, max }
    }

    /// Midpoint of the range, computed as `min + (max - min) / 2`.
    ///
    /// Written this way rather than `(min + max) / 2` so it cannot overflow
    /// for wide ranges.
    pub fn midpoint(&self) -> i64 {
        self.min + (self.max - self.min) / 2
    }

    pub fn contains(
        &self,
        weight: i64,
    ) -> bool {
        (self.min..=self.max).contains(&weight)
    }
}
