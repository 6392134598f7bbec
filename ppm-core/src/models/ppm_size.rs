use serde::{Deserialize, Serialize};

use super::WeightRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PpmSize {
    Small,
    Medium,
    Large,
}

impl PpmSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "S" => Some(Self::Small),
            "M" => Some(Self::Medium),
            "L" => Some(Self::Large),
            _ => None,
        }
    }

    /// Slider bounds offered for a move of this size.
    pub fn weight_range(&self) -> WeightRange {
        match self {
            Self::Small => WeightRange::new(100, 800),
            Self::Medium => WeightRange::new(400, 1200),
            Self::Large => WeightRange::new(1000, 5000),
        }
    }

    /// Range used when the size is unknown (no record loaded yet, or the
    /// record has no size). Matches the large-move bounds.
    pub fn weight_range_or_default(size: Option<Self>) -> WeightRange {
        size.unwrap_or(Self::Large).weight_range()
    }
}
