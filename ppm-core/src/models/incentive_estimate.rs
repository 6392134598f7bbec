use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of one incentive computation, in dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveEstimate {
    /// Government constructed cost: what a contracted mover would be paid.
    pub gcc: Decimal,

    /// The member's share of the GCC.
    pub incentive: Decimal,
}
