//! Pure calculations behind the PPM screens.
//!
//! Everything here is a stateless function of its inputs: the incentive
//! formula, move-date availability, and entitlement limits.

pub mod calendar;
pub mod common;
pub mod entitlement;
pub mod incentive;

pub use calendar::{AvailableMoveDates, is_day_disabled, pack_days, unavailable_move_dates};
pub use entitlement::{EntitlementError, validate_weight_estimate};
pub use incentive::{FlatRateSchedule, INCENTIVE_RATE, IncentiveError, incentive_for_gcc};
