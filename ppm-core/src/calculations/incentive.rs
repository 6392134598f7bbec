//! PPM incentive calculation.
//!
//! A member who moves their own belongings is paid a fixed share of the
//! government constructed cost (GCC), the amount a contracted mover would
//! have been paid for the same weight and route.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::IncentiveEstimate;
use crate::calculations::common::round_to_cents;

/// Share of the GCC paid to the member (95%).
pub const INCENTIVE_RATE: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncentiveError {
    /// A GCC below zero cannot come from a valid tariff lookup.
    #[error("government constructed cost cannot be negative: {0}")]
    NegativeGcc(Decimal),

    #[error("weight must be at least 1 lb, got {0}")]
    InvalidWeight(i64),
}

/// Computes the incentive for a given GCC, rounded half-up to cents.
pub fn incentive_for_gcc(gcc: Decimal) -> Result<Decimal, IncentiveError> {
    if gcc < Decimal::ZERO {
        return Err(IncentiveError::NegativeGcc(gcc));
    }
    Ok(round_to_cents(gcc * INCENTIVE_RATE))
}

impl IncentiveEstimate {
    /// Builds an estimate from a GCC, applying [`INCENTIVE_RATE`].
    pub fn from_gcc(gcc: Decimal) -> Result<Self, IncentiveError> {
        Ok(Self {
            gcc: round_to_cents(gcc),
            incentive: incentive_for_gcc(gcc)?,
        })
    }
}

/// Flat-rate GCC schedule: a base fee plus a linehaul charge per
/// hundredweight (100 lbs).
///
/// Stands in for the tariff engine when no remote estimate service is
/// reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatRateSchedule {
    pub base_fee: Decimal,
    pub rate_per_cwt: Decimal,
}

impl FlatRateSchedule {
    pub fn gcc(
        &self,
        weight: i64,
    ) -> Result<Decimal, IncentiveError> {
        if weight < 1 {
            return Err(IncentiveError::InvalidWeight(weight));
        }
        let cwt = Decimal::from(weight) / Decimal::ONE_HUNDRED;
        Ok(round_to_cents(self.base_fee + cwt * self.rate_per_cwt))
    }

    pub fn estimate(
        &self,
        weight: i64,
    ) -> Result<IncentiveEstimate, IncentiveError> {
        IncentiveEstimate::from_gcc(self.gcc(weight)?)
    }
}
