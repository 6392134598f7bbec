//! Weight entitlement checks.

use thiserror::Error;

use crate::calculations::common::format_thousands;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntitlementError {
    #[error(
        "your estimated weight of {} lbs is above your weight entitlement of {} lbs. \
         You will only be paid for the weight you move up to your weight entitlement",
        lbs(.weight_estimate),
        lbs(.entitlement)
    )]
    AboveEntitlement {
        weight_estimate: i64,
        entitlement: i64,
    },
}

fn lbs(pounds: &i64) -> String {
    format_thousands(*pounds)
}

/// Fails when the member plans to carry more than they will be paid for.
/// An estimate exactly at the entitlement is accepted.
pub fn validate_weight_estimate(
    weight_estimate: i64,
    entitlement: i64,
) -> Result<(), EntitlementError> {
    if weight_estimate > entitlement {
        return Err(EntitlementError::AboveEntitlement {
            weight_estimate,
            entitlement,
        });
    }
    Ok(())
}
