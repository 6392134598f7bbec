//! Pure decision rules for keeping an incentive estimate in step with the
//! weight the member is looking at.
//!
//! None of these functions hold state or perform I/O. The
//! [`EstimateSynchronizer`](super::EstimateSynchronizer) threads its state
//! through them, and a front end may call them directly.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IncentiveEstimate, PpmRecord, RequestKey, WeightRange};

use super::SyncError;

/// Weight to show on the slider: the pending edit if there is one, else the
/// record's saved estimate, else the middle of `fallback`.
pub fn resolve_current_value(
    baseline: Option<&PpmRecord>,
    pending: Option<i64>,
    fallback: WeightRange,
) -> i64 {
    pending
        .or_else(|| baseline.and_then(|record| record.weight_estimate))
        .unwrap_or_else(|| fallback.midpoint())
}

/// Outcome of a freshly loaded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineDecision {
    /// Weight to display after the load.
    pub display_value: i64,

    /// New pending value. Always the record's saved weight.
    pub pending: i64,

    /// Key to request, when a recompute is needed and the record carries a
    /// complete route.
    pub request_key: Option<RequestKey>,

    /// Estimate already stored on the record, reused when no recompute is
    /// needed.
    pub reused_incentive: Option<Decimal>,
}

impl BaselineDecision {
    pub fn should_request_recompute(&self) -> bool {
        self.request_key.is_some()
    }
}

/// Decides what a newly loaded record means for the estimate.
///
/// Returns `None`, meaning nothing to do, when `new` is the same record as
/// `previous` or carries no weight estimate yet.
///
/// When the pending value already equals the record's saved weight, the
/// saved incentive is reused. Otherwise the pending value is reset to the
/// saved weight and a recompute is requested for it. The request key is
/// `None` when the record lacks a move date or ZIP, in which case nothing
/// can be requested yet.
pub fn on_baseline_loaded(
    new: &PpmRecord,
    previous: Option<&PpmRecord>,
    pending: Option<i64>,
) -> Option<BaselineDecision> {
    if previous == Some(new) {
        return None;
    }
    let saved_weight = new.weight_estimate?;

    if pending == Some(saved_weight) {
        return Some(BaselineDecision {
            display_value: saved_weight,
            pending: saved_weight,
            request_key: None,
            reused_incentive: new.estimated_incentive,
        });
    }

    Some(BaselineDecision {
        display_value: saved_weight,
        pending: saved_weight,
        request_key: new.request_key(saved_weight),
        reused_incentive: None,
    })
}

/// Outcome of a slider movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDecision {
    pub display_value: i64,
}

/// A user edit only moves the displayed value. Requests wait for the
/// commit.
pub fn on_user_edit(new_pending: i64) -> EditDecision {
    EditDecision {
        display_value: new_pending,
    }
}

/// A committed edit always requests a fresh estimate for the current
/// inputs, even if an identical request was issued before.
pub fn on_edit_committed(current_inputs: &RequestKey) -> RequestKey {
    current_inputs.clone()
}

/// Outcome of an estimate response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDecision {
    /// True when the response matches the current inputs and succeeded.
    pub accepted: bool,

    /// The estimate to display from now on. For anything but an accepted
    /// result this is the previously displayed estimate, unchanged.
    pub value: Option<Decimal>,

    /// Set when a current (non-stale) request failed.
    pub error: Option<SyncError>,

    /// True when the response was for inputs that no longer apply.
    pub stale: bool,
}

/// Decides whether an estimate response may be shown.
///
/// Responses can arrive out of order, so only one whose `request_key`
/// equals the key of the inputs on screen *now* is accepted. Anything else
/// is stale and dropped. A failed response for the current inputs is
/// reported as an error but leaves the displayed estimate alone, as do
/// stale failures, which are dropped silently.
pub fn on_computation_result(
    request_key: &RequestKey,
    current_inputs: Option<&RequestKey>,
    outcome: Result<&IncentiveEstimate, &str>,
    displayed: Option<Decimal>,
) -> ResultDecision {
    if current_inputs != Some(request_key) {
        return ResultDecision {
            accepted: false,
            value: displayed,
            error: None,
            stale: true,
        };
    }

    match outcome {
        Ok(estimate) => ResultDecision {
            accepted: true,
            value: Some(estimate.incentive),
            error: None,
            stale: false,
        },
        Err(message) => ResultDecision {
            accepted: false,
            value: displayed,
            error: Some(SyncError::ComputationFailure(message.to_string())),
            stale: false,
        },
    }
}
