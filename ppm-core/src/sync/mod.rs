//! Keeps the PPM incentive estimate in step with the weight on screen.
//!
//! The weight page shows a slider seeded from the move's saved record and an
//! incentive computed remotely for the weight on the slider. Records load
//! asynchronously, the member drags the slider, and estimate responses can
//! come back in any order. [`EstimateSynchronizer`] reduces those events to
//! what should be displayed and which estimate requests should be sent.
//!
//! The synchronizer never performs I/O itself. Each call to
//! [`EstimateSynchronizer::apply`] returns a [`SyncOutput`] whose optional
//! [`SyncCommand`] the caller executes, feeding the response back in as a
//! [`SyncEvent::ComputationResult`].

mod machine;
pub mod rules;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{IncentiveEstimate, PpmRecord, RequestKey};

pub use machine::{EstimateSynchronizer, WeightSubmission};
pub use rules::{
    BaselineDecision, EditDecision, ResultDecision, on_baseline_loaded, on_computation_result,
    on_edit_committed, on_user_edit, resolve_current_value,
};

/// Where the synchronizer is in the load/edit/estimate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No record has loaded yet.
    Uninitialized,
    /// A record is loaded and no estimate is outstanding or shown.
    Loaded,
    /// The member has moved the slider without committing.
    Editing,
    /// An estimate request is in flight.
    Committing,
    /// The displayed estimate matches the inputs it was requested for.
    Resolved,
    /// The last load or estimate failed.
    Errored,
}

/// Failures surfaced to the display. They are data, never propagated.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncError {
    #[error("could not load move: {0}")]
    LoadFailure(String),

    #[error("could not calculate incentive: {0}")]
    ComputationFailure(String),
}

/// Inputs to the synchronizer, in the order the event loop observes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A record load finished.
    BaselineLoaded(PpmRecord),
    /// A record load failed.
    BaselineFailed(String),
    /// The slider moved.
    UserEdit(i64),
    /// The slider was released.
    EditCommitted,
    /// An estimate request finished.
    ComputationResult {
        key: RequestKey,
        outcome: Result<IncentiveEstimate, String>,
    },
}

/// Side effect the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncCommand {
    RequestEstimate(RequestKey),
}

/// What the display should render after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    pub display_value: i64,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub incentive: Option<Decimal>,
    /// False until a record has loaded. The display value is then the
    /// fallback midpoint.
    pub is_ready: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutput {
    pub display: DisplayState,
    pub command: Option<SyncCommand>,
}

impl SyncOutput {
    /// Key to request, if this event requires a new estimate.
    pub fn requested_key(&self) -> Option<&RequestKey> {
        match &self.command {
            Some(SyncCommand::RequestEstimate(key)) => Some(key),
            None => None,
        }
    }
}
