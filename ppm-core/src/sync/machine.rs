use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::{IncentiveEstimate, PpmRecord, PpmSize, RequestKey, WeightRange};

use super::rules;
use super::{DisplayState, Phase, SyncCommand, SyncError, SyncEvent, SyncOutput};

/// Values to save when the member submits the weight page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSubmission {
    pub ppm_id: i64,
    pub weight_estimate: i64,
    pub estimated_incentive: Option<Decimal>,
}

/// Event-driven state machine for one PPM weight page.
///
/// Single-threaded: the owner feeds events in delivery order through
/// [`Self::apply`] and executes any returned [`SyncCommand`]. Requests are
/// fire-and-forget; several may be in flight and out-of-order responses
/// are discarded by comparing request keys.
#[derive(Debug, Clone)]
pub struct EstimateSynchronizer {
    phase: Phase,
    baseline: Option<PpmRecord>,
    pending: Option<i64>,
    last_requested: Option<RequestKey>,
    awaiting: Option<RequestKey>,
    estimate: Option<Decimal>,
    /// Inputs `estimate` was computed for.
    estimate_key: Option<RequestKey>,
    error: Option<SyncError>,
}

impl Default for EstimateSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimateSynchronizer {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
            baseline: None,
            pending: None,
            last_requested: None,
            awaiting: None,
            estimate: None,
            estimate_key: None,
            error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn baseline(&self) -> Option<&PpmRecord> {
        self.baseline.as_ref()
    }

    pub fn pending(&self) -> Option<i64> {
        self.pending
    }

    /// Last accepted incentive.
    pub fn estimate(&self) -> Option<Decimal> {
        self.estimate
    }

    /// True when the last accepted incentive was computed for the inputs on
    /// screen.
    pub fn estimate_is_current(&self) -> bool {
        self.estimate.is_some() && self.estimate_key == self.current_key()
    }

    pub fn last_requested(&self) -> Option<&RequestKey> {
        self.last_requested.as_ref()
    }

    pub fn error(&self) -> Option<&SyncError> {
        self.error.as_ref()
    }

    /// True once a record has loaded.
    pub fn is_ready(&self) -> bool {
        self.baseline.is_some()
    }

    /// Slider bounds for the loaded record, or the default bounds before
    /// any record has loaded.
    pub fn fallback_range(&self) -> WeightRange {
        PpmSize::weight_range_or_default(self.baseline.as_ref().and_then(|b| b.size))
    }

    pub fn current_value(&self) -> i64 {
        rules::resolve_current_value(self.baseline.as_ref(), self.pending, self.fallback_range())
    }

    /// Key for the inputs currently on screen, if the route is complete.
    pub fn current_key(&self) -> Option<RequestKey> {
        self.baseline.as_ref()?.request_key(self.current_value())
    }

    pub fn display(&self) -> DisplayState {
        DisplayState {
            display_value: self.current_value(),
            is_loading: self.phase == Phase::Uninitialized || self.awaiting.is_some(),
            error_message: self.error.as_ref().map(ToString::to_string),
            incentive: self.estimate,
            is_ready: self.is_ready(),
        }
    }

    /// What to save on submit, once a record is loaded. The incentive is
    /// left out unless it was computed for the weight being saved.
    pub fn submission(&self) -> Option<WeightSubmission> {
        let baseline = self.baseline.as_ref()?;
        let estimated_incentive = if self.estimate_is_current() {
            self.estimate
        } else {
            None
        };
        Some(WeightSubmission {
            ppm_id: baseline.id,
            weight_estimate: self.current_value(),
            estimated_incentive,
        })
    }

    /// Applies one event and returns what to display and what to request.
    pub fn apply(
        &mut self,
        event: SyncEvent,
    ) -> SyncOutput {
        let command = match event {
            SyncEvent::BaselineLoaded(record) => self.baseline_loaded(record),
            SyncEvent::BaselineFailed(reason) => {
                self.baseline_failed(reason);
                None
            }
            SyncEvent::UserEdit(weight) => {
                self.user_edit(weight);
                None
            }
            SyncEvent::EditCommitted => self.edit_committed(),
            SyncEvent::ComputationResult { key, outcome } => {
                self.computation_result(key, outcome);
                None
            }
        };

        debug!(phase = ?self.phase, "synchronizer transition");
        SyncOutput {
            display: self.display(),
            command,
        }
    }

    fn baseline_loaded(
        &mut self,
        record: PpmRecord,
    ) -> Option<SyncCommand> {
        let decision = rules::on_baseline_loaded(&record, self.baseline.as_ref(), self.pending);
        let ppm_id = record.id;
        self.baseline = Some(record);
        if matches!(self.error, Some(SyncError::LoadFailure(_))) {
            self.error = None;
        }

        let Some(decision) = decision else {
            debug!(ppm_id, "record unchanged or has no weight estimate");
            self.phase = self.settled_phase();
            return None;
        };

        self.pending = Some(decision.pending);

        if let Some(incentive) = decision.reused_incentive {
            debug!(ppm_id, %incentive, "reusing saved incentive");
            self.estimate = Some(incentive);
            self.estimate_key = self.current_key();
        }

        let command = match decision.request_key {
            Some(key) if self.last_requested.as_ref() == Some(&key) => {
                debug!(%key, "estimate already requested for these inputs");
                None
            }
            Some(key) => Some(self.issue(key)),
            None => {
                if decision.reused_incentive.is_none() && self.current_key().is_none() {
                    warn!(ppm_id, "move date or ZIP missing; cannot estimate incentive");
                }
                None
            }
        };

        if command.is_none() {
            if self.estimate.is_some() && !self.estimate_is_current() {
                debug!(ppm_id, "record inputs changed; dropping estimate for old inputs");
                self.estimate = None;
                self.estimate_key = None;
            }
            self.phase = self.settled_phase();
        }
        command
    }

    fn baseline_failed(
        &mut self,
        reason: String,
    ) {
        error!(%reason, "failed to load move record");
        self.error = Some(SyncError::LoadFailure(reason));
        self.phase = Phase::Errored;
    }

    fn user_edit(
        &mut self,
        weight: i64,
    ) {
        let decision = rules::on_user_edit(weight);
        self.pending = Some(decision.display_value);
        self.phase = Phase::Editing;
    }

    fn edit_committed(&mut self) -> Option<SyncCommand> {
        let Some(inputs) = self.current_key() else {
            warn!(
                ready = self.is_ready(),
                "cannot request estimate: move date or ZIP missing"
            );
            return None;
        };
        Some(self.issue(rules::on_edit_committed(&inputs)))
    }

    fn computation_result(
        &mut self,
        key: RequestKey,
        outcome: Result<IncentiveEstimate, String>,
    ) {
        if self.awaiting.as_ref() == Some(&key) {
            self.awaiting = None;
        }

        let current = self.current_key();
        let decision = rules::on_computation_result(
            &key,
            current.as_ref(),
            outcome.as_ref().map_err(String::as_str),
            self.estimate,
        );

        if decision.stale {
            debug!(%key, "discarding stale estimate");
            if self.phase == Phase::Committing {
                self.phase = self.settled_phase();
            }
            return;
        }

        if decision.accepted {
            info!(%key, incentive = ?decision.value, "incentive estimate updated");
            self.estimate = decision.value;
            self.estimate_key = Some(key);
            self.error = None;
            self.phase = self.settled_phase();
        } else if let Some(err) = decision.error {
            error!(%key, error = %err, "incentive estimate failed");
            self.error = Some(err);
            self.phase = Phase::Errored;
        }
    }

    fn issue(
        &mut self,
        key: RequestKey,
    ) -> SyncCommand {
        debug!(%key, "requesting incentive estimate");
        self.last_requested = Some(key.clone());
        self.awaiting = Some(key.clone());
        self.phase = Phase::Committing;
        SyncCommand::RequestEstimate(key)
    }

    fn settled_phase(&self) -> Phase {
        if self.baseline.is_none() {
            if self.error.is_some() {
                Phase::Errored
            } else {
                Phase::Uninitialized
            }
        } else if self.awaiting.is_some() {
            Phase::Committing
        } else if self.estimate_is_current() {
            Phase::Resolved
        } else {
            Phase::Loaded
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::fixtures::{move_date, record, record_with_incentive};

    fn key(weight: i64) -> RequestKey {
        RequestKey {
            planned_move_date: move_date(),
            origin_zip: "90210".to_string(),
            destination_zip: "50309".to_string(),
            weight,
        }
    }

    fn ok(
        weight: i64,
        incentive: Decimal,
    ) -> SyncEvent {
        SyncEvent::ComputationResult {
            key: key(weight),
            outcome: Ok(IncentiveEstimate {
                gcc: incentive,
                incentive,
            }),
        }
    }

    fn loaded(weight: i64) -> EstimateSynchronizer {
        let mut sync = EstimateSynchronizer::new();
        sync.apply(SyncEvent::BaselineLoaded(record(Some(weight))));
        sync
    }

    // =========================================================================
    // loading
    // =========================================================================

    #[test]
    fn starts_uninitialized_with_midpoint_display() {
        let sync = EstimateSynchronizer::new();
        let display = sync.display();

        assert_eq!(sync.phase(), Phase::Uninitialized);
        assert_eq!(display.display_value, 3000);
        assert!(display.is_loading);
        assert!(!display.is_ready);
    }

    #[test]
    fn baseline_load_requests_estimate_for_saved_weight() {
        let mut sync = EstimateSynchronizer::new();

        let out = sync.apply(SyncEvent::BaselineLoaded(record(Some(4000))));

        assert_eq!(out.display.display_value, 4000);
        assert_eq!(out.requested_key(), Some(&key(4000)));
        assert_eq!(sync.phase(), Phase::Committing);
        assert!(out.display.is_loading);
    }

    #[test]
    fn identical_reload_does_not_request_again() {
        let mut sync = loaded(4000);

        let out = sync.apply(SyncEvent::BaselineLoaded(record(Some(4000))));

        assert_eq!(out.command, None);
    }

    #[test]
    fn changed_record_at_pending_weight_requests_nothing() {
        let mut sync = loaded(4000);
        let mut touched = record(Some(4000));
        touched.move_id = "move-1-renamed".to_string();

        let out = sync.apply(SyncEvent::BaselineLoaded(touched));

        assert_eq!(out.command, None);
        assert_eq!(sync.last_requested(), Some(&key(4000)));
    }

    #[test]
    fn reload_back_to_last_requested_key_is_deduplicated() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::UserEdit(4500));
        let mut touched = record(Some(4000));
        touched.move_id = "move-1-renamed".to_string();

        let out = sync.apply(SyncEvent::BaselineLoaded(touched));

        assert_eq!(out.command, None);
        assert_eq!(sync.pending(), Some(4000));
        assert_eq!(out.display.display_value, 4000);
    }

    #[test]
    fn reload_after_save_reuses_stored_incentive() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));

        let out = sync.apply(SyncEvent::BaselineLoaded(record_with_incentive(
            4000,
            dec!(3900),
        )));

        assert_eq!(out.command, None);
        assert_eq!(out.display.incentive, Some(dec!(3900)));
        assert_eq!(sync.phase(), Phase::Resolved);
    }

    #[test]
    fn record_without_weight_shows_size_midpoint() {
        let mut sync = EstimateSynchronizer::new();
        let mut ppm = record(None);
        ppm.size = Some(PpmSize::Medium);

        let out = sync.apply(SyncEvent::BaselineLoaded(ppm));

        assert_eq!(out.command, None);
        assert_eq!(out.display.display_value, 800);
        assert_eq!(sync.phase(), Phase::Loaded);
    }

    #[test]
    fn load_failure_is_not_ready_and_uses_fallback() {
        let mut sync = EstimateSynchronizer::new();

        let out = sync.apply(SyncEvent::BaselineFailed("404 not found".to_string()));

        assert_eq!(sync.phase(), Phase::Errored);
        assert!(!out.display.is_ready);
        assert_eq!(out.display.display_value, 3000);
        assert_eq!(
            out.display.error_message.as_deref(),
            Some("could not load move: 404 not found")
        );
    }

    #[test]
    fn successful_reload_clears_load_failure() {
        let mut sync = EstimateSynchronizer::new();
        sync.apply(SyncEvent::BaselineFailed("timeout".to_string()));

        let out = sync.apply(SyncEvent::BaselineLoaded(record(Some(4000))));

        assert_eq!(out.display.error_message, None);
        assert_eq!(out.requested_key(), Some(&key(4000)));
    }

    // =========================================================================
    // editing and committing
    // =========================================================================

    #[test]
    fn user_edit_updates_display_without_request() {
        let mut sync = loaded(4000);

        let out = sync.apply(SyncEvent::UserEdit(4500));

        assert_eq!(out.display.display_value, 4500);
        assert_eq!(out.command, None);
        assert_eq!(sync.phase(), Phase::Editing);
    }

    #[test]
    fn commit_requests_estimate_for_edited_weight() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::UserEdit(4500));

        let out = sync.apply(SyncEvent::EditCommitted);

        assert_eq!(out.requested_key(), Some(&key(4500)));
        assert_eq!(sync.phase(), Phase::Committing);
    }

    #[test]
    fn repeated_commit_always_requests() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::UserEdit(4500));
        sync.apply(SyncEvent::EditCommitted);

        let out = sync.apply(SyncEvent::EditCommitted);

        assert_eq!(out.requested_key(), Some(&key(4500)));
    }

    #[test]
    fn commit_without_record_requests_nothing() {
        let mut sync = EstimateSynchronizer::new();
        sync.apply(SyncEvent::UserEdit(4500));

        let out = sync.apply(SyncEvent::EditCommitted);

        assert_eq!(out.command, None);
    }

    // =========================================================================
    // results
    // =========================================================================

    #[test]
    fn matching_result_is_displayed() {
        let mut sync = loaded(4000);

        let out = sync.apply(ok(4000, dec!(3800)));

        assert_eq!(out.display.incentive, Some(dec!(3800)));
        assert!(!out.display.is_loading);
        assert_eq!(sync.phase(), Phase::Resolved);
    }

    #[test]
    fn out_of_order_result_is_discarded() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        sync.apply(SyncEvent::UserEdit(4500));
        sync.apply(SyncEvent::EditCommitted);
        sync.apply(SyncEvent::UserEdit(4800));
        sync.apply(SyncEvent::EditCommitted);

        // The 4500 response lands after the member committed 4800.
        let out = sync.apply(ok(4500, dec!(4275)));

        assert_eq!(out.display.incentive, Some(dec!(3800)));

        let out = sync.apply(ok(4800, dec!(4560)));

        assert_eq!(out.display.incentive, Some(dec!(4560)));
        assert_eq!(sync.phase(), Phase::Resolved);
    }

    #[test]
    fn result_after_uncommitted_edit_is_stale() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::UserEdit(4200));

        let out = sync.apply(ok(4000, dec!(3800)));

        assert_eq!(out.display.incentive, None);
        assert_eq!(sync.phase(), Phase::Editing);
    }

    #[test]
    fn failed_result_keeps_last_estimate_and_reports_error() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        sync.apply(SyncEvent::UserEdit(4500));
        sync.apply(SyncEvent::EditCommitted);

        let out = sync.apply(SyncEvent::ComputationResult {
            key: key(4500),
            outcome: Err("rate engine unavailable".to_string()),
        });

        assert_eq!(sync.phase(), Phase::Errored);
        assert_eq!(out.display.incentive, Some(dec!(3800)));
        assert_eq!(
            out.display.error_message.as_deref(),
            Some("could not calculate incentive: rate engine unavailable")
        );
        assert!(!out.display.is_loading);
    }

    #[test]
    fn accepted_result_clears_previous_error() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::ComputationResult {
            key: key(4000),
            outcome: Err("timeout".to_string()),
        });
        sync.apply(SyncEvent::EditCommitted);

        let out = sync.apply(ok(4000, dec!(3800)));

        assert_eq!(out.display.error_message, None);
        assert_eq!(out.display.incentive, Some(dec!(3800)));
    }

    // =========================================================================
    // submission
    // =========================================================================

    #[test]
    fn submission_carries_current_weight_and_estimate() {
        let mut sync = loaded(4000);
        sync.apply(SyncEvent::UserEdit(4500));
        sync.apply(SyncEvent::EditCommitted);
        sync.apply(ok(4500, dec!(4275)));

        assert_eq!(
            sync.submission(),
            Some(WeightSubmission {
                ppm_id: 1,
                weight_estimate: 4500,
                estimated_incentive: Some(dec!(4275)),
            })
        );
    }

    #[test]
    fn submission_after_uncommitted_edit_leaves_incentive_out() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        sync.apply(SyncEvent::UserEdit(4500));

        assert_eq!(
            sync.submission(),
            Some(WeightSubmission {
                ppm_id: 1,
                weight_estimate: 4500,
                estimated_incentive: None,
            })
        );
    }

    #[test]
    fn submission_after_failed_commit_leaves_incentive_out() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        sync.apply(SyncEvent::UserEdit(4500));
        sync.apply(SyncEvent::EditCommitted);
        sync.apply(SyncEvent::ComputationResult {
            key: key(4500),
            outcome: Err("timeout".to_string()),
        });

        let submission = sync.submission().unwrap();

        assert_eq!(submission.weight_estimate, 4500);
        assert_eq!(submission.estimated_incentive, None);
    }

    #[test]
    fn reload_of_submitted_edit_does_not_show_old_incentive() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        sync.apply(SyncEvent::UserEdit(4500));
        let submission = sync.submission().unwrap();

        let mut saved = record(Some(submission.weight_estimate));
        saved.estimated_incentive = submission.estimated_incentive;
        let out = sync.apply(SyncEvent::BaselineLoaded(saved));

        assert_eq!(out.command, None);
        assert_eq!(out.display.display_value, 4500);
        assert_eq!(out.display.incentive, None);
        assert_eq!(sync.phase(), Phase::Loaded);
    }

    #[test]
    fn route_change_at_same_weight_drops_old_estimate() {
        let mut sync = loaded(4000);
        sync.apply(ok(4000, dec!(3800)));
        let mut moved = record(Some(4000));
        moved.planned_move_date = NaiveDate::from_ymd_opt(2018, 6, 16);

        let out = sync.apply(SyncEvent::BaselineLoaded(moved));

        assert_eq!(out.command, None);
        assert_eq!(out.display.incentive, None);
        assert!(!sync.estimate_is_current());
        assert_eq!(sync.phase(), Phase::Loaded);
    }

    #[test]
    fn no_submission_before_load() {
        assert_eq!(EstimateSynchronizer::new().submission(), None);
    }
}
