//! Drives the core types against real I/O.
//!
//! [`WeightPage`] owns one [`EstimateSynchronizer`], executes the estimate
//! requests it asks for on the tokio runtime and feeds the responses back
//! in the order they complete.

use std::sync::Arc;

use chrono::NaiveDate;
use ppm_core::calculations::{AvailableMoveDates, unavailable_move_dates};
use ppm_core::db::RepositoryRegistry;
use ppm_core::fields::{FieldTable, IncentiveCalculatorForm};
use ppm_core::sync::DisplayState;
use ppm_core::{
    AuthSession, EstimateService, EstimateServiceError, EstimateSynchronizer, IncentiveEstimate,
    PpmRecord, PpmRepository, RepositoryError, RequestKey, SyncCommand, SyncEvent, SyncOutput,
};
use ppm_db_sqlite::SqliteRepositoryFactory;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Registry with every backend this binary can open.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("no move is loaded")]
    NotLoaded,

    #[error("you must be logged in to use the incentive calculator")]
    NotLoggedIn,

    #[error("{}", .0.join(" "))]
    InvalidForm(Vec<String>),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Estimate(#[from] EstimateServiceError),
}

/// The PPM weight page: a loaded move, a slider, and the incentive for
/// the weight on the slider.
pub struct WeightPage {
    sync: EstimateSynchronizer,
    service: Arc<dyn EstimateService>,
    tx: mpsc::UnboundedSender<SyncEvent>,
    rx: mpsc::UnboundedReceiver<SyncEvent>,
    in_flight: usize,
}

impl WeightPage {
    pub fn new(service: Arc<dyn EstimateService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            sync: EstimateSynchronizer::new(),
            service,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn synchronizer(&self) -> &EstimateSynchronizer {
        &self.sync
    }

    pub fn display(&self) -> DisplayState {
        self.sync.display()
    }

    /// Estimate requests sent but not yet fed back.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Loads (or reloads) the move's record.
    pub async fn load(
        &mut self,
        repo: &dyn PpmRepository,
        ppm_id: i64,
    ) -> SyncOutput {
        let event = match repo.get_ppm(ppm_id).await {
            Ok(record) => SyncEvent::BaselineLoaded(record),
            Err(e) => {
                error!(ppm_id, error = %e, "failed to load ppm");
                SyncEvent::BaselineFailed(e.to_string())
            }
        };
        self.handle(event)
    }

    pub fn edit(
        &mut self,
        weight: i64,
    ) -> SyncOutput {
        self.handle(SyncEvent::UserEdit(weight))
    }

    pub fn commit(&mut self) -> SyncOutput {
        self.handle(SyncEvent::EditCommitted)
    }

    /// Waits for the next estimate response and applies it. Returns `None`
    /// when nothing is in flight.
    pub async fn next_result(&mut self) -> Option<SyncOutput> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.rx.recv().await?;
        self.in_flight -= 1;
        Some(self.handle(event))
    }

    /// Applies every outstanding response, in completion order.
    pub async fn settle(&mut self) -> DisplayState {
        while self.next_result().await.is_some() {}
        self.sync.display()
    }

    /// Saves the weight on the slider and the incentive shown for it.
    pub async fn submit(
        &self,
        repo: &dyn PpmRepository,
    ) -> Result<PpmRecord, AppError> {
        let submission = self.sync.submission().ok_or(AppError::NotLoaded)?;
        let saved = repo
            .save_weight_estimate(
                submission.ppm_id,
                submission.weight_estimate,
                submission.estimated_incentive,
            )
            .await?;
        info!(
            ppm_id = saved.id,
            weight = submission.weight_estimate,
            "weight estimate saved"
        );
        Ok(saved)
    }

    fn handle(
        &mut self,
        event: SyncEvent,
    ) -> SyncOutput {
        let output = self.sync.apply(event);
        if let Some(SyncCommand::RequestEstimate(key)) = &output.command {
            self.spawn_request(key.clone());
        }
        output
    }

    fn spawn_request(
        &mut self,
        key: RequestKey,
    ) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        self.in_flight += 1;
        debug!(%key, in_flight = self.in_flight, "requesting estimate");

        tokio::spawn(async move {
            let request_key = key.clone();
            let task = tokio::spawn(async move { service.estimate(&request_key).await });
            // A panicking service still answers, so `in_flight` drains.
            let outcome = match task.await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(e) => Err(format!("estimate task failed: {e}")),
            };
            let _ = tx.send(SyncEvent::ComputationResult { key, outcome });
        });
    }
}

/// Move-date picker bounds for a move booked on `start`.
pub fn move_date_picker(start: NaiveDate) -> AvailableMoveDates {
    AvailableMoveDates::from_unavailable(start, &unavailable_move_dates(start))
}

/// Office incentive calculator: validates the form and asks the service.
pub async fn calculate_incentive(
    session: &AuthSession,
    table: &FieldTable,
    form: &IncentiveCalculatorForm,
    service: &dyn EstimateService,
) -> Result<IncentiveEstimate, AppError> {
    if !session.is_logged_in() {
        return Err(AppError::NotLoggedIn);
    }
    let key = form.validate(table).map_err(AppError::InvalidForm)?;
    Ok(service.estimate(&key).await?)
}
