use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{NewPpmRecord, PpmRecord};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Loads and saves PPM records.
#[async_trait]
pub trait PpmRepository: Send + Sync {
    async fn get_ppm(
        &self,
        id: i64,
    ) -> Result<PpmRecord, RepositoryError>;

    /// Most recent PPM for a move, if any.
    async fn get_ppm_for_move(
        &self,
        move_id: &str,
    ) -> Result<PpmRecord, RepositoryError>;

    async fn list_ppms(&self) -> Result<Vec<PpmRecord>, RepositoryError>;

    async fn create_ppm(
        &self,
        ppm: NewPpmRecord,
    ) -> Result<PpmRecord, RepositoryError>;

    /// Saves the member's chosen weight and the incentive shown for it.
    async fn save_weight_estimate(
        &self,
        id: i64,
        weight_estimate: i64,
        estimated_incentive: Option<Decimal>,
    ) -> Result<PpmRecord, RepositoryError>;

    async fn delete_ppm(
        &self,
        id: i64,
    ) -> Result<(), RepositoryError>;
}
