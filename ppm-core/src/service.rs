use async_trait::async_trait;
use thiserror::Error;

use crate::calculations::IncentiveError;
use crate::{IncentiveEstimate, RequestKey};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EstimateServiceError {
    #[error("invalid estimate input: {0}")]
    InvalidInput(String),

    #[error("estimate service unavailable: {0}")]
    Unavailable(String),
}

impl From<IncentiveError> for EstimateServiceError {
    fn from(err: IncentiveError) -> Self {
        EstimateServiceError::InvalidInput(err.to_string())
    }
}

/// Computes the incentive for a move's inputs.
///
/// Implementations may be remote; the synchronizer only sees the key it
/// asked for and the eventual result.
#[async_trait]
pub trait EstimateService: Send + Sync {
    async fn estimate(
        &self,
        key: &RequestKey,
    ) -> Result<IncentiveEstimate, EstimateServiceError>;
}
