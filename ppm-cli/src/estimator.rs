use std::time::Duration;

use async_trait::async_trait;
use ppm_core::calculations::FlatRateSchedule;
use ppm_core::{EstimateService, EstimateServiceError, IncentiveEstimate, RequestKey};
use tracing::debug;

/// Estimate service backed by a local flat-rate schedule.
///
/// The route and date do not affect the price; only the weight does. An
/// optional latency makes responses overlap the way remote ones do.
#[derive(Debug, Clone)]
pub struct OfflineEstimator {
    schedule: FlatRateSchedule,
    latency: Duration,
}

impl OfflineEstimator {
    pub fn new(schedule: FlatRateSchedule) -> Self {
        Self {
            schedule,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(
        mut self,
        latency: Duration,
    ) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl EstimateService for OfflineEstimator {
    async fn estimate(
        &self,
        key: &RequestKey,
    ) -> Result<IncentiveEstimate, EstimateServiceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let estimate = self.schedule.estimate(key.weight)?;
        debug!(%key, gcc = %estimate.gcc, incentive = %estimate.incentive, "offline estimate");
        Ok(estimate)
    }
}
