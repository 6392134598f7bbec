use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{PpmSize, RequestKey, WeightRange};

/// A personally procured move as last loaded from the backend.
///
/// Records are snapshots: a reload produces a whole new value and the old
/// one is dropped, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpmRecord {
    pub id: i64,
    pub move_id: String,
    pub size: Option<PpmSize>,

    // Inputs to the incentive estimate
    pub weight_estimate: Option<i64>,
    pub planned_move_date: Option<NaiveDate>,
    pub pickup_zip: Option<String>,
    pub destination_zip: Option<String>,

    // Previously computed value
    pub estimated_incentive: Option<Decimal>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PpmRecord {
    pub fn weight_range(&self) -> WeightRange {
        PpmSize::weight_range_or_default(self.size)
    }

    /// Builds the estimate key for this move at `weight`.
    ///
    /// Returns `None` while the move date or either ZIP is still missing.
    pub fn request_key(
        &self,
        weight: i64,
    ) -> Option<RequestKey> {
        Some(RequestKey {
            planned_move_date: self.planned_move_date?,
            origin_zip: self.pickup_zip.clone()?,
            destination_zip: self.destination_zip.clone()?,
            weight,
        })
    }
}

/// For creating new records (no id or timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPpmRecord {
    pub move_id: String,
    pub size: Option<PpmSize>,
    pub weight_estimate: Option<i64>,
    pub planned_move_date: Option<NaiveDate>,
    pub pickup_zip: Option<String>,
    pub destination_zip: Option<String>,
    pub estimated_incentive: Option<Decimal>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::PpmRecord;
    use crate::PpmSize;

    pub fn move_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()
    }

    pub fn record(weight_estimate: Option<i64>) -> PpmRecord {
        let at = Utc.with_ymd_and_hms(2018, 5, 1, 12, 0, 0).unwrap();
        PpmRecord {
            id: 1,
            move_id: "move-1".to_string(),
            size: Some(PpmSize::Large),
            weight_estimate,
            planned_move_date: Some(move_date()),
            pickup_zip: Some("90210".to_string()),
            destination_zip: Some("50309".to_string()),
            estimated_incentive: None,
            created_at: at,
            updated_at: at,
        }
    }

    pub fn record_with_incentive(
        weight_estimate: i64,
        incentive: Decimal,
    ) -> PpmRecord {
        PpmRecord {
            estimated_incentive: Some(incentive),
            ..record(Some(weight_estimate))
        }
    }
}
