use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The inputs that fully determine one incentive estimate.
///
/// Two requests with equal keys would produce the same estimate, so the key
/// doubles as the identity of an in-flight request. It is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub planned_move_date: NaiveDate,
    pub origin_zip: String,
    pub destination_zip: String,
    pub weight: i64,
}

impl fmt::Display for RequestKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{} {} -> {} @ {} lbs",
            self.planned_move_date, self.origin_zip, self.destination_zip, self.weight
        )
    }
}
