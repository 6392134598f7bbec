use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDate;
use ppm_core::fields::ZIP_PATTERN;
use ppm_core::{NewPpmRecord, PpmRepository, PpmSize, RepositoryError};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading PPM baseline records.
#[derive(Debug, Error)]
pub enum PpmLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Move '{move_id}': invalid size '{code}' (expected S, M or L)")]
    InvalidSize { move_id: String, code: String },

    #[error("Move '{move_id}': invalid ZIP '{zip}'")]
    InvalidZip { move_id: String, zip: String },

    #[error("Move '{move_id}': weight estimate {weight} is negative")]
    NegativeWeight { move_id: String, weight: i64 },

    #[error("Invalid ZIP pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for PpmLoaderError {
    fn from(err: csv::Error) -> Self {
        PpmLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the PPM baseline CSV file.
///
/// - `move_id`: the move the PPM belongs to
/// - `size`: `S`, `M` or `L` (blank if not chosen yet)
/// - `weight_estimate`: pounds (blank if not entered yet)
/// - `planned_move_date`: `YYYY-MM-DD`
/// - `pickup_zip`, `destination_zip`: five-digit ZIP, optionally `+4`
/// - `estimated_incentive`: previously computed incentive in dollars
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PpmCsvRecord {
    pub move_id: String,
    pub size: Option<String>,
    pub weight_estimate: Option<i64>,
    pub planned_move_date: Option<NaiveDate>,
    pub pickup_zip: Option<String>,
    pub destination_zip: Option<String>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub estimated_incentive: Option<Decimal>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl PpmCsvRecord {
    fn to_new_record(
        &self,
        zip: &Regex,
    ) -> Result<NewPpmRecord, PpmLoaderError> {
        let size = non_blank(&self.size)
            .map(|code| {
                PpmSize::parse(&code).ok_or_else(|| PpmLoaderError::InvalidSize {
                    move_id: self.move_id.clone(),
                    code,
                })
            })
            .transpose()?;

        if let Some(weight) = self.weight_estimate.filter(|w| *w < 0) {
            return Err(PpmLoaderError::NegativeWeight {
                move_id: self.move_id.clone(),
                weight,
            });
        }

        let check_zip = |value: &Option<String>| -> Result<Option<String>, PpmLoaderError> {
            match non_blank(value) {
                Some(z) if !zip.is_match(&z) => Err(PpmLoaderError::InvalidZip {
                    move_id: self.move_id.clone(),
                    zip: z,
                }),
                other => Ok(other),
            }
        };

        Ok(NewPpmRecord {
            move_id: self.move_id.trim().to_string(),
            size,
            weight_estimate: self.weight_estimate,
            planned_move_date: self.planned_move_date,
            pickup_zip: check_zip(&self.pickup_zip)?,
            destination_zip: check_zip(&self.destination_zip)?,
            estimated_incentive: self.estimated_incentive,
        })
    }
}

/// Loader for PPM baseline records from CSV files.
///
/// Rows are validated up front and then written through the
/// `PpmRepository` trait, so any backend can be targeted.
pub struct PpmLoader;

impl PpmLoader {
    /// Parse PPM rows from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<PpmCsvRecord>, PpmLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: PpmCsvRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Load PPM rows into the repository.
    ///
    /// Every row is validated before anything is written. Then, per move,
    /// existing PPMs are deleted and the file's rows inserted, so loading
    /// the same file twice leaves the same data behind.
    pub async fn load<R: PpmRepository + ?Sized>(
        repo: &R,
        records: &[PpmCsvRecord],
    ) -> Result<usize, PpmLoaderError> {
        let zip = Regex::new(ZIP_PATTERN)?;

        let mut moves: BTreeMap<String, Vec<NewPpmRecord>> = BTreeMap::new();
        for record in records {
            let new = record.to_new_record(&zip)?;
            moves.entry(new.move_id.clone()).or_default().push(new);
        }

        let mut inserted = 0;
        for (move_id, ppms) in moves {
            loop {
                match repo.get_ppm_for_move(&move_id).await {
                    Ok(existing) => repo.delete_ppm(existing.id).await?,
                    Err(RepositoryError::NotFound) => break,
                    Err(e) => return Err(e.into()),
                }
            }

            for ppm in ppms {
                repo.create_ppm(ppm).await?;
                inserted += 1;
            }
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str =
        "move_id,size,weight_estimate,planned_move_date,pickup_zip,destination_zip,estimated_incentive";

    fn zip() -> Regex {
        Regex::new(ZIP_PATTERN).unwrap()
    }

    fn parse_one(row: &str) -> PpmCsvRecord {
        let csv = format!("{HEADER}\n{row}");
        let mut records = PpmLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    #[test]
    fn test_parse_full_row() {
        let record = parse_one("move-1,L,4000,2018-06-15,90210,50309,1234.56");

        assert_eq!(
            record,
            PpmCsvRecord {
                move_id: "move-1".to_string(),
                size: Some("L".to_string()),
                weight_estimate: Some(4000),
                planned_move_date: NaiveDate::from_ymd_opt(2018, 6, 15),
                pickup_zip: Some("90210".to_string()),
                destination_zip: Some("50309".to_string()),
                estimated_incentive: Some(dec!(1234.56)),
            }
        );
    }

    #[test]
    fn test_parse_blank_optionals() {
        let record = parse_one("move-1,,,,,,");

        assert_eq!(record.size, None);
        assert_eq!(record.weight_estimate, None);
        assert_eq!(record.planned_move_date, None);
        assert_eq!(record.pickup_zip, None);
        assert_eq!(record.estimated_incentive, None);
    }

    #[test]
    fn test_parse_bad_date_is_csv_error() {
        let csv = format!("{HEADER}\nmove-1,L,4000,06/15/2018,90210,50309,");

        assert!(matches!(
            PpmLoader::parse(csv.as_bytes()),
            Err(PpmLoaderError::CsvParse(_))
        ));
    }

    #[test]
    fn test_parse_bad_incentive_is_csv_error() {
        let csv = format!("{HEADER}\nmove-1,L,4000,2018-06-15,90210,50309,lots");

        assert!(matches!(
            PpmLoader::parse(csv.as_bytes()),
            Err(PpmLoaderError::CsvParse(_))
        ));
    }

    #[test]
    fn test_to_new_record_maps_size() {
        let record = parse_one("move-1,S,650,2018-06-15,90210,50309-1234,");

        let new = record.to_new_record(&zip()).unwrap();

        assert_eq!(new.size, Some(PpmSize::Small));
        assert_eq!(new.destination_zip.as_deref(), Some("50309-1234"));
    }

    #[test]
    fn test_to_new_record_rejects_unknown_size() {
        let record = parse_one("move-1,XL,650,2018-06-15,90210,50309,");

        assert!(matches!(
            record.to_new_record(&zip()),
            Err(PpmLoaderError::InvalidSize { code, .. }) if code == "XL"
        ));
    }

    #[test]
    fn test_to_new_record_rejects_bad_zip() {
        let record = parse_one("move-1,L,650,2018-06-15,9021,50309,");

        assert!(matches!(
            record.to_new_record(&zip()),
            Err(PpmLoaderError::InvalidZip { zip, .. }) if zip == "9021"
        ));
    }

    #[test]
    fn test_to_new_record_rejects_negative_weight() {
        let record = parse_one("move-1,L,-5,2018-06-15,90210,50309,");

        assert!(matches!(
            record.to_new_record(&zip()),
            Err(PpmLoaderError::NegativeWeight { weight: -5, .. })
        ));
    }

    #[test]
    fn test_error_messages_name_the_move() {
        let err = PpmLoaderError::InvalidSize {
            move_id: "move-9".to_string(),
            code: "Q".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Move 'move-9': invalid size 'Q' (expected S, M or L)"
        );
    }
}
