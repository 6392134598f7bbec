//! Field definitions for the office incentive calculator.
//!
//! Each form field maps to a fixed title, requirement and validator. The
//! table is built once at startup and shared by every form that needs it.

use std::fmt;

use chrono::NaiveDate;
use regex::Regex;

use crate::{PpmRecord, RequestKey};

/// Five-digit ZIP, optionally followed by a four-digit extension.
pub const ZIP_PATTERN: &str = r"^(\d{5}([\-]\d{4})?)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    PlannedMoveDate,
    PickupPostalCode,
    DestinationPostalCode,
    Weight,
}

impl FieldId {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlannedMoveDate => "planned_move_date",
            Self::PickupPostalCode => "pickup_postal_code",
            Self::DestinationPostalCode => "destination_postal_code",
            Self::Weight => "weight",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub enum Validator {
    /// ISO 8601 calendar date (`YYYY-MM-DD`).
    Date,
    Pattern(Regex),
    /// Whole number no smaller than the bound.
    MinInteger(i64),
}

/// A parsed, valid field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Date(NaiveDate),
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub id: FieldId,
    pub title: &'static str,
    pub required: bool,
    pub validator: Validator,
}

impl FieldSpec {
    /// Validates one raw input. Returns `Ok(None)` for a blank optional
    /// field; errors are user-facing messages.
    pub fn validate(
        &self,
        raw: &str,
    ) -> Result<Option<FieldValue>, String> {
        let value = raw.trim();
        if value.is_empty() {
            return if self.required {
                Err(format!("{} is required.", self.title))
            } else {
                Ok(None)
            };
        }

        match &self.validator {
            Validator::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|d| Some(FieldValue::Date(d)))
                .map_err(|_| format!("{} must be a date (YYYY-MM-DD).", self.title)),
            Validator::Pattern(re) => {
                if re.is_match(value) {
                    Ok(Some(FieldValue::Text(value.to_string())))
                } else {
                    Err(format!("{} is not valid.", self.title))
                }
            }
            Validator::MinInteger(min) => match value.parse::<i64>() {
                Ok(n) if n >= *min => Ok(Some(FieldValue::Integer(n))),
                Ok(_) => Err(format!("{} must be at least {}.", self.title, min)),
                Err(_) => Err(format!("{} must be a whole number.", self.title)),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldTable {
    fields: Vec<FieldSpec>,
}

impl FieldTable {
    /// Fields of the incentive calculator. All four are required.
    pub fn incentive_calculator() -> Result<Self, regex::Error> {
        let zip = Regex::new(ZIP_PATTERN)?;
        Ok(Self {
            fields: vec![
                FieldSpec {
                    id: FieldId::PlannedMoveDate,
                    title: "Move Date",
                    required: true,
                    validator: Validator::Date,
                },
                FieldSpec {
                    id: FieldId::PickupPostalCode,
                    title: "Origin ZIP",
                    required: true,
                    validator: Validator::Pattern(zip.clone()),
                },
                FieldSpec {
                    id: FieldId::DestinationPostalCode,
                    title: "Destination ZIP",
                    required: true,
                    validator: Validator::Pattern(zip),
                },
                FieldSpec {
                    id: FieldId::Weight,
                    title: "Weight",
                    required: true,
                    validator: Validator::MinInteger(1),
                },
            ],
        })
    }

    pub fn get(
        &self,
        id: FieldId,
    ) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.id == id)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

/// Raw values typed into the incentive calculator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IncentiveCalculatorForm {
    pub planned_move_date: String,
    pub pickup_postal_code: String,
    pub destination_postal_code: String,
    pub weight: String,
}

impl IncentiveCalculatorForm {
    /// Prefills the route from a move. The weight is left for the user.
    pub fn from_record(record: &PpmRecord) -> Self {
        Self {
            planned_move_date: record
                .planned_move_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            pickup_postal_code: record.pickup_zip.clone().unwrap_or_default(),
            destination_postal_code: record.destination_zip.clone().unwrap_or_default(),
            weight: String::new(),
        }
    }

    fn raw(
        &self,
        id: FieldId,
    ) -> &str {
        match id {
            FieldId::PlannedMoveDate => &self.planned_move_date,
            FieldId::PickupPostalCode => &self.pickup_postal_code,
            FieldId::DestinationPostalCode => &self.destination_postal_code,
            FieldId::Weight => &self.weight,
        }
    }

    /// True when nothing has been entered.
    pub fn is_pristine(&self) -> bool {
        *self == Self::default()
    }

    /// Validates every field and builds the estimate key.
    ///
    /// On failure returns one message per invalid field, in table order.
    pub fn validate(
        &self,
        table: &FieldTable,
    ) -> Result<RequestKey, Vec<String>> {
        let mut errors = Vec::new();
        let mut date = None;
        let mut origin = None;
        let mut destination = None;
        let mut weight = None;

        for field in table.fields() {
            match field.validate(self.raw(field.id)) {
                Ok(Some(value)) => match (field.id, value) {
                    (FieldId::PlannedMoveDate, FieldValue::Date(d)) => date = Some(d),
                    (FieldId::PickupPostalCode, FieldValue::Text(t)) => origin = Some(t),
                    (FieldId::DestinationPostalCode, FieldValue::Text(t)) => destination = Some(t),
                    (FieldId::Weight, FieldValue::Integer(n)) => weight = Some(n),
                    (id, _) => errors.push(format!("{id} has an unexpected type.")),
                },
                Ok(None) => {}
                Err(message) => errors.push(message),
            }
        }

        match (date, origin, destination, weight) {
            (Some(planned_move_date), Some(origin_zip), Some(destination_zip), Some(weight))
                if errors.is_empty() =>
            {
                Ok(RequestKey {
                    planned_move_date,
                    origin_zip,
                    destination_zip,
                    weight,
                })
            }
            _ => {
                if errors.is_empty() {
                    errors.push("Move date, both ZIPs and weight are required.".to_string());
                }
                Err(errors)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::fixtures::{move_date, record};

    fn table() -> FieldTable {
        FieldTable::incentive_calculator().unwrap()
    }

    fn filled() -> IncentiveCalculatorForm {
        IncentiveCalculatorForm {
            planned_move_date: "2018-06-15".to_string(),
            pickup_postal_code: "90210".to_string(),
            destination_postal_code: "50309-1234".to_string(),
            weight: "4000".to_string(),
        }
    }

    #[test]
    fn table_lists_fields_in_form_order() {
        let ids: Vec<_> = table().fields().iter().map(|f| f.id).collect();

        assert_eq!(
            ids,
            vec![
                FieldId::PlannedMoveDate,
                FieldId::PickupPostalCode,
                FieldId::DestinationPostalCode,
                FieldId::Weight,
            ]
        );
    }

    #[test]
    fn zip_accepts_five_digits_and_plus_four() {
        let table = table();
        let zip = table.get(FieldId::PickupPostalCode).unwrap();

        assert!(zip.validate("90210").is_ok());
        assert!(zip.validate("90210-1234").is_ok());
        assert!(zip.validate("9021").is_err());
        assert!(zip.validate("90210-12").is_err());
        assert!(zip.validate("abcde").is_err());
    }

    #[test]
    fn weight_must_be_positive_integer() {
        let table = table();
        let weight = table.get(FieldId::Weight).unwrap();

        assert_eq!(weight.validate("1"), Ok(Some(FieldValue::Integer(1))));
        assert_eq!(weight.validate("0"), Err("Weight must be at least 1.".to_string()));
        assert_eq!(
            weight.validate("12.5"),
            Err("Weight must be a whole number.".to_string())
        );
    }

    #[test]
    fn blank_required_field_is_reported() {
        let table = table();
        let date = table.get(FieldId::PlannedMoveDate).unwrap();

        assert_eq!(date.validate(" "), Err("Move Date is required.".to_string()));
    }

    #[test]
    fn valid_form_builds_request_key() {
        let key = filled().validate(&table()).unwrap();

        assert_eq!(
            key,
            RequestKey {
                planned_move_date: move_date(),
                origin_zip: "90210".to_string(),
                destination_zip: "50309-1234".to_string(),
                weight: 4000,
            }
        );
    }

    #[test]
    fn invalid_form_reports_every_bad_field() {
        let form = IncentiveCalculatorForm {
            planned_move_date: "06/15/2018".to_string(),
            weight: String::new(),
            ..filled()
        };

        let errors = form.validate(&table()).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Move Date must be a date (YYYY-MM-DD).".to_string(),
                "Weight is required.".to_string(),
            ]
        );
    }

    #[test]
    fn prefill_copies_route_from_record() {
        let form = IncentiveCalculatorForm::from_record(&record(Some(4000)));

        assert_eq!(form.planned_move_date, "2018-06-15");
        assert_eq!(form.pickup_postal_code, "90210");
        assert_eq!(form.destination_postal_code, "50309");
        assert_eq!(form.weight, "");
        assert!(!form.is_pristine());
    }

    #[test]
    fn default_form_is_pristine() {
        assert!(IncentiveCalculatorForm::default().is_pristine());
    }
}
