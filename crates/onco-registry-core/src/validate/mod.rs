//! Write-time validation of clinical records.
//!
//! Pure checks over a candidate record and its already-persisted parents.
//! The storage layer runs them before touching a table, so a record that
//! fails any rule never reaches the database. Rules are evaluated in a fixed
//! order and the first violation wins; date-ordering rules skip silently when
//! either operand is absent.

mod booking;
mod diagnosis;
mod patient;

pub use booking::*;
pub use diagnosis::*;
pub use patient::*;

use chrono::NaiveDate;
use thiserror::Error;

/// A rejected write, attributed to the field the rule failed on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Model field name, stable for UI error placement
    pub field: &'static str,
    /// Human-readable reason
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub type ValidationResult = Result<(), ValidationError>;

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

/// `value` must not precede `floor`. Skips when either side is absent.
pub(crate) fn require_on_or_after(
    field: &'static str,
    value: Option<NaiveDate>,
    floor: Option<NaiveDate>,
    floor_label: &str,
) -> ValidationResult {
    if let (Some(value), Some(floor)) = (value, floor) {
        if value < floor {
            return Err(ValidationError::new(
                field,
                format!("must not be before {floor_label} ({floor})"),
            ));
        }
    }
    Ok(())
}

/// `value` must not follow `ceiling`. Skips when either side is absent.
pub(crate) fn require_on_or_before(
    field: &'static str,
    value: Option<NaiveDate>,
    ceiling: Option<NaiveDate>,
    ceiling_label: &str,
) -> ValidationResult {
    if let (Some(value), Some(ceiling)) = (value, ceiling) {
        if value > ceiling {
            return Err(ValidationError::new(
                field,
                format!("must not be after {ceiling_label} ({ceiling})"),
            ));
        }
    }
    Ok(())
}

pub(crate) fn require_dose_in_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> ValidationResult {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max} Gy"),
        ));
    }
    Ok(())
}

pub(crate) fn require_count_in_range(
    field: &'static str,
    value: u32,
    min: u32,
    max: u32,
) -> ValidationResult {
    if value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {min} and {max}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_order_skips_absent_operands() {
        assert!(require_on_or_after("f", None, Some(date(2024, 1, 1)), "floor").is_ok());
        assert!(require_on_or_after("f", Some(date(2020, 1, 1)), None, "floor").is_ok());
        assert!(require_on_or_before("f", None, None, "ceiling").is_ok());
    }

    #[test]
    fn test_date_order_reports_field_and_bound() {
        let err = require_on_or_after(
            "date_of_registration",
            Some(date(2019, 12, 31)),
            Some(date(2020, 1, 1)),
            "the date of birth",
        )
        .unwrap_err();
        assert_eq!(err.field, "date_of_registration");
        assert!(err.message.contains("2020-01-01"));
    }

    #[test]
    fn test_equal_dates_pass_both_directions() {
        let day = Some(date(2024, 5, 5));
        assert!(require_on_or_after("f", day, day, "x").is_ok());
        assert!(require_on_or_before("f", day, day, "x").is_ok());
    }

    #[test]
    fn test_dose_range_rejects_non_finite() {
        assert!(require_dose_in_range("d", f64::NAN, 0.0, 300.0).is_err());
        assert!(require_dose_in_range("d", f64::INFINITY, 0.0, 300.0).is_err());
        assert!(require_dose_in_range("d", 300.0, 0.0, 300.0).is_ok());
        assert!(require_dose_in_range("d", -0.1, 0.0, 300.0).is_err());
    }

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert!(require_non_empty("name", "  ").is_err());
        assert!(require_non_empty("name", "x").is_ok());
    }
}
