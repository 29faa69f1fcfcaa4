//! Patient rules.

use crate::models::Patient;

use super::{require_non_empty, require_on_or_after, ValidationResult};

/// Rules for creating or updating a patient.
pub fn validate_patient(patient: &Patient) -> ValidationResult {
    require_non_empty("patient_uid", &patient.patient_uid)?;
    require_non_empty("name", &patient.name)?;
    require_on_or_after(
        "date_of_registration",
        Some(patient.date_of_registration),
        Some(patient.date_of_birth),
        "the date of birth",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Patient {
        let mut patient = Patient::new(
            "MRN-77".into(),
            "Sam Okafor".into(),
            date(1980, 7, 2),
            Gender::Male,
        );
        patient.date_of_registration = date(2024, 1, 10);
        patient
    }

    #[test]
    fn test_valid_patient_passes() {
        assert!(validate_patient(&sample()).is_ok());
    }

    #[test]
    fn test_blank_uid_rejected() {
        let mut patient = sample();
        patient.patient_uid = "   ".into();
        assert_eq!(validate_patient(&patient).unwrap_err().field, "patient_uid");
    }

    #[test]
    fn test_registration_before_birth_rejected() {
        let mut patient = sample();
        patient.date_of_registration = date(1979, 12, 31);
        let err = validate_patient(&patient).unwrap_err();
        assert_eq!(err.field, "date_of_registration");
    }

    #[test]
    fn test_registration_on_birth_date_allowed() {
        let mut patient = sample();
        patient.date_of_registration = patient.date_of_birth;
        assert!(validate_patient(&patient).is_ok());
    }
}
