//! Diagnosis rules.

use crate::models::{Diagnosis, Patient};

use super::{require_non_empty, require_on_or_after, ValidationResult};

/// Rules for creating or updating a diagnosis, checked against its patient.
pub fn validate_diagnosis(diagnosis: &Diagnosis, patient: &Patient) -> ValidationResult {
    require_non_empty("cancer_site", &diagnosis.cancer_site_id)?;
    require_non_empty("cancer_pathology", &diagnosis.cancer_pathology_id)?;
    if let Some(code) = &diagnosis.diagnosis_code_id {
        require_non_empty("diagnosis_code", code)?;
    }
    require_on_or_after(
        "date_of_diagnosis",
        Some(diagnosis.date_of_diagnosis),
        Some(patient.date_of_birth),
        "the patient's date of birth",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CancerSide, Gender};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (Patient, Diagnosis) {
        let patient = Patient::new(
            "MRN-12".into(),
            "Iris Tan".into(),
            date(1955, 4, 30),
            Gender::Female,
        );
        let diagnosis = Diagnosis::new(
            patient.patient_id.clone(),
            "C50.4".into(),
            CancerSide::Right,
            "8500/3".into(),
            date(2023, 11, 6),
        );
        (patient, diagnosis)
    }

    #[test]
    fn test_valid_diagnosis_passes() {
        let (patient, diagnosis) = sample();
        assert!(validate_diagnosis(&diagnosis, &patient).is_ok());
    }

    #[test]
    fn test_diagnosis_before_birth_rejected() {
        let (patient, mut diagnosis) = sample();
        diagnosis.date_of_diagnosis = date(1950, 1, 1);
        let err = validate_diagnosis(&diagnosis, &patient).unwrap_err();
        assert_eq!(err.field, "date_of_diagnosis");
    }

    #[test]
    fn test_blank_site_rejected() {
        let (patient, mut diagnosis) = sample();
        diagnosis.cancer_site_id = "".into();
        assert_eq!(
            validate_diagnosis(&diagnosis, &patient).unwrap_err().field,
            "cancer_site"
        );
    }

    #[test]
    fn test_blank_optional_code_rejected() {
        // absent is fine, present-but-blank is not
        let (patient, mut diagnosis) = sample();
        diagnosis.diagnosis_code_id = Some(" ".into());
        assert_eq!(
            validate_diagnosis(&diagnosis, &patient).unwrap_err().field,
            "diagnosis_code"
        );
    }
}
