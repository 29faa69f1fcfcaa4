//! Radiotherapy booking rules.

use crate::models::{Diagnosis, RadiotherapyBooking};

use super::{
    require_count_in_range, require_dose_in_range, require_non_empty, require_on_or_after,
    require_on_or_before, ValidationError, ValidationResult,
};

/// Rules for a booking being created.
///
/// The systemic-therapy pairing rule is not checked here: a course is booked
/// first and its therapy details are filled in as they are confirmed.
pub fn validate_booking_create(
    booking: &RadiotherapyBooking,
    diagnosis: &Diagnosis,
) -> ValidationResult {
    check_fields(booking)?;
    check_dates(booking, diagnosis)
}

/// Rules for a booking being updated. Adds the systemic-therapy pairing rule
/// on top of the create rules.
pub fn validate_booking_update(
    booking: &RadiotherapyBooking,
    diagnosis: &Diagnosis,
) -> ValidationResult {
    check_fields(booking)?;
    check_dates(booking, diagnosis)?;
    check_therapy_pairing(booking)
}

fn check_fields(booking: &RadiotherapyBooking) -> ValidationResult {
    require_non_empty("treatment_technique", &booking.treatment_technique_id)?;
    require_non_empty("billing_code", &booking.billing_code_id)?;
    for id in &booking.systemic_therapy_type_ids {
        require_non_empty("systemic_therapy_type", id)?;
    }

    require_dose_in_range("planned_total_dose", booking.planned_total_dose, 0.0, 300.0)?;
    require_count_in_range("planned_total_fractions", booking.planned_total_fractions, 0, 300)?;
    require_count_in_range("planned_fractions_per_day", booking.planned_fractions_per_day, 1, 4)?;
    require_count_in_range("planned_fractions_per_week", booking.planned_fractions_per_week, 1, 28)?;

    if booking.planned_fractions_per_week < booking.planned_fractions_per_day {
        return Err(ValidationError::new(
            "planned_fractions_per_week",
            "must be at least the number of fractions per day",
        ));
    }
    if booking.planned_fractions_per_week > 7 * booking.planned_fractions_per_day {
        return Err(ValidationError::new(
            "planned_fractions_per_week",
            "cannot exceed seven times the fractions per day",
        ));
    }

    // a booking whose derived fields cannot be computed never persists
    booking
        .planned_dose_per_fraction()
        .map_err(|e| ValidationError::new("planned_total_fractions", e.to_string()))?;
    booking
        .planned_treatment_duration_days()
        .map_err(|e| ValidationError::new("planned_fractions_per_week", e.to_string()))?;
    Ok(())
}

fn check_dates(booking: &RadiotherapyBooking, diagnosis: &Diagnosis) -> ValidationResult {
    require_on_or_after(
        "proposed_treatment_start_date",
        booking.proposed_treatment_start_date,
        Some(diagnosis.date_of_diagnosis),
        "the date of diagnosis",
    )?;
    require_on_or_before(
        "proposed_planning_image_date",
        booking.proposed_planning_image_date,
        booking.proposed_treatment_start_date,
        "the proposed treatment start date",
    )?;
    Ok(())
}

fn check_therapy_pairing(booking: &RadiotherapyBooking) -> ValidationResult {
    if !booking.concurrent_systemic_therapy && !booking.systemic_therapy_type_ids.is_empty() {
        return Err(ValidationError::new(
            "systemic_therapy_type",
            "systemic therapy types require the concurrent systemic therapy flag",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CancerSide, Modality, TreatmentIntent, TreatmentSequence};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> (Diagnosis, RadiotherapyBooking) {
        let diagnosis = Diagnosis::new(
            "patient-1".into(),
            "C61".into(),
            CancerSide::NotApplicable,
            "8140/3".into(),
            date(2024, 3, 1),
        );
        let mut booking = RadiotherapyBooking::new(
            diagnosis.diagnosis_id.clone(),
            TreatmentIntent::Curative,
            TreatmentSequence::Definitive,
            Modality::Ebrt,
            "IMRT".into(),
            "RT-200".into(),
        );
        booking.planned_total_dose = 60.0;
        booking.planned_total_fractions = 20;
        (diagnosis, booking)
    }

    #[test]
    fn test_valid_booking_passes_create_and_update() {
        let (diagnosis, booking) = sample();
        assert!(validate_booking_create(&booking, &diagnosis).is_ok());
        assert!(validate_booking_update(&booking, &diagnosis).is_ok());
    }

    #[test]
    fn test_dose_out_of_range_rejected() {
        let (diagnosis, mut booking) = sample();
        booking.planned_total_dose = 300.5;
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "planned_total_dose");
    }

    #[test]
    fn test_zero_fractions_rejected_via_derived_guard() {
        let (diagnosis, mut booking) = sample();
        booking.planned_total_fractions = 0;
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "planned_total_fractions");
        assert!(err.message.contains("zero planned fractions"));
    }

    #[test]
    fn test_fractions_per_day_bounds() {
        let (diagnosis, mut booking) = sample();
        booking.planned_fractions_per_day = 0;
        assert_eq!(
            validate_booking_create(&booking, &diagnosis).unwrap_err().field,
            "planned_fractions_per_day"
        );
        booking.planned_fractions_per_day = 5;
        assert_eq!(
            validate_booking_create(&booking, &diagnosis).unwrap_err().field,
            "planned_fractions_per_day"
        );
    }

    #[test]
    fn test_weekly_rate_must_cover_daily_rate() {
        let (diagnosis, mut booking) = sample();
        booking.planned_fractions_per_day = 2;
        booking.planned_fractions_per_week = 1;
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "planned_fractions_per_week");
    }

    #[test]
    fn test_weekly_rate_capped_at_seven_treatment_days() {
        let (diagnosis, mut booking) = sample();
        booking.planned_fractions_per_day = 1;
        booking.planned_fractions_per_week = 8;
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "planned_fractions_per_week");
    }

    #[test]
    fn test_start_before_diagnosis_rejected() {
        let (diagnosis, mut booking) = sample();
        booking.proposed_treatment_start_date = Some(date(2024, 2, 28));
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "proposed_treatment_start_date");
    }

    #[test]
    fn test_planning_image_after_start_rejected() {
        let (diagnosis, mut booking) = sample();
        booking.proposed_treatment_start_date = Some(date(2024, 4, 10));
        booking.proposed_planning_image_date = Some(date(2024, 4, 11));
        let err = validate_booking_create(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "proposed_planning_image_date");
    }

    #[test]
    fn test_absent_dates_skip_ordering_rules() {
        let (diagnosis, mut booking) = sample();
        booking.proposed_planning_image_date = Some(date(2024, 4, 1));
        booking.proposed_treatment_start_date = None;
        assert!(validate_booking_create(&booking, &diagnosis).is_ok());
    }

    #[test]
    fn test_therapy_types_without_flag_pass_create_but_fail_update() {
        let (diagnosis, mut booking) = sample();
        booking.systemic_therapy_type_ids = vec!["CHEMO".into()];
        booking.concurrent_systemic_therapy = false;
        assert!(validate_booking_create(&booking, &diagnosis).is_ok());
        let err = validate_booking_update(&booking, &diagnosis).unwrap_err();
        assert_eq!(err.field, "systemic_therapy_type");
    }

    #[test]
    fn test_flag_with_types_passes_update() {
        let (diagnosis, mut booking) = sample();
        booking.concurrent_systemic_therapy = true;
        booking.systemic_therapy_type_ids = vec!["CHEMO".into(), "IMMUNO".into()];
        assert!(validate_booking_update(&booking, &diagnosis).is_ok());
    }

    #[test]
    fn test_flag_without_types_allowed() {
        let (diagnosis, mut booking) = sample();
        booking.concurrent_systemic_therapy = true;
        assert!(validate_booking_update(&booking, &diagnosis).is_ok());
    }
}
