//! Radiotherapy booking model and derived planning fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::enums::{Modality, TreatmentIntent, TreatmentSequence};

/// A derived planning field is undefined for the stored inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputationError {
    #[error("dose per fraction is undefined with zero planned fractions")]
    ZeroFractions,
    #[error("treatment duration is undefined with zero fractions per week")]
    ZeroWeeklyRate,
}

/// A planned radiotherapy course for one diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RadiotherapyBooking {
    /// Surrogate UUID - generated locally
    pub booking_id: String,
    /// Diagnosis this course treats
    pub diagnosis_id: String,
    /// Curative or palliative aim
    pub treatment_intent: TreatmentIntent,
    /// Position relative to other treatment
    pub treatment_sequence: TreatmentSequence,
    /// External beam or brachytherapy
    pub modality: Modality,
    /// Treatment technique vocabulary code
    pub treatment_technique_id: String,
    /// Billing code vocabulary code
    pub billing_code_id: String,
    /// Whether systemic therapy runs alongside the course
    pub concurrent_systemic_therapy: bool,
    /// Systemic therapy type codes; only meaningful when the flag is set
    pub systemic_therapy_type_ids: Vec<String>,
    /// Proposed date of the planning image
    pub proposed_planning_image_date: Option<NaiveDate>,
    /// Proposed first treatment date
    pub proposed_treatment_start_date: Option<NaiveDate>,
    /// Prescribed dose over the whole course, in Gray
    pub planned_total_dose: f64,
    /// Fractions over the whole course
    pub planned_total_fractions: u32,
    /// Fractions delivered per treatment day
    pub planned_fractions_per_day: u32,
    /// Fractions delivered per week
    pub planned_fractions_per_week: u32,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub modified_at: String,
}

impl RadiotherapyBooking {
    /// Create a booking with conventional scheduling defaults
    /// (one fraction per day, five days a week).
    pub fn new(
        diagnosis_id: String,
        treatment_intent: TreatmentIntent,
        treatment_sequence: TreatmentSequence,
        modality: Modality,
        treatment_technique_id: String,
        billing_code_id: String,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            booking_id: uuid::Uuid::new_v4().to_string(),
            diagnosis_id,
            treatment_intent,
            treatment_sequence,
            modality,
            treatment_technique_id,
            billing_code_id,
            concurrent_systemic_therapy: false,
            systemic_therapy_type_ids: Vec::new(),
            proposed_planning_image_date: None,
            proposed_treatment_start_date: None,
            planned_total_dose: 0.0,
            planned_total_fractions: 0,
            planned_fractions_per_day: 1,
            planned_fractions_per_week: 5,
            created_at: now.clone(),
            modified_at: now,
        }
    }

    /// Dose per fraction in Gray.
    pub fn planned_dose_per_fraction(&self) -> Result<f64, ComputationError> {
        if self.planned_total_fractions == 0 {
            return Err(ComputationError::ZeroFractions);
        }
        Ok(self.planned_total_dose / f64::from(self.planned_total_fractions))
    }

    /// Overall course length in calendar days.
    ///
    /// Fractions over the weekly delivery rate gives the length in weeks;
    /// partial weeks round up to whole days.
    pub fn planned_treatment_duration_days(&self) -> Result<u32, ComputationError> {
        if self.planned_fractions_per_week == 0 {
            return Err(ComputationError::ZeroWeeklyRate);
        }
        let days = self.planned_total_fractions * 7;
        Ok(days.div_ceil(self.planned_fractions_per_week))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RadiotherapyBooking {
        RadiotherapyBooking::new(
            "diagnosis-1".into(),
            TreatmentIntent::Curative,
            TreatmentSequence::Adjuvant,
            Modality::Ebrt,
            "VMAT".into(),
            "RT-301".into(),
        )
    }

    #[test]
    fn test_new_booking_defaults() {
        let booking = sample();
        assert_eq!(booking.booking_id.len(), 36);
        assert!(!booking.concurrent_systemic_therapy);
        assert!(booking.systemic_therapy_type_ids.is_empty());
        assert_eq!(booking.planned_fractions_per_day, 1);
        assert_eq!(booking.planned_fractions_per_week, 5);
    }

    #[test]
    fn test_dose_per_fraction() {
        let mut booking = sample();
        booking.planned_total_dose = 60.0;
        booking.planned_total_fractions = 30;
        assert_eq!(booking.planned_dose_per_fraction().unwrap(), 2.0);
    }

    #[test]
    fn test_dose_per_fraction_rejects_zero_fractions() {
        let mut booking = sample();
        booking.planned_total_dose = 8.0;
        booking.planned_total_fractions = 0;
        assert_eq!(
            booking.planned_dose_per_fraction(),
            Err(ComputationError::ZeroFractions)
        );
    }

    #[test]
    fn test_duration_for_conventional_course() {
        // 30 fractions at 5 per week is a six week course
        let mut booking = sample();
        booking.planned_total_fractions = 30;
        assert_eq!(booking.planned_treatment_duration_days().unwrap(), 42);
    }

    #[test]
    fn test_duration_for_accelerated_course() {
        // twice daily, ten fractions a week, halves the calendar time
        let mut booking = sample();
        booking.planned_total_fractions = 30;
        booking.planned_fractions_per_day = 2;
        booking.planned_fractions_per_week = 10;
        assert_eq!(booking.planned_treatment_duration_days().unwrap(), 21);
    }

    #[test]
    fn test_duration_rounds_partial_weeks_up() {
        let mut booking = sample();
        booking.planned_total_fractions = 10;
        booking.planned_fractions_per_week = 3;
        // 70 / 3 = 23.33 days
        assert_eq!(booking.planned_treatment_duration_days().unwrap(), 24);
    }

    #[test]
    fn test_duration_rejects_zero_weekly_rate() {
        let mut booking = sample();
        booking.planned_total_fractions = 5;
        booking.planned_fractions_per_week = 0;
        assert_eq!(
            booking.planned_treatment_duration_days(),
            Err(ComputationError::ZeroWeeklyRate)
        );
    }
}
