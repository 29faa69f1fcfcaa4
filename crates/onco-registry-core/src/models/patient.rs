//! Patient model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::Gender;

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Surrogate UUID - always present, generated locally
    pub patient_id: String,
    /// Hospital-issued identifier, unique across the registry
    pub patient_uid: String,
    /// Full name
    pub name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Administrative gender
    pub gender: Gender,
    /// Defaults to the day the record is created
    pub date_of_registration: NaiveDate,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub modified_at: String,
}

impl Patient {
    /// Create a new patient registered today.
    pub fn new(patient_uid: String, name: String, date_of_birth: NaiveDate, gender: Gender) -> Self {
        let now = chrono::Utc::now();
        let stamp = now.to_rfc3339();
        Self {
            patient_id: uuid::Uuid::new_v4().to_string(),
            patient_uid,
            name,
            date_of_birth,
            gender,
            date_of_registration: now.date_naive(),
            created_at: stamp.clone(),
            modified_at: stamp,
        }
    }

    /// Age in whole calendar years on the registration date.
    ///
    /// `None` when the registration date precedes the date of birth; the
    /// validator refuses to persist such a record.
    pub fn age_at_registration(&self) -> Option<u32> {
        self.date_of_registration.years_since(self.date_of_birth)
    }
}
