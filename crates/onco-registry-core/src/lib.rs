//! Onco-Registry Core Library
//!
//! Local-first oncology registry for radiotherapy departments.
//!
//! # Architecture
//!
//! ```text
//!                     Lookup vocabularies
//!   (site, pathology, technique, billing, therapy, diagnosis code)
//!                            │
//!                            │ referenced by code, RESTRICT on delete
//!                            ▼
//!  Patient ──< Diagnosis ──< RadiotherapyBooking ──< systemic therapy set
//!                            │
//!              ┌─────────────▼─────────────┐
//!              │   validate before write   │
//!              │   recompute derived data  │
//!              └─────────────┬─────────────┘
//!                            │
//!               ┌────────────┴────────────┐
//!               ▼                         ▼
//!         JSON dataset              flat CSV dataset
//!      (nested, labelled)        (one row per booking)
//! ```
//!
//! # Core Principle
//!
//! **Derived planning figures are computed, never entered.** Dose per
//! fraction and course duration are recomputed from their inputs on every
//! write and never accepted from a caller.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer with referential integrity
//! - [`models`]: Domain types (Patient, Diagnosis, RadiotherapyBooking, etc.)
//! - [`validate`]: Write-time clinical validation rules
//! - [`export`]: Registry dataset export (JSON and CSV)

pub mod db;
pub mod export;
pub mod models;
pub mod validate;

// Re-export commonly used types
pub use db::Database;
pub use export::RegistryExporter;
pub use models::{
    CancerSide, Diagnosis, Gender, LookupEntry, LookupKind, Modality, Patient,
    RadiotherapyBooking, TreatmentIntent, TreatmentSequence,
};
pub use validate::ValidationError;

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use models::{MStage, NStage, TStage};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum OncoRegistryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed on {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for OncoRegistryError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(m) => OncoRegistryError::NotFound(m),
            db::DbError::Integrity(m) => OncoRegistryError::Conflict(m),
            db::DbError::Validation(v) => OncoRegistryError::ValidationFailed {
                field: v.field.to_string(),
                message: v.message,
            },
            other => OncoRegistryError::DatabaseError(other.to_string()),
        }
    }
}

impl From<models::InvalidCode> for OncoRegistryError {
    fn from(e: models::InvalidCode) -> Self {
        OncoRegistryError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for OncoRegistryError {
    fn from(e: serde_json::Error) -> Self {
        OncoRegistryError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OncoRegistryError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        OncoRegistryError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Parse Helpers
// =========================================================================

fn parse_date(field: &str, value: &str) -> Result<chrono::NaiveDate, OncoRegistryError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        OncoRegistryError::InvalidInput(format!("{}: expected YYYY-MM-DD, got {:?}", field, value))
    })
}

fn parse_opt_date(
    field: &str,
    value: Option<&str>,
) -> Result<Option<chrono::NaiveDate>, OncoRegistryError> {
    value.map(|v| parse_date(field, v)).transpose()
}

fn t_stage_from_ffi(stage: Option<&FfiStage>) -> Result<Option<TStage>, OncoRegistryError> {
    match stage {
        Some(s) => Ok(TStage::from_codes(
            Some(&s.prefix),
            Some(&s.category),
            s.suffix.as_deref(),
        )?),
        None => Ok(None),
    }
}

fn n_stage_from_ffi(stage: Option<&FfiStage>) -> Result<Option<NStage>, OncoRegistryError> {
    match stage {
        Some(s) => Ok(NStage::from_codes(
            Some(&s.prefix),
            Some(&s.category),
            s.suffix.as_deref(),
        )?),
        None => Ok(None),
    }
}

fn m_stage_from_ffi(stage: Option<&FfiStage>) -> Result<Option<MStage>, OncoRegistryError> {
    match stage {
        Some(s) => Ok(MStage::from_codes(
            Some(&s.prefix),
            Some(&s.category),
            s.suffix.as_deref(),
        )?),
        None => Ok(None),
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a registry database at the given path.
#[uniffi::export]
pub fn open_registry(path: String) -> Result<Arc<OncoRegistryCore>, OncoRegistryError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(OncoRegistryCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory registry (for testing).
#[uniffi::export]
pub fn open_registry_in_memory() -> Result<Arc<OncoRegistryCore>, OncoRegistryError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(OncoRegistryCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct OncoRegistryCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl OncoRegistryCore {
    // =========================================================================
    // Lookup Operations
    // =========================================================================

    /// Add or update a vocabulary entry.
    pub fn upsert_lookup_entry(
        &self,
        kind: String,
        id: String,
        label: String,
    ) -> Result<(), OncoRegistryError> {
        let db = self.db.lock()?;
        let kind: LookupKind = kind.parse()?;
        db.upsert_lookup(kind, &LookupEntry::new(id, label))?;
        Ok(())
    }

    /// Get a vocabulary entry by code.
    pub fn get_lookup_entry(
        &self,
        kind: String,
        id: String,
    ) -> Result<Option<FfiLookupEntry>, OncoRegistryError> {
        let db = self.db.lock()?;
        let kind: LookupKind = kind.parse()?;
        let entry = db.get_lookup(kind, &id)?;
        Ok(entry.map(|e| e.into()))
    }

    /// List a vocabulary sorted by label.
    pub fn list_lookup_entries(
        &self,
        kind: String,
    ) -> Result<Vec<FfiLookupEntry>, OncoRegistryError> {
        let db = self.db.lock()?;
        let kind: LookupKind = kind.parse()?;
        let entries = db.list_lookup(kind)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Search a vocabulary by code or label prefix.
    pub fn search_lookup_entries(
        &self,
        kind: String,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiLookupEntry>, OncoRegistryError> {
        let db = self.db.lock()?;
        let kind: LookupKind = kind.parse()?;
        let entries = db.search_lookup(kind, &query, limit as usize)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Delete a vocabulary entry. Refused while clinical records reference it.
    pub fn delete_lookup_entry(&self, kind: String, id: String) -> Result<bool, OncoRegistryError> {
        let db = self.db.lock()?;
        let kind: LookupKind = kind.parse()?;
        Ok(db.delete_lookup(kind, &id)?)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient. The registration date defaults to today.
    pub fn create_patient(
        &self,
        patient_uid: String,
        name: String,
        date_of_birth: String,
        gender: String,
        date_of_registration: Option<String>,
    ) -> Result<FfiPatient, OncoRegistryError> {
        let db = self.db.lock()?;
        let date_of_birth = parse_date("date_of_birth", &date_of_birth)?;
        let mut patient = Patient::new(patient_uid, name, date_of_birth, gender.parse()?);
        if let Some(date) = date_of_registration {
            patient.date_of_registration = parse_date("date_of_registration", &date)?;
        }
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<(), OncoRegistryError> {
        let db = self.db.lock()?;
        let patient: Patient = patient.try_into()?;
        if !db.update_patient(&patient)? {
            return Err(OncoRegistryError::NotFound(format!(
                "patient {}",
                patient.patient_id
            )));
        }
        Ok(())
    }

    /// Get a patient by registry ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, OncoRegistryError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Get a patient by hospital UID.
    pub fn get_patient_by_uid(
        &self,
        patient_uid: String,
    ) -> Result<Option<FfiPatient>, OncoRegistryError> {
        let db = self.db.lock()?;
        let patient = db.get_patient_by_uid(&patient_uid)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name or hospital UID prefix.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, OncoRegistryError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// List all patients sorted by name.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, OncoRegistryError> {
        let db = self.db.lock()?;
        let patients = db.list_patients()?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    /// Delete a patient together with their diagnoses and bookings.
    /// Returns false when no such patient exists.
    pub fn delete_patient(&self, patient_id: String) -> Result<bool, OncoRegistryError> {
        let db = self.db.lock()?;
        Ok(db.delete_patient(&patient_id)?)
    }

    // =========================================================================
    // Diagnosis Operations
    // =========================================================================

    /// Record a new diagnosis for a patient.
    pub fn create_diagnosis(
        &self,
        diagnosis: FfiNewDiagnosis,
    ) -> Result<FfiDiagnosis, OncoRegistryError> {
        let db = self.db.lock()?;
        let diagnosis: Diagnosis = diagnosis.try_into()?;
        db.insert_diagnosis(&diagnosis)?;
        Ok(diagnosis.into())
    }

    /// Update an existing diagnosis. The owning patient cannot be changed.
    pub fn update_diagnosis(&self, diagnosis: FfiDiagnosis) -> Result<(), OncoRegistryError> {
        let db = self.db.lock()?;
        let diagnosis: Diagnosis = diagnosis.try_into()?;
        if !db.update_diagnosis(&diagnosis)? {
            return Err(OncoRegistryError::NotFound(format!(
                "diagnosis {}",
                diagnosis.diagnosis_id
            )));
        }
        Ok(())
    }

    /// Get a diagnosis by ID.
    pub fn get_diagnosis(
        &self,
        diagnosis_id: String,
    ) -> Result<Option<FfiDiagnosis>, OncoRegistryError> {
        let db = self.db.lock()?;
        let diagnosis = db.get_diagnosis(&diagnosis_id)?;
        Ok(diagnosis.map(|d| d.into()))
    }

    /// List a patient's diagnoses, newest first.
    pub fn list_patient_diagnoses(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiDiagnosis>, OncoRegistryError> {
        let db = self.db.lock()?;
        let diagnoses = db.list_diagnoses_for_patient(&patient_id)?;
        Ok(diagnoses.into_iter().map(|d| d.into()).collect())
    }

    /// Delete a diagnosis together with its bookings.
    /// Returns false when no such diagnosis exists.
    pub fn delete_diagnosis(&self, diagnosis_id: String) -> Result<bool, OncoRegistryError> {
        let db = self.db.lock()?;
        Ok(db.delete_diagnosis(&diagnosis_id)?)
    }

    // =========================================================================
    // Booking Operations
    // =========================================================================

    /// Book a radiotherapy course under a diagnosis.
    pub fn create_booking(&self, booking: FfiNewBooking) -> Result<FfiBooking, OncoRegistryError> {
        let mut db = self.db.lock()?;
        let booking: RadiotherapyBooking = booking.try_into()?;
        db.insert_booking(&booking)?;
        Ok(booking.into())
    }

    /// Update an existing booking. The owning diagnosis cannot be changed.
    pub fn update_booking(&self, booking: FfiBooking) -> Result<(), OncoRegistryError> {
        let mut db = self.db.lock()?;
        let booking: RadiotherapyBooking = booking.try_into()?;
        if !db.update_booking(&booking)? {
            return Err(OncoRegistryError::NotFound(format!(
                "booking {}",
                booking.booking_id
            )));
        }
        Ok(())
    }

    /// Get a booking by ID.
    pub fn get_booking(&self, booking_id: String) -> Result<Option<FfiBooking>, OncoRegistryError> {
        let db = self.db.lock()?;
        let booking = db.get_booking(&booking_id)?;
        Ok(booking.map(|b| b.into()))
    }

    /// List a diagnosis's bookings in creation order.
    pub fn list_diagnosis_bookings(
        &self,
        diagnosis_id: String,
    ) -> Result<Vec<FfiBooking>, OncoRegistryError> {
        let db = self.db.lock()?;
        let bookings = db.list_bookings_for_diagnosis(&diagnosis_id)?;
        Ok(bookings.into_iter().map(|b| b.into()).collect())
    }

    /// Delete a booking. Returns false when no such booking exists.
    pub fn delete_booking(&self, booking_id: String) -> Result<bool, OncoRegistryError> {
        let db = self.db.lock()?;
        Ok(db.delete_booking(&booking_id)?)
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the whole registry as nested JSON with resolved labels.
    pub fn export_registry_json(&self) -> Result<String, OncoRegistryError> {
        let db = self.db.lock()?;
        let exporter = RegistryExporter::new(&db);
        let dataset = exporter.export_all()?;
        Ok(dataset.to_json()?)
    }

    /// Export the whole registry as flat CSV, one row per booking.
    pub fn export_registry_csv(&self) -> Result<String, OncoRegistryError> {
        let db = self.db.lock()?;
        let exporter = RegistryExporter::new(&db);
        let dataset = exporter.export_all()?;
        Ok(dataset.to_csv())
    }

    /// Export a single patient's records as nested JSON.
    pub fn export_patient_json(&self, patient_id: String) -> Result<String, OncoRegistryError> {
        let db = self.db.lock()?;
        let exporter = RegistryExporter::new(&db);
        let patient = exporter.export_patient(&patient_id)?;
        Ok(serde_json::to_string_pretty(&patient)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe vocabulary entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiLookupEntry {
    pub id: String,
    pub label: String,
    pub created_at: String,
    pub modified_at: String,
}

impl From<LookupEntry> for FfiLookupEntry {
    fn from(entry: LookupEntry) -> Self {
        Self {
            id: entry.id,
            label: entry.label,
            created_at: entry.created_at,
            modified_at: entry.modified_at,
        }
    }
}

/// FFI-safe patient. Dates are ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: String,
    pub patient_uid: String,
    pub name: String,
    pub date_of_birth: String,
    pub gender: String,
    pub date_of_registration: String,
    pub age_at_registration: Option<u32>,
    pub created_at: String,
    pub modified_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        let age_at_registration = patient.age_at_registration();
        Self {
            patient_id: patient.patient_id,
            patient_uid: patient.patient_uid,
            name: patient.name,
            date_of_birth: patient.date_of_birth.to_string(),
            gender: patient.gender.as_str().to_string(),
            date_of_registration: patient.date_of_registration.to_string(),
            age_at_registration,
            created_at: patient.created_at,
            modified_at: patient.modified_at,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = OncoRegistryError;

    fn try_from(patient: FfiPatient) -> Result<Self, Self::Error> {
        let date_of_birth = parse_date("date_of_birth", &patient.date_of_birth)?;
        let date_of_registration =
            parse_date("date_of_registration", &patient.date_of_registration)?;
        let gender: Gender = patient.gender.parse()?;
        Ok(Patient {
            patient_id: patient.patient_id,
            patient_uid: patient.patient_uid,
            name: patient.name,
            date_of_birth,
            gender,
            date_of_registration,
            created_at: patient.created_at,
            modified_at: patient.modified_at,
        })
    }
}

/// FFI-safe staging axis, e.g. prefix `"c"`, category `"T2"`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStage {
    pub prefix: String,
    pub category: String,
    pub suffix: Option<String>,
}

impl From<TStage> for FfiStage {
    fn from(stage: TStage) -> Self {
        let (prefix, category, suffix) = stage.codes();
        Self {
            prefix: prefix.to_string(),
            category: category.to_string(),
            suffix: suffix.map(str::to_string),
        }
    }
}

impl From<NStage> for FfiStage {
    fn from(stage: NStage) -> Self {
        let (prefix, category, suffix) = stage.codes();
        Self {
            prefix: prefix.to_string(),
            category: category.to_string(),
            suffix: suffix.map(str::to_string),
        }
    }
}

impl From<MStage> for FfiStage {
    fn from(stage: MStage) -> Self {
        let (prefix, category, suffix) = stage.codes();
        Self {
            prefix: prefix.to_string(),
            category: category.to_string(),
            suffix: suffix.map(str::to_string),
        }
    }
}

/// FFI-safe new diagnosis. The registry assigns the ID and timestamps.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewDiagnosis {
    pub patient_id: String,
    pub cancer_site_id: String,
    pub cancer_side: String,
    pub cancer_pathology_id: String,
    pub diagnosis_code_id: Option<String>,
    pub date_of_diagnosis: String,
    pub t_stage: Option<FfiStage>,
    pub n_stage: Option<FfiStage>,
    pub m_stage: Option<FfiStage>,
    pub overall_stage: Option<String>,
}

impl TryFrom<FfiNewDiagnosis> for Diagnosis {
    type Error = OncoRegistryError;

    fn try_from(diagnosis: FfiNewDiagnosis) -> Result<Self, Self::Error> {
        let cancer_side: CancerSide = diagnosis.cancer_side.parse()?;
        let date_of_diagnosis = parse_date("date_of_diagnosis", &diagnosis.date_of_diagnosis)?;
        let t_stage = t_stage_from_ffi(diagnosis.t_stage.as_ref())?;
        let n_stage = n_stage_from_ffi(diagnosis.n_stage.as_ref())?;
        let m_stage = m_stage_from_ffi(diagnosis.m_stage.as_ref())?;
        let mut record = Diagnosis::new(
            diagnosis.patient_id,
            diagnosis.cancer_site_id,
            cancer_side,
            diagnosis.cancer_pathology_id,
            date_of_diagnosis,
        );
        record.diagnosis_code_id = diagnosis.diagnosis_code_id;
        record.t_stage = t_stage;
        record.n_stage = n_stage;
        record.m_stage = m_stage;
        record.overall_stage = diagnosis.overall_stage;
        Ok(record)
    }
}

/// FFI-safe diagnosis as stored.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDiagnosis {
    pub diagnosis_id: String,
    pub patient_id: String,
    pub cancer_site_id: String,
    pub cancer_side: String,
    pub cancer_pathology_id: String,
    pub diagnosis_code_id: Option<String>,
    pub date_of_diagnosis: String,
    pub t_stage: Option<FfiStage>,
    pub n_stage: Option<FfiStage>,
    pub m_stage: Option<FfiStage>,
    pub overall_stage: Option<String>,
    pub staging_display: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl From<Diagnosis> for FfiDiagnosis {
    fn from(diagnosis: Diagnosis) -> Self {
        let staging_display = diagnosis.staging_display();
        Self {
            diagnosis_id: diagnosis.diagnosis_id,
            patient_id: diagnosis.patient_id,
            cancer_site_id: diagnosis.cancer_site_id,
            cancer_side: diagnosis.cancer_side.as_str().to_string(),
            cancer_pathology_id: diagnosis.cancer_pathology_id,
            diagnosis_code_id: diagnosis.diagnosis_code_id,
            date_of_diagnosis: diagnosis.date_of_diagnosis.to_string(),
            t_stage: diagnosis.t_stage.map(Into::into),
            n_stage: diagnosis.n_stage.map(Into::into),
            m_stage: diagnosis.m_stage.map(Into::into),
            overall_stage: diagnosis.overall_stage,
            staging_display,
            created_at: diagnosis.created_at,
            modified_at: diagnosis.modified_at,
        }
    }
}

impl TryFrom<FfiDiagnosis> for Diagnosis {
    type Error = OncoRegistryError;

    fn try_from(diagnosis: FfiDiagnosis) -> Result<Self, Self::Error> {
        let cancer_side: CancerSide = diagnosis.cancer_side.parse()?;
        let date_of_diagnosis = parse_date("date_of_diagnosis", &diagnosis.date_of_diagnosis)?;
        let t_stage = t_stage_from_ffi(diagnosis.t_stage.as_ref())?;
        let n_stage = n_stage_from_ffi(diagnosis.n_stage.as_ref())?;
        let m_stage = m_stage_from_ffi(diagnosis.m_stage.as_ref())?;
        Ok(Diagnosis {
            diagnosis_id: diagnosis.diagnosis_id,
            patient_id: diagnosis.patient_id,
            cancer_site_id: diagnosis.cancer_site_id,
            cancer_side,
            cancer_pathology_id: diagnosis.cancer_pathology_id,
            diagnosis_code_id: diagnosis.diagnosis_code_id,
            date_of_diagnosis,
            t_stage,
            n_stage,
            m_stage,
            overall_stage: diagnosis.overall_stage,
            created_at: diagnosis.created_at,
            modified_at: diagnosis.modified_at,
        })
    }
}

/// FFI-safe new booking. The registry assigns the ID, timestamps and
/// derived planning fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewBooking {
    pub diagnosis_id: String,
    pub treatment_intent: String,
    pub treatment_sequence: String,
    pub modality: String,
    pub treatment_technique_id: String,
    pub billing_code_id: String,
    pub concurrent_systemic_therapy: bool,
    pub systemic_therapy_type_ids: Vec<String>,
    pub proposed_planning_image_date: Option<String>,
    pub proposed_treatment_start_date: Option<String>,
    pub planned_total_dose: f64,
    pub planned_total_fractions: u32,
    pub planned_fractions_per_day: u32,
    pub planned_fractions_per_week: u32,
}

impl TryFrom<FfiNewBooking> for RadiotherapyBooking {
    type Error = OncoRegistryError;

    fn try_from(booking: FfiNewBooking) -> Result<Self, Self::Error> {
        let treatment_intent: TreatmentIntent = booking.treatment_intent.parse()?;
        let treatment_sequence: TreatmentSequence = booking.treatment_sequence.parse()?;
        let modality: Modality = booking.modality.parse()?;
        let proposed_planning_image_date = parse_opt_date(
            "proposed_planning_image_date",
            booking.proposed_planning_image_date.as_deref(),
        )?;
        let proposed_treatment_start_date = parse_opt_date(
            "proposed_treatment_start_date",
            booking.proposed_treatment_start_date.as_deref(),
        )?;
        let mut record = RadiotherapyBooking::new(
            booking.diagnosis_id,
            treatment_intent,
            treatment_sequence,
            modality,
            booking.treatment_technique_id,
            booking.billing_code_id,
        );
        record.concurrent_systemic_therapy = booking.concurrent_systemic_therapy;
        record.systemic_therapy_type_ids = booking.systemic_therapy_type_ids;
        record.proposed_planning_image_date = proposed_planning_image_date;
        record.proposed_treatment_start_date = proposed_treatment_start_date;
        record.planned_total_dose = booking.planned_total_dose;
        record.planned_total_fractions = booking.planned_total_fractions;
        record.planned_fractions_per_day = booking.planned_fractions_per_day;
        record.planned_fractions_per_week = booking.planned_fractions_per_week;
        Ok(record)
    }
}

/// FFI-safe booking as stored, including the derived planning fields.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiBooking {
    pub booking_id: String,
    pub diagnosis_id: String,
    pub treatment_intent: String,
    pub treatment_sequence: String,
    pub modality: String,
    pub treatment_technique_id: String,
    pub billing_code_id: String,
    pub concurrent_systemic_therapy: bool,
    pub systemic_therapy_type_ids: Vec<String>,
    pub proposed_planning_image_date: Option<String>,
    pub proposed_treatment_start_date: Option<String>,
    pub planned_total_dose: f64,
    pub planned_total_fractions: u32,
    pub planned_fractions_per_day: u32,
    pub planned_fractions_per_week: u32,
    pub planned_dose_per_fraction: Option<f64>,
    pub planned_treatment_duration_days: Option<u32>,
    pub created_at: String,
    pub modified_at: String,
}

impl From<RadiotherapyBooking> for FfiBooking {
    fn from(booking: RadiotherapyBooking) -> Self {
        let planned_dose_per_fraction = booking.planned_dose_per_fraction().ok();
        let planned_treatment_duration_days = booking.planned_treatment_duration_days().ok();
        Self {
            booking_id: booking.booking_id,
            diagnosis_id: booking.diagnosis_id,
            treatment_intent: booking.treatment_intent.as_str().to_string(),
            treatment_sequence: booking.treatment_sequence.as_str().to_string(),
            modality: booking.modality.as_str().to_string(),
            treatment_technique_id: booking.treatment_technique_id,
            billing_code_id: booking.billing_code_id,
            concurrent_systemic_therapy: booking.concurrent_systemic_therapy,
            systemic_therapy_type_ids: booking.systemic_therapy_type_ids,
            proposed_planning_image_date: booking
                .proposed_planning_image_date
                .map(|d| d.to_string()),
            proposed_treatment_start_date: booking
                .proposed_treatment_start_date
                .map(|d| d.to_string()),
            planned_total_dose: booking.planned_total_dose,
            planned_total_fractions: booking.planned_total_fractions,
            planned_fractions_per_day: booking.planned_fractions_per_day,
            planned_fractions_per_week: booking.planned_fractions_per_week,
            planned_dose_per_fraction,
            planned_treatment_duration_days,
            created_at: booking.created_at,
            modified_at: booking.modified_at,
        }
    }
}

impl TryFrom<FfiBooking> for RadiotherapyBooking {
    type Error = OncoRegistryError;

    fn try_from(booking: FfiBooking) -> Result<Self, Self::Error> {
        let treatment_intent: TreatmentIntent = booking.treatment_intent.parse()?;
        let treatment_sequence: TreatmentSequence = booking.treatment_sequence.parse()?;
        let modality: Modality = booking.modality.parse()?;
        let proposed_planning_image_date = parse_opt_date(
            "proposed_planning_image_date",
            booking.proposed_planning_image_date.as_deref(),
        )?;
        let proposed_treatment_start_date = parse_opt_date(
            "proposed_treatment_start_date",
            booking.proposed_treatment_start_date.as_deref(),
        )?;
        Ok(RadiotherapyBooking {
            booking_id: booking.booking_id,
            diagnosis_id: booking.diagnosis_id,
            treatment_intent,
            treatment_sequence,
            modality,
            treatment_technique_id: booking.treatment_technique_id,
            billing_code_id: booking.billing_code_id,
            concurrent_systemic_therapy: booking.concurrent_systemic_therapy,
            systemic_therapy_type_ids: booking.systemic_therapy_type_ids,
            proposed_planning_image_date,
            proposed_treatment_start_date,
            planned_total_dose: booking.planned_total_dose,
            planned_total_fractions: booking.planned_total_fractions,
            planned_fractions_per_day: booking.planned_fractions_per_day,
            planned_fractions_per_week: booking.planned_fractions_per_week,
            created_at: booking.created_at,
            modified_at: booking.modified_at,
        })
    }
}
