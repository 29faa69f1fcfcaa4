//! Registry dataset export.
//!
//! Produces a nested JSON document for archival and a flat CSV with one row
//! per booking for spreadsheet analysis. Patients without diagnoses and
//! diagnoses without bookings still appear, with the deeper columns empty.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::models::{
    CancerSide, Diagnosis, Gender, LookupKind, Modality, Patient, RadiotherapyBooking,
    TreatmentIntent, TreatmentSequence,
};

/// Full registry extract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryExport {
    /// Export timestamp
    pub exported_at: String,
    /// All patients with their clinical records
    pub patients: Vec<PatientExport>,
    /// Total diagnosis count
    pub total_diagnoses: usize,
    /// Total booking count
    pub total_bookings: usize,
}

/// One patient with their diagnoses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientExport {
    /// Hospital UID
    pub patient_uid: String,
    /// Full name
    pub name: String,
    /// Date of birth
    pub date_of_birth: NaiveDate,
    /// Gender code
    pub gender: Gender,
    /// Registration date
    pub date_of_registration: NaiveDate,
    /// Age in whole years at registration
    pub age_at_registration: Option<u32>,
    /// Diagnoses, most recent first
    pub diagnoses: Vec<DiagnosisExport>,
}

/// One diagnosis with its bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisExport {
    /// Cancer site code
    pub cancer_site: String,
    /// Cancer site label
    pub cancer_site_label: String,
    /// Laterality
    pub cancer_side: CancerSide,
    /// Pathology code
    pub cancer_pathology: String,
    /// Pathology label
    pub cancer_pathology_label: String,
    /// Coded diagnosis, when recorded
    pub diagnosis_code: Option<String>,
    /// Date of diagnosis
    pub date_of_diagnosis: NaiveDate,
    /// Present staging axes in standard notation, e.g. "cT2 cN1 cM0"
    pub staging: Option<String>,
    /// Overall stage group
    pub overall_stage: Option<String>,
    /// Radiotherapy bookings, oldest first
    pub bookings: Vec<BookingExport>,
}

/// One radiotherapy booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingExport {
    /// Treatment intent
    pub treatment_intent: TreatmentIntent,
    /// Treatment sequence
    pub treatment_sequence: TreatmentSequence,
    /// Delivery modality
    pub modality: Modality,
    /// Technique code
    pub treatment_technique: String,
    /// Technique label
    pub treatment_technique_label: String,
    /// Billing code
    pub billing_code: String,
    /// Billing code label
    pub billing_code_label: String,
    /// Concurrent systemic therapy flag
    pub concurrent_systemic_therapy: bool,
    /// Concurrent therapy type codes
    pub systemic_therapy_types: Vec<String>,
    /// Proposed planning image date
    pub proposed_planning_image_date: Option<NaiveDate>,
    /// Proposed treatment start date
    pub proposed_treatment_start_date: Option<NaiveDate>,
    /// Total dose in Gray
    pub planned_total_dose: f64,
    /// Total fractions
    pub planned_total_fractions: u32,
    /// Fractions per day
    pub planned_fractions_per_day: u32,
    /// Fractions per week
    pub planned_fractions_per_week: u32,
    /// Derived dose per fraction in Gray
    pub planned_dose_per_fraction: Option<f64>,
    /// Derived course length in calendar days
    pub planned_treatment_duration_days: Option<u32>,
}

const CSV_HEADER: &str = "patient_uid,name,gender,date_of_birth,date_of_registration,\
age_at_registration,cancer_site,cancer_side,cancer_pathology,diagnosis_code,\
date_of_diagnosis,staging,overall_stage,treatment_intent,treatment_sequence,modality,\
treatment_technique,billing_code,concurrent_systemic_therapy,systemic_therapy_types,\
proposed_planning_image_date,proposed_treatment_start_date,\
planned_total_dose,planned_total_fractions,planned_dose_per_fraction,\
planned_treatment_duration_days";

impl RegistryExport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV, one row per booking.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(CSV_HEADER);
        csv.push('\n');

        for patient in &self.patients {
            if patient.diagnoses.is_empty() {
                push_row(&mut csv, patient, None, None);
                continue;
            }
            for diagnosis in &patient.diagnoses {
                if diagnosis.bookings.is_empty() {
                    push_row(&mut csv, patient, Some(diagnosis), None);
                    continue;
                }
                for booking in &diagnosis.bookings {
                    push_row(&mut csv, patient, Some(diagnosis), Some(booking));
                }
            }
        }

        csv
    }
}

fn opt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

fn push_row(
    csv: &mut String,
    patient: &PatientExport,
    diagnosis: Option<&DiagnosisExport>,
    booking: Option<&BookingExport>,
) {
    let mut fields: Vec<String> = vec![
        escape_csv(&patient.patient_uid),
        escape_csv(&patient.name),
        patient.gender.to_string(),
        patient.date_of_birth.to_string(),
        patient.date_of_registration.to_string(),
        patient.age_at_registration.map(|a| a.to_string()).unwrap_or_default(),
    ];

    match diagnosis {
        Some(d) => fields.extend([
            escape_csv(&d.cancer_site),
            d.cancer_side.to_string(),
            escape_csv(&d.cancer_pathology),
            escape_csv(d.diagnosis_code.as_deref().unwrap_or("")),
            d.date_of_diagnosis.to_string(),
            escape_csv(d.staging.as_deref().unwrap_or("")),
            escape_csv(d.overall_stage.as_deref().unwrap_or("")),
        ]),
        None => fields.extend(std::iter::repeat(String::new()).take(7)),
    }

    match booking {
        Some(b) => fields.extend([
            b.treatment_intent.to_string(),
            b.treatment_sequence.to_string(),
            b.modality.to_string(),
            escape_csv(&b.treatment_technique),
            escape_csv(&b.billing_code),
            b.concurrent_systemic_therapy.to_string(),
            escape_csv(&b.systemic_therapy_types.join(";")),
            opt_date(b.proposed_planning_image_date),
            opt_date(b.proposed_treatment_start_date),
            b.planned_total_dose.to_string(),
            b.planned_total_fractions.to_string(),
            b.planned_dose_per_fraction.map(|v| v.to_string()).unwrap_or_default(),
            b.planned_treatment_duration_days.map(|v| v.to_string()).unwrap_or_default(),
        ]),
        None => fields.extend(std::iter::repeat(String::new()).take(13)),
    }

    csv.push_str(&fields.join(","));
    csv.push('\n');
}

/// Registry dataset exporter.
pub struct RegistryExporter<'a> {
    db: &'a Database,
}

impl<'a> RegistryExporter<'a> {
    /// Create a new dataset exporter.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Export the whole registry.
    pub fn export_all(&self) -> DbResult<RegistryExport> {
        let mut patients = Vec::new();
        let mut total_diagnoses = 0;
        let mut total_bookings = 0;

        for patient in self.db.list_patients()? {
            let export = self.build_patient(&patient)?;
            total_diagnoses += export.diagnoses.len();
            total_bookings += export.diagnoses.iter().map(|d| d.bookings.len()).sum::<usize>();
            patients.push(export);
        }

        Ok(RegistryExport {
            exported_at: chrono::Utc::now().to_rfc3339(),
            patients,
            total_diagnoses,
            total_bookings,
        })
    }

    /// Export one patient's records.
    pub fn export_patient(&self, patient_id: &str) -> DbResult<PatientExport> {
        let patient = self
            .db
            .get_patient(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {patient_id}")))?;
        self.build_patient(&patient)
    }

    fn build_patient(&self, patient: &Patient) -> DbResult<PatientExport> {
        let mut diagnoses = Vec::new();
        for diagnosis in self.db.list_diagnoses_for_patient(&patient.patient_id)? {
            diagnoses.push(self.build_diagnosis(&diagnosis)?);
        }
        Ok(PatientExport {
            patient_uid: patient.patient_uid.clone(),
            name: patient.name.clone(),
            date_of_birth: patient.date_of_birth,
            gender: patient.gender,
            date_of_registration: patient.date_of_registration,
            age_at_registration: patient.age_at_registration(),
            diagnoses,
        })
    }

    fn build_diagnosis(&self, diagnosis: &Diagnosis) -> DbResult<DiagnosisExport> {
        let mut bookings = Vec::new();
        for booking in self.db.list_bookings_for_diagnosis(&diagnosis.diagnosis_id)? {
            bookings.push(self.build_booking(&booking)?);
        }
        Ok(DiagnosisExport {
            cancer_site: diagnosis.cancer_site_id.clone(),
            cancer_site_label: self.label(LookupKind::CancerSite, &diagnosis.cancer_site_id)?,
            cancer_side: diagnosis.cancer_side,
            cancer_pathology: diagnosis.cancer_pathology_id.clone(),
            cancer_pathology_label: self.label(LookupKind::Pathology, &diagnosis.cancer_pathology_id)?,
            diagnosis_code: diagnosis.diagnosis_code_id.clone(),
            date_of_diagnosis: diagnosis.date_of_diagnosis,
            staging: diagnosis.staging_display(),
            overall_stage: diagnosis.overall_stage.clone(),
            bookings,
        })
    }

    fn build_booking(&self, booking: &RadiotherapyBooking) -> DbResult<BookingExport> {
        Ok(BookingExport {
            treatment_intent: booking.treatment_intent,
            treatment_sequence: booking.treatment_sequence,
            modality: booking.modality,
            treatment_technique: booking.treatment_technique_id.clone(),
            treatment_technique_label: self
                .label(LookupKind::TreatmentTechnique, &booking.treatment_technique_id)?,
            billing_code: booking.billing_code_id.clone(),
            billing_code_label: self.label(LookupKind::BillingCode, &booking.billing_code_id)?,
            concurrent_systemic_therapy: booking.concurrent_systemic_therapy,
            systemic_therapy_types: booking.systemic_therapy_type_ids.clone(),
            proposed_planning_image_date: booking.proposed_planning_image_date,
            proposed_treatment_start_date: booking.proposed_treatment_start_date,
            planned_total_dose: booking.planned_total_dose,
            planned_total_fractions: booking.planned_total_fractions,
            planned_fractions_per_day: booking.planned_fractions_per_day,
            planned_fractions_per_week: booking.planned_fractions_per_week,
            planned_dose_per_fraction: booking.planned_dose_per_fraction().ok(),
            planned_treatment_duration_days: booking.planned_treatment_duration_days().ok(),
        })
    }

    // dangling codes cannot occur while the RESTRICT rules hold; fall back to
    // the code itself rather than failing an export
    fn label(&self, kind: LookupKind, id: &str) -> DbResult<String> {
        Ok(self
            .db
            .get_lookup(kind, id)?
            .map(|entry| entry.label)
            .unwrap_or_else(|| id.to_string()))
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
