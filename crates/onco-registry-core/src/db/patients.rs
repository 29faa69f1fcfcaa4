//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbResult};
use crate::models::Patient;
use crate::validate::validate_patient;

const DUPLICATE_UID: &str = "a patient with this hospital UID is already registered";

/// Raw row before code fields are parsed.
struct PatientRow {
    patient_id: String,
    patient_uid: String,
    name: String,
    date_of_birth: chrono::NaiveDate,
    gender: String,
    date_of_registration: chrono::NaiveDate,
    created_at: String,
    modified_at: String,
}

impl PatientRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            patient_id: row.get(0)?,
            patient_uid: row.get(1)?,
            name: row.get(2)?,
            date_of_birth: row.get(3)?,
            gender: row.get(4)?,
            date_of_registration: row.get(5)?,
            created_at: row.get(6)?,
            modified_at: row.get(7)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = super::DbError;

    fn try_from(row: PatientRow) -> DbResult<Self> {
        Ok(Self {
            patient_id: row.patient_id,
            patient_uid: row.patient_uid,
            name: row.name,
            date_of_birth: row.date_of_birth,
            gender: row.gender.parse()?,
            date_of_registration: row.date_of_registration,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

const PATIENT_COLUMNS: &str = "patient_id, patient_uid, name, date_of_birth, gender, \
                               date_of_registration, created_at, modified_at";

impl Database {
    /// Validate and insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        validate_patient(patient)?;
        self.conn
            .execute(
                r#"
                INSERT INTO patients (
                    patient_id, patient_uid, name, date_of_birth, gender,
                    date_of_registration, created_at, modified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    patient.patient_id,
                    patient.patient_uid,
                    patient.name,
                    patient.date_of_birth,
                    patient.gender.as_str(),
                    patient.date_of_registration,
                    patient.created_at,
                    patient.modified_at,
                ],
            )
            .map_err(|e| map_constraint(e, DUPLICATE_UID, DUPLICATE_UID))?;
        tracing::info!(patient_id = %patient.patient_id, "patient registered");
        Ok(())
    }

    /// Validate and update an existing patient. Returns false when no such
    /// patient exists.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        validate_patient(patient)?;
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE patients SET
                    patient_uid = ?2,
                    name = ?3,
                    date_of_birth = ?4,
                    gender = ?5,
                    date_of_registration = ?6,
                    modified_at = datetime('now')
                WHERE patient_id = ?1
                "#,
                params![
                    patient.patient_id,
                    patient.patient_uid,
                    patient.name,
                    patient.date_of_birth,
                    patient.gender.as_str(),
                    patient.date_of_registration,
                ],
            )
            .map_err(|e| map_constraint(e, DUPLICATE_UID, DUPLICATE_UID))?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by surrogate ID.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_id = ?"),
                [patient_id],
                PatientRow::read,
            )
            .optional()?;
        row.map(Patient::try_from).transpose()
    }

    /// Get a patient by hospital UID.
    pub fn get_patient_by_uid(&self, patient_uid: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE patient_uid = ?"),
                [patient_uid],
                PatientRow::read,
            )
            .optional()?;
        row.map(Patient::try_from).transpose()
    }

    /// Search patients by name or hospital UID (prefix match).
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {PATIENT_COLUMNS}
            FROM patients
            WHERE name LIKE ?1 OR patient_uid LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#
        ))?;

        let rows = stmt.query_map(params![pattern, limit as i64], PatientRow::read)?;
        let mut patients = Vec::new();
        for row in rows {
            patients.push(Patient::try_from(row?)?);
        }
        Ok(patients)
    }

    /// List all patients ordered by name.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name"))?;

        let rows = stmt.query_map([], PatientRow::read)?;
        let mut patients = Vec::new();
        for row in rows {
            patients.push(Patient::try_from(row?)?);
        }
        Ok(patients)
    }

    /// Delete a patient; diagnoses and bookings cascade.
    pub fn delete_patient(&self, patient_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE patient_id = ?", [patient_id])?;
        if rows_affected > 0 {
            tracing::info!(patient_id, "patient deleted with cascade");
        }
        Ok(rows_affected > 0)
    }
}
