//! Diagnosis database operations.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{Diagnosis, LookupKind, MStage, NStage, TStage};
use crate::validate::validate_diagnosis;

const DUPLICATE_DIAGNOSIS: &str =
    "a diagnosis with this site, side and pathology already exists for this patient";
const BROKEN_REFERENCE: &str = "referenced patient or lookup entry does not exist";

/// Raw row before code fields are parsed.
struct DiagnosisRow {
    diagnosis_id: String,
    patient_id: String,
    cancer_site_id: String,
    cancer_side: String,
    cancer_pathology_id: String,
    diagnosis_code_id: Option<String>,
    date_of_diagnosis: chrono::NaiveDate,
    t_stage: [Option<String>; 3],
    n_stage: [Option<String>; 3],
    m_stage: [Option<String>; 3],
    overall_stage: Option<String>,
    created_at: String,
    modified_at: String,
}

impl DiagnosisRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            diagnosis_id: row.get(0)?,
            patient_id: row.get(1)?,
            cancer_site_id: row.get(2)?,
            cancer_side: row.get(3)?,
            cancer_pathology_id: row.get(4)?,
            diagnosis_code_id: row.get(5)?,
            date_of_diagnosis: row.get(6)?,
            t_stage: [row.get(7)?, row.get(8)?, row.get(9)?],
            n_stage: [row.get(10)?, row.get(11)?, row.get(12)?],
            m_stage: [row.get(13)?, row.get(14)?, row.get(15)?],
            overall_stage: row.get(16)?,
            created_at: row.get(17)?,
            modified_at: row.get(18)?,
        })
    }
}

impl TryFrom<DiagnosisRow> for Diagnosis {
    type Error = DbError;

    fn try_from(row: DiagnosisRow) -> DbResult<Self> {
        let [t_prefix, t_category, t_suffix] = row.t_stage;
        let [n_prefix, n_category, n_suffix] = row.n_stage;
        let [m_prefix, m_category, m_suffix] = row.m_stage;
        Ok(Self {
            diagnosis_id: row.diagnosis_id,
            patient_id: row.patient_id,
            cancer_site_id: row.cancer_site_id,
            cancer_side: row.cancer_side.parse()?,
            cancer_pathology_id: row.cancer_pathology_id,
            diagnosis_code_id: row.diagnosis_code_id,
            date_of_diagnosis: row.date_of_diagnosis,
            t_stage: TStage::from_codes(t_prefix.as_deref(), t_category.as_deref(), t_suffix.as_deref())?,
            n_stage: NStage::from_codes(n_prefix.as_deref(), n_category.as_deref(), n_suffix.as_deref())?,
            m_stage: MStage::from_codes(m_prefix.as_deref(), m_category.as_deref(), m_suffix.as_deref())?,
            overall_stage: row.overall_stage,
            created_at: row.created_at,
            modified_at: row.modified_at,
        })
    }
}

const DIAGNOSIS_COLUMNS: &str = "diagnosis_id, patient_id, cancer_site_id, cancer_side, \
    cancer_pathology_id, diagnosis_code_id, date_of_diagnosis, \
    t_stage_prefix, t_stage_category, t_stage_suffix, \
    n_stage_prefix, n_stage_category, n_stage_suffix, \
    m_stage_prefix, m_stage_category, m_stage_suffix, \
    overall_stage, created_at, modified_at";

impl Database {
    /// Validate and insert a new diagnosis under its patient.
    pub fn insert_diagnosis(&self, diagnosis: &Diagnosis) -> DbResult<()> {
        let patient = self
            .get_patient(&diagnosis.patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", diagnosis.patient_id)))?;
        validate_diagnosis(diagnosis, &patient)?;
        self.require_lookup("cancer_site", LookupKind::CancerSite, &diagnosis.cancer_site_id)?;
        self.require_lookup("cancer_pathology", LookupKind::Pathology, &diagnosis.cancer_pathology_id)?;
        if let Some(code) = &diagnosis.diagnosis_code_id {
            self.require_lookup("diagnosis_code", LookupKind::DiagnosisCode, code)?;
        }

        let t = diagnosis.t_stage.map(|s| s.codes());
        let n = diagnosis.n_stage.map(|s| s.codes());
        let m = diagnosis.m_stage.map(|s| s.codes());
        self.conn
            .execute(
                r#"
                INSERT INTO diagnoses (
                    diagnosis_id, patient_id, cancer_site_id, cancer_side, cancer_pathology_id,
                    diagnosis_code_id, date_of_diagnosis,
                    t_stage_prefix, t_stage_category, t_stage_suffix,
                    n_stage_prefix, n_stage_category, n_stage_suffix,
                    m_stage_prefix, m_stage_category, m_stage_suffix,
                    overall_stage, created_at, modified_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
                "#,
                params![
                    diagnosis.diagnosis_id,
                    diagnosis.patient_id,
                    diagnosis.cancer_site_id,
                    diagnosis.cancer_side.as_str(),
                    diagnosis.cancer_pathology_id,
                    diagnosis.diagnosis_code_id,
                    diagnosis.date_of_diagnosis,
                    t.map(|c| c.0),
                    t.map(|c| c.1),
                    t.and_then(|c| c.2),
                    n.map(|c| c.0),
                    n.map(|c| c.1),
                    n.and_then(|c| c.2),
                    m.map(|c| c.0),
                    m.map(|c| c.1),
                    m.and_then(|c| c.2),
                    diagnosis.overall_stage,
                    diagnosis.created_at,
                    diagnosis.modified_at,
                ],
            )
            .map_err(|e| map_constraint(e, DUPLICATE_DIAGNOSIS, BROKEN_REFERENCE))?;
        tracing::info!(
            diagnosis_id = %diagnosis.diagnosis_id,
            patient_id = %diagnosis.patient_id,
            "diagnosis recorded"
        );
        Ok(())
    }

    /// Validate and update an existing diagnosis. The owning patient never
    /// changes. Returns false when no such diagnosis exists.
    pub fn update_diagnosis(&self, diagnosis: &Diagnosis) -> DbResult<bool> {
        let existing = match self.get_diagnosis(&diagnosis.diagnosis_id)? {
            Some(d) => d,
            None => return Ok(false),
        };
        let patient = self
            .get_patient(&existing.patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", existing.patient_id)))?;
        validate_diagnosis(diagnosis, &patient)?;
        self.require_lookup("cancer_site", LookupKind::CancerSite, &diagnosis.cancer_site_id)?;
        self.require_lookup("cancer_pathology", LookupKind::Pathology, &diagnosis.cancer_pathology_id)?;
        if let Some(code) = &diagnosis.diagnosis_code_id {
            self.require_lookup("diagnosis_code", LookupKind::DiagnosisCode, code)?;
        }

        let t = diagnosis.t_stage.map(|s| s.codes());
        let n = diagnosis.n_stage.map(|s| s.codes());
        let m = diagnosis.m_stage.map(|s| s.codes());
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE diagnoses SET
                    cancer_site_id = ?2,
                    cancer_side = ?3,
                    cancer_pathology_id = ?4,
                    diagnosis_code_id = ?5,
                    date_of_diagnosis = ?6,
                    t_stage_prefix = ?7, t_stage_category = ?8, t_stage_suffix = ?9,
                    n_stage_prefix = ?10, n_stage_category = ?11, n_stage_suffix = ?12,
                    m_stage_prefix = ?13, m_stage_category = ?14, m_stage_suffix = ?15,
                    overall_stage = ?16,
                    modified_at = datetime('now')
                WHERE diagnosis_id = ?1
                "#,
                params![
                    diagnosis.diagnosis_id,
                    diagnosis.cancer_site_id,
                    diagnosis.cancer_side.as_str(),
                    diagnosis.cancer_pathology_id,
                    diagnosis.diagnosis_code_id,
                    diagnosis.date_of_diagnosis,
                    t.map(|c| c.0),
                    t.map(|c| c.1),
                    t.and_then(|c| c.2),
                    n.map(|c| c.0),
                    n.map(|c| c.1),
                    n.and_then(|c| c.2),
                    m.map(|c| c.0),
                    m.map(|c| c.1),
                    m.and_then(|c| c.2),
                    diagnosis.overall_stage,
                ],
            )
            .map_err(|e| map_constraint(e, DUPLICATE_DIAGNOSIS, BROKEN_REFERENCE))?;
        Ok(rows_affected > 0)
    }

    /// Get a diagnosis by ID.
    pub fn get_diagnosis(&self, diagnosis_id: &str) -> DbResult<Option<Diagnosis>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses WHERE diagnosis_id = ?"),
                [diagnosis_id],
                DiagnosisRow::read,
            )
            .optional()?;
        row.map(Diagnosis::try_from).transpose()
    }

    /// List a patient's diagnoses, most recent first.
    pub fn list_diagnoses_for_patient(&self, patient_id: &str) -> DbResult<Vec<Diagnosis>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {DIAGNOSIS_COLUMNS}
            FROM diagnoses
            WHERE patient_id = ?
            ORDER BY date_of_diagnosis DESC, created_at DESC
            "#
        ))?;
        let rows = stmt.query_map([patient_id], DiagnosisRow::read)?;
        let mut diagnoses = Vec::new();
        for row in rows {
            diagnoses.push(Diagnosis::try_from(row?)?);
        }
        Ok(diagnoses)
    }

    /// List every diagnosis in the registry, most recent first.
    pub fn list_diagnoses(&self) -> DbResult<Vec<Diagnosis>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DIAGNOSIS_COLUMNS} FROM diagnoses ORDER BY date_of_diagnosis DESC, created_at DESC"
        ))?;
        let rows = stmt.query_map([], DiagnosisRow::read)?;
        let mut diagnoses = Vec::new();
        for row in rows {
            diagnoses.push(Diagnosis::try_from(row?)?);
        }
        Ok(diagnoses)
    }

    /// Delete a diagnosis; its bookings cascade.
    pub fn delete_diagnosis(&self, diagnosis_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM diagnoses WHERE diagnosis_id = ?", [diagnosis_id])?;
        if rows_affected > 0 {
            tracing::info!(diagnosis_id, "diagnosis deleted with cascade");
        }
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CancerSide, Gender, LookupEntry, MCategory, Patient, StagePrefix, TCategory,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_db() -> (Database, Patient) {
        let db = Database::open_in_memory().unwrap();
        for (kind, id, label) in [
            (LookupKind::CancerSite, "C50.9", "Breast"),
            (LookupKind::CancerSite, "C34.9", "Lung"),
            (LookupKind::Pathology, "8500/3", "Ductal carcinoma"),
            (LookupKind::DiagnosisCode, "ICD-C50", "Malignant neoplasm of breast"),
        ] {
            db.upsert_lookup(kind, &LookupEntry::new(id.into(), label.into())).unwrap();
        }
        let patient = Patient::new("MRN-1".into(), "Test Patient".into(), date(1958, 3, 2), Gender::Female);
        db.insert_patient(&patient).unwrap();
        (db, patient)
    }

    fn sample(patient: &Patient) -> Diagnosis {
        Diagnosis::new(
            patient.patient_id.clone(),
            "C50.9".into(),
            CancerSide::Left,
            "8500/3".into(),
            date(2024, 2, 20),
        )
    }

    #[test]
    fn test_insert_and_get_with_staging() {
        let (db, patient) = setup_db();

        let mut diagnosis = sample(&patient);
        diagnosis.diagnosis_code_id = Some("ICD-C50".into());
        diagnosis.t_stage = Some(TStage::new(StagePrefix::Clinical, TCategory::T2));
        diagnosis.m_stage = Some(MStage::new(StagePrefix::Clinical, MCategory::M0));
        diagnosis.overall_stage = Some("IIB".into());
        db.insert_diagnosis(&diagnosis).unwrap();

        let retrieved = db.get_diagnosis(&diagnosis.diagnosis_id).unwrap().unwrap();
        assert_eq!(retrieved, diagnosis);
        assert_eq!(retrieved.staging_display().unwrap(), "cT2 cM0");
    }

    #[test]
    fn test_partial_staging_axis_rejected_by_schema() {
        let (db, patient) = setup_db();

        // the model cannot produce a lone prefix or suffix; go straight to SQL
        let prefix_only = db.conn().execute(
            "INSERT INTO diagnoses (diagnosis_id, patient_id, cancer_site_id, cancer_side,
                                    cancer_pathology_id, date_of_diagnosis, t_stage_prefix)
             VALUES ('d-1', ?1, 'C50.9', 'left', '8500/3', '2024-02-20', 'c')",
            [&patient.patient_id],
        );
        assert!(prefix_only.is_err());

        let suffix_only = db.conn().execute(
            "INSERT INTO diagnoses (diagnosis_id, patient_id, cancer_site_id, cancer_side,
                                    cancer_pathology_id, date_of_diagnosis, n_stage_suffix)
             VALUES ('d-2', ?1, 'C50.9', 'left', '8500/3', '2024-02-20', 'mi')",
            [&patient.patient_id],
        );
        assert!(suffix_only.is_err());
    }

    #[test]
    fn test_duplicate_clinical_identity_is_conflict() {
        let (db, patient) = setup_db();

        db.insert_diagnosis(&sample(&patient)).unwrap();
        let err = db.insert_diagnosis(&sample(&patient)).unwrap_err();
        assert!(matches!(err, DbError::Integrity(_)));

        // the same tumour on the other side is a distinct diagnosis
        let mut other_side = sample(&patient);
        other_side.cancer_side = CancerSide::Right;
        db.insert_diagnosis(&other_side).unwrap();
    }

    #[test]
    fn test_unknown_lookup_code_names_field() {
        let (db, patient) = setup_db();

        let mut diagnosis = sample(&patient);
        diagnosis.cancer_site_id = "C99.9".into();
        match db.insert_diagnosis(&diagnosis).unwrap_err() {
            DbError::Validation(v) => assert_eq!(v.field, "cancer_site"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_patient_is_not_found() {
        let (db, patient) = setup_db();

        let mut diagnosis = sample(&patient);
        diagnosis.patient_id = "nope".into();
        assert!(matches!(db.insert_diagnosis(&diagnosis).unwrap_err(), DbError::NotFound(_)));
    }

    #[test]
    fn test_diagnosis_before_birth_refused() {
        let (db, patient) = setup_db();

        let mut diagnosis = sample(&patient);
        diagnosis.date_of_diagnosis = date(1950, 1, 1);
        match db.insert_diagnosis(&diagnosis).unwrap_err() {
            DbError::Validation(v) => assert_eq!(v.field, "date_of_diagnosis"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_update_adds_staging() {
        let (db, patient) = setup_db();

        let diagnosis = sample(&patient);
        db.insert_diagnosis(&diagnosis).unwrap();

        let mut staged = diagnosis.clone();
        staged.t_stage = Some(TStage::new(StagePrefix::Pathological, TCategory::T1));
        staged.overall_stage = Some("IA".into());
        assert!(db.update_diagnosis(&staged).unwrap());

        let retrieved = db.get_diagnosis(&diagnosis.diagnosis_id).unwrap().unwrap();
        assert_eq!(retrieved.t_stage, staged.t_stage);
        assert_eq!(retrieved.overall_stage.as_deref(), Some("IA"));
        assert_ne!(retrieved.modified_at, diagnosis.modified_at);
    }

    #[test]
    fn test_update_missing_diagnosis_returns_false() {
        let (db, patient) = setup_db();
        assert!(!db.update_diagnosis(&sample(&patient)).unwrap());
    }

    #[test]
    fn test_list_for_patient_most_recent_first() {
        let (db, patient) = setup_db();

        let mut older = sample(&patient);
        older.date_of_diagnosis = date(2020, 5, 5);
        db.insert_diagnosis(&older).unwrap();

        let mut newer = sample(&patient);
        newer.cancer_site_id = "C34.9".into();
        newer.date_of_diagnosis = date(2024, 2, 20);
        db.insert_diagnosis(&newer).unwrap();

        let listed = db.list_diagnoses_for_patient(&patient.patient_id).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].diagnosis_id, newer.diagnosis_id);

        let all = db.list_diagnoses().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].diagnosis_id, newer.diagnosis_id);
    }

    #[test]
    fn test_delete_diagnosis() {
        let (db, patient) = setup_db();

        let diagnosis = sample(&patient);
        db.insert_diagnosis(&diagnosis).unwrap();
        assert!(db.delete_diagnosis(&diagnosis.diagnosis_id).unwrap());
        assert!(db.get_diagnosis(&diagnosis.diagnosis_id).unwrap().is_none());
    }
}
