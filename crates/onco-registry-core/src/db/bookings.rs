//! Radiotherapy booking database operations.
//!
//! A booking row carries its derived planning fields as real columns, written
//! on every successful insert and update, so exports and ad-hoc SQL never
//! recompute them. The concurrent systemic therapy types live in a join
//! table and are replaced wholesale on update.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbError, DbResult};
use crate::models::{LookupKind, RadiotherapyBooking};
use crate::validate::{validate_booking_create, validate_booking_update, ValidationError};

const BROKEN_REFERENCE: &str = "referenced diagnosis or lookup entry does not exist";
const DUPLICATE_BOOKING: &str = "a booking with this ID already exists";

/// Raw row before code fields are parsed. Does not include the therapy join
/// table, which is fetched separately.
struct BookingRow {
    booking_id: String,
    diagnosis_id: String,
    treatment_intent: String,
    treatment_sequence: String,
    modality: String,
    treatment_technique_id: String,
    billing_code_id: String,
    concurrent_systemic_therapy: bool,
    proposed_planning_image_date: Option<chrono::NaiveDate>,
    proposed_treatment_start_date: Option<chrono::NaiveDate>,
    planned_total_dose: f64,
    planned_total_fractions: u32,
    planned_fractions_per_day: u32,
    planned_fractions_per_week: u32,
    created_at: String,
    modified_at: String,
}

impl BookingRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            booking_id: row.get(0)?,
            diagnosis_id: row.get(1)?,
            treatment_intent: row.get(2)?,
            treatment_sequence: row.get(3)?,
            modality: row.get(4)?,
            treatment_technique_id: row.get(5)?,
            billing_code_id: row.get(6)?,
            concurrent_systemic_therapy: row.get(7)?,
            proposed_planning_image_date: row.get(8)?,
            proposed_treatment_start_date: row.get(9)?,
            planned_total_dose: row.get(10)?,
            planned_total_fractions: row.get(11)?,
            planned_fractions_per_day: row.get(12)?,
            planned_fractions_per_week: row.get(13)?,
            created_at: row.get(14)?,
            modified_at: row.get(15)?,
        })
    }

    fn into_booking(self, systemic_therapy_type_ids: Vec<String>) -> DbResult<RadiotherapyBooking> {
        Ok(RadiotherapyBooking {
            booking_id: self.booking_id,
            diagnosis_id: self.diagnosis_id,
            treatment_intent: self.treatment_intent.parse()?,
            treatment_sequence: self.treatment_sequence.parse()?,
            modality: self.modality.parse()?,
            treatment_technique_id: self.treatment_technique_id,
            billing_code_id: self.billing_code_id,
            concurrent_systemic_therapy: self.concurrent_systemic_therapy,
            systemic_therapy_type_ids,
            proposed_planning_image_date: self.proposed_planning_image_date,
            proposed_treatment_start_date: self.proposed_treatment_start_date,
            planned_total_dose: self.planned_total_dose,
            planned_total_fractions: self.planned_total_fractions,
            planned_fractions_per_day: self.planned_fractions_per_day,
            planned_fractions_per_week: self.planned_fractions_per_week,
            created_at: self.created_at,
            modified_at: self.modified_at,
        })
    }
}

const BOOKING_COLUMNS: &str = "booking_id, diagnosis_id, treatment_intent, treatment_sequence, \
    modality, treatment_technique_id, billing_code_id, concurrent_systemic_therapy, \
    proposed_planning_image_date, proposed_treatment_start_date, \
    planned_total_dose, planned_total_fractions, planned_fractions_per_day, \
    planned_fractions_per_week, created_at, modified_at";

/// Derived values, recomputed right before a write.
fn derive(booking: &RadiotherapyBooking) -> Result<(f64, u32), ValidationError> {
    let dose_per_fraction = booking
        .planned_dose_per_fraction()
        .map_err(|e| ValidationError::new("planned_total_fractions", e.to_string()))?;
    let duration_days = booking
        .planned_treatment_duration_days()
        .map_err(|e| ValidationError::new("planned_fractions_per_week", e.to_string()))?;
    Ok((dose_per_fraction, duration_days))
}

impl Database {
    /// Validate and insert a new booking under its diagnosis, together with
    /// its therapy-type rows, in one transaction.
    pub fn insert_booking(&mut self, booking: &RadiotherapyBooking) -> DbResult<()> {
        let diagnosis = self
            .get_diagnosis(&booking.diagnosis_id)?
            .ok_or_else(|| DbError::NotFound(format!("diagnosis {}", booking.diagnosis_id)))?;
        validate_booking_create(booking, &diagnosis)?;
        self.require_lookup(
            "treatment_technique",
            LookupKind::TreatmentTechnique,
            &booking.treatment_technique_id,
        )?;
        self.require_lookup("billing_code", LookupKind::BillingCode, &booking.billing_code_id)?;
        for id in &booking.systemic_therapy_type_ids {
            self.require_lookup("systemic_therapy_type", LookupKind::SystemicTherapyType, id)?;
        }
        let (dose_per_fraction, duration_days) = derive(booking)?;

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO bookings (
                booking_id, diagnosis_id, treatment_intent, treatment_sequence, modality,
                treatment_technique_id, billing_code_id, concurrent_systemic_therapy,
                proposed_planning_image_date, proposed_treatment_start_date,
                planned_total_dose, planned_total_fractions,
                planned_fractions_per_day, planned_fractions_per_week,
                planned_dose_per_fraction, planned_treatment_duration_days,
                created_at, modified_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
            params![
                booking.booking_id,
                booking.diagnosis_id,
                booking.treatment_intent.as_str(),
                booking.treatment_sequence.as_str(),
                booking.modality.as_str(),
                booking.treatment_technique_id,
                booking.billing_code_id,
                booking.concurrent_systemic_therapy,
                booking.proposed_planning_image_date,
                booking.proposed_treatment_start_date,
                booking.planned_total_dose,
                booking.planned_total_fractions,
                booking.planned_fractions_per_day,
                booking.planned_fractions_per_week,
                dose_per_fraction,
                duration_days,
                booking.created_at,
                booking.modified_at,
            ],
        )
        .map_err(|e| map_constraint(e, DUPLICATE_BOOKING, BROKEN_REFERENCE))?;
        for id in &booking.systemic_therapy_type_ids {
            tx.execute(
                "INSERT OR IGNORE INTO booking_systemic_therapy (booking_id, therapy_type_id) VALUES (?1, ?2)",
                params![booking.booking_id, id],
            )
            .map_err(|e| map_constraint(e, BROKEN_REFERENCE, BROKEN_REFERENCE))?;
        }
        tx.commit()?;
        tracing::info!(
            booking_id = %booking.booking_id,
            diagnosis_id = %booking.diagnosis_id,
            "radiotherapy booking created"
        );
        Ok(())
    }

    /// Validate and update an existing booking, replacing its therapy-type
    /// set. The owning diagnosis never changes. Returns false when no such
    /// booking exists.
    pub fn update_booking(&mut self, booking: &RadiotherapyBooking) -> DbResult<bool> {
        let existing = match self.get_booking(&booking.booking_id)? {
            Some(b) => b,
            None => return Ok(false),
        };
        let diagnosis = self
            .get_diagnosis(&existing.diagnosis_id)?
            .ok_or_else(|| DbError::NotFound(format!("diagnosis {}", existing.diagnosis_id)))?;
        validate_booking_update(booking, &diagnosis)?;
        self.require_lookup(
            "treatment_technique",
            LookupKind::TreatmentTechnique,
            &booking.treatment_technique_id,
        )?;
        self.require_lookup("billing_code", LookupKind::BillingCode, &booking.billing_code_id)?;
        for id in &booking.systemic_therapy_type_ids {
            self.require_lookup("systemic_therapy_type", LookupKind::SystemicTherapyType, id)?;
        }
        let (dose_per_fraction, duration_days) = derive(booking)?;

        let tx = self.conn.transaction()?;
        let rows_affected = tx
            .execute(
                r#"
                UPDATE bookings SET
                    treatment_intent = ?2,
                    treatment_sequence = ?3,
                    modality = ?4,
                    treatment_technique_id = ?5,
                    billing_code_id = ?6,
                    concurrent_systemic_therapy = ?7,
                    proposed_planning_image_date = ?8,
                    proposed_treatment_start_date = ?9,
                    planned_total_dose = ?10,
                    planned_total_fractions = ?11,
                    planned_fractions_per_day = ?12,
                    planned_fractions_per_week = ?13,
                    planned_dose_per_fraction = ?14,
                    planned_treatment_duration_days = ?15,
                    modified_at = datetime('now')
                WHERE booking_id = ?1
                "#,
                params![
                    booking.booking_id,
                    booking.treatment_intent.as_str(),
                    booking.treatment_sequence.as_str(),
                    booking.modality.as_str(),
                    booking.treatment_technique_id,
                    booking.billing_code_id,
                    booking.concurrent_systemic_therapy,
                    booking.proposed_planning_image_date,
                    booking.proposed_treatment_start_date,
                    booking.planned_total_dose,
                    booking.planned_total_fractions,
                    booking.planned_fractions_per_day,
                    booking.planned_fractions_per_week,
                    dose_per_fraction,
                    duration_days,
                ],
            )
            .map_err(|e| map_constraint(e, DUPLICATE_BOOKING, BROKEN_REFERENCE))?;
        if rows_affected == 0 {
            return Ok(false);
        }
        tx.execute(
            "DELETE FROM booking_systemic_therapy WHERE booking_id = ?",
            [&booking.booking_id],
        )?;
        for id in &booking.systemic_therapy_type_ids {
            tx.execute(
                "INSERT OR IGNORE INTO booking_systemic_therapy (booking_id, therapy_type_id) VALUES (?1, ?2)",
                params![booking.booking_id, id],
            )
            .map_err(|e| map_constraint(e, BROKEN_REFERENCE, BROKEN_REFERENCE))?;
        }
        tx.commit()?;
        Ok(true)
    }

    /// Get a booking with its therapy types.
    pub fn get_booking(&self, booking_id: &str) -> DbResult<Option<RadiotherapyBooking>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?"),
                [booking_id],
                BookingRow::read,
            )
            .optional()?;
        match row {
            Some(row) => {
                let therapy_ids = self.systemic_therapy_ids(booking_id)?;
                Ok(Some(row.into_booking(therapy_ids)?))
            }
            None => Ok(None),
        }
    }

    /// List a diagnosis's bookings, oldest first.
    pub fn list_bookings_for_diagnosis(&self, diagnosis_id: &str) -> DbResult<Vec<RadiotherapyBooking>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE diagnosis_id = ?
            ORDER BY created_at, booking_id
            "#
        ))?;
        let rows = stmt
            .query_map([diagnosis_id], BookingRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut bookings = Vec::new();
        for row in rows {
            let therapy_ids = self.systemic_therapy_ids(&row.booking_id)?;
            bookings.push(row.into_booking(therapy_ids)?);
        }
        Ok(bookings)
    }

    /// Delete a booking and its therapy rows.
    pub fn delete_booking(&self, booking_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM bookings WHERE booking_id = ?", [booking_id])?;
        Ok(rows_affected > 0)
    }

    pub(crate) fn systemic_therapy_ids(&self, booking_id: &str) -> DbResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT therapy_type_id FROM booking_systemic_therapy WHERE booking_id = ? ORDER BY therapy_type_id",
        )?;
        let rows = stmt.query_map([booking_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CancerSide, Diagnosis, Gender, LookupEntry, Modality, Patient, TreatmentIntent,
        TreatmentSequence,
    };
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_db() -> (Database, Diagnosis) {
        let db = Database::open_in_memory().unwrap();
        for (kind, id, label) in [
            (LookupKind::CancerSite, "C61", "Prostate"),
            (LookupKind::Pathology, "8140/3", "Adenocarcinoma"),
            (LookupKind::TreatmentTechnique, "VMAT", "Volumetric arc therapy"),
            (LookupKind::TreatmentTechnique, "3DCRT", "3D conformal"),
            (LookupKind::BillingCode, "RT-1", "Standard course"),
            (LookupKind::SystemicTherapyType, "CHEMO", "Chemotherapy"),
            (LookupKind::SystemicTherapyType, "IMMUNO", "Immunotherapy"),
        ] {
            db.upsert_lookup(kind, &LookupEntry::new(id.into(), label.into())).unwrap();
        }
        let patient = Patient::new("MRN-1".into(), "Test Patient".into(), date(1950, 1, 15), Gender::Male);
        db.insert_patient(&patient).unwrap();
        let diagnosis = Diagnosis::new(
            patient.patient_id,
            "C61".into(),
            CancerSide::NotApplicable,
            "8140/3".into(),
            date(2024, 3, 1),
        );
        db.insert_diagnosis(&diagnosis).unwrap();
        (db, diagnosis)
    }

    fn sample(diagnosis: &Diagnosis) -> RadiotherapyBooking {
        let mut booking = RadiotherapyBooking::new(
            diagnosis.diagnosis_id.clone(),
            TreatmentIntent::Curative,
            TreatmentSequence::Definitive,
            Modality::Ebrt,
            "VMAT".into(),
            "RT-1".into(),
        );
        booking.planned_total_dose = 60.0;
        booking.planned_total_fractions = 30;
        booking.proposed_planning_image_date = Some(date(2024, 3, 20));
        booking.proposed_treatment_start_date = Some(date(2024, 4, 2));
        booking
    }

    #[test]
    fn test_insert_and_get() {
        let (mut db, diagnosis) = setup_db();

        let booking = sample(&diagnosis);
        db.insert_booking(&booking).unwrap();

        let retrieved = db.get_booking(&booking.booking_id).unwrap().unwrap();
        assert_eq!(retrieved, booking);
    }

    #[test]
    fn test_therapy_types_round_trip_sorted() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.concurrent_systemic_therapy = true;
        booking.systemic_therapy_type_ids = vec!["IMMUNO".into(), "CHEMO".into(), "CHEMO".into()];
        db.insert_booking(&booking).unwrap();

        let retrieved = db.get_booking(&booking.booking_id).unwrap().unwrap();
        assert_eq!(retrieved.systemic_therapy_type_ids, vec!["CHEMO", "IMMUNO"]);
    }

    #[test]
    fn test_derived_columns_persisted() {
        let (mut db, diagnosis) = setup_db();

        let booking = sample(&diagnosis);
        db.insert_booking(&booking).unwrap();

        let (dose_per_fraction, duration_days): (f64, u32) = db
            .conn()
            .query_row(
                "SELECT planned_dose_per_fraction, planned_treatment_duration_days
                 FROM bookings WHERE booking_id = ?",
                [&booking.booking_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(dose_per_fraction, 2.0);
        assert_eq!(duration_days, 42);
    }

    #[test]
    fn test_unknown_technique_names_field() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.treatment_technique_id = "PROTON".into();
        match db.insert_booking(&booking).unwrap_err() {
            DbError::Validation(v) => assert_eq!(v.field, "treatment_technique"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_start_before_diagnosis_refused() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.proposed_planning_image_date = None;
        booking.proposed_treatment_start_date = Some(date(2024, 2, 28));
        match db.insert_booking(&booking).unwrap_err() {
            DbError::Validation(v) => assert_eq!(v.field, "proposed_treatment_start_date"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_diagnosis_is_not_found() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.diagnosis_id = "nope".into();
        assert!(matches!(db.insert_booking(&booking).unwrap_err(), DbError::NotFound(_)));
    }

    #[test]
    fn test_therapy_pairing_checked_on_update_only() {
        let (mut db, diagnosis) = setup_db();

        // allowed while the course is being drafted
        let mut booking = sample(&diagnosis);
        booking.systemic_therapy_type_ids = vec!["CHEMO".into()];
        db.insert_booking(&booking).unwrap();

        // but an update must make the flag and the list agree
        match db.update_booking(&booking).unwrap_err() {
            DbError::Validation(v) => assert_eq!(v.field, "systemic_therapy_type"),
            other => panic!("expected validation error, got {:?}", other),
        }

        booking.concurrent_systemic_therapy = true;
        assert!(db.update_booking(&booking).unwrap());
    }

    #[test]
    fn test_update_replaces_therapy_set() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.concurrent_systemic_therapy = true;
        booking.systemic_therapy_type_ids = vec!["CHEMO".into()];
        db.insert_booking(&booking).unwrap();

        booking.systemic_therapy_type_ids = vec!["IMMUNO".into()];
        assert!(db.update_booking(&booking).unwrap());

        let retrieved = db.get_booking(&booking.booking_id).unwrap().unwrap();
        assert_eq!(retrieved.systemic_therapy_type_ids, vec!["IMMUNO"]);
        assert_ne!(retrieved.modified_at, booking.modified_at);
    }

    #[test]
    fn test_update_missing_booking_returns_false() {
        let (mut db, diagnosis) = setup_db();
        assert!(!db.update_booking(&sample(&diagnosis)).unwrap());
    }

    #[test]
    fn test_delete_diagnosis_cascades_to_bookings() {
        let (mut db, diagnosis) = setup_db();

        let mut booking = sample(&diagnosis);
        booking.concurrent_systemic_therapy = true;
        booking.systemic_therapy_type_ids = vec!["CHEMO".into()];
        db.insert_booking(&booking).unwrap();

        db.delete_diagnosis(&diagnosis.diagnosis_id).unwrap();
        assert!(db.get_booking(&booking.booking_id).unwrap().is_none());

        let joins: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM booking_systemic_therapy", [], |row| row.get(0))
            .unwrap();
        assert_eq!(joins, 0);
    }

    #[test]
    fn test_delete_booking() {
        let (mut db, diagnosis) = setup_db();

        let booking = sample(&diagnosis);
        db.insert_booking(&booking).unwrap();
        assert!(db.delete_booking(&booking.booking_id).unwrap());
        assert!(!db.delete_booking(&booking.booking_id).unwrap());
    }
}
