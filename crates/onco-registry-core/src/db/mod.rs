//! Database layer for the oncology registry.
//!
//! All writes validate first and only then touch a table, so every persisted
//! record satisfies the clinical rules in [`crate::validate`]. Schema-level
//! constraints (uniqueness, foreign keys, CHECKs) are the final authority and
//! surface as [`DbError::Integrity`].

mod bookings;
mod diagnoses;
mod lookups;
mod patients;
mod schema;

pub use schema::*;
#[allow(unused_imports)]
pub use bookings::*;
#[allow(unused_imports)]
pub use diagnoses::*;
#[allow(unused_imports)]
pub use lookups::*;
#[allow(unused_imports)]
pub use patients::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::InvalidCode;
use crate::validate::ValidationError;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Integrity(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Corrupt stored value: {0}")]
    Code(#[from] InvalidCode),
}

pub type DbResult<T> = Result<T, DbError>;

/// Map a SQLite constraint failure to a readable conflict, leaving every
/// other error untouched.
pub(crate) fn map_constraint(err: rusqlite::Error, unique_msg: &str, reference_msg: &str) -> DbError {
    let message = match &err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            match e.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Some(unique_msg.to_string())
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY | rusqlite::ffi::SQLITE_CONSTRAINT_TRIGGER => {
                    Some(reference_msg.to_string())
                }
                _ => None,
            }
        }
        _ => None,
    };
    match message {
        Some(m) => DbError::Integrity(m),
        None => DbError::Sqlite(err),
    }
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        tracing::debug!("registry schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        // Check that tables exist
        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert!(tables.contains(&"lookup_cancer_site".to_string()));
        assert!(tables.contains(&"lookup_systemic_therapy_type".to_string()));
        assert!(tables.contains(&"patients".to_string()));
        assert!(tables.contains(&"diagnoses".to_string()));
        assert!(tables.contains(&"bookings".to_string()));
        assert!(tables.contains(&"booking_systemic_therapy".to_string()));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let result = db.conn().execute(
            "INSERT INTO diagnoses
            (diagnosis_id, patient_id, cancer_site_id, cancer_side, cancer_pathology_id, date_of_diagnosis)
            VALUES ('d1', 'missing', 'missing', 'left', 'missing', '2024-01-01')",
            [],
        );
        assert!(result.is_err());
    }
}
