//! Lookup vocabulary database operations.
//!
//! All six vocabularies share one row shape, so every operation takes the
//! [`LookupKind`] whose table it should touch.

use rusqlite::{params, OptionalExtension};

use super::{map_constraint, Database, DbResult};
use crate::models::{LookupEntry, LookupKind};
use crate::validate::ValidationError;

const ENTRY_IN_USE: &str = "lookup entry is referenced by clinical records";

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<LookupEntry> {
    Ok(LookupEntry {
        id: row.get(0)?,
        label: row.get(1)?,
        created_at: row.get(2)?,
        modified_at: row.get(3)?,
    })
}

impl Database {
    /// Insert a vocabulary entry, or relabel it if the code already exists.
    pub fn upsert_lookup(&self, kind: LookupKind, entry: &LookupEntry) -> DbResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, label, created_at, modified_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                modified_at = datetime('now')
            "#,
            kind.table()
        );
        self.conn.execute(
            &sql,
            params![entry.id, entry.label, entry.created_at, entry.modified_at],
        )?;
        tracing::debug!(kind = %kind, id = %entry.id, "lookup entry upserted");
        Ok(())
    }

    /// Get one vocabulary entry by code.
    pub fn get_lookup(&self, kind: LookupKind, id: &str) -> DbResult<Option<LookupEntry>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT id, label, created_at, modified_at FROM {} WHERE id = ?",
                    kind.table()
                ),
                [id],
                read_entry,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a whole vocabulary ordered by label.
    pub fn list_lookup(&self, kind: LookupKind) -> DbResult<Vec<LookupEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, label, created_at, modified_at FROM {} ORDER BY label",
            kind.table()
        ))?;
        let rows = stmt.query_map([], read_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search a vocabulary by code or label (prefix match).
    pub fn search_lookup(&self, kind: LookupKind, query: &str, limit: usize) -> DbResult<Vec<LookupEntry>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT id, label, created_at, modified_at
            FROM {}
            WHERE id LIKE ?1 OR label LIKE ?1
            ORDER BY label
            LIMIT ?2
            "#,
            kind.table()
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], read_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a vocabulary entry. Refused while any clinical record
    /// references it.
    pub fn delete_lookup(&self, kind: LookupKind, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(&format!("DELETE FROM {} WHERE id = ?", kind.table()), [id])
            .map_err(|e| map_constraint(e, ENTRY_IN_USE, ENTRY_IN_USE))?;
        Ok(rows_affected > 0)
    }

    /// Reject a clinical write early when a referenced code is missing,
    /// attributing the error to the referencing field.
    pub(crate) fn require_lookup(&self, field: &'static str, kind: LookupKind, id: &str) -> DbResult<()> {
        let exists: bool = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", kind.table()),
            [id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(ValidationError::new(field, format!("unknown code {:?}", id)).into());
        }
        Ok(())
    }
}
