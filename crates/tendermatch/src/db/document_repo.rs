//! Document repository — CRUD operations for the `documents` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw document row from the database.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: String,
    pub owner_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub document_type: String,
    pub status: String,
    pub extracted_text: Option<String>,
    pub extracted_data: Option<String>,
    pub error: Option<String>,
    pub uploaded_at: String,
    pub processed_at: Option<String>,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            owner_id: row.get("owner_id")?,
            file_name: row.get("file_name")?,
            storage_path: row.get("storage_path")?,
            file_size: row.get("file_size")?,
            document_type: row.get("document_type")?,
            status: row.get("status")?,
            extracted_text: row.get("extracted_text")?,
            extracted_data: row.get("extracted_data")?,
            error: row.get("error")?,
            uploaded_at: row.get("uploaded_at")?,
            processed_at: row.get("processed_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, owner_id, file_name, storage_path, file_size, document_type,
     status, extracted_text, extracted_data, error, uploaded_at, processed_at";

/// Inserts a new document row.
pub fn insert(db: &Database, doc: &DocumentRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (id, owner_id, file_name, storage_path, file_size,
             document_type, status, extracted_text, extracted_data, error, uploaded_at, processed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                doc.id,
                doc.owner_id,
                doc.file_name,
                doc.storage_path,
                doc.file_size,
                doc.document_type,
                doc.status,
                doc.extracted_text,
                doc.extracted_data,
                doc.error,
                doc.uploaded_at,
                doc.processed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a document by id.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE id = ?1",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![id], DocumentRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    })
}

/// Finds the active document for an owner, if any.
pub fn find_by_owner(db: &Database, owner_id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM documents WHERE owner_id = ?1",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![owner_id], DocumentRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    })
}

/// Deletes a document row. Returns true if a row was removed.
pub fn delete(db: &Database, id: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let affected = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    })
}

/// Updates the lifecycle status. Terminal states also set `processed_at`;
/// a non-None `error` is recorded verbatim.
pub fn update_status(
    db: &Database,
    id: &str,
    status: &str,
    error: Option<&str>,
) -> Result<(), DatabaseError> {
    let processed_at = if status == "completed" || status == "error" {
        Some(chrono::Utc::now().to_rfc3339())
    } else {
        None
    };
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = ?2, error = ?3,
             processed_at = COALESCE(?4, processed_at)
             WHERE id = ?1",
            params![id, status, error, processed_at],
        )?;
        Ok(())
    })
}

/// Stores the OCR-recovered text on the document.
pub fn set_extracted_text(db: &Database, id: &str, text: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET extracted_text = ?2 WHERE id = ?1",
            params![id, text],
        )?;
        Ok(())
    })
}

/// Marks the document completed with the structured extraction result.
pub fn complete(db: &Database, id: &str, extracted_data: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE documents SET status = 'completed', extracted_data = ?2,
             error = NULL, processed_at = ?3
             WHERE id = ?1",
            params![id, extracted_data, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    })
}
