//! Tender repository — CRUD operations for the `tenders` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw tender row from the database.
#[derive(Debug, Clone)]
pub struct TenderRow {
    pub id: String,
    pub external_id: Option<String>,
    pub bid_number: Option<String>,
    pub source: String,
    pub title: String,
    pub agency: Option<String>,
    pub category: Option<String>,
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub deadline: String,
    pub match_score: Option<f64>,
    pub match_details: Option<String>,
    pub raw: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TenderRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            external_id: row.get("external_id")?,
            bid_number: row.get("bid_number")?,
            source: row.get("source")?,
            title: row.get("title")?,
            agency: row.get("agency")?,
            category: row.get("category")?,
            value_min: row.get("value_min")?,
            value_max: row.get("value_max")?,
            deadline: row.get("deadline")?,
            match_score: row.get("match_score")?,
            match_details: row.get("match_details")?,
            raw: row.get("raw")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, external_id, bid_number, source, title, agency, category,
     value_min, value_max, deadline, match_score, match_details, raw, created_at, updated_at";

/// Inserts a new tender row. Fails on natural-key collision; callers that
/// want upsert semantics should check `find_by_natural_key` first.
pub fn insert(db: &Database, tender: &TenderRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO tenders (id, external_id, bid_number, source, title, agency, category,
             value_min, value_max, deadline, match_score, match_details, raw, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                tender.id,
                tender.external_id,
                tender.bid_number,
                tender.source,
                tender.title,
                tender.agency,
                tender.category,
                tender.value_min,
                tender.value_max,
                tender.deadline,
                tender.match_score,
                tender.match_details,
                tender.raw,
                tender.created_at,
                tender.updated_at,
            ],
        )?;
        Ok(())
    })
}

/// Looks up a tender by its natural key: (external_id, source) or bid_number.
/// Either key alone is sufficient for a match.
pub fn find_by_natural_key(
    db: &Database,
    external_id: Option<&str>,
    source: &str,
    bid_number: Option<&str>,
) -> Result<Option<TenderRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tenders
             WHERE (external_id = ?1 AND source = ?2 AND ?1 IS NOT NULL)
                OR (bid_number = ?3 AND ?3 IS NOT NULL)
             LIMIT 1",
            SELECT_COLUMNS
        ))?;
        let mut rows = stmt.query_map(params![external_id, source, bid_number], TenderRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    })
}

/// Updates an existing tender's match score and details in place.
pub fn update_match_score(
    db: &Database,
    id: &str,
    match_score: f64,
    match_details: Option<&str>,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE tenders SET match_score = ?2, match_details = ?3, updated_at = ?4
             WHERE id = ?1",
            params![id, match_score, match_details, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    })
}

/// Lists tenders in recommendation order: scored entries first, strictly
/// descending by score; unscored entries follow, ordered by nearest deadline.
pub fn list_ranked(db: &Database, limit: u32) -> Result<Vec<TenderRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM tenders
             ORDER BY (match_score IS NULL) ASC, match_score DESC, deadline ASC
             LIMIT ?1",
            SELECT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![limit], TenderRow::from_row)?;
        let mut tenders = Vec::new();
        for row in rows {
            tenders.push(row?);
        }
        Ok(tenders)
    })
}

/// Counts tenders that carry a match score.
pub fn count_scored(db: &Database) -> Result<u32, DatabaseError> {
    db.with_conn(|conn| {
        let count: u32 = conn.query_row(
            "SELECT COUNT(*) FROM tenders WHERE match_score IS NOT NULL",
            [],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}
