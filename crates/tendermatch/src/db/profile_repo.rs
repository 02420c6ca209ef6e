//! Profile repository — CRUD operations for the `profiles` table.
//!
//! Array fields are stored as JSON text columns; conversion to domain
//! types happens in `profile::CompanyProfile`.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw profile row from the database.
#[derive(Debug, Clone)]
pub struct ProfileRow {
    pub owner_id: String,
    pub company_description: Option<String>,
    pub business_type: Option<String>,
    pub company_activities: String,
    pub main_industries: String,
    pub specializations: String,
    pub keywords: String,
    pub query_data: String,
    pub completeness: i64,
    pub updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            owner_id: row.get("owner_id")?,
            company_description: row.get("company_description")?,
            business_type: row.get("business_type")?,
            company_activities: row.get("company_activities")?,
            main_industries: row.get("main_industries")?,
            specializations: row.get("specializations")?,
            keywords: row.get("keywords")?,
            query_data: row.get("query_data")?,
            completeness: row.get("completeness")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Finds a profile by owner.
pub fn find_by_owner(db: &Database, owner_id: &str) -> Result<Option<ProfileRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT owner_id, company_description, business_type, company_activities,
             main_industries, specializations, keywords, query_data, completeness, updated_at
             FROM profiles WHERE owner_id = ?1",
        )?;
        let mut rows = stmt.query_map(params![owner_id], ProfileRow::from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    })
}

/// Inserts or replaces the profile for an owner.
pub fn upsert(db: &Database, profile: &ProfileRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO profiles (owner_id, company_description, business_type,
             company_activities, main_industries, specializations, keywords,
             query_data, completeness, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(owner_id) DO UPDATE SET
                company_description = excluded.company_description,
                business_type = excluded.business_type,
                company_activities = excluded.company_activities,
                main_industries = excluded.main_industries,
                specializations = excluded.specializations,
                keywords = excluded.keywords,
                query_data = excluded.query_data,
                completeness = excluded.completeness,
                updated_at = excluded.updated_at",
            params![
                profile.owner_id,
                profile.company_description,
                profile.business_type,
                profile.company_activities,
                profile.main_industries,
                profile.specializations,
                profile.keywords,
                profile.query_data,
                profile.completeness,
                profile.updated_at,
            ],
        )?;
        Ok(())
    })
}
