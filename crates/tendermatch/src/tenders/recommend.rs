//! Profile-driven tender recommendations.
//!
//! Search refresh is best-effort: the external semantic search can fail
//! without taking the recommendation list down, because ranking is always
//! served from storage.

use std::sync::Arc;

use serde::Serialize;

use crate::db::{profile_repo, tender_repo, Database};
use crate::db::tender_repo::TenderRow;
use crate::error::Result;
use crate::profile::CompanyProfile;
use crate::services::{SearchCandidate, SemanticSearch};
use crate::tenders::default_deadline;

/// Outcome of one search refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub success: bool,
    /// Candidates merged into storage.
    pub matched: u32,
}

pub struct RecommendationEngine {
    db: Database,
    search: Arc<dyn SemanticSearch>,
    active_only: bool,
}

impl RecommendationEngine {
    pub fn new(db: Database, search: Arc<dyn SemanticSearch>, active_only: bool) -> Self {
        Self {
            db,
            search,
            active_only,
        }
    }

    /// Serves the ranked list. With `force_refresh` the semantic search
    /// runs first as a best-effort step; if the scored set is still empty
    /// afterwards, exactly one more attempt is made before falling back to
    /// the unscored deadline ordering.
    pub async fn get_recommendations(
        &self,
        owner_id: &str,
        limit: u32,
        force_refresh: bool,
    ) -> Result<Vec<TenderRow>> {
        if force_refresh {
            let profile = self.load_profile(owner_id)?;
            let outcome = self.search(&profile, limit).await;
            if !outcome.success {
                log::warn!("Recommendation refresh for owner {} failed", owner_id);
            }

            if tender_repo::count_scored(&self.db)? == 0 {
                log::info!("No scored tenders after refresh, retrying search once");
                self.search(&profile, limit).await;
            }
        }

        Ok(tender_repo::list_ranked(&self.db, limit)?)
    }

    /// Calls the semantic search service and merges scored candidates into
    /// storage. Never throws: a service failure is `success: false`.
    pub async fn search(&self, profile: &CompanyProfile, limit: u32) -> SearchOutcome {
        let query = build_query(profile);

        let candidates = match self.search.query(&query, limit, self.active_only).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Semantic search failed: {}", e);
                return SearchOutcome {
                    success: false,
                    matched: 0,
                };
            }
        };

        let mut matched = 0;
        for candidate in &candidates {
            match self.merge_candidate(candidate) {
                Ok(()) => matched += 1,
                Err(e) => log::warn!(
                    "Could not store search candidate '{}': {}",
                    candidate.title,
                    e
                ),
            }
        }

        log::info!("Search refresh merged {}/{} candidates", matched, candidates.len());
        SearchOutcome {
            success: true,
            matched,
        }
    }

    /// Upserts one candidate by natural key: an existing tender gets its
    /// score updated in place, a new one is inserted already scored.
    fn merge_candidate(&self, candidate: &SearchCandidate) -> Result<()> {
        // Keyless candidates cannot be upserted; storing them would
        // duplicate on every refresh.
        if candidate.external_id.is_none() && candidate.bid_number.is_none() {
            return Err(crate::error::TenderMatchError::Internal(format!(
                "candidate '{}' has neither an external id nor a bid number",
                candidate.title
            )));
        }

        let score = candidate.similarity.clamp(0.0, 100.0);

        let existing = tender_repo::find_by_natural_key(
            &self.db,
            candidate.external_id.as_deref(),
            &candidate.source,
            candidate.bid_number.as_deref(),
        )?;

        if let Some(row) = existing {
            tender_repo::update_match_score(
                &self.db,
                &row.id,
                score,
                candidate.match_details.as_deref(),
            )?;
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        tender_repo::insert(
            &self.db,
            &TenderRow {
                id: uuid::Uuid::new_v4().to_string(),
                external_id: candidate.external_id.clone(),
                bid_number: candidate.bid_number.clone(),
                source: candidate.source.clone(),
                title: candidate.title.clone(),
                agency: candidate.agency.clone(),
                category: candidate.category.clone(),
                value_min: candidate.value_min,
                value_max: candidate.value_max,
                deadline: candidate.deadline.clone().unwrap_or_else(default_deadline),
                match_score: Some(score),
                match_details: candidate.match_details.clone(),
                raw: None,
                created_at: now.clone(),
                updated_at: now,
            },
        )?;
        Ok(())
    }

    fn load_profile(&self, owner_id: &str) -> Result<CompanyProfile> {
        Ok(match profile_repo::find_by_owner(&self.db, owner_id)? {
            Some(row) => CompanyProfile::from_row(&row),
            // No profile yet: the search still runs, with an empty query.
            None => CompanyProfile::empty(owner_id),
        })
    }
}

/// Deterministic query precedence: the precomputed combined string when
/// present, otherwise the profile fields in fixed order.
pub fn build_query(profile: &CompanyProfile) -> String {
    if !profile.query_data.trim().is_empty() {
        return profile.query_data.trim().to_string();
    }

    let mut parts: Vec<&str> = Vec::new();
    if let Some(description) = &profile.company_description {
        parts.push(description);
    }
    parts.extend(profile.company_activities.iter().map(String::as_str));
    parts.extend(profile.main_industries.iter().map(String::as_str));
    parts.extend(profile.specializations.iter().map(String::as_str));
    if let Some(business_type) = &profile.business_type {
        parts.push(business_type);
    }
    parts.extend(profile.keywords.iter().map(String::as_str));
    parts.join(" ").trim().to_string()
}
