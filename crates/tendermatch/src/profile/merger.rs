//! Folds extraction results into the persisted company profile.

use crate::db::{profile_repo, Database, DatabaseError};
use crate::profile::{build_query_data, CompanyProfile, ExtractedProfile};

/// Completeness weights. Base credit is for having a processed document
/// at all; merges only happen from the ingestion pipeline.
const BASE_WEIGHT: u32 = 30;
const DESCRIPTION_WEIGHT: u32 = 15;
const BUSINESS_TYPE_WEIGHT: u32 = 15;
const ACTIVITIES_WEIGHT: u32 = 15;
const INDUSTRIES_WEIGHT: u32 = 15;
const SPECIALIZATIONS_WEIGHT: u32 = 10;

pub struct ProfileMerger {
    db: Database,
}

impl ProfileMerger {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Merges extracted fields into the owner's profile and persists it.
    /// An extracted field overwrites the stored value only when non-empty,
    /// so a partial or degraded extraction never erases known-good data.
    pub fn merge(
        &self,
        owner_id: &str,
        extracted: &ExtractedProfile,
    ) -> Result<CompanyProfile, DatabaseError> {
        let _span = tracing::info_span!("profile.merge", owner_id).entered();

        let mut profile = match profile_repo::find_by_owner(&self.db, owner_id)? {
            Some(row) => CompanyProfile::from_row(&row),
            None => CompanyProfile::empty(owner_id),
        };

        apply(&mut profile, extracted);
        profile.query_data = build_query_data(&profile);
        profile.completeness = completeness(&profile);

        profile_repo::upsert(&self.db, &profile.to_row())?;

        log::info!(
            "Merged profile for owner {} (completeness {})",
            owner_id,
            profile.completeness
        );

        Ok(profile)
    }
}

fn apply(profile: &mut CompanyProfile, extracted: &ExtractedProfile) {
    if let Some(description) = &extracted.company_description {
        profile.company_description = Some(description.clone());
    }
    if let Some(business_type) = &extracted.business_type {
        profile.business_type = Some(business_type.clone());
    }
    if !extracted.company_activities.is_empty() {
        profile.company_activities = extracted.company_activities.clone();
    }
    if !extracted.main_industries.is_empty() {
        profile.main_industries = extracted.main_industries.clone();
    }
    if !extracted.specializations.is_empty() {
        profile.specializations = extracted.specializations.clone();
    }
}

/// Capped weighted completeness score.
pub fn completeness(profile: &CompanyProfile) -> u8 {
    let mut score = BASE_WEIGHT;
    if profile
        .company_description
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
    {
        score += DESCRIPTION_WEIGHT;
    }
    if profile
        .business_type
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
    {
        score += BUSINESS_TYPE_WEIGHT;
    }
    if !profile.company_activities.is_empty() {
        score += ACTIVITIES_WEIGHT;
    }
    if !profile.main_industries.is_empty() {
        score += INDUSTRIES_WEIGHT;
    }
    if !profile.specializations.is_empty() {
        score += SPECIALIZATIONS_WEIGHT;
    }
    score.min(100) as u8
}
