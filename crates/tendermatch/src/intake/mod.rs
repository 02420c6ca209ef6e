//! Document intake: validates an upload and persists it as the owner's
//! single active document.

pub mod store;

pub use store::DocumentStore;

use chrono::Utc;
use uuid::Uuid;

use crate::config::IntakeConfig;
use crate::db::{document_repo, Database};
use crate::error::{Result, ValidationError};

/// Validates and persists uploaded documents. A new upload supersedes the
/// owner's prior document: its stored bytes and record are removed before
/// the new record is inserted.
pub struct DocumentIntake {
    db: Database,
    store: DocumentStore,
    config: IntakeConfig,
}

impl DocumentIntake {
    pub fn new(db: Database, store: DocumentStore, config: IntakeConfig) -> Self {
        Self { db, store, config }
    }

    /// Accepts an upload and returns the new document id. Synchronous — no
    /// background work starts here; processing is triggered separately.
    pub fn submit_document(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
        owner_id: &str,
    ) -> Result<String> {
        let _span = tracing::info_span!("intake.submit", owner_id).entered();

        self.validate(bytes, file_name, mime_type)?;

        // Supersede any prior document. Delete-then-insert is the only
        // serialization point per owner.
        if let Some(prior) = document_repo::find_by_owner(&self.db, owner_id)? {
            log::info!(
                "Superseding document {} for owner {}",
                prior.id,
                prior.owner_id
            );
            self.store
                .remove(std::path::Path::new(&prior.storage_path))?;
            document_repo::delete(&self.db, &prior.id)?;
        }

        let document_id = Uuid::new_v4().to_string();
        let extension = extension_for(file_name, mime_type);
        let storage_path = self.store.store(&document_id, &extension, bytes)?;

        document_repo::insert(
            &self.db,
            &document_repo::DocumentRow {
                id: document_id.clone(),
                owner_id: owner_id.to_string(),
                file_name: file_name.to_string(),
                storage_path: storage_path.to_string_lossy().into_owned(),
                file_size: bytes.len() as i64,
                document_type: mime_type.to_string(),
                status: "pending".to_string(),
                extracted_text: None,
                extracted_data: None,
                error: None,
                uploaded_at: Utc::now().to_rfc3339(),
                processed_at: None,
            },
        )?;

        log::info!(
            "Accepted document {} ({} bytes) for owner {}",
            document_id,
            bytes.len(),
            owner_id
        );

        Ok(document_id)
    }

    fn validate(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<()> {
        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile(file_name.to_string()).into());
        }
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(ValidationError::TooLarge {
                size: bytes.len() as u64,
                max: self.config.max_file_size,
            }
            .into());
        }
        if !self
            .config
            .allowed_types
            .iter()
            .any(|allowed| allowed == mime_type)
        {
            return Err(ValidationError::UnsupportedType(mime_type.to_string()).into());
        }
        Ok(())
    }
}

/// Picks a storage extension from the filename, falling back to the MIME
/// type's preferred extension.
fn extension_for(file_name: &str, mime_type: &str) -> String {
    if let Some(ext) = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
    {
        return ext.to_ascii_lowercase();
    }
    mime_guess::get_mime_extensions_str(mime_type)
        .and_then(|exts| exts.first())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "bin".to_string())
}
