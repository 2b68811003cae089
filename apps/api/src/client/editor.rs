use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::client::{ClientError, ResumeApi};
use crate::models::resume::{ResumeDocument, SectionUpdate};
use crate::resume::validation::{validate_update, SectionErrors};

#[derive(Debug, Error)]
pub enum EditorError {
    /// Rejected locally; nothing was sent.
    #[error("invalid section: {0}")]
    Invalid(#[from] SectionErrors),

    #[error(transparent)]
    Backend(#[from] ClientError),
}

/// Owns the working copy of one resume while it is being edited.
///
/// The working copy only changes after the backend accepted an update, so it never
/// runs ahead of what is stored.
pub struct EditorSession<A: ResumeApi> {
    api: A,
    working: ResumeDocument,
}

impl<A: ResumeApi> EditorSession<A> {
    /// Fetches the resume and starts editing it.
    pub async fn load(api: A, id: Uuid) -> Result<Self, EditorError> {
        let working = api.fetch(id).await?;
        Ok(Self { api, working })
    }

    pub fn document(&self) -> &ResumeDocument {
        &self.working
    }

    /// Replaces the working copy with the stored document.
    pub async fn reload(&mut self) -> Result<(), EditorError> {
        self.working = self.api.fetch(self.working.id).await?;
        Ok(())
    }

    /// Validates, pushes, then applies one section.
    pub async fn submit(&mut self, update: SectionUpdate) -> Result<&ResumeDocument, EditorError> {
        validate_update(&update)?;
        let stored = self.api.update_section(self.working.id, &update).await?;
        debug!(
            resume_id = %self.working.id,
            section = update.section().as_str(),
            revision = stored.revision,
            "section accepted"
        );
        self.working.apply(update);
        self.working.revision = stored.revision;
        self.working.updated_at = stored.updated_at;
        Ok(&self.working)
    }

    pub fn into_document(self) -> ResumeDocument {
        self.working
    }
}
