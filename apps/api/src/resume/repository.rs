#[cfg(test)]
use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
#[cfg(test)]
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, ResumeRow, SectionUpdate};

/// Storage for resume documents. Every lookup is scoped to the owning user, so a
/// document belonging to someone else behaves exactly like a missing one.
#[async_trait]
pub trait ResumeRepository: Send + Sync {
    async fn insert(&self, doc: &ResumeDocument) -> Result<()>;

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<ResumeDocument>>;

    /// Owned documents, newest first.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<ResumeDocument>>;

    /// Writes one section and bumps the revision. Returns the stored document, or
    /// `None` if it does not exist for this owner.
    async fn update_section(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: &SectionUpdate,
    ) -> Result<Option<ResumeDocument>>;

    /// Returns whether a document was removed.
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool>;
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL
// ────────────────────────────────────────────────────────────────────────────

pub struct PgResumeRepository {
    pool: PgPool,
}

impl PgResumeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeRepository for PgResumeRepository {
    async fn insert(&self, doc: &ResumeDocument) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO resumes
                (id, owner_id, title, theme_color, template, personal_details, summary,
                 experience, education, projects, skills, revision, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(doc.id)
        .bind(doc.owner_id)
        .bind(&doc.title)
        .bind(&doc.theme_color)
        .bind(&doc.template)
        .bind(Json(&doc.personal_details))
        .bind(&doc.summary)
        .bind(Json(&doc.experience))
        .bind(Json(&doc.education))
        .bind(Json(&doc.projects))
        .bind(Json(&doc.skills))
        .bind(doc.revision)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<ResumeDocument>> {
        let row: Option<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND owner_id = $2")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(ResumeDocument::from))
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ResumeDocument>> {
        let rows: Vec<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE owner_id = $1 ORDER BY created_at DESC")
                .bind(owner_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(ResumeDocument::from).collect())
    }

    async fn update_section(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: &SectionUpdate,
    ) -> Result<Option<ResumeDocument>> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "UPDATE resumes SET {} = $1, revision = revision + 1, updated_at = NOW() \
             WHERE id = $2 AND owner_id = $3 RETURNING *",
            update.section().column()
        );
        let query = sqlx::query_as::<_, ResumeRow>(&sql);
        let query = match update {
            SectionUpdate::Title(v)
            | SectionUpdate::ThemeColor(v)
            | SectionUpdate::Template(v)
            | SectionUpdate::Summary(v) => query.bind(v.clone()),
            SectionUpdate::PersonalDetails(v) => query.bind(Json(v.clone())),
            SectionUpdate::Experience(v) => query.bind(Json(v.clone())),
            SectionUpdate::Education(v) => query.bind(Json(v.clone())),
            SectionUpdate::Projects(v) => query.bind(Json(v.clone())),
            SectionUpdate::Skills(v) => query.bind(Json(v.clone())),
        };
        let row = query
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ResumeDocument::from))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM resumes WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory
// ────────────────────────────────────────────────────────────────────────────

/// Process-local store with the same semantics as the PostgreSQL one.
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryResumeRepository {
    docs: RwLock<HashMap<Uuid, ResumeDocument>>,
}

#[cfg(test)]
impl InMemoryResumeRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl ResumeRepository for InMemoryResumeRepository {
    async fn insert(&self, doc: &ResumeDocument) -> Result<()> {
        self.docs.write().await.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> Result<Option<ResumeDocument>> {
        Ok(self
            .docs
            .read()
            .await
            .get(&id)
            .filter(|d| d.owner_id == owner_id)
            .cloned())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<ResumeDocument>> {
        let mut docs: Vec<ResumeDocument> = self
            .docs
            .read()
            .await
            .values()
            .filter(|d| d.owner_id == owner_id)
            .cloned()
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }

    async fn update_section(
        &self,
        owner_id: Uuid,
        id: Uuid,
        update: &SectionUpdate,
    ) -> Result<Option<ResumeDocument>> {
        let mut docs = self.docs.write().await;
        let Some(doc) = docs.get_mut(&id).filter(|d| d.owner_id == owner_id) else {
            return Ok(None);
        };
        doc.apply(update.clone());
        doc.revision += 1;
        doc.updated_at = chrono::Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        let mut docs = self.docs.write().await;
        let owned = docs.get(&id).is_some_and(|d| d.owner_id == owner_id);
        if owned {
            docs.remove(&id);
        }
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{SkillEntry, DEFAULT_THEME_COLOR};

    fn doc(owner: Uuid, title: &str) -> ResumeDocument {
        ResumeDocument::new(
            owner,
            title.into(),
            DEFAULT_THEME_COLOR.into(),
            "first-template".into(),
        )
    }

    #[tokio::test]
    async fn test_other_owner_cannot_see_or_touch() {
        let repo = InMemoryResumeRepository::new();
        let (alice, mallory) = (Uuid::new_v4(), Uuid::new_v4());
        let d = doc(alice, "Mine");
        repo.insert(&d).await.unwrap();

        assert!(repo.find(mallory, d.id).await.unwrap().is_none());
        assert!(repo
            .update_section(mallory, d.id, &SectionUpdate::Title("x".into()))
            .await
            .unwrap()
            .is_none());
        assert!(!repo.delete(mallory, d.id).await.unwrap());
        assert!(repo.find(alice, d.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_section_saves_are_independent() {
        let repo = InMemoryResumeRepository::new();
        let owner = Uuid::new_v4();
        let d = doc(owner, "Backend Resume");
        repo.insert(&d).await.unwrap();

        repo.update_section(owner, d.id, &SectionUpdate::Summary("Hello".into()))
            .await
            .unwrap();
        let skills = vec![SkillEntry { name: "Rust".into(), rating: 5.0 }];
        let stored = repo
            .update_section(owner, d.id, &SectionUpdate::Skills(skills.clone()))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.summary, "Hello");
        assert_eq!(stored.skills, skills);
        assert_eq!(stored.revision, 2);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryResumeRepository::new();
        let owner = Uuid::new_v4();
        let mut older = doc(owner, "old");
        older.created_at -= chrono::Duration::hours(1);
        let newer = doc(owner, "new");
        repo.insert(&older).await.unwrap();
        repo.insert(&newer).await.unwrap();
        repo.insert(&doc(Uuid::new_v4(), "someone else")).await.unwrap();

        let titles: Vec<_> = repo.list(owner).await.unwrap().into_iter().map(|d| d.title).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }
}
