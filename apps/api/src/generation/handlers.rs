//! Axum route handlers for the generation API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::session::AuthUser;
use crate::errors::AppError;
use crate::generation::generator::{
    draft_work_summary, suggest_summaries, SummarySuggestion, WorkSummaryDraft,
};
use crate::generation::llm::{LlmClient, LlmError};
use crate::resume::handlers::DataEnvelope;
use crate::routes::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSummaryRequest {
    /// Position of the entry in the resume's `experience` list.
    pub index: usize,
    /// Unsaved editor text; the stored `workSummary` is used when absent.
    pub work_summary: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    /// Falls back to the job title in the resume's personal details.
    pub job_title: Option<String>,
}

fn llm(state: &AppState) -> Result<&dyn LlmClient, AppError> {
    state.llm.as_deref().ok_or(AppError::Generation(LlmError::NotConfigured))
}

/// POST /api/resumes/:id/generate/work-summary
///
/// Drafts 4-5 bullets for one experience entry from its title, company and
/// current description.
pub async fn handle_generate_work_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DataEnvelope<WorkSummaryRequest>>,
) -> Result<ApiResponse<WorkSummaryDraft>, AppError> {
    let req = body.data;
    let resume = state
        .resumes
        .find(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let entry = resume.experience.get(req.index).ok_or_else(|| {
        AppError::Validation(format!("No experience entry at index {}.", req.index))
    })?;

    let (title, company) = (entry.title.trim(), entry.company_name.trim());
    if title.is_empty() || company.is_empty() {
        return Err(AppError::Validation(
            "Add Position Title and Company Name to generate summary".to_string(),
        ));
    }
    let current = req.work_summary.as_deref().unwrap_or(&entry.work_summary);

    let draft = draft_work_summary(llm(&state)?, title, company, current.trim()).await?;
    Ok(ApiResponse::ok(draft, "Work summary generated successfully!"))
}

/// POST /api/resumes/:id/generate/summary
///
/// Suggests a summary per experience level for the resume's job title.
pub async fn handle_generate_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DataEnvelope<SummaryRequest>>,
) -> Result<ApiResponse<Vec<SummarySuggestion>>, AppError> {
    let resume = state
        .resumes
        .find(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))?;
    let job_title = body
        .data
        .job_title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(resume.personal_details.job_title.trim());
    if job_title.is_empty() {
        return Err(AppError::Validation("Please Add Job Title".to_string()));
    }

    let suggestions = suggest_summaries(llm(&state)?, job_title).await?;
    Ok(ApiResponse::ok(suggestions, "Summary Suggestions Generated!"))
}
