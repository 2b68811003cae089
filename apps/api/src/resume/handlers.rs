use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::session::AuthUser;
use crate::errors::AppError;
use crate::export::ExportArtifact;
use crate::models::resume::{ResumeDocument, SectionUpdate, DEFAULT_THEME_COLOR};
use crate::resume::validation::validate_update;
use crate::routes::response::ApiResponse;
use crate::state::AppState;
use crate::templates::{render_view, TemplateKind};

/// Every write body is wrapped in a `data` object.
#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResumeRequest {
    #[serde(default)]
    pub title: String,
    pub theme_color: Option<String>,
    pub template: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemplateQuery {
    pub template: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

fn check(update: &SectionUpdate) -> Result<(), AppError> {
    validate_update(update).map_err(|e| AppError::Validation(e.to_string()))
}

/// The query parameter wins over the template stored on the resume.
fn resolve_template(query: &TemplateQuery, resume: &ResumeDocument) -> Result<TemplateKind, AppError> {
    let id = query.template.as_deref().unwrap_or(&resume.template);
    TemplateKind::from_id(id)
        .ok_or_else(|| AppError::Validation(format!("Unknown template '{id}'.")))
}

fn attachment(artifact: ExportArtifact) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, artifact.mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        artifact.bytes,
    )
}

async fn load(state: &AppState, owner_id: Uuid, id: Uuid) -> Result<ResumeDocument, AppError> {
    state.resumes.find(owner_id, id).await?.ok_or_else(not_found)
}

/// POST /api/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<DataEnvelope<CreateResumeRequest>>,
) -> Result<ApiResponse<ResumeDocument>, AppError> {
    let req = body.data;
    let title = SectionUpdate::Title(req.title.trim().to_string());
    let theme_color =
        SectionUpdate::ThemeColor(req.theme_color.unwrap_or_else(|| DEFAULT_THEME_COLOR.to_string()));
    let template = SectionUpdate::Template(
        req.template
            .unwrap_or_else(|| TemplateKind::First.id().to_string()),
    );
    for update in [&title, &theme_color, &template] {
        check(update)?;
    }

    let mut doc = ResumeDocument::new(user.id, String::new(), String::new(), String::new());
    doc.apply(title);
    doc.apply(theme_color);
    doc.apply(template);
    state.resumes.insert(&doc).await?;

    info!(resume_id = %doc.id, owner_id = %user.id, "resume created");
    Ok(ApiResponse::created(doc, "Resume created"))
}

/// GET /api/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Vec<ResumeDocument>>, AppError> {
    let docs = state.resumes.list(user.id).await?;
    Ok(ApiResponse::ok(docs, "Resumes fetched"))
}

/// GET /api/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<ResumeDocument>, AppError> {
    let doc = load(&state, user.id, id).await?;
    Ok(ApiResponse::ok(doc, "Resume fetched"))
}

/// PATCH /api/resumes/:id
///
/// Body `{"data": {"<section>": value}}`; exactly one section per request.
pub async fn handle_update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<DataEnvelope<Value>>,
) -> Result<ApiResponse<ResumeDocument>, AppError> {
    let update: SectionUpdate = serde_json::from_value(body.data).map_err(|e| {
        AppError::Validation(format!("Expected a single resume section: {e}"))
    })?;
    check(&update)?;

    let section = update.section();
    let doc = state
        .resumes
        .update_section(user.id, id, &update)
        .await?
        .ok_or_else(not_found)?;

    info!(resume_id = %id, section = section.as_str(), revision = doc.revision, "section saved");
    Ok(ApiResponse::ok(doc, "Resume updated"))
}

/// DELETE /api/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Value>, AppError> {
    if !state.resumes.delete(user.id, id).await? {
        return Err(not_found());
    }
    info!(resume_id = %id, "resume deleted");
    Ok(ApiResponse::ok(Value::Null, "Resume deleted"))
}

/// GET /api/resumes/:id/preview
pub async fn handle_preview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<Html<String>, AppError> {
    let doc = load(&state, user.id, id).await?;
    let kind = resolve_template(&query, &doc)?;
    Ok(Html(render_view(&doc, kind).to_html()))
}

/// GET /api/resumes/:id/export/pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let doc = load(&state, user.id, id).await?;
    let kind = resolve_template(&query, &doc)?;
    let mut view = render_view(&doc, kind);

    info!(resume_id = %id, template = kind.id(), "PDF export requested");
    let artifact = state
        .exporter
        .export_pdf(id, &mut view, kind.spec().supports_multi_page)
        .await?;
    Ok(attachment(artifact))
}

/// GET /api/resumes/:id/export/word
pub async fn handle_export_word(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<TemplateQuery>,
) -> Result<impl IntoResponse, AppError> {
    let doc = load(&state, user.id, id).await?;
    let kind = resolve_template(&query, &doc)?;
    let view = render_view(&doc, kind);

    info!(resume_id = %id, template = kind.id(), "Word export requested");
    let artifact = state.exporter.export_word(&view)?;
    Ok(attachment(artifact))
}

/// GET /api/templates
pub async fn handle_templates() -> ApiResponse<Vec<crate::templates::TemplateSpec>> {
    let specs = TemplateKind::ALL.iter().map(TemplateKind::spec).collect();
    ApiResponse::ok(specs, "Templates fetched")
}
