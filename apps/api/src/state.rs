use std::sync::Arc;

use crate::auth::otp::OtpService;
use crate::auth::repository::UserRepository;
use crate::auth::session::SessionKeys;
use crate::config::Config;
use crate::export::ExportPipeline;
use crate::generation::llm::LlmClient;
use crate::resume::repository::ResumeRepository;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub resumes: Arc<dyn ResumeRepository>,
    pub users: Arc<dyn UserRepository>,
    pub otp: Arc<OtpService>,
    pub sessions: SessionKeys,
    /// Holds the per-resume in-flight set, so it must be shared rather than rebuilt.
    pub exporter: ExportPipeline,
    /// `None` when no generation API key is configured.
    pub llm: Option<Arc<dyn LlmClient>>,
}
