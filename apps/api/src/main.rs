use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_api::auth::mailer::{LogMailer, Mailer, SmtpMailer};
use resume_api::auth::otp::{FileOtpStore, OtpService, OtpStore, RedisOtpStore};
use resume_api::auth::repository::PgUserRepository;
use resume_api::auth::session::SessionKeys;
use resume_api::config::{Config, OtpBackend};
use resume_api::db::create_pool;
use resume_api::export::raster::SoftwareRasterizer;
use resume_api::export::ExportPipeline;
use resume_api::generation::llm::{GeminiClient, LlmClient};
use resume_api::resume::repository::PgResumeRepository;
use resume_api::routes::build_router;
use resume_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_api={},tower_http=info", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // OTP storage and delivery
    let otp_store: Arc<dyn OtpStore> = match config.otp_backend {
        OtpBackend::File => {
            info!("OTP store: file {}", config.otp_store_path.display());
            Arc::new(FileOtpStore::new(config.otp_store_path.clone()))
        }
        OtpBackend::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("REDIS_URL is required when OTP_BACKEND=redis")?;
            info!("OTP store: redis");
            Arc::new(RedisOtpStore::new(redis::Client::open(url)?))
        }
    };
    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            info!("SMTP relay: {}", smtp.host);
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            warn!("SMTP_HOST not set; OTP mails will only be logged");
            Arc::new(LogMailer)
        }
    };

    // Export pipeline; without a font only text-free captures can be rasterized
    let rasterizer = match &config.export_font_path {
        Some(path) => SoftwareRasterizer::from_font_file(path)?,
        None => match SoftwareRasterizer::discover() {
            Some((path, rasterizer)) => {
                info!("Export font: {} (EXPORT_FONT_PATH not set)", path.display());
                rasterizer
            }
            None => {
                warn!("EXPORT_FONT_PATH not set and no system font found; PDF export of text will fail");
                SoftwareRasterizer::new(None)
            }
        },
    };

    // AI drafting is optional
    let llm: Option<Arc<dyn LlmClient>> = match &config.gemini_api_key {
        Some(key) => {
            info!("LLM client initialized (model: {})", config.gemini_model);
            Some(Arc::new(GeminiClient::new(key.clone(), config.gemini_model.clone())?))
        }
        None => {
            warn!("GEMINI_API_KEY not set; generation endpoints will return 503");
            None
        }
    };

    let state = AppState {
        sessions: SessionKeys::new(&config.jwt_secret, config.jwt_ttl_hours, config.environment),
        resumes: Arc::new(PgResumeRepository::new(db.clone())),
        users: Arc::new(PgUserRepository::new(db)),
        otp: Arc::new(OtpService::new(otp_store, mailer)),
        exporter: ExportPipeline::new(Arc::new(rasterizer)),
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
