use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::generation::llm::DEFAULT_MODEL;

/// Deployment flavour. Only affects cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpBackend {
    File,
    Redis,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub environment: Environment,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub otp_backend: OtpBackend,
    pub otp_store_path: PathBuf,
    pub redis_url: Option<String>,
    /// Unset means OTP mails are only logged.
    pub smtp: Option<SmtpConfig>,
    /// TrueType face used to draw text into PDF exports. Common system
    /// fonts are tried when unset.
    pub export_font_path: Option<PathBuf>,
    /// Unset disables the generation endpoints.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let environment = match optional_env("APP_ENV").as_deref().map(str::to_ascii_lowercase) {
            Some(env) if env == "dev" || env == "development" => Environment::Dev,
            _ => Environment::Production,
        };

        let otp_backend = match optional_env("OTP_BACKEND").as_deref() {
            None | Some("file") => OtpBackend::File,
            Some("redis") => OtpBackend::Redis,
            Some(other) => bail!("OTP_BACKEND must be 'file' or 'redis', got '{other}'"),
        };
        let redis_url = optional_env("REDIS_URL");
        if otp_backend == OtpBackend::Redis && redis_url.is_none() {
            bail!("REDIS_URL is required when OTP_BACKEND=redis");
        }

        let smtp = match optional_env("SMTP_HOST") {
            Some(host) => Some(SmtpConfig {
                host,
                user: require_env("SMTP_USER")?,
                pass: require_env("SMTP_PASS")?,
                from: require_env("SMTP_FROM")?,
            }),
            None => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: optional_env("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            environment,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_ttl_hours: optional_env("JWT_TTL_HOURS")
                .unwrap_or_else(|| "24".to_string())
                .parse::<i64>()
                .context("JWT_TTL_HOURS must be an integer")?,
            otp_backend,
            otp_store_path: optional_env("OTP_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("otpStore.json")),
            redis_url,
            smtp,
            export_font_path: optional_env("EXPORT_FONT_PATH").map(PathBuf::from),
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/resume_test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            environment: Environment::Dev,
            jwt_secret: "test-secret".to_string(),
            jwt_ttl_hours: 24,
            otp_backend: OtpBackend::File,
            otp_store_path: std::env::temp_dir().join("otpStore.test.json"),
            redis_url: None,
            smtp: None,
            export_font_path: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
