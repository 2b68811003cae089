use axum::{extract::State, Json};
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::auth::otp::OtpError;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{AuthUser, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::user::PublicUser;
use crate::routes::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(required, length(min = 1))]
    pub full_name: Option<String>,
    #[validate(required, email)]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(required, length(min = 1))]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(required, length(min = 1))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(required, length(min = 1))]
    pub email: Option<String>,
    #[validate(required, length(min = 1))]
    pub otp: Option<String>,
}

/// Emails are compared case-insensitively everywhere.
fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn has_error_code(errors: &ValidationErrors, field: &str, code: &str) -> bool {
    errors
        .field_errors()
        .get(field)
        .is_some_and(|errs| errs.iter().any(|e| e.code == code))
}

/// Validates `body`, mapping any failure to one fixed message.
fn require_fields<T: Validate>(body: &T, message: &str) -> Result<(), AppError> {
    body.validate()
        .map_err(|_| AppError::Validation(message.to_string()))
}

/// POST /api/users/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    if let Err(errors) = req.validate() {
        let message = if has_error_code(&errors, "email", "email") {
            "Please provide a valid email address."
        } else {
            "Please provide all required fields: fullName, email, and password."
        };
        return Err(AppError::Validation(message.to_string()));
    }
    let (Some(full_name), Some(email), Some(password)) = (req.full_name, req.email, req.password)
    else {
        return Err(AppError::Validation(
            "Please provide all required fields: fullName, email, and password.".to_string(),
        ));
    };
    let email = normalize_email(&email);

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already registered.".to_string()));
    }

    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(anyhow::Error::from)??;
    let user = state
        .users
        .create(full_name.trim(), &email, &hash)
        .await?
        .ok_or_else(|| AppError::Conflict("User already registered.".to_string()))?;

    info!(user_id = %user.id, "user registered");
    Ok(ApiResponse::created(
        json!({ "user": PublicUser::from(&user) }),
        "User successfully registered.",
    ))
}

/// POST /api/users/login
pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<Value>), AppError> {
    require_fields(&req, "Please provide all required fields: email and password.")?;
    let (Some(email), Some(password)) = (req.email, req.password) else {
        return Err(AppError::Validation(
            "Please provide all required fields: email and password.".to_string(),
        ));
    };

    let user = state
        .users
        .find_by_email(&normalize_email(&email))
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let stored = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(anyhow::Error::from)??;
    if !matches {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.sessions.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((
        jar.add(state.sessions.session_cookie(token)),
        ApiResponse::ok(
            json!({ "user": PublicUser::from(&user) }),
            "User logged in successfully.",
        ),
    ))
}

/// GET /api/users/logout
pub async fn handle_logout(
    user: Option<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Value>), AppError> {
    let AuthUser(user) = user.ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    info!(user_id = %user.id, "user logged out");
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        ApiResponse::ok(Value::Null, "User logged out successfully."),
    ))
}

/// GET /api/users
pub async fn handle_me(user: Option<AuthUser>) -> Result<ApiResponse<PublicUser>, AppError> {
    let AuthUser(user) = user.ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    Ok(ApiResponse::ok(PublicUser::from(&user), "User Found"))
}

/// POST /api/users/send-otp
pub async fn handle_send_otp(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    require_fields(&req, "Email is required.")?;
    let email = normalize_email(req.email.as_deref().unwrap_or_default());

    state.otp.issue(&email).await.map_err(AppError::Delivery)?;
    Ok(ApiResponse::ok(Value::Null, "OTP sent successfully to your email."))
}

/// POST /api/users/verify-otp
pub async fn handle_verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<ApiResponse<Value>, AppError> {
    require_fields(&req, "Email and OTP are required.")?;
    let email = normalize_email(req.email.as_deref().unwrap_or_default());
    let otp = req.otp.unwrap_or_default();

    match state.otp.verify(&email, &otp).await {
        Ok(()) => Ok(ApiResponse::ok(Value::Null, "OTP verified successfully!")),
        Err(OtpError::Store(e)) => Err(AppError::Internal(e)),
        Err(outcome) => Err(AppError::Validation(outcome.to_string())),
    }
}
