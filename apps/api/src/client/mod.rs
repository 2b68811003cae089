//! Typed client for the REST interface, used by editor frontends and tooling.

pub mod editor;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::auth::session::SESSION_COOKIE;
use crate::models::resume::{ResumeDocument, SectionUpdate};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("login response carried no session cookie")]
    MissingSession,
}

/// The subset of the REST interface the editor needs.
#[async_trait]
pub trait ResumeApi: Send + Sync {
    async fn list(&self) -> Result<Vec<ResumeDocument>, ClientError>;

    async fn fetch(&self, id: Uuid) -> Result<ResumeDocument, ClientError>;

    async fn create(
        &self,
        title: &str,
        theme_color: Option<&str>,
        template: Option<&str>,
    ) -> Result<ResumeDocument, ClientError>;

    /// Sends one section; the server answers with the stored document.
    async fn update_section(&self, id: Uuid, update: &SectionUpdate) -> Result<ResumeDocument, ClientError>;

    async fn delete(&self, id: Uuid) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Serialize)]
struct DataBody<T: Serialize> {
    data: T,
}

/// `reqwest` implementation carrying the session cookie by hand.
#[derive(Clone)]
pub struct HttpResumeApi {
    client: Client,
    base_url: String,
    session: Option<String>,
}

impl HttpResumeApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: None,
        })
    }

    /// Reuses a token obtained elsewhere.
    pub fn with_session(mut self, token: impl Into<String>) -> Self {
        self.session = Some(token.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Logs in and keeps the session cookie for later calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::POST, "/api/users/login")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let response = check(response).await?;
        let token = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(session_token)
            .ok_or(ClientError::MissingSession)?;
        self.session = Some(token);
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.session {
            Some(token) => builder.header(header::COOKIE, format!("{SESSION_COOKIE}={token}")),
            None => builder,
        }
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = check(builder.send().await?).await?;
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

/// Turns non-2xx responses into `ClientError::Api` with the server's message.
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    debug!("API returned {status}: {message}");
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Extracts the token from a `Set-Cookie` header value.
fn session_token(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl ResumeApi for HttpResumeApi {
    async fn list(&self) -> Result<Vec<ResumeDocument>, ClientError> {
        self.data(self.request(Method::GET, "/api/resumes")).await
    }

    async fn fetch(&self, id: Uuid) -> Result<ResumeDocument, ClientError> {
        self.data(self.request(Method::GET, &format!("/api/resumes/{id}")))
            .await
    }

    async fn create(
        &self,
        title: &str,
        theme_color: Option<&str>,
        template: Option<&str>,
    ) -> Result<ResumeDocument, ClientError> {
        let body = json!({
            "data": { "title": title, "themeColor": theme_color, "template": template }
        });
        self.data(self.request(Method::POST, "/api/resumes").json(&body))
            .await
    }

    async fn update_section(&self, id: Uuid, update: &SectionUpdate) -> Result<ResumeDocument, ClientError> {
        self.data(
            self.request(Method::PATCH, &format!("/api/resumes/{id}"))
                .json(&DataBody { data: update }),
        )
        .await
    }

    async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        check(
            self.request(Method::DELETE, &format!("/api/resumes/{id}"))
                .send()
                .await?,
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_token_from_set_cookie() {
        assert_eq!(
            session_token("token=abc.def; HttpOnly; Path=/; SameSite=Lax"),
            Some("abc.def".to_string())
        );
        assert_eq!(session_token("other=1; Path=/"), None);
        assert_eq!(session_token("token=; Max-Age=0"), None);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = HttpResumeApi::new("http://localhost:5000/").unwrap();
        assert_eq!(api.base_url, "http://localhost:5000");
        assert!(!api.is_authenticated());
        assert!(api.with_session("t").is_authenticated());
    }
}
