pub mod health;
pub mod response;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::generation::handlers as generation;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts
        .route("/api/users", get(auth::handle_me))
        .route("/api/users/register", post(auth::handle_register))
        .route("/api/users/login", post(auth::handle_login))
        .route("/api/users/logout", get(auth::handle_logout))
        .route("/api/users/send-otp", post(auth::handle_send_otp))
        .route("/api/users/verify-otp", post(auth::handle_verify_otp))
        // Resumes
        .route("/api/templates", get(resume::handle_templates))
        .route(
            "/api/resumes",
            post(resume::handle_create).get(resume::handle_list),
        )
        .route(
            "/api/resumes/:id",
            get(resume::handle_get)
                .patch(resume::handle_update)
                .delete(resume::handle_delete),
        )
        .route("/api/resumes/:id/preview", get(resume::handle_preview))
        .route("/api/resumes/:id/export/pdf", get(resume::handle_export_pdf))
        .route("/api/resumes/:id/export/word", get(resume::handle_export_word))
        // AI drafting
        .route(
            "/api/resumes/:id/generate/work-summary",
            post(generation::handle_generate_work_summary),
        )
        .route(
            "/api/resumes/:id/generate/summary",
            post(generation::handle_generate_summary),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use image::{Rgb, RgbImage};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::otp::testing::RecordingMailer;
    use crate::auth::otp::{FileOtpStore, OtpService};
    use crate::auth::repository::InMemoryUserRepository;
    use crate::auth::session::SessionKeys;
    use crate::config::Config;
    use crate::export::dom::Element;
    use crate::export::raster::{Bitmap, RasterOptions, Rasterizer};
    use crate::export::{ExportError, ExportPipeline};
    use crate::generation::llm::testing::CannedLlm;
    use crate::generation::llm::LlmClient;
    use crate::resume::repository::InMemoryResumeRepository;

    /// Paints a blank page of the requested height regardless of content.
    struct BlankRasterizer(u32);

    impl Rasterizer for BlankRasterizer {
        fn rasterize(&self, _node: &Element, _options: &RasterOptions) -> Result<Bitmap, ExportError> {
            Ok(RgbImage::from_pixel(794, self.0, Rgb([255, 255, 255])))
        }
    }

    struct Harness {
        app: Router,
        mailer: Arc<RecordingMailer>,
        _dir: tempfile::TempDir,
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn harness_with(llm: Option<Arc<dyn LlmClient>>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests();
        let mailer = Arc::new(RecordingMailer::default());
        let store = Arc::new(FileOtpStore::new(dir.path().join("otpStore.json")));
        let state = AppState {
            sessions: SessionKeys::new(&config.jwt_secret, config.jwt_ttl_hours, config.environment),
            config,
            resumes: Arc::new(InMemoryResumeRepository::new()),
            users: Arc::new(InMemoryUserRepository::default()),
            otp: Arc::new(OtpService::new(store, mailer.clone())),
            exporter: ExportPipeline::new(Arc::new(BlankRasterizer(2000))),
            llm,
        };
        Harness {
            app: build_router(state),
            mailer,
            _dir: dir,
        }
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, headers, bytes.to_vec())
    }

    fn json_of(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    /// Registers and logs in a fresh account; returns the `token=...` pair.
    async fn session(app: &Router, email: &str) -> String {
        let (status, _, _) = send(
            app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({"fullName": "Ada Lovelace", "email": email, "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, headers, _) = send(
            app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({"email": email, "password": "hunter22"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn create_resume(app: &Router, cookie: &str, data: Value) -> Value {
        let (status, _, body) = send(app, "POST", "/api/resumes", Some(cookie), Some(json!({ "data": data }))).await;
        assert_eq!(status, StatusCode::CREATED);
        json_of(&body)["data"].clone()
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, _, body) = send(&h.app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["service"], "resume-api");
    }

    #[tokio::test]
    async fn test_template_catalogue_is_public() {
        let h = harness();
        let (status, _, body) = send(&h.app, "GET", "/api/templates", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let specs = json_of(&body)["data"].as_array().unwrap().clone();
        assert_eq!(specs.len(), 4);
        assert_eq!(specs[0]["id"], "first-template");
        let multi: Vec<&Value> = specs.iter().filter(|s| s["supportsMultiPage"] == true).collect();
        assert_eq!(multi.len(), 1);
    }

    #[tokio::test]
    async fn test_resume_routes_require_session() {
        let h = harness();
        let (status, _, body) = send(&h.app, "GET", "/api/resumes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json_of(&body)["error"]["code"], "UNAUTHORIZED");

        let (status, _, _) = send(&h.app, "GET", "/api/resumes", Some("token=forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_register_validation_and_conflict() {
        let h = harness();
        let (status, _, body) = send(
            &h.app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({"email": "a@b.co"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_of(&body)["error"]["message"],
            "Please provide all required fields: fullName, email, and password."
        );

        session(&h.app, "ada@example.com").await;
        let (status, _, body) = send(
            &h.app,
            "POST",
            "/api/users/register",
            None,
            Some(json!({"fullName": "Ada", "email": "ADA@example.com", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json_of(&body)["error"]["message"], "User already registered.");
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let h = harness();
        session(&h.app, "ada@example.com").await;

        let (status, _, _) = send(
            &h.app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_ACCEPTABLE);

        let (status, _, body) = send(
            &h.app,
            "POST",
            "/api/users/login",
            None,
            Some(json!({"email": "nobody@example.com", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_of(&body)["error"]["message"], "User not found.");
    }

    #[tokio::test]
    async fn test_me_and_logout() {
        let h = harness();
        let cookie = session(&h.app, "ada@example.com").await;

        let (status, _, body) = send(&h.app, "GET", "/api/users", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["data"]["fullName"], "Ada Lovelace");
        assert!(body["data"].get("passwordHash").is_none());

        let (status, headers, _) = send(&h.app, "GET", "/api/users/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.starts_with("token="));

        let (status, _, _) = send(&h.app, "GET", "/api/users/logout", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_otp_flow() {
        let h = harness();
        let (status, _, body) = send(&h.app, "POST", "/api/users/send-otp", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["message"], "Email is required.");

        let (status, _, _) = send(
            &h.app,
            "POST",
            "/api/users/send-otp",
            None,
            Some(json!({"email": "ada@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let code = h.mailer.last_code().unwrap();

        let verify = |otp: String| json!({"email": "ada@example.com", "otp": otp});
        let (status, _, body) =
            send(&h.app, "POST", "/api/users/verify-otp", None, Some(verify(code.clone()))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["message"], "OTP verified successfully!");

        let (status, _, body) =
            send(&h.app, "POST", "/api/users/verify-otp", None, Some(verify(code))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["message"], "No OTP found for this email.");
    }

    #[tokio::test]
    async fn test_create_then_fetch_returns_empty_sections() {
        let h = harness();
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(
            &h.app,
            &cookie,
            json!({"title": "Backend Resume", "themeColor": "#336699"}),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let (status, _, body) = send(&h.app, "GET", &format!("/api/resumes/{id}"), Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let body = json_of(&body);
        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 200);
        let doc = &body["data"];
        assert_eq!(doc["title"], "Backend Resume");
        assert_eq!(doc["themeColor"], "#336699");
        for section in ["experience", "education", "projects", "skills"] {
            assert_eq!(doc[section], json!([]), "{section}");
        }
    }

    #[tokio::test]
    async fn test_patch_saves_one_section_and_rejects_blank_skill() {
        let h = harness();
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(&h.app, &cookie, json!({"title": "Backend Resume"})).await;
        let uri = format!("/api/resumes/{}", created["id"].as_str().unwrap());

        let (status, _, body) = send(
            &h.app,
            "PATCH",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"skills": [{"name": "Rust", "rating": 4}, {"name": " ", "rating": 2}]}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_of(&body)["error"]["message"]
            .as_str()
            .unwrap()
            .contains("skills[1].name"));

        let (status, _, body) = send(
            &h.app,
            "PATCH",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"summary": "Builds storage engines."}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let doc = &json_of(&body)["data"];
        assert_eq!(doc["summary"], "Builds storage engines.");
        assert_eq!(doc["skills"], json!([]));
        assert_eq!(doc["revision"], 1);
    }

    #[tokio::test]
    async fn test_resumes_are_scoped_to_owner() {
        let h = harness();
        let ada = session(&h.app, "ada@example.com").await;
        let bob = session(&h.app, "bob@example.com").await;
        let created = create_resume(&h.app, &ada, json!({"title": "Mine"})).await;
        let uri = format!("/api/resumes/{}", created["id"].as_str().unwrap());

        let (status, _, _) = send(&h.app, "GET", &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _, body) = send(&h.app, "GET", "/api/resumes", Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["data"], json!([]));

        let (status, _, _) = send(&h.app, "DELETE", &uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _, _) = send(&h.app, "DELETE", &uri, Some(&ada), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_preview_and_exports() {
        let h = harness();
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(&h.app, &cookie, json!({"title": "Backend Resume"})).await;
        let base = format!("/api/resumes/{}", created["id"].as_str().unwrap());

        let (status, _, body) = send(&h.app, "GET", &format!("{base}/preview"), Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        let html = String::from_utf8(body).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("first-template"));

        let (status, _, _) = send(
            &h.app,
            "GET",
            &format!("{base}/preview?template=ninth-template"),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, headers, body) =
            send(&h.app, "GET", &format!("{base}/export/pdf"), Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert!(headers[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("resume.pdf"));
        assert!(body.starts_with(b"%PDF"));

        let (status, headers, body) = send(
            &h.app,
            "GET",
            &format!("{base}/export/word?template=fourth-template"),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/msword");
        let doc = String::from_utf8(body).unwrap();
        assert!(!doc.contains("<button"));
        assert!(!doc.contains("<a "));
    }

    #[tokio::test]
    async fn test_generate_work_summary_drafts_without_saving() {
        let llm = Arc::new(CannedLlm::new(
            r#"{"positionTitle": "Engineer", "experience": ["<li>Shipped the billing rewrite</li>", "Owned on-call"]}"#,
        ));
        let backend: Arc<dyn LlmClient> = llm.clone();
        let h = harness_with(Some(backend));
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(&h.app, &cookie, json!({"title": "Backend Resume"})).await;
        let base = format!("/api/resumes/{}", created["id"].as_str().unwrap());

        let (status, _, _) = send(
            &h.app,
            "PATCH",
            &base,
            Some(&cookie),
            Some(json!({"data": {"experience": [{"title": "Engineer", "companyName": "Acme", "workSummary": "billing"}]}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let uri = format!("{base}/generate/work-summary");
        let (status, _, body) = send(
            &h.app,
            "POST",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"index": 0, "workSummary": "rewrote billing in Rust"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let draft = &json_of(&body)["data"];
        assert_eq!(
            draft["workSummary"],
            "<ul><li>Shipped the billing rewrite</li><li>Owned on-call</li></ul>"
        );
        assert!(llm.last_prompt().unwrap().contains("rewrote billing in Rust"));

        let (_, _, body) = send(&h.app, "GET", &base, Some(&cookie), None).await;
        assert_eq!(json_of(&body)["data"]["experience"][0]["workSummary"], "billing");

        let (status, _, _) = send(
            &h.app,
            "POST",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"index": 3}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_generate_summary_needs_job_title() {
        let llm = Arc::new(CannedLlm::new(
            r#"[{"experience_level": "Senior", "summary": "Leads platform teams."}]"#,
        ));
        let h = harness_with(Some(llm as Arc<dyn LlmClient>));
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(&h.app, &cookie, json!({"title": "Backend Resume"})).await;
        let uri = format!("/api/resumes/{}/generate/summary", created["id"].as_str().unwrap());

        let (status, _, body) = send(&h.app, "POST", &uri, Some(&cookie), Some(json!({"data": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_of(&body)["error"]["message"], "Please Add Job Title");

        let (status, _, body) = send(
            &h.app,
            "POST",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"jobTitle": "Platform Engineer"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_of(&body)["data"][0]["experienceLevel"], "Senior");
    }

    #[tokio::test]
    async fn test_generation_without_backend_is_unavailable() {
        let h = harness();
        let cookie = session(&h.app, "ada@example.com").await;
        let created = create_resume(&h.app, &cookie, json!({"title": "Backend Resume"})).await;
        let uri = format!("/api/resumes/{}/generate/summary", created["id"].as_str().unwrap());

        let (status, _, body) = send(
            &h.app,
            "POST",
            &uri,
            Some(&cookie),
            Some(json!({"data": {"jobTitle": "Platform Engineer"}})),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_of(&body)["error"]["code"], "GENERATION_UNAVAILABLE");
    }
}
