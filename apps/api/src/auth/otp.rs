//! One-time email verification codes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::auth::mailer::Mailer;

pub const OTP_TTL_MINUTES: i64 = 5;
pub const OTP_SUBJECT: &str = "Your OTP for Email Verification";

/// Stored per email; `expires_at` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpEntry {
    pub otp: String,
    pub expires_at: i64,
}

impl OtpEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() > self.expires_at
    }

    /// What presenting `code` at `now` does to this entry.
    pub fn judge(&self, code: &str, now: DateTime<Utc>) -> Redemption {
        if self.is_expired(now) {
            Redemption::Expired
        } else if self.otp != code {
            Redemption::Mismatch
        } else {
            Redemption::Consumed
        }
    }
}

/// Result of an atomic check-and-consume. `Expired` and `Consumed` entries
/// are gone afterwards; a `Mismatch` leaves the entry in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    Missing,
    Expired,
    Mismatch,
    Consumed,
}

impl Redemption {
    fn removes_entry(self) -> bool {
        matches!(self, Redemption::Expired | Redemption::Consumed)
    }
}

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("No OTP found for this email.")]
    NotFound,

    #[error("OTP expired. Please request a new one.")]
    Expired,

    #[error("Invalid OTP. Please try again.")]
    Mismatch,

    #[error("OTP store failure: {0}")]
    Store(#[from] anyhow::Error),
}

/// Keyed by email. A new code for the same email replaces the previous one.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn put(&self, email: &str, entry: OtpEntry) -> Result<()>;
    async fn get(&self, email: &str) -> Result<Option<OtpEntry>>;
    /// Judges `code` against the stored entry and removes the entry when it
    /// expired or matched, as one step with respect to other callers.
    async fn redeem(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<Redemption>;
}

// ────────────────────────────────────────────────────────────────────────────
// JSON file store
// ────────────────────────────────────────────────────────────────────────────

/// All entries in one JSON object, rewritten on every change.
pub struct FileOtpStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileOtpStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<HashMap<String, OtpEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        if raw.trim().is_empty() {
            return Ok(HashMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(path = %self.path.display(), "OTP store is not valid JSON, starting empty: {e}");
                Ok(HashMap::new())
            }
        }
    }

    async fn save(&self, entries: &HashMap<String, OtpEntry>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

#[async_trait]
impl OtpStore for FileOtpStore {
    async fn put(&self, email: &str, entry: OtpEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(email.to_string(), entry);
        self.save(&entries).await
    }

    async fn get(&self, email: &str) -> Result<Option<OtpEntry>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(email))
    }

    async fn redeem(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<Redemption> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        let verdict = match entries.get(email) {
            Some(entry) => entry.judge(code, now),
            None => return Ok(Redemption::Missing),
        };
        if verdict.removes_entry() {
            entries.remove(email);
            self.save(&entries).await?;
        }
        Ok(verdict)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis store
// ────────────────────────────────────────────────────────────────────────────

/// Runs the same decision as [`OtpEntry::judge`] inside redis so that reading
/// and deleting the key cannot interleave with another redemption.
/// Returns 0 missing, 1 expired, 2 mismatch, 3 consumed.
const REDEEM_SCRIPT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return 0 end
local entry = cjson.decode(raw)
if tonumber(ARGV[2]) > tonumber(entry.expiresAt) then
  redis.call('DEL', KEYS[1])
  return 1
end
if entry.otp ~= ARGV[1] then return 2 end
redis.call('DEL', KEYS[1])
return 3
"#;

/// One key per email with a server-side TTL matching the entry's expiry.
pub struct RedisOtpStore {
    client: redis::Client,
}

impl RedisOtpStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn key(email: &str) -> String {
        format!("otp:{email}")
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put(&self, email: &str, entry: OtpEntry) -> Result<()> {
        let ttl_secs = ((entry.expires_at - Utc::now().timestamp_millis()) / 1000).max(1);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("SET")
            .arg(Self::key(email))
            .arg(serde_json::to_string(&entry)?)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, email: &str) -> Result<Option<OtpEntry>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = redis::cmd("GET")
            .arg(Self::key(email))
            .query_async(&mut conn)
            .await?;
        raw.map(|r| serde_json::from_str(&r).context("corrupt OTP entry in redis"))
            .transpose()
    }

    async fn redeem(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<Redemption> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let script = redis::Script::new(REDEEM_SCRIPT);
        let verdict: i64 = script
            .key(Self::key(email))
            .arg(code)
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;
        match verdict {
            0 => Ok(Redemption::Missing),
            1 => Ok(Redemption::Expired),
            2 => Ok(Redemption::Mismatch),
            3 => Ok(Redemption::Consumed),
            other => anyhow::bail!("unexpected OTP redeem result {other}"),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Service
// ────────────────────────────────────────────────────────────────────────────

/// Six decimal digits, leading zeros allowed.
pub fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

pub struct OtpService {
    store: Arc<dyn OtpStore>,
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
}

impl OtpService {
    pub fn new(store: Arc<dyn OtpStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            mailer,
            ttl: Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    /// Mails a fresh code and records it. Nothing is stored if delivery fails.
    pub async fn issue(&self, email: &str) -> Result<()> {
        self.issue_at(email, Utc::now()).await
    }

    pub async fn issue_at(&self, email: &str, now: DateTime<Utc>) -> Result<()> {
        let code = generate_code();
        let body = format!(
            "Your OTP for email verification is: {code}. It will expire in {OTP_TTL_MINUTES} minutes."
        );
        self.mailer.send(email, OTP_SUBJECT, &body).await?;
        self.store
            .put(
                email,
                OtpEntry {
                    otp: code,
                    expires_at: (now + self.ttl).timestamp_millis(),
                },
            )
            .await?;
        info!(email, "OTP issued");
        Ok(())
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<(), OtpError> {
        self.verify_at(email, code, Utc::now()).await
    }

    /// Expired entries are removed on sight and a wrong code leaves the entry for
    /// another attempt. A match consumes it, so of two concurrent attempts with
    /// the right code only one succeeds.
    pub async fn verify_at(&self, email: &str, code: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        match self.store.redeem(email, code.trim(), now).await? {
            Redemption::Missing => Err(OtpError::NotFound),
            Redemption::Expired => Err(OtpError::Expired),
            Redemption::Mismatch => Err(OtpError::Mismatch),
            Redemption::Consumed => {
                info!(email, "OTP verified");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Remembers every mail; optionally refuses to deliver.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: std::sync::Mutex<Vec<(String, String)>>,
        pub fail: bool,
    }

    impl RecordingMailer {
        pub fn last_code(&self) -> Option<String> {
            let sent = self.sent.lock().unwrap();
            let (_, body) = sent.last()?;
            body.split(|c: char| !c.is_ascii_digit())
                .find(|part| part.len() == 6)
                .map(str::to_string)
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("relay refused");
            }
            self.sent.lock().unwrap().push((to.to_string(), body.to_string()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;

    fn service(dir: &tempfile::TempDir) -> (OtpService, Arc<RecordingMailer>, Arc<FileOtpStore>) {
        let store = Arc::new(FileOtpStore::new(dir.path().join("otpStore.json")));
        let mailer = Arc::new(RecordingMailer::default());
        (OtpService::new(store.clone(), mailer.clone()), mailer, store)
    }

    #[test]
    fn test_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_verify_consumes_code() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, mailer, _) = service(&dir);
        svc.issue("a@b.co").await.unwrap();
        let code = mailer.last_code().unwrap();

        svc.verify("a@b.co", &code).await.unwrap();
        assert!(matches!(svc.verify("a@b.co", &code).await, Err(OtpError::NotFound)));
    }

    #[tokio::test]
    async fn test_mismatch_keeps_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, mailer, _) = service(&dir);
        svc.issue("a@b.co").await.unwrap();
        let code = mailer.last_code().unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        assert!(matches!(svc.verify("a@b.co", wrong).await, Err(OtpError::Mismatch)));
        assert!(svc.verify("a@b.co", &code).await.is_ok());
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, mailer, store) = service(&dir);
        let issued = Utc::now();
        svc.issue_at("a@b.co", issued).await.unwrap();
        let code = mailer.last_code().unwrap();

        let later = issued + Duration::minutes(OTP_TTL_MINUTES) + Duration::seconds(1);
        assert!(matches!(
            svc.verify_at("a@b.co", &code, later).await,
            Err(OtpError::Expired)
        ));
        assert!(store.get("a@b.co").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reissue_overwrites_previous_code() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, mailer, store) = service(&dir);
        svc.issue("a@b.co").await.unwrap();
        svc.issue("a@b.co").await.unwrap();
        let latest = mailer.last_code().unwrap();
        assert_eq!(store.get("a@b.co").await.unwrap().unwrap().otp, latest);
    }

    #[tokio::test]
    async fn test_failed_delivery_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileOtpStore::new(dir.path().join("otpStore.json")));
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let svc = OtpService::new(store.clone(), mailer);
        assert!(svc.issue("a@b.co").await.is_err());
        assert!(store.get("a@b.co").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_is_one_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otpStore.json");
        let store = FileOtpStore::new(&path);
        let entry = OtpEntry { otp: "123456".into(), expires_at: 42 };
        store.put("x@y.z", entry.clone()).await.unwrap();
        store.put("p@q.r", entry.clone()).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["x@y.z"]["otp"], "123456");
        assert_eq!(json["p@q.r"]["expiresAt"], 42);

        let now = DateTime::<Utc>::from_timestamp_millis(0).unwrap();
        assert_eq!(store.redeem("x@y.z", "123456", now).await.unwrap(), Redemption::Consumed);
        assert!(store.get("x@y.z").await.unwrap().is_none());
        assert_eq!(store.get("p@q.r").await.unwrap(), Some(entry));
    }

    #[tokio::test]
    async fn test_concurrent_verifies_consume_once() {
        let dir = tempfile::tempdir().unwrap();
        let (svc, mailer, _) = service(&dir);
        svc.issue("a@b.co").await.unwrap();
        let code = mailer.last_code().unwrap();

        let (first, second) = tokio::join!(svc.verify("a@b.co", &code), svc.verify("a@b.co", &code));
        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(r, Err(OtpError::NotFound))));
    }

    #[test]
    fn test_judge_checks_expiry_before_code() {
        let entry = OtpEntry { otp: "123456".into(), expires_at: 1_000 };
        let before = DateTime::<Utc>::from_timestamp_millis(500).unwrap();
        let after = DateTime::<Utc>::from_timestamp_millis(1_001).unwrap();
        assert_eq!(entry.judge("123456", before), Redemption::Consumed);
        assert_eq!(entry.judge("654321", before), Redemption::Mismatch);
        assert_eq!(entry.judge("654321", after), Redemption::Expired);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otpStore.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = FileOtpStore::new(&path);
        assert!(store.get("x@y.z").await.unwrap().is_none());
    }
}
