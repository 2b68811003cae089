use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, info};

use crate::config::SmtpConfig;

/// Outbound mail. Implementations are awaited by the request that triggers them,
/// so a delivery failure surfaces to the caller.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = SmtpTransport::relay(&config.host)
            .with_context(|| format!("invalid SMTP relay '{}'", config.host))?
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();
        let from = config
            .from
            .parse()
            .with_context(|| format!("SMTP_FROM '{}' is not a mailbox", config.from))?;
        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse().with_context(|| format!("'{to}' is not a valid recipient"))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let transport = self.transport.clone();
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await?
            .context("SMTP delivery failed")?;
        info!(to, subject, "mail sent");
        Ok(())
    }
}

/// Writes mail to the log instead of delivering it. Used when SMTP is not configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(to, subject, "SMTP not configured, mail not delivered");
        debug!(to, body, "undelivered mail body");
        Ok(())
    }
}
