//! Email notification delivery via SMTP.
//!
//! [`EmailDelivery`] wraps the `lettre` async SMTP transport to send
//! plain-text notification emails through an authenticated STARTTLS relay
//! (Gmail with an app password by default). A transport is built for each
//! message and dropped before returning, so no SMTP session outlives a
//! single [`Notifier::send_notification`] call.

use std::time::Duration;

use async_trait::async_trait;

use crate::notifier::Notifier;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for email delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),
}

impl SendError {
    /// True when the relay permanently refused the exchange. On an
    /// authenticated relay this is nearly always rejected credentials.
    pub fn is_rejection(&self) -> bool {
        match self {
            SendError::Transport(e) => e.is_permanent(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP relay.
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Default SMTP port (STARTTLS).
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Upper bound on a single SMTP exchange.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the SMTP email delivery service.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// SMTP username.
    pub smtp_user: String,
    /// SMTP password (an app password for Gmail).
    pub smtp_password: String,
}

impl EmailConfig {
    /// Gmail relay settings where the account is also the sender.
    pub fn gmail(user: impl Into<String>, app_password: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            from_address: user.clone(),
            smtp_user: user,
            smtp_password: app_password.into(),
        }
    }
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("from_address", &self.from_address)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EmailDelivery
// ---------------------------------------------------------------------------

/// Sends notification emails via SMTP.
pub struct EmailDelivery {
    config: EmailConfig,
}

impl EmailDelivery {
    /// Create a new email delivery service with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    fn build_message(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<lettre::Message, SendError> {
        use lettre::message::header::ContentType;

        lettre::Message::builder()
            .from(self.config.from_address.parse()?)
            .to(recipient.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| SendError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for EmailDelivery {
    async fn send_notification(
        &self,
        subject: &str,
        body: &str,
        recipient: &str,
    ) -> Result<(), SendError> {
        use lettre::{
            transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport,
            Tokio1Executor,
        };

        let email = self.build_message(subject, body, recipient)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
            .port(self.config.smtp_port)
            .timeout(Some(SMTP_TIMEOUT))
            .credentials(Credentials::new(
                self.config.smtp_user.clone(),
                self.config.smtp_password.clone(),
            ))
            .build();

        mailer.send(email).await?;

        tracing::info!(to = recipient, subject, "Notification email sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn delivery() -> EmailDelivery {
        EmailDelivery::new(EmailConfig::gmail("miner@example.com", "app-password"))
    }

    #[test]
    fn gmail_config_defaults() {
        let config = EmailConfig::gmail("miner@example.com", "secret");
        assert_eq!(config.smtp_host, "smtp.gmail.com");
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.from_address, "miner@example.com");
        assert_eq!(config.smtp_user, "miner@example.com");
    }

    #[test]
    fn debug_redacts_password() {
        let rendered = format!("{:?}", EmailConfig::gmail("miner@example.com", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }

    /// Accept one SMTP connection, answer with `greeting` and hold the
    /// socket open until the client hangs up.
    async fn relay_greeting(greeting: &'static str) -> EmailConfig {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket.write_all(greeting.as_bytes()).await.unwrap();
            let mut buf = [0u8; 512];
            while let Ok(n) = socket.read(&mut buf).await {
                if n == 0 {
                    break;
                }
            }
        });

        EmailConfig {
            smtp_host: "127.0.0.1".to_string(),
            smtp_port: port,
            ..EmailConfig::gmail("miner@example.com", "app-password")
        }
    }

    #[test]
    fn local_failures_are_not_rejections() {
        let build = SendError::Build("missing body".to_string());
        assert!(!build.is_rejection());

        let address = SendError::Address("not-an-email".parse::<lettre::Address>().unwrap_err());
        assert!(!address.is_rejection());
    }

    #[tokio::test]
    async fn permanent_relay_refusal_is_a_rejection() {
        let config = relay_greeting("554 5.7.1 Access denied\r\n").await;

        let err = EmailDelivery::new(config)
            .send_notification("subject", "body", "owner@example.com")
            .await
            .unwrap_err();

        assert_matches!(&err, SendError::Transport(_));
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn transient_relay_refusal_is_not_a_rejection() {
        let config = relay_greeting("421 4.3.2 Service not available\r\n").await;

        let err = EmailDelivery::new(config)
            .send_notification("subject", "body", "owner@example.com")
            .await
            .unwrap_err();

        assert_matches!(&err, SendError::Transport(_));
        assert!(!err.is_rejection());
    }

    #[test]
    fn builds_plain_text_message() {
        let message = delivery()
            .build_message("Rig: Overheated", "Overheat mode is active on Rig.", "me@example.com")
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Rig: Overheated"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("Overheat mode is active on Rig."));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_before_connecting() {
        let result = delivery()
            .send_notification("subject", "body", "not-an-email")
            .await;
        assert_matches!(result, Err(SendError::Address(_)));
    }
}
