use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};

/// Best-effort SMTP sender. When no transport is configured every send
/// is a silent no-op, which keeps email strictly optional.
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl Mailer {
    pub fn from_config(config: Option<&SmtpConfig>) -> Result<Self> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.server)
            .map_err(|e| AppError::Email(format!("SMTP relay setup failed: {e}")))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport: Some(transport),
            from_address: config.from_address.clone(),
        })
    }

    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: String::new(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, html_body: String) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::debug!("SMTP not configured, skipping email to {}", to);
            return Ok(());
        };

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| AppError::Email(format!("bad sender address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Email(format!("bad recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body)
            .map_err(|e| AppError::Email(format!("failed to build email: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Email(format!("failed to send email to {to}: {e}")))?;

        Ok(())
    }
}
