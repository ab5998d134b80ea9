use std::sync::Arc;

use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Notification, NotificationConfig};
use crate::services::Mailer;

const EMAIL_SUBJECT: &str = "New Notification - Newswire";

/// Subscription management plus the delivery gateway: one persisted
/// notification row per delivery, followed by a best-effort email.
pub struct NotificationService {
    repository: Arc<Repository>,
    mailer: Arc<Mailer>,
}

impl NotificationService {
    pub fn new(repository: Arc<Repository>, mailer: Arc<Mailer>) -> Self {
        Self { repository, mailer }
    }

    /// A user's subscription rows, provisioned on first access with one
    /// disabled toggle per known category plus a placeholder keyword row.
    pub async fn get_user_configs(&self, user_id: i64) -> Result<Vec<NotificationConfig>> {
        self.repository.get_or_provision_user_configs(user_id).await
    }

    /// Toggle one subscription row; unknown ids are a no-op.
    pub async fn update_config(
        &self,
        config_id: i64,
        enabled: bool,
    ) -> Result<Option<NotificationConfig>> {
        self.repository.update_config(config_id, enabled).await
    }

    /// Replace the user's keyword subscriptions wholesale. An empty list
    /// clears them; a list that contains only blank entries is rejected
    /// before any row is touched.
    pub async fn update_keywords(&self, user_id: i64, keywords: Vec<String>) -> Result<()> {
        let was_empty = keywords.is_empty();
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if !was_empty && keywords.is_empty() {
            return Err(AppError::Validation(
                "keyword list contains only empty entries".into(),
            ));
        }

        self.repository.replace_keywords(user_id, keywords).await
    }

    pub async fn get_history(&self, user_id: i64) -> Result<Vec<Notification>> {
        self.repository.get_notifications_for_user(user_id).await
    }

    /// Deliver one notification: persist the row, then attempt the email.
    /// A missing recipient is an error for this delivery only; an email
    /// failure is logged and never rolls back the stored notification.
    pub async fn deliver(&self, user_id: i64, message: &str, url: Option<&str>) -> Result<()> {
        let user = self
            .repository
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::Notification(format!("recipient {user_id} not found")))?;

        self.repository
            .create_notification(user_id, message.to_string())
            .await?;

        let body = render_email_body(&user.email, message, url);
        if let Err(e) = self.mailer.send(&user.email, EMAIL_SUBJECT, body).await {
            tracing::warn!("Email delivery to user {} failed: {}", user_id, e);
        }

        Ok(())
    }
}

fn render_email_body(email: &str, message: &str, url: Option<&str>) -> String {
    let mut body = format!(
        "<html><body><p>Hi <strong>{email}</strong>,</p><p>{message}</p>"
    );
    if let Some(url) = url {
        body.push_str(&format!("<p><a href=\"{url}\">Read the full article</a></p>"));
    }
    body.push_str("<br><p>Stay informed,<br>The Newswire Team</p></body></html>");
    body
}
