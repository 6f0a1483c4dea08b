use async_trait::async_trait;
use serde::Serialize;

use crate::domain::session::errors::MailerError;
use crate::domain::session::ports::ResetMailer;
use crate::domain::user::models::DisplayName;
use crate::domain::user::models::EmailAddress;

/// Reset-link sender backed by an HTTP mail relay.
///
/// Posts a JSON payload to the relay's `/email` endpoint. The reset link is
/// built from a configured base URL with the opaque token as a query
/// parameter.
pub struct HttpResetMailer {
    http_client: reqwest::Client,
    relay_url: String,
    sender: String,
    reset_link_base: String,
}

#[derive(Serialize)]
struct SendEmailRequest {
    from: String,
    to: String,
    subject: String,
    html_body: String,
    text_body: String,
}

impl HttpResetMailer {
    pub fn new(
        http_client: reqwest::Client,
        relay_url: String,
        sender: String,
        reset_link_base: String,
    ) -> Self {
        Self {
            http_client,
            relay_url,
            sender,
            reset_link_base,
        }
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}?token={}", self.reset_link_base, token)
    }
}

#[async_trait]
impl ResetMailer for HttpResetMailer {
    async fn send_reset_link(
        &self,
        to: &EmailAddress,
        name: &DisplayName,
        token: &str,
    ) -> Result<(), MailerError> {
        let url = format!("{}/email", self.relay_url);
        let link = self.reset_link(token);

        let request = SendEmailRequest {
            from: self.sender.clone(),
            to: to.as_str().to_string(),
            subject: "Reset your password".to_string(),
            html_body: format!(
                "<p>Hi {},</p>\
                 <p>We received a request to reset your password. \
                 <a href=\"{}\">Click here</a> to choose a new one.</p>\
                 <p>If you did not request this, you can ignore this email.</p>",
                name.as_str(),
                link
            ),
            text_body: format!(
                "Hi {},\n\n\
                 We received a request to reset your password. Visit the link \
                 below to choose a new one:\n\n{}\n\n\
                 If you did not request this, you can ignore this email.\n",
                name.as_str(),
                link
            ),
        };

        self.http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach mail relay: {}", e);
                MailerError::SendFailed(e.to_string())
            })?
            .error_for_status()
            .map_err(|e| {
                tracing::error!("Mail relay rejected the message: {}", e);
                MailerError::SendFailed(e.to_string())
            })?;

        Ok(())
    }
}
