use std::time::Duration;

use anyhow::Context;
use reqwest::{Client, StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::domain::SubscriberEmail;

/// Anything able to deliver one HTML email to one recipient.
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailClientError>;
}

#[derive(thiserror::Error, Debug)]
pub enum EmailClientError {
    #[error("Email provider rejected the message ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Failed to reach the email provider")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct EmailClient {
    http_client: Client,
    endpoint: Url,
    sender: SubscriberEmail,
    reply_to: SubscriberEmail,
    auth_token: SecretString,
}

#[derive(Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    reply_to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(serde::Deserialize)]
struct ProviderErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: SubscriberEmail,
        reply_to: SubscriberEmail,
        auth_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the email HTTP client")?;
        let endpoint = Url::parse(&base_url)
            .and_then(|url| url.join("emails"))
            .context("Failed parsing base email api url")?;

        Ok(Self {
            http_client,
            endpoint,
            sender,
            reply_to,
            auth_token,
        })
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    #[tracing::instrument(name = "Sending an email", skip(self, subject, html_content))]
    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), EmailClientError> {
        let body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: vec![recipient],
            reply_to: self.reply_to.as_ref(),
            subject,
            html: html_content,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(self.auth_token.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ProviderErrorBody>(&raw)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or(raw);

        Err(EmailClientError::Rejected { status, message })
    }
}
