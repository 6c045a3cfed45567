use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use uuid::Uuid;

use super::{
    DispatchError, EmailTemplate, FailedDelivery, NewsletterStore, SendLogRecord,
    markdown_to_html, resolve_recipients,
};
use crate::domain::NewsletterMessage;
use crate::email_client::EmailSender;

#[derive(Debug, Clone)]
pub struct SendSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub failures: Vec<FailedDelivery>,
}

impl SendSummary {
    fn from_outcomes(outcomes: Vec<(String, Result<(), String>)>) -> Self {
        let total = outcomes.len();
        let failures: Vec<FailedDelivery> = outcomes
            .into_iter()
            .filter_map(|(email, outcome)| {
                outcome.err().map(|error| FailedDelivery { email, error })
            })
            .collect();
        let failed = failures.len();

        Self {
            total,
            sent: total - failed,
            failed,
            failures,
        }
    }
}

#[derive(Debug)]
pub struct DispatchReport {
    pub summary: SendSummary,
    /// Set when the send log could not be written. The sends themselves still stand.
    pub log_error: Option<String>,
}

impl DispatchReport {
    pub fn log_saved(&self) -> bool {
        self.log_error.is_none()
    }
}

/// Where a dispatch came from, recorded on its send log.
#[derive(Debug, Clone, Default)]
pub struct DispatchOrigin {
    pub post_id: Option<Uuid>,
}

pub struct NewsletterDispatcher {
    sender: Arc<dyn EmailSender>,
    store: Arc<dyn NewsletterStore>,
    template: EmailTemplate,
}

impl NewsletterDispatcher {
    pub fn new(
        sender: Arc<dyn EmailSender>,
        store: Arc<dyn NewsletterStore>,
        template: EmailTemplate,
    ) -> Self {
        Self {
            sender,
            store,
            template,
        }
    }

    pub fn store(&self) -> &dyn NewsletterStore {
        self.store.as_ref()
    }

    pub fn template(&self) -> &EmailTemplate {
        &self.template
    }

    /// Resolves recipients, sends to each of them concurrently and records a send log.
    ///
    /// Fails only when no recipient could be resolved or when every send failed.
    #[tracing::instrument(
        name = "Dispatching a newsletter",
        skip(self, message, selected),
        fields(subject = %message.subject, total = tracing::field::Empty, failed = tracing::field::Empty)
    )]
    pub async fn dispatch(
        &self,
        message: &NewsletterMessage,
        selected: Option<Vec<String>>,
        origin: DispatchOrigin,
    ) -> Result<DispatchReport, DispatchError> {
        let recipients = resolve_recipients(self.store.as_ref(), selected).await?;
        let summary = self.fan_out(message, recipients).await;

        let span = tracing::Span::current();
        span.record("total", summary.total);
        span.record("failed", summary.failed);

        let log_error = self.write_log(message, &summary, &origin).await;
        if summary.sent == 0 {
            return Err(DispatchError::AllSendsFailed {
                failures: summary.failures,
                log_error,
            });
        }

        Ok(DispatchReport { summary, log_error })
    }

    async fn fan_out(&self, message: &NewsletterMessage, recipients: Vec<String>) -> SendSummary {
        let content_html = markdown_to_html(&message.body);

        let sends = recipients.into_iter().map(|recipient| {
            let content_html = &content_html;
            async move {
                let outcome = self.send_one(message, content_html, &recipient).await;
                if let Err(e) = &outcome {
                    tracing::warn!(
                        recipient = %recipient,
                        error.message = %e,
                        "Failed to deliver newsletter"
                    );
                }
                (recipient, outcome)
            }
        });

        SendSummary::from_outcomes(join_all(sends).await)
    }

    async fn send_one(
        &self,
        message: &NewsletterMessage,
        content_html: &str,
        recipient: &str,
    ) -> Result<(), String> {
        let html = self
            .template
            .render(content_html, message, recipient)
            .map_err(|e| format!("Failed to render email: {e}"))?;

        self.sender
            .send_email(recipient, &message.subject, &html)
            .await
            .map_err(|e| e.to_string())
    }

    /// Returns the failure description when the log could not be stored.
    async fn write_log(
        &self,
        message: &NewsletterMessage,
        summary: &SendSummary,
        origin: &DispatchOrigin,
    ) -> Option<String> {
        let record = SendLogRecord {
            post_id: origin.post_id,
            post_title: message.subject.clone(),
            post_url: message
                .link_url()
                .unwrap_or(self.template.site_origin())
                .to_string(),
            total_count: summary.total as i32,
            sent_count: summary.sent as i32,
            failed_count: summary.failed as i32,
            sent_at: Utc::now(),
        };

        match self.store.insert_send_log(&record).await {
            Ok(()) => None,
            Err(e) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Failed to save newsletter send log"
                );
                Some(e.to_string())
            }
        }
    }
}
