use uuid::Uuid;

use crate::newsletter::{DispatchReport, FailedDelivery};

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterRequest {
    pub subject: Option<String>,
    pub content: Option<String>,
    pub link_url: Option<String>,
    pub link_text: Option<String>,
    pub selected_emails: Option<Vec<Option<String>>>,
}

impl NewsletterRequest {
    /// Explicit recipients with `null` entries discarded.
    pub fn selection(selected: Option<Vec<Option<String>>>) -> Option<Vec<String>> {
        selected.map(|emails| emails.into_iter().flatten().collect())
    }
}

#[derive(serde::Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub success: bool,
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_details: Vec<FailedDelivery>,
    pub log_saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
}

impl From<DispatchReport> for DispatchResponse {
    fn from(report: DispatchReport) -> Self {
        let log_saved = report.log_saved();
        let warning = (!log_saved)
            .then(|| "The newsletter was sent, but the send log could not be saved.".to_string());

        Self {
            success: true,
            total: report.summary.total,
            sent: report.summary.sent,
            failed: report.summary.failed,
            failed_details: report.summary.failures,
            log_saved,
            log_error: report.log_error,
            warning,
            post_id: None,
            post_url: None,
        }
    }
}
