use crate::routes::error_chain_fmt;

#[derive(Debug, Clone, serde::Serialize)]
pub struct FailedDelivery {
    pub email: String,
    pub error: String,
}

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("There are no recipients to send the newsletter to.")]
    NoRecipients,
    #[error("Failed to look up newsletter recipients.")]
    RecipientLookupFailed(#[source] anyhow::Error),
    #[error("Every newsletter delivery failed.")]
    AllSendsFailed {
        failures: Vec<FailedDelivery>,
        /// Set when the send log for the failed run could not be written either.
        log_error: Option<String>,
    },
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
