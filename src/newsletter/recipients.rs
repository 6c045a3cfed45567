use super::{DispatchError, NewsletterStore};

/// Picks the addresses a dispatch goes to.
///
/// A non-empty explicit selection is used exactly as given (empty entries
/// dropped, duplicates and inactive addresses kept). Otherwise every active subscriber
/// is targeted.
#[tracing::instrument(name = "Resolve newsletter recipients", skip(store, selected))]
pub async fn resolve_recipients(
    store: &dyn NewsletterStore,
    selected: Option<Vec<String>>,
) -> Result<Vec<String>, DispatchError> {
    let selected: Vec<String> = selected
        .unwrap_or_default()
        .into_iter()
        .filter(|email| !email.is_empty())
        .collect();

    let recipients = if selected.is_empty() {
        store
            .active_subscriber_emails()
            .await
            .map_err(DispatchError::RecipientLookupFailed)?
    } else {
        selected
    };

    if recipients.is_empty() {
        return Err(DispatchError::NoRecipients);
    }
    Ok(recipients)
}
