mod dispatch;
mod errors;
mod recipients;
mod store;
mod template;

pub use dispatch::{DispatchOrigin, DispatchReport, NewsletterDispatcher, SendSummary};
pub use errors::{DispatchError, FailedDelivery};
pub use recipients::resolve_recipients;
pub use store::{NewsletterStore, PgNewsletterStore, PostSummary, SendLogRecord};
pub use template::{EmailTemplate, markdown_to_html};
