mod errors;
mod newsletters_handler;
mod post_newsletter_handler;
mod types;

pub use errors::PublishError;
pub use newsletters_handler::publish_newsletter;
pub use post_newsletter_handler::publish_post_newsletter;
pub use types::{DispatchResponse, NewsletterRequest};
