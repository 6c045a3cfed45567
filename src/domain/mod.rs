mod newsletter_message;
mod post_slug;
mod post_title;
mod subscriber_email;

pub use newsletter_message::{CallToAction, NewsletterMessage};
pub use post_slug::PostSlug;
pub use post_title::PostTitle;
pub use subscriber_email::SubscriberEmail;
