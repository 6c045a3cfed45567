mod admin;
mod health_check;
mod helpers;
mod login;
mod posts;
mod subscriptions;
mod unsubscribe;

pub use admin::*;
pub use health_check::*;
pub use helpers::{
    e500, error_chain_fmt, json_error, json_payload_error, load_views, prepare_html_template,
};
pub use login::*;
pub use posts::*;
pub use subscriptions::*;
pub use unsubscribe::*;
