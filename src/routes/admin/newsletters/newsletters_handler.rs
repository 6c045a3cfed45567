use actix_web::{HttpResponse, web};

use super::{
    errors::PublishError,
    types::{DispatchResponse, NewsletterRequest},
};
use crate::{
    domain::NewsletterMessage,
    newsletter::{DispatchOrigin, NewsletterDispatcher},
};

#[tracing::instrument(
    name = "Publish newsletter",
    skip(body, dispatcher),
    fields(subject = ?body.subject)
)]
pub async fn publish_newsletter(
    body: web::Json<NewsletterRequest>,
    dispatcher: web::Data<NewsletterDispatcher>,
) -> Result<HttpResponse, PublishError> {
    let NewsletterRequest {
        subject,
        content,
        link_url,
        link_text,
        selected_emails,
    } = body.into_inner();

    let message = NewsletterMessage::parse(subject, content, link_url, link_text)
        .map_err(PublishError::ValidationError)?;

    let report = dispatcher
        .dispatch(
            &message,
            NewsletterRequest::selection(selected_emails),
            DispatchOrigin::default(),
        )
        .await?;

    Ok(HttpResponse::Ok().json(DispatchResponse::from(report)))
}
