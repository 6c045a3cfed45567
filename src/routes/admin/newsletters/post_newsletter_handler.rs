use actix_web::{HttpResponse, web};
use anyhow::Context;
use uuid::Uuid;

use super::{errors::PublishError, types::DispatchResponse};
use crate::{
    configuration::NewsletterSettings,
    domain::NewsletterMessage,
    newsletter::{DispatchOrigin, NewsletterDispatcher, PostSummary},
};

/// Announces a published post to every active subscriber.
#[tracing::instrument(name = "Publish post newsletter", skip(dispatcher, settings))]
pub async fn publish_post_newsletter(
    path: web::Path<Uuid>,
    dispatcher: web::Data<NewsletterDispatcher>,
    settings: web::Data<NewsletterSettings>,
) -> Result<HttpResponse, PublishError> {
    let post_id = path.into_inner();
    let post = dispatcher
        .store()
        .find_post(post_id)
        .await
        .context("Failed to load the post to announce")?
        .ok_or_else(|| PublishError::NotFound("The post does not exist.".into()))?;

    if !post.published {
        return Err(PublishError::ValidationError(
            "Only published posts can be sent as a newsletter.".into(),
        ));
    }

    let template = dispatcher.template();
    let post_url = settings.post_url(template.site_origin(), &post.slug);
    let message = post_message(&post, template.organization_name(), &post_url);

    let report = dispatcher
        .dispatch(
            &message,
            None,
            DispatchOrigin {
                post_id: Some(post.id),
            },
        )
        .await?;

    let mut response = DispatchResponse::from(report);
    response.post_id = Some(post.id);
    response.post_url = Some(post_url);
    Ok(HttpResponse::Ok().json(response))
}

fn post_message(post: &PostSummary, organization_name: &str, post_url: &str) -> NewsletterMessage {
    let subject = format!("[{organization_name} Newsletter] {}", post.title);
    let mut body = format!("## {}\n\n", post.title);
    if !post.description.trim().is_empty() {
        body.push_str(post.description.trim());
        body.push_str("\n\n");
    }
    body.push_str("A new post has been published. Use the button below to read it.");

    NewsletterMessage {
        subject,
        body,
        call_to_action: Some(crate::domain::CallToAction {
            url: post_url.to_string(),
            label: None,
        }),
    }
}
