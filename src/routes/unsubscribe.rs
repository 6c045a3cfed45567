use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header::ContentType, web};
use anyhow::Context;
use sqlx::PgPool;
use tera::Tera;

use crate::configuration::NewsletterSettings;
use crate::domain::SubscriberEmail;
use crate::routes::helpers::{e500, error_chain_fmt, json_error, prepare_html_template};
use crate::routes::subscriptions::try_find_subscriber_by_email;

#[derive(serde::Deserialize)]
pub struct UnsubscribeData {
    email: Option<String>,
}

#[derive(thiserror::Error)]
pub enum UnsubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("This email address is not subscribed.")]
    UnknownSubscriber,
    #[error("This email address has already been unsubscribed.")]
    AlreadyInactive,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for UnsubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for UnsubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            UnsubscribeError::ValidationError(_) | UnsubscribeError::AlreadyInactive => {
                StatusCode::BAD_REQUEST
            }
            UnsubscribeError::UnknownSubscriber => StatusCode::NOT_FOUND,
            UnsubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            UnsubscribeError::UnexpectedError(_) => {
                json_error(self.status_code(), "Failed to process the unsubscription.")
            }
            _ => json_error(self.status_code(), &self.to_string()),
        }
    }
}

#[derive(serde::Deserialize)]
pub struct UnsubscribeQuery {
    email: Option<String>,
}

pub async fn unsubscribe_form(
    query: web::Query<UnsubscribeQuery>,
    views: web::Data<Tera>,
    settings: web::Data<NewsletterSettings>,
) -> Result<HttpResponse, actix_web::Error> {
    let email = query.into_inner().email.unwrap_or_default();
    let page = prepare_html_template(
        &views,
        &[
            ("email", email.as_str()),
            ("organization_name", settings.organization_name.as_str()),
        ],
        "unsubscribe.html",
    )
    .map_err(e500)?;

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page))
}

#[tracing::instrument(
    name = "Unsubscribing a subscriber",
    skip(body, db_pool),
    fields(subscriber_email = ?body.email)
)]
pub async fn unsubscribe(
    body: web::Json<UnsubscribeData>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, UnsubscribeError> {
    let email = body
        .into_inner()
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| UnsubscribeError::ValidationError("An email address is required.".into()))?;
    let email = SubscriberEmail::parse(email).map_err(UnsubscribeError::ValidationError)?;

    let (id, active) = try_find_subscriber_by_email(&db_pool, &email)
        .await
        .context("Failed to read data from database.")?
        .ok_or(UnsubscribeError::UnknownSubscriber)?;

    if !active {
        return Err(UnsubscribeError::AlreadyInactive);
    }

    sqlx::query(r#"UPDATE subscribers SET active = false WHERE id = $1"#)
        .bind(id)
        .execute(db_pool.get_ref())
        .await
        .context("Failed to deactivate the subscriber.")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
