use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::SubscriberEmail;
use crate::routes::helpers::{error_chain_fmt, json_error};

#[derive(serde::Deserialize)]
pub struct SubscribeData {
    email: Option<String>,
}

#[derive(thiserror::Error)]
pub enum SubscribeError {
    #[error("{0}")]
    ValidationError(String),
    #[error("This email address is already subscribed.")]
    AlreadySubscribed,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for SubscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SubscribeError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubscribeError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SubscribeError::AlreadySubscribed => StatusCode::CONFLICT,
            SubscribeError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            SubscribeError::UnexpectedError(_) => {
                json_error(self.status_code(), "Failed to process the subscription.")
            }
            _ => json_error(self.status_code(), &self.to_string()),
        }
    }
}

#[tracing::instrument(
    name = "Adding a new subscriber.",
    skip(body, db_pool),
    fields(subscriber_email = ?body.email)
)]
pub async fn subscribe(
    body: web::Json<SubscribeData>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, SubscribeError> {
    let email = body
        .into_inner()
        .email
        .ok_or_else(|| SubscribeError::ValidationError("An email address is required.".into()))?;
    let email = SubscriberEmail::parse(email).map_err(SubscribeError::ValidationError)?;

    let existing = try_find_subscriber_by_email(&db_pool, &email)
        .await
        .context("Failed to read data from database.")?;

    let reactivated = match existing {
        Some((_, true)) => return Err(SubscribeError::AlreadySubscribed),
        Some((id, false)) => {
            reactivate_subscriber(&db_pool, id)
                .await
                .context("Failed to reactivate the subscriber.")?;
            true
        }
        None => {
            insert_subscriber(&db_pool, &email)
                .await
                .context("Failed to insert a new subscriber in the database.")?;
            false
        }
    };

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "reactivated": reactivated,
    })))
}

#[tracing::instrument(name = "Trying to find existing subscriber by email", skip(pool))]
pub async fn try_find_subscriber_by_email(
    pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<Option<(Uuid, bool)>, sqlx::Error> {
    sqlx::query_as::<_, (Uuid, bool)>(r#"SELECT id, active FROM subscribers WHERE email = $1"#)
        .bind(email.as_ref())
        .fetch_optional(pool)
        .await
}

#[tracing::instrument(name = "Reactivating subscriber", skip(pool))]
async fn reactivate_subscriber(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE subscribers SET active = true, subscribed_at = $2 WHERE id = $1"#)
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(())
}

#[tracing::instrument(
    name = "Saving new subscriber details in the database",
    skip(pool, email)
)]
async fn insert_subscriber(pool: &PgPool, email: &SubscriberEmail) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO subscribers (id, email, active, subscribed_at)
        VALUES ($1, $2, true, $3)
        "#,
    )
    .bind(id)
    .bind(email.as_ref())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}
