use actix_web::{HttpResponse, ResponseError, http::StatusCode, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::newsletter::markdown_to_html;
use crate::routes::helpers::{error_chain_fmt, json_error};

pub(crate) const POST_COLUMNS: &str = "id, title, description, content, thumbnail_url, category, \
     read_time, slug, published, created_at, updated_at";

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content: String,
    pub thumbnail_url: String,
    pub category: String,
    pub read_time: String,
    pub slug: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(serde::Serialize)]
struct RenderedPost {
    #[serde(flatten)]
    post: Post,
    content_html: String,
}

#[derive(thiserror::Error)]
pub enum PostError {
    #[error("{0}")]
    ValidationError(String),
    #[error("The post does not exist.")]
    NotFound,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for PostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for PostError {
    fn status_code(&self) -> StatusCode {
        match self {
            PostError::ValidationError(_) => StatusCode::BAD_REQUEST,
            PostError::NotFound => StatusCode::NOT_FOUND,
            PostError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            PostError::UnexpectedError(_) => {
                json_error(self.status_code(), "An unexpected error occurred.")
            }
            _ => json_error(self.status_code(), &self.to_string()),
        }
    }
}

#[tracing::instrument(name = "List published posts", skip(db_pool))]
pub async fn list_posts(db_pool: web::Data<PgPool>) -> Result<HttpResponse, PostError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE published = true ORDER BY created_at DESC"
    ))
    .fetch_all(db_pool.get_ref())
    .await
    .context("Failed to fetch published posts")?;

    Ok(HttpResponse::Ok().json(posts))
}

#[tracing::instrument(name = "Read a published post", skip(db_pool))]
pub async fn get_post_by_slug(
    path: web::Path<String>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, PostError> {
    let slug = path.into_inner();
    let post = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1 AND published = true"
    ))
    .bind(&slug)
    .fetch_optional(db_pool.get_ref())
    .await
    .context("Failed to fetch post by slug")?
    .ok_or(PostError::NotFound)?;

    let content_html = markdown_to_html(&post.content);
    Ok(HttpResponse::Ok().json(RenderedPost { post, content_html }))
}
