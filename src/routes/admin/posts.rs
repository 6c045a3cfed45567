use actix_web::{HttpResponse, web};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{PostSlug, PostTitle};
use crate::routes::posts::{POST_COLUMNS, Post, PostError};

#[derive(serde::Deserialize)]
pub struct PostInput {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    thumbnail_url: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    read_time: String,
    slug: Option<String>,
    #[serde(default)]
    published: bool,
}

struct ValidPost {
    title: PostTitle,
    slug: PostSlug,
    input: PostInput,
}

impl TryFrom<PostInput> for ValidPost {
    type Error = String;

    fn try_from(input: PostInput) -> Result<Self, Self::Error> {
        let title = PostTitle::parse(input.title.clone())?;
        let slug = PostSlug::from_request(input.slug.clone(), title.as_ref(), Utc::now());
        Ok(Self { title, slug, input })
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct PostDashboard {
    total: usize,
    published: usize,
    active_subscribers: i64,
    posts: Vec<Post>,
}

impl PostDashboard {
    fn new(posts: Vec<Post>, active_subscribers: i64) -> Self {
        Self {
            total: posts.len(),
            published: posts.iter().filter(|p| p.published).count(),
            active_subscribers,
            posts,
        }
    }
}

/// Every post, drafts included, newest first.
#[tracing::instrument(name = "List all posts", skip(db_pool))]
pub async fn list_all_posts(db_pool: web::Data<PgPool>) -> Result<HttpResponse, PostError> {
    let posts = sqlx::query_as::<_, Post>(&format!(
        "SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC"
    ))
    .fetch_all(db_pool.get_ref())
    .await
    .context("Failed to fetch posts")?;

    let active_subscribers: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM subscribers WHERE active = true"#)
            .fetch_one(db_pool.get_ref())
            .await
            .context("Failed to count active subscribers")?;

    Ok(HttpResponse::Ok().json(PostDashboard::new(posts, active_subscribers)))
}

#[tracing::instrument(name = "Create a post", skip(body, db_pool), fields(title = %body.title))]
pub async fn create_post(
    body: web::Json<PostInput>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, PostError> {
    let post: ValidPost = body.into_inner().try_into().map_err(PostError::ValidationError)?;
    let now = Utc::now();

    let created = sqlx::query_as::<_, Post>(&format!(
        r#"
        INSERT INTO posts
            (id, title, description, content, thumbnail_url, category, read_time, slug,
             published, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(post.title.as_ref())
    .bind(&post.input.description)
    .bind(&post.input.content)
    .bind(&post.input.thumbnail_url)
    .bind(&post.input.category)
    .bind(&post.input.read_time)
    .bind(post.slug.as_ref())
    .bind(post.input.published)
    .bind(now)
    .fetch_one(db_pool.get_ref())
    .await
    .context("Failed to insert a new post")?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": created })))
}

#[tracing::instrument(name = "Read a post", skip(db_pool))]
pub async fn get_post(
    path: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, PostError> {
    let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
        .bind(path.into_inner())
        .fetch_optional(db_pool.get_ref())
        .await
        .context("Failed to fetch post")?
        .ok_or(PostError::NotFound)?;

    Ok(HttpResponse::Ok().json(post))
}

#[tracing::instrument(name = "Update a post", skip(body, db_pool))]
pub async fn update_post(
    path: web::Path<Uuid>,
    body: web::Json<PostInput>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, PostError> {
    let post: ValidPost = body.into_inner().try_into().map_err(PostError::ValidationError)?;

    let updated = sqlx::query_as::<_, Post>(&format!(
        r#"
        UPDATE posts
        SET title = $2, description = $3, content = $4, thumbnail_url = $5, category = $6,
            read_time = $7, slug = $8, published = $9, updated_at = $10
        WHERE id = $1
        RETURNING {POST_COLUMNS}
        "#
    ))
    .bind(path.into_inner())
    .bind(post.title.as_ref())
    .bind(&post.input.description)
    .bind(&post.input.content)
    .bind(&post.input.thumbnail_url)
    .bind(&post.input.category)
    .bind(&post.input.read_time)
    .bind(post.slug.as_ref())
    .bind(post.input.published)
    .bind(Utc::now())
    .fetch_optional(db_pool.get_ref())
    .await
    .context("Failed to update post")?
    .ok_or(PostError::NotFound)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": updated })))
}

#[tracing::instrument(name = "Delete a post", skip(db_pool))]
pub async fn delete_post(
    path: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, PostError> {
    let result = sqlx::query(r#"DELETE FROM posts WHERE id = $1"#)
        .bind(path.into_inner())
        .execute(db_pool.get_ref())
        .await
        .context("Failed to delete post")?;

    if result.rows_affected() == 0 {
        return Err(PostError::NotFound);
    }
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
