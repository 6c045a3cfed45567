use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Just enough of a post to announce it in a newsletter.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct SendLogRecord {
    pub post_id: Option<Uuid>,
    pub post_title: String,
    pub post_url: String,
    pub total_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub sent_at: DateTime<Utc>,
}

/// Storage reads and writes the dispatcher depends on.
#[async_trait::async_trait]
pub trait NewsletterStore: Send + Sync {
    async fn active_subscriber_emails(&self) -> Result<Vec<String>, anyhow::Error>;

    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>, anyhow::Error>;

    async fn insert_send_log(&self, record: &SendLogRecord) -> Result<(), anyhow::Error>;
}

pub struct PgNewsletterStore {
    pool: PgPool,
}

impl PgNewsletterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NewsletterStore for PgNewsletterStore {
    #[tracing::instrument(name = "Get active subscribers", skip(self))]
    async fn active_subscriber_emails(&self) -> Result<Vec<String>, anyhow::Error> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"SELECT email FROM subscribers WHERE active = true ORDER BY subscribed_at"#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch active subscribers")?;

        Ok(emails)
    }

    #[tracing::instrument(name = "Get post summary", skip(self))]
    async fn find_post(&self, post_id: Uuid) -> Result<Option<PostSummary>, anyhow::Error> {
        let post = sqlx::query_as::<_, PostSummary>(
            r#"SELECT id, title, description, slug, published FROM posts WHERE id = $1"#,
        )
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch post")?;

        Ok(post)
    }

    #[tracing::instrument(name = "Save newsletter send log", skip(self, record))]
    async fn insert_send_log(&self, record: &SendLogRecord) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            INSERT INTO newsletter_send_logs
                (id, post_id, post_title, post_url, total_count, sent_count, failed_count, sent_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.post_id)
        .bind(&record.post_title)
        .bind(&record.post_url)
        .bind(record.total_count)
        .bind(record.sent_count)
        .bind(record.failed_count)
        .bind(record.sent_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert newsletter send log")?;

        Ok(())
    }
}
