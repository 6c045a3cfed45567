use actix_web::{HttpResponse, http::header, web};
use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::routes::helpers::e500;

#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct SubscriberRow {
    pub id: Uuid,
    pub email: String,
    pub active: bool,
    pub subscribed_at: DateTime<Utc>,
}

#[tracing::instrument(name = "Fetch all subscribers", skip(pool))]
async fn all_subscribers(pool: &PgPool) -> Result<Vec<SubscriberRow>, anyhow::Error> {
    sqlx::query_as::<_, SubscriberRow>(
        r#"SELECT id, email, active, subscribed_at FROM subscribers ORDER BY subscribed_at DESC"#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to fetch subscribers")
}

pub async fn list_subscribers(
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let subscribers = all_subscribers(&db_pool).await.map_err(e500)?;
    let active = subscribers.iter().filter(|s| s.active).count();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total": subscribers.len(),
        "active": active,
        "subscribers": subscribers,
    })))
}

pub async fn export_subscribers(
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    let subscribers = all_subscribers(&db_pool).await.map_err(e500)?;
    let filename = format!("subscribers_{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(subscribers_csv(&subscribers)))
}

fn subscribers_csv(subscribers: &[SubscriberRow]) -> String {
    let mut csv = String::from("Email,Status,Subscribed At\n");
    for s in subscribers {
        let status = if s.active { "Active" } else { "Inactive" };
        csv.push_str(&format!(
            "{},{},{}\n",
            csv_field(&s.email),
            status,
            s.subscribed_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    csv
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[tracing::instrument(name = "Delete a subscriber", skip(db_pool))]
pub async fn delete_subscriber(
    path: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, actix_web::Error> {
    sqlx::query(r#"DELETE FROM subscribers WHERE id = $1"#)
        .bind(path.into_inner())
        .execute(db_pool.get_ref())
        .await
        .context("Failed to delete subscriber")
        .map_err(e500)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
