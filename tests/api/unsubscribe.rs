use crate::helpers::{spawn_app, spawn_app_with_db};

#[tokio::test]
async fn unsubscribe_page_is_prefilled_with_the_email() {
    let app = spawn_app().await;

    let response = app.get_unsubscribe("?email=ursula%40example.com").await;

    assert_eq!(response.status().as_u16(), 200);
    let page = response.text().await.unwrap();
    assert!(page.contains(r#"value="ursula@example.com""#));
}

#[tokio::test]
async fn unsubscribe_page_works_without_an_email() {
    let app = spawn_app().await;

    let response = app.get_unsubscribe("").await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn unsubscribe_without_email_returns_400() {
    let app = spawn_app().await;

    let response = app.post_unsubscribe(&serde_json::json!({})).await;

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn unknown_email_returns_404() {
    let app = spawn_app_with_db().await;

    let response = app
        .post_unsubscribe(&serde_json::json!({ "email": "nobody@example.com" }))
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
#[ignore = "requires a running Postgres instance"]
async fn unsubscribing_twice_returns_400() {
    let app = spawn_app_with_db().await;
    let body = serde_json::json!({ "email": "ursula@example.com" });
    app.post_subscriptions(&body).await;

    let first = app.post_unsubscribe(&body).await;
    let second = app.post_unsubscribe(&body).await;

    assert_eq!(first.status().as_u16(), 200);
    assert_eq!(second.status().as_u16(), 400);

    let active: bool = sqlx::query_scalar("SELECT active FROM subscribers")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert!(!active);
}
