use std::time::{Duration, Instant};

use wiremock::{
    Mock, ResponseTemplate,
    matchers::{any, body_partial_json, method, path},
};

use crate::helpers::{TestApp, spawn_app};

async fn app_with_subscribers() -> TestApp {
    let app = spawn_app().await;
    app.store.add_subscriber("a@example.com", true);
    app.store.add_subscriber("x@example.com", false);
    app.store.add_subscriber("b@example.com", true);
    app.store.add_subscriber("y@example.com", false);
    app.store.add_subscriber("c@example.com", true);
    app.login_as_admin().await;
    app
}

fn newsletter_body() -> serde_json::Value {
    serde_json::json!({
        "subject": "Weekly digest",
        "content": "## This week\n\n**Big** news, see [the post](https://news.example.com/posts/big).",
        "linkUrl": "https://news.example.com/posts/big",
        "linkText": "Read it",
    })
}

#[tokio::test]
async fn newsletters_are_delivered_to_active_subscribers_only() {
    let app = app_with_subscribers().await;

    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["total"], 3);
    assert_eq!(body["sent"], 3);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["logSaved"], true);
    assert!(body.get("failedDetails").is_none());
    assert!(body.get("warning").is_none());

    let recipients: Vec<String> = app
        .email_server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).unwrap();
            body["to"][0].as_str().unwrap().to_string()
        })
        .collect();
    for expected in ["a@example.com", "b@example.com", "c@example.com"] {
        assert!(recipients.iter().any(|r| r == expected));
    }
}

#[tokio::test]
async fn explicit_selection_is_used_regardless_of_active_flag() {
    let app = app_with_subscribers().await;

    Mock::given(body_partial_json(serde_json::json!({ "to": ["x@example.com"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(body_partial_json(serde_json::json!({ "to": ["a@example.com"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let mut body = newsletter_body();
    body["selectedEmails"] = serde_json::json!(["x@example.com", "a@example.com"]);
    let response = app.post_newsletters(&body).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["sent"], 2);
}

#[tokio::test]
async fn newsletters_returns_400_for_missing_fields() {
    let app = app_with_subscribers().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = vec![
        (serde_json::json!({ "content": "Body" }), "missing subject"),
        (serde_json::json!({ "subject": "Hi" }), "missing content"),
        (
            serde_json::json!({ "subject": "  ", "content": "Body" }),
            "blank subject",
        ),
        (
            serde_json::json!({ "subject": "Hi", "content": "" }),
            "empty content",
        ),
    ];

    for (invalid_body, description) in test_cases {
        let response = app.post_newsletters(&invalid_body).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
    }
}

#[tokio::test]
async fn empty_recipient_set_is_rejected_before_any_send() {
    let app = spawn_app().await;
    app.store.add_subscriber("x@example.com", false);
    app.login_as_admin().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert!(app.store.saved_logs().is_empty());
}

#[tokio::test]
async fn one_rejected_recipient_is_reported_without_failing_the_rest() {
    let app = app_with_subscribers().await;

    Mock::given(body_partial_json(serde_json::json!({ "to": ["b@example.com"] })))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({ "message": "Invalid `to` field." })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 3);
    assert_eq!(body["sent"], 2);
    assert_eq!(body["failed"], 1);
    let failed = body["failedDetails"].as_array().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["email"], "b@example.com");
    assert!(failed[0]["error"].as_str().unwrap().contains("Invalid `to` field."));

    let logs = app.store.saved_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].total_count, 3);
    assert_eq!(logs[0].sent_count, 2);
    assert_eq!(logs[0].failed_count, 1);
    assert_eq!(logs[0].post_url, "https://news.example.com/posts/big");
}

#[tokio::test]
async fn every_rejection_returns_an_error_with_details() {
    let app = app_with_subscribers().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
    assert_eq!(body["details"].as_array().unwrap().len(), 3);
    assert!(body["firstError"].is_string());
    assert_eq!(body["logSaved"], true);
}

#[tokio::test]
async fn total_failure_also_reports_an_unsaved_log() {
    let app = app_with_subscribers().await;
    app.store.fail_log_writes();

    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(serde_json::json!({ "message": "Invalid `to` field." })),
        )
        .expect(3)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["firstError"].as_str().unwrap().contains("Invalid `to` field."));
    assert_eq!(body["logSaved"], false);
    assert!(body["logError"].is_string());
}

#[tokio::test]
async fn failing_to_save_the_log_is_a_warning() {
    let app = app_with_subscribers().await;
    app.store.fail_log_writes();

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let response = app.post_newsletters(&newsletter_body()).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sent"], 3);
    assert_eq!(body["failed"], 0);
    assert_eq!(body["logSaved"], false);
    assert!(body["logError"].is_string());
    assert!(body["warning"].is_string());
}

#[tokio::test]
async fn every_email_carries_its_own_unsubscribe_link() {
    let app = app_with_subscribers().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&app.email_server)
        .await;

    app.post_newsletters(&newsletter_body()).await;

    for request in app.email_server.received_requests().await.unwrap() {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        let recipient = body["to"][0].as_str().unwrap().to_string();
        let link = app.get_unsubscribe_link(&request);

        let email = link
            .0
            .query_pairs()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.into_owned());
        assert_eq!(email.as_deref(), Some(recipient.as_str()));
        assert_eq!(link.0.path(), "/unsubscribe");
    }
}

#[tokio::test]
async fn markdown_is_rendered_into_the_email_body() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let body = serde_json::json!({
        "subject": "Pictures",
        "content": "**bold** [text](http://a) ![alt](http://b)",
        "selectedEmails": ["reader@example.com"],
    });
    app.post_newsletters(&body).await;

    let request = &app.email_server.received_requests().await.unwrap()[0];
    let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    let html = sent["html"].as_str().unwrap();
    assert_eq!(sent["subject"], "Pictures");
    assert!(html.contains("<strong>bold</strong>"));
    assert!(html.contains(r#"<a href="http://a""#));
    assert!(html.contains(r#"<img src="http://b" alt="alt""#));
}

#[tokio::test]
async fn null_entries_in_the_selection_are_skipped() {
    let app = app_with_subscribers().await;

    Mock::given(body_partial_json(serde_json::json!({ "to": ["a@example.com"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let mut body = newsletter_body();
    body["selectedEmails"] = serde_json::json!(["a@example.com", null]);
    let response = app.post_newsletters(&body).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["sent"], 1);
}

#[tokio::test]
async fn malformed_payloads_get_a_json_error() {
    let app = spawn_app().await;
    app.login_as_admin().await;

    let response = app
        .post_newsletters(&serde_json::json!({ "subject": 42, "content": "Body" }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn sends_to_all_recipients_are_in_flight_together() {
    let app = app_with_subscribers().await;
    let delay = Duration::from_millis(600);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(delay))
        .expect(3)
        .mount(&app.email_server)
        .await;

    let started = Instant::now();
    let response = app.post_newsletters(&newsletter_body()).await;
    let elapsed = started.elapsed();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["sent"], 3);
    // Three sequential sends would take at least 1800ms.
    assert!(
        elapsed < delay * 2,
        "Sending to 3 recipients took {elapsed:?}"
    );
}
