mod common;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use common::TestSite;
use galleria::build_router;
use galleria::email::{Mailer, providers::NullProvider};
use serde_json::{Value, json};
use std::sync::Arc;

async fn server_with_outbox(site: &TestSite) -> (TestServer, Arc<NullProvider>) {
    let outbox = Arc::new(NullProvider::new());
    let mut state = site.state().await;
    state.mailer = Mailer::new("Visit Italy! <noreply@visititaly.example>", None, outbox.clone());
    (TestServer::new(build_router(state)).unwrap(), outbox)
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

fn submission() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "subject": "Print of the Colosseum",
        "message": "Is the night shot available as a print?",
        "image": "Roma/colosseo.jpg",
        "newsLetter": true,
        "privacy": true,
    })
}

#[tokio::test]
async fn test_json_submission_is_stored_and_mailed() {
    let site = TestSite::new();
    let (server, outbox) = server_with_outbox(&site).await;

    let (name, value) = forwarded_for("203.0.113.5");
    let response = server
        .post("/contactpage")
        .add_header(name, value)
        .json(&submission())
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Thank you for your message! We'll get back to you soon."
    );
    let reference_id = body["reference_id"].as_i64().unwrap();

    let sent = outbox.sent();
    assert_eq!(sent.len(), 2);
    let to_owner = sent
        .iter()
        .find(|m| m.to == vec!["owner@example.com".to_string()])
        .unwrap();
    assert_eq!(
        to_owner.subject,
        format!("New Contact Form Submission - Print of the Colosseum (#{})", reference_id)
    );
    assert!(to_owner.text.contains("- Newsletter: Yes"));
    assert!(to_owner.text.contains("- Image: Roma/colosseo.jpg"));
    let to_visitor = sent
        .iter()
        .find(|m| m.to == vec!["ada@example.com".to_string()])
        .unwrap();
    assert_eq!(to_visitor.subject, "Thank you for contacting us");
    assert!(to_visitor.text.starts_with("Dear Ada,"));

    let status: Value = server
        .get(&format!("/contact/status/{}", reference_id))
        .await
        .json();
    assert_eq!(status["success"], true);
    assert_eq!(status["status"], "received");
    assert_eq!(status["subject"], "Print of the Colosseum");

    server
        .get("/contact/status/424242")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_form_submission_is_accepted() {
    let site = TestSite::new();
    let (server, outbox) = server_with_outbox(&site).await;

    let response = server
        .post("/contactpage")
        .form(&[
            ("firstName", "Marco"),
            ("lastName", "Polo"),
            ("email", "marco@example.com"),
            ("subject", "Travel tips"),
            ("message", "Best season for Venezia?"),
            ("privacy", "on"),
        ])
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["success"], true);
    assert_eq!(outbox.sent().len(), 2);
}

#[tokio::test]
async fn test_validation_failures() {
    let site = TestSite::new();
    let (server, outbox) = server_with_outbox(&site).await;

    let mut missing = submission();
    missing["lastName"] = json!("  ");
    let response = server.post("/contactpage").json(&missing).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);

    let mut bad_email = submission();
    bad_email["email"] = json!("ada-at-example");
    let response = server.post("/contactpage").json(&bad_email).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "Please enter a valid email address"
    );

    let mut no_privacy = submission();
    no_privacy["privacy"] = json!(false);
    let response = server.post("/contactpage").json(&no_privacy).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["message"],
        "You must agree to the privacy policy"
    );

    assert!(outbox.sent().is_empty());
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let mut site = TestSite::new();
    site.config.contact.submissions_per_minute = 2;
    let (server, _outbox) = server_with_outbox(&site).await;

    for _ in 0..2 {
        let (name, value) = forwarded_for("198.51.100.1");
        server
            .post("/contactpage")
            .add_header(name, value)
            .json(&submission())
            .await
            .assert_status_ok();
    }

    let (name, value) = forwarded_for("198.51.100.1");
    let limited = server
        .post("/contactpage")
        .add_header(name, value)
        .json(&submission())
        .await;
    limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.json::<Value>()["success"], false);

    let (name, value) = forwarded_for("198.51.100.2");
    server
        .post("/contactpage")
        .add_header(name, value)
        .json(&submission())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_untrusted_forwarded_for_shares_one_limit() {
    let mut site = TestSite::new();
    site.config.contact.submissions_per_minute = 1;
    site.config.server.trust_forwarded_for = false;
    let (server, _outbox) = server_with_outbox(&site).await;

    let (name, value) = forwarded_for("198.51.100.10");
    server
        .post("/contactpage")
        .add_header(name, value)
        .json(&submission())
        .await
        .assert_status_ok();

    let (name, value) = forwarded_for("198.51.100.11");
    server
        .post("/contactpage")
        .add_header(name, value)
        .json(&submission())
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);
}
