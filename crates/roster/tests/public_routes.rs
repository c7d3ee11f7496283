//! Routes outside authentication, and cross-cutting headers.

use http::StatusCode;
use roster_test::TestApp;

#[tokio::test]
async fn root_and_health_need_no_token() {
    let app = TestApp::new().unwrap();

    let root = app.client().get("/").send().await;
    root.assert_status(StatusCode::OK);
    assert_eq!(root.text().unwrap(), "API is running");

    let health = app.client().get("/health").send().await;
    health.assert_status(StatusCode::OK);
    assert_eq!(health.json_value().unwrap()["status"], "healthy");

    app.client()
        .get("/ready")
        .send()
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let app = TestApp::new().unwrap();

    let generated = app.client().get("/api/employees").send().await;
    assert!(generated.header_str("x-request-id").is_some());

    let supplied = "0190f6a8-3c4e-7a1b-9d2e-5f6a7b8c9d0e";
    let fresh = app
        .client()
        .get("/")
        .header("x-request-id", supplied)
        .send()
        .await;
    let assigned = fresh.header_str("x-request-id").unwrap();
    assert_ne!(assigned, supplied);
    assert_ne!(assigned, generated.header_str("x-request-id").unwrap());
}

#[tokio::test]
async fn preflight_is_answered_before_authentication() {
    let app = TestApp::new().unwrap();

    let response = app
        .client()
        .options("/api/employees")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .send()
        .await;

    response.assert_status(StatusCode::NO_CONTENT);
    assert!(response
        .header_str("access-control-allow-methods")
        .is_some_and(|methods| methods.contains("POST")));
}

#[tokio::test]
async fn unknown_paths_and_uploads() {
    let app = TestApp::new().unwrap();

    app.client()
        .get("/nope")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.client()
        .get("/uploads/missing.png")
        .send()
        .await
        .assert_status(StatusCode::NOT_FOUND)
        .assert_message("Not found");

    std::fs::write(app.upload_dir().join("1-a.txt"), b"hello").unwrap();
    let served = app.client().get("/uploads/1-a.txt").send().await;
    served.assert_status(StatusCode::OK);
    assert_eq!(served.text().unwrap(), "hello");
}
