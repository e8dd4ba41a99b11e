// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /classify (text, empty text, absent text)
// - POST /feedback (created shape, inline sentiment tag, validation)
// - GET /feedback (newest first)
// - GET /analytics (snapshot shape, fail-soft window)
// - DELETE /feedback/{id}

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use feedback_pulse_analyzer::api::{create_router, AppState};
use feedback_pulse_analyzer::feedback::InMemoryFeedbackStore;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Build the same Router the binary uses, on an empty store.
fn test_router() -> Router {
    create_router(AppState::new(Arc::new(InMemoryFeedbackStore::new())))
}

fn json_request(method: &str, uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

async fn read_json(resp: Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let app = test_router();

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "ok");
}

#[tokio::test]
async fn classify_returns_expected_json_fields() {
    let app = test_router();

    let payload = json!({ "text": "amazing wonderful fantastic" });
    let resp = app
        .oneshot(json_request("POST", "/classify", &payload))
        .await
        .expect("oneshot /classify");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_json(resp).await;
    assert_eq!(body["label"], json!("positive"));
    assert!(body["score"].as_i64().expect("score") > 0);
    assert!(body["confidence"].as_u64().expect("confidence") >= 10);
}

#[tokio::test]
async fn classify_empty_and_absent_text_are_not_evaluated() {
    let app = test_router();

    for payload in [json!({ "text": "" }), json!({})] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/classify", &payload))
            .await
            .expect("oneshot /classify");
        assert_eq!(resp.status(), StatusCode::OK);

        let body = read_json(resp).await;
        assert_eq!(body["label"], json!("neutral"));
        assert_eq!(body["score"], json!(0));
        assert_eq!(body["confidence"], json!(0));
    }
}

#[tokio::test]
async fn create_feedback_returns_record_with_sentiment_tag() {
    let app = test_router();

    let payload = json!({
        "rating": 5,
        "comment": "Great product, love the clean and intuitive design!",
        "pageUrl": "/features"
    });
    let resp = app
        .oneshot(json_request("POST", "/feedback", &payload))
        .await
        .expect("oneshot POST /feedback");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body = read_json(resp).await;
    assert_eq!(body["record"]["id"], json!(1));
    assert_eq!(body["record"]["rating"], json!(5));
    assert_eq!(body["record"]["pageUrl"], json!("/features"));
    assert!(body["record"]["timestamp"].is_string());
    assert_eq!(body["sentiment"]["label"], json!("positive"));
}

#[tokio::test]
async fn create_feedback_rejects_out_of_range_rating() {
    let app = test_router();

    for rating in [0, 6] {
        let payload = json!({ "rating": rating });
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/feedback", &payload))
            .await
            .expect("oneshot POST /feedback");
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn feedback_listing_is_newest_first() {
    let app = test_router();

    for rating in [3, 5] {
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/feedback", &json!({ "rating": rating })))
            .await
            .expect("create feedback");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/feedback")
                .body(Body::empty())
                .expect("build GET /feedback"),
        )
        .await
        .expect("oneshot GET /feedback");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_json(resp).await;
    let list = body.as_array().expect("array body");
    assert_eq!(list.len(), 2);
    // the second submission is newer, so it comes first
    assert_eq!(list[0]["rating"], json!(5));
}

#[tokio::test]
async fn analytics_on_empty_store_is_all_zero_defaults() {
    let app = test_router();

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/analytics?window=7d")
                .body(Body::empty())
                .expect("build GET /analytics"),
        )
        .await
        .expect("oneshot GET /analytics");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = read_json(resp).await;
    assert_eq!(body["totalResponses"], json!(0));
    assert_eq!(body["avgRating"], json!(0.0));
    assert_eq!(body["nps"], json!(0));
    assert_eq!(body["topPages"], json!([]));
    assert_eq!(body["timeline"].as_array().expect("timeline").len(), 7);
    // fixed-shape mapping: all five rating keys present
    for key in ["1", "2", "3", "4", "5"] {
        assert_eq!(body["ratingDistribution"][key], json!(0));
    }
}

#[tokio::test]
async fn analytics_reflects_created_feedback() {
    let app = test_router();

    for (rating, page) in [(5, "/docs"), (1, "/docs"), (3, "/pricing")] {
        let payload = json!({ "rating": rating, "pageUrl": page });
        let resp = app
            .clone()
            .oneshot(json_request("POST", "/feedback", &payload))
            .await
            .expect("create feedback");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/analytics?window=7d")
                .body(Body::empty())
                .expect("build GET /analytics"),
        )
        .await
        .expect("oneshot GET /analytics");
    let body = read_json(resp).await;

    assert_eq!(body["totalResponses"], json!(3));
    assert_eq!(body["sentiment"]["positive"], json!(1));
    assert_eq!(body["sentiment"]["neutral"], json!(1));
    assert_eq!(body["sentiment"]["negative"], json!(1));
    assert_eq!(body["nps"], json!(0));
    assert_eq!(body["topPages"][0]["url"], json!("/docs"));
    assert_eq!(body["topPages"][0]["responses"], json!(2));
}

#[tokio::test]
async fn analytics_unknown_window_is_fail_soft() {
    let app = test_router();

    let resp = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/analytics?window=fortnight")
                .body(Body::empty())
                .expect("build GET /analytics"),
        )
        .await
        .expect("oneshot GET /analytics");
    assert_eq!(resp.status(), StatusCode::OK);

    // falls back to the 7d window
    let body = read_json(resp).await;
    assert_eq!(body["timeline"].as_array().expect("timeline").len(), 7);
}

#[tokio::test]
async fn delete_feedback_reports_missing_ids() {
    let app = test_router();

    let resp = app
        .clone()
        .oneshot(json_request("POST", "/feedback", &json!({ "rating": 4 })))
        .await
        .expect("create feedback");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let delete_req = |id: u64| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/feedback/{id}"))
            .body(Body::empty())
            .expect("build DELETE /feedback")
    };

    let resp = app
        .clone()
        .oneshot(delete_req(1))
        .await
        .expect("oneshot DELETE");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // deleting a nonexistent id is a reported failure, not a fatal error
    let resp = app.oneshot(delete_req(1)).await.expect("oneshot DELETE");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
