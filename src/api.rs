use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::analytics::{Analytics, AnalyticsSnapshot};
use crate::feedback::{FeedbackRecord, FeedbackStore, NewFeedback};
use crate::sentiment::{SentimentAnalyzer, SentimentResult};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn FeedbackStore>,
    analyzer: Arc<SentimentAnalyzer>,
    analytics: Analytics,
}

impl AppState {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self {
            analytics: Analytics::new(store.clone()),
            analyzer: Arc::new(SentimentAnalyzer::new()),
            store,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/classify", post(classify))
        .route("/analytics", get(analytics))
        .route("/feedback", get(list_feedback).post(create_feedback))
        .route("/feedback/{id}", delete(delete_feedback))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct ClassifyReq {
    #[serde(default)]
    text: Option<String>,
}

async fn classify(
    State(state): State<AppState>,
    Json(body): Json<ClassifyReq>,
) -> Json<SentimentResult> {
    counter!("classify_requests_total").increment(1);
    Json(state.analyzer.classify(body.text.as_deref()))
}

#[derive(Deserialize)]
struct AnalyticsQuery {
    #[serde(default)]
    window: Option<String>,
}

async fn analytics(
    State(state): State<AppState>,
    Query(q): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSnapshot>, StatusCode> {
    let window = q.window.as_deref().unwrap_or("7d");
    match state.analytics.get_analytics(window).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(err) => {
            // store-level failure; the engine itself never errors
            tracing::error!(error = ?err, "analytics aggregation failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn list_feedback(
    State(state): State<AppState>,
) -> Result<Json<Vec<FeedbackRecord>>, StatusCode> {
    match state.store.get_all().await {
        Ok(records) => Ok(Json(records)),
        Err(err) => {
            tracing::error!(error = ?err, "feedback listing failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Stored record plus its inline sentiment tag, so the dashboard can show the
/// per-record classification without a second round trip.
#[derive(Serialize)]
struct CreatedFeedback {
    record: FeedbackRecord,
    sentiment: SentimentResult,
}

async fn create_feedback(
    State(state): State<AppState>,
    Json(body): Json<NewFeedback>,
) -> Result<(StatusCode, Json<CreatedFeedback>), StatusCode> {
    if !(1..=5).contains(&body.rating) {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }
    let sentiment = state.analyzer.classify(body.comment.as_deref());
    match state.store.create(body).await {
        Ok(record) => Ok((StatusCode::CREATED, Json(CreatedFeedback { record, sentiment }))),
        Err(err) => {
            tracing::error!(error = ?err, "feedback creation failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn delete_feedback(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    match state.store.delete_by_id(id).await {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(err) => {
            tracing::error!(error = ?err, id, "feedback deletion failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
