//! Feedback Analytics Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.
//!
//! The engine itself is pure (see `analytics` and `sentiment`); this binary
//! supplies the collaborators: an in-memory feedback store seeded with demo
//! records, the Prometheus exporter, and the router.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedback_pulse_analyzer::api::{self, AppState};
use feedback_pulse_analyzer::feedback::{FeedbackStore, InMemoryFeedbackStore, NewFeedback};
use feedback_pulse_analyzer::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEEDBACK_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEEDBACK_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feedback_pulse_analyzer=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Seed a handful of representative records so the dashboard has something to
/// show on a fresh instance.
async fn seed_demo_feedback(store: &InMemoryFeedbackStore) -> Result<()> {
    let now = Utc::now();
    let seeds: [(u8, &str, Option<&str>, &str, i64); 6] = [
        (
            5,
            "Absolutely love this product! The user interface is intuitive and the features are exactly what I needed.",
            Some("john.doe@email.com"),
            "/product/dashboard",
            2,
        ),
        (
            4,
            "Great experience overall. The only issue I had was with the loading times, but everything else works perfectly.",
            Some("sarah.wilson@company.com"),
            "/features",
            4,
        ),
        (
            3,
            "It's okay, but I think there's room for improvement in the mobile experience.",
            None,
            "/pricing",
            6,
        ),
        (
            5,
            "Excellent customer service and the product exceeded my expectations. Highly recommended!",
            Some("mike.johnson@startup.io"),
            "/contact",
            12,
        ),
        (
            2,
            "Had some technical difficulties during setup. The documentation could be clearer.",
            Some("support@techcorp.com"),
            "/docs/getting-started",
            24,
        ),
        (
            4,
            "Really impressed with the analytics dashboard. The insights are very helpful for my business.",
            Some("analytics.user@business.com"),
            "/analytics",
            36,
        ),
    ];

    for (rating, comment, email, page_url, hours_ago) in seeds {
        store
            .create(NewFeedback {
                rating,
                comment: Some(comment.to_string()),
                email: email.map(str::to_string),
                page_url: Some(page_url.to_string()),
                timestamp: Some(now - Duration::hours(hours_ago)),
            })
            .await?;
    }
    Ok(())
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    let metrics = Metrics::init();

    let store = Arc::new(InMemoryFeedbackStore::new());
    seed_demo_feedback(store.as_ref())
        .await
        .expect("seed demo feedback");

    let state = AppState::new(store);
    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
