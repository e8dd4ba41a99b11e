// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analytics;
pub mod api;
pub mod feedback;
pub mod metrics;
pub mod sentiment;

// ---- Re-exports for stable public API ----
pub use crate::analytics::{aggregate, Analytics, AnalyticsSnapshot, Window};
pub use crate::api::{create_router, AppState};
pub use crate::feedback::{FeedbackRecord, FeedbackStore, InMemoryFeedbackStore, NewFeedback};
pub use crate::sentiment::{SentimentAnalyzer, SentimentLabel, SentimentResult};
