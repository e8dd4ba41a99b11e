//! # Feedback Store
//! `FeedbackRecord` data model and the store contract the engine consumes.
//!
//! The engine never owns persistence; it reads whatever collection the store
//! hands back. The contract is deliberately narrow: append-only create,
//! read-all (newest first, stable copy), delete-by-id. The in-memory
//! implementation backs the binary and doubles as a test fixture, so the
//! aggregator can be exercised against fixed collections.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One customer feedback submission. Owned by the store; the engine treats it
/// as an immutable read-only value.
///
/// Invariant: `rating` is in `1..=5`. The aggregator tolerates violations by
/// skipping the record, but a well-behaved store never produces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    /// Unique positive id, assigned by the store, never reused.
    pub id: u64,
    /// Star rating, 1..=5.
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Submission instant, normalized to UTC. Set at creation, never mutated.
    pub timestamp: DateTime<Utc>,
    /// Absent means "anonymous".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Originating page; absent means "unknown page".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Payload for [`FeedbackStore::create`]: everything except the store-assigned
/// id. A missing `timestamp` means "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// External persistence collaborator. Implementations may be backed by
/// anything; failures surface as errors here and propagate unmodified
/// through the engine.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// All records, newest first. Must be a stable copy, not a live view.
    async fn get_all(&self) -> Result<Vec<FeedbackRecord>>;

    /// Persist a new record, assigning a fresh id (and `now` as the
    /// timestamp if the payload carries none).
    async fn create(&self, new: NewFeedback) -> Result<FeedbackRecord>;

    /// Remove a record. `Ok(false)` for an unknown id — a reported failure,
    /// not a fatal one.
    async fn delete_by_id(&self, id: u64) -> Result<bool>;
}

/// Process-local store used by the binary and by tests.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    inner: Mutex<Vec<FeedbackRecord>>,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a fixed collection (test fixtures, demo seeds).
    pub fn with_records(records: Vec<FeedbackRecord>) -> Self {
        Self {
            inner: Mutex::new(records),
        }
    }
}

#[async_trait]
impl FeedbackStore for InMemoryFeedbackStore {
    async fn get_all(&self) -> Result<Vec<FeedbackRecord>> {
        let v = self.inner.lock().expect("feedback store mutex poisoned");
        let mut out = v.clone();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(out)
    }

    async fn create(&self, new: NewFeedback) -> Result<FeedbackRecord> {
        let mut v = self.inner.lock().expect("feedback store mutex poisoned");
        let next_id = v.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = FeedbackRecord {
            id: next_id,
            rating: new.rating,
            comment: new.comment,
            timestamp: new.timestamp.unwrap_or_else(Utc::now),
            email: new.email,
            page_url: new.page_url,
        };
        v.push(record.clone());
        Ok(record)
    }

    async fn delete_by_id(&self, id: u64) -> Result<bool> {
        let mut v = self.inner.lock().expect("feedback store mutex poisoned");
        let before = v.len();
        v.retain(|r| r.id != id);
        Ok(v.len() != before)
    }
}
