//! Per-request context
//!
//! A `RequestContext` is created once per inbound write and passed explicitly
//! down every call in the chain. It carries the correlation id used on tracing
//! spans, the acting user (if known) and the clock reading the whole request
//! agrees on, so every timestamp and year-partitioned identifier minted during
//! one request is consistent.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

/// Explicit context threaded through write operations
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: Uuid,
    actor: Option<String>,
    now: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a context with a fresh correlation id and the current time
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            actor: None,
            now: Utc::now(),
        }
    }

    /// Creates a context pinned to a fixed instant
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            actor: None,
            now,
        }
    }

    /// Sets the acting user
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    /// Correlation id for logs
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    /// Acting user, if known
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// The request's clock reading
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Calendar date of the request (UTC)
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Calendar year of the request (UTC)
    pub fn year(&self) -> i32 {
        self.now.year()
    }

    /// Opens a tracing span for one write operation
    pub fn span(&self, operation: &'static str) -> tracing::Span {
        tracing::info_span!(
            "write",
            operation = operation,
            correlation_id = %self.correlation_id,
            actor = self.actor.as_deref().unwrap_or("system"),
        )
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
