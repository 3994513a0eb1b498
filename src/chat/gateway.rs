//! Gateway seams: the two external dependencies the chat core consumes.
//!
//! The core never sees HTTP or SQLite; it sees `complete(prompt) -> text`
//! and `execute(sql) -> rows`. [`crate::inference::InferenceClient`] and
//! [`crate::store::StoreDatabase`] are the production implementations.

use std::time::Duration;

use async_trait::async_trait;

use super::types::Row;
use crate::inference::InferenceError;
use crate::store::StoreError;

/// Text completion from a generative model.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Complete `prompt`. An empty string means the model produced nothing.
    async fn complete(&mut self, prompt: &str) -> Result<String, InferenceError>;
}

/// Execution of opaque SQL text.
#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StoreError>;
}

// ─── Bounded ────────────────────────────────────────────────────────────────

/// Puts a hard time limit on every call to the wrapped gateway.
///
/// An elapsed limit is reported as the gateway's own timeout error, so the
/// caller's ordinary failure handling applies.
pub struct Bounded<G> {
    inner: G,
    limit: Duration,
}

impl<G> Bounded<G> {
    pub fn new(inner: G, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl<G: ModelGateway> ModelGateway for Bounded<G> {
    async fn complete(&mut self, prompt: &str) -> Result<String, InferenceError> {
        match tokio::time::timeout(self.limit, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(InferenceError::Timeout {
                duration_secs: self.limit.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl<G: DataGateway> DataGateway for Bounded<G> {
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, StoreError> {
        match tokio::time::timeout(self.limit, self.inner.execute(sql)).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::QueryTimeout {
                duration_secs: self.limit.as_secs(),
            }),
        }
    }
}

// ─── Test Doubles ───────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::testing::{ScriptedData, ScriptedModel};
    use super::*;

    #[tokio::test]
    async fn bounded_model_times_out() {
        let slow = ScriptedModel::new()
            .then_reply("too late")
            .with_delay(Duration::from_millis(500));
        let mut bounded = Bounded::new(slow, Duration::from_millis(20));

        let err = bounded.complete("hi").await.unwrap_err();
        assert!(matches!(err, InferenceError::Timeout { .. }));
    }

    #[tokio::test]
    async fn bounded_model_passes_through_in_time() {
        let mut bounded = Bounded::new(
            ScriptedModel::new().then_reply("ok"),
            Duration::from_secs(5),
        );
        assert_eq!(bounded.complete("hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn bounded_data_times_out() {
        let slow = ScriptedData::returning(vec![]).with_delay(Duration::from_millis(500));
        let bounded = Bounded::new(slow, Duration::from_millis(20));

        let err = bounded.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, StoreError::QueryTimeout { .. }));
    }
}
