use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use rootline_common::{AgentError, Config, Discovery};

pub mod dbpedia;
pub mod wikidata;
pub mod wikipedia;

pub use dbpedia::DbpediaAdapter;
pub use wikidata::WikidataAdapter;
pub use wikipedia::WikipediaAdapter;

// --- SourceAdapter trait ---

/// One knowledge source. Adapters resolve a person by name (or by an
/// already-known external id) and return whatever parent/child evidence
/// the source has, or None when the source has nothing usable.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(
        &self,
        name: &str,
        external_id: Option<&str>,
    ) -> Result<Option<Discovery>, AgentError>;
    fn name(&self) -> &str;
}

/// Shared HTTP client for all adapters. One client, keep-alive reuse.
pub fn build_client(config: &Config) -> Result<reqwest::Client, AgentError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .user_agent(config.user_agent.clone())
        .build()?)
}

/// Handle a 429 from a source: sleep out the cooldown and tell the caller
/// to give up on this cycle. No inline retry, the queue will come back.
pub(crate) async fn rate_limited(source: &str, status: reqwest::StatusCode, cooldown: Duration) -> bool {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        warn!(source, cooldown_secs = cooldown.as_secs(), "Rate limited, backing off");
        tokio::time::sleep(cooldown).await;
        return true;
    }
    false
}

/// Pull `"value"` out of a SPARQL binding cell.
pub(crate) fn binding_str<'a>(row: &'a serde_json::Value, var: &str) -> Option<&'a str> {
    row.get(var)?.get("value")?.as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn too_many_requests_waits_out_the_cooldown() {
        let start = tokio::time::Instant::now();
        let limited = rate_limited(
            "wikidata",
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            Duration::from_secs(90),
        )
        .await;
        assert!(limited);
        assert_eq!(start.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn other_statuses_pass_through_without_delay() {
        let start = tokio::time::Instant::now();
        for status in [
            reqwest::StatusCode::OK,
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
        ] {
            assert!(!rate_limited("dbpedia", status, Duration::from_secs(90)).await);
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
