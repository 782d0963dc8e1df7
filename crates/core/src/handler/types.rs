use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Location of the requested episode inside a confirmed season pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonPackHint {
    /// Index of the file inside the archive, if the service numbers files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_index: Option<u32>,
    /// Service-side file identifier, if it uses opaque ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    pub file_path: String,
    pub file_bytes: u64,
}

/// Optional operations a handler supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerCapabilities {
    /// `live_check_hash` is implemented.
    pub live_check: bool,
    /// `batch_check_season_packs` is implemented.
    pub season_packs: bool,
}

impl HandlerCapabilities {
    pub fn full() -> Self {
        Self {
            live_check: true,
            season_packs: true,
        }
    }
}

/// Errors a cache handler can report.
///
/// None of these abort a run; the resolver logs them and treats the probe
/// as a miss.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Cache service unavailable: {0}")]
    Unavailable(String),

    #[error("Rate limited by cache service, retry in {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Request timeout")]
    Timeout,

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::Unavailable(_) => "unavailable",
            HandlerError::RateLimited { .. } => "rate_limited",
            HandlerError::Timeout => "timeout",
            HandlerError::Unsupported(_) => "unsupported",
            HandlerError::Other(_) => "other",
        }
    }
}

/// The cache oracle: a debrid-style service that can tell whether a torrent
/// is already available for instant download.
///
/// Only [`check_cached_hashes`](CacheHandler::check_cached_hashes) is
/// required. Optional operations must be advertised through
/// [`capabilities`](CacheHandler::capabilities); the resolver never calls an
/// operation the handler does not advertise.
#[async_trait]
pub trait CacheHandler: Send + Sync {
    /// Label used to correlate log lines.
    fn identifier(&self) -> &str {
        "cache"
    }

    fn capabilities(&self) -> HandlerCapabilities {
        HandlerCapabilities::default()
    }

    /// Disable quota, cap and early-exit enforcement for this handler.
    fn bypass_quotas(&self) -> bool {
        false
    }

    /// Polled between probes; `true` stops the run like a cancellation.
    fn is_aborted(&self) -> bool {
        false
    }

    /// Batched existence check. Returns the subset of `hashes` that is cached.
    async fn check_cached_hashes(&self, hashes: &[String])
        -> Result<HashSet<String>, HandlerError>;

    /// Single-item check.
    async fn live_check_hash(&self, _hash: &str) -> Result<bool, HandlerError> {
        Err(HandlerError::Unsupported("live_check_hash"))
    }

    /// Inspect season packs for the requested episode.
    ///
    /// Returns an entry for every pack confirmed to contain the episode,
    /// with a file hint when the service can locate it.
    async fn batch_check_season_packs(
        &self,
        _hashes: &[String],
        _season: u32,
        _episode: u32,
    ) -> Result<HashMap<String, Option<SeasonPackHint>>, HandlerError> {
        Err(HandlerError::Unsupported("batch_check_season_packs"))
    }

    /// Called exactly once when a run ends.
    async fn cleanup(&self) -> Result<(), HandlerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BatchOnly;

    #[async_trait]
    impl CacheHandler for BatchOnly {
        async fn check_cached_hashes(
            &self,
            hashes: &[String],
        ) -> Result<HashSet<String>, HandlerError> {
            Ok(hashes.iter().take(1).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_default_methods() {
        let handler = BatchOnly;
        assert_eq!(handler.identifier(), "cache");
        assert_eq!(handler.capabilities(), HandlerCapabilities::default());
        assert!(!handler.bypass_quotas());
        assert!(!handler.is_aborted());
        assert!(handler.cleanup().await.is_ok());

        let err = handler.live_check_hash("abc").await.unwrap_err();
        assert!(matches!(err, HandlerError::Unsupported("live_check_hash")));
        let err = handler
            .batch_check_season_packs(&["abc".to_string()], 1, 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported");
    }

    #[tokio::test]
    async fn test_required_method() {
        let cached = BatchOnly
            .check_cached_hashes(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(cached.len(), 1);
        assert!(cached.contains("a"));
    }

    #[test]
    fn test_error_display() {
        let err = HandlerError::RateLimited {
            retry_after_ms: 500,
        };
        assert_eq!(
            err.to_string(),
            "Rate limited by cache service, retry in 500ms"
        );
        let err: HandlerError = anyhow::anyhow!("socket closed").into();
        assert_eq!(err.to_string(), "socket closed");
        assert_eq!(err.kind(), "other");
    }

    #[test]
    fn test_hint_serde_skips_missing_ids() {
        let hint = SeasonPackHint {
            file_index: Some(4),
            file_id: None,
            file_path: "Show/S02E05.mkv".to_string(),
            file_bytes: 1_000,
        };
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["file_index"], 4);
        assert!(json.get("file_id").is_none());
    }
}
