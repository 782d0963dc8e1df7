//! Mock cache handler for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::handler::{CacheHandler, HandlerCapabilities, HandlerError, SeasonPackHint};

/// A recorded season-pack inspection for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPackCheck {
    pub hashes: Vec<String>,
    pub season: u32,
    pub episode: u32,
}

/// Mock implementation of the CacheHandler trait.
///
/// Provides controllable behavior for testing:
/// - Configure which hashes the batch and live checks report as cached
/// - Configure which season packs are confirmed, with optional hints
/// - Track every call for assertions
/// - Simulate failures, slow calls and external aborts
///
/// # Example
///
/// ```rust,ignore
/// use cachepick_core::testing::MockCacheHandler;
///
/// let handler = MockCacheHandler::new()
///     .with_cached(&["abc123"])
///     .with_live(&["def456"]);
///
/// let results = resolve_cached_releases(candidates, &handler, None, None).await;
///
/// assert_eq!(handler.batch_checks().await.len(), 1);
/// assert_eq!(handler.cleanup_count(), 1);
/// ```
#[derive(Debug)]
pub struct MockCacheHandler {
    identifier: String,
    capabilities: HandlerCapabilities,
    bypass: bool,
    /// Hashes reported by the batch check.
    cached: HashSet<String>,
    /// Hashes reported by the live check.
    live: HashSet<String>,
    /// Confirmed season packs.
    packs: HashMap<String, Option<SeasonPackHint>>,
    /// Every batch check fails.
    failing_batch: bool,
    /// Echo hashes back upper-cased.
    uppercase: bool,
    /// Simulated latency for every call.
    delay: Option<Duration>,
    /// Report aborted once this many calls were made.
    abort_after: Option<usize>,
    /// If set, the next call (any method) fails with this error.
    next_error: Arc<RwLock<Option<HandlerError>>>,
    batch_checks: Arc<RwLock<Vec<Vec<String>>>>,
    live_checks: Arc<RwLock<Vec<String>>>,
    pack_checks: Arc<RwLock<Vec<RecordedPackCheck>>>,
    calls: AtomicUsize,
    cleanups: AtomicUsize,
}

impl Default for MockCacheHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCacheHandler {
    /// Create a handler that supports only the batch check and caches nothing.
    pub fn new() -> Self {
        Self {
            identifier: "mock-cache".to_string(),
            capabilities: HandlerCapabilities::default(),
            bypass: false,
            cached: HashSet::new(),
            live: HashSet::new(),
            packs: HashMap::new(),
            failing_batch: false,
            uppercase: false,
            delay: None,
            abort_after: None,
            next_error: Arc::new(RwLock::new(None)),
            batch_checks: Arc::new(RwLock::new(Vec::new())),
            live_checks: Arc::new(RwLock::new(Vec::new())),
            pack_checks: Arc::new(RwLock::new(Vec::new())),
            calls: AtomicUsize::new(0),
            cleanups: AtomicUsize::new(0),
        }
    }

    /// Hashes the batch check reports as cached.
    pub fn with_cached(mut self, hashes: &[&str]) -> Self {
        self.cached.extend(hashes.iter().map(|h| h.to_string()));
        self
    }

    /// Hashes the live check reports as cached. Enables live checks.
    pub fn with_live(mut self, hashes: &[&str]) -> Self {
        self.live.extend(hashes.iter().map(|h| h.to_string()));
        self.capabilities.live_check = true;
        self
    }

    /// Confirm a season pack. Enables season-pack inspection.
    pub fn with_pack(mut self, hash: &str, hint: Option<SeasonPackHint>) -> Self {
        self.packs.insert(hash.to_string(), hint);
        self.capabilities.season_packs = true;
        self
    }

    /// Override the advertised capabilities.
    pub fn with_capabilities(mut self, capabilities: HandlerCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_bypass(mut self) -> Self {
        self.bypass = true;
        self
    }

    pub fn with_identifier(mut self, identifier: &str) -> Self {
        self.identifier = identifier.to_string();
        self
    }

    /// Make every batch check fail.
    pub fn with_failing_batch(mut self) -> Self {
        self.failing_batch = true;
        self
    }

    /// Return hashes upper-cased from the batch and season-pack checks.
    pub fn with_uppercase_responses(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report an external abort once `calls` handler calls were made.
    pub fn with_abort_after(mut self, calls: usize) -> Self {
        self.abort_after = Some(calls);
        self
    }

    /// Make the next call fail with the given error.
    pub async fn set_next_error(&self, error: HandlerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    /// Hash lists passed to each batch check.
    pub async fn batch_checks(&self) -> Vec<Vec<String>> {
        self.batch_checks.read().await.clone()
    }

    /// Hashes passed to live checks, in call order.
    pub async fn live_checked(&self) -> Vec<String> {
        self.live_checks.read().await.clone()
    }

    pub async fn pack_checks(&self) -> Vec<RecordedPackCheck> {
        self.pack_checks.read().await.clone()
    }

    /// Probe calls made so far (batch, live and pack checks).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }

    fn echo(&self, hash: &str) -> String {
        if self.uppercase {
            hash.to_uppercase()
        } else {
            hash.to_string()
        }
    }

    async fn begin_call(&self) -> Result<(), HandlerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.next_error.write().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CacheHandler for MockCacheHandler {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn capabilities(&self) -> HandlerCapabilities {
        self.capabilities
    }

    fn bypass_quotas(&self) -> bool {
        self.bypass
    }

    fn is_aborted(&self) -> bool {
        self.abort_after
            .is_some_and(|limit| self.call_count() >= limit)
    }

    async fn check_cached_hashes(
        &self,
        hashes: &[String],
    ) -> Result<HashSet<String>, HandlerError> {
        self.batch_checks.write().await.push(hashes.to_vec());
        self.begin_call().await?;
        if self.failing_batch {
            return Err(HandlerError::Unavailable("mock batch check failure".into()));
        }
        Ok(hashes
            .iter()
            .filter(|h| self.cached.contains(*h))
            .map(|h| self.echo(h))
            .collect())
    }

    async fn live_check_hash(&self, hash: &str) -> Result<bool, HandlerError> {
        self.live_checks.write().await.push(hash.to_string());
        self.begin_call().await?;
        Ok(self.live.contains(hash))
    }

    async fn batch_check_season_packs(
        &self,
        hashes: &[String],
        season: u32,
        episode: u32,
    ) -> Result<HashMap<String, Option<SeasonPackHint>>, HandlerError> {
        self.pack_checks.write().await.push(RecordedPackCheck {
            hashes: hashes.to_vec(),
            season,
            episode,
        });
        self.begin_call().await?;
        Ok(hashes
            .iter()
            .filter_map(|h| self.packs.get(h).map(|hint| (self.echo(h), hint.clone())))
            .collect())
    }

    async fn cleanup(&self) -> Result<(), HandlerError> {
        self.cleanups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batch_check_reports_configured_hashes() {
        let handler = MockCacheHandler::new().with_cached(&["a", "c"]);
        let cached = handler
            .check_cached_hashes(&["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        assert_eq!(cached, HashSet::from(["a".to_string()]));
        assert_eq!(handler.batch_checks().await, vec![vec!["a", "b"]]);
        assert_eq!(handler.call_count(), 1);
    }

    #[tokio::test]
    async fn test_capabilities_follow_configuration() {
        let handler = MockCacheHandler::new();
        assert_eq!(handler.capabilities(), HandlerCapabilities::default());

        let handler = MockCacheHandler::new().with_live(&["a"]).with_pack("p", None);
        assert!(handler.capabilities().live_check);
        assert!(handler.capabilities().season_packs);
        assert!(handler.live_check_hash("a").await.unwrap());
        assert!(!handler.live_check_hash("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_next_error_is_consumed_once() {
        let handler = MockCacheHandler::new().with_live(&["a"]);
        handler.set_next_error(HandlerError::Timeout).await;

        assert!(matches!(
            handler.live_check_hash("a").await,
            Err(HandlerError::Timeout)
        ));
        assert!(handler.live_check_hash("a").await.unwrap());
        assert_eq!(handler.live_checked().await, vec!["a", "a"]);
    }

    #[tokio::test]
    async fn test_abort_after_calls() {
        let handler = MockCacheHandler::new().with_live(&[]).with_abort_after(1);
        assert!(!handler.is_aborted());
        let _ = handler.live_check_hash("x").await;
        assert!(handler.is_aborted());
    }

    #[test]
    fn test_cleanup_counter() {
        let handler = MockCacheHandler::new();
        tokio_test::block_on(handler.cleanup()).unwrap();
        assert_eq!(handler.cleanup_count(), 1);
    }
}
