//! Store connection state.
//!
//! [`StoreLink`] starts unset and is set exactly once, by the reconnect loop
//! in [`connect_with_retry`]. Handlers read it on every request; while it is
//! unset they answer 503. Once set it is never cleared or re-checked.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::infrastructure::{ItemRepository, RepositoryError, RepositoryFuture};

/// Default delay between connection attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

// =============================================================================
// Store Connector
// =============================================================================

/// Opens a connection to the store and wraps it in a repository.
pub trait StoreConnector: Send + Sync {
    /// Makes a single connection attempt.
    fn connect(&self) -> RepositoryFuture<Arc<dyn ItemRepository + Send + Sync>>;
}

// =============================================================================
// Store Link
// =============================================================================

/// Holder for the process-wide store connection.
#[derive(Default)]
pub struct StoreLink {
    repository: OnceLock<Arc<dyn ItemRepository + Send + Sync>>,
}

impl StoreLink {
    /// Creates an unset link.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a link that is already established.
    #[must_use]
    pub fn connected(repository: Arc<dyn ItemRepository + Send + Sync>) -> Self {
        let link = Self::new();
        link.establish(repository);
        link
    }

    /// Sets the link. Returns `false` if it was already set, in which case
    /// `repository` is dropped.
    pub fn establish(&self, repository: Arc<dyn ItemRepository + Send + Sync>) -> bool {
        self.repository.set(repository).is_ok()
    }

    /// Returns true once the link has been established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.repository.get().is_some()
    }

    /// Returns the repository, or `RepositoryError::Unavailable` while the
    /// link is unset.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Unavailable` if no connection has been made yet.
    pub fn repository(&self) -> Result<Arc<dyn ItemRepository + Send + Sync>, RepositoryError> {
        self.repository
            .get()
            .cloned()
            .ok_or(RepositoryError::Unavailable)
    }
}

impl std::fmt::Debug for StoreLink {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("StoreLink")
            .field("connected", &self.is_connected())
            .finish()
    }
}

// =============================================================================
// Reconnect Loop
// =============================================================================

/// Connects `link` through `connector`, retrying after `retry_delay` on every
/// failure, without bound.
///
/// Returns the number of attempts it took. Returns immediately with 0 if the
/// link is already established.
pub async fn connect_with_retry(
    link: Arc<StoreLink>,
    connector: Arc<dyn StoreConnector + Send + Sync>,
    retry_delay: Duration,
) -> u32 {
    if link.is_connected() {
        return 0;
    }

    let mut attempts: u32 = 0;
    loop {
        attempts = attempts.saturating_add(1);
        match connector.connect().await {
            Ok(repository) => {
                link.establish(repository);
                tracing::info!(attempts, "Store connection established");
                return attempts;
            }
            Err(error) => {
                tracing::error!(
                    %error,
                    attempts,
                    retry_in_ms = u64::try_from(retry_delay.as_millis()).unwrap_or(u64::MAX),
                    "Failed to connect to store, retrying"
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

/// Spawns [`connect_with_retry`] on the current runtime.
pub fn spawn_connect_loop(
    link: Arc<StoreLink>,
    connector: Arc<dyn StoreConnector + Send + Sync>,
    retry_delay: Duration,
) -> JoinHandle<u32> {
    tokio::spawn(connect_with_retry(link, connector, retry_delay))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryItemRepository;
    use rstest::rstest;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Connector that fails a fixed number of times before succeeding.
    struct FlakyConnector {
        failures_left: AtomicU32,
        calls: Arc<AtomicU32>,
    }

    impl FlakyConnector {
        fn new(failures: u32) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let connector = Self {
                failures_left: AtomicU32::new(failures),
                calls: Arc::clone(&calls),
            };
            (connector, calls)
        }
    }

    impl StoreConnector for FlakyConnector {
        fn connect(&self) -> RepositoryFuture<Arc<dyn ItemRepository + Send + Sync>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok();
            Box::pin(async move {
                if fail {
                    Err(RepositoryError::ConnectionFailed("refused".to_string()))
                } else {
                    let repository: Arc<dyn ItemRepository + Send + Sync> =
                        Arc::new(InMemoryItemRepository::new());
                    Ok(repository)
                }
            })
        }
    }

    #[rstest]
    fn test_new_link_is_unavailable() {
        let link = StoreLink::new();

        assert!(!link.is_connected());
        assert_eq!(link.repository().err(), Some(RepositoryError::Unavailable));
    }

    #[rstest]
    fn test_establish_only_once() {
        let link = StoreLink::new();

        assert!(link.establish(Arc::new(InMemoryItemRepository::new())));
        assert!(!link.establish(Arc::new(InMemoryItemRepository::new())));
        assert!(link.is_connected());
        assert!(link.repository().is_ok());
    }

    #[rstest]
    fn test_debug_reports_connection_state() {
        let link = StoreLink::connected(Arc::new(InMemoryItemRepository::new()));

        assert_eq!(format!("{link:?}"), "StoreLink { connected: true }");
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_connect_with_retry_first_attempt() {
        let link = Arc::new(StoreLink::new());
        let (connector, calls) = FlakyConnector::new(0);

        let attempts =
            connect_with_retry(Arc::clone(&link), Arc::new(connector), DEFAULT_RETRY_DELAY).await;

        assert_eq!(attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(link.is_connected());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_connect_with_retry_retries_on_fixed_delay() {
        let link = Arc::new(StoreLink::new());
        let (connector, calls) = FlakyConnector::new(3);
        let started = tokio::time::Instant::now();

        let attempts =
            connect_with_retry(Arc::clone(&link), Arc::new(connector), DEFAULT_RETRY_DELAY).await;

        assert_eq!(attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(started.elapsed() >= DEFAULT_RETRY_DELAY * 3);
        assert!(started.elapsed() < DEFAULT_RETRY_DELAY * 4);
        assert!(link.is_connected());
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn test_link_stays_unavailable_until_connect_succeeds() {
        let link = Arc::new(StoreLink::new());
        let (connector, _calls) = FlakyConnector::new(2);

        let handle = spawn_connect_loop(
            Arc::clone(&link),
            Arc::new(connector),
            Duration::from_secs(5),
        );

        // Attempts run at t=0s, 5s and 10s; the first two fail.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!link.is_connected());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!link.is_connected());

        assert_eq!(handle.await.unwrap(), 3);
        assert!(link.is_connected());
    }

    #[rstest]
    #[tokio::test]
    async fn test_connect_with_retry_skips_established_link() {
        let link = Arc::new(StoreLink::connected(Arc::new(InMemoryItemRepository::new())));
        let (connector, calls) = FlakyConnector::new(0);

        let attempts =
            connect_with_retry(link, Arc::new(connector), DEFAULT_RETRY_DELAY).await;

        assert_eq!(attempts, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
