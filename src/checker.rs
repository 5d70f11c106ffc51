//! Tor membership checks wired up per fetch mode.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use crate::fetch::{Fetcher, HttpFetcher};
use crate::scheduler::Refresher;
use crate::source::FetchMode;
use crate::store::LiveStore;
use crate::{cache, Config, IpSet, Result};

/// Answers "is this IP a Tor node?" against a continuously refreshed list.
///
/// Cloning is cheap; clones share the same live set.
///
/// A checker whose list never loaded, or whose refreshes keep failing, reports
/// every address as not Tor. To fail closed, test [`TorChecker::len`] for
/// zero.
///
/// # Example
///
/// ```ignore
/// use torlist::{Config, FetchMode, TorChecker};
///
/// let config = Config::new(FetchMode::ExitNodesOnly).with_cache_file("/var/cache/tor.txt");
/// let checker = TorChecker::init(&config)?;
///
/// if checker.is_tor("185.220.101.1") {
///     println!("Tor exit");
/// }
/// ```
#[derive(Clone)]
pub struct TorChecker {
    store: Arc<LiveStore>,
    mode: FetchMode,
    cache_file: Option<PathBuf>,
}

impl TorChecker {
    /// Initialize with the HTTP fetcher.
    ///
    /// Returns once the initial seeding (cache read or first download) is
    /// done; later refreshes run on a background thread.
    pub fn init(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::with_timeout(config.request_timeout()));
        Self::init_with_fetcher(config, fetcher)
    }

    /// Initialize with a custom fetcher.
    pub fn init_with_fetcher(config: &Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        config.validate()?;

        let cache_file = config.cache_path().map(|p| p.to_path_buf());
        let store = Arc::new(LiveStore::new());
        let checker = Self {
            store: Arc::clone(&store),
            mode: config.mode,
            cache_file: cache_file.clone(),
        };

        let refresher = Refresher::new(
            store,
            fetcher,
            config.effective_sources(),
            cache_file,
            config.refresh_interval(),
        );

        match config.mode {
            FetchMode::Disabled => {
                log::info!("Tor list disabled");
            }
            FetchMode::ExitNodesOnly | FetchMode::AllNodes => {
                let warm = checker.seed_from_cache();
                if warm {
                    log::info!("Seeded Tor list from cache, skipping startup download");
                }
                refresher.spawn_network_loop(!warm)?;
            }
            FetchMode::CacheOnly => {
                checker.seed_from_cache();
                if checker.cache_file.is_some() {
                    refresher.spawn_cache_loop()?;
                } else {
                    log::warn!("Cache-only mode without a cache file; the Tor list stays empty");
                }
            }
        }

        Ok(checker)
    }

    /// Create a checker over an existing store, with no refresh running.
    ///
    /// The caller owns updates to `store`.
    pub fn from_store(store: Arc<LiveStore>, mode: FetchMode) -> Self {
        Self {
            store,
            mode,
            cache_file: None,
        }
    }

    /// Create a checker over a fixed set.
    pub fn from_set(set: IpSet) -> Self {
        Self::from_store(Arc::new(LiveStore::with_set(set)), FetchMode::Disabled)
    }

    fn seed_from_cache(&self) -> bool {
        let (set, found) = cache::read(self.cache_file.as_deref());
        if found {
            self.store.replace(set);
        }
        found
    }

    /// Check if an address string is a known Tor node.
    ///
    /// Unparsable input is never Tor.
    pub fn is_tor(&self, ip: &str) -> bool {
        self.store.contains(ip)
    }

    /// Check a parsed address; `None` is never Tor.
    pub fn is_tor_ip(&self, ip: Option<IpAddr>) -> bool {
        self.store.contains_ip(ip)
    }

    /// Get the fetch mode.
    pub fn mode(&self) -> FetchMode {
        self.mode
    }

    /// Number of addresses in the live set.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Check if the live set is empty.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get the underlying store.
    pub fn store(&self) -> &Arc<LiveStore> {
        &self.store
    }

    /// Time of the last successful download recorded next to the cache file.
    pub fn last_updated(&self) -> Option<SystemTime> {
        cache::read_metadata(self.cache_file.as_deref()).and_then(|m| m.last_updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    fn counting_fetcher(body: &'static str) -> (Arc<dyn Fetcher>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher: Arc<dyn Fetcher> = Arc::new(move |_: &str| -> Result<Vec<u8>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(body.as_bytes().to_vec())
        });
        (fetcher, calls)
    }

    #[test]
    fn test_disabled_mode() {
        let (fetcher, calls) = counting_fetcher("1.2.3.4");
        let checker =
            TorChecker::init_with_fetcher(&Config::new(FetchMode::Disabled), fetcher).unwrap();

        assert_eq!(checker.mode(), FetchMode::Disabled);
        assert!(!checker.is_tor("1.2.3.4"));
        assert!(checker.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_network_mode_fetches_without_cache() {
        let (fetcher, calls) = counting_fetcher("1.2.3.4\n5.6.7.8\n");
        let config =
            Config::new(FetchMode::ExitNodesOnly).with_refresh_interval(Duration::from_secs(3600));
        let checker = TorChecker::init_with_fetcher(&config, fetcher).unwrap();

        // One call per default source.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(checker.is_tor("1.2.3.4"));
        assert!(checker.is_tor("5.6.7.8"));
        assert!(!checker.is_tor("8.8.8.8"));
    }

    #[test]
    fn test_network_mode_warm_cache_skips_fetch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        fs::write(&path, "10.0.0.1\n").unwrap();

        let (fetcher, calls) = counting_fetcher("1.2.3.4");
        let config = Config::new(FetchMode::AllNodes)
            .with_refresh_interval(Duration::from_secs(3600))
            .with_cache_file(&path);
        let checker = TorChecker::init_with_fetcher(&config, fetcher).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(checker.is_tor("10.0.0.1"));
        assert!(!checker.is_tor("1.2.3.4"));
    }

    #[test]
    fn test_network_mode_writes_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");

        let (fetcher, _) = counting_fetcher("1.2.3.4");
        let config = Config::new(FetchMode::ExitNodesOnly)
            .with_refresh_interval(Duration::from_secs(3600))
            .with_cache_file(&path);
        let checker = TorChecker::init_with_fetcher(&config, fetcher).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "1.2.3.4\n");
        assert!(checker.last_updated().is_some());
    }

    #[test]
    fn test_network_mode_failed_startup_is_empty() {
        let fetcher: Arc<dyn Fetcher> =
            Arc::new(|_: &str| -> Result<Vec<u8>> { Err(Error::Download("offline".into())) });
        let config =
            Config::new(FetchMode::ExitNodesOnly).with_refresh_interval(Duration::from_secs(3600));
        let checker = TorChecker::init_with_fetcher(&config, fetcher).unwrap();

        assert!(checker.is_empty());
        assert!(!checker.is_tor("1.2.3.4"));
    }

    #[test]
    fn test_cache_only_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        fs::write(&path, "10.0.0.1\n10.0.0.2\n").unwrap();

        let (fetcher, calls) = counting_fetcher("1.2.3.4");
        let config = Config::new(FetchMode::CacheOnly)
            .with_refresh_interval(Duration::from_secs(3600))
            .with_cache_file(&path);
        let checker = TorChecker::init_with_fetcher(&config, fetcher).unwrap();

        assert!(checker.is_tor("10.0.0.1"));
        assert!(!checker.is_tor("192.168.1.1"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cache_only_without_path() {
        let (fetcher, calls) = counting_fetcher("1.2.3.4");
        let checker =
            TorChecker::init_with_fetcher(&Config::new(FetchMode::CacheOnly), fetcher).unwrap();

        assert!(checker.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (fetcher, _) = counting_fetcher("");
        let config = Config::new(FetchMode::ExitNodesOnly).with_refresh_interval(Duration::ZERO);
        assert!(TorChecker::init_with_fetcher(&config, fetcher).is_err());
    }

    #[test]
    fn test_is_tor_ip() {
        let checker = TorChecker::from_set(IpSet::parse("1.2.3.4"));
        assert!(checker.is_tor_ip(Some("1.2.3.4".parse().unwrap())));
        assert!(!checker.is_tor_ip(Some("4.3.2.1".parse().unwrap())));
        assert!(!checker.is_tor_ip(None));
        assert!(!checker.is_tor("not an ip"));
    }

    #[test]
    fn test_clones_share_store() {
        let checker = TorChecker::from_set(IpSet::new());
        let clone = checker.clone();
        checker.store().replace(IpSet::parse("1.2.3.4"));
        assert!(clone.is_tor("1.2.3.4"));
    }
}
