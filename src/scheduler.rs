//! Background refresh of the live set.
//!
//! A refresher runs in one of two loops for the rest of the process:
//! downloading the remote lists, or re-reading the cache file. There is no
//! stop signal; the thread ends with the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::fetch::{fetch_and_merge, Fetcher, MergeOutcome};
use crate::source::RemoteSource;
use crate::store::LiveStore;
use crate::{cache, Result};

/// Drives periodic updates of a [`LiveStore`].
///
/// The refresher is the only writer of its store.
#[derive(Clone)]
pub struct Refresher {
    store: Arc<LiveStore>,
    fetcher: Arc<dyn Fetcher>,
    sources: Vec<RemoteSource>,
    cache_file: Option<PathBuf>,
    interval: Duration,
}

impl Refresher {
    pub fn new(
        store: Arc<LiveStore>,
        fetcher: Arc<dyn Fetcher>,
        sources: Vec<RemoteSource>,
        cache_file: Option<PathBuf>,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            fetcher,
            sources,
            cache_file,
            interval,
        }
    }

    /// Get the refresh interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Get the cache file path, if caching is enabled.
    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    /// Run one network refresh cycle.
    ///
    /// On success the merged set replaces the live set and is written to the
    /// cache file. On any source failure the live set is left untouched.
    pub fn refresh_once(&self) -> MergeOutcome {
        let outcome = fetch_and_merge(self.fetcher.as_ref(), &self.sources, self.store.snapshot());

        if outcome.is_fresh() {
            self.store.replace(Arc::clone(&outcome.set));
            cache::write(&outcome.set, self.cache_file());
            cache::write_metadata(&outcome.set, self.cache_file());
            log::info!("Refreshed Tor list: {} addresses", outcome.set.len());
        } else {
            log::warn!(
                "Keeping previous Tor list ({} addresses), failed sources: {:?}",
                outcome.set.len(),
                outcome.failed
            );
        }

        outcome
    }

    /// Run one cache-only cycle.
    ///
    /// Returns `true` if the cache file was read and installed. A missing or
    /// unreadable file leaves the live set as it was.
    pub fn reload_cache_once(&self) -> bool {
        let (set, found) = cache::read(self.cache_file());
        if !found {
            log::warn!("Cache file {:?} unavailable, keeping previous list", self.cache_file);
            return false;
        }

        log::info!("Reloaded Tor list from cache: {} addresses", set.len());
        self.store.replace(set);
        true
    }

    /// Start the network refresh loop.
    ///
    /// With `fetch_immediately` one cycle runs on the calling thread before
    /// the background thread is started, so the store is seeded on return.
    pub fn spawn_network_loop(self, fetch_immediately: bool) -> Result<JoinHandle<()>> {
        if fetch_immediately {
            self.refresh_once();
        }

        let handle = thread::Builder::new()
            .name("torlist-refresh".to_string())
            .spawn(move || loop {
                thread::sleep(self.interval);
                self.refresh_once();
            })?;
        Ok(handle)
    }

    /// Start the cache re-read loop. Never touches the network.
    pub fn spawn_cache_loop(self) -> Result<JoinHandle<()>> {
        let handle = thread::Builder::new()
            .name("torlist-cache".to_string())
            .spawn(move || loop {
                thread::sleep(self.interval);
                self.reload_cache_once();
            })?;
        Ok(handle)
    }
}
