//! Live IP set with atomic replacement.

use arc_swap::ArcSwap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::IpSet;

/// The currently active set of Tor addresses.
///
/// Readers load the current `Arc<IpSet>` without locking; the refresher swaps
/// in a complete new set. A lookup running during a swap sees either the old
/// set or the new one, never a mix.
pub struct LiveStore {
    current: ArcSwap<IpSet>,
    /// Incremented on every replace.
    generation: AtomicU64,
}

impl LiveStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_set(IpSet::new())
    }

    /// Create a store seeded with a set.
    pub fn with_set(set: IpSet) -> Self {
        Self {
            current: ArcSwap::from_pointee(set),
            generation: AtomicU64::new(0),
        }
    }

    /// Atomically install a new set.
    pub fn replace(&self, set: impl Into<Arc<IpSet>>) {
        self.current.store(set.into());
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Check if an address string is in the current set.
    pub fn contains(&self, ip: &str) -> bool {
        self.current.load().contains(ip)
    }

    /// Check a parsed address; `None` is never a member.
    pub fn contains_ip(&self, ip: Option<IpAddr>) -> bool {
        match ip {
            Some(addr) => self.current.load().contains_ip(addr),
            None => false,
        }
    }

    /// Get the current set.
    ///
    /// The returned `Arc` stays valid but goes stale after the next replace.
    pub fn snapshot(&self) -> Arc<IpSet> {
        self.current.load_full()
    }

    /// Number of addresses in the current set.
    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    /// Check if the current set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the current generation (incremented on each replace).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

impl Default for LiveStore {
    fn default() -> Self {
        Self::new()
    }
}
