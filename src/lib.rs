//! torlist - A continuously refreshed list of Tor node IP addresses.
//!
//! This crate keeps an in-memory set of IPs believed to belong to the Tor
//! network and answers point lookups for access-control decisions.
//!
//! # Features
//!
//! - **Remote lists**: Downloads the official exit list and the dan.me.uk lists
//! - **All-or-nothing refresh**: A failing source keeps the previous list
//! - **Disk cache**: Survives restarts without hitting rate-limited sources
//! - **Cache-only mode**: Follow a file maintained by another process
//! - **Lock-free lookups**: Readers never wait on a refresh
//! - **Middleware**: Reject Tor callers in front of any `http` handler
//!
//! # Quick Start
//!
//! ```ignore
//! use torlist::{Config, FetchMode, TorChecker};
//! use std::time::Duration;
//!
//! let config = Config::new(FetchMode::ExitNodesOnly)
//!     .with_refresh_interval(Duration::from_secs(3600))
//!     .with_cache_file("/var/cache/torlist/tor.txt");
//!
//! // Loads the cache or downloads, then refreshes in the background
//! let checker = TorChecker::init(&config)?;
//!
//! assert!(!checker.is_tor("127.0.0.1"));
//! ```
//!
//! # Fetch Modes
//!
//! - **disabled**: No list; every lookup is negative
//! - **exit-nodes-only**: Exit relays only
//! - **all-nodes**: Every Tor relay
//! - **cache-only**: Re-read the cache file, never touch the network
//!
//! # Failure Behavior
//!
//! Lookups never fail. Until a list has loaded, or while every refresh
//! fails, addresses are reported as not Tor (fail open). The remote
//! providers ask not to be polled more often than every 30 minutes.

mod checker;
mod config;
mod error;
mod ip_set;
mod metadata;

pub mod cache;
pub mod fetch;
pub mod global;
pub mod middleware;
pub mod scheduler;
pub mod source;
pub mod store;

// Re-export core types
pub use checker::TorChecker;
pub use config::Config;
pub use error::{Error, Result};
pub use ip_set::IpSet;

// Re-export building blocks
pub use fetch::{fetch_and_merge, Fetcher, HttpFetcher, MergeOutcome};
pub use scheduler::Refresher;
pub use source::{FetchMode, RemoteSource};
pub use store::LiveStore;

// Re-export middleware
pub use middleware::{block_tor_middleware, BlockTor, BlockTorHandler, RemoteAddr};

// Re-export metadata
pub use metadata::UpdateMetadata;
