//! Fetch modes and remote list sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Official Tor Project bulk exit list.
pub const OFFICIAL_EXIT_LIST_URL: &str = "https://check.torproject.org/torbulkexitlist";

/// dan.me.uk list of all Tor nodes.
pub const DAN_FULL_LIST_URL: &str = "https://www.dan.me.uk/torlist/";

/// dan.me.uk list of Tor exit nodes.
pub const DAN_EXIT_LIST_URL: &str = "https://www.dan.me.uk/torlist/?exit";

/// Shortest polling interval the list providers tolerate.
///
/// dan.me.uk blocks clients that download more often than this.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// A named remote IP list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSource {
    pub name: String,
    pub url: String,
}

impl RemoteSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The official Tor Project exit list.
    pub fn official_exits() -> Self {
        Self::new("torproject-exits", OFFICIAL_EXIT_LIST_URL)
    }

    /// The dan.me.uk exit list.
    pub fn dan_exits() -> Self {
        Self::new("danmeuk-exits", DAN_EXIT_LIST_URL)
    }

    /// The dan.me.uk full node list.
    pub fn dan_all() -> Self {
        Self::new("danmeuk-all", DAN_FULL_LIST_URL)
    }
}

/// How the live set is populated.
///
/// Fixed for the lifetime of a checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMode {
    /// No list at all; every lookup is negative.
    Disabled,
    /// Download exit-node lists.
    #[default]
    #[serde(alias = "exit")]
    ExitNodesOnly,
    /// Download lists of all Tor nodes (relays included).
    #[serde(alias = "all")]
    AllNodes,
    /// Never download; periodically re-read the cache file.
    #[serde(alias = "cache")]
    CacheOnly,
}

impl FetchMode {
    /// Get the canonical name of this mode.
    pub fn name(&self) -> &'static str {
        match self {
            FetchMode::Disabled => "disabled",
            FetchMode::ExitNodesOnly => "exit-nodes-only",
            FetchMode::AllNodes => "all-nodes",
            FetchMode::CacheOnly => "cache-only",
        }
    }

    /// Whether this mode downloads from remote sources.
    pub fn uses_network(&self) -> bool {
        matches!(self, FetchMode::ExitNodesOnly | FetchMode::AllNodes)
    }

    /// Default remote sources for this mode.
    ///
    /// The official exit list is always included; the second source depends
    /// on whether relays should be covered too.
    pub fn sources(&self) -> Vec<RemoteSource> {
        match self {
            FetchMode::ExitNodesOnly => {
                vec![RemoteSource::official_exits(), RemoteSource::dan_exits()]
            }
            FetchMode::AllNodes => vec![RemoteSource::official_exits(), RemoteSource::dan_all()],
            FetchMode::Disabled | FetchMode::CacheOnly => Vec::new(),
        }
    }
}

impl FromStr for FetchMode {
    type Err = Error;

    /// Parse a mode name (case-insensitive, aliases accepted).
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(FetchMode::Disabled),
            "exit-nodes-only" | "exit_nodes_only" | "exit" => Ok(FetchMode::ExitNodesOnly),
            "all-nodes" | "all_nodes" | "all" => Ok(FetchMode::AllNodes),
            "cache-only" | "cache_only" | "cache" => Ok(FetchMode::CacheOnly),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
