//! Downloading and merging remote Tor lists.
//!
//! Every configured source is downloaded and parsed; the parsed addresses are
//! unioned into one set. If any single source fails, the whole cycle falls
//! back to the previous live set instead of publishing a partial union.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::source::RemoteSource;
use crate::IpSet;

/// Default timeout for one list download.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body accepted from a list source (16 MiB).
const MAX_BODY_SIZE: u64 = 16 * 1024 * 1024;

/// Capability to fetch the raw bytes behind a URL.
///
/// Any `Fn(&str) -> Result<Vec<u8>>` closure is a `Fetcher`, which keeps
/// tests off the network.
pub trait Fetcher: Send + Sync {
    /// Download `url`. Non-success statuses and transport failures are errors.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self(url)
    }
}

/// Blocking HTTP fetcher with an explicit request timeout.
///
/// Bodies larger than the size limit are rejected rather than truncated, so
/// a cut-off list can never be published.
pub struct HttpFetcher {
    agent: ureq::Agent,
    timeout: Duration,
    max_body_size: u64,
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(&format!("torlist/{}", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            timeout,
            max_body_size: MAX_BODY_SIZE,
        }
    }

    /// Set the largest accepted response body, in bytes.
    pub fn with_max_body_size(mut self, max_body_size: u64) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Get the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the largest accepted response body, in bytes.
    pub fn max_body_size(&self) -> u64 {
        self.max_body_size
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => Error::HttpStatus {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(t) => Error::Download(t.to_string()),
        })?;

        if response.status() != 200 {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_body_size.saturating_add(1))
            .read_to_end(&mut body)?;
        if body.len() as u64 > self.max_body_size {
            return Err(Error::Download(format!(
                "{}: response body exceeds {} bytes",
                url, self.max_body_size
            )));
        }
        Ok(body)
    }
}

/// Result of one fetch-and-merge cycle.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    /// The set to publish: the fresh union, or the previous set on fallback.
    pub set: Arc<IpSet>,
    /// Names of the sources that failed this cycle.
    pub failed: Vec<String>,
    /// Whether `set` is the previous set rather than fresh data.
    pub fallback: bool,
}

impl MergeOutcome {
    /// Whether the cycle produced fresh data.
    pub fn is_fresh(&self) -> bool {
        !self.fallback
    }
}

/// Download one source and parse its body.
pub fn fetch_source(fetcher: &dyn Fetcher, source: &RemoteSource) -> Result<IpSet> {
    let body = fetcher.fetch(&source.url)?;
    let set = IpSet::parse_bytes(&body);
    log::debug!(
        "Fetched {}: {} addresses ({} bytes)",
        source.name,
        set.len(),
        body.len()
    );
    Ok(set)
}

/// Download all sources and union them.
///
/// All-or-nothing: if any source fails (or none are configured) the outcome
/// carries `previous` unchanged.
pub fn fetch_and_merge(
    fetcher: &dyn Fetcher,
    sources: &[RemoteSource],
    previous: Arc<IpSet>,
) -> MergeOutcome {
    if sources.is_empty() {
        log::warn!("No remote sources configured, keeping previous list");
        return MergeOutcome {
            set: previous,
            failed: Vec::new(),
            fallback: true,
        };
    }

    let mut merged = IpSet::new();
    let mut failed = Vec::new();

    for source in sources {
        match fetch_source(fetcher, source) {
            Ok(set) => merged.extend(set),
            Err(e) => {
                log::warn!("Failed to fetch {} ({}): {}", source.name, source.url, e);
                failed.push(source.name.clone());
            }
        }
    }

    if failed.is_empty() {
        MergeOutcome {
            set: Arc::new(merged),
            failed,
            fallback: false,
        }
    } else {
        MergeOutcome {
            set: previous,
            failed,
            fallback: true,
        }
    }
}
