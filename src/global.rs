//! Process-wide checker and free-function API.
//!
//! For applications that want one Tor list per process without threading a
//! [`TorChecker`] through their code. Everything here delegates to a single
//! checker installed by [`init`].

use http::StatusCode;
use once_cell::sync::OnceCell;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::middleware::{block_tor_middleware as wrap_with, BlockTor, BlockTorHandler};
use crate::{Config, FetchMode, IpSet, Result, TorChecker};

/// Global checker
static GLOBAL_CHECKER: OnceCell<TorChecker> = OnceCell::new();

/// Guard built from the ban settings of the config passed to [`init_with_config`].
static GLOBAL_GUARD: OnceCell<BlockTor> = OnceCell::new();

/// Initialize the global checker.
///
/// An empty `cache_file` disables caching. Only the first call has an effect;
/// later calls are ignored with a warning.
pub fn init(mode: FetchMode, refresh_interval: Duration, cache_file: &str) -> Result<()> {
    let mut config = Config::new(mode).with_refresh_interval(refresh_interval);
    if !cache_file.is_empty() {
        config.cache_file = Some(PathBuf::from(cache_file));
    }
    init_with_config(&config)
}

/// Initialize the global checker from a full configuration.
pub fn init_with_config(config: &Config) -> Result<()> {
    if GLOBAL_CHECKER.get().is_some() {
        log::warn!("Global Tor checker already initialized, ignoring");
        return Ok(());
    }

    let checker = TorChecker::init(config)?;
    let guard = BlockTor::from_config(checker.clone(), config)?;
    if GLOBAL_CHECKER.set(checker).is_err() {
        log::warn!("Global Tor checker initialized concurrently, keeping the first");
        return Ok(());
    }
    let _ = GLOBAL_GUARD.set(guard);
    Ok(())
}

/// Check if the global checker is initialized.
pub fn is_initialized() -> bool {
    GLOBAL_CHECKER.get().is_some()
}

/// Get the global checker.
///
/// Before [`init`] this is an empty checker, so every lookup is negative.
pub fn checker() -> TorChecker {
    match GLOBAL_CHECKER.get() {
        Some(checker) => checker.clone(),
        None => TorChecker::from_set(IpSet::new()),
    }
}

/// Check if an address string is a known Tor node.
///
/// Returns `false` before [`init`] and for unparsable input.
pub fn is_tor(ip: &str) -> bool {
    GLOBAL_CHECKER
        .get()
        .map(|checker| checker.is_tor(ip))
        .unwrap_or(false)
}

/// Check a parsed address against the global list.
pub fn is_tor_ip(ip: Option<IpAddr>) -> bool {
    GLOBAL_CHECKER
        .get()
        .map(|checker| checker.is_tor_ip(ip))
        .unwrap_or(false)
}

/// Get the guard configured at [`init`].
///
/// Before [`init`] this blocks nothing and would answer `403` with an empty
/// body.
pub fn guard() -> BlockTor {
    match GLOBAL_GUARD.get() {
        Some(guard) => guard.clone(),
        None => BlockTor::new(checker(), StatusCode::FORBIDDEN, Vec::new()),
    }
}

/// Build a handler transform that blocks Tor callers using the global list
/// and the configured `ban_status` / `ban_payload`.
pub fn configured_middleware<H>() -> impl Fn(H) -> BlockTorHandler<H> {
    let guard = guard();
    move |inner| guard.wrap(inner)
}

/// Build a handler transform that blocks Tor callers using the global list.
///
/// The checker is captured when this is called, so call it after [`init`].
pub fn block_tor_middleware<H>(
    status: StatusCode,
    payload: impl Into<Vec<u8>>,
) -> impl Fn(H) -> BlockTorHandler<H> {
    wrap_with(checker(), status, payload)
}
