//! Request blocking for Tor clients.
//!
//! Framework-agnostic: a handler is any `Fn(Request<B>) -> Response<R>` over
//! the `http` crate types. The server integration puts the peer endpoint
//! into the request extensions as a [`RemoteAddr`] (or a plain
//! [`SocketAddr`]) before calling the wrapped handler.

use http::{Request, Response, StatusCode};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::{Config, TorChecker};

/// Transport-level peer address in `host:port` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

impl RemoteAddr {
    /// Parse the host part as an IP address, dropping the port.
    ///
    /// Accepts `1.2.3.4:80` and `[2001:db8::1]:443`. A bare address without
    /// a port is accepted too.
    pub fn ip(&self) -> Option<IpAddr> {
        let addr = self.0.trim();
        if let Ok(socket) = addr.parse::<SocketAddr>() {
            return Some(socket.ip());
        }
        addr.trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .ok()
    }
}

impl From<SocketAddr> for RemoteAddr {
    fn from(addr: SocketAddr) -> Self {
        RemoteAddr(addr.to_string())
    }
}

/// Extract the caller's IP from the request extensions.
///
/// IPv4 clients of a dual-stack listener show up as IPv4-mapped IPv6
/// addresses; those are reduced to plain IPv4.
pub fn remote_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    let ip = match req.extensions().get::<RemoteAddr>() {
        Some(remote) => remote.ip(),
        None => req.extensions().get::<SocketAddr>().map(SocketAddr::ip),
    };
    ip.map(|ip| ip.to_canonical())
}

/// Rejects requests from Tor addresses with a fixed status and body.
#[derive(Clone)]
pub struct BlockTor {
    checker: TorChecker,
    status: StatusCode,
    payload: Arc<[u8]>,
}

impl BlockTor {
    pub fn new(checker: TorChecker, status: StatusCode, payload: impl Into<Vec<u8>>) -> Self {
        let payload: Vec<u8> = payload.into();
        Self {
            checker,
            status,
            payload: Arc::from(payload),
        }
    }

    /// Build a guard with the ban status and payload from `config`.
    pub fn from_config(checker: TorChecker, config: &Config) -> Result<Self> {
        let status = StatusCode::from_u16(config.ban_status)
            .map_err(|_| Error::Config(format!("invalid ban_status: {}", config.ban_status)))?;
        Ok(Self::new(checker, status, config.ban_payload.as_bytes()))
    }

    /// Get the ban status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the request comes from a known Tor address.
    pub fn is_blocked<B>(&self, req: &Request<B>) -> bool {
        self.checker.is_tor_ip(remote_ip(req))
    }

    /// Build the rejection response.
    pub fn ban_response<R: From<Vec<u8>>>(&self) -> Response<R> {
        let mut response = Response::new(R::from(self.payload.to_vec()));
        *response.status_mut() = self.status;
        response
    }

    /// Wrap a handler.
    pub fn wrap<H>(&self, inner: H) -> BlockTorHandler<H> {
        BlockTorHandler {
            inner,
            guard: self.clone(),
        }
    }
}

/// A handler guarded by [`BlockTor`].
#[derive(Clone)]
pub struct BlockTorHandler<H> {
    inner: H,
    guard: BlockTor,
}

impl<H> BlockTorHandler<H> {
    /// Handle a request: Tor callers get the ban response and the inner
    /// handler is not invoked.
    pub fn call<B, R>(&self, req: Request<B>) -> Response<R>
    where
        H: Fn(Request<B>) -> Response<R>,
        R: From<Vec<u8>>,
    {
        if self.guard.is_blocked(&req) {
            log::debug!("Blocked request from Tor address {:?}", remote_ip(&req));
            return self.guard.ban_response();
        }
        (self.inner)(req)
    }

    /// Get the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

/// Build a handler transform that blocks Tor callers.
///
/// # Example
///
/// ```
/// use http::{Request, Response, StatusCode};
/// use torlist::middleware::{block_tor_middleware, RemoteAddr};
/// use torlist::{IpSet, TorChecker};
///
/// let checker = TorChecker::from_set(IpSet::parse("1.2.3.4"));
/// let wrap = block_tor_middleware(checker, StatusCode::FORBIDDEN, "blocked");
/// let handler = wrap(|_req: Request<()>| Response::new(b"hello".to_vec()));
///
/// let mut req = Request::new(());
/// req.extensions_mut().insert(RemoteAddr("1.2.3.4:5555".to_string()));
/// let resp: Response<Vec<u8>> = handler.call(req);
/// assert_eq!(resp.status(), StatusCode::FORBIDDEN);
/// assert_eq!(resp.body(), b"blocked");
/// ```
pub fn block_tor_middleware<H>(
    checker: TorChecker,
    status: StatusCode,
    payload: impl Into<Vec<u8>>,
) -> impl Fn(H) -> BlockTorHandler<H> {
    let guard = BlockTor::new(checker, status, payload);
    move |inner| guard.wrap(inner)
}
