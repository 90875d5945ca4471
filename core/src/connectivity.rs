//! Network reachability checks run before a call is dispatched.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::ConnectivityError;

/// Answers "is the network reachable right now".
pub trait ConnectivityOracle: Send + Sync {
    fn is_available(&self) -> Result<bool, ConnectivityError>;
}

/// Reports the network as always reachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOnline;

impl ConnectivityOracle for AlwaysOnline {
    fn is_available(&self) -> Result<bool, ConnectivityError> {
        Ok(true)
    }
}

/// Considers the network reachable when a TCP connection to `target`
/// succeeds within `timeout`.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    target: String,
    timeout: Duration,
}

impl TcpProbe {
    /// `target` is a `host:port` pair.
    pub fn new(target: impl Into<String>, timeout: Duration) -> Self {
        Self {
            target: target.into(),
            timeout,
        }
    }
}

impl ConnectivityOracle for TcpProbe {
    fn is_available(&self) -> Result<bool, ConnectivityError> {
        let addrs: Vec<_> = self
            .target
            .to_socket_addrs()
            .map_err(|_| ConnectivityError::Unresolvable(self.target.clone()))?
            .collect();
        if addrs.is_empty() {
            return Err(ConnectivityError::Unresolvable(self.target.clone()));
        }
        Ok(addrs
            .iter()
            .any(|addr| TcpStream::connect_timeout(addr, self.timeout).is_ok()))
    }
}
