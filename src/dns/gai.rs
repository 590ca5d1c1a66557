//! System host resolver using getaddrinfo.
//!
//! Uses the operating system's native resolution via `getaddrinfo`,
//! executed in a thread pool to avoid blocking the async runtime. Respects
//! system DNS configuration (/etc/resolv.conf, hosts file, etc.).

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use std::{
    io,
    net::{SocketAddr, ToSocketAddrs},
};

/// System resolver wrapping `ToSocketAddrs` in `tokio::task::spawn_blocking`.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let host = name.as_str().to_string();
            let domain = host.clone();

            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<SocketAddr>>())
            })
            .await;

            // Handle task join error (cancellation, panic)
            let addrs = result
                .map_err(|e| {
                    tracing::error!(error = %e, "host resolution task failed");
                    NetError::NameNotResolved
                })?
                .map_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "host resolution failed");
                    NetError::dns_failed(domain.clone(), e)
                })?;

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned by getaddrinfo"),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "host resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
