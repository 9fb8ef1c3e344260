//! Shared application state.
//!
//! One [`AppState`] is created at startup and shared across handlers via
//! `Arc`. Besides the configuration it owns the shared HTTP client used for
//! Gemini REST calls and the WebSocket connection accounting used by the
//! connection-limit middleware.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;

use crate::config::ServerConfig;
use crate::core::text::TextClient;

/// Why a connection slot could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionLimitError {
    /// The global WebSocket connection cap is reached
    GlobalLimitReached,
    /// The per-IP connection cap is reached
    PerIpLimitReached,
}

/// Shared application state.
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Shared client for Gemini REST calls
    pub text_client: TextClient,
    /// Total live WebSocket sessions
    ws_connections: AtomicUsize,
    /// Live WebSocket sessions per client IP
    ip_connections: DashMap<IpAddr, usize>,
}

impl AppState {
    /// Create the shared state from a validated configuration.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let text_client = TextClient::new(&config);
        Arc::new(Self {
            config,
            text_client,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        })
    }

    /// Try to reserve a WebSocket connection slot for `ip`.
    ///
    /// On success the slot is held until [`release_connection`](Self::release_connection)
    /// is called; the connection-limit middleware acquires, the WebSocket
    /// handler releases on teardown.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        if let Some(max) = self.config.max_websocket_connections
            && self.ws_connections.load(Ordering::SeqCst) >= max
        {
            return Err(ConnectionLimitError::GlobalLimitReached);
        }

        {
            let mut per_ip = self.ip_connections.entry(ip).or_insert(0);
            if *per_ip >= self.config.max_connections_per_ip {
                return Err(ConnectionLimitError::PerIpLimitReached);
            }
            *per_ip += 1;
        }

        self.ws_connections.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Release a previously acquired connection slot for `ip`.
    pub fn release_connection(&self, ip: IpAddr) {
        if let Some(mut per_ip) = self.ip_connections.get_mut(&ip) {
            *per_ip = per_ip.saturating_sub(1);
            let empty = *per_ip == 0;
            drop(per_ip);
            if empty {
                self.ip_connections.remove_if(&ip, |_, count| *count == 0);
            }
        }
        // fetch_update instead of fetch_sub so a double release cannot wrap
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Number of live WebSocket sessions.
    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    /// Number of live WebSocket sessions for `ip`.
    pub fn ip_connection_count(&self, ip: &IpAddr) -> usize {
        self.ip_connections.get(ip).map(|c| *c).unwrap_or(0)
    }
}
