//! Error types for the DHCPv6 server.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Dhcp6Error {
    /// Failed to bind or configure the server socket
    #[error("failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Packet could not be decoded
    #[error("invalid DHCPv6 packet: {0}")]
    InvalidPacket(String),

    /// Message failed validation; dropped without a reply
    #[error("dropping message: {0}")]
    Drop(String),

    /// Boot-URL template failure
    #[error("boot URL template: {0}")]
    Template(#[from] minijinja::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for DHCPv6 operations.
pub type Result<T> = std::result::Result<T, Dhcp6Error>;
