//! Error types for the TFTP server.

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TftpError {
    /// Failed to bind the listening socket
    #[error("failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Packet could not be decoded
    #[error("invalid TFTP packet: {0}")]
    InvalidPacket(String),

    /// Transfer timed out waiting for the client
    #[error("transfer timed out for {filename}")]
    Timeout { filename: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for TFTP operations.
pub type Result<T> = std::result::Result<T, TftpError>;
