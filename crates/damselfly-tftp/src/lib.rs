//! Damselfly TFTP Server
//!
//! A read-only TFTP server (RFC 1350 with RFC 2347/2348/2349 option
//! negotiation) whose entire filesystem is one embedded payload: the iPXE
//! EFI binary. Every read request receives that binary regardless of the
//! requested filename; clients ask for MAC-scoped paths like
//! `04:42:1a:03:9b:20/ipxe.efi` purely so per-machine transfers can be told
//! apart in logs.
//!
//! # Example
//!
//! ```ignore
//! use damselfly_tftp::{TftpServer, TFTP_PORT};
//! use bytes::Bytes;
//!
//! let server = TftpServer::new(
//!     ([::0], TFTP_PORT).into(),
//!     Bytes::from_static(include_bytes!("ipxe.efi")),
//! );
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! server.run(shutdown_rx).await?;
//! ```

pub mod error;
pub mod packet;
pub mod server;

pub use error::*;
pub use packet::*;
pub use server::*;
