//! Damselfly DHCPv6 Server
//!
//! This crate provides the DHCPv6 side of netboot provisioning over IPv6:
//! deterministic leases derived from the client's MAC address, plus
//! boot-file URLs selected for the client's current bootstrap stage.
//!
//! # Lease model
//!
//! The operator configures an IPv6 base address treated as a /72. A client's
//! lease is the first ten bytes of the base followed by the six bytes of its
//! MAC, so the same machine always receives the same address and no lease
//! state needs to survive a restart.
//!
//! # Boot stages
//!
//! Clients identify their stage through vendor and user classes:
//!
//! - `HTTPClient` vendor class: UEFI HTTP boot, offered a templated URL
//! - `PXEClient` vendor class alone: PXE firmware, pointed at iPXE over TFTP
//! - `PXEClient` plus `iPXE` user class: chainloaded iPXE, offered the
//!   templated URL to move on to HTTP boot
//!
//! # Example
//!
//! ```ignore
//! use damselfly_dhcp6::{BootUrlTemplate, Dhcp6Config, Dhcp6Server, DuidLl};
//!
//! let config = Dhcp6Config::new("fec0::".parse()?, DuidLl::new(iface_mac))
//!     .with_interface("eth0", iface_index)
//!     .with_boot_url_template(BootUrlTemplate::parse("http://boot/?mac={{ MAC }}")?);
//!
//! let server = Dhcp6Server::new(config);
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! server.run(shutdown_rx).await?;
//! ```

pub mod arch;
pub mod booturl;
pub mod config;
pub mod duid;
pub mod error;
pub mod packet;
pub mod server;

pub use arch::*;
pub use booturl::*;
pub use config::*;
pub use duid::*;
pub use error::*;
pub use packet::*;
pub use server::*;
