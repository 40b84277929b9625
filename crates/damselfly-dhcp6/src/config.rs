//! DHCPv6 server configuration.

use crate::booturl::BootUrlTemplate;
use crate::duid::DuidLl;
use std::net::Ipv6Addr;

/// DHCPv6 server configuration.
pub struct Dhcp6Config {
    /// IPv6 base address leases are carved from, interpreted as a /72: the
    /// final 48 bits of every lease come from the client's MAC.
    pub base_address: Ipv6Addr,

    /// Name of the serving interface, for log lines.
    pub interface: String,

    /// Interface index used for the server multicast group join.
    pub interface_index: u32,

    /// Our server identifier, derived from the serving interface's MAC.
    pub server_duid: DuidLl,

    /// Template for UEFI HTTP boot URLs. None disables boot-file offers
    /// entirely.
    pub boot_url_template: Option<BootUrlTemplate>,
}

impl Dhcp6Config {
    pub fn new(base_address: Ipv6Addr, server_duid: DuidLl) -> Self {
        Self {
            base_address,
            interface: String::new(),
            interface_index: 0,
            server_duid,
            boot_url_template: None,
        }
    }

    /// Set the serving interface (index 0 lets the kernel pick).
    pub fn with_interface(mut self, name: impl Into<String>, index: u32) -> Self {
        self.interface = name.into();
        self.interface_index = index;
        self
    }

    /// Enable boot-file URL offers for HTTP boot and chainloaded iPXE
    /// clients.
    pub fn with_boot_url_template(mut self, template: BootUrlTemplate) -> Self {
        self.boot_url_template = Some(template);
        self
    }
}
