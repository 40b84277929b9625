//! DHCPv6 server.
//!
//! The request pipeline validates message structure, derives the client's
//! MAC, computes the deterministic lease and answers with the boot options
//! matching the client's bootstrap stage. Anything that fails validation is
//! logged and dropped without a reply.

use crate::booturl::BootUrlTemplate;
use crate::config::Dhcp6Config;
use crate::duid;
use crate::error::{Dhcp6Error, Result};
use crate::packet::{
    Dhcp6Option, IaAddr, IaNa, Message, MessageType, Status, VendorClass, OPT_CLIENT_FQDN,
    OPT_DNS_SERVERS, OPT_IA_NA, OPT_RAPID_COMMIT,
};
use damselfly_common::MacAddr;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv6Addr, SocketAddr, SocketAddrV6};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// DHCPv6 server listen port (RFC 8415 section 7.2).
pub const SERVER_PORT: u16 = 547;

/// All_DHCP_Relay_Agents_and_Servers.
const SERVER_MULTICAST_GROUP: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0x1, 0x2);

/// Renew / rebind timers for offered leases.
const IA_T1_SECS: u32 = 600;
const IA_T2_SECS: u32 = 1050;

/// Preferred and valid lifetime for offered leases.
const IA_LIFETIME_SECS: u32 = 1200;

/// IAID used when the client did not send one.
const FALLBACK_IAID: [u8; 4] = *b"DSYS";

/// Recursive resolvers offered when the client asks for DNS servers.
const DNS_RESOLVERS: [Ipv6Addr; 2] = [
    Ipv6Addr::new(0x2606, 0x4700, 0x4700, 0, 0, 0, 0, 0x1111),
    Ipv6Addr::new(0x2001, 0x4860, 0x4860, 0, 0, 0, 0, 0x8888),
];

/// DHCPv6 server answering on the standard server port.
pub struct Dhcp6Server {
    config: Dhcp6Config,
}

impl Dhcp6Server {
    pub fn new(config: Dhcp6Config) -> Self {
        Self { config }
    }

    /// Run the receive loop until shutdown is signalled.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let socket = self.create_socket()?;
        info!(
            port = SERVER_PORT,
            interface = %self.config.interface,
            base_address = %self.config.base_address,
            "DHCPv6 server started"
        );

        let mut buf = [0u8; 1500];
        let mut shutdown = shutdown;

        loop {
            tokio::select! {
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, peer)) => match self.handle_packet(&buf[..len], peer) {
                            Ok(reply) => {
                                debug!(peer = %peer, msg_type = ?reply.msg_type, "sending DHCPv6 reply");
                                if let Err(e) = socket.send_to(&reply.encode(), peer).await {
                                    error!(error = %e, peer = %peer, "failed to send DHCPv6 reply");
                                }
                            }
                            Err(e) => debug!(error = %e, peer = %peer, "dropping DHCPv6 packet"),
                        },
                        Err(e) => error!(error = %e, "error receiving DHCPv6 packet"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("DHCPv6 server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Create the server socket and join the server multicast group on the
    /// configured interface.
    fn create_socket(&self) -> Result<UdpSocket> {
        let bind_addr = SocketAddrV6::new(Ipv6Addr::UNSPECIFIED, SERVER_PORT, 0, 0);
        let bind_failed = |source| Dhcp6Error::BindFailed {
            addr: bind_addr.into(),
            source,
        };

        let socket =
            Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP)).map_err(bind_failed)?;
        socket.set_reuse_address(true).ok();
        socket.set_only_v6(true).ok();
        socket.bind(&bind_addr.into()).map_err(bind_failed)?;
        socket
            .join_multicast_v6(&SERVER_MULTICAST_GROUP, self.config.interface_index)
            .map_err(bind_failed)?;
        socket.set_nonblocking(true).map_err(bind_failed)?;

        let std_socket: std::net::UdpSocket = socket.into();
        UdpSocket::from_std(std_socket).map_err(bind_failed)
    }

    /// Decode and answer one packet.
    fn handle_packet(&self, data: &[u8], peer: SocketAddr) -> Result<Message> {
        let msg = Message::parse(data)?;
        debug!(peer = %peer, msg_type = ?msg.msg_type, "received DHCPv6 message");
        self.respond(&msg, peer)
    }

    /// The full validation + reply pipeline for one message. An `Err` means
    /// the message is dropped without a reply.
    pub fn respond(&self, msg: &Message, peer: SocketAddr) -> Result<Message> {
        self.check_client_id(msg)?;
        self.check_server_id(msg)?;

        let mut reply = match msg.msg_type {
            MessageType::Solicit => {
                if msg.options.has(OPT_RAPID_COMMIT) {
                    let mut reply = msg.reply_with(MessageType::Reply);
                    reply.options.insert(Dhcp6Option::RapidCommit);
                    reply
                } else {
                    msg.reply_with(MessageType::Advertise)
                }
            }
            MessageType::Request
            | MessageType::Confirm
            | MessageType::Renew
            | MessageType::Rebind
            | MessageType::Release
            | MessageType::InformationRequest => msg.reply_with(MessageType::Reply),
            other => {
                return Err(Dhcp6Error::Drop(format!("ignoring message type {other:?}")));
            }
        };

        reply
            .options
            .insert(Dhcp6Option::ServerId(self.config.server_duid.to_bytes()));

        match msg.msg_type {
            MessageType::Release => {
                reply.options.insert(status_success());
                return Ok(reply);
            }
            MessageType::InformationRequest => {
                // No address assignment on an information-request.
                self.add_common_options(msg, &mut reply);
                reply.options.insert(status_success());
                return Ok(reply);
            }
            _ => {}
        }

        let mac = self.extract_mac(msg, peer)?;
        let lease = self.lease_for(mac);
        debug!(mac = %mac, lease = %lease, "assigning lease");

        self.check_ia(msg, lease)?;

        reply.options.insert(Dhcp6Option::IaNa(self.build_ia(msg, lease)));
        self.add_common_options(msg, &mut reply);
        if let Some(template) = &self.config.boot_url_template {
            self.add_boot_options(msg, mac, template, &mut reply);
        }
        reply.options.insert(status_success());
        Ok(reply)
    }

    fn check_client_id(&self, msg: &Message) -> Result<()> {
        if msg.options.client_id().is_none() {
            return Err(Dhcp6Error::Drop("no client ID option".to_string()));
        }
        Ok(())
    }

    /// Server-ID expectations per message type: solicits and the
    /// server-discovery messages must not name a server; the committed
    /// messages must name us.
    fn check_server_id(&self, msg: &Message) -> Result<()> {
        let server_id = msg.options.server_id();
        match msg.msg_type {
            MessageType::Solicit | MessageType::Confirm | MessageType::Rebind => {
                if server_id.is_some() {
                    return Err(Dhcp6Error::Drop(format!(
                        "unexpected server ID in {:?}",
                        msg.msg_type
                    )));
                }
            }
            MessageType::Request
            | MessageType::Renew
            | MessageType::Release
            | MessageType::Decline => match server_id {
                None => {
                    return Err(Dhcp6Error::Drop(format!(
                        "no server ID in {:?}",
                        msg.msg_type
                    )));
                }
                Some(raw) if !self.config.server_duid.matches(raw) => {
                    return Err(Dhcp6Error::Drop(format!(
                        "mismatched server ID in {:?}",
                        msg.msg_type
                    )));
                }
                Some(_) => {}
            },
            _ => {}
        }
        Ok(())
    }

    /// The client's MAC, from its DUID when it carries one, otherwise from
    /// the EUI-64 link-local peer address.
    fn extract_mac(&self, msg: &Message, peer: SocketAddr) -> Result<MacAddr> {
        if let Some(mac) = msg.options.client_id().and_then(duid::mac_from_duid) {
            return Ok(mac);
        }
        let SocketAddr::V6(peer) = peer else {
            return Err(Dhcp6Error::Drop(format!(
                "no MAC in message and peer {peer} is not IPv6"
            )));
        };
        MacAddr::from_eui64(peer.ip()).ok_or_else(|| {
            Dhcp6Error::Drop(format!(
                "no MAC in message and peer {} is not an EUI-64 link-local address",
                peer.ip()
            ))
        })
    }

    /// The deterministic lease: the first ten bytes of the base address
    /// followed by the six MAC octets.
    pub fn lease_for(&self, mac: MacAddr) -> Ipv6Addr {
        let mut octets = self.config.base_address.octets();
        octets[10..].copy_from_slice(&mac.octets());
        Ipv6Addr::from(octets)
    }

    /// For the stateful message types, the client must present exactly one
    /// IA_NA holding exactly one address, and that address must be the lease
    /// we would compute.
    fn check_ia(&self, msg: &Message, lease: Ipv6Addr) -> Result<()> {
        if !matches!(
            msg.msg_type,
            MessageType::Request | MessageType::Confirm | MessageType::Renew | MessageType::Rebind
        ) {
            return Ok(());
        }

        let mut ia_nas = msg.options.get_all(OPT_IA_NA);
        let first = ia_nas.next();
        if ia_nas.next().is_some() {
            return Err(Dhcp6Error::Drop(format!(
                "multiple IA_NA options in {:?}",
                msg.msg_type
            )));
        }
        let Some(Dhcp6Option::IaNa(ia)) = first else {
            return Err(Dhcp6Error::Drop(format!(
                "no IA_NA option in {:?}",
                msg.msg_type
            )));
        };

        let mut addresses = ia.addresses();
        let Some(addr) = addresses.next() else {
            return Err(Dhcp6Error::Drop(format!(
                "no address in IA_NA of {:?}",
                msg.msg_type
            )));
        };
        if addresses.next().is_some() {
            return Err(Dhcp6Error::Drop(format!(
                "multiple addresses in IA_NA of {:?}",
                msg.msg_type
            )));
        }
        if addr.addr != lease {
            return Err(Dhcp6Error::Drop(format!(
                "IA address {} does not match lease {}",
                addr.addr, lease
            )));
        }
        Ok(())
    }

    fn build_ia(&self, msg: &Message, lease: Ipv6Addr) -> IaNa {
        let iaid = msg
            .options
            .one_ia_na()
            .map(|ia| ia.iaid)
            .unwrap_or(FALLBACK_IAID);

        let mut options = crate::packet::Dhcp6Options::default();
        options.insert(Dhcp6Option::IaAddr(IaAddr {
            addr: lease,
            preferred_lifetime: IA_LIFETIME_SECS,
            valid_lifetime: IA_LIFETIME_SECS,
            options: Default::default(),
        }));

        IaNa {
            iaid,
            t1: IA_T1_SECS,
            t2: IA_T2_SECS,
            options,
        }
    }

    fn add_common_options(&self, msg: &Message, reply: &mut Message) {
        if let Some(fqdn) = msg.options.get(OPT_CLIENT_FQDN) {
            reply.options.insert(fqdn.clone());
        }
        if msg.options.requested(OPT_DNS_SERVERS) {
            reply
                .options
                .insert(Dhcp6Option::DnsServers(DNS_RESOLVERS.to_vec()));
        }
    }

    /// The boot-file decision table. Template render failures leave the
    /// reply without a boot URL, a visible diagnostic rather than a silent
    /// substitute.
    fn add_boot_options(
        &self,
        msg: &Message,
        mac: MacAddr,
        template: &BootUrlTemplate,
        reply: &mut Message,
    ) {
        let archs = msg.options.arch_types();

        if wants_http_boot(msg) {
            match template.render(mac, self.config.base_address, &archs) {
                Ok(url) => {
                    reply.options.insert(Dhcp6Option::VendorClass(VendorClass {
                        enterprise_number: 0,
                        data: vec![b"HTTPClient".to_vec()],
                    }));
                    reply.options.insert(Dhcp6Option::BootFileUrl(url));
                }
                Err(e) => error!(error = %e, mac = %mac, "failed to render boot URL template"),
            }
        } else if wants_ipxe_over_tftp(msg) {
            reply.options.insert(Dhcp6Option::BootFileUrl(format!(
                "tftp://[{}]/{}/ipxe.efi",
                self.config.base_address, mac
            )));
        } else if wants_ipxe_chain_to_http(msg) {
            match template.render(mac, self.config.base_address, &archs) {
                Ok(url) => reply.options.insert(Dhcp6Option::BootFileUrl(url)),
                Err(e) => error!(error = %e, mac = %mac, "failed to render boot URL template"),
            }
        }
    }
}

impl std::fmt::Debug for Dhcp6Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dhcp6Server")
            .field("base_address", &self.config.base_address)
            .field("interface", &self.config.interface)
            .finish_non_exhaustive()
    }
}

fn status_success() -> Dhcp6Option {
    Dhcp6Option::StatusCode {
        status: Status::Success,
        message: "success".to_string(),
    }
}

/// UEFI HTTP boot firmware announces itself with an `HTTPClient` vendor
/// class.
fn wants_http_boot(msg: &Message) -> bool {
    msg.options
        .vendor_classes()
        .any(|vendor| vendor.data.iter().any(|data| data.starts_with(b"HTTPClient")))
}

fn is_pxe_client(msg: &Message) -> bool {
    msg.options
        .vendor_classes()
        .any(|vendor| vendor.data.iter().any(|data| data.starts_with(b"PXEClient")))
}

fn is_ipxe_user_class(msg: &Message) -> bool {
    msg.options
        .user_classes()
        .any(|class| class.starts_with(b"iPXE"))
}

/// Plain PXE firmware: point it at the iPXE binary over TFTP.
fn wants_ipxe_over_tftp(msg: &Message) -> bool {
    is_pxe_client(msg) && !is_ipxe_user_class(msg)
}

/// iPXE that we already chainloaded: move it on to HTTP boot.
fn wants_ipxe_chain_to_http(msg: &Message) -> bool {
    is_pxe_client(msg) && is_ipxe_user_class(msg)
}
