//! Damselfly server: supervises the DHCPv6, TFTP and HTTP listeners and owns
//! the shared machine registry and event broker.
//!
//! Data flow: a DHCPv6 packet, TFTP transfer or HTTP artifact fetch sights a
//! MAC → the registry yields (or lazily creates) that machine → FSM events
//! are pushed into the machine's ring and fanned out through the broker →
//! `/events` subscribers see them live.

pub mod api;
pub mod broker;
pub mod machine;

use crate::broker::Broker;
use crate::machine::MachineRegistry;
use anyhow::{anyhow, Context};
use bytes::Bytes;
use damselfly_common::MacAddr;
use damselfly_dhcp6::{BootUrlTemplate, Dhcp6Config, Dhcp6Server, DuidLl};
use damselfly_tftp::{TftpServer, TFTP_PORT};
use network_interface::{NetworkInterface, NetworkInterfaceConfig};
use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The iPXE UEFI image handed to PXE firmware over TFTP.
static IPXE_EFI_X86_64: &[u8] = include_bytes!("../assets/ipxe.efi");

/// Operator-facing configuration, assembled by the CLI.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IPv6 base address leases are carved from, interpreted as a /72.
    pub base_address: Ipv6Addr,
    /// Interface serving DHCPv6; its hardware address becomes our DUID.
    pub interface: String,
    /// Boot-URL template source; `None` disables HTTP boot offers.
    pub http_boot_url_template: Option<String>,
    /// HTTP listen address.
    pub http_addr: SocketAddr,
    /// Directory of netboot artifacts served under `/mac/{mac}/`.
    pub netboot_dir: PathBuf,
}

/// Shared state behind the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<Broker>,
    pub registry: Arc<MachineRegistry>,
    pub netboot: Option<ServeDir>,
}

/// Run all three listeners until one fails or shutdown is signalled. Bad
/// configuration (unknown interface, unparsable template, unbindable port)
/// is fatal before anything starts serving.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let broker = Arc::new(Broker::new());
    let registry = Arc::new(MachineRegistry::new(Arc::clone(&broker)));

    let (iface_mac, iface_index) = resolve_interface(&config.interface)?;
    info!(
        interface = %config.interface,
        mac = %iface_mac,
        index = iface_index,
        "resolved serving interface"
    );

    let boot_url_template = match config.http_boot_url_template.as_deref() {
        None | Some("") => None,
        Some(source) => Some(
            BootUrlTemplate::parse(source).context("parsing --http-boot-url-template")?,
        ),
    };

    let mut dhcp_config = Dhcp6Config::new(config.base_address, DuidLl::new(iface_mac))
        .with_interface(&config.interface, iface_index);
    if let Some(template) = boot_url_template {
        dhcp_config = dhcp_config.with_boot_url_template(template);
    }

    let netboot = if config.netboot_dir.is_dir() {
        Some(ServeDir::new(&config.netboot_dir))
    } else {
        warn!(
            dir = %config.netboot_dir.display(),
            "netboot directory does not exist, not serving it"
        );
        None
    };

    let state = AppState {
        broker,
        registry,
        netboot,
    };
    let app = api::router(state).layer(TraceLayer::new_for_http());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let dhcp_server = Dhcp6Server::new(dhcp_config);
    let dhcp_shutdown = shutdown_rx.clone();
    let dhcp = tokio::spawn(async move { dhcp_server.run(dhcp_shutdown).await });

    let tftp_server = TftpServer::new(
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, TFTP_PORT)),
        Bytes::from_static(IPXE_EFI_X86_64),
    );
    let tftp_shutdown = shutdown_rx.clone();
    let tftp = tokio::spawn(async move { tftp_server.run(tftp_shutdown).await });

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", config.http_addr))?;
    info!(addr = %config.http_addr, "HTTP server started");
    let mut http_shutdown = shutdown_rx.clone();
    let http = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_shutdown.changed().await;
            })
            .await
    });

    // The listeners run forever; whichever returns first decides the
    // process's fate.
    tokio::select! {
        result = dhcp => listener_result("DHCPv6", result),
        result = tftp => listener_result("TFTP", result),
        result = http => listener_result("HTTP", result),
    }
}

fn listener_result<E>(
    name: &'static str,
    joined: Result<std::result::Result<(), E>, tokio::task::JoinError>,
) -> anyhow::Result<()>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match joined {
        Ok(Ok(())) => {
            info!("{name} listener exited");
            Ok(())
        }
        Ok(Err(e)) => Err(anyhow::Error::new(e).context(format!("{name} listener failed"))),
        Err(e) => Err(anyhow!("{name} listener panicked: {e}")),
    }
}

/// Resolve the serving interface into the MAC used for our DUID and the
/// index used for the DHCPv6 multicast join.
fn resolve_interface(name: &str) -> anyhow::Result<(MacAddr, u32)> {
    let interfaces = NetworkInterface::show().context("listing network interfaces")?;
    let iface = interfaces
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| anyhow!("interface {name} not found"))?;
    let mac = iface
        .mac_addr
        .as_deref()
        .ok_or_else(|| anyhow!("interface {name} has no hardware address"))?
        .parse::<MacAddr>()
        .with_context(|| format!("parsing hardware address of interface {name}"))?;
    Ok((mac, iface.index))
}
