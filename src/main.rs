// Binary entry point: flag parsing and logging setup live here; everything
// else is the server crate's job.

use clap::Parser;
use color_eyre::eyre::Result;
use damselfly_server::{run, ServerConfig};
use std::io::stderr;
use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Damselfly IPv6 netboot orchestrator", long_about = None)]
struct Cli {
    /// IPv6 base address to distribute MAC-based leases through; treated as
    /// a /72, the final 48 bits come from the client's MAC
    #[arg(long, default_value_t = Ipv6Addr::new(0xfec0, 0, 0, 0, 0, 0, 0, 0))]
    base_address: Ipv6Addr,

    /// Interface to serve DHCPv6 on; its hardware address becomes our DUID
    #[arg(long, default_value = "eth0")]
    interface: String,

    /// URL template for UEFI HTTP boot offers, like
    /// "http://netboot.target/?mac={{ MAC }}". Empty disables HTTP boot.
    #[arg(long, default_value = "")]
    http_boot_url_template: String,

    /// Address for the HTTP listener (netboot artifacts and the /events feed)
    #[arg(long, default_value = "[::]:8080")]
    http_addr: SocketAddr,

    /// Directory of netboot artifacts served under /mac/{mac}/
    #[arg(long, default_value = "netboot")]
    netboot_dir: PathBuf,

    /// Verbose output - shows more detailed logs
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    color_eyre::install()?;

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "damselfly={level},damselfly_server={level},damselfly_dhcp6={level},damselfly_tftp={level},tower=warn,hyper=warn"
        ))
    });
    registry().with(filter).with(fmt::layer().with_writer(stderr)).init();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = ServerConfig {
        base_address: cli.base_address,
        interface: cli.interface,
        http_boot_url_template: (!cli.http_boot_url_template.is_empty())
            .then_some(cli.http_boot_url_template),
        http_addr: cli.http_addr,
        netboot_dir: cli.netboot_dir,
    };

    if let Err(e) = run(config).await {
        error!("server failed: {:#}", e);
        eprintln!("Error running damselfly: {e}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["damselfly"]);
        assert_eq!(cli.base_address.to_string(), "fec0::");
        assert_eq!(cli.interface, "eth0");
        assert!(cli.http_boot_url_template.is_empty());
        assert_eq!(cli.netboot_dir, PathBuf::from("netboot"));
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "damselfly",
            "--base-address",
            "fd00:1::",
            "--interface",
            "enp3s0",
            "--http-boot-url-template",
            "http://boot/{{ MAC }}",
            "--http-addr",
            "[::1]:9000",
        ]);
        assert_eq!(cli.base_address.to_string(), "fd00:1::");
        assert_eq!(cli.interface, "enp3s0");
        assert_eq!(cli.http_boot_url_template, "http://boot/{{ MAC }}");
        assert_eq!(cli.http_addr.port(), 9000);
    }
}
