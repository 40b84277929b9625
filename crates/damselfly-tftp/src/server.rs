//! TFTP server serving a single embedded payload.

use crate::error::{Result, TftpError};
use crate::packet::{ErrorCode, Packet, TransferOptions};
use bytes::Bytes;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// TFTP server listen port (RFC 1350).
pub const TFTP_PORT: u16 = 69;

/// Default block size (RFC 1350)
const DEFAULT_BLOCK_SIZE: u16 = 512;

/// Maximum negotiable block size (RFC 2348)
const MAX_BLOCK_SIZE: u16 = 65464;

/// Per-operation timeout: how long we wait for an ACK before retransmitting.
const OP_TIMEOUT: Duration = Duration::from_secs(5);

/// Retransmissions before a transfer is declared dead.
const MAX_RETRIES: u32 = 5;

/// Read-only TFTP server whose entire filesystem is one payload.
pub struct TftpServer {
    bind_addr: SocketAddr,
    payload: Bytes,
}

impl TftpServer {
    /// Serve `payload` (the iPXE EFI image) for every read request,
    /// whatever the requested filename.
    pub fn new(bind_addr: SocketAddr, payload: Bytes) -> Self {
        Self { bind_addr, payload }
    }

    /// Run the receive loop until shutdown is signalled. Each transfer runs
    /// in its own task on its own ephemeral port.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let socket = UdpSocket::bind(self.bind_addr)
            .await
            .map_err(|e| TftpError::BindFailed {
                addr: self.bind_addr,
                source: e,
            })?;

        info!(addr = %self.bind_addr, bytes = self.payload.len(), "TFTP server started");

        let mut buf = [0u8; 2048];
        let mut shutdown = shutdown;

        loop {
            tokio::select! {
                result = socket.recv_from(&mut buf) => {
                    match result {
                        Ok((len, client)) => {
                            let data = buf[..len].to_vec();
                            let payload = self.payload.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_request(data, client, payload).await {
                                    warn!(error = %e, client = %client, "TFTP transfer failed");
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "error receiving TFTP packet"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("TFTP server shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for TftpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TftpServer")
            .field("bind_addr", &self.bind_addr)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

async fn handle_request(data: Vec<u8>, client: SocketAddr, payload: Bytes) -> Result<()> {
    match Packet::parse(&data)? {
        Packet::Rrq { filename, options } => serve_read(client, &filename, options, payload).await,
        Packet::Wrq { filename } => {
            debug!(client = %client, filename = %filename, "rejecting write request");
            send_error(client, ErrorCode::AccessViolation, "writes not supported").await
        }
        _ => send_error(client, ErrorCode::IllegalOperation, "expected a request").await,
    }
}

/// Stream the payload to the client in lockstep (RFC 1350), honouring a
/// negotiated block size.
async fn serve_read(
    client: SocketAddr,
    filename: &str,
    options: TransferOptions,
    payload: Bytes,
) -> Result<()> {
    debug!(client = %client, filename = %filename, "read request");

    let socket = UdpSocket::bind(wildcard_for(client)).await?;
    let mut ack_buf = [0u8; 512];

    let mut block_size = options
        .blksize
        .map(|requested| requested.clamp(8, MAX_BLOCK_SIZE))
        .unwrap_or(DEFAULT_BLOCK_SIZE) as usize;

    if !options.is_empty() {
        // RFC 2347: acknowledge only what the client asked for and we
        // support. tsize reports the real payload length.
        let oack = Packet::Oack {
            options: TransferOptions {
                blksize: options.blksize.map(|_| block_size as u16),
                tsize: options.tsize.map(|_| payload.len() as u64),
                timeout: options.timeout,
            },
        };
        socket.send_to(&oack.encode(), client).await?;

        match timeout(OP_TIMEOUT, socket.recv_from(&mut ack_buf)).await {
            Ok(Ok((len, _))) => match Packet::parse(&ack_buf[..len])? {
                Packet::Ack { block: 0 } => {}
                Packet::Error { code, message } => {
                    // Some firmware rejects the OACK and will not retry, so
                    // degrade to a plain 512-byte transfer instead of giving
                    // up on the boot.
                    warn!(
                        client = %client,
                        code = ?code,
                        message = %message,
                        "client rejected OACK, falling back to defaults"
                    );
                    block_size = DEFAULT_BLOCK_SIZE as usize;
                }
                _ => {
                    return send_error_on(
                        &socket,
                        client,
                        ErrorCode::IllegalOperation,
                        "expected ACK of block 0",
                    )
                    .await;
                }
            },
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(TftpError::Timeout {
                    filename: filename.to_string(),
                })
            }
        }
    }

    let mut block: u16 = 1;
    let mut offset = 0usize;

    loop {
        let end = (offset + block_size).min(payload.len());
        let chunk = payload.slice(offset..end);
        // A short (possibly empty) final block terminates the transfer.
        let last = chunk.len() < block_size;
        let packet = Packet::data(block, chunk);

        let mut retries = 0;
        loop {
            socket.send_to(&packet.encode(), client).await?;
            match timeout(OP_TIMEOUT, socket.recv_from(&mut ack_buf)).await {
                Ok(Ok((len, _))) => match Packet::parse(&ack_buf[..len])? {
                    Packet::Ack { block: acked } if acked == block => break,
                    Packet::Error { code, message } => {
                        warn!(client = %client, code = ?code, message = %message, "transfer aborted by client");
                        return Ok(());
                    }
                    // Duplicate or stale ACK: resend, bounded by the retry
                    // budget.
                    _ => {
                        retries += 1;
                        if retries >= MAX_RETRIES {
                            return Err(TftpError::Timeout {
                                filename: filename.to_string(),
                            });
                        }
                    }
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    retries += 1;
                    if retries >= MAX_RETRIES {
                        return Err(TftpError::Timeout {
                            filename: filename.to_string(),
                        });
                    }
                }
            }
        }

        offset = end;
        block = block.wrapping_add(1);
        if last {
            break;
        }
    }

    info!(client = %client, filename = %filename, bytes = payload.len(), "transfer complete");
    Ok(())
}

/// An ephemeral-port bind address in the client's address family.
fn wildcard_for(client: SocketAddr) -> SocketAddr {
    match client {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    }
}

async fn send_error(client: SocketAddr, code: ErrorCode, message: &str) -> Result<()> {
    let socket = UdpSocket::bind(wildcard_for(client)).await?;
    send_error_on(&socket, client, code, message).await
}

async fn send_error_on(
    socket: &UdpSocket,
    client: SocketAddr,
    code: ErrorCode,
    message: &str,
) -> Result<()> {
    socket
        .send_to(&Packet::error(code, message).encode(), client)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rrq(filename: &str) -> Vec<u8> {
        Packet::Rrq {
            filename: filename.to_string(),
            options: TransferOptions::default(),
        }
        .encode()
        .to_vec()
    }

    async fn client_socket() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    async fn recv(socket: &UdpSocket) -> (Packet, SocketAddr) {
        let mut buf = [0u8; 2048];
        let (len, from) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
            .await
            .expect("server answered in time")
            .unwrap();
        (Packet::parse(&buf[..len]).unwrap(), from)
    }

    #[tokio::test]
    async fn test_serves_payload_for_any_filename() {
        let payload = Bytes::from(vec![0xa5u8; 700]);
        let (client, client_addr) = client_socket().await;

        let expected = payload.clone();
        let transfer = tokio::spawn(async move {
            handle_request(rrq("whatever/the/client/asks.efi"), client_addr, expected).await
        });

        let (first, server_addr) = recv(&client).await;
        match &first {
            Packet::Data { block: 1, data } => assert_eq!(&data[..], &payload[..512]),
            other => panic!("expected first data block, got {other:?}"),
        }
        client
            .send_to(&Packet::ack(1).encode(), server_addr)
            .await
            .unwrap();

        let (second, _) = recv(&client).await;
        match &second {
            Packet::Data { block: 2, data } => assert_eq!(&data[..], &payload[512..]),
            other => panic!("expected final data block, got {other:?}"),
        }
        client
            .send_to(&Packet::ack(2).encode(), server_addr)
            .await
            .unwrap();

        transfer.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_exact_multiple_payload_ends_with_empty_block() {
        let payload = Bytes::from(vec![1u8; 512]);
        let (client, client_addr) = client_socket().await;

        let transfer =
            tokio::spawn(async move { handle_request(rrq("ipxe.efi"), client_addr, payload).await });

        let (first, server_addr) = recv(&client).await;
        assert!(matches!(&first, Packet::Data { block: 1, data } if data.len() == 512));
        client
            .send_to(&Packet::ack(1).encode(), server_addr)
            .await
            .unwrap();

        let (second, _) = recv(&client).await;
        assert!(matches!(&second, Packet::Data { block: 2, data } if data.is_empty()));
        client
            .send_to(&Packet::ack(2).encode(), server_addr)
            .await
            .unwrap();

        transfer.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_blksize_negotiation_sends_oack() {
        let payload = Bytes::from(vec![7u8; 100]);
        let (client, client_addr) = client_socket().await;

        let request = Packet::Rrq {
            filename: "ipxe.efi".to_string(),
            options: TransferOptions {
                blksize: Some(1024),
                tsize: Some(0),
                timeout: None,
            },
        }
        .encode()
        .to_vec();

        let transfer =
            tokio::spawn(async move { handle_request(request, client_addr, payload).await });

        let (oack, server_addr) = recv(&client).await;
        match oack {
            Packet::Oack { options } => {
                assert_eq!(options.blksize, Some(1024));
                assert_eq!(options.tsize, Some(100));
            }
            other => panic!("expected OACK, got {other:?}"),
        }
        client
            .send_to(&Packet::ack(0).encode(), server_addr)
            .await
            .unwrap();

        let (data, server_addr) = recv(&client).await;
        assert!(matches!(&data, Packet::Data { block: 1, data } if data.len() == 100));
        client
            .send_to(&Packet::ack(1).encode(), server_addr)
            .await
            .unwrap();

        transfer.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_write_request_is_rejected() {
        let (client, client_addr) = client_socket().await;

        let request = Packet::Wrq {
            filename: "upload.bin".to_string(),
        }
        .encode()
        .to_vec();

        tokio::spawn(async move {
            handle_request(request, client_addr, Bytes::from_static(b"payload")).await
        });

        let (reply, _) = recv(&client).await;
        assert!(matches!(
            reply,
            Packet::Error {
                code: ErrorCode::AccessViolation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_client_abort_stops_transfer() {
        let payload = Bytes::from(vec![2u8; 2048]);
        let (client, client_addr) = client_socket().await;

        let transfer =
            tokio::spawn(async move { handle_request(rrq("ipxe.efi"), client_addr, payload).await });

        let (_, server_addr) = recv(&client).await;
        client
            .send_to(
                &Packet::error(ErrorCode::DiskFull, "no space").encode(),
                server_addr,
            )
            .await
            .unwrap();

        // Aborts are reported, not retried.
        transfer.await.unwrap().unwrap();
    }
}
