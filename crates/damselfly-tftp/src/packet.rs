//! TFTP wire codec (RFC 1350, options per RFC 2347/2348/2349).

use crate::error::{Result, TftpError};
use bytes::{Buf, BufMut, Bytes, BytesMut};

const OPCODE_RRQ: u16 = 1;
const OPCODE_WRQ: u16 = 2;
const OPCODE_DATA: u16 = 3;
const OPCODE_ACK: u16 = 4;
const OPCODE_ERROR: u16 = 5;
const OPCODE_OACK: u16 = 6;

/// TFTP error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    NotDefined = 0,
    FileNotFound = 1,
    AccessViolation = 2,
    DiskFull = 3,
    IllegalOperation = 4,
    UnknownTransferId = 5,
    FileAlreadyExists = 6,
    NoSuchUser = 7,
    /// RFC 2347
    OptionNegotiationFailed = 8,
}

impl From<u16> for ErrorCode {
    fn from(value: u16) -> Self {
        match value {
            1 => ErrorCode::FileNotFound,
            2 => ErrorCode::AccessViolation,
            3 => ErrorCode::DiskFull,
            4 => ErrorCode::IllegalOperation,
            5 => ErrorCode::UnknownTransferId,
            6 => ErrorCode::FileAlreadyExists,
            7 => ErrorCode::NoSuchUser,
            8 => ErrorCode::OptionNegotiationFailed,
            _ => ErrorCode::NotDefined,
        }
    }
}

/// Options a client may negotiate on a request (RFC 2347 framing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    /// Block size (RFC 2348)
    pub blksize: Option<u16>,
    /// Transfer size (RFC 2349)
    pub tsize: Option<u64>,
    /// Retransmission timeout in seconds (RFC 2349)
    pub timeout: Option<u8>,
}

impl TransferOptions {
    pub fn is_empty(&self) -> bool {
        self.blksize.is_none() && self.tsize.is_none() && self.timeout.is_none()
    }

    fn from_pairs<'a>(mut pairs: impl Iterator<Item = &'a [u8]>) -> Self {
        let mut options = TransferOptions::default();
        while let (Some(key), Some(value)) = (pairs.next(), pairs.next()) {
            let key = String::from_utf8_lossy(key).to_lowercase();
            let value = String::from_utf8_lossy(value);
            match key.as_str() {
                "blksize" => options.blksize = value.parse().ok(),
                "tsize" => options.tsize = value.parse().ok(),
                "timeout" => options.timeout = value.parse().ok(),
                // Unknown options (windowsize included) are not acknowledged.
                _ => {}
            }
        }
        options
    }

    fn encode(&self, out: &mut BytesMut) {
        let mut put = |key: &[u8], value: String| {
            out.put_slice(key);
            out.put_u8(0);
            out.put_slice(value.as_bytes());
            out.put_u8(0);
        };
        if let Some(blksize) = self.blksize {
            put(b"blksize", blksize.to_string());
        }
        if let Some(tsize) = self.tsize {
            put(b"tsize", tsize.to_string());
        }
        if let Some(timeout) = self.timeout {
            put(b"timeout", timeout.to_string());
        }
    }
}

/// A decoded TFTP packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Read request
    Rrq {
        filename: String,
        options: TransferOptions,
    },
    /// Write request; parsed only far enough to reject it
    Wrq { filename: String },
    /// One block of file data
    Data { block: u16, data: Bytes },
    /// Acknowledgment of a data block
    Ack { block: u16 },
    /// Error, terminating the transfer
    Error { code: ErrorCode, message: String },
    /// Option acknowledgment (RFC 2347)
    Oack { options: TransferOptions },
}

impl Packet {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 2 {
            return Err(TftpError::InvalidPacket("packet too short".to_string()));
        }
        let mut buf = data;
        let opcode = buf.get_u16();

        match opcode {
            OPCODE_RRQ | OPCODE_WRQ => {
                let mut fields = buf.split(|&b| b == 0);
                let filename = fields
                    .next()
                    .filter(|f| !f.is_empty())
                    .map(|f| String::from_utf8_lossy(f).to_string())
                    .ok_or_else(|| TftpError::InvalidPacket("missing filename".to_string()))?;
                let mode = fields
                    .next()
                    .map(|m| String::from_utf8_lossy(m).to_lowercase())
                    .ok_or_else(|| TftpError::InvalidPacket("missing mode".to_string()))?;
                if mode != "octet" && mode != "netascii" {
                    return Err(TftpError::InvalidPacket(format!("unknown mode: {mode}")));
                }
                if opcode == OPCODE_WRQ {
                    return Ok(Packet::Wrq { filename });
                }
                Ok(Packet::Rrq {
                    filename,
                    options: TransferOptions::from_pairs(fields.filter(|f| !f.is_empty())),
                })
            }
            OPCODE_DATA => {
                if buf.remaining() < 2 {
                    return Err(TftpError::InvalidPacket("data packet too short".to_string()));
                }
                let block = buf.get_u16();
                Ok(Packet::Data {
                    block,
                    data: Bytes::copy_from_slice(buf),
                })
            }
            OPCODE_ACK => {
                if buf.remaining() < 2 {
                    return Err(TftpError::InvalidPacket("ack packet too short".to_string()));
                }
                Ok(Packet::Ack {
                    block: buf.get_u16(),
                })
            }
            OPCODE_ERROR => {
                if buf.remaining() < 2 {
                    return Err(TftpError::InvalidPacket(
                        "error packet too short".to_string(),
                    ));
                }
                let code = ErrorCode::from(buf.get_u16());
                let message = buf
                    .split(|&b| b == 0)
                    .next()
                    .map(|m| String::from_utf8_lossy(m).to_string())
                    .unwrap_or_default();
                Ok(Packet::Error { code, message })
            }
            OPCODE_OACK => Ok(Packet::Oack {
                options: TransferOptions::from_pairs(buf.split(|&b| b == 0).filter(|f| !f.is_empty())),
            }),
            other => Err(TftpError::InvalidPacket(format!("unknown opcode: {other}"))),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        match self {
            Packet::Rrq { filename, options } => {
                buf.put_u16(OPCODE_RRQ);
                buf.put_slice(filename.as_bytes());
                buf.put_u8(0);
                buf.put_slice(b"octet");
                buf.put_u8(0);
                options.encode(&mut buf);
            }
            Packet::Wrq { filename } => {
                buf.put_u16(OPCODE_WRQ);
                buf.put_slice(filename.as_bytes());
                buf.put_u8(0);
                buf.put_slice(b"octet");
                buf.put_u8(0);
            }
            Packet::Data { block, data } => {
                buf.put_u16(OPCODE_DATA);
                buf.put_u16(*block);
                buf.put_slice(data);
            }
            Packet::Ack { block } => {
                buf.put_u16(OPCODE_ACK);
                buf.put_u16(*block);
            }
            Packet::Error { code, message } => {
                buf.put_u16(OPCODE_ERROR);
                buf.put_u16(*code as u16);
                buf.put_slice(message.as_bytes());
                buf.put_u8(0);
            }
            Packet::Oack { options } => {
                buf.put_u16(OPCODE_OACK);
                options.encode(&mut buf);
            }
        }
        buf.freeze()
    }

    pub fn data(block: u16, data: impl Into<Bytes>) -> Self {
        Packet::Data {
            block,
            data: data.into(),
        }
    }

    pub fn ack(block: u16) -> Self {
        Packet::Ack { block }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Packet::Error {
            code,
            message: message.into(),
        }
    }
}
