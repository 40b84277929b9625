//! DHCPv6 wire codec.
//!
//! Client/server messages per RFC 8415: a one-byte message type, a
//! three-byte transaction id, then options as (code, length, payload)
//! triples. Only the options the serving pipeline touches get typed
//! representations; everything else round-trips as [`Dhcp6Option::Unknown`].

use crate::arch::ClientArch;
use crate::error::{Dhcp6Error, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::net::Ipv6Addr;

pub const OPT_CLIENT_ID: u16 = 1;
pub const OPT_SERVER_ID: u16 = 2;
pub const OPT_IA_NA: u16 = 3;
pub const OPT_IA_ADDR: u16 = 5;
pub const OPT_ORO: u16 = 6;
pub const OPT_ELAPSED_TIME: u16 = 8;
pub const OPT_STATUS_CODE: u16 = 13;
pub const OPT_RAPID_COMMIT: u16 = 14;
pub const OPT_USER_CLASS: u16 = 15;
pub const OPT_VENDOR_CLASS: u16 = 16;
pub const OPT_DNS_SERVERS: u16 = 23;
pub const OPT_CLIENT_FQDN: u16 = 39;
pub const OPT_BOOT_FILE_URL: u16 = 59;
pub const OPT_CLIENT_ARCH_TYPE: u16 = 61;

/// DHCPv6 message types (RFC 8415 section 7.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Solicit,
    Advertise,
    Request,
    Confirm,
    Renew,
    Rebind,
    Reply,
    Release,
    Decline,
    Reconfigure,
    InformationRequest,
    RelayForw,
    RelayRepl,
    Unknown(u8),
}

impl From<u8> for MessageType {
    fn from(value: u8) -> Self {
        match value {
            1 => MessageType::Solicit,
            2 => MessageType::Advertise,
            3 => MessageType::Request,
            4 => MessageType::Confirm,
            5 => MessageType::Renew,
            6 => MessageType::Rebind,
            7 => MessageType::Reply,
            8 => MessageType::Release,
            9 => MessageType::Decline,
            10 => MessageType::Reconfigure,
            11 => MessageType::InformationRequest,
            12 => MessageType::RelayForw,
            13 => MessageType::RelayRepl,
            other => MessageType::Unknown(other),
        }
    }
}

impl MessageType {
    pub fn code(&self) -> u8 {
        match self {
            MessageType::Solicit => 1,
            MessageType::Advertise => 2,
            MessageType::Request => 3,
            MessageType::Confirm => 4,
            MessageType::Renew => 5,
            MessageType::Rebind => 6,
            MessageType::Reply => 7,
            MessageType::Release => 8,
            MessageType::Decline => 9,
            MessageType::Reconfigure => 10,
            MessageType::InformationRequest => 11,
            MessageType::RelayForw => 12,
            MessageType::RelayRepl => 13,
            MessageType::Unknown(code) => *code,
        }
    }
}

/// Status codes carried in status-code options (RFC 8415 section 21.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    UnspecFail,
    NoAddrsAvail,
    NoBinding,
    NotOnLink,
    UseMulticast,
    Unknown(u16),
}

impl From<u16> for Status {
    fn from(value: u16) -> Self {
        match value {
            0 => Status::Success,
            1 => Status::UnspecFail,
            2 => Status::NoAddrsAvail,
            3 => Status::NoBinding,
            4 => Status::NotOnLink,
            5 => Status::UseMulticast,
            other => Status::Unknown(other),
        }
    }
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Success => 0,
            Status::UnspecFail => 1,
            Status::NoAddrsAvail => 2,
            Status::NoBinding => 3,
            Status::NotOnLink => 4,
            Status::UseMulticast => 5,
            Status::Unknown(code) => *code,
        }
    }
}

/// Identity association for non-temporary addresses: the lease carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaNa {
    pub iaid: [u8; 4],
    pub t1: u32,
    pub t2: u32,
    pub options: Dhcp6Options,
}

impl IaNa {
    /// The addresses nested inside this association.
    pub fn addresses(&self) -> impl Iterator<Item = &IaAddr> {
        self.options.iter().filter_map(|option| match option {
            Dhcp6Option::IaAddr(addr) => Some(addr),
            _ => None,
        })
    }
}

/// One leased address with its lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IaAddr {
    pub addr: Ipv6Addr,
    pub preferred_lifetime: u32,
    pub valid_lifetime: u32,
    pub options: Dhcp6Options,
}

/// Vendor class option: enterprise number plus opaque class-data items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorClass {
    pub enterprise_number: u32,
    pub data: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dhcp6Option {
    ClientId(Vec<u8>),
    ServerId(Vec<u8>),
    IaNa(IaNa),
    IaAddr(IaAddr),
    Oro(Vec<u16>),
    ElapsedTime(u16),
    StatusCode { status: Status, message: String },
    RapidCommit,
    UserClass(Vec<Vec<u8>>),
    VendorClass(VendorClass),
    DnsServers(Vec<Ipv6Addr>),
    /// Client FQDN, kept opaque; we only echo it back.
    ClientFqdn(Vec<u8>),
    BootFileUrl(String),
    ClientArchTypes(Vec<ClientArch>),
    Unknown { code: u16, data: Vec<u8> },
}

impl Dhcp6Option {
    pub fn code(&self) -> u16 {
        match self {
            Dhcp6Option::ClientId(_) => OPT_CLIENT_ID,
            Dhcp6Option::ServerId(_) => OPT_SERVER_ID,
            Dhcp6Option::IaNa(_) => OPT_IA_NA,
            Dhcp6Option::IaAddr(_) => OPT_IA_ADDR,
            Dhcp6Option::Oro(_) => OPT_ORO,
            Dhcp6Option::ElapsedTime(_) => OPT_ELAPSED_TIME,
            Dhcp6Option::StatusCode { .. } => OPT_STATUS_CODE,
            Dhcp6Option::RapidCommit => OPT_RAPID_COMMIT,
            Dhcp6Option::UserClass(_) => OPT_USER_CLASS,
            Dhcp6Option::VendorClass(_) => OPT_VENDOR_CLASS,
            Dhcp6Option::DnsServers(_) => OPT_DNS_SERVERS,
            Dhcp6Option::ClientFqdn(_) => OPT_CLIENT_FQDN,
            Dhcp6Option::BootFileUrl(_) => OPT_BOOT_FILE_URL,
            Dhcp6Option::ClientArchTypes(_) => OPT_CLIENT_ARCH_TYPE,
            Dhcp6Option::Unknown { code, .. } => *code,
        }
    }

    fn parse_one(code: u16, payload: &[u8]) -> Result<Dhcp6Option> {
        let mut buf = payload;
        let option = match code {
            OPT_CLIENT_ID => Dhcp6Option::ClientId(payload.to_vec()),
            OPT_SERVER_ID => Dhcp6Option::ServerId(payload.to_vec()),
            OPT_IA_NA => {
                if buf.remaining() < 12 {
                    return Err(Dhcp6Error::InvalidPacket("IA_NA too short".to_string()));
                }
                let mut iaid = [0u8; 4];
                buf.copy_to_slice(&mut iaid);
                let t1 = buf.get_u32();
                let t2 = buf.get_u32();
                let options = Dhcp6Options::parse(&mut buf)?;
                Dhcp6Option::IaNa(IaNa {
                    iaid,
                    t1,
                    t2,
                    options,
                })
            }
            OPT_IA_ADDR => {
                if buf.remaining() < 24 {
                    return Err(Dhcp6Error::InvalidPacket("IAADDR too short".to_string()));
                }
                let mut addr = [0u8; 16];
                buf.copy_to_slice(&mut addr);
                let preferred_lifetime = buf.get_u32();
                let valid_lifetime = buf.get_u32();
                let options = Dhcp6Options::parse(&mut buf)?;
                Dhcp6Option::IaAddr(IaAddr {
                    addr: Ipv6Addr::from(addr),
                    preferred_lifetime,
                    valid_lifetime,
                    options,
                })
            }
            OPT_ORO => {
                if payload.len() % 2 != 0 {
                    return Err(Dhcp6Error::InvalidPacket("odd ORO length".to_string()));
                }
                let mut codes = Vec::with_capacity(payload.len() / 2);
                while buf.has_remaining() {
                    codes.push(buf.get_u16());
                }
                Dhcp6Option::Oro(codes)
            }
            OPT_ELAPSED_TIME => {
                if payload.len() != 2 {
                    return Err(Dhcp6Error::InvalidPacket(
                        "bad elapsed-time length".to_string(),
                    ));
                }
                Dhcp6Option::ElapsedTime(buf.get_u16())
            }
            OPT_STATUS_CODE => {
                if buf.remaining() < 2 {
                    return Err(Dhcp6Error::InvalidPacket("status code too short".to_string()));
                }
                let status = Status::from(buf.get_u16());
                let message = String::from_utf8_lossy(buf).to_string();
                Dhcp6Option::StatusCode { status, message }
            }
            OPT_RAPID_COMMIT => Dhcp6Option::RapidCommit,
            OPT_USER_CLASS => Dhcp6Option::UserClass(parse_class_data(&mut buf)?),
            OPT_VENDOR_CLASS => {
                if buf.remaining() < 4 {
                    return Err(Dhcp6Error::InvalidPacket(
                        "vendor class too short".to_string(),
                    ));
                }
                let enterprise_number = buf.get_u32();
                let data = parse_class_data(&mut buf)?;
                Dhcp6Option::VendorClass(VendorClass {
                    enterprise_number,
                    data,
                })
            }
            OPT_DNS_SERVERS => {
                if payload.len() % 16 != 0 {
                    return Err(Dhcp6Error::InvalidPacket(
                        "bad DNS server list length".to_string(),
                    ));
                }
                let mut servers = Vec::with_capacity(payload.len() / 16);
                while buf.has_remaining() {
                    let mut addr = [0u8; 16];
                    buf.copy_to_slice(&mut addr);
                    servers.push(Ipv6Addr::from(addr));
                }
                Dhcp6Option::DnsServers(servers)
            }
            OPT_CLIENT_FQDN => Dhcp6Option::ClientFqdn(payload.to_vec()),
            OPT_BOOT_FILE_URL => {
                Dhcp6Option::BootFileUrl(String::from_utf8_lossy(payload).to_string())
            }
            OPT_CLIENT_ARCH_TYPE => {
                if payload.is_empty() || payload.len() % 2 != 0 {
                    return Err(Dhcp6Error::InvalidPacket(
                        "bad client-arch length".to_string(),
                    ));
                }
                let mut archs = Vec::with_capacity(payload.len() / 2);
                while buf.has_remaining() {
                    archs.push(ClientArch::from(buf.get_u16()));
                }
                Dhcp6Option::ClientArchTypes(archs)
            }
            _ => Dhcp6Option::Unknown {
                code,
                data: payload.to_vec(),
            },
        };
        Ok(option)
    }

    fn encode(&self, out: &mut BytesMut) {
        let mut payload = BytesMut::new();
        match self {
            Dhcp6Option::ClientId(data) => payload.put_slice(data),
            Dhcp6Option::ServerId(data) => payload.put_slice(data),
            Dhcp6Option::IaNa(ia) => {
                payload.put_slice(&ia.iaid);
                payload.put_u32(ia.t1);
                payload.put_u32(ia.t2);
                ia.options.encode(&mut payload);
            }
            Dhcp6Option::IaAddr(addr) => {
                payload.put_slice(&addr.addr.octets());
                payload.put_u32(addr.preferred_lifetime);
                payload.put_u32(addr.valid_lifetime);
                addr.options.encode(&mut payload);
            }
            Dhcp6Option::Oro(codes) => {
                for code in codes {
                    payload.put_u16(*code);
                }
            }
            Dhcp6Option::ElapsedTime(elapsed) => payload.put_u16(*elapsed),
            Dhcp6Option::StatusCode { status, message } => {
                payload.put_u16(status.code());
                payload.put_slice(message.as_bytes());
            }
            Dhcp6Option::RapidCommit => {}
            Dhcp6Option::UserClass(data) => encode_class_data(&mut payload, data),
            Dhcp6Option::VendorClass(vendor) => {
                payload.put_u32(vendor.enterprise_number);
                encode_class_data(&mut payload, &vendor.data);
            }
            Dhcp6Option::DnsServers(servers) => {
                for server in servers {
                    payload.put_slice(&server.octets());
                }
            }
            Dhcp6Option::ClientFqdn(data) => payload.put_slice(data),
            Dhcp6Option::BootFileUrl(url) => payload.put_slice(url.as_bytes()),
            Dhcp6Option::ClientArchTypes(archs) => {
                for arch in archs {
                    payload.put_u16(arch.code());
                }
            }
            Dhcp6Option::Unknown { data, .. } => payload.put_slice(data),
        }
        out.put_u16(self.code());
        out.put_u16(payload.len() as u16);
        out.put_slice(&payload);
    }
}

/// Sequence of length-prefixed opaque items, shared by the user class and
/// vendor class options.
fn parse_class_data(buf: &mut &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut data = Vec::new();
    while buf.has_remaining() {
        if buf.remaining() < 2 {
            return Err(Dhcp6Error::InvalidPacket(
                "truncated class-data length".to_string(),
            ));
        }
        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(Dhcp6Error::InvalidPacket(
                "truncated class-data item".to_string(),
            ));
        }
        let remaining: &[u8] = *buf;
        let (item, rest) = remaining.split_at(len);
        data.push(item.to_vec());
        *buf = rest;
    }
    Ok(data)
}

fn encode_class_data(out: &mut BytesMut, data: &[Vec<u8>]) {
    for item in data {
        out.put_u16(item.len() as u16);
        out.put_slice(item);
    }
}

/// An ordered option list with typed accessors for the options the serving
/// pipeline inspects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dhcp6Options(Vec<Dhcp6Option>);

impl Dhcp6Options {
    pub fn iter(&self) -> std::slice::Iter<'_, Dhcp6Option> {
        self.0.iter()
    }

    pub fn insert(&mut self, option: Dhcp6Option) {
        self.0.push(option);
    }

    pub fn get(&self, code: u16) -> Option<&Dhcp6Option> {
        self.0.iter().find(|option| option.code() == code)
    }

    pub fn get_all(&self, code: u16) -> impl Iterator<Item = &Dhcp6Option> {
        self.0.iter().filter(move |option| option.code() == code)
    }

    pub fn has(&self, code: u16) -> bool {
        self.get(code).is_some()
    }

    pub fn client_id(&self) -> Option<&[u8]> {
        self.0.iter().find_map(|option| match option {
            Dhcp6Option::ClientId(raw) => Some(raw.as_slice()),
            _ => None,
        })
    }

    pub fn server_id(&self) -> Option<&[u8]> {
        self.0.iter().find_map(|option| match option {
            Dhcp6Option::ServerId(raw) => Some(raw.as_slice()),
            _ => None,
        })
    }

    /// The first IA_NA, if any.
    pub fn one_ia_na(&self) -> Option<&IaNa> {
        self.0.iter().find_map(|option| match option {
            Dhcp6Option::IaNa(ia) => Some(ia),
            _ => None,
        })
    }

    pub fn vendor_classes(&self) -> impl Iterator<Item = &VendorClass> {
        self.0.iter().filter_map(|option| match option {
            Dhcp6Option::VendorClass(vendor) => Some(vendor),
            _ => None,
        })
    }

    /// Class-data items across every user class option.
    pub fn user_classes(&self) -> impl Iterator<Item = &[u8]> {
        self.0
            .iter()
            .filter_map(|option| match option {
                Dhcp6Option::UserClass(data) => Some(data),
                _ => None,
            })
            .flatten()
            .map(|item| item.as_slice())
    }

    pub fn arch_types(&self) -> Vec<ClientArch> {
        self.0
            .iter()
            .find_map(|option| match option {
                Dhcp6Option::ClientArchTypes(archs) => Some(archs.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Whether the client's option request option asks for `code`.
    pub fn requested(&self, code: u16) -> bool {
        self.0.iter().any(|option| match option {
            Dhcp6Option::Oro(codes) => codes.contains(&code),
            _ => false,
        })
    }

    fn parse(buf: &mut &[u8]) -> Result<Self> {
        let mut options = Vec::new();
        while buf.remaining() >= 4 {
            let code = buf.get_u16();
            let len = buf.get_u16() as usize;
            if buf.remaining() < len {
                return Err(Dhcp6Error::InvalidPacket(format!(
                    "option {code} truncated"
                )));
            }
            let remaining: &[u8] = *buf;
            let (payload, rest) = remaining.split_at(len);
            options.push(Dhcp6Option::parse_one(code, payload)?);
            *buf = rest;
        }
        if buf.has_remaining() {
            return Err(Dhcp6Error::InvalidPacket(
                "trailing bytes after options".to_string(),
            ));
        }
        Ok(Dhcp6Options(options))
    }

    fn encode(&self, out: &mut BytesMut) {
        for option in &self.0 {
            option.encode(out);
        }
    }
}

/// A client or server message. Relay wrapping is out of scope; relay-forward
/// packets fail validation upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub msg_type: MessageType,
    pub xid: [u8; 3],
    pub options: Dhcp6Options,
}

impl Message {
    pub fn new(msg_type: MessageType, xid: [u8; 3]) -> Self {
        Message {
            msg_type,
            xid,
            options: Dhcp6Options::default(),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(Dhcp6Error::InvalidPacket("message too short".to_string()));
        }
        let mut buf = data;
        let msg_type = MessageType::from(buf.get_u8());
        let mut xid = [0u8; 3];
        buf.copy_to_slice(&mut xid);
        let options = Dhcp6Options::parse(&mut buf)?;
        Ok(Message {
            msg_type,
            xid,
            options,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        buf.put_u8(self.msg_type.code());
        buf.put_slice(&self.xid);
        self.options.encode(&mut buf);
        buf.freeze()
    }

    /// Start a response of the given type: same transaction id, client ID
    /// echoed back.
    pub fn reply_with(&self, msg_type: MessageType) -> Message {
        let mut reply = Message::new(msg_type, self.xid);
        if let Some(client_id) = self.options.client_id() {
            reply.options.insert(Dhcp6Option::ClientId(client_id.to_vec()));
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_round_trips() {
        for code in 1..=13u8 {
            assert_eq!(MessageType::from(code).code(), code);
        }
        assert_eq!(MessageType::from(200), MessageType::Unknown(200));
    }

    #[test]
    fn test_parse_rejects_short_message() {
        assert!(Message::parse(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_parse_rejects_truncated_option() {
        // Solicit header plus an option header claiming 10 payload bytes.
        let data = [1, 0, 0, 1, 0, 1, 0, 10, 0xaa];
        assert!(Message::parse(&data).is_err());
    }

    #[test]
    fn test_solicit_round_trip() {
        let mut msg = Message::new(MessageType::Solicit, [0xab, 0xcd, 0xef]);
        msg.options
            .insert(Dhcp6Option::ClientId(vec![0, 3, 0, 1, 1, 2, 3, 4, 5, 6]));
        msg.options.insert(Dhcp6Option::ElapsedTime(0));
        msg.options.insert(Dhcp6Option::Oro(vec![OPT_DNS_SERVERS, OPT_BOOT_FILE_URL]));
        msg.options.insert(Dhcp6Option::RapidCommit);
        msg.options.insert(Dhcp6Option::IaNa(IaNa {
            iaid: *b"TEST",
            t1: 3600,
            t2: 5400,
            options: Dhcp6Options::default(),
        }));
        msg.options.insert(Dhcp6Option::VendorClass(VendorClass {
            enterprise_number: 343,
            data: vec![b"HTTPClient:Arch:00016".to_vec()],
        }));
        msg.options
            .insert(Dhcp6Option::UserClass(vec![b"iPXE".to_vec()]));
        msg.options
            .insert(Dhcp6Option::ClientArchTypes(vec![ClientArch::EfiX86_64]));

        let parsed = Message::parse(&msg.encode()).unwrap();
        assert_eq!(parsed, msg);
        assert_eq!(parsed.msg_type, MessageType::Solicit);
        assert!(parsed.options.has(OPT_RAPID_COMMIT));
        assert!(parsed.options.requested(OPT_DNS_SERVERS));
        assert!(!parsed.options.requested(OPT_CLIENT_FQDN));
        assert_eq!(parsed.options.one_ia_na().unwrap().iaid, *b"TEST");
        assert_eq!(parsed.options.arch_types(), vec![ClientArch::EfiX86_64]);
    }

    #[test]
    fn test_nested_ia_na_round_trip() {
        let lease: Ipv6Addr = "fec0::442:1a03:9b20".parse().unwrap();
        let mut ia_options = Dhcp6Options::default();
        ia_options.insert(Dhcp6Option::IaAddr(IaAddr {
            addr: lease,
            preferred_lifetime: 1200,
            valid_lifetime: 1200,
            options: Dhcp6Options::default(),
        }));
        let mut msg = Message::new(MessageType::Reply, [1, 2, 3]);
        msg.options.insert(Dhcp6Option::IaNa(IaNa {
            iaid: [9, 9, 9, 9],
            t1: 600,
            t2: 1050,
            options: ia_options,
        }));

        let parsed = Message::parse(&msg.encode()).unwrap();
        let ia = parsed.options.one_ia_na().unwrap();
        assert_eq!(ia.t1, 600);
        assert_eq!(ia.t2, 1050);
        let addr = ia.addresses().next().unwrap();
        assert_eq!(addr.addr, lease);
        assert_eq!(addr.preferred_lifetime, 1200);
        assert_eq!(addr.valid_lifetime, 1200);
    }

    #[test]
    fn test_unknown_option_round_trips() {
        let mut msg = Message::new(MessageType::InformationRequest, [0, 0, 1]);
        msg.options.insert(Dhcp6Option::Unknown {
            code: 999,
            data: vec![0xde, 0xad, 0xbe, 0xef],
        });
        let parsed = Message::parse(&msg.encode()).unwrap();
        assert_eq!(
            parsed.options.get(999),
            Some(&Dhcp6Option::Unknown {
                code: 999,
                data: vec![0xde, 0xad, 0xbe, 0xef]
            })
        );
    }

    #[test]
    fn test_status_code_round_trip() {
        let mut msg = Message::new(MessageType::Reply, [0, 0, 2]);
        msg.options.insert(Dhcp6Option::StatusCode {
            status: Status::Success,
            message: "success".to_string(),
        });
        let parsed = Message::parse(&msg.encode()).unwrap();
        assert_eq!(
            parsed.options.get(OPT_STATUS_CODE),
            Some(&Dhcp6Option::StatusCode {
                status: Status::Success,
                message: "success".to_string()
            })
        );
    }

    #[test]
    fn test_reply_with_echoes_client_id() {
        let mut solicit = Message::new(MessageType::Solicit, [7, 7, 7]);
        solicit
            .options
            .insert(Dhcp6Option::ClientId(vec![0, 3, 0, 1, 6, 5, 4, 3, 2, 1]));
        let reply = solicit.reply_with(MessageType::Advertise);
        assert_eq!(reply.msg_type, MessageType::Advertise);
        assert_eq!(reply.xid, [7, 7, 7]);
        assert_eq!(
            reply.options.client_id(),
            Some(&[0, 3, 0, 1, 6, 5, 4, 3, 2, 1][..])
        );
    }

    #[test]
    fn test_dns_servers_round_trip() {
        let servers: Vec<Ipv6Addr> = vec![
            "2606:4700:4700::1111".parse().unwrap(),
            "2001:4860:4860::8888".parse().unwrap(),
        ];
        let mut msg = Message::new(MessageType::Reply, [0, 1, 0]);
        msg.options
            .insert(Dhcp6Option::DnsServers(servers.clone()));
        let parsed = Message::parse(&msg.encode()).unwrap();
        assert_eq!(
            parsed.options.get(OPT_DNS_SERVERS),
            Some(&Dhcp6Option::DnsServers(servers))
        );
    }
}
