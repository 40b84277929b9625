//! Shared types for the damselfly netboot stack: the MAC address identity,
//! the provisioning event model, and the bounded event history ring.

pub mod event;
pub mod mac;
pub mod ring;

pub use event::{pin_timestamp, Event, IdentifiedEvent};
pub use mac::{MacAddr, ParseMacError};
pub use ring::Ring;
