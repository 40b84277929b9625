//! Provisioning events.

use crate::mac::MacAddr;
use chrono::{SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

static PINNED_TIMESTAMP: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// Pin the timestamp of every subsequently created [`Event`] to a fixed
/// literal. Test hook for deterministic assertions on event streams.
pub fn pin_timestamp(value: impl Into<String>) {
    *PINNED_TIMESTAMP.write().unwrap() = Some(value.into());
}

/// A named occurrence in a machine's bootstrap, stamped at creation.
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event")]
    pub name: String,
    pub timestamp: String,
}

impl Event {
    /// Stamp a new event with the current UTC time (RFC 3339, nanoseconds).
    pub fn new(name: impl Into<String>) -> Self {
        let timestamp = match PINNED_TIMESTAMP.read().unwrap().as_ref() {
            Some(pinned) => pinned.clone(),
            None => Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        };
        Event {
            name: name.into(),
            timestamp,
        }
    }
}

/// The unit of publish/subscribe traffic: an event tagged with the machine
/// it happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedEvent {
    pub mac: MacAddr,
    pub event: Event,
}
