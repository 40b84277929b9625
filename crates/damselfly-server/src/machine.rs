//! Per-machine bootstrap tracking.
//!
//! Every MAC the server sights gets a [`Machine`]: a small state machine
//! following the firmware through its bootstrap stages, plus a bounded ring
//! of the events observed along the way. State names double as event names
//! (firing the event `http_boot` moves the machine into the state
//! `http_boot`), which keeps the wire vocabulary and the state vocabulary
//! identical.

use crate::broker::Broker;
use damselfly_common::{Event, IdentifiedEvent, MacAddr, Ring};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

/// Events retained per machine.
const EVENT_HISTORY: usize = 50;

const STATE_RESET: &str = "reset";

struct Transition {
    event: &'static str,
    sources: &'static [&'static str],
}

/// The legal bootstrap paths. UEFI HTTP boot goes
/// `reset → firmware_init → http_boot → os_init`; classic PXE chains through
/// iPXE over TFTP before reaching HTTP boot.
const TRANSITIONS: &[Transition] = &[
    Transition {
        event: "firmware_init",
        sources: &["reset"],
    },
    Transition {
        event: "http_boot",
        sources: &["firmware_init", "reset"],
    },
    Transition {
        event: "point_pxe_to_ipxe_over_tftp",
        sources: &["firmware_init", "reset"],
    },
    Transition {
        event: "served_ipxe_over_tftp",
        sources: &["point_pxe_to_ipxe_over_tftp"],
    },
    Transition {
        event: "point_ipxe_to_http_boot",
        sources: &["served_ipxe_over_tftp"],
    },
    Transition {
        event: "os_init",
        sources: &["http_boot", "point_ipxe_to_http_boot"],
    },
];

/// States are open-ended strings rather than a closed enum: the jump-to
/// fallback may land on stages the transition table has never heard of.
struct BootFsm {
    state: String,
}

impl BootFsm {
    fn new() -> Self {
        BootFsm {
            state: STATE_RESET.to_string(),
        }
    }

    fn is(&self, name: &str) -> bool {
        self.state == name
    }

    fn can(&self, event: &str) -> bool {
        TRANSITIONS
            .iter()
            .any(|t| t.event == event && t.sources.contains(&self.state.as_str()))
    }

    fn set_state(&mut self, state: &str) {
        self.state = state.to_string();
    }
}

struct MachineInner {
    fsm: BootFsm,
    events: Ring<Event>,
}

/// One tracked machine. All mutation is serialised by the inner mutex;
/// publishing while it is held is fine because the broker never blocks.
pub struct Machine {
    mac: MacAddr,
    broker: Arc<Broker>,
    inner: Mutex<MachineInner>,
}

impl Machine {
    fn new(mac: MacAddr, broker: Arc<Broker>) -> Self {
        let machine = Machine {
            mac,
            broker,
            inner: Mutex::new(MachineInner {
                fsm: BootFsm::new(),
                events: Ring::new(EVENT_HISTORY),
            }),
        };
        {
            let mut inner = machine.inner.lock().unwrap();
            machine.record(&mut inner, Event::new("init"));
        }
        machine
    }

    /// Push into the ring and fan out to subscribers, in that order.
    fn record(&self, inner: &mut MachineInner, event: Event) {
        inner.events.push(event.clone());
        self.broker.publish(IdentifiedEvent {
            mac: self.mac,
            event,
        });
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn state(&self) -> String {
        self.inner.lock().unwrap().fsm.state.clone()
    }

    /// Whether `event` is a legal transition from the current state.
    pub fn can(&self, event: &str) -> bool {
        self.inner.lock().unwrap().fsm.can(event)
    }

    pub fn cannot(&self, event: &str) -> bool {
        !self.can(event)
    }

    /// Fire `name` at the machine.
    ///
    /// Already in that state: silent no-op. Legal transition: the state
    /// advances and the event is recorded once. Anything else: the machine
    /// is forced into the named state, preceded by a synthetic `jump_to`
    /// event. Real firmware skips stages (a box re-flashed and rebooted
    /// straight into iPXE, say), and the observed stage wins over the
    /// expected one.
    pub fn event(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if inner.fsm.is(name) {
            return;
        }
        if inner.fsm.can(name) {
            inner.fsm.set_state(name);
            self.record(&mut inner, Event::new(name));
        } else {
            self.record(&mut inner, Event::new("jump_to"));
            inner.fsm.set_state(name);
            self.record(&mut inner, Event::new(name));
        }
    }

    /// Force the machine back to the initial state.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        self.record(&mut inner, Event::new(STATE_RESET));
        inner.fsm.set_state(STATE_RESET);
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        let inner = self.inner.lock().unwrap();
        MachineSnapshot {
            mac: self.mac,
            events: inner.events.to_vec(),
        }
    }
}

/// Wire form of one machine: the MAC plus its event history, oldest first.
/// The FSM state is deliberately absent; the event trail is the durable
/// summary.
#[derive(Debug, Clone, Serialize)]
pub struct MachineSnapshot {
    #[serde(rename = "Mac")]
    pub mac: MacAddr,
    #[serde(rename = "Events")]
    pub events: Vec<Event>,
}

/// The MAC-indexed machine registry. A MAC maps to exactly one machine for
/// the lifetime of the process; machines are never destroyed or replaced.
pub struct MachineRegistry {
    broker: Arc<Broker>,
    machines: RwLock<HashMap<MacAddr, Arc<Machine>>>,
}

impl MachineRegistry {
    pub fn new(broker: Arc<Broker>) -> Self {
        MachineRegistry {
            broker,
            machines: RwLock::new(HashMap::new()),
        }
    }

    /// Read-only lookup; never creates.
    pub fn get(&self, mac: MacAddr) -> Option<Arc<Machine>> {
        self.machines.read().unwrap().get(&mac).cloned()
    }

    /// Look up the machine for `mac`, creating it (and announcing `init`) on
    /// first sighting. Concurrent first sightings resolve to the same
    /// instance.
    pub fn get_or_init(&self, mac: MacAddr) -> Arc<Machine> {
        if let Some(machine) = self.machines.read().unwrap().get(&mac) {
            return Arc::clone(machine);
        }
        let mut machines = self.machines.write().unwrap();
        Arc::clone(
            machines
                .entry(mac)
                .or_insert_with(|| Arc::new(Machine::new(mac, Arc::clone(&self.broker)))),
        )
    }

    pub fn len(&self) -> usize {
        self.machines.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.read().unwrap().is_empty()
    }

    /// Snapshot of every machine, keyed by canonical MAC string.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let machines = self.machines.read().unwrap();
        RegistrySnapshot(
            machines
                .values()
                .map(|machine| (machine.mac().to_string(), machine.snapshot()))
                .collect(),
        )
    }
}

/// Wire form of the whole registry.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot(BTreeMap<String, MachineSnapshot>);
