//! Backend that does not touch any hardware but records everything that would have been sent.
//!
//! Used as a dry-run backend and in tests, where the recorded events are compared with the
//! expected bus traffic.
use crate::{PioConfigurator, PioDriver, PioError, PioPort, PioResult, PortAddress};
use bitvec::vec::BitVec;
use log::trace;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::AtomicU8;

/// A single bus operation seen by [RecordingPioDriver].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PioEvent {
    Configure {
        address: PortAddress,
        latch: u8,
        direction: u8,
    },
    Write {
        address: PortAddress,
        value: u8,
    },
}

pub struct RecordingPioDriver {
    events: RefCell<Vec<PioEvent>>,
    used_ports: BitVec<AtomicU8>,
}

impl RecordingPioDriver {
    pub fn new() -> Self {
        RecordingPioDriver {
            events: RefCell::new(Vec::new()),
            used_ports: BitVec::repeat(false, PortAddress::COUNT),
        }
    }

    /// All events recorded so far, oldest first.
    pub fn events(&self) -> Vec<PioEvent> {
        self.events.borrow().clone()
    }

    /// Values written to the given port, oldest first.
    pub fn writes_to(&self, address: PortAddress) -> Vec<u8> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match *event {
                PioEvent::Write { address: a, value } if a == address => Some(value),
                _ => None,
            })
            .collect()
    }

    /// Forgets all recorded events. Claimed ports stay claimed.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&self, event: PioEvent) {
        trace!("{:?}", event);
        self.events.borrow_mut().push(event);
    }
}

impl Default for RecordingPioDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RecordingPioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RecordingPioDriver({} events)", self.events.borrow().len())
    }
}

impl PioConfigurator for RecordingPioDriver {
    fn configure_port(&self, address: PortAddress, latch: u8, direction: u8) {
        self.record(PioEvent::Configure {
            address,
            latch,
            direction,
        });
    }
}

impl PioDriver for RecordingPioDriver {
    fn get_port(&self, address: PortAddress) -> PioResult<Box<dyn PioPort + '_>> {
        let index = address.index();
        if self.used_ports[index] {
            return Err(PioError::AlreadyInUse);
        }

        self.used_ports.set_aliased(index, true);

        Ok(Box::new(RecordingPioPort {
            driver: self,
            address,
        }))
    }
}

struct RecordingPioPort<'a> {
    driver: &'a RecordingPioDriver,
    address: PortAddress,
}

impl Debug for RecordingPioPort<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.address)
    }
}

impl PioPort for RecordingPioPort<'_> {
    fn address(&self) -> PortAddress {
        self.address
    }

    fn write(&self, value: u8) {
        self.driver.record(PioEvent::Write {
            address: self.address,
            value,
        });
    }
}

impl Drop for RecordingPioPort<'_> {
    fn drop(&mut self) {
        self.driver.used_ports.set_aliased(self.address.index(), false);
    }
}
