use crate::{PioPort, PortAddress};
use std::fmt::{Debug, Formatter};

/// A write-only port together with a copy of the last value written to it.
///
/// Bit updates are done read-modify-write on the shadow and then flushed as a whole byte, so
/// bits that are not touched keep their value.
pub struct ShadowedPort<'a> {
    port: &'a dyn PioPort,
    value: u8,
}

impl<'a> ShadowedPort<'a> {
    /// Wraps the port with a zeroed shadow. Nothing is written.
    pub fn new(port: &'a dyn PioPort) -> Self {
        Self::with_value(port, 0)
    }

    /// Wraps the port assuming it currently holds `value`. Nothing is written.
    pub fn with_value(port: &'a dyn PioPort, value: u8) -> Self {
        ShadowedPort { port, value }
    }

    pub fn address(&self) -> PortAddress {
        self.port.address()
    }

    /// The last value written to the port.
    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn write(&mut self, value: u8) {
        self.value = value;
        self.port.write(value);
    }

    pub fn set_bits(&mut self, mask: u8) {
        self.write(self.value | mask);
    }

    pub fn clear_bits(&mut self, mask: u8) {
        self.write(self.value & !mask);
    }
}

impl Debug for ShadowedPort<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}(shadow {:#04x})", self.port, self.value)
    }
}
