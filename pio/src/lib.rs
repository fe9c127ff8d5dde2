pub mod board;
pub mod lcd;
pub mod raw;
pub mod recording;
pub mod shadow;

use std::fmt::{Debug, Display, Formatter};
use thiserror::Error;

pub use shadow::ShadowedPort;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum PioError {
    #[error("port already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
}

impl From<std::io::Error> for PioError {
    fn from(err: std::io::Error) -> Self {
        PioError::Io(err.kind())
    }
}

pub type PioResult<T> = Result<T, PioError>;

/// One of the parallel I/O controllers on the shield.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PioGroup {
    Pio0,
    Pio1,
}

impl PioGroup {
    pub const ALL: [PioGroup; 2] = [PioGroup::Pio0, PioGroup::Pio1];

    pub fn index(self) -> usize {
        match self {
            PioGroup::Pio0 => 0,
            PioGroup::Pio1 => 1,
        }
    }
}

/// One of the two 8-bit ports of a [PioGroup].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum PioPortId {
    A,
    B,
}

impl PioPortId {
    pub fn index(self) -> usize {
        match self {
            PioPortId::A => 0,
            PioPortId::B => 1,
        }
    }
}

/// Location of a single port: controller plus port letter.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PortAddress {
    pub group: PioGroup,
    pub port: PioPortId,
}

impl PortAddress {
    pub const fn new(group: PioGroup, port: PioPortId) -> Self {
        PortAddress { group, port }
    }

    /// Dense index of the port, `0..PortAddress::COUNT`.
    pub fn index(self) -> usize {
        self.group.index() * 2 + self.port.index()
    }

    pub const COUNT: usize = 4;
}

impl Display for PortAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let port = match self.port {
            PioPortId::A => 'A',
            PioPortId::B => 'B',
        };
        write!(f, "PIO{}/{}", self.group.index(), port)
    }
}

/// Sets up the direction of the lines of a port.
///
/// Implemented by every backend, but the LCD driver only ever sees this half of it, so that
/// it can configure its ports without being able to claim new ones.
pub trait PioConfigurator: Debug {
    /// Puts the port in bit-control mode.
    ///
    /// `latch` is preloaded into the output latch, `direction` is the direction word where a set
    /// bit turns the line into an input and a cleared bit into an output.
    fn configure_port(&self, address: PortAddress, latch: u8, direction: u8);
}

pub trait PioDriver: PioConfigurator {
    /// Claims the data register of the port at the given address.
    ///
    /// # Errors
    /// - `PioError::AlreadyInUse` if the port is already claimed and not yet dropped.
    fn get_port(&self, address: PortAddress) -> PioResult<Box<dyn PioPort + '_>>;
}

/// A write-only 8-bit data register.
///
/// The hardware cannot be read back, so there is no `read`; use [ShadowedPort] to keep track of
/// what was written.
pub trait PioPort: Debug {
    fn address(&self) -> PortAddress;

    /// Writes the full byte to the port.
    fn write(&self, value: u8);
}
