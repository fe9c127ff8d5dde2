//! Bring-up of everything hanging off the shield's PIOs.
//!
//! The LCD only configures its own ports. Other peripherals sharing the controllers are set up
//! here, between the port configuration and the controller reset, so that the order on the bus
//! is the same as the one the shield firmware has always used.
use crate::lcd::hd44780::driver::HD44780Driver;
use crate::{PioConfigurator, PioGroup, PioPortId, PortAddress};
use log::debug;
use std::fmt::Debug;

/// Port A of PIO1 is the LCD data bus.
pub const LCD_DATA_PORT: PortAddress = PortAddress::new(PioGroup::Pio1, PioPortId::A);
/// Port B of PIO1 carries the LCD RS and E lines.
pub const LCD_CONTROL_PORT: PortAddress = PortAddress::new(PioGroup::Pio1, PioPortId::B);

/// A device that only needs its PIO lines set up.
pub trait Peripheral: Debug {
    fn configure(&self, pio: &dyn PioConfigurator);
}

/// Chip select of the A/D converter, on bit 2 of PIO0 port A.
#[derive(Copy, Clone, Debug, Default)]
pub struct AdcChipSelect;

impl AdcChipSelect {
    pub const PORT: PortAddress = PortAddress::new(PioGroup::Pio0, PioPortId::A);
    pub const LATCH: u8 = 0x01;
    pub const DIRECTION: u8 = 0xFB;
}

impl Peripheral for AdcChipSelect {
    fn configure(&self, pio: &dyn PioConfigurator) {
        debug!("Configuring ADC chip select on {}", Self::PORT);
        pio.configure_port(Self::PORT, Self::LATCH, Self::DIRECTION);
    }
}

#[derive(Debug)]
pub struct Shield<'a, L: HD44780Driver> {
    pub lcd: L,
    peripherals: Vec<&'a dyn Peripheral>,
}

impl<'a, L: HD44780Driver> Shield<'a, L> {
    /// A shield with just the display.
    pub fn new(lcd: L) -> Self {
        Shield {
            lcd,
            peripherals: Vec::new(),
        }
    }

    /// Adds a peripheral, configured after the display ports, in insertion order.
    pub fn with_peripheral(mut self, peripheral: &'a dyn Peripheral) -> Self {
        self.peripherals.push(peripheral);
        self
    }

    pub fn initialise(&mut self, pio: &dyn PioConfigurator) {
        self.lcd.configure_ports(pio);
        for peripheral in &self.peripherals {
            peripheral.configure(pio);
        }
        self.lcd.reset_controller();
    }
}
