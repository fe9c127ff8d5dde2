mod pio;

use crate::lcd::hd44780::{CLEAR_DISPLAY, RETURN_HOME};
use crate::{PioConfigurator, PioError, PioResult};
pub use pio::*;
use std::fmt::Debug;

pub trait HD44780Driver: Debug {
    /// Sets up the direction of the ports the display is connected to.
    fn configure_ports(&mut self, pio: &dyn PioConfigurator);

    /// Brings the controller from any state into 4-bit mode and applies the default display
    /// settings. The controller is never read back, so the full sequence is always sent.
    fn reset_controller(&mut self);

    /// Configures the ports and resets the controller.
    fn initialise(&mut self, pio: &dyn PioConfigurator) {
        self.configure_ports(pio);
        self.reset_controller();
    }

    /// Whether [Self::initialise] (or [Self::reset_controller]) has run.
    fn is_initialised(&self) -> bool;

    /// Sends each byte of the text as display data, stopping at the first NUL byte or at the end
    /// of the slice, whichever comes first.
    fn display(&mut self, text: &[u8]) {
        debug_assert!(
            self.is_initialised(),
            "text sent to the display before it was initialised"
        );

        for &c in text.iter().take_while(|&&c| c != 0) {
            self.send_data(c);
        }
    }

    /// Clears the display and sets the cursor to the home position.
    fn clear_display(&mut self) {
        self.send_command(CLEAR_DISPLAY)
    }

    /// Sets the cursor to the home position.
    fn return_home(&mut self) {
        self.send_command(RETURN_HOME)
    }

    /// Sets the display to the specified entry mode.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    fn set_display_control(&mut self, display_on: bool, cursor_on: bool, blink_on: bool) {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the display.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the function set.
    ///
    /// Only meaningful with `data_length` cleared here, the driver always talks 4-bit.
    fn function_set(&mut self, data_length: bool, two_lines: bool, font: bool) {
        let mut command = 0b00100000;
        if data_length {
            command |= 0b00010000;
        }
        if two_lines {
            command |= 0b00001000;
        }
        if font {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address.
    fn set_cgram_address(&mut self, address: u8) -> PioResult<()> {
        if address > 0b00111111 {
            return Err(PioError::InvalidArgument);
        }
        self.send_command(0b01000000 | address);
        Ok(())
    }

    /// Sets the DDRAM address.
    fn set_ddram_address(&mut self, address: u8) -> PioResult<()> {
        if address > 0b01111111 {
            return Err(PioError::InvalidArgument);
        }
        self.send_command(0b10000000 | address);
        Ok(())
    }

    // Low-level transfers
    // Everything above is built from these three.

    /// Sends only the low nibble of `value`, placed on the upper half of the bus, with RS low.
    /// Used while the controller is not yet known to be in 4-bit mode.
    fn send_command_nibble(&mut self, value: u8);

    /// Sends an instruction byte as two nibbles with RS low.
    fn send_command(&mut self, command: u8);

    /// Sends a data byte as two nibbles with RS high.
    fn send_data(&mut self, data: u8);
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    /// Moves the cursor to the left after writing data.
    Left,
    /// Moves the cursor to the right after writing data.
    Right,
}
