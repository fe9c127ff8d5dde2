//! HD44780 character LCD on a 4-bit bus.
//!
//! The controller powers up in 8-bit mode (or half way through a nibble if it was reset mid
//! transfer), so it is brought into 4-bit mode with a fixed sequence of nibble writes before any
//! full byte can be sent. See [driver::HD44780Driver::reset_controller].

pub mod driver;
pub mod ext;

/// Upper nibble of "function set, 8-bit bus". Sent three times to resynchronise the controller.
pub const RESET_NIBBLE: u8 = 0x03;

/// Upper nibble of "function set, 4-bit bus". Switches the controller into 4-bit mode.
pub const FOUR_BIT_NIBBLE: u8 = 0x02;

/// Display on, cursor on, blink off.
pub const DISPLAY_ON_CURSOR_ON: u8 = 0x0E;

/// Entry mode: increment the address after each write, don't shift the display.
pub const ENTRY_INCREMENT: u8 = 0x06;

/// Clear the display and return the cursor home.
pub const CLEAR_DISPLAY: u8 = 0x01;

/// Return the cursor home without clearing.
pub const RETURN_HOME: u8 = 0x02;
