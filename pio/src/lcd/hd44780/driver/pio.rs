use crate::lcd::hd44780::driver::HD44780Driver;
use crate::lcd::hd44780::{
    CLEAR_DISPLAY, DISPLAY_ON_CURSOR_ON, ENTRY_INCREMENT, FOUR_BIT_NIBBLE, RESET_NIBBLE,
};
use crate::{PioConfigurator, PioPort, ShadowedPort};
use log::{debug, trace};
use std::thread::sleep;
use std::time::Duration;

/// Port A carries D4..D7 on its upper nibble.
pub const PORT_A_LATCH: u8 = 0x00;
pub const PORT_A_DIRECTION: u8 = 0x0F;

/// Port B carries RS and E on bits 0 and 1, the rest are left as inputs.
pub const PORT_B_LATCH: u8 = 0x00;
pub const PORT_B_DIRECTION: u8 = 0xFC;

const RS_BIT: u8 = 0b0000_0001;
const E_BIT: u8 = 0b0000_0010;

/// Optional waits inserted into the bus sequence.
///
/// Both are zero by default, which sends everything at full speed. Slow controllers (or fast
/// hosts) may need a few microseconds of `strobe` and a few milliseconds of `settle`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LcdTiming {
    /// Wait after RS and E are driven low, before the reset sequence starts.
    pub settle: Duration,
    /// Wait after every edge of E.
    pub strobe: Duration,
}

/// HD44780 in 4-bit mode behind two PIO ports.
///
/// Port A is the data bus, port B holds RS (bit 0) and E (bit 1). Neither port can be read, so
/// the driver keeps the last written value of both and only ever changes its own bits on port B.
#[derive(Debug)]
pub struct PioHD44780Driver<'a> {
    port_a: ShadowedPort<'a>,
    port_b: ShadowedPort<'a>,
    timing: LcdTiming,
    initialised: bool,
}

impl<'a> PioHD44780Driver<'a> {
    pub fn new(port_a: &'a dyn PioPort, port_b: &'a dyn PioPort) -> Self {
        Self::from_shadowed(ShadowedPort::new(port_a), ShadowedPort::new(port_b))
    }

    /// Uses ports whose current value is already known, e.g. when port B is shared.
    pub fn from_shadowed(port_a: ShadowedPort<'a>, port_b: ShadowedPort<'a>) -> Self {
        PioHD44780Driver {
            port_a,
            port_b,
            timing: LcdTiming::default(),
            initialised: false,
        }
    }

    pub fn with_timing(mut self, timing: LcdTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> LcdTiming {
        self.timing
    }

    /// Last value written to the data port.
    pub fn port_a_shadow(&self) -> u8 {
        self.port_a.value()
    }

    /// Last value written to the control port.
    pub fn port_b_shadow(&self) -> u8 {
        self.port_b.value()
    }

    pub fn register_select_low(&mut self) {
        self.port_b.clear_bits(RS_BIT);
    }

    pub fn register_select_high(&mut self) {
        self.port_b.set_bits(RS_BIT);
    }

    pub fn enable_low(&mut self) {
        self.port_b.clear_bits(E_BIT);
    }

    pub fn enable_high(&mut self) {
        self.port_b.set_bits(E_BIT);
    }

    fn wait(duration: Duration) {
        if !duration.is_zero() {
            sleep(duration);
        }
    }

    fn strobe_high(&mut self) {
        self.enable_high();
        Self::wait(self.timing.strobe);
    }

    fn strobe_low(&mut self) {
        self.enable_low();
        Self::wait(self.timing.strobe);
    }

    fn send_byte(&mut self, value: u8, rs: bool) {
        trace!("Sending byte: {:08b}, RS: {}", value, rs);

        if rs {
            self.register_select_high();
        } else {
            self.register_select_low();
        }

        // High nibble: the controller only looks at D4..D7.
        self.strobe_high();
        self.port_a.write(value);
        self.strobe_low();

        self.strobe_high();
        self.port_a.write((value << 4) & 0xF0);
        self.strobe_low();

        self.register_select_high();
    }
}

impl HD44780Driver for PioHD44780Driver<'_> {
    fn configure_ports(&mut self, pio: &dyn PioConfigurator) {
        debug!("Configuring LCD ports {} and {}", self.port_a.address(), self.port_b.address());
        pio.configure_port(self.port_a.address(), PORT_A_LATCH, PORT_A_DIRECTION);
        pio.configure_port(self.port_b.address(), PORT_B_LATCH, PORT_B_DIRECTION);
    }

    fn reset_controller(&mut self) {
        debug!("Resetting LCD controller into 4-bit mode");

        self.register_select_low();
        self.enable_low();
        Self::wait(self.timing.settle);

        // Works whether the controller is in 8-bit mode or half way through a 4-bit byte.
        for _ in 0..3 {
            self.send_command_nibble(RESET_NIBBLE);
        }
        self.send_command_nibble(FOUR_BIT_NIBBLE);

        self.send_command(DISPLAY_ON_CURSOR_ON);
        self.send_command(ENTRY_INCREMENT);
        self.send_command(CLEAR_DISPLAY);

        self.initialised = true;
        debug!("LCD controller ready");
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn send_command_nibble(&mut self, value: u8) {
        trace!("Sending nibble: {:04b}", value & 0x0F);

        self.register_select_low();
        self.strobe_high();
        self.port_a.write((value << 4) & 0xF0);
        self.strobe_low();
        self.register_select_high();
    }

    fn send_command(&mut self, command: u8) {
        self.send_byte(command, false)
    }

    fn send_data(&mut self, data: u8) {
        self.send_byte(data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::driver::CursorDirection;
    use crate::recording::{PioEvent, RecordingPioDriver};
    use crate::{PioDriver, PioError, PioGroup, PioPortId, PortAddress};

    const PORT_A: PortAddress = PortAddress::new(PioGroup::Pio1, PioPortId::A);
    const PORT_B: PortAddress = PortAddress::new(PioGroup::Pio1, PioPortId::B);

    fn signal_bits(lcd: &PioHD44780Driver) -> (bool, bool) {
        let b = lcd.port_b_shadow();
        (b & RS_BIT != 0, b & E_BIT != 0)
    }

    #[test]
    fn signal_primitives_keep_foreign_bits() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let foreign = 0b1011_0100;
        let mut lcd = PioHD44780Driver::from_shadowed(
            ShadowedPort::new(&*port_a),
            ShadowedPort::with_value(&*port_b, foreign),
        );

        for i in 0..32 {
            match (i * 7 + i / 3) % 4 {
                0 => lcd.register_select_high(),
                1 => lcd.enable_high(),
                2 => lcd.register_select_low(),
                _ => lcd.enable_low(),
            }
            assert_eq!(lcd.port_b_shadow() & !(RS_BIT | E_BIT), foreign);
        }

        let writes = pio.writes_to(PORT_B);
        assert_eq!(writes.len(), 32);
        assert!(writes.iter().all(|w| w & !(RS_BIT | E_BIT) == foreign));
        assert_eq!(writes.last(), Some(&lcd.port_b_shadow()));
    }

    #[test]
    fn signal_bits_toggle_independently() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.register_select_high();
        lcd.enable_high();
        assert_eq!(signal_bits(&lcd), (true, true));

        lcd.register_select_low();
        assert_eq!(signal_bits(&lcd), (false, true));

        lcd.enable_low();
        lcd.register_select_high();
        assert_eq!(signal_bits(&lcd), (true, false));

        lcd.enable_high();
        lcd.enable_low();
        assert_eq!(signal_bits(&lcd), (true, false));

        assert!(pio.writes_to(PORT_A).is_empty());
    }

    #[test]
    fn command_nibble_puts_low_nibble_on_bus() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.send_command_nibble(0x03);

        assert_eq!(pio.writes_to(PORT_A), vec![0x30]);
        assert_eq!(pio.writes_to(PORT_B), vec![0x00, 0x02, 0x00, 0x01]);
        assert_eq!(signal_bits(&lcd), (true, false));
        assert_eq!(lcd.port_a_shadow(), 0x30);
    }

    #[test]
    fn data_byte_is_sent_as_two_nibbles_with_rs_high() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.send_data(b'A');

        assert_eq!(pio.writes_to(PORT_A), vec![0x41, 0x10]);
        assert_eq!(
            pio.events(),
            vec![
                PioEvent::Write { address: PORT_B, value: 0x01 },
                PioEvent::Write { address: PORT_B, value: 0x03 },
                PioEvent::Write { address: PORT_A, value: 0x41 },
                PioEvent::Write { address: PORT_B, value: 0x01 },
                PioEvent::Write { address: PORT_B, value: 0x03 },
                PioEvent::Write { address: PORT_A, value: 0x10 },
                PioEvent::Write { address: PORT_B, value: 0x01 },
                PioEvent::Write { address: PORT_B, value: 0x01 },
            ]
        );
    }

    #[test]
    fn command_byte_is_sent_with_rs_low() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.send_command(0x0E);

        assert_eq!(pio.writes_to(PORT_A), vec![0x0E, 0xE0]);
        assert_eq!(pio.writes_to(PORT_B), vec![0x00, 0x02, 0x00, 0x02, 0x00, 0x01]);
        assert_eq!(signal_bits(&lcd), (true, false));
    }

    #[test]
    fn configure_ports_uses_fixed_masks() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.configure_ports(&pio);

        assert_eq!(
            pio.events(),
            vec![
                PioEvent::Configure { address: PORT_A, latch: 0x00, direction: 0x0F },
                PioEvent::Configure { address: PORT_B, latch: 0x00, direction: 0xFC },
            ]
        );
    }

    #[test]
    fn reset_sequence() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);
        assert!(!lcd.is_initialised());

        lcd.reset_controller();

        assert!(lcd.is_initialised());
        assert_eq!(
            pio.writes_to(PORT_A),
            vec![0x30, 0x30, 0x30, 0x20, 0x0E, 0xE0, 0x06, 0x60, 0x01, 0x10]
        );
        // RS low, E low before anything reaches the bus.
        assert_eq!(
            pio.events()[..2],
            [
                PioEvent::Write { address: PORT_B, value: 0x00 },
                PioEvent::Write { address: PORT_B, value: 0x00 },
            ]
        );
        assert_eq!(signal_bits(&lcd), (true, false));
    }

    #[test]
    fn display_stops_at_terminator() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);
        lcd.reset_controller();
        pio.clear();

        lcd.display(b"AB\0CD");

        assert_eq!(pio.writes_to(PORT_A), vec![0x41, 0x10, 0x42, 0x20]);
    }

    #[test]
    fn display_without_terminator_sends_whole_slice() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);
        lcd.reset_controller();
        pio.clear();

        lcd.display(b"AB");

        assert_eq!(pio.writes_to(PORT_A), vec![0x41, 0x10, 0x42, 0x20]);
    }

    #[test]
    fn empty_text_sends_nothing() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);
        lcd.reset_controller();
        pio.clear();

        lcd.display(b"");
        lcd.display(b"\0AB");

        assert!(pio.events().is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "before it was initialised")]
    fn display_before_initialise_is_caught() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.display(b"A");
    }

    #[test]
    fn instruction_helpers_match_reset_constants() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.set_display_control(true, true, false);
        lcd.set_entry_mode(CursorDirection::Right, false);
        lcd.clear_display();

        assert_eq!(pio.writes_to(PORT_A), vec![0x0E, 0xE0, 0x06, 0x60, 0x01, 0x10]);
    }

    #[test]
    fn cursor_and_function_helpers() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        lcd.return_home();
        lcd.cursor_shift(true, CursorDirection::Right);
        lcd.cursor_shift(false, CursorDirection::Left);
        lcd.function_set(false, true, false);
        lcd.set_entry_mode(CursorDirection::Left, true);

        assert_eq!(
            pio.writes_to(PORT_A),
            vec![0x02, 0x20, 0x1C, 0xC0, 0x10, 0x00, 0x28, 0x80, 0x05, 0x50]
        );
        assert_eq!(signal_bits(&lcd), (true, false));
    }

    #[test]
    fn address_helpers_validate_range() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b);

        assert_eq!(lcd.set_ddram_address(0x80), Err(PioError::InvalidArgument));
        assert_eq!(lcd.set_cgram_address(0x40), Err(PioError::InvalidArgument));
        assert!(pio.events().is_empty());

        lcd.set_ddram_address(0x40).unwrap();
        assert_eq!(pio.writes_to(PORT_A), vec![0xC0, 0x00]);
    }

    #[test]
    fn timing_does_not_change_bus_traffic() {
        let pio = RecordingPioDriver::new();
        let port_a = pio.get_port(PORT_A).unwrap();
        let port_b = pio.get_port(PORT_B).unwrap();
        let timing = LcdTiming {
            settle: Duration::from_micros(10),
            strobe: Duration::from_micros(1),
        };
        let mut lcd = PioHD44780Driver::new(&*port_a, &*port_b).with_timing(timing);
        assert_eq!(lcd.timing(), timing);

        lcd.send_data(b'A');

        assert_eq!(pio.writes_to(PORT_A), vec![0x41, 0x10]);
    }
}
