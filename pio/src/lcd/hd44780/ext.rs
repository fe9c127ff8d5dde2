use crate::lcd::hd44780::driver::HD44780Driver;
use crate::{PioError, PioResult};
use log::warn;
use std::ops::RangeBounds;

pub trait WithinExt {
    fn within(&self, range: impl RangeBounds<Self>) -> bool;
}

impl<T: PartialOrd<T>> WithinExt for T {
    fn within(&self, range: impl RangeBounds<Self>) -> bool {
        range.contains(self)
    }
}

/// DDRAM address of the first column of each row.
///
/// Rows 2 and 3 only exist on 4-line modules, where they continue rows 0 and 1.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];
/// Addressable columns per row. Rows 2 and 3 end where the 40-byte lines of rows 0 and 1 do.
const ROW_COLUMNS: [usize; 4] = [40, 40, 20, 20];

pub trait DisplayExt {
    /// Prints a string, replacing anything that is not ASCII with `?`.
    fn print(&mut self, s: &str);
    fn set_cursor(&mut self, row: usize, col: usize) -> PioResult<()>;
}

impl<T: ?Sized + HD44780Driver> DisplayExt for T {
    fn print(&mut self, s: &str) {
        for c in s.chars() {
            if c.is_ascii() && c != '\0' {
                self.send_data(c as u8);
            } else {
                warn!("Unprintable character: {:?}", c);
                self.send_data(b'?');
            }
        }
    }

    fn set_cursor(&mut self, row: usize, col: usize) -> PioResult<()> {
        if !row.within(0..ROW_OFFSETS.len()) || !col.within(0..ROW_COLUMNS[row]) {
            return Err(PioError::InvalidArgument);
        }
        self.set_ddram_address(ROW_OFFSETS[row] + col as u8)
    }
}
