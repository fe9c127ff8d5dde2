use crate::{PioConfigurator, PioDriver, PioError, PioGroup, PioPort, PioPortId, PioResult, PortAddress};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::sync::atomic::AtomicU8;

/// Where the PIO registers live in physical memory.
///
/// Each controller occupies four byte registers starting at
/// `base_address + group.index() * group_stride`: port A data, port B data, port A control and
/// port B control.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawPioLayout {
    pub base_address: u64,
    pub group_stride: usize,
}

impl Default for RawPioLayout {
    fn default() -> Self {
        RawPioLayout {
            base_address: 0x0000_0000,
            group_stride: 4,
        }
    }
}

pub struct RawPioDriver {
    mmap: MmapRaw,
    /// Offset of PIO0 port A data inside the mapping.
    window_offset: usize,
    group_stride: usize,
    used_ports: BitVec<AtomicU8>,
}

impl RawPioDriver {
    const PAGE_SIZE: u64 = 4096;
    const REGISTERS_PER_GROUP: usize = 4;

    // Z80 PIO control words
    const MODE_BIT_CONTROL: u8 = 0xCF;
    const INTERRUPT_DISABLE: u8 = 0x07;

    pub fn create(path: &str, layout: RawPioLayout) -> PioResult<Self> {
        if layout.group_stride < Self::REGISTERS_PER_GROUP {
            return Err(PioError::InvalidArgument);
        }

        let page_base = layout.base_address & !(Self::PAGE_SIZE - 1);
        let window_offset = (layout.base_address - page_base) as usize;
        // Every register offset is below `window_end`, so the writes stay inside the mapping.
        let window_end = layout
            .group_stride
            .checked_mul(PioGroup::ALL.len() - 1)
            .and_then(|groups| groups.checked_add(window_offset))
            .and_then(|end| end.checked_add(Self::REGISTERS_PER_GROUP))
            .filter(|&end| end <= Self::PAGE_SIZE as usize)
            .ok_or(PioError::InvalidArgument)?;
        debug!("PIO register window spans {:#x}..{:#x}", window_offset, window_end);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        let mmap = MmapOptions::new()
            .offset(page_base)
            .len(Self::PAGE_SIZE as usize)
            .map_raw(&file)?;

        debug!("Mapped PIO registers of {} at {:#x}", path, layout.base_address);

        Ok(RawPioDriver {
            mmap,
            window_offset,
            group_stride: layout.group_stride,
            used_ports: BitVec::repeat(false, PortAddress::COUNT),
        })
    }

    pub fn new_mem(layout: RawPioLayout) -> PioResult<Self> {
        Self::create("/dev/mem", layout)
    }

    fn register_offset(&self, group: PioGroup, register: usize) -> usize {
        self.window_offset + group.index() * self.group_stride + register
    }

    fn data_register(&self, address: PortAddress) -> usize {
        self.register_offset(address.group, address.port.index())
    }

    fn control_register(&self, address: PortAddress) -> usize {
        let register = match address.port {
            PioPortId::A => 2,
            PioPortId::B => 3,
        };
        self.register_offset(address.group, register)
    }

    pub(crate) fn raw_write(&self, offset: usize, value: u8) {
        // The offset is bounds-checked against the mapping length in `create`.
        let register_ptr = unsafe { self.mmap.as_mut_ptr().add(offset) };
        unsafe { register_ptr.write_volatile(value) };
    }
}

impl Debug for RawPioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawPioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl PioConfigurator for RawPioDriver {
    fn configure_port(&self, address: PortAddress, latch: u8, direction: u8) {
        debug!(
            "Configuring {}: latch={:08b} direction={:08b}",
            address, latch, direction
        );

        let control = self.control_register(address);
        self.raw_write(self.data_register(address), latch);
        self.raw_write(control, Self::MODE_BIT_CONTROL);
        self.raw_write(control, direction);
        self.raw_write(control, Self::INTERRUPT_DISABLE);
    }
}

impl PioDriver for RawPioDriver {
    fn get_port(&self, address: PortAddress) -> PioResult<Box<dyn PioPort + '_>> {
        let index = address.index();
        if self.used_ports[index] {
            return Err(PioError::AlreadyInUse);
        }

        self.used_ports.set_aliased(index, true);

        Ok(Box::new(RawPioPort {
            driver: self,
            address,
            offset: self.data_register(address),
        }))
    }
}

struct RawPioPort<'a> {
    driver: &'a RawPioDriver,
    address: PortAddress,
    offset: usize,
}

impl Debug for RawPioPort<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[{}]", self.driver, self.address)
    }
}

impl PioPort for RawPioPort<'_> {
    fn address(&self) -> PortAddress {
        self.address
    }

    fn write(&self, value: u8) {
        self.driver.raw_write(self.offset, value);
    }
}

impl Drop for RawPioPort<'_> {
    fn drop(&mut self) {
        self.driver.used_ports.set_aliased(self.address.index(), false);
    }
}
