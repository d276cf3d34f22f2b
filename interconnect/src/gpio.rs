//! A register of output pins on the bus.

use crate::bus::{BusCmd, Device, PortShape};
use crate::error::ConfigError;
use crate::memory::WORD_BITS;
use crate::util::mask;

/// Up to 16 output pins behind a single bus word.
///
/// The port has no address bits of its own; give it a place in a fabric with
/// [`partial_decode`](crate::adapter::partial_decode). Writes update the pins lane by lane, reads
/// return the pin state one cycle later.
#[derive(Debug)]
pub struct OutputPort {
    width: u32,
    pins: u16,
    read_data: u16,
}

impl OutputPort {
    /// Create a new port driving `width` pins, all low.
    pub fn new(width: u32) -> Result<Self, ConfigError> {
        if width > WORD_BITS {
            return Err(ConfigError::DataTooWide {
                bits: width,
                max: WORD_BITS,
            });
        }
        Ok(Self {
            width,
            pins: 0,
            read_data: 0,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn pins(&self) -> u16 {
        self.pins
    }

    pub fn pin(&self, index: u32) -> bool {
        index < self.width && self.pins >> index & 1 == 1
    }
}

impl Device for OutputPort {
    fn shape(&self) -> PortShape {
        PortShape {
            addr_bits: 0,
            data_bits: WORD_BITS,
        }
    }

    fn respond(&self, _cmd: &BusCmd) -> u32 {
        self.read_data as u32
    }

    fn tick(&mut self, cmd: &BusCmd) {
        if !cmd.valid {
            return;
        }
        if cmd.payload.lanes == 0 {
            self.read_data = self.pins;
            return;
        }
        let mut pins = self.pins;
        for lane in 0..WORD_BITS / 8 {
            if cmd.payload.lanes >> lane & 1 == 1 {
                let byte_mask = 0xffu16 << (lane * 8);
                pins = (pins & !byte_mask) | (cmd.payload.data as u16 & byte_mask);
            }
        }
        self.pins = pins & mask(self.width) as u16;
    }
}
