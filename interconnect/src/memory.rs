//! The memory module contains a simple word-addressed memory that speaks the bus contract.

use alloc::vec::Vec;

use crate::bus::{BusCmd, Device, PortShape};
use crate::error::ConfigError;
use crate::util::bit_length;

/// Width of a memory word.
pub const WORD_BITS: u32 = 16;
const LANES: u32 = WORD_BITS / 8;

/// A 16-bit-wide memory.
///
/// Reads are synchronous and non-transparent: a valid read presented in one cycle shows up on
/// the response during the next, and the read data register holds its value while no read is
/// issued. Writes honor each byte lane independently. A read-only memory ignores write strobes,
/// which makes an initialized memory usable as a program ROM.
#[derive(Debug)]
pub struct BasicMemory {
    words: Vec<u16>,
    shape: PortShape,
    read_only: bool,
    read_data: u16,
}

impl BasicMemory {
    /// Create a new zeroed memory of `depth` words.
    pub fn new(depth: usize) -> Result<Self, ConfigError> {
        Self::with_contents(depth, &[])
    }

    /// Create a new memory exactly as deep as `contents`.
    pub fn from_contents(contents: &[u16]) -> Result<Self, ConfigError> {
        Self::with_contents(contents.len(), contents)
    }

    /// Create a new memory of `depth` words, the first of which are initialized from `contents`.
    pub fn with_contents(depth: usize, contents: &[u16]) -> Result<Self, ConfigError> {
        let depth = depth.max(contents.len());
        if depth == 0 {
            return Err(ConfigError::EmptyDevice {
                name: "basicram".into(),
            });
        }
        let shape = PortShape::new(bit_length(depth as u64 - 1), WORD_BITS)?;
        let mut words = vec![0; depth];
        words[..contents.len()].copy_from_slice(contents);
        Ok(Self {
            words,
            shape,
            read_only: false,
            read_data: 0,
        })
    }

    /// Create a new memory from a little-endian image of halfwords. A trailing odd byte is dropped.
    pub fn from_image(image: &[u8], depth: Option<usize>) -> Result<Self, ConfigError> {
        let contents: Vec<u16> = image
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::with_contents(depth.unwrap_or(0), &contents)
    }

    /// Stop responding to write strobes.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn depth(&self) -> usize {
        self.words.len()
    }

    /// Overwrite the start of the memory with `contents`, bypassing the bus.
    pub fn initialize(&mut self, contents: &[u16]) {
        let len = contents.len().min(self.words.len());
        self.words[..len].copy_from_slice(&contents[..len]);
    }

    /// Look at a word without a bus cycle.
    pub fn peek(&self, addr: u32) -> u16 {
        self.words[self.index(addr)]
    }

    fn index(&self, addr: u32) -> usize {
        addr as usize % self.words.len()
    }
}

impl Device for BasicMemory {
    fn shape(&self) -> PortShape {
        self.shape
    }

    fn respond(&self, _cmd: &BusCmd) -> u32 {
        self.read_data as u32
    }

    fn tick(&mut self, cmd: &BusCmd) {
        if !cmd.valid {
            return;
        }
        let index = self.index(cmd.payload.addr);
        if cmd.payload.lanes == 0 {
            self.read_data = self.words[index];
            return;
        }
        if self.read_only {
            return;
        }
        let mut word = self.words[index];
        for lane in 0..LANES {
            if cmd.payload.lanes >> lane & 1 == 1 {
                let byte_mask = 0xffu16 << (lane * 8);
                word = (word & !byte_mask) | (cmd.payload.data as u16 & byte_mask);
            }
        }
        self.words[index] = word;
    }
}
