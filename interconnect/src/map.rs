//! The map module contains the address-space planner.
//!
//! Devices declare how much address space they need up front through a [`DeviceDescriptor`].
//! [`MapBuilder`] walks them in order and hands each one a disjoint, naturally aligned window of
//! the parent space. The resulting [`AddressMap`] can be printed, queried, and used to build a
//! [`WindowedFabric`](crate::windowed::WindowedFabric).

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use log::debug;

use crate::bus::MAX_ADDR_BITS;
use crate::error::ConfigError;
use crate::util::{ceil_log2, mask};

/// Which part of a system a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Memory,
    ProgMem,
    Peripheral,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Memory => write!(f, "memory"),
            Section::ProgMem => write!(f, "progmem"),
            Section::Peripheral => write!(f, "peripheral"),
        }
    }
}

/// How a device states its address requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capacity {
    /// A block of named single-word registers.
    ///
    /// `n` registers take `ceil(log2(n))` address bits, so a power-of-two block fills its window
    /// exactly: two registers need one bit, not two.
    Registers(Vec<String>),
    /// A memory of this many words.
    Words(u64),
    /// An explicit address width.
    AddrBits(u32),
}

impl Capacity {
    /// Address bits needed to reach every word.
    pub fn addr_bits(&self) -> u32 {
        match self {
            Capacity::Registers(regs) => ceil_log2(regs.len() as u64),
            Capacity::Words(words) => ceil_log2(*words),
            Capacity::AddrBits(bits) => *bits,
        }
    }

    /// The named ranges a device of this capacity exposes from `start`.
    fn resources(&self, device: &str, start: u64) -> Vec<Resource> {
        match self {
            Capacity::Registers(regs) => regs
                .iter()
                .zip(start..)
                .map(|(reg, addr)| Resource {
                    name: format!("{}.{}", device, reg),
                    start: addr,
                    end: addr + 1,
                })
                .collect(),
            Capacity::Words(words) => vec![Resource {
                name: device.into(),
                start,
                end: start + *words,
            }],
            Capacity::AddrBits(bits) => vec![Resource {
                name: device.into(),
                start,
                end: start + (1u64 << *bits),
            }],
        }
    }
}

/// A register or memory inside a window, in parent addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub start: u64,
    /// One past the last address.
    pub end: u64,
}

/// Everything the planner needs to know about one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub name: String,
    pub section: Section,
    pub capacity: Capacity,
}

impl DeviceDescriptor {
    pub fn new(name: impl Into<String>, section: Section, capacity: Capacity) -> Self {
        Self {
            name: name.into(),
            section,
            capacity,
        }
    }

    pub fn addr_bits(&self) -> u32 {
        self.capacity.addr_bits()
    }
}

/// Hands out device names from insertion order.
///
/// Each kind gets its own counter, so the third UART described is always `Uart_2`.
#[derive(Debug, Default)]
pub struct Registry {
    counts: BTreeMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the next device of `kind`.
    pub fn describe(&mut self, kind: &str, section: Section, capacity: Capacity) -> DeviceDescriptor {
        let count = self.counts.entry(kind.into()).or_insert(0);
        let name = format!("{}_{}", kind, count);
        *count += 1;
        DeviceDescriptor::new(name, section, capacity)
    }
}

/// An address match over the parent bus: fixed high bits, don't-care low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPattern {
    value: u32,
    mask: u32,
    bits: u32,
}

impl AddressPattern {
    pub fn matches(&self, addr: u32) -> bool {
        addr & self.mask == self.value
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }
}

impl fmt::Display for AddressPattern {
    /// Most significant bit first, `-` for don't-care.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in (0..self.bits).rev() {
            let c = if self.mask >> bit & 1 == 0 {
                '-'
            } else if self.value >> bit & 1 == 1 {
                '1'
            } else {
                '0'
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// The range of the parent space assigned to one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub name: String,
    pub section: Section,
    pub start: u64,
    /// Width of the window, the padding width if one was set.
    pub addr_bits: u32,
    /// Width the device itself asked for.
    pub required_bits: u32,
    pub resources: Vec<Resource>,
}

impl Window {
    pub fn size(&self) -> u64 {
        1 << self.addr_bits
    }

    /// One past the last address.
    pub fn end(&self) -> u64 {
        self.start + self.size()
    }

    pub fn contains(&self, addr: u64) -> bool {
        (self.start..self.end()).contains(&addr)
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// The address the device sees for a parent address inside this window.
    pub fn local(&self, addr: u32) -> u32 {
        (addr as u64).wrapping_sub(self.start) as u32 & mask(self.addr_bits)
    }

    /// The match pattern selecting this window on a `parent_bits`-wide bus.
    pub fn pattern(&self, parent_bits: u32) -> AddressPattern {
        let mask = mask(parent_bits) & !mask(self.addr_bits);
        AddressPattern {
            value: self.start as u32 & mask,
            mask,
            bits: parent_bits,
        }
    }
}

/// Assigns windows to devices in order.
#[derive(Debug)]
pub struct MapBuilder {
    parent_bits: u32,
    pad: Option<u32>,
    windows: Vec<Window>,
    next: u64,
}

impl MapBuilder {
    /// Create a new builder for a parent space of `parent_bits` address bits.
    pub fn new(parent_bits: u32) -> Result<Self, ConfigError> {
        if parent_bits > MAX_ADDR_BITS {
            return Err(ConfigError::AddressTooWide {
                bits: parent_bits,
                max: MAX_ADDR_BITS,
            });
        }
        Ok(Self {
            parent_bits,
            pad: None,
            windows: Vec::new(),
            next: 0,
        })
    }

    /// Give every device a window of exactly `width` bits, so the map can also be decoded with a
    /// flat index.
    pub fn pad(mut self, width: u32) -> Self {
        self.pad = Some(width);
        self
    }

    /// Place `device` at the next free address aligned to its window size.
    pub fn add(&mut self, device: &DeviceDescriptor) -> Result<&Window, ConfigError> {
        let bits = self.window_bits(device, self.next)?;
        let size = 1u64 << bits;
        let start = (self.next + size - 1) & !(size - 1);
        self.place(device, start, bits)
    }

    /// Place `device` at `start`, which must be aligned to the window size.
    pub fn add_at(&mut self, device: &DeviceDescriptor, start: u64) -> Result<&Window, ConfigError> {
        let bits = self.window_bits(device, start)?;
        if start & ((1u64 << bits) - 1) != 0 {
            return Err(ConfigError::WindowMisaligned {
                name: device.name.clone(),
                start,
                bits,
            });
        }
        self.place(device, start, bits)
    }

    pub fn build(self) -> AddressMap {
        AddressMap {
            parent_bits: self.parent_bits,
            pad: self.pad,
            windows: self.windows,
        }
    }

    fn window_bits(&self, device: &DeviceDescriptor, start: u64) -> Result<u32, ConfigError> {
        let required = device.addr_bits();
        let bits = match self.pad {
            Some(pad) if required > pad => {
                return Err(ConfigError::PaddingTooNarrow {
                    name: device.name.clone(),
                    required,
                    pad,
                })
            }
            Some(pad) => pad,
            None => required,
        };
        if bits > self.parent_bits {
            return Err(ConfigError::WindowExceedsParent {
                name: device.name.clone(),
                start,
                bits,
                parent_bits: self.parent_bits,
            });
        }
        Ok(bits)
    }

    fn place(&mut self, device: &DeviceDescriptor, start: u64, bits: u32) -> Result<&Window, ConfigError> {
        // `bits <= parent_bits <= 32`, so neither sum can overflow once `start` is in range.
        let limit = 1u64 << self.parent_bits;
        if start >= limit || start + (1u64 << bits) > limit {
            return Err(ConfigError::WindowExceedsParent {
                name: device.name.clone(),
                start,
                bits,
                parent_bits: self.parent_bits,
            });
        }
        let window = Window {
            name: device.name.clone(),
            section: device.section,
            start,
            addr_bits: bits,
            required_bits: device.addr_bits(),
            resources: device.capacity.resources(&device.name, start),
        };

        if let Some(other) = self.windows.iter().find(|w| w.overlaps(&window)) {
            return Err(ConfigError::WindowOverlap {
                name: window.name,
                other: other.name.clone(),
                start,
            });
        }

        debug!(
            "window {} ({}): {:#x}..{:#x}, {} addr bits",
            window.name,
            window.section,
            window.start,
            window.end(),
            window.addr_bits
        );
        self.next = self.next.max(window.end());
        self.windows.push(window);
        Ok(&self.windows[self.windows.len() - 1])
    }
}

/// A finished plan of the parent address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressMap {
    parent_bits: u32,
    pad: Option<u32>,
    windows: Vec<Window>,
}

impl AddressMap {
    pub fn parent_bits(&self) -> u32 {
        self.parent_bits
    }

    pub fn pad(&self) -> Option<u32> {
        self.pad
    }

    /// Windows in the order the devices were added.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn patterns(&self) -> impl Iterator<Item = (&Window, AddressPattern)> + '_ {
        self.windows
            .iter()
            .map(move |w| (w, w.pattern(self.parent_bits)))
    }

    /// Every register and memory, window by window.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.windows.iter().flat_map(|w| &w.resources)
    }

    /// Total address space handed out.
    pub fn used(&self) -> u64 {
        self.windows.iter().map(|w| w.size()).sum()
    }

    /// The window containing `addr`, with its index.
    pub fn resolve(&self, addr: u32) -> Option<(usize, &Window)> {
        self.windows
            .iter()
            .enumerate()
            .find(|(_, w)| w.contains(addr as u64))
    }

    pub fn by_section(&self) -> BTreeMap<Section, Vec<&Window>> {
        let mut sections: BTreeMap<Section, Vec<&Window>> = BTreeMap::new();
        for w in &self.windows {
            sections.entry(w.section).or_default().push(w);
        }
        sections
    }
}

impl fmt::Display for AddressMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "window patterns{}", "-".repeat(30))?;
        for (w, pattern) in self.patterns() {
            writeln!(f, "{:<24} {}", w.name, pattern)?;
        }
        writeln!(f, "windows{}", "-".repeat(30))?;
        for w in &self.windows {
            writeln!(
                f,
                "{:<24} {:#010x}..{:#010x} {:>2} bits (needs {})",
                w.name,
                w.start,
                w.end(),
                w.addr_bits,
                w.required_bits
            )?;
        }
        writeln!(f, "resources{}", "-".repeat(30))?;
        for r in self.resources() {
            writeln!(f, "{:<24} {:#010x}..{:#010x}", r.name, r.start, r.end)?;
        }
        writeln!(f, "sections{}", "-".repeat(30))?;
        for (section, windows) in self.by_section() {
            let names: Vec<&str> = windows.iter().map(|w| w.name.as_str()).collect();
            writeln!(f, "{:<24} {}", section, names.join(", "))?;
        }
        write!(
            f,
            "used {:#x} of {:#x}",
            self.used(),
            1u64 << self.parent_bits
        )
    }
}
