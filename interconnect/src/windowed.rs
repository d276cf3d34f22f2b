//! The windowed fabric: a crossbar selecting its target by matching the address against the
//! patterns of a planned [`AddressMap`].

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, trace};

use crate::bus::{BusCmd, Command, Device, PortShape};
use crate::error::ConfigError;
use crate::map::{AddressMap, AddressPattern};

/// Routes one initiator to devices of different address widths.
///
/// Each device sits in its own window of the map and sees addresses relative to the window
/// base. The matched device's response is passed straight through in the same cycle, so the
/// fabric adds no latency of its own.
///
/// An address outside every window selects no device. The response is then
/// [`default_response`](Self::default_response) and the miss is counted.
pub struct WindowedFabric {
    map: AddressMap,
    patterns: Vec<AddressPattern>,
    devices: Vec<Box<dyn Device>>,
    shape: PortShape,
    default_response: u32,
    misses: u64,
}

impl WindowedFabric {
    /// Create a new fabric. `devices` are attached to the map's windows in order.
    pub fn new(map: AddressMap, devices: Vec<Box<dyn Device>>) -> Result<Self, ConfigError> {
        if devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        if devices.len() != map.windows().len() {
            return Err(ConfigError::DeviceCountMismatch {
                windows: map.windows().len(),
                devices: devices.len(),
            });
        }
        for (w, d) in map.windows().iter().zip(&devices) {
            if d.shape().addr_bits > w.addr_bits {
                return Err(ConfigError::DeviceTooWideForWindow {
                    name: w.name.clone(),
                    device_bits: d.shape().addr_bits,
                    window_bits: w.addr_bits,
                });
            }
        }

        let data_bits = devices.iter().map(|d| d.shape().data_bits).max().unwrap_or(0);
        let shape = PortShape::new(map.parent_bits(), data_bits)?;
        let patterns: Vec<AddressPattern> = map.patterns().map(|(_, p)| p).collect();

        debug!(
            "fabric configured for {} addr bits, {} data bits",
            shape.addr_bits, shape.data_bits
        );
        for (w, p) in map.windows().iter().zip(&patterns) {
            debug!("  {} matches {}", w.name, p);
        }

        Ok(Self {
            map,
            patterns,
            devices,
            shape,
            default_response: 0,
            misses: 0,
        })
    }

    /// Drive `value` onto the response when no window matches.
    pub fn with_default_response(mut self, value: u32) -> Self {
        self.default_response = value & self.shape.data_mask();
        self
    }

    pub fn default_response(&self) -> u32 {
        self.default_response
    }

    /// Valid commands that matched no window.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn map(&self) -> &AddressMap {
        &self.map
    }

    pub fn device(&self, index: usize) -> Option<&dyn Device> {
        self.devices.get(index).map(|d| &**d)
    }

    /// Index of the window matching `addr`.
    pub fn select(&self, addr: u32) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(addr))
    }

    fn fan_out(&self, cmd: &BusCmd, index: usize, selected: Option<usize>) -> BusCmd {
        let window = &self.map.windows()[index];
        let out = BusCmd {
            valid: cmd.valid && selected == Some(index),
            payload: Command {
                addr: window.local(cmd.payload.addr),
                ..cmd.payload
            },
        };
        self.devices[index].shape().conform(&out)
    }
}

impl Device for WindowedFabric {
    fn shape(&self) -> PortShape {
        self.shape
    }

    fn latency(&self) -> u32 {
        self.devices.iter().map(|d| d.latency()).max().unwrap_or(0)
    }

    fn respond(&self, cmd: &BusCmd) -> u32 {
        match self.select(cmd.payload.addr) {
            Some(i) => {
                let d = &self.devices[i];
                d.respond(&self.fan_out(cmd, i, Some(i))) & d.shape().data_mask()
            }
            None => self.default_response,
        }
    }

    fn tick(&mut self, cmd: &BusCmd) {
        let selected = self.select(cmd.payload.addr);
        if cmd.valid {
            match selected {
                Some(i) => trace!(
                    "windowed fabric: {:#x} -> {}",
                    cmd.payload.addr,
                    self.map.windows()[i].name
                ),
                None => {
                    trace!("windowed fabric: no window matches {:#x}", cmd.payload.addr);
                    self.misses += 1;
                }
            }
        }
        for i in 0..self.devices.len() {
            let out = self.fan_out(cmd, i, selected);
            self.devices[i].tick(&out);
        }
    }
}
