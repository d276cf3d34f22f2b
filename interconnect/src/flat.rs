//! The flat fabric: a crossbar selecting its target with the high address bits as a direct index.

use alloc::boxed::Box;
use alloc::vec::Vec;

use log::{debug, trace};

use crate::bus::{BusCmd, Command, Device, PortShape};
use crate::error::ConfigError;
use crate::util::{ceil_log2, mask, tree_reduce};

/// Routes one initiator to `N` devices.
///
/// The external port carries `addr_bits + extra_bits` address bits, where `addr_bits` is the
/// widest device address and `extra_bits = ceil(log2(N))`. The top `extra_bits` pick the device.
/// The index is registered on every clock edge and steers the response multiplexer during the
/// following cycle, so responses come back one cycle after the command.
///
/// Only one transaction may be in flight. A second command issued before the first response is
/// sampled overwrites the registered index.
pub struct FlatFabric {
    devices: Vec<Box<dyn Device>>,
    addr_bits: u32,
    data_bits: u32,
    extra_bits: u32,
    shape: PortShape,
    last_id: u32,
}

impl FlatFabric {
    /// Create a new fabric over `devices`. Device `i` answers where the high index bits equal `i`.
    pub fn new(devices: Vec<Box<dyn Device>>) -> Result<Self, ConfigError> {
        if devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }

        let data_bits = devices.iter().map(|d| d.shape().data_bits).max().unwrap_or(0);
        let addr_bits = devices.iter().map(|d| d.shape().addr_bits).max().unwrap_or(0);
        let extra_bits = ceil_log2(devices.len() as u64);
        let shape = PortShape::new(addr_bits + extra_bits, data_bits)?;

        debug!(
            "fabric configured for {} addr bits, {} data bits",
            addr_bits, data_bits
        );
        for (i, d) in devices.iter().enumerate() {
            let s = d.shape();
            debug!(
                "  device #{} at {:#x}: {} addr bits, {} data bits",
                i,
                (i as u64) << addr_bits,
                s.addr_bits,
                s.data_bits
            );
        }

        Ok(Self {
            devices,
            addr_bits,
            data_bits,
            extra_bits,
            shape,
            last_id: 0,
        })
    }

    /// Address bits passed through to the devices.
    pub fn addr_bits(&self) -> u32 {
        self.addr_bits
    }

    pub fn data_bits(&self) -> u32 {
        self.data_bits
    }

    /// Address bits used to index the devices.
    pub fn extra_bits(&self) -> u32 {
        self.extra_bits
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// The device index latched on the last clock edge.
    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    pub fn device(&self, index: usize) -> Option<&dyn Device> {
        self.devices.get(index).map(|d| &**d)
    }

    /// Index of the device the address selects.
    pub fn device_id(&self, addr: u32) -> u32 {
        addr.checked_shr(self.addr_bits).unwrap_or(0) & mask(self.extra_bits)
    }

    /// The command device `index` sees. Payload is broadcast; `valid` only reaches the selected one.
    fn fan_out(&self, cmd: &BusCmd, index: usize, device_id: u32) -> BusCmd {
        let out = BusCmd {
            valid: cmd.valid && device_id as usize == index,
            payload: Command {
                addr: cmd.payload.addr & mask(self.addr_bits),
                ..cmd.payload
            },
        };
        self.devices[index].shape().conform(&out)
    }
}

impl Device for FlatFabric {
    fn shape(&self) -> PortShape {
        self.shape
    }

    fn latency(&self) -> u32 {
        self.devices.iter().map(|d| d.latency()).max().unwrap_or(0).max(1)
    }

    fn respond(&self, cmd: &BusCmd) -> u32 {
        let device_id = self.device_id(cmd.payload.addr);
        let responses: Vec<u32> = self
            .devices
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let select = if self.last_id as usize == i { u32::MAX } else { 0 };
                let resp = d.respond(&self.fan_out(cmd, i, device_id)) & d.shape().data_mask();
                resp & select
            })
            .collect();
        tree_reduce(&responses, &|a, b| a | b).unwrap_or(0)
    }

    fn tick(&mut self, cmd: &BusCmd) {
        let device_id = self.device_id(cmd.payload.addr);
        if cmd.valid {
            trace!(
                "flat fabric: {:#x} -> device #{} local {:#x}",
                cmd.payload.addr,
                device_id,
                cmd.payload.addr & mask(self.addr_bits)
            );
        }
        for i in 0..self.devices.len() {
            let out = self.fan_out(cmd, i, device_id);
            self.devices[i].tick(&out);
        }
        // Latched whether or not the command is valid; it is only consumed when a response is
        // being waited for.
        self.last_id = device_id;
    }
}
