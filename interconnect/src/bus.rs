//! The bus module contains the transaction contract shared by the master, the fabrics and every
//! target device.
//!
//! Time advances in lock-step cycles. Within a cycle every device first computes its response
//! combinationally from the command presented to it ([`Device::respond`]), then all devices see
//! the same clock edge ([`Device::tick`]). There is no backpressure: a target accepts or ignores
//! whatever it is handed on each edge.

use log::trace;

use crate::error::ConfigError;
use crate::util::mask;

/// Widest address a port may carry.
pub const MAX_ADDR_BITS: u32 = 32;
/// Widest data path a port may carry.
pub const MAX_DATA_BITS: u32 = 32;

/// Address and data widths of a port, fixed at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortShape {
    pub addr_bits: u32,
    pub data_bits: u32,
}

impl PortShape {
    /// Create a new `PortShape`, rejecting widths the simulation cannot carry.
    pub fn new(addr_bits: u32, data_bits: u32) -> Result<Self, ConfigError> {
        if addr_bits > MAX_ADDR_BITS {
            return Err(ConfigError::AddressTooWide {
                bits: addr_bits,
                max: MAX_ADDR_BITS,
            });
        }
        if data_bits > MAX_DATA_BITS {
            return Err(ConfigError::DataTooWide {
                bits: data_bits,
                max: MAX_DATA_BITS,
            });
        }
        Ok(Self {
            addr_bits,
            data_bits,
        })
    }

    /// Number of byte lanes, `ceil(data_bits / 8)`.
    pub fn lanes(&self) -> u32 {
        (self.data_bits + 7) / 8
    }

    pub fn addr_mask(&self) -> u32 {
        mask(self.addr_bits)
    }

    pub fn data_mask(&self) -> u32 {
        mask(self.data_bits)
    }

    pub fn lane_mask(&self) -> u8 {
        mask(self.lanes()) as u8
    }

    /// Truncate a command to the wires this port actually has, the way assigning a wide signal to
    /// a narrow one drops the high bits.
    pub fn conform(&self, cmd: &BusCmd) -> BusCmd {
        BusCmd {
            valid: cmd.valid,
            payload: Command {
                addr: cmd.payload.addr & self.addr_mask(),
                lanes: cmd.payload.lanes & self.lane_mask(),
                data: cmd.payload.data & self.data_mask(),
            },
        }
    }
}

/// The payload of a bus command.
///
/// `lanes == 0` is a read. Each set bit in `lanes` enables the write of the matching byte of
/// `data`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub addr: u32,
    pub lanes: u8,
    pub data: u32,
}

impl Command {
    pub fn read(addr: u32) -> Self {
        Self {
            addr,
            lanes: 0,
            data: 0,
        }
    }

    pub fn write(addr: u32, lanes: u8, data: u32) -> Self {
        Self { addr, lanes, data }
    }

    pub fn is_read(&self) -> bool {
        self.lanes == 0
    }
}

/// The initiator-to-target half of a bus port: a payload and its valid strobe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusCmd {
    pub valid: bool,
    pub payload: Command,
}

impl BusCmd {
    /// A command the target must act on this cycle.
    pub fn valid(payload: Command) -> Self {
        Self {
            valid: true,
            payload,
        }
    }

    /// The payload wires still driven, but nothing for the target to do.
    pub fn idle(payload: Command) -> Self {
        Self {
            valid: false,
            payload,
        }
    }
}

/// A bus target: anything exposing the flipped side of a bus port.
///
/// Fabrics and address adapters are devices too, so topologies nest.
pub trait Device {
    /// The port this device exposes to whatever drives it.
    fn shape(&self) -> PortShape;

    /// Number of cycles between a valid read and its data appearing on `resp`.
    fn latency(&self) -> u32 {
        1
    }

    /// The combinational response for the command presented during the current cycle.
    fn respond(&self, cmd: &BusCmd) -> u32;

    /// The clock edge ending the current cycle. A valid command is consumed here.
    fn tick(&mut self, cmd: &BusCmd);
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn shape(&self) -> PortShape {
        (**self).shape()
    }

    fn latency(&self) -> u32 {
        (**self).latency()
    }

    fn respond(&self, cmd: &BusCmd) -> u32 {
        (**self).respond(cmd)
    }

    fn tick(&mut self, cmd: &BusCmd) {
        (**self).tick(cmd)
    }
}

/// The bus master's side of a port.
///
/// It keeps at most one transaction in flight: [`Initiator::issue`] presents a command and then
/// holds the address with `valid` low until the target's latency has elapsed.
pub struct Initiator<D: Device> {
    target: D,
    cycle: u64,
    last: Command,
}

impl<D: Device> Initiator<D> {
    /// Create a new initiator driving `target`.
    pub fn new(target: D) -> Self {
        Self {
            target,
            cycle: 0,
            last: Command::default(),
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }

    /// Number of cycles run so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Run exactly one cycle and return the response observed during it.
    pub fn step(&mut self, cmd: BusCmd) -> u32 {
        let shape = self.target.shape();
        let cmd = shape.conform(&cmd);
        let resp = self.target.respond(&cmd) & shape.data_mask();
        self.target.tick(&cmd);

        trace!(
            "cycle {}: valid={} addr={:#x} lanes={:#b} data={:#x} -> resp={:#x}",
            self.cycle,
            cmd.valid,
            cmd.payload.addr,
            cmd.payload.lanes,
            cmd.payload.data,
            resp
        );
        self.cycle += 1;
        self.last = cmd.payload;
        resp
    }

    /// Issue one command and return the response sampled once the target's latency has elapsed.
    pub fn issue(&mut self, payload: Command) -> u32 {
        let mut resp = self.step(BusCmd::valid(payload));
        for _ in 0..self.target.latency() {
            resp = self.step(BusCmd::idle(payload));
        }
        resp
    }

    pub fn read(&mut self, addr: u32) -> u32 {
        self.issue(Command::read(addr))
    }

    pub fn write(&mut self, addr: u32, lanes: u8, data: u32) {
        self.issue(Command::write(addr, lanes, data));
    }

    /// Run one cycle with `valid` low, holding the last payload on the wires.
    pub fn idle(&mut self) -> u32 {
        self.step(BusCmd::idle(self.last))
    }
}
