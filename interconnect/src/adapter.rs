//! Address-width adapters.
//!
//! Both adapters are pure rewiring. Address, lanes and data reach the wrapped device unmodified
//! apart from truncation to the wires it has, and no cycle of latency is added.

use crate::bus::{BusCmd, Device, PortShape};
use crate::error::ConfigError;

/// A device seen through a port of a different address width.
#[derive(Debug)]
pub struct Rewired<D> {
    inner: D,
    shape: PortShape,
}

impl<D: Device> Rewired<D> {
    pub fn inner(&self) -> &D {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

/// Widen `device`'s port to `width` address bits.
///
/// The low bits of the new port alias the device's own address. The extra high bits are ignored
/// here and must be decoded by whatever contains the result, usually a fabric.
pub fn partial_decode<D: Device>(device: D, width: u32) -> Result<Rewired<D>, ConfigError> {
    let inner = device.shape();
    if width < inner.addr_bits {
        return Err(ConfigError::WidenToNarrower {
            from: inner.addr_bits,
            to: width,
        });
    }
    Ok(Rewired {
        inner: device,
        shape: PortShape::new(width, inner.data_bits)?,
    })
}

/// Narrow `device`'s port to `width` address bits, leaving its upper address lines tied low.
pub fn narrow_addr<D: Device>(device: D, width: u32) -> Result<Rewired<D>, ConfigError> {
    let inner = device.shape();
    if width > inner.addr_bits {
        return Err(ConfigError::NarrowToWider {
            from: inner.addr_bits,
            to: width,
        });
    }
    Ok(Rewired {
        inner: device,
        shape: PortShape::new(width, inner.data_bits)?,
    })
}

impl<D: Device> Device for Rewired<D> {
    fn shape(&self) -> PortShape {
        self.shape
    }

    fn latency(&self) -> u32 {
        self.inner.latency()
    }

    fn respond(&self, cmd: &BusCmd) -> u32 {
        let cmd = self.inner.shape().conform(&self.shape.conform(cmd));
        self.inner.respond(&cmd)
    }

    fn tick(&mut self, cmd: &BusCmd) {
        let cmd = self.inner.shape().conform(&self.shape.conform(cmd));
        self.inner.tick(&cmd)
    }
}
