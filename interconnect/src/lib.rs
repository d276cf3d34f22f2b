//! A single-master bus interconnect for a small embedded processor, simulated cycle by cycle.
//!
//! One initiator issues at most one command per cycle. A fabric decodes the target from the
//! address, strobes `valid` on exactly that device and steers its response back. Topologies are
//! assembled once, and every way they can be wrong is reported while assembling them.

extern crate alloc;

pub mod adapter;
pub mod bus;
pub mod error;
pub mod flat;
pub mod gpio;
pub mod map;
pub mod memory;
pub mod util;
pub mod windowed;

pub use adapter::{narrow_addr, partial_decode};
pub use bus::{BusCmd, Command, Device, Initiator, PortShape};
pub use error::ConfigError;
pub use flat::FlatFabric;
pub use map::{AddressMap, Capacity, DeviceDescriptor, MapBuilder, Registry, Section};
pub use windowed::WindowedFabric;
