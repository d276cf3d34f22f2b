//! The error module contains the configuration-time failures of the interconnect.
//!
//! Nothing in here is produced by bus traffic. Every variant is raised while a topology is being
//! assembled, before the first cycle runs.

use thiserror::Error;

/// All the ways assembling a topology can fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A fabric was given an empty device list.
    #[error("a fabric needs at least one device")]
    NoDevices,
    /// `partial_decode` asked to produce a port narrower than the device it wraps.
    #[error("can't use partial_decode to make a bus narrower ({from} -> {to} addr bits)")]
    WidenToNarrower { from: u32, to: u32 },
    /// `narrow_addr` asked to produce a port wider than the device it wraps.
    #[error("can't use narrow_addr to make a bus wider ({from} -> {to} addr bits)")]
    NarrowToWider { from: u32, to: u32 },
    #[error("{bits} address bits requested, at most {max} are supported")]
    AddressTooWide { bits: u32, max: u32 },
    #[error("{bits} data bits requested, at most {max} are supported")]
    DataTooWide { bits: u32, max: u32 },
    /// A memory was declared with neither a depth nor any contents.
    #[error("device `{name}` has no storage: give it a depth or contents")]
    EmptyDevice { name: String },
    /// The planner ran out of parent address space.
    #[error("window `{name}` at {start:#x} ({bits} bits) does not fit in a {parent_bits}-bit space")]
    WindowExceedsParent {
        name: String,
        start: u64,
        bits: u32,
        parent_bits: u32,
    },
    #[error("window `{name}` at {start:#x} overlaps window `{other}`")]
    WindowOverlap {
        name: String,
        other: String,
        start: u64,
    },
    /// An explicitly placed window does not start on a multiple of its own size.
    #[error("window `{name}` at {start:#x} is not aligned to its {bits}-bit size")]
    WindowMisaligned { name: String, start: u64, bits: u32 },
    #[error("device `{name}` needs {required} addr bits but the padding width is {pad}")]
    PaddingTooNarrow { name: String, required: u32, pad: u32 },
    #[error("device `{name}` has {device_bits} addr bits but its window only has {window_bits}")]
    DeviceTooWideForWindow {
        name: String,
        device_bits: u32,
        window_bits: u32,
    },
    #[error("address map has {windows} windows but {devices} devices were attached")]
    DeviceCountMismatch { windows: usize, devices: usize },
}
