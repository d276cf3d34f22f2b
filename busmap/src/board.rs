use clap::ValueEnum;
use interconnect::gpio::OutputPort;
use interconnect::memory::BasicMemory;
use interconnect::util::bit_length;
use interconnect::{
    partial_decode, Capacity, ConfigError, Device, DeviceDescriptor, FlatFabric, Registry, Section,
};

/// Board presets. Each one is a RAM plus an output port behind a flat fabric.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
#[value(rename_all = "snake_case")]
pub enum Board {
    Upduino,
    /// An 8-pin output port stands in for the board's UART, which sits behind the same
    /// `partial_decode` but is not modelled here.
    Tinybx,
}

impl Board {
    /// RAM depth in 16-bit words.
    pub fn ram_words(&self) -> usize {
        match self {
            Board::Upduino => 256,
            Board::Tinybx => 256 * 2,
        }
    }

    /// Number of output pins.
    pub fn port_pins(&self) -> u32 {
        match self {
            Board::Upduino => 1,
            Board::Tinybx => 8,
        }
    }

    pub fn ram_addr_bits(&self) -> u32 {
        bit_length(self.ram_words() as u64 - 1)
    }

    /// The RAM plus one index bit selecting the port.
    pub fn bus_addr_bits(&self) -> u32 {
        self.ram_addr_bits() + 1
    }

    /// Build the board's bus. The port is widened to the RAM's address width so the fabric only
    /// needs a single index bit.
    pub fn assemble(&self) -> Result<FlatFabric, ConfigError> {
        let mem = BasicMemory::new(self.ram_words())?;
        let port = partial_decode(OutputPort::new(self.port_pins())?, self.ram_addr_bits())?;
        let devices: Vec<Box<dyn Device>> = vec![Box::new(mem), Box::new(port)];
        FlatFabric::new(devices)
    }

    /// The same devices, described for the planner.
    pub fn descriptors(&self) -> Vec<DeviceDescriptor> {
        let mut registry = Registry::new();
        vec![
            registry.describe("BasicMemory", Section::Memory, Capacity::Words(self.ram_words() as u64)),
            registry.describe(
                "OutputPort",
                Section::Peripheral,
                Capacity::Registers(vec!["PINS".into()]),
            ),
        ]
    }
}
