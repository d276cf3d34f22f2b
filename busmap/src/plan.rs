use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use interconnect::{AddressMap, Capacity, DeviceDescriptor, MapBuilder, Registry, Section};
use log::info;

use crate::PlanCommand;

/// One `--device` argument: `KIND[@SECTION]:CAPACITY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub kind: String,
    pub section: Section,
    pub capacity: Capacity,
}

fn parse_section(s: &str) -> Result<Section> {
    match s {
        "memory" => Ok(Section::Memory),
        "progmem" => Ok(Section::ProgMem),
        "peripheral" => Ok(Section::Peripheral),
        _ => bail!("unknown section `{}` (memory, progmem, peripheral)", s),
    }
}

fn parse_capacity(s: &str) -> Result<Capacity> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("capacity `{}` is not KEY=VALUE", s))?;
    match key {
        "regs" => Ok(Capacity::Registers(
            value.split(',').filter(|r| !r.is_empty()).map(String::from).collect(),
        )),
        "words" => Ok(Capacity::Words(
            value.parse().with_context(|| format!("bad word count `{}`", value))?,
        )),
        "bits" => Ok(Capacity::AddrBits(
            value.parse().with_context(|| format!("bad bit width `{}`", value))?,
        )),
        _ => bail!("unknown capacity `{}` (regs, words, bits)", key),
    }
}

impl FromStr for DeviceSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (head, capacity) = s
            .split_once(':')
            .ok_or_else(|| anyhow!("device `{}` is missing `:CAPACITY`", s))?;
        let (kind, section) = match head.split_once('@') {
            Some((kind, section)) => (kind, parse_section(section)?),
            None => (head, Section::Peripheral),
        };
        if kind.is_empty() {
            bail!("device `{}` has no kind", s);
        }
        Ok(Self {
            kind: kind.to_string(),
            section,
            capacity: parse_capacity(capacity)?,
        })
    }
}

#[derive(Debug)]
pub struct Planner {
    parent_bits: u32,
    pad: Option<u32>,
    devices: Vec<DeviceDescriptor>,
}

impl Planner {
    pub fn new(args: PlanCommand) -> Result<Self> {
        let devices = match args.board {
            Some(board) => board.descriptors(),
            None => {
                let mut registry = Registry::new();
                args.devices
                    .into_iter()
                    .map(|d| registry.describe(&d.kind, d.section, d.capacity))
                    .collect()
            }
        };
        Ok(Self {
            parent_bits: args.parent_bits,
            pad: args.pad,
            devices,
        })
    }

    pub fn plan(&self) -> Result<AddressMap> {
        let mut builder = MapBuilder::new(self.parent_bits)?;
        if let Some(pad) = self.pad {
            builder = builder.pad(pad);
        }
        for d in &self.devices {
            builder
                .add(d)
                .with_context(|| format!("placing {}", d.name))?;
        }
        Ok(builder.build())
    }

    pub fn go(self) -> Result<()> {
        let map = self.plan()?;
        info!(
            "planned {} devices in a {}-bit space",
            map.windows().len(),
            map.parent_bits()
        );
        println!("{}", map);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_device_specs() {
        let uart: DeviceSpec = "Uart@peripheral:regs=TX,RX".parse().unwrap();
        assert_eq!(uart.kind, "Uart");
        assert_eq!(uart.section, Section::Peripheral);
        assert_eq!(uart.capacity, Capacity::Registers(vec!["TX".into(), "RX".into()]));

        let ram: DeviceSpec = "Ram@memory:words=1024".parse().unwrap();
        assert_eq!(ram.capacity, Capacity::Words(1024));

        let spram: DeviceSpec = "Spram:bits=14".parse().unwrap();
        assert_eq!(spram.section, Section::Peripheral);
        assert_eq!(spram.capacity, Capacity::AddrBits(14));
    }

    #[test]
    fn rejects_bad_specs() {
        assert!("Uart".parse::<DeviceSpec>().is_err());
        assert!(":words=4".parse::<DeviceSpec>().is_err());
        assert!("Ram@rom:words=4".parse::<DeviceSpec>().is_err());
        assert!("Ram:pages=4".parse::<DeviceSpec>().is_err());
        assert!("Ram:words=lots".parse::<DeviceSpec>().is_err());
    }

    #[test]
    fn board_devices_plan_like_the_fabric() {
        let planner = Planner {
            parent_bits: crate::board::Board::Upduino.bus_addr_bits(),
            pad: Some(crate::board::Board::Upduino.ram_addr_bits()),
            devices: crate::board::Board::Upduino.descriptors(),
        };
        let map = planner.plan().unwrap();
        let starts: Vec<u64> = map.windows().iter().map(|w| w.start).collect();
        assert_eq!(starts, [0x000, 0x100]);
        assert_eq!(map.windows()[1].name, "OutputPort_0");
    }
}
