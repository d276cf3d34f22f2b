
use interconnect::memory::BasicMemory;
use interconnect::{
    AddressMap, BusCmd, Capacity, Command, ConfigError, Device, Initiator, MapBuilder, Registry, Section,
    WindowedFabric,
};

/// Uart_0 at 0x00 (1 bit), FakeMem_0 at 0x10 (4 bits), TurboEncabulator_0 at 0x20 (3 bits).
fn plan() -> AddressMap {
    let mut registry = Registry::new();
    let mut builder = MapBuilder::new(8).unwrap();
    builder
        .add(&registry.describe(
            "Uart",
            Section::Peripheral,
            Capacity::Registers(vec!["TX".into(), "RX".into()]),
        ))
        .unwrap();
    builder
        .add(&registry.describe("FakeMem", Section::Memory, Capacity::Words(16)))
        .unwrap();
    builder
        .add(&registry.describe("TurboEncabulator", Section::Peripheral, Capacity::AddrBits(3)))
        .unwrap();
    builder.build()
}

fn fabric() -> (WindowedFabric, Vec<helper::Seen>) {
    let map = plan();
    let widths: Vec<u32> = map.windows().iter().map(|w| w.addr_bits).collect();
    let (devices, seen): (Vec<Box<dyn Device>>, Vec<helper::Seen>) = widths
        .iter()
        .enumerate()
        .map(|(i, bits)| {
            let (probe, seen) = helper::Probe::new(*bits, i as u32 + 1);
            (Box::new(probe) as Box<dyn Device>, seen)
        })
        .unzip();
    (WindowedFabric::new(map, devices).unwrap(), seen)
}

#[test]
fn matched_window_gets_valid_and_answers() {
    let (fabric, seen) = fabric();
    let windows = fabric.map().windows().to_vec();
    let mut bus = Initiator::new(fabric);
    assert_eq!(bus.target().latency(), 0);

    for addr in 0..=0xffu32 {
        let resp = bus.step(BusCmd::valid(Command::read(addr)));
        let hit = windows.iter().position(|w| w.contains(addr as u64));
        for (i, s) in seen.iter().enumerate() {
            assert_eq!(helper::last(s).valid, hit == Some(i), "addr {:#x} device {}", addr, i);
        }
        match hit {
            Some(k) => {
                let local = addr - windows[k].start as u32;
                assert_eq!(helper::last(&seen[k]).payload.addr, local);
                // Passed through in the same cycle.
                assert_eq!(resp, (k as u32 + 1) << 8 | local);
            }
            None => assert_eq!(resp, 0),
        }
    }
}

#[test]
fn misses_use_the_default_response() {
    let (fabric, seen) = fabric();
    let mut bus = Initiator::new(fabric.with_default_response(0xdead));

    assert_eq!(bus.read(0x02), 0xdead);
    assert_eq!(bus.read(0xf0), 0xdead);
    assert!(seen.iter().all(|s| s.borrow().iter().all(|c| !c.valid)));
    assert_eq!(bus.target().misses(), 2);

    // Idle cycles outside every window are not misses.
    bus.step(BusCmd::idle(Command::read(0x80)));
    assert_eq!(bus.target().misses(), 2);

    assert_eq!(bus.read(0x21), 3 << 8 | 0x1);
    assert_eq!(bus.target().misses(), 2);
}

#[test]
fn select_matches_resolve() {
    let (fabric, _) = fabric();
    for addr in 0..=0xffu32 {
        assert_eq!(
            fabric.select(addr),
            fabric.map().resolve(addr).map(|(i, _)| i),
            "addr {:#x}",
            addr
        );
    }
}

#[test]
fn memories_behind_windows() {
    let mut builder = MapBuilder::new(12).unwrap();
    let mut registry = Registry::new();
    builder
        .add(&registry.describe("ProgMem", Section::ProgMem, Capacity::Words(512)))
        .unwrap();
    builder
        .add(&registry.describe("Ram", Section::Memory, Capacity::Words(1023)))
        .unwrap();
    let map = builder.build();
    assert_eq!(map.windows()[1].start, 0x400);

    let rom = BasicMemory::from_contents(&[0x0293, 0x2000]).unwrap().read_only();
    let ram = BasicMemory::new(1023).unwrap();
    let rom = interconnect::partial_decode(rom, 9).unwrap();
    let devices: Vec<Box<dyn Device>> = vec![Box::new(rom), Box::new(ram)];
    let mut bus = Initiator::new(WindowedFabric::new(map, devices).unwrap());
    assert_eq!(bus.target().latency(), 1);

    assert_eq!(bus.read(0x001), 0x2000);
    bus.write(0x001, 0b11, 0xffff);
    assert_eq!(bus.read(0x001), 0x2000);

    bus.write(0x405, 0b11, 0xcafe);
    assert_eq!(bus.read(0x405), 0xcafe);
    assert_eq!(bus.read(0x000), 0x0293);
}

#[test]
fn rejects_mismatched_devices() {
    let (devices, _) = helper::probes(2, 1);
    assert_eq!(
        WindowedFabric::new(plan(), devices).err(),
        Some(ConfigError::DeviceCountMismatch {
            windows: 3,
            devices: 2
        })
    );

    let (devices, _) = helper::probes(3, 4);
    assert_eq!(
        WindowedFabric::new(plan(), devices).err(),
        Some(ConfigError::DeviceTooWideForWindow {
            name: "Uart_0".into(),
            device_bits: 4,
            window_bits: 1
        })
    );

    assert_eq!(
        WindowedFabric::new(plan(), Vec::new()).err(),
        Some(ConfigError::NoDevices)
    );
}
