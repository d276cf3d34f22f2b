
use interconnect::memory::BasicMemory;
use interconnect::{narrow_addr, partial_decode, BusCmd, Command, ConfigError, Device, Initiator};

#[test]
fn partial_decode_only_widens() {
    let (probe, _) = helper::Probe::new(8, 1);
    assert_eq!(
        partial_decode(probe, 7).err().map(|e| e.to_string()),
        Some("can't use partial_decode to make a bus narrower (8 -> 7 addr bits)".to_string())
    );

    let (probe, _) = helper::Probe::new(8, 1);
    let port = partial_decode(probe, 8).unwrap();
    assert_eq!(port.shape().addr_bits, 8);

    let (probe, _) = helper::Probe::new(0, 1);
    let port = partial_decode(probe, 12).unwrap();
    assert_eq!(port.shape().addr_bits, 12);
    assert_eq!(port.shape().data_bits, 16);
}

#[test]
fn narrow_addr_only_narrows() {
    let (probe, _) = helper::Probe::new(8, 1);
    assert!(matches!(
        narrow_addr(probe, 9),
        Err(ConfigError::NarrowToWider { from: 8, to: 9 })
    ));

    let (probe, _) = helper::Probe::new(8, 1);
    assert_eq!(narrow_addr(probe, 8).unwrap().shape().addr_bits, 8);
    let (probe, _) = helper::Probe::new(8, 1);
    assert_eq!(narrow_addr(probe, 3).unwrap().shape().addr_bits, 3);
}

#[test]
fn widening_past_the_bus_limit_fails() {
    let (probe, _) = helper::Probe::new(8, 1);
    assert!(matches!(
        partial_decode(probe, 40),
        Err(ConfigError::AddressTooWide { bits: 40, .. })
    ));
}

#[test]
fn chain_passes_command_through() {
    let (probe, seen) = helper::Probe::new(6, 1);
    let chain = partial_decode(narrow_addr(partial_decode(probe, 10).unwrap(), 7).unwrap(), 12).unwrap();
    let mut bus = Initiator::new(chain);

    let cmd = Command::write(0x2a, 0b10, 0xbeef);
    bus.step(BusCmd::valid(cmd));
    assert_eq!(helper::last(&seen), BusCmd::valid(cmd));

    bus.step(BusCmd::idle(Command::read(0x15)));
    assert_eq!(helper::last(&seen), BusCmd::idle(Command::read(0x15)));
}

#[test]
fn extra_high_bits_alias() {
    let (probe, seen) = helper::Probe::new(4, 3);
    let mut bus = Initiator::new(partial_decode(probe, 8).unwrap());

    // The high nibble is for a containing fabric to decode; the device only sees the low one.
    assert_eq!(bus.read(0xa7), 3 << 8 | 0x7);
    assert_eq!(helper::last(&seen).payload.addr, 0x7);
}

#[test]
fn adapters_add_no_latency() {
    let (probe, _) = helper::Probe::new(4, 1);
    assert_eq!(partial_decode(probe, 8).unwrap().latency(), 0);

    let mut mem = BasicMemory::from_contents(&[0x0102, 0x0304, 0x0506, 0x0708]).unwrap();
    mem.initialize(&[0x1111]);
    let port = narrow_addr(mem, 1).unwrap();
    assert_eq!(port.latency(), 1);

    let mut bus = Initiator::new(port);
    assert_eq!(bus.read(0), 0x1111);
    assert_eq!(bus.read(1), 0x0304);
    // Upper address lines are tied low, word 3 is out of reach.
    assert_eq!(bus.read(3), 0x0304);
    assert_eq!(bus.into_inner().into_inner().peek(3), 0x0708);
}
