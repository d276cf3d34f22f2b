use anyhow::{ensure, Result};
use interconnect::{Device, FlatFabric, Initiator};
use log::{debug, info};

use crate::board::Board;

/// Runs a short scripted session against a board's bus.
pub struct Demo {
    board: Board,
    bus: Initiator<FlatFabric>,
}

impl Demo {
    pub fn new(board: Board) -> Result<Self> {
        info!("assembling {:?} bus", board);
        let fabric = board.assemble()?;
        info!(
            "{} RAM words, {}-bit bus, {} output pins",
            board.ram_words(),
            fabric.shape().addr_bits,
            board.port_pins()
        );
        Ok(Self {
            board,
            bus: Initiator::new(fabric),
        })
    }

    /// Address of the output port: the first word past the RAM's index.
    fn port_addr(&self) -> u32 {
        1 << self.board.ram_addr_bits()
    }

    pub fn go(mut self) -> Result<()> {
        let last = self.board.ram_words() as u32 - 1;

        for (addr, value) in [(0, 0x0293), (1, 0x2000), (last, 0xbeef)] {
            self.bus.write(addr, 0b11, value);
            let read = self.bus.read(addr);
            debug!("ram[{:#x}] <- {:#06x}, reads {:#06x}", addr, value, read);
            ensure!(read == value, "ram[{:#x}] read back {:#06x}, wrote {:#06x}", addr, read, value);
        }

        // Only the low lane: the high byte of the word must survive.
        self.bus.write(last, 0b01, 0x1234);
        let read = self.bus.read(last);
        info!("byte-lane write to ram[{:#x}] reads {:#06x}", last, read);
        ensure!(read == 0xbe34, "lane-masked write clobbered ram[{:#x}]: {:#06x}", last, read);

        let port = self.port_addr();
        let all_pins = (1u32 << self.board.port_pins()) - 1;
        for pins in [all_pins, 0] {
            self.bus.write(port, 0b11, pins);
            let read = self.bus.read(port);
            info!("port <- {:#b}, reads {:#b}", pins, read);
            ensure!(read == pins, "port read back {:#b}, wrote {:#b}", read, pins);
        }

        info!("{} cycles, all transactions checked", self.bus.cycle());
        Ok(())
    }
}
