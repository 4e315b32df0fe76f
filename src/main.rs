//! Minimal CLI driver: load an iNES ROM, run its CPU for a bounded number
//! of steps, and log each one. Useful for smoke-testing a ROM's reset
//! path without wiring up a PPU/APU or any display.

use std::env;
use std::process::ExitCode;

use log::{error, info, trace};
use nes6502::{Bus, Cartridge, Cpu};

/// Flat 2 KiB CPU RAM plus cartridge routing: the minimum bus an NROM
/// image needs to run past reset. Mirrors the `$0000-$1FFF` RAM window
/// and leaves PPU/APU/controller register ranges ($2000-$401F) unhandled,
/// since this crate implements neither.
struct MinimalBus {
    ram: [u8; 0x0800],
    cart: Cartridge,
}

impl Bus for MinimalBus {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x8000..=0xFFFF => self.cart.cpu_read(addr).unwrap_or(0),
            0x6000..=0x7FFF => self.cart.cpu_read(addr).unwrap_or(0),
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x6000..=0x7FFF | 0x8000..=0xFFFF => {
                let _ = self.cart.cpu_write(addr, value);
            }
            _ => {}
        }
    }
}

const MAX_STEPS: u32 = 10_000;

fn run() -> Result<(), nes6502::RomError> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "nes6502-run".to_string());
    let Some(path) = args.next() else {
        error!("usage: {program} <rom.nes>");
        std::process::exit(2);
    };

    let cart = Cartridge::from_ines_file(&path)?;
    info!(
        "loaded {path}: mapper={} prg_banks={} chr_banks={} mirroring={:?}",
        cart.mapper_id(),
        cart.prg_banks(),
        cart.chr_banks(),
        cart.mirroring(),
    );

    let mut bus = MinimalBus {
        ram: [0; 0x0800],
        cart,
    };
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    info!("reset vector -> ${:04X}", cpu.pc());

    for n in 0..MAX_STEPS {
        let outcome = cpu.step(&mut bus);
        trace!(
            "step {n}: opcode=${:02X} {:?} cycles={}",
            outcome.opcode, outcome.mnemonic, outcome.cycles
        );
    }

    Ok(())
}

fn main() -> ExitCode {
    #[cfg(feature = "cli-logging")]
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
