//! Cartridge: iNES (v1) loader and mapper construction.
//!
//! Parses the 16-byte header, allocates PRG/CHR banks, selects a mapper
//! variant by id, and exposes bank arrays plus a cartridge-level read/write
//! surface. Immutable after construction (NROM has no bank-switching
//! registers); owned by whatever assembles the full system bus and shared
//! by reference with the CPU's `Bus` implementation.

use std::fs;
use std::path::Path;

use log::debug;

use crate::error::RomError;
use crate::mapper::{Mapper, Nrom, WriteOutcome};

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;
const PRG_RAM_UNIT_LEN: usize = 8 * 1024;

/// Nametable mirroring mode, as declared by the header. Informational:
/// consumed by a PPU this crate does not implement, but parsed and stored
/// here since the cartridge is the authoritative source for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    FourScreen,
}

/// Which iNES header revision was detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InesVersion {
    Ines1,
}

/// A loaded NES cartridge: header metadata, PRG/CHR banks, and the
/// resolved mapper instance.
pub struct Cartridge {
    mapper: Box<dyn Mapper>,
    mapper_id: u16,
    mirroring: Mirroring,
    battery: bool,
    has_trainer: bool,
    ines_version: InesVersion,
    prg_banks: u8,
    chr_banks: u8,
    chr_rom: Vec<u8>,
    chr_is_ram: bool,
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_id", &self.mapper_id)
            .field("mirroring", &self.mirroring)
            .field("battery", &self.battery)
            .field("has_trainer", &self.has_trainer)
            .field("ines_version", &self.ines_version)
            .field("prg_banks", &self.prg_banks)
            .field("chr_banks", &self.chr_banks)
            .finish()
    }
}

impl Cartridge {
    /// Parse a cartridge from an in-memory iNES image.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < HEADER_LEN || &data[0..4] != b"NES\x1A" {
            return Err(RomError::BadMagic);
        }

        let prg_banks = data[4];
        let chr_banks = data[5];
        let flags6 = data[6];
        let flags7 = data[7];
        let prg_ram_units = data.get(8).copied().unwrap_or(0);

        // NES 2.0 is signaled by bits 2-3 of flags7 equalling 0b10.
        if (flags7 & 0x0C) == 0x08 {
            return Err(RomError::Ines2Unsupported);
        }

        let mapper_id = ((flags7 & 0xF0) | (flags6 >> 4)) as u16;
        let four_screen = (flags6 & 0b0000_1000) != 0;
        let vertical = (flags6 & 0b0000_0001) == 0;
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if vertical {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let battery = (flags6 & 0b0000_0010) != 0;
        let has_trainer = (flags6 & 0b0000_0100) != 0;

        let mut offset = HEADER_LEN;
        if has_trainer {
            offset += TRAINER_LEN;
        }

        let prg_len = prg_banks as usize * PRG_BANK_LEN;
        let chr_rom_len = chr_banks as usize * CHR_BANK_LEN;
        let expected = offset + prg_len + chr_rom_len;
        if data.len() < expected {
            return Err(RomError::TruncatedRom {
                expected,
                actual: data.len(),
            });
        }

        let prg_rom = data[offset..offset + prg_len].to_vec();
        offset += prg_len;

        let chr_is_ram = chr_banks == 0;
        let chr_rom = if chr_is_ram {
            vec![0u8; CHR_BANK_LEN]
        } else {
            data[offset..offset + chr_rom_len].to_vec()
        };

        let prg_ram_size = if prg_ram_units == 0 {
            PRG_RAM_UNIT_LEN
        } else {
            prg_ram_units as usize * PRG_RAM_UNIT_LEN
        };

        debug!(
            "parsed iNES header: prg_banks={prg_banks} chr_banks={chr_banks} mapper_id={mapper_id} mirroring={mirroring:?} trainer={has_trainer} battery={battery}"
        );

        let mapper: Box<dyn Mapper> = match mapper_id {
            0 => Box::new(Nrom::new(prg_rom, prg_ram_size)),
            other => return Err(RomError::UnsupportedMapper { id: other }),
        };

        Ok(Self {
            mapper,
            mapper_id,
            mirroring,
            battery,
            has_trainer,
            ines_version: InesVersion::Ines1,
            prg_banks,
            chr_banks,
            chr_rom,
            chr_is_ram,
        })
    }

    /// Parse a cartridge from a file path.
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, RomError> {
        let data = fs::read(path).map_err(|e| RomError::Io(e.to_string()))?;
        Self::from_ines_bytes(&data)
    }

    /// Translate a CPU-visible read through the resolved mapper.
    #[inline]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.cpu_translate_read(addr)
    }

    /// Offer a CPU-visible write to the resolved mapper.
    #[inline]
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> WriteOutcome {
        self.mapper.cpu_translate_write(addr, value)
    }

    pub fn mapper_id(&self) -> u16 {
        self.mapper_id
    }
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
    pub fn has_battery(&self) -> bool {
        self.battery
    }
    pub fn has_trainer(&self) -> bool {
        self.has_trainer
    }
    pub fn ines_version(&self) -> InesVersion {
        self.ines_version
    }
    pub fn prg_banks(&self) -> u8 {
        self.prg_banks
    }
    pub fn chr_banks(&self) -> u8 {
        self.chr_banks
    }
    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }
    /// CHR data (ROM or, if `chr_banks == 0`, a freshly allocated RAM bank).
    /// PPU-side banking/mirroring of this buffer is out of this crate's
    /// scope; it is exposed only as storage.
    pub fn chr(&self) -> &[u8] {
        &self.chr_rom
    }

    /// Write a byte into CHR space at `offset`, for an embedding PPU to
    /// route its `$0000-$1FFF` writes through. Silently ignored when this
    /// cartridge's CHR is ROM (no board-level registers are modeled here);
    /// accepted only when `chr_is_ram()`.
    pub fn chr_write(&mut self, offset: usize, value: u8) {
        if self.chr_is_ram {
            if let Some(slot) = self.chr_rom.get_mut(offset) {
                *slot = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_nrom_bytes;

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = build_nrom_bytes(&[0xEA], 1, 1, None);
        bytes[0] = 0x00;
        assert_eq!(Cartridge::from_ines_bytes(&bytes), Err(RomError::BadMagic));
    }

    #[test]
    fn rejects_truncated_rom() {
        let bytes = build_nrom_bytes(&[0xEA], 1, 1, None);
        let truncated = &bytes[..bytes.len() - 10];
        match Cartridge::from_ines_bytes(truncated) {
            Err(RomError::TruncatedRom { .. }) => {}
            other => panic!("expected TruncatedRom, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let mut bytes = build_nrom_bytes(&[0xEA], 1, 1, None);
        // Mapper id lives across flags6 high nibble / flags7 high nibble.
        bytes[6] = 0x10; // mapper low nibble = 1
        match Cartridge::from_ines_bytes(&bytes) {
            Err(RomError::UnsupportedMapper { id: 1 }) => {}
            other => panic!("expected UnsupportedMapper{{id:1}}, got {other:?}"),
        }
    }

    #[test]
    fn parses_prg_chr_sizes_and_mirroring() {
        let bytes = build_nrom_bytes(&[0xEA; 100], 2, 1, None);
        let cart = Cartridge::from_ines_bytes(&bytes).unwrap();
        assert_eq!(cart.prg_banks(), 2);
        assert_eq!(cart.chr_banks(), 1);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.mapper_id(), 0);
        assert!(!cart.chr_is_ram());
    }

    #[test]
    fn chr_ram_allocated_when_chr_banks_zero() {
        let bytes = build_nrom_bytes(&[0xEA], 1, 0, None);
        let cart = Cartridge::from_ines_bytes(&bytes).unwrap();
        assert!(cart.chr_is_ram());
        assert_eq!(cart.chr().len(), CHR_BANK_LEN);
    }

    #[test]
    fn chr_ram_write_then_read_round_trips() {
        let bytes = build_nrom_bytes(&[0xEA], 1, 0, None);
        let mut cart = Cartridge::from_ines_bytes(&bytes).unwrap();
        cart.chr_write(0x10, 0x42);
        assert_eq!(cart.chr()[0x10], 0x42);
    }

    #[test]
    fn chr_rom_writes_are_silently_ignored() {
        let bytes = build_nrom_bytes(&[0xEA], 1, 1, None);
        let mut cart = Cartridge::from_ines_bytes(&bytes).unwrap();
        let before = cart.chr()[0x10];
        cart.chr_write(0x10, before.wrapping_add(1));
        assert_eq!(cart.chr()[0x10], before);
    }

    #[test]
    fn trainer_is_skipped_before_prg() {
        let mut bytes = build_nrom_bytes(&[0xAB, 0xCD], 1, 1, None);
        bytes[6] |= 0b0000_0100; // trainer present
        let mut with_trainer = bytes[..HEADER_LEN].to_vec();
        with_trainer.extend(vec![0u8; TRAINER_LEN]);
        with_trainer.extend_from_slice(&bytes[HEADER_LEN..]);

        let cart = Cartridge::from_ines_bytes(&with_trainer).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(0xAB));
        assert_eq!(cart.cpu_read(0x8001), Some(0xCD));
        assert!(cart.has_trainer());
    }
}
