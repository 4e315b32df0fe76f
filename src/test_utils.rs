//! Shared iNES-byte builders for unit and integration tests.
//!
//! Centralizes the handful of ROM-shape constructions the CPU/cartridge
//! test suites need, so individual test modules don't hand-roll header
//! bytes.

/// Build a minimal mapper-0 iNES image with `prg` placed at the start of
/// PRG-ROM (`$8000`), `prg_banks` 16 KiB PRG banks and `chr_banks` 8 KiB CHR
/// banks. If `reset_vector` is `Some(addr)`, the last two PRG bytes are
/// overwritten with the reset vector (`$FFFC`/`$FFFD`); PRG must be at least
/// one full bank (padded with zeros) for this to land at the right place.
pub fn build_nrom_bytes(
    prg: &[u8],
    prg_banks: u8,
    chr_banks: u8,
    reset_vector: Option<u16>,
) -> Vec<u8> {
    let prg_len = prg_banks as usize * 16 * 1024;
    let chr_len = chr_banks as usize * 8 * 1024;

    let mut header = vec![0u8; 16];
    header[0..4].copy_from_slice(b"NES\x1A");
    header[4] = prg_banks;
    header[5] = chr_banks;
    header[6] = 0x00; // vertical mirroring, mapper low nibble 0
    header[7] = 0x00; // mapper high nibble 0

    let mut prg_data = vec![0u8; prg_len];
    let n = prg.len().min(prg_len);
    prg_data[..n].copy_from_slice(&prg[..n]);

    if let Some(vector) = reset_vector {
        let last = prg_len - 1;
        prg_data[last - 1] = (vector & 0xFF) as u8;
        prg_data[last] = (vector >> 8) as u8;
    }

    let chr_data = vec![0u8; chr_len];

    let mut bytes = header;
    bytes.extend(prg_data);
    bytes.extend(chr_data);
    bytes
}

/// Like [`build_nrom_bytes`], but places `prg` at the very start of the PRG
/// bank and only patches the reset vector, leaving the remainder zeroed
/// (useful when the test only cares about reset behavior, not full PRG
/// contents).
pub fn build_nrom_with_reset_vector(prg: &[u8], reset_vector: u16) -> Vec<u8> {
    build_nrom_bytes(prg, 1, 1, Some(reset_vector))
}
