//! Operand address resolution for each of the 6502's 13 addressing modes.
//!
//! Every function here consumes whatever operand bytes the mode requires
//! (advancing `PC` through `state.fetch_u8`/`fetch_u16`) and returns the
//! effective address to operate on. Indexed modes that can cross a page
//! boundary return `(addr, page_crossed)`; the caller (the dispatch loop)
//! decides whether that crossing costs an extra cycle for the instruction
//! in question, since a few opcodes (the read-modify-write family, and
//! STA/STX/STY) always pay it regardless of whether a crossing actually
//! happened.

use crate::bus::Bus;
use crate::cpu::state::CpuState;

/// Zero page: `addr = fetch_u8()`.
#[inline]
pub fn zero_page(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    state.fetch_u8(bus) as u16
}

/// Zero page, X: `addr = (fetch_u8() + X) & 0xFF`. Wraps within the zero
/// page; never carries into page one.
#[inline]
pub fn zero_page_x(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    let base = state.fetch_u8(bus);
    base.wrapping_add(state.x) as u16
}

/// Zero page, Y: as [`zero_page_x`] but indexed by `Y` (used only by
/// LDX/STX).
#[inline]
pub fn zero_page_y(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    let base = state.fetch_u8(bus);
    base.wrapping_add(state.y) as u16
}

/// Absolute: `addr = fetch_u16()`.
#[inline]
pub fn absolute(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    state.fetch_u16(bus)
}

/// Absolute, X: `addr = fetch_u16() + X`. Reports whether the add crossed a
/// page boundary (high byte changed).
#[inline]
pub fn absolute_x(state: &mut CpuState, bus: &mut impl Bus) -> (u16, bool) {
    let base = state.fetch_u16(bus);
    let addr = base.wrapping_add(state.x as u16);
    (addr, page_crossed(base, addr))
}

/// Absolute, Y: as [`absolute_x`] but indexed by `Y`.
#[inline]
pub fn absolute_y(state: &mut CpuState, bus: &mut impl Bus) -> (u16, bool) {
    let base = state.fetch_u16(bus);
    let addr = base.wrapping_add(state.y as u16);
    (addr, page_crossed(base, addr))
}

/// Indirect: `addr = read_u16(fetch_u16())`, reproducing the original
/// hardware's page-wrap bug — if the pointer's low byte is `$FF`, the high
/// byte of the target is fetched from the *start* of the same page rather
/// than the next page (e.g. a pointer of `$12FF` reads its high byte from
/// `$1200`, not `$1300`). Used only by JMP indirect.
#[inline]
pub fn indirect(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    let ptr = state.fetch_u16(bus);
    read_u16_bugged(bus, ptr)
}

/// Indexed indirect (`(zp,X)`): index into the zero page by `X` first, then
/// dereference the resulting two-byte pointer.
#[inline]
pub fn indexed_indirect(state: &mut CpuState, bus: &mut impl Bus) -> u16 {
    let zp = state.fetch_u8(bus).wrapping_add(state.x);
    read_u16_zero_page(bus, zp)
}

/// Indirect indexed (`(zp),Y`): dereference the zero-page pointer, then add
/// `Y` to the resulting address. Reports page crossing on the `+ Y` add.
#[inline]
pub fn indirect_indexed(state: &mut CpuState, bus: &mut impl Bus) -> (u16, bool) {
    let zp = state.fetch_u8(bus);
    let base = read_u16_zero_page(bus, zp);
    let addr = base.wrapping_add(state.y as u16);
    (addr, page_crossed(base, addr))
}

/// Relative: fetch the signed 8-bit branch displacement and resolve it
/// against the PC *after* the full two-byte instruction has been
/// consumed (branch handlers call this once the opcode's single operand
/// byte has been fetched).
#[inline]
pub fn relative_target(pc_after_operand: u16, displacement: u8) -> u16 {
    pc_after_operand.wrapping_add(displacement as i8 as i16 as u16)
}

#[inline]
fn page_crossed(before: u16, after: u16) -> bool {
    (before & 0xFF00) != (after & 0xFF00)
}

/// Read a 16-bit little-endian pointer out of the zero page, wrapping the
/// high-byte fetch back to `$00` instead of spilling into page one.
#[inline]
fn read_u16_zero_page(bus: &mut impl Bus, zp: u8) -> u16 {
    let lo = bus.read(zp as u16) as u16;
    let hi = bus.read(zp.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Read a 16-bit little-endian pointer from `addr`, reproducing the
/// original hardware's failure to carry into the next page when fetching
/// the high byte.
#[inline]
fn read_u16_bugged(bus: &mut impl Bus, addr: u16) -> u16 {
    let lo = bus.read(addr) as u16;
    let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
    let hi = bus.read(hi_addr) as u16;
    (hi << 8) | lo
}
