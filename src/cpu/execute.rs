//! Opcode execution bodies.
//!
//! Every function takes the already-decoded operand (an effective address,
//! or nothing for register-only instructions) and performs the documented
//! 6502 semantics, including the handful of places the original reference
//! implementation this system was modeled on gets wrong: BPL/BMI's flag
//! test, ASL's carry-out, ROL/ROR's carry-in source, SBC's borrow, and
//! BRK's return-address push all follow the documented behavior here, not
//! the buggy one.

use crate::bus::Bus;
use crate::cpu::state::{CpuState, StatusFlags};

// -----------------------------------------------------------------------
// Loads / stores / transfers
// -----------------------------------------------------------------------

pub fn lda(state: &mut CpuState, value: u8) {
    state.a = value;
    state.update_zn(value);
}

pub fn ldx(state: &mut CpuState, value: u8) {
    state.x = value;
    state.update_zn(value);
}

pub fn ldy(state: &mut CpuState, value: u8) {
    state.y = value;
    state.update_zn(value);
}

pub fn tax(state: &mut CpuState) {
    state.x = state.a;
    state.update_zn(state.x);
}

pub fn tay(state: &mut CpuState) {
    state.y = state.a;
    state.update_zn(state.y);
}

pub fn txa(state: &mut CpuState) {
    state.a = state.x;
    state.update_zn(state.a);
}

pub fn tya(state: &mut CpuState) {
    state.a = state.y;
    state.update_zn(state.a);
}

pub fn tsx(state: &mut CpuState) {
    state.x = state.sp;
    state.update_zn(state.x);
}

/// TXS does not touch any flags: `SP` is not an arithmetic result.
pub fn txs(state: &mut CpuState) {
    state.sp = state.x;
}

// -----------------------------------------------------------------------
// Logical
// -----------------------------------------------------------------------

pub fn and(state: &mut CpuState, value: u8) {
    state.a &= value;
    state.update_zn(state.a);
}

pub fn ora(state: &mut CpuState, value: u8) {
    state.a |= value;
    state.update_zn(state.a);
}

pub fn eor(state: &mut CpuState, value: u8) {
    state.a ^= value;
    state.update_zn(state.a);
}

/// BIT: ZERO from `A & M`, but NEGATIVE/OVERFLOW are copied straight from
/// bits 7/6 of the *operand*, not from the AND result.
pub fn bit(state: &mut CpuState, value: u8) {
    let result = state.a & value;
    state.set_flag(StatusFlags::ZERO, result == 0);
    state.set_flag(StatusFlags::NEGATIVE, (value & 0x80) != 0);
    state.set_flag(StatusFlags::OVERFLOW, (value & 0x40) != 0);
}

// -----------------------------------------------------------------------
// Increment / decrement
// -----------------------------------------------------------------------

pub fn inx(state: &mut CpuState) {
    state.x = state.x.wrapping_add(1);
    state.update_zn(state.x);
}

pub fn iny(state: &mut CpuState) {
    state.y = state.y.wrapping_add(1);
    state.update_zn(state.y);
}

pub fn dex(state: &mut CpuState) {
    state.x = state.x.wrapping_sub(1);
    state.update_zn(state.x);
}

pub fn dey(state: &mut CpuState) {
    state.y = state.y.wrapping_sub(1);
    state.update_zn(state.y);
}

/// Shared read-modify-write memory transform: read the operand, apply
/// `f`, write the result back, and return it so the caller can update
/// flags. Real hardware writes the unmodified value back before the
/// modified one (a dummy write); that detail has no architecturally
/// visible effect for a single-device bus and is not modeled here.
fn rmw(bus: &mut impl Bus, addr: u16, f: impl FnOnce(u8) -> u8) -> u8 {
    let old = bus.read(addr);
    let new = f(old);
    bus.write(addr, new);
    new
}

pub fn inc_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let result = rmw(bus, addr, |v| v.wrapping_add(1));
    state.update_zn(result);
}

pub fn dec_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let result = rmw(bus, addr, |v| v.wrapping_sub(1));
    state.update_zn(result);
}

// -----------------------------------------------------------------------
// Shifts and rotates
// -----------------------------------------------------------------------

/// ASL carry-out is the operand's bit 7 (tested with a mask, not produced
/// by multiplying and checking for overflow).
#[inline]
fn asl_value(state: &mut CpuState, value: u8) -> u8 {
    state.set_flag(StatusFlags::CARRY, (value & 0x80) != 0);
    let result = value << 1;
    state.update_zn(result);
    result
}

#[inline]
fn lsr_value(state: &mut CpuState, value: u8) -> u8 {
    state.set_flag(StatusFlags::CARRY, (value & 0x01) != 0);
    let result = value >> 1;
    state.update_zn(result);
    result
}

/// ROL: shift left, carry-in goes into bit 0, carry-out is the old bit 7.
/// The carry bit ORed in is read from the processor status register,
/// never from the stack pointer.
#[inline]
fn rol_value(state: &mut CpuState, value: u8) -> u8 {
    let carry_in = state.flag(StatusFlags::CARRY) as u8;
    state.set_flag(StatusFlags::CARRY, (value & 0x80) != 0);
    let result = (value << 1) | carry_in;
    state.update_zn(result);
    result
}

#[inline]
fn ror_value(state: &mut CpuState, value: u8) -> u8 {
    let carry_in = state.flag(StatusFlags::CARRY) as u8;
    state.set_flag(StatusFlags::CARRY, (value & 0x01) != 0);
    let result = (value >> 1) | (carry_in << 7);
    state.update_zn(result);
    result
}

pub fn asl_acc(state: &mut CpuState) {
    state.a = asl_value(state, state.a);
}
pub fn lsr_acc(state: &mut CpuState) {
    state.a = lsr_value(state, state.a);
}
pub fn rol_acc(state: &mut CpuState) {
    state.a = rol_value(state, state.a);
}
pub fn ror_acc(state: &mut CpuState) {
    state.a = ror_value(state, state.a);
}

pub fn asl_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let old = bus.read(addr);
    let new = asl_value(state, old);
    bus.write(addr, new);
}

pub fn lsr_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let old = bus.read(addr);
    let new = lsr_value(state, old);
    bus.write(addr, new);
}

pub fn rol_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let old = bus.read(addr);
    let new = rol_value(state, old);
    bus.write(addr, new);
}

pub fn ror_mem(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    let old = bus.read(addr);
    let new = ror_value(state, old);
    bus.write(addr, new);
}

// -----------------------------------------------------------------------
// Arithmetic
// -----------------------------------------------------------------------

/// ADC: carry-out and overflow both derive from the 9-bit (carry included)
/// and signed sum respectively, computed directly rather than inferred
/// from an unsigned-compare-after-the-fact trick.
pub fn adc(state: &mut CpuState, value: u8) {
    let carry_in = state.flag(StatusFlags::CARRY) as u16;
    let a = state.a as u16;
    let m = value as u16;
    let sum = a + m + carry_in;

    let result = sum as u8;
    state.set_flag(StatusFlags::CARRY, sum > 0xFF);
    let overflow = (!(state.a ^ value) & (state.a ^ result) & 0x80) != 0;
    state.set_flag(StatusFlags::OVERFLOW, overflow);
    state.a = result;
    state.update_zn(result);
}

/// SBC is ADC against the bitwise complement of the operand: `A + !M + C`.
/// Borrow is the inverse of carry, which falls out of that identity for
/// free rather than needing a separate borrow flag.
pub fn sbc(state: &mut CpuState, value: u8) {
    adc(state, !value);
}

fn compare(state: &mut CpuState, register: u8, value: u8) {
    let result = register.wrapping_sub(value);
    state.set_flag(StatusFlags::CARRY, register >= value);
    state.update_zn(result);
}

pub fn cmp(state: &mut CpuState, value: u8) {
    compare(state, state.a, value);
}
pub fn cpx(state: &mut CpuState, value: u8) {
    compare(state, state.x, value);
}
pub fn cpy(state: &mut CpuState, value: u8) {
    compare(state, state.y, value);
}

// -----------------------------------------------------------------------
// Stack operations
// -----------------------------------------------------------------------

pub fn pha(state: &mut CpuState, bus: &mut impl Bus) {
    state.push_u8(bus, state.a);
}

pub fn php(state: &mut CpuState, bus: &mut impl Bus) {
    let byte = state.status_for_push(true);
    state.push_u8(bus, byte);
}

pub fn pla(state: &mut CpuState, bus: &mut impl Bus) {
    let value = state.pop_u8(bus);
    state.a = value;
    state.update_zn(value);
}

pub fn plp(state: &mut CpuState, bus: &mut impl Bus) {
    let byte = state.pop_u8(bus);
    state.set_status_from_pop(byte);
}

// -----------------------------------------------------------------------
// Flag instructions
// -----------------------------------------------------------------------

pub fn clc(state: &mut CpuState) {
    state.set_flag(StatusFlags::CARRY, false);
}
pub fn sec(state: &mut CpuState) {
    state.set_flag(StatusFlags::CARRY, true);
}
pub fn cli(state: &mut CpuState) {
    state.set_flag(StatusFlags::IRQ_DISABLE, false);
}
pub fn sei(state: &mut CpuState) {
    state.set_flag(StatusFlags::IRQ_DISABLE, true);
}
pub fn clv(state: &mut CpuState) {
    state.set_flag(StatusFlags::OVERFLOW, false);
}
pub fn cld(state: &mut CpuState) {
    state.set_flag(StatusFlags::DECIMAL, false);
}
pub fn sed(state: &mut CpuState) {
    state.set_flag(StatusFlags::DECIMAL, true);
}

// -----------------------------------------------------------------------
// Control flow
// -----------------------------------------------------------------------

pub fn jmp(state: &mut CpuState, addr: u16) {
    state.pc = addr;
}

pub fn jsr(state: &mut CpuState, bus: &mut impl Bus, addr: u16) {
    // The pushed return address is the address of the last byte of JSR's
    // own operand (PC - 1 at this point, since the operand has already
    // been fully fetched), not the address of the next instruction.
    let return_addr = state.pc.wrapping_sub(1);
    state.push_u16(bus, return_addr);
    state.pc = addr;
}

pub fn rts(state: &mut CpuState, bus: &mut impl Bus) {
    let addr = state.pop_u16(bus);
    state.pc = addr.wrapping_add(1);
}

pub fn rti(state: &mut CpuState, bus: &mut impl Bus) {
    let byte = state.pop_u8(bus);
    state.set_status_from_pop(byte);
    state.pc = state.pop_u16(bus);
}

/// BRK: pushes the real return address (`PC + 1`, since BRK reserves a
/// padding byte after its opcode) as an actual high-byte/low-byte pair —
/// not the literal high/low masks of the pre-increment PC — pushes status
/// with BREAK set, sets IRQ_DISABLE, and loads PC from the IRQ/BRK vector
/// at `$FFFE`/`$FFFF`.
pub fn brk(state: &mut CpuState, bus: &mut impl Bus) {
    let return_addr = state.pc.wrapping_add(1);
    state.push_u16(bus, return_addr);
    let byte = state.status_for_push(true);
    state.push_u8(bus, byte);
    state.set_flag(StatusFlags::IRQ_DISABLE, true);
    state.pc = bus.read_u16(0xFFFE);
}

pub fn nop() {}

/// Illegal/unassigned opcode: architecturally a single-byte no-op. The
/// operand byte (if any was already consumed by the table's addressing
/// mode) has no defined effect.
pub fn xxx() {}

// -----------------------------------------------------------------------
// Branches
// -----------------------------------------------------------------------

/// Resolve a branch: returns the number of *extra* cycles consumed beyond
/// the opcode's base cost (0 if not taken, 1 if taken within the same
/// page, 2 if taken across a page boundary).
pub fn branch_if(state: &mut CpuState, target: u16, condition: bool) -> u8 {
    if !condition {
        return 0;
    }
    let before = state.pc;
    state.pc = target;
    if (before & 0xFF00) != (target & 0xFF00) {
        2
    } else {
        1
    }
}
