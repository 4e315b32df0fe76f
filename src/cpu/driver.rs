//! Fetch-decode-execute driver: the piece that turns one opcode byte into
//! a fully accounted instruction step, and arbitrates reset/NMI/IRQ entry.
//!
//! `step()` runs exactly one instruction or services one pending interrupt
//! and returns its cycle cost. `tick()` is the per-cycle companion built on
//! top of it: it decrements a cycle budget left over from the last `step()`
//! and only calls `step()` again once that budget is exhausted. This lets
//! an embedding system (PPU/APU) advance on a finer clock than one
//! instruction while the CPU's own execution remains instruction-granular;
//! this crate does not impose a fixed master-clock ratio since that is a
//! system-level (PPU/APU synchronization) concern outside its scope.

use crate::bus::Bus;
use crate::cpu::addressing as addr;
use crate::cpu::execute as ex;
use crate::cpu::state::{CpuState, StatusFlags};
use crate::cpu::table::{AddressingMode, Mnemonic, OpDescriptor, TABLE};

/// One 6502 core: architectural state plus pending-interrupt latches.
///
/// Generic callers own the `Bus` implementation (RAM, cartridge, any
/// mapped I/O) and pass it to every stepping call; the CPU itself holds no
/// memory.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cpu {
    pub state: CpuState,
    reset_pending: bool,
    nmi_pending: bool,
    irq_pending: bool,
    /// Fine-grained clock companion to `step()`: cycles left to "burn" from
    /// the last instruction before `tick()` is allowed to run the next one.
    cycles_remaining: u32,
    /// Decoded descriptor of the most recently executed opcode, kept around
    /// purely for the debug query surface (`debug_snapshot`); `step()`
    /// never reads it back.
    last_descriptor: Option<OpDescriptor>,
    /// Effective address the last instruction operated on, if its
    /// addressing mode produced one (immediate/implied/accumulator modes
    /// leave this `None`).
    last_effective_address: Option<u16>,
    /// Data byte the last instruction fetched or wrote, if any.
    last_data_byte: Option<u8>,
    /// Total cycles the last `step()` call consumed.
    last_cycles: u8,
}

/// Read-only snapshot of CPU state for debuggers and disassembly front
/// ends. Never consumed by the CPU itself; this exists purely as a query
/// surface (spec §6 "Debug query surface").
#[derive(Debug, Clone, Copy)]
pub struct DebugSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    /// Raw processor status byte (`N V _ B D I Z C`), `_`/`B` as currently
    /// live (not a pushed copy, so `B` reads whatever it was last set to).
    pub p: u8,
    /// Descriptor of the most recently executed opcode, or `None` before
    /// the first `step()`.
    pub last_descriptor: Option<OpDescriptor>,
    pub last_effective_address: Option<u16>,
    pub last_data_byte: Option<u8>,
    pub last_cycles: u8,
    pub reset_pending: bool,
    pub nmi_pending: bool,
    /// True only if an IRQ is latched *and* would actually be serviced,
    /// i.e. `IRQ_DISABLE` is clear.
    pub irq_pending: bool,
}

/// A snapshot of what the last `step()` call did, for debugging/tests and
/// for embedders building a disassembler or trace log on top of this
/// crate.
#[derive(Debug, Clone, Copy)]
pub struct StepOutcome {
    /// Opcode byte that was fetched (meaningless if this step serviced an
    /// interrupt instead of executing an instruction).
    pub opcode: u8,
    pub mnemonic: Mnemonic,
    /// Total cycles this step consumed, including any branch/page-cross
    /// penalty.
    pub cycles: u8,
    /// Set when this step served a reset/NMI/IRQ rather than decoding the
    /// instruction stream.
    pub serviced_interrupt: bool,
}

impl Cpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to power-up defaults and load `PC` from the reset vector
    /// immediately. Intended for bringing a freshly constructed `Cpu` (or
    /// one an embedder wants to treat as just powered on) to a known state
    /// without going through the `step()` boundary — there is no prior
    /// instruction in flight to finish first.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.state.reset(bus);
        self.reset_pending = false;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.cycles_remaining = 0;
    }

    /// Latch a reset line assertion (e.g. a front-panel reset button mid
    /// run); serviced at the next `step()` boundary ahead of any pending
    /// NMI or IRQ.
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Latch a non-maskable interrupt request; serviced at the start of
    /// the next `step()` regardless of `IRQ_DISABLE`.
    pub fn request_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latch a maskable interrupt request; serviced at the start of the
    /// next `step()` only if `IRQ_DISABLE` is clear.
    pub fn request_irq(&mut self) {
        self.irq_pending = true;
    }

    /// True if a reset, NMI, or IRQ is latched and waiting to be serviced
    /// at the next instruction boundary (the IRQ case only if `IRQ_DISABLE`
    /// is clear). Debug/front-end query surface, not consumed internally.
    pub fn has_pending_interrupt(&self) -> bool {
        self.reset_pending
            || self.nmi_pending
            || (self.irq_pending && !self.state.flag(StatusFlags::IRQ_DISABLE))
    }

    /// Current program counter, for disassembly/debugging.
    pub fn pc(&self) -> u16 {
        self.state.pc
    }

    /// Read-only snapshot of registers, status, and what the last `step()`
    /// call did, for a debugger or disassembler front end to poll. Does not
    /// mutate anything and is never consulted by `step()`/`tick()`
    /// themselves.
    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            pc: self.state.pc,
            a: self.state.a,
            x: self.state.x,
            y: self.state.y,
            sp: self.state.sp,
            p: self.state.status.bits(),
            last_descriptor: self.last_descriptor,
            last_effective_address: self.last_effective_address,
            last_data_byte: self.last_data_byte,
            last_cycles: self.last_cycles,
            reset_pending: self.reset_pending,
            nmi_pending: self.nmi_pending,
            irq_pending: self.irq_pending && !self.state.flag(StatusFlags::IRQ_DISABLE),
        }
    }

    /// Advance the fine-grained clock by one cycle. Decrements the cycle
    /// budget left over from the last `step()`; once it reaches zero, runs
    /// exactly one more `step()` (servicing a pending reset/NMI/IRQ first,
    /// if any) and refills the budget from its cost. Returns the outcome of
    /// that step, or `None` if this tick only burned down the existing
    /// budget. Lets an embedding PPU/APU advance on a per-cycle clock while
    /// the CPU's own execution remains instruction-granular.
    pub fn tick(&mut self, bus: &mut impl Bus) -> Option<StepOutcome> {
        if self.cycles_remaining > 0 {
            self.cycles_remaining -= 1;
            return None;
        }
        let outcome = self.step(bus);
        self.cycles_remaining = outcome.cycles.saturating_sub(1) as u32;
        Some(outcome)
    }

    /// Run exactly one step: service a pending interrupt if one is due,
    /// otherwise fetch, decode, and execute the next instruction. Returns
    /// the cycle cost and a snapshot of what happened.
    pub fn step(&mut self, bus: &mut impl Bus) -> StepOutcome {
        if self.reset_pending {
            self.reset_pending = false;
            self.state.reset(bus);
            self.nmi_pending = false;
            self.irq_pending = false;
            self.last_descriptor = None;
            self.last_effective_address = None;
            self.last_data_byte = None;
            self.last_cycles = 7;
            return StepOutcome {
                opcode: 0,
                mnemonic: Mnemonic::Xxx,
                cycles: 7,
                serviced_interrupt: true,
            };
        }
        if self.nmi_pending {
            self.nmi_pending = false;
            self.service_interrupt(bus, 0xFFFA, false);
            self.last_descriptor = None;
            self.last_effective_address = Some(0xFFFA);
            self.last_data_byte = None;
            self.last_cycles = 7;
            return StepOutcome {
                opcode: 0,
                mnemonic: Mnemonic::Xxx,
                cycles: 7,
                serviced_interrupt: true,
            };
        }
        if self.irq_pending && !self.state.flag(StatusFlags::IRQ_DISABLE) {
            self.irq_pending = false;
            self.service_interrupt(bus, 0xFFFE, false);
            self.last_descriptor = None;
            self.last_effective_address = Some(0xFFFE);
            self.last_data_byte = None;
            self.last_cycles = 7;
            return StepOutcome {
                opcode: 0,
                mnemonic: Mnemonic::Xxx,
                cycles: 7,
                serviced_interrupt: true,
            };
        }

        let opcode = self.state.fetch_u8(bus);
        let descriptor = TABLE[opcode as usize];
        self.last_descriptor = Some(descriptor);
        let (cycles, eff_addr, data) =
            self.execute(bus, descriptor.mnemonic, descriptor.mode, descriptor.cycles);
        self.last_effective_address = eff_addr;
        self.last_data_byte = data;
        self.last_cycles = cycles;

        StepOutcome {
            opcode,
            mnemonic: descriptor.mnemonic,
            cycles,
            serviced_interrupt: false,
        }
    }

    /// Push PC and status, clear the decimal/break distinction, raise
    /// IRQ_DISABLE, and load PC from `vector`. Shared by NMI/IRQ entry;
    /// BRK (a software interrupt with an extra padding byte) handles its
    /// own sequencing in `execute::brk`.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16, software: bool) {
        let pc = self.state.pc;
        self.state.push_u16(bus, pc);
        let byte = self.state.status_for_push(software);
        self.state.push_u8(bus, byte);
        self.state.set_flag(StatusFlags::IRQ_DISABLE, true);
        self.state.pc = bus.read_u16(vector);
    }

    /// Decode `mode`'s operand, dispatch to the matching handler, and
    /// return the total cycle count (including any extra cycles earned by
    /// page-crossing or a taken branch) plus the effective address/data
    /// byte the instruction touched, for the debug query surface.
    fn execute(
        &mut self,
        bus: &mut impl Bus,
        mnemonic: Mnemonic,
        mode: AddressingMode,
        base_cycles: u8,
    ) -> (u8, Option<u16>, Option<u8>) {
        use Mnemonic::*;

        let state = &mut self.state;

        let (cycles, eff_addr, data): (u8, Option<u16>, Option<u8>) = match mnemonic {
            // --- loads ---
            Lda | Ldx | Ldy | And | Ora | Eor | Adc | Sbc | Cmp | Cpx | Cpy | Bit => {
                let (value, operand_addr, extra) = read_operand(state, bus, mode);
                match mnemonic {
                    Lda => ex::lda(state, value),
                    Ldx => ex::ldx(state, value),
                    Ldy => ex::ldy(state, value),
                    And => ex::and(state, value),
                    Ora => ex::ora(state, value),
                    Eor => ex::eor(state, value),
                    Adc => ex::adc(state, value),
                    Sbc => ex::sbc(state, value),
                    Cmp => ex::cmp(state, value),
                    Cpx => ex::cpx(state, value),
                    Cpy => ex::cpy(state, value),
                    Bit => ex::bit(state, value),
                    _ => unreachable!(),
                }
                (base_cycles + extra, operand_addr, Some(value))
            }

            // --- stores ---
            Sta | Stx | Sty => {
                let addr = resolve_write_address(state, bus, mode);
                let value = match mnemonic {
                    Sta => state.a,
                    Stx => state.x,
                    Sty => state.y,
                    _ => unreachable!(),
                };
                bus.write(addr, value);
                (base_cycles, Some(addr), Some(value))
            }

            // --- read-modify-write ---
            //
            // No extra bus read here to report the pre-modification byte for
            // the debug surface — `ex::*_mem` already issues exactly the one
            // read its real hardware counterpart does, and this crate does
            // not model the dummy write real RMW instructions perform
            // (spec §1 excludes sub-instruction bus timing), so a second
            // read would be purely synthetic.
            Asl | Lsr | Rol | Ror | Inc | Dec => {
                if mode == AddressingMode::Accumulator {
                    match mnemonic {
                        Asl => ex::asl_acc(state),
                        Lsr => ex::lsr_acc(state),
                        Rol => ex::rol_acc(state),
                        Ror => ex::ror_acc(state),
                        _ => unreachable!(),
                    }
                    (base_cycles, None, Some(state.a))
                } else {
                    let addr = resolve_write_address(state, bus, mode);
                    match mnemonic {
                        Asl => ex::asl_mem(state, bus, addr),
                        Lsr => ex::lsr_mem(state, bus, addr),
                        Rol => ex::rol_mem(state, bus, addr),
                        Ror => ex::ror_mem(state, bus, addr),
                        Inc => ex::inc_mem(state, bus, addr),
                        Dec => ex::dec_mem(state, bus, addr),
                        _ => unreachable!(),
                    }
                    (base_cycles, Some(addr), None)
                }
            }

            Inx => {
                ex::inx(state);
                (base_cycles, None, Some(state.x))
            }
            Iny => {
                ex::iny(state);
                (base_cycles, None, Some(state.y))
            }
            Dex => {
                ex::dex(state);
                (base_cycles, None, Some(state.x))
            }
            Dey => {
                ex::dey(state);
                (base_cycles, None, Some(state.y))
            }

            Tax => {
                ex::tax(state);
                (base_cycles, None, None)
            }
            Tay => {
                ex::tay(state);
                (base_cycles, None, None)
            }
            Txa => {
                ex::txa(state);
                (base_cycles, None, None)
            }
            Tya => {
                ex::tya(state);
                (base_cycles, None, None)
            }
            Tsx => {
                ex::tsx(state);
                (base_cycles, None, None)
            }
            Txs => {
                ex::txs(state);
                (base_cycles, None, None)
            }

            Clc => {
                ex::clc(state);
                (base_cycles, None, None)
            }
            Sec => {
                ex::sec(state);
                (base_cycles, None, None)
            }
            Cli => {
                ex::cli(state);
                (base_cycles, None, None)
            }
            Sei => {
                ex::sei(state);
                (base_cycles, None, None)
            }
            Clv => {
                ex::clv(state);
                (base_cycles, None, None)
            }
            Cld => {
                ex::cld(state);
                (base_cycles, None, None)
            }
            Sed => {
                ex::sed(state);
                (base_cycles, None, None)
            }

            Pha => {
                ex::pha(state, bus);
                (base_cycles, None, None)
            }
            Php => {
                ex::php(state, bus);
                (base_cycles, None, None)
            }
            Pla => {
                ex::pla(state, bus);
                (base_cycles, None, Some(state.a))
            }
            Plp => {
                ex::plp(state, bus);
                (base_cycles, None, None)
            }

            Jmp => {
                let target = match mode {
                    AddressingMode::Absolute => addr::absolute(state, bus),
                    AddressingMode::Indirect => addr::indirect(state, bus),
                    _ => unreachable!("JMP only uses Absolute/Indirect"),
                };
                ex::jmp(state, target);
                (base_cycles, Some(target), None)
            }
            Jsr => {
                let target = addr::absolute(state, bus);
                ex::jsr(state, bus, target);
                (base_cycles, Some(target), None)
            }
            Rts => {
                ex::rts(state, bus);
                (base_cycles, None, None)
            }
            Rti => {
                ex::rti(state, bus);
                (base_cycles, None, None)
            }
            Brk => {
                ex::brk(state, bus);
                (base_cycles, None, None)
            }
            Nop => {
                ex::nop();
                (base_cycles, None, None)
            }
            Xxx => {
                ex::xxx();
                (base_cycles, None, None)
            }

            Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs => {
                let displacement = state.fetch_u8(bus);
                let target = addr::relative_target(state.pc, displacement);
                let condition = match mnemonic {
                    Bcc => !state.flag(StatusFlags::CARRY),
                    Bcs => state.flag(StatusFlags::CARRY),
                    Beq => state.flag(StatusFlags::ZERO),
                    Bmi => state.flag(StatusFlags::NEGATIVE),
                    Bne => !state.flag(StatusFlags::ZERO),
                    Bpl => !state.flag(StatusFlags::NEGATIVE),
                    Bvc => !state.flag(StatusFlags::OVERFLOW),
                    Bvs => state.flag(StatusFlags::OVERFLOW),
                    _ => unreachable!(),
                };
                let extra = ex::branch_if(state, target, condition);
                (base_cycles + extra, Some(target), None)
            }
        };

        (cycles, eff_addr, data)
    }
}

/// Fetch the operand value for a read-family instruction under `mode`,
/// returning the effective address it came from (`None` for
/// immediate/accumulator, which have no memory address) and any extra
/// page-cross cycle earned along the way.
fn read_operand(
    state: &mut CpuState,
    bus: &mut impl Bus,
    mode: AddressingMode,
) -> (u8, Option<u16>, u8) {
    use AddressingMode::*;
    match mode {
        Immediate => (state.fetch_u8(bus), None, 0),
        ZeroPage => {
            let a = addr::zero_page(state, bus);
            (bus.read(a), Some(a), 0)
        }
        ZeroPageX => {
            let a = addr::zero_page_x(state, bus);
            (bus.read(a), Some(a), 0)
        }
        ZeroPageY => {
            let a = addr::zero_page_y(state, bus);
            (bus.read(a), Some(a), 0)
        }
        Absolute => {
            let a = addr::absolute(state, bus);
            (bus.read(a), Some(a), 0)
        }
        AbsoluteX => {
            let (a, crossed) = addr::absolute_x(state, bus);
            (bus.read(a), Some(a), crossed as u8)
        }
        AbsoluteY => {
            let (a, crossed) = addr::absolute_y(state, bus);
            (bus.read(a), Some(a), crossed as u8)
        }
        IndexedIndirect => {
            let a = addr::indexed_indirect(state, bus);
            (bus.read(a), Some(a), 0)
        }
        IndirectIndexed => {
            let (a, crossed) = addr::indirect_indexed(state, bus);
            (bus.read(a), Some(a), crossed as u8)
        }
        Accumulator => (state.a, None, 0),
        other => unreachable!("{other:?} is not a readable-operand mode"),
    }
}

/// Resolve the effective address for a write-family (STA/STX/STY) or
/// memory read-modify-write instruction. These always pay any page-cross
/// penalty, already folded into the table's base cycle count, so the
/// crossing result itself is discarded here.
fn resolve_write_address(state: &mut CpuState, bus: &mut impl Bus, mode: AddressingMode) -> u16 {
    use AddressingMode::*;
    match mode {
        ZeroPage => addr::zero_page(state, bus),
        ZeroPageX => addr::zero_page_x(state, bus),
        ZeroPageY => addr::zero_page_y(state, bus),
        Absolute => addr::absolute(state, bus),
        AbsoluteX => addr::absolute_x(state, bus).0,
        AbsoluteY => addr::absolute_y(state, bus).0,
        IndexedIndirect => addr::indexed_indirect(state, bus),
        IndirectIndexed => addr::indirect_indexed(state, bus).0,
        other => unreachable!("{other:?} is not a writable-operand mode"),
    }
}
