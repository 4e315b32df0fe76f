//! MOS 6502 CPU core.
//!
//! Submodules mirror the component split: [`state`] owns the
//! architectural registers, [`addressing`] resolves operand addresses,
//! [`table`] is the static opcode decode table, [`execute`] holds one
//! function per mnemonic, and [`driver`] ties fetch/decode/dispatch and
//! interrupt arbitration together into the type embedders actually drive.

pub mod addressing;
pub mod driver;
pub mod execute;
pub mod state;
pub mod table;

pub use driver::{Cpu, DebugSnapshot, StepOutcome};
pub use state::{CpuState, StatusFlags};
pub use table::{descriptor_for, AddressingMode, Mnemonic, OpDescriptor};
