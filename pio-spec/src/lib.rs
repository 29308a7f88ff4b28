//! # PIO Instruction Set
//!
//! Core types shared by the PIO assembler, disassembler and runtime.
//!
//! ## Key Features
//! - 32 GPIO pins, 8 sticky IRQ flags
//! - Up to 4 state machines per block
//! - 8-entry TX/RX FIFOs per state machine
//! - Ten executable opcodes plus inert `Raw` lines
//! - Per-instruction delay (0-31 cycles) and side-set

pub mod instruction;
pub mod config;
pub mod error;
pub mod program;

pub use instruction::{
    Instruction, JmpCondition, JmpTarget, MovOp, Op, Operand, SetDestination, WaitSource,
};
pub use config::{ConfigError, StateMachineConfig};
pub use error::SpecError;
pub use program::{Diagnostic, DiagnosticKind, Program, SideSetDirective};

/// Number of GPIO pins visible to a PIO block
pub const NUM_GPIO: usize = 32;

/// Number of sticky IRQ flags shared by a PIO block
pub const NUM_IRQ_FLAGS: usize = 8;

/// Maximum number of state machines per block
pub const MAX_STATE_MACHINES: usize = 4;

/// Depth of each TX/RX FIFO
pub const FIFO_DEPTH: usize = 8;

/// Largest delay annotation (`[31]`)
pub const MAX_DELAY: u8 = 31;

/// Width of the shift registers and scratch registers
pub const SHIFT_WIDTH: u8 = 32;

/// Program counter mask applied to computed jumps (`mov pc`, `out pc`)
pub const PC_MASK: u32 = 0x1F;
