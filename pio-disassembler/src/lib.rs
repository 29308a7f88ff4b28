//! # PIO Disassembler
//!
//! Render decoded PIO instructions and programs back into assembly text.
//!
//! [`format`] renders one instruction in canonical form: decoding its output
//! yields the same instruction. [`disassemble`] renders a whole program as
//! re-assemblable source and [`listing`] adds line indices and wrap markers
//! for debugging.
//!
//! ## Example
//!
//! ```rust
//! use pio_spec::{Instruction, Op};
//! use pio_disassembler::format;
//!
//! let instr = Instruction::op(Op::Nop).with_side_set(1).with_delay(3);
//! assert_eq!(format(&instr), "nop side 1 [3]");
//! ```

pub mod formatter;
pub mod disassembler;

pub use disassembler::{disassemble, listing};
pub use formatter::{format, format_op};
