//! # PIO Runtime
//!
//! Instruction-level simulation of a programmable I/O block.
//!
//! A [`PioBlock`] owns the shared [`PinFabric`] (32 GPIO levels and
//! directions plus 8 IRQ flags) and up to four [`StateMachine`]s. Each state
//! machine runs its own program with a private register file, an 8-deep TX
//! FIFO and an 8-deep RX FIFO.
//!
//! ## Features
//!
//! - **Ten opcodes**: jmp, wait, in, out, push, pull, mov, irq, set, nop
//! - **Delay and side-set** on every instruction
//! - **Autopush / autopull** with configurable thresholds
//! - **Wrap** loops declared with `.wrap_target` / `.wrap`
//! - **Lock-step ticks** in ascending state machine order
//!
//! ## Example
//!
//! ```rust
//! use pio_runtime::{PioBlock, StateMachine};
//!
//! let mut sm = StateMachine::new();
//! sm.load_source(".wrap_target\nset pins, 1 [31]\nset pins, 0 [31]\n.wrap");
//!
//! let mut block = PioBlock::new();
//! block.add_state_machine(sm).unwrap();
//! block.start_all();
//!
//! block.step_all();
//! assert!(block.get_gpio(0));
//! block.step_all();
//! assert!(!block.get_gpio(0));
//! ```

pub mod error;
pub mod fabric;
pub mod fifo;
pub mod state;
pub mod execute;
pub mod machine;
pub mod block;

pub use block::PioBlock;
pub use error::{Result, RuntimeError};
pub use execute::{execute, Outcome};
pub use fabric::PinFabric;
pub use fifo::Fifo;
pub use machine::StateMachine;
pub use state::{MachineState, Registers, Status};

/// Assemble `source` into a fresh state machine, attach it to a new block
/// and start the block.
pub fn run_source(source: &str) -> Result<PioBlock> {
    let mut sm = StateMachine::new();
    sm.load_source(source);

    let mut block = PioBlock::new();
    block.add_state_machine(sm)?;
    block.start_all();
    Ok(block)
}
