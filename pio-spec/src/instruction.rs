//! PIO Instruction Set
//!
//! Every program line decodes to one [`Instruction`]. Executable lines carry an
//! [`Op`] plus two timing annotations shared by all opcodes:
//!
//! - `delay`: extra idle cycles (0-31) burned after the instruction retires
//! - `side_set`: bits driven onto the side-set pin group while it executes
//!
//! Blank, comment, directive, label and unrecognized lines become
//! [`Instruction::Raw`], which keeps the original text and never executes.

use serde::{Deserialize, Serialize};

/// One decoded program line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Executable opcode with its timing annotations
    Op {
        op: Op,
        delay: u8,
        side_set: Option<u32>,
    },

    /// Inert line, kept for display and index alignment
    Raw { text: String },
}

impl Instruction {
    /// Wrap an opcode with no delay and no side-set
    pub fn op(op: Op) -> Self {
        Instruction::Op {
            op,
            delay: 0,
            side_set: None,
        }
    }

    /// Create an inert line
    pub fn raw(text: impl Into<String>) -> Self {
        Instruction::Raw { text: text.into() }
    }

    /// Replace the delay annotation (no effect on `Raw`)
    pub fn with_delay(mut self, cycles: u8) -> Self {
        if let Instruction::Op { delay, .. } = &mut self {
            *delay = cycles;
        }
        self
    }

    /// Replace the side-set annotation (no effect on `Raw`)
    pub fn with_side_set(mut self, bits: u32) -> Self {
        if let Instruction::Op { side_set, .. } = &mut self {
            *side_set = Some(bits);
        }
        self
    }

    /// Executable opcode, if any
    pub fn as_op(&self) -> Option<&Op> {
        match self {
            Instruction::Op { op, .. } => Some(op),
            Instruction::Raw { .. } => None,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Instruction::Raw { .. })
    }

    /// Delay cycles burned after execution (always 0 for `Raw`)
    pub fn delay(&self) -> u8 {
        match self {
            Instruction::Op { delay, .. } => *delay,
            Instruction::Raw { .. } => 0,
        }
    }

    /// Side-set bits (always `None` for `Raw`)
    pub fn side_set(&self) -> Option<u32> {
        match self {
            Instruction::Op { side_set, .. } => *side_set,
            Instruction::Raw { .. } => None,
        }
    }

    /// Get instruction mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Op { op, .. } => op.mnemonic(),
            Instruction::Raw { .. } => "raw",
        }
    }
}

/// Executable PIO opcodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    /// JMP: if condition, pc = target
    Jmp {
        condition: JmpCondition,
        target: JmpTarget,
    },

    /// WAIT: stall until source[index] == polarity
    Wait {
        polarity: bool,
        source: WaitSource,
        index: u8,
        relative: bool,
    },

    /// IN: shift bit_count bits from source into ISR
    In { source: Operand, bit_count: u8 },

    /// OUT: shift bit_count bits out of OSR into destination
    Out { destination: Operand, bit_count: u8 },

    /// PUSH: ISR -> RX FIFO
    Push { if_full: bool, block: bool },

    /// PULL: TX FIFO -> OSR
    Pull { if_empty: bool, block: bool },

    /// MOV: destination = op(source)
    Mov {
        destination: Operand,
        op: MovOp,
        source: Operand,
    },

    /// IRQ: set or clear a flag, optionally waiting for it to clear
    Irq {
        clear: bool,
        wait: bool,
        index: u8,
        relative: bool,
    },

    /// SET: destination = data (5-bit literal)
    Set { destination: SetDestination, data: u8 },

    /// NOP
    Nop,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Jmp { .. } => "jmp",
            Op::Wait { .. } => "wait",
            Op::In { .. } => "in",
            Op::Out { .. } => "out",
            Op::Push { .. } => "push",
            Op::Pull { .. } => "pull",
            Op::Mov { .. } => "mov",
            Op::Irq { .. } => "irq",
            Op::Set { .. } => "set",
            Op::Nop => "nop",
        }
    }
}

/// JMP condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JmpCondition {
    /// Unconditional
    Always,
    /// `!x`: X is zero
    XZero,
    /// `x--`: X non-zero after decrement
    XDecrement,
    /// `!y`: Y is zero
    YZero,
    /// `y--`: Y non-zero after decrement
    YDecrement,
    /// `x!=y`
    XNotEqualY,
    /// `pin`: jmp_pin is high
    Pin,
    /// `!osre`: output shift register not empty
    OsrNotEmpty,
}

impl JmpCondition {
    /// Assembly syntax of the condition (empty for `Always`)
    pub fn syntax(&self) -> &'static str {
        match self {
            JmpCondition::Always => "",
            JmpCondition::XZero => "!x",
            JmpCondition::XDecrement => "x--",
            JmpCondition::YZero => "!y",
            JmpCondition::YDecrement => "y--",
            JmpCondition::XNotEqualY => "x!=y",
            JmpCondition::Pin => "pin",
            JmpCondition::OsrNotEmpty => "!osre",
        }
    }
}

/// JMP target: a label resolved at load time, or a literal program index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JmpTarget {
    Label(String),
    Address(u32),
}

/// WAIT source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaitSource {
    /// Absolute GPIO number
    Gpio,
    /// Input pin, relative to `in_base`
    Pin,
    /// IRQ flag
    Irq,
}

impl WaitSource {
    pub fn name(&self) -> &'static str {
        match self {
            WaitSource::Gpio => "gpio",
            WaitSource::Pin => "pin",
            WaitSource::Irq => "irq",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gpio" => Some(WaitSource::Gpio),
            "pin" => Some(WaitSource::Pin),
            "irq" => Some(WaitSource::Irq),
            _ => None,
        }
    }
}

/// Source/destination operand for IN, OUT and MOV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Pins,
    X,
    Y,
    Null,
    PinDirs,
    Pc,
    Isr,
    Osr,
    Exec,
}

impl Operand {
    pub const ALL: [Operand; 9] = [
        Operand::Pins,
        Operand::X,
        Operand::Y,
        Operand::Null,
        Operand::PinDirs,
        Operand::Pc,
        Operand::Isr,
        Operand::Osr,
        Operand::Exec,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operand::Pins => "pins",
            Operand::X => "x",
            Operand::Y => "y",
            Operand::Null => "null",
            Operand::PinDirs => "pindirs",
            Operand::Pc => "pc",
            Operand::Isr => "isr",
            Operand::Osr => "osr",
            Operand::Exec => "exec",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Operand::ALL.into_iter().find(|operand| operand.name() == name)
    }
}

/// MOV source transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovOp {
    None,
    /// `~src`: bitwise NOT
    Invert,
    /// `::src`: 32-bit bit reversal
    Reverse,
}

impl MovOp {
    pub fn syntax(&self) -> &'static str {
        match self {
            MovOp::None => "",
            MovOp::Invert => "~",
            MovOp::Reverse => "::",
        }
    }

    /// Apply the transformation to a 32-bit value
    #[inline]
    pub fn apply(&self, value: u32) -> u32 {
        match self {
            MovOp::None => value,
            MovOp::Invert => !value,
            MovOp::Reverse => value.reverse_bits(),
        }
    }
}

/// SET destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetDestination {
    Pins,
    X,
    Y,
    PinDirs,
}

impl SetDestination {
    pub fn name(&self) -> &'static str {
        match self {
            SetDestination::Pins => "pins",
            SetDestination::X => "x",
            SetDestination::Y => "y",
            SetDestination::PinDirs => "pindirs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "pins" => Some(SetDestination::Pins),
            "x" => Some(SetDestination::X),
            "y" => Some(SetDestination::Y),
            "pindirs" => Some(SetDestination::PinDirs),
            _ => None,
        }
    }
}
