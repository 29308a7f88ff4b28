//! State machine register file

use crate::fifo::Fifo;
use pio_spec::StateMachineConfig;
use std::fmt;

/// Private registers of one state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Registers {
    /// Index of the next program line
    pub pc: usize,
    pub x: u32,
    pub y: u32,
    /// Input shift register
    pub isr: u32,
    /// Bits shifted into the ISR so far (0-32)
    pub isr_shift_count: u8,
    /// Output shift register
    pub osr: u32,
    /// Bits still available in the OSR (0-32)
    pub osr_shift_count: u8,
}

impl fmt::Display for Registers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pc={:<3} x={:#010x} y={:#010x} isr={:#010x}/{:<2} osr={:#010x}/{:<2}",
            self.pc,
            self.x,
            self.y,
            self.isr,
            self.isr_shift_count,
            self.osr,
            self.osr_shift_count
        )
    }
}

/// Observable run state of a state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    /// Last attempt did not complete and will be retried
    Stalled,
    Disabled,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Running => write!(f, "running"),
            Status::Stalled => write!(f, "stalled"),
            Status::Disabled => write!(f, "disabled"),
        }
    }
}

/// Everything an instruction may touch apart from the shared fabric
#[derive(Debug, Clone)]
pub struct MachineState {
    pub regs: Registers,
    pub config: StateMachineConfig,
    /// Caller to machine
    pub tx_fifo: Fifo,
    /// Machine to caller
    pub rx_fifo: Fifo,
    /// Position in the owning block, used by relative IRQ numbering
    pub index: usize,
    /// An `irq wait` has raised its flag and is polling for the clear
    pub irq_wait_pending: bool,
}

impl MachineState {
    pub fn new(config: StateMachineConfig) -> Self {
        MachineState {
            regs: Registers::default(),
            config,
            tx_fifo: Fifo::default(),
            rx_fifo: Fifo::default(),
            index: 0,
            irq_wait_pending: false,
        }
    }

    /// Clear registers and FIFOs, keeping configuration and index
    pub fn reset(&mut self) {
        self.regs = Registers::default();
        self.tx_fifo.clear();
        self.rx_fifo.clear();
        self.irq_wait_pending = false;
    }

    /// Resolve an IRQ operand. `rel` adds the machine index to the low two
    /// bits, keeping bit 2.
    #[inline]
    pub fn irq_index(&self, index: u8, relative: bool) -> usize {
        let index = index as usize;
        if relative {
            (index & 4) | ((index + self.index) & 3)
        } else {
            index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_display() {
        let regs = Registers {
            pc: 3,
            x: 0xFF,
            isr_shift_count: 8,
            ..Registers::default()
        };
        let text = regs.to_string();
        assert!(text.starts_with("pc=3"));
        assert!(text.contains("x=0x000000ff"));
        assert!(text.contains("isr=0x00000000/8"));
    }

    #[test]
    fn test_relative_irq_index() {
        let mut state = MachineState::new(StateMachineConfig::DEFAULT);
        state.index = 2;
        assert_eq!(state.irq_index(0, true), 2);
        assert_eq!(state.irq_index(3, true), 1);
        assert_eq!(state.irq_index(5, true), 7);
        assert_eq!(state.irq_index(7, true), 5);
        assert_eq!(state.irq_index(3, false), 3);
    }

    #[test]
    fn test_reset_keeps_config() {
        let config = StateMachineConfig::DEFAULT.with_in_base(4);
        let mut state = MachineState::new(config);
        state.regs.x = 9;
        state.tx_fifo.push(1);
        state.irq_wait_pending = true;
        state.reset();

        assert_eq!(state.regs, Registers::default());
        assert!(state.tx_fifo.is_empty());
        assert!(!state.irq_wait_pending);
        assert_eq!(state.config.in_base, 4);
    }
}
