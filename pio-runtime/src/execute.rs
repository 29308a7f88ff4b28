//! Instruction execution
//!
//! One call executes one opcode against a machine's private state and the
//! shared fabric. A stalled attempt leaves everything untouched apart from
//! the `irq wait` bookkeeping, so the machine can retry it verbatim.

use crate::fabric::PinFabric;
use crate::state::MachineState;
use pio_spec::{
    JmpCondition, Op, Operand, Program, SetDestination, WaitSource, PC_MASK, SHIFT_WIDTH,
};

/// Result of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed; the caller moves pc to the next line
    Advance,
    /// Completed; pc has already been written
    Jump,
    /// Precondition not met; retry next cycle
    Stall,
}

impl Outcome {
    #[inline]
    pub fn is_complete(self) -> bool {
        !matches!(self, Outcome::Stall)
    }
}

/// Low `bits` set
#[inline]
fn mask(bits: u8) -> u32 {
    if bits >= SHIFT_WIDTH {
        u32::MAX
    } else {
        (1u32 << bits) - 1
    }
}

/// Read `count` consecutive pin levels starting at `base`, bit 0 = `base`
fn read_pins(fabric: &PinFabric, base: u8, count: u8) -> u32 {
    (0..count as usize)
        .filter(|i| fabric.get_gpio(base as usize + i))
        .fold(0, |value, i| value | (1u32 << i))
}

fn read_dirs(fabric: &PinFabric, base: u8, count: u8) -> u32 {
    (0..count as usize)
        .filter(|i| fabric.get_dir(base as usize + i))
        .fold(0, |value, i| value | (1u32 << i))
}

/// Drive `count` pins starting at `base` from the low bits of `value`
fn write_pins(fabric: &mut PinFabric, base: u8, count: u8, value: u32) {
    for i in 0..count.min(SHIFT_WIDTH) as usize {
        fabric.set_gpio(base as usize + i, (value >> i) & 1 != 0);
    }
}

fn write_dirs(fabric: &mut PinFabric, base: u8, count: u8, value: u32) {
    for i in 0..count.min(SHIFT_WIDTH) as usize {
        fabric.set_dir(base as usize + i, (value >> i) & 1 != 0);
    }
}

/// Source value for IN and MOV
fn read_source(source: Operand, state: &MachineState, fabric: &PinFabric) -> u32 {
    let regs = &state.regs;
    match source {
        Operand::Pins => read_pins(fabric, state.config.in_base, SHIFT_WIDTH),
        Operand::PinDirs => read_dirs(fabric, state.config.in_base, SHIFT_WIDTH),
        Operand::X => regs.x,
        Operand::Y => regs.y,
        Operand::Isr => regs.isr,
        Operand::Osr => regs.osr,
        Operand::Pc => regs.pc as u32,
        Operand::Null | Operand::Exec => 0,
    }
}

/// Top `bits` bits of `value`, moved down to bit 0
#[inline]
fn top_bits(value: u32, bits: u8) -> u32 {
    match bits {
        0 => 0,
        b if b >= SHIFT_WIDTH => value,
        b => value >> (SHIFT_WIDTH - b),
    }
}

/// Shift `bits` low bits of `data` into the ISR
fn shift_in(state: &mut MachineState, data: u32, bits: u8) {
    let regs = &mut state.regs;
    let data = data & mask(bits);

    regs.isr = if bits >= SHIFT_WIDTH {
        data
    } else if state.config.in_shift_right {
        (regs.isr >> bits) | (data << (SHIFT_WIDTH - bits))
    } else {
        (regs.isr << bits) | data
    };
    regs.isr_shift_count = regs.isr_shift_count.saturating_add(bits).min(SHIFT_WIDTH);
}

/// Shift `bits` out of the OSR
fn shift_out(state: &mut MachineState, bits: u8) -> u32 {
    let regs = &mut state.regs;

    let value = if bits >= SHIFT_WIDTH {
        let value = regs.osr;
        regs.osr = 0;
        value
    } else if state.config.out_shift_right {
        let value = regs.osr & mask(bits);
        regs.osr >>= bits;
        value
    } else {
        let value = regs.osr >> (SHIFT_WIDTH - bits);
        regs.osr <<= bits;
        value
    };
    regs.osr_shift_count = regs.osr_shift_count.saturating_sub(bits);
    value
}

/// Push the ISR into the RX FIFO, or drop it when full. Clears the ISR.
fn push_isr(state: &mut MachineState) {
    if !state.rx_fifo.push(state.regs.isr) {
        tracing::warn!(
            sm = state.index,
            value = state.regs.isr,
            "RX FIFO full, ISR contents dropped"
        );
    }
    state.regs.isr = 0;
    state.regs.isr_shift_count = 0;
}

/// Execute one opcode
pub fn execute(
    op: &Op,
    state: &mut MachineState,
    program: &Program,
    fabric: &mut PinFabric,
) -> Outcome {
    match op {
        Op::Jmp { condition, target } => {
            let regs = &mut state.regs;
            let taken = match condition {
                JmpCondition::Always => true,
                JmpCondition::XZero => regs.x == 0,
                JmpCondition::XDecrement => {
                    regs.x = regs.x.wrapping_sub(1);
                    regs.x != 0
                }
                JmpCondition::YZero => regs.y == 0,
                JmpCondition::YDecrement => {
                    regs.y = regs.y.wrapping_sub(1);
                    regs.y != 0
                }
                JmpCondition::XNotEqualY => regs.x != regs.y,
                JmpCondition::Pin => fabric.get_gpio(state.config.jmp_pin as usize),
                JmpCondition::OsrNotEmpty => regs.osr_shift_count > 0,
            };

            if !taken {
                return Outcome::Advance;
            }
            match program.resolve(target) {
                Some(index) => {
                    regs.pc = index;
                    Outcome::Jump
                }
                None => {
                    tracing::warn!(sm = state.index, target = ?target, "jump target not found");
                    Outcome::Advance
                }
            }
        }

        Op::Wait {
            polarity,
            source,
            index,
            relative,
        } => {
            let level = match source {
                WaitSource::Gpio => fabric.get_gpio(*index as usize),
                WaitSource::Pin => fabric.get_gpio(state.config.in_base as usize + *index as usize),
                WaitSource::Irq => fabric.get_irq(state.irq_index(*index, *relative)),
            };
            if level != *polarity {
                return Outcome::Stall;
            }
            if *source == WaitSource::Irq && *polarity {
                fabric.clear_irq(state.irq_index(*index, *relative));
            }
            Outcome::Advance
        }

        Op::In { source, bit_count } => {
            // Pins are gathered from in_base upwards, registers give their top bits
            let value = read_source(*source, state, fabric);
            let data = match source {
                Operand::Pins | Operand::PinDirs => value,
                _ => top_bits(value, *bit_count),
            };
            shift_in(state, data, *bit_count);

            if state.regs.isr_shift_count >= state.config.push_threshold {
                push_isr(state);
            }
            Outcome::Advance
        }

        Op::Out {
            destination,
            bit_count,
        } => {
            if state.regs.osr_shift_count == 0 {
                if let Some(word) = state.tx_fifo.pop() {
                    state.regs.osr = word;
                    state.regs.osr_shift_count = SHIFT_WIDTH;
                } else if state.config.autopull {
                    state.regs.osr = 0;
                    state.regs.osr_shift_count = state.config.pull_threshold;
                } else {
                    return Outcome::Stall;
                }
            }

            let value = shift_out(state, *bit_count);
            let config = &state.config;
            match destination {
                Operand::Pins => {
                    write_pins(fabric, config.out_base, (*bit_count).min(config.out_count), value)
                }
                Operand::PinDirs => {
                    write_dirs(fabric, config.out_base, (*bit_count).min(config.out_count), value)
                }
                Operand::X => state.regs.x = value,
                Operand::Y => state.regs.y = value,
                Operand::Isr => {
                    state.regs.isr = value;
                    state.regs.isr_shift_count = *bit_count;
                }
                Operand::Osr => state.regs.osr = value,
                Operand::Pc => {
                    state.regs.pc = (value & PC_MASK) as usize;
                    return Outcome::Jump;
                }
                Operand::Exec | Operand::Null => {
                    tracing::debug!(sm = state.index, destination = destination.name(), "out discarded");
                }
            }
            Outcome::Advance
        }

        Op::Push { if_full, block } => {
            if *if_full && state.regs.isr_shift_count < state.config.push_threshold {
                return Outcome::Advance;
            }
            if state.rx_fifo.is_full() && *block {
                return Outcome::Stall;
            }
            push_isr(state);
            Outcome::Advance
        }

        Op::Pull { if_empty, block } => {
            if *if_empty && state.regs.osr_shift_count != 0 {
                return Outcome::Advance;
            }
            match state.tx_fifo.pop() {
                Some(word) => state.regs.osr = word,
                None if *block => return Outcome::Stall,
                None => state.regs.osr = state.regs.x,
            }
            state.regs.osr_shift_count = SHIFT_WIDTH;
            Outcome::Advance
        }

        Op::Mov {
            destination,
            op,
            source,
        } => {
            let value = op.apply(read_source(*source, state, fabric));
            let config = &state.config;
            match destination {
                Operand::Pins => write_pins(fabric, config.out_base, config.out_count, value),
                Operand::PinDirs => write_dirs(fabric, config.out_base, config.out_count, value),
                Operand::X => state.regs.x = value,
                Operand::Y => state.regs.y = value,
                Operand::Isr => {
                    state.regs.isr = value;
                    state.regs.isr_shift_count = 0;
                }
                Operand::Osr => {
                    state.regs.osr = value;
                    state.regs.osr_shift_count = SHIFT_WIDTH;
                }
                Operand::Pc => {
                    state.regs.pc = (value & PC_MASK) as usize;
                    return Outcome::Jump;
                }
                Operand::Exec | Operand::Null => {
                    tracing::debug!(sm = state.index, destination = destination.name(), "mov discarded");
                }
            }
            Outcome::Advance
        }

        Op::Irq {
            clear,
            wait,
            index,
            relative,
        } => {
            let flag = state.irq_index(*index, *relative);
            if *clear {
                fabric.clear_irq(flag);
                return Outcome::Advance;
            }
            if !*wait {
                fabric.set_irq(flag);
                return Outcome::Advance;
            }

            // Raise once, then poll until another party clears it
            if !state.irq_wait_pending {
                fabric.set_irq(flag);
                state.irq_wait_pending = true;
            }
            if fabric.get_irq(flag) {
                return Outcome::Stall;
            }
            state.irq_wait_pending = false;
            Outcome::Advance
        }

        Op::Set { destination, data } => {
            let value = *data as u32;
            let config = &state.config;
            match destination {
                SetDestination::Pins => write_pins(fabric, config.set_base, config.set_count, value),
                SetDestination::PinDirs => {
                    write_dirs(fabric, config.set_base, config.set_count, value)
                }
                SetDestination::X => state.regs.x = value,
                SetDestination::Y => state.regs.y = value,
            }
            Outcome::Advance
        }

        Op::Nop => Outcome::Advance,
    }
}
