//! PIO state machine
//!
//! A [`StateMachine`] owns its program, register file and FIFOs. The pin
//! fabric is borrowed for each [`StateMachine::step`], so several machines can
//! share one fabric without any back-reference to their block.
//!
//! One step executes at most one instruction:
//!
//! 1. `Raw` lines are skipped without consuming a cycle.
//! 2. Running past the last line wraps when the program declares a wrap,
//!    otherwise the machine disables itself.
//! 3. A stalled attempt changes nothing and consumes no cycle.
//! 4. A completed instruction applies side-set, burns its delay cycles,
//!    advances pc, then applies the wrap.

use crate::error::{Result, RuntimeError};
use crate::execute::{execute, Outcome};
use crate::fabric::PinFabric;
use crate::state::{MachineState, Registers, Status};
use pio_spec::{Instruction, Program, StateMachineConfig};

/// What the next instruction slot holds
enum Fetch {
    /// Executable instruction at this index
    Op(usize),
    /// Nothing executable inside the wrap range
    Idle,
    /// Ran past the end with no wrap
    End,
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: MachineState,
    program: Program,
    /// Effective `(wrap_target, wrap)` of the loaded program
    wrap: Option<(usize, usize)>,
    enabled: bool,
    stalled: bool,
    cycle_count: u64,
}

impl StateMachine {
    /// Empty, disabled state machine with the reset configuration
    pub fn new() -> Self {
        StateMachine {
            state: MachineState::new(StateMachineConfig::DEFAULT),
            program: Program::new(),
            wrap: None,
            enabled: false,
            stalled: false,
            cycle_count: 0,
        }
    }

    /// Create a state machine with a validated configuration
    pub fn with_config(config: StateMachineConfig) -> Result<Self> {
        let mut sm = Self::new();
        sm.set_config(config)?;
        Ok(sm)
    }

    /// Replace the configuration. Invalid configurations are rejected and
    /// the current one is kept.
    pub fn set_config(&mut self, config: StateMachineConfig) -> Result<()> {
        config.validate().map_err(RuntimeError::Config)?;
        self.state.config = config;
        Ok(())
    }

    pub fn config(&self) -> &StateMachineConfig {
        &self.state.config
    }

    /// Replace the program wholesale and restart at line 0
    pub fn load_program(&mut self, program: &Program) {
        self.program = program.clone();
        self.wrap = program.wrap_bounds();
        self.state.regs.pc = 0;
        self.state.irq_wait_pending = false;
        self.stalled = false;

        if let Some(side_set) = program.side_set {
            if self.state.config.sideset_count == 0 {
                self.state.config.sideset_count = side_set.count;
                self.state.config.sideset_pindirs = side_set.pindirs;
            }
        }

        tracing::debug!(
            sm = self.state.index,
            program = program.name.as_deref().unwrap_or("<anonymous>"),
            lines = program.len(),
            wrap = ?self.wrap,
            "program loaded"
        );
    }

    /// Assemble and load program text. Returns the loaded program so the
    /// caller can inspect its diagnostics.
    pub fn load_source(&mut self, source: &str) -> &Program {
        let program = pio_assembler::assemble(source);
        self.load_program(&program);
        &self.program
    }

    /// Load a serialized program image
    pub fn load_image(&mut self, bytes: &[u8]) -> Result<()> {
        let program = Program::from_bytes(bytes)?;
        self.load_program(&program);
        Ok(())
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Position in the owning block
    pub fn index(&self) -> usize {
        self.state.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.state.index = index;
    }

    pub fn enable(&mut self) {
        if !self.enabled {
            tracing::debug!(sm = self.state.index, "state machine enabled");
        }
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        if self.enabled {
            tracing::debug!(sm = self.state.index, "state machine disabled");
        }
        self.enabled = false;
    }

    /// Clear registers, FIFOs and counters. Program, configuration and the
    /// enabled flag are kept.
    pub fn restart(&mut self) {
        self.state.reset();
        self.stalled = false;
        self.cycle_count = 0;
    }

    /// Execute one instruction slot. Returns false if the machine is (or just
    /// became) disabled.
    ///
    /// `Raw` lines (labels, directives, comments) are passed over inside the
    /// same step and cost no cycle, so one step is never spent on them.
    pub fn step(&mut self, fabric: &mut PinFabric) -> bool {
        if !self.enabled {
            return false;
        }

        let index = match self.fetch() {
            Fetch::Op(index) => index,
            Fetch::Idle => {
                self.cycle_count += 1;
                return true;
            }
            Fetch::End => {
                tracing::debug!(
                    sm = self.state.index,
                    pc = self.state.regs.pc,
                    "ran past end of program without wrap"
                );
                self.disable();
                return false;
            }
        };

        let Some(Instruction::Op {
            op,
            delay,
            side_set,
        }) = self.program.instructions.get(index)
        else {
            self.cycle_count += 1;
            return true;
        };

        tracing::trace!(
            sm = self.state.index,
            pc = index,
            op = op.mnemonic(),
            cycle = self.cycle_count,
            "execute"
        );

        let outcome = execute(op, &mut self.state, &self.program, fabric);
        if outcome == Outcome::Stall {
            if !self.stalled {
                tracing::trace!(sm = self.state.index, pc = index, "stalled");
            }
            self.stalled = true;
            return true;
        }
        self.stalled = false;

        if let Some(bits) = *side_set {
            apply_side_set(&self.state, fabric, bits);
        }
        self.cycle_count += 1 + *delay as u64;

        if outcome == Outcome::Advance {
            self.state.regs.pc += 1;
        }
        self.apply_wrap();
        true
    }

    /// Step up to `cycles` times, stopping early once the machine disables.
    /// Returns the number of steps taken.
    pub fn run_cycles(&mut self, fabric: &mut PinFabric, cycles: u64) -> u64 {
        let mut steps = 0;
        while steps < cycles && self.step(fabric) {
            steps += 1;
        }
        steps
    }

    /// Queue a word for the program. Returns false if the TX FIFO is full.
    pub fn put_tx(&mut self, value: u32) -> bool {
        self.state.tx_fifo.push(value)
    }

    /// Take the oldest word the program pushed
    pub fn get_rx(&mut self) -> Option<u32> {
        self.state.rx_fifo.pop()
    }

    pub fn tx_level(&self) -> usize {
        self.state.tx_fifo.len()
    }

    pub fn rx_level(&self) -> usize {
        self.state.rx_fifo.len()
    }

    pub fn registers(&self) -> &Registers {
        &self.state.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.state.regs
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled
    }

    pub fn status(&self) -> Status {
        if !self.enabled {
            Status::Disabled
        } else if self.stalled {
            Status::Stalled
        } else {
            Status::Running
        }
    }

    /// Cycles consumed by completed instructions, delays included
    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Program line at pc
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.program.get(self.state.regs.pc)
    }

    /// One-line register and status summary for debugging
    pub fn dump(&self) -> String {
        let current = self
            .current_instruction()
            .map(pio_disassembler::format)
            .unwrap_or_else(|| "<end>".to_string());
        format!(
            "sm{} [{}] cycle={} {} tx={} rx={} | {}",
            self.state.index,
            self.status(),
            self.cycle_count,
            self.state.regs,
            self.tx_level(),
            self.rx_level(),
            current
        )
    }

    /// Find the next executable line, skipping `Raw` lines
    fn fetch(&mut self) -> Fetch {
        let len = self.program.len();

        // Every line is visited at most once per wrap lap
        for _ in 0..=len {
            let pc = self.state.regs.pc;
            if pc >= len {
                match self.wrap {
                    Some((target, _)) if target < len => self.state.regs.pc = target,
                    Some(_) => return Fetch::Idle,
                    None => return Fetch::End,
                }
                continue;
            }
            if !self.program.instructions[pc].is_raw() {
                return Fetch::Op(pc);
            }
            self.state.regs.pc += 1;
            self.apply_wrap();
        }
        Fetch::Idle
    }

    fn apply_wrap(&mut self) {
        if let Some((target, top)) = self.wrap {
            if self.state.regs.pc > top {
                self.state.regs.pc = target;
            }
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive the side-set pin group from `bits`
fn apply_side_set(state: &MachineState, fabric: &mut PinFabric, bits: u32) {
    let config = &state.config;
    for i in 0..config.sideset_count as usize {
        let pin = config.sideset_base as usize + i;
        let level = (bits >> i) & 1 != 0;
        if config.sideset_pindirs {
            fabric.set_dir(pin, level);
        } else {
            fabric.set_gpio(pin, level);
        }
    }
}
