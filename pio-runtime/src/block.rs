//! PIO block: up to four state machines sharing one pin fabric

use crate::error::{Result, RuntimeError};
use crate::fabric::PinFabric;
use crate::machine::StateMachine;
use pio_spec::MAX_STATE_MACHINES;

/// A PIO block
///
/// Owns the [`PinFabric`] and the state machines attached to it. Each call to
/// [`PioBlock::step_all`] is one tick: every enabled machine executes one
/// instruction slot, in ascending index order, so a machine sees fabric
/// writes made earlier in the same tick by lower-numbered machines.
#[derive(Debug, Clone, Default)]
pub struct PioBlock {
    fabric: PinFabric,
    machines: Vec<StateMachine>,
    running: bool,
    ticks: u64,
}

impl PioBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a state machine and return its index.
    ///
    /// Fails with [`RuntimeError::CapacityExceeded`] once four machines are
    /// attached; existing machines are left untouched.
    pub fn add_state_machine(&mut self, mut sm: StateMachine) -> Result<usize> {
        if self.machines.len() >= MAX_STATE_MACHINES {
            return Err(RuntimeError::CapacityExceeded {
                capacity: MAX_STATE_MACHINES,
            });
        }
        let index = self.machines.len();
        sm.set_index(index);
        self.machines.push(sm);
        Ok(index)
    }

    /// Enable every attached machine and start ticking
    pub fn start_all(&mut self) {
        self.running = true;
        for sm in &mut self.machines {
            sm.enable();
        }
        tracing::debug!(machines = self.machines.len(), "PIO block started");
    }

    pub fn stop_all(&mut self) {
        self.running = false;
        for sm in &mut self.machines {
            sm.disable();
        }
        tracing::debug!(ticks = self.ticks, "PIO block stopped");
    }

    /// Advance every enabled machine by one step.
    ///
    /// Returns whether any machine is still active afterwards. A stopped
    /// block does nothing and returns false.
    pub fn step_all(&mut self) -> bool {
        if !self.running {
            return false;
        }

        let mut active = false;
        for sm in &mut self.machines {
            if sm.is_enabled() {
                active |= sm.step(&mut self.fabric);
            }
        }
        self.ticks += 1;
        active
    }

    /// Tick until no machine is active or `max_ticks` is reached. Returns the
    /// number of ticks that left at least one machine active.
    pub fn run(&mut self, max_ticks: u64) -> u64 {
        let mut ticks = 0;
        while ticks < max_ticks && self.step_all() {
            ticks += 1;
        }
        ticks
    }

    pub fn get_gpio(&self, pin: usize) -> bool {
        self.fabric.get_gpio(pin)
    }

    pub fn get_irq(&self, index: usize) -> bool {
        self.fabric.get_irq(index)
    }

    pub fn fabric(&self) -> &PinFabric {
        &self.fabric
    }

    /// Mutable fabric access, for driving input pins and IRQ flags
    pub fn fabric_mut(&mut self) -> &mut PinFabric {
        &mut self.fabric
    }

    pub fn state_machine(&self, index: usize) -> Option<&StateMachine> {
        self.machines.get(index)
    }

    pub fn state_machine_mut(&mut self, index: usize) -> Option<&mut StateMachine> {
        self.machines.get_mut(index)
    }

    /// Queue a word into a machine's TX FIFO. `Ok(false)` when the FIFO is full.
    pub fn put_tx(&mut self, index: usize, value: u32) -> Result<bool> {
        self.machines
            .get_mut(index)
            .map(|sm| sm.put_tx(value))
            .ok_or(RuntimeError::InvalidStateMachine(index))
    }

    pub fn get_rx(&mut self, index: usize) -> Result<Option<u32>> {
        self.machines
            .get_mut(index)
            .map(StateMachine::get_rx)
            .ok_or(RuntimeError::InvalidStateMachine(index))
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks executed since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
