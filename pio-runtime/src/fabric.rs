//! Shared pin and interrupt state
//!
//! One [`PinFabric`] is owned by the PIO block and lent to each state machine
//! for the duration of its step. Indices outside the GPIO or IRQ range read as
//! low and writes to them are ignored.

use pio_spec::{NUM_GPIO, NUM_IRQ_FLAGS};

/// GPIO levels, GPIO directions and IRQ flags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinFabric {
    gpio_state: [bool; NUM_GPIO],
    gpio_dir: [bool; NUM_GPIO],
    irq_flags: [bool; NUM_IRQ_FLAGS],
}

impl PinFabric {
    /// All pins low, all inputs, no IRQ raised
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin level
    #[inline]
    pub fn get_gpio(&self, pin: usize) -> bool {
        self.gpio_state.get(pin).copied().unwrap_or(false)
    }

    /// Drive a pin level
    #[inline]
    pub fn set_gpio(&mut self, pin: usize, level: bool) {
        if let Some(slot) = self.gpio_state.get_mut(pin) {
            *slot = level;
        }
    }

    /// Pin direction (true = output)
    #[inline]
    pub fn get_dir(&self, pin: usize) -> bool {
        self.gpio_dir.get(pin).copied().unwrap_or(false)
    }

    #[inline]
    pub fn set_dir(&mut self, pin: usize, output: bool) {
        if let Some(slot) = self.gpio_dir.get_mut(pin) {
            *slot = output;
        }
    }

    #[inline]
    pub fn get_irq(&self, index: usize) -> bool {
        self.irq_flags.get(index).copied().unwrap_or(false)
    }

    /// Raise an IRQ flag. Flags stay raised until cleared.
    #[inline]
    pub fn set_irq(&mut self, index: usize) {
        if let Some(flag) = self.irq_flags.get_mut(index) {
            *flag = true;
        }
    }

    #[inline]
    pub fn clear_irq(&mut self, index: usize) {
        if let Some(flag) = self.irq_flags.get_mut(index) {
            *flag = false;
        }
    }

    /// Pin levels as a bitmask, bit N = GPIO N
    pub fn gpio_mask(&self) -> u32 {
        to_mask(&self.gpio_state) as u32
    }

    /// Pin directions as a bitmask, bit N = GPIO N
    pub fn dir_mask(&self) -> u32 {
        to_mask(&self.gpio_dir) as u32
    }

    /// IRQ flags as a bitmask, bit N = flag N
    pub fn irq_mask(&self) -> u8 {
        to_mask(&self.irq_flags) as u8
    }

    /// Return every pin, direction and flag to its reset state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn to_mask(bits: &[bool]) -> u64 {
    bits.iter()
        .enumerate()
        .filter(|(_, set)| **set)
        .fold(0, |mask, (i, _)| mask | (1u64 << i))
}
