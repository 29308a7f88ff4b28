//! # State Machine Configuration
//!
//! Pin mapping, FIFO thresholds and shift directions for one state machine.
//! The runtime validates a configuration before a state machine accepts it.

use crate::{NUM_GPIO, SHIFT_WIDTH};
use std::fmt;

/// Largest SET pin group
pub const MAX_SET_COUNT: u8 = 5;

/// Largest side-set pin group
pub const MAX_SIDESET_COUNT: u8 = 5;

/// Per-state-machine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateMachineConfig {
    /// First pin written by `out pins` / `mov pins`
    pub out_base: u8,
    /// Number of pins written by `out pins` / `mov pins` (0-32)
    pub out_count: u8,
    /// First pin written by `set pins`
    pub set_base: u8,
    /// Number of pins written by `set pins` (0-5)
    pub set_count: u8,
    /// First pin read by `in pins`, `mov ..., pins` and `wait pin`
    pub in_base: u8,
    /// First side-set pin
    pub sideset_base: u8,
    /// Number of side-set pins (0-5)
    pub sideset_count: u8,
    /// Side-set drives pin directions instead of levels
    pub sideset_pindirs: bool,
    /// Pin tested by `jmp pin`
    pub jmp_pin: u8,
    /// Refill OSR automatically when it runs dry
    pub autopull: bool,
    /// Autopush requested. `in` pushes the ISR once `push_threshold` bits
    /// are shifted in whether or not this is set.
    pub autopush: bool,
    /// Autopull threshold in bits (1-32)
    pub pull_threshold: u8,
    /// ISR push threshold in bits (1-32)
    pub push_threshold: u8,
    /// ISR shifts right (new bits enter at the top)
    pub in_shift_right: bool,
    /// OSR shifts right (bits leave from the bottom)
    pub out_shift_right: bool,
}

impl StateMachineConfig {
    /// Reset configuration: everything mapped at pin 0, thresholds at 32,
    /// both shift registers shifting right
    pub const DEFAULT: Self = Self {
        out_base: 0,
        out_count: 32,
        set_base: 0,
        set_count: MAX_SET_COUNT,
        in_base: 0,
        sideset_base: 0,
        sideset_count: 0,
        sideset_pindirs: false,
        jmp_pin: 0,
        autopull: false,
        autopush: false,
        pull_threshold: SHIFT_WIDTH,
        push_threshold: SHIFT_WIDTH,
        in_shift_right: true,
        out_shift_right: true,
    };

    /// Map `out pins` to `count` pins starting at `base`
    pub fn with_out_pins(mut self, base: u8, count: u8) -> Self {
        self.out_base = base;
        self.out_count = count;
        self
    }

    /// Map `set pins` to `count` pins starting at `base`
    pub fn with_set_pins(mut self, base: u8, count: u8) -> Self {
        self.set_base = base;
        self.set_count = count;
        self
    }

    pub fn with_in_base(mut self, base: u8) -> Self {
        self.in_base = base;
        self
    }

    /// Map side-set to `count` pins starting at `base`
    pub fn with_sideset_pins(mut self, base: u8, count: u8) -> Self {
        self.sideset_base = base;
        self.sideset_count = count;
        self
    }

    pub fn with_jmp_pin(mut self, pin: u8) -> Self {
        self.jmp_pin = pin;
        self
    }

    /// Enable autopull at the given threshold
    pub fn with_autopull(mut self, threshold: u8) -> Self {
        self.autopull = true;
        self.pull_threshold = threshold;
        self
    }

    /// Enable autopush and set the push threshold
    pub fn with_autopush(mut self, threshold: u8) -> Self {
        self.autopush = true;
        self.push_threshold = threshold;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pull_threshold == 0 || self.pull_threshold > SHIFT_WIDTH {
            return Err(ConfigError::InvalidPullThreshold(self.pull_threshold));
        }
        if self.push_threshold == 0 || self.push_threshold > SHIFT_WIDTH {
            return Err(ConfigError::InvalidPushThreshold(self.push_threshold));
        }

        let pins = [
            ("out_base", self.out_base),
            ("set_base", self.set_base),
            ("in_base", self.in_base),
            ("sideset_base", self.sideset_base),
            ("jmp_pin", self.jmp_pin),
        ];
        for (field, pin) in pins {
            if pin as usize >= NUM_GPIO {
                return Err(ConfigError::PinOutOfRange { field, pin });
            }
        }

        if self.out_count > SHIFT_WIDTH {
            return Err(ConfigError::InvalidOutCount(self.out_count));
        }
        if self.set_count > MAX_SET_COUNT {
            return Err(ConfigError::InvalidSetCount(self.set_count));
        }
        if self.sideset_count > MAX_SIDESET_COUNT {
            return Err(ConfigError::InvalidSideSetCount(self.sideset_count));
        }

        Ok(())
    }
}

impl Default for StateMachineConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for StateMachineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "out {}+{}, set {}+{}, in {}, side {}+{}, jmp_pin {}, pull {}{}, push {}{}",
            self.out_base,
            self.out_count,
            self.set_base,
            self.set_count,
            self.in_base,
            self.sideset_base,
            self.sideset_count,
            self.jmp_pin,
            self.pull_threshold,
            if self.autopull { " (auto)" } else { "" },
            self.push_threshold,
            if self.autopush { " (auto)" } else { "" },
        )
    }
}

/// Configuration error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Pull threshold must be in range [1, 32]
    InvalidPullThreshold(u8),
    /// Push threshold must be in range [1, 32]
    InvalidPushThreshold(u8),
    /// A base pin or jmp_pin is not a valid GPIO
    PinOutOfRange { field: &'static str, pin: u8 },
    /// Out count must be in range [0, 32]
    InvalidOutCount(u8),
    /// Set count must be in range [0, 5]
    InvalidSetCount(u8),
    /// Side-set count must be in range [0, 5]
    InvalidSideSetCount(u8),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPullThreshold(value) => {
                write!(f, "pull_threshold must be in range [1, 32], got {}", value)
            }
            ConfigError::InvalidPushThreshold(value) => {
                write!(f, "push_threshold must be in range [1, 32], got {}", value)
            }
            ConfigError::PinOutOfRange { field, pin } => {
                write!(f, "{} must be a GPIO in range [0, 31], got {}", field, pin)
            }
            ConfigError::InvalidOutCount(value) => {
                write!(f, "out_count must be in range [0, 32], got {}", value)
            }
            ConfigError::InvalidSetCount(value) => {
                write!(f, "set_count must be in range [0, 5], got {}", value)
            }
            ConfigError::InvalidSideSetCount(value) => {
                write!(f, "sideset_count must be in range [0, 5], got {}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StateMachineConfig::DEFAULT;
        assert_eq!(config.out_count, 32);
        assert_eq!(config.set_count, 5);
        assert_eq!(config.sideset_count, 0);
        assert_eq!(config.pull_threshold, 32);
        assert_eq!(config.push_threshold, 32);
        assert!(!config.autopull);
        assert!(!config.autopush);
        assert!(config.in_shift_right);
        assert!(config.out_shift_right);
        assert!(config.validate().is_ok());
        assert_eq!(StateMachineConfig::default(), config);
    }

    #[test]
    fn test_builders() {
        let config = StateMachineConfig::default()
            .with_out_pins(2, 8)
            .with_set_pins(4, 1)
            .with_in_base(10)
            .with_sideset_pins(20, 2)
            .with_jmp_pin(7)
            .with_autopull(8)
            .with_autopush(16);

        assert_eq!((config.out_base, config.out_count), (2, 8));
        assert_eq!((config.set_base, config.set_count), (4, 1));
        assert_eq!(config.in_base, 10);
        assert_eq!((config.sideset_base, config.sideset_count), (20, 2));
        assert_eq!(config.jmp_pin, 7);
        assert!(config.autopull && config.autopush);
        assert_eq!(config.pull_threshold, 8);
        assert_eq!(config.push_threshold, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            StateMachineConfig::default().with_autopull(0).validate(),
            Err(ConfigError::InvalidPullThreshold(0))
        );
        assert_eq!(
            StateMachineConfig::default().with_autopush(33).validate(),
            Err(ConfigError::InvalidPushThreshold(33))
        );
        assert_eq!(
            StateMachineConfig::default().with_jmp_pin(32).validate(),
            Err(ConfigError::PinOutOfRange { field: "jmp_pin", pin: 32 })
        );
        assert_eq!(
            StateMachineConfig::default().with_set_pins(0, 6).validate(),
            Err(ConfigError::InvalidSetCount(6))
        );
        assert_eq!(
            StateMachineConfig::default().with_sideset_pins(0, 6).validate(),
            Err(ConfigError::InvalidSideSetCount(6))
        );
        assert_eq!(
            StateMachineConfig::default().with_out_pins(0, 33).validate(),
            Err(ConfigError::InvalidOutCount(33))
        );
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::PinOutOfRange { field: "in_base", pin: 40 };
        assert_eq!(err.to_string(), "in_base must be a GPIO in range [0, 31], got 40");
        let err = ConfigError::InvalidPushThreshold(0);
        assert_eq!(err.to_string(), "push_threshold must be in range [1, 32], got 0");
    }
}
