//! # Error Types for program images

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Invalid program magic: expected 0x50494F31, got {0:#010x}")]
    InvalidMagic(u32),

    #[error("Invalid program version: expected {expected:#010x}, found {found:#010x}")]
    InvalidVersion { expected: u32, found: u32 },

    #[error("Program image too short: {0} bytes")]
    Truncated(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;
