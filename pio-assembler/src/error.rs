//! Assembler errors
//!
//! Only raised by strict assembly; the default loader records the same
//! conditions as diagnostics and keeps going.

use pio_spec::{Diagnostic, DiagnosticKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("Unrecognized line {line}: {text}")]
    UnrecognizedLine { line: usize, text: String },

    #[error("Undefined label at line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("Duplicate label at line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("Invalid directive at line {line}: {text}")]
    InvalidDirective { line: usize, text: String },
}

impl From<&Diagnostic> for AssemblerError {
    fn from(diagnostic: &Diagnostic) -> Self {
        // Error messages use one-based line numbers
        let line = diagnostic.line + 1;
        match &diagnostic.kind {
            DiagnosticKind::UnrecognizedLine(text) => AssemblerError::UnrecognizedLine {
                line,
                text: text.clone(),
            },
            DiagnosticKind::UndefinedLabel(label) => AssemblerError::UndefinedLabel {
                line,
                label: label.clone(),
            },
            DiagnosticKind::DuplicateLabel(label) => AssemblerError::DuplicateLabel {
                line,
                label: label.clone(),
            },
            DiagnosticKind::InvalidDirective(text) => AssemblerError::InvalidDirective {
                line,
                text: text.clone(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;
