//! # Program Structure
//!
//! A loaded PIO program: decoded lines in source order, the label table,
//! wrap bounds and load diagnostics.
//!
//! Binary image format:
//! ```text
//! Offset  Size  Field
//! ──────────────────────────────────
//! 0x00    4     magic ("PIO1")
//! 0x04    4     version
//! 0x08    ...   bincode-encoded Program
//! ```

use crate::error::{Result, SpecError};
use crate::instruction::{Instruction, JmpTarget};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Magic number for program images: "PIO1" = 0x50494F31
pub const MAGIC: u32 = 0x50494F31;

/// Image format version
pub const VERSION: u32 = 0x00010000;

/// Image header size in bytes
pub const HEADER_SIZE: usize = 8;

/// `.side_set` directive contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideSetDirective {
    /// Number of side-set pins
    pub count: u8,
    /// `opt`: instructions may omit `side`
    pub optional: bool,
    /// `pindirs`: side-set drives pin directions
    pub pindirs: bool,
}

/// Something the loader accepted but could not make sense of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Zero-based line index (equal to the instruction index)
    pub line: usize,
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Line did not match any instruction grammar and was kept as `Raw`
    UnrecognizedLine(String),
    /// JMP names a label that is never defined
    UndefinedLabel(String),
    /// Label defined more than once (first definition wins)
    DuplicateLabel(String),
    /// Directive with malformed arguments
    InvalidDirective(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line + 1;
        match &self.kind {
            DiagnosticKind::UnrecognizedLine(text) => {
                write!(f, "line {}: unrecognized line `{}`", line, text)
            }
            DiagnosticKind::UndefinedLabel(label) => {
                write!(f, "line {}: undefined label `{}`", line, label)
            }
            DiagnosticKind::DuplicateLabel(label) => {
                write!(f, "line {}: duplicate label `{}`", line, label)
            }
            DiagnosticKind::InvalidDirective(text) => {
                write!(f, "line {}: invalid directive `{}`", line, text)
            }
        }
    }
}

/// Complete program structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// `.program` name, if declared
    pub name: Option<String>,

    /// One entry per source line, `Raw` included
    pub instructions: Vec<Instruction>,

    /// Label name -> index of the label's own line
    pub labels: BTreeMap<String, usize>,

    /// Index of the `.wrap_target` line
    pub wrap_target: Option<usize>,

    /// Index of the `.wrap` line
    pub wrap: Option<usize>,

    /// `.side_set` directive, if declared
    pub side_set: Option<SideSetDirective>,

    /// Load diagnostics in line order
    pub diagnostics: Vec<Diagnostic>,
}

impl Program {
    /// Create a new empty program
    pub fn new() -> Self {
        Self::default()
    }

    /// Program built directly from decoded instructions (no labels, no wrap)
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self {
            instructions,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Index of a label
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// Resolve a jump target to a program index
    pub fn resolve(&self, target: &JmpTarget) -> Option<usize> {
        match target {
            JmpTarget::Label(name) => self.label(name),
            JmpTarget::Address(addr) => Some(*addr as usize),
        }
    }

    /// Effective wrap range `(wrap_target, wrap)`
    ///
    /// A program that declares either end wraps; a missing `.wrap_target`
    /// defaults to 0 and a missing `.wrap` to the last line.
    pub fn wrap_bounds(&self) -> Option<(usize, usize)> {
        if self.wrap_target.is_none() && self.wrap.is_none() {
            return None;
        }
        let target = self.wrap_target.unwrap_or(0);
        let top = self.wrap.unwrap_or(self.len().saturating_sub(1));
        Some((target, top))
    }

    /// Number of executable (non-`Raw`) instructions
    pub fn executable_count(&self) -> usize {
        self.instructions.iter().filter(|instr| !instr.is_raw()).count()
    }

    /// Number of lines that fell back to `Raw` because nothing matched
    pub fn unrecognized_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.kind, DiagnosticKind::UnrecognizedLine(_)))
            .count()
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(&MAGIC.to_le_bytes());
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bincode::serialize_into(&mut bytes, self)?;
        Ok(bytes)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(SpecError::Truncated(bytes.len()));
        }

        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != MAGIC {
            return Err(SpecError::InvalidMagic(magic));
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != VERSION {
            return Err(SpecError::InvalidVersion {
                expected: VERSION,
                found: version,
            });
        }

        Ok(bincode::deserialize(&bytes[HEADER_SIZE..])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{JmpCondition, Op, SetDestination};

    fn blink() -> Program {
        let mut program = Program::from_instructions(vec![
            Instruction::raw(".wrap_target"),
            Instruction::op(Op::Set {
                destination: SetDestination::Pins,
                data: 1,
            })
            .with_delay(31),
            Instruction::op(Op::Set {
                destination: SetDestination::Pins,
                data: 0,
            })
            .with_delay(31),
            Instruction::raw(".wrap"),
        ]);
        program.wrap_target = Some(0);
        program.wrap = Some(3);
        program
    }

    #[test]
    fn test_empty_program() {
        let program = Program::new();
        assert!(program.is_empty());
        assert_eq!(program.wrap_bounds(), None);
        assert_eq!(program.unrecognized_count(), 0);
    }

    #[test]
    fn test_wrap_bounds_defaults() {
        let mut program = blink();
        assert_eq!(program.wrap_bounds(), Some((0, 3)));

        program.wrap_target = None;
        assert_eq!(program.wrap_bounds(), Some((0, 3)));

        program.wrap_target = Some(1);
        program.wrap = None;
        assert_eq!(program.wrap_bounds(), Some((1, 3)));
    }

    #[test]
    fn test_resolve_targets() {
        let mut program = blink();
        program.labels.insert("loop".to_string(), 0);

        assert_eq!(program.resolve(&JmpTarget::Label("loop".into())), Some(0));
        assert_eq!(program.resolve(&JmpTarget::Label("missing".into())), None);
        assert_eq!(program.resolve(&JmpTarget::Address(2)), Some(2));
    }

    #[test]
    fn test_counts() {
        let mut program = blink();
        assert_eq!(program.executable_count(), 2);

        program.diagnostics.push(Diagnostic {
            line: 4,
            kind: DiagnosticKind::UnrecognizedLine("blah".into()),
        });
        program.diagnostics.push(Diagnostic {
            line: 5,
            kind: DiagnosticKind::UndefinedLabel("nowhere".into()),
        });
        assert_eq!(program.unrecognized_count(), 1);
    }

    #[test]
    fn test_program_serialization() {
        let mut program = blink();
        program.name = Some("blink".into());
        program.labels.insert("top".into(), 1);
        program.instructions.push(Instruction::op(Op::Jmp {
            condition: JmpCondition::XDecrement,
            target: JmpTarget::Label("top".into()),
        }));

        let bytes = program.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &MAGIC.to_le_bytes());

        let deserialized = Program::from_bytes(&bytes).unwrap();
        assert_eq!(program, deserialized);
    }

    #[test]
    fn test_from_bytes_rejects_bad_header() {
        assert!(matches!(Program::from_bytes(&[1, 2]), Err(SpecError::Truncated(2))));

        let mut bytes = blink().to_bytes().unwrap();
        bytes[0] = 0;
        assert!(matches!(Program::from_bytes(&bytes), Err(SpecError::InvalidMagic(_))));

        let mut bytes = blink().to_bytes().unwrap();
        bytes[4] = 0xFF;
        assert!(matches!(
            Program::from_bytes(&bytes),
            Err(SpecError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            line: 0,
            kind: DiagnosticKind::DuplicateLabel("loop".into()),
        };
        assert_eq!(d.to_string(), "line 1: duplicate label `loop`");
    }
}
