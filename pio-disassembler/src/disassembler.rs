//! Program-level rendering

use crate::formatter::format;
use pio_spec::{Instruction, Program};

/// Disassemble a program back into assembly source.
///
/// Executable lines are indented; `Raw` lines (labels, directives, comments)
/// are emitted verbatim, so the output assembles to the same program.
pub fn disassemble(program: &Program) -> String {
    let mut output = String::new();

    for instr in &program.instructions {
        match instr {
            Instruction::Raw { text } => output.push_str(text),
            Instruction::Op { .. } => {
                output.push_str("    ");
                output.push_str(&format(instr));
            }
        }
        output.push('\n');
    }

    output
}

/// Annotated listing with line indices and wrap markers
pub fn listing(program: &Program) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "; PIO program {}\n",
        program.name.as_deref().unwrap_or("<anonymous>")
    ));
    output.push_str(&format!(
        "; {} lines, {} executable, {} labels\n",
        program.len(),
        program.executable_count(),
        program.labels.len()
    ));
    if let Some(side_set) = &program.side_set {
        output.push_str(&format!(
            "; side-set: {} pin(s){}{}\n",
            side_set.count,
            if side_set.optional { ", optional" } else { "" },
            if side_set.pindirs { ", pindirs" } else { "" },
        ));
    }
    for diagnostic in &program.diagnostics {
        output.push_str(&format!("; warning: {}\n", diagnostic));
    }
    output.push('\n');

    let wrap = program.wrap_bounds();
    for (index, instr) in program.instructions.iter().enumerate() {
        output.push_str(&format!("{:3}: {}", index, format(instr)));
        match wrap {
            Some((target, _)) if target == index => output.push_str("    ; <- wrap target"),
            Some((_, top)) if top == index => output.push_str("    ; <- wrap"),
            _ => {}
        }
        output.push('\n');
    }

    output
}
