//! Two-pass program loader
//!
//! Pass 1 records label definitions and directives against their own line
//! index. Pass 2 decodes every line positionally, so instruction indices
//! always line up with source lines and the label table.

use crate::error::{AssemblerError, Result};
use crate::lexer::Token;
use crate::parser::{parse_line, Line};
use pio_spec::config::MAX_SIDESET_COUNT;
use pio_spec::{Diagnostic, DiagnosticKind, Instruction, JmpTarget, Op, Program, SideSetDirective};

/// Assemble source text into a program.
///
/// Never fails: unrecognized lines become `Raw` and every problem is
/// recorded in [`Program::diagnostics`].
pub fn assemble(source: &str) -> Program {
    assemble_lines(source.lines())
}

/// Assemble a sequence of lines into a program
pub fn assemble_lines<I, S>(lines: I) -> Program
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<(String, Line)> = lines
        .into_iter()
        .map(|line| {
            let line = line.as_ref();
            (line.trim().to_string(), parse_line(line))
        })
        .collect();

    let mut program = Program::new();

    // Pass 1: labels and directives
    for (index, (text, line)) in lines.iter().enumerate() {
        match line {
            Line::Label(name) => {
                if program.labels.contains_key(name) {
                    program.diagnostics.push(Diagnostic {
                        line: index,
                        kind: DiagnosticKind::DuplicateLabel(name.clone()),
                    });
                } else {
                    program.labels.insert(name.clone(), index);
                }
            }
            Line::Directive { name, args } => {
                if !apply_directive(&mut program, index, name, args) {
                    program.diagnostics.push(Diagnostic {
                        line: index,
                        kind: DiagnosticKind::InvalidDirective(text.clone()),
                    });
                }
            }
            _ => {}
        }
    }

    // Pass 2: positional decode
    for (index, (text, line)) in lines.into_iter().enumerate() {
        let instr = match line {
            Line::Instruction(instr) => {
                if let Some(Op::Jmp {
                    target: JmpTarget::Label(label),
                    ..
                }) = instr.as_op()
                {
                    if !program.labels.contains_key(label) {
                        program.diagnostics.push(Diagnostic {
                            line: index,
                            kind: DiagnosticKind::UndefinedLabel(label.clone()),
                        });
                    }
                }
                instr
            }
            Line::Unrecognized => {
                program.diagnostics.push(Diagnostic {
                    line: index,
                    kind: DiagnosticKind::UnrecognizedLine(text.clone()),
                });
                Instruction::raw(text)
            }
            Line::Blank | Line::Label(_) | Line::Directive { .. } => Instruction::raw(text),
        };
        program.instructions.push(instr);
    }

    program.diagnostics.sort_by_key(|d| d.line);

    tracing::debug!(
        program = program.name.as_deref().unwrap_or("<anonymous>"),
        lines = program.len(),
        executable = program.executable_count(),
        labels = program.labels.len(),
        diagnostics = program.diagnostics.len(),
        "assembled PIO program"
    );
    for diagnostic in &program.diagnostics {
        tracing::debug!("{}", diagnostic);
    }

    program
}

/// Assemble source text, rejecting anything the permissive loader would
/// only record as a diagnostic
pub fn assemble_strict(source: &str) -> Result<Program> {
    let program = assemble(source);
    match program.diagnostics.first() {
        Some(diagnostic) => Err(AssemblerError::from(diagnostic)),
        None => Ok(program),
    }
}

/// Apply a directive. Returns false if its arguments are malformed.
fn apply_directive(program: &mut Program, index: usize, name: &str, args: &[Token]) -> bool {
    match name {
        "program" => match args {
            [Token::Identifier(program_name)] => {
                program.name = Some(program_name.clone());
                true
            }
            _ => false,
        },
        "wrap_target" => {
            program.wrap_target = Some(index);
            args.is_empty()
        }
        "wrap" => {
            program.wrap = Some(index);
            args.is_empty()
        }
        "side_set" => {
            let Some((count, flags)) = args.split_first() else {
                return false;
            };
            let Some(count) = count.number().filter(|n| *n <= MAX_SIDESET_COUNT as u32) else {
                return false;
            };
            let mut directive = SideSetDirective {
                count: count as u8,
                optional: false,
                pindirs: false,
            };
            for flag in flags {
                if flag.is_keyword("opt") {
                    directive.optional = true;
                } else if flag.is_keyword("pindirs") {
                    directive.pindirs = true;
                } else {
                    return false;
                }
            }
            program.side_set = Some(directive);
            true
        }
        // Other pioasm directives (.define, .origin, .lang_opt, ...) are inert
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pio_spec::SetDestination;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; Simple test
            set x, 1
            nop
        "#;

        let program = assemble(source);
        // Leading blank, comment, two instructions, trailing whitespace line
        assert_eq!(program.len(), 5);
        assert_eq!(program.executable_count(), 2);
        assert!(program.diagnostics.is_empty());
    }

    #[test]
    fn test_labels_point_at_their_own_line() {
        let program = assemble_lines(["start:", "set x, 3", "loop:", "jmp x--, loop", "jmp start"]);
        assert_eq!(program.label("start"), Some(0));
        assert_eq!(program.label("loop"), Some(2));
        assert!(program.instructions[0].is_raw());
        assert!(program.instructions[2].is_raw());
        assert!(program.diagnostics.is_empty());
    }

    #[test]
    fn test_wrap_directives_use_own_index() {
        let program = assemble_lines([
            ".program blink",
            ".wrap_target",
            "set pins, 1 [31]",
            "set pins, 0 [31]",
            ".wrap",
        ]);
        assert_eq!(program.name.as_deref(), Some("blink"));
        assert_eq!(program.wrap_target, Some(1));
        assert_eq!(program.wrap, Some(4));
        assert_eq!(program.wrap_bounds(), Some((1, 4)));
        assert_eq!(
            program.instructions[2].as_op(),
            Some(&Op::Set {
                destination: SetDestination::Pins,
                data: 1,
            })
        );
    }

    #[test]
    fn test_side_set_directive() {
        let program = assemble(".side_set 2 opt pindirs\nnop side 3");
        assert_eq!(
            program.side_set,
            Some(SideSetDirective {
                count: 2,
                optional: true,
                pindirs: true,
            })
        );
        assert_eq!(program.instructions[1].side_set(), Some(3));
    }

    #[test]
    fn test_unrecognized_lines_are_counted() {
        let program = assemble("set x, 1\nfoo bar\nnop\nset pins, 99");
        assert_eq!(program.len(), 4);
        assert!(program.instructions[1].is_raw());
        assert!(program.instructions[3].is_raw());
        assert_eq!(program.unrecognized_count(), 2);
        assert_eq!(
            program.diagnostics[0],
            Diagnostic {
                line: 1,
                kind: DiagnosticKind::UnrecognizedLine("foo bar".into()),
            }
        );
    }

    #[test]
    fn test_undefined_and_duplicate_labels() {
        let program = assemble("a:\na:\njmp b");
        assert_eq!(program.label("a"), Some(0));
        assert_eq!(
            program.diagnostics,
            vec![
                Diagnostic {
                    line: 1,
                    kind: DiagnosticKind::DuplicateLabel("a".into()),
                },
                Diagnostic {
                    line: 2,
                    kind: DiagnosticKind::UndefinedLabel("b".into()),
                },
            ]
        );
    }

    #[test]
    fn test_invalid_directive() {
        let program = assemble(".side_set 9\n.wrap 3\n.define FOO 1");
        assert_eq!(program.diagnostics.len(), 2);
        assert!(program.side_set.is_none());
        assert!(matches!(
            program.diagnostics[0].kind,
            DiagnosticKind::InvalidDirective(_)
        ));
    }

    #[test]
    fn test_assemble_strict() {
        assert!(assemble_strict("set x, 1\njmp 0").is_ok());

        let err = assemble_strict("set x, 1\nsett y, 2").unwrap_err();
        assert_eq!(
            err,
            AssemblerError::UnrecognizedLine {
                line: 2,
                text: "sett y, 2".into(),
            }
        );

        let err = assemble_strict("jmp nowhere").unwrap_err();
        assert!(matches!(err, AssemblerError::UndefinedLabel { line: 1, .. }));
    }
}
