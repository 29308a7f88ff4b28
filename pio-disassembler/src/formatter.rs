//! Instruction formatting to assembly text

use pio_spec::{Instruction, JmpCondition, JmpTarget, Op};

/// Format instruction as assembly text
///
/// The output decodes back to the same instruction. `Raw` lines render as
/// their original text.
pub fn format(instr: &Instruction) -> String {
    match instr {
        Instruction::Raw { text } => text.clone(),
        Instruction::Op {
            op,
            delay,
            side_set,
        } => {
            let mut text = format_op(op);
            if let Some(bits) = side_set {
                text.push_str(&format!(" side {}", bits));
            }
            if *delay > 0 {
                text.push_str(&format!(" [{}]", delay));
            }
            text
        }
    }
}

/// Format an opcode without timing annotations
pub fn format_op(op: &Op) -> String {
    match op {
        Op::Jmp { condition, target } => {
            let target = format_target(target);
            match condition {
                JmpCondition::Always => format!("jmp {}", target),
                _ => format!("jmp {}, {}", condition.syntax(), target),
            }
        }

        Op::Wait {
            polarity,
            source,
            index,
            relative,
        } => {
            let mut text = format!("wait {} {} {}", u8::from(*polarity), source.name(), index);
            if *relative {
                text.push_str(" rel");
            }
            text
        }

        Op::In { source, bit_count } => format!("in {}, {}", source.name(), bit_count),

        Op::Out {
            destination,
            bit_count,
        } => format!("out {}, {}", destination.name(), bit_count),

        Op::Push { if_full, block } => {
            let mut text = "push".to_string();
            if *if_full {
                text.push_str(" iffull");
            }
            if !*block {
                text.push_str(" noblock");
            }
            text
        }

        Op::Pull { if_empty, block } => {
            let mut text = "pull".to_string();
            if *if_empty {
                text.push_str(" ifempty");
            }
            if !*block {
                text.push_str(" noblock");
            }
            text
        }

        Op::Mov {
            destination,
            op,
            source,
        } => format!("mov {}, {}{}", destination.name(), op.syntax(), source.name()),

        Op::Irq {
            clear,
            wait,
            index,
            relative,
        } => {
            let mut text = "irq".to_string();
            if *clear {
                text.push_str(" clear");
            }
            if *wait {
                text.push_str(" wait");
            }
            text.push_str(&format!(" {}", index));
            if *relative {
                text.push_str(" rel");
            }
            text
        }

        Op::Set { destination, data } => format!("set {}, {}", destination.name(), data),

        Op::Nop => "nop".to_string(),
    }
}

fn format_target(target: &JmpTarget) -> String {
    match target {
        JmpTarget::Label(label) => label.clone(),
        JmpTarget::Address(addr) => addr.to_string(),
    }
}
