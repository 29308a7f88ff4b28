//! Assembly line parser
//!
//! Every source line parses to a [`Line`]. Lines that do not match any
//! instruction grammar become [`Line::Unrecognized`] instead of an error; the
//! loader keeps them as `Raw` and records a diagnostic.

use crate::lexer::{tokenize, Token};
use pio_spec::{
    Instruction, JmpCondition, JmpTarget, MovOp, Op, Operand, SetDestination, WaitSource,
    MAX_DELAY, NUM_GPIO, NUM_IRQ_FLAGS, SHIFT_WIDTH,
};

/// Largest literal accepted by `set`
const MAX_SET_DATA: u32 = 31;

/// One classified source line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    /// Empty or comment-only line
    Blank,
    /// `name:`
    Label(String),
    /// `.name args...`
    Directive { name: String, args: Vec<Token> },
    /// Executable instruction
    Instruction(Instruction),
    /// Nothing matched
    Unrecognized,
}

/// Decode one line into an instruction.
///
/// Anything that is not an executable instruction (blank, comment, directive,
/// label or unrecognized text) decodes to `Raw` holding the trimmed line.
pub fn decode(text: &str) -> Instruction {
    match parse_line(text) {
        Line::Instruction(instr) => instr,
        _ => Instruction::raw(text.trim()),
    }
}

/// Classify and parse one source line
pub fn parse_line(text: &str) -> Line {
    let Some(tokens) = tokenize(text) else {
        return Line::Unrecognized;
    };

    match tokens.as_slice() {
        [] => Line::Blank,
        [Token::Directive(name), args @ ..] => Line::Directive {
            name: name.to_ascii_lowercase(),
            args: args.to_vec(),
        },
        [Token::Identifier(name), Token::Colon] => Line::Label(name.clone()),
        [Token::Identifier(public), Token::Identifier(name), Token::Colon]
            if public.eq_ignore_ascii_case("public") =>
        {
            Line::Label(name.clone())
        }
        _ => parse_instruction(&tokens).map_or(Line::Unrecognized, Line::Instruction),
    }
}

/// Parse an instruction from its tokens, annotations included
fn parse_instruction(tokens: &[Token]) -> Option<Instruction> {
    let (body, delay, side_set) = strip_annotations(tokens)?;
    let (mnemonic, operands) = body.split_first()?;
    let mnemonic = mnemonic.identifier()?.to_ascii_lowercase();

    let op = parse_op(&mnemonic, Cursor::new(operands))?;
    Some(Instruction::Op {
        op,
        delay,
        side_set,
    })
}

/// Remove trailing `[N]` and `side N` annotations, in either order
fn strip_annotations(tokens: &[Token]) -> Option<(&[Token], u8, Option<u32>)> {
    let mut body = tokens;
    let mut delay = None;
    let mut side_set = None;

    loop {
        match body {
            [rest @ .., Token::LBracket, value, Token::RBracket] if delay.is_none() => {
                let cycles = value.number()?;
                if cycles > MAX_DELAY as u32 {
                    return None;
                }
                delay = Some(cycles as u8);
                body = rest;
            }
            [rest @ .., side, value] if side_set.is_none() && side.is_keyword("side") => {
                side_set = Some(value.number()?);
                body = rest;
            }
            _ => break,
        }
    }

    Some((body, delay.unwrap_or(0), side_set))
}

fn parse_op(mnemonic: &str, mut c: Cursor<'_>) -> Option<Op> {
    let op = match mnemonic {
        "jmp" => {
            let condition = parse_jmp_condition(&mut c);
            c.comma();
            let target = match c.next()? {
                Token::Identifier(label) => JmpTarget::Label(label.clone()),
                token => JmpTarget::Address(token.number()?),
            };
            Op::Jmp { condition, target }
        }

        "wait" => {
            let polarity = match c.number()? {
                0 => false,
                1 => true,
                _ => return None,
            };
            c.comma();
            let source = WaitSource::from_name(c.identifier()?)?;
            c.comma();
            let index = c.number()?;
            let relative = c.keyword("rel");
            let limit = match source {
                WaitSource::Irq => NUM_IRQ_FLAGS,
                WaitSource::Gpio | WaitSource::Pin => NUM_GPIO,
            };
            if index as usize >= limit || (relative && source != WaitSource::Irq) {
                return None;
            }
            Op::Wait {
                polarity,
                source,
                index: index as u8,
                relative,
            }
        }

        "in" => {
            let source = Operand::from_name(c.identifier()?)?;
            c.comma();
            let bit_count = parse_bit_count(&mut c)?;
            Op::In { source, bit_count }
        }

        "out" => {
            let destination = Operand::from_name(c.identifier()?)?;
            c.comma();
            let bit_count = parse_bit_count(&mut c)?;
            Op::Out {
                destination,
                bit_count,
            }
        }

        "push" => {
            let mut if_full = false;
            let mut block = true;
            while let Some(flag) = c.identifier() {
                match flag.to_ascii_lowercase().as_str() {
                    "iffull" => if_full = true,
                    "block" => block = true,
                    "noblock" => block = false,
                    _ => return None,
                }
            }
            Op::Push { if_full, block }
        }

        "pull" => {
            let mut if_empty = false;
            let mut block = true;
            while let Some(flag) = c.identifier() {
                match flag.to_ascii_lowercase().as_str() {
                    "ifempty" => if_empty = true,
                    "block" => block = true,
                    "noblock" => block = false,
                    _ => return None,
                }
            }
            Op::Pull { if_empty, block }
        }

        "mov" => {
            let destination = Operand::from_name(c.identifier()?)?;
            c.comma();
            let op = if c.eat(&Token::Tilde) || c.eat(&Token::Bang) {
                MovOp::Invert
            } else if c.eat(&Token::Reverse) {
                MovOp::Reverse
            } else {
                MovOp::None
            };
            let source = Operand::from_name(c.identifier()?)?;
            Op::Mov {
                destination,
                op,
                source,
            }
        }

        "irq" => {
            let mut clear = false;
            let mut wait = false;
            while let Some(flag) = c.identifier() {
                match flag.to_ascii_lowercase().as_str() {
                    "set" | "nowait" => {}
                    "clear" => clear = true,
                    "wait" => wait = true,
                    _ => return None,
                }
            }
            let index = c.number()?;
            if index as usize >= NUM_IRQ_FLAGS {
                return None;
            }
            let relative = c.keyword("rel");
            Op::Irq {
                clear,
                wait,
                index: index as u8,
                relative,
            }
        }

        "set" => {
            let destination = SetDestination::from_name(c.identifier()?)?;
            c.comma();
            let data = c.number()?;
            if data > MAX_SET_DATA {
                return None;
            }
            Op::Set {
                destination,
                data: data as u8,
            }
        }

        "nop" => Op::Nop,

        _ => return None,
    };

    // Trailing garbage makes the whole line unrecognized
    c.is_done().then_some(op)
}

fn parse_jmp_condition(c: &mut Cursor<'_>) -> JmpCondition {
    let remaining = c.remaining();
    let (condition, consumed) = match remaining {
        [Token::Bang, name, ..] if name.is_keyword("x") => (JmpCondition::XZero, 2),
        [Token::Bang, name, ..] if name.is_keyword("y") => (JmpCondition::YZero, 2),
        [Token::Bang, name, ..] if name.is_keyword("osre") => (JmpCondition::OsrNotEmpty, 2),
        [name, Token::Decrement, ..] if name.is_keyword("x") => (JmpCondition::XDecrement, 2),
        [name, Token::Decrement, ..] if name.is_keyword("y") => (JmpCondition::YDecrement, 2),
        [x, Token::NotEqual, y, ..] if x.is_keyword("x") && y.is_keyword("y") => {
            (JmpCondition::XNotEqualY, 3)
        }
        // `pin` alone is a label named "pin"
        [name, _, ..] if name.is_keyword("pin") => (JmpCondition::Pin, 1),
        _ => (JmpCondition::Always, 0),
    };
    c.advance(consumed);
    condition
}

/// Bit count operand, 1-32
fn parse_bit_count(c: &mut Cursor<'_>) -> Option<u8> {
    let count = c.number()?;
    (1..=SHIFT_WIDTH as u32)
        .contains(&count)
        .then_some(count as u8)
}

/// Forward-only view over an operand token slice
struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn remaining(&self) -> &'a [Token] {
        &self.tokens[self.pos..]
    }

    fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.tokens.len());
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    /// Consume the next token if it equals `token`
    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Optional separator
    fn comma(&mut self) {
        self.eat(&Token::Comma);
    }

    fn identifier(&mut self) -> Option<&'a str> {
        let name = self.peek()?.identifier()?;
        self.pos += 1;
        Some(name)
    }

    fn number(&mut self) -> Option<u32> {
        let value = self.peek()?.number()?;
        self.pos += 1;
        Some(value)
    }

    /// Consume an optional case-insensitive keyword
    fn keyword(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(token) if token.is_keyword(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
