//! # Lexer for PIO Assembly Language

use logos::Logos;

/// Tokens for PIO assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip `;` comments
#[logos(skip r"//[^\n]*")] // Skip `//` comments
pub enum Token {
    /// Identifier (mnemonics, operands, keywords, labels)
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Decimal number
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u32>().ok())]
    Number(u32),

    /// Hexadecimal number
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| u32::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(u32),

    /// Binary number
    #[regex(r"0[bB][01]+", |lex| u32::from_str_radix(&lex.slice()[2..], 2).ok())]
    Binary(u32),

    /// Directive (.program, .wrap_target, .wrap, .side_set, ...)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    #[token(",")]
    Comma,

    /// Label terminator
    #[token(":")]
    Colon,

    /// Bit reversal (`::src`)
    #[token("::")]
    Reverse,

    /// `x!=y`
    #[token("!=")]
    NotEqual,

    /// Negation (`!x`, `!osre`, `mov x, !y`)
    #[token("!")]
    Bang,

    /// Bitwise NOT (`~src`)
    #[token("~")]
    Tilde,

    /// Post-decrement (`x--`)
    #[token("--")]
    Decrement,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,
}

impl Token {
    /// Numeric value of a number token in any radix
    pub fn number(&self) -> Option<u32> {
        match self {
            Token::Number(n) | Token::Hex(n) | Token::Binary(n) => Some(*n),
            _ => None,
        }
    }

    /// Identifier text, if this is an identifier
    pub fn identifier(&self) -> Option<&str> {
        match self {
            Token::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Case-insensitive keyword match
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.identifier()
            .map_or(false, |name| name.eq_ignore_ascii_case(keyword))
    }
}

/// Tokenize one line. Returns `None` if the line contains a character the
/// lexer does not recognize.
pub fn tokenize(line: &str) -> Option<Vec<Token>> {
    Token::lexer(line).collect::<Result<Vec<_>, _>>().ok()
}
