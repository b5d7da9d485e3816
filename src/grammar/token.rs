//! Token types for the grammar lexer.

use num_rational::Ratio;

use crate::pitch::{Accidental, Letter};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// The `start` directive keyword.
    Start,
    /// A definition name or reference.
    Ident(String),
    Eq,

    // Composite lexemes, lexed into structured tokens
    Note(NoteTok),
    Rest(RestTok),
    Meta(MetaTok),
    Transform(TransformTok),

    // Delimiters
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Pipe,
    Comma,

    // Special
    Newline,
    Eof,
}

/// A pitched note terminal, e.g. `:4c#<3/2>`.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTok {
    /// Absent means the default reference octave.
    pub octave: Option<i32>,
    pub letter: Letter,
    pub accidental: Accidental,
    /// Duration multiplier; 1 when no `<…>` suffix is present.
    pub mult: Ratio<i64>,
}

/// A rest terminal, e.g. `:_<2>`.
#[derive(Debug, Clone, PartialEq)]
pub struct RestTok {
    pub mult: Ratio<i64>,
}

/// A control command terminal, e.g. `::i=piano` or `::v=80`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaTok {
    Instrument(String),
    Velocity(u32),
}

/// An operator head, e.g. `[x3]`, `[T-2]`, `[>>1/2]`.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformTok {
    Repeat(u64),
    Transpose(i32),
    /// Duration multiplier applied to the operand (already reciprocal of the
    /// written speed factor: `[>>2]` plays twice as fast, so it stores 1/2).
    Scale(Ratio<i64>),
}
