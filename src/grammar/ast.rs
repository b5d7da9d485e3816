//! Abstract syntax tree for grammar definitions.
//!
//! A [`Score`] is the parse result: the start symbol plus the definition
//! list in source order. Redefinitions are legal; the symbol table applies
//! the last-wins rule when the score is loaded.

use num_rational::Ratio;
use serde::{Deserialize, Serialize};

use crate::pitch::Pitch;

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Start symbol named by the `start` directive.
    pub start: String,
    /// Definitions in source order; later entries shadow earlier ones.
    pub defs: Vec<(String, Expr)>,
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Sub-expressions concatenated in time, left to right.
    Seq(Vec<Expr>),
    /// Lazily resolved reference to a named definition.
    Ref(String),
    /// A single pitched sound with a duration multiplier.
    Note { pitch: Pitch, mult: Ratio<i64> },
    /// Silence with a duration multiplier.
    Rest { mult: Ratio<i64> },
    /// Pitches sounding simultaneously for one nominal tick.
    Chord(Vec<Pitch>),
    /// Body re-expanded `count` times in sequence, fresh draws each time.
    Repeat { count: u64, body: Box<Expr> },
    /// Exactly one alternative, chosen uniformly per occurrence.
    Choice(Vec<Expr>),
    /// All durations produced by the body multiplied by `factor`.
    Scale { factor: Ratio<i64>, body: Box<Expr> },
    /// All pitches produced by the body shifted by `semitones`.
    Transpose { semitones: i32, body: Box<Expr> },
    /// Performance-state change for everything after it in the enclosing
    /// sequence; emits no event of its own.
    Control(ControlCmd),
}

/// A performance-state command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlCmd {
    Instrument(String),
    Velocity(u32),
}
