//! Pitch model — letter/accidental/octave triples and semitone arithmetic.
//!
//! Octaves follow scientific pitch notation: the octave number increments at
//! C, and C4 is middle C. Transposition works on the absolute semitone value
//! and renormalizes back to a letter/accidental spelling.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Octave assumed when a note token carries no octave digit.
pub const DEFAULT_OCTAVE: i32 = 4;

/// The seven pitch letter classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Letter {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl Letter {
    /// Semitone offset of the natural letter within one octave (C = 0).
    pub fn base_semitone(self) -> i32 {
        match self {
            Letter::C => 0,
            Letter::D => 2,
            Letter::E => 4,
            Letter::F => 5,
            Letter::G => 7,
            Letter::A => 9,
            Letter::B => 11,
        }
    }

    /// Parse a letter from its (case-insensitive) character.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'a' => Some(Letter::A),
            'b' => Some(Letter::B),
            'c' => Some(Letter::C),
            'd' => Some(Letter::D),
            'e' => Some(Letter::E),
            'f' => Some(Letter::F),
            'g' => Some(Letter::G),
            _ => None,
        }
    }

    fn name(self) -> char {
        match self {
            Letter::C => 'c',
            Letter::D => 'd',
            Letter::E => 'e',
            Letter::F => 'f',
            Letter::G => 'g',
            Letter::A => 'a',
            Letter::B => 'b',
        }
    }
}

/// Accidental applied to a pitch letter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

impl Accidental {
    /// Semitone offset contributed by the accidental.
    pub fn offset(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

/// An absolute pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub octave: i32,
    pub letter: Letter,
    pub accidental: Accidental,
}

impl Pitch {
    pub fn new(octave: i32, letter: Letter, accidental: Accidental) -> Self {
        Self {
            octave,
            letter,
            accidental,
        }
    }

    /// A natural pitch in the given octave.
    pub fn natural(octave: i32, letter: Letter) -> Self {
        Self::new(octave, letter, Accidental::Natural)
    }

    /// Absolute semitone value: `12 * octave + letter + accidental`.
    pub fn semitone(self) -> i32 {
        self.octave * 12 + self.letter.base_semitone() + self.accidental.offset()
    }

    /// Rebuild a pitch from an absolute semitone value.
    ///
    /// Black keys come back as sharps; octave boundaries carry correctly for
    /// negative values as well (semitone -1 is B in octave -1).
    pub fn from_semitone(value: i32) -> Self {
        let octave = value.div_euclid(12);
        let (letter, accidental) = match value.rem_euclid(12) {
            0 => (Letter::C, Accidental::Natural),
            1 => (Letter::C, Accidental::Sharp),
            2 => (Letter::D, Accidental::Natural),
            3 => (Letter::D, Accidental::Sharp),
            4 => (Letter::E, Accidental::Natural),
            5 => (Letter::F, Accidental::Natural),
            6 => (Letter::F, Accidental::Sharp),
            7 => (Letter::G, Accidental::Natural),
            8 => (Letter::G, Accidental::Sharp),
            9 => (Letter::A, Accidental::Natural),
            10 => (Letter::A, Accidental::Sharp),
            11 => (Letter::B, Accidental::Natural),
            _ => unreachable!(),
        };
        Self {
            octave,
            letter,
            accidental,
        }
    }

    /// Shift by a number of semitones, carrying octave boundaries.
    ///
    /// A shift of zero preserves the original spelling; any other shift
    /// renormalizes to the natural/sharp spelling of the target pitch.
    pub fn transpose(self, semitones: i32) -> Self {
        if semitones == 0 {
            self
        } else {
            Self::from_semitone(self.semitone() + semitones)
        }
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.accidental {
            Accidental::Natural => "",
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        };
        write!(f, "{}{}{}", self.letter.name(), marker, self.octave)
    }
}
