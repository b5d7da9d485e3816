//! Event data model — the unit of output handed to external renderers.
//!
//! An [`Event`] is a single sound (one or more simultaneous pitches) or a
//! rest at an absolute onset, carrying the performance state that was in
//! force when it was emitted. Events are immutable once emitted.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pitch::Pitch;

use super::ticks::Ticks;

/// A single entry on the output timeline. An empty pitch list is a rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Absolute onset, in ticks from the start of the expansion.
    pub onset: Ticks,
    /// Strictly positive duration in ticks.
    pub duration: Ticks,
    /// Sounding pitches; empty for a rest.
    pub pitches: Vec<Pitch>,
    /// Instrument in force at emission time.
    pub instrument: String,
    /// Velocity in force at emission time.
    pub velocity: u32,
}

impl Event {
    /// A single-pitch note event.
    pub fn note(
        onset: Ticks,
        duration: Ticks,
        pitch: Pitch,
        instrument: impl Into<String>,
        velocity: u32,
    ) -> Self {
        Self {
            onset,
            duration,
            pitches: vec![pitch],
            instrument: instrument.into(),
            velocity,
        }
    }

    /// A chord event: all pitches share one onset and duration.
    pub fn chord(
        onset: Ticks,
        duration: Ticks,
        pitches: Vec<Pitch>,
        instrument: impl Into<String>,
        velocity: u32,
    ) -> Self {
        Self {
            onset,
            duration,
            pitches,
            instrument: instrument.into(),
            velocity,
        }
    }

    /// A rest event.
    pub fn rest(onset: Ticks, duration: Ticks, instrument: impl Into<String>, velocity: u32) -> Self {
        Self {
            onset,
            duration,
            pitches: Vec::new(),
            instrument: instrument.into(),
            velocity,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.pitches.is_empty()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t", self.onset, self.duration)?;
        if self.pitches.is_empty() {
            write!(f, "-")?;
        } else {
            for (i, pitch) in self.pitches.iter().enumerate() {
                if i > 0 {
                    write!(f, "+")?;
                }
                write!(f, "{pitch}")?;
            }
        }
        write!(f, "\t{}\t{}", self.instrument, self.velocity)
    }
}
