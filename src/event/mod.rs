//! Event stream model — rational musical time and the emitted event type.
//!
//! The expansion engine produces a flat `Vec<Event>` sorted by onset, stable
//! for equal onsets in emission order. Consumers (audio renderers, MIDI
//! writers) own the events from there; the engine never mutates them again.

pub mod ticks;
pub mod types;

pub use ticks::Ticks;
pub use types::Event;
