//! Ramify — a generative music grammar compiler.
//!
//! Parses named, recursively-composable pattern definitions and expands them
//! into a concrete, time-ordered stream of note/chord/rest events. The engine
//! is a pure syntax-to-timeline compiler: rendering, MIDI output, and tempo
//! mapping are external collaborators that consume the event stream.

pub mod event;
pub mod expand;
pub mod grammar;
pub mod pitch;
pub mod symbols;
