//! Expansion engine — recursive evaluation of expression trees into events.
//!
//! The [`Expander`] walks a tree depth-first, left to right, threading the
//! performance state forward through sequences and keeping operator context
//! (scale, transposition) branch-local. Events come out with absolute onsets
//! already composed, so no post-pass shifting is needed.

pub mod rng;
pub mod state;

pub use rng::{DrawSource, ScriptedDraws};
pub use state::PerfState;

use num_rational::Ratio;
use num_traits::{One, Signed};

use crate::event::{Event, Ticks};
use crate::grammar::ast::{ControlCmd, Expr};
use crate::grammar::error::CompileError;
use crate::symbols::SymbolTable;

use state::Env;

/// Ceilings that turn runaway expansions into a diagnostic instead of an
/// exhausted machine. A repeat nested in a reference chain can explode
/// combinatorially even when the static cycle pass accepts it.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum reference-chain depth.
    pub max_depth: usize,
    /// Maximum number of emitted events.
    pub max_events: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_events: 1_000_000,
        }
    }
}

/// The recursive evaluator. One expander serves one expansion.
pub struct Expander<'a, R: DrawSource> {
    symbols: &'a SymbolTable,
    rng: &'a mut R,
    limits: Limits,
    /// Reference chain for depth limiting and error reports.
    chain: Vec<String>,
    events: Vec<Event>,
}

impl<'a, R: DrawSource> Expander<'a, R> {
    pub fn new(symbols: &'a SymbolTable, rng: &'a mut R, limits: Limits) -> Self {
        Self {
            symbols,
            rng,
            limits,
            chain: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Expand the start symbol into the output event stream: sorted by
    /// onset, stable for equal onsets in emission order.
    pub fn expand(mut self, start: &str, initial: PerfState) -> Result<Vec<Event>, CompileError> {
        let root = Expr::Ref(start.to_string());
        self.expand_expr(&root, Env::default(), initial, Ticks::zero())?;
        let mut events = self.events;
        events.sort_by(|a, b| a.onset.cmp(&b.onset));
        Ok(events)
    }

    /// Expand one node at absolute onset `at`. Returns the node's total
    /// duration and the performance state to hand to the next sibling.
    fn expand_expr(
        &mut self,
        expr: &Expr,
        env: Env,
        state: PerfState,
        at: Ticks,
    ) -> Result<(Ticks, PerfState), CompileError> {
        match expr {
            Expr::Seq(terms) => {
                let mut offset = Ticks::zero();
                let mut state = state;
                for term in terms {
                    let (duration, next) = self.expand_expr(term, env, state, at + offset)?;
                    offset = offset + duration;
                    state = next;
                }
                Ok((offset, state))
            }
            Expr::Ref(name) => {
                if self.chain.len() >= self.limits.max_depth {
                    return Err(CompileError::resource(
                        format!("reference depth limit ({}) exceeded", self.limits.max_depth),
                        self.chain.clone(),
                    ));
                }
                let symbols = self.symbols;
                let body = symbols
                    .resolve(name)
                    .ok_or_else(|| CompileError::undefined(name, self.chain.clone()))?;
                self.chain.push(name.clone());
                let result = self.expand_expr(body, env, state, at)?;
                self.chain.pop();
                Ok(result)
            }
            Expr::Note { pitch, mult } => {
                let duration = self.leaf_duration(*mult, env)?;
                let sounded = pitch.transpose(env.transpose);
                let event = Event::note(at, duration, sounded, state.instrument.clone(), state.velocity);
                self.emit(event)?;
                Ok((duration, state))
            }
            Expr::Rest { mult } => {
                let duration = self.leaf_duration(*mult, env)?;
                let event = Event::rest(at, duration, state.instrument.clone(), state.velocity);
                self.emit(event)?;
                Ok((duration, state))
            }
            Expr::Chord(pitches) => {
                let duration = self.leaf_duration(Ratio::one(), env)?;
                let sounded = pitches.iter().map(|p| p.transpose(env.transpose)).collect();
                let event =
                    Event::chord(at, duration, sounded, state.instrument.clone(), state.velocity);
                self.emit(event)?;
                Ok((duration, state))
            }
            Expr::Repeat { count, body } => {
                if *count == 0 {
                    return Err(CompileError::invalid_argument(
                        "repeat count must be positive",
                        self.chain.clone(),
                    ));
                }
                let mut offset = Ticks::zero();
                let mut state = state;
                for _ in 0..*count {
                    let (duration, next) = self.expand_expr(body, env, state, at + offset)?;
                    offset = offset + duration;
                    state = next;
                }
                Ok((offset, state))
            }
            Expr::Choice(alternatives) => {
                let index = self.rng.draw(alternatives.len());
                self.expand_expr(&alternatives[index], env, state, at)
            }
            Expr::Scale { factor, body } => {
                if !factor.is_positive() {
                    return Err(CompileError::invalid_argument(
                        format!("scale factor must be positive, got {factor}"),
                        self.chain.clone(),
                    ));
                }
                let scaled = Env {
                    scale: env.scale * factor,
                    ..env
                };
                self.expand_expr(body, scaled, state, at)
            }
            Expr::Transpose { semitones, body } => {
                let shifted = Env {
                    transpose: env.transpose + semitones,
                    ..env
                };
                self.expand_expr(body, shifted, state, at)
            }
            Expr::Control(cmd) => {
                let mut state = state;
                match cmd {
                    ControlCmd::Instrument(name) => state.instrument = name.clone(),
                    ControlCmd::Velocity(velocity) => state.velocity = *velocity,
                }
                Ok((Ticks::zero(), state))
            }
        }
    }

    /// Duration of a leaf under the accumulated scale; must stay positive.
    fn leaf_duration(&self, mult: Ratio<i64>, env: Env) -> Result<Ticks, CompileError> {
        let duration = mult * env.scale;
        if !duration.is_positive() {
            return Err(CompileError::underflow(
                format!("event duration is {duration}; durations must stay positive"),
                self.chain.clone(),
            ));
        }
        Ok(Ticks::from_ratio(duration))
    }

    fn emit(&mut self, event: Event) -> Result<(), CompileError> {
        if self.events.len() >= self.limits.max_events {
            return Err(CompileError::resource(
                format!("event limit ({}) exceeded", self.limits.max_events),
                self.chain.clone(),
            ));
        }
        self.events.push(event);
        Ok(())
    }
}
