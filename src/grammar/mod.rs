//! Grammar compiler — source text → lexer → parser → symbol table → events.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{ControlCmd, Expr, Score};
pub use error::{CompileError, ErrorKind};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::event::Event;
use crate::expand::{DrawSource, Expander, Limits, PerfState};
use crate::symbols::SymbolTable;

use lexer::Lexer;
use parser::Parser;

/// Seed used when the caller does not provide one. Fixed so that compiles
/// are reproducible by default; system entropy is never consulted.
pub const DEFAULT_SEED: u64 = 42;

/// Inputs to a compile beyond the source text itself.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Overrides the source's `start` directive when set.
    pub start: Option<String>,
    pub seed: u64,
    /// Performance state in force before the first event.
    pub initial: PerfState,
    pub limits: Limits,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            start: None,
            seed: DEFAULT_SEED,
            initial: PerfState::default(),
            limits: Limits::default(),
        }
    }
}

/// The grammar compiler.
///
/// Parses source text through lexer → parser, loads the symbol table, runs
/// the static resolution checks, then expands the start symbol to events.
pub struct Compiler;

impl Compiler {
    /// Parse source into a [`Score`] without expanding anything.
    pub fn parse(source: &str) -> Result<Score, CompileError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Parser::new(tokens).parse()
    }

    /// Compile source to an event stream with a seeded generator.
    pub fn compile(source: &str, options: &CompileOptions) -> Result<Vec<Event>, CompileError> {
        let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
        Self::compile_with(source, options, &mut rng)
    }

    /// Compile with a caller-provided draw source. Hosts use this to replay
    /// recorded draw sequences or to supply entropy explicitly.
    pub fn compile_with<R: DrawSource>(
        source: &str,
        options: &CompileOptions,
        rng: &mut R,
    ) -> Result<Vec<Event>, CompileError> {
        let score = Self::parse(source)?;
        let table = SymbolTable::from_score(&score);
        let start = options.start.as_deref().unwrap_or(&score.start);
        table.validate(start)?;
        Expander::new(&table, rng, options.limits).expand(start, options.initial.clone())
    }
}
