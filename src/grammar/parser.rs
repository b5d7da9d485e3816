//! Parser for the grammar.
//!
//! Parses a token stream into a [`Score`]. The source is line-oriented: the
//! first meaningful line is the `start` directive, every following line is
//! one `name = terms` production. Brackets and braces must close on the line
//! they open.

use num_traits::One;

use crate::pitch::{Pitch, DEFAULT_OCTAVE};

use super::ast::{ControlCmd, Expr, Score};
use super::error::CompileError;
use super::token::{MetaTok, Token, TokenKind, TransformTok};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Score, CompileError> {
        self.skip_newlines();

        let t = self.peek().clone();
        if t.kind != TokenKind::Start {
            return Err(CompileError::parse(
                "expected 'start' directive on the first line",
                t.line,
                t.col,
            ));
        }
        self.advance();
        let start = self.expect_name()?;
        self.expect_line_end()?;

        let mut defs = Vec::new();
        loop {
            self.skip_newlines();
            if self.check(&TokenKind::Eof) {
                break;
            }
            let name = self.expect_name()?;
            self.expect(TokenKind::Eq)?;
            let terms = self.parse_terms(&[TokenKind::Newline, TokenKind::Eof])?;
            self.expect_line_end()?;
            defs.push((name, classify_body(terms)));
        }

        Ok(Score { start, defs })
    }

    /// Parse terms until one of the stop kinds is next. The stop token is
    /// not consumed.
    fn parse_terms(&mut self, stops: &[TokenKind]) -> Result<Vec<Expr>, CompileError> {
        let mut terms = Vec::new();
        while !stops.contains(&self.peek().kind) {
            terms.push(self.parse_term()?);
        }
        Ok(terms)
    }

    fn parse_term(&mut self) -> Result<Expr, CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Expr::Ref(name))
            }
            TokenKind::Note(n) => {
                self.advance();
                let pitch = Pitch::new(
                    n.octave.unwrap_or(DEFAULT_OCTAVE),
                    n.letter,
                    n.accidental,
                );
                Ok(Expr::Note {
                    pitch,
                    mult: n.mult,
                })
            }
            TokenKind::Rest(r) => {
                self.advance();
                Ok(Expr::Rest { mult: r.mult })
            }
            TokenKind::Meta(m) => {
                self.advance();
                Ok(Expr::Control(match m {
                    MetaTok::Instrument(name) => ControlCmd::Instrument(name),
                    MetaTok::Velocity(v) => ControlCmd::Velocity(v),
                }))
            }
            TokenKind::Transform(transform) => {
                self.advance();
                let open = self.peek().clone();
                if open.kind != TokenKind::LBracket {
                    return Err(CompileError::parse(
                        "expected '[' operand after transform head",
                        open.line,
                        open.col,
                    ));
                }
                self.advance();
                let terms =
                    self.parse_terms(&[TokenKind::RBracket, TokenKind::Newline, TokenKind::Eof])?;
                let close = self.peek().clone();
                if close.kind != TokenKind::RBracket {
                    return Err(CompileError::parse(
                        "unbalanced '[': expected ']'",
                        close.line,
                        close.col,
                    ));
                }
                self.advance();
                let body = Box::new(seq_or_single(terms));
                Ok(match transform {
                    TransformTok::Repeat(count) => Expr::Repeat { count, body },
                    TransformTok::Transpose(semitones) => Expr::Transpose { semitones, body },
                    TransformTok::Scale(factor) => Expr::Scale { factor, body },
                })
            }
            TokenKind::LBrace => self.parse_choice(),
            TokenKind::Newline | TokenKind::Eof => Err(CompileError::parse(
                "unexpected end of line",
                t.line,
                t.col,
            )),
            other => Err(CompileError::parse(
                format!("unexpected token: {other:?}"),
                t.line,
                t.col,
            )),
        }
    }

    /// Parse `{ terms (| terms)* }` (comma also delimits alternatives).
    fn parse_choice(&mut self) -> Result<Expr, CompileError> {
        let open = self.peek().clone();
        self.advance(); // consume '{'

        let mut alternatives = Vec::new();
        let mut saw_delimiter = false;
        loop {
            let terms = self.parse_terms(&[
                TokenKind::Pipe,
                TokenKind::Comma,
                TokenKind::RBrace,
                TokenKind::Newline,
                TokenKind::Eof,
            ])?;
            alternatives.push(seq_or_single(terms));

            let t = self.peek().clone();
            match t.kind {
                TokenKind::Pipe | TokenKind::Comma => {
                    saw_delimiter = true;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                _ => {
                    return Err(CompileError::parse(
                        "unbalanced '{': expected '}'",
                        t.line,
                        t.col,
                    ));
                }
            }
        }

        // `{}` has no alternatives at all; `{a|}` legitimately has an empty
        // second alternative.
        if !saw_delimiter && alternatives.len() == 1 && alternatives[0] == Expr::Seq(Vec::new()) {
            return Err(CompileError::parse(
                "choice block requires at least one alternative",
                open.line,
                open.col,
            ));
        }

        Ok(Expr::Choice(alternatives))
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), CompileError> {
        let t = self.peek().clone();
        if t.kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(CompileError::parse(
                format!("expected {kind:?}, found {:?}", t.kind),
                t.line,
                t.col,
            ))
        }
    }

    fn expect_name(&mut self) -> Result<String, CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(CompileError::parse(
                format!("expected a definition name, found {other:?}"),
                t.line,
                t.col,
            )),
        }
    }

    fn expect_line_end(&mut self) -> Result<(), CompileError> {
        let t = self.peek().clone();
        match t.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            other => Err(CompileError::parse(
                format!("expected end of line, found {other:?}"),
                t.line,
                t.col,
            )),
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }
}

/// Collapse a term list: one term stands alone (a single bare reference is a
/// transparent alias), anything else is a sequence.
fn seq_or_single(mut terms: Vec<Expr>) -> Expr {
    if terms.len() == 1 {
        terms.remove(0)
    } else {
        Expr::Seq(terms)
    }
}

/// Apply the chord convention to a definition body: a flat list of two or
/// more note terms, all with multiplier 1 and nothing else mixed in, sounds
/// simultaneously as a chord. Anything else keeps sequential semantics.
fn classify_body(terms: Vec<Expr>) -> Expr {
    let all_plain_notes = terms.len() >= 2
        && terms
            .iter()
            .all(|t| matches!(t, Expr::Note { mult, .. } if mult.is_one()));
    if all_plain_notes {
        let pitches = terms
            .iter()
            .map(|t| match t {
                Expr::Note { pitch, .. } => *pitch,
                _ => unreachable!(),
            })
            .collect();
        Expr::Chord(pitches)
    } else {
        seq_or_single(terms)
    }
}
