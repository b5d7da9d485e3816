//! Lexer for the grammar.
//!
//! Converts source text into a stream of [`Token`]s with 1-based positions.
//! Composite lexemes (notes, rests, control commands, transform heads) are
//! lexed into structured tokens so the parser never re-scans characters.

use num_rational::Ratio;
use num_traits::Zero;

use crate::pitch::{Accidental, Letter};

use super::error::CompileError;
use super::token::{MetaTok, NoteTok, RestTok, Token, TokenKind, TransformTok};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            self.skip_comment();

            if self.is_at_end() {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line: self.line,
                    col: self.col,
                });
                break;
            }

            let ch = self.peek();

            if ch == '\n' {
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line: self.line,
                    col: self.col,
                });
                self.advance();
                self.line += 1;
                self.col = 1;
                continue;
            }

            let token = match ch {
                '=' => self.single_char(TokenKind::Eq),
                '{' => self.single_char(TokenKind::LBrace),
                '}' => self.single_char(TokenKind::RBrace),
                '|' => self.single_char(TokenKind::Pipe),
                ',' => self.single_char(TokenKind::Comma),
                ']' => self.single_char(TokenKind::RBracket),
                '[' => self.lex_bracket_open()?,
                ':' => self.lex_terminal()?,
                c if is_ident_char(c) => self.lex_ident(),
                _ => {
                    return Err(CompileError::lex(
                        format!("unexpected character: '{ch}'"),
                        self.line,
                        self.col,
                    ));
                }
            };

            tokens.push(token);
        }

        Ok(tokens)
    }

    fn peek(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.chars[self.pos];
        self.pos += 1;
        if ch != '\n' {
            self.col += 1;
        }
        ch
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            let ch = self.peek();
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_comment(&mut self) {
        if !self.is_at_end() && self.peek() == '/' && self.peek_next() == Some('/') {
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
        }
    }

    fn single_char(&mut self, kind: TokenKind) -> Token {
        let line = self.line;
        let col = self.col;
        self.advance();
        Token { kind, line, col }
    }

    /// Lex `[`: either a transform head (`[x3]`, `[T-2]`, `[>>1/2]`) or the
    /// opening bracket of an operand.
    fn lex_bracket_open(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume '['

        // Look ahead for a closed head made only of transform characters.
        let mut head = String::new();
        let mut closed = false;
        let mut j = self.pos;
        while j < self.chars.len() {
            let c = self.chars[j];
            if c == ']' {
                closed = true;
                break;
            }
            if !matches!(c, 'x' | 'T' | '>' | '/' | '-' | '0'..='9') {
                break;
            }
            head.push(c);
            j += 1;
        }

        if closed && is_transform_head(&head) {
            let transform = parse_transform(&head).ok_or_else(|| {
                CompileError::lex(format!("invalid transform head '[{head}]'"), line, col)
            })?;
            for _ in 0..head.len() + 1 {
                self.advance(); // consume head and ']'
            }
            return Ok(Token {
                kind: TokenKind::Transform(transform),
                line,
                col,
            });
        }

        Ok(Token {
            kind: TokenKind::LBracket,
            line,
            col,
        })
    }

    /// Lex a `:` terminal: a note, a rest, or (after `::`) a control command.
    fn lex_terminal(&mut self) -> Result<Token, CompileError> {
        let line = self.line;
        let col = self.col;
        self.advance(); // consume ':'

        if !self.is_at_end() && self.peek() == ':' {
            self.advance();
            return self.lex_meta(line, col);
        }

        if self.is_at_end() {
            return Err(CompileError::lex("expected note after ':'", line, col));
        }

        if self.peek() == '_' {
            self.advance();
            let mult = self.lex_mult(line, col)?;
            self.check_boundary()?;
            return Ok(Token {
                kind: TokenKind::Rest(RestTok { mult }),
                line,
                col,
            });
        }

        // Optional octave digits before the letter.
        let mut digits = String::new();
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            digits.push(self.advance());
        }
        let octave = if digits.is_empty() {
            None
        } else {
            Some(digits.parse::<i32>().map_err(|_| {
                CompileError::lex(format!("octave '{digits}' out of range"), line, col)
            })?)
        };

        let letter = if self.is_at_end() {
            return Err(CompileError::lex("expected pitch letter a-g", line, col));
        } else {
            let c = self.peek();
            Letter::from_char(c).ok_or_else(|| {
                CompileError::lex(format!("'{c}' is not a pitch letter (a-g)"), line, col)
            })?
        };
        self.advance();

        // The letter is consumed first; only then is the next character
        // tested as an accidental, so `:bb` is B-flat, never two tokens.
        let accidental = if !self.is_at_end() && self.peek() == '#' {
            self.advance();
            Accidental::Sharp
        } else if !self.is_at_end() && self.peek() == 'b' {
            self.advance();
            Accidental::Flat
        } else {
            Accidental::Natural
        };

        let mult = self.lex_mult(line, col)?;
        self.check_boundary()?;

        Ok(Token {
            kind: TokenKind::Note(NoteTok {
                octave,
                letter,
                accidental,
                mult,
            }),
            line,
            col,
        })
    }

    /// Lex an optional `<n>` / `<n/d>` duration multiplier suffix.
    fn lex_mult(&mut self, line: usize, col: usize) -> Result<Ratio<i64>, CompileError> {
        if self.is_at_end() || self.peek() != '<' {
            return Ok(Ratio::from_integer(1));
        }
        self.advance(); // consume '<'

        let mut content = String::new();
        loop {
            if self.is_at_end() || self.peek() == '\n' {
                return Err(CompileError::lex("unclosed duration multiplier", line, col));
            }
            let c = self.advance();
            if c == '>' {
                break;
            }
            content.push(c);
        }

        parse_fraction(&content).ok_or_else(|| {
            CompileError::lex(format!("invalid duration multiplier '<{content}>'"), line, col)
        })
    }

    /// Lex a control command after `::`: `i=<name>` or `v=<integer>`.
    fn lex_meta(&mut self, line: usize, col: usize) -> Result<Token, CompileError> {
        let key = if self.is_at_end() {
            return Err(CompileError::lex("expected control command after '::'", line, col));
        } else {
            self.advance()
        };

        if self.is_at_end() || self.peek() != '=' {
            return Err(CompileError::lex(
                format!("expected '=' after control key '{key}'"),
                line,
                col,
            ));
        }
        self.advance(); // consume '='

        let meta = match key {
            'i' => {
                let mut name = String::new();
                while !self.is_at_end()
                    && (self.peek().is_ascii_alphanumeric() || self.peek() == '_')
                {
                    name.push(self.advance());
                }
                if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(CompileError::lex("expected instrument name", line, col));
                }
                MetaTok::Instrument(name)
            }
            'v' => {
                let mut digits = String::new();
                while !self.is_at_end() && self.peek().is_ascii_digit() {
                    digits.push(self.advance());
                }
                let velocity = digits.parse::<u32>().map_err(|_| {
                    CompileError::lex("expected velocity value", line, col)
                })?;
                MetaTok::Velocity(velocity)
            }
            _ => {
                return Err(CompileError::lex(
                    format!("unknown control key '{key}' (expected 'i' or 'v')"),
                    line,
                    col,
                ));
            }
        };

        Ok(Token {
            kind: TokenKind::Meta(meta),
            line,
            col,
        })
    }

    fn lex_ident(&mut self) -> Token {
        let line = self.line;
        let col = self.col;
        let mut s = String::new();
        while !self.is_at_end() && is_ident_char(self.peek()) {
            s.push(self.advance());
        }
        let kind = if s == "start" {
            TokenKind::Start
        } else {
            TokenKind::Ident(s)
        };
        Token { kind, line, col }
    }

    /// A note/rest token must end at whitespace, a structural character, or
    /// end of input; a letter or digit glued on is a malformed token.
    fn check_boundary(&self) -> Result<(), CompileError> {
        if self.is_at_end() {
            return Ok(());
        }
        let c = self.peek();
        if c.is_whitespace() || matches!(c, ']' | '}' | '|' | ',' | '[' | '{' | ':' | '/') {
            Ok(())
        } else {
            Err(CompileError::lex(
                format!("unexpected character '{c}' after note token"),
                self.line,
                self.col,
            ))
        }
    }
}

/// Name characters for definitions and references, as in the original
/// grammar: letters, digits, and `- / # ? _`.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '/' | '#' | '?' | '_')
}

/// Would this bracket head commit to being a transform?
///
/// `>>…` always does; `x…`/`T…` only when followed by a digit or sign, so an
/// operand bracket whose first term is a reference like `xylo` still lexes
/// as a plain bracket.
fn is_transform_head(head: &str) -> bool {
    if head.starts_with(">>") {
        return true;
    }
    let mut chars = head.chars();
    match chars.next() {
        Some('x') | Some('T') => chars
            .next()
            .is_some_and(|c| c.is_ascii_digit() || c == '-'),
        _ => false,
    }
}

fn parse_transform(head: &str) -> Option<TransformTok> {
    if let Some(rest) = head.strip_prefix(">>") {
        let speed = parse_fraction(rest)?;
        // The written value is a speed-up: `[>>2]` plays twice as fast, so
        // durations are multiplied by the reciprocal.
        let factor = if speed.is_zero() { speed } else { speed.recip() };
        Some(TransformTok::Scale(factor))
    } else if let Some(rest) = head.strip_prefix('x') {
        rest.parse::<u64>().ok().map(TransformTok::Repeat)
    } else if let Some(rest) = head.strip_prefix('T') {
        rest.parse::<i32>().ok().map(TransformTok::Transpose)
    } else {
        None
    }
}

/// Parse `n` or `n/d` into an exact fraction. A zero denominator is invalid.
fn parse_fraction(s: &str) -> Option<Ratio<i64>> {
    match s.split_once('/') {
        Some((numer, denom)) => {
            let numer = numer.parse::<i64>().ok()?;
            let denom = denom.parse::<i64>().ok()?;
            if denom == 0 {
                None
            } else {
                Some(Ratio::new(numer, denom))
            }
        }
        None => s.parse::<i64>().ok().map(Ratio::from_integer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source);
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn single(source: &str) -> TokenKind {
        let mut all = kinds(source);
        assert_eq!(all.len(), 2, "expected one token + EOF in {source:?}");
        all.remove(0)
    }

    #[test]
    fn lex_start_line() {
        let toks = kinds("start S\nS = :c");
        assert_eq!(toks[0], TokenKind::Start);
        assert_eq!(toks[1], TokenKind::Ident("S".to_string()));
        assert_eq!(toks[2], TokenKind::Newline);
        assert_eq!(toks[3], TokenKind::Ident("S".to_string()));
        assert_eq!(toks[4], TokenKind::Eq);
        assert!(matches!(toks[5], TokenKind::Note(_)));
        assert_eq!(toks[6], TokenKind::Eof);
    }

    #[test]
    fn lex_note_defaults() {
        match single(":c") {
            TokenKind::Note(n) => {
                assert_eq!(n.octave, None);
                assert_eq!(n.letter, Letter::C);
                assert_eq!(n.accidental, Accidental::Natural);
                assert_eq!(n.mult, Ratio::from_integer(1));
            }
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_note_with_octave() {
        match single(":5c") {
            TokenKind::Note(n) => {
                assert_eq!(n.octave, Some(5));
                assert_eq!(n.letter, Letter::C);
            }
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_flat_consumes_letter_first() {
        // `bb` is one token: pitch B with a flat.
        match single(":bb") {
            TokenKind::Note(n) => {
                assert_eq!(n.letter, Letter::B);
                assert_eq!(n.accidental, Accidental::Flat);
            }
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_sharp() {
        match single(":f#") {
            TokenKind::Note(n) => {
                assert_eq!(n.letter, Letter::F);
                assert_eq!(n.accidental, Accidental::Sharp);
            }
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_octave_letter_accidental_mult() {
        match single(":4c#<3/2>") {
            TokenKind::Note(n) => {
                assert_eq!(n.octave, Some(4));
                assert_eq!(n.letter, Letter::C);
                assert_eq!(n.accidental, Accidental::Sharp);
                assert_eq!(n.mult, Ratio::new(3, 2));
            }
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_uppercase_letter() {
        match single(":4G") {
            TokenKind::Note(n) => assert_eq!(n.letter, Letter::G),
            other => panic!("expected note, got {other:?}"),
        }
    }

    #[test]
    fn lex_rest() {
        assert_eq!(
            single(":_"),
            TokenKind::Rest(RestTok {
                mult: Ratio::from_integer(1)
            })
        );
        assert_eq!(
            single(":_<2>"),
            TokenKind::Rest(RestTok {
                mult: Ratio::from_integer(2)
            })
        );
    }

    #[test]
    fn lex_meta_instrument() {
        assert_eq!(
            single("::i=piano"),
            TokenKind::Meta(MetaTok::Instrument("piano".to_string()))
        );
    }

    #[test]
    fn lex_meta_velocity() {
        assert_eq!(single("::v=80"), TokenKind::Meta(MetaTok::Velocity(80)));
    }

    #[test]
    fn lex_repeat_head() {
        assert_eq!(
            single("[x3]"),
            TokenKind::Transform(TransformTok::Repeat(3))
        );
    }

    #[test]
    fn lex_transpose_head() {
        assert_eq!(
            single("[T-2]"),
            TokenKind::Transform(TransformTok::Transpose(-2))
        );
        assert_eq!(
            single("[T12]"),
            TokenKind::Transform(TransformTok::Transpose(12))
        );
    }

    #[test]
    fn lex_scale_head_stores_reciprocal() {
        // `>>2` = twice as fast = durations halved.
        assert_eq!(
            single("[>>2]"),
            TokenKind::Transform(TransformTok::Scale(Ratio::new(1, 2)))
        );
        assert_eq!(
            single("[>>1/2]"),
            TokenKind::Transform(TransformTok::Scale(Ratio::from_integer(2)))
        );
        assert_eq!(
            single("[>>3/4]"),
            TokenKind::Transform(TransformTok::Scale(Ratio::new(4, 3)))
        );
    }

    #[test]
    fn lex_scale_zero_kept_for_expansion_to_reject() {
        assert_eq!(
            single("[>>0]"),
            TokenKind::Transform(TransformTok::Scale(Ratio::from_integer(0)))
        );
    }

    #[test]
    fn lex_operand_bracket_is_not_a_transform() {
        let toks = kinds("[x3][:c]");
        assert_eq!(toks[0], TokenKind::Transform(TransformTok::Repeat(3)));
        assert_eq!(toks[1], TokenKind::LBracket);
        assert!(matches!(toks[2], TokenKind::Note(_)));
        assert_eq!(toks[3], TokenKind::RBracket);
    }

    #[test]
    fn lex_bracketed_reference_stays_plain() {
        // `xylo` starts with 'x' but is not a transform head.
        let toks = kinds("[xylo]");
        assert_eq!(toks[0], TokenKind::LBracket);
        assert_eq!(toks[1], TokenKind::Ident("xylo".to_string()));
        assert_eq!(toks[2], TokenKind::RBracket);
    }

    #[test]
    fn lex_choice_delimiters() {
        let toks = kinds("{:c|:d,:e}");
        assert_eq!(toks[0], TokenKind::LBrace);
        assert!(matches!(toks[1], TokenKind::Note(_)));
        assert_eq!(toks[2], TokenKind::Pipe);
        assert!(matches!(toks[3], TokenKind::Note(_)));
        assert_eq!(toks[4], TokenKind::Comma);
        assert!(matches!(toks[5], TokenKind::Note(_)));
        assert_eq!(toks[6], TokenKind::RBrace);
    }

    #[test]
    fn lex_comment_to_end_of_line() {
        let toks = kinds("start S // the start symbol\nS = :c");
        assert_eq!(toks[0], TokenKind::Start);
        assert_eq!(toks[1], TokenKind::Ident("S".to_string()));
        assert_eq!(toks[2], TokenKind::Newline);
    }

    #[test]
    fn lex_ident_charset() {
        assert_eq!(
            single("drum-groove/4?"),
            TokenKind::Ident("drum-groove/4?".to_string())
        );
    }

    #[test]
    fn lex_line_and_col_tracking() {
        let mut lexer = Lexer::new("start S\nS = :c");
        let toks = lexer.tokenize().unwrap();
        assert_eq!((toks[0].line, toks[0].col), (1, 1));
        assert_eq!((toks[1].line, toks[1].col), (1, 7));
        assert_eq!(toks[3].line, 2);
        assert_eq!(toks[3].col, 1);
    }

    #[test]
    fn lex_error_unexpected_char() {
        let mut lexer = Lexer::new("S = @");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_error_malformed_note() {
        // 'd' glued onto ':c' is neither an accidental nor a boundary.
        let mut lexer = Lexer::new(":cd");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_error_double_accidental() {
        let mut lexer = Lexer::new(":c##");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_error_unclosed_mult() {
        let mut lexer = Lexer::new(":c<2");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_error_zero_denominator() {
        let mut lexer = Lexer::new("[>>1/0]");
        let err = lexer.tokenize().unwrap_err();
        assert!(err.message.contains("transform head"));
    }

    #[test]
    fn lex_error_unknown_control_key() {
        let mut lexer = Lexer::new("::x=1");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_error_bare_colon() {
        let mut lexer = Lexer::new(":");
        assert!(lexer.tokenize().is_err());
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }
}
