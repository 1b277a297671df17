use std::fmt;

use thiserror::Error;

/// A type alias for results with possible `SyntaxError`s.
pub type Result<T> = ::std::result::Result<T, SyntaxError>;

/// The location and description of syntax errors.
///
/// The position is a character offset into the parsed text.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq)]
#[derive(Error)]
#[error("{pos}: {kind}")]
pub struct SyntaxError {
    pos: usize,
    kind: Kind,
}

/// What went wrong at the error position.
#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq, Eq)]
pub enum Kind {
    UnexpectedEof,
    Unexpected(&'static str),
    Unclosed(char),
    Lexical(&'static str),
    TrailingInput,
}

impl SyntaxError {
    fn new(pos: usize, kind: Kind) -> SyntaxError {
        SyntaxError { pos, kind }
    }

    pub fn unexpected_eof(pos: usize) -> SyntaxError {
        SyntaxError::new(pos, Kind::UnexpectedEof)
    }

    pub fn unexpected(pos: usize, what: &'static str) -> SyntaxError {
        SyntaxError::new(pos, Kind::Unexpected(what))
    }

    pub fn unclosed(pos: usize, ch: char) -> SyntaxError {
        SyntaxError::new(pos, Kind::Unclosed(ch))
    }

    pub fn lexical(pos: usize, msg: &'static str) -> SyntaxError {
        SyntaxError::new(pos, Kind::Lexical(msg))
    }

    pub fn trailing_input(pos: usize) -> SyntaxError {
        SyntaxError::new(pos, Kind::TrailingInput)
    }

    /// Returns the character offset at which the error occurs.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Kind::UnexpectedEof => write!(f, "unexpected end of input"),
            Kind::Unexpected(tok) => write!(f, "unexpected token: {}", tok),
            Kind::Unclosed(ch) => write!(f, "expected closing '{}'", ch),
            Kind::Lexical(msg) => write!(f, "{}", msg),
            Kind::TrailingInput => write!(f, "unexpected input after term"),
        }
    }
}
