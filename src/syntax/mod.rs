pub mod lexer;
pub mod operators;
pub mod parser;
pub mod repr;
mod error;

pub use self::error::{Kind, Result, SyntaxError};
pub use self::operators::{Op, OpTable};
pub use self::parser::Parser;
pub use self::repr::{Atom, Structure, Term};

/// Parses the text of a single term with the default operators.
///
/// ```
/// use pedro_client::syntax::{self, Term};
///
/// let term = syntax::parse("temperature(kitchen, 21.5)").unwrap();
/// assert_eq!(term.to_string(), "temperature(kitchen, 21.5)");
/// assert_eq!(syntax::parse("-5").unwrap(), Term::int(-5));
/// ```
pub fn parse(text: &str) -> Result<Term> {
    Parser::new(text).parse()
}

/// Parses a term, treating a syntax error as "no term".
///
/// The error is logged and `None` is returned. This suits notification
/// handlers, which should ignore a message they cannot read.
pub fn parse_or_log(text: &str) -> Option<Term> {
    match parse(text) {
        Ok(term) => Some(term),
        Err(err) => {
            log::warn!("Parse error at position {} in {:?}: {}", err.pos(), text, err);
            None
        }
    }
}
