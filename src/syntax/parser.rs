//! A parser for Pedro terms.
//!
//! The parser turns the text of a single term, e.g.
//! `subscribe(temperature(kitchen, X), (X > 20), 0)`, into a [`Term`]. It is
//! a recursive descent parser over the precedence levels of an [`OpTable`]:
//! each level parses a term at the next tighter level and then looks for one
//! of its own operators. The default table holds the operators of the Pedro
//! server, from `;` at 1100 down to `:` at 50.
//!
//! Arguments of structures and elements of lists are parsed at precedence
//! 700, so a bare comma there separates arguments. Wrap a conjunction in
//! parens to pass it as a single argument.
//!
//! [`Term`]: ../repr/enum.Term.html
//! [`OpTable`]: ../operators/struct.OpTable.html

use crate::syntax::error::{Result, SyntaxError};
use crate::syntax::lexer::{self, Lexer, Token};
use crate::syntax::operators::{Op, OpTable};
use crate::syntax::repr::{Atom, Term};

/// The precedence of structure arguments and list elements.
const ARG_PREC: u32 = 700;

lazy_static! {
    static ref DEFAULT_OPS: OpTable = OpTable::default();
}

/// A parser for a single term in UTF-8 text.
///
/// The parser keeps one token of lookahead and never backtracks.
pub struct Parser<'a> {
    ops: &'a OpTable,
    levels: Vec<u32>,
    arg_level: usize,
    lexer: Lexer<'a>,
    tok: Option<Token<'a>>,
}

// Public API
// --------------------------------------------------

impl<'a> Parser<'a> {
    /// Constructs a parser over the given text with the default operators.
    pub fn new(text: &'a str) -> Parser<'a> {
        Parser::with_ops(text, &DEFAULT_OPS)
    }

    /// Constructs a parser over the given text and operator table.
    pub fn with_ops(text: &'a str, ops: &'a OpTable) -> Parser<'a> {
        let levels = ops.levels();
        let arg_level = levels
            .iter()
            .position(|&prec| prec <= ARG_PREC)
            .unwrap_or(levels.len());
        Parser {
            ops,
            levels,
            arg_level,
            lexer: Lexer::new(text),
            tok: None,
        }
    }

    /// Parses the whole text as one term.
    ///
    /// Anything left over after the term is an error.
    pub fn parse(mut self) -> Result<Term> {
        self.bump();
        let term = self.read(0)?;
        match self.tok {
            Some(tok) => Err(SyntaxError::trailing_input(tok.pos())),
            None if !self.lexer.rest().is_empty() => {
                Err(SyntaxError::trailing_input(self.lexer.pos()))
            }
            None => Ok(term),
        }
    }
}

// Parsing Logic
// --------------------------------------------------

impl<'a> Parser<'a> {
    fn bump(&mut self) {
        self.tok = self.lexer.next();
    }

    /// The position of the current token, or of the cursor at the end.
    fn here(&self) -> usize {
        match self.tok {
            Some(tok) => tok.pos(),
            None => self.lexer.pos(),
        }
    }

    /// Reads a term at the given level, an index into `self.levels`.
    ///
    /// Past the last level, a primary is read.
    fn read(&mut self, level: usize) -> Result<Term> {
        let prec = match self.levels.get(level) {
            Some(&prec) => prec,
            None => return self.read_primary(),
        };

        if let Some(Token::Atom(_, name)) = self.tok {
            // `-(` with no space between is functional notation, not an operator.
            let functional = self.lexer.rest().starts_with('(');
            if let Some(op) = self.ops.prefix(name, prec) {
                if !functional {
                    self.bump();
                    let arg = self.read(level + 1)?;
                    return Ok(prefix_term(op, arg));
                }
            }
        }

        let mut lhs = self.read(level + 1)?;
        loop {
            let op = match self.tok.and_then(|tok| tok.op_name()) {
                Some(name) => self.ops.infix(name, prec),
                None => None,
            };
            let op = match op {
                Some(op) => op,
                None => break,
            };
            self.bump();
            match op {
                Op::XFY(..) => {
                    let rhs = self.read(level)?;
                    return Ok(infix_term(op, lhs, rhs));
                }
                Op::XFX(..) => {
                    let rhs = self.read(level + 1)?;
                    return Ok(infix_term(op, lhs, rhs));
                }
                Op::YFX(..) => {
                    let rhs = self.read(level + 1)?;
                    lhs = infix_term(op, lhs, rhs);
                }
                Op::FX(..) => unreachable!("infix lookup must not return a prefix operator"),
            }
        }
        Ok(lhs)
    }

    /// Reads a primary: a literal, a bracketed term, a list, an atom or a
    /// structure.
    fn read_primary(&mut self) -> Result<Term> {
        match self.tok {
            None if self.lexer.rest().is_empty() => {
                Err(SyntaxError::unexpected_eof(self.lexer.pos()))
            }
            None => Err(SyntaxError::unexpected(self.lexer.pos(), "unrecognised character")),

            Some(Token::Err(pos, msg)) => Err(SyntaxError::lexical(pos, msg)),

            // Strings.
            Some(Token::Str(_, raw)) => {
                self.bump();
                Ok(Term::Str(lexer::unescape(raw)))
            }

            // Variables.
            Some(Token::Var(_, name)) => {
                self.bump();
                Ok(Term::var(name))
            }

            // Numbers.
            Some(Token::Int(_, val)) => {
                self.bump();
                Ok(Term::int(val))
            }
            Some(Token::Float(_, val)) => {
                self.bump();
                Ok(Term::float(val))
            }

            // Parens.
            Some(Token::ParenOpen(..)) => {
                self.bump();
                let term = self.read(0)?;
                self.expect_close(')')?;
                Ok(term)
            }

            // Lists.
            Some(Token::BracketOpen(..)) => {
                self.bump();
                if let Some(Token::BracketClose(..)) = self.tok {
                    self.bump();
                    return Ok(Term::nil());
                }
                let list = self.read_list()?;
                self.expect_close(']')?;
                Ok(list)
            }

            // Atoms and structures.
            Some(Token::Atom(_, name)) => {
                self.bump();
                self.read_compound(Atom::new(name))
            }

            // A comma is only a functor in functional notation, e.g. `,(a, b)`.
            Some(Token::Comma(_)) if self.lexer.rest().starts_with('(') => {
                self.bump();
                self.read_compound(Atom::new(","))
            }

            // Syntax errors.
            Some(Token::ParenClose(pos)) => Err(SyntaxError::unexpected(pos, "')'")),
            Some(Token::BracketClose(pos)) => Err(SyntaxError::unexpected(pos, "']'")),
            Some(Token::Comma(pos)) => Err(SyntaxError::unexpected(pos, "','")),
            Some(Token::Bar(pos)) => Err(SyntaxError::unexpected(pos, "'|'")),
        }
    }

    /// Reads the argument list following a functor, if there is one.
    fn read_compound(&mut self, functor: Atom) -> Result<Term> {
        if let Some(Token::ParenOpen(..)) = self.tok {
            self.bump();
            if let Some(Token::ParenClose(..)) = self.tok {
                self.bump();
                return Ok(Term::structure(functor, Vec::new()));
            }
            let args = self.read_args()?;
            self.expect_close(')')?;
            Ok(Term::structure(functor, args))
        } else {
            Ok(Term::Atom(functor))
        }
    }

    /// Reads the comma separated arguments of a structure.
    fn read_args(&mut self) -> Result<Vec<Term>> {
        let mut args = vec![self.read(self.arg_level)?];
        while let Some(Token::Comma(..)) = self.tok {
            self.bump();
            args.push(self.read(self.arg_level)?);
        }
        Ok(args)
    }

    /// Reads the elements of a non-empty list and its optional `|` tail.
    fn read_list(&mut self) -> Result<Term> {
        let mut items = vec![self.read(self.arg_level)?];
        while let Some(Token::Comma(..)) = self.tok {
            self.bump();
            items.push(self.read(self.arg_level)?);
        }
        let tail = match self.tok {
            Some(Token::Bar(..)) => {
                self.bump();
                self.read(self.arg_level)?
            }
            _ => Term::nil(),
        };
        Ok(Term::list(items, tail))
    }

    fn expect_close(&mut self, ch: char) -> Result<()> {
        match (self.tok, ch) {
            (Some(Token::ParenClose(..)), ')') | (Some(Token::BracketClose(..)), ']') => {
                self.bump();
                Ok(())
            }
            _ => Err(SyntaxError::unclosed(self.here(), ch)),
        }
    }
}

/// Builds the term for a prefix operator. A minus applied to a number folds
/// into a negative number.
fn prefix_term(op: Op, arg: Term) -> Term {
    match (op.name(), arg) {
        ("-", Term::Int(val)) => Term::Int(-val),
        ("-", Term::Float(val)) => Term::Float(-val),
        (name, arg) => Term::structure(Atom::new(name), vec![arg]),
    }
}

fn infix_term(op: Op, lhs: Term, rhs: Term) -> Term {
    Term::structure(Atom::new(op.name()), vec![lhs, rhs])
}

// Tests
// --------------------------------------------------
