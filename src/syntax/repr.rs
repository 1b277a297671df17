//! The core representation of Pedro terms.
//!
//! Pedro exchanges terms of a Prolog-like language. This module houses the
//! [`Term`] type along with the [`Atom`] and [`Structure`] payloads it is built
//! from. Terms are plain owned trees: they are constructed once, by the parser
//! or by application code, and never mutated afterwards.
//!
//! The `fmt::Display` implementation is the printer. It renders a term in the
//! canonical functional form understood by the parser, e.g. `+(1, *(2, 3))`.
//! Strings are printed without their quotes, so a term containing a string
//! does not survive a print/parse round trip.
//!
//! [`Term`]: ./enum.Term.html
//! [`Atom`]: ./struct.Atom.html
//! [`Structure`]: ./struct.Structure.html

use std::fmt;

use ordered_float::OrderedFloat;

/// The name of the empty list.
pub const NIL: &str = "[]";

/// A Pedro term.
///
/// Equality is structural. Variants are compared first, so `Int(1)` and
/// `Float(1.0)` are never equal.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq, Hash)]
pub enum Term {
    Int(i64),
    Float(OrderedFloat<f64>),
    Var(String),
    Str(String),
    Atom(Atom),
    List(Box<Term>, Box<Term>),
    Struct(Structure),
}

/// An atom, e.g. `foo`, `'hello world'` or `=<`.
///
/// Quoted atoms keep their quotes so that they print the way they were read.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq, Hash)]
#[derive(PartialOrd, Ord)]
pub struct Atom(String);

/// A compound term: a functor applied to zero or more arguments.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq, Hash)]
pub struct Structure {
    functor: Atom,
    args: Vec<Term>,
}

// Atom
// --------------------------------------------------

impl Atom {
    pub fn new<S: Into<String>>(name: S) -> Atom {
        Atom(name.into())
    }

    pub fn nil() -> Atom {
        Atom::new(NIL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        self.0 == NIL
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Structure
// --------------------------------------------------

impl Structure {
    pub fn new(functor: Atom, args: Vec<Term>) -> Structure {
        Structure { functor, args }
    }

    pub fn functor(&self) -> &Atom {
        &self.functor
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}(", self.functor)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

// Term
// --------------------------------------------------

impl Term {
    pub fn int(val: i64) -> Term {
        Term::Int(val)
    }

    pub fn float(val: f64) -> Term {
        Term::Float(OrderedFloat(val))
    }

    pub fn var<S: Into<String>>(name: S) -> Term {
        Term::Var(name.into())
    }

    pub fn string<S: Into<String>>(text: S) -> Term {
        Term::Str(text.into())
    }

    pub fn atom<S: Into<String>>(name: S) -> Term {
        Term::Atom(Atom::new(name))
    }

    pub fn nil() -> Term {
        Term::Atom(Atom::nil())
    }

    /// Builds a compound term. The functor must already be an atom.
    pub fn structure(functor: Atom, args: Vec<Term>) -> Term {
        Term::Struct(Structure::new(functor, args))
    }

    /// Builds a single cons cell.
    pub fn cons(head: Term, tail: Term) -> Term {
        Term::List(Box::new(head), Box::new(tail))
    }

    /// Builds a list from its elements, right to left, ending in `tail`.
    ///
    /// An empty `items` yields `tail` itself.
    pub fn list(items: Vec<Term>, tail: Term) -> Term {
        items
            .into_iter()
            .rev()
            .fold(tail, |acc, item| Term::cons(item, acc))
    }

    /// Returns the arity of the term. Lists are binary, everything else that
    /// is not a structure is 0-ary.
    pub fn arity(&self) -> usize {
        match *self {
            Term::Struct(ref s) => s.arity(),
            Term::List(..) => 2,
            _ => 0,
        }
    }

    pub fn is_nil(&self) -> bool {
        match *self {
            Term::Atom(ref a) => a.is_nil(),
            _ => false,
        }
    }

    /// Returns true if following the tails ends in `[]`.
    pub fn is_proper_list(&self) -> bool {
        self.to_vec().is_some()
    }

    /// Collects the elements of a proper list.
    ///
    /// `[]` yields an empty vector. Returns `None` for an improper list and
    /// for any term which is not a list.
    pub fn to_vec(&self) -> Option<Vec<&Term>> {
        let mut items = Vec::new();
        let mut cur = self;
        loop {
            match *cur {
                Term::List(ref head, ref tail) => {
                    items.push(&**head);
                    cur = &**tail;
                }
                ref last if last.is_nil() => return Some(items),
                _ => return None,
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Term::Int(val) => write!(f, "{}", val),
            // Debug keeps the decimal point, so 1.0 reads back as a float.
            Term::Float(val) => write!(f, "{:?}", val.into_inner()),
            Term::Var(ref name) => f.write_str(name),
            Term::Str(ref text) => f.write_str(text),
            Term::Atom(ref atom) => write!(f, "{}", atom),
            Term::Struct(ref s) => write!(f, "{}", s),
            Term::List(ref head, ref tail) => {
                write!(f, "[{}", head)?;
                let mut cur = &**tail;
                while let Term::List(ref head, ref tail) = *cur {
                    write!(f, ", {}", head)?;
                    cur = &**tail;
                }
                if cur.is_nil() {
                    f.write_str("]")
                } else {
                    write!(f, "|{}]", cur)
                }
            }
        }
    }
}

impl From<Atom> for Term {
    fn from(atom: Atom) -> Term {
        Term::Atom(atom)
    }
}

impl From<Structure> for Term {
    fn from(s: Structure) -> Term {
        Term::Struct(s)
    }
}

// Tests
// --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equality() {
        assert_eq!(Term::int(1), Term::int(1));
        assert_ne!(Term::int(1), Term::float(1.0));
        assert_ne!(Term::atom("X"), Term::var("X"));
        assert_ne!(Term::atom("a"), Term::string("a"));

        let f = |args| Term::structure(Atom::new("f"), args);
        assert_eq!(f(vec![Term::int(1)]), f(vec![Term::int(1)]));
        assert_ne!(f(vec![Term::int(1)]), f(vec![Term::int(1), Term::int(2)]));
        assert_ne!(f(vec![]), Term::atom("f"));
    }

    #[test]
    fn print_lists() {
        let proper = Term::list(vec![Term::int(1), Term::int(2), Term::int(3)], Term::nil());
        assert_eq!(proper.to_string(), "[1, 2, 3]");

        let improper = Term::list(vec![Term::int(1), Term::int(2)], Term::var("T"));
        assert_eq!(improper.to_string(), "[1, 2|T]");

        let nested = Term::list(vec![Term::nil(), proper.clone()], Term::nil());
        assert_eq!(nested.to_string(), "[[], [1, 2, 3]]");
    }

    #[test]
    fn print_structures() {
        let s = Term::structure(
            Atom::new("temperature"),
            vec![Term::atom("kitchen"), Term::float(21.5), Term::string("ok")],
        );
        assert_eq!(s.to_string(), "temperature(kitchen, 21.5, ok)");
        assert_eq!(Term::structure(Atom::new("f"), vec![]).to_string(), "f()");
        assert_eq!(Term::float(2.0).to_string(), "2.0");
        assert_eq!(Term::int(-7).to_string(), "-7");
    }

    #[test]
    fn to_vec() {
        let proper = Term::list(vec![Term::int(1), Term::int(2)], Term::nil());
        assert_eq!(proper.to_vec(), Some(vec![&Term::int(1), &Term::int(2)]));
        assert!(proper.is_proper_list());

        let improper = Term::list(vec![Term::int(1)], Term::var("X"));
        assert_eq!(improper.to_vec(), None);
        assert!(!improper.is_proper_list());

        assert_eq!(Term::nil().to_vec(), Some(vec![]));
        assert_eq!(Term::atom("a").to_vec(), None);
    }

    #[test]
    fn arity() {
        assert_eq!(Term::atom("a").arity(), 0);
        assert_eq!(Term::cons(Term::int(1), Term::nil()).arity(), 2);
        let s = Term::structure(Atom::new("g"), vec![Term::int(1), Term::int(2), Term::int(3)]);
        assert_eq!(s.arity(), 3);
    }
}
