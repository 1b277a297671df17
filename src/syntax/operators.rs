use std::cmp::{Ordering, PartialOrd};
use std::ops::Deref;

/// A specification for parsing operators.
///
/// An `Op` tells the parser how to handle operators and is comprised of three
/// components:
///
/// - The type of the operator, given by the discriminant of the enum,
///   specifies whether the operator is prefix or infix. The `F` indicates the
///   position of the functor while `X` and `Y` indicate the position of the
///   arguments. A `Y` on the right means that the operator is right
///   associative, and likewise on the left means left associative. No `Y`
///   means non-associative: the operator appears at most once per level, and
///   the argument of an `FX` operator binds strictly tighter than it.
/// - The precedence of the operator is given as a u32. A lower value equates
///   to a narrower scope. Thus multiplicative operators have *lower*
///   precedence than additive operators.
/// - The name of the operator, which is the functor of the built structure.
#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq, Eq)]
pub enum Op {
    XFX(u32, &'static str),
    XFY(u32, &'static str),
    YFX(u32, &'static str),
    FX(u32, &'static str),
}

/// The general categories of operators.
#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq, Eq)]
#[derive(PartialOrd, Ord)]
pub enum OpType {
    Prefix,
    Infix,
}

/// A table of operators to be used by a `Parser`.
///
/// The table is implemented as a sorted list of `Op`s. Operators are sorted
/// first by name, then by type, and finally by precedence.
#[derive(Debug)]
#[derive(Clone)]
pub struct OpTable(Vec<Op>);

// OpTable
// --------------------------------------------------

impl OpTable {
    /// Construct a new, empty operator table.
    pub fn new() -> OpTable {
        OpTable(Vec::new())
    }

    /// View the table as a sorted slice of `Op`s.
    pub fn as_slice(&self) -> &[Op] {
        &self.0
    }

    /// Insert a new operator into the table, replacing an operator of the
    /// same name, type and precedence.
    pub fn insert(&mut self, op: Op) {
        match self.0.binary_search(&op) {
            Ok(i) => self.0[i] = op,
            Err(i) => self.0.insert(i, op),
        }
    }

    /// Get a slice of all operators matching the given name.
    ///
    /// The resulting slice is in sorted order.
    pub fn get(&self, name: &str) -> &[Op] {
        let i = self.0.partition_point(|op| op.name() < name);
        let j = i + self.0[i..].iter().take_while(|op| op.name() == name).count();
        &self.0[i..j]
    }

    /// Get the prefix operator with this name at exactly this precedence.
    pub fn prefix(&self, name: &str, prec: u32) -> Option<Op> {
        self.get(name)
            .iter()
            .cloned()
            .find(|op| op.op_type() == OpType::Prefix && op.prec() == prec)
    }

    /// Get the infix operator with this name at exactly this precedence.
    pub fn infix(&self, name: &str, prec: u32) -> Option<Op> {
        self.get(name)
            .iter()
            .cloned()
            .find(|op| op.op_type() == OpType::Infix && op.prec() == prec)
    }

    /// The distinct precedence levels of the table, loosest first.
    pub fn levels(&self) -> Vec<u32> {
        let mut levels: Vec<u32> = self.0.iter().map(|op| op.prec()).collect();
        levels.sort_unstable_by(|a, b| b.cmp(a));
        levels.dedup();
        levels
    }
}

impl Default for OpTable {
    /// Returns the operators understood by the Pedro server.
    #[rustfmt::skip]
    fn default() -> OpTable {
        OpTable::from(vec![
            Op::XFY(1100, ";"),
            Op::XFY(1050, "->"),
            Op::XFY(1000, ","),
            Op::XFX(700, "="),
            Op::XFX(700, "is"),
            Op::XFX(700, "<"),
            Op::XFX(700, ">"),
            Op::XFX(700, "=<"),
            Op::XFX(700, ">="),
            Op::YFX(500, "+"),
            Op::YFX(500, "-"),
            Op::YFX(500, "\\/"),
            Op::YFX(500, "/\\"),
            Op::YFX(400, "*"),
            Op::YFX(400, "/"),
            Op::YFX(400, "//"),
            Op::YFX(400, "mod"),
            Op::YFX(400, ">>"),
            Op::YFX(400, "<<"),
            Op::FX(200, "-"),
            Op::XFX(200, "**"),
            Op::XFX(100, "@"),
            Op::XFX(50, ":"),
        ])
    }
}

impl From<Vec<Op>> for OpTable {
    fn from(vec: Vec<Op>) -> OpTable {
        let mut ops = OpTable::new();
        for op in vec {
            ops.insert(op);
        }
        ops
    }
}

impl Deref for OpTable {
    type Target = [Op];
    fn deref(&self) -> &[Op] {
        self.as_slice()
    }
}

// Op
// --------------------------------------------------

impl Op {
    #[inline]
    pub fn op_type(&self) -> OpType {
        match *self {
            Op::FX(..) => OpType::Prefix,
            Op::XFX(..) | Op::XFY(..) | Op::YFX(..) => OpType::Infix,
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        match *self {
            Op::XFX(_, name) => name,
            Op::XFY(_, name) => name,
            Op::YFX(_, name) => name,
            Op::FX(_, name) => name,
        }
    }

    #[inline]
    pub fn prec(&self) -> u32 {
        match *self {
            Op::XFX(prec, _) => prec,
            Op::XFY(prec, _) => prec,
            Op::YFX(prec, _) => prec,
            Op::FX(prec, _) => prec,
        }
    }
}

impl PartialOrd for Op {
    fn partial_cmp(&self, other: &Op) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Op {
    fn cmp(&self, other: &Op) -> Ordering {
        self.name()
            .cmp(other.name())
            .then(self.op_type().cmp(&other.op_type()))
            .then(self.prec().cmp(&other.prec()))
    }
}

// Tests
// --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn get() {
        let ops = OpTable::default();
        assert_eq!(ops.get("-"), &[Op::FX(200, "-"), Op::YFX(500, "-")]);
        assert_eq!(ops.prefix("-", 200), Some(Op::FX(200, "-")));
        assert_eq!(ops.prefix("-", 500), None);
        assert_eq!(ops.infix("-", 500), Some(Op::YFX(500, "-")));
        assert_eq!(ops.infix("is", 700), Some(Op::XFX(700, "is")));
        assert_eq!(ops.infix("foo", 700), None);
        assert!(ops.get("zzz").is_empty());
    }

    #[test]
    fn levels() {
        let ops = OpTable::default();
        assert_eq!(ops.levels(), vec![1100, 1050, 1000, 700, 500, 400, 200, 100, 50]);
    }

    #[test]
    #[rustfmt::skip]
    fn insert() {
        let mut ops = OpTable::new();
        ops.insert(Op::XFX(700, "foo"));
        ops.insert(Op::FX(200, "foo"));
        ops.insert(Op::YFX(500, "bar"));
        ops.insert(Op::XFX(700, "foo"));
        assert_eq!(ops.as_slice(), &[
            Op::YFX(500, "bar"),
            Op::FX(200, "foo"),
            Op::XFX(700, "foo"),
        ]);
    }
}
