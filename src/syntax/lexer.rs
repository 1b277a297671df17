use std::fmt;

use regex::Regex;

/// A lexer for Pedro terms.
///
/// Implemented as an iterator over `Token`s. The iterator ends when the
/// remaining text matches no token class, which is normally the end of the
/// input. Use [`rest`] to tell the two apart.
///
/// [`rest`]: #method.rest
pub struct Lexer<'a> {
    src: &'a str,
    offset: usize,
    pos: usize,
}

/// A lexical item of a Pedro term.
///
/// Every `Token` includes its character offset as the first member. When
/// relevant, the second member gives the value of the token. Strings and
/// quoted atoms are kept raw, quotes and escapes included.
///
/// Lexical errors are given as a `Token::Err` whose value is the error message.
#[derive(Debug)]
#[derive(Clone, Copy)]
#[derive(PartialEq)]
pub enum Token<'a> {
    Err(usize, &'static str),
    Int(usize, i64),
    Float(usize, f64),
    Var(usize, &'a str),
    Str(usize, &'a str),
    Atom(usize, &'a str),
    ParenOpen(usize),
    ParenClose(usize),
    BracketOpen(usize),
    BracketClose(usize),
    Comma(usize),
    Bar(usize),
}

/// The token classes, in the order they are tried.
#[derive(Clone, Copy)]
enum Class {
    Number,
    Punct,
    Var,
    Str,
    Atom,
}

lazy_static! {
    static ref SPACE: Regex = Regex::new(r"^\s*").unwrap();

    // Order matters: the first class that matches wins.
    static ref TABLE: Vec<(Class, Regex)> = vec![
        (Class::Number, Regex::new(r"^[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?").unwrap()),
        (Class::Punct, Regex::new(r"^[()\[\],|]").unwrap()),
        (Class::Var, Regex::new(r"^[_A-Z][A-Za-z0-9_]*").unwrap()),
        (Class::Str, Regex::new(r#"^"[^"\\]*(?:\\.[^"\\]*)*""#).unwrap()),
        (Class::Atom, Regex::new(
            r"^(?:[a-z][A-Za-z0-9_]*|'[^'\\]*(?:\\.[^'\\]*)*'|[-/+*<=>#@$\\^&~`:.?!;]+)"
        ).unwrap()),
    ];
}

// Public API
// --------------------------------------------------

impl<'a> Lexer<'a> {
    /// Constructs a new lexer over the given text.
    pub fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src,
            offset: 0,
            pos: 0,
        }
    }

    /// The character offset of the cursor.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The text not yet consumed.
    pub fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn advance(&mut self, len: usize) -> &'a str {
        let s = &self.src[self.offset..self.offset + len];
        self.offset += len;
        self.pos += s.chars().count();
        s
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    /// Extracts the next token, skipping leading whitespace.
    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(m) = SPACE.find(self.rest()) {
            self.advance(m.end());
        }
        let start = self.pos;
        for &(class, ref re) in TABLE.iter() {
            if let Some(m) = re.find(self.rest()) {
                let s = self.advance(m.end());
                return Some(lex(class, start, s));
            }
        }
        None
    }
}

impl<'a> Token<'a> {
    #[inline]
    pub fn pos(&self) -> usize {
        match *self {
            Token::Err(pos, ..) => pos,
            Token::Int(pos, ..) => pos,
            Token::Float(pos, ..) => pos,
            Token::Var(pos, ..) => pos,
            Token::Str(pos, ..) => pos,
            Token::Atom(pos, ..) => pos,
            Token::ParenOpen(pos) => pos,
            Token::ParenClose(pos) => pos,
            Token::BracketOpen(pos) => pos,
            Token::BracketClose(pos) => pos,
            Token::Comma(pos) => pos,
            Token::Bar(pos) => pos,
        }
    }

    /// The name of the operator this token could stand for, if any.
    #[inline]
    pub fn op_name(&self) -> Option<&'a str> {
        match *self {
            Token::Atom(_, name) => Some(name),
            Token::Comma(..) => Some(","),
            _ => None,
        }
    }
}

impl<'a> fmt::Display for Token<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Token::Err(_, msg) => write!(f, "{}", msg),
            Token::Int(_, val) => write!(f, "{}", val),
            Token::Float(_, val) => write!(f, "{:?}", val),
            Token::Var(_, val) => f.write_str(val),
            Token::Str(_, val) => f.write_str(val),
            Token::Atom(_, val) => f.write_str(val),
            Token::ParenOpen(..) => f.write_str("("),
            Token::ParenClose(..) => f.write_str(")"),
            Token::BracketOpen(..) => f.write_str("["),
            Token::BracketClose(..) => f.write_str("]"),
            Token::Comma(..) => f.write_str(","),
            Token::Bar(..) => f.write_str("|"),
        }
    }
}

// Lexing Logic
// --------------------------------------------------

fn lex<'a>(class: Class, pos: usize, s: &'a str) -> Token<'a> {
    match class {
        Class::Number => lex_number(pos, s),
        Class::Punct => lex_simple(pos, s),
        Class::Var => Token::Var(pos, s),
        Class::Str => Token::Str(pos, s),
        Class::Atom => Token::Atom(pos, s),
    }
}

/// Returns the token for a decimal number.
fn lex_number<'a>(pos: usize, s: &str) -> Token<'a> {
    let float = s.chars().any(|ch| ch == '.' || ch == 'e' || ch == 'E');
    if float {
        match s.parse() {
            Ok(val) => Token::Float(pos, val),
            Err(_) => Token::Err(pos, "malformed float"),
        }
    } else {
        match s.parse() {
            Ok(val) => Token::Int(pos, val),
            Err(_) => Token::Err(pos, "integer out of range"),
        }
    }
}

/// Returns the token for a single char symbol.
fn lex_simple<'a>(pos: usize, s: &str) -> Token<'a> {
    match s {
        "(" => Token::ParenOpen(pos),
        ")" => Token::ParenClose(pos),
        "[" => Token::BracketOpen(pos),
        "]" => Token::BracketClose(pos),
        "," => Token::Comma(pos),
        "|" => Token::Bar(pos),
        _ => unreachable!("lex_simple must be called with a simple character"),
    }
}

/// Decodes a raw string token: strips the surrounding quotes and replaces
/// escape sequences. Unknown escapes are kept as written.
pub fn unescape(raw: &str) -> String {
    let inner = if raw.len() >= 2 { &raw[1..raw.len() - 1] } else { raw };
    let mut buf = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            buf.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => buf.push('\n'),
            Some('r') => buf.push('\r'),
            Some('t') => buf.push('\t'),
            Some('a') => buf.push('\x07'),
            Some('b') => buf.push('\x08'),
            Some('f') => buf.push('\x0c'),
            Some('v') => buf.push('\x0b'),
            Some('\\') => buf.push('\\'),
            Some('\'') => buf.push('\''),
            Some('"') => buf.push('"'),
            Some('x') => push_code(&mut buf, &mut chars, 16, 2, 'x'),
            Some('u') => push_code(&mut buf, &mut chars, 16, 4, 'u'),
            Some(d) if d.is_digit(8) => {
                let mut code = d.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(v) => {
                            code = code * 8 + v;
                            chars.next();
                        }
                        None => break,
                    }
                }
                buf.extend(std::char::from_u32(code));
            }
            Some(other) => {
                buf.push('\\');
                buf.push(other);
            }
            None => buf.push('\\'),
        }
    }
    buf
}

/// Reads exactly `len` digits in `radix` and pushes the encoded char. On a
/// short or invalid sequence the escape is kept as written.
fn push_code<I>(buf: &mut String, chars: &mut std::iter::Peekable<I>, radix: u32, len: usize, tag: char)
where
    I: Iterator<Item = char> + Clone,
{
    let digits: String = chars.clone().take(len).collect();
    let code = if digits.chars().count() == len {
        u32::from_str_radix(&digits, radix).ok().and_then(std::char::from_u32)
    } else {
        None
    };
    match code {
        Some(ch) => {
            buf.push(ch);
            for _ in 0..len {
                chars.next();
            }
        }
        None => {
            buf.push('\\');
            buf.push(tag);
        }
    }
}

// Tests
// --------------------------------------------------
