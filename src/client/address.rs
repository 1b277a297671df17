//! Peer-to-peer addressing.
//!
//! A p2p message names its destination in one of three ways:
//!
//! - `Name@Host` or `Module:Name@Host`: a peer on a given host. The literal
//!   host `localhost` is replaced by the client's own IP.
//! - A variable-looking name such as `X` or `_Peer`: sent as written.
//! - Any other name: a peer on the client's own host.
//!
//! The branches are tried in that order.

use regex::Regex;

use crate::client::error::{ClientError, Result};
use crate::syntax::Term;

lazy_static! {
    static ref VAR_ADDR: Regex = Regex::new(r"^[_A-Z][^:]*$").unwrap();
}

/// Builds the `p2pmsg` request sending `term` from `name` at `ip` to `to`.
pub fn p2p_message(to: &str, name: &str, ip: &str, term: &str) -> String {
    if to.contains('@') {
        let dest = to.replace("localhost", &format!("'{}'", ip));
        format!("p2pmsg({}, {}@'{}',{})", dest, name, ip, term)
    } else if VAR_ADDR.is_match(to) {
        format!("p2pmsg({}, {}@'{}',{})", to, name, ip, term)
    } else {
        format!("p2pmsg({}@'{}', {}@'{}',{})", to, ip, name, ip, term)
    }
}

/// Renders an address term, `Name@Host` or `Module:Name@Host`, as text.
pub fn render(addr: &Term) -> Result<String> {
    let bad = || ClientError::BadAddress(addr.to_string());
    let args = match *addr {
        Term::Struct(ref s) if s.functor().as_str() == "@" && s.arity() == 2 => s.args(),
        _ => return Err(bad()),
    };
    let (name, host) = (&args[0], &args[1]);
    match *name {
        Term::Struct(ref s) if s.functor().as_str() == ":" && s.arity() == 2 => {
            Ok(format!("{}:{}@{}", s.args()[0], s.args()[1], host))
        }
        Term::Struct(_) => Err(bad()),
        _ => Ok(format!("{}@{}", name, host)),
    }
}

// Tests
// --------------------------------------------------
