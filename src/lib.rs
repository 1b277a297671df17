//! A client for the Pedro publish/subscribe server, with a parser for the
//! Prolog-like terms Pedro speaks.

#[macro_use]
extern crate lazy_static;

pub mod client;
pub mod config;
pub mod syntax;

pub use client::{ClientError, Notification, PedroClient};
pub use config::ClientConfig;
pub use syntax::{SyntaxError, Term};
