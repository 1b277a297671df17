//! A client for the Pedro publish/subscribe server.
//!
//! A [`PedroClient`] sends notifications, manages subscriptions and
//! registers a name for peer-to-peer messages. Every request is answered by
//! an integer ack: `0` means the server refused it, anything else is success
//! (for a subscription, the ack is its id).
//!
//! Notifications matching the client's subscriptions, and p2p messages sent
//! to its registered name, are delivered to a callback by a reader task that
//! starts with the first `subscribe` or `register`.
//!
//! [`PedroClient`]: ./struct.PedroClient.html

pub mod address;
pub mod connection;
pub mod reader;
mod error;

#[cfg(test)]
mod fake;

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::syntax::Term;

pub use self::connection::Connection;
pub use self::error::{ClientError, Result};
pub use self::reader::{Handler, Notification, NotificationReader};

/// A Pedro client.
///
/// Requests are answered in order, one at a time. Any request made while
/// disconnected is answered with `0` without touching the network.
pub struct PedroClient {
    conn: Connection,
    handler: Handler,
    name: String,
    local_ip: String,
}

// Public API
// --------------------------------------------------

impl PedroClient {
    /// Constructs a disconnected client that passes each notification to
    /// `callback`.
    pub fn new<F>(config: &ClientConfig, callback: F) -> PedroClient
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        PedroClient {
            conn: Connection::new(config.host.clone(), config.port, config.timeout()),
            handler: Arc::new(callback),
            name: String::new(),
            local_ip: config.local_ip.clone(),
        }
    }

    /// Constructs a disconnected client that queues notifications on a
    /// channel.
    pub fn queued(config: &ClientConfig) -> (PedroClient, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = PedroClient::new(config, move |n| {
            if tx.send(n).is_err() {
                log::debug!("Notification queue closed, dropping notification");
            }
        });
        (client, rx)
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.conn.connect().await
    }

    /// Disconnects, stopping the reader. Returns false if already
    /// disconnected.
    pub async fn disconnect(&mut self) -> bool {
        self.conn.disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_connected()
    }

    /// Sends a notification. The term text is the whole request.
    pub async fn notify<T: Display + ?Sized>(&mut self, term: &T) -> Result<i64> {
        if !self.conn.is_connected() {
            return Ok(0);
        }
        self.conn.send_and_ack(&term.to_string()).await
    }

    /// Subscribes to notifications matching `term`, with goal `true` and
    /// rock `0`. Returns the subscription id.
    pub async fn subscribe<T: Display + ?Sized>(&mut self, term: &T) -> Result<i64> {
        self.subscribe_with(term, "true", 0).await
    }

    /// Subscribes to notifications matching `term` for which `goal` holds.
    ///
    /// The server prefixes each delivered notification with `rock`.
    pub async fn subscribe_with<T, G>(&mut self, term: &T, goal: &G, rock: i64) -> Result<i64>
    where
        T: Display + ?Sized,
        G: Display + ?Sized,
    {
        if !self.conn.is_connected() {
            return Ok(0);
        }
        self.conn.ensure_reader_started(&self.handler)?;
        let line = format!("subscribe({}, ({}), {})", term, goal, rock);
        self.conn.send_and_ack(&line).await
    }

    pub async fn unsubscribe(&mut self, id: i64) -> Result<i64> {
        if !self.conn.is_connected() {
            return Ok(0);
        }
        self.conn.send_and_ack(&format!("unsubscribe({})", id)).await
    }

    /// Registers `name` as this client's name for p2p messages.
    pub async fn register(&mut self, name: &str) -> Result<i64> {
        if !self.conn.is_connected() {
            return Ok(0);
        }
        self.conn.ensure_reader_started(&self.handler)?;
        let ack = self.conn.send_and_ack(&format!("register({})", name)).await?;
        if ack != 0 {
            self.name = name.to_string();
        }
        Ok(ack)
    }

    pub async fn deregister(&mut self) -> Result<i64> {
        if !self.conn.is_connected() {
            return Ok(0);
        }
        let line = format!("deregister({})", self.name);
        let ack = self.conn.send_and_ack(&line).await?;
        if ack != 0 {
            self.name.clear();
        }
        Ok(ack)
    }

    /// Sends `term` to the peer at `to`. See the [`address`] module for the
    /// address forms.
    ///
    /// Nothing is sent, and `0` returned, until the client has registered a
    /// name.
    ///
    /// [`address`]: ./address/index.html
    pub async fn p2p<T: Display + ?Sized>(&mut self, to: &str, term: &T) -> Result<i64> {
        if self.name.is_empty() || !self.conn.is_connected() {
            return Ok(0);
        }
        let line = address::p2p_message(to, &self.name, &self.local_ip, &term.to_string());
        self.conn.send_and_ack(&line).await
    }

    /// Sends `term` to an address given as a term, `Name@Host` or
    /// `Module:Name@Host`.
    pub async fn p2p_term<T: Display + ?Sized>(&mut self, to: &Term, term: &T) -> Result<i64> {
        let to = address::render(to)?;
        self.p2p(&to, term).await
    }

    /// The registered name, if any.
    pub fn name(&self) -> Option<&str> {
        if self.name.is_empty() {
            None
        } else {
            Some(&self.name)
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

// Tests
// --------------------------------------------------
