//! The notification reader.
//!
//! Pedro pushes notifications on the data socket, one per line, each prefixed
//! by a rock: the routing token of the subscription that matched. A
//! [`NotificationReader`] is a task that drains the socket, frames it into
//! lines, strips the rock and hands each message to the user's handler.
//!
//! [`NotificationReader`]: ./struct.NotificationReader.html

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::syntax::{self, Term};

/// Bytes requested from the socket per read.
const READ_CHUNK: usize = 1024;

/// The user's notification callback.
pub type Handler = Arc<dyn Fn(Notification) + Send + Sync>;

/// A notification delivered by the server.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq)]
pub struct Notification {
    /// The routing token, as sent.
    pub rock: String,
    /// The notification term, as text.
    pub message: String,
}

impl Notification {
    /// The rock as an integer, when it is one.
    pub fn rock_id(&self) -> Option<i64> {
        self.rock.parse().ok()
    }

    /// Parses the message. A message that does not parse is logged and
    /// yields `None`.
    pub fn term(&self) -> Option<Term> {
        syntax::parse_or_log(&self.message)
    }
}

/// A running reader task.
///
/// Dropping the reader also stops the task.
pub struct NotificationReader {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl NotificationReader {
    /// Spawns a reader over `source`.
    pub fn spawn<R>(source: R, handler: Handler) -> NotificationReader
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(run(source, handler, stopped));
        log::debug!("Notification reader started");
        NotificationReader { stop, task }
    }

    /// Returns true once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the task, interrupting a pending read, and waits for it.
    pub async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            log::error!("Notification reader failed: {e}");
        }
    }
}

async fn run<R>(mut source: R, handler: Handler, mut stopped: oneshot::Receiver<()>)
where
    R: AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = tokio::select! {
            _ = &mut stopped => {
                log::debug!("Notification reader stopped");
                break;
            }
            res = source.read(&mut chunk) => match res {
                Ok(0) => {
                    log::info!("Data socket closed by server");
                    break;
                }
                Ok(n) => n,
                Err(e) => {
                    log::error!("Error reading data socket: {e}");
                    break;
                }
            },
        };
        buf.extend_from_slice(&chunk[..n]);
        while let Some(end) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=end).collect();
            deliver(&handler, &line[..end]);
        }
    }
}

/// Strips the rock off a line and calls the handler, isolating panics so one
/// bad message does not stop the reader.
fn deliver(handler: &Handler, line: &[u8]) {
    let text = String::from_utf8_lossy(line);
    let (rock, message) = match text.split_once(' ') {
        Some(parts) => parts,
        None => {
            log::warn!("Dropping notification without a rock: {:?}", text);
            return;
        }
    };
    let notification = Notification {
        rock: rock.to_string(),
        message: message.to_string(),
    };
    log::trace!("Notification {:?}", notification);
    if panic::catch_unwind(AssertUnwindSafe(|| handler(notification))).is_err() {
        log::error!("Notification handler panicked on {:?}", text);
    }
}

// Tests
// --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    use std::time::Duration;

    use tokio::io::AsyncWriteExt;
    use tokio::sync::mpsc;

    fn channel_handler() -> (Handler, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler: Handler = Arc::new(move |n| {
            let _ = tx.send(n);
        });
        (handler, rx)
    }

    fn note(rock: &str, message: &str) -> Notification {
        Notification {
            rock: rock.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn split_reads() {
        let (handler, mut rx) = channel_handler();
        let (mut tx, source) = tokio::io::duplex(64);
        let reader = NotificationReader::spawn(source, handler);

        tx.write_all(b"r1 noti").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        tx.write_all(b"fy(x)\n").await.unwrap();

        assert_eq!(rx.recv().await, Some(note("r1", "notify(x)")));
        reader.stop().await;
    }

    #[tokio::test]
    async fn many_lines_in_one_read() {
        let (handler, mut rx) = channel_handler();
        let (mut tx, source) = tokio::io::duplex(256);
        let reader = NotificationReader::spawn(source, handler);

        tx.write_all(b"1 a(1)\n2 b(2)\n3 c(").await.unwrap();
        tx.write_all(b"3)\n").await.unwrap();

        assert_eq!(rx.recv().await, Some(note("1", "a(1)")));
        assert_eq!(rx.recv().await, Some(note("2", "b(2)")));
        assert_eq!(rx.recv().await, Some(note("3", "c(3)")));
        reader.stop().await;
    }

    #[tokio::test]
    async fn bad_messages_do_not_stop_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler: Handler = Arc::new(move |n: Notification| {
            if n.message == "bad" {
                panic!("handler failure");
            }
            let _ = tx.send(n);
        });
        let (mut sink, source) = tokio::io::duplex(256);
        let reader = NotificationReader::spawn(source, handler);

        sink.write_all(b"norock\n1 bad\n2 good\n").await.unwrap();

        assert_eq!(rx.recv().await, Some(note("2", "good")));
        assert!(!reader.is_finished());
        reader.stop().await;
    }

    #[tokio::test]
    async fn ends_on_eof() {
        let (handler, _rx) = channel_handler();
        let (sink, source) = tokio::io::duplex(64);
        let reader = NotificationReader::spawn(source, handler);
        drop(sink);
        for _ in 0..50 {
            if reader.is_finished() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reader.is_finished());
    }

    #[tokio::test]
    async fn stop_interrupts_pending_read() {
        let (handler, _rx) = channel_handler();
        let (_sink, source) = tokio::io::duplex(64);
        let reader = NotificationReader::spawn(source, handler);
        tokio::time::timeout(Duration::from_secs(1), reader.stop())
            .await
            .unwrap();
    }

    #[test]
    fn notification_helpers() {
        let n = note("42", "set_sample_rate(kitchen, 10)");
        assert_eq!(n.rock_id(), Some(42));
        let term = n.term().unwrap();
        assert_eq!(term.arity(), 2);

        let n = note("r1", "broken(");
        assert_eq!(n.rock_id(), None);
        assert_eq!(n.term(), None);
    }
}
