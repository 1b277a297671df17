//! The three-socket link to a Pedro server.
//!
//! A client first connects to the server's info port and reads one line:
//! the server's canonical host name, its ack port and its data port. It then
//! opens the ack socket, where the server sends the client's id, and the data
//! socket, where the client echoes the id and the server answers `ok`.
//!
//! After the handshake, requests are written to the data socket and each one
//! is answered by an integer on the ack socket. Notifications arrive on the
//! data socket and are consumed by a [`NotificationReader`].
//!
//! [`NotificationReader`]: ../reader/struct.NotificationReader.html

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::client::error::{ClientError, Result};
use crate::client::reader::{Handler, NotificationReader};

/// A connection to a Pedro server.
///
/// The connection is either disconnected or holds a live link. Requests on a
/// disconnected connection fail with `ClientError::NotConnected`.
pub struct Connection {
    host: String,
    port: u16,
    timeout: Option<Duration>,
    link: Option<Link>,
}

/// The sockets of a live connection.
///
/// Exactly one of `source` and `reader` is set: the read half of the data
/// socket waits in `source` until a reader takes it.
struct Link {
    server_host: String,
    id: String,
    ack: BufReader<TcpStream>,
    data: OwnedWriteHalf,
    source: Option<BufReader<OwnedReadHalf>>,
    reader: Option<NotificationReader>,
}

// Public API
// --------------------------------------------------

impl Connection {
    /// Constructs a disconnected connection to the info port of a server.
    ///
    /// With a timeout, every handshake read and every ack read fails with
    /// `ClientError::Timeout` once it expires. Without one, they block until
    /// the server answers or closes the socket.
    pub fn new<S: Into<String>>(host: S, port: u16, timeout: Option<Duration>) -> Connection {
        Connection {
            host: host.into(),
            port,
            timeout,
            link: None,
        }
    }

    /// Performs the handshake. Connecting while connected does nothing.
    ///
    /// On failure the connection stays disconnected and any socket opened
    /// during the attempt is closed.
    pub async fn connect(&mut self) -> Result<()> {
        if self.link.is_some() {
            return Ok(());
        }
        match self.handshake().await {
            Ok(link) => {
                log::info!(
                    "Connected to {}:{} as {:?} (server host {})",
                    self.host,
                    self.port,
                    link.id.trim_end(),
                    link.server_host,
                );
                self.link = Some(link);
                Ok(())
            }
            Err(e) => {
                log::error!("Connecting to {}:{} failed: {}", self.host, self.port, e);
                Err(e)
            }
        }
    }

    /// Stops the reader, if any, and closes the sockets.
    ///
    /// Returns false if the connection was already disconnected.
    pub async fn disconnect(&mut self) -> bool {
        let mut link = match self.link.take() {
            Some(link) => link,
            None => return false,
        };
        if let Some(reader) = link.reader.take() {
            reader.stop().await;
        }
        let _ = link.ack.get_mut().shutdown().await;
        let _ = link.data.shutdown().await;
        log::info!("Disconnected from {}:{}", self.host, self.port);
        true
    }

    /// Writes one request line on the data socket and returns its ack.
    pub async fn send_and_ack(&mut self, line: &str) -> Result<i64> {
        let link = self.link.as_mut().ok_or(ClientError::NotConnected)?;
        log::debug!("Sending {:?}", line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        link.data
            .write_all(&buf)
            .await
            .map_err(ClientError::io("request write"))?;
        self.get_ack().await
    }

    /// Reads the next ack.
    ///
    /// For callers that wrote a request themselves. Anything but an integer
    /// line is a protocol violation.
    ///
    /// A timed out read may have consumed part of the ack, so the connection
    /// is dropped: a late ack must not answer the next request.
    pub async fn get_ack(&mut self) -> Result<i64> {
        let timeout = self.timeout;
        let link = self.link.as_mut().ok_or(ClientError::NotConnected)?;
        let res = timed(timeout, "ack read", read_line(&mut link.ack, "ack read")).await;
        let line = match res {
            Err(err @ ClientError::Timeout { .. }) => {
                log::error!("{}:{}: {}, disconnecting", self.host, self.port, err);
                self.disconnect().await;
                return Err(err);
            }
            res => res?,
        };
        let line = match line {
            Some(line) => line,
            None => {
                let err = ClientError::Protocol("ack socket closed".to_string());
                log::error!("{}:{}: {}", self.host, self.port, err);
                return Err(err);
            }
        };
        match line.trim().parse() {
            Ok(ack) => {
                log::trace!("Ack {}", ack);
                Ok(ack)
            }
            Err(_) => {
                let err = ClientError::Protocol(format!("ack is not an integer: {:?}", line));
                log::error!("{}:{}: {}", self.host, self.port, err);
                Err(err)
            }
        }
    }

    /// Starts the notification reader unless it is already running, and
    /// returns it.
    pub fn ensure_reader_started(&mut self, handler: &Handler) -> Result<&NotificationReader> {
        let link = self.link.as_mut().ok_or(ClientError::NotConnected)?;
        if let Some(source) = link.source.take() {
            link.reader = Some(NotificationReader::spawn(source, handler.clone()));
        }
        link.reader.as_ref().ok_or(ClientError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// The host name the server announced during the handshake.
    pub fn server_host(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.server_host.as_str())
    }

    /// The id the server assigned, without its newline.
    pub fn client_id(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.id.trim_end())
    }

    /// The address of the server end of the data socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.link.as_ref().and_then(|link| link.data.peer_addr().ok())
    }
}

// Handshake
// --------------------------------------------------

impl Connection {
    async fn handshake(&self) -> Result<Link> {
        let timeout = self.timeout;

        // Info socket.
        let info = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(ClientError::io("info connect"))?;
        let mut info = BufReader::new(info);
        let line = timed(timeout, "info read", read_line(&mut info, "info read")).await?;
        let line = line.ok_or_else(|| self.handshake_error("info socket closed"))?;
        drop(info);

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (server_host, ack_port, data_port) = match fields[..] {
            [host, ack, data] => match (ack.parse::<u16>(), data.parse::<u16>()) {
                (Ok(ack), Ok(data)) => (host.to_string(), ack, data),
                _ => return Err(self.handshake_error(format!("bad ports in {:?}", line))),
            },
            _ => return Err(self.handshake_error(format!("bad info line {:?}", line))),
        };
        log::debug!("Server {} ack port {} data port {}", server_host, ack_port, data_port);

        // Ack socket.
        let ack = TcpStream::connect((server_host.as_str(), ack_port))
            .await
            .map_err(ClientError::io("ack connect"))?;
        let mut ack = BufReader::new(ack);
        let id = timed(timeout, "id read", read_line(&mut ack, "id read")).await?;
        let id = id.ok_or_else(|| self.handshake_error("ack socket closed before the id"))?;

        // Data socket.
        let data = TcpStream::connect((server_host.as_str(), data_port))
            .await
            .map_err(ClientError::io("data connect"))?;
        let (source, mut data) = data.into_split();
        let mut source = BufReader::new(source);
        data.write_all(id.as_bytes())
            .await
            .map_err(ClientError::io("id write"))?;
        let reply = timed(timeout, "ok read", read_line(&mut source, "ok read")).await?;

        match reply {
            Some(ref reply) if reply == "ok\n" => Ok(Link {
                server_host,
                id,
                ack,
                data,
                source: Some(source),
                reader: None,
            }),
            _ => {
                let _ = ack.get_mut().shutdown().await;
                let _ = data.shutdown().await;
                Err(ClientError::Rejected {
                    host: self.host.clone(),
                    port: self.port,
                    reply: reply.unwrap_or_default(),
                })
            }
        }
    }

    fn handshake_error<S: Into<String>>(&self, reason: S) -> ClientError {
        ClientError::Handshake {
            host: self.host.clone(),
            port: self.port,
            reason: reason.into(),
        }
    }
}

/// Bounds `fut` by the timeout, if there is one.
async fn timed<T, F>(timeout: Option<Duration>, stage: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(res) => res,
            Err(_) => Err(ClientError::Timeout { stage }),
        },
    }
}

/// Reads one line, newline included. A line cut short by EOF is `None`.
async fn read_line<R>(source: &mut R, stage: &'static str) -> Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    source
        .read_until(b'\n', &mut buf)
        .await
        .map_err(ClientError::io(stage))?;
    if buf.last() != Some(&b'\n') {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

// Tests
// --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    use tokio::net::TcpListener;

    use crate::client::fake::FakeServer;

    fn connection(server: &FakeServer) -> Connection {
        Connection::new("127.0.0.1", server.port(), Some(Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn handshake() {
        let server = FakeServer::start("ok\n").await;
        let mut conn = connection(&server);
        assert!(!conn.is_connected());
        conn.connect().await.unwrap();
        assert!(conn.is_connected());
        assert_eq!(conn.server_host(), Some("127.0.0.1"));
        assert_eq!(conn.client_id(), Some(FakeServer::ID));
        assert_eq!(conn.peer_addr().map(|addr| addr.port()), Some(server.data_port()));
        let session = server.session().await;
        assert_eq!(session.id, format!("{}\n", FakeServer::ID));
    }

    #[tokio::test]
    async fn rejected() {
        let server = FakeServer::start("no\n").await;
        let mut conn = connection(&server);
        match conn.connect().await {
            Err(ClientError::Rejected { reply, .. }) => assert_eq!(reply, "no\n"),
            other => panic!("expected a rejection, got {:?}", other.err()),
        }
        assert!(!conn.is_connected());
        let mut session = server.session().await;
        assert!(session.ack_closed().await);
        assert!(session.data_closed().await);
    }

    #[tokio::test]
    async fn ack_errors() {
        let server = FakeServer::start("ok\n").await;
        let mut conn = connection(&server);
        conn.connect().await.unwrap();
        let mut session = server.session().await;

        session.send_ack("17").await;
        assert_eq!(conn.get_ack().await.unwrap(), 17);

        session.send_ack("oops").await;
        match conn.get_ack().await {
            Err(ClientError::Protocol(_)) => (),
            other => panic!("expected a protocol error, got {:?}", other),
        }

        drop(session);
        match conn.get_ack().await {
            Err(ClientError::Protocol(_)) => (),
            other => panic!("expected a protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn not_connected() {
        let mut conn = Connection::new("127.0.0.1", 1, None);
        match conn.send_and_ack("a").await {
            Err(ClientError::NotConnected) => (),
            other => panic!("expected NotConnected, got {:?}", other),
        }
        assert!(!conn.disconnect().await);
    }

    #[tokio::test]
    async fn handshake_timeout() {
        let info = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = info.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (sock, _) = info.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(sock);
        });

        let mut conn = Connection::new("127.0.0.1", port, Some(Duration::from_millis(100)));
        match conn.connect().await {
            Err(ClientError::Timeout { stage }) => assert_eq!(stage, "info read"),
            other => panic!("expected a timeout, got {:?}", other),
        }
        assert!(!conn.is_connected());
        server.abort();
    }

    #[tokio::test]
    async fn malformed_info_line() {
        let info = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = info.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = info.accept().await.unwrap();
            sock.write_all(b"localhost 6001\n").await.unwrap();
        });

        let mut conn = Connection::new("127.0.0.1", port, Some(Duration::from_secs(5)));
        match conn.connect().await {
            Err(ClientError::Handshake { reason, .. }) => assert!(reason.contains("6001")),
            other => panic!("expected a handshake error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn info_socket_closed() {
        let info = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = info.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (sock, _) = info.accept().await.unwrap();
            drop(sock);
        });

        let mut conn = Connection::new("127.0.0.1", port, Some(Duration::from_secs(5)));
        match conn.connect().await {
            Err(ClientError::Handshake { reason, .. }) => assert_eq!(reason, "info socket closed"),
            other => panic!("expected a handshake error, got {:?}", other),
        }
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn ack_socket_closed_before_id() {
        let info = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ack = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = info.local_addr().unwrap().port();
        let ack_port = ack.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = info.accept().await.unwrap();
            let line = format!("127.0.0.1 {} {}\n", ack_port, ack_port + 1);
            sock.write_all(line.as_bytes()).await.unwrap();
            let (mut sock, _) = ack.accept().await.unwrap();
            sock.write_all(b"client").await.unwrap();
            drop(sock);
        });

        let mut conn = Connection::new("127.0.0.1", port, Some(Duration::from_secs(5)));
        match conn.connect().await {
            Err(ClientError::Handshake { reason, .. }) => {
                assert_eq!(reason, "ack socket closed before the id")
            }
            other => panic!("expected a handshake error, got {:?}", other),
        }
        assert!(!conn.is_connected());
    }
}
