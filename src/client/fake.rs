//! A scripted Pedro server for tests.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Listens on three local ports and performs one handshake, answering the
/// client's id with a fixed reply.
pub struct FakeServer {
    port: u16,
    data_port: u16,
    task: JoinHandle<Session>,
}

/// The server side of a handshaken client.
pub struct Session {
    pub id: String,
    pub ack: TcpStream,
    pub data: BufReader<TcpStream>,
}

impl FakeServer {
    pub const ID: &'static str = "client7";

    pub async fn start(reply: &'static str) -> FakeServer {
        let info = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ack = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let data = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = info.local_addr().unwrap().port();
        let ack_port = ack.local_addr().unwrap().port();
        let data_port = data.local_addr().unwrap().port();

        let task = tokio::spawn(async move {
            let (mut sock, _) = info.accept().await.unwrap();
            let line = format!("127.0.0.1 {} {}\n", ack_port, data_port);
            sock.write_all(line.as_bytes()).await.unwrap();
            drop(sock);

            let (mut ack, _) = ack.accept().await.unwrap();
            ack.write_all(format!("{}\n", FakeServer::ID).as_bytes())
                .await
                .unwrap();

            let (data, _) = data.accept().await.unwrap();
            let mut data = BufReader::new(data);
            let mut id = String::new();
            data.read_line(&mut id).await.unwrap();
            data.get_mut().write_all(reply.as_bytes()).await.unwrap();

            Session { id, ack, data }
        });

        FakeServer {
            port,
            data_port,
            task,
        }
    }

    /// The info port.
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn data_port(&self) -> u16 {
        self.data_port
    }

    /// Waits for the handshake to finish.
    pub async fn session(self) -> Session {
        self.task.await.unwrap()
    }
}

impl Session {
    /// Reads the next request line, without its newline.
    pub async fn request(&mut self) -> String {
        let mut line = String::new();
        self.data.read_line(&mut line).await.unwrap();
        line.trim_end_matches('\n').to_string()
    }

    pub async fn send_ack(&mut self, ack: &str) {
        let line = format!("{}\n", ack);
        self.ack.write_all(line.as_bytes()).await.unwrap();
    }

    /// Writes raw bytes on the data socket.
    pub async fn push(&mut self, bytes: &[u8]) {
        self.data.get_mut().write_all(bytes).await.unwrap();
        self.data.get_mut().flush().await.unwrap();
    }

    pub async fn ack_closed(&mut self) -> bool {
        let mut buf = [0u8; 16];
        matches!(self.ack.read(&mut buf).await, Ok(0) | Err(_))
    }

    pub async fn data_closed(&mut self) -> bool {
        let mut buf = [0u8; 16];
        matches!(self.data.read(&mut buf).await, Ok(0) | Err(_))
    }
}
