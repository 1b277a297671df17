//! Command-line front end for the Pedro client.
//!
//! Parses terms, sends notifications and p2p messages, and follows
//! subscriptions. Connection settings come from the config file and the
//! environment (see [`config::load`]) and can be overridden by flags.
//!
//! [`config::load`]: pedro_client::config::load

use clap::{Parser as ClapParser, Subcommand};
use pedro_client::client::{ClientError, Notification, PedroClient};
use pedro_client::config::{self, ClientConfig};
use pedro_client::syntax;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Host of the Pedro server
    #[arg(long, global = true)]
    host: Option<String>,
    /// Info port of the Pedro server
    #[arg(long, global = true)]
    port: Option<u16>,
    /// IP of this machine, for p2p addresses
    #[arg(long, global = true)]
    local_ip: Option<String>,
    /// Command
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parses a term and prints its canonical form
    Parse {
        text: String,
    },
    /// Sends a notification and prints the ack
    Notify {
        term: String,
    },
    /// Subscribes and prints notifications until Ctrl-C
    Subscribe {
        term: String,
        /// Goal the notification must satisfy
        #[arg(short, long, default_value = "true")]
        goal: String,
        /// Rock the server tags notifications with
        #[arg(short, long, default_value_t = 0)]
        rock: i64,
    },
    /// Registers as NAME and sends a p2p message to TO
    Send {
        name: String,
        to: String,
        term: String,
    },
}

impl Args {
    fn config(&self) -> ClientConfig {
        let mut cfg = config::load();
        if let Some(ref host) = self.host {
            cfg.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
        if let Some(ref ip) = self.local_ip {
            cfg.local_ip = ip.clone();
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    let cfg = args.config();

    match args.command {
        Commands::Parse { text } => match syntax::parse(&text) {
            Ok(term) => println!("{}", term),
            Err(e) => {
                eprintln!("{}", text);
                eprintln!("{:>width$}", "^", width = e.pos() + 1);
                return Err(e.into());
            }
        },

        Commands::Notify { term } => {
            let mut client = PedroClient::new(&cfg, |_| ());
            client.connect().await?;
            let ack = client.notify(&term).await;
            client.disconnect().await;
            println!("{}", ack?);
        }

        Commands::Subscribe { term, goal, rock } => {
            let mut client = PedroClient::new(&cfg, print_notification);
            client.connect().await?;
            let id = client.subscribe_with(&term, &goal, rock).await?;
            if id == 0 {
                client.disconnect().await;
                return Err("subscription refused".into());
            }
            log::info!("Subscribed with id {}", id);
            tokio::signal::ctrl_c().await?;
            client.unsubscribe(id).await?;
            client.disconnect().await;
        }

        Commands::Send { name, to, term } => {
            let mut client = PedroClient::new(&cfg, print_notification);
            client.connect().await?;
            let res = send(&mut client, &name, &to, &term).await;
            client.disconnect().await;
            println!("{}", res?);
        }
    }

    Ok(())
}

async fn send(client: &mut PedroClient, name: &str, to: &str, term: &str) -> Result<i64, ClientError> {
    if client.register(name).await? == 0 {
        log::warn!("Registration of {} refused", name);
        return Ok(0);
    }
    let ack = client.p2p(to, term).await?;
    client.deregister().await?;
    Ok(ack)
}

fn print_notification(n: Notification) {
    match n.term() {
        Some(term) => println!("[{}] {}", n.rock, term),
        None => println!("[{}] {} (unparsed)", n.rock, n.message),
    }
}
