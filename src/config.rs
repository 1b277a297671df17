//! Client configuration, from a file and the environment.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Client configuration. File: ~/.config/pedro/client.toml or
/// /etc/pedro/client.toml. Env overrides: PEDRO_HOST, PEDRO_PORT,
/// PEDRO_LOCAL_IP, PEDRO_TIMEOUT_MS.
#[derive(Debug)]
#[derive(Clone)]
#[derive(PartialEq, Eq)]
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Host of the Pedro server (default localhost).
    #[serde(default = "default_host")]
    pub host: String,
    /// Info port of the Pedro server (default 4550).
    #[serde(default = "default_port")]
    pub port: u16,
    /// This machine's IP, used to address p2p messages (default 127.0.0.1).
    #[serde(default = "default_local_ip")]
    pub local_ip: String,
    /// Bound on handshake and ack reads. None blocks indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    4550
}
fn default_local_ip() -> String {
    "127.0.0.1".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            local_ip: default_local_ip(),
            timeout_ms: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Applies overrides from `var`, a lookup of environment variables.
    fn override_with<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(s) = var("PEDRO_HOST") {
            self.host = s;
        }
        if let Some(s) = var("PEDRO_PORT") {
            match s.parse::<u16>() {
                Ok(p) => self.port = p,
                Err(_) => log::warn!("Ignoring PEDRO_PORT={:?}", s),
            }
        }
        if let Some(s) = var("PEDRO_LOCAL_IP") {
            self.local_ip = s;
        }
        if let Some(s) = var("PEDRO_TIMEOUT_MS") {
            match s.parse::<u64>() {
                Ok(ms) => self.timeout_ms = Some(ms),
                Err(_) => log::warn!("Ignoring PEDRO_TIMEOUT_MS={:?}", s),
            }
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> ClientConfig {
    let mut c = load_file().unwrap_or_default();
    c.override_with(|name| std::env::var(name).ok());
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/pedro/client.toml"));
    }
    out.push(PathBuf::from("/etc/pedro/client.toml"));
    out
}

fn load_file() -> Option<ClientConfig> {
    for p in config_paths() {
        if p.exists() {
            match std::fs::read_to_string(&p) {
                Ok(s) => match toml::from_str::<ClientConfig>(&s) {
                    Ok(c) => {
                        log::debug!("Loaded config from {}", p.display());
                        return Some(c);
                    }
                    Err(e) => log::warn!("Ignoring {}: {}", p.display(), e),
                },
                Err(e) => log::warn!("Cannot read {}: {}", p.display(), e),
            }
            break;
        }
    }
    None
}

// Tests
// --------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.host, "localhost");
        assert_eq!(c.port, 4550);
        assert_eq!(c.local_ip, "127.0.0.1");
        assert_eq!(c.timeout(), None);
    }

    #[test]
    fn partial_file() {
        let c: ClientConfig = toml::from_str("host = \"pedro.lan\"\ntimeout_ms = 250\n").unwrap();
        assert_eq!(c.host, "pedro.lan");
        assert_eq!(c.port, 4550);
        assert_eq!(c.timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<ClientConfig>("hots = \"x\"\n").is_err());
    }

    #[test]
    fn env_overrides() {
        let env: HashMap<&str, &str> = vec![
            ("PEDRO_PORT", "4551"),
            ("PEDRO_LOCAL_IP", "10.0.0.5"),
            ("PEDRO_TIMEOUT_MS", "soon"),
        ]
        .into_iter()
        .collect();
        let mut c = ClientConfig::default();
        c.override_with(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(c.host, "localhost");
        assert_eq!(c.port, 4551);
        assert_eq!(c.local_ip, "10.0.0.5");
        assert_eq!(c.timeout_ms, None);
    }
}
