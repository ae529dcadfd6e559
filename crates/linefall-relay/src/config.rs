use std::net::{IpAddr, SocketAddr};

use clap::Parser;

/// Relay server options, overridable from the environment.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct RelayConfig {
    /// Address to listen on
    #[arg(long, env = "LINEFALL_ADDR", default_value = "127.0.0.1")]
    pub addr: IpAddr,
    /// Port to listen on
    #[arg(long, env = "LINEFALL_PORT", default_value_t = 8080)]
    pub port: u16,
}

impl RelayConfig {
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_localhost() {
        let config = RelayConfig::parse_from(["linefall-relay"]);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn flags_override_defaults() {
        let config =
            RelayConfig::parse_from(["linefall-relay", "--addr", "0.0.0.0", "--port", "9000"]);
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:9000");
    }
}
