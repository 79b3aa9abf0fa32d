// Copyright 2024 Gossip Overlay Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration loading (§6, §10.3): INI on disk, a typed
//! [`GossipConfig`] the rest of the crate consumes.

use std::collections::HashMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

use log::info;

use crate::error::GossipError;
use crate::wire::PeerAddr;

/// An unresolved `host:port` pair, as found in the `[gossip]` section.
/// Kept unresolved at parse time since `bootstrapper` may legitimately be a
/// bare hostname (§6) — resolution happens lazily via
/// [`HostPort::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    pub host: String,
    pub port: u16,
}

impl HostPort {
    /// Mirrors the original `parse_address`: strip `[`/`]` (so bracketed
    /// IPv6 literals parse), split on the last `:`, and require a numeric
    /// port.
    pub fn parse(raw: &str) -> Result<Self, GossipError> {
        let stripped: String = raw.chars().filter(|c| *c != '[' && *c != ']').collect();
        let (host, port) = stripped
            .rsplit_once(':')
            .ok_or_else(|| GossipError::Config(format!("'{raw}' is not a host:port pair")))?;
        let port: u16 = port
            .parse()
            .map_err(|_| GossipError::Config(format!("'{raw}' has a non-numeric port")))?;
        Ok(Self { host: host.to_string(), port })
    }

    pub async fn resolve(&self) -> Result<SocketAddr, GossipError> {
        let query = format!("{}:{}", self.host, self.port);
        tokio::net::lookup_host(&query)
            .await
            .map_err(|e| GossipError::Config(format!("failed to resolve '{query}': {e}")))?
            .next()
            .ok_or_else(|| GossipError::Config(format!("'{query}' resolved to no addresses")))
    }

    /// Synchronous resolution for addresses that are already numeric
    /// (`p2p_address`/`api_address` are bound directly, so they do not need
    /// the async DNS path `bootstrapper` does).
    pub fn resolve_sync(&self) -> Result<SocketAddr, GossipError> {
        format!("{}:{}", self.host, self.port)
            .to_socket_addrs()
            .map_err(|e| GossipError::Config(format!("failed to resolve '{}:{}': {e}", self.host, self.port)))?
            .next()
            .ok_or_else(|| GossipError::Config(format!("'{}:{}' resolved to no addresses", self.host, self.port)))
    }
}

/// Typed, validated view of the configuration file.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    pub bootstrapper: HostPort,
    pub p2p_address: SocketAddr,
    pub api_address: SocketAddr,
    pub degree: usize,
    /// The `[hostkey]` section, passed through opaque — not interpreted by
    /// the core (cryptographic peer authentication is out of scope).
    pub hostkey: HashMap<String, String>,
    /// `[gossip]` keys beyond the four consumed ones, passed through
    /// unchanged.
    pub extra: HashMap<String, String>,
}

impl GossipConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GossipError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(GossipError::Config(format!("configuration file {} doesn't exist", path.display())));
        }

        info!("reading configuration file {}", path.display());
        let text = std::fs::read_to_string(path)?;
        let ini = ini::Ini::load_from_str(&text)
            .map_err(|e| GossipError::Config(format!("failed to parse {}: {e}", path.display())))?;

        let hostkey = ini
            .section(Some("hostkey"))
            .map(|s| s.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
            .unwrap_or_default();

        let gossip = ini
            .section(Some("gossip"))
            .ok_or_else(|| GossipError::Config("missing [gossip] section".to_string()))?;

        let get = |key: &str| -> Result<String, GossipError> {
            gossip
                .get(key)
                .map(|v| v.to_string())
                .ok_or_else(|| GossipError::Config(format!("missing gossip.{key}")))
        };

        let bootstrapper = HostPort::parse(&get("bootstrapper")?)?;
        let p2p_address = HostPort::parse(&get("p2p_address")?)?.resolve_sync()?;
        let api_address = HostPort::parse(&get("api_address")?)?.resolve_sync()?;
        let degree: usize = get("degree")?
            .parse()
            .map_err(|_| GossipError::Config("gossip.degree must be a positive integer".to_string()))?;
        if degree == 0 {
            return Err(GossipError::Config("gossip.degree must be positive".to_string()));
        }

        let consumed = ["bootstrapper", "p2p_address", "api_address", "degree"];
        let extra = gossip
            .iter()
            .filter(|(k, _)| !consumed.contains(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let config = Self { bootstrapper, p2p_address, api_address, degree, hostkey, extra };
        info!("configuration is: {config:?}");
        Ok(config)
    }

    /// This node's own advertisable P2P service-address. The wire format
    /// is IPv4-only (§4.1); an IPv6 `p2p_address` is a valid bind target
    /// but cannot be advertised, and is rejected here rather than silently
    /// truncated (§13 open-question resolution).
    pub fn p2p_service_address(&self) -> Result<PeerAddr, GossipError> {
        match self.p2p_address.ip() {
            std::net::IpAddr::V4(ip) => Ok(PeerAddr::new(ip, self.p2p_address.port())),
            std::net::IpAddr::V6(_) => Err(GossipError::Config(
                "p2p_address must be IPv4 to be advertised over the P2P wire format".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_port_parses_bracketed_ipv6() {
        let hp = HostPort::parse("[::1]:9000").unwrap();
        assert_eq!(hp.host, "::1");
        assert_eq!(hp.port, 9000);
    }

    #[test]
    fn host_port_parses_ipv4() {
        let hp = HostPort::parse("127.0.0.1:9000").unwrap();
        assert_eq!(hp.host, "127.0.0.1");
        assert_eq!(hp.port, 9000);
    }

    #[test]
    fn host_port_rejects_missing_port() {
        assert!(HostPort::parse("127.0.0.1").is_err());
    }

    #[test]
    fn load_rejects_missing_file() {
        let err = GossipConfig::load("/nonexistent/path/config.ini").unwrap_err();
        assert!(matches!(err, GossipError::Config(_)));
    }

    #[test]
    fn load_parses_a_minimal_file() {
        let dir = std::env::temp_dir().join(format!("gossipd-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.ini");
        std::fs::write(
            &path,
            "[hostkey]\nkey = deadbeef\n\n[gossip]\nbootstrapper = 127.0.0.1:9001\np2p_address = 127.0.0.1:9002\napi_address = 127.0.0.1:9003\ndegree = 4\nextra_key = extra_value\n",
        )
        .unwrap();

        let config = GossipConfig::load(&path).unwrap();
        assert_eq!(config.degree, 4);
        assert_eq!(config.bootstrapper, HostPort { host: "127.0.0.1".to_string(), port: 9001 });
        assert_eq!(config.hostkey.get("key").map(String::as_str), Some("deadbeef"));
        assert_eq!(config.extra.get("extra_key").map(String::as_str), Some("extra_value"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
