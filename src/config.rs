// ABOUTME: Endpoint, credential, addressing and sizing configuration for an SMPP gateway
// ABOUTME: Deserializable with serde defaults so it can be embedded in an application config file

use crate::datatypes::{Alphabet, DataCoding, MessageClass, NumericPlanIndicator, TypeOfNumber};
use crate::error::GatewayError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;

/// Configuration of one SMSC endpoint.
///
/// ```rust
/// use smpp_gateway::config::EndpointConfig;
///
/// let config = EndpointConfig::new("smpp://smsc.example.com:2775", "system_id", "secret")
///     .with_connections(4)
///     .with_threads(0);
/// assert_eq!(config.threads(), 1);
/// assert_eq!(config.pool_settings().maximum, 4);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// `scheme://host:port` of the SMSC
    pub url: String,
    /// system_id used when binding
    pub username: String,
    pub password: String,
    pub system_type: String,
    pub source_ton: TypeOfNumber,
    pub source_npi: NumericPlanIndicator,
    pub destination_ton: TypeOfNumber,
    pub destination_npi: NumericPlanIndicator,
    /// Addresses served by this ESME, empty matches any
    pub address_range: String,
    pub alphabet: Alphabet,
    pub message_class: Option<MessageClass>,
    /// Number of pooled sessions
    pub connections: usize,
    /// Concurrent inbound callback workers per session
    pub threads: usize,
    /// TCP connect timeout, also used as the enquire_link interval
    #[serde(deserialize_with = "seconds")]
    pub connection_timeout: Duration,
    /// Upper bound on every request/response exchange
    #[serde(deserialize_with = "seconds")]
    pub request_timeout: Duration,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: String::new(),
            password: String::new(),
            system_type: String::new(),
            source_ton: TypeOfNumber::International,
            source_npi: NumericPlanIndicator::Isdn,
            destination_ton: TypeOfNumber::International,
            destination_npi: NumericPlanIndicator::Isdn,
            address_range: String::new(),
            alphabet: Alphabet::Default,
            message_class: None,
            connections: 1,
            threads: 1,
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl EndpointConfig {
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            username: username.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_source_addressing(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_ton = ton;
        self.source_npi = npi;
        self
    }

    pub fn with_destination_addressing(
        mut self,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
    ) -> Self {
        self.destination_ton = ton;
        self.destination_npi = npi;
        self
    }

    pub fn with_address_range(mut self, address_range: impl Into<String>) -> Self {
        self.address_range = address_range.into();
        self
    }

    pub fn with_data_coding(mut self, alphabet: Alphabet, message_class: Option<MessageClass>) -> Self {
        self.alphabet = alphabet;
        self.message_class = message_class;
        self
    }

    pub fn with_connections(mut self, connections: usize) -> Self {
        self.connections = connections;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Inbound concurrency degree, never below one
    pub fn threads(&self) -> usize {
        self.threads.max(1)
    }

    pub fn data_coding(&self) -> DataCoding {
        DataCoding::general(self.alphabet, self.message_class)
    }

    /// Fixed pool sizing derived from `connections`
    pub fn pool_settings(&self) -> PoolSettings {
        let size = self.connections.max(1);
        PoolSettings {
            minimum: size,
            maximum: size,
            idle_timeout: Duration::ZERO,
        }
    }

    /// Check the values needed before the first session is opened.
    pub fn validate(&self) -> Result<Endpoint, GatewayError> {
        if self.url.is_empty() {
            return Err(GatewayError::configuration("URL must be configured"));
        }
        let endpoint = Endpoint::parse(&self.url)?;
        if self.username.is_empty() {
            return Err(GatewayError::configuration("user name must be configured"));
        }
        if self.password.is_empty() {
            return Err(GatewayError::configuration("password must be configured"));
        }
        Ok(endpoint)
    }
}

/// Sizing handed to the session pool. Minimum and maximum are equal and idle
/// sessions are never evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub minimum: usize,
    pub maximum: usize,
    pub idle_timeout: Duration,
}

/// Parsed `scheme://host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn parse(url: &str) -> Result<Self, GatewayError> {
        let invalid = |reason: &str| {
            GatewayError::configuration(format!("failed to parse URL {url:?}: {reason}"))
        };

        let (scheme, rest) = url.split_once("://").ok_or_else(|| invalid("missing scheme"))?;
        let scheme_ok = scheme
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(invalid("bad scheme"));
        }

        let authority = rest.strip_suffix('/').unwrap_or(rest);
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() || host.contains(['/', '@', '[', ']']) {
            return Err(invalid("bad host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("bad port"))?;

        Ok(Endpoint {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_string(),
            port,
        })
    }

    /// `host:port` form accepted by `TcpStream::connect`
    pub fn socket_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.socket_addr())
    }
}

fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_secs)
}
