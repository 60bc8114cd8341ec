//! Configuration for the Riak gateway

use std::time::Duration;

/// Configuration for Riak HTTP connection and behavior
#[derive(Debug, Clone)]
pub struct RiakConfig {
    /// Hostname or IP of the Riak node
    pub hostname: String,

    /// HTTP port of the Riak node
    pub port: u16,

    /// Use `https` instead of `http`
    pub tls: bool,

    /// Timeout of a single request
    pub request_timeout: Duration,

    /// Timeout for establishing a connection
    pub connect_timeout: Duration,

    /// Page size of secondary index queries (`max_results`), `None` fetches
    /// all keys in one response
    pub page_size: Option<u32>,
}

impl Default for RiakConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 8098,
            tls: false,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            page_size: Some(1000),
        }
    }
}

impl RiakConfig {
    /// Create new config for a node
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
            ..Default::default()
        }
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set index query page size
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Fetch index query results in a single response
    pub fn unpaged(mut self) -> Self {
        self.page_size = None;
        self
    }

    /// Switch to https
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Base URL of the node
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.hostname, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RiakConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:8098");
        assert_eq!(config.page_size, Some(1000));
    }

    #[test]
    fn test_builder() {
        let config = RiakConfig::new("riak.local", 8091)
            .tls(true)
            .page_size(50)
            .request_timeout(Duration::from_secs(2));
        assert_eq!(config.base_url(), "https://riak.local:8091");
        assert_eq!(config.page_size, Some(50));
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert!(config.clone().unpaged().page_size.is_none());
    }
}
