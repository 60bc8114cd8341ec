//! Backend configuration

use serde::Deserialize;
use std::time::Duration;

use tagcache_core::{CacheError, Result, ZeroLifetime};

/// Configuration of a [`TaggedExpiringCacheBackend`](crate::TaggedExpiringCacheBackend)
///
/// Deserializes from the option map a host application injects:
///
/// ```json
/// { "hostname": "127.0.0.1", "port": 8098, "bucketName": "pages" }
/// ```
///
/// Unknown options are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BackendOptions {
    /// Store network address
    pub hostname: String,
    /// Store network port
    pub port: u16,
    /// Bucket holding the entries of this cache
    pub bucket_name: String,
    /// Lifetime in seconds applied when `set` is called without one
    pub default_lifetime: Option<u64>,
    /// Meaning of an explicit zero lifetime
    pub zero_lifetime: ZeroLifetime,
    /// Let `has` drop expired entries like `get` does
    pub check_expiry_on_has: bool,
    /// Maximum concurrent deletions within one bulk operation
    pub delete_concurrency: usize,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 8098,
            bucket_name: "tagcache".to_string(),
            default_lifetime: None,
            zero_lifetime: ZeroLifetime::Unlimited,
            check_expiry_on_has: true,
            delete_concurrency: 8,
        }
    }
}

impl BackendOptions {
    /// Create options for a bucket
    pub fn with_bucket(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            ..Default::default()
        }
    }

    /// Parse a host-supplied option map
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let options: Self = serde_json::from_value(value)
            .map_err(|e| CacheError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Check option values
    pub fn validate(&self) -> Result<()> {
        if self.bucket_name.is_empty() {
            return Err(CacheError::Config("bucketName must not be empty".to_string()));
        }
        if self.hostname.is_empty() {
            return Err(CacheError::Config("hostname must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(CacheError::Config("port must not be 0".to_string()));
        }
        if self.delete_concurrency == 0 {
            return Err(CacheError::Config(
                "deleteConcurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the store address
    pub fn address(mut self, hostname: impl Into<String>, port: u16) -> Self {
        self.hostname = hostname.into();
        self.port = port;
        self
    }

    /// Set the default lifetime
    pub fn with_default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = Some(lifetime.as_secs());
        self
    }

    /// Set the zero-lifetime policy
    pub fn zero_lifetime(mut self, policy: ZeroLifetime) -> Self {
        self.zero_lifetime = policy;
        self
    }

    /// Only check existence in `has`, ignoring expiration
    pub fn legacy_has(mut self) -> Self {
        self.check_expiry_on_has = false;
        self
    }

    /// Set bulk deletion concurrency
    pub fn delete_concurrency(mut self, concurrency: usize) -> Self {
        self.delete_concurrency = concurrency;
        self
    }

    /// Default lifetime as a duration
    pub fn default_lifetime_duration(&self) -> Option<Duration> {
        self.default_lifetime.map(Duration::from_secs)
    }

    /// Riak gateway configuration for the store address
    #[cfg(feature = "riak")]
    pub fn riak_config(&self) -> tagcache_storage::RiakConfig {
        tagcache_storage::RiakConfig::new(self.hostname.clone(), self.port)
    }
}
