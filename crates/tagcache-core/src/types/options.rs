//! Entry options and builder

use std::time::Duration;

/// Options for writing a cache entry
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    /// Tags for group invalidation
    pub tags: Vec<String>,
    /// Lifetime of the entry; `None` falls back to the backend default
    pub lifetime: Option<Duration>,
}

/// Builder for EntryOptions with fluent API
#[derive(Debug, Clone, Default)]
pub struct EntryOpts(EntryOptions);

impl EntryOpts {
    /// Create new options builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set lifetime
    pub fn lifetime(mut self, duration: Duration) -> Self {
        self.0.lifetime = Some(duration);
        self
    }

    /// Set lifetime in seconds
    pub fn lifetime_secs(self, seconds: u64) -> Self {
        self.lifetime(Duration::from_secs(seconds))
    }

    /// Set lifetime in minutes
    pub fn lifetime_mins(self, minutes: u64) -> Self {
        self.lifetime(Duration::from_secs(minutes.saturating_mul(60)))
    }

    /// Explicit zero lifetime, interpreted by the backend's `ZeroLifetime` policy
    pub fn zero_lifetime(self) -> Self {
        self.lifetime(Duration::ZERO)
    }

    /// Add multiple tags
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add a single tag
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.0.tags.push(tag.into());
        self
    }

    /// Build the options
    pub fn build(self) -> EntryOptions {
        self.0
    }
}

impl From<EntryOpts> for EntryOptions {
    fn from(opts: EntryOpts) -> Self {
        opts.0
    }
}

impl From<Duration> for EntryOptions {
    fn from(lifetime: Duration) -> Self {
        EntryOptions {
            lifetime: Some(lifetime),
            ..Default::default()
        }
    }
}
