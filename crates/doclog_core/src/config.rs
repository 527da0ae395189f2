//! Gateway and store configuration.

/// Configuration for a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Accept DTOs without a `UserId`.
    ///
    /// Meant for the one-time bootstrap write that has no known author.
    pub allow_missing_user_id: bool,

    /// Keep an in-memory [`DocCache`](crate::DocCache) of committed documents.
    pub use_cache: bool,

    /// Number of version notifications kept for polling.
    pub notification_history: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            allow_missing_user_id: false,
            use_cache: false,
            notification_history: 1024,
        }
    }
}

impl GatewayConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether a missing `UserId` is accepted.
    #[must_use]
    pub const fn allow_missing_user_id(mut self, value: bool) -> Self {
        self.allow_missing_user_id = value;
        self
    }

    /// Sets whether the document cache is used.
    #[must_use]
    pub const fn use_cache(mut self, value: bool) -> Self {
        self.use_cache = value;
        self
    }

    /// Sets the notification history size.
    #[must_use]
    pub const fn notification_history(mut self, size: usize) -> Self {
        self.notification_history = size;
        self
    }
}

/// Configuration for opening a [`JournalStore`](crate::JournalStore).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether to create the store directory if it doesn't exist.
    pub create_if_missing: bool,

    /// Whether to sync the journal to disk on every commit.
    pub sync_on_commit: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the store if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets whether to sync the journal on every commit.
    #[must_use]
    pub const fn sync_on_commit(mut self, value: bool) -> Self {
        self.sync_on_commit = value;
        self
    }
}
