//! Configuration for file sync.

/// Configuration for a sync pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Replay imports in creation order.
    pub sort_imports: bool,
    /// Upper bound on import passes when predecessors arrive late.
    pub max_import_passes: usize,
    /// Write indented JSON.
    pub pretty_json: bool,
}

impl SyncConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether imports are sorted by creation ticks.
    #[must_use]
    pub const fn with_sort_imports(mut self, value: bool) -> Self {
        self.sort_imports = value;
        self
    }

    /// Sets the maximum number of import passes. Zero is treated as one.
    #[must_use]
    pub const fn with_max_import_passes(mut self, passes: usize) -> Self {
        self.max_import_passes = passes;
        self
    }

    /// Sets whether exported JSON is indented.
    #[must_use]
    pub const fn with_pretty_json(mut self, value: bool) -> Self {
        self.pretty_json = value;
        self
    }

    pub(crate) fn import_passes(&self) -> usize {
        self.max_import_passes.max(1)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sort_imports: true,
            max_import_passes: 8,
            pretty_json: true,
        }
    }
}
