//! Walker configuration.

/// Environment variable overriding [`WalkerConfig::max_depth`].
pub const MAX_DEPTH_ENV: &str = "QL_MAX_TERM_DEPTH";

/// Limits applied while annotating a term tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Deepest nesting accepted, counted in frames from the root.
    pub max_depth: usize,
}

impl WalkerConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 1024;

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Default configuration with overrides from the environment.
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(MAX_DEPTH_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
        {
            Some(depth) => config.with_max_depth(depth),
            None => config,
        }
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}
