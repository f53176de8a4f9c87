//! Evaluation and compilation settings.

use ql_walker::WalkerConfig;

/// Environment variable overriding [`EvalConfig::max_call_depth`].
pub const MAX_CALL_DEPTH_ENV: &str = "QL_MAX_CALL_DEPTH";

/// Limits applied by [`ScopedEnv`](crate::ScopedEnv) while a query runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvalConfig {
    /// Deepest nesting of term-function invocations.
    pub max_call_depth: usize,
}

impl EvalConfig {
    pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

    #[must_use]
    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    /// Default configuration with overrides from the environment.
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(MAX_CALL_DEPTH_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
        {
            Some(depth) => config.with_max_call_depth(depth),
            None => config,
        }
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: Self::DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// Options for [`compile_with`](crate::compile_with).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub walker: WalkerConfig,
}

impl CompileOptions {
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    pub fn from_env() -> Self {
        Self {
            walker: WalkerConfig::from_env(),
        }
    }
}
