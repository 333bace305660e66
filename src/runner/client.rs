//! Runner configuration

/// Configuration for the process runner
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// Timeout for commands run to completion, in seconds
    ///
    /// `None` waits for the command however long it takes. Detached
    /// processes (the bot itself) are never subject to the timeout.
    pub timeout_secs: Option<u64>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
