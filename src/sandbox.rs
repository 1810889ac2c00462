use std::fmt;
use std::time::Duration;

use tokio::time::timeout;

use crate::file_analyzer::{FileAnalysis, FileAnalyzer};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug)]
pub enum SandboxError {
    Timeout,
    WorkerFailed(String),
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::Timeout => write!(f, "Sandbox analysis timeout"),
            SandboxError::WorkerFailed(msg) => write!(f, "Sandbox worker failed: {msg}"),
        }
    }
}

impl std::error::Error for SandboxError {}

/// Runs file analysis on a blocking worker under a wall-clock budget.
/// The analyzer itself has no cancellation support; on expiry the handle is
/// dropped and the attempt is reported as failed, mirroring how the caller
/// of an isolated scan treats a silent sandbox.
pub struct SandboxExecutor {
    timeout: Duration,
}

impl Default for SandboxExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl SandboxExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn analyze_file(
        &self,
        data: Vec<u8>,
        file_name: String,
    ) -> Result<FileAnalysis, SandboxError> {
        log::debug!("Sandboxed analysis of {} ({} bytes)", file_name, data.len());
        self.run(move || {
            let analyzer = FileAnalyzer::new();
            analyzer.analyze(&data, &file_name)
        })
        .await
    }

    async fn run<F>(&self, work: F) -> Result<FileAnalysis, SandboxError>
    where
        F: FnOnce() -> FileAnalysis + Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(work);

        match timeout(self.timeout, handle).await {
            Ok(Ok(analysis)) => Ok(analysis),
            Ok(Err(e)) => Err(SandboxError::WorkerFailed(e.to_string())),
            Err(_) => Err(SandboxError::Timeout),
        }
    }
}
