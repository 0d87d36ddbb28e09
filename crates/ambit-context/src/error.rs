use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("no tokio runtime available for deferred work")]
    NoRuntime,

    #[error("{pending} deferred task(s) still running after {timeout_ms}ms")]
    DrainTimeout { pending: usize, timeout_ms: u64 },
}
