use thiserror::Error;

/// Configuration-time failures, surfaced by `configure`/`begin` and never
/// silently defaulted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("line offset {offset} is outside the accepted range (limit {limit})")]
    InvalidOffset { offset: u32, limit: u32 },

    #[error("line acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("line already configured")]
    AlreadyConfigured,
}

/// Read failures on an already-configured (or never-configured) line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("line not configured")]
    NotConfigured,

    #[error("GPIO read failed: {0}")]
    Io(String),
}

/// Monitor setup misuse, surfaced immediately and never retried
/// automatically
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("line not configured")]
    NotConfigured,

    #[error("no edge callback registered")]
    NoCallback,

    #[error("edge monitor already running")]
    AlreadyRunning,
}
