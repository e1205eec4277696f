//! Error handling for the host_pulse telemetry engine.

/// A specialized `Result` type for host_pulse operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// The main error type for raw counter reads and engine setup.
///
/// Collectors never surface these to observers; a failed read becomes the
/// collector's fallback or "unavailable" reading for that tick.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Kernel statistics could not be parsed
    #[error("Failed to parse counters: {0}")]
    Parse(String),

    /// The requested resource is not reported by this host
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic system error
    #[error("System error: {0}")]
    System(String),
}

impl TelemetryError {
    /// Create a new parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a new unavailable error
    pub fn unavailable_error(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new generic system error
    pub fn system_error(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }
}
