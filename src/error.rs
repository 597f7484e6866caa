// src/error.rs - Errors surfaced to the caller of a send operation
use crate::config::ConfigError;
use crate::hardware::transport::TransportError;
use crate::motion::shaper::ShapingError;
use crate::motion::trajectory::TrajectoryError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Select a torque shaping function")]
    MissingShaping,
    #[error("Select a transport mode (write_only, read_only or write_then_read)")]
    MissingMode,
    #[error(transparent)]
    Shaping(#[from] ShapingError),
    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("A send operation is already in progress")]
    Busy,
}

/// Coarse grouping used when reporting an error to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any I/O.
    Configuration,
    /// Port could not be opened or failed mid-operation.
    Connection,
    /// A reply was short, late or malformed.
    Decode,
    Busy,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorCategory::Configuration => "configuration error",
            ErrorCategory::Connection => "connection error",
            ErrorCategory::Decode => "decode error",
            ErrorCategory::Busy => "busy",
        })
    }
}

impl DriverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DriverError::MissingShaping
            | DriverError::MissingMode
            | DriverError::Shaping(_)
            | DriverError::Trajectory(_)
            | DriverError::Config(_) => ErrorCategory::Configuration,
            DriverError::Transport(e) if e.is_connection() => ErrorCategory::Connection,
            DriverError::Transport(_) => ErrorCategory::Decode,
            DriverError::Busy => ErrorCategory::Busy,
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
