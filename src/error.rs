use std::fmt::{self, Debug, Display};
use std::io;

use crate::agent::AgentId;

/// Provides `SirvError` and maps to other errors to
/// convert to an `SirvError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SirvError {
    /// Invalid construction parameters. The simulation never starts.
    ConfigurationError(String),
    /// A placement or move targeted a cell outside a bounded grid.
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },
    /// A grid operation referred to an agent that has no cell.
    UnknownAgent(AgentId),
    IoError(io::Error),
    JsonError(serde_json::Error),
    SirvError(String),
}

impl From<io::Error> for SirvError {
    fn from(error: io::Error) -> Self {
        SirvError::IoError(error)
    }
}

impl From<serde_json::Error> for SirvError {
    fn from(error: serde_json::Error) -> Self {
        SirvError::JsonError(error)
    }
}

impl From<String> for SirvError {
    fn from(error: String) -> Self {
        SirvError::SirvError(error)
    }
}

impl From<&str> for SirvError {
    fn from(error: &str) -> Self {
        SirvError::SirvError(error.to_string())
    }
}

impl std::error::Error for SirvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SirvError::IoError(error) => Some(error),
            SirvError::JsonError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SirvError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SirvError::ConfigurationError(message) => {
                write!(f, "Configuration error: {message}")
            }
            SirvError::OutOfBounds {
                x,
                y,
                width,
                height,
            } => write!(
                f,
                "Position ({x}, {y}) is outside the {width}x{height} grid"
            ),
            SirvError::UnknownAgent(agent_id) => {
                write!(f, "Agent {agent_id} is not placed on the grid")
            }
            SirvError::IoError(error) => write!(f, "I/O error: {error}"),
            SirvError::JsonError(error) => write!(f, "JSON error: {error}"),
            SirvError::SirvError(message) => write!(f, "Error: {message}"),
        }
    }
}
