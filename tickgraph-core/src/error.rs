//! Engine Errors
//!
//! Every fallible operation in the crate returns [`Result`]. Structural
//! anomalies inside a network are not errors: the builder flags the offending
//! module as broken and keeps going. The variants below cover the cases that
//! are programmer or contract errors at an API boundary.

use thiserror::Error;

use crate::graph::{ModuleId, PortRole};

/// Errors produced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A port index outside `0..PORT_COUNT` was supplied.
    #[error("port index {port} is out of range [0, 3]")]
    PortOutOfRange { port: usize },

    /// The handle does not refer to a module in the network.
    #[error("module {0} does not exist in the network")]
    UnknownModule(ModuleId),

    /// The port's role does not allow the requested connection.
    #[error("port {port} of module {module} has role {role:?} and cannot take this connection")]
    PortNotConnectable {
        module: ModuleId,
        port: usize,
        role: PortRole,
    },

    /// The port already holds a neighbor.
    #[error("port {port} of module {module} is already connected")]
    PortOccupied { module: ModuleId, port: usize },

    /// A module read an input that nobody pushed this tick.
    #[error("module {module} requested input {index} but only {available} arrived this tick")]
    MissingInput {
        module: ModuleId,
        index: usize,
        available: usize,
    },

    /// A module pushed a different number of values than it has output ports.
    #[error("module {module} pushed {got} outputs but declares {expected} output ports")]
    OutputCountMismatch {
        module: ModuleId,
        expected: usize,
        got: usize,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be parsed.
    #[error("failed to parse configuration")]
    Config(#[from] serde_json::Error),

    /// The tracing subscriber could not be installed.
    #[error("failed to initialise tracing: {0}")]
    Telemetry(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_module_and_port() {
        let err = EngineError::PortOccupied {
            module: ModuleId::from(7),
            port: 2,
        };
        assert_eq!(err.to_string(), "port 2 of module m7 is already connected");

        let err = EngineError::MissingInput {
            module: ModuleId::from(3),
            index: 1,
            available: 0,
        };
        assert!(err.to_string().contains("input 1"));
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("nope");
        let err: EngineError = parse.unwrap_err().into();
        assert!(matches!(err, EngineError::Config(_)));
    }
}
