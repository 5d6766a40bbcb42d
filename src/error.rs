//! Comprehensive error handling for the Embercraft simulation core
//!
//! This module provides a unified error type so hot paths never panic:
//! configuration mistakes are rejected at the call site, client misbehavior
//! maps to protocol violations, and invariant breaches stay distinguishable
//! from both.

use std::error::Error as StdError;
use std::fmt;

/// Main error type for the simulation core
#[derive(Debug)]
pub enum SimError {
    // Registry errors
    UnknownType {
        kind: &'static str,
        identifier: String,
    },
    UnknownNetworkId {
        kind: &'static str,
        network_id: i32,
    },
    DuplicateType {
        kind: &'static str,
        identifier: String,
    },

    // Compound store errors
    TagDecode {
        reason: String,
    },
    WrongTagType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    MalformedDefinition {
        identifier: String,
        reason: String,
    },

    // Container errors
    SlotOutOfBounds {
        slot: usize,
        size: usize,
    },
    ContainerMissing {
        owner: String,
        name: String,
    },

    // Component errors
    ComponentMissing {
        owner: String,
        identifier: String,
    },
    ComponentState {
        identifier: String,
        reason: String,
    },

    // World errors
    EntityNotFound {
        runtime_id: u64,
    },
    EntityNotPlayer {
        runtime_id: u64,
    },
    PlayerNotFound {
        session: u64,
    },
    BlockOutOfBounds {
        pos: (i32, i32, i32),
    },

    // Network errors
    ProtocolViolation {
        message: String,
    },
    SessionNotFound {
        session: u64,
    },
    ChannelClosed {
        name: String,
    },

    // Configuration Errors
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },
    MissingConfig {
        field: String,
    },

    // System Errors
    IoError {
        path: String,
        error: String,
    },
    Utf8Error {
        context: String,
    },
    ParseError {
        value: String,
        expected_type: String,
    },

    // Generic fallback for unexpected errors
    Internal {
        message: String,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::UnknownType { kind, identifier } => {
                write!(f, "Unknown {} type: {}", kind, identifier)
            }
            SimError::UnknownNetworkId { kind, network_id } => {
                write!(f, "Unknown {} network id: {}", kind, network_id)
            }
            SimError::DuplicateType { kind, identifier } => {
                write!(f, "Duplicate {} type registration: {}", kind, identifier)
            }

            SimError::TagDecode { reason } => write!(f, "Tag decode failed: {}", reason),
            SimError::WrongTagType {
                key,
                expected,
                found,
            } => write!(
                f,
                "Wrong tag type for '{}': expected {}, found {}",
                key, expected, found
            ),
            SimError::MalformedDefinition { identifier, reason } => {
                write!(f, "Malformed definition for {}: {}", identifier, reason)
            }

            SimError::SlotOutOfBounds { slot, size } => write!(
                f,
                "Container slot out of bounds: slot {} >= size {}",
                slot, size
            ),
            SimError::ContainerMissing { owner, name } => {
                write!(f, "Container '{}' missing on {}", name, owner)
            }

            SimError::ComponentMissing { owner, identifier } => {
                write!(f, "Component '{}' missing on {}", identifier, owner)
            }
            SimError::ComponentState { identifier, reason } => {
                write!(f, "Component '{}' state error: {}", identifier, reason)
            }

            SimError::EntityNotFound { runtime_id } => {
                write!(f, "Entity not found: runtime id {}", runtime_id)
            }
            SimError::EntityNotPlayer { runtime_id } => {
                write!(f, "Entity with runtime id {} is not a player", runtime_id)
            }
            SimError::PlayerNotFound { session } => {
                write!(f, "Player not found for session {}", session)
            }
            SimError::BlockOutOfBounds { pos } => {
                write!(f, "Block position {:?} out of bounds", pos)
            }

            SimError::ProtocolViolation { message } => {
                write!(f, "Protocol violation: {}", message)
            }
            SimError::SessionNotFound { session } => write!(f, "Session not found: {}", session),
            SimError::ChannelClosed { name } => write!(f, "Channel closed: {}", name),

            SimError::InvalidConfig {
                field,
                value,
                reason,
            } => write!(f, "Invalid config: {} = {} ({})", field, value, reason),
            SimError::MissingConfig { field } => write!(f, "Missing required config: {}", field),

            SimError::IoError { path, error } => write!(f, "IO error for {}: {}", path, error),
            SimError::Utf8Error { context } => write!(f, "UTF-8 error in {}", context),
            SimError::ParseError {
                value,
                expected_type,
            } => write!(
                f,
                "Parse error: '{}' is not a valid {}",
                value, expected_type
            ),

            SimError::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl StdError for SimError {}

/// Type alias for Results in the simulation core
pub type SimResult<T> = Result<T, SimError>;

// Conversion traits for common error types

impl From<std::io::Error> for SimError {
    fn from(error: std::io::Error) -> Self {
        SimError::IoError {
            path: String::new(),
            error: error.to_string(),
        }
    }
}

impl From<std::str::Utf8Error> for SimError {
    fn from(_: std::str::Utf8Error) -> Self {
        SimError::Utf8Error {
            context: "unknown".to_string(),
        }
    }
}

impl From<std::string::FromUtf8Error> for SimError {
    fn from(_: std::string::FromUtf8Error) -> Self {
        SimError::Utf8Error {
            context: "unknown".to_string(),
        }
    }
}

impl<T> From<crossbeam_channel::SendError<T>> for SimError {
    fn from(_: crossbeam_channel::SendError<T>) -> Self {
        SimError::ChannelClosed {
            name: "crossbeam".to_string(),
        }
    }
}

impl From<crossbeam_channel::RecvError> for SimError {
    fn from(_: crossbeam_channel::RecvError) -> Self {
        SimError::ChannelClosed {
            name: "crossbeam".to_string(),
        }
    }
}

impl From<crate::nbt::NbtError> for SimError {
    fn from(err: crate::nbt::NbtError) -> Self {
        use crate::nbt::NbtError;
        match err {
            NbtError::UnknownTagType(id) => SimError::TagDecode {
                reason: format!("unknown tag type {}", id),
            },
            NbtError::UnexpectedEof { expected } => SimError::TagDecode {
                reason: format!("unexpected end of data, expected {} more bytes", expected),
            },
            NbtError::InvalidRoot(found) => SimError::TagDecode {
                reason: format!("root tag must be a compound, found {}", found),
            },
            NbtError::MixedList { expected, found } => SimError::TagDecode {
                reason: format!("mixed list: expected {}, found {}", expected, found),
            },
            NbtError::InvalidLength(length) => SimError::TagDecode {
                reason: format!("invalid length {}", length),
            },
            NbtError::InvalidString(e) => SimError::Utf8Error {
                context: format!("string tag: {}", e),
            },
            NbtError::Io(e) => SimError::IoError {
                path: String::new(),
                error: e.to_string(),
            },
            NbtError::DepthLimit(depth) => SimError::TagDecode {
                reason: format!("nesting depth {} exceeds the limit", depth),
            },
        }
    }
}

// Helper functions for common error patterns

/// Convert Option to Result with context
pub trait OptionExt<T> {
    fn ok_or_sim<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> SimError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_sim<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> SimError,
    {
        self.ok_or_else(f)
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    fn context(self, msg: &str) -> SimResult<T>;
    fn with_context<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: Into<SimError>,
{
    fn context(self, msg: &str) -> SimResult<T> {
        self.map_err(|_| SimError::Internal {
            message: msg.to_string(),
        })
    }

    fn with_context<F>(self, f: F) -> SimResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|_| SimError::Internal { message: f() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::SlotOutOfBounds { slot: 30, size: 27 };
        assert_eq!(
            err.to_string(),
            "Container slot out of bounds: slot 30 >= size 27"
        );
    }

    #[test]
    fn test_option_ext() {
        let opt: Option<i32> = None;
        let result = opt.ok_or_sim(|| SimError::Internal {
            message: "test".to_string(),
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_error_context() {
        let result: Result<i32, std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));
        let with_context = result.context("loading config");
        assert!(with_context.is_err());
    }

    #[test]
    fn test_unknown_type_display() {
        let err = SimError::UnknownType {
            kind: "item",
            identifier: "minecraft:banana".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown item type: minecraft:banana");
    }
}
