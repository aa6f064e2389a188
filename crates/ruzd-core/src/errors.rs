//! SDK error taxonomy.
//!
//! Only configuration mistakes surface as `Err` to the host — everything else
//! in the tracking path degrades to "drop and log" so telemetry can never
//! break the game.

use thiserror::Error;

/// Errors rejected at configuration time, before any state change.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The game identifier is outside the accepted length range.
    #[error("invalid game identifier: length must be between {min} and {max} characters, got {got}")]
    InvalidIdentifier {
        /// Minimum accepted length.
        min: usize,
        /// Maximum accepted length.
        max: usize,
        /// Length of the rejected identifier.
        got: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_identifier_message_names_bounds() {
        let err = ConfigError::InvalidIdentifier {
            min: 8,
            max: 32,
            got: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains('8'));
        assert!(msg.contains("32"));
        assert!(msg.contains('3'));
    }
}
