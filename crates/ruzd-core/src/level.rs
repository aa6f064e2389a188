//! Tracking severity levels.

use serde::{Deserialize, Serialize};

/// Ordinal severity of a tracked event.
///
/// The remote policy delivers a threshold; events below it are suppressed by
/// the caller (via `check_tracking_level`) before an envelope is even built.
/// Higher ordinal = more significant, and the threshold is inclusive.
///
/// Serializes as the integer ordinal — that is the remote-config wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TrackingLevel {
    /// Diagnostic chatter, normally suppressed in production.
    Debug = 0,
    /// Fine-grained gameplay detail.
    Fine = 1,
    /// Default level for regular gameplay events.
    Normal = 2,
    /// Milestones and noteworthy state changes.
    Important = 3,
    /// Errors and must-not-miss signals.
    Critical = 4,
}

impl TrackingLevel {
    /// Numeric ordinal as carried on the wire.
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

impl Default for TrackingLevel {
    fn default() -> Self {
        Self::Normal
    }
}

impl From<TrackingLevel> for u8 {
    fn from(level: TrackingLevel) -> Self {
        level.ordinal()
    }
}

impl TryFrom<u8> for TrackingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Debug),
            1 => Ok(Self::Fine),
            2 => Ok(Self::Normal),
            3 => Ok(Self::Important),
            4 => Ok(Self::Critical),
            other => Err(format!("unknown tracking level ordinal {other}")),
        }
    }
}

impl std::fmt::Display for TrackingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Debug => "debug",
            Self::Fine => "fine",
            Self::Normal => "normal",
            Self::Important => "important",
            Self::Critical => "critical",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_ordinals() {
        assert!(TrackingLevel::Debug < TrackingLevel::Fine);
        assert!(TrackingLevel::Fine < TrackingLevel::Normal);
        assert!(TrackingLevel::Normal < TrackingLevel::Important);
        assert!(TrackingLevel::Important < TrackingLevel::Critical);
    }

    #[test]
    fn wire_round_trip() {
        for level in [
            TrackingLevel::Debug,
            TrackingLevel::Fine,
            TrackingLevel::Normal,
            TrackingLevel::Important,
            TrackingLevel::Critical,
        ] {
            let json = serde_json::to_string(&level).unwrap();
            let back: TrackingLevel = serde_json::from_str(&json).unwrap();
            assert_eq!(back, level);
        }
        assert_eq!(serde_json::to_string(&TrackingLevel::Normal).unwrap(), "2");
    }

    #[test]
    fn unknown_ordinal_is_rejected() {
        assert!(serde_json::from_str::<TrackingLevel>("9").is_err());
    }
}
