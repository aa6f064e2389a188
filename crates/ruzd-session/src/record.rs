//! The persisted session record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ruzd_core::ids::{EventId, PlayerId, SessionId};

/// Session state persisted across process restarts, one record per install.
///
/// INVARIANT: `session_index` never decreases; `current_session_id` changes
/// only through rotation; `first_event_id` is set at most once per session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stable player/install id, generated on first run.
    pub player_id: PlayerId,
    /// Current session id.
    pub current_session_id: SessionId,
    /// Prior session id, `None` on the first ever session.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub previous_session_id: Option<SessionId>,
    /// Monotone rotation counter, starts at 0.
    pub session_index: u64,
    /// First event observed in the current session; cleared on rotation.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub first_event_id: Option<EventId>,
    /// Wall-clock time of the most recent event or ping.
    pub last_event_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Fresh record for a first-ever session.
    pub fn initial(player_id: PlayerId) -> Self {
        Self {
            player_id,
            current_session_id: SessionId::generate(),
            previous_session_id: None,
            session_index: 0,
            first_event_id: None,
            last_event_at: Utc::now(),
        }
    }

    /// Rotate in place: previous ← current, current ← fresh, index += 1,
    /// first event cleared.
    pub fn rotate(&mut self) {
        self.previous_session_id = Some(self.current_session_id.clone());
        self.current_session_id = SessionId::generate();
        self.session_index += 1;
        self.first_event_id = None;
        self.last_event_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_chains_previous_to_current() {
        let mut record = SessionRecord::initial(PlayerId::from("p1"));
        let first = record.current_session_id.clone();
        record.rotate();
        assert_eq!(record.previous_session_id.as_ref(), Some(&first));
        assert_ne!(record.current_session_id, first);
        assert_eq!(record.session_index, 1);
        assert!(record.first_event_id.is_none());
    }

    #[test]
    fn index_increases_by_one_per_rotation() {
        let mut record = SessionRecord::initial(PlayerId::from("p1"));
        for expected in 1..=5 {
            let prior = record.current_session_id.clone();
            record.rotate();
            assert_eq!(record.session_index, expected);
            assert_eq!(record.previous_session_id.as_ref(), Some(&prior));
        }
    }

    #[test]
    fn serde_round_trip() {
        let mut record = SessionRecord::initial(PlayerId::from("p1"));
        record.first_event_id = Some(EventId::from("e1"));
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn optional_fields_are_omitted_when_unset() {
        let record = SessionRecord::initial(PlayerId::from("p1"));
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("previous_session_id").is_none());
        assert!(json.get("first_event_id").is_none());
    }
}
