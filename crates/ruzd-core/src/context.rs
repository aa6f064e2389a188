//! Typed context attachments.
//!
//! A context is a self-describing metadata block merged into an envelope.
//! Every context serializes as `{"schema": ..., "data": {...}}` and an
//! envelope holds at most one context per [`ContextKind`].

use serde_json::{Value, json};

use crate::constants;
use crate::ids::{EventId, PlayerId, SessionId};
use crate::system::SystemSnapshot;

/// Discriminant used for the unique-per-kind envelope invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextKind {
    /// Session identity attachment.
    Session,
    /// Static device/system facts.
    System,
    /// Current game-run identity.
    Run,
    /// Frame-rate statistics.
    Fps,
    /// In-game map location.
    Location,
    /// Caller-defined attachment.
    Custom,
}

/// Session identity snapshot attached to every outgoing envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionContext {
    /// Stable player/install id.
    pub user_id: PlayerId,
    /// Current session id.
    pub session_id: SessionId,
    /// Prior session id, absent on the first ever session.
    pub previous_session_id: Option<SessionId>,
    /// Monotone rotation counter.
    pub session_index: u64,
    /// First event observed in this session, set once per rotation.
    pub first_event_id: Option<EventId>,
    /// Which store holds the persisted record (`file` or `memory`).
    pub storage: &'static str,
}

/// A typed metadata attachment, unique per kind on one envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum Context {
    /// Session identity.
    Session(SessionContext),
    /// Static device/system facts.
    System(SystemSnapshot),
    /// Current run identity (`run_id`, play time).
    Run {
        /// Run identifier.
        run_id: String,
        /// Accumulated play time in seconds.
        play_time_seconds: i64,
    },
    /// Frame-rate statistics.
    Fps {
        /// Average frames per second over the sample window.
        average_fps: f64,
        /// 95th percentile minimum, when measured.
        min_fps_95: Option<f64>,
        /// 99th percentile minimum, when measured.
        min_fps_99: Option<f64>,
    },
    /// In-game location.
    Location {
        /// Map or scene name.
        map_name: String,
        /// X coordinate.
        x: f64,
        /// Y coordinate.
        y: f64,
    },
    /// Caller-defined attachment with a pre-serialized data payload.
    Custom {
        /// Attachment name.
        name: String,
        /// Serialized payload, absent when it exceeded the size ceiling.
        data: Option<String>,
    },
}

impl Context {
    /// The kind discriminant for the unique-per-kind invariant.
    pub fn kind(&self) -> ContextKind {
        match self {
            Self::Session(_) => ContextKind::Session,
            Self::System(_) => ContextKind::System,
            Self::Run { .. } => ContextKind::Run,
            Self::Fps { .. } => ContextKind::Fps,
            Self::Location { .. } => ContextKind::Location,
            Self::Custom { .. } => ContextKind::Custom,
        }
    }

    /// The iglu schema identifier of this attachment.
    pub fn schema(&self) -> &'static str {
        match self {
            Self::Session(_) => constants::SCHEMA_SESSION_CONTEXT,
            Self::System(_) => constants::SCHEMA_SYSTEM_CONTEXT,
            Self::Run { .. } => constants::SCHEMA_RUN_CONTEXT,
            Self::Fps { .. } => constants::SCHEMA_FPS_CONTEXT,
            Self::Location { .. } => constants::SCHEMA_LOCATION_CONTEXT,
            Self::Custom { .. } => constants::SCHEMA_CUSTOM_CONTEXT,
        }
    }

    /// Serialize to the self-describing `{schema, data}` wire form.
    pub fn to_wire(&self) -> Value {
        json!({ "schema": self.schema(), "data": self.data() })
    }

    fn data(&self) -> Value {
        match self {
            Self::Session(s) => {
                let mut data = json!({
                    "userId": s.user_id,
                    "sessionId": s.session_id,
                    "sessionIndex": s.session_index,
                    "storageMechanism": s.storage,
                });
                if let Some(prev) = &s.previous_session_id {
                    data["previousSessionId"] = json!(prev);
                }
                if let Some(first) = &s.first_event_id {
                    data["firstEventId"] = json!(first);
                }
                data
            }
            Self::System(snapshot) => snapshot.to_wire_data(),
            Self::Run {
                run_id,
                play_time_seconds,
            } => json!({ "runId": run_id, "playTimeSeconds": play_time_seconds }),
            Self::Fps {
                average_fps,
                min_fps_95,
                min_fps_99,
            } => {
                let mut data = json!({ "averageFPS": average_fps });
                if let Some(v) = min_fps_95 {
                    data["minFPS95"] = json!(v);
                }
                if let Some(v) = min_fps_99 {
                    data["minFPS99"] = json!(v);
                }
                data
            }
            Self::Location { map_name, x, y } => {
                json!({ "mapName": map_name, "locationX": x, "locationY": y })
            }
            Self::Custom { name, data } => {
                let mut wire = json!({ "name": name });
                if let Some(payload) = data {
                    wire["data"] = json!(payload);
                }
                wire
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_context_wire_form() {
        let ctx = Context::Run {
            run_id: "run-7".into(),
            play_time_seconds: 321,
        };
        let wire = ctx.to_wire();
        assert_eq!(wire["schema"], constants::SCHEMA_RUN_CONTEXT);
        assert_eq!(wire["data"]["runId"], "run-7");
        assert_eq!(wire["data"]["playTimeSeconds"], 321);
    }

    #[test]
    fn session_context_omits_unset_fields() {
        let ctx = Context::Session(SessionContext {
            user_id: PlayerId::from("p1"),
            session_id: SessionId::from("s1"),
            previous_session_id: None,
            session_index: 1,
            first_event_id: None,
            storage: "memory",
        });
        let data = &ctx.to_wire()["data"];
        assert!(data.get("previousSessionId").is_none());
        assert!(data.get("firstEventId").is_none());
        assert_eq!(data["sessionIndex"], 1);
    }

    #[test]
    fn fps_context_includes_percentiles_when_present() {
        let ctx = Context::Fps {
            average_fps: 58.5,
            min_fps_95: Some(41.0),
            min_fps_99: None,
        };
        let data = &ctx.to_wire()["data"];
        assert_eq!(data["averageFPS"], 58.5);
        assert_eq!(data["minFPS95"], 41.0);
        assert!(data.get("minFPS99").is_none());
    }

    #[test]
    fn kinds_are_distinct_per_variant() {
        let run = Context::Run {
            run_id: "r".into(),
            play_time_seconds: 0,
        };
        let loc = Context::Location {
            map_name: "m".into(),
            x: 0.0,
            y: 0.0,
        };
        assert_ne!(run.kind(), loc.kind());
        assert_eq!(run.kind(), ContextKind::Run);
    }
}
