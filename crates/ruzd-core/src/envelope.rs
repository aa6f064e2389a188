//! Event envelopes — the composer side of the SDK.
//!
//! An [`Envelope`] is one outgoing structured event plus its attached
//! contexts, ready for the emitter. Composition is stateless: builders
//! validate required fields per kind, serialize auxiliary payloads through
//! the codec, and enforce the size ceiling. Nothing here touches the network
//! or disk.

use serde_json::{Map, Value, json};
use tracing::{error, warn};

use crate::constants;
use crate::context::{Context, ContextKind};
use crate::ids::EventId;

/// One outgoing structured event plus its attached contexts.
#[derive(Clone, Debug)]
pub struct Envelope {
    event_id: EventId,
    schema: &'static str,
    fields: Map<String, Value>,
    contexts: Vec<Context>,
    run_scoped: bool,
}

impl Envelope {
    fn new(schema: &'static str, run_scoped: bool) -> Self {
        Self {
            event_id: EventId::generate(),
            schema,
            fields: Map::new(),
            contexts: Vec::new(),
            run_scoped,
        }
    }

    fn field(mut self, key: &str, value: Value) -> Self {
        let _ = self.fields.insert(key.to_string(), value);
        self
    }

    fn opt_field(self, key: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.field(key, json!(v)),
            _ => self,
        }
    }

    /// A free-form game action event.
    pub fn game_event(
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) -> Self {
        Self::new(constants::SCHEMA_GAME_EVENT, false)
            .field("action", json!(action))
            .opt_field("category", category)
            .opt_field("label", label)
            .opt_field("value", value)
    }

    /// A progression milestone event. Run-scoped.
    pub fn progress_event(
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) -> Self {
        Self::new(constants::SCHEMA_PROGRESS_EVENT, true)
            .field("action", json!(action))
            .opt_field("category", category)
            .opt_field("label", label)
            .opt_field("value", value)
    }

    /// A resource gain/spend event. Run-scoped.
    pub fn resource_event(
        resource_name: &str,
        amount: f64,
        category: Option<&str>,
        label: Option<&str>,
    ) -> Self {
        Self::new(constants::SCHEMA_RESOURCE_EVENT, true)
            .field("resourceName", json!(resource_name))
            .field("amount", json!(amount))
            .opt_field("category", category)
            .opt_field("label", label)
    }

    /// A run-scoped action event.
    pub fn run_event(
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) -> Self {
        Self::new(constants::SCHEMA_RUN_EVENT, true)
            .field("action", json!(action))
            .opt_field("category", category)
            .opt_field("label", label)
            .opt_field("value", value)
    }

    /// A caller-defined event with an optional serialized payload. Run-scoped.
    ///
    /// The payload goes through the codec and is dropped whole when its
    /// serialized form exceeds [`constants::MAX_PAYLOAD_BYTES`] — the rest of
    /// the event still ships.
    pub fn custom_event(action: &str, category: Option<&str>, data: Option<&Value>) -> Self {
        let mut envelope = Self::new(constants::SCHEMA_CUSTOM_EVENT, true)
            .field("action", json!(action))
            .opt_field("category", category);
        if let Some(payload) = data.and_then(encode_payload) {
            envelope = envelope.field("data", json!(payload));
        }
        envelope
    }

    /// An error event. Severity and message are required; the optional data
    /// payload obeys the same size ceiling as custom events. Run-scoped.
    pub fn error_event(severity: u8, message: &str, data: Option<&Value>) -> Self {
        let mut envelope = Self::new(constants::SCHEMA_ERROR_EVENT, true)
            .field("severity", json!(severity))
            .field("message", json!(message));
        if let Some(payload) = data.and_then(encode_payload) {
            envelope = envelope.field("data", json!(payload));
        }
        envelope
    }

    /// A frame-rate sample event. Run-scoped.
    pub fn fps_event(average_fps: u32) -> Self {
        Self::new(constants::SCHEMA_FPS_EVENT, true).field("averageFPS", json!(average_fps))
    }

    /// The periodic session liveness signal.
    pub fn ping() -> Self {
        Self::new(constants::SCHEMA_GAME_EVENT, false)
            .field("category", json!("session"))
            .field("action", json!("ping"))
    }

    /// The local mirror of a submitted feedback record.
    pub fn feedback_event(rating: i32, message: Option<&str>) -> Self {
        Self::new(constants::SCHEMA_GAME_EVENT, false)
            .field("category", json!("feedback"))
            .field("action", json!("rating"))
            .field("value", json!(rating.to_string()))
            .opt_field("label", message)
    }

    /// The one-time startup event carrying the system context.
    pub fn game_start() -> Self {
        Self::new(constants::SCHEMA_GAME_EVENT, false)
            .field("category", json!("game"))
            .field("action", json!("start"))
            .field("label", json!("systemContext"))
    }

    /// Attach a context, unique per kind.
    ///
    /// A second context of an already-present kind is rejected (the first
    /// wins) and logged; the envelope still ships without the duplicate.
    /// Returns whether the context was attached.
    pub fn add_context(&mut self, context: Context) -> bool {
        let kind = context.kind();
        if self.contexts.iter().any(|c| c.kind() == kind) {
            warn!(?kind, "context of this kind was already added to the event, rejecting duplicate");
            return false;
        }
        self.contexts.push(context);
        true
    }

    /// Identifier of this event, generated at build time.
    pub fn event_id(&self) -> &EventId {
        &self.event_id
    }

    /// Schema identifier of the event body.
    pub fn schema(&self) -> &'static str {
        self.schema
    }

    /// Whether the active run context should be attached on the way out.
    pub fn is_run_scoped(&self) -> bool {
        self.run_scoped
    }

    /// Action field by name, when present.
    pub fn field_value(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The attached contexts, in attachment order.
    pub fn contexts(&self) -> &[Context] {
        &self.contexts
    }

    /// Serialize to the self-describing wire form.
    pub fn to_wire(&self) -> Value {
        json!({
            "schema": self.schema,
            "data": self.fields,
            "contexts": self.contexts.iter().map(Context::to_wire).collect::<Vec<_>>(),
        })
    }
}

/// Serialize an auxiliary payload, enforcing the size ceiling.
///
/// Returns `None` (and logs) when the serialized form is oversized or the
/// value cannot be encoded. The payload is dropped whole — never silently
/// truncated into the envelope.
fn encode_payload(data: &Value) -> Option<String> {
    let encoded = match serde_json::to_string(data) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to serialize event payload, dropping it");
            return None;
        }
    };
    if encoded.len() > constants::MAX_PAYLOAD_BYTES {
        error!(
            size = encoded.len(),
            limit = constants::MAX_PAYLOAD_BYTES,
            "event payload exceeds size ceiling, dropping it"
        );
        return None;
    }
    Some(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SessionContext;
    use crate::ids::{PlayerId, SessionId};

    fn session_context(id: &str) -> Context {
        Context::Session(SessionContext {
            user_id: PlayerId::from("p1"),
            session_id: SessionId::from(id),
            previous_session_id: None,
            session_index: 1,
            first_event_id: None,
            storage: "memory",
        })
    }

    #[test]
    fn game_event_skips_empty_optionals() {
        let envelope = Envelope::game_event("jump", Some("movement"), None, Some(""));
        assert_eq!(envelope.field_value("action").unwrap(), "jump");
        assert_eq!(envelope.field_value("category").unwrap(), "movement");
        assert!(envelope.field_value("label").is_none());
        assert!(envelope.field_value("value").is_none());
        assert!(!envelope.is_run_scoped());
    }

    #[test]
    fn resource_event_requires_name_and_amount() {
        let envelope = Envelope::resource_event("gold", 12.5, None, None);
        assert_eq!(envelope.schema(), constants::SCHEMA_RESOURCE_EVENT);
        assert_eq!(envelope.field_value("resourceName").unwrap(), "gold");
        assert_eq!(envelope.field_value("amount").unwrap(), 12.5);
        assert!(envelope.is_run_scoped());
    }

    #[test]
    fn error_event_keeps_small_payload() {
        let data = json!({"stack": "main.rs:42"});
        let envelope = Envelope::error_event(3, "boom", Some(&data));
        assert_eq!(envelope.field_value("severity").unwrap(), 3);
        assert_eq!(envelope.field_value("message").unwrap(), "boom");
        let encoded = envelope.field_value("data").unwrap().as_str().unwrap();
        assert!(encoded.contains("main.rs:42"));
    }

    #[test]
    fn oversized_payload_is_dropped_but_event_ships() {
        let data = json!({"blob": "x".repeat(600)});
        let envelope = Envelope::error_event(2, "still here", Some(&data));
        assert!(envelope.field_value("data").is_none());
        assert_eq!(envelope.field_value("message").unwrap(), "still here");
    }

    #[test]
    fn payload_at_the_ceiling_is_kept() {
        // {"b":"..."} wrapper is 8 bytes, so 504 bytes of fill lands on 512.
        let data = json!({"b": "y".repeat(504)});
        let envelope = Envelope::custom_event("save", None, Some(&data));
        assert!(envelope.field_value("data").is_some());
    }

    #[test]
    fn duplicate_context_kind_keeps_first() {
        let mut envelope = Envelope::game_event("jump", None, None, None);
        assert!(envelope.add_context(session_context("first")));
        assert!(!envelope.add_context(session_context("second")));
        assert_eq!(envelope.contexts().len(), 1);
        match &envelope.contexts()[0] {
            Context::Session(s) => assert_eq!(s.session_id, SessionId::from("first")),
            other => panic!("unexpected context {other:?}"),
        }
    }

    #[test]
    fn different_context_kinds_coexist() {
        let mut envelope = Envelope::run_event("boss", None, None, None);
        assert!(envelope.add_context(session_context("s")));
        assert!(envelope.add_context(Context::Run {
            run_id: "r1".into(),
            play_time_seconds: 10,
        }));
        assert_eq!(envelope.contexts().len(), 2);
    }

    #[test]
    fn wire_form_nests_contexts() {
        let mut envelope = Envelope::ping();
        let _ = envelope.add_context(session_context("s1"));
        let wire = envelope.to_wire();
        assert_eq!(wire["schema"], constants::SCHEMA_GAME_EVENT);
        assert_eq!(wire["data"]["action"], "ping");
        assert_eq!(wire["contexts"][0]["data"]["sessionId"], "s1");
    }

    #[test]
    fn every_envelope_gets_a_distinct_event_id() {
        let a = Envelope::ping();
        let b = Envelope::ping();
        assert_ne!(a.event_id(), b.event_id());
    }
}
