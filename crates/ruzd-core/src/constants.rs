//! Wire-format constants shared across the SDK.
//!
//! Schema identifiers follow the iglu URI convention of the collector. They
//! are part of the wire contract — changing one is a breaking change for the
//! downstream pipeline, not a refactor.

/// Schema for free-form game action events.
pub const SCHEMA_GAME_EVENT: &str = "iglu:com.ruzd/gameEvent/jsonschema/1-0-0";
/// Schema for progression milestone events.
pub const SCHEMA_PROGRESS_EVENT: &str = "iglu:com.ruzd/progressEvent/jsonschema/1-0-0";
/// Schema for resource gain/spend events.
pub const SCHEMA_RESOURCE_EVENT: &str = "iglu:com.ruzd/resourceEvent/jsonschema/1-0-0";
/// Schema for run-scoped action events.
pub const SCHEMA_RUN_EVENT: &str = "iglu:com.ruzd/runEvent/jsonschema/1-0-0";
/// Schema for caller-defined events with a serialized data payload.
pub const SCHEMA_CUSTOM_EVENT: &str = "iglu:com.ruzd/customEvent/jsonschema/1-0-0";
/// Schema for error events (severity + message).
pub const SCHEMA_ERROR_EVENT: &str = "iglu:com.ruzd/errorEvent/jsonschema/1-0-0";
/// Schema for performance (frames per second) sample events.
pub const SCHEMA_FPS_EVENT: &str = "iglu:com.ruzd/fps/jsonschema/1-0-0";

/// Schema for the session context attachment.
pub const SCHEMA_SESSION_CONTEXT: &str = "iglu:com.ruzd/sessionContext/jsonschema/1-0-0";
/// Schema for the run context attachment.
pub const SCHEMA_RUN_CONTEXT: &str = "iglu:com.ruzd/runContext/jsonschema/1-0-0";
/// Schema for the system context attachment.
pub const SCHEMA_SYSTEM_CONTEXT: &str = "iglu:com.ruzd/systemContext/jsonschema/1-0-0";
/// Schema for the location context attachment.
pub const SCHEMA_LOCATION_CONTEXT: &str = "iglu:com.ruzd/locationContext/jsonschema/1-0-0";
/// Schema for the fps context attachment.
pub const SCHEMA_FPS_CONTEXT: &str = "iglu:com.ruzd/fpsContext/jsonschema/1-0-0";
/// Schema for caller-defined context attachments.
pub const SCHEMA_CUSTOM_CONTEXT: &str = "iglu:com.ruzd/customContext/jsonschema/1-0-0";

/// Ceiling in bytes for serialized auxiliary payloads (custom/error data).
///
/// Oversized payloads are dropped whole — never truncated into the envelope.
pub const MAX_PAYLOAD_BYTES: usize = 512;

/// Ceiling in characters for user feedback messages.
pub const MAX_FEEDBACK_CHARS: usize = 512;
