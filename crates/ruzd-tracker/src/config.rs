//! Host-supplied tracker configuration.

use ruzd_core::errors::ConfigError;
use ruzd_core::ids::PlayerId;

use crate::emitter::{HttpMethod, HttpProtocol};

/// Accepted game identifier length range, inclusive.
pub const GAME_ID_MIN_LEN: usize = 8;
/// Accepted game identifier length range, inclusive.
pub const GAME_ID_MAX_LEN: usize = 32;

/// Everything the host passes to `configure`.
///
/// Built fluently; validation happens in `configure` before any state change:
///
/// ```ignore
/// let config = TrackerConfig::new("my-game-id")
///     .endpoint("https://collector.example.com")
///     .build_version("1.4.2");
/// tracker.configure(config)?;
/// ```
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Game identifier issued with the collector account.
    pub game_id: String,
    /// Collector endpoint override. When unset the server-provided endpoint
    /// from the remote policy is used.
    pub endpoint: Option<String>,
    /// Explicit collector path, replacing the method-derived default suffix.
    pub custom_path: Option<String>,
    /// Build/version string reported with events and policy calls.
    pub build_version: Option<String>,
    /// Player id override; a generated persisted id is used when unset.
    pub player_id: Option<PlayerId>,
    /// Collector HTTP method.
    pub method: HttpMethod,
    /// Collector transport protocol.
    pub protocol: HttpProtocol,
    /// Disable the periodic liveness ping.
    pub disable_ping: bool,
}

impl TrackerConfig {
    /// Config with defaults: POST over HTTPS, ping enabled.
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            endpoint: None,
            custom_path: None,
            build_version: None,
            player_id: None,
            method: HttpMethod::default(),
            protocol: HttpProtocol::default(),
            disable_ping: false,
        }
    }

    /// Set the collector endpoint override. A trailing `/` is trimmed so the
    /// path suffix concatenates cleanly.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        let mut endpoint = endpoint.into();
        while endpoint.ends_with('/') {
            let _ = endpoint.pop();
        }
        self.endpoint = Some(endpoint);
        self
    }

    /// Set an explicit collector path override.
    pub fn custom_path(mut self, path: impl Into<String>) -> Self {
        self.custom_path = Some(path.into());
        self
    }

    /// Set the reported build version.
    pub fn build_version(mut self, version: impl Into<String>) -> Self {
        self.build_version = Some(version.into());
        self
    }

    /// Override the generated player id.
    pub fn player_id(mut self, id: PlayerId) -> Self {
        self.player_id = Some(id);
        self
    }

    /// Select the collector HTTP method.
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// Select the transport protocol.
    pub fn protocol(mut self, protocol: HttpProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Disable the periodic liveness ping.
    pub fn disable_ping(mut self) -> Self {
        self.disable_ping = true;
        self
    }

    /// Reported build version, with a stable placeholder when unset.
    pub fn effective_build_version(&self) -> &str {
        self.build_version.as_deref().unwrap_or("unknown")
    }

    /// Validate before any state change. The length bound counts characters,
    /// matching how feedback messages are measured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.game_id.chars().count();
        if !(GAME_ID_MIN_LEN..=GAME_ID_MAX_LEN).contains(&len) {
            return Err(ConfigError::InvalidIdentifier {
                min: GAME_ID_MIN_LEN,
                max: GAME_ID_MAX_LEN,
                got: len,
            });
        }
        Ok(())
    }
}
