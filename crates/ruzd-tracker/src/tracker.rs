//! The tracking gate state machine and session lifecycle wiring.
//!
//! Two asynchronous actors feed this type concurrently with the game's own
//! threads: the one-shot policy fetch and the recurring session checker.
//! Every state read/write goes through one mutex, so the fetch callback and
//! an explicit `start_tracking` call can race to perform the Running
//! transition and it still fires exactly once — whichever arrives second
//! finds the phase already `Ready` and completes the start, the other finds
//! it not yet `Ready` (or already `Running`) and backs off.
//!
//! `track` is callable from the game's main thread at frame rate: it only
//! composes the envelope and hands it to the emitter, never touching the
//! network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use ruzd_core::constants::MAX_FEEDBACK_CHARS;
use ruzd_core::envelope::Envelope;
use ruzd_core::errors::ConfigError;
use ruzd_core::ids::PlayerId;
use ruzd_core::level::TrackingLevel;
use ruzd_core::run::RunRecord;
use ruzd_core::system::{StaticSystemInfo, SystemInfoProvider, SystemSnapshot};
use ruzd_session::{PingSink, SessionConfig, SessionManager, SessionStore};

use crate::SDK_VERSION;
use crate::config::TrackerConfig;
use crate::emitter::{EventEmitter, HttpMethod, HttpProtocol};
use crate::policy::{FeedbackRecord, PolicyClient, PolicyError, RemotePolicy};

/// Minimum spacing between fps sample events.
const FPS_MIN_INTERVAL: Duration = Duration::from_secs(60);

/// Gate lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Nothing configured yet; every track call drops.
    Unconfigured,
    /// `configure` accepted, policy fetch in flight.
    Configuring,
    /// Policy resolved; waiting for consent and/or a resolvable endpoint.
    Ready,
    /// Gate open — events flow to the emitter.
    Running,
    /// Stopped; only a fresh `configure` re-enters the lifecycle.
    Stopped,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Unconfigured => "unconfigured",
            Self::Configuring => "configuring",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct GateState {
    phase: Phase,
    config: Option<TrackerConfig>,
    session: Option<Arc<SessionManager>>,
    user_consent: bool,
    server_enabled: bool,
    server_endpoint: Option<String>,
    collector_uri: Option<String>,
    tracking_level: TrackingLevel,
    suppress_start_event: bool,
    run: Option<RunRecord>,
    last_fps_event: Option<Instant>,
    configured_once: bool,
    // Incremented per configure; a policy fetch only applies when the
    // generation it was spawned under is still current.
    generation: u64,
}

/// Composition root for the tracker.
///
/// Collaborators are injected once at startup; the system snapshot is read
/// exactly once, at `build`.
pub struct TrackerBuilder {
    emitter: Arc<dyn EventEmitter>,
    policy: Arc<dyn PolicyClient>,
    session_store: Arc<dyn SessionStore>,
    system: Arc<dyn SystemInfoProvider>,
    session_config: SessionConfig,
}

impl TrackerBuilder {
    /// Builder over the three mandatory collaborators.
    pub fn new(
        emitter: Arc<dyn EventEmitter>,
        policy: Arc<dyn PolicyClient>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            emitter,
            policy,
            session_store,
            system: Arc::new(StaticSystemInfo::default()),
            session_config: SessionConfig::default(),
        }
    }

    /// Supply the host's system info provider.
    pub fn system_info(mut self, provider: Arc<dyn SystemInfoProvider>) -> Self {
        self.system = provider;
        self
    }

    /// Override session timing (checker cadence, timeouts).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Build the tracker. One per process — hold the `Arc` at the
    /// composition root and clone it outward.
    pub fn build(self) -> Arc<Tracker> {
        let system = self.system.snapshot();
        Arc::new(Tracker {
            emitter: self.emitter,
            policy: self.policy,
            session_store: self.session_store,
            session_config: self.session_config,
            system,
            state: Mutex::new(GateState {
                phase: Phase::Unconfigured,
                config: None,
                session: None,
                user_consent: false,
                server_enabled: false,
                server_endpoint: None,
                collector_uri: None,
                tracking_level: TrackingLevel::default(),
                suppress_start_event: false,
                run: None,
                last_fps_event: None,
                configured_once: false,
                generation: 0,
            }),
        })
    }
}

/// The tracking gate: arbitration point for user consent, remote policy, and
/// session lifecycle. All `track_*` helpers funnel through [`Tracker::track`].
pub struct Tracker {
    emitter: Arc<dyn EventEmitter>,
    policy: Arc<dyn PolicyClient>,
    session_store: Arc<dyn SessionStore>,
    session_config: SessionConfig,
    system: SystemSnapshot,
    state: Mutex<GateState>,
}

impl Tracker {
    /// Entry to the builder.
    pub fn builder(
        emitter: Arc<dyn EventEmitter>,
        policy: Arc<dyn PolicyClient>,
        session_store: Arc<dyn SessionStore>,
    ) -> TrackerBuilder {
        TrackerBuilder::new(emitter, policy, session_store)
    }

    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Validate and apply configuration, prime the session manager, and
    /// launch the asynchronous policy fetch.
    ///
    /// Requires a tokio runtime (the fetch and the session checker are
    /// spawned tasks). Calling again after a completed setup works but logs
    /// a misuse warning — hosts are expected to configure exactly once.
    pub fn configure(self: &Arc<Self>, config: TrackerConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let (session, old_session, was_running, generation, game_id, build, player_id) = {
            let mut state = self.lock_state();
            if state.configured_once {
                warn!("configure called again after a completed setup, reconfiguring");
            }
            let old_session = state.session.take();
            let was_running = state.phase == Phase::Running;
            state.generation += 1;
            let generation = state.generation;

            let session = Arc::new(SessionManager::new(
                Arc::clone(&self.session_store),
                config.player_id.clone(),
                self.session_config.clone(),
            ));
            if config.disable_ping {
                session.set_ping_enabled(false);
            }

            state.phase = Phase::Configuring;
            state.user_consent = false;
            state.server_enabled = false;
            state.server_endpoint = None;
            state.collector_uri = None;
            state.suppress_start_event = false;
            state.configured_once = true;
            state.session = Some(Arc::clone(&session));

            let game_id = config.game_id.clone();
            let build = config.effective_build_version().to_string();
            let player_id = session.player_id();
            state.config = Some(config);
            (session, old_session, was_running, generation, game_id, build, player_id)
        };

        // Tear down the previous setup: close the transport so nothing keeps
        // shipping to the old collector, and drain the leftover checker off
        // the caller's thread so no stale tick lands in the new session.
        if was_running {
            self.emitter.stop();
        }
        if let Some(old) = old_session {
            let _ = tokio::spawn(async move { old.stop_checker().await });
        }

        session.start_checker(self.ping_sink());

        let tracker = Arc::clone(self);
        let _ = tokio::spawn(async move {
            let result = tracker
                .policy
                .fetch_policy(&game_id, SDK_VERSION, &build, &player_id)
                .await;
            tracker.on_policy_resolved(generation, result);
        });

        info!("tracker configured, fetching remote policy");
        Ok(())
    }

    fn ping_sink(self: &Arc<Self>) -> Weak<dyn PingSink> {
        let strong: Arc<dyn PingSink> = Arc::clone(self) as Arc<dyn PingSink>;
        Arc::downgrade(&strong)
    }

    /// Policy fetch completion — success, parse failure, or transport
    /// failure. Always resolves `server_enabled`; failure fails open because
    /// the product default favors keeping tracking on over silently losing
    /// data.
    ///
    /// A fetch spawned by a superseded `configure` carries a stale
    /// generation and is discarded, whatever order the two fetches land in.
    fn on_policy_resolved(&self, generation: u64, result: Result<RemotePolicy, PolicyError>) {
        {
            let mut state = self.lock_state();
            if state.generation != generation {
                debug!(
                    stale = generation,
                    current = state.generation,
                    "policy resolved for a superseded configuration, ignoring"
                );
                return;
            }
            if state.phase != Phase::Configuring {
                debug!(phase = %state.phase, "policy resolved after the phase moved on, ignoring");
                return;
            }
            match result {
                Ok(policy) => {
                    state.server_enabled = policy.enabled;
                    state.tracking_level = policy.level;
                    state.server_endpoint = policy.endpoint;
                    info!(
                        enabled = state.server_enabled,
                        level = %state.tracking_level,
                        "remote tracking policy applied"
                    );
                }
                Err(e) => {
                    error!(error = %e, "policy fetch failed, failing open");
                    state.server_enabled = true;
                }
            }
            state.phase = Phase::Ready;
        }
        self.attempt_start();
    }

    /// Record user consent and try to open the gate.
    ///
    /// Whichever of {policy resolution, this call} happens second performs
    /// the actual Running transition.
    pub fn start_tracking(&self, suppress_start_event: bool) {
        {
            let mut state = self.lock_state();
            state.user_consent = true;
            state.suppress_start_event = suppress_start_event;
        }
        self.attempt_start();
    }

    /// Try the Ready → Running transition. Any unmet condition is a logged
    /// no-op, not an error — the other arbitration path will retry.
    fn attempt_start(&self) {
        let opened = {
            let mut state = self.lock_state();
            if state.phase != Phase::Ready {
                debug!(phase = %state.phase, "not attempting start in this phase");
                return;
            }
            if !state.user_consent {
                debug!("policy resolved, waiting for explicit start");
                return;
            }
            if !state.server_enabled {
                info!("tracking disabled by remote policy");
                return;
            }
            let Some(config) = state.config.as_ref() else {
                return;
            };
            let Some(base) = config
                .endpoint
                .clone()
                .or_else(|| state.server_endpoint.clone())
            else {
                warn!("no collector endpoint configured or delivered by policy");
                return;
            };
            let path = config
                .custom_path
                .clone()
                .unwrap_or_else(|| config.method.default_path().to_string());
            let uri = format!("{base}{path}");

            self.emitter.set_method(config.method);
            self.emitter.set_protocol(config.protocol);
            self.emitter.set_collector_uri(&uri);
            self.emitter.start();

            state.collector_uri = Some(uri.clone());
            state.phase = Phase::Running;
            info!(collector = %uri, "tracking running");
            !state.suppress_start_event
        };

        if opened {
            self.track_game_start();
        }
    }

    /// Close the gate: stop the emitter and drain the session checker.
    ///
    /// After this returns no scheduled tick can rotate the session or emit a
    /// ping. Idempotent; a no-op before `configure`.
    pub async fn stop_tracking(&self) {
        let session = {
            let mut state = self.lock_state();
            if matches!(state.phase, Phase::Unconfigured | Phase::Stopped) {
                debug!(phase = %state.phase, "stop_tracking is a no-op");
                return;
            }
            state.phase = Phase::Stopped;
            state.user_consent = false;
            state.session.clone()
        };
        self.emitter.stop();
        if let Some(session) = session {
            session.stop_checker().await;
        }
        info!("tracking stopped");
    }

    /// The single funnel all events pass through.
    ///
    /// Drops with a warning unless the gate is Running. Attaches the active
    /// run context (for run-scoped kinds) and the session context, then
    /// forwards to the emitter.
    pub fn track(&self, mut envelope: Envelope) {
        let (session, run_context) = {
            let state = self.lock_state();
            if state.phase != Phase::Running {
                warn!(
                    schema = envelope.schema(),
                    phase = %state.phase,
                    "event will not be recorded because tracking is not running"
                );
                return;
            }
            let run_context = if envelope.is_run_scoped() {
                state.run.as_ref().map(RunRecord::to_context)
            } else {
                None
            };
            (state.session.clone(), run_context)
        };
        let Some(session) = session else {
            // Unreachable while Running, but never panic in the host.
            warn!("tracking is running without a session manager, dropping event");
            return;
        };

        if let Some(context) = run_context {
            let _ = envelope.add_context(context);
        }
        let event_id = envelope.event_id().clone();
        let _ = envelope.add_context(session.session_context(&event_id));
        self.emitter.enqueue(envelope);
    }

    // ── track_* helpers ─────────────────────────────────────────────────────

    /// Track a free-form game action.
    pub fn track_game_event(
        &self,
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) {
        self.track(Envelope::game_event(action, category, label, value));
    }

    /// Track a progression milestone.
    pub fn track_progress_event(
        &self,
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) {
        self.track(Envelope::progress_event(action, category, label, value));
    }

    /// Track a resource gain/spend.
    pub fn track_resource_event(
        &self,
        resource_name: &str,
        amount: f64,
        category: Option<&str>,
        label: Option<&str>,
    ) {
        self.track(Envelope::resource_event(resource_name, amount, category, label));
    }

    /// Track a run-scoped action.
    pub fn track_run_event(
        &self,
        action: &str,
        category: Option<&str>,
        label: Option<&str>,
        value: Option<&str>,
    ) {
        self.track(Envelope::run_event(action, category, label, value));
    }

    /// Track a caller-defined event with an optional payload.
    pub fn track_custom_event(&self, action: &str, category: Option<&str>, data: Option<&Value>) {
        self.track(Envelope::custom_event(action, category, data));
    }

    /// Track an error.
    pub fn track_error(&self, severity: u8, message: &str, data: Option<&Value>) {
        self.track(Envelope::error_event(severity, message, data));
    }

    /// Track a frame-rate sample, rate-limited to one event per minute.
    pub fn track_fps(&self, average_fps: u32) {
        let now = Instant::now();
        {
            let mut state = self.lock_state();
            if let Some(last) = state.last_fps_event {
                if now.saturating_duration_since(last) < FPS_MIN_INTERVAL {
                    debug!("fps sample inside the minimum interval, skipping");
                    return;
                }
            }
            state.last_fps_event = Some(now);
        }
        self.track(Envelope::fps_event(average_fps));
    }

    /// Emit the one-time startup event carrying the system context.
    pub fn track_game_start(&self) {
        let mut envelope = Envelope::game_start();
        let _ = envelope.add_context(ruzd_core::context::Context::System(self.system.clone()));
        self.track(envelope);
    }

    // ── lifecycle pass-throughs and queries ─────────────────────────────────

    /// Set or update the active run attached to run-scoped events.
    pub fn update_run(&self, run_id: &str, play_time_seconds: i64) {
        let mut state = self.lock_state();
        match state.run.as_mut() {
            Some(run) => run.update(run_id, play_time_seconds),
            None => state.run = Some(RunRecord::new(run_id, play_time_seconds)),
        }
    }

    /// Mark the application background state for the session checker.
    pub fn set_background(&self, background: bool) {
        if let Some(session) = self.lock_state().session.clone() {
            session.set_background(background);
        }
    }

    /// Enable or disable the periodic liveness ping.
    pub fn set_ping_enabled(&self, enabled: bool) {
        if let Some(session) = self.lock_state().session.clone() {
            session.set_ping_enabled(enabled);
        }
    }

    /// Whether `level` clears the configured threshold (inclusive).
    pub fn check_tracking_level(&self, level: TrackingLevel) -> bool {
        level >= self.lock_state().tracking_level
    }

    /// Whether `configure` completed and the gate has not been stopped.
    pub fn is_initialized(&self) -> bool {
        matches!(
            self.lock_state().phase,
            Phase::Configuring | Phase::Ready | Phase::Running
        )
    }

    /// Whether the gate is open.
    pub fn is_running(&self) -> bool {
        self.lock_state().phase == Phase::Running
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lock_state().phase
    }

    /// Post user feedback and mirror it as a local event.
    ///
    /// The message is truncated to 512 characters; `session_id` (and
    /// `run_id` when a run is active) are injected into the extra context.
    /// The local event is best-effort and independent — the returned flag
    /// reflects solely the remote post.
    pub async fn send_feedback(
        &self,
        rating: i32,
        message: Option<&str>,
        extra: Option<HashMap<String, String>>,
    ) -> bool {
        let truncated: Option<String> =
            message.map(|m| m.chars().take(MAX_FEEDBACK_CHARS).collect());

        let (game_id, build, player_id, session_id, run_id) = {
            let state = self.lock_state();
            let (Some(config), Some(session)) = (state.config.as_ref(), state.session.as_ref())
            else {
                warn!("feedback requires a configured tracker");
                return false;
            };
            (
                config.game_id.clone(),
                config.effective_build_version().to_string(),
                session.player_id(),
                session.session_id(),
                state.run.as_ref().map(|run| run.run_id.clone()),
            )
        };

        let mut context = extra.unwrap_or_default();
        let _ = context.insert("session_id".to_string(), session_id.to_string());
        if let Some(run_id) = run_id {
            let _ = context.insert("run_id".to_string(), run_id);
        }

        // Local mirror through the normal gate; its delivery status does not
        // affect the result.
        self.track(Envelope::feedback_event(rating, truncated.as_deref()));

        let record = FeedbackRecord {
            rating,
            user_id: player_id,
            message: truncated,
            context,
        };
        match self
            .policy
            .post_feedback(&game_id, SDK_VERSION, &build, &record)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "feedback post failed");
                false
            }
        }
    }
}

impl PingSink for Tracker {
    fn send_ping(&self) {
        // Same funnel as user events: before start_tracking this is a
        // silent drop inside track(), not an error.
        self.track(Envelope::ping());
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("phase", &self.lock_state().phase)
            .finish_non_exhaustive()
    }
}
