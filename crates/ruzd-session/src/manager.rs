//! Session manager: rotation, context snapshots, and the periodic checker.
//!
//! The checker is an explicit cancellable periodic task (interval + watch
//! stop channel), not a self-rescheduling callback: `stop_checker` signals
//! the channel and then awaits the task, so no tick side effect can land
//! after it returns.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use ruzd_core::context::{Context, SessionContext};
use ruzd_core::ids::{EventId, PlayerId, SessionId};

use crate::record::SessionRecord;
use crate::store::SessionStore;

/// Receiver of the checker's liveness pings.
///
/// The tracking gate implements this; a ping goes through the same gate
/// entry point as user events, so a ping before tracking starts is a silent
/// no-op rather than a special-cased path.
pub trait PingSink: Send + Sync {
    /// Request one liveness ping.
    fn send_ping(&self);
}

/// Timing knobs of the session lifecycle.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Checker cadence.
    pub check_interval: Duration,
    /// Idle time in background after which the session rotates.
    pub background_timeout: Duration,
    /// Idle time in foreground after which a ping is emitted.
    pub ping_interval: Duration,
    /// Whether the foreground ping branch is active at all.
    pub ping_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(15),
            background_timeout: Duration::from_secs(1800),
            ping_interval: Duration::from_secs(120),
            ping_enabled: true,
        }
    }
}

struct SessionState {
    record: SessionRecord,
    background: bool,
    ping_enabled: bool,
    last_event: Instant,
}

struct CheckerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Owns the session record and drives the periodic liveness/expiry check.
///
/// All mutation goes through this type; the persisted record is a best-effort
/// mirror and the in-memory state stays authoritative when writes fail.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
    state: Mutex<SessionState>,
    checker: Mutex<Option<CheckerHandle>>,
}

impl SessionManager {
    /// Build the manager, seeding continuity from any persisted record.
    ///
    /// A prior record contributes `previous_session_id` and `session_index`
    /// through an immediate rotation; with nothing persisted the first ever
    /// session starts at index 0 with no predecessor. Either way the fresh
    /// record is persisted before this returns.
    pub fn new(
        store: Arc<dyn SessionStore>,
        custom_player_id: Option<PlayerId>,
        config: SessionConfig,
    ) -> Self {
        let record = match store.read() {
            Some(mut prior) => {
                if let Some(id) = custom_player_id {
                    prior.player_id = id;
                }
                prior.rotate();
                prior
            }
            None => SessionRecord::initial(custom_player_id.unwrap_or_else(PlayerId::generate)),
        };
        let _ = store.write(&record);
        debug!(
            session_id = %record.current_session_id,
            index = record.session_index,
            "session started"
        );
        let ping_enabled = config.ping_enabled;
        Self {
            store,
            config,
            state: Mutex::new(SessionState {
                record,
                background: false,
                ping_enabled,
                last_event: Instant::now(),
            }),
            checker: Mutex::new(None),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // Session state never crosses a panic boundary mid-update; recover
        // the guard rather than poisoning the whole SDK.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Rotate the session: previous ← current, fresh id, index + 1, first
    /// event cleared, record persisted.
    pub fn new_session(&self) {
        let mut state = self.lock_state();
        Self::rotate_locked(&self.store, &mut state);
    }

    fn rotate_locked(store: &Arc<dyn SessionStore>, state: &mut SessionState) {
        state.record.rotate();
        state.last_event = Instant::now();
        let _ = store.write(&state.record);
        debug!(
            session_id = %state.record.current_session_id,
            index = state.record.session_index,
            "session rotated"
        );
    }

    /// Session context snapshot for an outgoing event.
    ///
    /// Side effects: refreshes the liveness timestamp, and the first call
    /// after a rotation claims `first_event_id` (subsequent calls leave it).
    pub fn session_context(&self, event_id: &EventId) -> Context {
        let mut state = self.lock_state();
        state.last_event = Instant::now();
        state.record.last_event_at = Utc::now();
        if state.record.first_event_id.is_none() {
            state.record.first_event_id = Some(event_id.clone());
        }
        Context::Session(SessionContext {
            user_id: state.record.player_id.clone(),
            session_id: state.record.current_session_id.clone(),
            previous_session_id: state.record.previous_session_id.clone(),
            session_index: state.record.session_index,
            first_event_id: state.record.first_event_id.clone(),
            storage: self.store.mechanism(),
        })
    }

    /// Current session id.
    pub fn session_id(&self) -> SessionId {
        self.lock_state().record.current_session_id.clone()
    }

    /// Current rotation counter.
    pub fn session_index(&self) -> u64 {
        self.lock_state().record.session_index
    }

    /// Stable player/install id.
    pub fn player_id(&self) -> PlayerId {
        self.lock_state().record.player_id.clone()
    }

    /// Mark the application background state for the checker.
    pub fn set_background(&self, background: bool) {
        self.lock_state().background = background;
    }

    /// Enable or disable the foreground ping branch without restarting the
    /// timer.
    pub fn set_ping_enabled(&self, enabled: bool) {
        self.lock_state().ping_enabled = enabled;
    }

    /// Start the periodic checker. One checker per manager; a second call is
    /// a logged no-op.
    ///
    /// The sink is held weakly so a dropped tracker never keeps the task
    /// pinging into the void.
    pub fn start_checker(self: &Arc<Self>, sink: Weak<dyn PingSink>) {
        let mut guard = match self.checker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.is_some() {
            warn!("session checker already running");
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = self.config.check_interval;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => manager.check(&sink),
                }
            }
            debug!("session checker stopped");
        });
        *guard = Some(CheckerHandle {
            stop: stop_tx,
            task,
        });
    }

    /// Stop the checker and wait for the task to finish (stop-then-drain).
    ///
    /// After this returns no further tick can rotate the session or request
    /// a ping. Safe to call when the checker never started.
    pub async fn stop_checker(&self) {
        let handle = {
            let mut guard = match self.checker.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.take()
        };
        if let Some(CheckerHandle { stop, task }) = handle {
            let _ = stop.send(true);
            if let Err(e) = task.await {
                warn!(error = %e, "session checker task did not shut down cleanly");
            }
        }
    }

    /// One checker tick: rotate on background expiry, ping on foreground
    /// idle. Never blocks event submission — state is only held long enough
    /// to read the clock and flip the branch.
    fn check(&self, sink: &Weak<dyn PingSink>) {
        let now = Instant::now();
        let ping_due = {
            let mut state = self.lock_state();
            let idle = now.saturating_duration_since(state.last_event);
            if state.background {
                if idle > self.config.background_timeout {
                    debug!(idle_secs = idle.as_secs(), "session expired in background");
                    Self::rotate_locked(&self.store, &mut state);
                }
                false
            } else if state.ping_enabled && idle > self.config.ping_interval {
                debug!(idle_secs = idle.as_secs(), "no event within ping interval");
                state.last_event = now;
                state.record.last_event_at = Utc::now();
                true
            } else {
                false
            }
        };
        if ping_due {
            match sink.upgrade() {
                Some(sink) => sink.send_ping(),
                None => debug!("ping due but the sink is gone"),
            }
        }
    }
}
