//! Current game-run identity.

use tracing::warn;

use crate::context::Context;

/// The active run (`run_id` + accumulated play time), attached as a context
/// to run-scoped events until replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunRecord {
    /// Run identifier chosen by the game.
    pub run_id: String,
    /// Accumulated play time in seconds.
    pub play_time_seconds: i64,
}

impl RunRecord {
    /// Start tracking a run.
    pub fn new(run_id: impl Into<String>, play_time_seconds: i64) -> Self {
        Self {
            run_id: run_id.into(),
            play_time_seconds,
        }
    }

    /// Update the active run.
    ///
    /// Play time regressing under the same `run_id` is a monotonic-time
    /// warning, not a rejection — the new values win either way.
    pub fn update(&mut self, run_id: &str, play_time_seconds: i64) {
        if run_id == self.run_id && play_time_seconds < self.play_time_seconds {
            warn!(
                run_id,
                old = self.play_time_seconds,
                new = play_time_seconds,
                "run play time decreased under the same run id"
            );
        }
        self.run_id = run_id.to_string();
        self.play_time_seconds = play_time_seconds;
    }

    /// Snapshot as an envelope context.
    pub fn to_context(&self) -> Context {
        Context::Run {
            run_id: self.run_id.clone(),
            play_time_seconds: self.play_time_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_replaces_values() {
        let mut run = RunRecord::new("r1", 10);
        run.update("r1", 25);
        assert_eq!(run.play_time_seconds, 25);
        run.update("r2", 0);
        assert_eq!(run.run_id, "r2");
        assert_eq!(run.play_time_seconds, 0);
    }

    #[test]
    fn regression_is_accepted_with_warning() {
        let mut run = RunRecord::new("r1", 100);
        // Logged, not rejected.
        run.update("r1", 50);
        assert_eq!(run.play_time_seconds, 50);
    }

    #[test]
    fn context_snapshot_carries_both_fields() {
        let run = RunRecord::new("r9", 77);
        match run.to_context() {
            Context::Run {
                run_id,
                play_time_seconds,
            } => {
                assert_eq!(run_id, "r9");
                assert_eq!(play_time_seconds, 77);
            }
            other => panic!("unexpected context {other:?}"),
        }
    }
}
