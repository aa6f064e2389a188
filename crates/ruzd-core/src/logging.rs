//! Tracing setup helper for hosts and examples.
//!
//! The SDK itself only emits `tracing` events; installing a subscriber is the
//! host's decision. This helper exists so integrating games get sane output
//! with one call.

use tracing_subscriber::EnvFilter;

/// Install a formatted `tracing` subscriber.
///
/// `default_filter` is used when `RUST_LOG` is unset (e.g. `"ruzd=info"`).
/// Safe to call more than once — later calls are no-ops.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn init_is_idempotent() {
        init("ruzd=debug");
        init("ruzd=warn");
    }
}
