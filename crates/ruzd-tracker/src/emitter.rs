//! Seam to the event transport.
//!
//! The emitter owns its own queue and transport thread; the gate only
//! configures it and hands envelopes over. `enqueue` must never block on
//! network I/O — it is called from the game's main thread, potentially once
//! per frame.

use ruzd_core::envelope::Envelope;

/// HTTP method the collector is addressed with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HttpMethod {
    /// Batched POST requests.
    #[default]
    Post,
    /// Pixel-style GET requests.
    Get,
}

impl HttpMethod {
    /// Default collector path for this method, appended when the host gives
    /// no explicit path override.
    pub fn default_path(self) -> &'static str {
        match self {
            Self::Post => "/com.ruzd/tp2",
            Self::Get => "/i",
        }
    }
}

/// Transport protocol toward the collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HttpProtocol {
    /// Plain HTTP (development collectors).
    Http,
    /// TLS.
    #[default]
    Https,
}

/// The transport that serializes and ships event batches to the collector.
///
/// Implemented outside this crate; the gate treats it as a sink. All methods
/// are expected to be cheap — configuration mutates internal state and
/// `enqueue` appends to the emitter's own durable queue.
pub trait EventEmitter: Send + Sync {
    /// Point the transport at a resolved collector URI.
    fn set_collector_uri(&self, uri: &str);
    /// Select the HTTP method.
    fn set_method(&self, method: HttpMethod);
    /// Select the transport protocol.
    fn set_protocol(&self, protocol: HttpProtocol);
    /// Hand one envelope over for transmission. Must not block.
    fn enqueue(&self, envelope: Envelope);
    /// Open the transport.
    fn start(&self);
    /// Close the transport; queued envelopes are the emitter's concern.
    fn stop(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_per_method() {
        assert_eq!(HttpMethod::Post.default_path(), "/com.ruzd/tp2");
        assert_eq!(HttpMethod::Get.default_path(), "/i");
    }

    #[test]
    fn defaults_favor_batched_tls() {
        assert_eq!(HttpMethod::default(), HttpMethod::Post);
        assert_eq!(HttpProtocol::default(), HttpProtocol::Https);
    }
}
