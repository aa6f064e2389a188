//! # ruzd-tracker
//!
//! The tracking gate: the single component that decides whether and when
//! telemetry events may leave the device.
//!
//! - [`tracker::Tracker`] — the gate state machine and SDK facade
//! - [`config::TrackerConfig`] — host-supplied configuration
//! - [`policy::PolicyClient`] — remote policy / feedback REST contract,
//!   with [`policy::HttpPolicyClient`] as the production implementation
//! - [`emitter::EventEmitter`] — seam to the transport that ships envelopes
//! - [`fps::FpsAggregator`] — frame-rate sampling helper
//!
//! ## Composition
//!
//! There is no lazy global instance. Build one [`tracker::Tracker`] at
//! application startup via [`tracker::TrackerBuilder`], keep the `Arc`, and
//! hand clones to callers. One tracker per process is the documented
//! invariant — the composition root enforces it, not a global accessor.

#![deny(unsafe_code)]

pub mod config;
pub mod emitter;
pub mod fps;
pub mod policy;
pub mod tracker;

pub use config::TrackerConfig;
pub use emitter::{EventEmitter, HttpMethod, HttpProtocol};
pub use policy::{FeedbackRecord, HttpPolicyClient, PolicyClient, PolicyError, RemotePolicy};
pub use tracker::{Phase, Tracker, TrackerBuilder};

/// SDK identifier sent with policy and feedback requests.
pub const SDK_VERSION: &str = concat!("ruzd-rs-", env!("CARGO_PKG_VERSION"));
