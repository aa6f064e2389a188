//! # ruzd-session
//!
//! Session identity and lifecycle for the Ruzd analytics SDK.
//!
//! - [`record::SessionRecord`] — the persisted session state
//! - [`store::SessionStore`] — persistence seam with file and in-memory impls
//! - [`manager::SessionManager`] — rotation, context snapshots, and the
//!   periodic background/ping checker
//!
//! ## Crate Position
//!
//! Depends only on `ruzd-core`. Consumed by `ruzd-tracker`, which wires the
//! checker's ping requests back into the tracking gate.

#![deny(unsafe_code)]

pub mod manager;
pub mod record;
pub mod store;

pub use manager::{PingSink, SessionConfig, SessionManager};
pub use record::SessionRecord;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
