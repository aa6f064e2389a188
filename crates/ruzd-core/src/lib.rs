//! # ruzd-core
//!
//! Foundation types for the Ruzd analytics SDK.
//!
//! This crate provides the shared vocabulary the session and tracker crates
//! depend on:
//!
//! - **Branded IDs**: [`ids::EventId`], [`ids::SessionId`], [`ids::PlayerId`] as newtypes
//! - **Envelopes**: [`envelope::Envelope`] — one outgoing event plus its contexts
//! - **Contexts**: [`context::Context`] — typed metadata attachments, unique per kind
//! - **Tracking levels**: [`level::TrackingLevel`] ordinal severity threshold
//! - **Run records**: [`run::RunRecord`] — current game-run identity
//! - **System info**: [`system::SystemInfoProvider`] seam and [`system::SystemSnapshot`]
//! - **Errors**: [`errors::ConfigError`] via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `ruzd-session` and `ruzd-tracker`.

#![deny(unsafe_code)]

pub mod constants;
pub mod context;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod level;
pub mod logging;
pub mod run;
pub mod system;
