//! Argument plumbing for the `streamtap` CLI.
//!
//! The consumption engine lives in `streamtap-kafka`; this crate only
//! resolves configuration and renders output:
//!
//! - Property-set resolution: authentication and broker properties from
//!   explicit file paths or embedded defaults
//! - Console reporting: record sinks plus the schema/metrics/topics blocks

pub mod config;
pub mod output;
