//! HTTP client library for the ComfyUI generation engine.
//!
//! Provides the REST API wrapper (liveness, workflow submission,
//! history retrieval), the engine process launcher, and the shared
//! poll-until-ready primitive used by both the liveness check and the
//! completion check.

pub mod api;
pub mod launcher;
pub mod poll;
