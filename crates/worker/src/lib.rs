//! Serverless worker for tattoo try-on generation jobs.
//!
//! Receives an invocation payload, injects its parameters into the
//! fixed try-on workflow graph, submits the graph to a running ComfyUI
//! engine, waits for completion, and returns the generated images as
//! base64 strings in a uniform result payload.

pub mod config;
pub mod handler;
pub mod process;
