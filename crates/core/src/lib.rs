//! Core domain logic for the tryon generation worker.
//!
//! Houses the invocation parameter model, base64 image materialization
//! and output collection, job working-directory lifecycle, workflow
//! template patching, and the shared error taxonomy.

pub mod error;
pub mod images;
pub mod jobdir;
pub mod params;
pub mod workflow;
