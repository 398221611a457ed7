//! Invocation handler boundary.
//!
//! Whatever happens inside a job, the caller always receives the same
//! result shape: `{stdout, stderr, tryon_images}`. Errors are converted
//! here and never propagate past this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tryon_comfyui::api::ComfyApi;
use tryon_comfyui::launcher::EngineLauncher;

use crate::config::WorkerConfig;
use crate::process::process_job;

/// Uniform result payload returned for every invocation.
///
/// Success is distinguished by an empty `stderr`; on any handled
/// failure `stdout` is empty and `tryon_images` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub stdout: String,
    pub stderr: String,
    pub tryon_images: Vec<String>,
}

impl JobResult {
    pub fn success(stdout: impl Into<String>, tryon_images: Vec<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            tryon_images,
        }
    }

    pub fn failure(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            tryon_images: Vec::new(),
        }
    }
}

/// Process one invocation payload, converting any error into the
/// uniform failure payload.
pub async fn run(config: &WorkerConfig, payload: &Value) -> JobResult {
    let api = ComfyApi::new(config.api_url.clone());
    let launcher = EngineLauncher::new(config.launch.clone(), config.liveness);
    let cancel = CancellationToken::new();

    match process_job(config, &api, &launcher, payload, &cancel).await {
        Ok(output) => JobResult::success(
            format!("Workflow {} executed successfully.", output.prompt_id),
            output.images,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Job failed");
            JobResult::failure(e.to_string())
        }
    }
}
