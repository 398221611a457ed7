//! Single-job processing pipeline.
//!
//! One job runs synchronously end to end:
//! extract parameters, create the job directory, materialize input
//! images, patch and persist the workflow document, make sure the
//! engine is up, submit, poll history until the prompt id appears,
//! collect outputs. The job directory is removed on every exit path,
//! strictly after output collection.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tryon_comfyui::api::ComfyApi;
use tryon_comfyui::launcher::EngineLauncher;
use tryon_comfyui::poll::{poll_until, PollOutcome};
use tryon_core::error::JobError;
use tryon_core::images::{collect_output_images, save_base64_image};
use tryon_core::jobdir::JobDir;
use tryon_core::params::TryonParams;
use tryon_core::workflow::{ImagePaths, WorkflowTemplate, DEFAULT_BINDINGS};

use crate::config::WorkerConfig;

/// Successful outcome of one job.
#[derive(Debug)]
pub struct JobOutput {
    /// Engine-assigned prompt id of the executed workflow.
    pub prompt_id: String,
    /// Generated images, base64-encoded, sorted by filename.
    pub images: Vec<String>,
}

/// Process one invocation payload end to end.
///
/// The job directory is cleaned up before returning, on success and
/// failure alike.
pub async fn process_job(
    config: &WorkerConfig,
    api: &ComfyApi,
    launcher: &EngineLauncher,
    payload: &Value,
    cancel: &CancellationToken,
) -> Result<JobOutput, JobError> {
    let params = TryonParams::from_payload(payload)?;

    let job_dir = JobDir::create(&config.workdir)?;
    tracing::info!(job_id = %job_dir.job_id(), "Job received");

    let result = run_job(config, api, launcher, &params, &job_dir, cancel).await;
    job_dir.cleanup();
    result
}

/// Everything that happens between job-directory creation and cleanup.
async fn run_job(
    config: &WorkerConfig,
    api: &ComfyApi,
    launcher: &EngineLauncher,
    params: &TryonParams,
    job_dir: &JobDir,
    cancel: &CancellationToken,
) -> Result<JobOutput, JobError> {
    // Materialize whichever input images the request carried.
    let mut images = ImagePaths::default();
    if let Some(b64) = &params.human_image {
        let path = job_dir.human_image_path();
        save_base64_image("human_image", b64, &path)?;
        images.human = Some(path);
    }
    if let Some(b64) = &params.tattoo_image {
        let path = job_dir.tattoo_image_path();
        save_base64_image("Tattooimage", b64, &path)?;
        images.tattoo = Some(path);
    }
    if let Some(b64) = &params.mask {
        let path = job_dir.mask_image_path();
        save_base64_image("mask", b64, &path)?;
        images.mask = Some(path);
    }

    // Patch the template and persist the submitted document alongside
    // the job's other artifacts.
    let mut template = WorkflowTemplate::load(&config.template_path, DEFAULT_BINDINGS)?;
    let prefix = job_dir.output_prefix();
    template.patch(params, &images, &prefix);
    std::fs::write(
        job_dir.workflow_path(),
        serde_json::to_vec(template.as_value())?,
    )?;

    launcher.ensure_running(api, cancel).await?;

    let client_id = uuid::Uuid::new_v4().to_string();
    let submitted = api.submit(template.as_value(), &client_id).await?;
    let prompt_id = submitted
        .prompt_id
        .ok_or_else(|| JobError::Unexpected("engine returned no prompt_id".to_string()))?;
    tracing::info!(
        job_id = %job_dir.job_id(),
        prompt_id = %prompt_id,
        queue_position = submitted.number,
        "Workflow submitted",
    );

    // The history endpoint answers with a map keyed by prompt id once
    // the job has finished executing.
    let outcome = poll_until(&config.completion, cancel, || {
        let prompt_id = prompt_id.clone();
        async move {
            match api.history(&prompt_id).await {
                Ok(history) if history.get(prompt_id.as_str()).is_some() => Some(()),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(error = %e, "History poll failed");
                    None
                }
            }
        }
    })
    .await;

    match outcome {
        PollOutcome::Ready(()) => {}
        PollOutcome::Exhausted { attempts } => return Err(JobError::Timeout { attempts }),
        PollOutcome::Cancelled => {
            return Err(JobError::Unexpected(
                "job cancelled while waiting for completion".to_string(),
            ));
        }
    }

    let collected = collect_output_images(&job_dir.output_dir(), &prefix)?;
    tracing::info!(
        job_id = %job_dir.job_id(),
        prompt_id = %prompt_id,
        image_count = collected.len(),
        "Job completed",
    );

    Ok(JobOutput {
        prompt_id,
        images: collected,
    })
}
