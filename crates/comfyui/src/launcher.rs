//! Engine process lifecycle.
//!
//! Starting the engine is deployment plumbing, not job logic, so it
//! lives in its own collaborator that the job processor takes as a
//! dependency. The launcher probes the engine's liveness endpoint,
//! optionally spawns the engine process when it is not reachable, and
//! waits for it to come up with the shared poll primitive.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tryon_core::error::JobError;

use crate::api::ComfyApi;
use crate::poll::{poll_until, PollConfig, PollOutcome};

/// Command used to start the engine when it is not already running.
#[derive(Debug, Clone)]
pub struct LaunchCommand {
    /// Program to execute, e.g. `python`.
    pub program: String,
    /// Arguments, e.g. `main.py --listen 0.0.0.0 --port 8188`.
    pub args: Vec<String>,
    /// Working directory of the engine checkout.
    pub working_dir: PathBuf,
}

/// Errors from the engine lifecycle layer.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// The engine never answered the liveness probe.
    #[error("Engine did not become reachable within {attempts} attempts")]
    Unavailable { attempts: u32 },

    /// Spawning the engine process failed.
    #[error("Failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),

    /// The startup wait was cancelled.
    #[error("Engine startup wait was cancelled")]
    Cancelled,
}

/// Health-checks the engine and launches it on demand.
///
/// With no [`LaunchCommand`] configured the launcher only probes,
/// which is the right mode when something else (a container
/// supervisor, a shared host) owns the engine process.
pub struct EngineLauncher {
    command: Option<LaunchCommand>,
    liveness: PollConfig,
}

impl EngineLauncher {
    pub fn new(command: Option<LaunchCommand>, liveness: PollConfig) -> Self {
        Self { command, liveness }
    }

    /// Make sure the engine behind `api` is reachable.
    ///
    /// Fast path: one probe, already up. Otherwise spawn the configured
    /// command (if any) and poll the liveness endpoint until it answers
    /// or the attempt ceiling is hit.
    pub async fn ensure_running(
        &self,
        api: &ComfyApi,
        cancel: &CancellationToken,
    ) -> Result<(), LauncherError> {
        if api.queue_state().await.is_ok() {
            tracing::debug!("Engine already reachable");
            return Ok(());
        }

        if let Some(cmd) = &self.command {
            tracing::info!(program = %cmd.program, "Launching generation engine");
            let mut command = tokio::process::Command::new(&cmd.program);
            command.args(&cmd.args).current_dir(&cmd.working_dir);
            // The engine outlives individual jobs; the child handle is
            // dropped without kill_on_drop so it keeps running.
            command.spawn()?;
        }

        let outcome = poll_until(&self.liveness, cancel, || async move {
            api.queue_state().await.ok()
        })
        .await;

        match outcome {
            PollOutcome::Ready(()) => {
                tracing::info!("Engine is up");
                Ok(())
            }
            PollOutcome::Exhausted { attempts } => Err(LauncherError::Unavailable { attempts }),
            PollOutcome::Cancelled => Err(LauncherError::Cancelled),
        }
    }
}

impl From<LauncherError> for JobError {
    fn from(e: LauncherError) -> Self {
        match e {
            LauncherError::Unavailable { attempts } => JobError::EngineUnavailable { attempts },
            LauncherError::Spawn(e) => JobError::Io(e),
            LauncherError::Cancelled => {
                JobError::Unexpected("engine startup wait was cancelled".to_string())
            }
        }
    }
}
