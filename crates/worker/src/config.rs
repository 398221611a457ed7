//! Worker configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use tryon_comfyui::launcher::LaunchCommand;
use tryon_comfyui::poll::PollConfig;

/// Worker configuration.
///
/// All fields have defaults matching the standard container layout.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base HTTP URL of the generation engine (default: `http://127.0.0.1:8188`).
    pub api_url: String,
    /// Engine checkout; job directories are created under `{workdir}/jobs`
    /// (default: `/workspace/ComfyUI`).
    pub workdir: PathBuf,
    /// Path of the workflow graph template
    /// (default: `/workspace/baseGraphTemplate.json`).
    pub template_path: PathBuf,
    /// Engine launch command, when this worker owns the engine process.
    /// `None` means probe-only: something else supervises the engine.
    pub launch: Option<LaunchCommand>,
    /// Tuning for the engine liveness check.
    pub liveness: PollConfig,
    /// Tuning for the job completion check.
    pub completion: PollConfig,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                            |
    /// |-----------------------------|------------------------------------|
    /// | `COMFY_API_URL`             | `http://127.0.0.1:8188`            |
    /// | `TRYON_WORKDIR`             | `/workspace/ComfyUI`               |
    /// | `TRYON_WORKFLOW_TEMPLATE`   | `/workspace/baseGraphTemplate.json`|
    /// | `TRYON_LAUNCH_ENGINE`       | `false`                            |
    /// | `TRYON_LIVENESS_ATTEMPTS`   | `30`                               |
    /// | `TRYON_COMPLETION_ATTEMPTS` | `60`                               |
    /// | `TRYON_POLL_INTERVAL_SECS`  | `2`                                |
    pub fn from_env() -> Self {
        let api_url = std::env::var("COMFY_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8188".into());

        let workdir = PathBuf::from(
            std::env::var("TRYON_WORKDIR").unwrap_or_else(|_| "/workspace/ComfyUI".into()),
        );

        let template_path = PathBuf::from(
            std::env::var("TRYON_WORKFLOW_TEMPLATE")
                .unwrap_or_else(|_| "/workspace/baseGraphTemplate.json".into()),
        );

        let launch_engine: bool = std::env::var("TRYON_LAUNCH_ENGINE")
            .unwrap_or_else(|_| "false".into())
            .parse()
            .expect("TRYON_LAUNCH_ENGINE must be true or false");
        let launch = launch_engine.then(|| LaunchCommand {
            program: "python".into(),
            args: ["main.py", "--listen", "0.0.0.0", "--port", "8188"]
                .map(String::from)
                .to_vec(),
            working_dir: workdir.clone(),
        });

        let liveness_attempts: u32 = std::env::var("TRYON_LIVENESS_ATTEMPTS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("TRYON_LIVENESS_ATTEMPTS must be a valid u32");

        let completion_attempts: u32 = std::env::var("TRYON_COMPLETION_ATTEMPTS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("TRYON_COMPLETION_ATTEMPTS must be a valid u32");

        let poll_interval_secs: u64 = std::env::var("TRYON_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("TRYON_POLL_INTERVAL_SECS must be a valid u64");
        let interval = Duration::from_secs(poll_interval_secs);

        Self {
            api_url,
            workdir,
            template_path,
            launch,
            liveness: PollConfig::new(liveness_attempts, interval),
            completion: PollConfig::new(completion_attempts, interval),
        }
    }
}
