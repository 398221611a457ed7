use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tryon_worker::config::WorkerConfig;
use tryon_worker::handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tryon_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    // One invocation per process: payload JSON on stdin, result JSON on
    // stdout. The serverless runtime owns the outer loop.
    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;
    let payload: serde_json::Value = serde_json::from_str(&raw)?;

    let result = handler::run(&config, &payload).await;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
