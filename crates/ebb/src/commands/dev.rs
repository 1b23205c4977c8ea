//! Incremental build command with optional watching.

use std::path::Path;

use anyhow::{Context, Result};
use ebb_source::{BuildMode, FileWatcher, SourceBuilder};

/// Run the dev command.
pub async fn run(config: &Path, watch: bool) -> Result<()> {
    let mut builder = SourceBuilder::new(config, BuildMode::Dev)
        .with_context(|| format!("Failed to load {}", config.display()))?;

    builder.build().await?;
    if !watch {
        return Ok(());
    }

    let paths = vec![builder.content_dir(), builder.config_path().to_path_buf()];
    let (_watcher, mut rx) = FileWatcher::new(&paths).context("Failed to start file watcher")?;
    tracing::info!("Watching {} for changes", builder.content_dir().display());

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                tracing::debug!("File event: {:?}", event);
                if let Err(e) = builder.apply(&event).await {
                    tracing::error!("{}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping");
                break;
            }
        }
    }

    Ok(())
}
