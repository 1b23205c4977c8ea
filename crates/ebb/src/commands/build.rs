//! Full build command.

use std::path::Path;

use anyhow::{Context, Result};
use ebb_source::{BuildMode, SourceBuilder};

/// Run the build command.
pub async fn run(config: &Path) -> Result<()> {
    let mut builder = SourceBuilder::new(config, BuildMode::Build)
        .with_context(|| format!("Failed to load {}", config.display()))?;

    let report = builder.build().await?;
    if report.failed > 0 {
        tracing::warn!("{} files failed to compile", report.failed);
    }
    tracing::info!("Output: {}", builder.output_dir().display());

    Ok(())
}
