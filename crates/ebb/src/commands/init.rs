//! Initialize ebb in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub async fn run(config: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing ebb...");

    let root = config.parent().unwrap_or(Path::new(""));
    let content_dir = root.join("content");

    if config.exists() && !yes {
        tracing::warn!("{} already exists. Use --yes to overwrite.", config.display());
        return Ok(());
    }

    fs::write(config, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config.display()))?;
    tracing::info!("Created {}", config.display());

    fs::create_dir_all(&content_dir).context("Failed to create content directory")?;

    let index_path = content_dir.join("index.mdx");
    if !index_path.exists() || yes {
        fs::write(&index_path, DEFAULT_INDEX).context("Failed to write index.mdx")?;
        tracing::info!("Created {}", index_path.display());
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'ebb dev --watch' to compile content as it changes.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# ebb configuration

# Content directory
dir = "content"

# Output directory for compiled modules, cache and index
output = ".data"

# File extensions compiled as MDX
extensions = ["mdx"]

# Passes, in order
syntax_passes = ["frontmatter", "metadata"]
render_passes = ["highlight", "patch"]

[metadata]
# Name of the exported metadata binding
name = "_metadata"

# Heading depths listed in the table of contents
toc_depth = [2, 3]

# Copy frontmatter fields into the metadata
merge_matters = true

[highlight]
light_theme = "InspiredGitHub"
dark_theme = "base16-ocean.dark"
"#;

const DEFAULT_INDEX: &str = r#"---
description: 'Start here'
---

# Welcome

This page is compiled by ebb into `.data/source/index.js`.

## Getting started

Edit `content/index.mdx` and run `ebb dev` again. Unchanged pages are served
from the cache.

```sh [terminal]
ebb dev --watch
```
"#;
