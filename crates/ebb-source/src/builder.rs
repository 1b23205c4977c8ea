//! Incremental content builder.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use ebb_mdx::{ProcessError, Processor};

use crate::cache::{self, CacheError, CacheMap, CONFIG_KEY};
use crate::config::{ConfigError, SourceConfig};
use crate::index::generate_index;
use crate::watcher::WatchEvent;

/// How a build treats previous output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// Full build: previous output and cache are always discarded.
    Build,
    /// Incremental build: unchanged files are skipped and the cache persisted.
    Dev,
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => f.write_str("build"),
            Self::Dev => f.write_str("dev"),
        }
    }
}

/// Outcome of compiling one source file.
#[derive(Debug)]
pub enum FileStatus {
    Compiled { duration: Duration },
    Cached,
    Failed(CompileError),
}

/// Result of a build operation.
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Number of files compiled
    pub compiled: usize,

    /// Number of files skipped as unchanged
    pub cached: usize,

    /// Number of files that failed to compile
    pub failed: usize,

    /// Total build time
    pub duration: Duration,

    /// Per-file outcomes, keyed by path relative to the content directory
    pub files: Vec<(String, FileStatus)>,
}

impl BuildReport {
    fn push(&mut self, path: String, status: FileStatus) {
        match status {
            FileStatus::Compiled { .. } => self.compiled += 1,
            FileStatus::Cached => self.cached += 1,
            FileStatus::Failed(_) => self.failed += 1,
        }
        self.files.push((path, status));
    }

    pub fn status(&self, path: &str) -> Option<&FileStatus> {
        self.files.iter().find(|(p, _)| p == path).map(|(_, s)| s)
    }
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read source directory {path}: {source}")]
    SourceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors that fail a single file.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compilation task failed: {0}")]
    Join(String),
}

/// Compiles a content directory into `<output>/source`, `<output>/index.js`
/// and, in dev mode, `<output>/cache.json`.
#[derive(Debug)]
pub struct SourceBuilder {
    config_path: PathBuf,
    root: PathBuf,
    config: SourceConfig,
    processor: Arc<Processor>,
    mode: BuildMode,
    cache: CacheMap,
}

impl SourceBuilder {
    /// Load the configuration at `config_path` and build its pass pipeline.
    pub fn new(config_path: &Path, mode: BuildMode) -> Result<Self, BuildError> {
        let config = SourceConfig::load(config_path)?;
        let processor = config.processor()?;
        let config_path = config_path
            .canonicalize()
            .map_err(|source| ConfigError::Read {
                path: config_path.to_path_buf(),
                source,
            })?;
        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Ok(Self {
            config_path,
            root,
            config,
            processor: Arc::new(processor),
            mode,
            cache: CacheMap::new(),
        })
    }

    /// Replace the pass pipeline built from the configuration.
    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = Arc::new(processor);
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join(&self.config.dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.config.output)
    }

    /// Directory holding the compiled modules.
    pub fn source_dir(&self) -> PathBuf {
        self.output_dir().join("source")
    }

    pub fn cache_path(&self) -> PathBuf {
        self.output_dir().join("cache.json")
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir().join("index.js")
    }

    /// Compile every source file whose modification time changed.
    pub async fn build(&mut self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();
        let content_dir = self.content_dir();
        tracing::info!("Compiling MDX sources in {} ({})", content_dir.display(), self.mode);

        let files = self.discover()?;
        let config_mtime = self.config_mtime().await?;

        let mut cache = CacheMap::load(&self.cache_path()).await;
        if cache.is_empty() {
            tracing::debug!("No cache at {}", self.cache_path().display());
        } else {
            tracing::debug!("Loaded {} cache entries", cache.len());
        }
        if self.mode == BuildMode::Build || cache.config_stamp() != Some(config_mtime) {
            tracing::debug!("Discarding previous output in {}", self.output_dir().display());
            remove_if_exists(&self.source_dir(), true).await?;
            remove_if_exists(&self.cache_path(), false).await?;
            cache.clear();
        }
        cache.record(CONFIG_KEY, config_mtime);
        self.cache = cache;

        let mut report = BuildReport::default();
        for path in files {
            let status = self.compile(&path).await;
            report.push(path, status);
        }

        self.persist().await?;

        report.duration = start.elapsed();
        tracing::info!(
            "Compiled {} files ({} cached, {} failed) in {:.2} ms",
            report.compiled,
            report.cached,
            report.failed,
            report.duration.as_secs_f64() * 1000.0
        );

        Ok(report)
    }

    /// Apply a file system change reported by the watcher.
    ///
    /// A change to the configuration file reloads it and rebuilds everything.
    /// Returns the status of the affected source file, if any was compiled.
    pub async fn apply(&mut self, event: &WatchEvent) -> Result<Option<FileStatus>, BuildError> {
        let path = event.path();
        if path == self.config_path {
            tracing::info!("{} changed, rebuilding", self.config_path.display());
            self.reload()?;
            self.build().await?;
            return Ok(None);
        }

        let Some(key) = self.source_key(path) else {
            return Ok(None);
        };

        let status = match event {
            WatchEvent::Changed(_) if path.is_file() => Some(self.compile(&key).await),
            _ => {
                self.remove(&key).await?;
                None
            }
        };

        self.persist().await?;
        Ok(status)
    }

    /// Reload the configuration and rebuild the pass pipeline.
    pub fn reload(&mut self) -> Result<(), BuildError> {
        let config = SourceConfig::load(&self.config_path)?;
        self.processor = Arc::new(config.processor()?);
        self.config = config;
        Ok(())
    }

    /// Relative source files in the content directory, sorted.
    fn discover(&self) -> Result<Vec<String>, BuildError> {
        let content_dir = self.content_dir();
        std::fs::read_dir(&content_dir).map_err(|source| BuildError::SourceDir {
            path: content_dir.clone(),
            source,
        })?;

        let mut files: Vec<String> = WalkDir::new(&content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.config.is_source(e.path()))
            .filter_map(|e| relative_key(&content_dir, e.path()))
            .collect();
        files.sort();

        Ok(files)
    }

    fn source_key(&self, path: &Path) -> Option<String> {
        if !self.config.is_source(path) {
            return None;
        }
        relative_key(&self.content_dir(), path)
    }

    async fn config_mtime(&self) -> Result<u64, BuildError> {
        let read_error = |source| ConfigError::Read {
            path: self.config_path.clone(),
            source,
        };
        let metadata = tokio::fs::metadata(&self.config_path)
            .await
            .map_err(read_error)?;
        Ok(cache::mtime(&metadata).map_err(read_error)?)
    }

    /// Compile one file and log its outcome.
    async fn compile(&mut self, key: &str) -> FileStatus {
        let status = match self.compile_file(key).await {
            Ok(status) => status,
            Err(err) => {
                self.cache.remove(key);
                FileStatus::Failed(err)
            }
        };

        match &status {
            FileStatus::Compiled { duration } => {
                tracing::info!("{} compiled in {:.2} ms", key, duration.as_secs_f64() * 1000.0)
            }
            FileStatus::Cached => tracing::info!("{} cached", key),
            FileStatus::Failed(err) => tracing::error!("{} failed: {}", key, err),
        }
        status
    }

    async fn compile_file(&mut self, key: &str) -> Result<FileStatus, CompileError> {
        let start = Instant::now();
        let path = self.content_dir().join(key);
        let read_error = |source| CompileError::Read {
            path: path.clone(),
            source,
        };

        let metadata = tokio::fs::metadata(&path).await.map_err(read_error)?;
        let mtime = cache::mtime(&metadata).map_err(read_error)?;
        if self.cache.is_fresh(key, mtime) {
            return Ok(FileStatus::Cached);
        }

        let source = tokio::fs::read_to_string(&path).await.map_err(read_error)?;

        let processor = self.processor.clone();
        let file = path.clone();
        let module = tokio::task::spawn_blocking(move || processor.process(file, &source))
            .await
            .map_err(|e| CompileError::Join(e.to_string()))??;

        let target = self.source_dir().join(module_path(key));
        let write_error = |source| CompileError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(&target, module.code)
            .await
            .map_err(write_error)?;

        self.cache.record(key, mtime);
        Ok(FileStatus::Compiled {
            duration: start.elapsed(),
        })
    }

    async fn remove(&mut self, key: &str) -> Result<(), BuildError> {
        remove_if_exists(&self.source_dir().join(module_path(key)), false).await?;
        self.cache.remove(key);
        tracing::info!("{} removed", key);
        Ok(())
    }

    /// Write the index and, in dev mode, the cache.
    async fn persist(&self) -> Result<(), BuildError> {
        let output_dir = self.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|source| BuildError::Output {
                path: output_dir.clone(),
                source,
            })?;

        if self.mode == BuildMode::Dev {
            self.cache.save(&self.cache_path()).await?;
        }

        let index_path = self.index_path();
        tokio::fs::write(&index_path, generate_index(&self.source_dir()))
            .await
            .map_err(|source| BuildError::Output {
                path: index_path,
                source,
            })
    }
}

/// Path of the compiled module for a source key.
fn module_path(key: &str) -> PathBuf {
    Path::new(key).with_extension("js")
}

/// `path` relative to `base`, joined with forward slashes.
fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

async fn remove_if_exists(path: &Path, dir: bool) -> Result<(), BuildError> {
    let result = if dir {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(BuildError::Output {
            path: path.to_path_buf(),
            source: err,
        }),
        _ => Ok(()),
    }
}
