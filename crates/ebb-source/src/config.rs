//! Project configuration (`ebb.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use ebb_mdx::passes::{
    FrontmatterPass, HighlightPass, Highlighter, MetadataOptions, MetadataPass, PatchPass,
};
use ebb_mdx::{GitHistory, Processor};

/// Default configuration file name.
pub const CONFIG_FILE: &str = "ebb.toml";

/// Configuration file structure.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Content directory, relative to the configuration file.
    pub dir: PathBuf,

    /// Output directory, relative to the configuration file.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// File extensions compiled as MDX.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Passes over the syntax tree, in order.
    #[serde(default = "default_syntax_passes")]
    pub syntax_passes: Vec<String>,

    /// Passes over the rendering tree, in order.
    #[serde(default = "default_render_passes")]
    pub render_passes: Vec<String>,

    #[serde(default)]
    pub metadata: MetadataConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MetadataConfig {
    /// Name of the exported metadata binding.
    #[serde(default = "default_metadata_name")]
    pub name: String,

    /// Heading depths listed in the table of contents.
    #[serde(default = "default_toc_depth")]
    pub toc_depth: Vec<u8>,

    /// Copy frontmatter fields into the metadata.
    #[serde(default = "default_true")]
    pub merge_matters: bool,

    /// Seconds to wait for `git log` per file.
    #[serde(default = "default_git_timeout")]
    pub git_timeout: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: default_metadata_name(),
            toc_depth: default_toc_depth(),
            merge_matters: true,
            git_timeout: default_git_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HighlightConfig {
    #[serde(default = "default_light_theme")]
    pub light_theme: String,

    #[serde(default = "default_dark_theme")]
    pub dark_theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            light_theme: default_light_theme(),
            dark_theme: default_dark_theme(),
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from(".data")
}
fn default_extensions() -> Vec<String> {
    vec!["mdx".to_string()]
}
fn default_syntax_passes() -> Vec<String> {
    vec!["frontmatter".to_string(), "metadata".to_string()]
}
fn default_render_passes() -> Vec<String> {
    vec!["highlight".to_string(), "patch".to_string()]
}
fn default_metadata_name() -> String {
    "_metadata".to_string()
}
fn default_toc_depth() -> Vec<u8> {
    vec![2, 3]
}
fn default_true() -> bool {
    true
}
fn default_git_timeout() -> u64 {
    5
}
fn default_light_theme() -> String {
    Highlighter::DEFAULT_LIGHT.to_string()
}
fn default_dark_theme() -> String {
    Highlighter::DEFAULT_DARK.to_string()
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown {stage} pass `{name}`")]
    UnknownPass { stage: &'static str, name: String },

    #[error("Failed to set up highlighting: {0}")]
    Highlight(String),
}

impl SourceConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Whether `path` has one of the configured extensions.
    pub fn is_source(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Build the pass pipeline named by `syntax_passes` and `render_passes`.
    pub fn processor(&self) -> Result<Processor, ConfigError> {
        let mut processor = Processor::new();

        for name in &self.syntax_passes {
            processor = match name.as_str() {
                "frontmatter" => processor.syntax_pass(Box::new(FrontmatterPass)),
                "metadata" => {
                    processor.syntax_pass(Box::new(MetadataPass::new(self.metadata_options())))
                }
                _ => return Err(unknown("syntax", name)),
            };
        }

        // Grammars and themes are only loaded when highlighting is requested.
        let highlighter = self
            .render_passes
            .iter()
            .any(|name| name == "highlight")
            .then(|| {
                Highlighter::new(&self.highlight.light_theme, &self.highlight.dark_theme)
                    .map(Arc::new)
            })
            .transpose()
            .map_err(|e| ConfigError::Highlight(e.to_string()))?;

        for name in &self.render_passes {
            processor = match (name.as_str(), &highlighter) {
                ("highlight", Some(shared)) => {
                    processor.render_pass(Box::new(HighlightPass::new(shared.clone())))
                }
                ("patch", _) => processor.render_pass(Box::new(PatchPass)),
                _ => return Err(unknown("render", name)),
            };
        }

        Ok(processor)
    }

    fn metadata_options(&self) -> MetadataOptions {
        MetadataOptions {
            name: self.metadata.name.clone(),
            toc_depth: self.metadata.toc_depth.clone(),
            setup: self.metadata.merge_matters.then(MetadataOptions::merge_matters),
            history: Arc::new(GitHistory::new(std::time::Duration::from_secs(
                self.metadata.git_timeout,
            ))),
        }
    }
}

fn unknown(stage: &'static str, name: &str) -> ConfigError {
    ConfigError::UnknownPass {
        stage,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn applies_defaults() {
        let config: SourceConfig = toml::from_str("dir = \"content\"").unwrap();

        assert_eq!(config.dir, PathBuf::from("content"));
        assert_eq!(config.output, PathBuf::from(".data"));
        assert_eq!(config.extensions, vec!["mdx"]);
        assert_eq!(config.metadata, MetadataConfig::default());
        assert_eq!(config.highlight.dark_theme, "base16-ocean.dark");
        assert_eq!(
            config.processor().unwrap().pass_names(),
            vec!["frontmatter", "metadata", "highlight", "patch"]
        );
    }

    #[test]
    fn reads_sections() {
        let config: SourceConfig = toml::from_str(
            r#"
dir = "docs"
output = "out"
extensions = ["mdx", "md"]
render_passes = ["patch"]

[metadata]
name = "meta"
toc_depth = [2]
merge_matters = false
"#,
        )
        .unwrap();

        assert_eq!(config.metadata.name, "meta");
        assert_eq!(config.metadata.toc_depth, vec![2]);
        assert!(!config.metadata.merge_matters);
        assert!(config.is_source(Path::new("a/b.md")));
        assert!(!config.is_source(Path::new("a/b.txt")));
        assert_eq!(
            config.processor().unwrap().pass_names(),
            vec!["frontmatter", "metadata", "patch"]
        );
    }

    #[test]
    fn rejects_unknown_pass() {
        let config: SourceConfig =
            toml::from_str("dir = \"c\"\nsyntax_passes = [\"frontmatter\", \"emoji\"]").unwrap();

        let err = config.processor().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPass { stage: "syntax", ref name } if name == "emoji"));
    }

    #[test]
    fn rejects_unknown_theme() {
        let config: SourceConfig =
            toml::from_str("dir = \"c\"\n[highlight]\nlight_theme = \"nope\"").unwrap();

        assert!(matches!(config.processor(), Err(ConfigError::Highlight(_))));
    }

    #[test]
    fn missing_dir_is_a_parse_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        fs::write(&path, "output = \"x\"").unwrap();

        assert!(matches!(SourceConfig::load(&path), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            SourceConfig::load(&temp.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
