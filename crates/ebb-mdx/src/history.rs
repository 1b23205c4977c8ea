//! Version-control lookups for page metadata.

use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Source of last-modified times for content files.
pub trait History: Send + Sync {
    /// Epoch milliseconds of the latest commit touching `path`, or `None`
    /// if the file has no recorded history.
    fn last_updated(&self, path: &Path) -> Option<i64>;
}

/// Reads commit times with `git log`.
#[derive(Debug, Clone)]
pub struct GitHistory {
    timeout: Duration,
}

impl GitHistory {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for GitHistory {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl History for GitHistory {
    fn last_updated(&self, path: &Path) -> Option<i64> {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());

        let mut command = Command::new("git");
        command
            .args(["log", "-1", "--pretty=format:%ct", "--"])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = dir {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("git unavailable: {}", e);
                return None;
            }
        };

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                Ok(None) => {
                    tracing::warn!("git log timed out for {}", path.display());
                    let _ = child.kill();
                    let _ = child.wait();
                    return None;
                }
                Err(e) => {
                    tracing::debug!("git log failed for {}: {}", path.display(), e);
                    return None;
                }
            }
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }
        parse_commit_time(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Parse `%ct` output (epoch seconds) into epoch milliseconds.
fn parse_commit_time(output: &str) -> Option<i64> {
    let seconds: i64 = output.trim().parse().ok()?;
    Some(seconds * 1000)
}
