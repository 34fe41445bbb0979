//! Optional external backends, detected once at startup.

use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// An optional capability of the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// ffmpeg is installed and can merge audio
    AudioMerge,
}

/// The set of capabilities available to this run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    available: BTreeSet<Capability>,
    ffmpeg: Option<PathBuf>,
}

impl Capabilities {
    /// No optional backend available.
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe the host. `ffmpeg_override` takes precedence over `PATH`.
    pub fn detect(ffmpeg_override: Option<&Path>) -> Self {
        let mut caps = Self::none();

        let candidate = match ffmpeg_override {
            Some(path) => Some(path.to_path_buf()),
            None => which::which("ffmpeg").ok(),
        };

        if let Some(ffmpeg) = candidate {
            if runs_version(&ffmpeg) {
                debug!("ffmpeg found at {}", ffmpeg.display());
                caps.available.insert(Capability::AudioMerge);
                caps.ffmpeg = Some(ffmpeg);
            } else {
                debug!("ffmpeg at {} does not run", ffmpeg.display());
            }
        }

        caps
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.available.contains(&capability)
    }

    /// Available capabilities in a stable order.
    pub fn list(&self) -> Vec<Capability> {
        self.available.iter().copied().collect()
    }

    /// Resolved ffmpeg executable, when audio merging is available.
    pub fn ffmpeg(&self) -> Option<&Path> {
        self.ffmpeg.as_deref()
    }
}

#[cfg(test)]
impl Capabilities {
    /// Merge capability backed by the given ffmpeg executable.
    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<PathBuf>) -> Self {
        self.available.insert(Capability::AudioMerge);
        self.ffmpeg = Some(ffmpeg.into());
        self
    }
}

fn runs_version(executable: &Path) -> bool {
    Command::new(executable)
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
