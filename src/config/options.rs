// src/config/options.rs
//
// Session options: how a decode session sizes its frames and configures
// the underlying container reader and decoder.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the nominal frame size reported by a session is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSizePolicy {
    /// One second of samples. Large enough for every common codec.
    #[default]
    OneSecond,
    /// Decode the first frame during open, use its size (or the codec's
    /// declared maximum, whichever is larger), then rewind to the start.
    Probe,
}

/// Options applied when opening a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub frame_size: FrameSizePolicy,
    /// File extension to hint the container prober with, overriding the
    /// path's own extension
    pub format_hint: Option<String>,
    /// Trim encoder delay and padding where the container describes them
    pub enable_gapless: bool,
    /// Verify codec checksums (e.g. FLAC frame MD5) while decoding
    pub verify_checksums: bool,
}

impl SessionOptions {
    pub fn builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::new()
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(hint) = &self.format_hint {
            if hint.is_empty() || hint.contains(['/', '\\', '.']) {
                return Err(Error::Config(format!(
                    "format hint must be a bare extension, got {:?}",
                    hint
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct SessionOptionsBuilder {
    options: SessionOptions,
}

impl SessionOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_size(mut self, policy: FrameSizePolicy) -> Self {
        self.options.frame_size = policy;
        self
    }

    pub fn format_hint(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        self.options.format_hint = Some(extension.trim_start_matches('.').to_string());
        self
    }

    pub fn enable_gapless(mut self, enable: bool) -> Self {
        self.options.enable_gapless = enable;
        self
    }

    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.options.verify_checksums = verify;
        self
    }

    pub fn build(self) -> Result<SessionOptions> {
        self.options.validate()?;
        Ok(self.options)
    }
}
