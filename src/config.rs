use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context as _;

use crate::encode::session::EncoderConfig;
use crate::export::pipeline::DEFAULT_BATCH_SIZE;
use crate::export::request::ExportRequest;
use crate::foundation::error::{ReelError, ReelResult};

/// Frame pipeline tuning.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frames captured concurrently per batch.
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Everything a `chartreel` run can be configured with. All sections are optional.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub encoder: EncoderConfig,
    pub pipeline: PipelineConfig,
    /// Request defaults; explicit request fields take precedence.
    pub request: ExportRequest,
}

impl ReelConfig {
    pub fn from_reader<R: std::io::Read>(r: R) -> ReelResult<Self> {
        let cfg: ReelConfig = serde_json::from_reader(r)
            .map_err(|e| ReelError::validation(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.pipeline.batch_size == 0 {
            return Err(ReelError::validation("pipeline.batch_size must be > 0"));
        }
        self.encoder.manifest.validate()
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
