use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context as _;

use crate::encode::engine::{
    EncoderEngine, EncoderHandle, FRAME_DIR, OUTPUT_FILE, validate_vfs_path,
};
use crate::encode::resources::{ResourceBundle, ResourceKind};
use crate::encode::session::EngineLoader;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};

/// Media type marking a core runtime that is itself a native encoder executable.
pub const NATIVE_RUNTIME_MEDIA_TYPE: &str = "application/octet-stream";

/// Arguments of the single H.264 encode issued per export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct H264Args {
    pub fps: Fps,
    /// Constant rate factor, lower is better.
    pub quality: u32,
    pub input_pattern: String,
    pub output: String,
}

impl H264Args {
    pub fn new(fps: Fps, quality: u32) -> Self {
        Self {
            fps,
            quality,
            input_pattern: format!("{FRAME_DIR}/{}", FrameIndex::FILE_PATTERN),
            output: OUTPUT_FILE.to_owned(),
        }
    }

    pub fn to_args(&self) -> Vec<String> {
        let fps = self.fps.0.to_string();
        let crf = self.quality.to_string();
        [
            "-framerate",
            fps.as_str(),
            "-i",
            self.input_pattern.as_str(),
            "-c:v",
            "libx264",
            "-profile:v",
            "high",
            "-tune",
            "animation",
            "-crf",
            crf.as_str(),
            "-pix_fmt",
            "yuv420p",
            "-maxrate",
            "8M",
            "-bufsize",
            "16M",
            "-movflags",
            "+faststart",
            self.output.as_str(),
        ]
        .into_iter()
        .map(str::to_owned)
        .collect()
    }
}

/// Whether `program -version` runs successfully.
pub async fn is_ffmpeg_available(program: &Path) -> bool {
    tokio::process::Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Encoder engine backed by a system `ffmpeg` binary.
///
/// The virtual file system is a private temporary directory, used as the working directory of
/// every `exec`.
pub struct FfmpegCliEngine {
    program: PathBuf,
    root: tempfile::TempDir,
    _bundle: Option<ResourceBundle>,
}

impl std::fmt::Debug for FfmpegCliEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegCliEngine")
            .field("program", &self.program)
            .field("root", &self.root.path())
            .finish_non_exhaustive()
    }
}

impl FfmpegCliEngine {
    pub fn new(program: impl Into<PathBuf>, staging_root: Option<&Path>) -> ReelResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("chartreel-vfs-");
        let root = match staging_root {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .context("create encoder working directory")?;
        Ok(Self {
            program: program.into(),
            root,
            _bundle: None,
        })
    }

    fn with_bundle(mut self, bundle: ResourceBundle) -> Self {
        self._bundle = Some(bundle);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    fn resolve(&self, path: &str) -> ReelResult<PathBuf> {
        validate_vfs_path(path)?;
        Ok(self.root.path().join(path))
    }
}

fn io_err(op: &str, path: &str, e: std::io::Error) -> ReelError {
    ReelError::encode(format!("{op} '{path}': {e}"))
}

#[async_trait::async_trait]
impl EncoderEngine for FfmpegCliEngine {
    async fn create_dir(&self, path: &str) -> ReelResult<()> {
        let p = self.resolve(path)?;
        tokio::fs::create_dir_all(&p)
            .await
            .map_err(|e| io_err("create dir", path, e))
    }

    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> ReelResult<()> {
        let p = self.resolve(path)?;
        tokio::fs::write(&p, bytes)
            .await
            .map_err(|e| io_err("write", path, e))
    }

    async fn read_file(&self, path: &str) -> ReelResult<Vec<u8>> {
        let p = self.resolve(path)?;
        tokio::fs::read(&p).await.map_err(|e| io_err("read", path, e))
    }

    async fn delete_file(&self, path: &str) -> ReelResult<()> {
        let p = self.resolve(path)?;
        tokio::fs::remove_file(&p)
            .await
            .map_err(|e| io_err("delete", path, e))
    }

    async fn delete_dir(&self, path: &str) -> ReelResult<()> {
        let p = self.resolve(path)?;
        tokio::fs::remove_dir_all(&p)
            .await
            .map_err(|e| io_err("delete dir", path, e))
    }

    async fn exec(&self, args: &[String]) -> ReelResult<()> {
        tracing::debug!(program = %self.program.display(), ?args, "running encoder");

        let output = tokio::process::Command::new(&self.program)
            .arg("-y")
            .args(["-loglevel", "error"])
            .args(args)
            .current_dir(self.root.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                ReelError::encode(format!(
                    "failed to spawn '{}': {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReelError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Builds an [`FfmpegCliEngine`] from a fetched resource bundle.
///
/// A core runtime tagged `application/octet-stream` is run directly as the encoder executable;
/// otherwise the configured program is used and must answer `-version`. In that case the bundle
/// is only checked for completeness: the browser runtime, wasm binary and worker script are kept
/// staged for the engine's lifetime but never executed. Point the manifest at a native runtime
/// to avoid downloading them.
#[derive(Clone, Debug)]
pub struct FfmpegCliLoader {
    pub program: PathBuf,
    pub staging_root: Option<PathBuf>,
}

impl Default for FfmpegCliLoader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            staging_root: None,
        }
    }
}

#[async_trait::async_trait]
impl EngineLoader for FfmpegCliLoader {
    async fn load(&self, bundle: ResourceBundle) -> ReelResult<EncoderHandle> {
        for kind in ResourceKind::ALL {
            if bundle.get(kind).is_none() {
                return Err(ReelError::initialization(format!(
                    "resource bundle is missing {kind:?}"
                )));
            }
        }

        let program = match bundle.get(ResourceKind::CoreRuntime) {
            Some(core) if core.media_type == NATIVE_RUNTIME_MEDIA_TYPE => {
                mark_executable(&core.path).await?;
                core.path.clone()
            }
            _ => self.program.clone(),
        };

        if !is_ffmpeg_available(&program).await {
            return Err(ReelError::initialization(format!(
                "encoder program '{}' is not runnable",
                program.display()
            )));
        }

        let engine = FfmpegCliEngine::new(program, self.staging_root.as_deref())
            .map_err(|e| ReelError::initialization(e.to_string()))?
            .with_bundle(bundle);
        tracing::info!(program = %engine.program().display(), "encoder engine ready");
        Ok(Arc::new(engine))
    }
}

#[cfg(unix)]
async fn mark_executable(path: &Path) -> ReelResult<()> {
    use std::os::unix::fs::PermissionsExt as _;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| {
            ReelError::initialization(format!("chmod '{}': {e}", path.display()))
        })
}

#[cfg(not(unix))]
async fn mark_executable(_path: &Path) -> ReelResult<()> {
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
