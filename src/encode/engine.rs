use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::foundation::error::{ReelError, ReelResult};

/// A loaded video encoder with its own virtual file system.
///
/// Paths are relative, `/`-separated and never contain `..`. Every export stages frames into the
/// engine's storage, issues one `exec`, reads the container back, and deletes what it wrote.
#[async_trait::async_trait]
pub trait EncoderEngine: Send + Sync {
    async fn create_dir(&self, path: &str) -> ReelResult<()>;
    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> ReelResult<()>;
    async fn read_file(&self, path: &str) -> ReelResult<Vec<u8>>;
    async fn delete_file(&self, path: &str) -> ReelResult<()>;
    /// Remove a directory and everything below it.
    async fn delete_dir(&self, path: &str) -> ReelResult<()>;
    /// Run one encoder invocation with ffmpeg-style arguments.
    async fn exec(&self, args: &[String]) -> ReelResult<()>;
}

/// Shared handle to a ready engine.
pub type EncoderHandle = Arc<dyn EncoderEngine>;

/// Virtual directory frames are staged in.
pub const FRAME_DIR: &str = "frames";
/// Root-level container file the encoder writes.
pub const OUTPUT_FILE: &str = "output.mp4";

/// Reject absolute paths, empty segments and parent traversal.
pub fn validate_vfs_path(path: &str) -> ReelResult<()> {
    if path.is_empty() || path.starts_with('/') || path.contains('\\') {
        return Err(ReelError::validation(format!(
            "invalid encoder path '{path}'"
        )));
    }
    if path
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(ReelError::validation(format!(
            "invalid encoder path '{path}'"
        )));
    }
    Ok(())
}

/// One recorded [`InMemoryEngine::exec`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecRecord {
    pub args: Vec<String>,
    /// Number of consecutive frames the input pattern matched, starting at index 0.
    pub frames_consumed: usize,
}

/// In-memory engine for tests and debugging.
///
/// `exec` does not encode video: it resolves the `-i` image pattern the way ffmpeg's image
/// sequence demuxer does, then writes a small placeholder container to the last argument.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    state: Mutex<MemState>,
    fail_exec: Option<String>,
}

#[derive(Debug, Default)]
struct MemState {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    execs: Vec<ExecRecord>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose every `exec` fails with `message`.
    pub fn failing_exec(message: impl Into<String>) -> Self {
        Self {
            fail_exec: Some(message.into()),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    pub fn dir_names(&self) -> Vec<String> {
        self.lock().dirs.iter().cloned().collect()
    }

    pub fn exec_log(&self) -> Vec<ExecRecord> {
        self.lock().execs.clone()
    }

    /// Bytes currently held across all stored files.
    pub fn stored_bytes(&self) -> usize {
        self.lock().files.values().map(Vec::len).sum()
    }
}

fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(dir, _)| dir)
}

/// Expand a `%0Nd` pattern for `index`.
fn expand_pattern(pattern: &str, index: usize) -> Option<String> {
    let start = pattern.find('%')?;
    let rest = &pattern[start + 1..];
    let end = rest.find('d')?;
    let width: usize = rest[..end].trim_start_matches('0').parse().unwrap_or(0);
    Some(format!(
        "{}{:0width$}{}",
        &pattern[..start],
        index,
        &rest[end + 1..],
        width = width
    ))
}

#[async_trait::async_trait]
impl EncoderEngine for InMemoryEngine {
    async fn create_dir(&self, path: &str) -> ReelResult<()> {
        validate_vfs_path(path)?;
        self.lock().dirs.insert(path.to_owned());
        Ok(())
    }

    async fn write_file(&self, path: &str, bytes: Vec<u8>) -> ReelResult<()> {
        validate_vfs_path(path)?;
        let mut st = self.lock();
        if let Some(dir) = parent_dir(path)
            && !st.dirs.contains(dir)
        {
            return Err(ReelError::encode(format!(
                "write '{path}': directory '{dir}' does not exist"
            )));
        }
        st.files.insert(path.to_owned(), bytes);
        Ok(())
    }

    async fn read_file(&self, path: &str) -> ReelResult<Vec<u8>> {
        validate_vfs_path(path)?;
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ReelError::encode(format!("read '{path}': no such file")))
    }

    async fn delete_file(&self, path: &str) -> ReelResult<()> {
        validate_vfs_path(path)?;
        self.lock()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| ReelError::encode(format!("delete '{path}': no such file")))
    }

    async fn delete_dir(&self, path: &str) -> ReelResult<()> {
        validate_vfs_path(path)?;
        let mut st = self.lock();
        if !st.dirs.remove(path) {
            return Err(ReelError::encode(format!(
                "delete dir '{path}': no such directory"
            )));
        }
        let prefix = format!("{path}/");
        st.files.retain(|k, _| !k.starts_with(&prefix));
        st.dirs.retain(|d| !d.starts_with(&prefix));
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> ReelResult<()> {
        if let Some(msg) = &self.fail_exec {
            return Err(ReelError::encode(msg.clone()));
        }

        let pattern = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| ReelError::encode("exec: missing -i input"))?;
        let output = args
            .last()
            .ok_or_else(|| ReelError::encode("exec: missing output"))?;
        validate_vfs_path(output)?;

        let mut st = self.lock();
        let mut frames = 0usize;
        while let Some(name) = expand_pattern(pattern, frames)
            && st.files.contains_key(&name)
        {
            frames += 1;
        }
        if frames == 0 {
            return Err(ReelError::encode(format!(
                "exec: input pattern '{pattern}' matched no files"
            )));
        }

        st.files
            .insert(output.clone(), format!("placeholder-mp4 frames={frames}").into_bytes());
        st.execs.push(ExecRecord {
            args: args.to_vec(),
            frames_consumed: frames,
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/engine.rs"]
mod tests;
