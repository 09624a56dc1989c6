//! Encoder resource bundle: manifest, fetching with CDN fallback and backoff, local staging.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use sha2::Digest as _;

use crate::foundation::error::{ReelError, ReelResult};

/// The three artifacts an encoder build is loaded from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    CoreRuntime,
    WasmBinary,
    WorkerScript,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::CoreRuntime, Self::WasmBinary, Self::WorkerScript];

    pub fn default_media_type(self) -> &'static str {
        match self {
            Self::CoreRuntime | Self::WorkerScript => "text/javascript",
            Self::WasmBinary => "application/wasm",
        }
    }
}

/// Where one resource comes from, in priority order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceSpec {
    pub kind: ResourceKind,
    /// File name the resource is staged under.
    pub file_name: String,
    pub media_type: String,
    /// Primary source first, then fallbacks.
    pub sources: Vec<String>,
    /// Expected lowercase hex SHA-256 of the payload, if pinned.
    #[serde(default)]
    pub sha256: Option<String>,
}

const CORE_VERSION: &str = "0.12.6";
const PRIMARY_CDN: &str = "https://unpkg.com/@ffmpeg/core-mt";
const FALLBACK_CDN: &str = "https://cdn.jsdelivr.net/npm/@ffmpeg/core-mt";

impl ResourceSpec {
    fn from_cdns(kind: ResourceKind, file_name: &str) -> Self {
        let sources = [PRIMARY_CDN, FALLBACK_CDN]
            .iter()
            .map(|base| format!("{base}@{CORE_VERSION}/dist/esm/{file_name}"))
            .collect();
        Self {
            kind,
            file_name: file_name.to_owned(),
            media_type: kind.default_media_type().to_owned(),
            sources,
            sha256: None,
        }
    }
}

/// The full set of resources an encoder load requires.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceManifest {
    pub resources: Vec<ResourceSpec>,
}

impl Default for ResourceManifest {
    fn default() -> Self {
        Self {
            resources: vec![
                ResourceSpec::from_cdns(ResourceKind::CoreRuntime, "ffmpeg-core.js"),
                ResourceSpec::from_cdns(ResourceKind::WasmBinary, "ffmpeg-core.wasm"),
                ResourceSpec::from_cdns(ResourceKind::WorkerScript, "ffmpeg-core.worker.js"),
            ],
        }
    }
}

impl ResourceManifest {
    /// Every kind must appear exactly once, with at least one source and a safe file name.
    pub fn validate(&self) -> ReelResult<()> {
        for kind in ResourceKind::ALL {
            let count = self.resources.iter().filter(|r| r.kind == kind).count();
            if count != 1 {
                return Err(ReelError::validation(format!(
                    "resource manifest must list {kind:?} exactly once (found {count})"
                )));
            }
        }
        for r in &self.resources {
            if r.sources.is_empty() {
                return Err(ReelError::validation(format!(
                    "resource '{}' has no sources",
                    r.file_name
                )));
            }
            if r.file_name.is_empty()
                || r.file_name.contains(['/', '\\'])
                || r.file_name.starts_with('.')
            {
                return Err(ReelError::validation(format!(
                    "resource file name '{}' is not a plain file name",
                    r.file_name
                )));
            }
        }
        Ok(())
    }
}

/// Per-source retry schedule for resource fetches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts_per_source: u32,
    pub initial_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts_per_source: 3,
            initial_backoff_ms: 1_000,
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed attempt `attempt` (0-based): 1s, 2s, 4s with the defaults.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(1u64 << attempt.min(16)),
        )
    }
}

/// Retrieves raw resource bytes from a URL.
#[async_trait::async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>>;
}

/// HTTP(S) fetcher backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request '{url}'"))?
            .error_for_status()
            .with_context(|| format!("fetch '{url}'"))?;
        let bytes = resp
            .bytes()
            .await
            .with_context(|| format!("read body of '{url}'"))?;
        Ok(bytes.to_vec())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

/// Fetch one resource, walking its sources in order and retrying each with backoff.
pub async fn fetch_with_fallback(
    fetcher: &dyn ResourceFetcher,
    spec: &ResourceSpec,
    policy: RetryPolicy,
) -> ReelResult<Vec<u8>> {
    let attempts = policy.attempts_per_source.max(1);
    let total = spec.sources.len() * attempts as usize;
    let mut tried = 0usize;
    let mut last_error = String::from("no sources configured");

    for url in &spec.sources {
        for attempt in 0..attempts {
            tried += 1;
            let outcome = fetcher.fetch(url).await.and_then(|bytes| {
                if let Some(expected) = &spec.sha256 {
                    let actual = sha256_hex(&bytes);
                    if !actual.eq_ignore_ascii_case(expected) {
                        anyhow::bail!("sha256 mismatch: expected {expected}, got {actual}");
                    }
                }
                Ok(bytes)
            });

            match outcome {
                Ok(bytes) => {
                    tracing::debug!(
                        resource = %spec.file_name,
                        url = %url,
                        attempt,
                        len = bytes.len(),
                        "fetched encoder resource"
                    );
                    return Ok(bytes);
                }
                Err(e) => {
                    last_error = format!("{url}: {e:#}");
                    tracing::warn!(
                        resource = %spec.file_name,
                        url = %url,
                        attempt,
                        error = %format!("{e:#}"),
                        "encoder resource fetch failed"
                    );
                    if tried < total {
                        tokio::time::sleep(policy.backoff(attempt)).await;
                    }
                }
            }
        }
    }

    Err(ReelError::resource_fetch(
        spec.file_name.clone(),
        format!(
            "exhausted {tried} attempts across {} sources; last error: {last_error}",
            spec.sources.len()
        ),
    ))
}

/// A fetched resource staged as a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    pub kind: ResourceKind,
    pub media_type: String,
    pub path: PathBuf,
    pub len: u64,
    pub sha256: String,
}

/// The three staged resources. The staging directory lives as long as any clone of the bundle.
#[derive(Clone, Debug)]
pub struct ResourceBundle {
    handles: Vec<ResourceHandle>,
    dir: Arc<tempfile::TempDir>,
}

impl ResourceBundle {
    pub fn handles(&self) -> &[ResourceHandle] {
        &self.handles
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceHandle> {
        self.handles.iter().find(|h| h.kind == kind)
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Fetch every resource of `manifest` concurrently and stage them in a fresh directory.
///
/// Fetches are not cancelled when a sibling fails, so a failed bundle has tried every source of
/// every resource. The first failure in manifest order is returned and the partially staged
/// directory is removed.
pub async fn fetch_bundle(
    fetcher: &dyn ResourceFetcher,
    manifest: &ResourceManifest,
    policy: RetryPolicy,
    staging_root: Option<&Path>,
) -> ReelResult<ResourceBundle> {
    manifest.validate()?;

    let mut builder = tempfile::Builder::new();
    builder.prefix("chartreel-bundle-");
    let dir = match staging_root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .context("create encoder staging directory")?;

    let fetched = futures::future::join_all(
        manifest
            .resources
            .iter()
            .map(|spec| fetch_with_fallback(fetcher, spec, policy)),
    )
    .await;

    let mut handles = Vec::with_capacity(fetched.len());
    for (spec, bytes) in manifest.resources.iter().zip(fetched) {
        handles.push(materialize(dir.path(), spec, &bytes?).await?);
    }

    Ok(ResourceBundle {
        handles,
        dir: Arc::new(dir),
    })
}

async fn materialize(dir: &Path, spec: &ResourceSpec, bytes: &[u8]) -> ReelResult<ResourceHandle> {
    let path = dir.join(&spec.file_name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("stage resource '{}'", path.display()))?;
    Ok(ResourceHandle {
        kind: spec.kind,
        media_type: spec.media_type.clone(),
        path,
        len: bytes.len() as u64,
        sha256: sha256_hex(bytes),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/resources.rs"]
mod tests;
