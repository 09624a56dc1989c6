use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};

use crate::encode::engine::EncoderHandle;
use crate::encode::ffmpeg::FfmpegCliLoader;
use crate::encode::resources::{
    HttpFetcher, ResourceBundle, ResourceFetcher, ResourceManifest, RetryPolicy, fetch_bundle,
};
use crate::foundation::error::{ReelError, ReelResult};

/// Encoder session settings, the `encoder` section of the config file.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub manifest: ResourceManifest,
    pub retry: RetryPolicy,
    /// Encoder executable used unless the core runtime is itself a native binary.
    pub ffmpeg_program: PathBuf,
    /// Parent directory for staged resources and encoder working directories.
    pub staging_dir: Option<PathBuf>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            manifest: ResourceManifest::default(),
            retry: RetryPolicy::default(),
            ffmpeg_program: PathBuf::from("ffmpeg"),
            staging_dir: None,
        }
    }
}

/// Turns a fetched resource bundle into a ready engine.
#[async_trait::async_trait]
pub trait EngineLoader: Send + Sync {
    async fn load(&self, bundle: ResourceBundle) -> ReelResult<EncoderHandle>;
}

/// Observable session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Uninitialized,
    Loading,
    Ready,
}

/// Failure of one load attempt, shared by every waiter of that attempt.
#[derive(Clone, Debug)]
enum LoadFailure {
    Fetch { resource: String, message: String },
    Init(String),
}

impl From<ReelError> for LoadFailure {
    fn from(e: ReelError) -> Self {
        match e {
            ReelError::ResourceFetch { resource, message } => Self::Fetch { resource, message },
            ReelError::Initialization(msg) => Self::Init(msg),
            other => Self::Init(other.to_string()),
        }
    }
}

impl From<LoadFailure> for ReelError {
    fn from(f: LoadFailure) -> Self {
        match f {
            LoadFailure::Fetch { resource, message } => Self::resource_fetch(resource, message),
            LoadFailure::Init(msg) => Self::initialization(msg),
        }
    }
}

type LoadAttempt = Shared<BoxFuture<'static, Result<EncoderHandle, LoadFailure>>>;

enum SessionState {
    Uninitialized,
    Loading {
        generation: u64,
        attempt: LoadAttempt,
    },
    Ready(EncoderHandle),
}

struct SessionInner {
    config: Arc<EncoderConfig>,
    fetcher: Arc<dyn ResourceFetcher>,
    loader: Arc<dyn EngineLoader>,
    state: Mutex<SessionState>,
    generation: AtomicU64,
    loads_started: Arc<AtomicUsize>,
}

/// Lazily loaded, single-flight encoder engine.
///
/// Cloning is cheap and every clone shares one engine. Concurrent [`acquire`](Self::acquire)
/// calls during a load all await the same attempt; a failed attempt puts the session back to
/// [`SessionStatus::Uninitialized`] so the next call starts afresh.
#[derive(Clone)]
pub struct EncoderSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("status", &self.status())
            .field("loads_started", &self.loads_started())
            .finish_non_exhaustive()
    }
}

impl EncoderSession {
    pub fn new(
        config: EncoderConfig,
        fetcher: Arc<dyn ResourceFetcher>,
        loader: Arc<dyn EngineLoader>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config: Arc::new(config),
                fetcher,
                loader,
                state: Mutex::new(SessionState::Uninitialized),
                generation: AtomicU64::new(0),
                loads_started: Arc::new(AtomicUsize::new(0)),
            }),
        }
    }

    /// Session fetching over HTTP and running the system `ffmpeg`.
    pub fn from_config(config: EncoderConfig) -> Self {
        let loader = FfmpegCliLoader {
            program: config.ffmpeg_program.clone(),
            staging_root: config.staging_dir.clone(),
        };
        Self::new(config, Arc::new(HttpFetcher::new()), Arc::new(loader))
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self) -> SessionStatus {
        match &*self.lock() {
            SessionState::Uninitialized => SessionStatus::Uninitialized,
            SessionState::Loading { .. } => SessionStatus::Loading,
            SessionState::Ready(_) => SessionStatus::Ready,
        }
    }

    /// Number of load attempts that have actually started.
    pub fn loads_started(&self) -> usize {
        self.inner.loads_started.load(Ordering::SeqCst)
    }

    /// Return the ready engine, loading it first if needed.
    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self) -> ReelResult<EncoderHandle> {
        let (generation, attempt) = {
            let mut state = self.lock();
            match &*state {
                SessionState::Ready(handle) => return Ok(Arc::clone(handle)),
                SessionState::Loading {
                    generation,
                    attempt,
                } => (*generation, attempt.clone()),
                SessionState::Uninitialized => {
                    let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
                    let attempt = self.start_load(generation);
                    *state = SessionState::Loading {
                        generation,
                        attempt: attempt.clone(),
                    };
                    (generation, attempt)
                }
            }
        };

        let outcome = attempt.await;

        {
            let mut state = self.lock();
            if let SessionState::Loading { generation: g, .. } = &*state
                && *g == generation
            {
                *state = match &outcome {
                    Ok(handle) => SessionState::Ready(Arc::clone(handle)),
                    Err(failure) => {
                        tracing::warn!(generation, ?failure, "encoder load failed, session reset");
                        SessionState::Uninitialized
                    }
                };
            }
        }

        outcome.map_err(ReelError::from)
    }

    fn start_load(&self, generation: u64) -> LoadAttempt {
        let config = Arc::clone(&self.inner.config);
        let fetcher = Arc::clone(&self.inner.fetcher);
        let loader = Arc::clone(&self.inner.loader);
        let loads_started = Arc::clone(&self.inner.loads_started);

        async move {
            loads_started.fetch_add(1, Ordering::SeqCst);
            tracing::info!(generation, "loading encoder");

            let bundle = fetch_bundle(
                fetcher.as_ref(),
                &config.manifest,
                config.retry,
                config.staging_dir.as_deref(),
            )
            .await?;
            let handle = loader.load(bundle).await?;

            tracing::info!(generation, "encoder loaded");
            Ok::<_, ReelError>(handle)
        }
        .map(|r| r.map_err(LoadFailure::from))
        .boxed()
        .shared()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/session.rs"]
mod tests;
