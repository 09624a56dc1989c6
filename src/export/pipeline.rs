use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;

use crate::animation::directive::AnimationDirective;
use crate::encode::engine::EncoderHandle;
use crate::encode::ffmpeg::H264Args;
use crate::encode::session::EncoderSession;
use crate::export::request::{ExportRequest, ResolvedExportRequest};
use crate::foundation::core::{FrameIndex, FrameRange};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::raster::{FrameCapture, FrameDescriptor, SvgRasterizer};
use crate::scene::element::Element;
use crate::scene::stage::{MountGuard, Stage};

pub use crate::encode::engine::{FRAME_DIR, OUTPUT_FILE};

pub const MP4_MEDIA_TYPE: &str = "video/mp4";
/// Frames captured concurrently before the next batch may start.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Export lifecycle events, delivered in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportProgress {
    Initializing,
    /// Emitted after each batch has been captured and written.
    Capturing { done: u64, total: u64 },
    Encoding,
    Finished { bytes: usize },
    Failed { kind: &'static str, message: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub batches: u64,
    pub png_bytes: u64,
    pub capture_time: Duration,
    pub encode_time: Duration,
}

/// A finished video.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportResult {
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
    pub frame_count: u64,
    pub stats: ExportStats,
}

/// Drives capture, staging and encoding of one element into an MP4.
///
/// Frames are captured in batches: captures inside a batch run concurrently on blocking worker
/// threads, and every frame of a batch is written to the engine before the next batch starts.
#[derive(Clone)]
pub struct VideoExporter {
    session: EncoderSession,
    stage: Stage,
    capture: Arc<dyn FrameCapture>,
    batch_size: usize,
    progress: Option<UnboundedSender<ExportProgress>>,
}

impl std::fmt::Debug for VideoExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoExporter")
            .field("session", &self.session)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl VideoExporter {
    pub fn new(session: EncoderSession, stage: Stage) -> Self {
        Self {
            session,
            stage,
            capture: Arc::new(SvgRasterizer::new()),
            batch_size: DEFAULT_BATCH_SIZE,
            progress: None,
        }
    }

    pub fn with_capture(mut self, capture: Arc<dyn FrameCapture>) -> Self {
        self.capture = capture;
        self
    }

    /// Zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, tx: UnboundedSender<ExportProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn session(&self) -> &EncoderSession {
        &self.session
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    fn emit(&self, event: ExportProgress) {
        if let Some(tx) = &self.progress {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }

    /// Render `element` with `request` applied and return the encoded MP4.
    #[tracing::instrument(skip(self, element))]
    pub async fn export(&self, element: &Element, request: ExportRequest) -> ReelResult<ExportResult> {
        self.emit(ExportProgress::Initializing);
        let outcome = self.run(element, &request).await;
        match &outcome {
            Ok(result) => self.emit(ExportProgress::Finished {
                bytes: result.bytes.len(),
            }),
            Err(e) => self.emit(ExportProgress::Failed {
                kind: e.kind(),
                message: e.to_string(),
            }),
        }
        outcome
    }

    async fn run(&self, element: &Element, request: &ExportRequest) -> ReelResult<ExportResult> {
        let req = request.resolve()?;
        let engine = self.session.acquire().await?;

        let guard = self.stage.mount_offscreen(element, req.canvas)?;
        tracing::info!(
            frames = req.total_frames,
            width = req.canvas.width,
            height = req.canvas.height,
            fps = req.fps.0,
            "export started"
        );

        let result = self.capture_and_encode(&engine, &guard, &req).await;
        self.capture.release();

        if let Err(e) = &result {
            tracing::error!(kind = e.kind(), error = %e, "export failed");
            cleanup_best_effort(&engine).await;
        }
        drop(guard);
        result
    }

    async fn capture_and_encode(
        &self,
        engine: &EncoderHandle,
        guard: &MountGuard,
        req: &ResolvedExportRequest,
    ) -> ReelResult<ExportResult> {
        engine.create_dir(FRAME_DIR).await?;

        let animations: Arc<[AnimationDirective]> = req.animations.clone().into();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(req.total_frames))?;
        let mut stats = ExportStats::default();

        let capture_start = Instant::now();
        let mut done = 0u64;
        for batch in range.batches(self.batch_size as u64) {
            let indices: Vec<FrameIndex> = batch.iter().collect();
            let tasks = indices.iter().map(|&index| {
                let capture = Arc::clone(&self.capture);
                let descriptor = FrameDescriptor::new(
                    index,
                    req.total_frames,
                    Arc::clone(guard.staged()),
                    Arc::clone(&animations),
                );
                tokio::task::spawn_blocking(move || capture.capture_frame(&descriptor))
            });
            let joined = futures::future::join_all(tasks).await;

            let mut frames = Vec::with_capacity(joined.len());
            for (index, outcome) in indices.iter().zip(joined) {
                frames.push(outcome.map_err(|e| {
                    ReelError::capture(index.0, format!("capture task failed: {e}"))
                })??);
            }
            for frame in frames {
                stats.png_bytes += frame.png.len() as u64;
                let path = format!("{FRAME_DIR}/{}", frame.file_name());
                engine.write_file(&path, frame.png).await?;
            }

            done += batch.len_frames();
            stats.batches += 1;
            tracing::debug!(done, total = req.total_frames, "batch written");
            self.emit(ExportProgress::Capturing {
                done,
                total: req.total_frames,
            });
        }
        stats.capture_time = capture_start.elapsed();

        self.emit(ExportProgress::Encoding);
        let encode_start = Instant::now();
        engine
            .exec(&H264Args::new(req.fps, req.quality).to_args())
            .await?;
        let bytes = engine.read_file(OUTPUT_FILE).await?;
        stats.encode_time = encode_start.elapsed();
        if bytes.is_empty() {
            return Err(ReelError::encode("encoder produced an empty container"));
        }

        engine.delete_dir(FRAME_DIR).await?;
        engine.delete_file(OUTPUT_FILE).await?;

        tracing::info!(
            frames = req.total_frames,
            bytes = bytes.len(),
            batches = stats.batches,
            "export finished"
        );
        Ok(ExportResult {
            bytes,
            media_type: MP4_MEDIA_TYPE,
            frame_count: req.total_frames,
            stats,
        })
    }
}

async fn cleanup_best_effort(engine: &EncoderHandle) {
    if let Err(e) = engine.delete_dir(FRAME_DIR).await {
        tracing::debug!(error = %e, "frame directory cleanup skipped");
    }
    if let Err(e) = engine.delete_file(OUTPUT_FILE).await {
        tracing::debug!(error = %e, "output cleanup skipped");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
