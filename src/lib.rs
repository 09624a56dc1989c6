//! chartreel turns labeled values into an animated chart video.
//!
//! The pipeline is export-oriented:
//!
//! - Parse a [`Dataset`] and render it into an [`Element`]
//! - Create an [`EncoderSession`] (lazy, single-flight encoder load)
//! - Hand both to a [`VideoExporter`] and await the MP4 bytes
#![forbid(unsafe_code)]

mod foundation;

/// Timeline composition of animation directives.
pub mod animation;
pub mod config;
/// Dataset parsing and chart rendering.
pub mod data;
/// Encoder engines, resources and sessions.
pub mod encode;
pub mod export;
pub mod render;
/// Elements and the off-screen stage they are captured from.
pub mod scene;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, FrameRange, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::directive::{AnimationDirective, DirectiveKind};
pub use crate::animation::ease::Ease;
pub use crate::animation::timeline::{Presentation, Timeline, apply_animation_state};
pub use crate::config::{PipelineConfig, ReelConfig};
pub use crate::data::chart::{ChartKind, ChartStyle, Theme};
pub use crate::data::dataset::{DataPoint, Dataset};
pub use crate::encode::engine::{EncoderEngine, EncoderHandle, ExecRecord, InMemoryEngine};
pub use crate::encode::ffmpeg::{FfmpegCliEngine, FfmpegCliLoader, H264Args};
pub use crate::encode::resources::{
    HttpFetcher, ResourceBundle, ResourceFetcher, ResourceHandle, ResourceKind, ResourceManifest,
    ResourceSpec, RetryPolicy,
};
pub use crate::encode::session::{EncoderConfig, EncoderSession, EngineLoader, SessionStatus};
pub use crate::export::pipeline::{ExportProgress, ExportResult, ExportStats, VideoExporter};
pub use crate::export::request::{ExportRequest, ResolvedExportRequest};
pub use crate::render::raster::{
    EncodedFrame, FrameCapture, FrameDescriptor, SvgRasterizer, encode_png,
};
pub use crate::render::three_d::ThreeDCompositor;
pub use crate::scene::element::Element;
pub use crate::scene::stage::{MountGuard, MountId, Stage, StagedElement};
