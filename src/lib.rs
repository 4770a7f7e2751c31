#![forbid(unsafe_code)]

pub mod anim;
pub mod anim_ops;
pub mod compile;
pub mod core;
pub mod dsl;
pub mod ease;
pub mod encode_ffmpeg;
pub mod error;
pub mod eval;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod render;
pub mod render_cpu;
pub mod scene;
pub mod text;

pub use anim::{Anim, InterpMode, Keyframe, Lerp, SampleCtx};
pub use compile::{DrawOp, RenderPlan, compile_frame};
pub use core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8, Transform2D, Vec2};
pub use dsl::{ClipBuilder, CompositionBuilder, TrackBuilder};
pub use ease::Ease;
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use error::{GnomonError, GnomonResult};
pub use eval::{EvaluatedGraph, EvaluatedNode, Evaluator};
pub use geometry::{LegPair, SceneMap, SquareDissection};
pub use model::{
    Asset, Clip, ClipProps, Composition, FadeSpec, PathAsset, PolygonAsset, StrokeStyle, TextAsset,
    Track,
};
pub use pipeline::{RenderToMp4Opts, render_frame, render_frames, render_to_mp4};
pub use render::{FrameRGBA, RenderBackend, RenderSettings};
pub use render_cpu::CpuBackend;
pub use scene::{ProofConfig, ProofScene, build_composition};
pub use text::{AssetId, PreparedAssetStore};
