use crate::{
    compile::compile_frame,
    core::{FrameIndex, FrameRange},
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    error::{GnomonError, GnomonResult},
    eval::Evaluator,
    model::Composition,
    render::{FrameRGBA, RenderBackend},
    text::PreparedAssetStore,
};

/// Evaluate + compile + rasterize a single frame.
///
/// This is the primary one-shot API for producing pixels from a
/// [`Composition`]. Returns premultiplied RGBA8 pixels.
pub fn render_frame(
    comp: &Composition,
    frame: FrameIndex,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> GnomonResult<FrameRGBA> {
    let eval = Evaluator::eval_frame(comp, frame)?;
    let plan = compile_frame(comp, &eval, assets)?;
    backend.render_plan(&plan, assets)
}

/// Render a range of frames (inclusive start, exclusive end).
pub fn render_frames(
    comp: &Composition,
    range: FrameRange,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> GnomonResult<Vec<FrameRGBA>> {
    if range.is_empty() {
        return Err(GnomonError::validation("render range must be non-empty"));
    }

    let mut out = Vec::with_capacity(range.len_frames() as usize);
    for f in range.start.0..range.end.0 {
        out.push(render_frame(comp, FrameIndex(f), backend, assets)?);
    }
    Ok(out)
}

/// Options for [`render_to_mp4`].
#[derive(Clone, Debug)]
pub struct RenderToMp4Opts {
    /// Frame range to render (start inclusive, end exclusive).
    pub range: FrameRange,
    /// Background color to flatten alpha over (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
    /// Whether to overwrite `out_path` if it already exists.
    pub overwrite: bool,
}

impl Default for RenderToMp4Opts {
    fn default() -> Self {
        Self {
            range: FrameRange {
                start: FrameIndex(0),
                end: FrameIndex(1),
            },
            bg_rgba: [0, 0, 0, 255],
            overwrite: true,
        }
    }
}

/// Render a composition to an MP4 by invoking the system `ffmpeg` binary.
///
/// `ffmpeg` must be installed and on `PATH`; this is checked up front.
/// Frames are streamed into the encoder one at a time, so memory stays
/// flat regardless of composition length. MP4 output currently requires
/// integer fps (`comp.fps.den == 1`).
#[tracing::instrument(skip(comp, out_path, backend, assets), fields(out = %out_path.as_ref().display()))]
pub fn render_to_mp4(
    comp: &Composition,
    out_path: impl AsRef<std::path::Path>,
    opts: RenderToMp4Opts,
    backend: &mut dyn RenderBackend,
    assets: &PreparedAssetStore,
) -> GnomonResult<()> {
    if opts.range.end.0 > comp.duration.0 {
        return Err(GnomonError::validation(
            "render_to_mp4 range must be within composition duration",
        ));
    }
    if opts.range.is_empty() {
        return Err(GnomonError::validation(
            "render_to_mp4 range must be non-empty",
        ));
    }

    let fps = if comp.fps.den == 1 {
        comp.fps.num
    } else {
        return Err(GnomonError::validation(
            "render_to_mp4 currently requires integer fps (fps.den == 1)",
        ));
    };

    let cfg = EncodeConfig {
        width: comp.canvas.width,
        height: comp.canvas.height,
        fps,
        out_path: out_path.as_ref().to_path_buf(),
        overwrite: opts.overwrite,
    };

    let mut enc = FfmpegEncoder::new(cfg, opts.bg_rgba)?;
    for f in opts.range.start.0..opts.range.end.0 {
        let frame = render_frame(comp, FrameIndex(f), backend, assets)?;
        enc.encode_frame(&frame)?;
    }
    enc.finish()
}
