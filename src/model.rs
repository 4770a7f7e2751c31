use std::collections::BTreeMap;

use crate::{
    anim::Anim,
    core::{Canvas, Fps, FrameIndex, FrameRange, Point, Rgba8, Transform2D},
    ease::Ease,
    error::{GnomonError, GnomonResult},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Composition {
    pub fps: Fps,
    pub canvas: Canvas,
    pub duration: FrameIndex,            // total frames
    pub assets: BTreeMap<String, Asset>, // stable keys
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub name: String,
    pub z_base: i32,
    pub clips: Vec<Clip>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Clip {
    pub id: String,
    pub asset: String,     // key into Composition.assets
    pub range: FrameRange, // timeline placement [start,end)
    pub props: ClipProps,
    pub z_offset: i32,
    pub fade_in: Option<FadeSpec>,
    pub fade_out: Option<FadeSpec>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ClipProps {
    pub transform: Anim<Transform2D>,
    pub opacity: Anim<f64>,        // 0..1 clamped in eval
    pub fill: Option<Anim<Rgba8>>, // fill color+alpha; None = outline only
    pub draw: Anim<f64>,           // stroke reveal progress, 0..1
}

impl Default for ClipProps {
    fn default() -> Self {
        Self {
            transform: Anim::constant(Transform2D::default()),
            opacity: Anim::constant(1.0),
            fill: None,
            draw: Anim::constant(1.0),
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub enum Asset {
    Polygon(PolygonAsset),
    Path(PathAsset),
    Text(TextAsset),
}

/// Closed polygon with morphable vertices, in canvas pixel coordinates.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PolygonAsset {
    pub points: Anim<Vec<Point>>,
    pub stroke: Option<StrokeStyle>,
}

/// Open or closed bezier path in SVG `d` syntax (braces and markers).
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PathAsset {
    pub svg_path_d: String,
    pub stroke: Option<StrokeStyle>,
}

/// A block of text, drawn centered on the clip's local origin. `family`
/// falls back to the system sans-serif stack when unset.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TextAsset {
    pub text: String,
    pub size_px: f32,
    pub color: Rgba8,
    pub family: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StrokeStyle {
    pub width: f64,
    pub color: Rgba8,
}

/// Eased opacity window at a clip edge. Progress runs 0..1 across the
/// window: a fade-in multiplies opacity by progress, a fade-out by its
/// complement.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct FadeSpec {
    pub duration_frames: u64,
    pub ease: Ease,
}

impl FadeSpec {
    pub fn validate(&self) -> GnomonResult<()> {
        if self.duration_frames == 0 {
            return Err(GnomonError::validation("fade duration_frames must be > 0"));
        }
        Ok(())
    }
}

impl Asset {
    pub fn validate(&self) -> GnomonResult<()> {
        match self {
            Self::Polygon(p) => p.validate(),
            Self::Path(p) => p.validate(),
            Self::Text(t) => t.validate(),
        }
    }
}

impl PolygonAsset {
    pub fn validate(&self) -> GnomonResult<()> {
        self.points.validate()?;

        let mut arity: Option<usize> = None;
        for key in &self.points.keys {
            if key.value.len() < 3 {
                return Err(GnomonError::validation(
                    "polygon keys must carry at least 3 vertices",
                ));
            }
            match arity {
                None => arity = Some(key.value.len()),
                Some(n) if n != key.value.len() => {
                    return Err(GnomonError::validation(
                        "polygon morph keys must all carry the same vertex count",
                    ));
                }
                Some(_) => {}
            }
        }
        if let Some(default) = &self.points.default {
            if default.len() < 3 {
                return Err(GnomonError::validation(
                    "polygon default must carry at least 3 vertices",
                ));
            }
        }

        validate_stroke(&self.stroke)
    }
}

impl PathAsset {
    pub fn validate(&self) -> GnomonResult<()> {
        if self.svg_path_d.trim().is_empty() {
            return Err(GnomonError::validation("path svg_path_d must be non-empty"));
        }
        validate_stroke(&self.stroke)
    }
}

impl TextAsset {
    pub fn validate(&self) -> GnomonResult<()> {
        if self.text.is_empty() {
            return Err(GnomonError::validation("text must be non-empty"));
        }
        if !self.size_px.is_finite() || self.size_px <= 0.0 {
            return Err(GnomonError::validation("text size_px must be finite and > 0"));
        }
        Ok(())
    }
}

fn validate_stroke(stroke: &Option<StrokeStyle>) -> GnomonResult<()> {
    if let Some(s) = stroke {
        if !s.width.is_finite() || s.width <= 0.0 {
            return Err(GnomonError::validation("stroke width must be finite and > 0"));
        }
    }
    Ok(())
}

impl Composition {
    pub fn validate(&self) -> GnomonResult<()> {
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(GnomonError::validation("fps must have num>0 and den>0"));
        }
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(GnomonError::validation("canvas width/height must be > 0"));
        }
        if self.duration.0 == 0 {
            return Err(GnomonError::validation("duration must be > 0 frames"));
        }

        for (key, asset) in &self.assets {
            asset.validate().map_err(|e| {
                GnomonError::validation(format!("asset '{key}' is invalid: {e}"))
            })?;
        }

        for track in &self.tracks {
            if track.name.trim().is_empty() {
                return Err(GnomonError::validation("track name must be non-empty"));
            }
            for clip in &track.clips {
                if !self.assets.contains_key(&clip.asset) {
                    return Err(GnomonError::validation(format!(
                        "clip '{}' references missing asset key '{}'",
                        clip.id, clip.asset
                    )));
                }
                if clip.range.start.0 > clip.range.end.0 {
                    return Err(GnomonError::validation(format!(
                        "clip '{}' has invalid range (start > end)",
                        clip.id
                    )));
                }
                if clip.range.end.0 > self.duration.0 {
                    return Err(GnomonError::validation(format!(
                        "clip '{}' range exceeds composition duration",
                        clip.id
                    )));
                }

                clip.props.opacity.validate()?;
                clip.props.transform.validate()?;
                clip.props.draw.validate()?;
                if let Some(fill) = &clip.props.fill {
                    fill.validate()?;
                }

                if let Some(fade) = &clip.fade_in {
                    fade.validate()?;
                }
                if let Some(fade) = &clip.fade_out {
                    fade.validate()?;
                }
            }
        }

        Ok(())
    }
}
