use std::collections::BTreeMap;

use crate::{
    anim::Anim,
    core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8, Transform2D},
    error::{GnomonError, GnomonResult},
    model::{Asset, Clip, ClipProps, Composition, FadeSpec, Track},
};

pub struct CompositionBuilder {
    fps: Fps,
    canvas: Canvas,
    duration: FrameIndex,
    assets: BTreeMap<String, Asset>,
    tracks: Vec<Track>,
}

impl CompositionBuilder {
    pub fn new(fps: Fps, canvas: Canvas, duration: FrameIndex) -> Self {
        Self {
            fps,
            canvas,
            duration,
            assets: BTreeMap::new(),
            tracks: Vec::new(),
        }
    }

    pub fn asset(mut self, key: impl Into<String>, asset: Asset) -> GnomonResult<Self> {
        let key = key.into();
        if self.assets.contains_key(&key) {
            return Err(GnomonError::validation(format!(
                "duplicate asset key '{key}'"
            )));
        }
        self.assets.insert(key, asset);
        Ok(self)
    }

    pub fn track(mut self, track: Track) -> Self {
        self.tracks.push(track);
        self
    }

    pub fn build(self) -> GnomonResult<Composition> {
        let comp = Composition {
            fps: self.fps,
            canvas: self.canvas,
            duration: self.duration,
            assets: self.assets,
            tracks: self.tracks,
        };
        comp.validate()?;
        Ok(comp)
    }
}

pub struct TrackBuilder {
    name: String,
    z_base: i32,
    clips: Vec<Clip>,
}

impl TrackBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            z_base: 0,
            clips: Vec::new(),
        }
    }

    pub fn z_base(mut self, z: i32) -> Self {
        self.z_base = z;
        self
    }

    pub fn clip(mut self, clip: Clip) -> Self {
        self.clips.push(clip);
        self
    }

    pub fn build(self) -> GnomonResult<Track> {
        if self.name.trim().is_empty() {
            return Err(GnomonError::validation("track name must be non-empty"));
        }
        Ok(Track {
            name: self.name,
            z_base: self.z_base,
            clips: self.clips,
        })
    }
}

pub struct ClipBuilder {
    id: String,
    asset_key: String,
    range: FrameRange,
    z_offset: i32,
    opacity: Anim<f64>,
    transform: Anim<Transform2D>,
    fill: Option<Anim<Rgba8>>,
    draw: Anim<f64>,
    fade_in: Option<FadeSpec>,
    fade_out: Option<FadeSpec>,
}

impl ClipBuilder {
    pub fn new(id: impl Into<String>, asset_key: impl Into<String>, range: FrameRange) -> Self {
        Self {
            id: id.into(),
            asset_key: asset_key.into(),
            range,
            z_offset: 0,
            opacity: Anim::constant(1.0),
            transform: Anim::constant(Transform2D::default()),
            fill: None,
            draw: Anim::constant(1.0),
            fade_in: None,
            fade_out: None,
        }
    }

    pub fn z_offset(mut self, z: i32) -> Self {
        self.z_offset = z;
        self
    }

    pub fn opacity(mut self, a: Anim<f64>) -> Self {
        self.opacity = a;
        self
    }

    pub fn transform(mut self, t: Anim<Transform2D>) -> Self {
        self.transform = t;
        self
    }

    pub fn fill(mut self, fill: Anim<Rgba8>) -> Self {
        self.fill = Some(fill);
        self
    }

    pub fn draw(mut self, draw: Anim<f64>) -> Self {
        self.draw = draw;
        self
    }

    pub fn fade_in(mut self, fade: FadeSpec) -> Self {
        self.fade_in = Some(fade);
        self
    }

    pub fn fade_out(mut self, fade: FadeSpec) -> Self {
        self.fade_out = Some(fade);
        self
    }

    pub fn build(self) -> GnomonResult<Clip> {
        if self.id.trim().is_empty() {
            return Err(GnomonError::validation("clip id must be non-empty"));
        }
        if self.asset_key.trim().is_empty() {
            return Err(GnomonError::validation("clip asset key must be non-empty"));
        }
        self.opacity.validate()?;
        self.transform.validate()?;
        self.draw.validate()?;
        if let Some(fill) = &self.fill {
            fill.validate()?;
        }

        Ok(Clip {
            id: self.id,
            asset: self.asset_key,
            range: self.range,
            props: ClipProps {
                transform: self.transform,
                opacity: self.opacity,
                fill: self.fill,
                draw: self.draw,
            },
            z_offset: self.z_offset,
            fade_in: self.fade_in,
            fade_out: self.fade_out,
        })
    }
}
