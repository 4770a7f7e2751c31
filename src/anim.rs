use crate::{
    core::{Fps, FrameIndex, Point, Rgba8, Transform2D, Vec2},
    ease::Ease,
    error::{GnomonError, GnomonResult},
};

#[derive(Clone, Copy, Debug)]
pub struct SampleCtx {
    pub frame: FrameIndex,      // global frame
    pub fps: Fps,               // global fps
    pub clip_local: FrameIndex, // frame - clip.start
}

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for f32 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        (*a as f64 + ((*b as f64 - *a as f64) * t)) as f32
    }
}

impl Lerp for Vec2 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Vec2::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Point {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
    }
}

impl Lerp for Transform2D {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            translate: <Vec2 as Lerp>::lerp(&a.translate, &b.translate, t),
            rotation_rad: a.rotation_rad + (b.rotation_rad - a.rotation_rad) * t,
            scale: <Vec2 as Lerp>::lerp(&a.scale, &b.scale, t),
            anchor: <Vec2 as Lerp>::lerp(&a.anchor, &b.anchor, t),
        }
    }
}

impl Lerp for Rgba8 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
            let a = f64::from(a);
            let b = f64::from(b);
            (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
        }

        Self {
            r: lerp_u8(a.r, b.r, t),
            g: lerp_u8(a.g, b.g, t),
            b: lerp_u8(a.b, b.b, t),
            a: lerp_u8(a.a, b.a, t),
        }
    }
}

/// Vertex-wise interpolation for polygon morphs. Both shapes must carry the
/// same vertex count; `Composition::validate` enforces this for polygon
/// assets before sampling ever runs.
impl Lerp for Vec<Point> {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a.iter()
            .zip(b.iter())
            .map(|(pa, pb)| <Point as Lerp>::lerp(pa, pb, t))
            .collect()
    }
}

/// A keyframed value on the clip-local frame timeline.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Anim<T> {
    pub keys: Vec<Keyframe<T>>, // sorted by frame
    pub mode: InterpMode,       // linear/hold
    pub default: Option<T>,     // value when no keys exist
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Keyframe<T> {
    pub frame: FrameIndex,
    pub value: T,
    pub ease: Ease, // ease applied toward next key
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InterpMode {
    Hold,
    Linear,
}

impl<T> Anim<T>
where
    T: Lerp + Clone,
{
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![Keyframe {
                frame: FrameIndex(0),
                value,
                ease: Ease::Linear,
            }],
            mode: InterpMode::Hold,
            default: None,
        }
    }

    pub fn validate(&self) -> GnomonResult<()> {
        if self.keys.is_empty() && self.default.is_none() {
            return Err(GnomonError::animation(
                "Anim must have at least one key or a default value",
            ));
        }
        if !self.keys.windows(2).all(|w| w[0].frame.0 <= w[1].frame.0) {
            return Err(GnomonError::animation("Anim keys must be sorted by frame"));
        }
        Ok(())
    }

    pub fn sample(&self, ctx: SampleCtx) -> GnomonResult<T> {
        if self.keys.is_empty() {
            return self
                .default
                .clone()
                .ok_or_else(|| GnomonError::animation("Anim has no keys and no default"));
        }

        let f = ctx.clip_local.0;
        let idx = self.keys.partition_point(|k| k.frame.0 <= f);

        if idx == 0 {
            return Ok(self.keys[0].value.clone());
        }
        if idx >= self.keys.len() {
            return Ok(self.keys[self.keys.len() - 1].value.clone());
        }

        let a = &self.keys[idx - 1];
        let b = &self.keys[idx];
        let denom = b.frame.0.saturating_sub(a.frame.0);
        if denom == 0 {
            return Ok(a.value.clone());
        }

        let t = ((f - a.frame.0) as f64) / (denom as f64);
        let te = a.ease.apply(t);
        match self.mode {
            InterpMode::Hold => Ok(a.value.clone()),
            InterpMode::Linear => Ok(T::lerp(&a.value, &b.value, te)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(frame: u64) -> SampleCtx {
        SampleCtx {
            frame: FrameIndex(frame),
            fps: Fps::new(30, 1).unwrap(),
            clip_local: FrameIndex(frame),
        }
    }

    fn keyed(pairs: &[(u64, f64)], mode: InterpMode) -> Anim<f64> {
        Anim {
            keys: pairs
                .iter()
                .map(|&(frame, value)| Keyframe {
                    frame: FrameIndex(frame),
                    value,
                    ease: Ease::Linear,
                })
                .collect(),
            mode,
            default: None,
        }
    }

    #[test]
    fn hold_is_constant_between_keys() {
        let anim = keyed(&[(0, 1.0), (10, 3.0)], InterpMode::Hold);
        assert_eq!(anim.sample(ctx(5)).unwrap(), 1.0);
        assert_eq!(anim.sample(ctx(10)).unwrap(), 3.0);
    }

    #[test]
    fn linear_interpolates_between_keys() {
        let anim = keyed(&[(0, 0.0), (10, 10.0)], InterpMode::Linear);
        assert_eq!(anim.sample(ctx(5)).unwrap(), 5.0);
    }

    #[test]
    fn samples_clamp_outside_key_span() {
        let anim = keyed(&[(5, 2.0), (10, 4.0)], InterpMode::Linear);
        assert_eq!(anim.sample(ctx(0)).unwrap(), 2.0);
        assert_eq!(anim.sample(ctx(50)).unwrap(), 4.0);
    }

    #[test]
    fn unsorted_keys_are_rejected() {
        let anim = keyed(&[(10, 0.0), (0, 1.0)], InterpMode::Linear);
        assert!(anim.validate().is_err());
    }

    #[test]
    fn empty_anim_falls_back_to_default() {
        let anim = Anim::<f64> {
            keys: vec![],
            mode: InterpMode::Linear,
            default: Some(7.0),
        };
        anim.validate().unwrap();
        assert_eq!(anim.sample(ctx(3)).unwrap(), 7.0);
    }

    #[test]
    fn polygon_morph_hits_endpoints_and_midpoint() {
        let from = vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)];
        let to = vec![Point::new(0.0, 4.0), Point::new(20.0, 0.0)];
        let anim = Anim {
            keys: vec![
                Keyframe {
                    frame: FrameIndex(0),
                    value: from.clone(),
                    ease: Ease::Linear,
                },
                Keyframe {
                    frame: FrameIndex(10),
                    value: to.clone(),
                    ease: Ease::Linear,
                },
            ],
            mode: InterpMode::Linear,
            default: None,
        };

        assert_eq!(anim.sample(ctx(0)).unwrap(), from);
        assert_eq!(anim.sample(ctx(10)).unwrap(), to);
        let mid = anim.sample(ctx(5)).unwrap();
        assert_eq!(mid[0], Point::new(0.0, 2.0));
        assert_eq!(mid[1], Point::new(15.0, 0.0));
    }

    #[test]
    fn color_lerp_midpoint() {
        let a = Rgba8::new(0, 0, 0, 0);
        let b = Rgba8::new(255, 255, 255, 255);
        let mid = <Rgba8 as Lerp>::lerp(&a, &b, 0.5);
        assert_eq!(mid, Rgba8::new(128, 128, 128, 128));
    }
}
