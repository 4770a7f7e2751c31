//! Helpers for building keyframe tracks without hand-writing key vectors.
//! All frame arguments are clip-local.

use crate::{
    anim::{Anim, InterpMode, Keyframe, Lerp},
    core::FrameIndex,
    ease::Ease,
};

pub fn hold<T>(value: T) -> Anim<T>
where
    T: Lerp + Clone,
{
    Anim::constant(value)
}

/// Holds `from` until `start`, then eases to `to` over `dur` frames and
/// holds `to` afterwards.
pub fn ramp<T>(from: T, to: T, start: u64, dur: u64, ease: Ease) -> Anim<T>
where
    T: Lerp + Clone,
{
    let dur = dur.max(1);
    Anim {
        keys: vec![
            Keyframe {
                frame: FrameIndex(0),
                value: from.clone(),
                ease: Ease::Linear,
            },
            Keyframe {
                frame: FrameIndex(start),
                value: from,
                ease,
            },
            Keyframe {
                frame: FrameIndex(start + dur),
                value: to,
                ease: Ease::Linear,
            },
        ],
        mode: InterpMode::Linear,
        default: None,
    }
}

/// 0 until `start`, then up to 1 over `dur` frames.
pub fn fade_in(start: u64, dur: u64, ease: Ease) -> Anim<f64> {
    ramp(0.0, 1.0, start, dur, ease)
}

/// 1 until `start`, then down to 0 over `dur` frames.
pub fn fade_out(start: u64, dur: u64, ease: Ease) -> Anim<f64> {
    ramp(1.0, 0.0, start, dur, ease)
}

/// Fades in at the start of the window and out at its end.
pub fn fade_in_out(in_start: u64, in_dur: u64, out_start: u64, out_dur: u64, ease: Ease) -> Anim<f64> {
    let in_dur = in_dur.max(1);
    let out_dur = out_dur.max(1);
    Anim {
        keys: vec![
            Keyframe {
                frame: FrameIndex(in_start),
                value: 0.0,
                ease,
            },
            Keyframe {
                frame: FrameIndex(in_start + in_dur),
                value: 1.0,
                ease: Ease::Linear,
            },
            Keyframe {
                frame: FrameIndex(out_start),
                value: 1.0,
                ease,
            },
            Keyframe {
                frame: FrameIndex(out_start + out_dur),
                value: 0.0,
                ease: Ease::Linear,
            },
        ],
        mode: InterpMode::Linear,
        default: None,
    }
}

/// Arbitrary `(frame, value, ease)` triples, already sorted by frame.
pub fn keyframes<T>(triples: Vec<(u64, T, Ease)>, mode: InterpMode) -> Anim<T>
where
    T: Lerp + Clone,
{
    Anim {
        keys: triples
            .into_iter()
            .map(|(frame, value, ease)| Keyframe {
                frame: FrameIndex(frame),
                value,
                ease,
            })
            .collect(),
        mode,
        default: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{anim::SampleCtx, core::Fps};

    fn ctx(frame: u64) -> SampleCtx {
        SampleCtx {
            frame: FrameIndex(frame),
            fps: Fps::new(30, 1).unwrap(),
            clip_local: FrameIndex(frame),
        }
    }

    #[test]
    fn ramp_holds_then_moves() {
        let a = ramp(2.0, 6.0, 10, 4, Ease::Linear);
        a.validate().unwrap();
        assert_eq!(a.sample(ctx(0)).unwrap(), 2.0);
        assert_eq!(a.sample(ctx(10)).unwrap(), 2.0);
        assert_eq!(a.sample(ctx(12)).unwrap(), 4.0);
        assert_eq!(a.sample(ctx(14)).unwrap(), 6.0);
        assert_eq!(a.sample(ctx(100)).unwrap(), 6.0);
    }

    #[test]
    fn fade_in_out_window_boundaries() {
        let a = fade_in_out(0, 10, 40, 10, Ease::Linear);
        a.validate().unwrap();
        assert_eq!(a.sample(ctx(0)).unwrap(), 0.0);
        assert_eq!(a.sample(ctx(10)).unwrap(), 1.0);
        assert_eq!(a.sample(ctx(25)).unwrap(), 1.0);
        assert_eq!(a.sample(ctx(50)).unwrap(), 0.0);
    }

    #[test]
    fn zero_duration_ramp_is_promoted_to_one_frame() {
        let a = ramp(0.0, 1.0, 5, 0, Ease::Linear);
        a.validate().unwrap();
        assert_eq!(a.sample(ctx(6)).unwrap(), 1.0);
    }
}
