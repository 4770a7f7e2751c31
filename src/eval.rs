use crate::{
    anim::SampleCtx,
    core::{FrameIndex, FrameRange, Point, Rgba8},
    error::{GnomonError, GnomonResult},
    model::{Asset, Clip, Composition, FadeSpec},
};

/// Everything visible on one frame, in paint order.
#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedGraph {
    pub frame: FrameIndex,
    pub nodes: Vec<EvaluatedNode>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct EvaluatedNode {
    pub clip_id: String,
    pub asset: String,
    pub z: i32,
    pub transform: kurbo::Affine,
    /// Clip opacity with edge fades already folded in, clamped to 0..1.
    pub opacity: f64,
    pub fill: Option<Rgba8>,
    /// Stroke reveal progress, clamped to 0..1.
    pub draw: f64,
    /// Sampled polygon vertices when the asset is a morphable polygon.
    pub points: Option<Vec<Point>>,
}

pub struct Evaluator;

impl Evaluator {
    #[tracing::instrument(skip(comp))]
    pub fn eval_frame(comp: &Composition, frame: FrameIndex) -> GnomonResult<EvaluatedGraph> {
        comp.validate()?;
        if frame.0 >= comp.duration.0 {
            return Err(GnomonError::evaluation("frame is out of bounds"));
        }

        let mut nodes_with_key: Vec<((i32, usize, u64, String), EvaluatedNode)> = Vec::new();

        for (track_index, track) in comp.tracks.iter().enumerate() {
            for clip in &track.clips {
                if !clip.range.contains(frame) {
                    continue;
                }

                let node = eval_clip(comp, clip, frame, track.z_base)?;
                let sort_key = (
                    node.z,
                    track_index,
                    clip.range.start.0,
                    node.clip_id.clone(),
                );
                nodes_with_key.push((sort_key, node));
            }
        }

        nodes_with_key.sort_by(|a, b| a.0.cmp(&b.0));
        let nodes = nodes_with_key.into_iter().map(|(_, n)| n).collect();

        Ok(EvaluatedGraph { frame, nodes })
    }
}

fn eval_clip(
    comp: &Composition,
    clip: &Clip,
    frame: FrameIndex,
    track_z_base: i32,
) -> GnomonResult<EvaluatedNode> {
    let clip_local = FrameIndex(frame.0 - clip.range.start.0);
    let ctx = SampleCtx {
        frame,
        fps: comp.fps,
        clip_local,
    };

    let mut opacity = clip.props.opacity.sample(ctx)?.clamp(0.0, 1.0);
    if let Some(fade) = &clip.fade_in {
        if let Some(progress) = fade_progress(fade, frame, clip.range, FadeEdge::In) {
            opacity *= progress;
        }
    }
    if let Some(fade) = &clip.fade_out {
        if let Some(progress) = fade_progress(fade, frame, clip.range, FadeEdge::Out) {
            opacity *= 1.0 - progress;
        }
    }
    let opacity = opacity.clamp(0.0, 1.0);

    let transform = clip.props.transform.sample(ctx)?.to_affine();
    let draw = clip.props.draw.sample(ctx)?.clamp(0.0, 1.0);

    let fill = match &clip.props.fill {
        Some(anim) => Some(anim.sample(ctx)?),
        None => None,
    };

    let points = match comp.assets.get(&clip.asset) {
        Some(Asset::Polygon(poly)) => Some(poly.points.sample(ctx)?),
        Some(_) => None,
        None => {
            return Err(GnomonError::evaluation(format!(
                "clip '{}' references missing asset key '{}'",
                clip.id, clip.asset
            )));
        }
    };

    Ok(EvaluatedNode {
        clip_id: clip.id.clone(),
        asset: clip.asset.clone(),
        z: track_z_base + clip.z_offset,
        transform,
        opacity,
        fill,
        draw,
        points,
    })
}

#[derive(Clone, Copy, Debug)]
enum FadeEdge {
    In,
    Out,
}

/// Eased progress through the fade window at a clip edge, or `None` when
/// the frame is outside the window. Progress hits 0 on the window's first
/// frame and 1 on its last.
fn fade_progress(
    spec: &FadeSpec,
    frame: FrameIndex,
    clip_range: FrameRange,
    edge: FadeEdge,
) -> Option<f64> {
    let clip_len = clip_range.len_frames();
    if clip_len == 0 || spec.duration_frames == 0 {
        return None;
    }
    let dur = spec.duration_frames.min(clip_len);

    let (window_start, window_end_excl) = match edge {
        FadeEdge::In => {
            let start = clip_range.start.0;
            (start, start.saturating_add(dur))
        }
        FadeEdge::Out => {
            let end = clip_range.end.0;
            (end.saturating_sub(dur), end)
        }
    };

    if !(window_start <= frame.0 && frame.0 < window_end_excl) {
        return None;
    }

    let denom = dur.saturating_sub(1);
    let t = if denom == 0 {
        1.0
    } else {
        let offset = frame.0 - window_start;
        (offset as f64) / (denom as f64)
    };
    Some(spec.ease.apply(t).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        anim::Anim,
        core::{Canvas, Fps, Transform2D},
        ease::Ease,
        model::{ClipProps, PolygonAsset, Track},
    };
    use std::collections::BTreeMap;

    fn tri_points() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(0.0, 10.0),
        ]
    }

    fn basic_comp(
        opacity: Anim<f64>,
        fade_in: Option<FadeSpec>,
        fade_out: Option<FadeSpec>,
    ) -> Composition {
        let mut assets = BTreeMap::new();
        assets.insert(
            "tri".to_string(),
            Asset::Polygon(PolygonAsset {
                points: Anim::constant(tri_points()),
                stroke: None,
            }),
        );
        Composition {
            fps: Fps::new(30, 1).unwrap(),
            canvas: Canvas {
                width: 640,
                height: 360,
            },
            duration: FrameIndex(20),
            assets,
            tracks: vec![Track {
                name: "main".to_string(),
                z_base: 0,
                clips: vec![Clip {
                    id: "c0".to_string(),
                    asset: "tri".to_string(),
                    range: FrameRange::new(FrameIndex(5), FrameIndex(15)).unwrap(),
                    props: ClipProps {
                        transform: Anim::constant(Transform2D::translation(1.0, 2.0)),
                        opacity,
                        fill: Some(Anim::constant(Rgba8::new(10, 20, 30, 128))),
                        draw: Anim::constant(1.0),
                    },
                    z_offset: 0,
                    fade_in,
                    fade_out,
                }],
            }],
        }
    }

    #[test]
    fn visibility_respects_frame_range() {
        let comp = basic_comp(Anim::constant(1.0), None, None);
        for (frame, expected) in [(4u64, 0usize), (5, 1), (14, 1), (15, 0)] {
            assert_eq!(
                Evaluator::eval_frame(&comp, FrameIndex(frame))
                    .unwrap()
                    .nodes
                    .len(),
                expected,
                "frame {frame}"
            );
        }
    }

    #[test]
    fn opacity_is_clamped() {
        let comp = basic_comp(Anim::constant(2.0), None, None);
        let g = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert_eq!(g.nodes[0].opacity, 1.0);
    }

    #[test]
    fn polygon_points_are_resolved() {
        let comp = basic_comp(Anim::constant(1.0), None, None);
        let g = Evaluator::eval_frame(&comp, FrameIndex(6)).unwrap();
        assert_eq!(g.nodes[0].points.as_ref().unwrap(), &tri_points());
    }

    #[test]
    fn fade_windows_hit_progress_boundaries() {
        let fade = FadeSpec {
            duration_frames: 3,
            ease: Ease::Linear,
        };
        let comp = basic_comp(Anim::constant(1.0), Some(fade), Some(fade));

        // Fade-in starts fully transparent at the clip's first frame.
        let g0 = Evaluator::eval_frame(&comp, FrameIndex(5)).unwrap();
        assert_eq!(g0.nodes[0].opacity, 0.0);

        // Last fade-in frame is fully opaque (dur=3 => denom=2).
        let g_last_in = Evaluator::eval_frame(&comp, FrameIndex(7)).unwrap();
        assert_eq!(g_last_in.nodes[0].opacity, 1.0);

        // Fade-out starts at end-dur with full opacity.
        let g_out0 = Evaluator::eval_frame(&comp, FrameIndex(12)).unwrap();
        assert_eq!(g_out0.nodes[0].opacity, 1.0);

        // Last visible frame is fully faded.
        let g_out_last = Evaluator::eval_frame(&comp, FrameIndex(14)).unwrap();
        assert_eq!(g_out_last.nodes[0].opacity, 0.0);
    }

    #[test]
    fn z_order_is_deterministic() {
        let mut comp = basic_comp(Anim::constant(1.0), None, None);
        let mut clip_hi = comp.tracks[0].clips[0].clone();
        clip_hi.id = "c_front".to_string();
        clip_hi.z_offset = 5;
        let mut clip_lo = comp.tracks[0].clips[0].clone();
        clip_lo.id = "c_back".to_string();
        clip_lo.z_offset = -5;
        comp.tracks[0].clips.push(clip_hi);
        comp.tracks[0].clips.push(clip_lo);

        let g = Evaluator::eval_frame(&comp, FrameIndex(6)).unwrap();
        let ids: Vec<&str> = g.nodes.iter().map(|n| n.clip_id.as_str()).collect();
        assert_eq!(ids, vec!["c_back", "c0", "c_front"]);
    }

    #[test]
    fn out_of_bounds_frame_is_rejected() {
        let comp = basic_comp(Anim::constant(1.0), None, None);
        assert!(Evaluator::eval_frame(&comp, FrameIndex(20)).is_err());
    }
}
