//! The area-decomposition proof, scripted onto the composition timeline:
//! a square of side a+b is split into four congruent right triangles and a
//! tilted central square of side c, the areas are equated, and the
//! dissection then morphs to a second leg pair to show the relationship is
//! not an artifact of the chosen dimensions.

use crate::{
    anim::{Anim, InterpMode},
    anim_ops,
    core::{Canvas, Fps, FrameIndex, FrameRange, Point, Rgba8, Transform2D, Vec2},
    dsl::{ClipBuilder, CompositionBuilder, TrackBuilder},
    ease::Ease,
    error::GnomonResult,
    geometry::{LegPair, SceneMap, SquareDissection, brace_label_anchor, brace_path},
    model::{Asset, Clip, Composition, FadeSpec, PathAsset, PolygonAsset, StrokeStyle, TextAsset},
};

pub const WHITE: Rgba8 = Rgba8::opaque(0xFF, 0xFF, 0xFF);
pub const BLUE: Rgba8 = Rgba8::opaque(0x58, 0xC4, 0xDD);
pub const GREEN: Rgba8 = Rgba8::opaque(0x83, 0xC1, 0x67);
pub const RED: Rgba8 = Rgba8::opaque(0xFC, 0x62, 0x55);
pub const YELLOW: Rgba8 = Rgba8::opaque(0xFF, 0xFF, 0x00);
pub const PINK: Rgba8 = Rgba8::opaque(0xD1, 0x47, 0xBD);
pub const LIGHT_PINK: Rgba8 = Rgba8::opaque(0xDC, 0x75, 0xCD);

const BRACE_BUFF: f64 = 0.15;
const BRACE_DEPTH: f64 = 0.18;
const BRACE_LABEL_PAD: f64 = 0.3;

#[derive(Clone, Debug)]
pub struct ProofConfig {
    pub first: LegPair,
    pub second: LegPair,
    pub fps: Fps,
    pub canvas: Canvas,
    /// Height of the visible area in scene units.
    pub units_per_height: f64,
    pub font_family: Option<String>,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            first: LegPair { a: 2.0, b: 1.2 },
            second: LegPair { a: 1.5, b: 2.5 },
            fps: Fps { num: 30, den: 1 },
            canvas: Canvas {
                width: 1280,
                height: 720,
            },
            units_per_height: 8.0,
            font_family: None,
        }
    }
}

/// A built proof scene: the composition plus the timeline landmarks tests
/// and tooling care about.
#[derive(Clone, Debug)]
pub struct ProofScene {
    pub composition: Composition,
    pub timings: SceneTimings,
}

#[derive(Clone, Copy, Debug)]
pub struct SceneTimings {
    pub morph: Window,
    pub highlight: Window,
    pub total_frames: u64,
}

/// Half-open window on the global frame timeline.
#[derive(Clone, Copy, Debug)]
pub struct Window {
    pub start: u64,
    pub dur: u64,
}

impl Window {
    pub fn end(self) -> u64 {
        self.start + self.dur
    }
}

/// Advances a seconds cursor and hands out frame windows, the way the
/// original sequence alternates `play(run_time)` and `wait`.
struct Timeline {
    fps: Fps,
    cursor_s: f64,
}

impl Timeline {
    fn new(fps: Fps) -> Self {
        Self { fps, cursor_s: 0.0 }
    }

    fn now(&self) -> u64 {
        self.fps.secs_to_frames_floor(self.cursor_s)
    }

    fn play(&mut self, secs: f64) -> Window {
        let start = self.now();
        self.cursor_s += secs;
        let dur = self.now().saturating_sub(start).max(1);
        Window { start, dur }
    }

    fn wait(&mut self, secs: f64) {
        self.cursor_s += secs;
    }
}

pub fn build_composition(cfg: &ProofConfig) -> GnomonResult<Composition> {
    Ok(build(cfg)?.composition)
}

#[tracing::instrument(skip(cfg))]
pub fn build(cfg: &ProofConfig) -> GnomonResult<ProofScene> {
    // Re-validate the leg pairs; `ProofConfig` fields are plain data.
    let first = LegPair::new(cfg.first.a, cfg.first.b)?;
    let second = LegPair::new(cfg.second.a, cfg.second.b)?;
    let map = SceneMap::new(cfg.canvas, cfg.units_per_height)?;

    let before = SquareDissection::new(first);
    let after = SquareDissection::new(second);

    // ---- timeline ---------------------------------------------------------
    let mut tl = Timeline::new(cfg.fps);
    let w_title = tl.play(1.0);
    tl.wait(0.6);
    let w_outer = tl.play(1.0);
    let w_formula = tl.play(1.0);
    tl.wait(0.7);
    let w_tris = tl.play(1.2);
    let w_braces1 = tl.play(1.0);
    tl.wait(1.0);
    let w_inner = tl.play(1.0);
    let w_brace_c = tl.play(1.0);
    tl.wait(0.8);
    let w_eq0 = tl.play(1.0);
    tl.wait(1.5);
    let w_eq1 = tl.play(1.0);
    tl.wait(1.5);
    let w_eq2 = tl.play(1.0);
    tl.wait(1.5);
    let w_eq3 = tl.play(1.2);
    tl.wait(1.75);
    let w_conclusion = tl.play(1.0);
    tl.wait(1.4);
    let w_highlight = tl.play(1.0);
    tl.wait(1.2);
    let w_dim_text = tl.play(1.0);
    tl.wait(1.0);
    let w_braces1_out = tl.play(1.0);
    tl.wait(0.3);
    let w_formula_shift = tl.play(1.0);
    let w_morph = tl.play(3.0);
    let w_braces2 = tl.play(1.5);
    let w_invariant = tl.play(1.0);
    tl.wait(2.5);

    let total = tl.now() + 1;
    let full = |start: u64| FrameRange::new(FrameIndex(start), FrameIndex(total));

    // ---- shared styling ---------------------------------------------------
    let heavy_stroke = StrokeStyle {
        width: stroke_px(cfg.canvas, 3.0),
        color: WHITE,
    };
    let light_stroke = StrokeStyle {
        width: stroke_px(cfg.canvas, 2.0),
        color: WHITE,
    };

    let text = |s: &str, size: f64| text_asset(cfg, s, size);
    let at = |p: Point| Anim::constant(Transform2D::translation(p.x, p.y));
    let write = |w: Window| FadeSpec {
        duration_frames: w.dur,
        ease: Ease::OutCubic,
    };
    let fade = |w: Window| FadeSpec {
        duration_frames: w.dur,
        ease: Ease::Linear,
    };

    // Morph keyframes for a polygon clip that appears at `clip_start`.
    let morphing = |clip_start: u64, from: &[Point], to: &[Point]| {
        anim_ops::keyframes(
            vec![
                (0, map.map_all(from), Ease::Linear),
                (
                    w_morph.start - clip_start,
                    map.map_all(from),
                    Ease::InOutCubic,
                ),
                (w_morph.end() - clip_start, map.map_all(to), Ease::Linear),
            ],
            InterpMode::Linear,
        )
    };
    // Fill alpha bump during the partition highlight.
    let highlighted = |clip_start: u64, color: Rgba8, from_alpha: f64, to_alpha: f64| {
        anim_ops::ramp(
            color.with_alpha_f64(from_alpha),
            color.with_alpha_f64(to_alpha),
            w_highlight.start - clip_start,
            w_highlight.dur,
            Ease::OutQuad,
        )
    };

    let top_y = map.half_extent().y;

    let mut comp = CompositionBuilder::new(cfg.fps, cfg.canvas, FrameIndex(total));

    // ---- outer square and headline ----------------------------------------
    comp = comp.asset(
        "outer-square",
        Asset::Polygon(PolygonAsset {
            points: morphing(w_outer.start, &before.outer, &after.outer),
            stroke: Some(heavy_stroke),
        }),
    )?;
    comp = comp.asset("title", text("Area Proof: Pythagorean Theorem", 36.0))?;
    comp = comp.asset("area-formula", text("Area = (a+b)\u{00b2}", 36.0))?;

    let outer_clip = ClipBuilder::new("outer-square", "outer-square", full(w_outer.start)?)
        .draw(anim_ops::ramp(0.0, 1.0, 0, w_outer.dur, Ease::InOutQuad))
        .build()?;

    let title_clip = ClipBuilder::new("title", "title", full(w_title.start)?)
        .transform(at(map.to_px(Point::new(0.0, top_y - 0.5))))
        .fade_in(write(w_title))
        .build()?;

    // Rides up before the morph so the larger outer square clears it.
    let formula_y0 = first.outer_side() / 2.0 + 0.35;
    let formula_clip = ClipBuilder::new("area-formula", "area-formula", full(w_formula.start)?)
        .transform(anim_ops::keyframes(
            vec![
                (
                    0,
                    transform_at(map.to_px(Point::new(0.0, formula_y0))),
                    Ease::Linear,
                ),
                (
                    w_formula_shift.start - w_formula.start,
                    transform_at(map.to_px(Point::new(0.0, formula_y0))),
                    Ease::InOutQuad,
                ),
                (
                    w_formula_shift.end() - w_formula.start,
                    transform_at(map.to_px(Point::new(0.0, formula_y0 + 0.35))),
                    Ease::Linear,
                ),
            ],
            InterpMode::Linear,
        ))
        .fade_in(write(w_formula))
        .build()?;

    // ---- the four corner triangles ----------------------------------------
    let triangle_colors = [BLUE, GREEN, RED, YELLOW];
    let triangle_names = ["triangle-bl", "triangle-br", "triangle-tr", "triangle-tl"];
    let mut triangle_clips = Vec::<Clip>::new();
    for (i, name) in triangle_names.iter().enumerate() {
        comp = comp.asset(
            *name,
            Asset::Polygon(PolygonAsset {
                points: morphing(w_tris.start, &before.triangles[i], &after.triangles[i]),
                stroke: Some(light_stroke),
            }),
        )?;
        triangle_clips.push(
            ClipBuilder::new(*name, *name, full(w_tris.start)?)
                .fill(highlighted(w_tris.start, triangle_colors[i], 0.5, 0.6))
                .fade_in(fade(w_tris))
                .z_offset(i as i32)
                .build()?,
        );
    }

    // ---- central square ----------------------------------------------------
    comp = comp.asset(
        "inner-square",
        Asset::Polygon(PolygonAsset {
            points: morphing(w_inner.start, &before.inner, &after.inner),
            stroke: Some(heavy_stroke),
        }),
    )?;
    let inner_fill = anim_ops::keyframes(
        vec![
            (0, PINK.with_alpha_f64(0.0), Ease::InOutQuad),
            (w_inner.dur, PINK.with_alpha_f64(0.6), Ease::Linear),
            (
                w_highlight.start - w_inner.start,
                PINK.with_alpha_f64(0.6),
                Ease::OutQuad,
            ),
            (
                w_highlight.end() - w_inner.start,
                LIGHT_PINK.with_alpha_f64(0.9),
                Ease::Linear,
            ),
        ],
        InterpMode::Linear,
    );
    let inner_clip = ClipBuilder::new("inner-square", "inner-square", full(w_inner.start)?)
        .fill(inner_fill)
        .draw(anim_ops::ramp(0.0, 1.0, 0, w_inner.dur, Ease::InOutQuad))
        .z_offset(4)
        .build()?;

    // ---- braces and side labels -------------------------------------------
    let mut annotation_clips = Vec::<Clip>::new();

    let braces1 = BraceSet {
        suffix: "first",
        dissection: &before,
        leg_range: FrameRange::new(
            FrameIndex(w_braces1.start),
            FrameIndex(w_braces1_out.end()),
        )?,
        hyp_range: FrameRange::new(
            FrameIndex(w_brace_c.start),
            FrameIndex(w_braces1_out.end()),
        )?,
        fade_in_leg: fade(w_braces1),
        fade_in_hyp: write(w_brace_c),
        draw_hyp: Some(anim_ops::ramp(0.0, 1.0, 0, w_brace_c.dur, Ease::InOutQuad)),
        fade_out: Some(fade(w_braces1_out)),
        stroke: light_stroke,
    };
    comp = add_brace_set(comp, &mut annotation_clips, cfg, &map, braces1)?;

    let braces2 = BraceSet {
        suffix: "second",
        dissection: &after,
        leg_range: full(w_braces2.start)?,
        hyp_range: full(w_braces2.start)?,
        fade_in_leg: fade(w_braces2),
        fade_in_hyp: fade(w_braces2),
        draw_hyp: None,
        fade_out: None,
        stroke: light_stroke,
    };
    comp = add_brace_set(comp, &mut annotation_clips, cfg, &map, braces2)?;

    // ---- algebra at the bottom edge ---------------------------------------
    let eq_pos = map.to_px(Point::new(0.0, -(top_y - 0.6)));
    let steps = [
        (
            "equation-0",
            "(a+b)\u{00b2} = 4\u{00b7}(\u{00bd}\u{00b7}a\u{00b7}b) + c\u{00b2}",
            36.0,
            w_eq0,
            Some(w_eq1),
        ),
        (
            "equation-1",
            "(a+b)\u{00b2} = 2\u{00b7}a\u{00b7}b + c\u{00b2}",
            36.0,
            w_eq1,
            Some(w_eq2),
        ),
        (
            "equation-2",
            "a\u{00b2} + 2\u{00b7}a\u{00b7}b + b\u{00b2} = 2\u{00b7}a\u{00b7}b + c\u{00b2}",
            36.0,
            w_eq2,
            Some(w_eq3),
        ),
        (
            "equation-3",
            "a\u{00b2} + b\u{00b2} = c\u{00b2}",
            48.0,
            w_eq3,
            None,
        ),
    ];
    for (key, body, size, appear, replaced_by) in steps {
        comp = comp.asset(key, text(body, size))?;
        let range = match replaced_by {
            // Each step crossfades into the next: it stays alive through the
            // next step's write window and fades out across it.
            Some(next) => FrameRange::new(FrameIndex(appear.start), FrameIndex(next.end()))?,
            None => full(appear.start)?,
        };
        let mut clip = ClipBuilder::new(key, key, range)
            .transform(at(eq_pos))
            .fade_in(write(appear));
        if let Some(next) = replaced_by {
            clip = clip.fade_out(fade(next));
        }
        annotation_clips.push(clip.build()?);
    }

    // ---- captions ----------------------------------------------------------
    comp = comp.asset(
        "conclusion",
        text(
            "Therefore, in any\nright triangle:\nc\u{00b2} = a\u{00b2} + b\u{00b2}",
            30.0,
        ),
    )?;
    comp = comp.asset(
        "dimension-note",
        text("Now we change the dimensions of a and b", 30.0),
    )?;
    comp = comp.asset(
        "invariant",
        text(
            "Even though the sides change,\nthe relationship a\u{00b2} + b\u{00b2} = c\u{00b2}\nremains true!",
            30.0,
        ),
    )?;

    let conclusion_clip = ClipBuilder::new("conclusion", "conclusion", full(w_conclusion.start)?)
        .transform(at(map.to_px(Point::new(4.5, 0.0))))
        .fade_in(fade(w_conclusion))
        .build()?;
    let dim_note_clip =
        ClipBuilder::new("dimension-note", "dimension-note", full(w_dim_text.start)?)
            .transform(at(map.to_px(Point::new(0.0, top_y - 1.2))))
            .fade_in(write(w_dim_text))
            .build()?;
    let invariant_clip = ClipBuilder::new("invariant", "invariant", full(w_invariant.start)?)
        .transform(at(map.to_px(Point::new(-4.5, 0.0))))
        .fade_in(write(w_invariant))
        .build()?;

    // ---- tracks ------------------------------------------------------------
    let mut shapes = TrackBuilder::new("shapes").z_base(0).clip(outer_clip);
    for clip in triangle_clips {
        shapes = shapes.clip(clip);
    }
    shapes = shapes.clip(inner_clip);

    let mut annotations = TrackBuilder::new("annotations").z_base(10);
    for clip in annotation_clips {
        annotations = annotations.clip(clip);
    }

    let headlines = TrackBuilder::new("headlines")
        .z_base(20)
        .clip(title_clip)
        .clip(formula_clip)
        .clip(conclusion_clip)
        .clip(dim_note_clip)
        .clip(invariant_clip);

    let composition = comp
        .track(shapes.build()?)
        .track(annotations.build()?)
        .track(headlines.build()?)
        .build()?;

    Ok(ProofScene {
        composition,
        timings: SceneTimings {
            morph: w_morph,
            highlight: w_highlight,
            total_frames: total,
        },
    })
}

/// One generation of measurement braces: `a` and `b` on the bottom-left
/// triangle's legs, `c` on its hypotenuse.
struct BraceSet<'a> {
    suffix: &'a str,
    dissection: &'a SquareDissection,
    leg_range: FrameRange,
    hyp_range: FrameRange,
    fade_in_leg: FadeSpec,
    fade_in_hyp: FadeSpec,
    /// Stroke-reveal anim for the hypotenuse brace; falls back to the fade
    /// when unset.
    draw_hyp: Option<Anim<f64>>,
    fade_out: Option<FadeSpec>,
    stroke: StrokeStyle,
}

fn add_brace_set(
    mut comp: CompositionBuilder,
    clips: &mut Vec<Clip>,
    cfg: &ProofConfig,
    map: &SceneMap,
    set: BraceSet<'_>,
) -> GnomonResult<CompositionBuilder> {
    let d = set.dissection;
    let bl = d.outer[0];
    let (a, b) = (d.legs.a, d.legs.b);
    let (hyp_from, hyp_to) = d.bl_hypotenuse();
    let hyp_dir = (hyp_to - hyp_from) / d.legs.hypotenuse();
    // Clockwise perpendicular: points across the hypotenuse toward the
    // center of the square, the side the original places the brace on.
    let hyp_normal = Vec2::new(hyp_dir.y, -hyp_dir.x);

    let specs: [(&str, Point, Point, Vec2); 3] = [
        ("a", bl, bl + Vec2::new(0.0, a), Vec2::new(-1.0, 0.0)),
        ("b", bl, bl + Vec2::new(b, 0.0), Vec2::new(0.0, -1.0)),
        ("c", hyp_from, hyp_to, hyp_normal),
    ];

    for (label, from, to, normal) in specs {
        let (path_d, anchor) = brace_in_px(map, from, to, normal)?;
        let brace_key = format!("brace-{label}-{}", set.suffix);
        let label_key = format!("label-{label}-{}", set.suffix);

        comp = comp.asset(
            &brace_key,
            Asset::Path(PathAsset {
                svg_path_d: path_d,
                stroke: Some(set.stroke),
            }),
        )?;
        comp = comp.asset(&label_key, text_asset(cfg, label, 36.0))?;

        let is_hyp = label == "c";
        let range = if is_hyp { set.hyp_range } else { set.leg_range };
        let mut brace_clip = ClipBuilder::new(&brace_key, &brace_key, range);
        let mut label_clip = ClipBuilder::new(&label_key, &label_key, range).transform(
            Anim::constant(Transform2D::translation(anchor.x, anchor.y)),
        );

        if is_hyp {
            match set.draw_hyp.clone() {
                Some(draw) => brace_clip = brace_clip.draw(draw),
                None => brace_clip = brace_clip.fade_in(set.fade_in_hyp),
            }
            label_clip = label_clip.fade_in(set.fade_in_hyp);
        } else {
            brace_clip = brace_clip.fade_in(set.fade_in_leg);
            label_clip = label_clip.fade_in(set.fade_in_leg);
        }
        if let Some(out) = set.fade_out {
            brace_clip = brace_clip.fade_out(out);
            label_clip = label_clip.fade_out(out);
        }

        clips.push(brace_clip.build()?);
        clips.push(label_clip.build()?);
    }
    Ok(comp)
}

fn text_asset(cfg: &ProofConfig, s: &str, size: f64) -> Asset {
    Asset::Text(TextAsset {
        text: s.to_string(),
        size_px: font_px(cfg.canvas, size),
        color: WHITE,
        family: cfg.font_family.clone(),
    })
}

fn transform_at(p: Point) -> Transform2D {
    Transform2D::translation(p.x, p.y)
}

/// Nominal font sizes scale with canvas height (800px reference).
fn font_px(canvas: Canvas, size: f64) -> f32 {
    (size * f64::from(canvas.height) / 800.0) as f32
}

fn stroke_px(canvas: Canvas, width: f64) -> f64 {
    width * f64::from(canvas.height) / 800.0
}

/// Builds a brace in pixel space along a math-space segment, bulging toward
/// `out_normal`. Returns the SVG path and the pixel anchor for its label.
fn brace_in_px(
    map: &SceneMap,
    from: Point,
    to: Point,
    out_normal: Vec2,
) -> GnomonResult<(String, Point)> {
    let n = out_normal / out_normal.hypot();
    let p = map.to_px(from + n * BRACE_BUFF);
    let q = map.to_px(to + n * BRACE_BUFF);

    // `brace_path` bulges to the screen-left of its direction of travel;
    // order the endpoints so that side coincides with the outward normal.
    let n_px = Vec2::new(n.x, -n.y);
    let d = (q - p) / (q - p).hypot();
    let screen_left = Vec2::new(d.y, -d.x);
    let (s, e) = if screen_left.dot(n_px) >= 0.0 {
        (p, q)
    } else {
        (q, p)
    };

    let depth_px = map.len_px(BRACE_DEPTH);
    let path = brace_path(s, e, depth_px)?;
    let anchor = brace_label_anchor(s, e, depth_px, map.len_px(BRACE_LABEL_PAD));
    Ok((path.to_svg(), anchor))
}
