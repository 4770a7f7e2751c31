//! Plane geometry of the (a+b)-square dissection: four congruent right
//! triangles around a tilted central square of side c, plus the path
//! utilities the scene needs (braces, stroke trimming, unit mapping).

use kurbo::{ParamCurve, ParamCurveArclen, PathSeg};

use crate::{
    core::{BezPath, Canvas, Point, Vec2},
    error::{GnomonError, GnomonResult},
};

const ARCLEN_ACCURACY: f64 = 1e-4;

/// The two legs of the right triangle being dissected.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LegPair {
    pub a: f64,
    pub b: f64,
}

impl LegPair {
    pub fn new(a: f64, b: f64) -> GnomonResult<Self> {
        if !a.is_finite() || !b.is_finite() || a <= 0.0 || b <= 0.0 {
            return Err(GnomonError::geometry(
                "triangle legs must be finite and > 0",
            ));
        }
        Ok(Self { a, b })
    }

    pub fn hypotenuse(self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Angle of the central square relative to the outer square's sides.
    pub fn tilt_angle(self) -> f64 {
        self.b.atan2(self.a)
    }

    pub fn outer_side(self) -> f64 {
        self.a + self.b
    }
}

/// The full dissection in math coordinates: origin at the center of the
/// outer square, +y up. Vertex winding matches the corner construction:
/// each triangle starts at its outer-square corner and walks its
/// horizontal leg, then its vertical leg.
#[derive(Clone, Debug)]
pub struct SquareDissection {
    pub legs: LegPair,
    /// Outer square corners: bottom-left, bottom-right, top-right, top-left.
    pub outer: Vec<Point>,
    /// Corner triangles in the same order as `outer`.
    pub triangles: [Vec<Point>; 4],
    /// Central square of side c, tilted by `tilt_angle`, centered on origin.
    pub inner: Vec<Point>,
}

impl SquareDissection {
    pub fn new(legs: LegPair) -> Self {
        let h = legs.outer_side() / 2.0;
        let (a, b) = (legs.a, legs.b);

        let bl = Point::new(-h, -h);
        let br = Point::new(h, -h);
        let tr = Point::new(h, h);
        let tl = Point::new(-h, h);

        let triangles = [
            vec![bl, bl + Vec2::new(b, 0.0), bl + Vec2::new(0.0, a)],
            vec![br, br + Vec2::new(-a, 0.0), br + Vec2::new(0.0, b)],
            vec![tr, tr + Vec2::new(-b, 0.0), tr + Vec2::new(0.0, -a)],
            vec![tl, tl + Vec2::new(a, 0.0), tl + Vec2::new(0.0, -b)],
        ];

        Self {
            legs,
            outer: vec![bl, br, tr, tl],
            triangles,
            inner: rotated_square(legs.hypotenuse(), legs.tilt_angle()),
        }
    }

    /// Hypotenuse of the bottom-left triangle, from the horizontal-leg end
    /// to the vertical-leg end. This is the segment the `c` brace sits on.
    pub fn bl_hypotenuse(&self) -> (Point, Point) {
        (self.triangles[0][1], self.triangles[0][2])
    }

    /// `(a+b)² - (4·(ab/2) + c²)`; zero up to fp error for any legs.
    pub fn area_identity_residual(&self) -> f64 {
        let legs = self.legs;
        let outer = legs.outer_side() * legs.outer_side();
        let triangles = 4.0 * (legs.a * legs.b / 2.0);
        let inner = legs.hypotenuse() * legs.hypotenuse();
        outer - (triangles + inner)
    }
}

/// Vertices of an axis-aligned square of the given side, rotated about the
/// origin. Order: bottom-left corner first, counter-clockwise.
pub fn rotated_square(side: f64, angle: f64) -> Vec<Point> {
    let h = side / 2.0;
    let (sin, cos) = angle.sin_cos();
    let rot = |x: f64, y: f64| Point::new(x * cos - y * sin, x * sin + y * cos);
    vec![rot(-h, -h), rot(h, -h), rot(h, h), rot(-h, h)]
}

/// Closed polygon outline as a bezier path.
pub fn polygon_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let Some(first) = points.first() else {
        return path;
    };
    path.move_to(*first);
    for p in &points[1..] {
        path.line_to(*p);
    }
    path.close_path();
    path
}

/// Curly brace along the `from -> to` segment. The brace bulges toward
/// `(d.y, -d.x)` where `d` is the unit direction: in y-down pixel
/// coordinates that is the left-hand side when walking from -> to.
pub fn brace_path(from: Point, to: Point, depth: f64) -> GnomonResult<BezPath> {
    let seg = to - from;
    let len = seg.hypot();
    if !len.is_finite() || len <= 0.0 {
        return Err(GnomonError::geometry("brace endpoints must be distinct"));
    }
    if !depth.is_finite() || depth <= 0.0 {
        return Err(GnomonError::geometry("brace depth must be finite and > 0"));
    }

    let d = seg / len;
    let n = Vec2::new(d.y, -d.x);
    let mid = from + seg * 0.5;
    let cusp = mid + n * depth;
    let shoulder = n * (depth * 0.55);

    let mut path = BezPath::new();
    path.move_to(from);
    path.curve_to(
        from + shoulder,
        mid - d * (len * 0.18) + n * (depth * 0.45),
        cusp,
    );
    path.curve_to(
        mid + d * (len * 0.18) + n * (depth * 0.45),
        to + shoulder,
        to,
    );
    Ok(path)
}

/// Point at which a label for the brace should be centered.
pub fn brace_label_anchor(from: Point, to: Point, depth: f64, pad: f64) -> Point {
    let seg = to - from;
    let len = seg.hypot();
    if len <= 0.0 {
        return from;
    }
    let d = seg / len;
    let n = Vec2::new(d.y, -d.x);
    from + seg * 0.5 + n * (depth + pad)
}

/// Arclength-proportional prefix of a path: `t = 0` is empty, `t = 1` the
/// full path. Subpath boundaries are preserved.
pub fn trim_bezpath(path: &BezPath, t: f64) -> BezPath {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        return path.clone();
    }

    let segs: Vec<PathSeg> = path.segments().collect();
    let total: f64 = segs.iter().map(|s| s.arclen(ARCLEN_ACCURACY)).sum();
    let mut out = BezPath::new();
    if total <= 0.0 || t <= 0.0 {
        return out;
    }

    let mut budget = total * t;
    let mut cursor: Option<Point> = None;
    for seg in segs {
        if budget <= 0.0 {
            break;
        }
        let len = seg.arclen(ARCLEN_ACCURACY);
        let piece = if len <= budget {
            budget -= len;
            seg
        } else {
            let t_end = seg.inv_arclen(budget, ARCLEN_ACCURACY);
            budget = 0.0;
            seg.subsegment(0.0..t_end)
        };

        if cursor != Some(piece.start()) {
            out.move_to(piece.start());
        }
        match piece {
            PathSeg::Line(l) => out.line_to(l.p1),
            PathSeg::Quad(q) => out.quad_to(q.p1, q.p2),
            PathSeg::Cubic(c) => out.curve_to(c.p1, c.p2, c.p3),
        }
        cursor = Some(piece.end());
    }
    out
}

/// Maps math coordinates (origin at canvas center, +y up) to pixel
/// coordinates (origin top-left, +y down). One unit is
/// `canvas.height / units_per_height` pixels.
#[derive(Clone, Copy, Debug)]
pub struct SceneMap {
    pub canvas: Canvas,
    pub units_per_height: f64,
}

impl SceneMap {
    pub fn new(canvas: Canvas, units_per_height: f64) -> GnomonResult<Self> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(GnomonError::geometry("scene canvas must be non-empty"));
        }
        if !units_per_height.is_finite() || units_per_height <= 0.0 {
            return Err(GnomonError::geometry(
                "units_per_height must be finite and > 0",
            ));
        }
        Ok(Self {
            canvas,
            units_per_height,
        })
    }

    pub fn scale(&self) -> f64 {
        f64::from(self.canvas.height) / self.units_per_height
    }

    pub fn to_px(&self, p: Point) -> Point {
        let s = self.scale();
        Point::new(
            f64::from(self.canvas.width) / 2.0 + p.x * s,
            f64::from(self.canvas.height) / 2.0 - p.y * s,
        )
    }

    pub fn len_px(&self, units: f64) -> f64 {
        units * self.scale()
    }

    pub fn map_all(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|p| self.to_px(*p)).collect()
    }

    /// Half-extent of the visible area in units, `(width/2, height/2)`.
    pub fn half_extent(&self) -> Vec2 {
        let aspect = f64::from(self.canvas.width) / f64::from(self.canvas.height);
        Vec2::new(self.units_per_height * aspect / 2.0, self.units_per_height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn assert_point_close(a: Point, b: Point) {
        assert!((a - b).hypot() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn hypotenuse_and_tilt_for_both_configured_pairs() {
        let first = LegPair::new(2.0, 1.2).unwrap();
        assert_close(first.hypotenuse(), (2.0f64 * 2.0 + 1.2 * 1.2).sqrt());
        assert_close(first.tilt_angle(), 1.2f64.atan2(2.0));

        let second = LegPair::new(1.5, 2.5).unwrap();
        assert_close(second.hypotenuse(), (1.5f64 * 1.5 + 2.5 * 2.5).sqrt());
        assert_close(second.tilt_angle(), 2.5f64.atan2(1.5));
    }

    #[test]
    fn leg_pair_rejects_nonpositive_and_nonfinite() {
        assert!(LegPair::new(0.0, 1.0).is_err());
        assert!(LegPair::new(1.0, -2.0).is_err());
        assert!(LegPair::new(f64::NAN, 1.0).is_err());
        assert!(LegPair::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn area_identity_holds() {
        for legs in [
            LegPair::new(2.0, 1.2).unwrap(),
            LegPair::new(1.5, 2.5).unwrap(),
            LegPair::new(3.0, 4.0).unwrap(),
        ] {
            let d = SquareDissection::new(legs);
            assert!(d.area_identity_residual().abs() < 1e-9);
        }
    }

    #[test]
    fn triangles_are_congruent_right_triangles() {
        let legs = LegPair::new(2.0, 1.2).unwrap();
        let d = SquareDissection::new(legs);
        for tri in &d.triangles {
            let e0 = (tri[1] - tri[0]).hypot();
            let e1 = (tri[2] - tri[0]).hypot();
            let mut sides = [e0, e1];
            sides.sort_by(|x, y| x.partial_cmp(y).unwrap());
            assert_close(sides[0], 1.2);
            assert_close(sides[1], 2.0);
            // Legs meet at the outer corner at a right angle.
            let dot = (tri[1] - tri[0]).dot(tri[2] - tri[0]);
            assert!(dot.abs() < EPS);
        }
    }

    #[test]
    fn triangles_stay_inside_outer_square() {
        let legs = LegPair::new(1.5, 2.5).unwrap();
        let d = SquareDissection::new(legs);
        let h = legs.outer_side() / 2.0;
        for tri in &d.triangles {
            for p in tri {
                assert!(p.x >= -h - EPS && p.x <= h + EPS);
                assert!(p.y >= -h - EPS && p.y <= h + EPS);
            }
        }
    }

    #[test]
    fn inner_square_vertices_sit_on_triangle_leg_ends() {
        // The rotated-square construction and the corner construction agree:
        // each central-square vertex is the end of a triangle leg on the
        // outer square's edge.
        let legs = LegPair::new(2.0, 1.2).unwrap();
        let d = SquareDissection::new(legs);
        let h = legs.outer_side() / 2.0;
        let b = legs.b;

        let expected = [
            Point::new(b - h, -h),
            Point::new(h, b - h),
            Point::new(h - b, h),
            Point::new(-h, h - b),
        ];
        for (got, want) in d.inner.iter().zip(expected.iter()) {
            assert_point_close(*got, *want);
        }
        // The bottom vertex is the end of the bottom-left triangle's
        // horizontal leg, i.e. one end of its hypotenuse.
        let (hyp_from, _) = d.bl_hypotenuse();
        assert_point_close(d.inner[0], hyp_from);
    }

    #[test]
    fn inner_square_has_side_c() {
        let legs = LegPair::new(1.5, 2.5).unwrap();
        let d = SquareDissection::new(legs);
        let c = legs.hypotenuse();
        for i in 0..4 {
            let side = (d.inner[(i + 1) % 4] - d.inner[i]).hypot();
            assert_close(side, c);
        }
    }

    #[test]
    fn trim_produces_proportional_prefix() {
        let path = polygon_path(&[
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        let full: f64 = path
            .segments()
            .map(|s| s.arclen(ARCLEN_ACCURACY))
            .sum();
        assert_close(full, 40.0);

        let half = trim_bezpath(&path, 0.5);
        let half_len: f64 = half
            .segments()
            .map(|s| s.arclen(ARCLEN_ACCURACY))
            .sum();
        assert!((half_len - 20.0).abs() < 1e-6);

        assert!(trim_bezpath(&path, 0.0).elements().is_empty());
        assert_eq!(
            trim_bezpath(&path, 1.0).elements().len(),
            path.elements().len()
        );
    }

    #[test]
    fn brace_spans_its_segment() {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(10.0, 0.0);
        let brace = brace_path(from, to, 1.0).unwrap();
        let segs: Vec<PathSeg> = brace.segments().collect();
        assert_eq!(segs.len(), 2);
        assert_point_close(segs[0].start(), from);
        assert_point_close(segs[1].end(), to);

        // Bulge side: walking +x in y-down coordinates, left is -y.
        let anchor = brace_label_anchor(from, to, 1.0, 0.5);
        assert!(anchor.y < 0.0);
        assert!(brace_path(from, from, 1.0).is_err());
    }

    #[test]
    fn scene_map_flips_y_and_scales() {
        let map = SceneMap::new(
            Canvas {
                width: 1280,
                height: 720,
            },
            8.0,
        )
        .unwrap();
        assert_close(map.scale(), 90.0);
        let px = map.to_px(Point::new(0.0, 0.0));
        assert_point_close(px, Point::new(640.0, 360.0));
        let up = map.to_px(Point::new(1.0, 1.0));
        assert_point_close(up, Point::new(730.0, 270.0));
        assert_close(map.half_extent().x, 8.0 * (1280.0 / 720.0) / 2.0);
    }
}
