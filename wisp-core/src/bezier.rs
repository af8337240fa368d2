//! Cubic Bezier spline fitting, evaluation and bounding boxes.
//!
//! A [`Spline`] is fit through raw pointer samples with [`fit`]: every
//! sample becomes a curve endpoint and every interior sample gets a pair of
//! handles along the tangent through its neighbours. The resulting curves
//! can be evaluated ([`Curve::point_at`]), boxed ([`Curve::bounds`]) and
//! walked into an evenly spaced point list ([`resample`]).

use glam::Vec2;

/// Handle length as a fraction of the distance to the neighbouring sample.
pub const SMOOTH_FACTOR: f32 = 1.0 / 3.0;

/// Upper bound on evaluation steps per curve in [`resample`].
pub const MAX_RESAMPLE_STEPS: usize = 4096;

/// One cubic Bezier segment `[p0, h1, h2, p3]`.
///
/// `p0` and `p3` are sample points, `h1` and `h2` are handles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Curve(pub [Vec2; 4]);

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

/// Piecewise cubic Bezier curve stored as one flat, interleaved point list:
/// `[p0, h, h, p1, h, h, p2, ..., pN]`.
///
/// Curve `i` is `points[3i..=3i+3]`, so consecutive curves share an endpoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spline {
    points: Vec<Vec2>,
}

impl Curve {
    pub fn new(p0: Vec2, h1: Vec2, h2: Vec2, p3: Vec2) -> Self {
        Self([p0, h1, h2, p3])
    }

    pub fn start(&self) -> Vec2 {
        self.0[0]
    }

    pub fn end(&self) -> Vec2 {
        self.0[3]
    }

    /// Evaluates the curve at `t` with the cubic Bernstein basis.
    ///
    /// `t = 0` yields exactly `p0` and `t = 1` yields exactly `p3`.
    pub fn point_at(&self, t: f32) -> Vec2 {
        let [p0, p1, p2, p3] = self.0;
        let mt = 1.0 - t;
        p0 * (mt * mt * mt) + p1 * (3.0 * mt * mt * t) + p2 * (3.0 * mt * t * t) + p3 * (t * t * t)
    }

    /// First derivative with respect to `t`.
    pub fn velocity_at(&self, t: f32) -> Vec2 {
        let [p0, p1, p2, p3] = self.0;
        let t2 = t * t;
        p0 * (-3.0 * t2 + 6.0 * t - 3.0)
            + p1 * (9.0 * t2 - 12.0 * t + 3.0)
            + p2 * (-9.0 * t2 + 6.0 * t)
            + p3 * (3.0 * t2)
    }

    /// Second derivative with respect to `t`.
    pub fn acceleration_at(&self, t: f32) -> Vec2 {
        let [p0, p1, p2, p3] = self.0;
        p0 * (-6.0 * t + 6.0) + p1 * (18.0 * t - 12.0) + p2 * (-18.0 * t + 6.0) + p3 * (6.0 * t)
    }

    /// Signed curvature at `t`. Zero where the curve has no velocity.
    pub fn curvature_at(&self, t: f32) -> f32 {
        let vel = self.velocity_at(t);
        let speed = vel.length();
        if speed == 0.0 {
            return 0.0;
        }
        vel.perp_dot(self.acceleration_at(t)) / (speed * speed * speed)
    }

    /// Candidate parameters of the x and y extrema, `[x1, x2, y1, y2]`.
    ///
    /// These are the roots of the derivative per axis, unfiltered: entries
    /// may be outside `[0, 1]`, infinite or NaN when an axis has fewer than
    /// two real roots.
    ///
    /// Coincident handles on an axis do not by themselves force a `t = 0.5`
    /// candidate: the roots are still solved exactly. Only when the
    /// quadratic coefficient vanishes (e.g. handles and endpoints both
    /// coincide on that axis) is the derivative linear, and its single root
    /// is then `t = 0.5` for a symmetric curve.
    pub fn extrema(&self) -> [f32; 4] {
        let [p0, p1, p2, p3] = self.0;
        let [x1, x2] = axis_roots(p0.x, p1.x, p2.x, p3.x);
        let [y1, y2] = axis_roots(p0.y, p1.y, p2.y, p3.y);
        [x1, x2, y1, y2]
    }

    /// Tight axis-aligned bounds of the curve, grown by `padding` on every side.
    ///
    /// Starts from the two endpoints and folds in the curve point at every
    /// extremum candidate from [`Curve::extrema`] that lies in `[0, 1]`.
    ///
    /// ### Parameters
    /// - `padding` - Distance added to each side of the box.
    ///
    /// ### Returns
    /// A [`Bounds`] containing every point of the curve.
    pub fn bounds(&self, padding: f32) -> Bounds {
        let mut bounds = Bounds::from_points(self.start(), self.end());

        for t in self.extrema() {
            if !t.is_finite() || !(0.0..=1.0).contains(&t) {
                continue;
            }
            bounds = bounds.include(self.point_at(t));
        }

        bounds.expand(padding)
    }

    /// Rough arc length: the mean of the chord and the control-net length.
    pub fn approx_length(&self) -> f32 {
        let [p0, p1, p2, p3] = self.0;
        let chord = p0.distance(p3);
        let net = p0.distance(p1) + p1.distance(p2) + p2.distance(p3);
        (chord + net) * 0.5
    }
}

/// Roots of the derivative of a 1-D cubic Bezier with coefficients
/// `a t^2 + b t + c`.
fn axis_roots(a0: f32, a1: f32, a2: f32, a3: f32) -> [f32; 2] {
    let a = -3.0 * a0 + 9.0 * a1 - 9.0 * a2 + 3.0 * a3;
    let b = 6.0 * a0 - 12.0 * a1 + 6.0 * a2;
    let c = -3.0 * a0 + 3.0 * a1;

    if a == 0.0 {
        // Linear derivative; b == 0 yields a non-finite root which callers skip.
        return [-c / b, f32::NAN];
    }

    // Negative discriminant gives NaN here, i.e. no extremum on this axis.
    let s = (b * b - 4.0 * a * c).sqrt();
    let q = -0.5 * (b + b.signum() * s);
    [q / a, c / q]
}

impl Bounds {
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn include(self, p: Vec2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn expand(self, padding: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(padding),
            max: self.max + Vec2::splat(padding),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: Vec2, eps: f32) -> bool {
        p.x >= self.min.x - eps
            && p.x <= self.max.x + eps
            && p.y >= self.min.y - eps
            && p.y <= self.max.y + eps
    }

    /// Whether two boxes overlap. Touching edges count as overlapping.
    pub fn intersects(&self, other: &Bounds) -> bool {
        !(self.min.x > other.max.x
            || self.max.x < other.min.x
            || self.min.y > other.max.y
            || self.max.y < other.min.y)
    }
}

impl Spline {
    /// The interleaved point list.
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn curve_count(&self) -> usize {
        self.points.len().saturating_sub(1) / 3
    }

    pub fn curve(&self, i: usize) -> Option<Curve> {
        let s = self.points.get(i * 3..i * 3 + 4)?;
        Some(Curve([s[0], s[1], s[2], s[3]]))
    }

    pub fn curves(&self) -> impl Iterator<Item = Curve> + '_ {
        (0..self.curve_count()).filter_map(|i| self.curve(i))
    }

    /// One padded bounding box per curve, in curve order.
    pub fn bounds(&self, padding: f32) -> Vec<Bounds> {
        self.curves().map(|c| c.bounds(padding)).collect()
    }

    pub fn resample(&self, spacing: f32) -> Vec<Vec2> {
        resample(self, spacing)
    }
}

/// Fits a smooth cubic Bezier spline through `points`.
///
/// Each interior sample `i` gets a tangent along `points[i+1] - points[i-1]`
/// and two handles on that tangent, each a [`SMOOTH_FACTOR`] of the distance
/// to the neighbouring sample. The outer handles are pulled from the first
/// and last interior handle back toward the endpoints. With exactly two
/// samples the spline is a single straight segment whose handles equal its
/// endpoints.
///
/// ### Parameters
/// - `points` - Ordered samples, usually raw pointer positions.
///
/// ### Returns
/// A spline of `3 * (N - 1) + 1` points, or an empty spline when fewer than
/// two samples are given.
pub fn fit(points: &[Vec2]) -> Spline {
    let n = points.len();
    if n < 2 {
        return Spline::default();
    }

    // handles[2i - 1] precedes sample i, handles[2i] follows it.
    let mut handles = vec![Vec2::ZERO; 2 * n - 2];

    for i in 1..n - 1 {
        let tangent = (points[i + 1] - points[i - 1]).normalize_or_zero();
        let prev_len = points[i].distance(points[i - 1]);
        let next_len = points[i].distance(points[i + 1]);

        handles[2 * i - 1] = points[i] - tangent * (prev_len * SMOOTH_FACTOR);
        handles[2 * i] = points[i] + tangent * (next_len * SMOOTH_FACTOR);
    }

    let last = handles.len() - 1;
    if n > 2 {
        let first_delta = handles[1] - points[0];
        let last_delta = handles[last - 1] - points[n - 1];
        handles[0] = points[0] + first_delta * SMOOTH_FACTOR;
        handles[last] = points[n - 1] + last_delta * SMOOTH_FACTOR;
    } else {
        handles[0] = points[0];
        handles[1] = points[1];
    }

    let mut out = Vec::with_capacity(3 * (n - 1) + 1);
    for i in 0..n - 1 {
        out.push(points[i]);
        out.push(handles[2 * i]);
        out.push(handles[2 * i + 1]);
    }
    out.push(points[n - 1]);

    Spline { points: out }
}

/// Walks every curve of `spline` and returns points roughly `spacing` apart.
///
/// Each curve is split into `ceil(approx_length / spacing)` equal parameter
/// steps (at least one, at most [`MAX_RESAMPLE_STEPS`]). Endpoints shared by
/// consecutive curves appear once. A non-positive or non-finite `spacing`
/// emits the curve endpoints only.
///
/// ### Returns
/// The sampled points, starting at the spline's first point and ending at its
/// last; empty for an empty spline.
pub fn resample(spline: &Spline, spacing: f32) -> Vec<Vec2> {
    let Some(&first) = spline.points().first() else {
        return Vec::new();
    };

    let mut out = vec![first];
    for curve in spline.curves() {
        let steps = if spacing.is_finite() && spacing > 0.0 {
            let n = (curve.approx_length() / spacing).ceil();
            if n.is_finite() {
                (n as usize).clamp(1, MAX_RESAMPLE_STEPS)
            } else {
                1
            }
        } else {
            1
        };

        for k in 1..=steps {
            out.push(curve.point_at(k as f32 / steps as f32));
        }
    }
    out
}

/// Fits a spline through `points` and resamples it every `spacing` units.
pub fn interpolate(points: &[Vec2], spacing: f32) -> Vec<Vec2> {
    resample(&fit(points), spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    fn random_point(rng: &mut impl Rng) -> Vec2 {
        Vec2::new(
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
        )
    }

    #[test]
    fn fit_degenerate_input_is_empty() {
        assert!(fit(&[]).is_empty());
        assert!(fit(&[Vec2::new(3.0, 4.0)]).is_empty());
        assert!(interpolate(&[Vec2::ONE], 1.0).is_empty());
    }

    #[test]
    fn fit_two_points_is_a_straight_segment() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(5.0, 2.0);
        let spline = fit(&[a, b]);

        assert_eq!(spline.points(), &[a, a, b, b]);
        assert_eq!(spline.curve_count(), 1);
        assert_eq!(spline.curve(0).unwrap().point_at(0.5), Vec2::new(3.0, 2.0));
    }

    #[test]
    fn fit_length_and_shared_endpoints() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 2..12 {
            let pts: Vec<Vec2> = (0..n).map(|_| random_point(&mut rng)).collect();
            let spline = fit(&pts);

            assert_eq!(spline.points().len(), 3 * (n - 1) + 1);
            assert_eq!(spline.curve_count(), n - 1);

            let curves: Vec<Curve> = spline.curves().collect();
            for (i, pair) in curves.windows(2).enumerate() {
                assert_eq!(pair[0].end(), pair[1].start());
                assert_eq!(pair[0].end(), pts[i + 1]);
            }
        }
    }

    #[test]
    fn fit_reproduces_first_and_last_sample() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 2..20 {
            let pts: Vec<Vec2> = (0..n).map(|_| random_point(&mut rng)).collect();
            let spline = fit(&pts);

            let first = spline.curve(0).unwrap();
            let last = spline.curve(spline.curve_count() - 1).unwrap();
            assert_eq!(first.point_at(0.0), pts[0]);
            assert_eq!(last.point_at(1.0), pts[n - 1]);
        }
    }

    #[test]
    fn fit_interior_handles_follow_neighbour_tangent() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 0.0),
            Vec2::new(3.0, 6.0),
        ];
        let spline = fit(&pts);
        let p = spline.points();

        let tangent = (pts[2] - pts[0]).normalize();
        let prev = pts[1] - tangent * (3.0 / 3.0);
        let next = pts[1] + tangent * (6.0 / 3.0);
        assert!(p[2].abs_diff_eq(prev, 1e-5));
        assert!(p[4].abs_diff_eq(next, 1e-5));

        // Outer handles are pulled a third of the way toward the interior ones.
        assert!(p[1].abs_diff_eq(pts[0] + (prev - pts[0]) / 3.0, 1e-5));
        assert!(p[5].abs_diff_eq(pts[2] + (next - pts[2]) / 3.0, 1e-5));
    }

    #[test]
    fn fit_repeated_samples_do_not_produce_nan() {
        let p = Vec2::new(2.0, 2.0);
        let spline = fit(&[p, Vec2::new(4.0, 1.0), p]);
        assert!(spline.points().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let curve = Curve::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 30.0),
            Vec2::new(40.0, -20.0),
            Vec2::new(50.0, 10.0),
        );
        let h = 1e-3;
        for &t in &[0.1, 0.35, 0.5, 0.8] {
            let fd = (curve.point_at(t + h) - curve.point_at(t - h)) / (2.0 * h);
            assert!(curve.velocity_at(t).abs_diff_eq(fd, 0.1), "t={t}");

            let fd2 = (curve.velocity_at(t + h) - curve.velocity_at(t - h)) / (2.0 * h);
            assert!(curve.acceleration_at(t).abs_diff_eq(fd2, 0.5), "t={t}");
        }
    }

    #[test]
    fn curvature_of_straight_and_stationary_curves() {
        let line = Curve::new(
            Vec2::ZERO,
            Vec2::new(1.0, 1.0),
            Vec2::new(2.0, 2.0),
            Vec2::new(3.0, 3.0),
        );
        assert!(line.curvature_at(0.4).abs() < 1e-5);

        let point = Curve::new(Vec2::ONE, Vec2::ONE, Vec2::ONE, Vec2::ONE);
        assert_eq!(point.curvature_at(0.5), 0.0);

        // Bending left is positive.
        let left = Curve::new(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(10.0, 20.0),
        );
        assert!(left.curvature_at(0.5) > 0.0);
    }

    #[test]
    fn bounds_contain_sampled_points_of_random_curves() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..200 {
            let curve = Curve::new(
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
                random_point(&mut rng),
            );
            let b = curve.bounds(0.0);

            for i in 0..=100 {
                let t = i as f32 / 100.0;
                let p = curve.point_at(t);
                assert!(b.contains(p, 1e-3), "{p:?} outside {b:?} for {curve:?}");
            }
        }
    }

    #[test]
    fn bounds_are_tight_on_a_known_arch() {
        // Symmetric arch whose apex at t = 0.5 sits at y = 0.75 * 40.
        let curve = Curve::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 40.0),
            Vec2::new(30.0, 40.0),
            Vec2::new(30.0, 0.0),
        );
        let b = curve.bounds(0.0);

        assert!(b.min.abs_diff_eq(Vec2::new(0.0, 0.0), 1e-4));
        assert!(b.max.abs_diff_eq(Vec2::new(30.0, 30.0), 1e-4));

        let padded = curve.bounds(2.0);
        assert!(padded.min.abs_diff_eq(Vec2::new(-2.0, -2.0), 1e-4));
        assert!(padded.max.abs_diff_eq(Vec2::new(32.0, 32.0), 1e-4));
        assert!((padded.width() - 34.0).abs() < 1e-4);
        assert!((padded.height() - 34.0).abs() < 1e-4);
    }

    #[test]
    fn collinear_axis_yields_no_spurious_extrema() {
        // Evenly spaced x: the x-derivative is constant.
        let curve = Curve::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 5.0),
            Vec2::new(2.0, 5.0),
            Vec2::new(3.0, 0.0),
        );
        let [x1, x2, ..] = curve.extrema();
        assert!(!x1.is_finite() && !x2.is_finite());

        let b = curve.bounds(0.0);
        assert_eq!(b.min.x, 0.0);
        assert_eq!(b.max.x, 3.0);
    }

    #[test]
    fn coincident_handles_use_midpoint_extremum() {
        // p0.x == p3.x and h1.x == h2.x: the x-derivative is linear with root 0.5.
        let curve = Curve::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(8.0, 1.0),
            Vec2::new(8.0, 2.0),
            Vec2::new(0.0, 3.0),
        );
        let [x1, ..] = curve.extrema();
        assert_eq!(x1, 0.5);
        assert!((curve.bounds(0.0).max.x - 6.0).abs() < 1e-5);
    }

    #[test]
    fn coincident_handles_alone_solve_exact_roots() {
        // h1.x == h2.x but p0.x != p3.x: the x extremum is not at t = 0.5.
        let curve = Curve::new(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 1.0),
            Vec2::new(10.0, 2.0),
            Vec2::new(4.0, 3.0),
        );
        let [x1, x2, ..] = curve.extrema();
        let inside: Vec<f32> = [x1, x2]
            .into_iter()
            .filter(|t| t.is_finite() && (0.0..=1.0).contains(t))
            .collect();
        assert_eq!(inside.len(), 1);
        assert!((inside[0] - 0.5).abs() > 1e-3);
        // Derivative vanishes at the root.
        assert!(curve.velocity_at(inside[0]).x.abs() < 1e-3);

        let b = curve.bounds(0.0);
        for i in 0..=100 {
            let p = curve.point_at(i as f32 / 100.0);
            assert!(b.contains(p, 1e-4));
        }
    }

    #[test]
    fn bounds_intersection() {
        let a = Bounds::from_points(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Bounds::from_points(Vec2::new(5.0, 5.0), Vec2::new(15.0, 15.0));
        let c = Bounds::from_points(Vec2::new(11.0, 0.0), Vec2::new(12.0, 1.0));
        let touching = Bounds::from_points(Vec2::new(10.0, 0.0), Vec2::new(12.0, 1.0));

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&touching));
        assert_eq!(a.union(c).max, Vec2::new(12.0, 10.0));
    }

    #[test]
    fn spline_bounds_one_per_curve() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 5.0),
            Vec2::new(20.0, -5.0),
            Vec2::new(30.0, 0.0),
        ];
        let spline = fit(&pts);
        let boxes = spline.bounds(1.0);

        assert_eq!(boxes.len(), 3);
        for (b, c) in boxes.iter().zip(spline.curves()) {
            assert!(b.contains(c.start(), 0.0));
            assert!(b.contains(c.end(), 0.0));
        }
    }

    #[test]
    fn resample_is_evenly_spaced_on_a_line() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 0.0);
        let pts = interpolate(&[a, b], 10.0);

        assert_eq!(pts.len(), 11);
        assert_eq!(pts[0], a);
        assert_eq!(*pts.last().unwrap(), b);
        for pair in pts.windows(2) {
            assert!(pair[1].x > pair[0].x);
            assert_eq!(pair[1].y, 0.0);
        }
    }

    #[test]
    fn resample_keeps_endpoints_when_spacing_is_large() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(3.0, 4.0),
            Vec2::new(6.0, 0.0),
        ];
        let spline = fit(&pts);

        for spacing in [1e6, 0.0, -1.0, f32::NAN, f32::INFINITY] {
            let out = spline.resample(spacing);
            assert_eq!(out.len(), 3, "spacing={spacing}");
            assert_eq!(out[0], pts[0]);
            assert_eq!(out[1], pts[1]);
            assert_eq!(out[2], pts[2]);
        }
    }

    #[test]
    fn resample_is_deterministic_and_bounded() {
        let pts = [Vec2::ZERO, Vec2::new(50.0, 20.0), Vec2::new(90.0, -10.0)];
        let spline = fit(&pts);

        assert_eq!(spline.resample(2.5), spline.resample(2.5));
        assert!(spline.resample(1e-9).len() <= 1 + 2 * MAX_RESAMPLE_STEPS);
        assert!(resample(&Spline::default(), 1.0).is_empty());
    }
}
