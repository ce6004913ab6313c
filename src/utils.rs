use crate::consts::EPSILON;
use crate::types::Bounds;
use glam::DVec2;

/// Axis-aligned box around a set of points, `None` when empty or degenerate
pub fn bounds_of_points(points: &[DVec2]) -> Option<Bounds> {
    let (first, rest) = points.split_first()?;
    let (min, max) = rest
        .iter()
        .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
    Bounds::from_corners(min, max)
}

/// Union of every valid rectangle; non-finite or zero-area entries are skipped
pub fn union_bounds<I>(rects: I) -> Option<Bounds>
where
    I: IntoIterator<Item = Bounds>,
{
    rects
        .into_iter()
        .filter_map(|r| {
            let valid = r.validated();
            if valid.is_none() {
                log::trace!("discarding degenerate rect {:?}", r);
            }
            valid
        })
        .reduce(|acc, r| acc.union(&r))
}

/// Rotate a vector counter-clockwise (y-down: clockwise on screen) by `degrees`
pub fn rotate_vec(v: DVec2, degrees: f64) -> DVec2 {
    DVec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Angle in degrees of the vector from `center` to `point`
pub fn angle_from(center: DVec2, point: DVec2) -> f64 {
    let d = point - center;
    d.y.atan2(d.x).to_degrees()
}

/// Round `value` to the nearest multiple of `step`
pub fn snap_to_step(value: f64, step: f64) -> f64 {
    if step > 0.0 && step.is_finite() {
        (value / step).round() * step
    } else {
        value
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON
}

pub fn approx_eq_vec(a: DVec2, b: DVec2) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}
