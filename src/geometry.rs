//! Angle and arc math for the knob.
//!
//! Angles are compass degrees: 0° points straight up from the center and
//! values grow clockwise. Everything here is pure so it can be tested
//! without a rendering surface.

use std::f64::consts::PI;
use std::fmt;

/// Upper bound used when mapping a normalized value onto the circle. A full
/// 360° arc would start and end on the same point and collapse to nothing.
pub const MAX_DEGREE: f64 = 359.9999;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Bounding box of an element in pointer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Compass angle of the vector `(dx, dy)` where the vector runs from the
/// pointer to the center, in `[0, 360)`.
pub fn angle_from_vector(dy: f64, dx: f64) -> f64 {
    ((-dx).atan2(dy) * 180.0 / PI + 360.0) % 360.0
}

pub fn vector_between(a: Point, b: Point) -> Point {
    Point::new(a.x - b.x, a.y - b.y)
}

pub fn polar_to_cartesian(center: Point, radius: f64, angle_degrees: f64) -> Point {
    let radians = (angle_degrees - 90.0) * PI / 180.0;
    Point::new(
        center.x + radius * radians.cos(),
        center.y + radius * radians.sin(),
    )
}

pub fn degree_to_normalized(degree: f64) -> f64 {
    degree / 360.0
}

pub fn normalized_to_degree(value: f64) -> f64 {
    value.clamp(0.0, 1.0) * MAX_DEGREE
}

pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start * (1.0 - t) + end * t
}

/// Inverse of [`lerp`]. Yields a non-finite result when `start == end`; use
/// [`checked_inverse_lerp`] where that must be reported.
pub fn inverse_lerp(start: f64, end: f64, value: f64) -> f64 {
    (value - start) / (end - start)
}

/// Returns `None` for a degenerate range.
pub fn checked_inverse_lerp(start: f64, end: f64, value: f64) -> Option<f64> {
    (start != end).then(|| inverse_lerp(start, end, value))
}

pub fn center_of(bounds: Bounds) -> Point {
    Point::new(
        bounds.left + bounds.width / 2.0,
        bounds.top + bounds.height / 2.0,
    )
}

/// Center, radius and angular extent of the value indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcGeometry {
    pub center: Point,
    pub radius: f64,
    pub start_angle: f64,
    pub end_angle: f64,
}

impl ArcGeometry {
    pub fn new(center: Point, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            center,
            radius,
            start_angle,
            end_angle,
        }
    }

    /// The path is drawn from the end angle back to the start angle.
    pub fn from_point(&self) -> Point {
        polar_to_cartesian(self.center, self.radius, self.end_angle)
    }

    pub fn to_point(&self) -> Point {
        polar_to_cartesian(self.center, self.radius, self.start_angle)
    }

    pub fn large_arc(&self) -> bool {
        self.end_angle - self.start_angle > 180.0
    }
}

/// Formats as a single SVG `M … A …` path command.
impl fmt::Display for ArcGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from_point();
        let to = self.to_point();
        write!(
            f,
            "M {} {} A {} {} 0 {} 0 {} {}",
            SvgNumber(from.x),
            SvgNumber(from.y),
            SvgNumber(self.radius),
            SvgNumber(self.radius),
            u8::from(self.large_arc()),
            SvgNumber(to.x),
            SvgNumber(to.y),
        )
    }
}

pub fn describe_arc(center: Point, radius: f64, start_angle: f64, end_angle: f64) -> String {
    ArcGeometry::new(center, radius, start_angle, end_angle).to_string()
}

/// Shortest round-trip decimal, switching to exponent notation outside
/// `[1e-6, 1e21)` the way browsers serialise numbers.
struct SvgNumber(f64);

impl fmt::Display for SvgNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        if v == 0.0 {
            return f.write_str("0");
        }
        let magnitude = v.abs();
        if v.is_finite() && !(1e-6..1e21).contains(&magnitude) {
            let exp = format!("{v:e}");
            match exp.split_once('e') {
                Some((mantissa, power)) if !power.starts_with('-') => {
                    write!(f, "{mantissa}e+{power}")
                }
                _ => f.write_str(&exp),
            }
        } else {
            write!(f, "{v}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const EPS: f64 = 1e-9;

    fn angle_for(center: Point, pointer: Point) -> f64 {
        let delta = vector_between(center, pointer);
        angle_from_vector(delta.y, delta.x)
    }

    #[test]
    fn compass_angles() {
        let c = Point::new(50.0, 50.0);
        let cases = [
            (Point::new(50.0, 0.0), 0.0),
            (Point::new(100.0, 50.0), 90.0),
            (Point::new(50.0, 100.0), 180.0),
            (Point::new(0.0, 50.0), 270.0),
        ];

        for (pointer, expected) in cases {
            assert!((angle_for(c, pointer) - expected).abs() < EPS, "{pointer:?}");
        }
    }

    #[test]
    fn pointer_on_center_is_zero() {
        let c = Point::new(0.0, 0.0);
        assert_eq!(angle_for(c, c), 0.0);
        assert_eq!(normalized_to_degree(-1.0), 0.0);
        assert_eq!(normalized_to_degree(1.0), MAX_DEGREE);
        assert_eq!(normalized_to_degree(7.0), MAX_DEGREE);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        /// Any pointer around any center maps to `[0, 360)` and a normalized
        /// value in `[0, 1)`.
        #[test]
        fn angles_stay_in_range(
            cx in -1000.0f64..1000.0,
            cy in -1000.0f64..1000.0,
            px in -1000.0f64..1000.0,
            py in -1000.0f64..1000.0,
        ) {
            let angle = angle_for(Point::new(cx, cy), Point::new(px, py));
            prop_assert!((0.0..360.0).contains(&angle), "angle {}", angle);
            let normalized = degree_to_normalized(angle);
            prop_assert!((0.0..1.0).contains(&normalized), "normalized {}", normalized);
        }

        #[test]
        fn normalized_to_degree_is_monotonic_and_below_full_turn(
            a in -2.0f64..3.0,
            b in -2.0f64..3.0,
        ) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            let (d_low, d_high) = (normalized_to_degree(low), normalized_to_degree(high));
            prop_assert!(d_low <= d_high, "{} -> {}, {} -> {}", low, d_low, high, d_high);
            prop_assert!((0.0..360.0).contains(&d_high));
        }

        /// `lerp` undoes `inverse_lerp` for any non-degenerate range,
        /// including reversed ranges and values outside them.
        #[test]
        fn lerp_round_trip(
            a in -1000.0f64..1000.0,
            b in -1000.0f64..1000.0,
            v in -1000.0f64..1000.0,
        ) {
            prop_assume!((b - a).abs() >= 1.0);
            let t = inverse_lerp(a, b, v);
            let back = lerp(a, b, t);
            prop_assert!((back - v).abs() < 1e-6, "a={} b={} v={} t={} back={}", a, b, v, t, back);
        }
    }

    #[test]
    fn degenerate_inverse_lerp() {
        assert!(!inverse_lerp(5.0, 5.0, 5.0).is_finite());
        assert_eq!(checked_inverse_lerp(5.0, 5.0, 1.0), None);
        assert_eq!(checked_inverse_lerp(0.0, 10.0, 5.0), Some(0.5));
    }

    #[test]
    fn polar_zero_points_up() {
        let p = polar_to_cartesian(Point::new(10.0, 10.0), 5.0, 0.0);
        assert!((p.x - 10.0).abs() < EPS);
        assert!((p.y - 5.0).abs() < EPS);

        let p = polar_to_cartesian(Point::new(10.0, 10.0), 5.0, 90.0);
        assert!((p.x - 15.0).abs() < EPS);
        assert!((p.y - 10.0).abs() < EPS);
    }

    #[test]
    fn arc_runs_from_end_back_to_start() {
        let arc = ArcGeometry::new(Point::new(50.0, 50.0), 40.0, 0.0, 90.0);
        assert_eq!(arc.to_string(), "M 90 50 A 40 40 0 0 0 50 10");
    }

    #[test]
    fn large_arc_flag() {
        let c = Point::new(50.0, 50.0);
        assert!(describe_arc(c, 40.0, 0.0, 180.0).contains(" 0 0 0 "));
        assert!(describe_arc(c, 40.0, 0.0, 180.5).contains(" 0 1 0 "));
    }

    #[test]
    fn near_full_circle_differs_from_empty() {
        let c = Point::new(50.0, 50.0);
        assert_ne!(
            describe_arc(c, 40.0, 0.0, 0.0),
            describe_arc(c, 40.0, 0.0, MAX_DEGREE)
        );
    }

    #[test]
    fn center_of_bounds() {
        let c = center_of(Bounds::new(10.0, 20.0, 100.0, 50.0));
        assert_eq!(c, Point::new(60.0, 45.0));
    }

    #[test]
    fn svg_numbers() {
        assert_eq!(SvgNumber(-0.0).to_string(), "0");
        assert_eq!(SvgNumber(12.5).to_string(), "12.5");
        assert_eq!(SvgNumber(3.0e-15).to_string(), "3e-15");
        assert_eq!(SvgNumber(2.0e21).to_string(), "2e+21");
    }
}
