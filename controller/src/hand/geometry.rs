//! Geometry kernel: planar distance, circular ROI overlap, tilt angle
//! and palm-box containment.
//!
//! All functions are pure and work in normalized frame coordinates.
//! The z component of a landmark is carried but ignored by every query.

use std::f64::consts::PI;

use super::landmarks::PalmBox;

// ── Point ──────────────────────────────────────────────────

/// A landmark position in normalized frame space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point {
    /// Placeholder for a landmark the tracker did not deliver.
    pub const MISSING: Point = Point {
        x: f32::NAN,
        y: f32::NAN,
        z: f32::NAN,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Planar point with z = 0.
    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Whether the x/y coordinates are usable.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ── Circular ROI ───────────────────────────────────────────

/// Circular region of interest around a landmark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularRoi {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl CircularRoi {
    /// ROI centered on `center` with a radius proportional to the palm width.
    pub fn around(center: Point, palm_width: f32, radius_ratio: f32) -> Self {
        Self {
            x: center.x,
            y: center.y,
            radius: palm_width * radius_ratio,
        }
    }

    fn center(&self) -> Point {
        Point::xy(self.x, self.y)
    }
}

// ── Queries ────────────────────────────────────────────────

/// Euclidean distance in the x,y plane.
pub fn distance(a: Point, b: Point) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Overlap of two circular ROIs as a percentage of the smaller circle's area.
///
/// Disjoint circles report exactly 0 and a circle fully inside the other
/// reports exactly 100 (or 0 when the smaller circle is degenerate).
pub fn roi_overlap_percent(a: &CircularRoi, b: &CircularRoi) -> f32 {
    let d = f64::from(distance(a.center(), b.center()));
    let r1 = f64::from(a.radius);
    let r2 = f64::from(b.radius);

    if d >= r1 + r2 {
        return 0.0;
    }

    let smaller_area = PI * r1.min(r2).powi(2);
    if d <= (r1 - r2).abs() {
        return if smaller_area > 0.0 { 100.0 } else { 0.0 };
    }
    if smaller_area <= 0.0 {
        return 0.0;
    }

    let (d2, r1_2, r2_2) = (d * d, r1 * r1, r2 * r2);
    // Rounding can push the cosines a hair outside [-1, 1].
    let angle1 = ((d2 + r1_2 - r2_2) / (2.0 * d * r1)).clamp(-1.0, 1.0).acos();
    let angle2 = ((d2 + r2_2 - r1_2) / (2.0 * d * r2)).clamp(-1.0, 1.0).acos();
    let kite = ((-d + r1 + r2) * (d + r1 - r2) * (d - r1 + r2) * (d + r1 + r2)).max(0.0);
    let area = r1_2 * angle1 + r2_2 * angle2 - 0.5 * kite.sqrt();

    ((area / smaller_area) * 100.0).clamp(0.0, 100.0) as f32
}

/// Whether `point` lies inside the palm box, edges inclusive.
pub fn in_palm_box(point: Point, palm: &PalmBox) -> bool {
    palm.min_x <= point.x && point.x <= palm.max_x && palm.min_y <= point.y && point.y <= palm.max_y
}

/// Angle of the line `p1 → p2` against the image's vertical axis, in degrees.
///
/// 0° points straight down the frame (increasing y); the sign gives the lean.
pub fn tilt_angle_deg(p1: Point, p2: Point) -> f32 {
    (p2.x - p1.x).atan2(p2.y - p1.y).to_degrees()
}

/// Unsigned deviation of the line `p1 → p2` from vertical, in `[0, 90]`.
///
/// Folds [`tilt_angle_deg`] so an upright line (pointing up the frame)
/// and a downward line both read as 0°.
pub fn deviation_from_vertical_deg(p1: Point, p2: Point) -> f32 {
    let angle = tilt_angle_deg(p1, p2).abs();
    angle.min(180.0 - angle)
}

// ── Tests ──────────────────────────────────────────────────
