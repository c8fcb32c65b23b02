//! Hand landmark model.
//!
//! Models the 21 joints a hand-pose tracker reports per frame, the
//! immutable per-frame snapshot, and the palm bounding box derived from
//! the wrist and the four finger MCP joints.

use anyhow::{bail, Result};

use super::geometry::Point;

// ── Landmark definitions ───────────────────────────────────

/// The 21 tracked hand joints, in tracker order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per snapshot.
pub const LANDMARK_COUNT: usize = 21;

/// Landmarks framing the palm bounding box.
pub const PALM_BOX_LANDMARKS: [HandLandmark; 5] = [
    HandLandmark::Wrist,
    HandLandmark::IndexMcp,
    HandLandmark::MiddleMcp,
    HandLandmark::RingMcp,
    HandLandmark::PinkyMcp,
];

const ALL_LANDMARKS: [HandLandmark; LANDMARK_COUNT] = [
    HandLandmark::Wrist,
    HandLandmark::ThumbCmc,
    HandLandmark::ThumbMcp,
    HandLandmark::ThumbIp,
    HandLandmark::ThumbTip,
    HandLandmark::IndexMcp,
    HandLandmark::IndexPip,
    HandLandmark::IndexDip,
    HandLandmark::IndexTip,
    HandLandmark::MiddleMcp,
    HandLandmark::MiddlePip,
    HandLandmark::MiddleDip,
    HandLandmark::MiddleTip,
    HandLandmark::RingMcp,
    HandLandmark::RingPip,
    HandLandmark::RingDip,
    HandLandmark::RingTip,
    HandLandmark::PinkyMcp,
    HandLandmark::PinkyPip,
    HandLandmark::PinkyDip,
    HandLandmark::PinkyTip,
];

impl HandLandmark {
    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Landmark at a tracker index.
    pub fn from_index(index: usize) -> Option<Self> {
        ALL_LANDMARKS.get(index).copied()
    }

    /// String representation for IPC.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        ALL_LANDMARKS.iter().copied().find(|lm| lm.as_str() == s)
    }

    /// All five fingertips, thumb first.
    pub fn fingertips() -> [HandLandmark; 5] {
        [
            Self::ThumbTip,
            Self::IndexTip,
            Self::MiddleTip,
            Self::RingTip,
            Self::PinkyTip,
        ]
    }

    /// The four non-thumb fingertips.
    pub fn finger_tips() -> [HandLandmark; 4] {
        [Self::IndexTip, Self::MiddleTip, Self::RingTip, Self::PinkyTip]
    }

    /// PIP joint of the same finger, for non-thumb fingertips.
    pub fn pip(&self) -> Option<HandLandmark> {
        match self {
            Self::IndexTip => Some(Self::IndexPip),
            Self::MiddleTip => Some(Self::MiddlePip),
            Self::RingTip => Some(Self::RingPip),
            Self::PinkyTip => Some(Self::PinkyPip),
            _ => None,
        }
    }
}

// ── Snapshot ───────────────────────────────────────────────

/// One frame of tracked landmarks.
///
/// A landmark with non-finite x or y is treated as missing.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSnapshot {
    points: [Point; LANDMARK_COUNT],
}

impl LandmarkSnapshot {
    pub fn from_points(points: [Point; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    /// Build from a flat `x0 y0 z0 x1 y1 z1 ...` sequence of 63 values.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() != LANDMARK_COUNT * 3 {
            bail!(
                "expected {} landmark coordinates, got {}",
                LANDMARK_COUNT * 3,
                values.len()
            );
        }
        let mut points = [Point::MISSING; LANDMARK_COUNT];
        for (point, xyz) in points.iter_mut().zip(values.chunks_exact(3)) {
            *point = Point::new(xyz[0], xyz[1], xyz[2]);
        }
        Ok(Self { points })
    }

    /// Position of a landmark, or `None` when it is missing.
    pub fn point(&self, landmark: HandLandmark) -> Option<Point> {
        let p = self.points[landmark.index()];
        p.is_finite().then_some(p)
    }

    /// Copy of this snapshot with one landmark replaced.
    pub fn with_point(mut self, landmark: HandLandmark, point: Point) -> Self {
        self.points[landmark.index()] = point;
        self
    }

    pub fn points(&self) -> &[Point; LANDMARK_COUNT] {
        &self.points
    }

    /// Number of landmarks that are missing.
    pub fn missing_count(&self) -> usize {
        self.points.iter().filter(|p| !p.is_finite()).count()
    }
}

// ── Palm box ───────────────────────────────────────────────

/// Axis-aligned rectangle around the wrist and the four MCP joints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PalmBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub width: f32,
    pub height: f32,
    pub center_x: f32,
    pub center_y: f32,
}

impl PalmBox {
    /// Derive the palm box; `None` when any framing landmark is missing.
    pub fn from_snapshot(snapshot: &LandmarkSnapshot) -> Option<Self> {
        let mut min_x = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for lm in PALM_BOX_LANDMARKS {
            let p = snapshot.point(lm)?;
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        Some(Self::from_extents(min_x, max_x, min_y, max_y))
    }

    pub fn from_extents(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Self {
        let width = max_x - min_x;
        let height = max_y - min_y;
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
            width,
            height,
            center_x: min_x + width / 2.0,
            center_y: min_y + height / 2.0,
        }
    }

    /// Box area in normalized frame units.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> Point {
        Point::xy(self.center_x, self.center_y)
    }
}

// ── Test fixtures ──────────────────────────────────────────


// ── Tests ──────────────────────────────────────────────────
