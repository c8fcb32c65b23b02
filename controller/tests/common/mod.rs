//! Hand poses around a palm box spanning x 0.4..0.8, y 0.3..0.7
//! (width 0.4, center (0.6, 0.5)).

#![allow(dead_code)]

use gesture_controller::hand::{HandLandmark, LandmarkSnapshot, Point, LANDMARK_COUNT};

pub const FRAME: f64 = 1.0 / 30.0;

pub fn open_hand() -> LandmarkSnapshot {
    use HandLandmark::*;
    let layout = [
        (Wrist, 0.6, 0.7),
        (ThumbCmc, 0.5, 0.65),
        (ThumbMcp, 0.42, 0.58),
        (ThumbIp, 0.33, 0.5),
        (ThumbTip, 0.25, 0.45),
        (IndexMcp, 0.4, 0.3),
        (IndexPip, 0.4, 0.22),
        (IndexDip, 0.4, 0.17),
        (IndexTip, 0.4, 0.12),
        (MiddleMcp, 0.53, 0.3),
        (MiddlePip, 0.53, 0.2),
        (MiddleDip, 0.53, 0.14),
        (MiddleTip, 0.53, 0.08),
        (RingMcp, 0.67, 0.3),
        (RingPip, 0.67, 0.21),
        (RingDip, 0.67, 0.16),
        (RingTip, 0.67, 0.11),
        (PinkyMcp, 0.8, 0.3),
        (PinkyPip, 0.8, 0.23),
        (PinkyDip, 0.8, 0.19),
        (PinkyTip, 0.8, 0.15),
    ];
    let mut points = [Point::MISSING; LANDMARK_COUNT];
    for (landmark, x, y) in layout {
        points[landmark.index()] = Point::xy(x, y);
    }
    LandmarkSnapshot::from_points(points)
}

pub fn fist() -> LandmarkSnapshot {
    open_hand()
        .with_point(HandLandmark::ThumbTip, Point::xy(0.5, 0.5))
        .with_point(HandLandmark::IndexTip, Point::xy(0.45, 0.4))
        .with_point(HandLandmark::MiddleTip, Point::xy(0.55, 0.38))
        .with_point(HandLandmark::RingTip, Point::xy(0.65, 0.4))
        .with_point(HandLandmark::PinkyTip, Point::xy(0.75, 0.42))
}

pub fn peace_sign() -> LandmarkSnapshot {
    open_hand()
        .with_point(HandLandmark::ThumbTip, Point::xy(0.5, 0.55))
        .with_point(HandLandmark::RingTip, Point::xy(0.65, 0.45))
        .with_point(HandLandmark::PinkyTip, Point::xy(0.75, 0.45))
}

pub fn thumbs_down() -> LandmarkSnapshot {
    fist().with_point(HandLandmark::ThumbTip, Point::xy(0.45, 0.8))
}

pub fn three_axis() -> LandmarkSnapshot {
    open_hand()
        .with_point(HandLandmark::RingTip, Point::xy(0.65, 0.45))
        .with_point(HandLandmark::PinkyTip, Point::xy(0.75, 0.45))
}

/// Camera base pose with the index axis shortened and the middle axis grown.
pub fn pan_up_pose() -> LandmarkSnapshot {
    three_axis()
        .with_point(HandLandmark::IndexTip, Point::xy(0.4, 0.15))
        .with_point(HandLandmark::MiddleTip, Point::xy(0.6, 0.0))
}

/// Scale every landmark about the palm center; palm area scales by `factor²`.
pub fn scaled(snapshot: &LandmarkSnapshot, factor: f32) -> LandmarkSnapshot {
    let (cx, cy) = (0.6, 0.5);
    let mut points = *snapshot.points();
    for p in points.iter_mut() {
        p.x = cx + (p.x - cx) * factor;
        p.y = cy + (p.y - cy) * factor;
    }
    LandmarkSnapshot::from_points(points)
}

/// Snapshot whose palm area is `ratio` times the fist's.
pub fn fist_at_ratio(ratio: f32) -> LandmarkSnapshot {
    scaled(&fist(), ratio.sqrt())
}

/// Render a snapshot as a `frame` message.
pub fn frame_message(id: i64, t: f64, snapshot: &LandmarkSnapshot) -> String {
    let coords: Vec<String> = snapshot
        .points()
        .iter()
        .flat_map(|p| [p.x, p.y, p.z])
        .map(|v| {
            if v.is_finite() {
                format!("{v}")
            } else {
                "nil".to_string()
            }
        })
        .collect();
    format!(
        "(:type :frame :id {} :t {} :landmarks ({}))",
        id,
        t,
        coords.join(" ")
    )
}
