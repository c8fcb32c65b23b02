//! Gesture rule catalog.
//!
//! Each category owns a static, ordered slice of rule descriptors.  A
//! descriptor pairs a gesture with its evaluation rank and a plain
//! predicate function over the frame's [`RuleInput`].  Rank 0 is always
//! the category's NEUTRAL (baseline pose) rule; the remaining rules are
//! ordered cheapest first: palm-box tests, then ROI overlaps, then
//! comparisons against the calibrated baseline.
//!
//! Predicates are pure.  They return `Err(RuleFault)` when a landmark
//! they need is missing or when they need a baseline that has not been
//! captured; the determinator treats a fault as "no match".

use std::fmt;

use crate::hand::calibration::Calibration;
use crate::hand::geometry::{
    deviation_from_vertical_deg, distance, in_palm_box, roi_overlap_percent, CircularRoi, Point,
};
use crate::hand::landmarks::{HandLandmark, LandmarkSnapshot, PalmBox};

use super::depth::DepthState;
use super::types::{Category, Gesture};

// ── Thresholds ─────────────────────────────────────────────

/// Tunable geometry thresholds shared by all predicates.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleThresholds {
    /// Fingertip ROI radius as a fraction of palm width.
    pub fingertip_roi_ratio: f32,
    /// PIP joint ROI radius as a fraction of palm width.
    pub joint_roi_ratio: f32,
    /// Tip/PIP overlap (percent) at which a finger counts as curled.
    pub curl_overlap_percent: f32,
    /// Area change band for threshold-mode FORWARD/BACKWARD.
    pub depth_band: f32,
    /// Palm-center to middle-PIP compression required for JUMP.
    pub jump_compression: f32,
    /// Relative axis change for camera pans; also the stable band.
    pub camera_axis_change: f32,
    /// Minimum index/middle tip separation for OK, as a fraction of palm width.
    pub peace_separation: f32,
    /// Minimum wrist/middle-PIP tilt from vertical for F, degrees.
    pub f_tilt_deg: f32,
    /// How far below the palm the thumb must drop for ESC, fraction of palm height.
    pub esc_drop: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            fingertip_roi_ratio: 0.05,
            joint_roi_ratio: 0.10,
            curl_overlap_percent: 50.0,
            depth_band: 0.10,
            jump_compression: 0.10,
            camera_axis_change: 0.10,
            peace_separation: 0.10,
            f_tilt_deg: 15.0,
            esc_drop: 0.10,
        }
    }
}

// ── Faults ─────────────────────────────────────────────────

/// Why a predicate could not be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFault {
    MissingLandmark(HandLandmark),
    Uncalibrated,
}

impl fmt::Display for RuleFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLandmark(lm) => write!(f, "missing landmark {}", lm.as_str()),
            Self::Uncalibrated => f.write_str("no calibration baseline"),
        }
    }
}

impl std::error::Error for RuleFault {}

pub type RuleResult = Result<bool, RuleFault>;

// ── Rule input ─────────────────────────────────────────────

/// Everything a predicate may read for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub snapshot: &'a LandmarkSnapshot,
    pub palm: &'a PalmBox,
    pub calibration: Option<&'a Calibration>,
    /// Hysteresis depth state; `None` selects threshold-mode FORWARD/BACKWARD.
    pub depth: Option<DepthState>,
    pub thresholds: &'a RuleThresholds,
}

impl<'a> RuleInput<'a> {
    fn at(&self, landmark: HandLandmark) -> Result<Point, RuleFault> {
        self.snapshot
            .point(landmark)
            .ok_or(RuleFault::MissingLandmark(landmark))
    }

    fn baseline(&self) -> Result<&'a Calibration, RuleFault> {
        self.calibration.ok_or(RuleFault::Uncalibrated)
    }

    fn in_palm(&self, landmark: HandLandmark) -> RuleResult {
        Ok(in_palm_box(self.at(landmark)?, self.palm))
    }

    fn tip_roi(&self, tip: HandLandmark) -> Result<CircularRoi, RuleFault> {
        Ok(CircularRoi::around(
            self.at(tip)?,
            self.palm.width,
            self.thresholds.fingertip_roi_ratio,
        ))
    }

    fn joint_roi(&self, joint: HandLandmark) -> Result<CircularRoi, RuleFault> {
        Ok(CircularRoi::around(
            self.at(joint)?,
            self.palm.width,
            self.thresholds.joint_roi_ratio,
        ))
    }

    /// Fingertip ROI overlap with its own PIP ROI, percent. Thumb reports 0.
    fn curl_overlap(&self, tip: HandLandmark) -> Result<f32, RuleFault> {
        match tip.pip() {
            Some(pip) => Ok(roi_overlap_percent(&self.tip_roi(tip)?, &self.joint_roi(pip)?)),
            None => Ok(0.0),
        }
    }

    fn curled(&self, tip: HandLandmark) -> RuleResult {
        Ok(self.curl_overlap(tip)? >= self.thresholds.curl_overlap_percent)
    }

    /// Overlap (percent) between two fingertip ROIs.
    fn tip_contact(&self, a: HandLandmark, b: HandLandmark) -> Result<f32, RuleFault> {
        Ok(roi_overlap_percent(&self.tip_roi(a)?, &self.tip_roi(b)?))
    }

    /// Distance from a landmark to the index MCP reference point.
    fn axis(&self, landmark: HandLandmark) -> Result<f32, RuleFault> {
        Ok(distance(self.at(landmark)?, self.at(HandLandmark::IndexMcp)?))
    }

    fn all_in_palm(&self, tips: &[HandLandmark]) -> RuleResult {
        for tip in tips {
            if !self.in_palm(*tip)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn none_in_palm(&self, tips: &[HandLandmark]) -> RuleResult {
        for tip in tips {
            if self.in_palm(*tip)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Every fingertip except `active` is outside the palm and uncurled.
    fn others_out_of_action_zone(&self, active: HandLandmark) -> RuleResult {
        for tip in HandLandmark::fingertips() {
            if tip == active {
                continue;
            }
            if self.in_palm(tip)? || self.curled(tip)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ── Rule descriptors ───────────────────────────────────────

pub type Predicate = fn(&RuleInput<'_>) -> RuleResult;

/// One catalog entry.
#[derive(Clone, Copy)]
pub struct GestureRule {
    pub gesture: Gesture,
    /// Evaluation order within the category; 0 is NEUTRAL.
    pub rank: u8,
    pub predicate: Predicate,
}

impl fmt::Debug for GestureRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureRule")
            .field("gesture", &self.gesture)
            .field("rank", &self.rank)
            .finish()
    }
}

const fn rule(gesture: Gesture, rank: u8, predicate: Predicate) -> GestureRule {
    GestureRule {
        gesture,
        rank,
        predicate,
    }
}

pub static ACTION_RULES: [GestureRule; 6] = [
    rule(Gesture::Neutral, 0, open_palm),
    rule(Gesture::Attack, 1, attack),
    rule(Gesture::Skill1, 2, skill_1),
    rule(Gesture::Skill2, 3, skill_2),
    rule(Gesture::Skill3, 4, skill_3),
    rule(Gesture::Utility, 5, utility),
];

pub static MOVEMENT_RULES: [GestureRule; 7] = [
    rule(Gesture::Neutral, 0, movement_neutral),
    rule(Gesture::Left, 1, left),
    rule(Gesture::Right, 2, right),
    rule(Gesture::Forward, 3, forward),
    rule(Gesture::Backward, 4, backward),
    rule(Gesture::Shift, 5, shift),
    rule(Gesture::Jump, 6, jump),
];

pub static CAMERA_RULES: [GestureRule; 6] = [
    rule(Gesture::Neutral, 0, three_axis),
    rule(Gesture::Lock, 1, lock),
    rule(Gesture::PanLeft, 2, pan_left),
    rule(Gesture::PanRight, 3, pan_right),
    rule(Gesture::PanUp, 4, pan_up),
    rule(Gesture::PanDown, 5, pan_down),
];

// F refines OK, so it must be tried first.
pub static NAVIGATION_RULES: [GestureRule; 4] = [
    rule(Gesture::Neutral, 0, open_palm),
    rule(Gesture::Esc, 1, esc),
    rule(Gesture::F, 2, f_sign),
    rule(Gesture::Ok, 3, ok_sign),
];

/// The ordered catalog for a category.
pub fn catalog(category: Category) -> &'static [GestureRule] {
    match category {
        Category::Action => &ACTION_RULES,
        Category::Movement => &MOVEMENT_RULES,
        Category::Camera => &CAMERA_RULES,
        Category::Navigation => &NAVIGATION_RULES,
    }
}

// ── Action ─────────────────────────────────────────────────

/// All tips extended and no finger curled. Baseline for Action and Navigation.
fn open_palm(input: &RuleInput<'_>) -> RuleResult {
    if !input.none_in_palm(&HandLandmark::fingertips())? {
        return Ok(false);
    }
    for tip in HandLandmark::finger_tips() {
        if input.curled(tip)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn attack(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.in_palm(HandLandmark::ThumbTip)?
        && input.others_out_of_action_zone(HandLandmark::ThumbTip)?)
}

/// One finger curled onto its own PIP, tip still clear of the palm.
fn curled_skill(input: &RuleInput<'_>, tip: HandLandmark) -> RuleResult {
    Ok(input.curled(tip)? && !input.in_palm(tip)? && input.others_out_of_action_zone(tip)?)
}

fn skill_1(input: &RuleInput<'_>) -> RuleResult {
    curled_skill(input, HandLandmark::IndexTip)
}

fn skill_2(input: &RuleInput<'_>) -> RuleResult {
    curled_skill(input, HandLandmark::MiddleTip)
}

fn skill_3(input: &RuleInput<'_>) -> RuleResult {
    curled_skill(input, HandLandmark::RingTip)
}

fn utility(input: &RuleInput<'_>) -> RuleResult {
    curled_skill(input, HandLandmark::PinkyTip)
}

// ── Movement ───────────────────────────────────────────────

fn movement_neutral(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.in_palm(HandLandmark::RingTip)? || input.all_in_palm(&HandLandmark::fingertips())?)
}

fn left(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.in_palm(HandLandmark::RingTip)?
        && !input.in_palm(HandLandmark::ThumbTip)?
        && input.in_palm(HandLandmark::PinkyTip)?)
}

fn right(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.in_palm(HandLandmark::RingTip)?
        && !input.in_palm(HandLandmark::PinkyTip)?
        && input.in_palm(HandLandmark::ThumbTip)?)
}

/// Palm area relative to the baseline, for threshold mode.
fn area_ratio(input: &RuleInput<'_>) -> Result<f32, RuleFault> {
    let baseline = input.baseline()?;
    if baseline.neutral_area <= 0.0 {
        return Err(RuleFault::Uncalibrated);
    }
    Ok(input.palm.area() / baseline.neutral_area)
}

fn forward(input: &RuleInput<'_>) -> RuleResult {
    if !input.in_palm(HandLandmark::RingTip)? {
        return Ok(false);
    }
    match input.depth {
        Some(state) => Ok(state == DepthState::Forward),
        None => Ok(area_ratio(input)? > 1.0 + input.thresholds.depth_band),
    }
}

fn backward(input: &RuleInput<'_>) -> RuleResult {
    if !input.in_palm(HandLandmark::RingTip)? {
        return Ok(false);
    }
    match input.depth {
        Some(state) => Ok(state == DepthState::Backward),
        None => Ok(area_ratio(input)? < 1.0 - input.thresholds.depth_band),
    }
}

fn shift(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.curled(HandLandmark::IndexTip)?
        && !input.in_palm(HandLandmark::IndexTip)?
        && input.in_palm(HandLandmark::RingTip)?)
}

fn jump(input: &RuleInput<'_>) -> RuleResult {
    if input.in_palm(HandLandmark::ThumbTip)? || input.in_palm(HandLandmark::PinkyTip)? {
        return Ok(false);
    }
    let baseline = input.baseline()?;
    let tilt = distance(input.palm.center(), input.at(HandLandmark::MiddlePip)?);
    Ok(tilt < baseline.tilt_dist * (1.0 - input.thresholds.jump_compression))
}

// ── Camera ─────────────────────────────────────────────────

/// Ring and pinky folded, index, middle and thumb extended.
fn three_axis(input: &RuleInput<'_>) -> RuleResult {
    Ok(input.all_in_palm(&[HandLandmark::RingTip, HandLandmark::PinkyTip])?
        && input.none_in_palm(&[
            HandLandmark::IndexTip,
            HandLandmark::MiddleTip,
            HandLandmark::ThumbTip,
        ])?)
}

/// Direction of one camera axis relative to its baseline length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisMove {
    Grows,
    Shrinks,
    Stable,
}

fn axis_moves(current: f32, reference: f32, change: f32, expected: AxisMove) -> bool {
    match expected {
        AxisMove::Grows => current > reference * (1.0 + change),
        AxisMove::Shrinks => current < reference * (1.0 - change),
        AxisMove::Stable => (current - reference).abs() < reference * change,
    }
}

/// Base pose plus the expected movement of the Y, X and Z axes.
fn pan(input: &RuleInput<'_>, y: AxisMove, x: AxisMove, z: AxisMove) -> RuleResult {
    if !three_axis(input)? {
        return Ok(false);
    }
    let baseline = input.baseline()?;
    let change = input.thresholds.camera_axis_change;
    Ok(
        axis_moves(input.axis(HandLandmark::IndexTip)?, baseline.y_dist, change, y)
            && axis_moves(input.axis(HandLandmark::MiddleTip)?, baseline.x_dist, change, x)
            && axis_moves(input.axis(HandLandmark::ThumbTip)?, baseline.z_dist, change, z),
    )
}

fn pan_up(input: &RuleInput<'_>) -> RuleResult {
    pan(input, AxisMove::Shrinks, AxisMove::Grows, AxisMove::Stable)
}

fn pan_down(input: &RuleInput<'_>) -> RuleResult {
    pan(input, AxisMove::Grows, AxisMove::Shrinks, AxisMove::Stable)
}

fn pan_left(input: &RuleInput<'_>) -> RuleResult {
    pan(input, AxisMove::Stable, AxisMove::Grows, AxisMove::Shrinks)
}

fn pan_right(input: &RuleInput<'_>) -> RuleResult {
    pan(input, AxisMove::Stable, AxisMove::Shrinks, AxisMove::Grows)
}

fn lock(input: &RuleInput<'_>) -> RuleResult {
    Ok(
        input.tip_contact(HandLandmark::IndexTip, HandLandmark::MiddleTip)? > 0.0
            && input.tip_contact(HandLandmark::IndexTip, HandLandmark::ThumbTip)? > 0.0
            && input.at(HandLandmark::IndexTip)?.x < input.palm.min_x,
    )
}

// ── Navigation ─────────────────────────────────────────────

/// Peace sign: index and middle spread above the palm, the rest folded in.
fn ok_sign(input: &RuleInput<'_>) -> RuleResult {
    if !input.none_in_palm(&[HandLandmark::IndexTip, HandLandmark::MiddleTip])?
        || !input.all_in_palm(&[
            HandLandmark::ThumbTip,
            HandLandmark::RingTip,
            HandLandmark::PinkyTip,
        ])?
    {
        return Ok(false);
    }
    let index = input.at(HandLandmark::IndexTip)?;
    let middle = input.at(HandLandmark::MiddleTip)?;
    Ok(index.y < input.palm.min_y
        && middle.y < input.palm.min_y
        && distance(index, middle) > input.thresholds.peace_separation * input.palm.width)
}

fn f_sign(input: &RuleInput<'_>) -> RuleResult {
    if !ok_sign(input)? {
        return Ok(false);
    }
    let tilt = deviation_from_vertical_deg(
        input.at(HandLandmark::Wrist)?,
        input.at(HandLandmark::MiddlePip)?,
    );
    Ok(tilt > input.thresholds.f_tilt_deg)
}

fn esc(input: &RuleInput<'_>) -> RuleResult {
    if input.in_palm(HandLandmark::ThumbTip)? {
        return Ok(false);
    }
    let thumb = input.at(HandLandmark::ThumbTip)?;
    Ok(
        thumb.y > input.palm.max_y + input.thresholds.esc_drop * input.palm.height
            && input.all_in_palm(&HandLandmark::finger_tips())?,
    )
}

// ── Tests ──────────────────────────────────────────────────
