//! Neutral-pose calibration.
//!
//! A baseline is captured while the user holds a neutral pose: the palm
//! area plus the three camera-axis reference distances and the tilt
//! reference distance.  Capture runs as a session that collects one sample
//! per frame and publishes the per-field median once enough plausible
//! samples have arrived.  The previous baseline stays in effect until the
//! new one is published in a single assignment.

use anyhow::{bail, Result};
use tracing::{debug, info, warn};

use super::geometry::distance;
use super::landmarks::{HandLandmark, LandmarkSnapshot, PalmBox};

// ── Config ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationConfig {
    /// Plausible samples needed before a baseline is published.
    pub required_samples: usize,
    /// Smallest plausible palm area (exclusive), normalized frame units.
    pub min_area: f32,
    /// Largest plausible palm area (exclusive), normalized frame units.
    pub max_area: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            required_samples: 30,
            min_area: 0.01,
            max_area: 0.5,
        }
    }
}

// ── Baseline ───────────────────────────────────────────────

/// Published neutral-pose baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub neutral_area: f32,
    /// Middle tip to index MCP.
    pub x_dist: f32,
    /// Index tip to index MCP.
    pub y_dist: f32,
    /// Thumb tip to index MCP.
    pub z_dist: f32,
    /// Palm center to middle PIP.
    pub tilt_dist: f32,
    /// Samples the baseline was computed from.
    pub samples: usize,
}

/// One frame's worth of baseline measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationSample {
    pub area: f32,
    pub x_dist: f32,
    pub y_dist: f32,
    pub z_dist: f32,
    pub tilt_dist: f32,
}

impl CalibrationSample {
    /// Measure a sample; `None` when an axis landmark is missing.
    pub fn measure(snapshot: &LandmarkSnapshot, palm: &PalmBox) -> Option<Self> {
        let n_point = snapshot.point(HandLandmark::IndexMcp)?;
        Some(Self {
            area: palm.area(),
            x_dist: distance(snapshot.point(HandLandmark::MiddleTip)?, n_point),
            y_dist: distance(snapshot.point(HandLandmark::IndexTip)?, n_point),
            z_dist: distance(snapshot.point(HandLandmark::ThumbTip)?, n_point),
            tilt_dist: distance(palm.center(), snapshot.point(HandLandmark::MiddlePip)?),
        })
    }
}

/// Result of feeding one frame to the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// No capture session is running.
    Idle,
    /// The frame was not usable as a sample.
    Rejected,
    /// Sample stored; more are needed.
    Collected { have: usize, need: usize },
    /// The session finished and this baseline was published.
    Completed(Calibration),
}

// ── Store ──────────────────────────────────────────────────

/// Owns the published baseline and any capture session in progress.
#[derive(Debug, Clone, Default)]
pub struct CalibrationStore {
    pub config: CalibrationConfig,
    current: Option<Calibration>,
    session: Option<Vec<CalibrationSample>>,
}

impl CalibrationStore {
    pub fn new(config: CalibrationConfig) -> Self {
        Self {
            config,
            current: None,
            session: None,
        }
    }

    /// Start (or restart) a capture session.
    pub fn request(&mut self) {
        info!(
            "Calibration started: hold a neutral pose ({} samples)",
            self.config.required_samples
        );
        self.session = Some(Vec::with_capacity(self.config.required_samples));
    }

    /// Abort the running session. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.session.take().is_some();
        if was_running {
            info!("Calibration cancelled");
        }
        was_running
    }

    /// Forget the published baseline and any running session.
    pub fn clear(&mut self) {
        self.current = None;
        self.session = None;
        debug!("Calibration cleared");
    }

    pub fn is_collecting(&self) -> bool {
        self.session.is_some()
    }

    /// `(collected, required)` while a session is running.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.session
            .as_ref()
            .map(|s| (s.len(), self.config.required_samples))
    }

    /// The published baseline, if any.
    pub fn calibration(&self) -> Option<&Calibration> {
        self.current.as_ref()
    }

    pub fn is_calibrated(&self) -> bool {
        self.current.is_some()
    }

    /// Baseline usable for depth estimation: only one built from a full session.
    pub fn depth_baseline(&self) -> Option<&Calibration> {
        self.current
            .as_ref()
            .filter(|c| c.samples >= self.config.required_samples)
    }

    fn plausible(&self, area: f32) -> bool {
        self.config.min_area < area && area < self.config.max_area
    }

    /// Feed one frame to the running session.
    pub fn observe(&mut self, snapshot: &LandmarkSnapshot, palm: Option<&PalmBox>) -> SampleOutcome {
        if self.session.is_none() {
            return SampleOutcome::Idle;
        }
        let Some(sample) = palm.and_then(|p| CalibrationSample::measure(snapshot, p)) else {
            return SampleOutcome::Rejected;
        };
        if !self.plausible(sample.area) {
            warn!(
                "Calibration sample rejected: palm area {:.4} outside ({:.2}, {:.2})",
                sample.area, self.config.min_area, self.config.max_area
            );
            return SampleOutcome::Rejected;
        }

        let need = self.config.required_samples.max(1);
        let Some(samples) = self.session.as_mut() else {
            return SampleOutcome::Idle;
        };
        samples.push(sample);
        let have = samples.len();
        if have < need {
            return SampleOutcome::Collected { have, need };
        }

        let calibration = median_calibration(samples);
        self.session = None;
        self.current = Some(calibration);
        info!(
            "Calibration complete: neutral area {:.4} from {} samples",
            calibration.neutral_area, calibration.samples
        );
        SampleOutcome::Completed(calibration)
    }

    /// Publish a baseline from a single snapshot, bypassing the session.
    pub fn capture_now(&mut self, snapshot: &LandmarkSnapshot, palm: Option<&PalmBox>) -> Result<Calibration> {
        let Some(palm) = palm else {
            bail!("no palm box in frame");
        };
        let Some(sample) = CalibrationSample::measure(snapshot, palm) else {
            bail!("calibration landmarks missing");
        };
        if !self.plausible(sample.area) {
            bail!("implausible palm area {:.4}", sample.area);
        }
        let calibration = median_calibration(&[sample]);
        self.current = Some(calibration);
        info!(
            "Calibration captured from snapshot: neutral area {:.4}",
            calibration.neutral_area
        );
        Ok(calibration)
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        let (have, need) = self
            .progress()
            .unwrap_or((0, self.config.required_samples));
        match &self.current {
            Some(c) => format!(
                "(:calibrated t :collecting {} :samples {} :required {} :neutral-area {:.4} :x-dist {:.4} :y-dist {:.4} :z-dist {:.4} :tilt-dist {:.4})",
                if self.is_collecting() { "t" } else { "nil" },
                have,
                need,
                c.neutral_area,
                c.x_dist,
                c.y_dist,
                c.z_dist,
                c.tilt_dist,
            ),
            None => format!(
                "(:calibrated nil :collecting {} :samples {} :required {})",
                if self.is_collecting() { "t" } else { "nil" },
                have,
                need,
            ),
        }
    }
}

/// Per-field median over the samples.
fn median_calibration(samples: &[CalibrationSample]) -> Calibration {
    let field = |f: fn(&CalibrationSample) -> f32| {
        let values: Vec<f32> = samples.iter().map(f).collect();
        median(values)
    };
    Calibration {
        neutral_area: field(|s| s.area),
        x_dist: field(|s| s.x_dist),
        y_dist: field(|s| s.y_dist),
        z_dist: field(|s| s.z_dist),
        tilt_dist: field(|s| s.tilt_dist),
        samples: samples.len(),
    }
}

/// Median; the mean of the two middle values for even counts.
fn median(mut values: Vec<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

// ── Tests ──────────────────────────────────────────────────
