//! Per-frame gesture engine.
//!
//! `GestureEngine` owns all session state and runs one snapshot through
//! the pipeline:
//!
//! palm box -> calibration sample -> depth estimate -> determinators ->
//! resolver -> debounce -> confirmed gesture.
//!
//! Work per frame is bounded and nothing here blocks or performs I/O.

use std::time::Instant;

use anyhow::Result;
use lexpr::Value;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::gesture::bindings::BindingTable;
use crate::gesture::debounce::Debouncer;
use crate::gesture::depth::{DepthEstimator, DepthMode, DepthState};
use crate::gesture::determinator::{determine_all, Classification};
use crate::gesture::resolver::{resolve, Resolution};
use crate::gesture::rules::RuleInput;
use crate::gesture::types::{ActiveGesture, Category, DetectedGestureSet, Gesture};
use crate::hand::calibration::{Calibration, CalibrationStore, SampleOutcome};
use crate::hand::landmarks::{LandmarkSnapshot, PalmBox};
use crate::timing::FrameTiming;

/// Everything the engine decided for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Frame timestamp, seconds.
    pub time: f64,
    pub classification: Classification,
    pub depth: DepthState,
    pub resolution: Resolution,
    pub confirmed: ActiveGesture,
    /// The confirmed gesture differs from the previous frame's.
    pub changed: bool,
    pub calibration: SampleOutcome,
}

impl FrameReport {
    pub fn detected(&self) -> &DetectedGestureSet {
        &self.classification.detected
    }

    pub fn active(&self) -> ActiveGesture {
        self.resolution.active
    }

    /// Generate s-expression for the frame response.
    pub fn to_sexp(&self) -> String {
        format!(
            ":detected {} :baseline {} :depth :{} :resolution {} :confirmed {} :changed {}",
            self.classification.detected.to_sexp(),
            self.classification.baseline_sexp(),
            self.depth.as_str(),
            self.resolution.to_sexp(),
            self.confirmed.to_sexp(),
            if self.changed { "t" } else { "nil" },
        )
    }
}

/// Explicit engine context; one per tracked hand.
#[derive(Debug, Clone, Default)]
pub struct GestureEngine {
    config: EngineConfig,
    calibration: CalibrationStore,
    depth: DepthEstimator,
    debouncer: Debouncer,
    bindings: BindingTable,
    timing: FrameTiming,
}

impl GestureEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            calibration: CalibrationStore::new(config.calibration.clone()),
            depth: DepthEstimator::new(config.depth.clone()),
            debouncer: Debouncer::new(config.debounce.clone()),
            timing: FrameTiming::new(config.timing.clone()),
            bindings: BindingTable::default(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration. Session state survives unless the depth
    /// smoothing parameters changed.
    pub fn apply_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        if config.depth.mode != self.config.depth.mode
            || config.depth.window != self.config.depth.window
        {
            self.depth.reset();
        }
        self.calibration.config = config.calibration.clone();
        self.depth.config = config.depth.clone();
        self.debouncer.config = config.debounce.clone();
        self.timing.config = config.timing.clone();
        self.config = config;
        info!("Engine config applied");
        Ok(())
    }

    /// Live update from a config plist.
    pub fn apply_value(&mut self, value: &Value) -> Result<()> {
        let mut next = self.config.clone();
        next.apply_value(value)?;
        self.apply_config(next)
    }

    /// Whether the hysteresis estimator feeds FORWARD/BACKWARD this frame.
    fn depth_active(&self) -> bool {
        let enabled = &self.config.enabled;
        self.config.depth.mode == DepthMode::Hysteresis
            && enabled.category_enabled(Category::Movement)
            && (enabled.gesture_enabled(Gesture::Forward)
                || enabled.gesture_enabled(Gesture::Backward))
    }

    /// Run one snapshot through the pipeline. `now` is in seconds.
    pub fn process_frame(&mut self, snapshot: &LandmarkSnapshot, now: f64) -> FrameReport {
        let started = Instant::now();
        let previous = self.debouncer.confirmed();

        let palm = PalmBox::from_snapshot(snapshot);
        let sample = self.calibration.observe(snapshot, palm.as_ref());

        let depth = if !self.depth_active() {
            self.depth.reset();
            None
        } else {
            match &palm {
                Some(p) => Some(self.depth.update(p.area(), self.calibration.depth_baseline())),
                None => Some(self.depth.state()),
            }
        };

        let input = palm.as_ref().map(|palm| RuleInput {
            snapshot,
            palm,
            calibration: self.calibration.calibration(),
            depth,
            thresholds: &self.config.thresholds,
        });
        let classification = determine_all(input.as_ref(), &self.config.enabled);
        let resolution = resolve(&classification.detected, &self.config.resolver);
        let confirmed = self.debouncer.update(resolution.active, now);
        let changed = confirmed != previous;
        if changed {
            debug!("Frame {:.3}s confirmed {}", now, confirmed);
        }

        self.timing.record(started.elapsed());

        FrameReport {
            time: now,
            classification,
            depth: depth.unwrap_or_default(),
            resolution,
            confirmed,
            changed,
            calibration: sample,
        }
    }

    // ── Calibration ────────────────────────────────────────

    pub fn request_calibration(&mut self) {
        self.calibration.request();
    }

    pub fn cancel_calibration(&mut self) -> bool {
        self.calibration.cancel()
    }

    /// Publish a baseline from one snapshot immediately.
    pub fn capture_calibration(&mut self, snapshot: &LandmarkSnapshot) -> Result<Calibration> {
        let palm = PalmBox::from_snapshot(snapshot);
        self.calibration.capture_now(snapshot, palm.as_ref())
    }

    pub fn clear_calibration(&mut self) {
        self.calibration.clear();
        self.depth.reset();
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.calibration()
    }

    pub fn calibration_store(&self) -> &CalibrationStore {
        &self.calibration
    }

    // ── Accessors ──────────────────────────────────────────

    pub fn confirmed(&self) -> ActiveGesture {
        self.debouncer.confirmed()
    }

    pub fn depth_estimator(&self) -> &DepthEstimator {
        &self.depth
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut BindingTable {
        &mut self.bindings
    }

    /// Input command for the currently confirmed gesture.
    pub fn confirmed_command(&self) -> Option<&str> {
        self.bindings.command_for(self.confirmed())
    }

    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    /// Drop per-session frame state. Calibration, bindings and config are kept.
    pub fn reset(&mut self) {
        self.depth.reset();
        self.debouncer.reset();
        self.timing.reset();
        info!("Engine state reset");
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:confirmed {} :calibration {} :depth {} :debounce {} :bindings {} :timing {})",
            self.confirmed().to_sexp(),
            self.calibration.status_sexp(),
            self.depth.status_sexp(),
            self.debouncer.status_sexp(),
            self.bindings.len(),
            self.timing.stats_sexp(),
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
