//! Hand depth (distance to camera) from the palm-area ratio.
//!
//! The palm area is smoothed over a short rolling window and compared to
//! the calibrated neutral area.  Separate enter and exit thresholds keep
//! the state from flickering when the ratio hovers near a boundary.

use std::collections::VecDeque;

use tracing::debug;

use crate::hand::calibration::Calibration;

/// Depth classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthState {
    #[default]
    Neutral,
    Forward,
    Backward,
}

impl DepthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Forward => "forward",
            Self::Backward => "backward",
        }
    }
}

/// How FORWARD/BACKWARD are decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthMode {
    /// Smoothed ratio with enter/exit hysteresis.
    #[default]
    Hysteresis,
    /// Stateless per-frame area comparison in the rule catalog.
    Threshold,
}

impl DepthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hysteresis => "hysteresis",
            Self::Threshold => "threshold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "hysteresis" => Some(Self::Hysteresis),
            "threshold" => Some(Self::Threshold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepthConfig {
    pub mode: DepthMode,
    /// Rolling window for area smoothing, frames.
    pub window: usize,
    pub forward_enter: f32,
    pub forward_exit: f32,
    pub backward_enter: f32,
    pub backward_exit: f32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            mode: DepthMode::Hysteresis,
            window: 5,
            forward_enter: 1.15,
            forward_exit: 1.10,
            backward_enter: 0.85,
            backward_exit: 0.90,
        }
    }
}

/// Hysteresis state machine over the smoothed palm-area ratio.
#[derive(Debug, Clone, Default)]
pub struct DepthEstimator {
    pub config: DepthConfig,
    state: DepthState,
    history: VecDeque<f32>,
}

impl DepthEstimator {
    pub fn new(config: DepthConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.window),
            config,
            state: DepthState::Neutral,
        }
    }

    pub fn state(&self) -> DepthState {
        self.state
    }

    /// Mean of the areas in the window, if any.
    pub fn smoothed_area(&self) -> Option<f32> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f32>() / self.history.len() as f32)
    }

    /// Feed this frame's palm area. Stays NEUTRAL until a baseline exists.
    pub fn update(&mut self, area: f32, baseline: Option<&Calibration>) -> DepthState {
        let Some(neutral_area) = baseline.map(|c| c.neutral_area).filter(|a| *a > 0.0) else {
            self.reset();
            return DepthState::Neutral;
        };

        self.history.push_back(area);
        while self.history.len() > self.config.window.max(1) {
            self.history.pop_front();
        }
        let ratio = self.smoothed_area().unwrap_or(area) / neutral_area;
        self.step(ratio)
    }

    /// Advance the state machine by one ratio observation.
    pub fn step(&mut self, ratio: f32) -> DepthState {
        let c = &self.config;
        let next = match self.state {
            DepthState::Neutral => Self::enter(c, ratio),
            DepthState::Forward if ratio >= c.forward_exit => DepthState::Forward,
            DepthState::Backward if ratio <= c.backward_exit => DepthState::Backward,
            // Leaving one side re-checks the opposite entry in the same frame.
            DepthState::Forward | DepthState::Backward => Self::enter(c, ratio),
        };
        if next != self.state {
            debug!(
                "Depth {} -> {} (ratio {:.3})",
                self.state.as_str(),
                next.as_str(),
                ratio
            );
            self.state = next;
        }
        next
    }

    fn enter(c: &DepthConfig, ratio: f32) -> DepthState {
        if ratio >= c.forward_enter {
            DepthState::Forward
        } else if ratio <= c.backward_enter {
            DepthState::Backward
        } else {
            DepthState::Neutral
        }
    }

    pub fn reset(&mut self) {
        self.state = DepthState::Neutral;
        self.history.clear();
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:mode :{} :state :{} :smoothed-area {})",
            self.config.mode.as_str(),
            self.state.as_str(),
            self.smoothed_area()
                .map(|a| format!("{:.4}", a))
                .unwrap_or_else(|| "nil".to_string()),
        )
    }
}
