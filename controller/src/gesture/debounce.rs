//! Temporal debounce of the resolved gesture.
//!
//! A newly active gesture must be held for `gesture_duration` before it
//! becomes the confirmed gesture, and confirmations are spaced at least
//! `reengagement_delay` apart.  Dropping back to NEUTRAL skips the hold
//! but still respects the spacing.

use tracing::{debug, warn};

use super::types::ActiveGesture;

#[derive(Debug, Clone, PartialEq)]
pub struct DebounceConfig {
    /// Minimum hold before confirmation, seconds.
    pub gesture_duration: f64,
    /// Minimum gap between confirmations, seconds.
    pub reengagement_delay: f64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            gesture_duration: 0.3,
            reengagement_delay: 0.2,
        }
    }
}

/// Session-long debounce state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedGestureState {
    pub confirmed: ActiveGesture,
    pub last_detected: Option<ActiveGesture>,
    pub last_detection_time: f64,
    /// `None` until the first confirmation; the re-engagement gate is open.
    pub last_confirmation_time: Option<f64>,
}

impl Default for ConfirmedGestureState {
    fn default() -> Self {
        Self {
            confirmed: ActiveGesture::NEUTRAL,
            last_detected: None,
            last_detection_time: 0.0,
            last_confirmation_time: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Debouncer {
    pub config: DebounceConfig,
    state: ConfirmedGestureState,
}

impl Debouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            state: ConfirmedGestureState::default(),
        }
    }

    pub fn state(&self) -> &ConfirmedGestureState {
        &self.state
    }

    pub fn confirmed(&self) -> ActiveGesture {
        self.state.confirmed
    }

    fn gate_open(&self, now: f64) -> bool {
        self.state
            .last_confirmation_time
            .map_or(true, |t| now - t >= self.config.reengagement_delay)
    }

    fn confirm(&mut self, active: ActiveGesture, now: f64) {
        debug!("Confirmed {} -> {} at {:.3}s", self.state.confirmed, active, now);
        self.state.confirmed = active;
        self.state.last_confirmation_time = Some(now);
    }

    /// Feed this frame's active gesture at time `now` (seconds). Returns the confirmed gesture.
    /// A non-finite `now` leaves the state untouched.
    pub fn update(&mut self, active: ActiveGesture, now: f64) -> ActiveGesture {
        if !now.is_finite() {
            warn!("Ignoring non-finite frame time {}", now);
            return self.state.confirmed;
        }
        if self.state.last_detected == Some(active) {
            let held = now - self.state.last_detection_time >= self.config.gesture_duration;
            if held && self.state.confirmed != active && self.gate_open(now) {
                self.confirm(active, now);
            }
        } else {
            self.state.last_detected = Some(active);
            self.state.last_detection_time = now;
            if active.is_neutral() && !self.state.confirmed.is_neutral() && self.gate_open(now) {
                self.confirm(active, now);
            }
        }
        self.state.confirmed
    }

    pub fn reset(&mut self) {
        self.state = ConfirmedGestureState::default();
    }

    /// Generate s-expression for IPC status.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:confirmed {} :last-detected {} :since {:.3})",
            self.state.confirmed.to_sexp(),
            self.state
                .last_detected
                .map(|a| a.to_sexp())
                .unwrap_or_else(|| "nil".to_string()),
            self.state.last_detection_time,
        )
    }
}
