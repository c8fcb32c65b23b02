//! Engine configuration.
//!
//! Every threshold the pipeline uses is a named value with a default.
//! Configuration is read from a flat s-expression plist, for example
//!
//! ```text
//! (:gesture-duration 0.3 :reengagement-delay 0.2 :forward-enter 1.15
//!  :camera nil :disabled ("movement/jump") :resolver-policy :demote)
//! ```
//!
//! Keys that are absent keep their current value.  Updates are applied to
//! a copy and only committed when the result validates.

use std::path::Path;

use anyhow::{bail, Context, Result};
use lexpr::Value;
use tracing::{info, warn};

use crate::gesture::debounce::DebounceConfig;
use crate::gesture::depth::{DepthConfig, DepthMode};
use crate::gesture::determinator::EnabledPolicy;
use crate::gesture::resolver::{ResolverConfig, ResolverPolicy};
use crate::gesture::rules::RuleThresholds;
use crate::gesture::types::{Category, Gesture};
use crate::hand::calibration::CalibrationConfig;
use crate::ipc::codec::{escape_string, get_bool, get_keyword, get_string_list};
use crate::timing::TimingConfig;

const KNOWN_KEYS: &[&str] = &[
    "fingertip-roi-ratio",
    "joint-roi-ratio",
    "curl-overlap-percent",
    "depth-band",
    "jump-compression",
    "camera-axis-change",
    "peace-separation",
    "f-tilt-deg",
    "esc-drop",
    "depth-mode",
    "depth-window",
    "forward-enter",
    "forward-exit",
    "backward-enter",
    "backward-exit",
    "calibration-samples",
    "calibration-min-area",
    "calibration-max-area",
    "gesture-duration",
    "reengagement-delay",
    "resolver-policy",
    "action",
    "movement",
    "camera",
    "navigation",
    "disabled",
    "frame-budget-ms",
    "timing-window",
    // Message envelope keys, tolerated when a config message is applied.
    "type",
    "id",
];

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub thresholds: RuleThresholds,
    pub depth: DepthConfig,
    pub calibration: CalibrationConfig,
    pub debounce: DebounceConfig,
    pub resolver: ResolverConfig,
    pub enabled: EnabledPolicy,
    pub timing: TimingConfig,
}

impl EngineConfig {
    /// Defaults overridden by the keys present in `text`.
    pub fn from_sexp(text: &str) -> Result<Self> {
        let mut config = Self::default();
        config.apply_sexp(text)?;
        Ok(config)
    }

    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            Self::from_sexp(&text).with_context(|| format!("parsing config {}", path.display()))?;
        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Apply a plist in text form.
    pub fn apply_sexp(&mut self, text: &str) -> Result<()> {
        let value = lexpr::from_str(text).context("malformed s-expression")?;
        self.apply_value(&value)
    }

    /// Apply an already parsed plist. Nothing changes if the result is invalid.
    pub fn apply_value(&mut self, value: &Value) -> Result<()> {
        if !matches!(value, Value::Cons(_) | Value::Null | Value::Nil) {
            bail!("config must be a property list");
        }
        for key in plist_keys(value) {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!("Ignoring unknown config key :{}", key);
            }
        }

        let mut next = self.clone();

        let t = &mut next.thresholds;
        set_f32(value, "fingertip-roi-ratio", &mut t.fingertip_roi_ratio)?;
        set_f32(value, "joint-roi-ratio", &mut t.joint_roi_ratio)?;
        set_f32(value, "curl-overlap-percent", &mut t.curl_overlap_percent)?;
        set_f32(value, "depth-band", &mut t.depth_band)?;
        set_f32(value, "jump-compression", &mut t.jump_compression)?;
        set_f32(value, "camera-axis-change", &mut t.camera_axis_change)?;
        set_f32(value, "peace-separation", &mut t.peace_separation)?;
        set_f32(value, "f-tilt-deg", &mut t.f_tilt_deg)?;
        set_f32(value, "esc-drop", &mut t.esc_drop)?;

        let d = &mut next.depth;
        if let Some(mode) = get_keyword(value, "depth-mode") {
            d.mode = match DepthMode::from_str(&mode) {
                Some(m) => m,
                None => bail!("unknown depth mode: {}", mode),
            };
        }
        set_usize(value, "depth-window", &mut d.window)?;
        set_f32(value, "forward-enter", &mut d.forward_enter)?;
        set_f32(value, "forward-exit", &mut d.forward_exit)?;
        set_f32(value, "backward-enter", &mut d.backward_enter)?;
        set_f32(value, "backward-exit", &mut d.backward_exit)?;

        let c = &mut next.calibration;
        set_usize(value, "calibration-samples", &mut c.required_samples)?;
        set_f32(value, "calibration-min-area", &mut c.min_area)?;
        set_f32(value, "calibration-max-area", &mut c.max_area)?;

        set_f64(value, "gesture-duration", &mut next.debounce.gesture_duration)?;
        set_f64(value, "reengagement-delay", &mut next.debounce.reengagement_delay)?;

        if let Some(policy) = get_keyword(value, "resolver-policy") {
            next.resolver.policy = match ResolverPolicy::from_str(&policy) {
                Some(p) => p,
                None => bail!("unknown resolver policy: {}", policy),
            };
        }

        for category in Category::ALL {
            if let Some(on) = get_bool(value, category.as_str()) {
                next.enabled.set_category(category, on);
            }
        }
        if plist_keys(value).iter().any(|k| k == "disabled") {
            next.enabled.enable_all_gestures();
            for name in get_string_list(value, "disabled")? {
                let (category, gesture) = parse_gesture_name(&name)?;
                if !next.enabled.set_gesture(gesture, false) {
                    bail!("{}/{} cannot be disabled", category, gesture);
                }
            }
        }

        set_f64(value, "frame-budget-ms", &mut next.timing.budget_ms)?;
        set_usize(value, "timing-window", &mut next.timing.window)?;

        next.validate()?;
        *self = next;
        Ok(())
    }

    /// Reject inconsistent values.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        for (name, v) in [
            ("fingertip-roi-ratio", t.fingertip_roi_ratio),
            ("joint-roi-ratio", t.joint_roi_ratio),
            ("depth-band", t.depth_band),
            ("jump-compression", t.jump_compression),
            ("camera-axis-change", t.camera_axis_change),
            ("peace-separation", t.peace_separation),
            ("esc-drop", t.esc_drop),
        ] {
            if !(v.is_finite() && v > 0.0) {
                bail!(":{} must be positive, got {}", name, v);
            }
        }
        if !(t.curl_overlap_percent > 0.0 && t.curl_overlap_percent <= 100.0) {
            bail!(":curl-overlap-percent must be in (0, 100], got {}", t.curl_overlap_percent);
        }
        if !(t.f_tilt_deg >= 0.0 && t.f_tilt_deg < 90.0) {
            bail!(":f-tilt-deg must be in [0, 90), got {}", t.f_tilt_deg);
        }

        let d = &self.depth;
        if d.window == 0 {
            bail!(":depth-window must be at least 1");
        }
        if d.forward_exit > d.forward_enter {
            bail!(
                ":forward-exit {} exceeds :forward-enter {}",
                d.forward_exit,
                d.forward_enter
            );
        }
        if d.backward_exit < d.backward_enter {
            bail!(
                ":backward-exit {} is below :backward-enter {}",
                d.backward_exit,
                d.backward_enter
            );
        }
        if d.backward_exit >= d.forward_exit {
            bail!("backward and forward bands overlap");
        }

        let c = &self.calibration;
        if c.required_samples == 0 {
            bail!(":calibration-samples must be at least 1");
        }
        if !(c.min_area >= 0.0 && c.min_area < c.max_area) {
            bail!(
                "calibration area range ({}, {}) is empty",
                c.min_area,
                c.max_area
            );
        }

        let b = &self.debounce;
        if !(b.gesture_duration.is_finite() && b.gesture_duration >= 0.0) {
            bail!(":gesture-duration must be non-negative");
        }
        if !(b.reengagement_delay.is_finite() && b.reengagement_delay >= 0.0) {
            bail!(":reengagement-delay must be non-negative");
        }

        if !(self.timing.budget_ms > 0.0) {
            bail!(":frame-budget-ms must be positive");
        }
        if self.timing.window == 0 {
            bail!(":timing-window must be at least 1");
        }
        Ok(())
    }

    /// Generate s-expression for the effective configuration.
    pub fn config_sexp(&self) -> String {
        let t = &self.thresholds;
        let d = &self.depth;
        let c = &self.calibration;
        let flag = |on: bool| if on { "t" } else { "nil" };
        let disabled = self.enabled.disabled_names();
        let disabled = if disabled.is_empty() {
            "nil".to_string()
        } else {
            let quoted: Vec<String> = disabled
                .iter()
                .map(|n| format!("\"{}\"", escape_string(n)))
                .collect();
            format!("({})", quoted.join(" "))
        };
        format!(
            "(:fingertip-roi-ratio {} :joint-roi-ratio {} :curl-overlap-percent {} :depth-band {} :jump-compression {} :camera-axis-change {} :peace-separation {} :f-tilt-deg {} :esc-drop {} \
:depth-mode :{} :depth-window {} :forward-enter {} :forward-exit {} :backward-enter {} :backward-exit {} \
:calibration-samples {} :calibration-min-area {} :calibration-max-area {} \
:gesture-duration {} :reengagement-delay {} :resolver-policy :{} \
:action {} :movement {} :camera {} :navigation {} :disabled {} \
:frame-budget-ms {} :timing-window {})",
            t.fingertip_roi_ratio,
            t.joint_roi_ratio,
            t.curl_overlap_percent,
            t.depth_band,
            t.jump_compression,
            t.camera_axis_change,
            t.peace_separation,
            t.f_tilt_deg,
            t.esc_drop,
            d.mode.as_str(),
            d.window,
            d.forward_enter,
            d.forward_exit,
            d.backward_enter,
            d.backward_exit,
            c.required_samples,
            c.min_area,
            c.max_area,
            self.debounce.gesture_duration,
            self.debounce.reengagement_delay,
            self.resolver.policy.as_str(),
            flag(self.enabled.action),
            flag(self.enabled.movement),
            flag(self.enabled.camera),
            flag(self.enabled.navigation),
            disabled,
            self.timing.budget_ms,
            self.timing.window,
        )
    }
}

/// Parse a `category/gesture` name such as `movement/jump`.
pub fn parse_gesture_name(name: &str) -> Result<(Category, Gesture)> {
    let Some((c, g)) = name.split_once('/') else {
        bail!("expected category/gesture, got {:?}", name);
    };
    let Some(category) = Category::from_str(c) else {
        bail!("unknown category: {}", c);
    };
    let Some(gesture) = Gesture::from_str(g) else {
        bail!("unknown gesture: {}", g);
    };
    if !category.accepts(gesture) {
        bail!("{} is not a {} gesture", gesture, category);
    }
    Ok((category, gesture))
}

/// Numeric value under `:key`. A present key must hold a finite number.
fn number(value: &Value, key: &str) -> Result<Option<f64>> {
    let Some(raw) = get_keyword(value, key) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => bail!(":{} expects a number, got {}", key, raw),
    }
}

fn set_f64(value: &Value, key: &str, field: &mut f64) -> Result<()> {
    if let Some(v) = number(value, key)? {
        *field = v;
    }
    Ok(())
}

fn set_f32(value: &Value, key: &str, field: &mut f32) -> Result<()> {
    if let Some(v) = number(value, key)? {
        *field = v as f32;
    }
    Ok(())
}

fn set_usize(value: &Value, key: &str, field: &mut usize) -> Result<()> {
    let Some(raw) = get_keyword(value, key) else {
        return Ok(());
    };
    match raw.parse::<usize>() {
        Ok(v) => *field = v,
        Err(_) => bail!(":{} expects a non-negative integer, got {}", key, raw),
    }
    Ok(())
}

/// Top-level keys of a plist, without colons.
fn plist_keys(value: &Value) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = value;
    while let Value::Cons(pair) = current {
        match pair.car() {
            Value::Keyword(k) => keys.push(k.to_string()),
            Value::Symbol(s) if s.starts_with(':') => keys.push(s[1..].to_string()),
            _ => {}
        }
        // Skip the value cell.
        current = match pair.cdr() {
            Value::Cons(next) => next.cdr(),
            _ => break,
        };
    }
    keys
}
