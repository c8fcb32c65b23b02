//! Message dispatch: parse s-expressions and route to engine handlers.
//!
//! Every message is a plist with a `:type` and an optional `:id`.  A
//! message always yields one response; a frame that changes the
//! confirmed gesture additionally yields a `:gesture-confirmed` event.

use lexpr::Value;
use tracing::{debug, warn};

use crate::engine::GestureEngine;
use crate::gesture::types::{Category, Gesture};
use crate::hand::landmarks::LandmarkSnapshot;

use super::codec::{
    error_response, escape_string, format_event, get_bool, get_coordinates, get_float,
    get_keyword, get_int, get_string, ok_response, ok_response_with,
};

/// Parse one message and dispatch it. Returns the response followed by any events.
pub fn handle_message(engine: &mut GestureEngine, raw: &str) -> Vec<String> {
    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return vec![error_response(0, &format!("malformed s-expression: {e}"))];
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("frame") => handle_frame(engine, msg_id, &value),
        Some("calibrate") => vec![handle_calibrate(engine, msg_id, &value)],
        Some("calibrate-cancel") => vec![handle_calibrate_cancel(engine, msg_id)],
        Some("status") => vec![ok_response_with(
            msg_id,
            &format!(":engine {}", engine.status_sexp()),
        )],
        Some("config") => vec![handle_config(engine, msg_id, &value)],
        Some("bind") => vec![handle_bind(engine, msg_id, &value)],
        Some("unbind") => vec![handle_unbind(engine, msg_id, &value)],
        Some("bindings") => vec![ok_response_with(
            msg_id,
            &format!(":bindings {}", engine.bindings().bindings_sexp()),
        )],
        Some("timing") => vec![ok_response_with(
            msg_id,
            &format!(":timing {}", engine.timing().stats_sexp()),
        )],
        Some("reset") => {
            engine.reset();
            vec![ok_response(msg_id)]
        }
        Some(other) => vec![error_response(
            msg_id,
            &format!("unknown message type: {other}"),
        )],
        None => vec![error_response(msg_id, "missing :type field")],
    }
}

// ── Handlers ────────────────────────────────────────────────

fn parse_snapshot(value: &Value) -> anyhow::Result<LandmarkSnapshot> {
    let coords = get_coordinates(value, "landmarks")?;
    LandmarkSnapshot::from_flat(&coords)
}

fn handle_frame(engine: &mut GestureEngine, msg_id: i64, value: &Value) -> Vec<String> {
    let Some(now) = get_float(value, "t") else {
        warn!("frame {} without :t", msg_id);
        return vec![error_response(msg_id, "missing :t")];
    };
    if !now.is_finite() {
        warn!("frame {} with non-finite :t {}", msg_id, now);
        return vec![error_response(msg_id, &format!(":t must be finite, got {now}"))];
    }
    let snapshot = match parse_snapshot(value) {
        Ok(s) => s,
        Err(e) => {
            warn!("malformed frame {}: {}", msg_id, e);
            return vec![error_response(msg_id, &e.to_string())];
        }
    };

    let report = engine.process_frame(&snapshot, now);
    let mut out = vec![ok_response_with(msg_id, &report.to_sexp())];
    if report.changed {
        let category = format!(":{}", report.confirmed.category);
        let gesture = format!(":{}", report.confirmed.gesture);
        let command = match engine.bindings().command_for(report.confirmed) {
            Some(c) => format!("\"{}\"", escape_string(c)),
            None => "nil".to_string(),
        };
        let time = format!("{:.3}", now);
        out.push(format_event(
            "gesture-confirmed",
            &[
                ("category", &category),
                ("gesture", &gesture),
                ("command", &command),
                ("t", &time),
            ],
        ));
    }
    out
}

/// `(:type :calibrate)` starts a capture session; with `:now t` and
/// `:landmarks` the baseline is taken from that snapshot immediately.
fn handle_calibrate(engine: &mut GestureEngine, msg_id: i64, value: &Value) -> String {
    if get_bool(value, "now").unwrap_or(false) {
        let snapshot = match parse_snapshot(value) {
            Ok(s) => s,
            Err(e) => return error_response(msg_id, &e.to_string()),
        };
        return match engine.capture_calibration(&snapshot) {
            Ok(_) => ok_response_with(
                msg_id,
                &format!(":calibration {}", engine.calibration_store().status_sexp()),
            ),
            Err(e) => error_response(msg_id, &e.to_string()),
        };
    }
    engine.request_calibration();
    ok_response_with(
        msg_id,
        &format!(":calibration {}", engine.calibration_store().status_sexp()),
    )
}

fn handle_calibrate_cancel(engine: &mut GestureEngine, msg_id: i64) -> String {
    let cancelled = engine.cancel_calibration();
    ok_response_with(
        msg_id,
        &format!(":cancelled {}", if cancelled { "t" } else { "nil" }),
    )
}

/// Apply any config keys present, then report the effective configuration.
fn handle_config(engine: &mut GestureEngine, msg_id: i64, value: &Value) -> String {
    if let Err(e) = engine.apply_value(value) {
        warn!("config rejected: {:#}", e);
        return error_response(msg_id, &format!("{e:#}"));
    }
    debug!("config message {} applied", msg_id);
    ok_response_with(msg_id, &format!(":config {}", engine.config().config_sexp()))
}

fn parse_target(value: &Value) -> Result<(Category, Gesture), String> {
    let category = get_keyword(value, "category").ok_or("missing :category")?;
    let gesture = get_keyword(value, "gesture").ok_or("missing :gesture")?;
    let category =
        Category::from_str(&category).ok_or_else(|| format!("unknown category: {category}"))?;
    let gesture =
        Gesture::from_str(&gesture).ok_or_else(|| format!("unknown gesture: {gesture}"))?;
    Ok((category, gesture))
}

fn handle_bind(engine: &mut GestureEngine, msg_id: i64, value: &Value) -> String {
    let (category, gesture) = match parse_target(value) {
        Ok(t) => t,
        Err(reason) => return error_response(msg_id, &reason),
    };
    let Some(command) = get_string(value, "command") else {
        return error_response(msg_id, "missing :command");
    };
    if let Err(e) = engine.bindings_mut().bind(category, gesture, &command) {
        return error_response(msg_id, &e.to_string());
    }
    ok_response_with(
        msg_id,
        &format!(
            ":category :{} :gesture :{} :command \"{}\" :bindings {}",
            category,
            gesture,
            escape_string(&command),
            engine.bindings().len()
        ),
    )
}

fn handle_unbind(engine: &mut GestureEngine, msg_id: i64, value: &Value) -> String {
    let (category, gesture) = match parse_target(value) {
        Ok(t) => t,
        Err(reason) => return error_response(msg_id, &reason),
    };
    let removed = engine.bindings_mut().unbind(category, gesture);
    ok_response_with(
        msg_id,
        &format!(
            ":removed {} :bindings {}",
            if removed { "t" } else { "nil" },
            engine.bindings().len()
        ),
    )
}

// ── Tests ───────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::landmarks::fixtures::*;

    fn frame_message(id: i64, t: f64, snapshot: &LandmarkSnapshot) -> String {
        let coords: Vec<String> = snapshot
            .points()
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .map(|v| if v.is_finite() { format!("{v}") } else { "nil".to_string() })
            .collect();
        format!("(:type :frame :id {} :t {} :landmarks ({}))", id, t, coords.join(" "))
    }

    fn parse(s: &str) -> Value {
        lexpr::from_str(s).expect("valid s-expression")
    }

    #[test]
    fn test_malformed_message() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :frame");
        assert_eq!(out.len(), 1);
        assert!(out[0].contains(":status :error"));
        assert!(out[0].contains("malformed"));
    }

    #[test]
    fn test_unknown_and_missing_type() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :dance :id 3)");
        assert!(out[0].contains("unknown message type: dance"), "got {}", out[0]);
        let out = handle_message(&mut engine, "(:id 4)");
        assert!(out[0].contains("missing :type"));
    }

    #[test]
    fn test_frame_response_fields() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, &frame_message(1, 0.0, &open_hand()));
        assert_eq!(out.len(), 1, "no event on first neutral frame");
        let v = parse(&out[0]);
        assert_eq!(get_keyword(&v, "status"), Some("ok".to_string()));
        assert_eq!(get_keyword(&v, "changed"), Some("nil".to_string()));
        assert_eq!(get_keyword(&v, "depth"), Some("neutral".to_string()));
    }

    #[test]
    fn test_frame_errors() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :frame :id 2 :landmarks (0.1 0.2))");
        assert!(out[0].contains("missing :t"));
        let out = handle_message(&mut engine, "(:type :frame :id 2 :t 0.0 :landmarks (0.1 0.2))");
        assert!(out[0].contains(":status :error"), "short landmark list rejected");
        let out = handle_message(&mut engine, "(:type :frame :id 2 :t 0.0)");
        assert!(out[0].contains("missing :landmarks"));
    }

    #[test]
    fn test_non_finite_time_rejected_without_stalling_debounce() {
        let mut engine = GestureEngine::default();
        let bad = frame_message(1, 0.0, &thumbs_down()).replace(":t 0", ":t nan");
        let out = handle_message(&mut engine, &bad);
        assert!(out[0].contains(":status :error"), "got {}", out[0]);
        assert!(out[0].contains(":t must be finite"));
        let out = handle_message(&mut engine, &frame_message(2, 0.0, &thumbs_down()).replace(":t 0", ":t inf"));
        assert!(out[0].contains(":status :error"));

        let mut confirmed_at = None;
        for i in 0..60 {
            let t = 0.1 + i as f64 / 30.0;
            let out = handle_message(&mut engine, &frame_message(10 + i, t, &thumbs_down()));
            if out.len() == 2 {
                confirmed_at = Some(t);
                break;
            }
        }
        let t = confirmed_at.expect("ESC confirms after the bad frame");
        assert!(t >= 0.4 - 1e-9 && t < 0.45, "confirmed at {}", t);
    }

    #[test]
    fn test_confirmed_event_carries_command() {
        let mut engine = GestureEngine::default();
        handle_message(&mut engine, &frame_message(1, 0.0, &thumbs_down()));
        let out = handle_message(&mut engine, &frame_message(2, 0.35, &thumbs_down()));
        assert_eq!(out.len(), 2, "response plus event");
        let event = parse(&out[1]);
        assert_eq!(get_keyword(&event, "event"), Some("gesture-confirmed".to_string()));
        assert_eq!(get_keyword(&event, "category"), Some("navigation".to_string()));
        assert_eq!(get_keyword(&event, "gesture"), Some("esc".to_string()));
        assert_eq!(get_string(&event, "command"), Some("key-escape".to_string()));
    }

    #[test]
    fn test_bind_unbind_roundtrip() {
        let mut engine = GestureEngine::default();
        let out = handle_message(
            &mut engine,
            "(:type :bind :id 5 :category :navigation :gesture :esc :command \"key-q\")",
        );
        assert!(out[0].contains(":status :ok"), "got {}", out[0]);
        assert_eq!(
            engine
                .bindings()
                .command_for(crate::gesture::types::ActiveGesture::new(Category::Navigation, Gesture::Esc)),
            Some("key-q")
        );
        let out = handle_message(&mut engine, "(:type :unbind :id 6 :category :navigation :gesture :esc)");
        assert!(out[0].contains(":removed t"));
        let out = handle_message(&mut engine, "(:type :unbind :id 7 :category :navigation :gesture :esc)");
        assert!(out[0].contains(":removed nil"));
    }

    #[test]
    fn test_bind_rejects_bad_targets() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :bind :category :camera :gesture :attack :command \"x\")");
        assert!(out[0].contains(":status :error"));
        let out = handle_message(&mut engine, "(:type :bind :category :camera :gesture :lock)");
        assert!(out[0].contains("missing :command"));
        let out = handle_message(&mut engine, "(:type :bind :category :feet :gesture :lock :command \"x\")");
        assert!(out[0].contains("unknown category"));
    }

    #[test]
    fn test_config_message() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :config :id 9 :gesture-duration 0.5 :camera nil)");
        assert!(out[0].contains(":status :ok"), "got {}", out[0]);
        assert!(out[0].contains(":gesture-duration 0.5 "), "got {}", out[0]);
        assert_eq!(engine.config().debounce.gesture_duration, 0.5);
        assert!(!engine.config().enabled.camera);

        let out = handle_message(&mut engine, "(:type :config :id 10 :forward-exit 2.0)");
        assert!(out[0].contains(":status :error"));
        assert_eq!(engine.config().depth.forward_exit, 1.10);
    }

    #[test]
    fn test_calibrate_session_and_cancel() {
        let mut engine = GestureEngine::default();
        let out = handle_message(&mut engine, "(:type :calibrate :id 1)");
        assert!(out[0].contains(":collecting t"), "got {}", out[0]);
        let out = handle_message(&mut engine, "(:type :calibrate-cancel :id 2)");
        assert!(out[0].contains(":cancelled t"));
        let out = handle_message(&mut engine, "(:type :calibrate-cancel :id 3)");
        assert!(out[0].contains(":cancelled nil"));
    }

    #[test]
    fn test_calibrate_now() {
        let mut engine = GestureEngine::default();
        let msg = frame_message(1, 0.0, &fist()).replace(":type :frame", ":type :calibrate :now t");
        let out = handle_message(&mut engine, &msg);
        assert!(out[0].contains(":calibrated t"), "got {}", out[0]);
        assert!(engine.calibration().is_some());
    }

    #[test]
    fn test_status_and_reset() {
        let mut engine = GestureEngine::default();
        handle_message(&mut engine, &frame_message(1, 0.0, &open_hand()));
        let out = handle_message(&mut engine, "(:type :status :id 2)");
        assert!(out[0].contains(":engine (:confirmed"));
        let out = handle_message(&mut engine, "(:type :reset :id 3)");
        assert_eq!(out[0], "(:type :response :id 3 :status :ok)");
        assert_eq!(engine.timing().total_frames, 0);
    }
}
