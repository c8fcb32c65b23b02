//! S-expression plist helpers shared by message dispatch and config loading.

use anyhow::{bail, Result};
use lexpr::Value;

// ── Responses ──────────────────────────────────────────────

/// Bare acknowledgement of message `id`.
pub fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

/// Acknowledgement followed by pre-rendered `:key value` pairs.
pub fn ok_response_with(id: i64, fields: &str) -> String {
    format!("(:type :response :id {} :status :ok {})", id, fields)
}

/// Failure reply; `reason` becomes a quoted string.
pub fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Make text safe inside a double-quoted literal.
pub fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '\\' | '"') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `(:type :event :event :NAME :k v ...)`. Values are emitted as given.
pub fn format_event(event_type: &str, fields: &[(&str, &str)]) -> String {
    let pairs: String = fields
        .iter()
        .map(|(key, val)| format!(" :{} {}", key, val))
        .collect();
    format!("(:type :event :event :{}{})", event_type, pairs)
}

// ── Plist access ───────────────────────────────────────────

/// The element after `:key` in a flat plist.
///
/// Keys may arrive as keywords or as colon-prefixed symbols, depending on
/// the parser options.
pub fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Text form of the value under `:key`, with any leading colon removed.
pub fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s: &str = v;
            s.strip_prefix(':').unwrap_or(s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => if *b { "t" } else { "nil" }.to_string(),
        Value::Null | Value::Nil => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Integer under `:key`; text that does not parse counts as absent.
pub fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

pub fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// `nil` is false; any other value is true.
pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Number under `:key`; text that does not parse counts as absent.
pub fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Leaves of a possibly nested list, in order. List terminators are dropped.
pub fn flatten_list(value: &Value) -> Vec<&Value> {
    fn collect<'a>(mut v: &'a Value, out: &mut Vec<&'a Value>) {
        loop {
            match v {
                Value::Cons(pair) => {
                    collect(pair.car(), out);
                    v = pair.cdr();
                }
                Value::Null => return,
                leaf => {
                    out.push(leaf);
                    return;
                }
            }
        }
    }
    let mut leaves = Vec::new();
    collect(value, &mut leaves);
    leaves
}

/// Whether a leaf stands for "no value".
fn is_nil(value: &Value) -> bool {
    match value {
        Value::Nil | Value::Null | Value::Bool(false) => true,
        Value::Symbol(s) => s.as_ref() == "nil",
        _ => false,
    }
}

/// List of strings under `:key`; `nil` or absent gives an empty list.
pub fn get_string_list(value: &Value, key: &str) -> Result<Vec<String>> {
    let Some(list) = get_value(value, key) else {
        return Ok(Vec::new());
    };
    if is_nil(list) {
        return Ok(Vec::new());
    }
    flatten_list(list)
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.to_string()),
            Value::Symbol(s) => Ok(s.to_string()),
            other => bail!(":{} expects strings, got {}", key, other),
        })
        .collect()
}

/// Numeric list under `:key`; `nil` entries become NaN.
pub fn get_coordinates(value: &Value, key: &str) -> Result<Vec<f32>> {
    let Some(list) = get_value(value, key) else {
        bail!("missing :{}", key);
    };
    flatten_list(list)
        .into_iter()
        .map(|v| match v {
            Value::Number(n) => match n.as_f64() {
                Some(f) => Ok(f as f32),
                None => bail!("unrepresentable number {}", n),
            },
            other if is_nil(other) => Ok(f32::NAN),
            other => bail!(":{} expects numbers or nil, got {}", key, other),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        lexpr::from_str(s).expect("valid s-expression")
    }

    #[test]
    fn test_ok_response_format() {
        let r = ok_response(42);
        assert_eq!(r, "(:type :response :id 42 :status :ok)");
        let r = ok_response_with(3, ":count 2");
        assert_eq!(r, "(:type :response :id 3 :status :ok :count 2)");
    }

    #[test]
    fn test_error_response_escapes_quotes() {
        let r = error_response(1, "say \"hello\"");
        assert!(r.contains(":status :error"));
        assert!(r.contains("say \\\"hello\\\""), "got {}", r);
    }

    #[test]
    fn test_escape_string_both() {
        assert_eq!(escape_string("\"\\\""), "\\\"\\\\\\\"");
        assert_eq!(escape_string("plain"), "plain");
    }

    #[test]
    fn test_get_keyword_from_plist() {
        let v = parse("(:type :frame :id 7 :command \"key-w\")");
        assert_eq!(get_keyword(&v, "type"), Some("frame".to_string()));
        assert_eq!(get_int(&v, "id"), Some(7));
        assert_eq!(get_string(&v, "command"), Some("key-w".to_string()));
        assert_eq!(get_keyword(&v, "missing"), None);
    }

    #[test]
    fn test_get_keyword_empty_list() {
        assert_eq!(get_keyword(&parse("()"), "type"), None);
    }

    #[test]
    fn test_get_float_and_bool() {
        let v = parse("(:t 1.25 :n 3 :on t :off nil)");
        assert_eq!(get_float(&v, "t"), Some(1.25));
        assert_eq!(get_float(&v, "n"), Some(3.0));
        assert_eq!(get_bool(&v, "on"), Some(true));
        assert_eq!(get_bool(&v, "off"), Some(false));
    }

    #[test]
    fn test_get_coordinates_with_missing() {
        let v = parse("(:landmarks (0.5 nil 1))");
        let coords = get_coordinates(&v, "landmarks").expect("coordinates");
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[0], 0.5);
        assert!(coords[1].is_nan());
        assert_eq!(coords[2], 1.0);
    }

    #[test]
    fn test_get_coordinates_rejects_strings() {
        let v = parse("(:landmarks (0.5 \"x\"))");
        assert!(get_coordinates(&v, "landmarks").is_err());
        assert!(get_coordinates(&v, "other").is_err());
    }

    #[test]
    fn test_get_string_list() {
        let v = parse("(:disabled (\"movement/jump\" \"camera/lock\") :none nil)");
        assert_eq!(
            get_string_list(&v, "disabled").expect("list"),
            vec!["movement/jump".to_string(), "camera/lock".to_string()]
        );
        assert!(get_string_list(&v, "none").expect("nil").is_empty());
        assert!(get_string_list(&v, "absent").expect("absent").is_empty());
    }

    #[test]
    fn test_flatten_nested_list_in_order() {
        let v = parse("(1 (2 (3 4)) () 5)");
        let leaves: Vec<String> = flatten_list(&v).iter().map(|l| l.to_string()).collect();
        assert_eq!(leaves, vec!["1", "2", "3", "4", "5"]);
        assert!(flatten_list(&parse("()")).is_empty());
    }

    #[test]
    fn test_format_event_is_valid_sexp() {
        let e = format_event("gesture-confirmed", &[("category", ":action")]);
        assert_eq!(e, "(:type :event :event :gesture-confirmed :category :action)");
        let v = parse(&e);
        assert_eq!(get_keyword(&v, "event"), Some("gesture-confirmed".to_string()));
    }

    #[test]
    fn test_error_response_parseable_fields() {
        let v = parse(&error_response(5, "missing field"));
        assert_eq!(get_keyword(&v, "status"), Some("error".to_string()));
        assert_eq!(get_keyword(&v, "reason"), Some("missing field".to_string()));
    }
}
