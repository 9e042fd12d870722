use serde_json::{Number, Value};
use std::fmt::Write;

/// Serializes a JSON value in canonical form.
///
/// Object keys are sorted at every level, arrays keep their order and no
/// insignificant whitespace is emitted. Floats are written like
/// `JSON.stringify` writes them: integral floats print without a fractional
/// part, `-0` prints as `0` and small or large magnitudes switch between
/// plain and exponent notation at the same thresholds.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    canonical_string(value).into_bytes()
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if n.is_i64() || n.is_u64() {
        let _ = write!(out, "{}", n);
        return;
    }

    match n.as_f64() {
        Some(f) if f.is_finite() => write_js_float(out, f),
        _ => {
            let _ = write!(out, "{}", n);
        }
    }
}

/// Writes `f` the way ECMAScript `Number::toString` does: the shortest
/// round-trip digits, in plain decimal notation for decimal exponents from
/// -7 to 20 and in `d.ddde±x` notation outside that range.
fn write_js_float(out: &mut String, f: f64) {
    if f == 0.0 {
        out.push('0');
        return;
    }
    if f < 0.0 {
        out.push('-');
    }

    // `{:e}` yields the shortest round-trip mantissa, e.g. `1.2345e-7`.
    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let k = digits.len() as i32;
    let n = exponent + 1;

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let _ = write!(out, "e{}{}", if n > 0 { "+" } else { "-" }, (n - 1).abs());
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_at_every_level() {
        let value = json!({ "b": 1, "a": { "z": [3, { "y": 1, "x": 2 }], "c": null } });
        assert_eq!(
            canonical_string(&value),
            r#"{"a":{"c":null,"z":[3,{"x":2,"y":1}]},"b":1}"#
        );
    }

    #[test]
    fn insertion_order_and_whitespace_do_not_matter() {
        let compact: Value = serde_json::from_str(r#"{"b":[1,2],"a":{"d":true,"c":"x"}}"#).unwrap();
        let pretty: Value = serde_json::from_str(
            "{\n  \"a\": { \"c\": \"x\",\n \"d\": true },\n  \"b\": [ 1, 2 ]\n}",
        )
        .unwrap();
        assert_eq!(canonical_bytes(&compact), canonical_bytes(&pretty));
    }

    #[test]
    fn array_order_is_preserved() {
        assert_ne!(canonical_string(&json!([1, 2])), canonical_string(&json!([2, 1])));
    }

    #[test]
    fn numbers_render_like_the_producer() {
        let value: Value = serde_json::from_str(r#"[1, -7, 1.0, 2.50, -0.0, 0.1, 125000.5, 1e3]"#).unwrap();
        assert_eq!(canonical_string(&value), "[1,-7,1,2.5,0,0.1,125000.5,1000]");
    }

    #[test]
    fn float_notation_switches_at_ecmascript_thresholds() {
        let value: Value =
            serde_json::from_str("[0.00005, 0.000001, 0.000005, 1.5e-7, 1e21, 123456789012345680000.5, -7.25]").unwrap();
        assert_eq!(
            canonical_string(&value),
            "[0.00005,0.000001,0.000005,1.5e-7,1e+21,123456789012345680000,-7.25]"
        );

        let extremes: Value = serde_json::from_str("[5e-324, 1.7976931348623157e308, -2.5e-8]").unwrap();
        assert_eq!(canonical_string(&extremes), "[5e-324,1.7976931348623157e+308,-2.5e-8]");
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({ "k": "quote\" slash\\ tab\t nl\n bell\u{07} é" });
        assert_eq!(
            canonical_string(&value),
            "{\"k\":\"quote\\\" slash\\\\ tab\\t nl\\n bell\\u0007 é\"}"
        );
    }
}
