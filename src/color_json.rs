//! Purpose: Pretty JSON with optional ANSI colorization for CLI output.
//! Exports: `colorize_json`.
//! Invariants: With color disabled, output equals serde_json::to_string_pretty.
//! Invariants: ANSI escapes appear only when explicitly enabled.
use serde_json::Value;

const INDENT: &str = "  ";

// 8/16-color palette only; bright variants lose contrast on some themes.
struct Painter {
    enabled: bool,
}

impl Painter {
    fn paint(&self, code: &str, text: &str, out: &mut String) {
        if self.enabled {
            out.push_str("\u{1b}[");
            out.push_str(code);
            out.push('m');
            out.push_str(text);
            out.push_str("\u{1b}[0m");
        } else {
            out.push_str(text);
        }
    }

    fn key(&self, text: &str, out: &mut String) {
        self.paint("36", text, out);
    }

    fn scalar(&self, value: &Value, out: &mut String) {
        match value {
            Value::Null => self.paint("39", "null", out),
            Value::Bool(true) => self.paint("35", "true", out),
            Value::Bool(false) => self.paint("35", "false", out),
            Value::Number(num) => self.paint("33", &num.to_string(), out),
            Value::String(text) => {
                let encoded =
                    serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
                self.paint("32", &encoded, out);
            }
            _ => {}
        }
    }

    fn punct(&self, text: &str, out: &mut String) {
        self.paint("39", text, out);
    }
}

pub(crate) fn colorize_json(value: &Value, use_color: bool) -> String {
    let painter = Painter { enabled: use_color };
    let mut out = String::new();
    render(value, &painter, 0, &mut out);
    out
}

fn render(value: &Value, painter: &Painter, depth: usize, out: &mut String) {
    match value {
        Value::Array(items) if items.is_empty() => painter.punct("[]", out),
        Value::Object(map) if map.is_empty() => painter.punct("{}", out),
        Value::Array(items) => {
            painter.punct("[", out);
            out.push('\n');
            for (idx, item) in items.iter().enumerate() {
                indent(depth + 1, out);
                render(item, painter, depth + 1, out);
                if idx + 1 < items.len() {
                    painter.punct(",", out);
                }
                out.push('\n');
            }
            indent(depth, out);
            painter.punct("]", out);
        }
        Value::Object(map) => {
            painter.punct("{", out);
            out.push('\n');
            for (idx, (key, item)) in map.iter().enumerate() {
                indent(depth + 1, out);
                let encoded = serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string());
                painter.key(&encoded, out);
                painter.punct(":", out);
                out.push(' ');
                render(item, painter, depth + 1, out);
                if idx + 1 < map.len() {
                    painter.punct(",", out);
                }
                out.push('\n');
            }
            indent(depth, out);
            painter.punct("}", out);
        }
        scalar => painter.scalar(scalar, out),
    }
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use super::colorize_json;
    use serde_json::json;

    #[test]
    fn matches_pretty_when_disabled() {
        let value = json!({
            "rows": [{"id": 1, "price": 9.99, "order_date": "2025-01-01", "note": null}],
            "empty": {}
        });
        let plain = colorize_json(&value, false);
        let pretty = serde_json::to_string_pretty(&value).expect("pretty");
        assert_eq!(plain, pretty);
    }

    #[test]
    fn emits_ansi_when_enabled() {
        let value = json!({"k":"v","n":1,"b":true,"z":null});
        let colored = colorize_json(&value, true);
        assert!(colored.contains("\u{1b}[36m\"k\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[32m\"v\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[33m1\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[35mtrue\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[39mnull\u{1b}[0m"));
    }
}
