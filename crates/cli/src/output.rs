//! Output formatting: pretty terminal text or machine-readable JSON.
//!
//! JSON responses share one envelope: `success` and `message`, plus
//! command-specific fields. Failures use the same envelope with
//! `success: false` and exit code 1.

use std::io::{self, IsTerminal};

use serde_json::{Map, Value, json};

// ── Output format ───────────────────────────────────────────────────────

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Human-readable text.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, else detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Envelopes ───────────────────────────────────────────────────────────

/// Report a successful command. `fields` must be a JSON object; its
/// entries are merged into the envelope after `success` and `message`.
pub(crate) fn success(format: Format, message: &str, fields: Value) -> anyhow::Result<()> {
    match format {
        Format::Json => {
            let mut out = Map::new();
            out.insert("success".into(), Value::Bool(true));
            out.insert("message".into(), Value::String(message.to_string()));
            if let Value::Object(extra) = fields {
                out.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(out))?);
        }
        Format::Pretty => {
            let details = match &fields {
                Value::Object(extra) if !extra.is_empty() => {
                    let parts: Vec<String> = extra
                        .iter()
                        .map(|(k, v)| match v {
                            Value::String(s) => format!("{k}={s}"),
                            other => format!("{k}={other}"),
                        })
                        .collect();
                    format!(" ({})", parts.join(", "))
                }
                _ => String::new(),
            };
            eprintln!("{message}{details}");
        }
    }
    Ok(())
}

/// Report a failed command.
pub(crate) fn failure(format: Format, err: &anyhow::Error) {
    let message = error_message(err);
    match format {
        Format::Json => {
            let out = json!({ "success": false, "message": message });
            // Fall back to the compact form; `Value` serialization cannot fail.
            let text = serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string());
            println!("{text}");
        }
        Format::Pretty => eprintln!("error: {message}"),
    }
}

/// Join the error chain with `": "`, skipping causes whose text an outer
/// message already embeds.
fn error_message(err: &anyhow::Error) -> String {
    let mut message = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if message.contains(&text) {
            continue;
        }
        if !message.is_empty() {
            message.push_str(": ");
        }
        message.push_str(&text);
    }
    message
}
