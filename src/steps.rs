//! Command-line step syntax.
//!
//! A step names a registered transform and optionally its options:
//!
//! ```text
//! grayscale
//! resize:fit=800x400,smoothing=high
//! sharpen:sigma=1.5,threshold=2
//! ```
//!
//! `fit` is parsed as a fit constraint (`800` or `800x400`) and `smoothing` as
//! `low|medium|high`. Any other value becomes a JSON boolean, number or
//! string in the options' extra map. A double-quoted value is a JSON string
//! literal and may contain `,` or `=` (`label:text="a,b"`); `Display` quotes
//! strings that would not read back unchanged.

use crate::imaging::{FitSpec, Smoothing};
use crate::registry::TransformOptions;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// A parsed `NAME[:key=value,...]` step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSpec {
    pub name: String,
    pub options: TransformOptions,
}

impl StepSpec {
    pub fn new(name: impl Into<String>, options: TransformOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

impl fmt::Display for StepSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let mut parts = Vec::new();
        if self.options.fit != FitSpec::Absent {
            parts.push(format!("fit={}", self.options.fit));
        }
        if let Some(smoothing) = self.options.smoothing {
            parts.push(format!("smoothing={}", smoothing.as_str()));
        }
        for (key, value) in &self.options.extra {
            match value {
                Value::String(s) => parts.push(format!("{key}={}", format_string(s))),
                other => parts.push(format!("{key}={other}")),
            }
        }
        if !parts.is_empty() {
            write!(f, ":{}", parts.join(","))?;
        }
        Ok(())
    }
}

impl FromStr for StepSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = match s.split_once(':') {
            Some((name, rest)) => (name.trim(), Some(rest)),
            None => (s.trim(), None),
        };
        if name.is_empty() {
            return Err(format!("step '{s}' has no transform name"));
        }

        let mut options = TransformOptions::new();
        for pair in rest.into_iter().flat_map(split_options) {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("option '{pair}' in step '{name}' is not key=value"))?;
            let (key, value) = (key.trim(), value.trim());
            match key {
                "fit" => options.fit = value.parse()?,
                "smoothing" => options.smoothing = Some(value.parse::<Smoothing>()?),
                _ => {
                    let value = parse_value(value)
                        .map_err(|e| format!("option '{key}' in step '{name}': {e}"))?;
                    options.extra.insert(key.to_string(), value);
                }
            }
        }
        Ok(StepSpec::new(name, options))
    }
}

/// Split `k=v,k=v` on commas outside double quotes.
fn split_options(rest: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let (mut start, mut quoted, mut escaped) = (0, false, false);
    for (i, c) in rest.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ',' if !quoted => {
                parts.push(&rest[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&rest[start..]);
    parts
}

fn parse_value(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.starts_with('"') {
        return serde_json::from_str::<String>(raw).map(Value::String);
    }
    if let Ok(b) = raw.parse::<bool>() {
        return Ok(Value::Bool(b));
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::Number(i.into()));
    }
    Ok(raw
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(raw.to_string())))
}

/// A string value as it must be written to parse back to itself.
fn format_string(s: &str) -> String {
    let plain = !s.is_empty()
        && s.trim() == s
        && !s.contains([',', '"'])
        && matches!(parse_value(s), Ok(Value::String(ref v)) if v == s);
    if plain {
        s.to_string()
    } else {
        Value::String(s.to_string()).to_string()
    }
}
