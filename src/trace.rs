//! Recorded input traces for offline replay.
//!
//! One input per line, timestamp first:
//!
//! ```text
//! # three hard shakes
//! 0    sample 0.0 28.0 9.8
//! 600  sample 0.0 28.0 9.8
//! 1200 down volume-down
//! 1900 up   volume-down
//! ```
//!
//! Blank lines and `#` comments are skipped.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use crate::engine::GestureEngine;
use crate::events::{ButtonId, DistressSink, Input, SensorSample};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct TraceError {
    pub line: usize,
    pub message: String,
}

impl TraceError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

pub fn parse_trace(text: &str) -> Result<Vec<Input>, TraceError> {
    let mut inputs = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        inputs.push(parse_line(line, content)?);
    }
    Ok(inputs)
}

pub fn load_trace(path: &Path) -> Result<Vec<Input>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read trace {}", path.display()))?;
    parse_trace(&text).with_context(|| format!("invalid trace {}", path.display()))
}

/// Feed every input through `engine`, then let the clock run `tail_ms` past
/// the last one so timers still armed at the end of the trace can complete.
pub fn replay<S: DistressSink>(engine: &mut GestureEngine<S>, inputs: &[Input], tail_ms: u64) {
    let mut last_ms = 0;
    for input in inputs {
        last_ms = last_ms.max(input.timestamp_ms());
        engine.handle(*input);
    }
    engine.advance_to(last_ms.saturating_add(tail_ms));
}

fn parse_line(line: usize, content: &str) -> Result<Input, TraceError> {
    let fields: Vec<&str> = content.split_whitespace().collect();
    let timestamp_ms: u64 = fields[0]
        .parse()
        .map_err(|_| TraceError::new(line, format!("bad timestamp {:?}", fields[0])))?;
    let kind = fields
        .get(1)
        .ok_or_else(|| TraceError::new(line, "missing input kind"))?;

    match *kind {
        "sample" => {
            if fields.len() != 5 {
                return Err(TraceError::new(line, "sample needs x y z"));
            }
            let mut axes = [0.0f32; 3];
            for (axis, field) in axes.iter_mut().zip(&fields[2..]) {
                *axis = field
                    .parse()
                    .map_err(|_| TraceError::new(line, format!("bad axis value {:?}", field)))?;
            }
            Ok(Input::Sample(SensorSample::new(axes[0], axes[1], axes[2], timestamp_ms)))
        }
        "down" | "up" => {
            if fields.len() != 3 {
                return Err(TraceError::new(line, format!("{} needs a button", kind)));
            }
            let button = ButtonId::from_label(fields[2])
                .ok_or_else(|| TraceError::new(line, format!("unknown button {:?}", fields[2])))?;
            Ok(if *kind == "down" {
                Input::ButtonDown { button, timestamp_ms }
            } else {
                Input::ButtonUp { button, timestamp_ms }
            })
        }
        other => Err(TraceError::new(line, format!("unknown input kind {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_kinds_and_skips_comments() {
        let text = "\
# header
0 sample 0.0 28.0 9.8

150 down volume-down   # hold it
900 up vol-down
";
        let inputs = parse_trace(text).unwrap();
        assert_eq!(
            inputs,
            vec![
                Input::Sample(SensorSample::new(0.0, 28.0, 9.8, 0)),
                Input::ButtonDown { button: ButtonId::VolumeDown, timestamp_ms: 150 },
                Input::ButtonUp { button: ButtonId::VolumeDown, timestamp_ms: 900 },
            ]
        );
    }

    #[test]
    fn reports_the_offending_line() {
        let err = parse_trace("0 down volume-up\n10 press volume-up\n").unwrap_err();
        assert_eq!(err.line, 2);

        assert_eq!(parse_trace("abc sample 1 2 3").unwrap_err().line, 1);
        assert!(parse_trace("5 sample 1 2").is_err());
        assert!(parse_trace("5 down power").is_err());
        assert!(parse_trace("5").is_err());
    }
}
