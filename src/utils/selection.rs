// src/utils/selection.rs

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{AssessmentError, AssessmentResult};

/// Parses a serialized Checkbox selection into a set of option ids.
///
/// Accepts a JSON array of integers or numeric strings (`[1, "2"]`) or a
/// plain comma separated list (`1,2`). Blank input is the empty set.
pub fn parse_selection(raw: &str) -> AssessmentResult<BTreeSet<i64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(BTreeSet::new());
    }

    if raw.starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(raw)
            .map_err(|e| AssessmentError::InvalidAnswerFormat(e.to_string()))?;
        return values.iter().map(option_id).collect();
    }

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<i64>()
                .map_err(|_| AssessmentError::InvalidAnswerFormat(format!("'{part}' is not an option id")))
        })
        .collect()
}

fn option_id(value: &Value) -> AssessmentResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| AssessmentError::InvalidAnswerFormat(format!("'{n}' is not an option id"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| AssessmentError::InvalidAnswerFormat(format!("'{s}' is not an option id"))),
        other => Err(AssessmentError::InvalidAnswerFormat(format!(
            "unexpected {other} in selection"
        ))),
    }
}

/// Lenient variant used during evaluation: anything unparseable is the empty set.
pub fn parse_selection_lenient(raw: Option<&str>) -> BTreeSet<i64> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };
    match parse_selection(raw) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::debug!("Treating malformed selection as empty: {}", e);
            BTreeSet::new()
        }
    }
}
