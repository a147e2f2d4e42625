//! Response normalisation into the per-category result envelopes.

use serde_json::{Map, Value, json};

/// Where a comparison envelope takes its mode from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonMode {
    /// A fixed label such as `orthologs`.
    Fixed(&'static str),
    /// The value of a validated argument.
    FromField(&'static str),
}

/// Envelope shape for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{search_params, total_count, returned_count, next_page_token?, <key>: [...]}`.
    Search { key: &'static str, upstream_key: &'static str },
    /// Object payloads verbatim (anything else as `{data}`), or
    /// `{<id>, <echoed flags>, data}` when `id_field` is set.
    Fetch {
        id_field: Option<&'static str>,
        echo: &'static [&'static str],
        quality_summary: bool,
    },
    /// `{requested_<field>, requested_count, returned_count, <key>: [...]}`.
    Batch {
        key: &'static str,
        requested_field: &'static str,
        upstream_key: &'static str,
    },
    /// `{<inputs>, comparison_type, result}`.
    Comparison {
        inputs: &'static [&'static str],
        mode: ComparisonMode,
    },
}

/// Upstream list key used unless an operation says otherwise.
pub const DEFAULT_LIST_KEY: &str = "reports";

const QUALITY_SECTIONS: &[&str] = &["assembly_stats", "checkm_info", "annotation_info"];

impl EnvelopeShape {
    pub const fn search(key: &'static str) -> Self {
        EnvelopeShape::Search {
            key,
            upstream_key: DEFAULT_LIST_KEY,
        }
    }

    pub const fn passthrough() -> Self {
        EnvelopeShape::Fetch {
            id_field: None,
            echo: &[],
            quality_summary: false,
        }
    }

    pub const fn fetch_by(id_field: &'static str, echo: &'static [&'static str]) -> Self {
        EnvelopeShape::Fetch {
            id_field: Some(id_field),
            echo,
            quality_summary: false,
        }
    }

    pub const fn batch(key: &'static str, requested_field: &'static str) -> Self {
        EnvelopeShape::Batch {
            key,
            requested_field,
            upstream_key: DEFAULT_LIST_KEY,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            EnvelopeShape::Search { .. } => "search",
            EnvelopeShape::Fetch { .. } => "fetch",
            EnvelopeShape::Batch { .. } => "batch",
            EnvelopeShape::Comparison { .. } => "comparison",
        }
    }

    /// Wrap `payload` for a call made with the `validated` arguments.
    ///
    /// Missing upstream counts default to zero and missing lists to empty.
    pub fn normalize(&self, validated: &Map<String, Value>, payload: Value) -> Value {
        match self {
            EnvelopeShape::Search { key, upstream_key } => {
                let items = list_at(&payload, upstream_key);
                let mut envelope = Map::new();
                envelope.insert("search_params".into(), Value::Object(validated.clone()));
                envelope.insert("total_count".into(), json!(count_at(&payload, "total_count")));
                envelope.insert("returned_count".into(), json!(items.len()));
                if let Some(token) = payload.get("next_page_token").and_then(Value::as_str).filter(|token| !token.is_empty()) {
                    envelope.insert("next_page_token".into(), json!(token));
                }
                envelope.insert((*key).into(), Value::Array(items));
                Value::Object(envelope)
            }
            EnvelopeShape::Fetch {
                id_field: None,
                quality_summary: false,
                ..
            } => match payload {
                Value::Object(_) => payload,
                // Tool results must be JSON objects.
                other => json!({ "data": other }),
            },
            EnvelopeShape::Fetch {
                id_field,
                echo,
                quality_summary,
            } => {
                let mut envelope = Map::new();
                if let Some(id_field) = id_field {
                    envelope.insert((*id_field).into(), validated.get(*id_field).cloned().unwrap_or(Value::Null));
                }
                for flag in echo.iter() {
                    envelope.insert((*flag).into(), validated.get(*flag).cloned().unwrap_or(Value::Null));
                }
                if *quality_summary {
                    envelope.insert("quality".into(), quality_summary_of(&payload));
                }
                envelope.insert("data".into(), payload);
                Value::Object(envelope)
            }
            EnvelopeShape::Batch {
                key,
                requested_field,
                upstream_key,
            } => {
                let requested = validated.get(*requested_field).cloned().unwrap_or_else(|| json!([]));
                let requested_count = requested.as_array().map(Vec::len).unwrap_or(0);
                let items = list_at(&payload, upstream_key);
                let mut envelope = Map::new();
                envelope.insert(format!("requested_{requested_field}"), requested);
                envelope.insert("requested_count".into(), json!(requested_count));
                envelope.insert("returned_count".into(), json!(items.len()));
                envelope.insert((*key).into(), Value::Array(items));
                Value::Object(envelope)
            }
            EnvelopeShape::Comparison { inputs, mode } => {
                let mut envelope = Map::new();
                for input in inputs.iter() {
                    if let Some(value) = validated.get(*input) {
                        envelope.insert((*input).into(), value.clone());
                    }
                }
                let mode = match mode {
                    ComparisonMode::Fixed(label) => json!(label),
                    ComparisonMode::FromField(field) => validated.get(*field).cloned().unwrap_or(Value::Null),
                };
                envelope.insert("comparison_type".into(), mode);
                envelope.insert("result".into(), payload);
                Value::Object(envelope)
            }
        }
    }
}

fn list_at(payload: &Value, key: &str) -> Vec<Value> {
    payload.get(key).and_then(Value::as_array).cloned().unwrap_or_default()
}

fn count_at(payload: &Value, key: &str) -> u64 {
    match payload.get(key) {
        Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
        Some(Value::String(text)) => text.parse().unwrap_or(0),
        _ => 0,
    }
}

fn quality_summary_of(payload: &Value) -> Value {
    let report = payload.pointer("/reports/0");
    let summary = QUALITY_SECTIONS
        .iter()
        .map(|section| {
            let value = report.and_then(|report| report.get(*section)).cloned().unwrap_or(Value::Null);
            (section.to_string(), value)
        })
        .collect::<Map<String, Value>>();
    Value::Object(summary)
}
