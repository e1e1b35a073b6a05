use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawGraph {
    #[serde(default)]
    pub(super) nodes: Vec<RawNode>,
    #[serde(default)]
    pub(super) links: Vec<RawLink>,
    #[serde(default)]
    pub(super) data: HashMap<String, RawNodeData>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawNode {
    #[serde(deserialize_with = "loose_id")]
    pub(super) id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawLink {
    #[serde(deserialize_with = "loose_id")]
    pub(super) source: String,
    #[serde(deserialize_with = "loose_id")]
    pub(super) target: String,
    #[serde(default)]
    pub(super) value: f32,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawNodeData {
    #[serde(default, rename = "isArchive")]
    pub(super) is_archive: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawComparison {
    pub(super) left: RawSubmission,
    pub(super) right: RawSubmission,
    #[serde(default)]
    pub(super) passes: Vec<RawPass>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawSubmission {
    #[serde(deserialize_with = "loose_id")]
    pub(super) id: String,
    #[serde(default)]
    pub(super) files: Vec<RawFile>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawFile {
    #[serde(deserialize_with = "loose_id")]
    pub(super) id: String,
    #[serde(default)]
    pub(super) name: String,
    #[serde(default)]
    pub(super) content: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawPass {
    pub(super) name: String,
    #[serde(default)]
    pub(super) groups: Vec<Vec<RawSpan>>,
    #[serde(default, rename = "ignoredSpans")]
    pub(super) ignored_spans: Vec<RawIgnoredSpan>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawSpan {
    #[serde(default, deserialize_with = "loose_optional_id")]
    pub(super) id: Option<String>,
    #[serde(rename = "subId", deserialize_with = "loose_id")]
    pub(super) sub_id: String,
    #[serde(rename = "fileId", deserialize_with = "loose_id")]
    pub(super) file_id: String,
    pub(super) start: usize,
    pub(super) end: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawIgnoredSpan {
    #[serde(rename = "fileId", deserialize_with = "loose_id")]
    pub(super) file_id: String,
    pub(super) start: usize,
    pub(super) end: usize,
}

/// Comparator ids arrive as strings or bare integers depending on the producer.
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn loose_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or integer id, got {value}")))
}

fn loose_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    id_from_value(&value)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("expected string or integer id, got {value}")))
}

pub(super) fn parse_graph_payload(raw: &str) -> Result<RawGraph> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in graph payload")?;
    if !parsed.is_object() {
        return Err(anyhow!("unexpected JSON type for graph payload; expected an object"));
    }
    RawGraph::deserialize(parsed).context("graph payload does not match {nodes, links, data}")
}

pub(super) fn parse_comparison_payload(raw: &str) -> Result<RawComparison> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in comparison payload")?;
    if !parsed.is_object() {
        return Err(anyhow!(
            "unexpected JSON type for comparison payload; expected an object"
        ));
    }
    RawComparison::deserialize(parsed)
        .context("comparison payload does not match {left, right, passes}")
}
