use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use log::info;

use super::comparison::Comparison;
use super::graph::SimilarityGraph;
use super::parse::{parse_comparison_payload, parse_graph_payload};

/// Everything the explorer shows for one run of the comparator.
#[derive(Clone, Debug)]
pub struct Session {
    pub graph: Option<SimilarityGraph>,
    pub comparison: Option<Comparison>,
}

/// Where a session is read from; kept so the app can reload the same files.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSource {
    pub graph: Option<PathBuf>,
    pub comparison: Option<PathBuf>,
}

impl SessionSource {
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(path) = &self.graph {
            parts.push(format!("graph: {}", path.display()));
        }
        if let Some(path) = &self.comparison {
            parts.push(format!("comparison: {}", path.display()));
        }
        parts.join("  ")
    }
}

fn read_payload(path: &Path, kind: &str) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read {kind} payload from {}", path.display()))
}

pub fn load_graph(path: &Path) -> Result<SimilarityGraph> {
    let raw = read_payload(path, "graph")?;
    let payload = parse_graph_payload(&raw)
        .with_context(|| format!("failed to parse graph payload {}", path.display()))?;
    let graph = SimilarityGraph::from_raw(payload);

    info!(
        "loaded similarity graph from {}: {} nodes, {} links",
        path.display(),
        graph.node_count(),
        graph.link_count()
    );
    Ok(graph)
}

pub fn load_comparison(path: &Path) -> Result<Comparison> {
    let raw = read_payload(path, "comparison")?;
    let payload = parse_comparison_payload(&raw)
        .with_context(|| format!("failed to parse comparison payload {}", path.display()))?;
    let comparison = Comparison::from_raw(payload)
        .with_context(|| format!("invalid comparison payload {}", path.display()))?;

    info!(
        "loaded comparison {} vs {} from {}: {} passes",
        comparison.left.id,
        comparison.right.id,
        path.display(),
        comparison.passes.len()
    );
    Ok(comparison)
}

pub fn load_session(source: &SessionSource) -> Result<Session> {
    if source.graph.is_none() && source.comparison.is_none() {
        return Err(anyhow!(
            "nothing to load; pass a graph payload, a comparison payload, or both"
        ));
    }

    let graph = source.graph.as_deref().map(load_graph).transpose()?;
    let comparison = source
        .comparison
        .as_deref()
        .map(load_comparison)
        .transpose()?;

    Ok(Session { graph, comparison })
}
