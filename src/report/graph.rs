use std::collections::{HashMap, HashSet};

use log::warn;

use super::parse::RawGraph;

/// Similarity scores are normalised onto this scale by the comparator.
pub const MAX_SIMILARITY: f32 = 10.0;

#[derive(Clone, Debug, PartialEq)]
pub struct SubmissionNode {
    pub id: String,
    pub is_archive: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityLink {
    pub source: usize,
    pub target: usize,
    pub value: f32,
    /// Added by normalisation rather than read from the payload; never drawn.
    pub synthetic: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SimilarityGraph {
    pub nodes: Vec<SubmissionNode>,
    pub links: Vec<SimilarityLink>,
    pub index_by_id: HashMap<String, usize>,
}

impl SimilarityGraph {
    pub fn new(nodes: Vec<SubmissionNode>, links: Vec<SimilarityLink>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    pub(super) fn from_raw(raw: RawGraph) -> Self {
        let mut nodes = Vec::with_capacity(raw.nodes.len());
        let mut seen = HashSet::with_capacity(raw.nodes.len());
        for node in raw.nodes {
            if !seen.insert(node.id.clone()) {
                warn!("duplicate node id {} in graph payload; keeping the first", node.id);
                continue;
            }
            let is_archive = raw
                .data
                .get(&node.id)
                .is_some_and(|data| data.is_archive);
            nodes.push(SubmissionNode {
                id: node.id,
                is_archive,
            });
        }

        let mut graph = Self::new(nodes, Vec::new());
        let mut dropped = 0usize;
        for link in raw.links {
            let (Some(&source), Some(&target)) = (
                graph.index_by_id.get(&link.source),
                graph.index_by_id.get(&link.target),
            ) else {
                dropped += 1;
                continue;
            };
            if source == target {
                dropped += 1;
                continue;
            }

            let value = if link.value.is_finite() {
                link.value.clamp(0.0, MAX_SIMILARITY)
            } else {
                0.0
            };
            graph.links.push(SimilarityLink {
                source,
                target,
                value,
                synthetic: false,
            });
        }

        if dropped > 0 {
            warn!("dropped {dropped} links with unknown or identical endpoints");
        }

        graph
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.iter().filter(|link| !link.synthetic).count()
    }

    pub fn node(&self, id: &str) -> Option<&SubmissionNode> {
        self.index_by_id.get(id).and_then(|&index| self.nodes.get(index))
    }

    pub fn link_endpoints(&self, link: &SimilarityLink) -> Option<(&str, &str)> {
        let source = self.nodes.get(link.source)?;
        let target = self.nodes.get(link.target)?;
        Some((source.id.as_str(), target.id.as_str()))
    }

    /// Real neighbours of `id` whose link meets `cutoff`, most similar first.
    pub fn neighbors_above(&self, id: &str, cutoff: f32) -> Vec<(String, f32)> {
        let Some(&index) = self.index_by_id.get(id) else {
            return Vec::new();
        };

        let mut neighbors = self
            .links
            .iter()
            .filter(|link| !link.synthetic && link.value >= cutoff)
            .filter_map(|link| {
                let other = if link.source == index {
                    link.target
                } else if link.target == index {
                    link.source
                } else {
                    return None;
                };
                self.nodes
                    .get(other)
                    .map(|node| (node.id.clone(), link.value))
            })
            .collect::<Vec<_>>();

        neighbors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        neighbors
    }

    pub fn max_similarity(&self) -> f32 {
        self.links
            .iter()
            .filter(|link| !link.synthetic)
            .map(|link| link.value)
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse::parse_graph_payload;
    use super::SimilarityGraph;

    fn graph(raw: &str) -> SimilarityGraph {
        SimilarityGraph::from_raw(parse_graph_payload(raw).expect("payload parses"))
    }

    #[test]
    fn links_with_unknown_endpoints_are_dropped() {
        let graph = graph(
            r#"{"nodes": [{"id": "a"}, {"id": "b"}],
                "links": [{"source": "a", "target": "b", "value": 3},
                          {"source": "a", "target": "ghost", "value": 9},
                          {"source": "b", "target": "b", "value": 9}]}"#,
        );
        assert_eq!(graph.links.len(), 1);
        assert_eq!(graph.link_endpoints(&graph.links[0]), Some(("a", "b")));
    }

    #[test]
    fn values_are_clamped_to_similarity_scale() {
        let graph = graph(
            r#"{"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
                "links": [{"source": "a", "target": "b", "value": 14},
                          {"source": "b", "target": "c", "value": -2}]}"#,
        );
        assert_eq!(graph.links[0].value, 10.0);
        assert_eq!(graph.links[1].value, 0.0);
    }

    #[test]
    fn neighbors_are_sorted_by_similarity() {
        let graph = graph(
            r#"{"nodes": [{"id": "a"}, {"id": "b"}, {"id": "c"}],
                "links": [{"source": "a", "target": "b", "value": 2},
                          {"source": "c", "target": "a", "value": 8}],
                "data": {"c": {"isArchive": true}}}"#,
        );
        let neighbors = graph.neighbors_above("a", 0.0);
        assert_eq!(neighbors, vec![("c".to_string(), 8.0), ("b".to_string(), 2.0)]);
        assert_eq!(graph.neighbors_above("a", 5.0).len(), 1);
        assert!(graph.node("c").is_some_and(|node| node.is_archive));
        assert!(graph.neighbors_above("missing", 0.0).is_empty());
    }
}
