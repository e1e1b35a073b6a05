use log::debug;

use crate::report::{SimilarityGraph, SimilarityLink};

/// Nodes and links of a graph that survive a similarity cutoff, as indices
/// into the source graph, both in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilteredGraph {
    pub nodes: Vec<usize>,
    pub links: Vec<usize>,
}

impl FilteredGraph {
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Keeps a link iff `value >= cutoff`, and a node iff it ends a kept link.
///
/// Raising the cutoff can only shrink both sets.
pub fn apply(graph: &SimilarityGraph, cutoff: f32) -> FilteredGraph {
    let mut keep_node = vec![false; graph.nodes.len()];
    let mut links = Vec::new();

    for (index, link) in graph.links.iter().enumerate() {
        if link.value >= cutoff
            && link.source < keep_node.len()
            && link.target < keep_node.len()
        {
            keep_node[link.source] = true;
            keep_node[link.target] = true;
            links.push(index);
        }
    }

    let nodes = keep_node
        .iter()
        .enumerate()
        .filter_map(|(index, keep)| keep.then_some(index))
        .collect();

    FilteredGraph { nodes, links }
}

/// A two-submission graph gets one synthetic zero-weight link when its nodes
/// are not already linked, so it reaches clustering and layout like any other
/// connected graph. Returns whether a link was added.
pub fn normalize_pair_graph(graph: &mut SimilarityGraph) -> bool {
    if graph.nodes.len() != 2 {
        return false;
    }

    let already_linked = graph.links.iter().any(|link| {
        (link.source == 0 && link.target == 1) || (link.source == 1 && link.target == 0)
    });
    if already_linked {
        return false;
    }

    debug!("normalising two-node graph with a synthetic link");
    graph.links.push(SimilarityLink {
        source: 0,
        target: 1,
        value: 0.0,
        synthetic: true,
    });
    true
}
