//! Threshold filtering, connected-component grouping and group colors for the
//! similarity map.

mod color;
mod components;
mod threshold;

use std::collections::HashMap;

use eframe::egui::Color32;
use log::info;

use crate::report::SimilarityGraph;

pub use color::{color_for, palette, sinebow};
pub use components::{Components, compute_groups};
pub use threshold::{FilteredGraph, apply, normalize_pair_graph};

/// Filtered graph plus the group id and color of every kept node.
///
/// Derived wholesale from a graph and a cutoff; group ids are not stable
/// across cutoffs.
#[derive(Clone, Debug, Default)]
pub struct Clustering {
    pub cutoff: f32,
    pub filtered: FilteredGraph,
    pub group_of_node: HashMap<usize, usize>,
    pub group_count: usize,
    pub colors: Vec<Color32>,
}

impl Clustering {
    pub fn compute(graph: &SimilarityGraph, cutoff: f32) -> Self {
        let filtered = apply(graph, cutoff);
        let components = compute_groups(filtered.links.iter().filter_map(|&index| {
            graph
                .links
                .get(index)
                .map(|link| (link.source, link.target))
        }));
        let group_count = components.len();
        let colors = palette(group_count);

        info!(
            "cutoff {cutoff:.2}: kept {} nodes, {} links, {group_count} groups",
            filtered.nodes.len(),
            filtered.links.len()
        );

        Self {
            cutoff,
            filtered,
            group_of_node: components.into_map(),
            group_count,
            colors,
        }
    }

    pub fn group_of(&self, node_index: usize) -> Option<usize> {
        self.group_of_node.get(&node_index).copied()
    }

    pub fn color_of(&self, node_index: usize) -> Option<Color32> {
        self.group_of(node_index)
            .and_then(|group| self.colors.get(group).copied())
    }

    pub fn group_size(&self, group: usize) -> usize {
        self.group_of_node
            .values()
            .filter(|&&other| other == group)
            .count()
    }

    /// Group ids keyed by submission id, the shape the comparator UI reports.
    pub fn groups_by_id(&self, graph: &SimilarityGraph) -> HashMap<String, usize> {
        self.group_of_node
            .iter()
            .filter_map(|(&index, &group)| graph.nodes.get(index).map(|node| (node.id.clone(), group)))
            .collect()
    }
}
