use std::collections::HashMap;

use eframe::egui::{Color32, Vec2, vec2};

use crate::cluster::Clustering;
use crate::report::SimilarityGraph;
use crate::util::stable_pair;

use super::super::render_utils::node_radius;
use super::super::{RenderEdge, RenderGraph, RenderNode, ViewModel};

const UNGROUPED_COLOR: Color32 = Color32::from_rgb(120, 128, 140);

fn make_render_node(id: &str, index: usize, base_radius: f32) -> RenderNode {
    let (jx, jy) = stable_pair(id);
    let mut direction = vec2(jx, jy);
    if direction.length_sq() <= 0.0001 {
        let angle = ((index as f32) * 0.618_034 + 0.11) * std::f32::consts::TAU;
        direction = vec2(angle.cos(), angle.sin());
    } else {
        direction = direction.normalized();
    }

    RenderNode {
        id: id.to_owned(),
        world_pos: direction * (40.0 + index as f32 * 6.0),
        velocity: direction * (1.15 + base_radius * 0.022),
        base_radius,
        group: None,
        color: UNGROUPED_COLOR,
        is_archive: false,
    }
}

/// Render edges of the kept links, re-indexed onto render node positions.
fn collect_edges(
    graph: &SimilarityGraph,
    clustering: &Clustering,
    render_index: &HashMap<usize, usize>,
) -> Vec<RenderEdge> {
    clustering
        .filtered
        .links
        .iter()
        .filter_map(|&link_index| {
            let link = graph.links.get(link_index)?;
            Some(RenderEdge {
                source: *render_index.get(&link.source)?,
                target: *render_index.get(&link.target)?,
                value: link.value,
                synthetic: link.synthetic,
            })
        })
        .collect()
}

impl ViewModel {
    pub(in crate::app) fn set_cutoff(&mut self, cutoff: f32) {
        let cutoff = cutoff.clamp(0.0, crate::report::MAX_SIMILARITY);
        if (cutoff - self.cutoff).abs() > f32::EPSILON {
            self.cutoff = cutoff;
            self.graph_dirty = true;
        }
    }

    /// Re-clusters at the current cutoff and rebuilds the render graph.
    /// Nodes that survive keep their position and velocity.
    pub(in crate::app) fn rebuild_render_graph(&mut self) {
        self.render_graph_revision = self.render_graph_revision.wrapping_add(1);
        self.search_match_cache = None;
        self.graph_dirty = false;

        let Some(graph) = self.graph.as_ref() else {
            self.clustering = Clustering::default();
            self.graph_cache = None;
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        };

        self.clustering = Clustering::compute(graph, self.cutoff);
        let clustering = &self.clustering;

        if clustering.filtered.nodes.is_empty() {
            self.graph_cache = None;
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            return;
        }

        let render_index = clustering
            .filtered
            .nodes
            .iter()
            .enumerate()
            .map(|(render, &graph_node)| (graph_node, render))
            .collect::<HashMap<_, _>>();
        let edges = collect_edges(graph, clustering, &render_index);

        let mut degree = vec![0usize; clustering.filtered.nodes.len()];
        for edge in &edges {
            degree[edge.source] += 1;
            degree[edge.target] += 1;
        }
        let max_degree = degree.iter().copied().max().unwrap_or(0);

        let (mut prior_nodes, physics_scratch, view_scratch) = match self.graph_cache.take() {
            Some(cache) => (
                cache
                    .nodes
                    .into_iter()
                    .map(|node| (node.id.clone(), node))
                    .collect::<HashMap<_, _>>(),
                cache.physics_scratch,
                cache.view_scratch,
            ),
            None => (HashMap::new(), Default::default(), Default::default()),
        };

        let mut nodes = Vec::with_capacity(clustering.filtered.nodes.len());
        let mut index_by_id = HashMap::with_capacity(clustering.filtered.nodes.len());
        for (index, &graph_node) in clustering.filtered.nodes.iter().enumerate() {
            let Some(submission) = graph.nodes.get(graph_node) else {
                continue;
            };
            let base_radius = node_radius(degree[index], max_degree);
            let mut node = match prior_nodes.remove(&submission.id) {
                Some(mut node) => {
                    node.base_radius = base_radius;
                    node
                }
                None => make_render_node(&submission.id, index, base_radius),
            };
            node.group = clustering.group_of(graph_node);
            node.color = clustering.color_of(graph_node).unwrap_or(UNGROUPED_COLOR);
            node.is_archive = submission.is_archive;

            index_by_id.insert(submission.id.clone(), nodes.len());
            nodes.push(node);
        }

        let mut cache = RenderGraph {
            nodes,
            edges,
            index_by_id,
            physics_scratch,
            view_scratch,
        };

        // Small nodes first so hubs paint on top.
        let draw_order = &mut cache.view_scratch.draw_order;
        draw_order.clear();
        draw_order.extend(0..cache.nodes.len());
        draw_order.sort_by(|&a, &b| {
            cache.nodes[a]
                .base_radius
                .total_cmp(&cache.nodes[b].base_radius)
        });

        self.visible_node_count = cache.nodes.len();
        self.visible_edge_count = cache.edges.iter().filter(|edge| !edge.synthetic).count();
        self.graph_cache = Some(cache);
    }

    /// World position of a node in the current render graph.
    pub(in crate::app) fn node_position(&self, id: &str) -> Option<Vec2> {
        let cache = self.graph_cache.as_ref()?;
        cache
            .index_by_id
            .get(id)
            .and_then(|&index| cache.nodes.get(index))
            .map(|node| node.world_pos)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use crate::app::ViewModel;
    use crate::report::{Session, SimilarityGraph, SimilarityLink, SubmissionNode};
    use crate::settings::ViewSettings;

    fn graph(ids: &[&str], links: &[(usize, usize, f32)]) -> SimilarityGraph {
        SimilarityGraph::new(
            ids.iter()
                .map(|id| SubmissionNode {
                    id: id.to_string(),
                    is_archive: *id == "D",
                })
                .collect(),
            links
                .iter()
                .map(|&(source, target, value)| SimilarityLink {
                    source,
                    target,
                    value,
                    synthetic: false,
                })
                .collect(),
        )
    }

    fn model(graph: SimilarityGraph) -> ViewModel {
        ViewModel::new(
            Session {
                graph: Some(graph),
                comparison: None,
            },
            ViewSettings::default(),
        )
    }

    #[test]
    fn cutoff_filters_and_regroups() {
        let mut model = model(graph(
            &["A", "B", "C", "D"],
            &[(0, 1, 8.0), (1, 2, 3.0), (2, 3, 6.0)],
        ));

        model.set_cutoff(5.0);
        model.rebuild_render_graph();
        let cache = model.graph_cache.as_ref().expect("render graph");
        assert_eq!(cache.nodes.len(), 4);
        assert_eq!(cache.edges.len(), 2);
        assert_eq!(model.clustering.group_count, 2);
        let group_of = |id: &str| cache.nodes[cache.index_by_id[id]].group;
        assert_eq!(group_of("A"), group_of("B"));
        assert_eq!(group_of("C"), group_of("D"));
        assert_ne!(group_of("A"), group_of("C"));
        assert!(cache.nodes[cache.index_by_id["D"]].is_archive);

        model.set_cutoff(7.0);
        model.rebuild_render_graph();
        let cache = model.graph_cache.as_ref().expect("render graph");
        let mut ids = cache.nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
        ids.sort_unstable();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(model.clustering.group_count, 1);
    }

    #[test]
    fn surviving_nodes_keep_their_position() {
        let mut model = model(graph(&["A", "B", "C"], &[(0, 1, 9.0), (1, 2, 4.0)]));
        model.rebuild_render_graph();

        let cache = model.graph_cache.as_mut().expect("render graph");
        let a = cache.index_by_id["A"];
        cache.nodes[a].world_pos = vec2(123.0, -45.0);

        model.set_cutoff(6.0);
        model.rebuild_render_graph();
        assert_eq!(model.node_position("A"), Some(vec2(123.0, -45.0)));
        assert_eq!(model.node_position("C"), None);
    }

    #[test]
    fn unlinked_pair_gets_a_synthetic_edge() {
        let model = model(graph(&["A", "B"], &[]));
        assert!(model.pair_normalized);

        let mut model = model;
        model.rebuild_render_graph();
        let cache = model.graph_cache.as_ref().expect("render graph");
        assert_eq!(cache.nodes.len(), 2);
        assert_eq!(cache.edges.len(), 1);
        assert!(cache.edges[0].synthetic);
        assert_eq!(model.visible_edge_count, 0);
        assert_eq!(model.clustering.group_count, 1);

        model.set_cutoff(0.5);
        model.rebuild_render_graph();
        assert!(model.graph_cache.is_none());
    }

    #[test]
    fn missing_graph_clears_the_render_graph() {
        let mut model = ViewModel::new(
            Session {
                graph: None,
                comparison: None,
            },
            ViewSettings::default(),
        );
        model.rebuild_render_graph();
        assert!(model.graph_cache.is_none());
        assert_eq!(model.clustering.group_count, 0);
    }
}
