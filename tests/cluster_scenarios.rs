use std::collections::{HashMap, HashSet};

use simlens::cluster::{Clustering, apply, color_for, normalize_pair_graph};
use simlens::report::{SimilarityGraph, SimilarityLink, SubmissionNode};

fn graph(ids: &[&str], links: &[(usize, usize, f32)]) -> SimilarityGraph {
    SimilarityGraph::new(
        ids.iter()
            .map(|id| SubmissionNode {
                id: id.to_string(),
                is_archive: false,
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

fn chain() -> SimilarityGraph {
    graph(
        &["A", "B", "C", "D", "E"],
        &[(0, 1, 8.0), (1, 2, 3.0), (2, 3, 6.0), (3, 4, 6.0)],
    )
}

#[test]
fn raising_the_cutoff_splits_groups() {
    let graph = chain();

    let low = Clustering::compute(&graph, 2.0);
    assert_eq!(low.group_count, 1);
    assert_eq!(low.filtered.nodes.len(), 5);

    let mid = Clustering::compute(&graph, 5.0);
    assert_eq!(mid.group_count, 2);
    assert_eq!(mid.group_of(0), mid.group_of(1));
    assert_eq!(mid.group_of(2), mid.group_of(4));
    assert_ne!(mid.group_of(0), mid.group_of(2));
    assert_eq!(mid.group_size(mid.group_of(2).expect("grouped")), 3);

    let high = Clustering::compute(&graph, 7.0);
    assert_eq!(high.group_count, 1);
    assert_eq!(high.filtered.nodes, vec![0, 1]);
    assert_eq!(high.group_of(3), None);
}

#[test]
fn weak_link_drops_out_above_its_value() {
    let graph = graph(&["A", "B", "C", "D"], &[(0, 1, 9.0), (2, 3, 3.0)]);

    let all = Clustering::compute(&graph, 0.0).groups_by_id(&graph);
    let expected = HashMap::from([
        ("A".to_string(), 0),
        ("B".to_string(), 0),
        ("C".to_string(), 1),
        ("D".to_string(), 1),
    ]);
    assert_eq!(all, expected);

    let strong = Clustering::compute(&graph, 5.0).groups_by_id(&graph);
    let expected = HashMap::from([("A".to_string(), 0), ("B".to_string(), 0)]);
    assert_eq!(strong, expected);
}

#[test]
fn filtering_is_monotone() {
    let graph = chain();
    let mut previous: Option<(HashSet<usize>, HashSet<usize>)> = None;
    for step in 0..=10 {
        let filtered = apply(&graph, step as f32);
        let nodes = filtered.nodes.iter().copied().collect::<HashSet<_>>();
        let links = filtered.links.iter().copied().collect::<HashSet<_>>();
        if let Some((prev_nodes, prev_links)) = &previous {
            assert!(nodes.is_subset(prev_nodes));
            assert!(links.is_subset(prev_links));
        }
        previous = Some((nodes, links));
    }
}

#[test]
fn every_kept_node_has_exactly_one_group_and_a_color() {
    let graph = chain();
    let clustering = Clustering::compute(&graph, 5.0);
    for &node in &clustering.filtered.nodes {
        let group = clustering.group_of(node).expect("kept node is grouped");
        assert!(group < clustering.group_count);
        assert_eq!(
            clustering.color_of(node),
            Some(color_for(group, clustering.group_count))
        );
    }

    let by_id = clustering.groups_by_id(&graph);
    assert_eq!(by_id.len(), 5);
    assert_eq!(by_id["A"], by_id["B"]);
}

#[test]
fn two_submission_graph_is_linked_for_layout() {
    let mut pair = graph(&["left", "right"], &[]);
    assert!(normalize_pair_graph(&mut pair));
    assert!(!normalize_pair_graph(&mut pair));
    assert_eq!(pair.link_count(), 0);
    assert!(pair.neighbors_above("left", 0.0).is_empty());

    let clustering = Clustering::compute(&pair, 0.0);
    assert_eq!(clustering.group_count, 1);
    assert_eq!(clustering.filtered.links.len(), 1);

    let strict = Clustering::compute(&pair, 0.1);
    assert_eq!(strict.group_count, 0);
    assert!(strict.filtered.nodes.is_empty());
}

#[test]
fn linked_pairs_and_larger_graphs_are_left_alone() {
    let mut linked = graph(&["a", "b"], &[(0, 1, 4.0)]);
    assert!(!normalize_pair_graph(&mut linked));
    let mut trio = graph(&["a", "b", "c"], &[]);
    assert!(!normalize_pair_graph(&mut trio));
    assert!(trio.links.is_empty());
}
