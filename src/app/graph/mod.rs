mod build;
mod interaction;
mod view;

use std::collections::{HashMap, HashSet};

use super::NodeUiState;

/// Rebuilds the per-node interaction flags from the current selection, hover
/// target, selected node's neighbours and search hits.
pub(super) fn node_ui_snapshot<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    selected: Option<&str>,
    hovered: Option<&str>,
    neighbors: &HashSet<String>,
    search_matches: Option<&HashSet<String>>,
) -> HashMap<String, NodeUiState> {
    ids.into_iter()
        .filter_map(|id| {
            let state = NodeUiState {
                focused: selected == Some(id),
                hovered: hovered == Some(id),
                neighbor: neighbors.contains(id),
                search_match: search_matches.is_some_and(|matches| matches.contains(id)),
            };
            (state != NodeUiState::default()).then(|| (id.to_owned(), state))
        })
        .collect()
}
