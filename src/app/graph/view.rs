use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::short_name;

use super::super::physics::step_physics;
use super::super::render_utils::{
    blend_color, dim_color, draw_background, edge_strength, edge_visible, world_to_screen,
};
use super::super::{PhysicsConfig, RenderGraph, SearchMatchCache, ViewModel};
use super::node_ui_snapshot;

const FOCUS_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const SEARCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Ids of `ids` that fuzzy-match `query`, on the full id or its basename.
pub(in crate::app) fn search_matches<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    query: &str,
) -> HashSet<String> {
    let matcher = SkimMatcherV2::default();
    ids.into_iter()
        .filter(|id| {
            fuzzy_match_score(&matcher, short_name(id), query).is_some()
                || fuzzy_match_score(&matcher, id, query).is_some()
        })
        .map(str::to_owned)
        .collect()
}

impl ViewModel {
    fn update_screen_space(rect: Rect, pan: Vec2, zoom: f32, cache: &mut RenderGraph) {
        let scratch = &mut cache.view_scratch;
        scratch.screen_positions.clear();
        scratch.screen_radii.clear();
        for node in &cache.nodes {
            scratch
                .screen_positions
                .push(world_to_screen(rect, pan, zoom, node.world_pos));
            scratch
                .screen_radii
                .push((node.base_radius * zoom.powf(0.40)).clamp(2.5, 46.0));
        }
    }

    pub(in crate::app) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<String>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.graph_revision == self.render_graph_revision
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let cache = self.graph_cache.as_ref()?;
        let matches = Arc::new(search_matches(
            cache.nodes.iter().map(|node| node.id.as_str()),
            query,
        ));

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            graph_revision: self.render_graph_revision,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    /// Refreshes `node_ui` for this frame.
    fn refresh_node_ui(&mut self, search: Option<&HashSet<String>>) {
        let neighbors = match (&self.graph, &self.selected) {
            (Some(graph), Some(selected)) => graph
                .neighbors_above(selected, self.cutoff)
                .into_iter()
                .map(|(id, _)| id)
                .collect(),
            _ => HashSet::new(),
        };
        let Some(cache) = self.graph_cache.as_ref() else {
            self.node_ui.clear();
            return;
        };
        self.node_ui = node_ui_snapshot(
            cache.nodes.iter().map(|node| node.id.as_str()),
            self.selected.as_deref(),
            self.hovered.as_deref(),
            &neighbors,
            search,
        );
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);

        let search = self.cached_search_matches();
        let pan = self.pan;
        let zoom = self.zoom;
        let interaction_active = response.dragged();
        let delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);
        let physics = PhysicsConfig {
            intensity: self.physics_intensity,
            repulsion_scale: self.physics_repulsion,
            spring_scale: self.physics_spring,
            collision_scale: self.physics_collision,
            velocity_damping: self.physics_velocity_damping,
            group_pull: self.physics_group_pull,
            delta_seconds,
        };

        let Some(cache) = self.graph_cache.as_mut() else {
            self.visible_node_count = 0;
            self.visible_edge_count = 0;
            self.hovered = None;
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                if self.graph.is_some() {
                    "No links meet the current similarity cutoff."
                } else {
                    "No similarity graph loaded."
                },
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        };

        let mut physics_moving = false;
        if self.live_physics {
            physics_moving = step_physics(cache, physics);
        }
        if physics_moving || interaction_active {
            ui.ctx().request_repaint();
        }

        Self::update_screen_space(rect, pan, zoom, cache);
        let scratch = &mut cache.view_scratch;
        Self::visible_indices_into(
            rect,
            &scratch.screen_positions,
            &scratch.screen_radii,
            &mut scratch.visible_indices,
        );
        scratch.visible_mask.clear();
        scratch.visible_mask.resize(cache.nodes.len(), false);
        for &index in &scratch.visible_indices {
            scratch.visible_mask[index] = true;
        }
        self.visible_node_count = scratch.visible_indices.len();

        let hovered = Self::hovered_index(
            ui,
            &scratch.visible_indices,
            &scratch.screen_positions,
            &scratch.screen_radii,
        )
        .map(|(index, _)| index);
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }
        let hovered_id = hovered.and_then(|index| cache.nodes.get(index)).map(|node| node.id.clone());
        let pending_selection = response
            .clicked_by(egui::PointerButton::Primary)
            .then(|| hovered_id.clone());

        self.hovered = hovered_id;
        self.refresh_node_ui(search.as_deref());

        let Some(cache) = self.graph_cache.as_ref() else {
            return;
        };
        let scratch = &cache.view_scratch;
        let focus_active = self.selected.is_some();
        let search_active = search.as_ref().is_some_and(|matches| !matches.is_empty());
        let zoom_sqrt = zoom.sqrt();

        let mut visible_edge_count = 0usize;
        for edge in &cache.edges {
            if edge.synthetic {
                continue;
            }
            let start = scratch.screen_positions[edge.source];
            let end = scratch.screen_positions[edge.target];
            if !scratch.visible_mask[edge.source]
                && !scratch.visible_mask[edge.target]
                && !edge_visible(rect, start, end, 2.5)
            {
                continue;
            }

            let source = &cache.nodes[edge.source];
            let target = &cache.nodes[edge.target];
            let touches_focus = [source, target].iter().any(|node| {
                self.node_ui
                    .get(&node.id)
                    .is_some_and(|state| state.focused || state.hovered)
            });

            let strength = edge_strength(edge.value);
            let base = blend_color(
                Color32::from_rgba_unmultiplied(90, 96, 108, 150),
                source.color,
                0.35,
            );
            let (width, color) = if touches_focus {
                ((1.4 + strength * 2.6) * zoom_sqrt, blend_color(base, FOCUS_COLOR, 0.7))
            } else if focus_active {
                ((0.6 + strength) * zoom_sqrt, dim_color(base, 0.45))
            } else {
                ((0.8 + strength * 2.2) * zoom_sqrt, base)
            };

            painter.line_segment([start, end], Stroke::new(width.clamp(0.4, 6.0), color));
            visible_edge_count += 1;
        }
        self.visible_edge_count = visible_edge_count;

        let mut focus_animating = false;
        for &index in &scratch.draw_order {
            if !scratch.visible_mask.get(index).copied().unwrap_or(false) {
                continue;
            }

            let node = &cache.nodes[index];
            let position = scratch.screen_positions[index];
            let radius = scratch.screen_radii[index];
            let state = self.node_ui.get(&node.id).copied().unwrap_or_default();

            let base_color = if state.hovered {
                blend_color(node.color, Color32::WHITE, 0.35)
            } else if state.neighbor {
                node.color
            } else if state.search_match {
                blend_color(node.color, SEARCH_COLOR, 0.6)
            } else if focus_active {
                dim_color(node.color, 0.5)
            } else if search_active {
                dim_color(node.color, 0.4)
            } else {
                node.color
            };

            let focus_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("node-focus", node.id.as_str())),
                state.focused,
            );
            if focus_mix > 0.0 && focus_mix < 1.0 {
                focus_animating = true;
            }

            painter.circle_filled(position, radius, blend_color(base_color, FOCUS_COLOR, focus_mix * 0.5));
            if focus_mix > 0.0 {
                painter.circle_stroke(
                    position,
                    radius + 4.0 + ((1.0 - focus_mix) * 6.0),
                    Stroke::new(
                        1.2 + focus_mix,
                        Color32::from_rgba_unmultiplied(245, 206, 93, (60.0 + focus_mix * 140.0) as u8),
                    ),
                );
            }
            if node.is_archive {
                painter.circle_stroke(
                    position,
                    radius + 2.0,
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(220, 220, 230, 160)),
                );
            }
            painter.circle_stroke(
                position,
                radius,
                Stroke::new(
                    if state.search_match { 1.6 } else { 1.0 },
                    Color32::from_rgba_unmultiplied(15, 15, 15, 190),
                ),
            );

            let draw_label = state.focused
                || state.hovered
                || state.neighbor
                || (state.search_match && zoom > 0.35)
                || zoom > 1.35;
            if draw_label {
                painter.text(
                    position + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_name(&node.id),
                    FontId::proportional(12.0),
                    Color32::from_gray(238),
                );
            }
        }

        if focus_animating {
            ui.ctx().request_repaint();
        }

        if let Some(index) = hovered
            && let Some(node) = cache.nodes.get(index)
        {
            let group = node
                .group
                .map_or_else(|| "ungrouped".to_owned(), |group| format!("group {group}"));
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                format!("{}  |  {group}", node.id),
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if let Some(selected) = pending_selection {
            self.set_selected(selected);
        }
    }
}
