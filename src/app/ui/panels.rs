use std::collections::HashMap;

use eframe::egui::{self, Align, Context, Layout, Vec2};

use crate::cluster::{Clustering, normalize_pair_graph};
use crate::report::{Session, SessionSource};
use crate::settings::ViewSettings;

use super::super::{CompareView, Tab, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(session: Session, settings: ViewSettings) -> Self {
        let Session {
            mut graph,
            comparison,
        } = session;
        let pair_normalized = graph.as_mut().is_some_and(normalize_pair_graph);
        let compare = comparison.map(|comparison| {
            CompareView::new(
                comparison,
                settings.memo_keying,
                settings.scroll_animation_secs,
            )
        });
        let tab = if graph.is_none() && compare.is_some() {
            Tab::Comparison
        } else {
            Tab::Map
        };

        Self {
            tab,
            graph,
            pair_normalized,
            clustering: Clustering::default(),
            cutoff: settings.cutoff,
            search: String::new(),
            selected: None,
            hovered: None,
            pan: Vec2::ZERO,
            zoom: 1.0,
            live_physics: settings.live_physics,
            physics_intensity: settings.intensity,
            physics_repulsion: settings.repulsion,
            physics_spring: settings.spring,
            physics_collision: settings.collision,
            physics_velocity_damping: settings.velocity_damping,
            physics_group_pull: settings.group_pull,
            graph_dirty: true,
            render_graph_revision: 0,
            graph_cache: None,
            search_match_cache: None,
            visible_node_count: 0,
            visible_edge_count: 0,
            node_ui: HashMap::new(),
            compare,
            settings,
        }
    }

    fn visible_graph_text(&self) -> Option<String> {
        let graph = self.graph.as_ref()?;
        Some(format!(
            "visible {} / {} nodes, {} links, {} groups",
            self.visible_node_count,
            graph.node_count(),
            self.visible_edge_count,
            self.clustering.group_count
        ))
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &SessionSource,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        if self.graph_dirty {
            self.rebuild_render_graph();
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("simlens");
                    ui.separator();
                    ui.add_enabled_ui(self.graph.is_some(), |ui| {
                        ui.selectable_value(&mut self.tab, Tab::Map, "Similarity map");
                    });
                    ui.add_enabled_ui(self.compare.is_some(), |ui| {
                        ui.selectable_value(&mut self.tab, Tab::Comparison, "Comparison");
                    });
                    ui.separator();
                    ui.label(source.describe());
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if self.tab == Tab::Map
                            && let Some(text) = self.visible_graph_text()
                        {
                            ui.label(text);
                        }
                    });
                });
            });

        if is_loading {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.heading("Reloading comparator output...");
                    ui.add_space(8.0);
                    ui.spinner();
                });
            });
            return;
        }

        match self.tab {
            Tab::Map => {
                egui::SidePanel::left("controls")
                    .resizable(true)
                    .default_width(320.0)
                    .show(ctx, |ui| self.draw_controls(ui));

                egui::SidePanel::right("details")
                    .resizable(true)
                    .default_width(320.0)
                    .show(ctx, |ui| self.draw_details(ui));

                egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
            }
            Tab::Comparison => {
                egui::CentralPanel::default().show(ctx, |ui| self.draw_comparison(ui));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::app::{Tab, ViewModel};
    use crate::report::{Comparison, Session, Submission};
    use crate::settings::ViewSettings;

    fn empty_comparison() -> Comparison {
        Comparison {
            left: Submission {
                id: "left".into(),
                files: Vec::new(),
            },
            right: Submission {
                id: "right".into(),
                files: Vec::new(),
            },
            passes: Vec::new(),
        }
    }

    #[test]
    fn comparison_only_sessions_open_on_the_comparison_tab() {
        let model = ViewModel::new(
            Session {
                graph: None,
                comparison: Some(empty_comparison()),
            },
            ViewSettings::default(),
        );
        assert_eq!(model.tab, Tab::Comparison);
        assert!(model.compare.is_some());
        assert!(!model.pair_normalized);
    }

    #[test]
    fn settings_seed_the_view() {
        let settings = ViewSettings::default().with_cutoff(Some(4.5));
        let model = ViewModel::new(
            Session {
                graph: None,
                comparison: None,
            },
            settings,
        );
        assert_eq!(model.tab, Tab::Map);
        assert_eq!(model.cutoff, 4.5);
        assert!(model.graph_dirty);
    }
}
