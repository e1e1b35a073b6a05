use eframe::egui::{self, RichText, Ui};

use crate::util::short_name;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(graph) = &self.graph else {
            ui.label("No similarity graph loaded.");
            return;
        };
        let Some(selected_id) = self.selected.clone() else {
            ui.label("Select a submission on the map.");
            return;
        };
        let Some(node) = graph.node(&selected_id) else {
            ui.label("Selected submission is not part of the graph.");
            return;
        };
        let Some(&node_index) = graph.index_by_id.get(&selected_id) else {
            return;
        };

        ui.label(RichText::new(short_name(&node.id)).strong());
        ui.small(node.id.as_str());
        ui.add_space(6.0);

        ui.label(if node.is_archive {
            "Archive submission (reference material)"
        } else {
            "Regular submission"
        });

        match self.clustering.group_of(node_index) {
            Some(group) => {
                ui.horizontal(|ui| {
                    if let Some(color) = self.clustering.color_of(node_index) {
                        ui.label(RichText::new("●").color(color));
                    }
                    ui.label(format!(
                        "Group #{group} with {} submissions",
                        self.clustering.group_size(group)
                    ));
                });
            }
            None => {
                ui.label(format!("No links at or above cutoff {:.1}", self.cutoff));
            }
        }

        let neighbors = graph.neighbors_above(&selected_id, self.cutoff);

        ui.separator();
        ui.label(RichText::new(format!("Similar submissions ({})", neighbors.len())).strong());
        let mut next_selection = None;
        egui::ScrollArea::vertical()
            .id_salt("neighbor_scroll")
            .auto_shrink([false, false])
            .show_rows(ui, 22.0, neighbors.len(), |ui, row_range| {
                for (id, value) in &neighbors[row_range] {
                    let label = format!("{}  {value:.2}", short_name(id));
                    if ui.link(label).on_hover_text(id.as_str()).clicked() {
                        next_selection = Some(id.clone());
                    }
                }
            });

        ui.separator();
        if ui.button("Clear selection").clicked() {
            self.set_selected(None);
        }
        if let Some(id) = next_selection {
            self.focus_on(&id);
        }
    }
}
