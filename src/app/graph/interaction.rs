use eframe::egui::{self, Pos2, Rect, Ui};
use log::debug;

use super::super::render_utils::{circle_visible, screen_to_world};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.08, 5.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
            || response.dragged_by(egui::PointerButton::Primary)
        {
            self.pan += response.drag_delta();
        }
    }

    pub(in crate::app) fn visible_indices_into(
        rect: Rect,
        screen_positions: &[Pos2],
        screen_radii: &[f32],
        out: &mut Vec<usize>,
    ) {
        out.clear();
        out.extend(
            (0..screen_positions.len())
                .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index])),
        );
    }

    /// Closest visible node under the pointer, with its distance.
    pub(in crate::app) fn hovered_index(
        ui: &Ui,
        visible_indices: &[usize],
        screen_positions: &[Pos2],
        screen_radii: &[f32],
    ) -> Option<(usize, f32)> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        visible_indices
            .iter()
            .filter_map(|&index| {
                let distance = screen_positions[index].distance(pointer);
                (distance <= screen_radii[index]).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Focuses a submission; `None` clears the focus.
    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        if self.selected == selected {
            return;
        }
        debug!("map selection: {selected:?}");
        self.selected = selected;
    }

    /// Moves the camera so `id` sits in the middle of the map.
    pub(in crate::app) fn focus_on(&mut self, id: &str) {
        if let Some(world) = self.node_position(id) {
            self.pan = -(world * self.zoom);
        }
        self.set_selected(Some(id.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{Pos2, Rect, pos2, vec2};

    use crate::app::ViewModel;

    #[test]
    fn only_circles_inside_the_view_are_visible() {
        let rect = Rect::from_min_size(Pos2::ZERO, vec2(100.0, 100.0));
        let positions = [pos2(50.0, 50.0), pos2(-30.0, 50.0), pos2(104.0, 50.0)];
        let radii = [4.0, 4.0, 6.0];
        let mut visible = vec![99];
        ViewModel::visible_indices_into(rect, &positions, &radii, &mut visible);
        assert_eq!(visible, [0, 2]);
    }
}
