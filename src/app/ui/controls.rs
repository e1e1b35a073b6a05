use eframe::egui::{self, Color32, Key, Response, RichText, Ui, vec2};

use crate::report::MAX_SIMILARITY;
use crate::util::short_name;

use super::super::ViewModel;

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;
const GROUP_LIST_ROWS: usize = 40;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Holding an arrow key on a focused slider moves it faster the longer the
/// key is held.
fn apply_slider_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    min: f32,
    max: f32,
    step: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });
    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down {
        hold_state.positive_secs + delta_time
    } else {
        0.0
    };
    hold_state.negative_secs = if decrease_down {
        hold_state.negative_secs + delta_time
    } else {
        0.0
    };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let speed = SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs);
    let old_value = *value;
    *value = (*value + direction as f32 * step * speed * delta_time).clamp(min, max);
    ui.ctx().request_repaint();

    (*value - old_value).abs() > f32::EPSILON
}

fn tuning_slider(ui: &mut Ui, value: &mut f32, min: f32, max: f32, label: &str, hint: &str) {
    let response = ui
        .add(
            egui::Slider::new(&mut *value, min..=max)
                .text(label)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if response.hovered() {
        response.request_focus();
    }
    apply_slider_arrow_acceleration(ui, &response, value, min, max, ((max - min) / 200.0).max(0.0005));
}

impl ViewModel {
    /// Member ids of every group, indexed by group id, each sorted.
    pub(in crate::app) fn group_members(&self) -> Vec<Vec<String>> {
        let mut members = vec![Vec::new(); self.clustering.group_count];
        if let Some(graph) = &self.graph {
            for (&node, &group) in &self.clustering.group_of_node {
                if let (Some(list), Some(submission)) = (members.get_mut(group), graph.nodes.get(node)) {
                    list.push(submission.id.clone());
                }
            }
        }
        for list in &mut members {
            list.sort_unstable();
        }
        members
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Similarity Map");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search submissions")
            .on_hover_text("Fuzzy-highlight submissions whose id matches.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let mut cutoff = self.cutoff;
        let cutoff_slider = ui
            .add(
                egui::Slider::new(&mut cutoff, 0.0..=MAX_SIMILARITY)
                    .step_by(0.1)
                    .text("Similarity cutoff"),
            )
            .on_hover_text("Hide links below this similarity; groups are recomputed.");
        if cutoff_slider.hovered() {
            cutoff_slider.request_focus();
        }
        apply_slider_arrow_acceleration(ui, &cutoff_slider, &mut cutoff, 0.0, MAX_SIMILARITY, 0.05);
        self.set_cutoff(cutoff);

        if self.pair_normalized {
            ui.label(RichText::new("Two submissions: linked for layout").weak());
        }

        ui.separator();

        ui.checkbox(&mut self.live_physics, "Live physics simulation")
            .on_hover_text("Continuously simulate layout forces while viewing the map.");

        ui.collapsing("Physics tuning", |ui| {
            tuning_slider(
                ui,
                &mut self.physics_intensity,
                0.2,
                2.5,
                "Intensity",
                "Overall strength applied to all physics forces.",
            );
            tuning_slider(
                ui,
                &mut self.physics_repulsion,
                0.25,
                2.6,
                "Repulsion",
                "How strongly submissions push away from each other.",
            );
            tuning_slider(
                ui,
                &mut self.physics_spring,
                0.2,
                2.2,
                "Link spring",
                "How strongly similar submissions pull together.",
            );
            tuning_slider(
                ui,
                &mut self.physics_collision,
                0.2,
                2.0,
                "Collision",
                "Extra separation between overlapping nodes.",
            );
            tuning_slider(
                ui,
                &mut self.physics_velocity_damping,
                0.78,
                0.97,
                "Velocity damping",
                "How quickly node movement slows each frame.",
            );
            tuning_slider(
                ui,
                &mut self.physics_group_pull,
                0.0,
                0.08,
                "Group pull",
                "Pull of each group's members toward their centroid.",
            );
            if ui.button("Reset tuning").clicked() {
                self.physics_intensity = self.settings.intensity;
                self.physics_repulsion = self.settings.repulsion;
                self.physics_spring = self.settings.spring;
                self.physics_collision = self.settings.collision;
                self.physics_velocity_damping = self.settings.velocity_damping;
                self.physics_group_pull = self.settings.group_pull;
            }
        });

        ui.separator();
        ui.label(format!("Groups ({})", self.clustering.group_count));

        let members = self.group_members();
        let mut focus = None;
        egui::ScrollArea::vertical()
            .id_salt("group_list")
            .show(ui, |ui| {
                for (group, ids) in members.iter().enumerate().take(GROUP_LIST_ROWS) {
                    let color = self
                        .clustering
                        .colors
                        .get(group)
                        .copied()
                        .unwrap_or(Color32::GRAY);
                    ui.horizontal(|ui| {
                        let (swatch, _) = ui.allocate_exact_size(vec2(10.0, 10.0), egui::Sense::hover());
                        ui.painter().circle_filled(swatch.center(), 5.0, color);
                        let preview = ids
                            .iter()
                            .take(3)
                            .map(|id| short_name(id))
                            .collect::<Vec<_>>()
                            .join(", ");
                        let label = format!("#{group} ({})  {preview}", ids.len());
                        if ui.link(label).clicked()
                            && let Some(first) = ids.first()
                        {
                            focus = Some(first.clone());
                        }
                    });
                }
                if members.len() > GROUP_LIST_ROWS {
                    ui.label(format!("... and {} more", members.len() - GROUP_LIST_ROWS));
                }
            });

        if let Some(id) = focus {
            self.focus_on(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::slider_key_accel_multiplier;

    #[test]
    fn acceleration_ramps_and_saturates() {
        assert_eq!(slider_key_accel_multiplier(0.0), 1.0);
        assert!(slider_key_accel_multiplier(0.5) > slider_key_accel_multiplier(0.1));
        assert_eq!(slider_key_accel_multiplier(60.0), 40.0);
    }
}
