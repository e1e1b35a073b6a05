use eframe::egui::{self, Color32, Key, Label, RichText, ScrollArea, Sense, TextStyle, Ui};

use crate::cluster::color_for;
use crate::spans::{FragmentId, HighlightState, PassModel, Side, SpanId};
use crate::util::{percent, short_name};

use super::super::ViewModel;
use super::super::compare::CompareView;
use super::super::render_utils::{blend_color, dim_color};

const IGNORED_TEXT: Color32 = Color32::from_gray(110);

/// Background and text color of one fragment.
fn fragment_style(
    model: &PassModel,
    span: Option<SpanId>,
    ignored: bool,
) -> (Option<Color32>, Option<Color32>) {
    let Some(span) = span else {
        return (None, ignored.then_some(IGNORED_TEXT));
    };
    let group_color = model
        .index
        .group_of(span)
        .map(|group| color_for(group, model.index.group_count()))
        .unwrap_or(Color32::GRAY);

    match model.highlight.state(&model.index, span) {
        HighlightState::Selected => (Some(group_color), Some(Color32::BLACK)),
        HighlightState::Highlighted => (
            Some(blend_color(group_color, Color32::WHITE, 0.25)),
            Some(Color32::BLACK),
        ),
        HighlightState::Active => (Some(dim_color(group_color, 0.7)), None),
        HighlightState::Inactive => (
            Some(Color32::from_rgba_unmultiplied(
                group_color.r(),
                group_color.g(),
                group_color.b(),
                48,
            )),
            None,
        ),
    }
}

#[derive(Default)]
struct PaneEvents {
    hovered: Option<FragmentId>,
    clicked: Option<FragmentId>,
}

fn draw_pane(ui: &mut Ui, view: &mut CompareView, side: Side, row_height: f32) -> PaneEvents {
    let mut events = PaneEvents::default();
    let Some(ordinal) = view.shown(side) else {
        ui.label("No files on this side.");
        return events;
    };

    let spans = view.fragment_spans(ordinal).to_vec();
    let pending = view.take_pending_scroll(side);
    let Some(model) = view.model() else {
        return events;
    };
    let Some(document) = model.documents.get(ordinal) else {
        return events;
    };

    if let Some(error) = &document.slice_error {
        ui.colored_label(
            Color32::from_rgb(230, 170, 80),
            format!("Matches not shown: {error}"),
        );
    }

    let mut area = ScrollArea::both()
        .id_salt(("compare_pane", side == Side::Left, ordinal))
        .auto_shrink([false, false]);
    if let Some(offset) = pending {
        area = area.vertical_scroll_offset(offset);
    }

    let gutter = document.line_count().to_string().len();
    let output = area.show_rows(ui, row_height, document.line_count(), |ui, rows| {
        for line in rows {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                ui.label(
                    RichText::new(format!("{:>gutter$}  ", line + 1))
                        .monospace()
                        .weak(),
                );
                for piece in document.line(line) {
                    let fragment = FragmentId {
                        document: ordinal,
                        index: piece.fragment,
                    };
                    let span = spans.get(piece.fragment).copied().flatten();
                    let ignored = document
                        .fragments
                        .get(piece.fragment)
                        .is_some_and(|fragment| fragment.ignored);
                    let (background, foreground) = fragment_style(model, span, ignored);

                    let mut text = RichText::new(document.piece_text(piece)).monospace();
                    if let Some(background) = background {
                        text = text.background_color(background);
                    }
                    if let Some(foreground) = foreground {
                        text = text.color(foreground);
                    }
                    if ignored {
                        text = text.italics();
                    }

                    let response = ui.add(
                        Label::new(text)
                            .sense(Sense::click())
                            .selectable(false)
                            .extend(),
                    );
                    if response.hovered() {
                        events.hovered = Some(fragment);
                    }
                    if response.clicked() {
                        events.clicked = Some(fragment);
                    }
                }
            });
        }
    });

    view.observe_scroll(side, output.state.offset.y);
    events
}

fn draw_file_picker(ui: &mut Ui, view: &mut CompareView, side: Side) {
    let Some(model) = view.model() else {
        return;
    };
    let shown = view.shown(side);
    let files = model
        .documents_on(side)
        .map(|(ordinal, document)| (ordinal, short_name(&document.name).to_owned()))
        .collect::<Vec<_>>();
    let current = files
        .iter()
        .find(|(ordinal, _)| Some(*ordinal) == shown)
        .map_or_else(String::new, |(_, name)| name.clone());

    let mut picked = None;
    egui::ComboBox::from_id_salt(("file_picker", side == Side::Left))
        .selected_text(current)
        .width(220.0)
        .show_ui(ui, |ui| {
            for (ordinal, name) in &files {
                if ui.selectable_label(Some(*ordinal) == shown, name).clicked() {
                    picked = Some(*ordinal);
                }
            }
        });
    if let Some(ordinal) = picked {
        view.show_document(side, ordinal);
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_comparison(&mut self, ui: &mut Ui) {
        let Some(view) = self.compare.as_mut() else {
            ui.label("No comparison loaded.");
            return;
        };
        let now = ui.ctx().input(|input| input.time);

        let passes = view
            .comparison()
            .passes
            .iter()
            .map(|pass| pass.name.clone())
            .collect::<Vec<_>>();
        let left_id = view.comparison().left.id.clone();
        let right_id = view.comparison().right.id.clone();

        ui.horizontal(|ui| {
            ui.label("Pass");
            let mut picked = None;
            egui::ComboBox::from_id_salt("pass_picker")
                .selected_text(passes.get(view.pass_index()).cloned().unwrap_or_default())
                .show_ui(ui, |ui| {
                    for (index, name) in passes.iter().enumerate() {
                        if ui
                            .selectable_label(index == view.pass_index(), name)
                            .clicked()
                        {
                            picked = Some(index);
                        }
                    }
                });
            if let Some(index) = picked
                && index != view.pass_index()
            {
                view.switch_pass(index);
            }

            let summary = view.summary();
            ui.separator();
            ui.label(format!(
                "{} groups, {} spans  |  {left_id}: {}  |  {right_id}: {}",
                summary.groups,
                summary.spans,
                percent(summary.left_coverage),
                percent(summary.right_coverage)
            ));
        });

        ui.horizontal(|ui| {
            if ui.button("Previous match").on_hover_text("P").clicked() {
                view.previous_group(now);
            }
            if ui.button("Next match").on_hover_text("N").clicked() {
                view.next_group(now);
            }
            if ui.button("Align other side").on_hover_text("Space").clicked() {
                view.align_other(now);
            }
            if ui.button("Clear").on_hover_text("Escape").clicked() {
                view.clear();
            }
            if let Some(selection) = view.selection() {
                ui.separator();
                ui.label(format!("group #{}", selection.group));
            }
        });
        ui.separator();

        if !ui.ctx().wants_keyboard_input() {
            let (next, previous, clear, align) = ui.input(|input| {
                (
                    input.key_pressed(Key::N),
                    input.key_pressed(Key::P),
                    input.key_pressed(Key::Escape),
                    input.key_pressed(Key::Space),
                )
            });
            if next {
                view.next_group(now);
            }
            if previous {
                view.previous_group(now);
            }
            if clear {
                view.clear();
            }
            if align {
                view.align_other(now);
            }
        }

        if view.tick(now) {
            ui.ctx().request_repaint();
        }

        let row_height = ui.text_style_height(&TextStyle::Monospace);
        view.set_row_pitch(row_height + ui.spacing().item_spacing.y);

        let mut events = Vec::with_capacity(2);
        ui.columns(2, |columns| {
            for (column, (side, title)) in columns
                .iter_mut()
                .zip([(Side::Left, &left_id), (Side::Right, &right_id)])
            {
                column.horizontal(|ui| {
                    ui.strong(title.as_str());
                    draw_file_picker(ui, view, side);
                });
                events.push(draw_pane(column, view, side, row_height));
            }
        });

        let hovered = events.iter().find_map(|events| events.hovered);
        view.hover(hovered);
        if let Some(fragment) = events.iter().find_map(|events| events.clicked) {
            view.click(fragment, now);
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Color32;

    use crate::report::{Comparison, PassData, SourceFile, Submission};
    use crate::spans::{MemoKeying, PassModel, Span};

    use super::{IGNORED_TEXT, fragment_style};

    fn model() -> PassModel {
        let file = |id: &str| SourceFile {
            id: id.to_string(),
            name: id.to_string(),
            content: "abcdefghij".to_string(),
        };
        let span = |file: &str| Span {
            key: None,
            sub_id: file.to_string(),
            file_id: file.to_string(),
            start: 2,
            end: 5,
        };
        let comparison = Comparison {
            left: Submission {
                id: "l".into(),
                files: vec![file("l1")],
            },
            right: Submission {
                id: "r".into(),
                files: vec![file("r1")],
            },
            passes: vec![PassData {
                name: "p".into(),
                groups: vec![vec![span("l1"), span("r1")]],
                ignored: Vec::new(),
            }],
        };
        PassModel::build(&comparison, &comparison.passes[0], MemoKeying::Range)
    }

    #[test]
    fn unmatched_text_is_plain_and_ignored_text_is_muted() {
        let model = model();
        assert_eq!(fragment_style(&model, None, false), (None, None));
        assert_eq!(fragment_style(&model, None, true), (None, Some(IGNORED_TEXT)));
    }

    #[test]
    fn selection_changes_the_fragment_style() {
        let mut model = model();
        let (idle, _) = fragment_style(&model, Some(0), false);
        assert_eq!(idle.map(|color| color.a()), Some(48));

        model.highlight.select_span(&model.index, 0);
        let (selected, text) = fragment_style(&model, Some(0), false);
        assert_eq!(text, Some(Color32::BLACK));
        assert_ne!(selected, idle);
        let (_, partner_text) = fragment_style(&model, Some(1), false);
        assert_eq!(partner_text, Some(Color32::BLACK));
    }
}
