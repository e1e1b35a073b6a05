use std::collections::HashMap;

use log::{debug, info};

use crate::report::Comparison;
use crate::spans::{
    FragmentId, MemoKeying, PassModel, PassSummary, PositionLookup, ScrollAnimator, Selection,
    Side, SpanId, align, offset_for,
};

const CONTEXT_LINES: f32 = 3.0;

fn slot(side: Side) -> usize {
    match side {
        Side::Left => 0,
        Side::Right => 1,
    }
}

/// Layout of the two document panes as the last frame left it. Rows have a
/// fixed pitch, so span tops follow from line numbers.
struct PaneLayout<'a> {
    model: &'a PassModel,
    shown: [Option<usize>; 2],
    scroll: [f32; 2],
    row_pitch: f32,
}

impl PositionLookup for PaneLayout<'_> {
    fn span_top(&self, span: SpanId) -> Option<f32> {
        let span = self.model.index.span(span)?;
        let document = self.model.documents.get(self.model.document_of(&span.file_id)?)?;
        Some(document.line_of(span.start) as f32 * self.row_pitch)
    }

    fn scroll_offset(&self, file_id: &str) -> Option<f32> {
        let ordinal = self.model.document_of(file_id)?;
        let side = slot(self.model.documents.get(ordinal)?.side);
        (self.shown[side] == Some(ordinal)).then_some(self.scroll[side])
    }
}

/// State of the side-by-side comparison: current pass model, which file each
/// side shows, and the scroll requests the panes should apply.
pub(in crate::app) struct CompareView {
    comparison: Comparison,
    keying: MemoKeying,
    pass_index: usize,
    model: Option<PassModel>,
    summary: PassSummary,
    shown: [Option<usize>; 2],
    scroll: [f32; 2],
    pending_scroll: [Option<f32>; 2],
    animator: ScrollAnimator<Side>,
    animation_secs: f64,
    resolved: HashMap<usize, Vec<Option<SpanId>>>,
    selection: Option<Selection>,
    row_pitch: f32,
}

impl CompareView {
    pub(in crate::app) fn new(comparison: Comparison, keying: MemoKeying, animation_secs: f64) -> Self {
        let mut view = Self {
            comparison,
            keying,
            pass_index: 0,
            model: None,
            summary: PassSummary::default(),
            shown: [None, None],
            scroll: [0.0, 0.0],
            pending_scroll: [None, None],
            animator: ScrollAnimator::default(),
            animation_secs,
            resolved: HashMap::new(),
            selection: None,
            row_pitch: 18.0,
        };
        view.switch_pass(0);
        view
    }

    pub(in crate::app) fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    pub(in crate::app) fn model(&self) -> Option<&PassModel> {
        self.model.as_ref()
    }

    pub(in crate::app) fn summary(&self) -> PassSummary {
        self.summary
    }

    pub(in crate::app) fn pass_index(&self) -> usize {
        self.pass_index
    }

    pub(in crate::app) fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub(in crate::app) fn shown(&self, side: Side) -> Option<usize> {
        self.shown[slot(side)]
    }

    /// Rebuilds the pass model and drops every piece of transient state tied
    /// to the previous pass.
    pub(in crate::app) fn switch_pass(&mut self, pass_index: usize) {
        self.animator.cancel();
        self.resolved.clear();
        self.selection = None;
        self.pending_scroll = [Some(0.0), Some(0.0)];
        self.scroll = [0.0, 0.0];

        let Some(pass) = self.comparison.passes.get(pass_index) else {
            self.model = None;
            self.summary = PassSummary::default();
            self.shown = [None, None];
            return;
        };

        let model = PassModel::build(&self.comparison, pass, self.keying);
        self.summary = model.summary();
        self.shown = [
            model.documents_on(Side::Left).map(|(ordinal, _)| ordinal).next(),
            model.documents_on(Side::Right).map(|(ordinal, _)| ordinal).next(),
        ];
        info!(
            "switched to pass {} ({} groups)",
            model.name,
            model.index.group_count()
        );
        self.pass_index = pass_index;
        self.model = Some(model);
    }

    /// User picked a file for one side; any running scroll is abandoned.
    pub(in crate::app) fn show_document(&mut self, side: Side, ordinal: usize) {
        let belongs = self
            .model
            .as_ref()
            .and_then(|model| model.documents.get(ordinal))
            .is_some_and(|document| document.side == side);
        if !belongs || self.shown[slot(side)] == Some(ordinal) {
            return;
        }
        self.animator.cancel();
        self.shown[slot(side)] = Some(ordinal);
        self.request_scroll(side, 0.0);
    }

    pub(in crate::app) fn set_row_pitch(&mut self, row_pitch: f32) {
        if row_pitch.is_finite() && row_pitch > 0.0 {
            self.row_pitch = row_pitch;
        }
    }

    pub(in crate::app) fn observe_scroll(&mut self, side: Side, offset: f32) {
        if self.pending_scroll[slot(side)].is_none() {
            self.scroll[slot(side)] = offset;
        }
    }

    pub(in crate::app) fn take_pending_scroll(&mut self, side: Side) -> Option<f32> {
        self.pending_scroll[slot(side)].take()
    }

    fn request_scroll(&mut self, side: Side, offset: f32) {
        let offset = offset.max(0.0);
        self.scroll[slot(side)] = offset;
        self.pending_scroll[slot(side)] = Some(offset);
    }

    /// Span each fragment of a document resolves to, cached per pass.
    pub(in crate::app) fn fragment_spans(&mut self, ordinal: usize) -> &[Option<SpanId>] {
        let Some(model) = self.model.as_mut() else {
            return &[];
        };
        let fragment_count = model
            .documents
            .get(ordinal)
            .map_or(0, |document| document.fragments.len());
        self.resolved.entry(ordinal).or_insert_with(|| {
            (0..fragment_count)
                .map(|index| {
                    model.resolve_fragment(FragmentId {
                        document: ordinal,
                        index,
                    })
                })
                .collect()
        })
    }

    pub(in crate::app) fn hover(&mut self, fragment: Option<FragmentId>) {
        let span = fragment.and_then(|fragment| self.resolved_span(fragment));
        if let Some(model) = self.model.as_mut() {
            model.highlight.hover_span(&model.index, span);
        }
    }

    fn resolved_span(&mut self, fragment: FragmentId) -> Option<SpanId> {
        self.fragment_spans(fragment.document)
            .get(fragment.index)
            .copied()
            .flatten()
    }

    pub(in crate::app) fn click(&mut self, fragment: FragmentId, now: f64) -> Option<Selection> {
        let span = self.resolved_span(fragment)?;
        let model = self.model.as_mut()?;
        let selection = model.highlight.select_span(&model.index, span)?;
        self.follow(selection, false, now);
        Some(selection)
    }

    pub(in crate::app) fn next_group(&mut self, now: f64) -> Option<Selection> {
        let model = self.model.as_mut()?;
        let selection = model.highlight.select_next_group(&model.index)?;
        self.follow(selection, true, now);
        Some(selection)
    }

    pub(in crate::app) fn previous_group(&mut self, now: f64) -> Option<Selection> {
        let model = self.model.as_mut()?;
        let selection = model.highlight.select_previous_group(&model.index)?;
        self.follow(selection, true, now);
        Some(selection)
    }

    pub(in crate::app) fn clear(&mut self) {
        self.animator.cancel();
        self.selection = None;
        if let Some(model) = self.model.as_mut() {
            model.highlight.clear();
        }
    }

    /// Scrolls the other side to the next match of the selected span below
    /// the current view.
    pub(in crate::app) fn align_other(&mut self, now: f64) -> Option<SpanId> {
        let source = self.selection?.source;
        let model = self.model.as_ref()?;
        let plan = align(&model.index, &self.layout(model), source)?;
        let target_file = model.index.span(plan.target)?.file_id.clone();
        let side = self.show_file_of(&target_file)?;
        self.animate(side, plan.target_offset, now);
        Some(plan.target)
    }

    fn layout<'a>(&self, model: &'a PassModel) -> PaneLayout<'a> {
        PaneLayout {
            model,
            shown: self.shown,
            scroll: self.scroll,
            row_pitch: self.row_pitch,
        }
    }

    fn show_file_of(&mut self, file_id: &str) -> Option<Side> {
        let model = self.model.as_ref()?;
        let ordinal = model.document_of(file_id)?;
        let side = model.documents.get(ordinal)?.side;
        if self.shown[slot(side)] != Some(ordinal) {
            self.shown[slot(side)] = Some(ordinal);
            self.request_scroll(side, 0.0);
        }
        Some(side)
    }

    fn animate(&mut self, side: Side, to: f32, now: f64) {
        let from = self.scroll[slot(side)];
        self.animator.start(side, from, to.max(0.0), now, self.animation_secs);
    }

    /// Brings the selected span into view on its own side, then scrolls its
    /// partner level with it.
    fn follow(&mut self, selection: Selection, reveal_source: bool, now: f64) {
        self.selection = Some(selection);
        let Some(source_file) = self
            .model
            .as_ref()
            .and_then(|model| model.index.span(selection.source))
            .map(|span| span.file_id.clone())
        else {
            return;
        };

        let Some(source_side) = self.show_file_of(&source_file) else {
            return;
        };
        if reveal_source && let Some(model) = self.model.as_ref() {
            let top = self.layout(model).span_top(selection.source).unwrap_or(0.0);
            let visible_from = self.scroll[slot(source_side)];
            if top < visible_from || top > visible_from + self.row_pitch * 20.0 {
                self.request_scroll(source_side, top - self.row_pitch * CONTEXT_LINES);
            }
        }

        let Some(partner) = selection.partner else {
            return;
        };
        let Some(partner_file) = self
            .model
            .as_ref()
            .and_then(|model| model.index.span(partner))
            .map(|span| span.file_id.clone())
        else {
            return;
        };
        let Some(partner_side) = self.show_file_of(&partner_file) else {
            return;
        };
        let Some(offset) = self.model.as_ref().and_then(|model| {
            offset_for(&model.index, &self.layout(model), selection.source, partner)
        }) else {
            return;
        };
        debug!("scrolling {partner_side:?} pane to {offset:.1} for span {partner}");
        self.animate(partner_side, offset, now);
    }

    /// Advances the scroll animation; returns whether it needs more frames.
    pub(in crate::app) fn tick(&mut self, now: f64) -> bool {
        if let Some(frame) = self.animator.tick(now) {
            self.request_scroll(frame.target, frame.offset);
            if frame.finished {
                debug!("scroll of {:?} pane finished", frame.target);
            }
        }
        self.animator.is_animating()
    }
}

#[cfg(test)]
mod tests {
    use crate::report::{Comparison, PassData, SourceFile, Submission};
    use crate::spans::{FragmentId, HighlightState, MemoKeying, Side, Span};

    use super::CompareView;

    fn file(id: &str, lines: usize) -> SourceFile {
        let content = (0..lines).map(|line| format!("line {line:02}\n")).collect::<String>();
        SourceFile {
            id: id.to_string(),
            name: format!("{id}.rs"),
            content,
        }
    }

    // Every line is 8 characters including its newline.
    fn span(sub: &str, file: &str, line: usize) -> Span {
        Span {
            key: None,
            sub_id: sub.to_string(),
            file_id: file.to_string(),
            start: line * 8,
            end: line * 8 + 7,
        }
    }

    fn view() -> CompareView {
        let comparison = Comparison {
            left: Submission {
                id: "alice".to_string(),
                files: vec![file("a1", 40), file("a2", 10)],
            },
            right: Submission {
                id: "bob".to_string(),
                files: vec![file("b1", 40), file("b2", 40)],
            },
            passes: vec![
                PassData {
                    name: "exact".to_string(),
                    groups: vec![
                        vec![span("alice", "a1", 2), span("bob", "b2", 30), span("bob", "b2", 35)],
                        vec![span("alice", "a2", 4), span("bob", "b1", 1)],
                    ],
                    ignored: Vec::new(),
                },
                PassData {
                    name: "structure".to_string(),
                    groups: Vec::new(),
                    ignored: Vec::new(),
                },
            ],
        };
        let mut view = CompareView::new(comparison, MemoKeying::Range, 0.5);
        view.set_row_pitch(10.0);
        view.take_pending_scroll(Side::Left);
        view.take_pending_scroll(Side::Right);
        view
    }

    fn fragment_of(view: &mut CompareView, document: usize, start: usize) -> FragmentId {
        let model = view.model().expect("pass loaded");
        let index = model.documents[document]
            .fragment_at(start)
            .expect("document has fragments");
        FragmentId { document, index }
    }

    #[test]
    fn opens_on_the_first_file_of_each_side() {
        let view = view();
        assert_eq!(view.shown(Side::Left), Some(0));
        assert_eq!(view.shown(Side::Right), Some(2));
        assert_eq!(view.summary().groups, 2);
    }

    #[test]
    fn clicking_switches_the_partner_side_and_scrolls_it_level() {
        let mut view = view();
        let fragment = fragment_of(&mut view, 0, 16);
        let selection = view.click(fragment, 0.0).expect("span under fragment");
        assert_eq!(selection.partner, Some(1));
        assert_eq!(view.shown(Side::Right), Some(3));
        // Switching files resets the pane before the animation starts.
        assert_eq!(view.take_pending_scroll(Side::Right), Some(0.0));

        assert!(!view.tick(10.0));
        // Source sits 20px below the left pane top; partner on line 30.
        assert_eq!(view.take_pending_scroll(Side::Right), Some(280.0));
    }

    #[test]
    fn hover_marks_the_group_active() {
        let mut view = view();
        let fragment = fragment_of(&mut view, 0, 16);
        view.hover(Some(fragment));
        let model = view.model().expect("pass loaded");
        assert_eq!(model.highlight.state(&model.index, 2), HighlightState::Active);

        let gap = fragment_of(&mut view, 0, 0);
        view.hover(Some(gap));
        let model = view.model().expect("pass loaded");
        assert_eq!(model.highlight.state(&model.index, 2), HighlightState::Inactive);
    }

    #[test]
    fn navigation_reveals_the_group_on_both_sides() {
        let mut view = view();
        let first = view.next_group(0.0).expect("has groups");
        assert_eq!(first.group, 0);
        let second = view.next_group(1.0).expect("has groups");
        assert_eq!(second.group, 1);
        assert_eq!(view.shown(Side::Left), Some(1));
        assert_eq!(view.shown(Side::Right), Some(2));
    }

    #[test]
    fn space_walks_through_matches_below() {
        let mut view = view();
        let fragment = fragment_of(&mut view, 0, 16);
        view.click(fragment, 0.0);
        view.tick(10.0);
        view.take_pending_scroll(Side::Right);

        assert_eq!(view.align_other(11.0), Some(2));
        view.tick(20.0);
        assert_eq!(view.take_pending_scroll(Side::Right), Some(330.0));

        assert_eq!(view.align_other(21.0), Some(1));
    }

    #[test]
    fn switching_pass_resets_transient_state() {
        let mut view = view();
        let fragment = fragment_of(&mut view, 0, 16);
        view.click(fragment, 0.0);
        view.switch_pass(1);

        assert_eq!(view.pass_index(), 1);
        assert!(view.selection().is_none());
        assert!(!view.tick(0.1));
        assert_eq!(view.summary().groups, 0);
        assert_eq!(view.next_group(0.2), None);
    }

    #[test]
    fn document_switch_cancels_scrolling() {
        let mut view = view();
        let fragment = fragment_of(&mut view, 0, 16);
        view.click(fragment, 0.0);
        view.show_document(Side::Right, 2);
        assert_eq!(view.take_pending_scroll(Side::Right), Some(0.0));
        assert!(!view.tick(0.2));
        assert_eq!(view.take_pending_scroll(Side::Right), None);
    }
}
