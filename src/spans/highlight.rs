use std::collections::HashMap;

use log::debug;

use super::index::SpanIndex;
use super::resolver::RegionResolver;
use super::{GroupId, Region, SpanId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HighlightState {
    #[default]
    Inactive,
    Active,
    Selected,
    Highlighted,
}

/// Result of a selection: the span acted on, its highlighted partner in the
/// other submission (if the group has one) and the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub source: SpanId,
    pub partner: Option<SpanId>,
    pub group: GroupId,
}

/// Per-span highlight states for one pass.
///
/// Hover (`Active`) is tracked separately from the click-driven
/// `Selected`/`Highlighted` states and never overrides them.
#[derive(Clone, Debug, Default)]
pub struct HighlightMachine {
    selection: HashMap<SpanId, HighlightState>,
    hovered_group: Option<GroupId>,
    current_group: Option<GroupId>,
    group_order: Vec<GroupId>,
}

impl HighlightMachine {
    pub fn new(index: &SpanIndex) -> Self {
        Self {
            group_order: index.groups_in_position_order(),
            ..Self::default()
        }
    }

    pub fn state(&self, index: &SpanIndex, span: SpanId) -> HighlightState {
        if let Some(&state) = self.selection.get(&span) {
            return state;
        }
        if self.hovered_group.is_some() && index.group_of(span) == self.hovered_group {
            return HighlightState::Active;
        }
        HighlightState::Inactive
    }

    pub fn selected_group(&self) -> Option<GroupId> {
        self.current_group
    }

    pub fn hovered_group(&self) -> Option<GroupId> {
        self.hovered_group
    }

    pub fn group_order(&self) -> &[GroupId] {
        &self.group_order
    }

    /// Position of the selected group in navigation order, 1-based for display.
    pub fn cursor(&self) -> Option<usize> {
        let current = self.current_group?;
        self.group_order
            .iter()
            .position(|&group| group == current)
            .map(|position| position + 1)
    }

    pub fn highlighted(&self) -> impl Iterator<Item = SpanId> + '_ {
        self.selection
            .iter()
            .filter(|(_, state)| **state == HighlightState::Highlighted)
            .map(|(&span, _)| span)
    }

    /// Pointer entered a region: its span's group becomes `Active`.
    pub fn hover(
        &mut self,
        index: &SpanIndex,
        resolver: &mut RegionResolver,
        region: &Region,
    ) -> Option<SpanId> {
        let span = resolver.resolve(index, region);
        self.hover_span(index, span);
        span
    }

    pub fn hover_span(&mut self, index: &SpanIndex, span: Option<SpanId>) {
        self.hovered_group = span.and_then(|span| index.group_of(span));
    }

    pub fn leave(&mut self) {
        self.hovered_group = None;
    }

    pub fn clear(&mut self) {
        self.selection.clear();
        self.hovered_group = None;
        self.current_group = None;
    }

    pub fn select(
        &mut self,
        index: &SpanIndex,
        resolver: &mut RegionResolver,
        region: &Region,
    ) -> Option<Selection> {
        let span = resolver.resolve(index, region)?;
        self.select_span(index, span)
    }

    /// Clicking a fresh span highlights it and its first partner in the other
    /// submission; clicking an already highlighted span moves the partner
    /// highlight to the next other-submission span of the group.
    pub fn select_span(&mut self, index: &SpanIndex, span: SpanId) -> Option<Selection> {
        let group = index.group_of(span)?;
        let others = index.other_document_spans(span);

        if self.selection.get(&span) == Some(&HighlightState::Highlighted) {
            return Some(self.cycle_partner(span, group, &others));
        }

        self.selection.clear();
        for &member in index.spans_in_group(group) {
            self.selection.insert(member, HighlightState::Selected);
        }
        self.selection.insert(span, HighlightState::Highlighted);

        let partner = others.first().copied();
        if let Some(partner) = partner {
            self.selection.insert(partner, HighlightState::Highlighted);
        }
        self.current_group = Some(group);

        debug!("selected span {span} in group {group}, partner {partner:?}");
        Some(Selection {
            source: span,
            partner,
            group,
        })
    }

    fn cycle_partner(&mut self, span: SpanId, group: GroupId, others: &[SpanId]) -> Selection {
        self.current_group = Some(group);
        if others.is_empty() {
            return Selection {
                source: span,
                partner: None,
                group,
            };
        }

        let current = others.iter().position(|other| {
            self.selection.get(other) == Some(&HighlightState::Highlighted)
        });
        let next = current.map_or(0, |position| (position + 1) % others.len());

        if let Some(position) = current {
            self.selection
                .insert(others[position], HighlightState::Selected);
        }
        self.selection
            .insert(others[next], HighlightState::Highlighted);

        debug!(
            "cycled partner of span {span} to {} ({} of {})",
            others[next],
            next + 1,
            others.len()
        );
        Selection {
            source: span,
            partner: Some(others[next]),
            group,
        }
    }

    pub fn select_next_group(&mut self, index: &SpanIndex) -> Option<Selection> {
        self.step_group(index, true)
    }

    pub fn select_previous_group(&mut self, index: &SpanIndex) -> Option<Selection> {
        self.step_group(index, false)
    }

    fn step_group(&mut self, index: &SpanIndex, forward: bool) -> Option<Selection> {
        let count = self.group_order.len();
        if count == 0 {
            return None;
        }

        let current = self
            .current_group
            .and_then(|group| self.group_order.iter().position(|&other| other == group));
        let next = match (current, forward) {
            (Some(position), true) => (position + 1) % count,
            (Some(position), false) => (position + count - 1) % count,
            (None, true) => 0,
            (None, false) => count - 1,
        };

        let group = self.group_order[next];
        let first = index
            .spans_in_group(group)
            .iter()
            .copied()
            .min_by_key(|&span| index.position_key(span))?;
        debug!("navigating to group {group} ({} of {count})", next + 1);
        self.select_span(index, first)
    }
}

#[cfg(test)]
mod tests {
    use super::super::index::{SlicedDocument, SpanIndex};
    use super::super::resolver::{MemoKeying, RegionResolver};
    use super::super::{Region, Span};
    use super::{HighlightMachine, HighlightState};

    fn span(sub: &str, file: &str, start: usize, end: usize) -> Span {
        Span {
            key: None,
            sub_id: sub.to_string(),
            file_id: file.to_string(),
            start,
            end,
        }
    }

    // group 0: left 0..4 with three matches on the right
    // group 1: left 10..14 with one match on the right
    fn index() -> SpanIndex {
        let groups = vec![
            vec![
                span("left", "l", 0, 4),
                span("right", "r", 20, 24),
                span("right", "r", 0, 4),
                span("right", "r", 10, 14),
            ],
            vec![span("left", "l", 10, 14), span("right", "r", 30, 34)],
        ];
        let l = vec![0..4, 4..10, 10..14];
        let r = vec![0..4, 4..10, 10..14, 14..20, 20..24, 24..30, 30..34];
        SpanIndex::build(
            &groups,
            &[
                SlicedDocument {
                    file_id: "l",
                    fragments: &l,
                },
                SlicedDocument {
                    file_id: "r",
                    fragments: &r,
                },
            ],
        )
    }

    fn region(file: &str, start: usize, end: usize) -> Region {
        Region {
            file_id: file.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn select_marks_source_partner_and_group() {
        let index = index();
        let mut resolver = RegionResolver::new(MemoKeying::Range);
        let mut machine = HighlightMachine::new(&index);

        let selection = machine
            .select(&index, &mut resolver, &region("l", 1, 2))
            .expect("region resolves");
        assert_eq!(selection.source, 0);
        assert_eq!(selection.partner, Some(2));
        assert_eq!(machine.state(&index, 0), HighlightState::Highlighted);
        assert_eq!(machine.state(&index, 2), HighlightState::Highlighted);
        assert_eq!(machine.state(&index, 3), HighlightState::Selected);
        assert_eq!(machine.state(&index, 1), HighlightState::Selected);
        assert_eq!(machine.state(&index, 4), HighlightState::Inactive);
    }

    #[test]
    fn reselecting_cycles_the_partner_and_wraps() {
        let index = index();
        let mut resolver = RegionResolver::new(MemoKeying::Range);
        let mut machine = HighlightMachine::new(&index);
        let click = region("l", 0, 4);

        let partners = (0..4)
            .map(|_| {
                machine
                    .select(&index, &mut resolver, &click)
                    .and_then(|selection| selection.partner)
            })
            .collect::<Vec<_>>();
        assert_eq!(partners, vec![Some(2), Some(3), Some(1), Some(2)]);
        assert_eq!(machine.highlighted().count(), 2);
        assert_eq!(machine.state(&index, 3), HighlightState::Selected);
    }

    #[test]
    fn selecting_outside_any_span_is_a_no_op() {
        let index = index();
        let mut resolver = RegionResolver::new(MemoKeying::Range);
        let mut machine = HighlightMachine::new(&index);
        machine.select_span(&index, 4);

        assert_eq!(machine.select(&index, &mut resolver, &region("l", 5, 6)), None);
        assert_eq!(machine.state(&index, 4), HighlightState::Highlighted);
        assert_eq!(machine.select_span(&index, 99), None);
    }

    #[test]
    fn hover_is_independent_of_selection() {
        let index = index();
        let mut resolver = RegionResolver::new(MemoKeying::Range);
        let mut machine = HighlightMachine::new(&index);
        machine.select_span(&index, 4);

        machine.hover(&index, &mut resolver, &region("r", 0, 2));
        assert_eq!(machine.state(&index, 0), HighlightState::Active);
        assert_eq!(machine.state(&index, 4), HighlightState::Highlighted);

        machine.hover(&index, &mut resolver, &region("r", 30, 31));
        assert_eq!(machine.state(&index, 0), HighlightState::Inactive);
        assert_eq!(machine.state(&index, 5), HighlightState::Highlighted);

        machine.leave();
        assert_eq!(machine.state(&index, 0), HighlightState::Inactive);
        assert_eq!(machine.hovered_group(), None);
    }

    #[test]
    fn group_navigation_wraps_both_ways() {
        let index = index();
        let mut machine = HighlightMachine::new(&index);

        let first = machine.select_next_group(&index).expect("has groups");
        assert_eq!((first.group, first.source), (0, 0));
        assert_eq!(machine.cursor(), Some(1));

        let second = machine.select_next_group(&index).expect("has groups");
        assert_eq!((second.group, second.source), (1, 4));

        let wrapped = machine.select_next_group(&index).expect("has groups");
        assert_eq!(wrapped.group, 0);

        let back = machine.select_previous_group(&index).expect("has groups");
        assert_eq!(back.group, 1);

        machine.clear();
        let last = machine.select_previous_group(&index).expect("has groups");
        assert_eq!(last.group, 1);
    }

    #[test]
    fn empty_index_has_nothing_to_navigate() {
        let index = SpanIndex::build(&[], &[]);
        let mut machine = HighlightMachine::new(&index);
        assert_eq!(machine.select_next_group(&index), None);
        assert_eq!(machine.cursor(), None);
    }
}
