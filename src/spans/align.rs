use log::debug;

use super::SpanId;
use super::index::SpanIndex;

/// Layout facts owned by whoever renders the documents.
pub trait PositionLookup {
    /// Top of the span in its document's content coordinates, if laid out.
    fn span_top(&self, span: SpanId) -> Option<f32>;
    /// Current vertical scroll offset of the document showing `file_id`.
    fn scroll_offset(&self, file_id: &str) -> Option<f32>;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentPlan {
    pub target: SpanId,
    /// Scroll offset for the target's document that puts the target at the
    /// same on-screen height as the source.
    pub target_offset: f32,
}

/// Distance from the top of the source's viewport to the source span.
fn viewport_anchor(index: &SpanIndex, lookup: &dyn PositionLookup, source: SpanId) -> Option<f32> {
    let span = index.span(source)?;
    let top = lookup.span_top(source)?;
    let scroll = lookup.scroll_offset(&span.file_id).unwrap_or(0.0);
    Some(top - scroll)
}

/// Scroll offset that aligns `target` with `source` on screen.
pub fn offset_for(
    index: &SpanIndex,
    lookup: &dyn PositionLookup,
    source: SpanId,
    target: SpanId,
) -> Option<f32> {
    let anchor = viewport_anchor(index, lookup, source)?;
    let top = lookup.span_top(target)?;
    Some((top - anchor).max(0.0))
}

/// Next match of `source` in the other submission below the current view.
///
/// Picks the first other-submission span of the group, in document order,
/// whose top lies strictly below the point the source currently occupies in
/// that document's viewport; wraps to the first such span when the view is
/// already past the last one. Spans without a known position are skipped.
pub fn align(
    index: &SpanIndex,
    lookup: &dyn PositionLookup,
    source: SpanId,
) -> Option<AlignmentPlan> {
    let anchor = viewport_anchor(index, lookup, source)?;

    let candidates = index
        .other_document_spans(source)
        .into_iter()
        .filter_map(|candidate| {
            let span = index.span(candidate)?;
            let top = lookup.span_top(candidate)?;
            let scroll = lookup.scroll_offset(&span.file_id).unwrap_or(0.0);
            Some((candidate, top, scroll))
        })
        .collect::<Vec<_>>();

    let (target, top, _) = candidates
        .iter()
        .copied()
        .find(|&(_, top, scroll)| top > scroll + anchor)
        .or_else(|| candidates.first().copied())?;

    let plan = AlignmentPlan {
        target,
        target_offset: (top - anchor).max(0.0),
    };
    debug!(
        "aligning span {source} to {} at offset {:.1}",
        plan.target, plan.target_offset
    );
    Some(plan)
}

/// Handle for one scroll request; only the newest handle is ever live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScrollTicket(u64);

#[derive(Clone, Debug, PartialEq)]
pub struct ScrollFrame<K> {
    pub ticket: ScrollTicket,
    pub target: K,
    pub offset: f32,
    /// Set on the final frame of a request that was not superseded.
    pub finished: bool,
}

#[derive(Clone, Debug)]
struct ScrollTask<K> {
    ticket: ScrollTicket,
    target: K,
    from: f32,
    to: f32,
    started_at: f64,
    duration: f64,
}

/// Interruptible scroll animation driven by the caller's clock.
///
/// Starting a new request or calling [`ScrollAnimator::cancel`] drops the
/// in-flight one, which then never reports completion.
#[derive(Clone, Debug)]
pub struct ScrollAnimator<K> {
    next_ticket: u64,
    active: Option<ScrollTask<K>>,
}

impl<K> Default for ScrollAnimator<K> {
    fn default() -> Self {
        Self {
            next_ticket: 0,
            active: None,
        }
    }
}

fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

impl<K: Clone> ScrollAnimator<K> {
    pub fn start(&mut self, target: K, from: f32, to: f32, now: f64, duration: f64) -> ScrollTicket {
        let ticket = ScrollTicket(self.next_ticket);
        self.next_ticket = self.next_ticket.wrapping_add(1);
        self.active = Some(ScrollTask {
            ticket,
            target,
            from,
            to,
            started_at: now,
            duration: duration.max(0.0),
        });
        ticket
    }

    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_live(&self, ticket: ScrollTicket) -> bool {
        self.active
            .as_ref()
            .is_some_and(|task| task.ticket == ticket)
    }

    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    pub fn tick(&mut self, now: f64) -> Option<ScrollFrame<K>> {
        let task = self.active.as_ref()?;
        let progress = if task.duration <= f64::EPSILON {
            1.0
        } else {
            ((now - task.started_at) / task.duration).clamp(0.0, 1.0)
        };
        let eased = ease_in_out(progress) as f32;
        let frame = ScrollFrame {
            ticket: task.ticket,
            target: task.target.clone(),
            offset: task.from + (task.to - task.from) * eased,
            finished: progress >= 1.0,
        };

        if frame.finished {
            self.active = None;
        }
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::super::index::{SlicedDocument, SpanIndex};
    use super::super::{Span, SpanId};
    use super::{PositionLookup, ScrollAnimator, align, offset_for};

    struct Layout {
        tops: HashMap<SpanId, f32>,
        scroll: HashMap<&'static str, f32>,
    }

    impl PositionLookup for Layout {
        fn span_top(&self, span: SpanId) -> Option<f32> {
            self.tops.get(&span).copied()
        }

        fn scroll_offset(&self, file_id: &str) -> Option<f32> {
            self.scroll.get(file_id).copied()
        }
    }

    fn span(sub: &str, file: &str, start: usize) -> Span {
        Span {
            key: None,
            sub_id: sub.to_string(),
            file_id: file.to_string(),
            start,
            end: start + 2,
        }
    }

    fn index() -> SpanIndex {
        let groups = vec![vec![
            span("a", "left", 10),
            span("b", "right", 5),
            span("b", "right", 40),
            span("b", "right", 80),
        ]];
        SpanIndex::build(
            &groups,
            &[
                SlicedDocument {
                    file_id: "left",
                    fragments: &[],
                },
                SlicedDocument {
                    file_id: "right",
                    fragments: &[],
                },
            ],
        )
    }

    fn layout(right_scroll: f32) -> Layout {
        Layout {
            tops: HashMap::from([(0, 300.0), (1, 100.0), (2, 800.0), (3, 1600.0)]),
            scroll: HashMap::from([("left", 200.0), ("right", right_scroll)]),
        }
    }

    #[test]
    fn picks_the_first_match_below_the_view_anchor() {
        let index = index();
        let plan = align(&index, &layout(0.0), 0).expect("has candidates");
        assert_eq!(plan.target, 2);
        assert_eq!(plan.target_offset, 700.0);
    }

    #[test]
    fn successive_alignments_walk_down_then_wrap() {
        let index = index();
        let next = align(&index, &layout(700.0), 0).expect("has candidates");
        assert_eq!(next.target, 3);
        assert_eq!(next.target_offset, 1500.0);

        let wrapped = align(&index, &layout(1500.0), 0).expect("has candidates");
        assert_eq!(wrapped.target, 1);
        assert_eq!(wrapped.target_offset, 0.0);
    }

    #[test]
    fn unknown_positions_are_skipped() {
        let index = index();
        let mut sparse = layout(0.0);
        sparse.tops.remove(&2);
        assert_eq!(align(&index, &sparse, 0).map(|plan| plan.target), Some(3));

        sparse.tops.remove(&0);
        assert_eq!(align(&index, &sparse, 0), None);
        assert_eq!(offset_for(&index, &layout(0.0), 0, 3), Some(1500.0));
    }

    #[test]
    fn newer_requests_supersede_older_ones() {
        let mut animator = ScrollAnimator::default();
        let first = animator.start("right", 0.0, 100.0, 0.0, 1.0);
        let halfway = animator.tick(0.5).expect("animating");
        assert_eq!(halfway.offset, 50.0);
        assert!(!halfway.finished);

        let second = animator.start("left", 0.0, 10.0, 0.6, 0.2);
        assert!(!animator.is_live(first));
        assert!(animator.is_live(second));

        let done = animator.tick(5.0).expect("animating");
        assert_eq!(done.ticket, second);
        assert_eq!(done.target, "left");
        assert!(done.finished);
        assert_eq!(done.offset, 10.0);
        assert!(animator.tick(6.0).is_none());
    }

    #[test]
    fn cancelled_requests_never_finish() {
        let mut animator = ScrollAnimator::default();
        let ticket = animator.start(1usize, 0.0, 10.0, 0.0, 0.3);
        animator.cancel();
        assert!(!animator.is_live(ticket));
        assert!(animator.tick(1.0).is_none());
        assert!(!animator.is_animating());
    }
}
