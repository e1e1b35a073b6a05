use std::collections::HashMap;
use std::ops::Range;

use super::{FragmentId, GroupId, Span, SpanId};

/// A document after slicing, as the index needs to see it.
#[derive(Clone, Debug)]
pub struct SlicedDocument<'a> {
    pub file_id: &'a str,
    pub fragments: &'a [Range<usize>],
}

/// Bidirectional lookups between groups, spans and fragments of one pass.
///
/// Span ids are positions in the flattened group list and group ids are
/// positions in the group list. The index is built once per pass and never
/// updated in place.
#[derive(Clone, Debug, Default)]
pub struct SpanIndex {
    spans: Vec<Span>,
    group_to_spans: Vec<Vec<SpanId>>,
    span_to_group: Vec<GroupId>,
    span_by_key: HashMap<String, SpanId>,
    spans_by_file: HashMap<String, Vec<SpanId>>,
    document_of_file: HashMap<String, usize>,
    span_to_fragments: HashMap<SpanId, Vec<FragmentId>>,
    fragment_to_spans: HashMap<FragmentId, Vec<SpanId>>,
}

impl SpanIndex {
    pub fn build(groups: &[Vec<Span>], documents: &[SlicedDocument<'_>]) -> Self {
        let mut index = Self::default();

        for (group_id, group) in groups.iter().enumerate() {
            let mut members = Vec::with_capacity(group.len());
            for span in group {
                let span_id = index.spans.len();
                if let Some(key) = &span.key {
                    index.span_by_key.entry(key.clone()).or_insert(span_id);
                }
                index
                    .spans_by_file
                    .entry(span.file_id.clone())
                    .or_default()
                    .push(span_id);
                index.spans.push(span.clone());
                index.span_to_group.push(group_id);
                members.push(span_id);
            }
            index.group_to_spans.push(members);
        }

        for (ordinal, document) in documents.iter().enumerate() {
            index
                .document_of_file
                .entry(document.file_id.to_owned())
                .or_insert(ordinal);
        }

        for spans in index.spans_by_file.values_mut() {
            let spans_ref = &index.spans;
            spans.sort_by_key(|&id| (spans_ref[id].start, spans_ref[id].end, id));
        }

        for (ordinal, document) in documents.iter().enumerate() {
            index.attach_fragments(ordinal, document);
        }

        index
    }

    fn attach_fragments(&mut self, ordinal: usize, document: &SlicedDocument<'_>) {
        let Some(span_ids) = self.spans_by_file.get(document.file_id) else {
            return;
        };

        for &span_id in span_ids {
            let span = &self.spans[span_id];
            let first = document
                .fragments
                .partition_point(|fragment| fragment.start < span.start);
            for (offset, fragment) in document.fragments[first..].iter().enumerate() {
                if fragment.end > span.end || fragment.start >= span.end {
                    break;
                }
                let fragment_id = FragmentId {
                    document: ordinal,
                    index: first + offset,
                };
                self.span_to_fragments
                    .entry(span_id)
                    .or_default()
                    .push(fragment_id);
                self.fragment_to_spans
                    .entry(fragment_id)
                    .or_default()
                    .push(span_id);
            }
        }

        let spans = &self.spans;
        for (fragment_id, span_ids) in self.fragment_to_spans.iter_mut() {
            if fragment_id.document == ordinal {
                span_ids.sort_by_key(|&id| (spans[id].extent(), id));
            }
        }
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span(&self, id: SpanId) -> Option<&Span> {
        self.spans.get(id)
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    pub fn group_count(&self) -> usize {
        self.group_to_spans.len()
    }

    pub fn group_of(&self, span: SpanId) -> Option<GroupId> {
        self.span_to_group.get(span).copied()
    }

    pub fn spans_in_group(&self, group: GroupId) -> &[SpanId] {
        self.group_to_spans
            .get(group)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn span_by_key(&self, key: &str) -> Option<SpanId> {
        self.span_by_key.get(key).copied()
    }

    /// Spans of one file ordered by start, then end.
    pub fn spans_in_file(&self, file_id: &str) -> &[SpanId] {
        self.spans_by_file
            .get(file_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fragments_of(&self, span: SpanId) -> &[FragmentId] {
        self.span_to_fragments
            .get(&span)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Enclosing spans of a fragment, innermost first.
    pub fn spans_of(&self, fragment: FragmentId) -> &[SpanId] {
        self.fragment_to_spans
            .get(&fragment)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn innermost_span(&self, fragment: FragmentId) -> Option<SpanId> {
        self.spans_of(fragment).first().copied()
    }

    pub fn group_of_fragment(&self, fragment: FragmentId) -> Option<GroupId> {
        self.innermost_span(fragment)
            .and_then(|span| self.group_of(span))
    }

    /// Stable document-position ordering: document, start, end, span id.
    pub fn position_key(&self, span: SpanId) -> Option<(usize, usize, usize, SpanId)> {
        let record = self.spans.get(span)?;
        let document = self
            .document_of_file
            .get(&record.file_id)
            .copied()
            .unwrap_or(usize::MAX);
        Some((document, record.start, record.end, span))
    }

    /// Members of `span`'s group that belong to another submission, in
    /// document-position order.
    pub fn other_document_spans(&self, span: SpanId) -> Vec<SpanId> {
        let Some(record) = self.spans.get(span) else {
            return Vec::new();
        };
        let Some(group) = self.group_of(span) else {
            return Vec::new();
        };

        let mut others = self
            .spans_in_group(group)
            .iter()
            .copied()
            .filter(|&other| {
                self.spans
                    .get(other)
                    .is_some_and(|candidate| candidate.sub_id != record.sub_id)
            })
            .collect::<Vec<_>>();
        others.sort_by_key(|&other| self.position_key(other));
        others
    }

    /// Groups ordered by the document position of their lowest-indexed span.
    pub fn groups_in_position_order(&self) -> Vec<GroupId> {
        let mut groups = (0..self.group_to_spans.len())
            .filter(|&group| !self.group_to_spans[group].is_empty())
            .collect::<Vec<_>>();
        groups.sort_by_key(|&group| {
            let anchor = self.group_to_spans[group].iter().copied().min();
            (anchor.and_then(|span| self.position_key(span)), group)
        });
        groups
    }
}
