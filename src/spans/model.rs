use std::ops::Range;

use log::{info, warn};

use crate::report::{Comparison, PassData};

use super::highlight::HighlightMachine;
use super::index::{SlicedDocument, SpanIndex};
use super::resolver::{MemoKeying, RegionResolver};
use super::slicer::{SliceError, byte_offsets, cut_points, validate};
use super::{FragmentId, Region, Side};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    /// Character range in the document.
    pub range: Range<usize>,
    bytes: Range<usize>,
    /// Inside a region the comparator ignored (e.g. template code).
    pub ignored: bool,
}

/// The part of one fragment that falls on one text line, newline excluded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinePiece {
    pub fragment: usize,
    bytes: Range<usize>,
}

/// One file of one side, sliced for rendering.
#[derive(Clone, Debug)]
pub struct Document {
    pub file_id: String,
    pub name: String,
    pub side: Side,
    pub text: String,
    pub fragments: Vec<Fragment>,
    /// Set when the pass's spans for this file could not be sliced; the
    /// document is then shown as a single unmatched fragment.
    pub slice_error: Option<SliceError>,
    line_starts: Vec<usize>,
    lines: Vec<Vec<LinePiece>>,
}

fn split_lines(text: &str, fragments: &[Fragment]) -> (Vec<usize>, Vec<Vec<LinePiece>>) {
    let mut line_starts = vec![0];
    let mut lines = vec![Vec::new()];

    for (index, fragment) in fragments.iter().enumerate() {
        let Some(slice) = text.get(fragment.bytes.clone()) else {
            continue;
        };
        let mut piece_start = fragment.bytes.start;
        let mut position = fragment.range.start;
        for (offset, ch) in slice.char_indices() {
            position += 1;
            if ch != '\n' {
                continue;
            }
            let newline = fragment.bytes.start + offset;
            if newline > piece_start
                && let Some(line) = lines.last_mut()
            {
                line.push(LinePiece {
                    fragment: index,
                    bytes: piece_start..newline,
                });
            }
            piece_start = newline + 1;
            line_starts.push(position);
            lines.push(Vec::new());
        }
        if fragment.bytes.end > piece_start
            && let Some(line) = lines.last_mut()
        {
            line.push(LinePiece {
                fragment: index,
                bytes: piece_start..fragment.bytes.end,
            });
        }
    }

    (line_starts, lines)
}

impl Document {
    fn build(
        file_id: &str,
        name: &str,
        side: Side,
        text: &str,
        spans: &[(usize, usize)],
        ignored: &[(usize, usize)],
    ) -> Self {
        let len = text.chars().count();
        let ignored = ignored
            .iter()
            .map(|&(start, end)| (start.min(len), end.min(len)))
            .filter(|(start, end)| start < end)
            .collect::<Vec<_>>();

        let (cuts, slice_error) = match validate(spans, len) {
            Ok(()) => {
                let extra = ignored
                    .iter()
                    .flat_map(|&(start, end)| [start, end])
                    .collect::<Vec<_>>();
                (cut_points(len, spans, &extra), None)
            }
            Err(error) => {
                warn!("file {file_id}: cannot slice spans ({error}); showing it unhighlighted");
                (cut_points(len, &[], &[]), Some(error))
            }
        };

        let bytes = byte_offsets(text, &cuts);
        let fragments = cuts
            .windows(2)
            .zip(bytes.windows(2))
            .map(|(chars, bytes)| {
                let range = chars[0]..chars[1];
                let ignored = ignored
                    .iter()
                    .any(|&(start, end)| start <= range.start && range.end <= end);
                Fragment {
                    range,
                    bytes: bytes[0]..bytes[1],
                    ignored,
                }
            })
            .collect::<Vec<_>>();
        let (line_starts, lines) = split_lines(text, &fragments);

        Self {
            file_id: file_id.to_owned(),
            name: name.to_owned(),
            side,
            text: text.to_owned(),
            fragments,
            slice_error,
            line_starts,
            lines,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, line: usize) -> &[LinePiece] {
        self.lines.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn piece_text(&self, piece: &LinePiece) -> &str {
        self.text.get(piece.bytes.clone()).unwrap_or("")
    }

    /// Zero-based line holding character `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    pub fn fragment_text(&self, fragment: usize) -> &str {
        self.fragments
            .get(fragment)
            .and_then(|fragment| self.text.get(fragment.bytes.clone()))
            .unwrap_or("")
    }

    pub fn char_len(&self) -> usize {
        self.fragments.last().map_or(0, |fragment| fragment.range.end)
    }

    /// Fragment containing character `offset`; the end of the text maps to the
    /// last fragment.
    pub fn fragment_at(&self, offset: usize) -> Option<usize> {
        if self.fragments.is_empty() {
            return None;
        }
        let position = self
            .fragments
            .partition_point(|fragment| fragment.range.end <= offset);
        Some(position.min(self.fragments.len() - 1))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PassSummary {
    pub groups: usize,
    pub spans: usize,
    pub left_coverage: f32,
    pub right_coverage: f32,
}

/// Render model of one comparison pass: sliced documents, the span index,
/// the memoized resolver and the highlight state. Rebuilt wholesale when the
/// pass changes.
#[derive(Clone, Debug)]
pub struct PassModel {
    pub name: String,
    pub documents: Vec<Document>,
    pub index: SpanIndex,
    pub resolver: RegionResolver,
    pub highlight: HighlightMachine,
}

impl PassModel {
    pub fn build(comparison: &Comparison, pass: &PassData, keying: MemoKeying) -> Self {
        let mut documents = Vec::new();
        for (side, submission) in [(Side::Left, &comparison.left), (Side::Right, &comparison.right)] {
            for file in &submission.files {
                let spans = pass
                    .groups
                    .iter()
                    .flatten()
                    .filter(|span| span.file_id == file.id)
                    .map(|span| (span.start, span.end))
                    .collect::<Vec<_>>();
                let ignored = pass
                    .ignored
                    .iter()
                    .filter(|region| region.file_id == file.id)
                    .map(|region| (region.start, region.end))
                    .collect::<Vec<_>>();
                documents.push(Document::build(
                    &file.id,
                    &file.name,
                    side,
                    &file.content,
                    &spans,
                    &ignored,
                ));
            }
        }

        let ranges = documents
            .iter()
            .map(|document| {
                if document.slice_error.is_some() {
                    Vec::new()
                } else {
                    document
                        .fragments
                        .iter()
                        .map(|fragment| fragment.range.clone())
                        .collect()
                }
            })
            .collect::<Vec<Vec<_>>>();
        let sliced = documents
            .iter()
            .zip(ranges.iter())
            .map(|(document, fragments)| SlicedDocument {
                file_id: &document.file_id,
                fragments,
            })
            .collect::<Vec<_>>();

        let index = SpanIndex::build(&pass.groups, &sliced);
        let highlight = HighlightMachine::new(&index);

        info!(
            "pass {}: {} groups, {} spans across {} documents",
            pass.name,
            index.group_count(),
            index.span_count(),
            documents.len()
        );

        Self {
            name: pass.name.clone(),
            documents,
            index,
            resolver: RegionResolver::new(keying),
            highlight,
        }
    }

    pub fn document_of(&self, file_id: &str) -> Option<usize> {
        self.documents
            .iter()
            .position(|document| document.file_id == file_id)
    }

    pub fn documents_on(&self, side: Side) -> impl Iterator<Item = (usize, &Document)> + '_ {
        self.documents
            .iter()
            .enumerate()
            .filter(move |(_, document)| document.side == side)
    }

    pub fn fragment_region(&self, fragment: FragmentId) -> Option<Region> {
        let document = self.documents.get(fragment.document)?;
        let range = &document.fragments.get(fragment.index)?.range;
        Some(Region {
            file_id: document.file_id.clone(),
            start: range.start,
            end: range.end,
        })
    }

    /// Span under a fragment as the pointer sees it, via the resolver.
    pub fn resolve_fragment(&mut self, fragment: FragmentId) -> Option<usize> {
        let region = self.fragment_region(fragment)?;
        // A degraded document renders as one unmatched fragment.
        if self
            .documents
            .get(fragment.document)
            .is_some_and(|document| document.slice_error.is_some())
        {
            return None;
        }
        if self
            .documents
            .get(fragment.document)
            .and_then(|document| document.fragments.get(fragment.index))
            .is_some_and(|fragment| fragment.ignored)
            && self.index.spans_of(fragment).is_empty()
        {
            return None;
        }
        self.resolver.resolve(&self.index, &region)
    }

    pub fn summary(&self) -> PassSummary {
        let coverage = |side: Side| {
            let mut covered = 0usize;
            let mut total = 0usize;
            for (ordinal, document) in self.documents_on(side) {
                total += document.char_len();
                covered += document
                    .fragments
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| {
                        !self
                            .index
                            .spans_of(FragmentId {
                                document: ordinal,
                                index: *index,
                            })
                            .is_empty()
                    })
                    .map(|(_, fragment)| fragment.range.len())
                    .sum::<usize>();
            }
            if total == 0 {
                0.0
            } else {
                covered as f32 / total as f32
            }
        };

        PassSummary {
            groups: self.index.group_count(),
            spans: self.index.span_count(),
            left_coverage: coverage(Side::Left),
            right_coverage: coverage(Side::Right),
        }
    }
}
