//! Matched-span bookkeeping for the side-by-side comparison view.
//!
//! Offsets throughout are character (Unicode scalar) indices into a file's
//! content, half-open `start..end`.

mod align;
mod highlight;
mod index;
mod model;
mod resolver;
mod slicer;

pub use align::{AlignmentPlan, PositionLookup, ScrollAnimator, ScrollFrame, ScrollTicket, align, offset_for};
pub use highlight::{HighlightMachine, HighlightState, Selection};
pub use index::{SlicedDocument, SpanIndex};
pub use model::{Document, Fragment, LinePiece, PassModel, PassSummary};
pub use resolver::{MemoKeying, RegionResolver, resolve_uncached};
pub use slicer::{SliceError, cut_points, slice, slice_ranges, validate};

pub type SpanId = usize;
pub type GroupId = usize;

/// A fragment of one document of the current pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentId {
    pub document: usize,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// A matched range of one file, as reported by the comparator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    /// Optional comparator-assigned identifier.
    pub key: Option<String>,
    pub sub_id: String,
    pub file_id: String,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn extent(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether this span covers `region`. An empty region at `p` counts as
    /// covered when `start <= p < end`.
    pub fn contains_region(&self, region: &Region) -> bool {
        if self.file_id != region.file_id {
            return false;
        }
        if region.start == region.end {
            return self.start <= region.start && region.start < self.end;
        }
        self.start <= region.start && region.end <= self.end
    }
}

/// Range the comparator skipped when matching; rendered muted, never
/// resolved to a span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IgnoredRegion {
    pub file_id: String,
    pub start: usize,
    pub end: usize,
}

/// A query range, usually one rendered fragment.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    pub file_id: String,
    pub start: usize,
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::{Region, Side, Span};

    fn span(start: usize, end: usize) -> Span {
        Span {
            key: None,
            sub_id: "s".to_string(),
            file_id: "f".to_string(),
            start,
            end,
        }
    }

    fn region(file: &str, start: usize, end: usize) -> Region {
        Region {
            file_id: file.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn containment_respects_file_and_bounds() {
        let span = span(2, 6);
        assert!(span.contains_region(&region("f", 2, 6)));
        assert!(span.contains_region(&region("f", 3, 4)));
        assert!(!span.contains_region(&region("f", 1, 4)));
        assert!(!span.contains_region(&region("g", 3, 4)));
        assert!(span.contains_region(&region("f", 2, 2)));
        assert!(!span.contains_region(&region("f", 6, 6)));
        assert_eq!(span.extent(), 4);
    }

    #[test]
    fn sides_flip() {
        assert_eq!(Side::Left.other(), Side::Right);
        assert_eq!(Side::Right.other(), Side::Left);
    }
}
