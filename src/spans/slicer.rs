use std::ops::Range;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SliceError {
    #[error("span {start}..{end} ends before it starts")]
    Inverted { start: usize, end: usize },
    #[error("span {start}..{end} lies outside a document of {len} characters")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("spans {first:?} and {second:?} overlap without sharing a boundary")]
    Crossing {
        first: (usize, usize),
        second: (usize, usize),
    },
}

/// Rejects spans that would corrupt the fragment partition.
///
/// Spans may share boundaries, repeat, or nest; two spans whose interiors
/// cross (`a.start < b.start < a.end < b.end`) are a contract violation.
pub fn validate(spans: &[(usize, usize)], len: usize) -> Result<(), SliceError> {
    for &(start, end) in spans {
        if start > end {
            return Err(SliceError::Inverted { start, end });
        }
        if end > len {
            return Err(SliceError::OutOfBounds { start, end, len });
        }
    }

    let mut sorted = spans.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));

    let mut open: Vec<(usize, usize)> = Vec::new();
    for span in sorted {
        while open.last().is_some_and(|top| top.1 <= span.0) {
            open.pop();
        }
        if let Some(&top) = open.last()
            && span.1 > top.1
        {
            return Err(SliceError::Crossing {
                first: top,
                second: span,
            });
        }
        open.push(span);
    }

    Ok(())
}

/// Sorted, deduplicated cut points: `0`, `len`, every span boundary and every
/// extra cut inside the document.
pub fn cut_points(len: usize, spans: &[(usize, usize)], extra_cuts: &[usize]) -> Vec<usize> {
    let mut cuts = Vec::with_capacity(2 + spans.len() * 2 + extra_cuts.len());
    cuts.push(0);
    cuts.push(len);
    for &(start, end) in spans {
        cuts.push(start.min(len));
        cuts.push(end.min(len));
    }
    cuts.extend(extra_cuts.iter().map(|&cut| cut.min(len)));
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

/// Validated fragment ranges, in characters, covering `0..len` without gaps.
pub fn slice_ranges(
    len: usize,
    spans: &[(usize, usize)],
    extra_cuts: &[usize],
) -> Result<Vec<Range<usize>>, SliceError> {
    validate(spans, len)?;
    let cuts = cut_points(len, spans, extra_cuts);
    Ok(cuts.windows(2).map(|pair| pair[0]..pair[1]).collect())
}

/// Byte offset of each character offset in `cuts` (which must be sorted).
pub(crate) fn byte_offsets(text: &str, cuts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(cuts.len());
    let mut chars = text.char_indices().enumerate().peekable();
    for &cut in cuts {
        while chars.peek().is_some_and(|&(char_index, _)| char_index < cut) {
            chars.next();
        }
        let byte = chars
            .peek()
            .map(|&(_, (byte_index, _))| byte_index)
            .unwrap_or(text.len());
        offsets.push(byte);
    }
    offsets
}

/// Cuts `text` at every span boundary. Offsets are character indices.
///
/// Concatenating the result reproduces `text`; there is one fragment per
/// pair of consecutive distinct cut points.
pub fn slice<'t>(text: &'t str, spans: &[(usize, usize)]) -> Result<Vec<&'t str>, SliceError> {
    let len = text.chars().count();
    validate(spans, len)?;
    let cuts = cut_points(len, spans, &[]);
    let bytes = byte_offsets(text, &cuts);
    Ok(bytes.windows(2).map(|pair| &text[pair[0]..pair[1]]).collect())
}

#[cfg(test)]
mod tests {
    use super::{SliceError, cut_points, slice, slice_ranges, validate};

    #[test]
    fn adjacent_spans_split_into_four_fragments() {
        let fragments = slice("abcdefgh", &[(2, 4), (4, 6)]).expect("valid spans");
        assert_eq!(fragments, vec!["ab", "cd", "ef", "gh"]);
    }

    #[test]
    fn empty_text_and_no_spans() {
        assert!(slice("", &[]).expect("valid").is_empty());
        assert_eq!(slice("abc", &[]).expect("valid"), vec!["abc"]);
    }

    #[test]
    fn multibyte_text_round_trips() {
        let text = "héllo wörld ✓ done";
        let spans = [(1, 4), (6, 11), (12, 13), (6, 8)];
        let fragments = slice(text, &spans).expect("valid spans");
        assert_eq!(fragments.concat(), text);
        let distinct = cut_points(text.chars().count(), &spans, &[]).len();
        assert_eq!(fragments.len(), distinct - 1);
        assert_eq!(fragments[1], "éll");
    }

    #[test]
    fn nested_and_repeated_spans_are_accepted() {
        assert!(validate(&[(0, 10), (2, 5), (2, 5), (5, 10), (10, 10)], 10).is_ok());
    }

    #[test]
    fn crossing_spans_are_rejected() {
        let error = validate(&[(0, 5), (3, 8)], 10).expect_err("crossing spans");
        assert_eq!(
            error,
            SliceError::Crossing {
                first: (0, 5),
                second: (3, 8)
            }
        );
    }

    #[test]
    fn out_of_bounds_and_inverted_spans_are_rejected() {
        assert!(matches!(
            validate(&[(2, 12)], 10),
            Err(SliceError::OutOfBounds { len: 10, .. })
        ));
        assert!(matches!(
            validate(&[(6, 2)], 10),
            Err(SliceError::Inverted { start: 6, end: 2 })
        ));
    }

    #[test]
    fn extra_cuts_refine_the_partition() {
        let ranges = slice_ranges(10, &[(2, 6)], &[4, 8, 30]).expect("valid spans");
        assert_eq!(ranges, vec![0..2, 2..4, 4..6, 6..8, 8..10]);
    }
}
