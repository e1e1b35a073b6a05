use std::collections::HashMap;

use serde::Deserialize;

use super::index::SpanIndex;
use super::{Region, SpanId};

/// What the resolver memo is keyed on.
///
/// `Start` reproduces the comparator UI's behaviour where two regions with the
/// same file and start share an answer regardless of their end; it is only
/// correct when callers always query the ranges the index was built from.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemoKeying {
    #[default]
    Range,
    Start,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MemoKey {
    file_id: String,
    start: usize,
    end: Option<usize>,
}

/// Resolves query regions to their largest enclosing span, memoized.
///
/// The memo belongs to one [`SpanIndex`]; it must be dropped or cleared
/// whenever the index is rebuilt.
#[derive(Clone, Debug, Default)]
pub struct RegionResolver {
    keying: MemoKeying,
    memo: HashMap<MemoKey, Option<SpanId>>,
}

impl RegionResolver {
    pub fn new(keying: MemoKeying) -> Self {
        Self {
            keying,
            memo: HashMap::new(),
        }
    }

    pub fn keying(&self) -> MemoKeying {
        self.keying
    }

    pub fn clear(&mut self) {
        self.memo.clear();
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn resolve(&mut self, index: &SpanIndex, region: &Region) -> Option<SpanId> {
        let key = MemoKey {
            file_id: region.file_id.clone(),
            start: region.start,
            end: match self.keying {
                MemoKeying::Range => Some(region.end),
                MemoKeying::Start => None,
            },
        };

        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }

        let resolved = resolve_uncached(index, region);
        self.memo.insert(key, resolved);
        resolved
    }
}

/// Largest span of the region's file containing it; ties go to the span that
/// comes first in document order.
pub fn resolve_uncached(index: &SpanIndex, region: &Region) -> Option<SpanId> {
    index
        .spans_in_file(&region.file_id)
        .iter()
        .copied()
        .filter(|&id| index.span(id).is_some_and(|span| span.contains_region(region)))
        .max_by(|&a, &b| {
            let extent = |id| index.span(id).map(|span| span.extent()).unwrap_or(0);
            extent(a)
                .cmp(&extent(b))
                .then_with(|| index.position_key(b).cmp(&index.position_key(a)))
        })
}
