//! Translation between composite offsets and source document offsets.

use crate::errors::OffsetMapError;
use crate::Span;

/// One contiguous run of composite text copied from a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetRange {
    /// Composite range `[start, end)`.
    pub composite: Span,
    pub source_document: String,
    /// Offset in the source document corresponding to `composite.start`.
    pub source_start: usize,
}

impl OffsetRange {
    pub fn new(composite: Span, source_document: impl Into<String>, source_start: usize) -> Self {
        Self {
            composite,
            source_document: source_document.into(),
            source_start,
        }
    }

    /// The range this run covers in its source document.
    pub fn source_span(&self) -> Span {
        Span::new(self.source_start, self.source_start + self.composite.len())
    }

    fn translate(&self, composite_offset: usize) -> usize {
        self.source_start + (composite_offset - self.composite.start)
    }
}

/// A `(document, offset)` position in a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    pub document_id: String,
    pub offset: usize,
}

/// Immutable table of [`OffsetRange`]s, sorted by composite start and non-overlapping.
///
/// Lookups binary-search the ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetMap {
    ranges: Vec<OffsetRange>,
}

impl OffsetMap {
    /// Build a map from ranges in any order. Fails on inverted or overlapping ranges.
    pub fn new(mut ranges: Vec<OffsetRange>) -> Result<Self, OffsetMapError> {
        for range in &ranges {
            if range.composite.start > range.composite.end {
                return Err(OffsetMapError::InvertedRange {
                    start: range.composite.start,
                    end: range.composite.end,
                });
            }
        }
        ranges.sort_by_key(|range| range.composite.start);
        for pair in ranges.windows(2) {
            if pair[1].composite.start < pair[0].composite.end {
                return Err(OffsetMapError::Overlapping {
                    first: pair[0].composite,
                    second: pair[1].composite,
                });
            }
        }
        Ok(Self { ranges })
    }

    /// A single range mapping composite offset `o` to `source_start + o` for `o < len`.
    pub fn identity(source_document: impl Into<String>, source_start: usize, len: usize) -> Self {
        Self {
            ranges: vec![OffsetRange::new(Span::new(0, len), source_document, source_start)],
        }
    }

    pub fn ranges(&self) -> &[OffsetRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Index of the range containing `composite_offset`.
    fn range_index(&self, composite_offset: usize) -> Option<usize> {
        let idx = self
            .ranges
            .partition_point(|range| range.composite.end <= composite_offset);
        let range = self.ranges.get(idx)?;
        if range.composite.start <= composite_offset {
            Some(idx)
        } else {
            None
        }
    }

    /// Resolve a composite offset to its source position. None if no range covers it.
    pub fn resolve(&self, composite_offset: usize) -> Option<SourcePosition> {
        let range = &self.ranges[self.range_index(composite_offset)?];
        Some(SourcePosition {
            document_id: range.source_document.clone(),
            offset: range.translate(composite_offset),
        })
    }

    /// Source offset for `composite_offset`, only if it maps into `document_id`.
    pub fn offset_in_source(&self, document_id: &str, composite_offset: usize) -> Option<usize> {
        self.resolve(composite_offset)
            .filter(|position| position.document_id == document_id)
            .map(|position| position.offset)
    }

    /// Resolve a composite span lying within one range to `(document, source span)`.
    ///
    /// The end is exclusive, so a span may end exactly at its range's end. An
    /// empty span sitting at a range's end also resolves.
    pub fn resolve_span(&self, span: Span) -> Option<(&str, Span)> {
        if span.start > span.end {
            return None;
        }
        let range = match self.range_index(span.start) {
            Some(idx) => &self.ranges[idx],
            None if span.is_empty() => self
                .ranges
                .iter()
                .find(|range| range.composite.end == span.start)?,
            None => return None,
        };
        if span.end > range.composite.end {
            return None;
        }
        let start = range.source_start + (span.start - range.composite.start);
        Some((
            range.source_document.as_str(),
            Span::new(start, start + span.len()),
        ))
    }

    /// Inverse lookup: the composite offset a source position was copied to.
    pub fn to_composite(&self, document_id: &str, source_offset: usize) -> Option<usize> {
        self.ranges
            .iter()
            .filter(|range| range.source_document == document_id)
            .find(|range| {
                range.source_start <= source_offset
                    && source_offset < range.source_start + range.composite.len()
            })
            .map(|range| range.composite.start + (source_offset - range.source_start))
    }

    /// Inverse of [`resolve_span`](Self::resolve_span) for a source span copied into one range.
    pub fn to_composite_span(&self, document_id: &str, source: Span) -> Option<Span> {
        self.ranges
            .iter()
            .filter(|range| range.source_document == document_id)
            .find(|range| range.source_span().contains_span(&source))
            .map(|range| {
                let start = range.composite.start + (source.start - range.source_start);
                Span::new(start, start + source.len())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_documents() -> OffsetMap {
        // "hello" from en@100, then "\n" unmapped, then "bonjour" from fr@20
        OffsetMap::new(vec![
            OffsetRange::new(Span::new(6, 13), "fr", 20),
            OffsetRange::new(Span::new(0, 5), "en", 100),
        ])
        .unwrap()
    }

    #[test]
    fn identity_maps_every_offset_in_range() {
        let map = OffsetMap::identity("doc", 10, 5);
        for offset in 0..5 {
            assert_eq!(
                map.resolve(offset),
                Some(SourcePosition {
                    document_id: "doc".into(),
                    offset: 10 + offset
                })
            );
        }
        assert_eq!(map.resolve(5), None);
        assert_eq!(map.resolve(500), None);
    }

    #[test]
    fn ranges_are_sorted_on_construction() {
        let map = two_documents();
        let starts: Vec<usize> = map.ranges().iter().map(|r| r.composite.start).collect();
        assert_eq!(starts, vec![0, 6]);
    }

    #[test]
    fn gaps_resolve_to_none() {
        let map = two_documents();
        assert_eq!(map.resolve(4).map(|p| p.offset), Some(104));
        assert_eq!(map.resolve(5), None);
        assert_eq!(map.resolve(6).map(|p| (p.document_id, p.offset)), Some(("fr".into(), 20)));
        assert_eq!(map.resolve(12).map(|p| p.offset), Some(26));
        assert_eq!(map.resolve(13), None);
    }

    #[test]
    fn offset_in_source_is_document_restricted() {
        let map = two_documents();
        assert_eq!(map.offset_in_source("en", 2), Some(102));
        assert_eq!(map.offset_in_source("fr", 2), None);
        assert_eq!(map.offset_in_source("fr", 7), Some(21));
    }

    #[test]
    fn overlapping_ranges_are_rejected() {
        let err = OffsetMap::new(vec![
            OffsetRange::new(Span::new(0, 5), "a", 0),
            OffsetRange::new(Span::new(4, 8), "b", 0),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            OffsetMapError::Overlapping {
                first: Span::new(0, 5),
                second: Span::new(4, 8)
            }
        );
    }

    #[test]
    fn resolve_span_requires_a_single_range() {
        let map = two_documents();
        assert_eq!(map.resolve_span(Span::new(1, 5)), Some(("en", Span::new(101, 105))));
        assert_eq!(map.resolve_span(Span::new(5, 5)), Some(("en", Span::new(105, 105))));
        assert_eq!(map.resolve_span(Span::new(8, 13)), Some(("fr", Span::new(22, 27))));
        assert_eq!(map.resolve_span(Span::new(3, 8)), None);
        assert_eq!(map.resolve_span(Span::new(12, 14)), None);
    }

    #[test]
    fn inverse_lookup() {
        let map = two_documents();
        assert_eq!(map.to_composite("fr", 22), Some(8));
        assert_eq!(map.to_composite("fr", 27), None);
        assert_eq!(map.to_composite("en", 22), None);
        assert_eq!(map.to_composite_span("en", Span::new(101, 103)), Some(Span::new(1, 3)));
        assert_eq!(map.to_composite_span("en", Span::new(101, 106)), None);
    }
}
