//! Annotations and annotation sets.

use super::FeatureMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Half-open byte range `[start, end)` within a document's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `other` lies entirely within this span.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Shift both ends by `-origin`. Returns None if the span starts before `origin`.
    pub fn relative_to(&self, origin: usize) -> Option<Span> {
        Some(Span::new(
            self.start.checked_sub(origin)?,
            self.end.checked_sub(origin)?,
        ))
    }

    /// Shift both ends by `+offset`.
    pub fn shifted(&self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Document-wide annotation identifier.
///
/// IDs are handed out in increasing order, so ID order is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl AnnotationId {
    pub fn next(self) -> AnnotationId {
        AnnotationId(self.0 + 1)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A typed span with features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub kind: String,
    pub span: Span,
    #[serde(default)]
    pub features: FeatureMap,
}

impl Annotation {
    pub fn new(id: AnnotationId, kind: impl Into<String>, span: Span, features: FeatureMap) -> Self {
        Self {
            id,
            kind: kind.into(),
            span,
            features,
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }
}

/// A collection of annotations, keyed by ID.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    annotations: BTreeMap<AnnotationId, Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.annotations.contains_key(&id)
    }

    /// Iterate in ID (creation) order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values()
    }

    /// All annotations of the given type, in ID order.
    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.iter().filter(move |annotation| annotation.kind == kind)
    }

    /// All annotations of the given type, sorted by start offset.
    ///
    /// The sort is stable, so annotations sharing a start offset stay in ID order.
    pub fn of_type_by_offset<'a>(&'a self, kind: &str) -> Vec<&'a Annotation> {
        let mut found: Vec<&'a Annotation> = self
            .iter()
            .filter(|annotation| annotation.kind == kind)
            .collect();
        found.sort_by_key(|annotation| annotation.span.start);
        found
    }

    /// All annotations lying entirely within `span`, in ID order.
    pub fn within<'a>(&'a self, span: Span) -> impl Iterator<Item = &'a Annotation> + 'a {
        self.iter()
            .filter(move |annotation| span.contains_span(&annotation.span))
    }

    /// Insert an annotation, returning the one it replaced, if any.
    pub(crate) fn insert(&mut self, annotation: Annotation) -> Option<Annotation> {
        self.annotations.insert(annotation.id, annotation)
    }

    pub(crate) fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        self.annotations.remove(&id)
    }

    pub(crate) fn max_id(&self) -> Option<AnnotationId> {
        self.annotations.keys().next_back().copied()
    }
}
