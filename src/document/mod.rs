//! Document model: text, features and named annotation sets.
//!
//! [`Document`] is the plain owned document. The [`AnnotatedDocument`] trait is
//! the document-shaped interface that plain documents, composite documents and
//! containers all expose, so pipeline steps can work on any of them through a
//! [`DocumentHandle`].

mod annotation;
mod feature;

pub use annotation::{Annotation, AnnotationId, AnnotationSet, Span};
pub use feature::{features, FeatureMap, FeatureValue};

use crate::container::DocumentContainer;
use crate::errors::DocumentError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Shared, type-erased document reference.
pub type DocumentHandle = Rc<dyn AnnotatedDocument>;

/// Normalize an annotation set name: `None`, empty or blank names select the default set.
pub fn resolve_set_name(name: Option<&str>) -> Option<&str> {
    name.filter(|name| !name.trim().is_empty())
}

/// Returns true if both handles point at the same document.
pub fn same_document(a: &DocumentHandle, b: &DocumentHandle) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// Check that `span` lies within `text` and on character boundaries.
pub fn check_text_span(text: &str, span: Span) -> Result<(), DocumentError> {
    if span.start > span.end || span.end > text.len() {
        return Err(DocumentError::SpanOutOfRange {
            span,
            len: text.len(),
        });
    }
    for offset in [span.start, span.end] {
        if !text.is_char_boundary(offset) {
            return Err(DocumentError::NotCharBoundary { offset });
        }
    }
    Ok(())
}

/// The interface every document-shaped resource exposes.
///
/// All methods take `&self`; implementations use interior mutability since
/// documents are shared between a container, composites built from them and the
/// analysis steps bound to them. Values are returned owned.
pub trait AnnotatedDocument {
    fn name(&self) -> String;

    fn text(&self) -> String;

    /// Text length in bytes.
    fn text_len(&self) -> usize;

    fn features(&self) -> FeatureMap;

    fn set_feature(&self, name: &str, value: FeatureValue) -> Result<(), DocumentError>;

    /// All annotations of a set, in ID order.
    fn annotations(&self, set: Option<&str>) -> Vec<Annotation>;

    fn annotations_of_type(&self, set: Option<&str>, kind: &str) -> Vec<Annotation> {
        self.annotations(set)
            .into_iter()
            .filter(|annotation| annotation.kind == kind)
            .collect()
    }

    fn annotation(&self, set: Option<&str>, id: AnnotationId) -> Option<Annotation>;

    /// Create an annotation with a freshly minted ID.
    fn add_annotation(
        &self,
        set: Option<&str>,
        kind: &str,
        span: Span,
        features: FeatureMap,
    ) -> Result<AnnotationId, DocumentError>;

    /// Insert an annotation that already carries an ID.
    fn insert_annotation(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError>;

    fn remove_annotation(
        &self,
        set: Option<&str>,
        id: AnnotationId,
    ) -> Result<Option<Annotation>, DocumentError>;

    /// The ID the next [`add_annotation`](Self::add_annotation) would mint, when
    /// the document can tell.
    fn peek_next_annotation_id(&self) -> Option<AnnotationId> {
        None
    }

    /// Capability query for documents that are containers of other documents.
    fn as_container(&self) -> Option<&DocumentContainer> {
        None
    }
}

/// A plain document owning its text and annotations.
#[derive(Debug, Clone)]
pub struct Document {
    name: String,
    text: String,
    features: FeatureMap,
    default_set: AnnotationSet,
    named_sets: BTreeMap<String, AnnotationSet>,
    next_annotation_id: AnnotationId,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            features: FeatureMap::new(),
            default_set: AnnotationSet::new(),
            named_sets: BTreeMap::new(),
            next_annotation_id: AnnotationId(0),
        }
    }

    /// Wrap into the shared form used by containers and pipeline steps.
    pub fn into_shared(self) -> Rc<RefCell<Document>> {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn features(&self) -> &FeatureMap {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureMap {
        &mut self.features
    }

    /// Look up a set. The default set always exists; named sets exist once written to.
    pub fn annotation_set(&self, set: Option<&str>) -> Option<&AnnotationSet> {
        match resolve_set_name(set) {
            None => Some(&self.default_set),
            Some(name) => self.named_sets.get(name),
        }
    }

    /// Names of the named (non-default) sets.
    pub fn set_names(&self) -> impl Iterator<Item = &str> {
        self.named_sets.keys().map(String::as_str)
    }

    fn annotation_set_mut(&mut self, set: Option<&str>) -> &mut AnnotationSet {
        match resolve_set_name(set) {
            None => &mut self.default_set,
            Some(name) => self.named_sets.entry(name.to_string()).or_default(),
        }
    }

    fn all_sets(&self) -> impl Iterator<Item = &AnnotationSet> {
        std::iter::once(&self.default_set).chain(self.named_sets.values())
    }

    /// Returns true if any set of this document holds an annotation with this ID.
    pub fn contains_annotation_id(&self, id: AnnotationId) -> bool {
        self.all_sets().any(|set| set.contains(id))
    }

    /// Check a span against the text: in range and on character boundaries.
    pub fn check_span(&self, span: Span) -> Result<(), DocumentError> {
        check_text_span(&self.text, span)
    }

    pub fn add_annotation(
        &mut self,
        set: Option<&str>,
        kind: impl Into<String>,
        span: Span,
        features: FeatureMap,
    ) -> Result<AnnotationId, DocumentError> {
        self.check_span(span)?;
        let id = self.next_annotation_id;
        self.next_annotation_id = id.next();
        self.annotation_set_mut(set)
            .insert(Annotation::new(id, kind, span, features));
        Ok(id)
    }

    /// Insert an annotation keeping its ID. IDs are unique across all sets.
    pub fn insert_annotation(
        &mut self,
        set: Option<&str>,
        annotation: Annotation,
    ) -> Result<(), DocumentError> {
        self.check_span(annotation.span)?;
        if self.contains_annotation_id(annotation.id) {
            return Err(DocumentError::DuplicateAnnotationId(annotation.id));
        }
        self.reserve_annotation_ids(annotation.id.next());
        self.annotation_set_mut(set).insert(annotation);
        Ok(())
    }

    pub fn remove_annotation(&mut self, set: Option<&str>, id: AnnotationId) -> Option<Annotation> {
        match resolve_set_name(set) {
            None => self.default_set.remove(id),
            Some(name) => self.named_sets.get_mut(name)?.remove(id),
        }
    }

    pub fn peek_next_annotation_id(&self) -> AnnotationId {
        self.next_annotation_id
    }

    /// Make sure the next minted ID is at least `next`. Never moves the counter backwards.
    pub fn reserve_annotation_ids(&mut self, next: AnnotationId) {
        if next > self.next_annotation_id {
            self.next_annotation_id = next;
        }
    }

    /// Highest ID used in any set.
    pub fn max_annotation_id(&self) -> Option<AnnotationId> {
        self.all_sets().filter_map(AnnotationSet::max_id).max()
    }
}

impl AnnotatedDocument for RefCell<Document> {
    fn name(&self) -> String {
        self.borrow().name.clone()
    }

    fn text(&self) -> String {
        self.borrow().text.clone()
    }

    fn text_len(&self) -> usize {
        self.borrow().text.len()
    }

    fn features(&self) -> FeatureMap {
        self.borrow().features.clone()
    }

    fn set_feature(&self, name: &str, value: FeatureValue) -> Result<(), DocumentError> {
        self.borrow_mut().features.insert(name.to_string(), value);
        Ok(())
    }

    fn annotations(&self, set: Option<&str>) -> Vec<Annotation> {
        self.borrow()
            .annotation_set(set)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn annotation(&self, set: Option<&str>, id: AnnotationId) -> Option<Annotation> {
        self.borrow()
            .annotation_set(set)
            .and_then(|set| set.get(id).cloned())
    }

    fn add_annotation(
        &self,
        set: Option<&str>,
        kind: &str,
        span: Span,
        features: FeatureMap,
    ) -> Result<AnnotationId, DocumentError> {
        self.borrow_mut().add_annotation(set, kind, span, features)
    }

    fn insert_annotation(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError> {
        self.borrow_mut().insert_annotation(set, annotation)
    }

    fn remove_annotation(
        &self,
        set: Option<&str>,
        id: AnnotationId,
    ) -> Result<Option<Annotation>, DocumentError> {
        Ok(self.borrow_mut().remove_annotation(set, id))
    }

    fn peek_next_annotation_id(&self) -> Option<AnnotationId> {
        Some(self.borrow().next_annotation_id)
    }
}
