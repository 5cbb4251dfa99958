//! Composite documents: temporary views built from spans of container members.
//!
//! A [`CompositeDocument`] holds its own text plus an [`OffsetMap`] back to the
//! members it was combined from. Annotations created on the composite are
//! written through to the source member at translated offsets, keeping the same
//! ID, so they outlive the composite.

mod display;
mod offset_map;

pub use display::CompositeDisplay;
pub use offset_map::{OffsetMap, OffsetRange, SourcePosition};

use crate::combining::CombiningParameters;
use crate::errors::DocumentError;
use crate::{
    AnnotatedDocument, Annotation, AnnotationId, Document, DocumentContainer, DocumentHandle,
    FeatureMap, FeatureValue, Span,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Name prefix of generated composite names.
pub const COMPOSITE_DOC_NAME: &str = "Composite";

static NEXT_COMPOSITE: AtomicU64 = AtomicU64::new(0);

/// A fresh `Composite<N>` name, unique within the process.
pub fn next_composite_name() -> String {
    format!(
        "{}{}",
        COMPOSITE_DOC_NAME,
        NEXT_COMPOSITE.fetch_add(1, Ordering::Relaxed)
    )
}

pub struct CompositeDocument {
    name: RefCell<String>,
    content: RefCell<Document>,
    container: Weak<DocumentContainer>,
    container_id: String,
    offset_map: OffsetMap,
    sources: BTreeMap<String, DocumentHandle>,
    strategy: String,
    parameters: CombiningParameters,
    released: Cell<bool>,
}

impl std::fmt::Debug for CompositeDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeDocument")
            .field("name", &*self.name.borrow())
            .field("container", &self.container_id)
            .field("combined", &self.sources.keys().collect::<Vec<_>>())
            .field("strategy", &self.strategy)
            .field("offset_map", &self.offset_map)
            .field("released", &self.released.get())
            .finish()
    }
}

impl CompositeDocument {
    /// Create a composite over `text`, owned by `container`.
    ///
    /// Every document named in `offset_map` must be added with
    /// [`with_source`](Self::with_source) for write-through to reach it.
    pub fn new(container: &Rc<DocumentContainer>, text: impl Into<String>, offset_map: OffsetMap) -> Self {
        Self {
            name: RefCell::new(next_composite_name()),
            content: RefCell::new(Document::new(COMPOSITE_DOC_NAME, text)),
            container: Rc::downgrade(container),
            container_id: container.id().to_string(),
            offset_map,
            sources: BTreeMap::new(),
            strategy: String::new(),
            parameters: CombiningParameters::default(),
            released: Cell::new(false),
        }
    }

    pub fn with_source(mut self, document_id: impl Into<String>, document: DocumentHandle) -> Self {
        self.sources.insert(document_id.into(), document);
        self
    }

    /// Record how this composite was built.
    pub fn with_parameters(mut self, strategy: impl Into<String>, parameters: CombiningParameters) -> Self {
        self.strategy = strategy.into();
        self.parameters = parameters;
        self
    }

    pub fn set_name(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// The owning container, if it is still alive.
    pub fn container(&self) -> Option<Rc<DocumentContainer>> {
        self.container.upgrade()
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn offset_map(&self) -> &OffsetMap {
        &self.offset_map
    }

    /// IDs of the members this composite was combined from.
    pub fn combined_document_ids(&self) -> BTreeSet<String> {
        self.sources.keys().cloned().collect()
    }

    pub fn strategy_name(&self) -> &str {
        &self.strategy
    }

    pub fn combining_parameters(&self) -> &CombiningParameters {
        &self.parameters
    }

    /// Source position of a composite offset. None outside every mapped range.
    pub fn resolve_to_source(&self, composite_offset: usize) -> Option<SourcePosition> {
        self.offset_map.resolve(composite_offset)
    }

    /// Offset in `document_id` for a composite offset, if it maps into that document.
    pub fn offset_in_source(&self, document_id: &str, composite_offset: usize) -> Option<usize> {
        self.offset_map.offset_in_source(document_id, composite_offset)
    }

    /// Raise the ID counter so that newly minted IDs are at least `next`.
    pub fn seed_annotation_ids(&self, next: AnnotationId) {
        self.content.borrow_mut().reserve_annotation_ids(next);
    }

    /// Add an annotation to the composite's own view only, keeping its ID.
    ///
    /// Used when copying existing source markup in; nothing is written through.
    pub fn import_annotation(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError> {
        self.content.borrow_mut().insert_annotation(set, annotation)
    }

    /// Detach from the sources. Reads keep working; writes fail afterwards.
    pub fn release(&self) {
        if !self.released.replace(true) {
            tracing::debug!(composite = %self.name.borrow(), "composite released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    pub fn display(&self) -> CompositeDisplay<'_> {
        CompositeDisplay::new(self)
    }

    fn ensure_live(&self) -> Result<(), DocumentError> {
        if self.released.get() {
            Err(DocumentError::Released(self.name.borrow().clone()))
        } else {
            Ok(())
        }
    }

    /// Translate a composite span to its source document.
    fn map_span(&self, span: Span) -> Result<(DocumentHandle, String, Span), DocumentError> {
        let unmapped = || DocumentError::Unmapped {
            composite: self.name.borrow().clone(),
            span,
        };
        let (document_id, source_span) = self.offset_map.resolve_span(span).ok_or_else(unmapped)?;
        let source = self.sources.get(document_id).ok_or_else(unmapped)?;
        Ok((source.clone(), document_id.to_string(), source_span))
    }

    fn write_through(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError> {
        if self.content.borrow().contains_annotation_id(annotation.id) {
            return Err(DocumentError::DuplicateAnnotationId(annotation.id));
        }
        let (source, document_id, source_span) = self.map_span(annotation.span)?;
        let mut translated = annotation.clone();
        translated.span = source_span;
        source.insert_annotation(set, translated)?;
        tracing::trace!(
            composite = %self.name.borrow(),
            source = %document_id,
            id = %annotation.id,
            span = %source_span,
            "annotation written through"
        );
        self.content.borrow_mut().insert_annotation(set, annotation)
    }
}

impl AnnotatedDocument for CompositeDocument {
    fn name(&self) -> String {
        self.name.borrow().clone()
    }

    fn text(&self) -> String {
        self.content.borrow().text().to_string()
    }

    fn text_len(&self) -> usize {
        self.content.borrow().text().len()
    }

    fn features(&self) -> FeatureMap {
        self.content.borrow().features().clone()
    }

    fn set_feature(&self, name: &str, value: FeatureValue) -> Result<(), DocumentError> {
        self.ensure_live()?;
        self.content
            .borrow_mut()
            .features_mut()
            .insert(name.to_string(), value);
        Ok(())
    }

    fn annotations(&self, set: Option<&str>) -> Vec<Annotation> {
        self.content
            .borrow()
            .annotation_set(set)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn annotation(&self, set: Option<&str>, id: AnnotationId) -> Option<Annotation> {
        self.content
            .borrow()
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
        self.ensure_live()?;
        self.content.borrow().check_span(span)?;
        let (source, _, _) = self.map_span(span)?;
        // The source may have minted IDs of its own since this composite was seeded.
        if let Some(next) = source.peek_next_annotation_id() {
            self.seed_annotation_ids(next);
        }
        let id = self.content.borrow().peek_next_annotation_id();
        self.write_through(set, Annotation::new(id, kind, span, features))?;
        Ok(id)
    }

    fn insert_annotation(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError> {
        self.ensure_live()?;
        self.content.borrow().check_span(annotation.span)?;
        self.write_through(set, annotation)
    }

    fn remove_annotation(
        &self,
        set: Option<&str>,
        id: AnnotationId,
    ) -> Result<Option<Annotation>, DocumentError> {
        self.ensure_live()?;
        let removed = self.content.borrow_mut().remove_annotation(set, id);
        if let Some(annotation) = &removed {
            let (source, _, _) = self.map_span(annotation.span)?;
            source.remove_annotation(set, id)?;
        }
        Ok(removed)
    }

    fn peek_next_annotation_id(&self) -> Option<AnnotationId> {
        Some(self.content.borrow().peek_next_annotation_id())
    }
}
