//! Containers grouping several named member documents.

mod alignment;

pub use alignment::{Alignment, UnitRef};

use crate::errors::{ContainerError, DocumentError};
use crate::{AnnotatedDocument, Annotation, AnnotationId, DocumentHandle, FeatureMap, FeatureValue, Span};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Receives membership changes of a [`DocumentContainer`].
///
/// Delivery is synchronous and in registration order. A listener that panics is
/// reported and skipped; the remaining listeners are still notified.
pub trait ContainerListener {
    fn member_added(&self, _container: &DocumentContainer, _document_id: &str) {}

    fn member_removed(&self, _container: &DocumentContainer, _document_id: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberEvent {
    Added,
    Removed,
}

/// A compound document: named members, a current member, listeners and
/// alignment information keyed by feature name.
///
/// Members are shared handles; a member exclusively owned by the container is
/// released when it is removed or when the container is dropped.
pub struct DocumentContainer {
    id: String,
    members: RefCell<BTreeMap<String, DocumentHandle>>,
    current: RefCell<Option<String>>,
    listeners: RefCell<Vec<Rc<dyn ContainerListener>>>,
    alignments: RefCell<BTreeMap<String, Rc<Alignment>>>,
}

impl std::fmt::Debug for DocumentContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentContainer")
            .field("id", &self.id)
            .field("members", &self.document_ids())
            .field("current", &self.current_document_id())
            .field("listeners", &self.listeners.borrow().len())
            .field("alignments", &self.alignment_feature_names())
            .finish()
    }
}

impl DocumentContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            members: RefCell::new(BTreeMap::new()),
            current: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            alignments: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn unknown(&self, document_id: &str) -> ContainerError {
        ContainerError::UnknownMember {
            container: self.id.clone(),
            document_id: document_id.to_string(),
        }
    }

    /// Register a member and notify listeners.
    pub fn add_document(
        &self,
        document_id: impl Into<String>,
        document: DocumentHandle,
    ) -> Result<(), ContainerError> {
        let document_id = document_id.into();
        {
            let mut members = self.members.borrow_mut();
            if members.contains_key(&document_id) {
                return Err(ContainerError::DuplicateMember {
                    container: self.id.clone(),
                    document_id,
                });
            }
            members.insert(document_id.clone(), document);
        }
        tracing::debug!(container = %self.id, document = %document_id, "member added");
        self.notify(MemberEvent::Added, &document_id);
        Ok(())
    }

    /// Unregister a member and notify listeners.
    ///
    /// Removing the current member leaves the container without a current member.
    pub fn remove_document(&self, document_id: &str) -> Result<DocumentHandle, ContainerError> {
        let removed = self
            .members
            .borrow_mut()
            .remove(document_id)
            .ok_or_else(|| self.unknown(document_id))?;
        {
            let mut current = self.current.borrow_mut();
            if current.as_deref() == Some(document_id) {
                *current = None;
            }
        }
        tracing::debug!(container = %self.id, document = %document_id, "member removed");
        self.notify(MemberEvent::Removed, document_id);
        Ok(removed)
    }

    pub fn get_document(&self, document_id: &str) -> Result<DocumentHandle, ContainerError> {
        self.members
            .borrow()
            .get(document_id)
            .cloned()
            .ok_or_else(|| self.unknown(document_id))
    }

    pub fn current_document(&self) -> Result<DocumentHandle, ContainerError> {
        let current = self.current_document_id().ok_or_else(|| ContainerError::NoCurrentMember {
            container: self.id.clone(),
        })?;
        self.get_document(&current)
    }

    pub fn current_document_id(&self) -> Option<String> {
        self.current.borrow().clone()
    }

    pub fn set_current_document(&self, document_id: &str) -> Result<(), ContainerError> {
        if !self.contains(document_id) {
            return Err(self.unknown(document_id));
        }
        *self.current.borrow_mut() = Some(document_id.to_string());
        Ok(())
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.members.borrow().contains_key(document_id)
    }

    pub fn document_ids(&self) -> Vec<String> {
        self.members.borrow().keys().cloned().collect()
    }

    pub fn documents(&self) -> Vec<(String, DocumentHandle)> {
        self.members
            .borrow()
            .iter()
            .map(|(id, document)| (id.clone(), document.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.members.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.borrow().is_empty()
    }

    pub fn add_listener(&self, listener: Rc<dyn ContainerListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, listener: &Rc<dyn ContainerListener>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|registered| {
            Rc::as_ptr(registered) as *const () != Rc::as_ptr(listener) as *const ()
        });
        listeners.len() != before
    }

    fn notify(&self, event: MemberEvent, document_id: &str) {
        // Snapshot so listeners may add or remove listeners while being notified.
        let listeners: Vec<Rc<dyn ContainerListener>> = self.listeners.borrow().clone();
        for (idx, listener) in listeners.iter().enumerate() {
            let delivered = catch_unwind(AssertUnwindSafe(|| match event {
                MemberEvent::Added => listener.member_added(self, document_id),
                MemberEvent::Removed => listener.member_removed(self, document_id),
            }));
            if delivered.is_err() {
                tracing::error!(
                    container = %self.id,
                    document = %document_id,
                    listener = idx,
                    ?event,
                    "container listener panicked; continuing with remaining listeners"
                );
            }
        }
    }

    /// Alignment stored under `feature_name`, created empty on first access.
    pub fn alignment_information(&self, feature_name: &str) -> Rc<Alignment> {
        self.alignments
            .borrow_mut()
            .entry(feature_name.to_string())
            .or_default()
            .clone()
    }

    pub fn remove_alignment_information(&self, feature_name: &str) -> Option<Rc<Alignment>> {
        self.alignments.borrow_mut().remove(feature_name)
    }

    pub fn alignment_feature_names(&self) -> Vec<String> {
        self.alignments.borrow().keys().cloned().collect()
    }

    fn current_or_error(&self) -> Result<DocumentHandle, DocumentError> {
        self.current_document()
            .map_err(|_| DocumentError::NoCurrentMember(self.id.clone()))
    }
}

/// A container reads and writes through its current member.
impl AnnotatedDocument for DocumentContainer {
    fn name(&self) -> String {
        self.id.clone()
    }

    fn text(&self) -> String {
        self.current_document()
            .map(|document| document.text())
            .unwrap_or_default()
    }

    fn text_len(&self) -> usize {
        self.current_document()
            .map(|document| document.text_len())
            .unwrap_or(0)
    }

    fn features(&self) -> FeatureMap {
        self.current_document()
            .map(|document| document.features())
            .unwrap_or_default()
    }

    fn set_feature(&self, name: &str, value: FeatureValue) -> Result<(), DocumentError> {
        self.current_or_error()?.set_feature(name, value)
    }

    fn annotations(&self, set: Option<&str>) -> Vec<Annotation> {
        self.current_document()
            .map(|document| document.annotations(set))
            .unwrap_or_default()
    }

    fn annotation(&self, set: Option<&str>, id: AnnotationId) -> Option<Annotation> {
        self.current_document().ok()?.annotation(set, id)
    }

    fn add_annotation(
        &self,
        set: Option<&str>,
        kind: &str,
        span: Span,
        features: FeatureMap,
    ) -> Result<AnnotationId, DocumentError> {
        self.current_or_error()?
            .add_annotation(set, kind, span, features)
    }

    fn insert_annotation(&self, set: Option<&str>, annotation: Annotation) -> Result<(), DocumentError> {
        self.current_or_error()?.insert_annotation(set, annotation)
    }

    fn remove_annotation(
        &self,
        set: Option<&str>,
        id: AnnotationId,
    ) -> Result<Option<Annotation>, DocumentError> {
        self.current_or_error()?.remove_annotation(set, id)
    }

    fn peek_next_annotation_id(&self) -> Option<AnnotationId> {
        self.current_document().ok()?.peek_next_annotation_id()
    }

    fn as_container(&self) -> Option<&DocumentContainer> {
        Some(self)
    }
}
