use layered_composite::{same_document, AnnotatedDocument, DocumentHandle};
use std::cell::RefCell;

/// An ordered group of documents handed to an analysis step alongside its
/// working document.
///
/// A segment run creates one corpus holding its run-scoped container and
/// empties it when the run ends.
#[derive(Default)]
pub struct Corpus {
    name: String,
    documents: RefCell<Vec<DocumentHandle>>,
}

impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("name", &self.name)
            .field(
                "documents",
                &self.documents.borrow().iter().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Corpus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a document. Adding the same document twice is a no-op.
    pub fn add(&self, document: DocumentHandle) {
        if !self.contains(&document) {
            self.documents.borrow_mut().push(document);
        }
    }

    /// Returns true if the document was present.
    pub fn remove(&self, document: &DocumentHandle) -> bool {
        let mut documents = self.documents.borrow_mut();
        let before = documents.len();
        documents.retain(|d| !same_document(d, document));
        documents.len() != before
    }

    pub fn contains(&self, document: &DocumentHandle) -> bool {
        self.documents.borrow().iter().any(|d| same_document(d, document))
    }

    pub fn documents(&self) -> Vec<DocumentHandle> {
        self.documents.borrow().clone()
    }

    pub fn clear(&self) {
        self.documents.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.documents.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.borrow().is_empty()
    }
}
