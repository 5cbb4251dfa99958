//! The analysis step contract.
//!
//! An analysis step is bound to a working document (and optionally a corpus),
//! then executed. Steps that take part in a larger run also receive lifecycle
//! callbacks from whatever drives them.

use crate::errors::BoxError;
use crate::Corpus;
use layered_composite::{AnnotatedDocument, DocumentHandle};
use std::error::Error;
use std::rc::Rc;

/// A unit of analysis run against one bound document at a time.
pub trait AnalysisStep {
    fn name(&self) -> &str;

    fn document(&self) -> Option<DocumentHandle>;

    fn set_document(&mut self, document: Option<DocumentHandle>);

    fn corpus(&self) -> Option<Rc<Corpus>>;

    fn set_corpus(&mut self, corpus: Option<Rc<Corpus>>);

    /// Process the bound document.
    fn execute(&mut self) -> Result<(), BoxError>;

    /// True for steps that run other steps and fire lifecycle callbacks of
    /// their own when they are not nested.
    fn is_pipeline(&self) -> bool {
        false
    }

    fn is_bound(&self) -> bool {
        self.document().is_some()
    }

    fn run_started(&mut self) {}

    fn run_finished(&mut self) {}

    fn run_aborted(&mut self, _cause: &(dyn Error + 'static)) {}
}

/// Document and corpus bindings, for steps to embed.
#[derive(Clone, Default)]
pub struct Binding {
    pub document: Option<DocumentHandle>,
    pub corpus: Option<Rc<Corpus>>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("document", &self.document.as_ref().map(|d| d.name()))
            .field("corpus", &self.corpus.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

impl Binding {
    /// Capture the current bindings of a step.
    pub fn of(step: &dyn AnalysisStep) -> Self {
        Self {
            document: step.document(),
            corpus: step.corpus(),
        }
    }

    pub fn apply_to(&self, step: &mut dyn AnalysisStep) {
        step.set_document(self.document.clone());
        step.set_corpus(self.corpus.clone());
    }

    /// Returns true if both bindings point at the same document and corpus.
    pub fn same_as(&self, other: &Binding) -> bool {
        let documents = match (&self.document, &other.document) {
            (Some(a), Some(b)) => layered_composite::same_document(a, b),
            (None, None) => true,
            _ => false,
        };
        let corpora = match (&self.corpus, &other.corpus) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        documents && corpora
    }
}
