//! Pipelines: ordered lists of analysis steps run as one step.

use crate::errors::{BoxError, ConfigurationError, StepError};
use crate::scope::BoundStep;
use crate::step::{AnalysisStep, Binding};
use crate::{Corpus, SegmentConfig, SegmentProcessor, WordTokenizer};
use layered_composite::DocumentHandle;
use std::error::Error;
use std::rc::Rc;

/// Runs its steps in order on one document.
///
/// A pipeline bound to a document is running nested inside something else: it
/// runs its steps on that document and leaves lifecycle callbacks to its driver.
/// An unbound pipeline runs its steps on every document of its corpus and fires
/// `run_started`, then `run_finished` or `run_aborted`, on its steps itself.
///
/// Presets:
/// - `tokenize()` - Word tokens only
/// - `segmented(config)` - Word tokens per segment, through a [`SegmentProcessor`]
pub struct Pipeline {
    name: String,
    steps: Vec<Box<dyn AnalysisStep>>,
    binding: Binding,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("steps", &self.steps.iter().map(|s| s.name().to_string()).collect::<Vec<_>>())
            .field("binding", &self.binding)
            .finish()
    }
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
            binding: Binding::default(),
        }
    }

    /// Word tokens only.
    pub fn tokenize() -> Self {
        Self::new("tokenize").with_step(WordTokenizer::new())
    }

    /// Word tokens for each segment selected by `config`.
    pub fn segmented(config: SegmentConfig) -> Self {
        Self::new("segmented")
            .with_step(SegmentProcessor::new(config).with_step(Self::tokenize()))
    }

    pub fn with_step<S: AnalysisStep + 'static>(mut self, step: S) -> Self {
        self.push(Box::new(step));
        self
    }

    pub fn push(&mut self, step: Box<dyn AnalysisStep>) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Box<dyn AnalysisStep>] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn run_steps(&mut self, document: &DocumentHandle, corpus: Option<Rc<Corpus>>) -> Result<(), BoxError> {
        for step in &mut self.steps {
            let mut step = BoundStep::new(&mut **step);
            step.set_document(Some(document.clone()));
            step.set_corpus(corpus.clone());
            step.execute().map_err(|source| StepError {
                step: step.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

impl AnalysisStep for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn document(&self) -> Option<DocumentHandle> {
        self.binding.document.clone()
    }

    fn set_document(&mut self, document: Option<DocumentHandle>) {
        self.binding.document = document;
    }

    fn corpus(&self) -> Option<Rc<Corpus>> {
        self.binding.corpus.clone()
    }

    fn set_corpus(&mut self, corpus: Option<Rc<Corpus>>) {
        self.binding.corpus = corpus;
    }

    fn execute(&mut self) -> Result<(), BoxError> {
        if self.is_bound() {
            let document = self.document().ok_or(ConfigurationError::MissingDocument)?;
            let corpus = self.binding.corpus.clone();
            return self.run_steps(&document, corpus);
        }

        let corpus = self
            .binding
            .corpus
            .clone()
            .ok_or(ConfigurationError::MissingDocument)?;
        tracing::debug!(pipeline = %self.name, documents = corpus.len(), "pipeline started");
        self.run_started();
        let result = corpus
            .documents()
            .iter()
            .try_for_each(|document| self.run_steps(document, Some(corpus.clone())));
        match &result {
            Ok(()) => self.run_finished(),
            Err(err) => {
                tracing::warn!(pipeline = %self.name, error = %err, "pipeline aborted");
                self.run_aborted(&**err);
            }
        }
        result
    }

    fn is_pipeline(&self) -> bool {
        true
    }

    fn run_started(&mut self) {
        for step in &mut self.steps {
            step.run_started();
        }
    }

    fn run_finished(&mut self) {
        for step in &mut self.steps {
            step.run_finished();
        }
    }

    fn run_aborted(&mut self, cause: &(dyn Error + 'static)) {
        for step in &mut self.steps {
            step.run_aborted(cause);
        }
    }
}
