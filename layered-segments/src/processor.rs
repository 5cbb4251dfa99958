//! Segment-driven processing: run an analysis step once per segment of a document.

use crate::config::SegmentConfig;
use crate::errors::{BoxError, ConfigurationError, SegmentProcessingError, SegmentResult};
use crate::scope::{BoundStep, CompositeGuard, RunScope};
use crate::step::{AnalysisStep, Binding};
use crate::Corpus;
use layered_composite::{
    AnnotatedDocument, Annotation, AnnotationId, CombiningParameters, ContainerListener,
    DocumentHandle, Span, StrategyRegistry,
};
use std::error::Error;
use std::rc::Rc;

/// A segment that was handed to the analysis step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedSegment {
    pub annotation_id: AnnotationId,
    pub span: Span,
    /// Name of the composite the step ran on.
    pub composite: String,
}

/// Outcome of one [`SegmentProcessor::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Annotations of the segment type found in the input set.
    pub discovered: usize,
    /// Segments rejected by the feature filter.
    pub skipped: Vec<AnnotationId>,
    /// Processed segments, in processing order.
    pub processed: Vec<ProcessedSegment>,
}

/// Runs an analysis step on each segment of a document as if the segment were
/// a whole document.
///
/// Segments are the annotations of the configured type in the input set,
/// optionally filtered by a feature value. Each one, in start offset order,
/// becomes a composite document in a run-scoped container. The step is bound
/// to the composite and executed, then the composite is detached and released.
/// Annotations the step creates are written through to the input document.
///
/// ```
/// use layered_composite::{AnnotatedDocument, Document, DocumentHandle, FeatureMap, Span};
/// use layered_segments::{SegmentConfig, SegmentProcessor, WordTokenizer};
///
/// let doc = Document::new("doc", "First part. Second part.").into_shared();
/// doc.borrow_mut().add_annotation(None, "Sentence", Span::new(0, 11), FeatureMap::new()).unwrap();
/// doc.borrow_mut().add_annotation(None, "Sentence", Span::new(12, 24), FeatureMap::new()).unwrap();
///
/// let mut processor = SegmentProcessor::new(SegmentConfig::new("Sentence"))
///     .with_step(WordTokenizer::new());
/// let handle: DocumentHandle = doc.clone();
/// let report = processor.run(&handle).unwrap();
///
/// assert_eq!(report.processed.len(), 2);
/// assert_eq!(doc.annotations_of_type(None, "Token").len(), 6);
/// ```
pub struct SegmentProcessor {
    name: String,
    config: SegmentConfig,
    registry: StrategyRegistry,
    step: Option<Box<dyn AnalysisStep>>,
    listeners: Vec<Rc<dyn ContainerListener>>,
    binding: Binding,
    last_report: Option<RunReport>,
}

impl std::fmt::Debug for SegmentProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SegmentProcessor")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("step", &self.step.as_ref().map(|step| step.name().to_string()))
            .field("binding", &self.binding)
            .finish()
    }
}

impl SegmentProcessor {
    pub fn new(config: SegmentConfig) -> Self {
        Self {
            name: "segment-processor".to_string(),
            config,
            registry: StrategyRegistry::global().clone(),
            step: None,
            listeners: Vec::new(),
            binding: Binding::default(),
            last_report: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The step executed on every segment.
    pub fn with_step<S: AnalysisStep + 'static>(self, step: S) -> Self {
        self.with_boxed_step(Box::new(step))
    }

    pub fn with_boxed_step(mut self, step: Box<dyn AnalysisStep>) -> Self {
        self.step = Some(step);
        self
    }

    /// Look strategies up in `registry` instead of the global one.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Register a listener on every run-scoped container.
    pub fn with_container_listener(mut self, listener: Rc<dyn ContainerListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    pub fn step(&self) -> Option<&(dyn AnalysisStep + 'static)> {
        self.step.as_deref()
    }

    pub fn step_mut(&mut self) -> Option<&mut (dyn AnalysisStep + 'static)> {
        self.step.as_deref_mut()
    }

    /// Report of the last run started through [`AnalysisStep::execute`].
    pub fn last_report(&self) -> Option<&RunReport> {
        self.last_report.as_ref()
    }

    fn matches_filter(&self, segment: &Annotation) -> bool {
        match self.config.feature_filter() {
            Some((name, value)) => segment
                .features
                .get(name)
                .map_or(false, |feature| feature.matches_text(value)),
            None => true,
        }
    }

    /// Process every segment of `document`.
    ///
    /// Fails fast: the first segment whose composite cannot be built, or on
    /// which the step fails, ends the run. The in-flight composite, the run
    /// container and the step's bindings are released first.
    pub fn run(&mut self, document: &DocumentHandle) -> SegmentResult<RunReport> {
        self.config.validate(&self.registry)?;
        if self.step.is_none() {
            return Err(ConfigurationError::MissingAnalysisStep.into());
        }
        let strategy = self
            .registry
            .get(&self.config.strategy)
            .map_err(|_| ConfigurationError::UnknownStrategy(self.config.strategy.clone()))?;

        let set = self.config.input_set();
        let discovered = document.annotations_of_type(set, &self.config.segment_type);
        let mut report = RunReport {
            discovered: discovered.len(),
            ..RunReport::default()
        };

        let (mut segments, skipped): (Vec<_>, Vec<_>) = discovered
            .into_iter()
            .partition(|segment| self.matches_filter(segment));
        report.skipped = skipped.iter().map(|segment| segment.id).collect();
        if segments.is_empty() {
            tracing::info!(
                document = %document.name(),
                segment_type = %self.config.segment_type,
                discovered = report.discovered,
                "no segments to process"
            );
            return Ok(report);
        }
        // stable: equal offsets keep creation order
        segments.sort_by_key(|segment| segment.span.start);

        let scope = RunScope::acquire(document, &self.listeners)?;
        let step = match self.step.as_deref_mut() {
            Some(step) => step,
            None => return Err(ConfigurationError::MissingAnalysisStep.into()),
        };
        let mut step = BoundStep::new(step);

        for segment in &segments {
            let parameters = CombiningParameters::from_annotation(scope.member_id(), segment.id)
                .with_input_set(set)
                .with_annotation_id_seed(document.peek_next_annotation_id());
            let composite = strategy
                .combine(scope.container(), &parameters)
                .map_err(|source| SegmentProcessingError::Combining {
                    segment: segment.id,
                    source,
                })?;
            let composite = CompositeGuard::attach(scope.container(), composite)?;
            let composite_name = composite.name().to_string();

            if self.config.debug {
                tracing::info!(segment = %segment.id, span = %segment.span, composite = %composite_name, "processing segment");
            } else {
                tracing::debug!(segment = %segment.id, span = %segment.span, composite = %composite_name, "processing segment");
            }

            step.set_corpus(Some(scope.corpus().clone()));
            step.set_document(Some(composite.handle()));
            let outcome = step.execute();
            let teardown = composite.release();

            outcome.map_err(|source| SegmentProcessingError::Analysis {
                step: step.name().to_string(),
                segment: segment.id,
                source,
            })?;
            teardown.map_err(|source| SegmentProcessingError::Cleanup {
                resource: composite_name.clone(),
                source,
            })?;

            report.processed.push(ProcessedSegment {
                annotation_id: segment.id,
                span: segment.span,
                composite: composite_name,
            });
        }

        drop(step);
        scope.finish()?;

        tracing::info!(
            document = %document.name(),
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "segment run finished"
        );
        Ok(report)
    }
}

impl AnalysisStep for SegmentProcessor {
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
        let document = self
            .binding
            .document
            .clone()
            .ok_or(ConfigurationError::MissingDocument)?;
        let report = self.run(&document)?;
        self.last_report = Some(report);
        Ok(())
    }

    // The step only ever executes bound to a composite. A plain step never
    // fires callbacks itself and a pipeline step is then nested, so both get
    // them from here.
    fn run_started(&mut self) {
        if let Some(step) = self.step.as_deref_mut() {
            step.run_started();
        }
    }

    fn run_finished(&mut self) {
        if let Some(step) = self.step.as_deref_mut() {
            step.run_finished();
        }
    }

    fn run_aborted(&mut self, cause: &(dyn Error + 'static)) {
        if let Some(step) = self.step.as_deref_mut() {
            step.run_aborted(cause);
        }
    }
}
