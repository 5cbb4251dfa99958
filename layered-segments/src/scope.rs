//! Guards for the temporary resources of a segment run.
//!
//! Each guard releases its resource when dropped. Guards declared later in a
//! scope drop first, so a run tears down in reverse order of acquisition on
//! every exit path. The explicit `release`/`finish` methods perform the same
//! teardown but report failures instead of logging them.

use crate::errors::{SegmentProcessingError, SegmentResult};
use crate::step::{AnalysisStep, Binding};
use crate::Corpus;
use layered_composite::{
    AnnotatedDocument, CompositeDocument, ContainerError, ContainerListener, DocumentContainer,
    DocumentHandle,
};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// A step whose document and corpus bindings are put back when the guard drops.
pub struct BoundStep<'a> {
    step: &'a mut dyn AnalysisStep,
    saved: Binding,
}

impl<'a> BoundStep<'a> {
    pub fn new(step: &'a mut dyn AnalysisStep) -> Self {
        let saved = Binding::of(&*step);
        Self { step, saved }
    }

    /// The bindings that will be restored.
    pub fn saved(&self) -> &Binding {
        &self.saved
    }
}

impl<'a> Deref for BoundStep<'a> {
    type Target = dyn AnalysisStep + 'a;

    fn deref(&self) -> &Self::Target {
        &*self.step
    }
}

impl<'a> DerefMut for BoundStep<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.step
    }
}

impl Drop for BoundStep<'_> {
    fn drop(&mut self) {
        self.saved.apply_to(&mut *self.step);
    }
}

/// A composite registered as the current member of a run container.
///
/// Teardown removes the member from the container first and releases the
/// composite after, so listeners never observe a released member.
pub(crate) struct CompositeGuard {
    container: Rc<DocumentContainer>,
    composite: Rc<CompositeDocument>,
    member_id: String,
    attached: bool,
}

impl CompositeGuard {
    pub fn attach(
        container: &Rc<DocumentContainer>,
        composite: CompositeDocument,
    ) -> Result<Self, ContainerError> {
        let composite = Rc::new(composite);
        let member_id = composite.name();
        if let Err(err) = container.add_document(member_id.clone(), composite.clone()) {
            composite.release();
            return Err(err);
        }
        let guard = Self {
            container: container.clone(),
            composite,
            member_id,
            attached: true,
        };
        guard.container.set_current_document(&guard.member_id)?;
        Ok(guard)
    }

    pub fn name(&self) -> &str {
        &self.member_id
    }

    pub fn handle(&self) -> DocumentHandle {
        self.composite.clone()
    }

    pub fn release(mut self) -> Result<(), ContainerError> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<(), ContainerError> {
        if !self.attached {
            return Ok(());
        }
        self.attached = false;
        let removed = self.container.remove_document(&self.member_id).map(drop);
        self.composite.release();
        removed
    }
}

impl Drop for CompositeGuard {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            tracing::error!(composite = %self.member_id, error = %err, "failed to detach composite");
        }
    }
}

/// The run-scoped container and corpus.
///
/// The container starts with one member: the input document, or the current
/// member of the input when the input is itself a container. The input
/// container is never modified; if its current member changed during the run
/// it is set back on exit.
pub(crate) struct RunScope {
    input: DocumentHandle,
    input_current: Option<String>,
    container: Rc<DocumentContainer>,
    corpus: Rc<Corpus>,
    member_id: String,
    finished: bool,
}

impl RunScope {
    pub fn acquire(
        input: &DocumentHandle,
        listeners: &[Rc<dyn ContainerListener>],
    ) -> SegmentResult<Self> {
        let (member_id, member, input_current) = match input.as_container() {
            Some(outer) => {
                let id = outer
                    .current_document_id()
                    .ok_or_else(|| ContainerError::NoCurrentMember {
                        container: outer.id().to_string(),
                    })?;
                let member = outer.get_document(&id)?;
                (id.clone(), member, Some(id))
            }
            None => (input.name(), input.clone(), None),
        };

        let container = Rc::new(DocumentContainer::new(format!("{}-segments", member_id)));
        for listener in listeners {
            container.add_listener(listener.clone());
        }
        container.add_document(member_id.clone(), member)?;

        let corpus = Rc::new(Corpus::new(format!("{}-corpus", container.id())));
        corpus.add(container.clone());

        tracing::debug!(container = %container.id(), member = %member_id, "run scope acquired");

        Ok(Self {
            input: input.clone(),
            input_current,
            container,
            corpus,
            member_id,
            finished: false,
        })
    }

    pub fn container(&self) -> &Rc<DocumentContainer> {
        &self.container
    }

    pub fn corpus(&self) -> &Rc<Corpus> {
        &self.corpus
    }

    /// Member ID of the real document inside the run container.
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    /// Release everything, surfacing the last failure.
    pub fn finish(mut self) -> SegmentResult<()> {
        self.cleanup()
    }

    /// Attempts every release even if one fails.
    fn cleanup(&mut self) -> SegmentResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let mut last = None;

        if let Err(source) = self.container.remove_document(&self.member_id) {
            tracing::warn!(member = %self.member_id, error = %source, "failed to remove wrapped document");
            last = Some(SegmentProcessingError::Cleanup {
                resource: self.member_id.clone(),
                source,
            });
        }

        let container: DocumentHandle = self.container.clone();
        self.corpus.remove(&container);
        self.corpus.clear();

        if let (Some(outer), Some(expected)) = (self.input.as_container(), &self.input_current) {
            if outer.current_document_id().as_ref() != Some(expected) {
                tracing::warn!(
                    container = %outer.id(),
                    member = %expected,
                    "current member changed during the run, restoring"
                );
                if let Err(source) = outer.set_current_document(expected) {
                    last = Some(SegmentProcessingError::Cleanup {
                        resource: outer.id().to_string(),
                        source,
                    });
                }
            }
        }

        tracing::debug!(container = %self.container.id(), "run scope released");
        match last {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for RunScope {
    fn drop(&mut self) {
        if let Err(err) = self.cleanup() {
            tracing::error!(container = %self.container.id(), error = %err, "run cleanup failed");
        }
    }
}
