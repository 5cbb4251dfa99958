use super::{CombiningParameters, CombiningStrategy};
use crate::errors::{CombiningError, CombiningResult};
use crate::{check_text_span, AnnotatedDocument, CompositeDocument, DocumentContainer, OffsetMap, Span};
use std::rc::Rc;

/// Builds a composite from the span of one annotation in one member.
///
/// Parameters: the member in `document_ids[0]`, `annotation_id` in `input_set`.
/// Without an `annotation_id` the whole member text is used.
///
/// The composite maps offset `o` to `start + o` in the member, copies the
/// member's document features, and copies every `input_set` annotation lying
/// inside the span (same IDs, composite coordinates). Its ID counter starts at
/// `annotation_id_seed` if given, else at the member's next unused ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombineFromAnnotationId;

impl CombineFromAnnotationId {
    pub const NAME: &'static str = "combine-from-annotation-id";
}

impl CombiningStrategy for CombineFromAnnotationId {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn narrows_to_annotation(&self) -> bool {
        true
    }

    fn combine(
        &self,
        container: &Rc<DocumentContainer>,
        parameters: &CombiningParameters,
    ) -> CombiningResult<CompositeDocument> {
        let document_id = parameters.primary_document()?;
        let source = container.get_document(document_id)?;
        let set = parameters.input_set.as_deref();

        let span = match parameters.annotation_id {
            Some(id) => {
                source
                    .annotation(set, id)
                    .ok_or_else(|| CombiningError::MissingAnnotation {
                        document_id: document_id.to_string(),
                        set: parameters.input_set.clone(),
                        id,
                    })?
                    .span
            }
            None => Span::new(0, source.text_len()),
        };

        let text = source.text();
        check_text_span(&text, span).map_err(|source| CombiningError::InvalidSpan {
            document_id: document_id.to_string(),
            source,
        })?;

        let composite = CompositeDocument::new(
            container,
            &text[span.start..span.end],
            OffsetMap::identity(document_id, span.start, span.len()),
        )
        .with_source(document_id, source.clone())
        .with_parameters(Self::NAME, parameters.clone());

        for (name, value) in source.features() {
            composite.set_feature(&name, value)?;
        }

        let mut copied = 0;
        for mut annotation in source.annotations(set) {
            if !span.contains_span(&annotation.span) {
                continue;
            }
            annotation.span = Span::new(
                annotation.span.start - span.start,
                annotation.span.end - span.start,
            );
            composite.import_annotation(set, annotation)?;
            copied += 1;
        }

        if let Some(seed) = parameters
            .annotation_id_seed
            .or_else(|| source.peek_next_annotation_id())
        {
            composite.seed_annotation_ids(seed);
        }

        tracing::debug!(
            composite = %composite.name(),
            source = %document_id,
            %span,
            copied,
            "combined composite from annotation"
        );

        Ok(composite)
    }
}
