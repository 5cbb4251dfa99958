use super::{CombiningParameters, CombiningStrategy};
use crate::errors::{CombiningError, CombiningResult};
use crate::{AnnotatedDocument, CompositeDocument, DocumentContainer, OffsetMap, OffsetRange, Span};
use std::rc::Rc;

/// Builds a composite from the full texts of several members, in the order
/// given by `document_ids`, joined by `separator` (a newline by default).
///
/// Separators are not mapped to any source. Existing annotations are not
/// copied, since IDs are only unique within one member.
#[derive(Debug, Clone, Copy, Default)]
pub struct CombineMembers;

impl CombineMembers {
    pub const NAME: &'static str = "combine-members";
}

impl CombiningStrategy for CombineMembers {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn combine(
        &self,
        container: &Rc<DocumentContainer>,
        parameters: &CombiningParameters,
    ) -> CombiningResult<CompositeDocument> {
        parameters.primary_document()?;
        let separator = parameters.separator.as_deref().unwrap_or("\n");

        let mut text = String::new();
        let mut ranges = Vec::with_capacity(parameters.document_ids.len());
        let mut sources = Vec::with_capacity(parameters.document_ids.len());
        for (idx, document_id) in parameters.document_ids.iter().enumerate() {
            if sources.iter().any(|(id, _)| id == document_id) {
                return Err(CombiningError::DuplicateDocument(document_id.clone()));
            }
            let member = container.get_document(document_id)?;
            if idx > 0 {
                text.push_str(separator);
            }
            let start = text.len();
            text.push_str(&member.text());
            ranges.push(OffsetRange::new(Span::new(start, text.len()), document_id.clone(), 0));
            sources.push((document_id.clone(), member));
        }

        let seed = parameters.annotation_id_seed.into_iter().chain(
            sources
                .iter()
                .filter_map(|(_, member)| member.peek_next_annotation_id()),
        )
        .max();

        let mut composite = CompositeDocument::new(container, text, OffsetMap::new(ranges)?)
            .with_parameters(Self::NAME, parameters.clone());
        for (document_id, member) in sources {
            composite = composite.with_source(document_id, member);
        }
        if let Some(seed) = seed {
            composite.seed_annotation_ids(seed);
        }

        tracing::debug!(
            composite = %composite.name(),
            members = parameters.document_ids.len(),
            "combined composite from members"
        );

        Ok(composite)
    }
}
