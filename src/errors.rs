//! Error types for documents, containers, offset maps and combining strategies.

use crate::{AnnotationId, Span};
use thiserror::Error;

/// Errors raised by document operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("span {span} is outside the text (length {len})")]
    SpanOutOfRange { span: Span, len: usize },

    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },

    #[error("annotation id {0} is already in use")]
    DuplicateAnnotationId(AnnotationId),

    /// A composite span that the offset map cannot translate into one source range.
    #[error("span {span} of composite {composite} does not map to a single source range")]
    Unmapped { composite: String, span: Span },

    /// The composite was released and no longer accepts changes.
    #[error("composite document {0} has been released")]
    Released(String),

    #[error("container {0} has no current document")]
    NoCurrentMember(String),
}

/// Violations of the container contract. Container state is unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    #[error("container {container} has no member {document_id}")]
    UnknownMember {
        container: String,
        document_id: String,
    },

    #[error("container {container} already has a member {document_id}")]
    DuplicateMember {
        container: String,
        document_id: String,
    },

    #[error("container {container} has no current document")]
    NoCurrentMember { container: String },
}

/// Invalid offset map construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetMapError {
    #[error("composite range {start}..{end} is inverted")]
    InvertedRange { start: usize, end: usize },

    #[error("composite ranges {first} and {second} overlap")]
    Overlapping { first: Span, second: Span },
}

/// A combining strategy could not build a composite document.
#[derive(Debug, Error)]
pub enum CombiningError {
    #[error("missing combining parameter: {0}")]
    MissingParameter(&'static str),

    #[error("no combining strategy registered as {0:?}")]
    UnknownStrategy(String),

    #[error("member {0} listed more than once")]
    DuplicateDocument(String),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("annotation {id} not found in set {set:?} of document {document_id}")]
    MissingAnnotation {
        document_id: String,
        set: Option<String>,
        id: AnnotationId,
    },

    #[error("invalid span for document {document_id}")]
    InvalidSpan {
        document_id: String,
        #[source]
        source: DocumentError,
    },

    #[error("could not copy annotations into the composite")]
    Document(#[from] DocumentError),

    #[error("invalid offset map")]
    OffsetMap(#[from] OffsetMapError),
}

/// Result type for combining operations.
pub type CombiningResult<T> = Result<T, CombiningError>;
