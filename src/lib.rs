#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Composite documents for layered-nlp pipelines.
//!
//! Many analysis steps only know how to process "a whole document". This crate
//! lets them run on a span of a document, or on a union of several documents,
//! through a temporary [`CompositeDocument`] whose annotations land back in the
//! source documents at the right offsets.
//!
//! ## Core Types
//!
//! - [`Document`] / [`AnnotatedDocument`] - Text, features and annotation sets
//! - [`DocumentContainer`] - Named member documents, listeners and [`Alignment`]s
//! - [`OffsetMap`] - Composite offset ↔ `(member, offset)` translation
//! - [`CompositeDocument`] - The temporary view, writing annotations through to its sources
//! - [`CombiningStrategy`] / [`StrategyRegistry`] - Named ways of building composites
//!
//! ## Example
//!
//! ```
//! use layered_composite::{
//!     AnnotatedDocument, CombiningParameters, Document, DocumentContainer, FeatureMap, Span,
//!     StrategyRegistry,
//! };
//! use std::rc::Rc;
//!
//! let source = Document::new("doc", "Title\nBody text here.").into_shared();
//! let segment = source
//!     .borrow_mut()
//!     .add_annotation(None, "Body", Span::new(6, 21), FeatureMap::new())
//!     .unwrap();
//!
//! let container = Rc::new(DocumentContainer::new("compound"));
//! container.add_document("doc", source.clone()).unwrap();
//!
//! let strategy = StrategyRegistry::global().get("combine-from-annotation-id").unwrap();
//! let composite = strategy
//!     .combine(&container, &CombiningParameters::from_annotation("doc", segment))
//!     .unwrap();
//! assert_eq!(composite.text(), "Body text here.");
//!
//! let word = composite
//!     .add_annotation(None, "Word", Span::new(5, 9), FeatureMap::new())
//!     .unwrap();
//! let written = source.borrow().annotation_set(None).unwrap().get(word).cloned().unwrap();
//! assert_eq!(written.span, Span::new(11, 15));
//! ```

mod combining;
mod composite;
mod container;
mod document;
mod errors;

pub use combining::{
    CombineFromAnnotationId, CombineMembers, CombiningParameters, CombiningStrategy,
    StrategyRegistry,
};
pub use composite::{
    next_composite_name, CompositeDisplay, CompositeDocument, OffsetMap, OffsetRange,
    SourcePosition, COMPOSITE_DOC_NAME,
};
pub use container::{Alignment, ContainerListener, DocumentContainer, UnitRef};
pub use document::{
    check_text_span, features, resolve_set_name, same_document, AnnotatedDocument, Annotation,
    AnnotationId, AnnotationSet, Document, DocumentHandle, FeatureMap, FeatureValue, Span,
};
pub use errors::{
    CombiningError, CombiningResult, ContainerError, DocumentError, OffsetMapError,
};
