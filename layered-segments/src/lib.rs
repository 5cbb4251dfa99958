#![doc(
    html_logo_url = "https://raw.githubusercontent.com/storyscript/layered-nlp/main/assets/layered-nlp.svg",
    issue_tracker_base_url = "https://github.com/storyscript/layered-nlp/issues/"
)]

//! Segment-driven processing for layered-nlp.
//!
//! Runs analysis steps that only understand whole documents on segments of a
//! document: sections, sentences, or any annotation type. Each segment becomes a
//! temporary composite document; annotations the step creates land in the
//! original document at the right offsets.
//!
//! ## Modules
//!
//! - [`step`] - The [`AnalysisStep`] contract and its bindings
//! - [`processor`] - [`SegmentProcessor`], the per-segment loop
//! - [`pipeline`] - [`Pipeline`], ordered steps run as one step
//! - [`config`] - [`SegmentConfig`], loadable from TOML
//! - [`errors`] - Error types for configuration and runs

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod processor;
pub mod step;

mod corpus;
mod scope;
mod tokenizer;

pub use config::SegmentConfig;
pub use corpus::Corpus;
pub use errors::{BoxError, ConfigurationError, SegmentProcessingError, SegmentResult, StepError};
pub use pipeline::Pipeline;
pub use processor::{ProcessedSegment, RunReport, SegmentProcessor};
pub use scope::BoundStep;
pub use step::{AnalysisStep, Binding};
pub use tokenizer::WordTokenizer;
