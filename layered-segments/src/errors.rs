//! Error types for segment processing.

use layered_composite::{AnnotationId, CombiningError, ContainerError};
use thiserror::Error;

/// Failure raised by an analysis step.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Missing or inconsistent configuration. Raised before any resource is acquired.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no document to process")]
    MissingDocument,

    #[error("no segment annotation type configured")]
    MissingSegmentType,

    #[error("no analysis step configured")]
    MissingAnalysisStep,

    /// Only one half of the segment feature filter was given.
    #[error("segment feature filter needs both a name and a value (name: {name:?}, value: {value:?})")]
    IncompleteFeatureFilter {
        name: Option<String>,
        value: Option<String>,
    },

    #[error("no combining strategy registered as {0:?}")]
    UnknownStrategy(String),

    /// The strategy builds composites that ignore the segment annotation.
    #[error("combining strategy {0:?} cannot build a composite for one segment")]
    StrategyCannotSegment(String),

    /// Error reading a configuration file.
    #[error("failed to read {path}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing configuration TOML.
    #[error("failed to parse {origin}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors surfaced by a segment processing run.
#[derive(Debug, Error)]
pub enum SegmentProcessingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The composite for a segment could not be built. The run stops at the first one.
    #[error("could not build composite for segment {segment}")]
    Combining {
        segment: AnnotationId,
        #[source]
        source: CombiningError,
    },

    /// The analysis step failed while bound to a segment's composite.
    #[error("analysis step {step} failed on segment {segment}")]
    Analysis {
        step: String,
        segment: AnnotationId,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Releasing a run-scoped resource failed.
    #[error("failed to release {resource}")]
    Cleanup {
        resource: String,
        #[source]
        source: ContainerError,
    },
}

/// A step inside a [`Pipeline`](crate::Pipeline) failed.
#[derive(Debug, Error)]
#[error("step {step} failed")]
pub struct StepError {
    pub step: String,
    #[source]
    pub source: BoxError,
}

/// Result type for segment processing.
pub type SegmentResult<T> = Result<T, SegmentProcessingError>;
