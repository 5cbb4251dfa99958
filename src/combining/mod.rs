//! Combining strategies: named algorithms that build a [`CompositeDocument`]
//! from a container and parameters.
//!
//! Strategies are looked up by name through a [`StrategyRegistry`]. The
//! built-in variants are registered in [`StrategyRegistry::global`].

mod from_annotation;
mod members;

pub use from_annotation::CombineFromAnnotationId;
pub use members::CombineMembers;

use crate::errors::{CombiningError, CombiningResult};
use crate::{resolve_set_name, AnnotationId, CompositeDocument, DocumentContainer};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// Inputs for a [`CombiningStrategy`].
///
/// Which fields are required depends on the strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombiningParameters {
    /// Annotation set holding the segment and the annotations copied along with it.
    #[serde(default)]
    pub input_set: Option<String>,
    /// Member documents to combine, in order.
    #[serde(default)]
    pub document_ids: Vec<String>,
    /// Annotation whose span narrows the first member.
    #[serde(default)]
    pub annotation_id: Option<AnnotationId>,
    /// Minimum ID for annotations minted on the composite.
    #[serde(default)]
    pub annotation_id_seed: Option<AnnotationId>,
    /// Text placed between members when several are combined.
    #[serde(default)]
    pub separator: Option<String>,
}

impl CombiningParameters {
    /// Parameters selecting the span of one annotation in one member.
    pub fn from_annotation(document_id: impl Into<String>, annotation_id: AnnotationId) -> Self {
        Self {
            document_ids: vec![document_id.into()],
            annotation_id: Some(annotation_id),
            ..Self::default()
        }
    }

    /// Parameters selecting the full text of several members.
    pub fn members<I, S>(document_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            document_ids: document_ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Blank names select the default set.
    pub fn with_input_set(mut self, input_set: Option<&str>) -> Self {
        self.input_set = resolve_set_name(input_set).map(str::to_string);
        self
    }

    pub fn with_annotation_id_seed(mut self, seed: Option<AnnotationId>) -> Self {
        self.annotation_id_seed = seed;
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// The first member, required by every built-in strategy.
    pub fn primary_document(&self) -> CombiningResult<&str> {
        self.document_ids
            .first()
            .map(String::as_str)
            .ok_or(CombiningError::MissingParameter("document_ids"))
    }
}

/// Builds one composite document from a container.
pub trait CombiningStrategy: Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// True if the composite covers only the span of
    /// [`CombiningParameters::annotation_id`], so the strategy can build one
    /// composite per segment.
    fn narrows_to_annotation(&self) -> bool {
        false
    }

    fn combine(
        &self,
        container: &Rc<DocumentContainer>,
        parameters: &CombiningParameters,
    ) -> CombiningResult<CompositeDocument>;
}

/// Combining strategies by name.
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: BTreeMap<&'static str, Arc<dyn CombiningStrategy>>,
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.strategies.keys()).finish()
    }
}

static GLOBAL_REGISTRY: Lazy<StrategyRegistry> = Lazy::new(StrategyRegistry::with_defaults);

impl StrategyRegistry {
    /// A registry with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(CombineFromAnnotationId);
        registry.register(CombineMembers);
        registry
    }

    /// The shared registry of built-in strategies.
    pub fn global() -> &'static StrategyRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register a strategy under its name, replacing any previous one.
    pub fn register<S: CombiningStrategy + 'static>(&mut self, strategy: S) {
        self.strategies.insert(strategy.name(), Arc::new(strategy));
    }

    pub fn get(&self, name: &str) -> CombiningResult<Arc<dyn CombiningStrategy>> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| CombiningError::UnknownStrategy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.keys().copied()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
