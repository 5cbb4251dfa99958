//! Segment processing configuration, loadable from TOML.

use crate::errors::ConfigurationError;
use layered_composite::{resolve_set_name, CombineFromAnnotationId, StrategyRegistry};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which annotations are segments, and how composites are built from them.
///
/// ```toml
/// input_set = "Original markups"
/// segment_type = "Section"
/// feature_name = "kind"
/// feature_value = "header"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// Annotation set holding the segments. Empty or blank means the default set.
    #[serde(default)]
    pub input_set: Option<String>,
    /// Annotation type of the segments.
    #[serde(default)]
    pub segment_type: String,
    #[serde(default)]
    pub feature_name: Option<String>,
    #[serde(default)]
    pub feature_value: Option<String>,
    /// Registry name of the combining strategy.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Log each segment at info level.
    #[serde(default)]
    pub debug: bool,
}

fn default_strategy() -> String {
    CombineFromAnnotationId::NAME.to_string()
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            input_set: None,
            segment_type: String::new(),
            feature_name: None,
            feature_value: None,
            strategy: default_strategy(),
            debug: false,
        }
    }
}

impl SegmentConfig {
    /// Segments are the annotations of `segment_type` in the default set.
    pub fn new(segment_type: impl Into<String>) -> Self {
        Self {
            segment_type: segment_type.into(),
            ..Self::default()
        }
    }

    pub fn with_input_set(mut self, input_set: impl Into<String>) -> Self {
        self.input_set = Some(input_set.into());
        self
    }

    /// Only process segments whose feature `name` is exactly `value`.
    pub fn with_feature_filter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.feature_name = Some(name.into());
        self.feature_value = Some(value.into());
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Parse from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|source| ConfigurationError::Parse {
            origin: "configuration".to_string(),
            source,
        })
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Load {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigurationError::Parse {
            origin: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded segment configuration");
        Ok(config)
    }

    /// The input set name, with blank names normalized to the default set.
    pub fn input_set(&self) -> Option<&str> {
        resolve_set_name(self.input_set.as_deref())
    }

    /// The `(name, value)` filter, when both halves are configured.
    pub fn feature_filter(&self) -> Option<(&str, &str)> {
        match (self.feature_name.as_deref(), self.feature_value.as_deref()) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        }
    }

    /// Check required fields, and that `registry` holds a strategy that can
    /// build one composite per segment.
    pub fn validate(&self, registry: &StrategyRegistry) -> Result<(), ConfigurationError> {
        if self.segment_type.trim().is_empty() {
            return Err(ConfigurationError::MissingSegmentType);
        }
        let name = self.feature_name.as_deref().filter(|n| !n.is_empty());
        if name.is_some() != self.feature_value.is_some() {
            return Err(ConfigurationError::IncompleteFeatureFilter {
                name: self.feature_name.clone(),
                value: self.feature_value.clone(),
            });
        }
        let strategy = registry
            .get(&self.strategy)
            .map_err(|_| ConfigurationError::UnknownStrategy(self.strategy.clone()))?;
        if !strategy.narrows_to_annotation() {
            return Err(ConfigurationError::StrategyCannotSegment(self.strategy.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn load_from_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
input_set = "Original markups"
segment_type = "Section"
feature_name = "kind"
feature_value = "header"
debug = true
"#
        )
        .unwrap();

        let config = SegmentConfig::load(file.path()).unwrap();
        assert_eq!(config.input_set(), Some("Original markups"));
        assert_eq!(config.segment_type, "Section");
        assert_eq!(config.feature_filter(), Some(("kind", "header")));
        assert_eq!(config.strategy, "combine-from-annotation-id");
        assert!(config.debug);
        config.validate(StrategyRegistry::global()).unwrap();
    }

    #[test]
    fn load_missing_file_fails() {
        let err = SegmentConfig::load(Path::new("/nonexistent/segments.toml")).unwrap_err();
        assert!(matches!(err, ConfigurationError::Load { .. }));
    }

    #[test]
    fn parse_errors_are_reported() {
        let err = SegmentConfig::from_toml_str("segment_type = [").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse { .. }));
    }

    #[test]
    fn blank_input_set_is_the_default_set() {
        let config = SegmentConfig::from_toml_str("segment_type = \"Sentence\"\ninput_set = \" \"").unwrap();
        assert_eq!(config.input_set(), None);
    }

    #[test]
    fn validation() {
        let registry = StrategyRegistry::global();
        assert!(matches!(
            SegmentConfig::default().validate(registry),
            Err(ConfigurationError::MissingSegmentType)
        ));

        let mut half = SegmentConfig::new("Section");
        half.feature_name = Some("kind".into());
        assert!(matches!(
            half.validate(registry),
            Err(ConfigurationError::IncompleteFeatureFilter { .. })
        ));
        assert_eq!(half.feature_filter(), None);

        assert!(matches!(
            SegmentConfig::new("Section").with_strategy("by-magic").validate(registry),
            Err(ConfigurationError::UnknownStrategy(name)) if name == "by-magic"
        ));

        assert!(matches!(
            SegmentConfig::new("Section").with_strategy("combine-members").validate(registry),
            Err(ConfigurationError::StrategyCannotSegment(name)) if name == "combine-members"
        ));

        SegmentConfig::new("Section")
            .with_feature_filter("kind", "header")
            .with_strategy("combine-from-annotation-id")
            .validate(registry)
            .unwrap();
    }
}
