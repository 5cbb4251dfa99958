use crate::errors::{BoxError, ConfigurationError};
use crate::step::{AnalysisStep, Binding};
use crate::Corpus;
use layered_composite::{features, resolve_set_name, AnnotatedDocument, DocumentHandle, Span};
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

/// Creates a `Token` annotation per Unicode word, number or punctuation mark.
///
/// Tokens carry a `string` feature with their text and a `kind` feature,
/// `"word"` or `"punctuation"`. Whitespace is skipped.
#[derive(Debug, Default)]
pub struct WordTokenizer {
    output_set: Option<String>,
    binding: Binding,
}

impl WordTokenizer {
    pub const TOKEN: &'static str = "Token";

    pub fn new() -> Self {
        Self::default()
    }

    /// Write tokens to a named set instead of the default set.
    pub fn with_output_set(mut self, output_set: impl Into<String>) -> Self {
        self.output_set = Some(output_set.into());
        self
    }
}

impl AnalysisStep for WordTokenizer {
    fn name(&self) -> &str {
        "word-tokenizer"
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
        let set = resolve_set_name(self.output_set.as_deref());
        let text = document.text();

        let mut count = 0;
        for (start, word) in text.split_word_bound_indices() {
            let kind = if word.chars().any(char::is_alphanumeric) {
                "word"
            } else if word.trim().is_empty() {
                continue;
            } else {
                "punctuation"
            };
            document.add_annotation(
                set,
                Self::TOKEN,
                Span::new(start, start + word.len()),
                features([("string", word), ("kind", kind)]),
            )?;
            count += 1;
        }

        tracing::trace!(document = %document.name(), tokens = count, "tokenized");
        Ok(())
    }
}
