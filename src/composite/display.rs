use super::CompositeDocument;
use crate::{AnnotatedDocument, Span};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// Internal representation of an included annotation for display.
struct IncludedAnnotation {
    span: Span,
    label: String,
    target: String,
}

/// Renders a composite's text with annotation spans underneath and the source
/// positions they resolve to.
pub struct CompositeDisplay<'a> {
    composite: &'a CompositeDocument,
    include_annotations: Vec<IncludedAnnotation>,
}

// The body text.
//      ╰──╯ Word#42 → doc@11..15
// ╰────────────╯ Sentence#7 → doc@7..21
impl<'a> std::fmt::Display for CompositeDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // blank out control characters byte for byte so span offsets stay valid
        let mut text = String::with_capacity(self.composite.text().len());
        for c in self.composite.text().chars() {
            if c.is_control() {
                text.extend(std::iter::repeat(' ').take(c.len_utf8()));
            } else {
                text.push(c);
            }
        }
        f.write_str(&text)?;

        for included in self.include_annotations.iter() {
            f.write_char('\n')?;

            let start_char_idx = UnicodeWidthStr::width(&text[..included.span.start]);
            let end_char_idx = UnicodeWidthStr::width(&text[..included.span.end]);
            for _ in 0..start_char_idx {
                f.write_char(' ')?;
            }

            f.write_char('╰')?;
            for _ in (start_char_idx + 1)..end_char_idx.saturating_sub(1) {
                f.write_char('─')?;
            }
            if end_char_idx.saturating_sub(start_char_idx) > 1 {
                f.write_char('╯')?;
            }

            write!(f, " {} → {}", included.label, included.target)?;
        }

        Ok(())
    }
}

impl<'a> CompositeDisplay<'a> {
    pub fn new(composite: &'a CompositeDocument) -> Self {
        CompositeDisplay {
            composite,
            include_annotations: Vec::new(),
        }
    }

    /// Include annotations of `kind` from `set`, in offset order.
    pub fn include(&mut self, set: Option<&str>, kind: &str) {
        let mut annotations = self.composite.annotations_of_type(set, kind);
        annotations.sort_by_key(|annotation| annotation.span.start);
        for annotation in annotations {
            let mut label = format!("{}#{}", annotation.kind, annotation.id);
            if !annotation.features.is_empty() {
                label.push('{');
                for (idx, (name, value)) in annotation.features.iter().enumerate() {
                    if idx > 0 {
                        label.push_str(", ");
                    }
                    let _ = write!(label, "{}={}", name, value);
                }
                label.push('}');
            }
            let target = match self.composite.offset_map().resolve_span(annotation.span) {
                Some((document_id, span)) => format!("{}@{}", document_id, span),
                None => "unmapped".to_string(),
            };
            self.include_annotations.push(IncludedAnnotation {
                span: annotation.span,
                label,
                target,
            });
        }
    }

    /// Takes self
    pub fn with(mut self, set: Option<&str>, kind: &str) -> Self {
        self.include(set, kind);
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        features, AnnotatedDocument, CompositeDocument, Document, DocumentContainer, FeatureMap,
        OffsetMap, Span,
    };
    use std::rc::Rc;

    #[test]
    fn renders_spans_and_source_positions() {
        let container = Rc::new(DocumentContainer::new("compound"));
        let source = Document::new("doc", "Intro. The body text. Outro.").into_shared();
        container.add_document("doc", source.clone()).unwrap();
        let composite = CompositeDocument::new(
            &container,
            "The body text.",
            OffsetMap::identity("doc", 7, 14),
        )
        .with_source("doc", source);
        composite.seed_annotation_ids(crate::AnnotationId(42));
        composite
            .add_annotation(None, "Word", Span::new(4, 8), features([("pos", "NN")]))
            .unwrap();
        composite
            .add_annotation(None, "Sentence", Span::new(0, 14), FeatureMap::new())
            .unwrap();

        let display = composite.display().with(None, "Word").with(None, "Sentence");
        insta::assert_snapshot!(display.to_string(), @r###"
        The body text.
            ╰──╯ Word#42{pos="NN"} → doc@11..15
        ╰────────────╯ Sentence#43 → doc@7..21
        "###);
    }

    #[test]
    fn multibyte_control_characters_keep_columns() {
        let text = "é\u{85}ab";
        let container = Rc::new(DocumentContainer::new("compound"));
        let source = Document::new("doc", text).into_shared();
        container.add_document("doc", source.clone()).unwrap();
        let composite =
            CompositeDocument::new(&container, text, OffsetMap::identity("doc", 0, text.len()))
                .with_source("doc", source);
        composite.seed_annotation_ids(crate::AnnotationId(42));
        composite
            .add_annotation(None, "Word", Span::new(4, 6), FeatureMap::new())
            .unwrap();
        composite
            .add_annotation(None, "Sentence", Span::new(0, 6), FeatureMap::new())
            .unwrap();

        let display = composite.display().with(None, "Word").with(None, "Sentence");
        insta::assert_snapshot!(display.to_string(), @r###"
        é  ab
           ╰╯ Word#42 → doc@4..6
        ╰───╯ Sentence#43 → doc@0..6
        "###);
    }
}
