use crate::{
    features, AnnotatedDocument, AnnotationId, CombiningParameters,
    CompositeDocument, Document, DocumentContainer, DocumentHandle, FeatureMap, SourcePosition,
    Span, StrategyRegistry,
};
use std::cell::RefCell;
use std::rc::Rc;

const TEXT: &str = "Preamble text. Section one says this. Section two says that.";

fn setup() -> (Rc<DocumentContainer>, Rc<RefCell<Document>>) {
    let container = Rc::new(DocumentContainer::new("compound"));
    let source = Document::new("contract", TEXT).into_shared();
    container.add_document("contract", source.clone()).unwrap();
    (container, source)
}

fn combine(container: &Rc<DocumentContainer>, parameters: &CombiningParameters) -> CompositeDocument {
    StrategyRegistry::global()
        .get("combine-from-annotation-id")
        .unwrap()
        .combine(container, parameters)
        .unwrap()
}

#[test]
fn every_composite_offset_resolves_to_start_plus_offset() {
    let (container, source) = setup();
    let segments: Vec<(AnnotationId, Span)> = [(15, 37), (38, 60), (0, 14)]
        .iter()
        .map(|&(start, end)| {
            let span = Span::new(start, end);
            let id = source
                .borrow_mut()
                .add_annotation(None, "Section", span, FeatureMap::new())
                .unwrap();
            (id, span)
        })
        .collect();

    for (id, span) in segments {
        let composite = combine(&container, &CombiningParameters::from_annotation("contract", id));
        assert_eq!(composite.text(), &TEXT[span.start..span.end]);
        for offset in 0..span.len() {
            assert_eq!(
                composite.resolve_to_source(offset),
                Some(SourcePosition {
                    document_id: "contract".into(),
                    offset: span.start + offset,
                })
            );
        }
        for offset in span.len()..span.len() + 3 {
            assert_eq!(composite.resolve_to_source(offset), None);
        }
    }
}

#[test]
fn seeded_ids_do_not_collide_with_source_ids() {
    let (container, source) = setup();
    let segment = {
        let mut doc = source.borrow_mut();
        let segment = doc
            .add_annotation(None, "Section", Span::new(15, 37), FeatureMap::new())
            .unwrap();
        // ids up to 41 used in another set
        doc.insert_annotation(
            Some("Other"),
            crate::Annotation::new(AnnotationId(41), "Mark", Span::new(0, 8), FeatureMap::new()),
        )
        .unwrap();
        segment
    };
    let existing: Vec<AnnotationId> = {
        let doc = source.borrow();
        doc.annotation_set(None)
            .into_iter()
            .chain(doc.annotation_set(Some("Other")))
            .flat_map(|set| set.iter().map(|a| a.id))
            .collect()
    };
    assert_eq!(source.borrow().peek_next_annotation_id(), AnnotationId(42));

    let composite = combine(
        &container,
        &CombiningParameters::from_annotation("contract", segment)
            .with_annotation_id_seed(Some(AnnotationId(42))),
    );
    assert!(composite.peek_next_annotation_id().unwrap() >= AnnotationId(42));

    let created = composite
        .add_annotation(None, "Verb", Span::new(12, 16), features([("lemma", "say")]))
        .unwrap();
    assert!(!existing.contains(&created));

    let doc = source.borrow();
    let written = doc.annotation_set(None).unwrap().get(created).unwrap();
    assert_eq!(&TEXT[written.span.start..written.span.end], "says");
}

#[test]
fn composite_as_container_member() {
    let (container, source) = setup();
    let segment = source
        .borrow_mut()
        .add_annotation(None, "Section", Span::new(38, 60), FeatureMap::new())
        .unwrap();
    let composite = Rc::new(combine(
        &container,
        &CombiningParameters::from_annotation("contract", segment),
    ));
    let name = composite.name();
    let handle: DocumentHandle = composite.clone();

    container.add_document(name.clone(), handle).unwrap();
    container.set_current_document(&name).unwrap();

    // writing through the container reaches the composite, then the source
    let id = container
        .add_annotation(None, "Word", Span::new(0, 7), FeatureMap::new())
        .unwrap();
    assert_eq!(
        source.borrow().annotation_set(None).unwrap().get(id).map(|a| a.span),
        Some(Span::new(38, 45))
    );

    container.remove_document(&name).unwrap();
    composite.release();
    assert_eq!(container.document_ids(), vec!["contract".to_string()]);
    assert!(composite.container().is_some());
    assert!(composite
        .add_annotation(None, "Word", Span::new(0, 7), FeatureMap::new())
        .is_err());
}
