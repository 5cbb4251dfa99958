use super::fixtures::{handle, with_segments, Recorder};
use crate::{AnalysisStep, Corpus, Pipeline, SegmentConfig, SegmentProcessor};
use layered_composite::{AnnotatedDocument, Document, DocumentHandle};
use std::error::Error;
use std::rc::Rc;

fn cause() -> Box<dyn Error> {
    "interrupted".into()
}

#[test]
fn single_steps_always_receive_forwarded_callbacks() {
    let (recorder, log) = Recorder::new();
    let mut processor = SegmentProcessor::new(SegmentConfig::new("Segment")).with_step(recorder);

    processor.run_started();
    processor.run_finished();
    processor.run_started();
    processor.run_aborted(&*cause());

    assert_eq!(
        log.borrow().events,
        vec!["started", "finished", "started", "aborted: interrupted"]
    );
}

#[test]
fn inner_pipelines_get_callbacks_forwarded() {
    let (recorder, log) = Recorder::new();
    let inner = Pipeline::new("inner").with_step(recorder);
    let mut processor = SegmentProcessor::new(SegmentConfig::new("Segment")).with_step(inner);
    assert!(processor.step().unwrap().is_pipeline());

    processor.run_started();
    processor.run_finished();

    assert_eq!(log.borrow().events, vec!["started", "finished"]);
}

#[test]
fn corpus_run_reaches_steps_of_an_inner_pipeline() {
    let (doc, _) = with_segments("One. Two.", "Sentence", &[(0, 4), (5, 9)]);
    let corpus = Rc::new(Corpus::new("corpus"));
    corpus.add(handle(&doc));

    let (recorder, log) = Recorder::new();
    let mut outer = Pipeline::new("outer").with_step(
        SegmentProcessor::new(SegmentConfig::new("Sentence"))
            .with_step(Pipeline::new("inner").with_step(recorder)),
    );
    outer.set_corpus(Some(corpus));
    outer.execute().unwrap();

    let log = log.borrow();
    assert_eq!(log.texts, vec!["One.", "Two."]);
    assert_eq!(log.events, vec!["started", "finished"]);
}

#[test]
fn nested_pipelines_get_callbacks_forwarded() {
    let (recorder, log) = Recorder::new();
    let bound: DocumentHandle = Document::new("bound", "").into_shared();
    let mut inner = Pipeline::new("inner").with_step(recorder);
    inner.set_document(Some(bound));
    let mut processor = SegmentProcessor::new(SegmentConfig::new("Segment")).with_step(inner);

    processor.run_started();
    processor.run_aborted(&*cause());

    assert_eq!(log.borrow().events, vec!["started", "aborted: interrupted"]);
}

#[test]
fn nested_pipeline_runs_on_each_composite_without_callbacks() {
    let (doc, _) = with_segments("One. Two.", "Sentence", &[(0, 4), (5, 9)]);
    let (recorder, log) = Recorder::new();
    let mut processor = SegmentProcessor::new(SegmentConfig::new("Sentence"))
        .with_step(Pipeline::tokenize().with_step(recorder));

    let report = processor.run(&handle(&doc)).unwrap();

    assert_eq!(report.processed.len(), 2);
    assert_eq!(log.borrow().texts, vec!["One.", "Two."]);
    assert!(log.borrow().events.is_empty());
    assert_eq!(doc.annotations_of_type(None, "Token").len(), 4);
}

#[test]
fn top_level_pipeline_drives_the_corpus() {
    let (first, _) = with_segments("Alpha. Beta.", "Sentence", &[(0, 6), (7, 12)]);
    let (second, _) = with_segments("Gamma.", "Sentence", &[(0, 6)]);
    let corpus = Rc::new(Corpus::new("corpus"));
    corpus.add(handle(&first));
    corpus.add(handle(&second));

    let (recorder, log) = Recorder::new();
    let mut pipeline = Pipeline::new("outer").with_step(
        SegmentProcessor::new(SegmentConfig::new("Sentence")).with_step(recorder),
    );
    pipeline.set_corpus(Some(corpus));
    pipeline.execute().unwrap();

    let log = log.borrow();
    assert_eq!(log.events, vec!["started", "finished"]);
    assert_eq!(log.texts, vec!["Alpha.", "Beta.", "Gamma."]);
    assert!(pipeline.document().is_none());
}

#[test]
fn top_level_pipeline_reports_aborts() {
    let (doc, _) = with_segments("Fine. Broken.", "Sentence", &[(0, 5), (6, 13)]);
    let corpus = Rc::new(Corpus::new("corpus"));
    corpus.add(handle(&doc));

    let (recorder, log) = Recorder::new();
    let mut pipeline = Pipeline::new("outer").with_step(
        SegmentProcessor::new(SegmentConfig::new("Sentence"))
            .with_name("segments")
            .with_step(recorder.failing_on("Broken")),
    );
    pipeline.set_corpus(Some(corpus));

    let err = pipeline.execute().unwrap_err();
    assert_eq!(err.to_string(), "step segments failed");

    let log = log.borrow();
    assert_eq!(log.events.len(), 2);
    assert_eq!(log.events[0], "started");
    assert!(log.events[1].starts_with("aborted: "));
}

#[test]
fn segmented_preset_tokenizes_each_segment() {
    let (doc, _) = with_segments("Keep this. Skip", "Clause", &[(0, 10)]);
    let mut pipeline = Pipeline::segmented(SegmentConfig::new("Clause"));
    pipeline.set_document(Some(handle(&doc)));
    pipeline.execute().unwrap();

    let tokens: Vec<_> = doc
        .annotations_of_type(None, "Token")
        .into_iter()
        .map(|token| token.span.to_string())
        .collect();
    assert_eq!(tokens, vec!["0..4", "5..9", "9..10"]);
}
