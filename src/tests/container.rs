use crate::{
    AnnotatedDocument, AnnotationId, ContainerError, ContainerListener, Document,
    DocumentContainer, DocumentError, DocumentHandle, FeatureMap, Span, UnitRef,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
struct Recorder {
    events: RefCell<Vec<String>>,
}

impl ContainerListener for Recorder {
    fn member_added(&self, container: &DocumentContainer, document_id: &str) {
        self.events
            .borrow_mut()
            .push(format!("{}+{}", container.id(), document_id));
    }

    fn member_removed(&self, container: &DocumentContainer, document_id: &str) {
        self.events
            .borrow_mut()
            .push(format!("{}-{}", container.id(), document_id));
    }
}

struct Panicking;

impl ContainerListener for Panicking {
    fn member_added(&self, _container: &DocumentContainer, _document_id: &str) {
        panic!("listener failure");
    }
}

/// Reads the container from inside the callback.
struct MemberCounter {
    seen: RefCell<Vec<usize>>,
}

impl ContainerListener for MemberCounter {
    fn member_added(&self, container: &DocumentContainer, _document_id: &str) {
        self.seen.borrow_mut().push(container.len());
    }

    fn member_removed(&self, container: &DocumentContainer, _document_id: &str) {
        self.seen.borrow_mut().push(container.len());
    }
}

fn doc(name: &str, text: &str) -> DocumentHandle {
    Document::new(name, text).into_shared()
}

#[test]
fn add_then_remove_restores_membership() {
    let container = DocumentContainer::new("compound");
    container.add_document("base", doc("base", "x")).unwrap();
    let before = container.len();

    container.add_document("temp", doc("temp", "y")).unwrap();
    assert_eq!(container.len(), before + 1);
    container.remove_document("temp").unwrap();

    assert_eq!(container.len(), before);
    assert_eq!(
        container.get_document("temp").err(),
        Some(ContainerError::UnknownMember {
            container: "compound".into(),
            document_id: "temp".into()
        })
    );
}

#[test]
fn duplicate_member_leaves_state_unchanged() {
    let container = DocumentContainer::new("compound");
    let first = doc("a", "first");
    container.add_document("a", first.clone()).unwrap();

    let err = container.add_document("a", doc("a", "second")).unwrap_err();
    assert!(matches!(err, ContainerError::DuplicateMember { .. }));
    assert_eq!(container.len(), 1);
    assert_eq!(container.get_document("a").unwrap().text(), "first");
}

#[test]
fn removing_unknown_member_is_reported() {
    let recorder = Rc::new(Recorder::default());
    let container = DocumentContainer::new("compound");
    container.add_listener(recorder.clone());

    assert!(matches!(
        container.remove_document("missing"),
        Err(ContainerError::UnknownMember { .. })
    ));
    assert!(recorder.events.borrow().is_empty());
}

#[test]
fn current_member_lifecycle() {
    let container = DocumentContainer::new("compound");
    assert!(matches!(
        container.current_document(),
        Err(ContainerError::NoCurrentMember { .. })
    ));
    assert!(matches!(
        container.set_current_document("a"),
        Err(ContainerError::UnknownMember { .. })
    ));

    container.add_document("a", doc("a", "alpha")).unwrap();
    container.add_document("b", doc("b", "beta")).unwrap();
    container.set_current_document("b").unwrap();
    assert_eq!(container.current_document().unwrap().text(), "beta");

    container.remove_document("a").unwrap();
    assert_eq!(container.current_document_id().as_deref(), Some("b"));

    container.remove_document("b").unwrap();
    assert_eq!(container.current_document_id(), None);
}

#[test]
fn listeners_are_notified_in_registration_order() {
    let log = Rc::new(RefCell::new(Vec::new()));

    struct Named(&'static str, Rc<RefCell<Vec<&'static str>>>);
    impl ContainerListener for Named {
        fn member_added(&self, _container: &DocumentContainer, _document_id: &str) {
            self.1.borrow_mut().push(self.0);
        }
    }

    let container = DocumentContainer::new("compound");
    container.add_listener(Rc::new(Named("first", log.clone())));
    container.add_listener(Rc::new(Named("second", log.clone())));
    container.add_listener(Rc::new(Named("third", log.clone())));
    container.add_document("a", doc("a", "")).unwrap();

    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn panicking_listener_does_not_stop_delivery() {
    let recorder = Rc::new(Recorder::default());
    let container = DocumentContainer::new("compound");
    container.add_listener(Rc::new(Panicking));
    container.add_listener(recorder.clone());

    container.add_document("a", doc("a", "")).unwrap();
    container.remove_document("a").unwrap();

    assert_eq!(*recorder.events.borrow(), vec!["compound+a", "compound-a"]);
    assert!(container.is_empty());
}

#[test]
fn listeners_see_the_updated_member_map() {
    let counter = Rc::new(MemberCounter {
        seen: RefCell::new(Vec::new()),
    });
    let container = DocumentContainer::new("compound");
    container.add_listener(counter.clone());

    container.add_document("a", doc("a", "")).unwrap();
    container.add_document("b", doc("b", "")).unwrap();
    container.remove_document("a").unwrap();

    assert_eq!(*counter.seen.borrow(), vec![1, 2, 1]);
}

#[test]
fn removed_listener_is_not_notified() {
    let recorder = Rc::new(Recorder::default());
    let as_listener: Rc<dyn ContainerListener> = recorder.clone();
    let container = DocumentContainer::new("compound");
    container.add_listener(as_listener.clone());

    assert!(container.remove_listener(&as_listener));
    assert!(!container.remove_listener(&as_listener));
    container.add_document("a", doc("a", "")).unwrap();
    assert!(recorder.events.borrow().is_empty());
}

#[test]
fn alignment_information_is_created_once() {
    let container = DocumentContainer::new("parallel");
    let first = container.alignment_information("alignment");
    first.align(
        UnitRef::new("en", AnnotationId(1)),
        UnitRef::new("fr", AnnotationId(2)),
    );
    let second = container.alignment_information("alignment");

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(second.len(), 1);
    assert_eq!(container.alignment_feature_names(), vec!["alignment".to_string()]);

    assert!(container.remove_alignment_information("alignment").is_some());
    assert!(container.remove_alignment_information("alignment").is_none());
    let fresh = container.alignment_information("alignment");
    assert!(!Rc::ptr_eq(&first, &fresh));
    assert!(fresh.is_empty());
}

#[test]
fn container_delegates_to_current_member() {
    let container = DocumentContainer::new("compound");
    assert_eq!(
        container.add_annotation(None, "X", Span::new(0, 1), FeatureMap::new()),
        Err(DocumentError::NoCurrentMember("compound".into()))
    );

    let member = Document::new("a", "alpha").into_shared();
    container.add_document("a", member.clone()).unwrap();
    container.set_current_document("a").unwrap();

    let id = container
        .add_annotation(None, "X", Span::new(0, 5), FeatureMap::new())
        .unwrap();
    assert_eq!(container.text(), "alpha");
    assert_eq!(container.name(), "compound");
    assert!(member.borrow().contains_annotation_id(id));
    assert!(container.as_container().is_some());
}
