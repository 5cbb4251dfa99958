//! Alignment information stored on a container.

use crate::AnnotationId;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;

/// An annotated unit in one member of a container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitRef {
    pub document_id: String,
    pub annotation_id: AnnotationId,
}

impl UnitRef {
    pub fn new(document_id: impl Into<String>, annotation_id: AnnotationId) -> Self {
        Self {
            document_id: document_id.into(),
            annotation_id,
        }
    }
}

impl fmt::Display for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document_id, self.annotation_id)
    }
}

/// Symmetric pairing between units of member documents.
///
/// Handed out as `Rc<Alignment>` by the container, so links are recorded through `&self`.
#[derive(Debug, Default)]
pub struct Alignment {
    links: RefCell<BTreeSet<(UnitRef, UnitRef)>>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: UnitRef, b: UnitRef) -> (UnitRef, UnitRef) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Link two units. Returns false if they were already linked.
    pub fn align(&self, a: UnitRef, b: UnitRef) -> bool {
        self.links.borrow_mut().insert(Self::key(a, b))
    }

    /// Remove a link. Returns false if there was none.
    pub fn unalign(&self, a: &UnitRef, b: &UnitRef) -> bool {
        self.links
            .borrow_mut()
            .remove(&Self::key(a.clone(), b.clone()))
    }

    pub fn is_aligned(&self, unit: &UnitRef) -> bool {
        self.links
            .borrow()
            .iter()
            .any(|(a, b)| a == unit || b == unit)
    }

    /// Units linked to `unit`, in order.
    pub fn aligned_with(&self, unit: &UnitRef) -> Vec<UnitRef> {
        self.links
            .borrow()
            .iter()
            .filter_map(|(a, b)| {
                if a == unit {
                    Some(b.clone())
                } else if b == unit {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.links.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.borrow().is_empty()
    }
}
