use std::fmt;

use crate::timeline::model::ElementRef;

/// Handle returned by [`Selection::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

type Listener = Box<dyn FnMut(&[ElementRef])>;

/// Ordered set of selected elements with change listeners.
#[derive(Default)]
pub struct Selection {
    selected: Vec<ElementRef>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("selected", &self.selected)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &[ElementRef] {
        &self.selected
    }

    pub fn first(&self) -> Option<&ElementRef> {
        self.selected.first()
    }

    pub fn contains(&self, r: &ElementRef) -> bool {
        self.selected.contains(r)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Replace the selection; duplicates are dropped, first occurrence wins.
    pub fn set_selected(&mut self, refs: Vec<ElementRef>) {
        let mut next: Vec<ElementRef> = Vec::with_capacity(refs.len());
        for r in refs {
            if !next.contains(&r) {
                next.push(r);
            }
        }
        if next == self.selected {
            return;
        }
        self.selected = next;
        self.notify();
    }

    pub fn clear(&mut self) {
        self.set_selected(Vec::new());
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&[ElementRef]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        for (_, listener) in &mut self.listeners {
            listener(&self.selected);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/selection.rs"]
mod tests;
