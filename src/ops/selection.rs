use indexmap::IndexSet;

use crate::model::{Container, FoodRef};

/// Food references picked while bulk mode is on.
///
/// Entering and leaving bulk mode both clear the set; while active the
/// session refuses reorder and move requests.
#[derive(Debug, Clone, Default)]
pub struct BulkSelection {
    active: bool,
    refs: IndexSet<FoodRef>,
}

impl BulkSelection {
    pub fn new() -> Self {
        BulkSelection::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn enter(&mut self) {
        self.active = true;
        self.refs.clear();
    }

    pub fn exit(&mut self) {
        self.active = false;
        self.refs.clear();
    }

    /// Returns whether `r` is selected afterwards.
    pub fn toggle(&mut self, r: FoodRef) -> bool {
        if self.refs.shift_remove(&r) {
            false
        } else {
            self.refs.insert(r);
            true
        }
    }

    /// Add `r` without toggling. Returns false if it was already selected.
    pub fn select(&mut self, r: FoodRef) -> bool {
        self.refs.insert(r)
    }

    /// Union the given refs into the selection.
    pub fn select_all_visible(&mut self, visible: impl IntoIterator<Item = FoodRef>) {
        self.refs.extend(visible);
    }

    pub fn clear(&mut self) {
        self.refs.clear();
    }

    pub fn contains(&self, r: &FoodRef) -> bool {
        self.refs.contains(r)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn refs(&self) -> impl Iterator<Item = &FoodRef> {
        self.refs.iter()
    }

    /// Re-point refs held in `from` at `to` after the store moved those
    /// foods wholesale. Selection order is kept.
    pub fn rehome(&mut self, from: Container, to: Container) {
        if !self.refs.iter().any(|r| r.container == from) {
            return;
        }
        self.refs = self
            .refs
            .drain(..)
            .map(|r| {
                if r.container == from {
                    FoodRef::new(to, r.food_id)
                } else {
                    r
                }
            })
            .collect();
    }

    /// Empty the selection, handing back what was in it.
    pub fn take(&mut self) -> Vec<FoodRef> {
        self.refs.drain(..).collect()
    }
}
