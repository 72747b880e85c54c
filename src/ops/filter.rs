use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::model::{Catalog, Food, FoodRef, TagId};

/// How selected tags combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// OR: any selected tag present
    Any,
    /// AND: every selected tag present
    #[default]
    All,
}

/// Pure visibility predicate. An empty selection matches everything.
pub fn is_visible(food: &Food, selected: &IndexSet<TagId>, mode: MatchMode) -> bool {
    if selected.is_empty() {
        return true;
    }
    match mode {
        MatchMode::Any => selected.iter().any(|t| food.tag_ids.contains(t)),
        MatchMode::All => selected.iter().all(|t| food.tag_ids.contains(t)),
    }
}

/// The user's current tag filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub selected: IndexSet<TagId>,
    pub mode: MatchMode,
}

impl TagFilter {
    pub fn new(selected: impl IntoIterator<Item = TagId>, mode: MatchMode) -> Self {
        TagFilter {
            selected: selected.into_iter().collect(),
            mode,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Add the tag if absent, remove it if present. Returns whether the tag
    /// is selected afterwards.
    pub fn toggle(&mut self, tag_id: TagId) -> bool {
        if self.selected.shift_remove(&tag_id) {
            false
        } else {
            self.selected.insert(tag_id);
            true
        }
    }

    /// Drop a deleted tag so it cannot keep hiding foods in AND mode.
    pub fn forget_tag(&mut self, tag_id: TagId) -> bool {
        self.selected.shift_remove(&tag_id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn matches(&self, food: &Food) -> bool {
        is_visible(food, &self.selected, self.mode)
    }

    /// References of every visible food, in catalog flattening order.
    pub fn visible(&self, catalog: &Catalog) -> Vec<FoodRef> {
        catalog
            .all_foods()
            .into_iter()
            .filter(|(_, food)| self.matches(food))
            .map(|(r, _)| r)
            .collect()
    }
}
