use serde::{Deserialize, Serialize};

use super::food::Food;
use super::null_as_default;

pub type CategoryId = i64;
pub type SubgroupId = i64;

/// A named group of foods inside a category. Owned by exactly one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subgroup {
    pub id: SubgroupId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foods: Vec<Food>,
}

impl Subgroup {
    pub fn new(id: SubgroupId, name: impl Into<String>) -> Self {
        Subgroup {
            id,
            name: name.into(),
            foods: Vec::new(),
        }
    }
}

/// Top-level container: direct foods plus an ordered list of subgroups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub foods: Vec<Food>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subgroups: Vec<Subgroup>,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Category {
            id,
            name: name.into(),
            foods: Vec::new(),
            subgroups: Vec::new(),
        }
    }

    pub fn subgroup(&self, id: SubgroupId) -> Option<&Subgroup> {
        self.subgroups.iter().find(|s| s.id == id)
    }

    pub fn subgroup_mut(&mut self, id: SubgroupId) -> Option<&mut Subgroup> {
        self.subgroups.iter_mut().find(|s| s.id == id)
    }

    /// Direct foods plus the foods of every subgroup
    pub fn total_foods(&self) -> usize {
        self.foods.len() + self.subgroups.iter().map(|s| s.foods.len()).sum::<usize>()
    }
}
