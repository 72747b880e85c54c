use std::fmt;

use super::category::{CategoryId, SubgroupId};
use super::food::FoodId;

/// Which sequence of the catalog holds a food.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// `catalog.loose_foods`, the flat list from before categories existed
    Loose,
    /// A category's direct foods
    Category { category_id: CategoryId },
    /// A subgroup's foods
    Subgroup {
        category_id: CategoryId,
        subgroup_id: SubgroupId,
    },
}

impl Container {
    pub fn category(category_id: CategoryId) -> Self {
        Container::Category { category_id }
    }

    pub fn subgroup(category_id: CategoryId, subgroup_id: SubgroupId) -> Self {
        Container::Subgroup {
            category_id,
            subgroup_id,
        }
    }

    /// The owning category, if any
    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            Container::Loose => None,
            Container::Category { category_id } | Container::Subgroup { category_id, .. } => {
                Some(*category_id)
            }
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Loose => write!(f, "loose"),
            Container::Category { category_id } => write!(f, "category:{}", category_id),
            Container::Subgroup { subgroup_id, .. } => write!(f, "subgroup:{}", subgroup_id),
        }
    }
}

/// A food together with the container that currently holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FoodRef {
    pub container: Container,
    pub food_id: FoodId,
}

impl FoodRef {
    pub fn new(container: Container, food_id: FoodId) -> Self {
        FoodRef { container, food_id }
    }
}

impl fmt::Display for FoodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.food_id)
    }
}
