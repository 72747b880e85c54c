use serde::{Deserialize, Serialize};

use super::category::{Category, CategoryId, Subgroup, SubgroupId};
use super::container::{Container, FoodRef};
use super::food::{Food, FoodId};
use super::null_as_default;
use super::tag::{Tag, TagId};

/// The whole catalog. Serializes directly to the persisted document shape:
/// `{ "foods": [...], "tags": [...], "categories": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Foods outside any category
    #[serde(rename = "foods", default, deserialize_with = "null_as_default")]
    pub loose_foods: Vec<Food>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn category_mut(&mut self, id: CategoryId) -> Option<&mut Category> {
        self.categories.iter_mut().find(|c| c.id == id)
    }

    pub fn subgroup(&self, category_id: CategoryId, id: SubgroupId) -> Option<&Subgroup> {
        self.category(category_id)?.subgroup(id)
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn has_tag(&self, id: TagId) -> bool {
        self.tag(id).is_some()
    }

    /// Find the category that owns a subgroup.
    pub fn subgroup_owner(&self, subgroup_id: SubgroupId) -> Option<CategoryId> {
        self.categories
            .iter()
            .find(|c| c.subgroup(subgroup_id).is_some())
            .map(|c| c.id)
    }

    /// The food sequence for a container, if the container still exists.
    pub fn foods_in(&self, container: Container) -> Option<&Vec<Food>> {
        match container {
            Container::Loose => Some(&self.loose_foods),
            Container::Category { category_id } => self.category(category_id).map(|c| &c.foods),
            Container::Subgroup {
                category_id,
                subgroup_id,
            } => self.subgroup(category_id, subgroup_id).map(|s| &s.foods),
        }
    }

    pub fn foods_in_mut(&mut self, container: Container) -> Option<&mut Vec<Food>> {
        match container {
            Container::Loose => Some(&mut self.loose_foods),
            Container::Category { category_id } => {
                self.category_mut(category_id).map(|c| &mut c.foods)
            }
            Container::Subgroup {
                category_id,
                subgroup_id,
            } => self
                .category_mut(category_id)?
                .subgroup_mut(subgroup_id)
                .map(|s| &mut s.foods),
        }
    }

    /// Every food with its container: loose first, then per category the
    /// direct foods followed by each subgroup in order.
    pub fn all_foods(&self) -> Vec<(FoodRef, &Food)> {
        let mut out: Vec<(FoodRef, &Food)> = self
            .loose_foods
            .iter()
            .map(|f| (FoodRef::new(Container::Loose, f.id), f))
            .collect();
        for category in &self.categories {
            let direct = Container::category(category.id);
            out.extend(category.foods.iter().map(|f| (FoodRef::new(direct, f.id), f)));
            for sub in &category.subgroups {
                let container = Container::subgroup(category.id, sub.id);
                out.extend(sub.foods.iter().map(|f| (FoodRef::new(container, f.id), f)));
            }
        }
        out
    }

    /// Visit every food mutably, in the same order as `all_foods`.
    pub fn for_each_food_mut(&mut self, f: &mut dyn FnMut(&mut Food)) {
        self.loose_foods.iter_mut().for_each(&mut *f);
        for category in &mut self.categories {
            category.foods.iter_mut().for_each(&mut *f);
            for sub in &mut category.subgroups {
                sub.foods.iter_mut().for_each(&mut *f);
            }
        }
    }

    pub fn food_count(&self) -> usize {
        self.loose_foods.len() + self.categories.iter().map(Category::total_foods).sum::<usize>()
    }

    /// The container that currently holds the food, if any.
    pub fn locate_food(&self, id: FoodId) -> Option<Container> {
        self.find_food(id).map(|(r, _)| r.container)
    }

    pub fn find_food(&self, id: FoodId) -> Option<(FoodRef, &Food)> {
        self.all_foods().into_iter().find(|(r, _)| r.food_id == id)
    }

    /// Largest id of any entity in the catalog (0 when empty).
    pub fn max_id(&self) -> i64 {
        let mut max = 0;
        for (_, food) in self.all_foods() {
            max = max.max(food.id);
        }
        for tag in &self.tags {
            max = max.max(tag.id);
        }
        for category in &self.categories {
            max = max.max(category.id);
            for sub in &category.subgroups {
                max = max.max(sub.id);
            }
        }
        max
    }
}
