use indexmap::IndexSet;

use crate::model::{Catalog, Container, Food, FoodId, Nutrition, TagId, ValidationConfig};
use crate::ops::catalog_ops::array_move;
use crate::ops::error::{CatalogError, Violation};
use crate::ops::validate::validate_food;

/// Fields supplied when creating a food. The id is assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewFood {
    pub name: String,
    pub image_url: String,
    /// Duplicates collapse
    pub tag_ids: Vec<TagId>,
    pub notes: String,
    pub nutrition: Nutrition,
    pub specific_data: String,
}

impl NewFood {
    pub fn named(name: impl Into<String>) -> Self {
        NewFood {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }
}

/// A partial edit; `None` leaves the field alone.
#[derive(Debug, Clone, Default)]
pub struct FoodPatch {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub tag_ids: Option<Vec<TagId>>,
    pub notes: Option<String>,
    pub nutrition: Option<Nutrition>,
    pub specific_data: Option<String>,
}

impl FoodPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.image_url.is_none()
            && self.tag_ids.is_none()
            && self.notes.is_none()
            && self.nutrition.is_none()
            && self.specific_data.is_none()
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// Validate and append a new food to `container`.
pub fn add_food<'a>(
    catalog: &'a mut Catalog,
    container: Container,
    id: FoodId,
    new: NewFood,
    limits: &ValidationConfig,
) -> Result<&'a Food, CatalogError> {
    if catalog.foods_in(container).is_none() {
        return Err(CatalogError::NotFound(format!("container {}", container)));
    }

    let tag_ids: IndexSet<TagId> = new.tag_ids.into_iter().collect();
    let mut violations = validate_food(&new.name, &tag_ids, &new.nutrition, catalog, limits);
    if catalog.food_count() >= limits.max_total_foods {
        violations.push(Violation::MaxFoodsReached {
            max: limits.max_total_foods,
        });
    }
    violations.into_result()?;

    let food = Food {
        id,
        name: new.name.trim().to_string(),
        image_url: new.image_url,
        selected: false,
        tag_ids,
        notes: new.notes,
        nutrition: new.nutrition,
        specific_data: new.specific_data,
    };
    let foods = catalog
        .foods_in_mut(container)
        .ok_or_else(|| CatalogError::NotFound(format!("container {}", container)))?;
    foods.push(food);
    Ok(&foods[foods.len() - 1])
}

/// Apply a patch to the food `id` held in `container`. The merged result is
/// validated as a whole before anything is written. Returns whether any
/// field actually changed.
pub fn update_food(
    catalog: &mut Catalog,
    id: FoodId,
    container: Container,
    patch: FoodPatch,
    limits: &ValidationConfig,
) -> Result<bool, CatalogError> {
    let current = find_in(catalog, container, id)?.clone();

    let name = patch
        .name
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| current.name.clone());
    let tag_ids: IndexSet<TagId> = match patch.tag_ids {
        Some(ids) => ids.into_iter().collect(),
        None => current.tag_ids.clone(),
    };
    let nutrition = patch.nutrition.unwrap_or(current.nutrition);
    validate_food(&name, &tag_ids, &nutrition, catalog, limits).into_result()?;

    let updated = Food {
        id,
        name,
        image_url: patch.image_url.unwrap_or_else(|| current.image_url.clone()),
        selected: current.selected,
        tag_ids,
        notes: patch.notes.unwrap_or_else(|| current.notes.clone()),
        nutrition,
        specific_data: patch
            .specific_data
            .unwrap_or_else(|| current.specific_data.clone()),
    };
    let changed = !same_food(&updated, &current);
    if changed {
        let slot = find_in_mut(catalog, container, id)?;
        *slot = updated;
    }
    Ok(changed)
}

/// Remove the food from its container and hand it back, so the caller can
/// clean up its image.
pub fn delete_food(
    catalog: &mut Catalog,
    id: FoodId,
    container: Container,
) -> Result<Food, CatalogError> {
    let foods = catalog
        .foods_in_mut(container)
        .ok_or_else(|| CatalogError::NotFound(format!("container {}", container)))?;
    let idx = foods
        .iter()
        .position(|f| f.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("food {} in {}", id, container)))?;
    Ok(foods.remove(idx))
}

// ---------------------------------------------------------------------------
// Ordering and moves
// ---------------------------------------------------------------------------

/// Same-container reorder. Returns `false` when nothing moved.
pub fn reorder(
    catalog: &mut Catalog,
    container: Container,
    old_index: usize,
    new_index: usize,
) -> Result<bool, CatalogError> {
    let foods = catalog
        .foods_in_mut(container)
        .ok_or_else(|| CatalogError::NotFound(format!("container {}", container)))?;
    array_move(foods, old_index, new_index)
}

/// Transfer a food from one container to another, inserting it at
/// `to_index` clamped to the destination length. Both containers are
/// resolved before the food is removed, so a failed move leaves the catalog
/// untouched. Returns the index the food landed at.
pub fn move_food(
    catalog: &mut Catalog,
    food_id: FoodId,
    from: Container,
    to: Container,
    to_index: usize,
) -> Result<usize, CatalogError> {
    if catalog.foods_in(to).is_none() {
        return Err(CatalogError::NotFound(format!("container {}", to)));
    }
    let source = catalog
        .foods_in_mut(from)
        .ok_or_else(|| CatalogError::NotFound(format!("container {}", from)))?;
    let idx = source
        .iter()
        .position(|f| f.id == food_id)
        .ok_or_else(|| CatalogError::NotFound(format!("food {} in {}", food_id, from)))?;
    let food = source.remove(idx);

    let dest = catalog
        .foods_in_mut(to)
        .ok_or_else(|| CatalogError::NotFound(format!("container {}", to)))?;
    let landed = to_index.min(dest.len());
    dest.insert(landed, food);
    Ok(landed)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn find_in(catalog: &Catalog, container: Container, id: FoodId) -> Result<&Food, CatalogError> {
    catalog
        .foods_in(container)
        .and_then(|foods| foods.iter().find(|f| f.id == id))
        .ok_or_else(|| CatalogError::NotFound(format!("food {} in {}", id, container)))
}

fn find_in_mut(
    catalog: &mut Catalog,
    container: Container,
    id: FoodId,
) -> Result<&mut Food, CatalogError> {
    catalog
        .foods_in_mut(container)
        .and_then(|foods| foods.iter_mut().find(|f| f.id == id))
        .ok_or_else(|| CatalogError::NotFound(format!("food {} in {}", id, container)))
}

/// Field-by-field comparison that also respects tag order.
fn same_food(a: &Food, b: &Food) -> bool {
    a == b && a.tag_ids.iter().eq(b.tag_ids.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Subgroup, Tag};

    fn sample() -> Catalog {
        let mut fruit = Category::new(10, "Fruit");
        fruit.foods.push(Food::new(1, "Apple"));
        fruit.foods.push(Food::new(2, "Pear"));
        let mut berries = Subgroup::new(20, "Berries");
        berries.foods.push(Food::new(3, "Blueberry"));
        fruit.subgroups.push(berries);
        Catalog {
            loose_foods: vec![Food::new(4, "Bread")],
            tags: vec![Tag::new(30, "sweet"), Tag::new(31, "snack")],
            categories: vec![fruit, Category::new(11, "Veg")],
        }
    }

    fn names(catalog: &Catalog, container: Container) -> Vec<String> {
        catalog
            .foods_in(container)
            .unwrap()
            .iter()
            .map(|f| f.name.clone())
            .collect()
    }

    #[test]
    fn add_food_appends_and_collapses_tags() {
        let mut catalog = sample();
        let limits = ValidationConfig::default();
        let food = add_food(
            &mut catalog,
            Container::subgroup(10, 20),
            100,
            NewFood::named(" Strawberry ").with_tags([30, 31, 30]),
            &limits,
        )
        .unwrap();
        assert_eq!(food.name, "Strawberry");
        assert_eq!(food.tag_ids.len(), 2);
        assert_eq!(
            names(&catalog, Container::subgroup(10, 20)),
            vec!["Blueberry", "Strawberry"]
        );
    }

    #[test]
    fn add_food_rejects_unknown_tags_without_mutating() {
        let mut catalog = sample();
        let err = add_food(
            &mut catalog,
            Container::category(11),
            100,
            NewFood::named("Kale").with_tags([30, 77, 78]),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        let v = err.violations().unwrap();
        assert!(v.contains(&Violation::UnknownTag(77)));
        assert!(v.contains(&Violation::UnknownTag(78)));
        assert!(catalog.category(11).unwrap().foods.is_empty());
    }

    #[test]
    fn add_food_to_missing_container() {
        let mut catalog = sample();
        let err = add_food(
            &mut catalog,
            Container::category(99),
            100,
            NewFood::named("Kale"),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn add_food_respects_total_limit() {
        let mut catalog = sample();
        let limits = ValidationConfig {
            max_total_foods: 4,
            ..Default::default()
        };
        let err = add_food(&mut catalog, Container::Loose, 100, NewFood::named("Rice"), &limits)
            .unwrap_err();
        assert!(
            err.violations()
                .unwrap()
                .contains(&Violation::MaxFoodsReached { max: 4 })
        );
    }

    #[test]
    fn update_food_patches_fields() {
        let mut catalog = sample();
        let limits = ValidationConfig::default();
        let patch = FoodPatch {
            notes: Some("crunchy".into()),
            tag_ids: Some(vec![31]),
            nutrition: Some(Nutrition {
                fiber: Some(2.4),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(update_food(&mut catalog, 1, Container::category(10), patch, &limits).unwrap());
        let apple = find_in(&catalog, Container::category(10), 1).unwrap();
        assert_eq!(apple.name, "Apple");
        assert_eq!(apple.notes, "crunchy");
        assert!(apple.has_tag(31));
        assert_eq!(apple.nutrition.fiber, Some(2.4));
    }

    #[test]
    fn update_food_unchanged_reports_false() {
        let mut catalog = sample();
        let patch = FoodPatch {
            name: Some("Apple".into()),
            ..Default::default()
        };
        let changed = update_food(
            &mut catalog,
            1,
            Container::category(10),
            patch,
            &ValidationConfig::default(),
        )
        .unwrap();
        assert!(!changed);
    }

    #[test]
    fn update_food_wrong_locator() {
        let mut catalog = sample();
        let err = update_food(
            &mut catalog,
            1,
            Container::Loose,
            FoodPatch::default(),
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn update_food_rejects_nan_nutrient() {
        let mut catalog = sample();
        let patch = FoodPatch {
            nutrition: Some(Nutrition {
                carbs: Some(f64::NAN),
                ..Nutrition::default()
            }),
            ..Default::default()
        };
        let err = update_food(
            &mut catalog,
            1,
            Container::category(10),
            patch,
            &ValidationConfig::default(),
        )
        .unwrap_err();
        assert!(
            err.violations()
                .unwrap()
                .contains(&Violation::NutrientNotFinite { field: "carbs" })
        );
        let apple = find_in(&catalog, Container::category(10), 1).unwrap();
        assert!(apple.nutrition.is_empty());
    }

    #[test]
    fn update_food_invalid_name_keeps_old_value() {
        let mut catalog = sample();
        let patch = FoodPatch {
            name: Some("x".repeat(101)),
            notes: Some("changed".into()),
            ..Default::default()
        };
        assert!(
            update_food(
                &mut catalog,
                1,
                Container::category(10),
                patch,
                &ValidationConfig::default()
            )
            .is_err()
        );
        let apple = find_in(&catalog, Container::category(10), 1).unwrap();
        assert_eq!(apple.notes, "");
    }

    #[test]
    fn delete_food_returns_removed() {
        let mut catalog = sample();
        let removed = delete_food(&mut catalog, 2, Container::category(10)).unwrap();
        assert_eq!(removed.name, "Pear");
        assert_eq!(names(&catalog, Container::category(10)), vec!["Apple"]);
        assert!(delete_food(&mut catalog, 2, Container::category(10)).is_err());
    }

    #[test]
    fn reorder_within_container() {
        let mut catalog = sample();
        assert!(reorder(&mut catalog, Container::category(10), 0, 1).unwrap());
        assert_eq!(names(&catalog, Container::category(10)), vec!["Pear", "Apple"]);
        assert!(matches!(
            reorder(&mut catalog, Container::category(10), 0, 2),
            Err(CatalogError::Range { index: 2, len: 2 })
        ));
    }

    #[test]
    fn move_food_between_every_kind() {
        let mut catalog = sample();
        // category -> subgroup
        assert_eq!(
            move_food(&mut catalog, 1, Container::category(10), Container::subgroup(10, 20), 0)
                .unwrap(),
            0
        );
        assert_eq!(
            names(&catalog, Container::subgroup(10, 20)),
            vec!["Apple", "Blueberry"]
        );
        // subgroup -> other category, index clamped
        assert_eq!(
            move_food(&mut catalog, 3, Container::subgroup(10, 20), Container::category(11), 50)
                .unwrap(),
            0
        );
        // loose -> category
        move_food(&mut catalog, 4, Container::Loose, Container::category(11), 1).unwrap();
        assert_eq!(names(&catalog, Container::category(11)), vec!["Blueberry", "Bread"]);
        assert!(catalog.loose_foods.is_empty());
        assert_eq!(catalog.food_count(), 4);
    }

    #[test]
    fn move_food_to_missing_destination_leaves_source() {
        let mut catalog = sample();
        let before = catalog.clone();
        let err =
            move_food(&mut catalog, 1, Container::category(10), Container::category(99), 0)
                .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
        assert_eq!(catalog, before);
    }

    #[test]
    fn move_food_within_same_container_clamps() {
        let mut catalog = sample();
        move_food(&mut catalog, 1, Container::category(10), Container::category(10), 9).unwrap();
        assert_eq!(names(&catalog, Container::category(10)), vec!["Pear", "Apple"]);
    }
}
