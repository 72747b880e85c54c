use std::collections::HashSet;

use tracing::{debug, warn};

use crate::model::{
    Catalog, Category, CategoryId, Container, Food, FoodId, FoodRef, IdGenerator, Subgroup,
    SubgroupId, Tag, TagId, ValidationConfig,
};
use crate::ops::catalog_ops;
use crate::ops::error::CatalogError;
use crate::ops::food_ops::{self, FoodPatch, NewFood};

/// Result of a tag deletion
#[derive(Debug, Clone)]
pub struct TagDeletion {
    pub tag: Tag,
    /// Number of foods the tag was stripped from
    pub foods_affected: usize,
}

/// Owner and sole mutator of the in-memory catalog.
///
/// Every method that changes the tree bumps `revision`; callers compare
/// revisions to decide whether a save is due. Operations that turn out to
/// be no-ops leave the revision alone.
#[derive(Debug)]
pub struct CatalogStore {
    catalog: Catalog,
    ids: IdGenerator,
    limits: ValidationConfig,
    revision: u64,
}

impl CatalogStore {
    pub fn new(limits: ValidationConfig) -> Self {
        CatalogStore::from_catalog(Catalog::default(), limits)
    }

    /// Take ownership of a loaded catalog, repairing what older documents
    /// may carry: duplicate ids (from same-millisecond creation) and tag
    /// references to tags that no longer exist.
    pub fn from_catalog(mut catalog: Catalog, limits: ValidationConfig) -> Self {
        let mut ids = IdGenerator::seeded(catalog.max_id());
        repair_duplicate_ids(&mut catalog, &mut ids);
        drop_stale_tag_refs(&mut catalog);
        CatalogStore {
            catalog,
            ids,
            limits,
            revision: 0,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn limits(&self) -> &ValidationConfig {
        &self.limits
    }

    /// Monotonic mutation counter
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the whole catalog (backup restore). Counts as one mutation.
    /// Ids handed out before the swap stay retired.
    pub fn replace(&mut self, catalog: Catalog) {
        let revision = self.revision;
        let floor = self.ids.last();
        *self = CatalogStore::from_catalog(catalog, self.limits);
        self.ids.observe(floor);
        self.revision = revision;
        self.touch("replace catalog");
    }

    fn touch(&mut self, what: &str) {
        self.revision += 1;
        debug!(revision = self.revision, "{}", what);
    }

    fn touch_if(&mut self, changed: bool, what: &str) -> bool {
        if changed {
            self.touch(what);
        }
        changed
    }

    // -----------------------------------------------------------------------
    // Categories and subgroups
    // -----------------------------------------------------------------------

    pub fn add_category(&mut self, name: &str) -> Result<&Category, CatalogError> {
        let id = self.ids.next();
        catalog_ops::add_category(&mut self.catalog, id, name)?;
        self.touch("add category");
        self.category(id)
    }

    pub fn rename_category(&mut self, id: CategoryId, new_name: &str) -> Result<bool, CatalogError> {
        let changed = catalog_ops::rename_category(&mut self.catalog, id, new_name)?;
        Ok(self.touch_if(changed, "rename category"))
    }

    pub fn delete_category(&mut self, id: CategoryId) -> Result<Category, CatalogError> {
        let removed = catalog_ops::delete_category(&mut self.catalog, id)?;
        self.touch("delete category");
        Ok(removed)
    }

    pub fn reorder_categories(&mut self, old_index: usize, new_index: usize) -> Result<bool, CatalogError> {
        let changed = catalog_ops::reorder_categories(&mut self.catalog, old_index, new_index)?;
        Ok(self.touch_if(changed, "reorder categories"))
    }

    pub fn add_subgroup(&mut self, category_id: CategoryId, name: &str) -> Result<&Subgroup, CatalogError> {
        let id = self.ids.next();
        catalog_ops::add_subgroup(&mut self.catalog, category_id, id, name)?;
        self.touch("add subgroup");
        self.catalog
            .subgroup(category_id, id)
            .ok_or_else(|| CatalogError::NotFound(format!("subgroup {}", id)))
    }

    pub fn rename_subgroup(
        &mut self,
        category_id: CategoryId,
        id: SubgroupId,
        new_name: &str,
    ) -> Result<bool, CatalogError> {
        let changed = catalog_ops::rename_subgroup(&mut self.catalog, category_id, id, new_name)?;
        Ok(self.touch_if(changed, "rename subgroup"))
    }

    /// Delete a subgroup; its foods move to the end of the category's
    /// direct foods. Returns the number of foods promoted.
    pub fn delete_subgroup(&mut self, category_id: CategoryId, id: SubgroupId) -> Result<usize, CatalogError> {
        let promoted = catalog_ops::delete_subgroup(&mut self.catalog, category_id, id)?;
        self.touch("delete subgroup");
        Ok(promoted)
    }

    pub fn reorder_subgroups(
        &mut self,
        category_id: CategoryId,
        old_index: usize,
        new_index: usize,
    ) -> Result<bool, CatalogError> {
        let changed =
            catalog_ops::reorder_subgroups(&mut self.catalog, category_id, old_index, new_index)?;
        Ok(self.touch_if(changed, "reorder subgroups"))
    }

    // -----------------------------------------------------------------------
    // Foods
    // -----------------------------------------------------------------------

    pub fn add_food(&mut self, container: Container, new: NewFood) -> Result<&Food, CatalogError> {
        let id = self.ids.next();
        food_ops::add_food(&mut self.catalog, container, id, new, &self.limits)?;
        self.touch("add food");
        food_ops::find_in(&self.catalog, container, id)
    }

    pub fn update_food(&mut self, id: FoodId, container: Container, patch: FoodPatch) -> Result<bool, CatalogError> {
        let changed = food_ops::update_food(&mut self.catalog, id, container, patch, &self.limits)?;
        Ok(self.touch_if(changed, "update food"))
    }

    pub fn delete_food(&mut self, id: FoodId, container: Container) -> Result<Food, CatalogError> {
        let removed = food_ops::delete_food(&mut self.catalog, id, container)?;
        self.touch("delete food");
        Ok(removed)
    }

    /// Same-container positional move. `reorder(c, i, i)` is a no-op and
    /// does not bump the revision.
    pub fn reorder(&mut self, container: Container, old_index: usize, new_index: usize) -> Result<bool, CatalogError> {
        let changed = food_ops::reorder(&mut self.catalog, container, old_index, new_index)?;
        Ok(self.touch_if(changed, "reorder foods"))
    }

    /// Cross-container transfer. Returns the index the food landed at.
    pub fn move_food(
        &mut self,
        food_id: FoodId,
        from: Container,
        to: Container,
        to_index: usize,
    ) -> Result<usize, CatalogError> {
        let landed = food_ops::move_food(&mut self.catalog, food_id, from, to, to_index)?;
        self.touch("move food");
        Ok(landed)
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    pub fn add_tag(&mut self, name: &str) -> Result<&Tag, CatalogError> {
        let id = self.ids.next();
        catalog_ops::add_tag(&mut self.catalog, id, name, &self.limits)?;
        self.touch("add tag");
        self.catalog
            .tag(id)
            .ok_or_else(|| CatalogError::NotFound(format!("tag {}", id)))
    }

    pub fn rename_tag(&mut self, id: TagId, new_name: &str) -> Result<bool, CatalogError> {
        let changed = catalog_ops::rename_tag(&mut self.catalog, id, new_name, &self.limits)?;
        Ok(self.touch_if(changed, "rename tag"))
    }

    /// Remove a tag and strip it from every food in one pass.
    pub fn delete_tag(&mut self, id: TagId) -> Result<TagDeletion, CatalogError> {
        let (tag, foods_affected) = catalog_ops::delete_tag(&mut self.catalog, id)?;
        self.touch("delete tag");
        Ok(TagDeletion {
            tag,
            foods_affected,
        })
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn category(&self, id: CategoryId) -> Result<&Category, CatalogError> {
        self.catalog
            .category(id)
            .ok_or_else(|| CatalogError::NotFound(format!("category {}", id)))
    }

    pub fn foods(&self, container: Container) -> Result<&[Food], CatalogError> {
        self.catalog
            .foods_in(container)
            .map(|v| v.as_slice())
            .ok_or_else(|| CatalogError::NotFound(format!("container {}", container)))
    }

    pub fn find_food(&self, id: FoodId) -> Result<(FoodRef, &Food), CatalogError> {
        self.catalog
            .find_food(id)
            .ok_or_else(|| CatalogError::NotFound(format!("food {}", id)))
    }

    pub fn locate_food(&self, id: FoodId) -> Option<Container> {
        self.catalog.locate_food(id)
    }

    pub fn all_foods(&self) -> Vec<(FoodRef, &Food)> {
        self.catalog.all_foods()
    }

    /// Human-readable name of a container, for notices.
    pub fn container_name(&self, container: Container) -> String {
        match container {
            Container::Loose => "Uncategorized".to_string(),
            Container::Category { category_id } => self
                .catalog
                .category(category_id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|| format!("category {}", category_id)),
            Container::Subgroup {
                category_id,
                subgroup_id,
            } => match self.catalog.category(category_id) {
                Some(c) => match c.subgroup(subgroup_id) {
                    Some(s) => format!("{} / {}", c.name, s.name),
                    None => format!("subgroup {}", subgroup_id),
                },
                None => format!("subgroup {}", subgroup_id),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Load-time repair
// ---------------------------------------------------------------------------

fn repair_duplicate_ids(catalog: &mut Catalog, ids: &mut IdGenerator) {
    let mut seen_categories = HashSet::new();
    let mut seen_subgroups = HashSet::new();
    let mut seen_foods = HashSet::new();

    let fix = |seen: &mut HashSet<i64>, id: &mut i64, kind: &str, ids: &mut IdGenerator| {
        if !seen.insert(*id) {
            let fresh = ids.next();
            warn!(old = *id, new = fresh, "duplicate {} id reassigned", kind);
            *id = fresh;
            seen.insert(fresh);
        }
    };

    for food in &mut catalog.loose_foods {
        fix(&mut seen_foods, &mut food.id, "food", ids);
    }
    for category in &mut catalog.categories {
        fix(&mut seen_categories, &mut category.id, "category", ids);
        for food in &mut category.foods {
            fix(&mut seen_foods, &mut food.id, "food", ids);
        }
        for sub in &mut category.subgroups {
            fix(&mut seen_subgroups, &mut sub.id, "subgroup", ids);
            for food in &mut sub.foods {
                fix(&mut seen_foods, &mut food.id, "food", ids);
            }
        }
    }

    let mut seen_tags = HashSet::new();
    for tag in &catalog.tags {
        if !seen_tags.insert(tag.id) {
            warn!(id = tag.id, "duplicate tag id in catalog");
        }
    }
}

fn drop_stale_tag_refs(catalog: &mut Catalog) {
    let known: HashSet<TagId> = catalog.tags.iter().map(|t| t.id).collect();
    catalog.for_each_food_mut(&mut |food| {
        let before = food.tag_ids.len();
        food.tag_ids.retain(|id| known.contains(id));
        if food.tag_ids.len() != before {
            warn!(food = food.id, dropped = before - food.tag_ids.len(), "removed unknown tag ids");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::error::Violation;

    fn store() -> CatalogStore {
        CatalogStore::new(ValidationConfig::default())
    }

    #[test]
    fn revision_tracks_real_changes_only() {
        let mut s = store();
        let cat = s.add_category("Fruit").unwrap().id;
        assert_eq!(s.revision(), 1);
        assert!(!s.rename_category(cat, "Fruit").unwrap());
        assert_eq!(s.revision(), 1);
        assert!(s.rename_category(cat, "Fruits").unwrap());
        assert_eq!(s.revision(), 2);
    }

    #[test]
    fn failed_validation_does_not_bump_revision() {
        let mut s = store();
        let cat = s.add_category("Fruit").unwrap().id;
        let rev = s.revision();
        let err = s
            .add_food(Container::category(cat), NewFood::named("a".repeat(101)))
            .unwrap_err();
        assert!(
            err.violations()
                .unwrap()
                .contains(&Violation::FoodNameTooLong { max: 100 })
        );
        assert_eq!(s.revision(), rev);
        assert!(s.foods(Container::category(cat)).unwrap().is_empty());
    }

    #[test]
    fn ids_are_distinct_across_kinds() {
        let mut s = store();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let cat = s.add_category(&format!("C{}", i)).unwrap().id;
            assert!(seen.insert(cat));
            let sub = s.add_subgroup(cat, "S").unwrap().id;
            assert!(seen.insert(sub));
            let tag = s.add_tag(&format!("t{}", i)).unwrap().id;
            assert!(seen.insert(tag));
            let food = s.add_food(Container::subgroup(cat, sub), NewFood::named("F")).unwrap().id;
            assert!(seen.insert(food));
        }
    }

    #[test]
    fn reorder_same_index_is_silent() {
        let mut s = store();
        let cat = s.add_category("Fruit").unwrap().id;
        s.add_food(Container::category(cat), NewFood::named("Apple")).unwrap();
        s.add_food(Container::category(cat), NewFood::named("Pear")).unwrap();
        let rev = s.revision();
        let before = s.catalog().clone();
        assert!(!s.reorder(Container::category(cat), 1, 1).unwrap());
        assert_eq!(s.revision(), rev);
        assert_eq!(s.catalog(), &before);
    }

    #[test]
    fn from_catalog_repairs_duplicates_and_stale_tags() {
        let mut catalog = Catalog::default();
        catalog.tags.push(Tag::new(5, "veg"));
        let mut a = Food::new(7, "A");
        a.tag_ids.extend([5, 6]);
        catalog.loose_foods.push(a);
        catalog.loose_foods.push(Food::new(7, "B"));

        let s = CatalogStore::from_catalog(catalog, ValidationConfig::default());
        let foods = &s.catalog().loose_foods;
        assert_ne!(foods[0].id, foods[1].id);
        assert_eq!(foods[0].tag_ids.iter().copied().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn container_names() {
        let mut s = store();
        let cat = s.add_category("Fruit").unwrap().id;
        let sub = s.add_subgroup(cat, "Berries").unwrap().id;
        assert_eq!(s.container_name(Container::category(cat)), "Fruit");
        assert_eq!(s.container_name(Container::subgroup(cat, sub)), "Fruit / Berries");
        assert_eq!(s.container_name(Container::Loose), "Uncategorized");
    }
}
