use crate::model::{
    Catalog, Category, CategoryId, Subgroup, SubgroupId, Tag, TagId, ValidationConfig,
};
use crate::ops::error::{CatalogError, Violation, Violations};
use crate::ops::validate::{check_container_name, check_tag_name};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Append a new category. The name is stored trimmed.
pub fn add_category<'a>(
    catalog: &'a mut Catalog,
    id: CategoryId,
    name: &str,
) -> Result<&'a Category, CatalogError> {
    check_container_name(name, "category").into_result()?;
    catalog.categories.push(Category::new(id, name.trim()));
    Ok(&catalog.categories[catalog.categories.len() - 1])
}

/// Rename a category. Returns whether anything changed: a blank name or
/// the current name is a no-op, not an error.
pub fn rename_category(
    catalog: &mut Catalog,
    id: CategoryId,
    new_name: &str,
) -> Result<bool, CatalogError> {
    let category = catalog
        .category_mut(id)
        .ok_or_else(|| CatalogError::NotFound(format!("category {}", id)))?;
    Ok(apply_rename(&mut category.name, new_name))
}

/// Remove a category with all of its foods and subgroups.
pub fn delete_category(catalog: &mut Catalog, id: CategoryId) -> Result<Category, CatalogError> {
    let idx = catalog
        .categories
        .iter()
        .position(|c| c.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("category {}", id)))?;
    Ok(catalog.categories.remove(idx))
}

pub fn reorder_categories(
    catalog: &mut Catalog,
    old_index: usize,
    new_index: usize,
) -> Result<bool, CatalogError> {
    array_move(&mut catalog.categories, old_index, new_index)
}

// ---------------------------------------------------------------------------
// Subgroups
// ---------------------------------------------------------------------------

pub fn add_subgroup<'a>(
    catalog: &'a mut Catalog,
    category_id: CategoryId,
    id: SubgroupId,
    name: &str,
) -> Result<&'a Subgroup, CatalogError> {
    let category = catalog
        .category_mut(category_id)
        .ok_or_else(|| CatalogError::NotFound(format!("category {}", category_id)))?;
    check_container_name(name, "subgroup").into_result()?;
    category.subgroups.push(Subgroup::new(id, name.trim()));
    Ok(&category.subgroups[category.subgroups.len() - 1])
}

pub fn rename_subgroup(
    catalog: &mut Catalog,
    category_id: CategoryId,
    id: SubgroupId,
    new_name: &str,
) -> Result<bool, CatalogError> {
    let subgroup = catalog
        .category_mut(category_id)
        .and_then(|c| c.subgroup_mut(id))
        .ok_or_else(|| CatalogError::NotFound(format!("subgroup {}", id)))?;
    Ok(apply_rename(&mut subgroup.name, new_name))
}

/// Remove a subgroup, appending its foods (in order) to the parent
/// category's direct foods. Returns how many foods were promoted.
pub fn delete_subgroup(
    catalog: &mut Catalog,
    category_id: CategoryId,
    id: SubgroupId,
) -> Result<usize, CatalogError> {
    let category = catalog
        .category_mut(category_id)
        .ok_or_else(|| CatalogError::NotFound(format!("category {}", category_id)))?;
    let idx = category
        .subgroups
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("subgroup {}", id)))?;
    let subgroup = category.subgroups.remove(idx);
    let promoted = subgroup.foods.len();
    category.foods.extend(subgroup.foods);
    Ok(promoted)
}

pub fn reorder_subgroups(
    catalog: &mut Catalog,
    category_id: CategoryId,
    old_index: usize,
    new_index: usize,
) -> Result<bool, CatalogError> {
    let category = catalog
        .category_mut(category_id)
        .ok_or_else(|| CatalogError::NotFound(format!("category {}", category_id)))?;
    array_move(&mut category.subgroups, old_index, new_index)
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

/// Append a tag. Duplicate names are allowed; ids tell them apart.
pub fn add_tag<'a>(
    catalog: &'a mut Catalog,
    id: TagId,
    name: &str,
    limits: &ValidationConfig,
) -> Result<&'a Tag, CatalogError> {
    let mut violations = Violations::default();
    check_tag_name(name, limits, &mut violations);
    if catalog.tags.len() >= limits.max_total_tags {
        violations.push(Violation::MaxTagsReached {
            max: limits.max_total_tags,
        });
    }
    violations.into_result()?;
    catalog.tags.push(Tag::new(id, name.trim()));
    Ok(&catalog.tags[catalog.tags.len() - 1])
}

/// Rename a tag. A blank name is rejected (unlike categories, since a tag
/// name is validated input); the current name is a no-op.
pub fn rename_tag(
    catalog: &mut Catalog,
    id: TagId,
    new_name: &str,
    limits: &ValidationConfig,
) -> Result<bool, CatalogError> {
    let mut violations = Violations::default();
    check_tag_name(new_name, limits, &mut violations);
    let tag = catalog
        .tags
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("tag {}", id)))?;
    violations.into_result()?;
    Ok(apply_rename(&mut tag.name, new_name))
}

/// Remove a tag and strip its id from every food in every container.
/// Returns the removed tag and the number of foods that referenced it.
pub fn delete_tag(catalog: &mut Catalog, id: TagId) -> Result<(Tag, usize), CatalogError> {
    let idx = catalog
        .tags
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| CatalogError::NotFound(format!("tag {}", id)))?;
    let tag = catalog.tags.remove(idx);
    let mut affected = 0;
    catalog.for_each_food_mut(&mut |food| {
        if food.tag_ids.shift_remove(&id) {
            affected += 1;
        }
    });
    Ok((tag, affected))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn apply_rename(current: &mut String, new_name: &str) -> bool {
    let trimmed = new_name.trim();
    if trimmed.is_empty() || trimmed == current {
        return false;
    }
    *current = trimmed.to_string();
    true
}

/// Classic array move: remove at `old_index`, reinsert at `new_index`.
/// Returns `false` for the `old == new` no-op.
pub fn array_move<T>(items: &mut Vec<T>, old_index: usize, new_index: usize) -> Result<bool, CatalogError> {
    let len = items.len();
    for index in [old_index, new_index] {
        if index >= len {
            return Err(CatalogError::Range { index, len });
        }
    }
    if old_index == new_index {
        return Ok(false);
    }
    let item = items.remove(old_index);
    items.insert(new_index, item);
    Ok(true)
}
