use indexmap::IndexSet;

use crate::model::{Catalog, Nutrition, TagId, ValidationConfig};
use crate::ops::error::{Violation, Violations};
use crate::util::unicode::char_count;

/// Check a (trimmed) food name against the configured limits.
pub fn check_food_name(name: &str, limits: &ValidationConfig, out: &mut Violations) {
    if name.trim().is_empty() {
        out.push(Violation::FoodNameRequired);
    } else if char_count(name.trim()) > limits.food_name_max {
        out.push(Violation::FoodNameTooLong {
            max: limits.food_name_max,
        });
    }
}

/// Check a tag name against the configured limits.
pub fn check_tag_name(name: &str, limits: &ValidationConfig, out: &mut Violations) {
    if name.trim().is_empty() {
        out.push(Violation::TagNameRequired);
    } else if char_count(name.trim()) > limits.tag_name_max {
        out.push(Violation::TagNameTooLong {
            max: limits.tag_name_max,
        });
    }
}

/// Category and subgroup names only need to be non-empty.
pub fn check_container_name(name: &str, kind: &'static str) -> Violations {
    let mut out = Violations::default();
    if name.trim().is_empty() {
        out.push(Violation::NameRequired { kind });
    }
    out
}

/// Check a tag id set: at most `max_tags_per_food` distinct ids, every one
/// present in the catalog. Unknown ids are reported individually.
pub fn check_tag_ids(
    tag_ids: &IndexSet<TagId>,
    catalog: &Catalog,
    limits: &ValidationConfig,
    out: &mut Violations,
) {
    if tag_ids.len() > limits.max_tags_per_food {
        out.push(Violation::TooManyTags {
            max: limits.max_tags_per_food,
        });
    }
    for id in tag_ids {
        if !catalog.has_tag(*id) {
            out.push(Violation::UnknownTag(*id));
        }
    }
}

/// NaN and infinities cannot be stored in the JSON document.
pub fn check_nutrition(nutrition: &Nutrition, out: &mut Violations) {
    for (field, value) in nutrition.fields() {
        if value.is_some_and(|v| !v.is_finite()) {
            out.push(Violation::NutrientNotFinite { field });
        }
    }
}

/// Full validation of a food's user-editable fields.
pub fn validate_food(
    name: &str,
    tag_ids: &IndexSet<TagId>,
    nutrition: &Nutrition,
    catalog: &Catalog,
    limits: &ValidationConfig,
) -> Violations {
    let mut out = Violations::default();
    check_food_name(name, limits, &mut out);
    check_tag_ids(tag_ids, catalog, limits, &mut out);
    check_nutrition(nutrition, &mut out);
    out
}
