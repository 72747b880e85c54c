use std::collections::HashSet;

use serde::Serialize;

use crate::io::backup::BackupInfo;
use crate::model::{Catalog, Container, Food, FoodId, FoodRef, Nutrition, Tag};
use crate::ops::search::MatchField;
use crate::util::unicode::{pad_to_width, truncate_to_width};

/// Food names longer than this are cut in listings
const NAME_WIDTH: usize = 40;

/// Width of the label column in detail views
const LABEL_WIDTH: usize = 11;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TagJson {
    pub id: i64,
    pub name: String,
}

#[derive(Serialize)]
pub struct FoodJson {
    pub id: FoodId,
    pub name: String,
    pub container: String,
    pub container_name: String,
    pub tags: Vec<TagJson>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub specific_data: String,
    #[serde(skip_serializing_if = "Nutrition::is_empty")]
    pub nutrition: Nutrition,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub id: FoodId,
    pub name: String,
    pub container: String,
    pub field: MatchField,
}

#[derive(Serialize)]
pub struct BackupJson {
    pub index: usize,
    pub path: String,
    pub created: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn tags_of(catalog: &Catalog, food: &Food) -> Vec<Tag> {
    food.tag_ids
        .iter()
        .filter_map(|id| catalog.tag(*id).cloned())
        .collect()
}

pub fn food_to_json(catalog: &Catalog, food_ref: FoodRef, food: &Food, container_name: String) -> FoodJson {
    FoodJson {
        id: food.id,
        name: food.name.clone(),
        container: food_ref.container.to_string(),
        container_name,
        tags: tags_of(catalog, food)
            .into_iter()
            .map(|t| TagJson {
                id: t.id,
                name: t.name,
            })
            .collect(),
        image_url: food.image_url.clone(),
        notes: food.notes.clone(),
        specific_data: food.specific_data.clone(),
        nutrition: food.nutrition,
    }
}

pub fn backups_to_json(backups: &[BackupInfo]) -> Vec<BackupJson> {
    backups
        .iter()
        .enumerate()
        .map(|(i, b)| BackupJson {
            index: i + 1,
            path: b.path.display().to_string(),
            created: b.created.to_rfc3339(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `<id>  <name>  #tag #tag`
pub fn format_food_line(catalog: &Catalog, food: &Food) -> String {
    let mut line = format!("{}  {}", food.id, truncate_to_width(&food.name, NAME_WIDTH));
    let tags = tags_of(catalog, food);
    if !tags.is_empty() {
        line.push_str("  ");
        line.push_str(
            &tags
                .iter()
                .map(|t| format!("#{}", t.name))
                .collect::<Vec<_>>()
                .join(" "),
        );
    }
    line
}

fn push_foods(lines: &mut Vec<String>, catalog: &Catalog, foods: &[Food], visible: &HashSet<FoodId>, indent: &str) {
    for food in foods.iter().filter(|f| visible.contains(&f.id)) {
        lines.push(format!("{}{}", indent, format_food_line(catalog, food)));
    }
}

/// The catalog as an indented tree. Only foods in `visible` are listed;
/// with `show_empty` off, containers without visible foods are skipped.
pub fn format_catalog_tree(catalog: &Catalog, visible: &HashSet<FoodId>, show_empty: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let any_visible = |foods: &[Food]| foods.iter().any(|f| visible.contains(&f.id));

    if any_visible(&catalog.loose_foods) {
        lines.push("Uncategorized".to_string());
        push_foods(&mut lines, catalog, &catalog.loose_foods, visible, "  ");
    }

    for category in &catalog.categories {
        let has_visible =
            any_visible(&category.foods) || category.subgroups.iter().any(|s| any_visible(&s.foods));
        if !has_visible && !show_empty {
            continue;
        }
        lines.push(format!(
            "{}  ({})",
            category.name,
            Container::category(category.id)
        ));
        push_foods(&mut lines, catalog, &category.foods, visible, "  ");
        for sub in &category.subgroups {
            if !show_empty && !any_visible(&sub.foods) {
                continue;
            }
            lines.push(format!(
                "  {}  ({})",
                sub.name,
                Container::subgroup(category.id, sub.id)
            ));
            push_foods(&mut lines, catalog, &sub.foods, visible, "    ");
        }
    }

    lines
}

fn labeled(label: &str, value: impl std::fmt::Display) -> String {
    format!("{}{}", pad_to_width(label, LABEL_WIDTH), value)
}

/// Detailed view of one food
pub fn format_food_detail(catalog: &Catalog, food: &Food, container_name: &str, container: Container) -> Vec<String> {
    let mut lines = vec![format!("{}  ({})", food.name, food.id)];
    lines.push(labeled("container:", format!("{} ({})", container_name, container)));

    let tags = tags_of(catalog, food);
    if !tags.is_empty() {
        let names: Vec<String> = tags.iter().map(|t| format!("#{}", t.name)).collect();
        lines.push(labeled("tags:", names.join(" ")));
    }
    if !food.image_url.is_empty() {
        let shown = if crate::io::image_store::is_inline_image(&food.image_url) {
            "(embedded)".to_string()
        } else {
            food.image_url.clone()
        };
        lines.push(labeled("image:", shown));
    }
    if !food.specific_data.is_empty() {
        lines.push(labeled("specific:", &food.specific_data));
    }
    for (name, value) in food.nutrition.fields() {
        if let Some(v) = value {
            lines.push(labeled(&format!("{}:", name), v));
        }
    }
    if !food.notes.is_empty() {
        lines.push("notes:".to_string());
        for line in food.notes.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_tag_line(tag: &Tag, uses: usize) -> String {
    format!("{}  #{}  ({} foods)", tag.id, tag.name, uses)
}

pub fn format_match_field(field: MatchField) -> &'static str {
    match field {
        MatchField::Name => "name",
        MatchField::Notes => "notes",
        MatchField::SpecificData => "specific",
        MatchField::Tag => "tag",
    }
}
