use std::ops::Range;

use regex::Regex;
use serde::Serialize;

use crate::model::{Catalog, Food, FoodRef};

/// Which field of a food matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Name,
    Notes,
    SpecificData,
    /// A tag name on the food
    Tag,
}

/// A search hit on one field of one food
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub food: FoodRef,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search every food in the catalog, in flattening order.
pub fn search_foods(catalog: &Catalog, re: &Regex) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for (food_ref, food) in catalog.all_foods() {
        search_food(re, catalog, food_ref, food, &mut hits);
    }
    hits
}

fn search_food(re: &Regex, catalog: &Catalog, food_ref: FoodRef, food: &Food, hits: &mut Vec<SearchHit>) {
    let mut push = |field, text: &str| {
        let spans = find_matches(re, text);
        if !spans.is_empty() {
            hits.push(SearchHit {
                food: food_ref,
                field,
                spans,
            });
        }
    };

    push(MatchField::Name, &food.name);
    push(MatchField::Notes, &food.notes);
    push(MatchField::SpecificData, &food.specific_data);
    for tag_id in &food.tag_ids {
        if let Some(tag) = catalog.tag(*tag_id) {
            push(MatchField::Tag, &tag.name);
        }
    }
}
