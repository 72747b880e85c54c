use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::tag::TagId;

pub type FoodId = i64;

/// Per-food nutrition facts. Every field is optional; a food with no
/// nutrition data has all six set to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fiber: Option<f64>,
    #[serde(default)]
    pub sugar: Option<f64>,
    #[serde(default)]
    pub sodium: Option<f64>,
}

impl Nutrition {
    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }

    /// Field names paired with their values, in display order
    pub fn fields(&self) -> [(&'static str, Option<f64>); 6] {
        [
            ("protein", self.protein),
            ("fat", self.fat),
            ("carbs", self.carbs),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
        ]
    }
}

/// A single catalog entry.
///
/// Persisted with camelCase keys. Older documents store the tag ids under
/// `tags` and may lack `nutrition`, `notes` or `specificData` entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: FoodId,
    pub name: String,
    /// Relative path into the images directory, or an inline `data:` URI
    #[serde(default, deserialize_with = "null_as_default")]
    pub image_url: String,
    /// Legacy flag kept for document compatibility; nothing reads it
    #[serde(default, deserialize_with = "null_as_default")]
    pub selected: bool,
    #[serde(default, alias = "tags", deserialize_with = "null_as_default")]
    pub tag_ids: IndexSet<TagId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub nutrition: Nutrition,
    #[serde(default, deserialize_with = "null_as_default")]
    pub specific_data: String,
}

impl Food {
    /// A bare food with only an id and a name
    pub fn new(id: FoodId, name: impl Into<String>) -> Self {
        Food {
            id,
            name: name.into(),
            image_url: String::new(),
            selected: false,
            tag_ids: IndexSet::new(),
            notes: String::new(),
            nutrition: Nutrition::default(),
            specific_data: String::new(),
        }
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_food_without_newer_fields() {
        let food: Food =
            serde_json::from_str(r#"{"id":1,"name":"Oats","imageUrl":"","selected":false,"tags":[3,4,3]}"#)
                .unwrap();
        assert_eq!(food.tag_ids.iter().copied().collect::<Vec<_>>(), vec![3, 4]);
        assert!(food.nutrition.is_empty());
        assert_eq!(food.notes, "");
        assert_eq!(food.specific_data, "");
    }

    #[test]
    fn null_nutrition_becomes_all_none() {
        let food: Food =
            serde_json::from_str(r#"{"id":1,"name":"Oats","nutrition":null,"tagIds":null}"#).unwrap();
        assert_eq!(food.nutrition, Nutrition::default());
        assert!(food.tag_ids.is_empty());
        assert_eq!(food.image_url, "");
    }

    #[test]
    fn serializes_camel_case_with_all_nutrition_fields() {
        let mut food = Food::new(7, "Lentils");
        food.nutrition.protein = Some(9.0);
        let json = serde_json::to_value(&food).unwrap();
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["tagIds"], serde_json::json!([]));
        assert_eq!(json["specificData"], "");
        assert_eq!(json["nutrition"]["protein"], 9.0);
        assert!(json["nutrition"]["sodium"].is_null());
    }
}
