use serde::{Deserialize, Serialize};

/// Tag ids are creation timestamps (milliseconds), like every other entity id.
pub type TagId = i64;

/// A label that foods reference by id. Tags hold no back-reference to foods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

impl Tag {
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Tag {
            id,
            name: name.into(),
        }
    }
}
