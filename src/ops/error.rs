use std::fmt;

use crate::model::TagId;

/// A single broken input rule. `Display` gives the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    FoodNameRequired,
    FoodNameTooLong { max: usize },
    TagNameRequired,
    TagNameTooLong { max: usize },
    /// Category or subgroup name empty after trimming
    NameRequired { kind: &'static str },
    TooManyTags { max: usize },
    UnknownTag(TagId),
    MaxFoodsReached { max: usize },
    MaxTagsReached { max: usize },
    NutrientNotFinite { field: &'static str },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FoodNameRequired => write!(f, "Please enter food name"),
            Violation::FoodNameTooLong { max } => {
                write!(f, "Food name is too long (max {} characters)", max)
            }
            Violation::TagNameRequired => write!(f, "Please enter tag name"),
            Violation::TagNameTooLong { max } => {
                write!(f, "Tag name is too long (max {} characters)", max)
            }
            Violation::NameRequired { kind } => write!(f, "Please enter {} name", kind),
            Violation::TooManyTags { max } => write!(f, "Maximum {} tags per food item", max),
            Violation::UnknownTag(id) => write!(f, "Unknown tag id {}", id),
            Violation::MaxFoodsReached { max } => {
                write!(f, "Maximum number of foods reached ({})", max)
            }
            Violation::MaxTagsReached { max } => {
                write!(f, "Maximum number of tags reached ({})", max)
            }
            Violation::NutrientNotFinite { field } => write!(f, "{} must be a finite number", field),
        }
    }
}

/// Every violation found for one input, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn push(&mut self, v: Violation) {
        self.0.push(v);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, v: &Violation) -> bool {
        self.0.contains(v)
    }

    /// `Ok` when nothing was violated, otherwise a `CatalogError::Validation`.
    pub fn into_result(self) -> Result<(), CatalogError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Validation(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", messages.join(", "))
    }
}

/// Error type for catalog mutations. All of these are raised before the
/// catalog is touched.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    Validation(Violations),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("index {index} out of range (length {len})")]
    Range { index: usize, len: usize },
    #[error("reordering is disabled while bulk select mode is active")]
    BulkModeActive,
}

impl CatalogError {
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            CatalogError::Validation(v) => Some(v),
            _ => None,
        }
    }
}
