use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{CategoryId, Container, FoodId, SubgroupId};
use crate::ops::error::CatalogError;
use crate::ops::store::CatalogStore;

/// A drag-and-drop container id as reported by the UI layer:
/// `root` (legacy flat list), `category:<id>` or `subgroup:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Root,
    Category(CategoryId),
    Subgroup(SubgroupId),
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Root => write!(f, "root"),
            ContainerId::Category(id) => write!(f, "category:{}", id),
            ContainerId::Subgroup(id) => write!(f, "subgroup:{}", id),
        }
    }
}

impl FromStr for ContainerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "root" || s == "loose" {
            return Ok(ContainerId::Root);
        }
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid container '{}': expected loose, category:<id> or subgroup:<id>", s))?;
        let id: i64 = id
            .parse()
            .map_err(|_| format!("invalid container id '{}'", id))?;
        match kind {
            "category" => Ok(ContainerId::Category(id)),
            "subgroup" => Ok(ContainerId::Subgroup(id)),
            other => Err(format!("unknown container kind '{}'", other)),
        }
    }
}

impl From<Container> for ContainerId {
    fn from(c: Container) -> Self {
        match c {
            Container::Loose => ContainerId::Root,
            Container::Category { category_id } => ContainerId::Category(category_id),
            Container::Subgroup { subgroup_id, .. } => ContainerId::Subgroup(subgroup_id),
        }
    }
}

/// Resolve a drag-and-drop id to a catalog container. Subgroup ids carry
/// no owner, so the owning category is looked up.
pub fn resolve_container(store: &CatalogStore, id: ContainerId) -> Result<Container, CatalogError> {
    match id {
        ContainerId::Root => Ok(Container::Loose),
        ContainerId::Category(category_id) => {
            store.category(category_id)?;
            Ok(Container::category(category_id))
        }
        ContainerId::Subgroup(subgroup_id) => store
            .catalog()
            .subgroup_owner(subgroup_id)
            .map(|category_id| Container::subgroup(category_id, subgroup_id))
            .ok_or_else(|| CatalogError::NotFound(format!("subgroup {}", subgroup_id))),
    }
}

/// Raw drag-and-drop result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropOutcome {
    pub source: ContainerId,
    pub dest: ContainerId,
    pub old_index: usize,
    pub new_index: usize,
    pub food_id: FoodId,
}

/// Which food left which named container for which other one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub food_id: FoodId,
    pub food_name: String,
    #[serde(skip)]
    pub from: Container,
    pub from_name: String,
    #[serde(skip)]
    pub to: Container,
    pub to_name: String,
    /// Final index in the destination
    pub index: usize,
}

impl Transition {
    pub fn message(&self) -> String {
        format!(
            "Moved {} from {} to {}",
            self.food_name, self.from_name, self.to_name
        )
    }
}

/// What a drop turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Same container, same index
    NoOp,
    Reordered {
        container: Container,
        old_index: usize,
        new_index: usize,
    },
    Moved(Transition),
}

impl Resolution {
    /// Whether the catalog changed and a save is due
    pub fn changed(&self) -> bool {
        !matches!(self, Resolution::NoOp)
    }
}

/// Translate a drop into exactly one store call: `reorder` within a
/// container, `move_food` across containers.
pub fn apply_drop(store: &mut CatalogStore, drop: &DropOutcome) -> Result<Resolution, CatalogError> {
    if drop.source == drop.dest {
        if drop.old_index == drop.new_index {
            return Ok(Resolution::NoOp);
        }
        let container = resolve_container(store, drop.source)?;
        store.reorder(container, drop.old_index, drop.new_index)?;
        return Ok(Resolution::Reordered {
            container,
            old_index: drop.old_index,
            new_index: drop.new_index,
        });
    }

    let from = resolve_container(store, drop.source)?;
    let to = resolve_container(store, drop.dest)?;
    let food_name = store.find_food(drop.food_id)?.1.name.clone();
    let from_name = store.container_name(from);
    let to_name = store.container_name(to);
    let index = store.move_food(drop.food_id, from, to, drop.new_index)?;
    Ok(Resolution::Moved(Transition {
        food_id: drop.food_id,
        food_name,
        from,
        from_name,
        to,
        to_name,
        index,
    }))
}
