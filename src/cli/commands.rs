use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::Nutrition;
use crate::ops::move_resolver::ContainerId;

#[derive(Parser)]
#[command(name = "larder", about = concat!("larder v", env!("CARGO_PKG_VERSION"), " - a food catalog for your diet"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a larder/ data directory here
    Init,
    /// List foods, optionally filtered by tags
    List(ListArgs),
    /// Show one food
    Show(ShowArgs),
    /// Search foods by regex
    Search(SearchArgs),
    /// Add a food
    Add(AddArgs),
    /// Edit a food
    Edit(EditArgs),
    /// Delete foods (one save for all of them)
    Rm(RmArgs),
    /// Move a food to another container or position
    Mv(MvArgs),
    /// Reorder foods within a container
    Reorder(ReorderArgs),
    /// Manage tags
    Tag(TagCmd),
    /// Manage categories
    Category(CategoryCmd),
    /// Manage subgroups
    Subgroup(SubgroupCmd),
    /// Create, list or restore backups
    Backup(BackupCmd),
    /// View the recovery log
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only foods carrying this tag id (repeatable)
    #[arg(long = "tag", value_name = "TAG_ID")]
    pub tags: Vec<i64>,
    /// Match any selected tag instead of all of them
    #[arg(long)]
    pub any: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Food id
    pub id: i64,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Regex matched against name, notes, specific data and tag names
    pub pattern: String,
}

// ---------------------------------------------------------------------------
// Food write args
// ---------------------------------------------------------------------------

/// Per-100g nutrition values
#[derive(Args, Default)]
pub struct NutritionArgs {
    #[arg(long)]
    pub protein: Option<f64>,
    #[arg(long)]
    pub fat: Option<f64>,
    #[arg(long)]
    pub carbs: Option<f64>,
    #[arg(long)]
    pub fiber: Option<f64>,
    #[arg(long)]
    pub sugar: Option<f64>,
    #[arg(long)]
    pub sodium: Option<f64>,
}

impl NutritionArgs {
    pub fn is_empty(&self) -> bool {
        self.to_nutrition().is_empty()
    }

    pub fn to_nutrition(&self) -> Nutrition {
        self.apply_to(Nutrition::default())
    }

    /// Overlay the given values on `base`
    pub fn apply_to(&self, base: Nutrition) -> Nutrition {
        Nutrition {
            protein: self.protein.or(base.protein),
            fat: self.fat.or(base.fat),
            carbs: self.carbs.or(base.carbs),
            fiber: self.fiber.or(base.fiber),
            sugar: self.sugar.or(base.sugar),
            sodium: self.sodium.or(base.sodium),
        }
    }
}

#[derive(Args)]
pub struct AddArgs {
    /// Food name
    pub name: String,
    /// Destination: loose, category:<id> or subgroup:<id>
    #[arg(long, default_value = "loose")]
    pub to: ContainerId,
    /// Tag id (repeatable)
    #[arg(long = "tag", value_name = "TAG_ID")]
    pub tags: Vec<i64>,
    /// Image file to copy into the data directory
    #[arg(long)]
    pub image: Option<PathBuf>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Free-form details (brand, package size, ...)
    #[arg(long)]
    pub specific: Option<String>,
    #[command(flatten)]
    pub nutrition: NutritionArgs,
}

#[derive(Args)]
pub struct EditArgs {
    /// Food id
    pub id: i64,
    #[arg(long)]
    pub name: Option<String>,
    /// Replace the food's tags (repeatable)
    #[arg(long = "tag", value_name = "TAG_ID")]
    pub tags: Vec<i64>,
    /// Remove all tags
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
    /// Replace the image with this file
    #[arg(long)]
    pub image: Option<PathBuf>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub specific: Option<String>,
    #[command(flatten)]
    pub nutrition: NutritionArgs,
}

#[derive(Args)]
pub struct RmArgs {
    /// Food ids
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Food id
    pub id: i64,
    /// Destination container
    #[arg(long)]
    pub to: ContainerId,
    /// Position in the destination (default: end)
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Container: loose, category:<id> or subgroup:<id>
    pub container: ContainerId,
    /// Current position (0-indexed)
    pub old: usize,
    /// New position (0-indexed)
    pub new: usize,
}

// ---------------------------------------------------------------------------
// Tags, categories, subgroups
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TagCmd {
    #[command(subcommand)]
    pub action: TagAction,
}

#[derive(Subcommand)]
pub enum TagAction {
    /// Create a tag
    Add(NameArg),
    /// Delete a tag and strip it from every food
    Rm(IdArg),
    /// Rename a tag
    Rename(RenameArgs),
    /// List tags
    List,
}

#[derive(Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    pub action: CategoryAction,
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a category
    Add(NameArg),
    /// Rename a category
    Rename(RenameArgs),
    /// Delete a category with all of its foods and subgroups
    Rm(IdArg),
    /// Move a category to a new position
    Mv(PositionArgs),
}

#[derive(Args)]
pub struct SubgroupCmd {
    #[command(subcommand)]
    pub action: SubgroupAction,
}

#[derive(Subcommand)]
pub enum SubgroupAction {
    /// Create a subgroup in a category
    Add(SubgroupAddArgs),
    /// Rename a subgroup
    Rename(RenameArgs),
    /// Delete a subgroup; its foods move up to the category
    Rm(IdArg),
    /// Move a subgroup to a new position within its category
    Mv(PositionArgs),
}

#[derive(Args)]
pub struct NameArg {
    pub name: String,
}

#[derive(Args)]
pub struct IdArg {
    pub id: i64,
}

#[derive(Args)]
pub struct RenameArgs {
    pub id: i64,
    pub name: String,
}

#[derive(Args)]
pub struct PositionArgs {
    /// Category or subgroup id
    pub id: i64,
    /// New position (0-indexed)
    pub position: usize,
}

#[derive(Args)]
pub struct SubgroupAddArgs {
    /// Owning category id
    pub category: i64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Backups and recovery
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BackupCmd {
    #[command(subcommand)]
    pub action: BackupAction,
}

#[derive(Subcommand)]
pub enum BackupAction {
    /// Write a backup of the current catalog
    Create,
    /// List backups, newest first
    List,
    /// Replace the catalog with a backup
    Restore(RestoreArgs),
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Backup file path, or its number from `backup list` (1 = newest)
    pub backup: String,
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}
