mod init;
pub use init::cmd_init;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::backup;
use crate::io::catalog_io::JsonFileStore;
use crate::io::data_dir::DataDir;
use crate::io::image_store::FsImageStore;
use crate::io::recovery;
use crate::model::{Container, FoodId, FoodRef};
use crate::ops::error::CatalogError;
use crate::ops::filter::{MatchMode, TagFilter};
use crate::ops::food_ops::{FoodPatch, NewFood};
use crate::ops::move_resolver::{ContainerId, DropOutcome, Resolution, resolve_container};
use crate::ops::search;
use crate::ops::session::{NoticeLevel, SAVE_FAILED_MESSAGE, Session};

type AppSession = Session<JsonFileStore, FsImageStore>;

/// Per-invocation settings shared by every handler
pub struct Ctx {
    /// Where data directory discovery starts
    pub start: PathBuf,
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(command: Commands, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init => cmd_init(&ctx.start),

        // Read commands
        Commands::List(args) => cmd_list(args, ctx),
        Commands::Show(args) => cmd_show(args, ctx),
        Commands::Search(args) => cmd_search(args, ctx),
        Commands::Recovery(args) => cmd_recovery(args, ctx),

        // Write commands
        Commands::Add(args) => cmd_add(args, ctx),
        Commands::Edit(args) => cmd_edit(args, ctx),
        Commands::Rm(args) => cmd_rm(args, ctx),
        Commands::Mv(args) => cmd_mv(args, ctx),
        Commands::Reorder(args) => cmd_reorder(args, ctx),
        Commands::Tag(cmd) => cmd_tag(cmd, ctx),
        Commands::Category(cmd) => cmd_category(cmd, ctx),
        Commands::Subgroup(cmd) => cmd_subgroup(cmd, ctx),
        Commands::Backup(cmd) => cmd_backup(cmd, ctx),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_session(ctx: &Ctx) -> Result<(DataDir, AppSession), Box<dyn std::error::Error>> {
    let data = DataDir::discover(&ctx.start)?;
    let session = Session::open(
        data.catalog_store(),
        data.image_store(),
        data.config.validation,
    )?
    .with_recovery_dir(&data.path);
    Ok((data, session))
}

/// Print queued notices; a failed save becomes the command's error.
fn finish(session: &mut AppSession, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let mut save_failed = false;
    for notice in session.take_notices() {
        match notice.level {
            NoticeLevel::Info if !ctx.json => println!("{}", notice.message),
            NoticeLevel::Info => {}
            NoticeLevel::Error => save_failed = true,
        }
    }
    if save_failed || session.has_unsaved_changes() {
        return Err(SAVE_FAILED_MESSAGE.into());
    }
    Ok(())
}

fn locate(session: &AppSession, id: FoodId) -> Result<FoodRef, CatalogError> {
    session.store().find_food(id).map(|(r, _)| r)
}

fn position_of(session: &AppSession, r: FoodRef) -> Result<usize, CatalogError> {
    session
        .store()
        .foods(r.container)?
        .iter()
        .position(|f| f.id == r.food_id)
        .ok_or_else(|| CatalogError::NotFound(format!("food {}", r.food_id)))
}

fn subgroup_container(session: &AppSession, subgroup_id: i64) -> Result<Container, CatalogError> {
    resolve_container(session.store(), ContainerId::Subgroup(subgroup_id))
}

/// Copy an image file into the data directory, returning its relative path.
fn import_image(session: &mut AppSession, path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read image {}: {}", path.display(), e))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(session.store_image(&bytes, name)?)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session(ctx)?;
    let catalog = session.catalog();
    for id in &args.tags {
        if !catalog.has_tag(*id) {
            return Err(format!("unknown tag id {}", id).into());
        }
    }
    let mode = if args.any { MatchMode::Any } else { MatchMode::All };
    let filter = TagFilter::new(args.tags, mode);
    let visible = filter.visible(catalog);

    if ctx.json {
        let foods: Vec<FoodJson> = visible
            .iter()
            .filter_map(|r| {
                let (_, food) = catalog.find_food(r.food_id)?;
                Some(food_to_json(catalog, *r, food, session.store().container_name(r.container)))
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&foods)?);
        return Ok(());
    }

    let ids: HashSet<FoodId> = visible.iter().map(|r| r.food_id).collect();
    let lines = format_catalog_tree(catalog, &ids, filter.is_empty());
    if lines.is_empty() {
        println!("no foods");
    } else {
        print_lines(&lines);
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session(ctx)?;
    let (r, food) = session.store().find_food(args.id)?;
    let container_name = session.store().container_name(r.container);
    if ctx.json {
        let json = food_to_json(session.catalog(), r, food, container_name);
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        print_lines(&format_food_detail(session.catalog(), food, &container_name, r.container));
    }
    Ok(())
}

fn cmd_search(args: SearchArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, session) = open_session(ctx)?;
    let re = Regex::new(&args.pattern)?;
    let catalog = session.catalog();
    let hits = search::search_foods(catalog, &re);

    // one line per food, first matching field wins
    let mut seen = HashSet::new();
    let mut results = Vec::new();
    for hit in &hits {
        if !seen.insert(hit.food.food_id) {
            continue;
        }
        if let Some((_, food)) = catalog.find_food(hit.food.food_id) {
            results.push(SearchHitJson {
                id: food.id,
                name: food.name.clone(),
                container: hit.food.container.to_string(),
                field: hit.field,
            });
        }
    }

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        for r in &results {
            println!("[{}] {}  {}  ({})", r.container, r.id, r.name, format_match_field(r.field));
        }
    }
    Ok(())
}

fn cmd_recovery(args: RecoveryArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let data = DataDir::discover(&ctx.start)?;
    let entries = recovery::read_recovery_entries(&data.path, Some(args.limit.unwrap_or(10)));
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("recovery log is empty");
    } else {
        for entry in &entries {
            print!("{}", entry.to_markdown());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Food write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    let container = resolve_container(session.store(), args.to)?;
    let image_url = match &args.image {
        Some(path) => import_image(&mut session, path)?,
        None => String::new(),
    };
    let new = NewFood {
        name: args.name,
        image_url: image_url.clone(),
        tag_ids: args.tags,
        notes: args.notes.unwrap_or_default(),
        nutrition: args.nutrition.to_nutrition(),
        specific_data: args.specific.unwrap_or_default(),
    };
    let food = match session.add_food(container, new) {
        Ok(food) => food,
        Err(e) => {
            session.discard_image(&image_url);
            return Err(e.into());
        }
    };

    if ctx.json {
        let r = FoodRef::new(container, food.id);
        let json = food_to_json(session.catalog(), r, &food, session.store().container_name(container));
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!(
            "Added {} {} to {}",
            food.id,
            food.name,
            session.store().container_name(container)
        );
    }
    finish(&mut session, ctx)
}

fn cmd_edit(args: EditArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    let r = locate(&session, args.id)?;
    let current = session.store().find_food(args.id)?.1.nutrition;

    let mut patch = FoodPatch {
        name: args.name,
        notes: args.notes,
        specific_data: args.specific,
        ..FoodPatch::default()
    };
    if args.clear_tags {
        patch.tag_ids = Some(Vec::new());
    } else if !args.tags.is_empty() {
        patch.tag_ids = Some(args.tags);
    }
    if !args.nutrition.is_empty() {
        patch.nutrition = Some(args.nutrition.apply_to(current));
    }
    if let Some(path) = &args.image {
        patch.image_url = Some(import_image(&mut session, path)?);
    }
    if patch.is_empty() {
        return Err("nothing to change".into());
    }

    let new_image = patch.image_url.clone();
    match session.update_food(r.food_id, r.container, patch) {
        Ok(true) => println!("Updated {}", r.food_id),
        Ok(false) => println!("No changes"),
        Err(e) => {
            if let Some(url) = new_image {
                session.discard_image(&url);
            }
            return Err(e.into());
        }
    }
    finish(&mut session, ctx)
}

fn cmd_rm(args: RmArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    session.enter_bulk_mode();
    for id in &args.ids {
        match locate(&session, *id) {
            Ok(r) => {
                session.select(r);
            }
            Err(_) => eprintln!("warning: no food with id {}", id),
        }
    }
    if session.selection().is_empty() {
        return Err("no matching foods".into());
    }

    let report = session.bulk_delete();
    session.exit_bulk_mode();
    for (_, food) in &report.deleted {
        println!("Deleted {} {}", food.id, food.name);
    }
    if report.image_failures > 0 {
        eprintln!("warning: {} image file(s) could not be removed", report.image_failures);
    }
    finish(&mut session, ctx)
}

fn cmd_mv(args: MvArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    let r = locate(&session, args.id)?;
    let old_index = position_of(&session, r)?;
    let source: ContainerId = r.container.into();
    let new_index = match args.index {
        Some(i) => i,
        None if source == args.to => session.store().foods(r.container)?.len() - 1,
        None => usize::MAX,
    };
    let drop = DropOutcome {
        source,
        dest: args.to,
        old_index,
        new_index,
        food_id: args.id,
    };

    match session.apply_drop(&drop)? {
        Resolution::NoOp => println!("No change"),
        Resolution::Reordered { new_index, .. } => {
            println!("Moved {} to position {}", args.id, new_index)
        }
        Resolution::Moved(transition) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&transition)?);
            }
        }
    }
    finish(&mut session, ctx)
}

fn cmd_reorder(args: ReorderArgs, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    let container = resolve_container(session.store(), args.container)?;
    if session.reorder(container, args.old, args.new)? {
        println!("Moved position {} to {}", args.old, args.new);
    } else {
        println!("No change");
    }
    finish(&mut session, ctx)
}

// ---------------------------------------------------------------------------
// Tags, categories, subgroups
// ---------------------------------------------------------------------------

fn cmd_tag(cmd: TagCmd, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    match cmd.action {
        TagAction::Add(arg) => {
            let tag = session.add_tag(&arg.name)?;
            println!("Added tag {} #{}", tag.id, tag.name);
        }
        TagAction::Rm(arg) => {
            let deletion = session.delete_tag(arg.id)?;
            println!(
                "Deleted tag #{} (removed from {} foods)",
                deletion.tag.name, deletion.foods_affected
            );
        }
        TagAction::Rename(arg) => {
            if session.rename_tag(arg.id, &arg.name)? {
                println!("Renamed tag {}", arg.id);
            } else {
                println!("No change");
            }
        }
        TagAction::List => {
            let catalog = session.catalog();
            let uses = |id| catalog.all_foods().iter().filter(|(_, f)| f.has_tag(id)).count();
            if ctx.json {
                let tags: Vec<TagJson> = catalog
                    .tags
                    .iter()
                    .map(|t| TagJson {
                        id: t.id,
                        name: t.name.clone(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for tag in &catalog.tags {
                    println!("{}", format_tag_line(tag, uses(tag.id)));
                }
            }
            return Ok(());
        }
    }
    finish(&mut session, ctx)
}

fn cmd_category(cmd: CategoryCmd, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    match cmd.action {
        CategoryAction::Add(arg) => {
            let category = session.add_category(&arg.name)?;
            println!("Added category {} {}", category.id, category.name);
        }
        CategoryAction::Rename(arg) => {
            if session.rename_category(arg.id, &arg.name)? {
                println!("Renamed category {}", arg.id);
            } else {
                println!("No change");
            }
        }
        CategoryAction::Rm(arg) => {
            let category = session.delete_category(arg.id)?;
            println!(
                "Deleted category {} ({} foods)",
                category.name,
                category.total_foods()
            );
        }
        CategoryAction::Mv(arg) => {
            let old = session
                .catalog()
                .categories
                .iter()
                .position(|c| c.id == arg.id)
                .ok_or_else(|| CatalogError::NotFound(format!("category {}", arg.id)))?;
            if session.reorder_categories(old, arg.position)? {
                println!("Moved category {} to position {}", arg.id, arg.position);
            } else {
                println!("No change");
            }
        }
    }
    finish(&mut session, ctx)
}

fn cmd_subgroup(cmd: SubgroupCmd, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (_, mut session) = open_session(ctx)?;
    match cmd.action {
        SubgroupAction::Add(arg) => {
            let subgroup = session.add_subgroup(arg.category, &arg.name)?;
            println!("Added subgroup {} {}", subgroup.id, subgroup.name);
        }
        SubgroupAction::Rename(arg) => {
            let Container::Subgroup { category_id, .. } = subgroup_container(&session, arg.id)? else {
                return Err(CatalogError::NotFound(format!("subgroup {}", arg.id)).into());
            };
            if session.rename_subgroup(category_id, arg.id, &arg.name)? {
                println!("Renamed subgroup {}", arg.id);
            } else {
                println!("No change");
            }
        }
        SubgroupAction::Rm(arg) => {
            let Container::Subgroup { category_id, .. } = subgroup_container(&session, arg.id)? else {
                return Err(CatalogError::NotFound(format!("subgroup {}", arg.id)).into());
            };
            let promoted = session.delete_subgroup(category_id, arg.id)?;
            println!("Deleted subgroup {} ({} foods moved to its category)", arg.id, promoted);
        }
        SubgroupAction::Mv(arg) => {
            let Container::Subgroup { category_id, .. } = subgroup_container(&session, arg.id)? else {
                return Err(CatalogError::NotFound(format!("subgroup {}", arg.id)).into());
            };
            let old = session
                .store()
                .category(category_id)?
                .subgroups
                .iter()
                .position(|s| s.id == arg.id)
                .ok_or_else(|| CatalogError::NotFound(format!("subgroup {}", arg.id)))?;
            if session.reorder_subgroups(category_id, old, arg.position)? {
                println!("Moved subgroup {} to position {}", arg.id, arg.position);
            } else {
                println!("No change");
            }
        }
    }
    finish(&mut session, ctx)
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

fn cmd_backup(cmd: BackupCmd, ctx: &Ctx) -> Result<(), Box<dyn std::error::Error>> {
    let (data, mut session) = open_session(ctx)?;
    let dir = data.backups_dir();
    match cmd.action {
        BackupAction::Create => {
            let path = backup::create_backup(&dir, session.catalog())?;
            println!("Backup written to {}", path.display());
            Ok(())
        }
        BackupAction::List => {
            let backups = backup::list_backups(&dir)?;
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&backups_to_json(&backups))?);
            } else if backups.is_empty() {
                println!("no backups");
            } else {
                for json in backups_to_json(&backups) {
                    println!("{:>3}  {}  {}", json.index, json.created, json.path);
                }
            }
            Ok(())
        }
        BackupAction::Restore(arg) => {
            let path = match arg.backup.parse::<usize>() {
                Ok(n) => backup::list_backups(&dir)?
                    .into_iter()
                    .nth(n.saturating_sub(1))
                    .map(|b| b.path)
                    .ok_or_else(|| format!("no backup number {}", n))?,
                Err(_) => PathBuf::from(&arg.backup),
            };
            let catalog = backup::restore_backup(&path)?;
            let safety = backup::create_backup(&dir, session.catalog())?;
            println!("Current catalog saved to {}", safety.display());
            session.restore(catalog);
            println!("Restored {}", path.display());
            finish(&mut session, ctx)
        }
    }
}
