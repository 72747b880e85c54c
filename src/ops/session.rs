use std::path::PathBuf;

use serde::Serialize;
use tracing::{error, warn};

use crate::io::catalog_io::{PersistenceAdapter, PersistenceError};
use crate::io::image_store::{ImageIoError, ImageStore, is_stored_image};
use crate::io::recovery;
use crate::io::save_queue::SaveQueue;
use crate::model::{
    Catalog, Category, CategoryId, Container, Food, FoodId, FoodRef, Subgroup, SubgroupId, Tag,
    TagId, ValidationConfig,
};
use crate::ops::error::CatalogError;
use crate::ops::filter::{MatchMode, TagFilter};
use crate::ops::food_ops::{FoodPatch, NewFood};
use crate::ops::move_resolver::{self, DropOutcome, Resolution};
use crate::ops::selection::BulkSelection;
use crate::ops::store::{CatalogStore, TagDeletion};

pub const SAVE_FAILED_MESSAGE: &str = "Failed to save data. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A non-blocking message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Outcome of a bulk delete
#[derive(Debug, Clone, Default)]
pub struct BulkDeleteReport {
    pub deleted: Vec<(FoodRef, Food)>,
    /// Selected refs that no longer resolved
    pub missing: Vec<FoodRef>,
    pub image_failures: usize,
}

/// The catalog store wired to its collaborators.
///
/// Every mutating call changes memory first, then saves once. A failed
/// save leaves the in-memory change in place and queues an error notice.
pub struct Session<P: PersistenceAdapter, I: ImageStore> {
    store: CatalogStore,
    persistence: P,
    images: I,
    filter: TagFilter,
    selection: BulkSelection,
    queue: SaveQueue<Catalog>,
    notices: Vec<Notice>,
    recovery_dir: Option<PathBuf>,
}

impl<P: PersistenceAdapter, I: ImageStore> Session<P, I> {
    /// Load the catalog through `persistence` and start a session on it.
    pub fn open(mut persistence: P, images: I, limits: ValidationConfig) -> Result<Self, PersistenceError> {
        let catalog = persistence.load()?;
        Ok(Session {
            store: CatalogStore::from_catalog(catalog, limits),
            persistence,
            images,
            filter: TagFilter::default(),
            selection: BulkSelection::new(),
            queue: SaveQueue::new(),
            notices: Vec::new(),
            recovery_dir: None,
        })
    }

    /// Record deleted foods in the recovery log under `dir`.
    pub fn with_recovery_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recovery_dir = Some(dir.into());
        self
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        self.store.catalog()
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Whether a mutation is still waiting to be written
    pub fn has_unsaved_changes(&self) -> bool {
        self.queue.has_pending()
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist(&mut self) {
        let revision = self.store.revision();
        self.queue.submit(revision, self.store.catalog().clone());
        let persistence = &mut self.persistence;
        if let Err(e) = self.queue.flush(|doc| persistence.save(doc)) {
            error!(revision, error = %e, "catalog save failed");
            self.notices.push(Notice::error(SAVE_FAILED_MESSAGE));
        }
    }

    fn persist_if(&mut self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    /// Retry a save that failed earlier.
    pub fn flush(&mut self) -> Result<(), PersistenceError> {
        let persistence = &mut self.persistence;
        self.queue.flush(|doc| persistence.save(doc)).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Image cleanup
    // -----------------------------------------------------------------------

    /// Best-effort removal of a food's image file. Returns false on failure.
    fn release_image(&mut self, url: &str) -> bool {
        if !is_stored_image(url) {
            return true;
        }
        match self.images.delete(url) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = url, error = %e, "image cleanup failed");
                false
            }
        }
    }

    fn forget_food(&mut self, food: &Food, container: Container) -> bool {
        if let Some(dir) = &self.recovery_dir {
            recovery::log_food_deletion(dir, food, container);
        }
        self.release_image(&food.image_url)
    }

    pub fn store_image(&mut self, bytes: &[u8], original_name: &str) -> Result<String, ImageIoError> {
        self.images.save(bytes, original_name)
    }

    /// Drop an image that was stored for a food that never got saved.
    pub fn discard_image(&mut self, url: &str) {
        self.release_image(url);
    }

    // -----------------------------------------------------------------------
    // Categories and subgroups
    // -----------------------------------------------------------------------

    pub fn add_category(&mut self, name: &str) -> Result<Category, CatalogError> {
        let category = self.store.add_category(name)?.clone();
        self.persist();
        Ok(category)
    }

    pub fn rename_category(&mut self, id: CategoryId, name: &str) -> Result<bool, CatalogError> {
        let changed = self.store.rename_category(id, name)?;
        Ok(self.persist_if(changed))
    }

    /// Delete a category with everything in it. Image cleanup for its foods
    /// is best-effort.
    pub fn delete_category(&mut self, id: CategoryId) -> Result<Category, CatalogError> {
        let category = self.store.delete_category(id)?;
        self.persist();
        for food in &category.foods {
            self.forget_food(food, Container::category(category.id));
        }
        for sub in &category.subgroups {
            for food in &sub.foods {
                self.forget_food(food, Container::subgroup(category.id, sub.id));
            }
        }
        Ok(category)
    }

    pub fn reorder_categories(&mut self, old_index: usize, new_index: usize) -> Result<bool, CatalogError> {
        let changed = self.store.reorder_categories(old_index, new_index)?;
        Ok(self.persist_if(changed))
    }

    pub fn add_subgroup(&mut self, category_id: CategoryId, name: &str) -> Result<Subgroup, CatalogError> {
        let subgroup = self.store.add_subgroup(category_id, name)?.clone();
        self.persist();
        Ok(subgroup)
    }

    pub fn rename_subgroup(
        &mut self,
        category_id: CategoryId,
        id: SubgroupId,
        name: &str,
    ) -> Result<bool, CatalogError> {
        let changed = self.store.rename_subgroup(category_id, id, name)?;
        Ok(self.persist_if(changed))
    }

    pub fn delete_subgroup(&mut self, category_id: CategoryId, id: SubgroupId) -> Result<usize, CatalogError> {
        let promoted = self.store.delete_subgroup(category_id, id)?;
        self.selection
            .rehome(Container::subgroup(category_id, id), Container::category(category_id));
        self.persist();
        Ok(promoted)
    }

    pub fn reorder_subgroups(
        &mut self,
        category_id: CategoryId,
        old_index: usize,
        new_index: usize,
    ) -> Result<bool, CatalogError> {
        let changed = self.store.reorder_subgroups(category_id, old_index, new_index)?;
        Ok(self.persist_if(changed))
    }

    // -----------------------------------------------------------------------
    // Foods
    // -----------------------------------------------------------------------

    pub fn add_food(&mut self, container: Container, new: NewFood) -> Result<Food, CatalogError> {
        let food = self.store.add_food(container, new)?.clone();
        self.persist();
        Ok(food)
    }

    /// Apply a patch. Replacing a stored image releases the old file.
    pub fn update_food(&mut self, id: FoodId, container: Container, patch: FoodPatch) -> Result<bool, CatalogError> {
        let old_image = self
            .store
            .foods(container)?
            .iter()
            .find(|f| f.id == id)
            .map(|f| f.image_url.clone());
        let changed = self.store.update_food(id, container, patch)?;
        if !self.persist_if(changed) {
            return Ok(false);
        }
        if let Some(old) = old_image {
            let still_used = self
                .store
                .find_food(id)
                .map(|(_, f)| f.image_url == old)
                .unwrap_or(false);
            if !still_used {
                self.release_image(&old);
            }
        }
        Ok(true)
    }

    pub fn delete_food(&mut self, id: FoodId, container: Container) -> Result<Food, CatalogError> {
        let food = self.store.delete_food(id, container)?;
        self.selection_forget(FoodRef::new(container, id));
        self.persist();
        self.forget_food(&food, container);
        Ok(food)
    }

    fn ensure_not_bulk(&self) -> Result<(), CatalogError> {
        if self.selection.is_active() {
            return Err(CatalogError::BulkModeActive);
        }
        Ok(())
    }

    pub fn reorder(&mut self, container: Container, old_index: usize, new_index: usize) -> Result<bool, CatalogError> {
        self.ensure_not_bulk()?;
        let changed = self.store.reorder(container, old_index, new_index)?;
        Ok(self.persist_if(changed))
    }

    pub fn move_food(
        &mut self,
        food_id: FoodId,
        from: Container,
        to: Container,
        to_index: usize,
    ) -> Result<usize, CatalogError> {
        self.ensure_not_bulk()?;
        let landed = self.store.move_food(food_id, from, to, to_index)?;
        self.persist();
        Ok(landed)
    }

    /// Apply a drag-and-drop result. A cross-container move also queues an
    /// info notice naming the food and both containers.
    pub fn apply_drop(&mut self, drop: &DropOutcome) -> Result<Resolution, CatalogError> {
        self.ensure_not_bulk()?;
        let resolution = move_resolver::apply_drop(&mut self.store, drop)?;
        if resolution.changed() {
            self.persist();
        }
        if let Resolution::Moved(transition) = &resolution {
            self.notices.push(Notice::info(transition.message()));
        }
        Ok(resolution)
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    pub fn add_tag(&mut self, name: &str) -> Result<Tag, CatalogError> {
        let tag = self.store.add_tag(name)?.clone();
        self.persist();
        Ok(tag)
    }

    pub fn rename_tag(&mut self, id: TagId, name: &str) -> Result<bool, CatalogError> {
        let changed = self.store.rename_tag(id, name)?;
        Ok(self.persist_if(changed))
    }

    /// Delete a tag everywhere, including the active filter.
    pub fn delete_tag(&mut self, id: TagId) -> Result<TagDeletion, CatalogError> {
        let deletion = self.store.delete_tag(id)?;
        self.filter.forget_tag(id);
        self.persist();
        Ok(deletion)
    }

    // -----------------------------------------------------------------------
    // Filter
    // -----------------------------------------------------------------------

    pub fn filter(&self) -> &TagFilter {
        &self.filter
    }

    /// Returns whether the tag is selected afterwards.
    pub fn toggle_filter_tag(&mut self, tag_id: TagId) -> bool {
        self.filter.toggle(tag_id)
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.filter.mode = mode;
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn visible(&self) -> Vec<FoodRef> {
        self.filter.visible(self.store.catalog())
    }

    // -----------------------------------------------------------------------
    // Bulk selection
    // -----------------------------------------------------------------------

    pub fn selection(&self) -> &BulkSelection {
        &self.selection
    }

    pub fn enter_bulk_mode(&mut self) {
        self.selection.enter();
    }

    pub fn exit_bulk_mode(&mut self) {
        self.selection.exit();
    }

    pub fn toggle_selected(&mut self, r: FoodRef) -> bool {
        self.selection.toggle(r)
    }

    /// Add a ref to the selection; selecting twice keeps it selected.
    pub fn select(&mut self, r: FoodRef) -> bool {
        self.selection.select(r)
    }

    pub fn select_all_visible(&mut self) {
        let visible = self.visible();
        self.selection.select_all_visible(visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn selection_forget(&mut self, r: FoodRef) {
        if self.selection.contains(&r) {
            self.selection.toggle(r);
        }
    }

    /// Delete every selected food, then save once. Missing foods and image
    /// failures are reported, never fatal. The selection is emptied; bulk
    /// mode stays on.
    pub fn bulk_delete(&mut self) -> BulkDeleteReport {
        let mut report = BulkDeleteReport::default();
        for r in self.selection.take() {
            match self.store.delete_food(r.food_id, r.container) {
                Ok(food) => {
                    if !self.forget_food(&food, r.container) {
                        report.image_failures += 1;
                    }
                    report.deleted.push((r, food));
                }
                Err(e) => {
                    warn!(food = %r, error = %e, "selected food no longer exists");
                    report.missing.push(r);
                }
            }
        }
        if !report.deleted.is_empty() {
            self.persist();
        }
        report
    }

    // -----------------------------------------------------------------------
    // Backups
    // -----------------------------------------------------------------------

    /// Replace the whole catalog, e.g. from a backup, and save it.
    pub fn restore(&mut self, catalog: Catalog) {
        self.store.replace(catalog);
        let known: Vec<TagId> = self.store.catalog().tags.iter().map(|t| t.id).collect();
        self.filter.selected.retain(|id| known.contains(id));
        self.selection.clear();
        self.persist();
    }
}
