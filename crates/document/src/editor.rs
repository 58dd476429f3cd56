use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::{
    AssetId, AssetRecord, Bounds, Camera, ChangeSource, DocumentError, ListenerFilter, PageId,
    PageRecord, Record, RecordType, RecordsDiff, Result, ShapeId, ShapeRecord, Size, Store,
    StoreSnapshot, UndoHistory,
};

/// Hard ceiling on the number of pages a document may hold.
pub const DEFAULT_MAX_PAGES: usize = 40;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraOptions {
    pub is_locked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceState {
    pub is_readonly: bool,
    pub is_pen_mode: bool,
    pub is_debug_mode: bool,
    pub export_background: bool,
}

/// Preferences owned by one editor instance. Two overlays in one process
/// never share these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub id: String,
    pub is_dark_mode: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            id: "inkdeck".to_string(),
            is_dark_mode: false,
        }
    }
}

/// The session half of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub current_page_id: PageId,
    pub camera: Camera,
    pub instance: InstanceState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub document: StoreSnapshot,
    pub session: SessionState,
}

/// Editing facade over a [`Store`]: pages, active page, camera, undo
/// history and instance flags.
#[derive(Debug)]
pub struct Editor {
    store: Store,
    current_page: PageId,
    camera: Camera,
    camera_options: CameraOptions,
    viewport: Size,
    instance: InstanceState,
    preferences: UserPreferences,
    history: UndoHistory,
    max_pages: usize,
    current_tool: String,
    next_shape_styles: BTreeMap<String, String>,
}

impl Editor {
    pub fn new(store: Store) -> Self {
        let mut editor = Self {
            store,
            current_page: PageId::default(),
            camera: Camera::default(),
            camera_options: CameraOptions::default(),
            viewport: Size::new(1920.0, 1080.0),
            instance: InstanceState::default(),
            preferences: UserPreferences::default(),
            history: UndoHistory::default(),
            max_pages: DEFAULT_MAX_PAGES,
            current_tool: "select".to_string(),
            next_shape_styles: BTreeMap::new(),
        };
        editor.ensure_page();
        editor
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    // ---- pages -----------------------------------------------------------

    pub fn page(&self, id: &PageId) -> Option<&PageRecord> {
        self.store.get(&id.record_id()).and_then(Record::as_page)
    }

    pub fn pages(&self) -> Vec<&PageRecord> {
        self.store
            .records_of_type(RecordType::Page)
            .filter_map(Record::as_page)
            .collect()
    }

    pub fn page_count(&self) -> usize {
        self.store.records_of_type(RecordType::Page).count()
    }

    pub fn create_page(&mut self, id: PageId, name: impl Into<String>) -> Result<()> {
        self.check_writable()?;
        if self.page(&id).is_some() {
            return Err(DocumentError::PageExists(id));
        }
        let count = self.page_count();
        if count >= self.max_pages {
            return Err(DocumentError::PageLimitReached {
                limit: self.max_pages,
            });
        }
        let page = PageRecord::new(id, name);
        debug!(page = %page.id, "creating page");
        self.edit(|store| store.put([page.into()]));
        Ok(())
    }

    /// Deletes a page together with its shapes. The last remaining page is
    /// never deleted.
    pub fn delete_page(&mut self, id: &PageId) -> Result<()> {
        self.check_writable()?;
        if self.page(id).is_none() {
            return Err(DocumentError::PageNotFound(id.clone()));
        }
        if self.page_count() <= 1 {
            return Err(DocumentError::InvalidOp(format!(
                "cannot delete the last page {}",
                id
            )));
        }
        if &self.current_page == id {
            let fallback = self
                .pages()
                .into_iter()
                .map(|p| p.id.clone())
                .find(|p| p != id);
            if let Some(fallback) = fallback {
                self.set_current_page(&fallback)?;
            }
        }
        let mut ids: Vec<_> = self
            .store
            .shapes_on_page(id)
            .map(|shape| shape.id.record_id())
            .collect();
        ids.push(id.record_id());
        debug!(page = %id, "deleting page");
        self.edit(|store| store.remove(ids));
        Ok(())
    }

    pub fn current_page_id(&self) -> &PageId {
        &self.current_page
    }

    pub fn current_page(&self) -> Option<&PageRecord> {
        self.page(&self.current_page)
    }

    pub fn set_current_page(&mut self, id: &PageId) -> Result<()> {
        if self.page(id).is_none() {
            return Err(DocumentError::PageNotFound(id.clone()));
        }
        if &self.current_page != id {
            self.current_page = id.clone();
            self.store.notify_session(ChangeSource::User);
        }
        Ok(())
    }

    fn ensure_page(&mut self) {
        if self.page(&self.current_page).is_some() {
            return;
        }
        let first = self.pages().first().map(|p| p.id.clone());
        match first {
            Some(first) => self.current_page = first,
            None => {
                let page = PageRecord::new(PageId::default(), "Page 1");
                self.current_page = page.id.clone();
                self.store.merge_remote_changes(|store| store.put([page.into()]));
            }
        }
    }

    // ---- shapes and assets ----------------------------------------------

    pub fn shape(&self, id: &ShapeId) -> Option<&ShapeRecord> {
        self.store.get(&id.record_id()).and_then(Record::as_shape)
    }

    pub fn current_page_shapes(&self) -> Vec<&ShapeRecord> {
        self.store.shapes_on_page(&self.current_page).collect()
    }

    pub fn current_page_shape_ids(&self) -> BTreeSet<ShapeId> {
        self.store
            .shapes_on_page(&self.current_page)
            .map(|shape| shape.id.clone())
            .collect()
    }

    pub fn create_shape(&mut self, shape: ShapeRecord) -> Result<()> {
        self.check_writable()?;
        if self.page(&shape.parent_id).is_none() {
            return Err(DocumentError::PageNotFound(shape.parent_id));
        }
        self.edit(|store| store.put([shape.into()]));
        Ok(())
    }

    pub fn update_shape(&mut self, shape: ShapeRecord) -> Result<()> {
        self.check_writable()?;
        if self.shape(&shape.id).is_none() {
            return Err(DocumentError::ShapeNotFound(shape.id));
        }
        self.edit(|store| store.put([shape.into()]));
        Ok(())
    }

    pub fn delete_shapes(&mut self, ids: impl IntoIterator<Item = ShapeId>) -> Result<()> {
        self.check_writable()?;
        let ids: Vec<_> = ids.into_iter().map(|id| id.record_id()).collect();
        self.edit(|store| store.remove(ids));
        Ok(())
    }

    pub fn assets(&self) -> Vec<&AssetRecord> {
        self.store
            .records_of_type(RecordType::Asset)
            .filter_map(Record::as_asset)
            .collect()
    }

    pub fn create_asset(&mut self, asset: AssetRecord) -> Result<()> {
        self.check_writable()?;
        self.edit(|store| store.put([asset.into()]));
        Ok(())
    }

    pub fn delete_assets(&mut self, ids: impl IntoIterator<Item = AssetId>) -> Result<()> {
        self.check_writable()?;
        let ids: Vec<_> = ids.into_iter().map(|id| id.record_id()).collect();
        self.edit(|store| store.remove(ids));
        Ok(())
    }

    /// Runs several edits as one undoable step.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Editor) -> R) -> R {
        let saved = std::mem::take(&mut self.history);
        let listener = self.store.listen(ListenerFilter::user_document());
        let result = f(self);
        let mut diff = RecordsDiff::default();
        for batch in listener.drain() {
            diff.squash(batch.changes);
        }
        self.store.unlisten(listener.id());
        // Steps recorded inside `f` collapse into the combined one.
        self.history = saved;
        self.history.record(diff);
        result
    }

    fn edit(&mut self, f: impl FnOnce(&mut Store)) {
        let ((), diff) = self.store.transact(f);
        self.history.record(diff);
    }

    fn check_writable(&self) -> Result<()> {
        if self.instance.is_readonly {
            Err(DocumentError::Readonly)
        } else {
            Ok(())
        }
    }

    // ---- history ---------------------------------------------------------

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn undo(&mut self) -> Result<()> {
        self.check_writable()?;
        self.history.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> Result<()> {
        self.check_writable()?;
        self.history.redo(&mut self.store)
    }

    // ---- camera ----------------------------------------------------------

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn camera_options(&self) -> CameraOptions {
        self.camera_options
    }

    pub fn set_camera_options(&mut self, options: CameraOptions) {
        self.camera_options = options;
    }

    /// Moves the camera unless it is locked. Returns whether it moved.
    pub fn set_camera(&mut self, camera: Camera) -> bool {
        if self.camera_options.is_locked {
            return false;
        }
        if self.camera != camera {
            self.camera = camera;
            self.store.notify_session(ChangeSource::User);
        }
        true
    }

    pub fn zoom_to_bounds(&mut self, bounds: Bounds, inset: f64) -> bool {
        match Camera::fit(bounds, self.viewport, inset) {
            Some(camera) => self.set_camera(camera),
            None => false,
        }
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport
    }

    /// Resizes the screen viewport. The camera is left alone.
    pub fn set_viewport_size(&mut self, size: Size) {
        self.viewport = size;
    }

    pub fn viewport_page_bounds(&self) -> Bounds {
        self.camera.visible_bounds(self.viewport)
    }

    // ---- instance state and preferences ------------------------------------

    pub fn instance_state(&self) -> &InstanceState {
        &self.instance
    }

    pub fn update_instance_state(&mut self, f: impl FnOnce(&mut InstanceState)) {
        let before = self.instance.clone();
        f(&mut self.instance);
        if before != self.instance {
            self.store.notify_session(ChangeSource::User);
        }
    }

    pub fn preferences(&self) -> &UserPreferences {
        &self.preferences
    }

    pub fn update_preferences(&mut self, f: impl FnOnce(&mut UserPreferences)) {
        f(&mut self.preferences);
    }

    pub fn current_tool(&self) -> &str {
        &self.current_tool
    }

    pub fn set_current_tool(&mut self, tool: impl Into<String>) {
        self.current_tool = tool.into();
    }

    pub fn set_style_for_next_shapes(&mut self, style: impl Into<String>, value: impl Into<String>) {
        self.next_shape_styles.insert(style.into(), value.into());
    }

    pub fn next_shape_style(&self, style: &str) -> Option<&str> {
        self.next_shape_styles.get(style).map(String::as_str)
    }

    // ---- snapshots -------------------------------------------------------

    pub fn session_state(&self) -> SessionState {
        SessionState {
            current_page_id: self.current_page.clone(),
            camera: self.camera,
            instance: self.instance.clone(),
        }
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            document: self.store.snapshot(),
            session: self.session_state(),
        }
    }

    /// Replaces document and session state. Undo history does not survive a
    /// load.
    pub fn load_snapshot(&mut self, snapshot: EditorSnapshot) -> Result<()> {
        self.store.load_snapshot(snapshot.document)?;
        self.history.clear();
        self.current_page = snapshot.session.current_page_id;
        self.ensure_page();
        if !self.camera_options.is_locked {
            self.camera = snapshot.session.camera;
        }
        self.instance = snapshot.session.instance;
        self.store.notify_session(ChangeSource::Remote);
        Ok(())
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Store::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_on(key: &str) -> Editor {
        let mut editor = Editor::default();
        let id = PageId::from_key(key);
        editor.create_page(id.clone(), key).unwrap();
        editor.set_current_page(&id).unwrap();
        editor
    }

    #[test]
    fn new_editor_has_one_default_page() {
        let editor = Editor::default();
        assert_eq!(editor.page_count(), 1);
        assert_eq!(editor.current_page_id(), &PageId::default());
    }

    #[test]
    fn page_limit_is_reported() {
        let mut editor = Editor::default().with_max_pages(2);
        editor.create_page(PageId::from_key("a"), "a").unwrap();
        let err = editor.create_page(PageId::from_key("b"), "b").unwrap_err();
        assert!(matches!(err, DocumentError::PageLimitReached { limit: 2 }));
    }

    #[test]
    fn deleting_a_page_removes_its_shapes() {
        let mut editor = editor_on("1.0");
        let page = editor.current_page_id().clone();
        editor
            .create_shape(ShapeRecord::new(page.clone(), "draw", 0.0, 0.0))
            .unwrap();
        editor.delete_page(&page).unwrap();

        assert!(editor.page(&page).is_none());
        assert_eq!(editor.store().records_of_type(RecordType::Shape).count(), 0);
        assert_ne!(editor.current_page_id(), &page);
    }

    #[test]
    fn last_page_cannot_be_deleted() {
        let mut editor = Editor::default();
        let only = editor.current_page_id().clone();
        assert!(editor.delete_page(&only).is_err());
    }

    #[test]
    fn undo_and_redo_shape_creation() {
        let mut editor = editor_on("2.0");
        let shape = ShapeRecord::new(editor.current_page_id().clone(), "geo", 1.0, 1.0);
        editor.create_shape(shape.clone()).unwrap();

        editor.undo().unwrap();
        assert!(editor.shape(&shape.id).is_none());
        editor.redo().unwrap();
        assert!(editor.shape(&shape.id).is_some());
    }

    #[test]
    fn readonly_blocks_shape_edits() {
        let mut editor = editor_on("3.0");
        editor.update_instance_state(|s| s.is_readonly = true);
        let shape = ShapeRecord::new(editor.current_page_id().clone(), "geo", 1.0, 1.0);
        assert!(matches!(
            editor.create_shape(shape),
            Err(DocumentError::Readonly)
        ));
    }

    #[test]
    fn readonly_blocks_page_edits() {
        let mut editor = editor_on("3.0");
        editor.update_instance_state(|s| s.is_readonly = true);
        let pages = editor.page_count();

        assert!(matches!(
            editor.create_page(PageId::from_key("4.0"), "4.0"),
            Err(DocumentError::Readonly)
        ));
        assert!(matches!(
            editor.delete_page(&PageId::from_key("3.0")),
            Err(DocumentError::Readonly)
        ));
        assert_eq!(editor.page_count(), pages);

        // Switching pages is session state, not a document edit.
        editor.set_current_page(&PageId::default()).unwrap();
        assert_eq!(editor.current_page_id(), &PageId::default());
    }

    #[test]
    fn locked_camera_ignores_zoom() {
        let mut editor = Editor::default();
        editor.set_camera_options(CameraOptions { is_locked: true });
        let before = editor.camera();
        assert!(!editor.zoom_to_bounds(Bounds::new(0.0, 0.0, 10.0, 10.0), 0.0));
        assert_eq!(editor.camera(), before);
    }

    #[test]
    fn batch_is_one_undo_step() {
        let mut editor = editor_on("4.0");
        let page = editor.current_page_id().clone();
        editor.batch(|editor| {
            for x in 0..3 {
                editor
                    .create_shape(ShapeRecord::new(page.clone(), "draw", x as f64, 0.0))
                    .unwrap();
            }
        });
        assert_eq!(editor.current_page_shapes().len(), 3);
        editor.undo().unwrap();
        assert!(editor.current_page_shapes().is_empty());
    }

    #[test]
    fn snapshot_round_trips_through_load() {
        let mut editor = editor_on("5.0");
        let page = editor.current_page_id().clone();
        editor
            .create_shape(ShapeRecord::new(page.clone(), "note", 3.0, 4.0))
            .unwrap();
        let snapshot = editor.snapshot();

        let mut restored = Editor::default();
        restored.load_snapshot(snapshot.clone()).unwrap();
        assert_eq!(restored.snapshot().document, snapshot.document);
        assert_eq!(restored.current_page_id(), &page);
    }
}
