use document::{Bounds, DocumentError, Editor, PageId};
use std::time::Instant;
use tracing::{debug, warn};

use crate::{
    lock_to_frame, resolve, Background, OverlayError, PageKey, Presentation, ResizeFit, Result,
    SlideCoordinate,
};

/// How the editor's color scheme follows the slides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DarkModePolicy {
    /// Follow the background class of the active slide
    pub automatic: bool,

    /// Scheme for slides without a background class
    pub fallback_dark: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    pub key: PageKey,
    pub created: bool,
    pub switched: bool,

    /// The vacated page, when it was empty and got deleted
    pub removed: Option<PageId>,
}

/// Keeps the active document page and the camera in step with the slides.
#[derive(Debug, Clone)]
pub struct PageLifecycle {
    frame: Bounds,
    dark_mode: DarkModePolicy,
    current: SlideCoordinate,
    current_key: Option<PageKey>,
    resize: ResizeFit,
}

impl PageLifecycle {
    pub fn new(frame: Bounds, dark_mode: DarkModePolicy) -> Self {
        Self {
            frame,
            dark_mode,
            current: SlideCoordinate::default(),
            current_key: None,
            resize: ResizeFit::default(),
        }
    }

    pub fn frame(&self) -> Bounds {
        self.frame
    }

    pub fn current(&self) -> SlideCoordinate {
        self.current
    }

    pub fn current_key(&self) -> Option<&PageKey> {
        self.current_key.as_ref()
    }

    /// Activates the page for `at`, creating it on first visit and deleting
    /// the page being left when nothing was drawn on it.
    ///
    /// When the page ceiling is hit the active page stays as it was and
    /// [`OverlayError::PageLimitReached`] is returned. The viewport is locked
    /// in every case.
    ///
    /// A read-only editor gets no pages created or deleted: it only switches
    /// to a page that already exists.
    pub fn on_navigate(
        &mut self,
        editor: &mut Editor,
        presentation: &dyn Presentation,
        at: SlideCoordinate,
    ) -> Result<NavigationOutcome> {
        let key = resolve(presentation, at);
        let page_id = key.page_id();

        if editor.instance_state().is_readonly {
            return Ok(self.browse(editor, presentation, at, key));
        }

        let mut created = false;
        if editor.page(&page_id).is_none() {
            match editor.create_page(page_id.clone(), key.as_str()) {
                Ok(()) => created = true,
                Err(DocumentError::PageLimitReached { limit }) => {
                    warn!(page = %key, limit, "Page limit reached, slide gets no drawing page");
                    lock_to_frame(editor, self.frame);
                    return Err(OverlayError::PageLimitReached { key, limit });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let previous = editor.current_page_id().clone();
        let mut removed = None;
        let switched = previous != page_id;
        if switched {
            let left_empty = editor.current_page_shape_ids().is_empty();
            editor.set_current_page(&page_id)?;
            if left_empty {
                match editor.delete_page(&previous) {
                    Ok(()) => removed = Some(previous),
                    Err(e) => warn!(page = %previous, "Failed to delete empty page: {}", e),
                }
            }
            // Undo must not reach edits made on another slide.
            editor.clear_history();
            debug!(page = %key, created, ?removed, "switched page");
        }

        self.current = at;
        self.current_key = Some(key.clone());
        self.apply_dark_mode(editor, presentation);
        lock_to_frame(editor, self.frame);

        Ok(NavigationOutcome {
            key,
            created,
            switched,
            removed,
        })
    }

    fn browse(
        &mut self,
        editor: &mut Editor,
        presentation: &dyn Presentation,
        at: SlideCoordinate,
        key: PageKey,
    ) -> NavigationOutcome {
        let page_id = key.page_id();
        let switched = editor.page(&page_id).is_some() && editor.current_page_id() != &page_id;
        if switched {
            if let Err(e) = editor.set_current_page(&page_id) {
                warn!(page = %key, "Failed to switch page: {}", e);
            }
            self.current_key = Some(key.clone());
            debug!(page = %key, "switched page while read-only");
        } else if editor.page(&page_id).is_none() {
            debug!(page = %key, "read-only, slide has no drawing page");
        }

        self.current = at;
        self.apply_dark_mode(editor, presentation);
        lock_to_frame(editor, self.frame);

        NavigationOutcome {
            key,
            created: false,
            switched,
            removed: None,
        }
    }

    /// Refits the camera after a viewport size change, throttled and
    /// debounced. Returns whether a fit ran now.
    pub fn on_resize(&mut self, editor: &mut Editor, now: Instant) -> bool {
        let due = self.resize.on_resize(now);
        if due {
            lock_to_frame(editor, self.frame);
        }
        due
    }

    /// Runs any deferred fit that came due.
    pub fn tick(&mut self, editor: &mut Editor, now: Instant) -> bool {
        let due = self.resize.poll(now);
        if due {
            lock_to_frame(editor, self.frame);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.resize.next_deadline()
    }

    pub fn teardown(&mut self) {
        self.resize.cancel();
    }

    fn apply_dark_mode(&self, editor: &mut Editor, presentation: &dyn Presentation) {
        if !self.dark_mode.automatic {
            return;
        }
        let background = presentation
            .slide(self.current)
            .map(|slide| slide.background)
            .unwrap_or_default();
        let dark = match background {
            Background::Dark => true,
            Background::Light => false,
            Background::Unspecified => self.dark_mode.fallback_dark,
        };
        editor.update_preferences(|prefs| prefs.is_dark_mode = dark);
    }
}
