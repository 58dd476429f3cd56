use document::{Editor, Record, RecordType, Size};
use snapshot::{
    FileSaver, LoadOutcome, LocalStorage, PersistenceCoordinator, RemoteSource, SnapshotFetcher,
};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{
    draw_key_binding, resolve, translations, ActionId, ActionRegistry, EditingGate,
    HistoryScrubber, InputDisposition, InputEvent, NavigationOutcome, OverlayConfig,
    OverlayError, PageLifecycle, Presentation, PresentationEvent, PresentationEventKind, Result,
    SlideCoordinate, SubscriptionId, DRAW_KEY_CODE,
};

/// Delay before following a slide change that animates.
pub const TRANSITION_DEFER: Duration = Duration::from_millis(200);

/// Presentation state of the overlay container element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContainerState {
    pub hidden: bool,
    pub inactive: bool,
    pub prevent_swipe: bool,
    pub start_transition: bool,
    pub transitioning: bool,
}

#[derive(Debug, Clone, Copy)]
struct PendingNavigation {
    to: SlideCoordinate,
    due: Instant,
}

/// One overlay on top of one presentation.
///
/// All handlers take the current time; deferred work runs from [`Overlay::tick`].
pub struct Overlay<S: LocalStorage> {
    editor: Editor,
    config: OverlayConfig,
    deck_id: Option<String>,
    lifecycle: PageLifecycle,
    persistence: PersistenceCoordinator<S>,
    scrubber: HistoryScrubber,
    actions: ActionRegistry,
    gate: EditingGate,
    current: SlideCoordinate,
    shown: bool,
    ready: bool,
    start_transition: bool,
    transitioning: bool,
    pending: Option<PendingNavigation>,
    subscriptions: Vec<SubscriptionId>,
}

impl<S: LocalStorage> Overlay<S> {
    /// Attaches to `presentation`: subscribes to its events and registers the
    /// drawing-mode key.
    pub fn new(presentation: &mut dyn Presentation, config: OverlayConfig, storage: S) -> Self {
        let deck_id = presentation.deck_id();
        if deck_id.is_none() {
            info!("Deck has no identifier, drawings are not kept in local storage");
        }

        let editor = Editor::default().with_max_pages(config.max_pages);
        let lifecycle = PageLifecycle::new(
            presentation.config().frame(),
            config.dark_mode_policy(),
        );
        let persistence =
            PersistenceCoordinator::new(deck_id.clone(), storage, config.use_local_storage);

        let subscriptions = PresentationEventKind::ALL
            .iter()
            .map(|kind| presentation.subscribe(*kind))
            .collect();
        presentation.add_key_binding(draw_key_binding());

        Self {
            current: presentation.indices(),
            editor,
            config,
            deck_id,
            lifecycle,
            persistence,
            scrubber: HistoryScrubber::new(),
            actions: ActionRegistry::overlay_default(),
            gate: EditingGate::default(),
            shown: true,
            ready: false,
            start_transition: false,
            transitioning: false,
            pending: None,
            subscriptions,
        }
    }

    /// Loads saved drawings, prepares the editor and shows the current slide.
    pub async fn load(
        &mut self,
        presentation: &dyn Presentation,
        fetcher: Option<&dyn SnapshotFetcher>,
        page_path: &str,
    ) -> Result<LoadOutcome> {
        let remote = match (&self.config.snapshot_url, fetcher) {
            (Some(location), Some(fetcher)) => Some(RemoteSource {
                location,
                page_path,
                fetcher,
            }),
            _ => None,
        };
        let outcome = self.persistence.load_initial(&mut self.editor, remote).await;

        self.initialize_editor();
        self.ready = true;
        match self.sync(presentation) {
            Ok(_) | Err(OverlayError::PageLimitReached { .. }) => Ok(outcome),
            Err(e) => Err(e),
        }
    }

    fn initialize_editor(&mut self) {
        self.editor.set_current_tool("draw");
        for (style, value) in self.config.styles() {
            self.editor.set_style_for_next_shapes(style, value);
        }
        self.editor.update_instance_state(|state| {
            state.is_debug_mode = false;
            state.export_background = false;
        });
    }

    /// Applies the current slide to the document. Page exhaustion is logged
    /// and reported, never fatal.
    fn sync(&mut self, presentation: &dyn Presentation) -> Result<Option<NavigationOutcome>> {
        if !self.ready {
            return Ok(None);
        }
        let at = self.current;
        match self.lifecycle.on_navigate(&mut self.editor, presentation, at) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                if !matches!(e, OverlayError::PageLimitReached { .. }) {
                    warn!("Failed to switch to slide {}: {}", at, e);
                }
                Err(e)
            }
        }
    }

    pub fn handle_event(
        &mut self,
        presentation: &dyn Presentation,
        event: PresentationEvent,
        now: Instant,
    ) -> Result<Option<NavigationOutcome>> {
        debug!(event = event.kind().as_str(), "presentation event");
        match event {
            PresentationEvent::Ready { indices } => {
                self.set_current(indices);
                return self.sync(presentation);
            }
            PresentationEvent::SlideChanged { indices } => {
                return self.on_slide_changed(presentation, indices, now);
            }
            PresentationEvent::SlideTransitionEnd => {
                self.start_transition = false;
                self.transitioning = false;
            }
            PresentationEvent::OverviewShown | PresentationEvent::Paused => self.shown = false,
            PresentationEvent::OverviewHidden | PresentationEvent::Resumed => self.shown = true,
        }
        Ok(None)
    }

    fn on_slide_changed(
        &mut self,
        presentation: &dyn Presentation,
        to: SlideCoordinate,
        now: Instant,
    ) -> Result<Option<NavigationOutcome>> {
        let transition = presentation
            .config()
            .transition
            .filter(|t| !t.is_empty())
            .or_else(|| presentation.slide(to).and_then(|slide| slide.transition));
        let no_transition = transition
            .as_deref()
            .is_some_and(|t| t == "none" || t.contains("none-in"));
        let same_page = self.lifecycle.current_key() == Some(&resolve(presentation, to));

        if no_transition || same_page {
            self.pending = None;
            self.set_current(to);
            return self.sync(presentation);
        }

        self.start_transition = true;
        self.pending = Some(PendingNavigation {
            to,
            due: now + TRANSITION_DEFER,
        });
        Ok(None)
    }

    /// Runs deferred work that came due: slide changes waiting out their
    /// transition, viewport refits and throttled saves.
    pub fn tick(
        &mut self,
        presentation: &dyn Presentation,
        now: Instant,
    ) -> Result<Option<NavigationOutcome>> {
        self.scrubber.capture();
        self.lifecycle.tick(&mut self.editor, now);
        self.persistence.tick(&self.editor, now);

        match self.pending {
            Some(pending) if pending.due <= now => {
                self.pending = None;
                self.set_current(pending.to);
                self.transitioning = true;
                self.sync(presentation)
            }
            _ => Ok(None),
        }
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.pending.map(|p| p.due),
            self.lifecycle.next_deadline(),
            self.persistence.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn on_resize(&mut self, viewport: Size, now: Instant) -> bool {
        self.editor.set_viewport_size(viewport);
        self.ready && self.lifecycle.on_resize(&mut self.editor, now)
    }

    /// Call after the store changed.
    pub fn on_store_change(&mut self, now: Instant) {
        self.scrubber.capture();
        self.persistence.on_store_change(&self.editor, now);
    }

    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> InputDisposition {
        let disposition = self.gate.handle(event, now);
        if disposition.is_consumed() {
            debug!(?disposition, "drawing mode input");
        }
        disposition
    }

    pub async fn perform(&mut self, action: ActionId, saver: Option<&dyn FileSaver>) -> Result<()> {
        let spec = self
            .actions
            .get(action)
            .ok_or_else(|| OverlayError::UnknownAction(action.as_str().to_string()))?;
        if !spec.readonly_ok && self.editor.instance_state().is_readonly {
            return Err(document::DocumentError::Readonly.into());
        }

        match action {
            ActionId::Close => {
                self.editor
                    .update_instance_state(|state| state.is_pen_mode = false);
                self.gate.set_editing(false);
            }
            ActionId::Open => self.gate.set_editing(true),
            ActionId::SaveFile => {
                let saver = saver.ok_or(OverlayError::Unavailable("file saving"))?;
                self.persistence.save_to_file(&self.editor, saver).await?;
            }
            ActionId::ToggleSaveToLocalStorage => {
                let enabled = !self.persistence.is_save_enabled();
                self.persistence
                    .set_save_enabled(enabled, self.editor.store_mut())?;
            }
            ActionId::ClearLocalStorage => {
                if self.persistence.can_use_local_storage() {
                    self.persistence.clear_local(self.editor.store_mut())?;
                }
            }
            ActionId::ClearPage => self.clear_page()?,
            ActionId::ClearDeck => self.clear_deck()?,
            ActionId::Undo => self.editor.undo()?,
            ActionId::Redo => self.editor.redo()?,
            ActionId::ToggleDarkMode => self
                .editor
                .update_preferences(|prefs| prefs.is_dark_mode = !prefs.is_dark_mode),
            ActionId::TogglePenMode => self
                .editor
                .update_instance_state(|state| state.is_pen_mode = !state.is_pen_mode),
            ActionId::ExitPenMode => self
                .editor
                .update_instance_state(|state| state.is_pen_mode = false),
            other => return Err(OverlayError::Unavailable(other.as_str())),
        }
        debug!(action = action.as_str(), "performed action");
        Ok(())
    }

    /// Looks `name` up in the registry and performs it.
    pub async fn perform_named(&mut self, name: &str, saver: Option<&dyn FileSaver>) -> Result<()> {
        let id = self
            .actions
            .find(name)
            .map(|spec| spec.id)
            .ok_or_else(|| OverlayError::UnknownAction(name.to_string()))?;
        self.perform(id, saver).await
    }

    fn clear_page(&mut self) -> Result<()> {
        let ids = self.editor.current_page_shape_ids();
        self.editor.batch(|editor| editor.delete_shapes(ids))?;
        Ok(())
    }

    fn clear_deck(&mut self) -> Result<()> {
        self.editor.batch(|editor| {
            let shapes: Vec<_> = editor
                .store()
                .records_of_type(RecordType::Shape)
                .filter_map(Record::as_shape)
                .map(|shape| shape.id.clone())
                .collect();
            editor.delete_shapes(shapes)?;

            let assets: Vec<_> = editor.assets().iter().map(|a| a.id.clone()).collect();
            editor.delete_assets(assets)?;

            let current = editor.current_page_id().clone();
            let others: Vec<_> = editor
                .pages()
                .iter()
                .map(|page| page.id.clone())
                .filter(|id| *id != current)
                .collect();
            for page in others {
                editor.delete_page(&page)?;
            }
            Ok::<_, document::DocumentError>(())
        })?;
        Ok(())
    }

    pub fn activate_scrubber(&mut self) {
        self.scrubber.activate(self.editor.store_mut());
    }

    pub fn deactivate_scrubber(&mut self) {
        self.scrubber.deactivate(self.editor.store_mut());
    }

    /// Moves the history scrubber; see [`HistoryScrubber::set_pointer`].
    pub fn set_pointer(&mut self, value: u32) {
        self.scrubber.set_pointer(&mut self.editor, value);
    }

    /// Detaches from the presentation and drops every listener.
    pub fn teardown(&mut self, presentation: &mut dyn Presentation) {
        for id in self.subscriptions.drain(..) {
            presentation.unsubscribe(id);
        }
        presentation.remove_key_binding(DRAW_KEY_CODE);
        self.persistence.teardown(self.editor.store_mut());
        self.scrubber.deactivate(self.editor.store_mut());
        self.lifecycle.teardown();
        self.pending = None;
    }

    fn set_current(&mut self, at: SlideCoordinate) {
        self.current = at;
    }

    pub fn current(&self) -> SlideCoordinate {
        self.current
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn deck_id(&self) -> Option<&str> {
        self.deck_id.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_editing(&self) -> bool {
        self.gate.is_editing()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn lifecycle(&self) -> &PageLifecycle {
        &self.lifecycle
    }

    pub fn persistence(&self) -> &PersistenceCoordinator<S> {
        &self.persistence
    }

    pub fn scrubber(&self) -> &HistoryScrubber {
        &self.scrubber
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn translations(&self) -> std::collections::BTreeMap<&'static str, String> {
        translations(self.deck_id())
    }

    pub fn container_state(&self) -> ContainerState {
        let active = self.shown && self.gate.is_editing();
        ContainerState {
            hidden: !self.shown,
            inactive: !active,
            prevent_swipe: active,
            start_transition: self.start_transition,
            transitioning: self.transitioning,
        }
    }
}
