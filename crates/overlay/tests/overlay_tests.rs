use document::{Editor, PageId, ShapeRecord, Size};
use overlay::{
    ActionId, InputDisposition, InputEvent, Overlay, OverlayConfig, OverlayError,
    PresentationEvent, PresentationEventKind, SlideCoordinate, StaticDeck, POINTER_MAX,
};
use snapshot::{
    DeckKeys, DirectorySaver, FsFetcher, LocalStorage, MemoryStorage, SnapshotSource,
    TimestampedSnapshot,
};
use std::time::{Duration, Instant};

const FRAME_W: f64 = 960.0;
const FRAME_H: f64 = 700.0;

fn deck(transition: &str) -> StaticDeck {
    StaticDeck::from_json(&format!(
        r#"{{
            "slidesElement": {{ "id": "talk" }},
            "width": {FRAME_W},
            "height": {FRAME_H},
            "transition": "{transition}",
            "columns": [ {{}}, {{}}, {{ "id": "summary" }} ]
        }}"#
    ))
    .unwrap()
}

async fn ready_overlay(
    deck: &mut StaticDeck,
    config: OverlayConfig,
) -> Overlay<MemoryStorage> {
    let mut overlay = Overlay::new(deck, config, MemoryStorage::new());
    overlay.load(deck, None, "/talk.html").await.unwrap();
    overlay
}

fn draw(overlay: &mut Overlay<MemoryStorage>, x: f64) -> ShapeRecord {
    let page = overlay.editor().current_page_id().clone();
    let shape = ShapeRecord::new(page, "draw", x, 0.0);
    overlay.editor_mut().create_shape(shape.clone()).unwrap();
    shape
}

fn go(overlay: &mut Overlay<MemoryStorage>, deck: &mut StaticDeck, h: u32) {
    let event = deck.navigate(SlideCoordinate::new(h, 0)).unwrap();
    overlay.handle_event(deck, event, Instant::now()).unwrap();
}

#[tokio::test]
async fn load_prepares_editor_on_current_slide() {
    let mut deck = deck("none");
    let mut config = OverlayConfig::default();
    config.default_styles.insert("color".into(), "red".into());
    let overlay = ready_overlay(&mut deck, config).await;

    assert!(overlay.is_ready());
    assert_eq!(overlay.deck_id(), Some("talk"));
    let editor = overlay.editor();
    assert_eq!(editor.current_tool(), "draw");
    assert_eq!(editor.next_shape_style("color"), Some("red"));
    assert!(!editor.instance_state().is_debug_mode);
    assert_eq!(editor.current_page_id(), &PageId::from_key("0.0"));
    assert_eq!(editor.page_count(), 1);
}

#[tokio::test]
async fn navigation_collects_only_empty_pages() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;

    draw(&mut overlay, 1.0);
    go(&mut overlay, &mut deck, 1);
    assert!(overlay.editor().page(&PageId::from_key("0.0")).is_some());

    go(&mut overlay, &mut deck, 2);
    assert!(overlay.editor().page(&PageId::from_key("1.0")).is_none());
    assert_eq!(overlay.editor().current_page_id(), &PageId::from_key("summary"));
    assert_eq!(overlay.editor().current_page().unwrap().name, "summary");
}

#[tokio::test]
async fn viewport_stays_locked_to_slide_frame() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    let frame = document::Bounds::new(0.0, 0.0, FRAME_W, FRAME_H);

    let t0 = Instant::now();
    for (i, scale) in [0.5, 1.25, 2.0].into_iter().enumerate() {
        let now = t0 + Duration::from_secs(i as u64);
        overlay.on_resize(Size::new(FRAME_W * scale, FRAME_H * scale), now);
        overlay.tick(&deck, now + Duration::from_millis(600)).unwrap();
        assert!(overlay.editor().camera_options().is_locked);
        assert!(overlay.editor().viewport_page_bounds().approx_eq(&frame));

        go(&mut overlay, &mut deck, (i % 3) as u32);
        assert!(overlay.editor().viewport_page_bounds().approx_eq(&frame));
    }
}

#[tokio::test]
async fn animated_slide_change_is_deferred_and_latest_wins() {
    let mut deck = deck("slide");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    let t0 = Instant::now();

    let first = deck.navigate(SlideCoordinate::new(1, 0)).unwrap();
    assert!(overlay.handle_event(&deck, first, t0).unwrap().is_none());
    assert!(overlay.container_state().start_transition);
    assert_eq!(overlay.editor().current_page_id(), &PageId::from_key("0.0"));

    let second = deck.navigate(SlideCoordinate::new(2, 0)).unwrap();
    overlay
        .handle_event(&deck, second, t0 + Duration::from_millis(150))
        .unwrap();
    assert!(overlay
        .tick(&deck, t0 + Duration::from_millis(250))
        .unwrap()
        .is_none());

    let outcome = overlay
        .tick(&deck, t0 + Duration::from_millis(350))
        .unwrap()
        .unwrap();
    assert_eq!(outcome.key.as_str(), "summary");
    assert!(overlay.container_state().transitioning);

    overlay
        .handle_event(&deck, PresentationEvent::SlideTransitionEnd, t0)
        .unwrap();
    let state = overlay.container_state();
    assert!(!state.start_transition && !state.transitioning);
}

#[tokio::test]
async fn visibility_and_editing_drive_container_state() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    let now = Instant::now();

    let state = overlay.container_state();
    assert!(!state.hidden && state.inactive && !state.prevent_swipe);

    assert_eq!(
        overlay.handle_input(&InputEvent::DrawKey, now),
        InputDisposition::Entered
    );
    let state = overlay.container_state();
    assert!(!state.inactive && state.prevent_swipe);

    overlay
        .handle_event(&deck, PresentationEvent::OverviewShown, now)
        .unwrap();
    let state = overlay.container_state();
    assert!(state.hidden && state.inactive && !state.prevent_swipe);

    overlay
        .handle_event(&deck, PresentationEvent::OverviewHidden, now)
        .unwrap();
    assert!(!overlay.container_state().hidden);

    let escape = InputEvent::KeyDown {
        key: "Escape".into(),
    };
    assert_eq!(overlay.handle_input(&escape, now), InputDisposition::Left);
    assert!(!overlay.is_editing());
}

#[tokio::test]
async fn scrubbing_round_trip_restores_final_content() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    let before = overlay.editor().store().snapshot().store;

    overlay.activate_scrubber();
    let a = draw(&mut overlay, 1.0);
    draw(&mut overlay, 2.0);
    let mut moved = a.clone();
    moved.x = 40.0;
    overlay.editor_mut().update_shape(moved).unwrap();
    draw(&mut overlay, 3.0);
    overlay.editor_mut().delete_shapes([a.id.clone()]).unwrap();
    overlay.on_store_change(Instant::now());
    assert_eq!(overlay.scrubber().log().len(), 5);

    let after = overlay.editor().store().snapshot().store;

    overlay.set_pointer(0);
    assert_eq!(overlay.editor().store().snapshot().store, before);
    assert!(overlay.editor().instance_state().is_readonly);

    overlay.set_pointer(POINTER_MAX);
    assert_eq!(overlay.editor().store().snapshot().store, after);
    assert!(!overlay.editor().instance_state().is_readonly);

    // Replay never lands in the log.
    overlay.on_store_change(Instant::now());
    assert_eq!(overlay.scrubber().log().len(), 5);
}

fn scrubbed_log(overlay: &mut Overlay<MemoryStorage>) {
    overlay.activate_scrubber();
    let a = draw(overlay, 1.0);
    let b = draw(overlay, 2.0);
    let mut moved = a.clone();
    moved.x = 40.0;
    overlay.editor_mut().update_shape(moved).unwrap();
    overlay.editor_mut().delete_shapes([b.id]).unwrap();
    draw(overlay, 3.0);
    let mut moved = a;
    moved.y = 25.0;
    overlay.editor_mut().update_shape(moved).unwrap();
    overlay.on_store_change(Instant::now());
    assert_eq!(overlay.scrubber().log().len(), 6);
}

#[tokio::test]
async fn scrubbing_back_and_forth_over_a_range_is_a_no_op() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    scrubbed_log(&mut overlay);
    let content = |overlay: &Overlay<MemoryStorage>| overlay.editor().store().snapshot().store;

    overlay.set_pointer(5_000);
    let at_half = content(&overlay);
    overlay.set_pointer(7_500);
    let at_three_quarters = content(&overlay);
    assert_ne!(at_half, at_three_quarters);

    overlay.set_pointer(5_000);
    assert_eq!(content(&overlay), at_half);

    overlay.set_pointer(7_500);
    assert_eq!(content(&overlay), at_three_quarters);
    overlay.set_pointer(5_000);
    overlay.set_pointer(7_500);
    assert_eq!(content(&overlay), at_three_quarters);
}

#[tokio::test]
async fn navigating_while_scrubbed_leaves_the_document_alone() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    overlay.activate_scrubber();
    draw(&mut overlay, 1.0);
    overlay.on_store_change(Instant::now());
    let live = overlay.editor().store().snapshot().store;

    overlay.set_pointer(0);
    assert!(overlay.editor().instance_state().is_readonly);
    go(&mut overlay, &mut deck, 1);
    assert!(overlay.editor().page(&PageId::from_key("1.0")).is_none());
    assert!(overlay.editor().page(&PageId::from_key("0.0")).is_some());
    assert!(overlay.editor().camera_options().is_locked);

    overlay.set_pointer(POINTER_MAX);
    assert_eq!(overlay.scrubber().log().len(), 1);
    assert_eq!(overlay.editor().store().snapshot().store, live);
    let editor = overlay.editor();
    assert!(editor
        .store()
        .records_of_type(document::RecordType::Shape)
        .filter_map(document::Record::as_shape)
        .all(|shape| editor.page(&shape.parent_id).is_some()));

    // Back to live, the next visit creates the page as usual.
    go(&mut overlay, &mut deck, 2);
    assert_eq!(
        overlay.editor().current_page_id(),
        &PageId::from_key("summary")
    );
}

#[tokio::test]
async fn read_only_below_max_in_both_directions() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    overlay.activate_scrubber();
    for x in 0..4 {
        draw(&mut overlay, x as f64);
    }

    for (pointer, readonly) in [
        (5_000, true),
        (POINTER_MAX, false),
        (0, true),
        (9_999, true),
        (POINTER_MAX, false),
    ] {
        overlay.set_pointer(pointer);
        assert_eq!(
            overlay.editor().instance_state().is_readonly,
            readonly,
            "pointer {}",
            pointer
        );
    }

    overlay.set_pointer(2_500);
    let page = overlay.editor().current_page_id().clone();
    assert!(overlay
        .editor_mut()
        .create_shape(ShapeRecord::new(page, "draw", 0.0, 0.0))
        .is_err());
}

#[tokio::test]
async fn page_limit_is_reported_without_switching() {
    let mut deck = deck("none");
    let config = OverlayConfig {
        max_pages: 2,
        ..OverlayConfig::default()
    };
    let mut overlay = ready_overlay(&mut deck, config).await;
    draw(&mut overlay, 0.0);
    go(&mut overlay, &mut deck, 1);
    draw(&mut overlay, 0.0);

    let event = deck.navigate(SlideCoordinate::new(2, 0)).unwrap();
    let err = overlay
        .handle_event(&deck, event, Instant::now())
        .unwrap_err();
    assert!(matches!(err, OverlayError::PageLimitReached { limit: 2, .. }));
    assert_eq!(overlay.editor().current_page_id(), &PageId::from_key("1.0"));
    assert!(overlay.editor().camera_options().is_locked);
}

#[tokio::test]
async fn clear_actions() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    draw(&mut overlay, 0.0);
    go(&mut overlay, &mut deck, 1);
    draw(&mut overlay, 0.0);
    draw(&mut overlay, 1.0);

    overlay.perform(ActionId::ClearPage, None).await.unwrap();
    assert!(overlay.editor().current_page_shapes().is_empty());
    assert_eq!(overlay.editor().page_count(), 2);

    overlay.perform(ActionId::Undo, None).await.unwrap();
    assert_eq!(overlay.editor().current_page_shapes().len(), 2);

    overlay.perform(ActionId::ClearDeck, None).await.unwrap();
    assert_eq!(overlay.editor().page_count(), 1);
    assert_eq!(overlay.editor().current_page_id(), &PageId::from_key("1.0"));
    assert!(overlay.editor().current_page_shapes().is_empty());
}

#[tokio::test]
async fn removed_actions_are_unknown() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    assert!(matches!(
        overlay.perform(ActionId::ZoomIn, None).await,
        Err(OverlayError::UnknownAction(_))
    ));
    for name in ["delete", "select-all", "duplicate", "group", "ungroup"] {
        assert!(
            matches!(
                overlay.perform_named(name, None).await,
                Err(OverlayError::UnknownAction(_))
            ),
            "{} should not be offered",
            name
        );
    }
    assert!(matches!(
        overlay.perform_named("inkdeck.save-file", None).await,
        Err(OverlayError::Unavailable(_))
    ));
    assert_eq!(
        overlay.translations()["document.default-name"],
        "talk".to_string()
    );
}

#[tokio::test]
async fn open_and_close_actions() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    overlay.perform(ActionId::Open, None).await.unwrap();
    assert!(overlay.is_editing());
    overlay.perform(ActionId::TogglePenMode, None).await.unwrap();
    assert!(overlay.editor().instance_state().is_pen_mode);

    overlay.perform(ActionId::Close, None).await.unwrap();
    assert!(!overlay.is_editing());
    assert!(!overlay.editor().instance_state().is_pen_mode);
}

#[tokio::test]
async fn local_storage_actions() {
    let mut deck = deck("none");
    let config = OverlayConfig {
        use_local_storage: false,
        ..OverlayConfig::default()
    };
    let mut overlay = ready_overlay(&mut deck, config).await;
    assert!(!overlay.persistence().is_listening());

    overlay
        .perform(ActionId::ToggleSaveToLocalStorage, None)
        .await
        .unwrap();
    assert!(overlay.persistence().is_listening());

    draw(&mut overlay, 0.0);
    overlay.on_store_change(Instant::now());
    let keys = DeckKeys::new("talk");
    assert!(overlay.persistence().storage().get(&keys.snapshot).unwrap().is_some());

    overlay
        .perform(ActionId::ClearLocalStorage, None)
        .await
        .unwrap();
    assert!(!overlay.persistence().is_save_enabled());
    assert!(overlay.persistence().storage().get(&keys.snapshot).unwrap().is_none());
    assert_eq!(
        overlay.persistence().storage().get(&keys.save_enabled).unwrap().as_deref(),
        Some("false")
    );
}

#[tokio::test]
async fn save_file_action_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    draw(&mut overlay, 0.0);

    let saver = DirectorySaver::new(dir.path());
    overlay
        .perform(ActionId::SaveFile, Some(&saver))
        .await
        .unwrap();
    let raw = std::fs::read_to_string(dir.path().join("talk.inkdeck")).unwrap();
    let saved = TimestampedSnapshot::parse(&raw).unwrap();
    assert_eq!(saved.session.current_page_id, PageId::from_key("0.0"));
}

#[tokio::test]
async fn newer_remote_snapshot_is_shown_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let mut published = Editor::default();
    let page = PageId::from_key("0.0");
    published.create_page(page.clone(), "0.0").unwrap();
    published.set_current_page(&page).unwrap();
    for x in 0..3 {
        published
            .create_shape(ShapeRecord::new(page.clone(), "draw", x as f64, 0.0))
            .unwrap();
    }
    let remote = TimestampedSnapshot::capture(&published, 2_000);
    std::fs::write(dir.path().join("talk.inkdeck"), remote.to_json().unwrap()).unwrap();

    let mut storage = MemoryStorage::new();
    let local = TimestampedSnapshot::capture(&Editor::default(), 1_000);
    storage
        .set(&DeckKeys::new("talk").snapshot, &local.to_json().unwrap())
        .unwrap();

    let mut deck = deck("none");
    let mut overlay = Overlay::new(&mut deck, OverlayConfig::default(), storage);
    let fetcher = FsFetcher::new(dir.path());
    let outcome = overlay
        .load(&deck, Some(&fetcher), "/talk.html")
        .await
        .unwrap();

    assert_eq!(outcome.source, Some(SnapshotSource::Remote));
    assert_eq!(overlay.editor().current_page_shapes().len(), 3);
}

#[tokio::test]
async fn teardown_releases_everything() {
    let mut deck = deck("none");
    let mut overlay = ready_overlay(&mut deck, OverlayConfig::default()).await;
    overlay.activate_scrubber();

    assert_eq!(deck.subscription_count(), PresentationEventKind::ALL.len());
    assert!(deck.key_binding(68).is_some());
    assert!(overlay.editor().store().listener_count() > 0);

    overlay.teardown(&mut deck);
    assert_eq!(deck.subscription_count(), 0);
    assert!(deck.key_binding(68).is_none());
    assert_eq!(overlay.editor().store().listener_count(), 0);
    assert!(!overlay.persistence().is_listening());
    assert!(!overlay.scrubber().is_active());
}
