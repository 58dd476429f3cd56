use std::collections::BTreeMap;

/// Every action the overlay menus can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionId {
    // editor built-ins
    Undo,
    Redo,
    Delete,
    SelectAll,
    Duplicate,
    Group,
    Ungroup,
    ToggleDarkMode,
    TogglePenMode,
    ExitPenMode,
    SelectZoomTool,
    ZoomIn,
    ZoomOut,
    ZoomTo100,
    ZoomToFit,
    ZoomToSelection,
    BackToContent,

    // overlay
    Close,
    Open,
    SaveFile,
    ToggleSaveToLocalStorage,
    ClearLocalStorage,
    ClearPage,
    ClearDeck,
}

impl ActionId {
    pub const BUILT_IN: [ActionId; 17] = [
        ActionId::Undo,
        ActionId::Redo,
        ActionId::Delete,
        ActionId::SelectAll,
        ActionId::Duplicate,
        ActionId::Group,
        ActionId::Ungroup,
        ActionId::ToggleDarkMode,
        ActionId::TogglePenMode,
        ActionId::ExitPenMode,
        ActionId::SelectZoomTool,
        ActionId::ZoomIn,
        ActionId::ZoomOut,
        ActionId::ZoomTo100,
        ActionId::ZoomToFit,
        ActionId::ZoomToSelection,
        ActionId::BackToContent,
    ];

    /// Camera actions; the overlay camera is locked to the slide.
    pub const ZOOM: [ActionId; 7] = [
        ActionId::SelectZoomTool,
        ActionId::ZoomIn,
        ActionId::ZoomOut,
        ActionId::ZoomTo100,
        ActionId::ZoomToFit,
        ActionId::ZoomToSelection,
        ActionId::BackToContent,
    ];

    /// Selection actions; drawings are only added and cleared, never selected.
    pub const SELECTION: [ActionId; 5] = [
        ActionId::Delete,
        ActionId::SelectAll,
        ActionId::Duplicate,
        ActionId::Group,
        ActionId::Ungroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::Undo => "undo",
            ActionId::Redo => "redo",
            ActionId::Delete => "delete",
            ActionId::SelectAll => "select-all",
            ActionId::Duplicate => "duplicate",
            ActionId::Group => "group",
            ActionId::Ungroup => "ungroup",
            ActionId::ToggleDarkMode => "toggle-dark-mode",
            ActionId::TogglePenMode => "toggle-pen-mode",
            ActionId::ExitPenMode => "exit-pen-mode",
            ActionId::SelectZoomTool => "select-zoom-tool",
            ActionId::ZoomIn => "zoom-in",
            ActionId::ZoomOut => "zoom-out",
            ActionId::ZoomTo100 => "zoom-to-100",
            ActionId::ZoomToFit => "zoom-to-fit",
            ActionId::ZoomToSelection => "zoom-to-selection",
            ActionId::BackToContent => "back-to-content",
            ActionId::Close => "inkdeck.close",
            ActionId::Open => "inkdeck.open",
            ActionId::SaveFile => "inkdeck.save-file",
            ActionId::ToggleSaveToLocalStorage => "inkdeck.toggle-save-to-localstorage",
            ActionId::ClearLocalStorage => "inkdeck.clear-localstorage",
            ActionId::ClearPage => "inkdeck.clear-page",
            ActionId::ClearDeck => "inkdeck.clear-deck",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub id: ActionId,

    /// Translation key of the menu label
    pub label: &'static str,

    /// Keyboard shortcut, `$` meaning the platform command key
    pub kbd: Option<&'static str>,
    pub checkbox: bool,
    pub readonly_ok: bool,
}

impl ActionSpec {
    fn new(id: ActionId, label: &'static str) -> Self {
        Self {
            id,
            label,
            kbd: None,
            checkbox: false,
            readonly_ok: false,
        }
    }

    fn kbd(mut self, kbd: &'static str) -> Self {
        self.kbd = Some(kbd);
        self
    }

    fn checkbox(mut self) -> Self {
        self.checkbox = true;
        self
    }

    fn readonly_ok(mut self) -> Self {
        self.readonly_ok = true;
        self
    }
}

fn built_in_spec(id: ActionId) -> ActionSpec {
    let spec = ActionSpec::new(id, id.as_str());
    match id {
        ActionId::Undo => spec.kbd("$z"),
        ActionId::Redo => spec.kbd("$!z"),
        ActionId::Delete => spec.kbd("⌫,del,backspace"),
        ActionId::SelectAll => spec.kbd("$a").readonly_ok(),
        ActionId::Duplicate => spec.kbd("$d"),
        ActionId::Group => spec.kbd("$g"),
        ActionId::Ungroup => spec.kbd("$!g"),
        ActionId::ToggleDarkMode => spec.kbd("$/").checkbox().readonly_ok(),
        ActionId::TogglePenMode => spec.checkbox().readonly_ok(),
        ActionId::ExitPenMode => spec.readonly_ok(),
        ActionId::ZoomIn => spec.kbd("$=,=").readonly_ok(),
        ActionId::ZoomOut => spec.kbd("$-,-").readonly_ok(),
        ActionId::ZoomTo100 => spec.kbd("!0").readonly_ok(),
        ActionId::ZoomToFit => spec.kbd("!1").readonly_ok(),
        ActionId::ZoomToSelection => spec.kbd("!2").readonly_ok(),
        ActionId::SelectZoomTool => spec.kbd("z").readonly_ok(),
        _ => spec.readonly_ok(),
    }
}

/// Actions added by the overlay.
pub fn overlay_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec::new(ActionId::Close, "inkdeck.action.close").readonly_ok(),
        ActionSpec::new(ActionId::Open, "inkdeck.action.open").readonly_ok(),
        ActionSpec::new(ActionId::SaveFile, "inkdeck.action.save-file")
            .kbd("$s")
            .readonly_ok(),
        ActionSpec::new(
            ActionId::ToggleSaveToLocalStorage,
            "inkdeck.options.save-to-localstorage",
        )
        .checkbox()
        .readonly_ok(),
        ActionSpec::new(ActionId::ClearLocalStorage, "inkdeck.action.clear-localstorage"),
        ActionSpec::new(ActionId::ClearPage, "inkdeck.action.clear-page"),
        ActionSpec::new(ActionId::ClearDeck, "inkdeck.action.clear-deck"),
    ]
}

/// Lookup table of available actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionRegistry {
    actions: BTreeMap<ActionId, ActionSpec>,
}

impl ActionRegistry {
    pub fn built_in() -> Self {
        Self::default().with(ActionId::BUILT_IN.into_iter().map(built_in_spec))
    }

    /// Built-ins minus the camera and selection actions, plus the overlay
    /// actions.
    pub fn overlay_default() -> Self {
        Self::built_in()
            .without(ActionId::ZOOM)
            .without(ActionId::SELECTION)
            .with(overlay_actions())
    }

    pub fn without(mut self, ids: impl IntoIterator<Item = ActionId>) -> Self {
        for id in ids {
            self.actions.remove(&id);
        }
        self
    }

    /// Adds `specs`, replacing entries with the same id.
    pub fn with(mut self, specs: impl IntoIterator<Item = ActionSpec>) -> Self {
        self.actions
            .extend(specs.into_iter().map(|spec| (spec.id, spec)));
        self
    }

    pub fn get(&self, id: ActionId) -> Option<&ActionSpec> {
        self.actions.get(&id)
    }

    pub fn find(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.values().find(|spec| spec.id.as_str() == name)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionSpec> {
        self.actions.values()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// English labels for the overlay's menu entries.
pub fn translations(deck_id: Option<&str>) -> BTreeMap<&'static str, String> {
    let labels = [
        ("inkdeck.menu.file", "File"),
        ("inkdeck.menu.clear", "Clear"),
        ("inkdeck.action.close", "Exit drawing mode"),
        ("inkdeck.action.open", "Enter drawing mode"),
        ("inkdeck.action.save-file", "Save file"),
        ("inkdeck.action.clear-localstorage", "Clear browser storage"),
        ("inkdeck.action.clear-page", "Clear current slide"),
        ("inkdeck.action.clear-deck", "Clear deck"),
        ("inkdeck.options.save-to-localstorage", "Save in browser"),
    ];
    let mut out: BTreeMap<_, _> = labels
        .into_iter()
        .map(|(key, label)| (key, label.to_string()))
        .collect();
    // Default file name of the editor's own export functions
    out.insert("document.default-name", deck_id.unwrap_or("unknown").to_string());
    out
}
