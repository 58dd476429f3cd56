use document::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a slide: `h` along the main track, `v` inside a vertical stack.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SlideCoordinate {
    pub h: u32,
    pub v: u32,
}

impl SlideCoordinate {
    pub const fn new(h: u32, v: u32) -> Self {
        Self { h, v }
    }

    /// First slide of the same stack.
    pub const fn stack_top(self) -> Self {
        Self { h: self.h, v: 0 }
    }
}

impl fmt::Display for SlideCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.h, self.v)
    }
}

/// Background classification of a slide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Background {
    Dark,
    Light,
    #[default]
    Unspecified,
}

/// What the overlay needs to know about one slide element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideInfo {
    /// The slide's own identifier, if the author gave one
    pub id: Option<String>,

    /// Identifier of the enclosing vertical stack
    pub stack_id: Option<String>,
    pub background: Background,

    /// Per-slide transition override
    pub transition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationConfig {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub transition: Option<String>,
}

impl PresentationConfig {
    /// Logical slide frame in page space.
    pub fn frame(&self) -> Bounds {
        Bounds::new(0.0, 0.0, self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentationEventKind {
    Ready,
    SlideChanged,
    SlideTransitionEnd,
    OverviewShown,
    OverviewHidden,
    Paused,
    Resumed,
}

impl PresentationEventKind {
    pub const ALL: [PresentationEventKind; 7] = [
        PresentationEventKind::Ready,
        PresentationEventKind::SlideChanged,
        PresentationEventKind::SlideTransitionEnd,
        PresentationEventKind::OverviewShown,
        PresentationEventKind::OverviewHidden,
        PresentationEventKind::Paused,
        PresentationEventKind::Resumed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresentationEventKind::Ready => "ready",
            PresentationEventKind::SlideChanged => "slidechanged",
            PresentationEventKind::SlideTransitionEnd => "slidetransitionend",
            PresentationEventKind::OverviewShown => "overviewshown",
            PresentationEventKind::OverviewHidden => "overviewhidden",
            PresentationEventKind::Paused => "paused",
            PresentationEventKind::Resumed => "resumed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresentationEvent {
    Ready { indices: SlideCoordinate },
    SlideChanged { indices: SlideCoordinate },
    SlideTransitionEnd,
    OverviewShown,
    OverviewHidden,
    Paused,
    Resumed,
}

impl PresentationEvent {
    pub fn kind(&self) -> PresentationEventKind {
        match self {
            PresentationEvent::Ready { .. } => PresentationEventKind::Ready,
            PresentationEvent::SlideChanged { .. } => PresentationEventKind::SlideChanged,
            PresentationEvent::SlideTransitionEnd => PresentationEventKind::SlideTransitionEnd,
            PresentationEvent::OverviewShown => PresentationEventKind::OverviewShown,
            PresentationEvent::OverviewHidden => PresentationEventKind::OverviewHidden,
            PresentationEvent::Paused => PresentationEventKind::Paused,
            PresentationEvent::Resumed => PresentationEventKind::Resumed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub key_code: u32,
    pub key: String,
    pub description: String,
}

/// The slide engine the overlay sits on top of.
pub trait Presentation {
    fn indices(&self) -> SlideCoordinate;

    /// `None` when no slide exists at `at` (stale events).
    fn slide(&self, at: SlideCoordinate) -> Option<SlideInfo>;

    fn config(&self) -> PresentationConfig;

    /// Identifier of the slides container, else of the root element.
    fn deck_id(&self) -> Option<String>;

    fn subscribe(&mut self, kind: PresentationEventKind) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);

    fn add_key_binding(&mut self, binding: KeyBinding);
    fn remove_key_binding(&mut self, key_code: u32);
}
