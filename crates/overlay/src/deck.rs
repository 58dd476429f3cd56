use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::{
    Background, KeyBinding, Presentation, PresentationConfig, PresentationEvent,
    PresentationEventKind, SlideCoordinate, SlideInfo, SubscriptionId,
};

/// Identifying attributes of a deck element. `data-tlid` wins over `id`;
/// empty values count as missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementIds {
    #[serde(rename = "data-tlid", default, skip_serializing_if = "Option::is_none")]
    pub tlid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ElementIds {
    pub fn identifier(&self) -> Option<String> {
        [&self.tlid, &self.id]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .cloned()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    #[serde(flatten)]
    pub ids: ElementIds,
    #[serde(default)]
    pub background: Background,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
}

/// One horizontal position: a lone slide or a vertical stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Column {
    Stack {
        #[serde(flatten)]
        ids: ElementIds,
        slides: Vec<SlideSpec>,
    },
    Slide(SlideSpec),
}

/// JSON description of a deck.
///
/// ```json
/// { "slidesElement": { "id": "talk" }, "width": 960, "height": 700,
///   "columns": [ { "id": "title" }, { "data-tlid": "demo", "slides": [ {}, {} ] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckOutline {
    #[serde(default)]
    pub root: ElementIds,
    #[serde(default)]
    pub slides_element: ElementIds,
    #[serde(flatten)]
    pub config: PresentationConfig,
    pub columns: Vec<Column>,
}

/// In-memory [`Presentation`] driven by explicit `navigate` calls.
#[derive(Debug, Clone)]
pub struct StaticDeck {
    outline: DeckOutline,
    indices: SlideCoordinate,
    next_subscription: u64,
    subscriptions: BTreeMap<SubscriptionId, PresentationEventKind>,
    key_bindings: BTreeMap<u32, KeyBinding>,
}

impl StaticDeck {
    pub fn new(outline: DeckOutline) -> Self {
        Self {
            outline,
            indices: SlideCoordinate::default(),
            next_subscription: 0,
            subscriptions: BTreeMap::new(),
            key_bindings: BTreeMap::new(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn outline(&self) -> &DeckOutline {
        &self.outline
    }

    /// Every slide coordinate in reading order.
    pub fn coordinates(&self) -> Vec<SlideCoordinate> {
        let mut out = Vec::new();
        for (h, column) in self.outline.columns.iter().enumerate() {
            let height = match column {
                Column::Stack { slides, .. } => slides.len(),
                Column::Slide(_) => 1,
            };
            out.extend((0..height).map(|v| SlideCoordinate::new(h as u32, v as u32)));
        }
        out
    }

    pub fn ready(&self) -> PresentationEvent {
        PresentationEvent::Ready {
            indices: self.indices,
        }
    }

    /// Moves to `to` and returns the event the engine would emit, or `None`
    /// when there is no slide there.
    pub fn navigate(&mut self, to: SlideCoordinate) -> Option<PresentationEvent> {
        self.slide(to)?;
        self.indices = to;
        Some(PresentationEvent::SlideChanged { indices: to })
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_subscribed(&self, kind: PresentationEventKind) -> bool {
        self.subscriptions.values().any(|k| *k == kind)
    }

    pub fn key_binding(&self, key_code: u32) -> Option<&KeyBinding> {
        self.key_bindings.get(&key_code)
    }
}

impl Presentation for StaticDeck {
    fn indices(&self) -> SlideCoordinate {
        self.indices
    }

    fn slide(&self, at: SlideCoordinate) -> Option<SlideInfo> {
        let column = self.outline.columns.get(at.h as usize)?;
        let (spec, stack_id) = match column {
            Column::Stack { ids, slides } => (slides.get(at.v as usize)?, ids.identifier()),
            Column::Slide(spec) if at.v == 0 => (spec, None),
            Column::Slide(_) => return None,
        };
        Some(SlideInfo {
            id: spec.ids.identifier(),
            stack_id,
            background: spec.background,
            transition: spec.transition.clone(),
        })
    }

    fn config(&self) -> PresentationConfig {
        self.outline.config.clone()
    }

    fn deck_id(&self) -> Option<String> {
        self.outline
            .slides_element
            .identifier()
            .or_else(|| self.outline.root.identifier())
    }

    fn subscribe(&mut self, kind: PresentationEventKind) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(id, kind);
        debug!(event = kind.as_str(), ?id, "subscribed");
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }

    fn add_key_binding(&mut self, binding: KeyBinding) {
        self.key_bindings.insert(binding.key_code, binding);
    }

    fn remove_key_binding(&mut self, key_code: u32) {
        self.key_bindings.remove(&key_code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DECK: &str = r#"{
        "root": { "id": "reveal" },
        "slidesElement": { "data-tlid": "", "id": "talk" },
        "width": 960,
        "height": 700,
        "columns": [
            { "id": "title", "background": "dark" },
            { "data-tlid": "demo", "slides": [ {}, { "transition": "none" } ] },
            {}
        ]
    }"#;

    #[test]
    fn outline_parses_slides_and_stacks() {
        let deck = StaticDeck::from_json(DECK).unwrap();
        assert_eq!(deck.coordinates().len(), 4);
        assert_eq!(deck.config().frame().w, 960.0);

        let title = deck.slide(SlideCoordinate::new(0, 0)).unwrap();
        assert_eq!(title.id.as_deref(), Some("title"));
        assert_eq!(title.background, Background::Dark);

        let nested = deck.slide(SlideCoordinate::new(1, 1)).unwrap();
        assert_eq!(nested.id, None);
        assert_eq!(nested.stack_id.as_deref(), Some("demo"));
        assert_eq!(nested.transition.as_deref(), Some("none"));

        assert!(deck.slide(SlideCoordinate::new(2, 1)).is_none());
        assert!(deck.slide(SlideCoordinate::new(9, 0)).is_none());
    }

    #[test]
    fn deck_id_skips_empty_attributes() {
        let deck = StaticDeck::from_json(DECK).unwrap();
        assert_eq!(deck.deck_id().as_deref(), Some("talk"));

        let mut outline = deck.outline().clone();
        outline.slides_element = ElementIds::default();
        assert_eq!(StaticDeck::new(outline.clone()).deck_id().as_deref(), Some("reveal"));
        outline.root = ElementIds::default();
        assert_eq!(StaticDeck::new(outline).deck_id(), None);
    }

    #[test]
    fn navigate_ignores_missing_slides() {
        let mut deck = StaticDeck::from_json(DECK).unwrap();
        assert!(deck.navigate(SlideCoordinate::new(5, 5)).is_none());
        assert_eq!(
            deck.navigate(SlideCoordinate::new(1, 1)),
            Some(PresentationEvent::SlideChanged {
                indices: SlideCoordinate::new(1, 1)
            })
        );
        assert_eq!(deck.indices(), SlideCoordinate::new(1, 1));
    }

    #[test]
    fn subscriptions_and_bindings_are_tracked() {
        let mut deck = StaticDeck::from_json(DECK).unwrap();
        let id = deck.subscribe(PresentationEventKind::Paused);
        assert!(deck.is_subscribed(PresentationEventKind::Paused));
        deck.unsubscribe(id);
        assert_eq!(deck.subscription_count(), 0);

        deck.add_key_binding(KeyBinding {
            key_code: 68,
            key: "D".into(),
            description: "Enter drawing mode".into(),
        });
        assert!(deck.key_binding(68).is_some());
        deck.remove_key_binding(68);
        assert!(deck.key_binding(68).is_none());
    }
}
