//! Slide coordinate to document page mapping.
//!
//! Keys prefer author-supplied identifiers so that drawings follow their
//! slide when the deck is reordered. Positional keys are the fallback and do
//! not survive reordering.

use document::PageId;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Presentation, SlideCoordinate};

/// Stable name of the page that belongs to one slide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageKey(pub String);

impl PageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn page_id(&self) -> PageId {
        PageId::from_key(&self.0)
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes the page key for `at`. Coordinates without a slide element
/// resolve positionally.
pub fn resolve(presentation: &dyn Presentation, at: SlideCoordinate) -> PageKey {
    let slide = presentation.slide(at).unwrap_or_default();
    if let Some(id) = slide.id {
        return PageKey(id);
    }

    if at.v != 0 {
        if let Some(stack) = slide.stack_id {
            return PageKey(format!("{}.{}", stack, at.v));
        }

        let top = resolve(presentation, at.stack_top());
        return match top.0.strip_suffix(".0") {
            Some(h) if is_digits(h) => PageKey(format!("{}.{}", h, at.v)),
            _ => PageKey(format!("{}.{}", top.0, at.v)),
        };
    }

    PageKey(at.to_string())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticDeck;

    fn deck(columns: &str) -> StaticDeck {
        StaticDeck::from_json(&format!(
            r#"{{ "width": 960, "height": 700, "columns": {} }}"#,
            columns
        ))
        .unwrap()
    }

    fn key(deck: &StaticDeck, h: u32, v: u32) -> String {
        resolve(deck, SlideCoordinate::new(h, v)).0
    }

    #[test]
    fn positional_fallbacks() {
        let d = deck(r#"[ {}, {}, {}, { "slides": [ {}, {}, {} ] } ]"#);
        assert_eq!(key(&d, 3, 0), "3.0");
        assert_eq!(key(&d, 3, 2), "3.2");
        assert_eq!(key(&d, 0, 0), "0.0");
    }

    #[test]
    fn stack_identifier_names_nested_slides() {
        let d = deck(r#"[ {}, {}, {}, { "id": "intro", "slides": [ {}, {}, {} ] } ]"#);
        assert_eq!(key(&d, 3, 2), "intro.2");
        assert_eq!(key(&d, 3, 0), "3.0");
    }

    #[test]
    fn slide_identifier_wins() {
        let d = deck(
            r#"[ { "slides": [ { "data-tlid": "cover", "id": "ignored" }, { "id": "detail" } ] } ]"#,
        );
        assert_eq!(key(&d, 0, 0), "cover");
        assert_eq!(key(&d, 0, 1), "detail");
    }

    #[test]
    fn nested_slide_extends_named_top() {
        let d = deck(r#"[ { "slides": [ { "id": "agenda" }, {}, {} ] } ]"#);
        assert_eq!(key(&d, 0, 2), "agenda.2");

        // Only the positional `<digits>.0` form has its suffix replaced.
        let d = deck(r#"[ { "slides": [ { "id": "v1.0" }, {} ] } ]"#);
        assert_eq!(key(&d, 0, 1), "v1.0.1");
    }

    #[test]
    fn stale_coordinates_resolve_positionally() {
        let d = deck("[ {} ]");
        assert_eq!(key(&d, 7, 0), "7.0");
        assert_eq!(key(&d, 7, 3), "7.3");
    }

    #[test]
    fn resolution_is_deterministic() {
        let d = deck(r#"[ { "id": "a" }, { "slides": [ {}, { "id": "b" }, {} ] }, {} ]"#);
        for at in d.coordinates() {
            assert_eq!(resolve(&d, at), resolve(&d, at));
        }
        assert_eq!(resolve(&d, SlideCoordinate::new(1, 0)).page_id().0, "page:1.0");
    }

    #[test]
    fn keys_of_one_deck_do_not_collide() {
        let d = deck(r#"[ {}, { "slides": [ {}, {}, {} ] }, { "id": "x", "slides": [ {}, {} ] } ]"#);
        let mut keys: Vec<_> = d.coordinates().into_iter().map(|at| resolve(&d, at)).collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }
}
