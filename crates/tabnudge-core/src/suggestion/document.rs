//! The content context's view of the page.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

pub const DISMISS_LABEL: &str = "\u{00d7}";
pub const TESTING_INDICATOR: &str = "TESTING MODE";

/// Suggestion banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub message: String,
    /// `PRODUCTIVE` or `UNPRODUCTIVE`, describing the page.
    pub site_tag: String,
    pub dismiss_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub testing_indicator: Option<String>,
}

impl Banner {
    pub fn new(message: &str, is_productive: bool, testing_mode: bool) -> Self {
        Self {
            message: message.to_string(),
            site_tag: if is_productive { "PRODUCTIVE" } else { "UNPRODUCTIVE" }.to_string(),
            dismiss_label: DISMISS_LABEL.to_string(),
            testing_indicator: testing_mode.then(|| TESTING_INDICATOR.to_string()),
        }
    }
}

/// Quick-links panel added by `injectAnchors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickLinks {
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_embed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Element {
    Banner(Banner),
    QuickLinks(QuickLinks),
}

pub trait Document {
    /// Pages without a body cannot take injected elements.
    fn has_body(&self) -> bool;

    /// Append to the body. Callers check [`Document::has_body`] first.
    fn append(&mut self, element: Element) -> ElementId;

    /// Returns false if the element was not present.
    fn remove(&mut self, id: ElementId) -> bool;

    fn contains(&self, id: ElementId) -> bool;
}

/// In-memory page body.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    has_body: bool,
    elements: BTreeMap<ElementId, Element>,
    next_id: u64,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self {
            has_body: true,
            elements: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// A document whose body has not been created yet.
    pub fn without_body() -> Self {
        Self {
            has_body: false,
            ..Self::new()
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements.iter().map(|(id, el)| (*id, el))
    }

    pub fn banners(&self) -> Vec<&Banner> {
        self.elements
            .values()
            .filter_map(|el| match el {
                Element::Banner(b) => Some(b),
                Element::QuickLinks(_) => None,
            })
            .collect()
    }

    pub fn quick_links(&self) -> Vec<&QuickLinks> {
        self.elements
            .values()
            .filter_map(|el| match el {
                Element::QuickLinks(q) => Some(q),
                Element::Banner(_) => None,
            })
            .collect()
    }
}

impl Document for MemoryDocument {
    fn has_body(&self) -> bool {
        self.has_body
    }

    fn append(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    fn remove(&mut self, id: ElementId) -> bool {
        self.elements.remove(&id).is_some()
    }

    fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_tags_and_indicator() {
        let banner = Banner::new("hi", false, true);
        assert_eq!(banner.site_tag, "UNPRODUCTIVE");
        assert_eq!(banner.dismiss_label, "×");
        assert_eq!(banner.testing_indicator.as_deref(), Some("TESTING MODE"));
        assert_eq!(Banner::new("hi", true, false).testing_indicator, None);
    }

    #[test]
    fn append_and_remove() {
        let mut doc = MemoryDocument::new();
        let id = doc.append(Element::Banner(Banner::new("a", true, false)));
        assert!(doc.contains(id));
        assert_eq!(doc.banners().len(), 1);
        assert!(doc.remove(id));
        assert!(!doc.remove(id));
        assert!(doc.banners().is_empty());
    }
}
