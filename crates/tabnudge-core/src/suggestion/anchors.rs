//! Quick-links panel injected on request from the popup.

use tracing::{debug, warn};

use super::document::{Document, Element, ElementId, QuickLinks};
use crate::site::hosts::with_scheme;
use crate::site::Classification;

const PRODUCTIVE_LINKS: &[&str] = &[
    "github.com",
    "stackoverflow.com",
    "docs.google.com",
    "notion.so",
    "coursera.org",
];

const UNPRODUCTIVE_LINKS: &[&str] = &[
    "youtube.com",
    "reddit.com",
    "twitch.tv",
    "netflix.com",
    "instagram.com",
];

/// Hosts whose pages can be embedded as a video element.
const VIDEO_HOSTS: &[&str] = &["youtube.com", "twitch.tv", "coursera.org"];

/// Links pulling away from the page's classification; neutral pages get
/// the productive set.
pub fn anchors_for(page: Classification) -> QuickLinks {
    let hosts = match page {
        Classification::Productive => UNPRODUCTIVE_LINKS,
        Classification::Unproductive | Classification::Neutral => PRODUCTIVE_LINKS,
    };
    let links: Vec<String> = hosts.iter().map(|h| with_scheme(h)).collect();
    let video_embed = hosts
        .iter()
        .find(|h| VIDEO_HOSTS.contains(*h))
        .map(|h| with_scheme(h));
    QuickLinks { links, video_embed }
}

/// Tracks the single quick-links panel of a page.
#[derive(Debug, Default)]
pub struct AnchorPanel {
    panel: Option<ElementId>,
}

impl AnchorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn panel(&self) -> Option<ElementId> {
        self.panel
    }

    /// Insert the panel, replacing a previous one.
    pub fn inject(&mut self, page: Classification, doc: &mut dyn Document) -> bool {
        if let Some(old) = self.panel.take() {
            doc.remove(old);
        }
        if !doc.has_body() {
            warn!("document body not available, anchors not injected");
            return false;
        }
        let links = anchors_for(page);
        debug!(count = links.links.len(), "injecting quick links");
        self.panel = Some(doc.append(Element::QuickLinks(links)));
        true
    }
}
