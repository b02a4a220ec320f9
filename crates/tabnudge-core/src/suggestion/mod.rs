//! On-page suggestion rendering for the content context.

mod anchors;
mod display;
mod document;
pub mod pools;

pub use anchors::{anchors_for, AnchorPanel};
pub use display::{DisplayState, ShownSuggestion, SuggestionDisplayLoop};
pub use document::{
    Banner, Document, Element, ElementId, MemoryDocument, QuickLinks, DISMISS_LABEL,
    TESTING_INDICATOR,
};
