//! # TabNudge Core Library
//!
//! Core logic of the TabNudge browser nudger: pages are classified as
//! productive or unproductive against host lists, foreground time is
//! accounted per tab, and after a delay the page gets a banner nudging the
//! user the other way, repeating until the page goes away.
//!
//! ## Architecture
//!
//! - **Contexts**: one [`BackgroundContext`] and one [`ContentContext`] per
//!   page load, each a single-threaded state object fed events one at a time
//! - **Host traits**: the browser, clock, randomness, timers and page are
//!   injected ([`TabHost`], [`Clock`], [`RandomSource`], [`Timers`],
//!   [`Document`]) so contexts run against fakes in tests
//! - **Runtime**: tokio queues and timers driving the contexts
//! - **Storage**: JSON key-value settings store with change notifications
//!   and TOML configuration
//! - **Integrations**: clients for the session logging and focus services
//!
//! ## Key Components
//!
//! - [`SiteClassifier`]: URL to [`Classification`]
//! - [`TabActivityTracker`]: per-tab foreground time ledger
//! - [`SuggestionScheduler`]: last-navigation-wins suggestion timer
//! - [`SuggestionDisplayLoop`]: banner state machine of one page

pub mod background;
pub mod content;
pub mod error;
pub mod events;
pub mod host;
pub mod integrations;
pub mod messages;
pub mod popup;
pub mod runtime;
pub mod scheduler;
pub mod site;
pub mod storage;
pub mod suggestion;
pub mod tracker;

pub use background::BackgroundContext;
pub use content::ContentContext;
pub use error::{ConfigError, CoreError, HostError, StorageError, ValidationError};
pub use events::{BackgroundEvent, ContentEvent};
pub use host::{Clock, RandomSource, TabHost, TimerId, Timers};
pub use messages::{Message, Mode, Response};
pub use scheduler::SuggestionScheduler;
pub use site::{classify, Classification, SiteClassifier};
pub use storage::{Config, KvStore, LocalStore, Settings};
pub use suggestion::{Document, SuggestionDisplayLoop};
pub use tracker::{TabActivityTracker, TabDurationLedger, TabId};
