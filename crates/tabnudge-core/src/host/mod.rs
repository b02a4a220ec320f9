//! Interfaces the hosting browser runtime satisfies.
//!
//! Contexts never read the wall clock, roll dice or arm timers directly;
//! they go through these traits so tests can substitute deterministic
//! implementations.

mod browser;
mod clock;
mod random;
mod timers;

pub use browser::{CreateTab, CreateWindow, TabHost, TabInfo, WindowId, WindowInfo};
pub use clock::{Clock, ManualClock, SystemClock};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use timers::{ManualTimers, TimerId, Timers};
