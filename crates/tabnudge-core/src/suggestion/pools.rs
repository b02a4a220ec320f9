//! Banner message pools.

use crate::host::RandomSource;

/// Shown on productive sites.
pub const UNPRODUCTIVE_NUDGES: &[&str] = &[
    "You've been working too hard! Time for a break?",
    "All work and no play makes you dull. How about a quick distraction?",
    "Your brain needs a recharge. Maybe check Reddit?",
    "Productivity is overrated. Want to see what's new on YouTube?",
    "You deserve a break. Why not watch one quick video?",
    "Netflix is calling your name...",
    "Aren't you curious what's happening on social media right now?",
    "Your friends might have posted something interesting on Instagram!",
    "Have you seen the latest viral meme? Worth checking out!",
    "Work will still be there tomorrow. Time to relax!",
];

/// Shown on unproductive sites.
pub const PRODUCTIVE_NUDGES: &[&str] = &[
    "Shouldn't you be working on something important?",
    "That deadline isn't going to meet itself!",
    "Think about how good it would feel to finish that project!",
    "Your future self will thank you for being productive now.",
    "Just imagine all you could accomplish in the next hour!",
    "That email needs a response. Maybe check your inbox?",
    "Learning something new would be a better use of your time.",
    "Your to-do list isn't getting any shorter!",
    "Success comes from focused work, not endless scrolling.",
    "Your competition is probably being productive right now!",
];

/// The pool complementary to the page's classification.
pub fn pool_for(is_productive: bool) -> &'static [&'static str] {
    if is_productive {
        UNPRODUCTIVE_NUDGES
    } else {
        PRODUCTIVE_NUDGES
    }
}

pub fn pick_message(is_productive: bool, rng: &mut dyn RandomSource) -> &'static str {
    let pool = pool_for(is_productive);
    pool[rng.pick_index(pool.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedRandom;

    #[test]
    fn productive_page_draws_from_distraction_pool() {
        let mut rng = ScriptedRandom::new([0.0, 0.999]);
        assert_eq!(pick_message(true, &mut rng), UNPRODUCTIVE_NUDGES[0]);
        assert_eq!(pick_message(false, &mut rng), PRODUCTIVE_NUDGES[9]);
    }

    #[test]
    fn pools_do_not_overlap() {
        assert!(UNPRODUCTIVE_NUDGES
            .iter()
            .all(|m| !PRODUCTIVE_NUDGES.contains(m)));
    }
}
