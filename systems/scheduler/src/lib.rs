#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Random-activation scheduler deciding the order agents act in each turn.

use rand::{seq::SliceRandom, Rng};
use sweeper_core::EntityId;

/// Holds every scheduled agent and reshuffles their activation order each turn.
///
/// Only cleaning agents are scheduled; passive markers never act.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
    agents: Vec<EntityId>,
}

impl Scheduler {
    /// Creates a scheduler over the provided agents.
    #[must_use]
    pub fn new(agents: Vec<EntityId>) -> Self {
        Self { agents }
    }

    /// Produces a fresh uniformly random permutation for the next turn.
    ///
    /// The permutation is built on top of the previous one; every call draws
    /// from `rng`, so the order only repeats when the generator does.
    pub fn next_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[EntityId] {
        self.agents.shuffle(rng);
        &self.agents
    }

    /// Runs `step` once for every agent in a freshly shuffled order.
    ///
    /// Each call to `step` completes before the next agent starts. The first
    /// error aborts the turn and is returned.
    pub fn run_turn<R, E, F>(&mut self, rng: &mut R, mut step: F) -> Result<(), E>
    where
        R: Rng + ?Sized,
        F: FnMut(EntityId, &mut R) -> Result<(), E>,
    {
        let order = self.next_turn(rng).to_vec();
        for agent in order {
            step(agent, &mut *rng)?;
        }
        Ok(())
    }
}
