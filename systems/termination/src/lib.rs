#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Interchangeable termination predicates evaluated at turn boundaries.
//!
//! Each predicate inspects a [`TurnStatus`] and either lets the run continue
//! or names the [`Outcome`] that stops it. Predicates are combined with
//! [`TerminationPolicies`], where the first one to fire wins.

use std::time::Duration;

use sweeper_core::{Outcome, SimulationConfig, TurnStatus};

/// Decides whether a run stops at the current turn boundary.
pub trait TerminationPolicy: std::fmt::Debug {
    /// Returns the outcome that ends the run, or `None` to keep going.
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome>;
}

/// Stops once no dirty markers remain.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllClean;

impl TerminationPolicy for AllClean {
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome> {
        (status.dirty_count == 0).then_some(Outcome::Cleared)
    }
}

/// Stops once the configured number of turns has elapsed.
#[derive(Clone, Copy, Debug)]
pub struct TurnLimit {
    max_turns: u64,
}

impl TurnLimit {
    /// Creates a turn limit.
    #[must_use]
    pub const fn new(max_turns: u64) -> Self {
        Self { max_turns }
    }
}

impl TerminationPolicy for TurnLimit {
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome> {
        (status.turn >= self.max_turns).then_some(Outcome::TimedOut)
    }
}

/// Stops once the run has consumed its real-time budget.
#[derive(Clone, Copy, Debug)]
pub struct WallClockLimit {
    limit: Duration,
}

impl WallClockLimit {
    /// Creates a wall-clock limit.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl TerminationPolicy for WallClockLimit {
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome> {
        (status.elapsed >= self.limit).then_some(Outcome::DeadlineElapsed)
    }
}

/// Declares victory once the clean percentage reaches a threshold.
#[derive(Clone, Copy, Debug)]
pub struct CleanThreshold {
    percentage: f64,
}

impl CleanThreshold {
    /// Creates a threshold expressed as a percentage of clean cells.
    #[must_use]
    pub const fn new(percentage: f64) -> Self {
        Self { percentage }
    }
}

impl TerminationPolicy for CleanThreshold {
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome> {
        (status.clean_percentage() >= self.percentage).then_some(Outcome::VictoryDeclared)
    }
}

/// Ordered list of predicates; the first to fire decides the outcome.
#[derive(Debug, Default)]
pub struct TerminationPolicies {
    policies: Vec<Box<dyn TerminationPolicy>>,
}

impl TerminationPolicies {
    /// Creates an empty list that never stops a run on its own.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard list for a configuration.
    ///
    /// Order: all clean, clean threshold, turn limit, wall clock. A run that
    /// clears on its final allowed turn therefore reports [`Outcome::Cleared`].
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        let mut policies = Self::new().with(AllClean);
        if let Some(percentage) = config.victory_percentage {
            policies = policies.with(CleanThreshold::new(percentage));
        }
        policies = policies.with(TurnLimit::new(config.max_turns));
        if let Some(limit) = config.time_limit() {
            policies = policies.with(WallClockLimit::new(limit));
        }
        policies
    }

    /// Appends a predicate, returning the extended list.
    #[must_use]
    pub fn with<P: TerminationPolicy + 'static>(mut self, policy: P) -> Self {
        self.push(policy);
        self
    }

    /// Appends a predicate.
    pub fn push<P: TerminationPolicy + 'static>(&mut self, policy: P) {
        self.policies.push(Box::new(policy));
    }

    /// Number of predicates in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Reports whether the list holds no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl TerminationPolicy for TerminationPolicies {
    fn evaluate(&mut self, status: &TurnStatus) -> Option<Outcome> {
        self.policies
            .iter_mut()
            .find_map(|policy| policy.evaluate(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(turn: u64, dirty_count: u64) -> TurnStatus {
        TurnStatus {
            turn,
            dirty_count,
            total_cells: 9,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn all_clean_fires_only_without_dirt() {
        assert_eq!(AllClean.evaluate(&status(1, 0)), Some(Outcome::Cleared));
        assert_eq!(AllClean.evaluate(&status(1, 1)), None);
    }

    #[test]
    fn turn_limit_fires_at_limit() {
        let mut limit = TurnLimit::new(5);
        assert_eq!(limit.evaluate(&status(4, 3)), None);
        assert_eq!(limit.evaluate(&status(5, 3)), Some(Outcome::TimedOut));
    }

    #[test]
    fn wall_clock_compares_elapsed_time() {
        let mut short = WallClockLimit::new(Duration::from_millis(1));
        let mut long = WallClockLimit::new(Duration::from_secs(60));
        assert_eq!(
            short.evaluate(&status(1, 3)),
            Some(Outcome::DeadlineElapsed)
        );
        assert_eq!(long.evaluate(&status(1, 3)), None);
    }

    #[test]
    fn clean_threshold_declares_victory() {
        let mut threshold = CleanThreshold::new(75.0);
        // 9 cells, 3 dirty: 66.7% clean.
        assert_eq!(threshold.evaluate(&status(1, 3)), None);
        // 9 cells, 2 dirty: 77.8% clean.
        assert_eq!(
            threshold.evaluate(&status(1, 2)),
            Some(Outcome::VictoryDeclared)
        );
    }

    #[test]
    fn cleared_wins_over_timeout_on_the_same_turn() {
        let config = SimulationConfig {
            max_turns: 5,
            ..SimulationConfig::default()
        };
        let mut policies = TerminationPolicies::from_config(&config);
        assert_eq!(policies.len(), 2);
        assert_eq!(policies.evaluate(&status(5, 0)), Some(Outcome::Cleared));
        assert_eq!(policies.evaluate(&status(5, 1)), Some(Outcome::TimedOut));
        assert_eq!(policies.evaluate(&status(4, 1)), None);
    }

    #[test]
    fn optional_policies_are_added_from_config() {
        let config = SimulationConfig {
            time_limit_secs: Some(20.0),
            victory_percentage: Some(90.0),
            ..SimulationConfig::default()
        };
        assert_eq!(TerminationPolicies::from_config(&config).len(), 4);
    }

    #[test]
    fn empty_list_never_stops() {
        let mut policies = TerminationPolicies::new();
        assert!(policies.is_empty());
        assert_eq!(policies.evaluate(&status(1_000, 0)), None);
    }
}
