#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Append-only metrics collector sampled once per turn.
//!
//! The collector only ever reads snapshots handed to it by the controller and
//! never touches simulation state. External reporting reads the recorded
//! series through [`MetricsCollector::samples`] or the JSON export.

use serde::{Deserialize, Serialize};
use sweeper_core::{clean_percentage, AgentSample, AgentSnapshot, EntityId, MetricsSample};

/// Time series of aggregate and per-agent samples.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsCollector {
    samples: Vec<MetricsSample>,
    agent_samples: Vec<AgentSample>,
}

impl MetricsCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the sample for `turn`.
    ///
    /// `agents` must describe every scheduled agent; total moves are summed
    /// from their cumulative counters.
    pub fn record(
        &mut self,
        turn: u64,
        total_cells: u64,
        dirty_count: u64,
        agents: &[AgentSnapshot],
    ) -> MetricsSample {
        let total_moves = agents.iter().map(|agent| agent.moves_made).sum();
        let sample = MetricsSample {
            turn,
            total_moves,
            clean_percentage: clean_percentage(total_cells, dirty_count),
        };
        self.samples.push(sample);
        self.agent_samples
            .extend(agents.iter().map(|agent| AgentSample {
                turn,
                agent: agent.id,
                moves_made: agent.moves_made,
                cells_cleaned: agent.cells_cleaned,
            }));
        sample
    }

    /// Aggregate samples in turn order.
    #[must_use]
    pub fn samples(&self) -> &[MetricsSample] {
        &self.samples
    }

    /// Per-agent samples in turn order, agents ordered as recorded.
    #[must_use]
    pub fn agent_samples(&self) -> &[AgentSample] {
        &self.agent_samples
    }

    /// Samples describing a single agent.
    pub fn agent_series(&self, agent: EntityId) -> impl Iterator<Item = &AgentSample> + '_ {
        self.agent_samples
            .iter()
            .filter(move |sample| sample.agent == agent)
    }

    /// Most recent aggregate sample.
    #[must_use]
    pub fn last(&self) -> Option<&MetricsSample> {
        self.samples.last()
    }

    /// Number of recorded turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Reports whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Serialises both series as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
