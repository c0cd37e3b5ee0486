//! Layered run configuration: defaults, then a TOML file, then flags.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sweeper_core::{CellCoord, DirtSpec, MovementRule, SimulationConfig};

/// Contents of a `--config` file.
///
/// ```toml
/// metrics_out = "metrics.json"
///
/// [simulation]
/// agent_count = 4
/// dirt = { percentage = 50.0 }
/// start = { column = 0, row = 0 }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub(crate) simulation: SimulationConfig,
    pub(crate) metrics_out: Option<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Individual values supplied on the command line.
#[derive(Clone, Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) agents: Option<u32>,
    pub(crate) width: Option<u32>,
    pub(crate) height: Option<u32>,
    pub(crate) max_turns: Option<u64>,
    pub(crate) dirty_percentage: Option<f64>,
    pub(crate) dirt_count: Option<u64>,
    pub(crate) start: Option<CellCoord>,
    pub(crate) movement: Option<MovementRule>,
    pub(crate) time_limit: Option<f64>,
    pub(crate) victory: Option<f64>,
    pub(crate) seed: Option<u64>,
}

impl Overrides {
    pub(crate) fn apply(&self, config: &mut SimulationConfig) {
        if let Some(agents) = self.agents {
            config.agent_count = agents;
        }
        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns = max_turns;
        }
        if let Some(percentage) = self.dirty_percentage {
            config.dirt = DirtSpec::Percentage(percentage);
        }
        if let Some(count) = self.dirt_count {
            config.dirt = DirtSpec::Count(count);
        }
        if self.start.is_some() {
            config.start = self.start;
        }
        if let Some(movement) = self.movement {
            config.movement = movement;
        }
        if self.time_limit.is_some() {
            config.time_limit_secs = self.time_limit;
        }
        if self.victory.is_some() {
            config.victory_percentage = self.victory;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let file = ConfigFile::parse("").expect("parse");
        assert_eq!(file, ConfigFile::default());
        assert_eq!(file.simulation, SimulationConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = ConfigFile::parse(
            r#"
            metrics_out = "out.json"

            [simulation]
            agent_count = 4
            grid_width = 9
            dirt = { count = 17 }
            movement = "unrestricted"
            start = { column = 0, row = 2 }
            "#,
        )
        .expect("parse");

        assert_eq!(file.metrics_out, Some(PathBuf::from("out.json")));
        let simulation = file.simulation;
        assert_eq!(simulation.agent_count, 4);
        assert_eq!(simulation.grid_width, 9);
        assert_eq!(simulation.grid_height, SimulationConfig::default().grid_height);
        assert_eq!(simulation.dirt, DirtSpec::Count(17));
        assert_eq!(simulation.movement, MovementRule::Unrestricted);
        assert_eq!(simulation.start, Some(CellCoord::new(0, 2)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ConfigFile::parse("agents = 3").is_err());
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = SimulationConfig {
            agent_count: 4,
            dirt: DirtSpec::Count(17),
            ..SimulationConfig::default()
        };
        let overrides = Overrides {
            agents: Some(2),
            dirty_percentage: Some(80.0),
            victory: Some(95.0),
            ..Overrides::default()
        };
        overrides.apply(&mut config);

        assert_eq!(config.agent_count, 2);
        assert_eq!(config.dirt, DirtSpec::Percentage(80.0));
        assert_eq!(config.victory_percentage, Some(95.0));
        assert_eq!(config.max_turns, SimulationConfig::default().max_turns);
    }
}
