//! Scenario file loading

use super::file::Scenario;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Inconsistent scenario: {}", .0.join("; "))]
    Inconsistent(Vec<String>),
}

/// Reads and checks scenario files
pub struct ScenarioLoader;

impl ScenarioLoader {
    pub fn load(path: &Path) -> Result<Scenario, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::parse(&text)?;
        debug!(
            "Loaded scenario {}: {} members, {} motions",
            path.display(),
            scenario.members.len(),
            scenario.motions.len()
        );
        Ok(scenario)
    }

    pub fn parse(text: &str) -> Result<Scenario, ScenarioError> {
        let scenario: Scenario = toml::from_str(text)?;
        let problems = scenario.check_references();
        if !problems.is_empty() {
            return Err(ScenarioError::Inconsistent(problems));
        }
        Ok(scenario)
    }
}
