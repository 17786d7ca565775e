use crate::algos::model_based::mdp::common::SolverParams;
use crate::common::defs::*;
use crate::envs::random_mdp::RandomMdpParams;
use crate::episodes::EpisodeConfig;
use crate::error::MdpError;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to write config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("failed to parse transition model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Mdp(#[from] MdpError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Algorithm {
    #[serde(rename = "vi")]
    #[value(name = "vi")]
    ValueIteration,

    #[serde(rename = "pi")]
    #[value(name = "pi")]
    PolicyIteration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum EnvironmentKind {
    #[serde(rename = "frozen-lake-4x4")]
    #[value(name = "frozen-lake-4x4")]
    FrozenLake4x4,

    #[serde(rename = "frozen-lake-8x8")]
    #[value(name = "frozen-lake-8x8")]
    FrozenLake8x8,

    /// Frozen lake with the rows given in `map`.
    #[serde(rename = "frozen-lake")]
    #[value(name = "frozen-lake")]
    FrozenLakeCustom,

    #[serde(rename = "simple-golf")]
    #[value(name = "simple-golf")]
    SimpleGolf,

    #[serde(rename = "random")]
    #[value(name = "random")]
    Random,

    /// Transition table read from the JSON file in `model`.
    #[serde(rename = "model")]
    #[value(name = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub kind: EnvironmentKind,
    pub slippery: bool,
    pub map: Option<Vec<String>>,
    pub model: Option<PathBuf>,
    /// Episode start for `random` and `model` environments.
    pub start_state: Discrete,
    pub random: RandomMdpParams,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            kind: EnvironmentKind::FrozenLake8x8,
            slippery: true,
            map: None,
            model: None,
            start_state: 0,
            random: RandomMdpParams::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub algorithm: Algorithm,
    pub gamma: Continous,
    pub theta: Continous,
    pub max_sweeps: usize,
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let params = SolverParams::default();

        Self {
            algorithm: Algorithm::PolicyIteration,
            gamma: params.gamma,
            theta: params.theta,
            max_sweeps: params.max_sweeps,
            max_iterations: params.max_iterations,
        }
    }
}

impl SolverConfig {
    pub fn params(&self) -> SolverParams {
        SolverParams {
            gamma: self.gamma,
            theta: self.theta,
            max_sweeps: self.max_sweeps,
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: EnvironmentConfig,
    pub solver: SolverConfig,
    pub episodes: EpisodeConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;

        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let solver = &self.solver;
        if !(0. ..=1.).contains(&solver.gamma) {
            return invalid("solver.gamma must be in [0, 1]");
        }
        if solver.theta.is_nan() || solver.theta <= 0. {
            return invalid("solver.theta must be positive");
        }
        if solver.max_sweeps == 0 || solver.max_iterations == 0 {
            return invalid("solver.max_sweeps and solver.max_iterations must be positive");
        }
        if self.episodes.max_actions == 0 {
            return invalid("episodes.max_actions must be positive");
        }

        let env = &self.environment;
        match env.kind {
            // Random models never terminate, so their returns need discounting.
            EnvironmentKind::Random if solver.gamma >= 1. => {
                invalid("solver.gamma must be below 1 for kind 'random'")
            }
            EnvironmentKind::FrozenLakeCustom if env.map.is_none() => {
                invalid("environment.map is required for kind 'frozen-lake'")
            }
            EnvironmentKind::Model if env.model.is_none() => {
                invalid("environment.model is required for kind 'model'")
            }
            _ => Ok(()),
        }
    }
}
