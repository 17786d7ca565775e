pub mod frozen_lake;
pub mod random_mdp;
pub mod simple_golf;
pub mod tabular;

use crate::algos::model_based::mdp::Mdp;
use crate::common::defs::*;
use crate::config::{ConfigError, EnvironmentConfig, EnvironmentKind};
use frozen_lake::FrozenLake;
use random_mdp::random_mdp;
use simple_golf::SimpleGolf;
use std::fs;
use std::rc::Rc;
use tabular::TabularMdp;
use tracing::info;

/// An environment ready to be solved and played.
pub struct LoadedEnv {
    pub name: String,
    pub mdp: Rc<dyn Mdp>,
    pub start: Discrete,
    /// Set for frozen lake environments, used for rendering.
    pub lake: Option<Rc<FrozenLake>>,
}

impl LoadedEnv {
    fn lake(name: &str, lake: FrozenLake) -> Self {
        let lake = Rc::new(lake);
        Self {
            name: name.to_string(),
            mdp: Rc::clone(&lake) as Rc<dyn Mdp>,
            start: lake.start(),
            lake: Some(lake),
        }
    }

    fn model(name: &str, mdp: Rc<dyn Mdp>, start: Discrete) -> Self {
        Self {
            name: name.to_string(),
            mdp,
            start,
            lake: None,
        }
    }
}

pub fn make_env(config: &EnvironmentConfig) -> Result<LoadedEnv, ConfigError> {
    let env = match config.kind {
        EnvironmentKind::FrozenLake4x4 => {
            LoadedEnv::lake("FrozenLake-4x4", FrozenLake::map_4x4(config.slippery)?)
        }
        EnvironmentKind::FrozenLake8x8 => {
            LoadedEnv::lake("FrozenLake-8x8", FrozenLake::map_8x8(config.slippery)?)
        }
        EnvironmentKind::FrozenLakeCustom => {
            let map = config
                .map
                .as_deref()
                .ok_or_else(|| ConfigError::Invalid("environment.map is missing".to_string()))?;
            LoadedEnv::lake("FrozenLake", FrozenLake::new(map, config.slippery)?)
        }
        EnvironmentKind::SimpleGolf => LoadedEnv::model("SimpleGolf", Rc::new(SimpleGolf::new()), 0),
        EnvironmentKind::Random => LoadedEnv::model(
            "Random",
            Rc::new(random_mdp(&config.random)?),
            config.start_state,
        ),
        EnvironmentKind::Model => {
            let path = config
                .model
                .as_deref()
                .ok_or_else(|| ConfigError::Invalid("environment.model is missing".to_string()))?;
            let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let mdp = TabularMdp::from_json(&serde_json::from_str(&contents)?)?;
            LoadedEnv::model(&path.display().to_string(), Rc::new(mdp), config.start_state)
        }
    };

    info!(
        env = %env.name,
        n_s = env.mdp.n_s(),
        n_a = env.mdp.n_a(),
        start = env.start,
        "environment loaded"
    );

    Ok(env)
}
