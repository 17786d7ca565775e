use crate::common::defs::*;
use crate::error::Result;
use crate::simulator::MdpSimulator;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub episodes: usize,
    /// Episodes still running after this many actions are cut off.
    pub max_actions: usize,
    /// Seeds the action sampling of stochastic policies.
    pub seed: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            episodes: 10_000,
            max_actions: 100,
            seed: 2718,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeStats {
    pub episodes: usize,
    /// Episodes whose final step ended the episode with a positive reward.
    pub wins: usize,
    /// Episodes that ended with `done`, won or not. This is the raw
    /// completion count; `wins` is the subset whose final step paid a
    /// positive reward.
    pub terminations: usize,
    pub total_reward: Continous,
    pub average_reward: Continous,
    pub average_actions: Continous,
}

impl EpisodeStats {
    pub fn win_rate(&self) -> Continous {
        if self.episodes == 0 {
            0.
        } else {
            self.wins as Continous / self.episodes as Continous
        }
    }
}

/// Plays `config.episodes` episodes of `policy` and aggregates the outcomes.
pub fn run_episodes(
    sim: &mut dyn MdpSimulator,
    policy: &dyn Policy,
    config: &EpisodeConfig,
) -> Result<EpisodeStats> {
    let rng = &mut StdRng::seed_from_u64(config.seed);

    let mut wins = 0;
    let mut terminations = 0;
    let mut total_reward = 0.;
    let mut total_actions: usize = 0;
    for _ in 0..config.episodes {
        let mut s = sim.reset();
        for _ in 0..config.max_actions {
            let a = policy.policy(s, rng)?;
            let si = sim.step(a)?;
            total_actions += 1;
            total_reward += si.reward;
            s = si.next_state;

            if si.done {
                terminations += 1;
                if si.reward > 0. {
                    wins += 1;
                }
                break;
            }
        }
    }

    let per_episode = |x: Continous| {
        if config.episodes == 0 {
            0.
        } else {
            x / config.episodes as Continous
        }
    };
    let stats = EpisodeStats {
        episodes: config.episodes,
        wins,
        terminations,
        total_reward,
        average_reward: per_episode(total_reward),
        average_actions: per_episode(total_actions as Continous),
    };
    debug!(env = %sim.name(), ?stats, "episodes finished");

    Ok(stats)
}
