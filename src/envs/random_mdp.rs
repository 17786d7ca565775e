use super::tabular::*;
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use rand::prelude::*;
use rand::seq::index;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomMdpParams {
    pub n_s: usize,
    pub n_a: usize,
    /// Distinct successors per (state, action), clamped to `n_s`.
    pub branching: usize,
    /// Rewards are drawn uniformly from this closed range.
    pub reward_range: (Continous, Continous),
    pub seed: u64,
}

impl Default for RandomMdpParams {
    fn default() -> Self {
        Self {
            n_s: 16,
            n_a: 4,
            branching: 3,
            reward_range: (-1., 1.),
            seed: 2718,
        }
    }
}

/// Dense random MDP without terminal states. Same seed, same model.
pub fn random_mdp(params: &RandomMdpParams) -> Result<TabularMdp> {
    let RandomMdpParams {
        n_s,
        n_a,
        branching,
        reward_range: (lo, hi),
        seed,
    } = *params;
    if n_s == 0 || n_a == 0 {
        return Err(MdpError::EmptyModel);
    }

    let rng = &mut StdRng::seed_from_u64(seed);
    let k = branching.clamp(1, n_s);
    let mut transitions = Transitions::new();
    for s in 0..n_s {
        for a in 0..n_a {
            let next = index::sample(rng, n_s, k);
            // Bounded away from zero so that every sampled successor is reachable.
            let weights = (0..k).map(|_| rng.gen_range(0.1..1.)).collect::<Vec<Continous>>();
            let total: Continous = weights.iter().sum();

            let ts = next
                .iter()
                .zip(weights)
                .map(|(s_, w)| {
                    let r = if lo < hi { rng.gen_range(lo..=hi) } else { lo };
                    Transition::new(w / total, s_, r, false)
                })
                .collect();
            transitions.insert((s, a), ts);
        }
    }

    TabularMdp::new(n_s, n_a, transitions)
}
