use rl_dp::algos::model_based::mdp::{common::*, Mdp};
use rl_dp::common::defs::*;

#[allow(dead_code)]
pub fn vi_params() -> SolverParams {
    SolverParams::default().with_gamma(0.9).with_theta(1e-9)
}

/// Gap between the best and second best action value in `s`.
#[allow(dead_code)]
pub fn top_two_gap(mdp: &dyn Mdp, v: &[Continous], gamma: Continous, s: Discrete) -> Continous {
    let mut q = lookahead(mdp, s, v, gamma).unwrap();
    q.sort_by(|a, b| b.total_cmp(a));
    match q.as_slice() {
        [best, second, ..] => best - second,
        _ => Continous::INFINITY,
    }
}

/// States where the greedy action is unambiguous under `v`.
#[allow(dead_code)]
pub fn decisive_states(mdp: &dyn Mdp, v: &[Continous], gamma: Continous) -> Vec<Discrete> {
    (0..mdp.n_s())
        .filter(|&s| top_two_gap(mdp, v, gamma, s) > 1e-6)
        .collect()
}
