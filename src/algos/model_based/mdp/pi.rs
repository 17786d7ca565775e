use super::{common::*, eval::*, Mdp, MdpSolver};
use crate::common::defs::*;
use crate::error::Result;
use std::rc::Rc;
use tracing::{debug, warn};

/// Policy iteration - Sutton & Barto 2018, 4.3.
///
/// Starts from the uniform random policy and alternates full evaluation with
/// greedy improvement until no state changes its action. Every round
/// evaluates from a zero value function. An evaluation that exhausts
/// `max_sweeps` ends the run with the policy it was evaluating.
pub fn policy_iteration(mdp: &dyn Mdp, params: &SolverParams) -> Result<Solution> {
    check_model(mdp)?;

    let mut pi = PolicyTable::uniform(mdp.n_s(), mdp.n_a());
    let mut v = vec![0.; mdp.n_s()];
    for iteration in 1..=params.max_iterations {
        let ev = evaluate_policy(mdp, &pi, params)?;
        v = ev.v;
        if !ev.converged {
            // Improving against a value that never settled only chases noise.
            warn!(iteration, "policy evaluation did not converge, stopping");
            return Ok(Solution {
                policy: pi,
                v,
                converged: false,
                sweeps: iteration,
            });
        }

        let mut changed = 0;
        for s in 0..mdp.n_s() {
            let best = argmax(&lookahead(mdp, s, &v, params.gamma)?);
            // A row that is not yet one-hot at `best` counts as a change even
            // when its argmax already agrees, e.g. the uniform starting rows.
            if pi.greedy_action(s) != best || !pi.is_one_hot(s, best) {
                changed += 1;
            }
            pi.set_greedy(s, best);
        }
        debug!(iteration, changed, "policy improvement");

        if changed == 0 {
            return Ok(Solution {
                policy: pi,
                v,
                converged: true,
                sweeps: iteration,
            });
        }
    }

    warn!(
        max_iterations = params.max_iterations,
        "policy iteration did not converge"
    );
    Ok(Solution {
        policy: pi,
        v,
        converged: false,
        sweeps: params.max_iterations,
    })
}

#[derive(Clone)]
pub struct PolicyIteration {
    mdp: Rc<dyn Mdp>,
    params: SolverParams,
    solution: Option<Solution>,
}

impl PolicyIteration {
    pub fn new(mdp: Rc<dyn Mdp>, params: SolverParams) -> Self {
        Self {
            mdp,
            params,
            solution: None,
        }
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }
}

impl MdpSolver for PolicyIteration {
    fn v_star(&self, s: Discrete) -> Option<Continous> {
        self.solution.as_ref()?.v.get(s).copied()
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous> {
        let sol = self.solution.as_ref()?;
        q_star_from(self.mdp.as_ref(), &sol.v, self.params.gamma, s, a)
    }

    fn pi_star(&self, s: Discrete) -> Option<Discrete> {
        let sol = self.solution.as_ref()?;
        (s < sol.policy.n_s()).then(|| sol.policy.greedy_action(s))
    }

    fn exec(&mut self) -> Result<(bool, usize)> {
        let sol = policy_iteration(self.mdp.as_ref(), &self.params)?;
        let ret = (sol.converged, sol.sweeps);
        self.solution = Some(sol);

        Ok(ret)
    }
}
