use super::{common::*, Mdp, MdpSolver};
use crate::common::defs::*;
use crate::error::Result;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Value iteration - Sutton & Barto 2018, 4.4.
pub fn value_iteration(mdp: &dyn Mdp, params: &SolverParams) -> Result<Solution> {
    value_iteration_from(mdp, vec![0.; mdp.n_s()], params)
}

/// Value iteration starting from a caller supplied value function.
pub fn value_iteration_from(
    mdp: &dyn Mdp,
    mut v: Vec<Continous>,
    params: &SolverParams,
) -> Result<Solution> {
    check_model(mdp)?;
    check_values(mdp, &v)?;

    let mut converged = false;
    let mut sweeps = 0;
    while sweeps < params.max_sweeps {
        sweeps += 1;
        let mut delta: Continous = 0.;
        for s in 0..mdp.n_s() {
            let q = lookahead(mdp, s, &v, params.gamma)?;
            let best = q[argmax(&q)];
            delta = delta.max((v[s] - best).abs());
            v[s] = best;
        }
        trace!(sweep = sweeps, delta, "value iteration sweep");

        if delta < params.theta {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(sweeps, "value iteration converged");
    } else {
        warn!(sweeps, "value iteration did not converge");
    }

    let policy = greedy_policy(mdp, &v, params.gamma)?;
    Ok(Solution {
        policy,
        v,
        converged,
        sweeps,
    })
}

#[derive(Clone)]
pub struct ValueIteration {
    mdp: Rc<dyn Mdp>,
    params: SolverParams,
    solution: Option<Solution>,
}

impl ValueIteration {
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

impl MdpSolver for ValueIteration {
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
        let sol = value_iteration(self.mdp.as_ref(), &self.params)?;
        let ret = (sol.converged, sol.sweeps);
        self.solution = Some(sol);

        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{frozen_lake::*, simple_golf::*, tabular::*};
    use crate::error::MdpError;
    use assertor::*;
    use float_eq::*;
    use rstest::*;

    fn absorbing_pair() -> TabularMdp {
        TabularMdp::from_table(vec![
            vec![vec![Transition::new(1., 1, 1., true)]],
            vec![vec![Transition::new(1., 1, 0., true)]],
        ])
        .unwrap()
    }

    #[test]
    fn reaching_an_absorbing_goal_is_worth_its_reward() {
        let mdp = absorbing_pair();

        let sol = value_iteration(&mdp, &SolverParams::default()).unwrap();

        assert!(sol.converged);
        assert_float_eq!(sol.v, vec![1., 0.], abs_all <= 1e-12);
        // One sweep to learn the value, one more to see nothing move.
        assert_eq!(sol.sweeps, 2);
    }

    #[rstest]
    #[case(1., 0.5)]
    #[case(-3., 0.9)]
    #[case(0.25, 0.)]
    fn single_state_self_loop(#[case] r: f64, #[case] gamma: f64) {
        let mdp = TabularMdp::from_table(vec![vec![vec![Transition::new(1., 0, r, false)]]]).unwrap();

        let sol = value_iteration(&mdp, &SolverParams::default().with_gamma(gamma)).unwrap();

        assert!(sol.converged);
        assert_float_eq!(sol.v[0], r / (1. - gamma), abs <= 1e-7);
        assert_eq!(sol.policy.greedy_actions(), vec![0]);
    }

    #[test]
    fn reseeding_with_converged_values_is_a_no_op() {
        let mdp = FrozenLake::map_4x4(true).unwrap();
        let params = SolverParams::default().with_gamma(0.9);
        let first = value_iteration(&mdp, &params).unwrap();

        let again = value_iteration_from(&mdp, first.v.clone(), &params).unwrap();

        assert!(again.converged);
        assert_eq!(again.sweeps, 1);
        assert_float_eq!(again.v, first.v, abs_all <= params.theta);
    }

    #[test]
    fn golf_matches_closed_form() {
        let mdp = SimpleGolf::new();

        let sol = value_iteration(&mdp, &SolverParams::default().with_gamma(0.9)).unwrap();

        assert_float_eq!(
            sol.v,
            vec![729. / 82.81, 900. / 91., 0.],
            abs_all <= 1e-7
        );
        assert_eq!(sol.policy.greedy_actions(), vec![0, 2, 0]);
    }

    #[test]
    fn deterministic_lake_policy() {
        let lake = FrozenLake::map_4x4(false).unwrap();

        let sol = value_iteration(&lake, &SolverParams::default().with_gamma(0.9)).unwrap();

        insta::assert_snapshot!(lake.render_policy(&sol.policy), @r###"
        ↓→↓←
        ↓H↓H
        →↓↓H
        H→→G
        "###);
        assert_float_eq!(sol.v[14], 1., abs <= 1e-9);
        assert_float_eq!(sol.v[0], 0.9f64.powi(5), abs <= 1e-9);
    }

    #[test]
    fn sweep_bound_is_reported() {
        let mdp = FrozenLake::map_8x8(true).unwrap();
        let params = SolverParams::default().with_gamma(0.99).with_max_sweeps(5);

        let sol = value_iteration(&mdp, &params).unwrap();

        assert!(!sol.converged);
        assert_eq!(sol.sweeps, 5);
        assert_eq!(sol.v.len(), 64);
        assert_eq!(sol.policy.shape(), (64, 4));
    }

    #[test]
    fn seed_length_must_match_model() {
        let mdp = absorbing_pair();

        assert_eq!(
            value_iteration_from(&mdp, vec![0.; 3], &SolverParams::default()),
            Err(MdpError::ValueLengthMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn solver_exposes_star_quantities() {
        let vi = &mut ValueIteration::new(
            Rc::new(SimpleGolf::new()),
            SolverParams::default().with_gamma(0.9),
        );
        assert_that!(vi.pi_star(1)).is_none();

        let (converged, sweeps) = vi.exec().unwrap();

        assert!(converged);
        assert_that!(sweeps).is_greater_than(1);
        assert_that!(vi.pi_star(1)).is_equal_to(Some(2));
        assert_that!(vi.pi_star(3)).is_none();
        assert_float_eq!(vi.v_star(1).unwrap(), 900. / 91., abs <= 1e-7);
        // Playing back towards the tee is worse than putting.
        assert_that!(vi.q_star(1, 1).unwrap()).is_less_than(vi.q_star(1, 2).unwrap());
        assert_that!(vi.q_star(1, 3)).is_none();
    }
}
