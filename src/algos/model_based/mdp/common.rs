use super::Mdp;
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use ndarray::{Array2, ArrayView1};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

/// Parameters shared by the evaluator and both solvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverParams {
    /// Discount factor in [0, 1].
    pub gamma: Continous,
    /// A run stops once a sweep's largest absolute update falls below this.
    pub theta: Continous,
    /// Upper bound on sweeps for policy evaluation and value iteration.
    pub max_sweeps: usize,
    /// Upper bound on evaluate/improve rounds of policy iteration.
    pub max_iterations: usize,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            gamma: 1.0,
            theta: 1e-9,
            max_sweeps: 1_000_000,
            max_iterations: 10_000,
        }
    }
}

impl SolverParams {
    pub fn with_gamma(self, gamma: Continous) -> Self {
        Self { gamma, ..self }
    }

    pub fn with_theta(self, theta: Continous) -> Self {
        Self { theta, ..self }
    }

    pub fn with_max_sweeps(self, max_sweeps: usize) -> Self {
        Self { max_sweeps, ..self }
    }

    pub fn with_max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

/// Policy as an `n_s x n_a` row-stochastic matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    probs: Array2<Continous>,
}

impl PolicyTable {
    /// Every action equally likely in every state.
    pub fn uniform(n_s: usize, n_a: usize) -> Self {
        Self {
            probs: Array2::from_elem((n_s, n_a), 1. / n_a as Continous),
        }
    }

    /// One-hot rows, `actions[s]` being the action taken in `s`.
    pub fn greedy(actions: &[Discrete], n_a: usize) -> Result<Self> {
        let mut probs = Array2::zeros((actions.len(), n_a));
        for (s, &a) in actions.iter().enumerate() {
            if a >= n_a {
                return Err(MdpError::InvalidAction { action: a, n_a });
            }
            probs[[s, a]] = 1.;
        }

        Ok(Self { probs })
    }

    /// Wraps an arbitrary matrix after checking that every row is a distribution.
    pub fn from_array(probs: Array2<Continous>) -> Result<Self> {
        for (s, row) in probs.rows().into_iter().enumerate() {
            if row.iter().any(|&p| !(0. ..=1.).contains(&p)) {
                return Err(MdpError::MalformedPolicy {
                    state: s,
                    reason: "probabilities must be in [0, 1]".to_string(),
                });
            }
            let total = row.sum();
            if (total - 1.).abs() > 1e-6 {
                return Err(MdpError::MalformedPolicy {
                    state: s,
                    reason: format!("probabilities sum to {total}"),
                });
            }
        }

        Ok(Self { probs })
    }

    pub fn n_s(&self) -> usize {
        self.probs.nrows()
    }

    pub fn n_a(&self) -> usize {
        self.probs.ncols()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.probs.dim()
    }

    pub fn prob(&self, s: Discrete, a: Discrete) -> Continous {
        self.probs[[s, a]]
    }

    pub fn row(&self, s: Discrete) -> ArrayView1<'_, Continous> {
        self.probs.row(s)
    }

    /// Most likely action in `s`, lowest index on ties.
    pub fn greedy_action(&self, s: Discrete) -> Discrete {
        argmax(self.probs.row(s))
    }

    pub fn greedy_actions(&self) -> Vec<Discrete> {
        (0..self.n_s()).map(|s| self.greedy_action(s)).collect()
    }

    pub fn is_one_hot(&self, s: Discrete, a: Discrete) -> bool {
        self.probs
            .row(s)
            .iter()
            .enumerate()
            .all(|(i, &p)| if i == a { p == 1. } else { p == 0. })
    }

    pub fn set_greedy(&mut self, s: Discrete, a: Discrete) {
        let mut row = self.probs.row_mut(s);
        row.fill(0.);
        row[a] = 1.;
    }
}

impl Policy for PolicyTable {
    fn policy(&self, s: Discrete, rng: &mut StdRng) -> Result<Discrete> {
        if s >= self.n_s() {
            return Err(MdpError::InvalidState {
                state: s,
                n_s: self.n_s(),
            });
        }

        let dist = WeightedIndex::new(self.probs.row(s).iter().copied()).map_err(|e| {
            MdpError::MalformedPolicy {
                state: s,
                reason: e.to_string(),
            }
        })?;
        Ok(dist.sample(rng))
    }
}

/// Result of a solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub policy: PolicyTable,
    pub v: Vec<Continous>,
    pub converged: bool,
    /// Sweeps for value iteration, evaluate/improve rounds for policy iteration.
    pub sweeps: usize,
}

impl Solution {
    /// Treats a run that hit its bound as an error.
    pub fn into_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(MdpError::NonConvergence {
                sweeps: self.sweeps,
            })
        }
    }
}

/// Result of evaluating a fixed policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub v: Vec<Continous>,
    pub converged: bool,
    pub sweeps: usize,
}

impl Evaluation {
    pub fn into_converged(self) -> Result<Self> {
        if self.converged {
            Ok(self)
        } else {
            Err(MdpError::NonConvergence {
                sweeps: self.sweeps,
            })
        }
    }
}

/// Index of the largest value. The lowest index wins ties, NaNs never win.
pub fn argmax<'a>(values: impl IntoIterator<Item = &'a Continous>) -> Discrete {
    values
        .into_iter()
        .enumerate()
        .fold((0, Continous::NEG_INFINITY), |(best_a, best_q), (a, &q)| {
            if q > best_q {
                (a, q)
            } else {
                (best_a, best_q)
            }
        })
        .0
}

/// Bellman backup of every action in `s`:
/// `q[a] = sum p * (r + gamma * v[s'])`, without bootstrapping across terminal transitions.
pub fn lookahead(
    mdp: &dyn Mdp,
    s: Discrete,
    v: &[Continous],
    gamma: Continous,
) -> Result<Vec<Continous>> {
    check_state(mdp, s)?;
    check_values(mdp, v)?;

    (0..mdp.n_a()).map(|a| q_value(mdp, s, a, v, gamma)).collect()
}

fn q_value(
    mdp: &dyn Mdp,
    s: Discrete,
    a: Discrete,
    v: &[Continous],
    gamma: Continous,
) -> Result<Continous> {
    mdp.transitions(s, a)?.iter().try_fold(0., |q, t| {
        let future = if t.done {
            0.
        } else {
            let next = v
                .get(t.next_state)
                .ok_or_else(|| MdpError::MalformedTransitionModel {
                    state: s,
                    action: a,
                    reason: format!("next state {} is out of range", t.next_state),
                })?;
            gamma * next
        };

        Ok(q + t.probability * (t.reward + future))
    })
}

/// Deterministic policy acting greedily with respect to `v`.
pub fn greedy_policy(mdp: &dyn Mdp, v: &[Continous], gamma: Continous) -> Result<PolicyTable> {
    let actions = (0..mdp.n_s())
        .map(|s| lookahead(mdp, s, v, gamma).map(|q| argmax(&q)))
        .collect::<Result<Vec<_>>>()?;

    PolicyTable::greedy(&actions, mdp.n_a())
}

pub(crate) fn check_model(mdp: &dyn Mdp) -> Result<()> {
    if mdp.n_s() == 0 || mdp.n_a() == 0 {
        return Err(MdpError::EmptyModel);
    }

    Ok(())
}

pub(crate) fn check_state(mdp: &dyn Mdp, s: Discrete) -> Result<()> {
    if s >= mdp.n_s() {
        return Err(MdpError::InvalidState {
            state: s,
            n_s: mdp.n_s(),
        });
    }

    Ok(())
}

pub(crate) fn check_values(mdp: &dyn Mdp, v: &[Continous]) -> Result<()> {
    if v.len() != mdp.n_s() {
        return Err(MdpError::ValueLengthMismatch {
            expected: mdp.n_s(),
            actual: v.len(),
        });
    }

    Ok(())
}

pub(crate) fn check_policy(mdp: &dyn Mdp, pi: &PolicyTable) -> Result<()> {
    if pi.shape() != (mdp.n_s(), mdp.n_a()) {
        return Err(MdpError::PolicyShapeMismatch {
            expected: (mdp.n_s(), mdp.n_a()),
            actual: pi.shape(),
        });
    }

    Ok(())
}

/// `q_star` for solvers that keep their last value function around.
pub(crate) fn q_star_from(
    mdp: &dyn Mdp,
    v: &[Continous],
    gamma: Continous,
    s: Discrete,
    a: Discrete,
) -> Option<Continous> {
    if a >= mdp.n_a() {
        return None;
    }

    lookahead(mdp, s, v, gamma).ok().map(|q| q[a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::tabular::*;
    use assertor::*;
    use float_eq::*;
    use rstest::*;

    fn two_state_chain() -> TabularMdp {
        TabularMdp::from_table(vec![
            vec![
                vec![Transition::new(1.0, 0, 0., false)],
                vec![Transition::new(1.0, 1, 1., true)],
            ],
            vec![
                vec![Transition::new(1.0, 1, 0., true)],
                vec![Transition::new(1.0, 1, 0., true)],
            ],
        ])
        .unwrap()
    }

    #[rstest]
    #[case(&[0., 1., 0.5], 1)]
    #[case(&[2., 2., 2.], 0)]
    #[case(&[-1., 3., 3.], 1)]
    #[case(&[f64::NAN, -5.], 1)]
    #[case(&[], 0)]
    fn argmax_prefers_lowest_index(#[case] values: &[f64], #[case] expected: usize) {
        assert_eq!(argmax(values), expected);
    }

    #[test]
    fn lookahead_does_not_bootstrap_through_terminal_transitions() {
        let mdp = two_state_chain();
        let q = lookahead(&mdp, 0, &[5., 100.], 1.0).unwrap();

        assert_float_eq!(q, vec![5., 1.], abs_all <= 1e-12);
    }

    #[test]
    fn lookahead_rejects_out_of_range_state() {
        let mdp = two_state_chain();

        assert_eq!(
            lookahead(&mdp, 2, &[0., 0.], 0.9),
            Err(MdpError::InvalidState { state: 2, n_s: 2 })
        );
    }

    #[test]
    fn lookahead_rejects_short_value_function() {
        let mdp = two_state_chain();
        let err = lookahead(&mdp, 0, &[0.], 0.9).unwrap_err();

        insta::assert_snapshot!(err.to_string(), @"value function has 1 entries, model has 2 states");
    }

    #[test]
    fn uniform_policy_rows_sum_to_one() {
        let pi = PolicyTable::uniform(3, 4);

        for s in 0..3 {
            assert_float_eq!(pi.row(s).sum(), 1., abs <= 1e-12);
            assert_float_eq!(pi.prob(s, 2), 0.25, abs <= 1e-12);
        }
        assert_that!(pi.greedy_actions()).is_equal_to(vec![0, 0, 0]);
    }

    #[test]
    fn set_greedy_overwrites_row() {
        let mut pi = PolicyTable::uniform(2, 3);
        pi.set_greedy(1, 2);

        assert!(pi.is_one_hot(1, 2));
        assert!(!pi.is_one_hot(0, 0));
        assert_eq!(pi.greedy_action(1), 2);
        assert_float_eq!(pi.row(1).sum(), 1., abs <= 1e-12);
    }

    #[test]
    fn greedy_rejects_out_of_range_action() {
        assert_eq!(
            PolicyTable::greedy(&[0, 3], 3),
            Err(MdpError::InvalidAction { action: 3, n_a: 3 })
        );
    }

    #[test]
    fn from_array_rejects_rows_not_summing_to_one() {
        let probs = Array2::from_shape_vec((2, 2), vec![0.5, 0.5, 0.5, 0.2]).unwrap();

        assert!(matches!(
            PolicyTable::from_array(probs),
            Err(MdpError::MalformedPolicy { state: 1, .. })
        ));
    }

    #[test]
    fn sampling_a_greedy_policy_is_deterministic() {
        let pi = PolicyTable::greedy(&[1, 0], 2).unwrap();
        let rng = &mut StdRng::seed_from_u64(2718);

        for _ in 0..100 {
            assert_eq!(pi.policy(0, rng), Ok(1));
            assert_eq!(pi.policy(1, rng), Ok(0));
        }
    }

    #[test]
    fn sampling_a_stochastic_policy_follows_its_row() {
        let probs = Array2::from_shape_vec((1, 2), vec![0.2, 0.8]).unwrap();
        let pi = PolicyTable::from_array(probs).unwrap();
        let rng = &mut StdRng::seed_from_u64(2718);

        let n = 10000;
        let ones = (0..n).filter(|_| pi.policy(0, rng) == Ok(1)).count();

        assert_float_eq!(ones as f64 / n as f64, 0.8, abs <= 2e-2);
    }

    #[test]
    fn non_converged_solution_becomes_an_error_on_request() {
        let sol = Solution {
            policy: PolicyTable::uniform(1, 1),
            v: vec![0.],
            converged: false,
            sweeps: 7,
        };

        assert_eq!(
            sol.into_converged(),
            Err(MdpError::NonConvergence { sweeps: 7 })
        );
    }
}
