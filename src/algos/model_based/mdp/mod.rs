pub mod common;
pub mod eval;
pub mod pi;
pub mod vi;

use crate::common::defs::*;
use crate::error::{MdpError, Result};
use rand::rngs::StdRng;
use std::rc::Rc;

/// Markov Decision Process - Sutton & Barto 2018.
///
/// Read-only view of a finite model. The solvers never step an environment,
/// they only enumerate `transitions`.
pub trait Mdp {
    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn transitions(&self, s: Discrete, a: Discrete) -> Result<&[Transition]>;
}

pub trait MdpSolver {
    fn v_star(&self, s: Discrete) -> Option<Continous>;

    fn q_star(&self, s: Discrete, a: Discrete) -> Option<Continous>;

    fn pi_star(&self, s: Discrete) -> Option<Discrete>;

    /// Runs the solver and returns whether it converged along with the number
    /// of sweeps (value iteration) or outer iterations (policy iteration).
    fn exec(&mut self) -> Result<(bool, usize)>;
}

pub struct MdpSolverPolicy {
    pub mdp_solver: Rc<dyn MdpSolver>,
}

impl Policy for MdpSolverPolicy {
    fn policy(&self, s: Discrete, _rng: &mut StdRng) -> Result<Discrete> {
        self.mdp_solver
            .pi_star(s)
            .ok_or_else(|| MdpError::MalformedPolicy {
                state: s,
                reason: "solver has no action for this state".to_string(),
            })
    }
}
