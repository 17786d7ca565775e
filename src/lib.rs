pub mod algos;
pub mod common;
pub mod config;
pub mod envs;
pub mod episodes;
pub mod error;
pub mod simulator;

pub use algos::model_based::mdp::{
    common::{greedy_policy, lookahead, PolicyTable, Solution, SolverParams},
    eval::evaluate_policy,
    pi::{policy_iteration, PolicyIteration},
    vi::{value_iteration, ValueIteration},
    Mdp, MdpSolver, MdpSolverPolicy,
};
pub use error::{MdpError, Result};
