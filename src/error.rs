use crate::common::defs::*;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MdpError {
    #[error("state {state} is out of range [0, {n_s})")]
    InvalidState { state: Discrete, n_s: usize },

    #[error("action {action} is out of range [0, {n_a})")]
    InvalidAction { action: Discrete, n_a: usize },

    #[error("malformed transition model at (state {state}, action {action}): {reason}")]
    MalformedTransitionModel {
        state: Discrete,
        action: Discrete,
        reason: String,
    },

    #[error("malformed policy at state {state}: {reason}")]
    MalformedPolicy { state: Discrete, reason: String },

    #[error("transition table JSON is malformed: {0}")]
    InvalidModelJson(String),

    #[error("invalid map: {0}")]
    InvalidMap(String),

    #[error("value function has {actual} entries, model has {expected} states")]
    ValueLengthMismatch { expected: usize, actual: usize },

    #[error("policy is {actual:?}, model requires {expected:?}")]
    PolicyShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("did not converge within {sweeps} sweeps")]
    NonConvergence { sweeps: usize },

    #[error("model must have at least one state and one action")]
    EmptyModel,
}

pub type Result<T> = std::result::Result<T, MdpError>;
