use crate::error::Result;
use rand::rngs::StdRng;

pub type Discrete = usize;
pub type Continous = f64;

/// One outcome of taking an action in a state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub probability: Continous,
    pub next_state: Discrete,
    pub reward: Continous,
    pub done: bool,
}

impl Transition {
    pub fn new(probability: Continous, next_state: Discrete, reward: Continous, done: bool) -> Self {
        Self {
            probability,
            next_state,
            reward,
            done,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepInfo {
    pub next_state: Discrete,
    pub reward: Continous,
    pub done: bool,
}

pub trait Policy {
    fn policy(&self, s: Discrete, rng: &mut StdRng) -> Result<Discrete>;
}
