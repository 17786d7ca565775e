use crate::algos::model_based::mdp::Mdp;
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::rc::Rc;

/// Stepping view of an environment, as consumed by the episode runner.
pub trait MdpSimulator {
    fn name(&self) -> String;

    fn reset(&mut self) -> Discrete;

    fn step(&mut self, a: Discrete) -> Result<StepInfo>;
}

pub trait Weighted {
    fn p(&self) -> Continous;
}

impl Weighted for Transition {
    fn p(&self) -> Continous {
        self.probability
    }
}

/// Samples one item in proportion to its weight. `None` when no item has
/// positive weight.
pub fn pick_next<'a, T: Weighted>(rng: &mut StdRng, ts: &'a [T]) -> Option<&'a T> {
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng))
}

/// Plays any `Mdp` by sampling its transition table.
pub struct ModelSimulator {
    name: String,
    mdp: Rc<dyn Mdp>,
    start: Discrete,
    state: Discrete,
    rng: StdRng,
}

impl ModelSimulator {
    pub fn new(name: &str, mdp: Rc<dyn Mdp>, start: Discrete, seed: u64) -> Result<Self> {
        if start >= mdp.n_s() {
            return Err(MdpError::InvalidState {
                state: start,
                n_s: mdp.n_s(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            mdp,
            start,
            state: start,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn state(&self) -> Discrete {
        self.state
    }
}

impl MdpSimulator for ModelSimulator {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn reset(&mut self) -> Discrete {
        self.state = self.start;
        self.state
    }

    fn step(&mut self, a: Discrete) -> Result<StepInfo> {
        let s = self.state;
        let ts = self.mdp.transitions(s, a)?;
        let next = pick_next(&mut self.rng, ts).ok_or_else(|| MdpError::MalformedTransitionModel {
            state: s,
            action: a,
            reason: "no transition has positive probability".to_string(),
        })?;
        self.state = next.next_state;

        Ok(StepInfo {
            next_state: next.next_state,
            reward: next.reward,
            done: next.done,
        })
    }
}
