use crate::algos::model_based::mdp::Mdp;
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use itertools::iproduct;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;

pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

const PROBABILITY_TOLERANCE: Continous = 1e-6;

/// Finite MDP backed by an explicit transition table.
///
/// Construction validates the table once: every (state, action) pair is
/// present, probabilities lie in [0, 1] and sum to 1, and successors are in
/// range. The solvers rely on this and do not re-check.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularMdp {
    n_s: usize,
    n_a: usize,
    transitions: Rc<Transitions>,
}

impl TabularMdp {
    pub fn new(n_s: usize, n_a: usize, transitions: Transitions) -> Result<Self> {
        validate(n_s, n_a, &transitions)?;

        Ok(Self {
            n_s,
            n_a,
            transitions: Rc::new(transitions),
        })
    }

    /// Builds from `table[s][a]`. All states need the same number of actions.
    pub fn from_table(table: Vec<Vec<Vec<Transition>>>) -> Result<Self> {
        let n_s = table.len();
        let n_a = table.first().map_or(0, Vec::len);

        let mut transitions = Transitions::new();
        for (s, actions) in table.into_iter().enumerate() {
            if actions.len() != n_a {
                return Err(MdpError::MalformedTransitionModel {
                    state: s,
                    action: actions.len().min(n_a),
                    reason: format!("state has {} actions, expected {n_a}", actions.len()),
                });
            }
            for (a, ts) in actions.into_iter().enumerate() {
                transitions.insert((s, a), ts);
            }
        }

        Self::new(n_s, n_a, transitions)
    }

    /// Parses the gymnasium layout `{"<s>": {"<a>": [[p, s', r, done], ...]}}`,
    /// optionally wrapped in a top level `"transitions"` key.
    pub fn from_json(val: &Value) -> Result<Self> {
        let obj = val
            .get("transitions")
            .unwrap_or(val)
            .as_object()
            .ok_or_else(|| MdpError::InvalidModelJson("expected an object keyed by state".into()))?;

        let n_s = obj.len();
        let mut n_a = 0;
        let mut transitions = Transitions::new();
        for (s_key, s_trans) in obj {
            let s = parse_index(s_key)?;
            let s_trans = s_trans.as_object().ok_or_else(|| {
                MdpError::InvalidModelJson(format!("state {s} is not an object keyed by action"))
            })?;
            n_a = n_a.max(s_trans.len());

            for (a_key, a_trans) in s_trans {
                let a = parse_index(a_key)?;
                let ts = a_trans
                    .as_array()
                    .ok_or_else(|| {
                        MdpError::InvalidModelJson(format!("({s}, {a}) is not a list of transitions"))
                    })?
                    .iter()
                    .map(parse_transition)
                    .collect::<Result<Vec<_>>>()?;
                transitions.insert((s, a), ts);
            }
        }

        Self::new(n_s, n_a, transitions)
    }

    pub fn transition_table(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

impl Mdp for TabularMdp {
    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn transitions(&self, s: Discrete, a: Discrete) -> Result<&[Transition]> {
        lookup(&self.transitions, self.n_s, self.n_a, s, a)
    }
}

pub(crate) fn lookup(
    transitions: &Transitions,
    n_s: usize,
    n_a: usize,
    s: Discrete,
    a: Discrete,
) -> Result<&[Transition]> {
    if s >= n_s {
        return Err(MdpError::InvalidState { state: s, n_s });
    }
    if a >= n_a {
        return Err(MdpError::InvalidAction { action: a, n_a });
    }

    transitions
        .get(&(s, a))
        .map(Vec::as_slice)
        .ok_or_else(|| MdpError::MalformedTransitionModel {
            state: s,
            action: a,
            reason: "no transitions".to_string(),
        })
}

pub(crate) fn validate(n_s: usize, n_a: usize, transitions: &Transitions) -> Result<()> {
    if n_s == 0 || n_a == 0 {
        return Err(MdpError::EmptyModel);
    }

    for &(s, a) in transitions.keys() {
        if s >= n_s {
            return Err(MdpError::InvalidState { state: s, n_s });
        }
        if a >= n_a {
            return Err(MdpError::InvalidAction { action: a, n_a });
        }
    }

    for (s, a) in iproduct!(0..n_s, 0..n_a) {
        let malformed = |reason: String| MdpError::MalformedTransitionModel {
            state: s,
            action: a,
            reason,
        };

        let ts = transitions
            .get(&(s, a))
            .ok_or_else(|| malformed("no transitions".to_string()))?;
        if let Some(t) = ts.iter().find(|t| t.next_state >= n_s) {
            return Err(malformed(format!("next state {} is out of range", t.next_state)));
        }
        if let Some(t) = ts.iter().find(|t| !(0. ..=1.).contains(&t.probability)) {
            return Err(malformed(format!("probability {} is not in [0, 1]", t.probability)));
        }
        let total: Continous = ts.iter().map(|t| t.probability).sum();
        if (total - 1.).abs() > PROBABILITY_TOLERANCE {
            return Err(malformed(format!("probabilities sum to {total}")));
        }
    }

    Ok(())
}

fn parse_index(key: &str) -> Result<Discrete> {
    key.parse::<Discrete>()
        .map_err(|_| MdpError::InvalidModelJson(format!("'{key}' is not an index")))
}

fn parse_transition(t: &Value) -> Result<Transition> {
    let (probability, next_state, reward, done) =
        serde_json::from_value::<(Continous, Discrete, Continous, bool)>(t.clone())
            .map_err(|e| MdpError::InvalidModelJson(e.to_string()))?;

    Ok(Transition {
        probability,
        next_state,
        reward,
        done,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_gymnasium_transition_json() {
        let val = json!({
            "transitions": {
                "0": {
                    "0": [[0.5, 0, 0.0, false], [0.5, 1, 1.0, true]],
                    "1": [[1.0, 1, 1.0, true]]
                },
                "1": {
                    "0": [[1.0, 1, 0.0, true]],
                    "1": [[1.0, 1, 0.0, true]]
                }
            }
        });

        let mdp = TabularMdp::from_json(&val).unwrap();

        assert_eq!(mdp.n_s(), 2);
        assert_eq!(mdp.n_a(), 2);
        assert_eq!(mdp.transition_table().len(), 4);
        assert_eq!(
            mdp.transitions(0, 0).unwrap(),
            &[
                Transition::new(0.5, 0, 0., false),
                Transition::new(0.5, 1, 1., true)
            ]
        );
    }

    #[test]
    fn json_with_bad_entries_is_rejected() {
        let val = json!({ "0": { "0": [[1.0, "x", 0.0, false]] } });

        assert!(matches!(
            TabularMdp::from_json(&val),
            Err(MdpError::InvalidModelJson(_))
        ));
    }

    #[test]
    fn probabilities_must_sum_to_one() {
        let err = TabularMdp::from_table(vec![vec![vec![Transition::new(0.5, 0, 10., false)]]])
            .unwrap_err();

        insta::assert_snapshot!(err.to_string(), @"malformed transition model at (state 0, action 0): probabilities sum to 0.5");
    }

    #[test]
    fn successors_must_be_in_range() {
        let err = TabularMdp::from_table(vec![vec![vec![Transition::new(1., 3, 0., false)]]])
            .unwrap_err();

        assert_eq!(
            err,
            MdpError::MalformedTransitionModel {
                state: 0,
                action: 0,
                reason: "next state 3 is out of range".to_string()
            }
        );
    }

    #[test]
    fn missing_pairs_are_rejected() {
        let transitions = Transitions::from([((0, 0), vec![Transition::new(1., 0, 0., false)])]);

        assert!(matches!(
            TabularMdp::new(1, 2, transitions),
            Err(MdpError::MalformedTransitionModel {
                state: 0,
                action: 1,
                ..
            })
        ));
    }

    #[test]
    fn ragged_tables_are_rejected() {
        let t = || vec![Transition::new(1., 0, 0., false)];

        assert!(matches!(
            TabularMdp::from_table(vec![vec![t(), t()], vec![t()]]),
            Err(MdpError::MalformedTransitionModel { state: 1, .. })
        ));
    }

    #[test]
    fn empty_models_are_rejected() {
        assert_eq!(TabularMdp::from_table(vec![]), Err(MdpError::EmptyModel));
    }

    #[test]
    fn out_of_range_queries_fail_fast() {
        let mdp = TabularMdp::from_table(vec![vec![vec![Transition::new(1., 0, 0., false)]]]).unwrap();

        assert_eq!(
            mdp.transitions(1, 0),
            Err(MdpError::InvalidState { state: 1, n_s: 1 })
        );
        assert_eq!(
            mdp.transitions(0, 1),
            Err(MdpError::InvalidAction { action: 1, n_a: 1 })
        );
    }
}
