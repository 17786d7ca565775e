use super::tabular::*;
use crate::algos::model_based::mdp::Mdp;
use crate::common::defs::*;
use crate::error::Result;
use std::rc::Rc;

/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
///
/// States: 0 fairway, 1 green, 2 in the hole. Actions: 0 hit to green,
/// 1 hit to fairway, 2 putt. Actions that make no sense in a state leave the
/// ball where it is.
pub struct SimpleGolf {
    transitions: Rc<Transitions>,
}

impl SimpleGolf {
    pub fn new() -> Self {
        let stay = |s| vec![Transition::new(1., s, 0., false)];
        let transitions = Transitions::from([
            (
                (0, 0),
                vec![
                    Transition::new(0.9, 1, 0., false),
                    Transition::new(0.1, 0, 0., false),
                ],
            ),
            ((0, 1), stay(0)),
            ((0, 2), stay(0)),
            ((1, 0), stay(1)),
            (
                (1, 1),
                vec![
                    Transition::new(0.9, 0, 0., false),
                    Transition::new(0.1, 1, 0., false),
                ],
            ),
            (
                (1, 2),
                vec![
                    Transition::new(0.9, 2, 10., true),
                    Transition::new(0.1, 1, 0., false),
                ],
            ),
            ((2, 0), vec![Transition::new(1., 2, 0., true)]),
            ((2, 1), vec![Transition::new(1., 2, 0., true)]),
            ((2, 2), vec![Transition::new(1., 2, 0., true)]),
        ]);

        Self {
            transitions: Rc::new(transitions),
        }
    }

    pub fn transition_table(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }
}

impl Default for SimpleGolf {
    fn default() -> Self {
        Self::new()
    }
}

impl Mdp for SimpleGolf {
    fn n_s(&self) -> usize {
        3
    }

    fn n_a(&self) -> usize {
        3
    }

    fn transitions(&self, s: Discrete, a: Discrete) -> Result<&[Transition]> {
        lookup(&self.transitions, 3, 3, s, a)
    }
}
