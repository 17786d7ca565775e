use super::tabular::*;
use crate::algos::model_based::mdp::{common::PolicyTable, Mdp};
use crate::common::defs::*;
use crate::error::{MdpError, Result};
use itertools::Itertools;

pub const LEFT: Discrete = 0;
pub const DOWN: Discrete = 1;
pub const RIGHT: Discrete = 2;
pub const UP: Discrete = 3;

const N_A: usize = 4;
const ARROWS: [char; N_A] = ['←', '↓', '→', '↑'];

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

/// Frozen lake grid world, transition model identical to gymnasium's `FrozenLake-v1`.
///
/// Refer: https://gymnasium.farama.org/environments/toy_text/frozen_lake/
/// `S` start, `F` frozen, `H` hole, `G` goal. Entering `H` or `G` ends the
/// episode, only `G` pays 1. On a slippery lake the intended move and both
/// perpendicular moves happen with probability 1/3 each.
#[derive(Debug, Clone)]
pub struct FrozenLake {
    desc: Vec<Vec<u8>>,
    ncol: usize,
    start: Discrete,
    model: TabularMdp,
}

impl FrozenLake {
    pub fn new<S: AsRef<str>>(desc: &[S], slippery: bool) -> Result<Self> {
        let desc = desc
            .iter()
            .map(|row| row.as_ref().as_bytes().to_vec())
            .collect::<Vec<_>>();

        let nrow = desc.len();
        let ncol = desc.first().map_or(0, Vec::len);
        if nrow == 0 || ncol == 0 {
            return Err(MdpError::InvalidMap("map is empty".into()));
        }
        if desc.iter().any(|row| row.len() != ncol) {
            return Err(MdpError::InvalidMap("rows differ in length".into()));
        }
        if let Some(&c) = desc.iter().flatten().find(|&&c| !b"SFHG".contains(&c)) {
            return Err(MdpError::InvalidMap(format!(
                "unknown tile '{}'",
                char::from(c)
            )));
        }
        let start = desc
            .iter()
            .flatten()
            .position(|&c| c == b'S')
            .ok_or_else(|| MdpError::InvalidMap("no start tile".into()))?;

        let mut transitions = Transitions::new();
        for (row, col, a) in itertools::iproduct!(0..nrow, 0..ncol, 0..N_A) {
            let s = row * ncol + col;
            let ts = if b"GH".contains(&desc[row][col]) {
                vec![Transition::new(1.0, s, 0., true)]
            } else if slippery {
                [(a + N_A - 1) % N_A, a, (a + 1) % N_A]
                    .into_iter()
                    .map(|b| Self::outcome(&desc, row, col, b, 1.0 / 3.0))
                    .collect()
            } else {
                vec![Self::outcome(&desc, row, col, a, 1.0)]
            };
            transitions.insert((s, a), ts);
        }

        Ok(Self {
            model: TabularMdp::new(nrow * ncol, N_A, transitions)?,
            desc,
            ncol,
            start,
        })
    }

    pub fn map_4x4(slippery: bool) -> Result<Self> {
        Self::new(&MAP_4X4, slippery)
    }

    pub fn map_8x8(slippery: bool) -> Result<Self> {
        Self::new(&MAP_8X8, slippery)
    }

    pub fn start(&self) -> Discrete {
        self.start
    }

    pub fn tile(&self, s: Discrete) -> Option<char> {
        self.desc
            .get(s / self.ncol)
            .and_then(|row| row.get(s % self.ncol))
            .map(|&c| char::from(c))
    }

    pub fn model(&self) -> &TabularMdp {
        &self.model
    }

    /// One line per row; holes and the goal keep their letter, other tiles
    /// show the greedy action.
    pub fn render_policy(&self, pi: &PolicyTable) -> String {
        self.desc
            .iter()
            .enumerate()
            .map(|(row, tiles)| {
                tiles
                    .iter()
                    .enumerate()
                    .map(|(col, &c)| match c {
                        b'H' | b'G' => char::from(c),
                        _ => ARROWS[pi.greedy_action(row * self.ncol + col) % N_A],
                    })
                    .collect::<String>()
            })
            .join("\n")
    }

    pub fn render_values(&self, v: &[Continous]) -> String {
        v.chunks(self.ncol)
            .map(|row| row.iter().map(|x| format!("{x:.3}")).join(" "))
            .join("\n")
    }

    fn outcome(
        desc: &[Vec<u8>],
        row: usize,
        col: usize,
        a: Discrete,
        probability: Continous,
    ) -> Transition {
        let (nrow, ncol) = (desc.len(), desc[0].len());
        let (row, col) = match a {
            LEFT => (row, col.saturating_sub(1)),
            DOWN => ((row + 1).min(nrow - 1), col),
            RIGHT => (row, (col + 1).min(ncol - 1)),
            _ => (row.saturating_sub(1), col),
        };
        let letter = desc[row][col];

        Transition::new(
            probability,
            row * ncol + col,
            if letter == b'G' { 1. } else { 0. },
            b"GH".contains(&letter),
        )
    }
}

impl Mdp for FrozenLake {
    fn n_s(&self) -> usize {
        self.model.n_s()
    }

    fn n_a(&self) -> usize {
        self.model.n_a()
    }

    fn transitions(&self, s: Discrete, a: Discrete) -> Result<&[Transition]> {
        self.model.transitions(s, a)
    }
}
