use super::{common::*, Mdp};
use crate::common::defs::*;
use crate::error::Result;
use tracing::{debug, trace, warn};

/// Iterative policy evaluation - Sutton & Barto 2018, 4.1.
///
/// Sweeps update `v` in place in increasing state order, so a state sees the
/// values already written for lower-numbered states in the same sweep.
/// Exhausting `max_sweeps` still returns the last `v`, with `converged` unset.
pub fn evaluate_policy(mdp: &dyn Mdp, pi: &PolicyTable, params: &SolverParams) -> Result<Evaluation> {
    check_model(mdp)?;
    check_policy(mdp, pi)?;

    let mut v = vec![0.; mdp.n_s()];
    for sweep in 1..=params.max_sweeps {
        let mut delta: Continous = 0.;
        for s in 0..mdp.n_s() {
            let q = lookahead(mdp, s, &v, params.gamma)?;
            let v_s = pi.row(s).iter().zip(&q).map(|(p, q)| p * q).sum::<Continous>();
            delta = delta.max((v[s] - v_s).abs());
            v[s] = v_s;
        }
        trace!(sweep, delta, "policy evaluation sweep");

        if delta < params.theta {
            debug!(sweeps = sweep, "policy evaluation converged");
            return Ok(Evaluation {
                v,
                converged: true,
                sweeps: sweep,
            });
        }
    }

    warn!(
        max_sweeps = params.max_sweeps,
        "policy evaluation did not converge"
    );
    Ok(Evaluation {
        v,
        converged: false,
        sweeps: params.max_sweeps,
    })
}
