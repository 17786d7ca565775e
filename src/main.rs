use clap::Parser;
use rl_dp::algos::model_based::mdp::common::*;
use rl_dp::algos::model_based::mdp::{pi::*, vi::*, MdpSolver, MdpSolverPolicy};
use rl_dp::common::defs::*;
use rl_dp::config::{Algorithm, Config, EnvironmentKind};
use rl_dp::envs::make_env;
use rl_dp::episodes::run_episodes;
use rl_dp::simulator::ModelSimulator;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Solves a finite MDP by dynamic programming and plays the resulting policy.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// TOML config file. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    algorithm: Option<Algorithm>,

    #[arg(short, long, value_enum)]
    env: Option<EnvironmentKind>,

    /// Gymnasium style transitions JSON, implies `--env model`.
    #[arg(short, long)]
    model: Option<PathBuf>,

    #[arg(short, long)]
    gamma: Option<Continous>,

    #[arg(short, long)]
    theta: Option<Continous>,

    #[arg(long)]
    episodes: Option<usize>,

    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(long)]
    not_slippery: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(algorithm) = self.algorithm {
            config.solver.algorithm = algorithm;
        }
        if let Some(kind) = self.env {
            config.environment.kind = kind;
        }
        if let Some(model) = &self.model {
            config.environment.kind = EnvironmentKind::Model;
            config.environment.model = Some(model.clone());
        }
        if let Some(gamma) = self.gamma {
            config.solver.gamma = gamma;
        }
        if let Some(theta) = self.theta {
            config.solver.theta = theta;
        }
        if let Some(episodes) = self.episodes {
            config.episodes.episodes = episodes;
        }
        if let Some(seed) = self.seed {
            config.episodes.seed = seed;
        }
        if self.not_slippery {
            config.environment.slippery = false;
        }
    }
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rl_dp=info"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let env = make_env(&config.environment)?;
    let mdp = Rc::clone(&env.mdp);
    let params = config.solver.params();

    let (solver, solution) = match config.solver.algorithm {
        Algorithm::ValueIteration => {
            let mut vi = ValueIteration::new(Rc::clone(&mdp), params);
            vi.exec()?;
            let solution = vi.solution().cloned();
            (Rc::new(vi) as Rc<dyn MdpSolver>, solution)
        }
        Algorithm::PolicyIteration => {
            let mut pi = PolicyIteration::new(Rc::clone(&mdp), params);
            pi.exec()?;
            let solution = pi.solution().cloned();
            (Rc::new(pi) as Rc<dyn MdpSolver>, solution)
        }
    };
    let solution = solution.ok_or("solver produced no solution")?;

    info!(
        algorithm = ?config.solver.algorithm,
        gamma = params.gamma,
        theta = params.theta,
        converged = solution.converged,
        sweeps = solution.sweeps,
        "solved"
    );
    if !solution.converged {
        warn!("solver stopped before converging, the policy may be suboptimal");
    }

    match &env.lake {
        Some(lake) => {
            info!("v*:\n{}", lake.render_values(&solution.v));
            info!("π*:\n{}", lake.render_policy(&solution.policy));
        }
        None => {
            info!("v*: {:?}", solution.v);
            info!("π*: {:?}", solution.policy.greedy_actions());
        }
    }

    let seed = config.episodes.seed;
    let optimal = run_episodes(
        &mut ModelSimulator::new(&env.name, Rc::clone(&mdp), env.start, seed)?,
        &MdpSolverPolicy { mdp_solver: solver },
        &config.episodes,
    )?;
    let uniform = run_episodes(
        &mut ModelSimulator::new(&env.name, Rc::clone(&mdp), env.start, seed)?,
        &PolicyTable::uniform(mdp.n_s(), mdp.n_a()),
        &config.episodes,
    )?;

    for (label, stats) in [("optimal", &optimal), ("uniform", &uniform)] {
        info!(
            policy = label,
            episodes = stats.episodes,
            wins = stats.wins,
            win_rate = stats.win_rate(),
            average_reward = stats.average_reward,
            average_actions = stats.average_actions,
            "episodes"
        );
    }

    Ok(())
}
