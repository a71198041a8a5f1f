use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "irl", about = "Dynamic programming and TD exercises from an RL textbook")]
pub struct Cli {
    /// Seed for every random draw of the run.
    #[arg(long, global = true, default_value_t = 0)]
    pub seed: u64,

    /// Run the tensor work on the first CUDA device if one is available.
    #[arg(long, global = true)]
    pub cuda: bool,

    #[command(subcommand)]
    pub exercise: Exercise,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Exercise {
    /// Value iteration on the gambler's problem.
    Gambler(GamblerArgs),
    /// Policy iteration on Jack's car rental with the nonlinear costs.
    CarRental(RentalArgs),
    /// n-step TD on the random walk, sweeping n and the step size.
    RandomWalk(WalkArgs),
    /// SARSA on the windy grid world.
    Windy(WindyArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GamblerArgs {
    #[arg(long, value_delimiter = ',', default_values_t = [0.4, 0.55])]
    pub p_heads: Vec<f64>,

    /// Non terminal capital levels; the goal is one more.
    #[arg(long, default_value_t = 99)]
    pub states: usize,

    #[arg(long, default_value_t = 1e-9)]
    pub threshold: f64,

    #[arg(long, default_value_t = 5)]
    pub rounding: i32,

    #[arg(long, default_value_t = 1000)]
    pub max_iterations: usize,

    /// Sweeps whose value estimate gets printed.
    #[arg(long, value_delimiter = ',', default_values_t = [1, 2, 3, 32])]
    pub snapshots: Vec<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct RentalArgs {
    #[arg(long, default_value_t = 20)]
    pub max_cars: usize,

    #[arg(long, default_value_t = 5)]
    pub max_moves: usize,

    #[arg(long, default_value_t = 100)]
    pub max_policy_iterations: usize,

    /// Requests and returns beyond this many per day are ignored.
    #[arg(long, default_value_t = 10)]
    pub max_deals: usize,
}

#[derive(Args, Debug, Clone)]
pub struct WalkArgs {
    #[arg(long, default_value_t = 19)]
    pub states: usize,

    #[arg(long, default_value_t = 10)]
    pub episodes: usize,

    #[arg(long, default_value_t = 100)]
    pub runs: usize,

    #[arg(long, value_delimiter = ',', default_values_t = [1, 2, 4, 8, 16])]
    pub steps: Vec<usize>,

    /// Step sizes are `0, 1/alphas, ..., 1`.
    #[arg(long, default_value_t = 10)]
    pub alphas: u32,
}

#[derive(Args, Debug, Clone)]
pub struct WindyArgs {
    #[arg(long, default_value_t = 100_000)]
    pub steps: usize,

    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    #[arg(long, default_value_t = 0.1)]
    pub epsilon: f64,

    /// Let non zero winds vary by one either way.
    #[arg(long)]
    pub gusts: bool,
}
