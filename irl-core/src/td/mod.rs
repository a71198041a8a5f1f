pub mod environments;
pub mod nstep;
pub mod sarsa;

pub use environments::{GridAction, GridState, Walk, Windy};
pub use nstep::{
    NStepEnvironment, NStepReturn, NStepTd, NStepUpdater, SumOfTdErrors, TrajectoryWindow,
    Updater,
};
pub use sarsa::{Agent, EGreedy, SarsaController, SarsaEnvironment, SarsaResult, demo};
