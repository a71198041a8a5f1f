pub mod policy_iteration;
pub mod value_iteration;

pub use policy_iteration::{PolicyIteration, PolicyIterationOptions};
pub use value_iteration::{ValueIteration, ValueIterationOptions};

use crate::{
    Result,
    math::max_abs_diff,
    tensors::{ActionIndices, Policy, StateValue},
};
use candle_core::Tensor;
use tracing::{trace, warn};

/// Receives intermediate results of policy and value iteration.
pub trait IterationPlotter {
    fn plot_policy(&mut self, policy: &Policy) -> Result<()>;

    fn plot_state_value(&mut self, state_value: &StateValue) -> Result<()>;
}

/// Plotter that drops everything.
impl IterationPlotter for () {
    fn plot_policy(&mut self, _policy: &Policy) -> Result<()> {
        Ok(())
    }

    fn plot_state_value(&mut self, _state_value: &StateValue) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvaluationOptions {
    /// Stop once the sup norm of an update is at or below this.
    pub threshold: f64,
    pub max_iterations: usize,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-9,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub state_value: StateValue,
    pub iterations: usize,
    /// Sup norm of the last update.
    pub delta: f64,
    pub threshold: f64,
}

impl Evaluation {
    pub fn converged(&self) -> bool {
        self.delta <= self.threshold
    }
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub policy: Policy,
    pub state_value: StateValue,
}

/// Repeated Bellman backups `reduce(expected_return(actions, v))` until the value stops moving.
pub fn evaluate<E, R, P>(
    action_indices: &ActionIndices,
    initial_value: StateValue,
    expected_return: E,
    reduce: R,
    progress: P,
    options: &EvaluationOptions,
) -> Result<StateValue>
where
    E: Fn(&ActionIndices, &StateValue) -> Result<Tensor>,
    R: Fn(Tensor) -> Result<StateValue>,
    P: FnMut(&StateValue) -> Result<()>,
{
    evaluate_with_report(
        action_indices,
        initial_value,
        expected_return,
        reduce,
        progress,
        options,
    )
    .map(|evaluation| evaluation.state_value)
}

/// Same loop as [`evaluate`], also reporting how it stopped.
///
/// `progress` sees the value before each backup. Running out of iterations is not an error.
pub fn evaluate_with_report<E, R, P>(
    action_indices: &ActionIndices,
    initial_value: StateValue,
    expected_return: E,
    reduce: R,
    mut progress: P,
    options: &EvaluationOptions,
) -> Result<Evaluation>
where
    E: Fn(&ActionIndices, &StateValue) -> Result<Tensor>,
    R: Fn(Tensor) -> Result<StateValue>,
    P: FnMut(&StateValue) -> Result<()>,
{
    let mut new = initial_value;
    let mut delta = f64::INFINITY;
    let mut iterations = 0;
    while iterations < options.max_iterations && delta > options.threshold {
        progress(&new)?;
        let old = new;
        new = reduce(expected_return(action_indices, &old)?)?;
        delta = max_abs_diff(&old, &new)?;
        iterations += 1;
        trace!(iterations, delta, "bellman backup");
    }
    if delta > options.threshold {
        warn!(
            iterations,
            delta,
            threshold = options.threshold,
            "evaluation stopped before converging"
        );
    }
    Ok(Evaluation {
        state_value: new,
        iterations,
        delta,
        threshold: options.threshold,
    })
}

/// `(n_states, 1) -> (n_states,)`, for evaluating a fixed policy.
pub fn reduce_identity(expected: Tensor) -> Result<StateValue> {
    Ok(StateValue(expected.squeeze(1)?))
}

/// Best action per state, for value iteration.
pub fn reduce_max(expected: Tensor) -> Result<StateValue> {
    Ok(StateValue(expected.max(1)?))
}
