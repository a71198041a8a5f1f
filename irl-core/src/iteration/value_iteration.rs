use super::{EvaluationOptions, IterationPlotter, Solution, evaluate_with_report, reduce_max};
use crate::{
    Error, Result,
    math::{argmax_along, round_to},
    tensors::{ActionIndices, Policy, StateValue},
    types::{ActionCount, StateCount},
};
use candle_core::{DType, Device, Tensor};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct ValueIterationOptions {
    pub threshold: f64,
    /// Decimal places kept before the final argmax, so floating noise cannot decide between near ties.
    pub rounding: i32,
    pub max_iterations: usize,
}

impl Default for ValueIterationOptions {
    fn default() -> Self {
        Self {
            threshold: 1e-9,
            rounding: 5,
            max_iterations: 1000,
        }
    }
}

pub struct ValueIteration {
    all_actions: ActionIndices,
    initial_value: StateValue,
}

impl ValueIteration {
    pub fn new(action_count: ActionCount, state_count: StateCount, device: &Device) -> Result<Self> {
        if *action_count == 0 || *state_count == 0 {
            return Err(Error::InvalidArgument(format!(
                "value iteration needs at least one action and one state, got {action_count} actions and {state_count} states"
            )));
        }
        Ok(Self {
            all_actions: ActionIndices::all(action_count, device)?,
            initial_value: StateValue(Tensor::zeros(*state_count, DType::F64, device)?),
        })
    }

    /// Runs optimal value backups to convergence, then extracts and plots the greedy policy once.
    pub fn iterate<E, P>(
        &self,
        expected_return: E,
        plotter: &mut impl IterationPlotter,
        mut progress: P,
        options: &ValueIterationOptions,
    ) -> Result<Solution>
    where
        E: Fn(&ActionIndices, &StateValue) -> Result<Tensor>,
        P: FnMut(),
    {
        let evaluation_options = EvaluationOptions {
            threshold: options.threshold,
            max_iterations: options.max_iterations,
        };
        let evaluation = evaluate_with_report(
            &self.all_actions,
            self.initial_value.clone(),
            &expected_return,
            reduce_max,
            |state_value| {
                plotter.plot_state_value(state_value)?;
                progress();
                Ok(())
            },
            &evaluation_options,
        )?;
        debug!(
            iterations = evaluation.iterations,
            delta = evaluation.delta,
            "value iteration converged"
        );

        let expected = expected_return(&self.all_actions, &evaluation.state_value)?;
        let policy = Policy(argmax_along(&round_to(&expected, options.rounding)?, 1)?);
        plotter.plot_policy(&policy)?;
        Ok(Solution {
            policy,
            state_value: evaluation.state_value,
        })
    }
}
