use super::{
    EvaluationOptions, IterationPlotter, Solution, evaluate_with_report, reduce_identity,
};
use crate::{
    Error, Result,
    math::argmax_along,
    tensors::{ActionIndices, Policy, StateValue},
    types::{ActionCount, StateCount},
};
use candle_core::{DType, Device, Tensor};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct PolicyIterationOptions {
    pub evaluation: EvaluationOptions,
    /// Give up with [`Error::PolicyUnstable`] after this many improvements that changed the policy.
    pub max_policy_iterations: usize,
}

impl Default for PolicyIterationOptions {
    fn default() -> Self {
        Self {
            evaluation: EvaluationOptions::default(),
            max_policy_iterations: 100,
        }
    }
}

/// Alternates policy evaluation and greedy improvement until the policy stops changing.
pub struct PolicyIteration<E, P> {
    all_actions: ActionIndices,
    initial_policy: Policy,
    initial_value: StateValue,
    expected_return: E,
    progress: P,
    options: PolicyIterationOptions,
}

impl<E, P> PolicyIteration<E, P>
where
    E: Fn(&ActionIndices, &StateValue) -> Result<Tensor>,
    P: FnMut(),
{
    pub fn new(
        action_count: ActionCount,
        state_count: StateCount,
        device: &Device,
        expected_return: E,
        progress: P,
    ) -> Result<Self> {
        if *action_count == 0 || *state_count == 0 {
            return Err(Error::InvalidArgument(format!(
                "policy iteration needs at least one action and one state, got {action_count} actions and {state_count} states"
            )));
        }
        let initial_action = (*action_count / 2) as u32;
        Ok(Self {
            all_actions: ActionIndices::all(action_count, device)?,
            initial_policy: Policy(Tensor::full(initial_action, *state_count, device)?),
            initial_value: StateValue(Tensor::zeros(*state_count, DType::F32, device)?),
            expected_return,
            progress,
            options: PolicyIterationOptions::default(),
        })
    }

    pub fn with_options(mut self, options: PolicyIterationOptions) -> Self {
        self.options = options;
        self
    }

    /// The policy every run starts from: action `n_actions / 2` in every state.
    pub fn initial_policy(&self) -> &Policy {
        &self.initial_policy
    }

    pub fn initial_value(&self) -> &StateValue {
        &self.initial_value
    }

    /// Runs from the initial policy and value, so repeated calls are independent.
    pub fn iterate(&mut self, plotter: &mut impl IterationPlotter) -> Result<Solution> {
        let mut policy = self.initial_policy.clone();
        let mut state_value = self.initial_value.clone();
        for iteration in 0..self.options.max_policy_iterations {
            (self.progress)();
            let evaluation = evaluate_with_report(
                &policy.action_indices()?,
                state_value,
                &self.expected_return,
                reduce_identity,
                |_| Ok(()),
                &self.options.evaluation,
            )?;
            state_value = evaluation.state_value;
            plotter.plot_policy(&policy)?;
            plotter.plot_state_value(&state_value)?;

            let improved = self.improve(&state_value)?;
            let stable = !improved.differs_from(&policy)?;
            debug!(
                iteration,
                evaluations = evaluation.iterations,
                stable,
                "policy improvement"
            );
            if stable {
                return Ok(Solution {
                    policy,
                    state_value,
                });
            }
            policy = improved;
        }
        Err(Error::PolicyUnstable {
            iterations: self.options.max_policy_iterations,
        })
    }

    /// Greedy policy with respect to `state_value`, lowest action index on ties.
    pub fn improve(&self, state_value: &StateValue) -> Result<Policy> {
        let expected = (self.expected_return)(&self.all_actions, state_value)?;
        Ok(Policy(argmax_along(&expected, 1)?))
    }
}
