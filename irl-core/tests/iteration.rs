use candle_core::{Device, Tensor};
use float_eq::assert_float_eq;
use irl_core::{
    Error, Result,
    iteration::{
        EvaluationOptions, IterationPlotter, PolicyIteration, PolicyIterationOptions,
        ValueIteration, ValueIterationOptions, evaluate, evaluate_with_report, reduce_identity,
    },
    tensors::{ActionIndices, Policy, StateValue},
    types::{ActionCount, StateCount},
};
use std::cell::Cell;

#[derive(Default)]
struct RecordingPlotter {
    policies: Vec<Vec<u32>>,
    values: Vec<Vec<f64>>,
}

impl IterationPlotter for RecordingPlotter {
    fn plot_policy(&mut self, policy: &Policy) -> Result<()> {
        self.policies.push(policy.to_vec()?);
        Ok(())
    }

    fn plot_state_value(&mut self, state_value: &StateValue) -> Result<()> {
        self.values.push(state_value.to_vec()?);
        Ok(())
    }
}

fn single_action(device: &Device) -> Result<ActionIndices> {
    Ok(ActionIndices(Tensor::zeros((3, 1), candle_core::DType::U32, device)?))
}

#[test]
fn identity_backup_stops_after_one_iteration() -> Result<()> {
    let device = Device::Cpu;
    let initial = StateValue(Tensor::new(&[1f64, -2., 3.], &device)?);
    let mut calls = 0;
    let evaluation = evaluate_with_report(
        &single_action(&device)?,
        initial,
        |_: &ActionIndices, v: &StateValue| -> Result<Tensor> { Ok(v.unsqueeze(1)?) },
        reduce_identity,
        |_| {
            calls += 1;
            Ok(())
        },
        &EvaluationOptions::default(),
    )?;
    assert_eq!(evaluation.iterations, 1);
    assert_eq!(calls, 1);
    assert!(evaluation.converged());
    assert_eq!(evaluation.state_value.to_vec()?, vec![1., -2., 3.]);
    Ok(())
}

#[test]
fn contraction_reaches_its_fixed_point() -> Result<()> {
    let device = Device::Cpu;
    let initial = StateValue(Tensor::zeros(3, candle_core::DType::F64, &device)?);
    let mut seen = Vec::new();
    let evaluation = evaluate_with_report(
        &single_action(&device)?,
        initial,
        |_: &ActionIndices, v: &StateValue| -> Result<Tensor> {
            Ok(v.affine(0.5, 1.)?.unsqueeze(1)?)
        },
        reduce_identity,
        |v| {
            seen.push(v.to_vec()?[0]);
            Ok(())
        },
        &EvaluationOptions::default(),
    )?;
    // delta after k backups is 0.5^(k-1)
    assert_eq!(evaluation.iterations, 31);
    assert_eq!(seen.len(), 31);
    assert_eq!(seen[0], 0.);
    assert!(evaluation.converged());
    for value in evaluation.state_value.to_vec()? {
        assert_float_eq!(value, 2., abs <= 1e-8);
    }
    Ok(())
}

#[test]
fn running_out_of_iterations_is_not_an_error() -> Result<()> {
    let device = Device::Cpu;
    let initial = StateValue(Tensor::zeros(3, candle_core::DType::F64, &device)?);
    let options = EvaluationOptions {
        max_iterations: 5,
        ..Default::default()
    };
    let evaluation = evaluate_with_report(
        &single_action(&device)?,
        initial.clone(),
        |_: &ActionIndices, v: &StateValue| -> Result<Tensor> {
            Ok(v.affine(0.5, 1.)?.unsqueeze(1)?)
        },
        reduce_identity,
        |_| Ok(()),
        &options,
    )?;
    assert_eq!(evaluation.iterations, 5);
    assert!(!evaluation.converged());

    let value = evaluate(
        &single_action(&device)?,
        initial,
        |_: &ActionIndices, v: &StateValue| -> Result<Tensor> {
            Ok(v.affine(0.5, 1.)?.unsqueeze(1)?)
        },
        reduce_identity,
        |_| Ok(()),
        &options,
    )?;
    assert_float_eq!(value.to_vec()?[0], 1.9375, abs <= 1e-12);
    Ok(())
}

/// Every action loops back to its own state, so `V(s) = 2 * max_a r(s, a)` with a discount of 0.5.
fn self_loops(device: &Device) -> Result<impl Fn(&ActionIndices, &StateValue) -> Result<Tensor>> {
    let rewards = Tensor::new(&[[1f32, 2.], [3., 0.], [0.5, 0.5]], device)?;
    Ok(move |actions: &ActionIndices, v: &StateValue| -> Result<Tensor> {
        let shape = (3, actions.dim(1)?);
        let actions = actions.broadcast_as(shape)?.contiguous()?;
        let immediate = rewards.gather(&actions, 1)?;
        let future = v.unsqueeze(1)?.broadcast_as(shape)?.affine(0.5, 0.)?;
        Ok((immediate + future)?)
    })
}

#[test]
fn policy_iteration_settles_on_the_greedy_policy() -> Result<()> {
    let device = Device::Cpu;
    let mut ticks = 0;
    let mut plotter = RecordingPlotter::default();
    let solution = {
        let mut pi = PolicyIteration::new(
            ActionCount(2),
            StateCount(3),
            &device,
            self_loops(&device)?,
            || ticks += 1,
        )?;
        assert_eq!(pi.initial_policy().to_vec()?, vec![1, 1, 1]);
        let solution = pi.iterate(&mut plotter)?;
        assert!(!pi.improve(&solution.state_value)?.differs_from(&solution.policy)?);
        solution
    };

    assert_eq!(solution.policy.to_vec()?, vec![1, 0, 0]);
    let values = solution.state_value.to_vec()?;
    assert_float_eq!(values[0], 4., abs <= 1e-5);
    assert_float_eq!(values[1], 6., abs <= 1e-5);
    assert_float_eq!(values[2], 1., abs <= 1e-5);
    assert_eq!(ticks, 2);
    assert_eq!(plotter.policies, vec![vec![1, 1, 1], vec![1, 0, 0]]);
    assert_eq!(plotter.values.len(), 2);
    Ok(())
}

#[test]
fn policy_iteration_restarts_on_every_call() -> Result<()> {
    let device = Device::Cpu;
    let mut pi = PolicyIteration::new(
        ActionCount(2),
        StateCount(3),
        &device,
        self_loops(&device)?,
        || {},
    )?;
    let mut first = RecordingPlotter::default();
    let first_solution = pi.iterate(&mut first)?;
    let mut second = RecordingPlotter::default();
    let second_solution = pi.iterate(&mut second)?;

    assert_eq!(first.policies, vec![vec![1, 1, 1], vec![1, 0, 0]]);
    assert_eq!(second.policies, first.policies);
    assert_eq!(second.values, first.values);
    assert_eq!(second_solution.policy.to_vec()?, first_solution.policy.to_vec()?);
    assert_eq!(pi.initial_policy().to_vec()?, vec![1, 1, 1]);
    assert_eq!(pi.initial_value().to_vec()?, vec![0., 0., 0.]);
    Ok(())
}

#[test]
fn flip_flopping_policy_is_reported() -> Result<()> {
    let device = Device::Cpu;
    let improvements = Cell::new(0u32);
    let expected = |actions: &ActionIndices, _: &StateValue| -> Result<Tensor> {
        if actions.dim(1)? == 1 {
            return Ok(Tensor::zeros((1, 1), candle_core::DType::F32, &device)?);
        }
        let preferred = improvements.get() % 2;
        improvements.set(improvements.get() + 1);
        let row = if preferred == 0 { [1f32, 0.] } else { [0., 1.] };
        Ok(Tensor::new(&[row], &device)?)
    };
    let mut pi = PolicyIteration::new(ActionCount(2), StateCount(1), &device, expected, || {})?
        .with_options(PolicyIterationOptions {
            max_policy_iterations: 5,
            ..Default::default()
        });
    match pi.iterate(&mut ()) {
        Err(Error::PolicyUnstable { iterations }) => assert_eq!(iterations, 5),
        other => panic!("expected an unstable policy, got {other:?}"),
    }
    Ok(())
}

#[test]
fn value_iteration_rounds_away_near_ties() -> Result<()> {
    let device = Device::Cpu;
    let vi = ValueIteration::new(ActionCount(2), StateCount(1), &device)?;
    let expected = |_: &ActionIndices, v: &StateValue| -> Result<Tensor> {
        let returns = Tensor::new(&[[1f64, 1.000001]], &device)?;
        Ok(returns.broadcast_add(&v.affine(0., 0.)?.unsqueeze(1)?)?)
    };

    let mut ticks = 0;
    let mut plotter = RecordingPlotter::default();
    let solution = vi.iterate(
        expected,
        &mut plotter,
        || ticks += 1,
        &ValueIterationOptions::default(),
    )?;
    assert_eq!(solution.policy.to_vec()?, vec![0]);
    assert_float_eq!(solution.state_value.to_vec()?[0], 1.000001, abs <= 1e-12);
    assert_eq!(plotter.policies.len(), 1);
    assert_eq!(plotter.values.len(), ticks);
    assert!(ticks >= 1);

    let again = vi.iterate(expected, &mut (), || {}, &ValueIterationOptions::default())?;
    assert_eq!(again.policy.to_vec()?, vec![0]);

    let unrounded = vi.iterate(
        expected,
        &mut (),
        || {},
        &ValueIterationOptions {
            rounding: 9,
            ..Default::default()
        },
    )?;
    assert_eq!(unrounded.policy.to_vec()?, vec![1]);
    Ok(())
}

#[test]
fn value_iteration_cap_still_yields_a_policy() -> Result<()> {
    let device = Device::Cpu;
    let vi = ValueIteration::new(ActionCount(2), StateCount(1), &device)?;
    let expected = |_: &ActionIndices, v: &StateValue| -> Result<Tensor> {
        let returns = Tensor::new(&[[1f64, 2.]], &device)?;
        Ok(returns.broadcast_add(&v.affine(0.5, 0.)?.unsqueeze(1)?)?)
    };

    let mut ticks = 0;
    let mut plotter = RecordingPlotter::default();
    let solution = vi.iterate(
        expected,
        &mut plotter,
        || ticks += 1,
        &ValueIterationOptions {
            max_iterations: 2,
            ..Default::default()
        },
    )?;
    assert_eq!(ticks, 2);
    assert_eq!(plotter.values, vec![vec![0.], vec![2.]]);
    assert_eq!(plotter.policies, vec![vec![1]]);
    // two backups from zero: 2, then 2 + 0.5 * 2
    assert_float_eq!(solution.state_value.to_vec()?[0], 3., abs <= 1e-12);
    assert_eq!(solution.policy.to_vec()?, vec![1]);
    Ok(())
}
