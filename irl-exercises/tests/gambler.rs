use candle_core::Device;
use float_eq::assert_float_eq;
use irl_core::{
    Result,
    iteration::{ValueIteration, ValueIterationOptions},
    tensors::{ActionIndices, StateValue},
    types::StateCount,
};
use irl_exercises::gambler::GamblersExpecter;

#[test]
fn unfavourable_coin_solution_matches_the_book() -> Result<()> {
    let device = Device::Cpu;
    let expecter = GamblersExpecter::new(0.4, StateCount(99), &device)?;
    let value_iteration =
        ValueIteration::new(expecter.action_count(), expecter.state_count(), &device)?;
    let solution = value_iteration.iterate(
        |actions: &ActionIndices, value: &StateValue| expecter.expected_return(actions, value),
        &mut (),
        || {},
        &ValueIterationOptions::default(),
    )?;

    let values = solution.state_value.to_vec()?;
    assert_float_eq!(values[24], 0.16, abs <= 1e-6);
    assert_float_eq!(values[49], 0.4, abs <= 1e-6);
    assert_float_eq!(values[74], 0.64, abs <= 1e-6);
    assert!(values.windows(2).all(|pair| pair[0] <= pair[1] + 1e-6));

    let stakes: Vec<u32> = solution
        .policy
        .to_vec()?
        .into_iter()
        .map(GamblersExpecter::stake)
        .collect();
    assert_eq!(stakes[49], 50);
    assert_eq!(stakes[0], 1);
    assert_eq!(stakes[98], 1);
    for (index, stake) in stakes.iter().enumerate() {
        let capital = index as u32 + 1;
        assert!(*stake <= capital.min(100 - capital), "stake {stake} at {capital}");
    }
    Ok(())
}
