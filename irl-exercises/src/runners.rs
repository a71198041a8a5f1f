use crate::{
    cli::{Cli, Exercise, GamblerArgs, RentalArgs, WalkArgs, WindyArgs},
    gambler::GamblersExpecter,
    plotters::{Layout, TextPlotter, render_curves, render_path},
    progress,
    rental::{RentalExpecter, RentalModel},
};
use anyhow::ensure;
use candle_core::Device;
use irl_core::{
    iteration::{PolicyIteration, PolicyIterationOptions, ValueIteration, ValueIterationOptions},
    math::{argmax_key, rmse},
    rng,
    sparse::StateValues,
    td::{
        EGreedy, GridAction, GridState, NStepEnvironment, NStepReturn, NStepTd, NStepUpdater,
        SarsaController, SumOfTdErrors, Updater, Walk, Windy, demo,
    },
    tensors::{ActionIndices, StateValue},
    types::{Alpha, EpisodeCount, Epsilon, RunCount, StateCount, StepCount},
};
use rand::Rng;
use std::fmt::Write;
use tracing::info;

/// Runs the selected exercise and returns its text report.
pub fn run(cli: &Cli, device: &Device) -> anyhow::Result<String> {
    match &cli.exercise {
        Exercise::Gambler(args) => gambler(args, device),
        Exercise::CarRental(args) => car_rental(args, device),
        Exercise::RandomWalk(args) => random_walk(args),
        Exercise::Windy(args) => windy(args),
    }
}

pub fn gambler(args: &GamblerArgs, device: &Device) -> anyhow::Result<String> {
    let mut report = String::new();
    for &p_heads in &args.p_heads {
        let expecter = GamblersExpecter::new(p_heads, StateCount(args.states), device)?;
        let value_iteration =
            ValueIteration::new(expecter.action_count(), expecter.state_count(), device)?;
        let mut plotter = TextPlotter::new(
            Layout::Rows {
                per_row: 10,
                first_label: 1,
            },
            |index: u32| GamblersExpecter::stake(index) as i64,
            args.snapshots.clone(),
        );
        let spinner = progress::spinner(format!("value iterating p(heads) = {p_heads}"))?;
        let solution = value_iteration.iterate(
            |actions: &ActionIndices, value: &StateValue| expecter.expected_return(actions, value),
            &mut plotter,
            || spinner.inc(1),
            &ValueIterationOptions {
                threshold: args.threshold,
                rounding: args.rounding,
                max_iterations: args.max_iterations,
            },
        )?;
        spinner.finish_and_clear();
        info!(p_heads, sweeps = spinner.position(), "gambler's problem solved");

        writeln!(report, "{}", progress::section(&format!("p(heads) = {p_heads}")))?;
        for (sweep, values) in plotter.values() {
            writeln!(report, "value estimate after sweep {sweep}\n{values}")?;
        }
        writeln!(report, "final value estimate\n{}", plotter.render_values(&solution.state_value)?)?;
        if let Some(policy) = plotter.policies().last() {
            writeln!(report, "stakes\n{policy}")?;
        }
    }
    Ok(report)
}

pub fn car_rental(args: &RentalArgs, device: &Device) -> anyhow::Result<String> {
    let model = RentalModel {
        lot_size: args.max_cars + 1,
        max_moves: args.max_moves,
        deal_size: args.max_deals + 1,
        ..Default::default()
    };
    let expecter = RentalExpecter::new(&model, device)?;
    let bar = progress::bar(args.max_policy_iterations as u64, "policy iterating")?;
    let mut plotter = TextPlotter::new(
        Layout::Grid {
            side: model.lot_size,
        },
        |index: u32| model.cars_moved(index),
        vec![],
    );
    let solution = PolicyIteration::new(
        model.action_count(),
        model.state_count(),
        device,
        |actions: &ActionIndices, value: &StateValue| expecter.expected_return(actions, value),
        || bar.inc(1),
    )?
    .with_options(PolicyIterationOptions {
        max_policy_iterations: args.max_policy_iterations,
        ..Default::default()
    })
    .iterate(&mut plotter)?;
    bar.finish_and_clear();
    info!(
        policies = plotter.policies().len(),
        "car rental policy is stable"
    );

    let mut report = String::new();
    writeln!(report, "{}", progress::section("Jack's car rental"))?;
    writeln!(report, "rows: cars at the second lot, columns: cars at the first lot")?;
    for (iteration, policy) in plotter.policies().iter().enumerate() {
        writeln!(report, "policy {iteration} (cars moved to the second lot)\n{policy}")?;
    }
    writeln!(report, "value of the final policy\n{}", plotter.render_values(&solution.state_value)?)?;
    Ok(report)
}

/// Mean RMSE against `answers` after every episode of `runs` independent runs.
pub fn average_rmse<E, U, G>(
    td: &NStepTd<U>,
    alpha: Alpha,
    environment: &E,
    answers: &StateValues<E::State>,
    runs: RunCount,
    episodes: EpisodeCount,
    generator: &mut G,
) -> f64
where
    E: NStepEnvironment,
    U: NStepUpdater,
    G: Rng + ?Sized,
{
    let mut error = 0.;
    for _ in 0..*runs {
        td.state_values(
            alpha,
            environment,
            |values| error += rmse(values, answers),
            generator,
        );
    }
    error / (*episodes * *runs) as f64
}

pub fn random_walk(args: &WalkArgs) -> anyhow::Result<String> {
    ensure!(args.alphas > 0, "need at least one step size besides zero");
    let walk = Walk::new(args.states)?;
    let answers = walk.true_values();
    let alphas: Vec<Alpha> = (0..=args.alphas)
        .map(|k| Alpha::ratio(k, args.alphas))
        .collect();
    let mut generator = rng::fork();
    let updaters = [
        ("n-step return", Updater::from(NStepReturn)),
        ("sum of TD errors", Updater::from(SumOfTdErrors)),
    ];

    let mut report = String::new();
    for (name, updater) in updaters {
        let mut curves = Vec::with_capacity(args.steps.len());
        for &n in &args.steps {
            let td = NStepTd::new(StepCount(n), EpisodeCount(args.episodes), updater)?;
            let bar = progress::bar(alphas.len() as u64, format!("{name}, n = {n}"))?;
            let mut points = Vec::with_capacity(alphas.len());
            for &alpha in &alphas {
                let error = average_rmse(
                    &td,
                    alpha,
                    &walk,
                    &answers,
                    RunCount(args.runs),
                    EpisodeCount(args.episodes),
                    &mut generator,
                );
                points.push((*alpha, error));
                bar.inc(1);
            }
            bar.finish_and_clear();
            let best = argmax_key(points.iter().map(|&(alpha, error)| (alpha, -error)));
            info!(updater = name, n, best_alpha = ?best, "step size sweep done");
            curves.push((format!("n = {n}"), points));
        }
        writeln!(
            report,
            "{}",
            progress::section(&format!(
                "{name}: average RMS error over {} states and the first {} episodes",
                args.states, args.episodes
            ))
        )?;
        writeln!(report, "{}", render_curves("alpha", &curves)?)?;
    }
    Ok(report)
}

pub fn windy(args: &WindyArgs) -> anyhow::Result<String> {
    let setups = [
        ("nesw", GridAction::compass()),
        ("king's moves", GridAction::kings()),
        ("king's + wait", GridAction::kings_and_wait()),
    ];
    let mut report = String::new();
    for (name, actions) in setups {
        let mut world = Windy::new(
            10,
            7,
            GridState::new(0, 3),
            GridState::new(7, 3),
            vec![0, 0, 0, -1, -1, -1, -2, -2, -1, 0],
        )?;
        if args.gusts {
            world = world.with_gusts(rng::fork());
        }
        let controller = SarsaController::new(Alpha(args.alpha), actions.clone(), StepCount(args.steps));
        let mut explorer = EGreedy::new(Epsilon(args.epsilon), rng::fork());
        let bar = progress::bar(args.steps as u64, name)?;
        let result = controller.sarsa(&mut world, &mut explorer, || bar.inc(1))?;
        bar.finish_and_clear();

        let mut greedy = EGreedy::new(Epsilon(0.), rng::fork());
        let path = demo(actions.as_slice(), &result.q, &mut world, &mut greedy, StepCount(100))?;
        let episodes = result.episodes.len() - 1;
        info!(setup = name, episodes, demo_steps = path.len() - 1, "sarsa done");

        writeln!(report, "{}", progress::section(name))?;
        writeln!(
            report,
            "{episodes} episodes in {} steps, greedy demo took {} steps",
            args.steps,
            path.len() - 1
        )?;
        writeln!(report, "{}", render_path(&world, &path)?)?;
    }
    Ok(report)
}
