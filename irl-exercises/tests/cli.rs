use clap::Parser;
use irl_exercises::{
    cli::{Cli, Exercise, WalkArgs, WindyArgs},
    runners,
};
use rstest::rstest;

#[test]
fn gambler_defaults_follow_the_book() -> anyhow::Result<()> {
    let cli = Cli::try_parse_from(["irl", "gambler"])?;
    assert_eq!(cli.seed, 0);
    assert!(!cli.cuda);
    let Exercise::Gambler(args) = cli.exercise else {
        panic!("parsed the wrong exercise");
    };
    assert_eq!(args.p_heads, vec![0.4, 0.55]);
    assert_eq!(args.states, 99);
    assert_eq!(args.rounding, 5);
    Ok(())
}

#[rstest]
#[case::car_rental(&["irl", "car-rental", "--max-moves", "3"])]
#[case::random_walk(&["irl", "--seed", "4", "random-walk", "--steps", "1,2"])]
#[case::windy(&["irl", "windy", "--gusts", "--seed", "9"])]
fn subcommands_parse(#[case] args: &[&str]) {
    let cli = Cli::try_parse_from(args).expect("arguments should parse");
    match cli.exercise {
        Exercise::CarRental(rental) => assert_eq!(rental.max_moves, 3),
        Exercise::RandomWalk(walk) => {
            assert_eq!(walk.steps, vec![1, 2]);
            assert_eq!(cli.seed, 4);
        }
        Exercise::Windy(windy) => {
            assert!(windy.gusts);
            assert_eq!(cli.seed, 9);
        }
        Exercise::Gambler(_) => panic!("no gambler case"),
    }
}

#[test]
fn unknown_exercise_is_rejected() {
    assert!(Cli::try_parse_from(["irl", "bandits"]).is_err());
}

#[test]
fn random_walk_report_has_a_curve_per_n() -> anyhow::Result<()> {
    let args = WalkArgs {
        states: 5,
        episodes: 3,
        runs: 2,
        steps: vec![1, 2],
        alphas: 2,
    };
    let report = runners::random_walk(&args)?;
    assert!(report.contains("n-step return"));
    assert!(report.contains("sum of TD errors"));
    assert_eq!(report.matches("n = 1 |").count(), 2);
    assert_eq!(report.matches("n = 2 |").count(), 2);
    Ok(())
}

#[test]
fn windy_report_draws_every_setup() -> anyhow::Result<()> {
    let args = WindyArgs {
        steps: 2_000,
        alpha: 0.5,
        epsilon: 0.1,
        gusts: false,
    };
    let report = runners::windy(&args)?;
    for setup in ["nesw", "king's moves", "king's + wait"] {
        assert!(report.contains(setup), "missing {setup}");
    }
    assert_eq!(report.matches('S').count(), 3);
    Ok(())
}
