use crate::{
    Error, Result,
    ring::Ring,
    sparse::StateValues,
    types::{Alpha, EpisodeCount, StepCount},
};
use enum_dispatch::enum_dispatch;
use rand::{
    Rng,
    distr::{Bernoulli, Distribution},
};
use std::hash::Hash;
use tracing::debug;

/// An episodic environment driven by a coin flip.
pub trait NStepEnvironment {
    type State: Clone + Default + Eq + Hash;

    fn start(&self) -> Self::State;

    fn step(&self, state: &Self::State, action: bool) -> Self::State;

    fn reward(&self, state: &Self::State) -> f64;

    fn done(&self, state: &Self::State) -> bool;
}

/// The last `n + 1` states and rewards of an episode, addressed by time step.
///
/// `rewards[t]` is the reward received on entering `states[t]`.
#[derive(Debug, Clone)]
pub struct TrajectoryWindow<S> {
    pub states: Ring<S>,
    pub rewards: Ring<f64>,
}

impl<S: Default + Clone> TrajectoryWindow<S> {
    pub fn new(n: StepCount) -> Self {
        Self {
            states: Ring::new(*n + 1),
            rewards: Ring::new(*n + 1),
        }
    }
}

impl<S> TrajectoryWindow<S> {
    pub fn n(&self) -> usize {
        self.states.capacity() - 1
    }
}

/// Updates the value of `states[tau]` once the window holds enough of the future.
///
/// `big_t` is the terminal time step, `usize::MAX` while the episode is still running.
/// Callers guarantee `tau <= t` for the current step `t`, so `tau` is never negative.
#[enum_dispatch]
pub trait NStepUpdater {
    fn update<S: Clone + Eq + Hash>(
        &self,
        values: &mut StateValues<S>,
        alpha: Alpha,
        tau: usize,
        big_t: usize,
        window: &TrajectoryWindow<S>,
    );
}

/// Classic n-step return with bootstrapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct NStepReturn;

impl NStepUpdater for NStepReturn {
    fn update<S: Clone + Eq + Hash>(
        &self,
        values: &mut StateValues<S>,
        alpha: Alpha,
        tau: usize,
        big_t: usize,
        window: &TrajectoryWindow<S>,
    ) {
        let n = window.n();
        let last = (tau + n).min(big_t);
        let mut g: f64 = (tau + 1..=last).map(|i| window.rewards[i]).sum();
        if tau + n < big_t {
            g += values.peek(&window.states[tau + n]);
        }
        let value = values.value_mut(window.states[tau].clone());
        *value += *alpha * (g - *value);
    }
}

/// Sum of one step TD errors over the window, every error read from the values before the write.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumOfTdErrors;

impl NStepUpdater for SumOfTdErrors {
    fn update<S: Clone + Eq + Hash>(
        &self,
        values: &mut StateValues<S>,
        alpha: Alpha,
        tau: usize,
        big_t: usize,
        window: &TrajectoryWindow<S>,
    ) {
        let n = window.n();
        let last = (tau + n - 1).min(big_t);
        let errors: f64 = (tau..=last)
            .map(|k| {
                window.rewards[k + 1] + values.peek(&window.states[k + 1])
                    - values.peek(&window.states[k])
            })
            .sum();
        *values.value_mut(window.states[tau].clone()) += *alpha * errors;
    }
}

#[enum_dispatch(NStepUpdater)]
#[derive(Debug, Clone, Copy)]
pub enum Updater {
    NStepReturn,
    SumOfTdErrors,
}

/// n-step TD prediction for a policy that flips a fair coin every step.
#[derive(Debug, Clone)]
pub struct NStepTd<U> {
    n: StepCount,
    episodes: EpisodeCount,
    updater: U,
    coin: Bernoulli,
}

impl<U: NStepUpdater> NStepTd<U> {
    pub fn new(n: StepCount, episodes: EpisodeCount, updater: U) -> Result<Self> {
        if *n == 0 {
            return Err(Error::InvalidArgument(
                "n-step TD needs at least one step".to_owned(),
            ));
        }
        let coin = Bernoulli::new(0.5).map_err(|err| Error::InvalidArgument(err.to_string()))?;
        Ok(Self {
            n,
            episodes,
            updater,
            coin,
        })
    }

    /// Runs every episode into one fresh value map, handing the map to `on_episode` after each.
    pub fn state_values<E, F, G>(
        &self,
        alpha: Alpha,
        environment: &E,
        mut on_episode: F,
        generator: &mut G,
    ) -> StateValues<E::State>
    where
        E: NStepEnvironment,
        F: FnMut(&StateValues<E::State>),
        G: Rng + ?Sized,
    {
        let mut values = StateValues::default();
        for episode in 0..*self.episodes {
            let steps = self.episode(alpha, environment, &mut values, generator);
            debug!(episode, steps, "n-step episode");
            on_episode(&values);
        }
        values
    }

    fn episode<E, G>(
        &self,
        alpha: Alpha,
        environment: &E,
        values: &mut StateValues<E::State>,
        generator: &mut G,
    ) -> usize
    where
        E: NStepEnvironment,
        G: Rng + ?Sized,
    {
        let n = *self.n;
        let mut window = TrajectoryWindow::new(self.n);
        window.states[0] = environment.start();
        let mut big_t = usize::MAX;
        let mut t = 0;
        loop {
            if t < big_t {
                let action = self.coin.sample(generator);
                let next = environment.step(&window.states[t], action);
                window.rewards[t + 1] = environment.reward(&next);
                if environment.done(&next) {
                    big_t = t + 1;
                }
                window.states[t + 1] = next;
            }
            if let Some(tau) = (t + 1).checked_sub(n) {
                self.updater.update(values, alpha, tau, big_t, &window);
                if tau + 1 >= big_t {
                    return big_t;
                }
            }
            t += 1;
        }
    }
}
