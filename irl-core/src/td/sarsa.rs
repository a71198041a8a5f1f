use crate::{
    Error, Result,
    sparse::SparseMatrix,
    types::{Alpha, Epsilon, StepCount},
};
use rand::{Rng, seq::IndexedRandom};
use std::hash::Hash;
use tracing::{debug, warn};

/// An episodic environment with a discrete, state dependent action set.
pub trait SarsaEnvironment {
    type State: Clone + Eq + Hash;
    type Action: Clone + Eq + Hash;

    fn start(&self) -> Self::State;

    /// The subset of `actions` available in `state`.
    fn valid(&self, actions: &[Self::Action], state: &Self::State) -> Vec<Self::Action>;

    fn step(&mut self, state: &Self::State, action: &Self::Action) -> Self::State;

    fn done(&self, state: &Self::State) -> bool;
}

pub trait Agent<S: Eq + Hash, A: Eq + Hash> {
    /// `None` when `actions` is empty.
    fn act(&mut self, q: &SparseMatrix<S, A>, state: &S, actions: &[A]) -> Option<A>;
}

pub struct EGreedy<R: Rng> {
    epsilon: Epsilon,
    generator: R,
}

impl<R: Rng> EGreedy<R> {
    pub fn new(epsilon: Epsilon, generator: R) -> Self {
        Self { epsilon, generator }
    }
}

impl<S: Eq + Hash, A: Eq + Hash + Clone, R: Rng> Agent<S, A> for EGreedy<R> {
    fn act(&mut self, q: &SparseMatrix<S, A>, state: &S, actions: &[A]) -> Option<A> {
        if self.generator.random_bool(*self.epsilon) {
            return actions.choose(&mut self.generator).cloned();
        }
        let best = actions
            .iter()
            .map(|action| q.peek(state, action))
            .fold(f64::NEG_INFINITY, f64::max);
        let greedy: Vec<&A> = actions
            .iter()
            .filter(|action| q.peek(state, action) == best)
            .collect();
        greedy.choose(&mut self.generator).map(|action| (*action).clone())
    }
}

#[derive(Debug, Clone)]
pub struct SarsaResult<S: Eq + Hash, A: Eq + Hash> {
    pub q: SparseMatrix<S, A>,
    /// Total steps taken at the end of each episode, starting with `0`.
    pub episodes: Vec<usize>,
}

/// On-policy TD control with a reward of `-1` per step.
pub struct SarsaController<A> {
    alpha: Alpha,
    actions: Vec<A>,
    n_steps: StepCount,
}

impl<A: Clone + Eq + Hash> SarsaController<A> {
    pub fn new(alpha: Alpha, actions: Vec<A>, n_steps: StepCount) -> Self {
        Self {
            alpha,
            actions,
            n_steps,
        }
    }

    /// Learns action values over `n_steps` steps in total, calling `on_step` after each step.
    pub fn sarsa<E, G, F>(
        &self,
        environment: &mut E,
        agent: &mut G,
        mut on_step: F,
    ) -> Result<SarsaResult<E::State, A>>
    where
        E: SarsaEnvironment<Action = A>,
        G: Agent<E::State, A>,
        F: FnMut(),
    {
        let mut result = SarsaResult {
            q: SparseMatrix::default(),
            episodes: vec![0],
        };
        let mut steps = 0;
        while steps < *self.n_steps {
            let taken = self.episode(
                &mut result.q,
                environment,
                agent,
                &mut on_step,
                *self.n_steps - steps,
            )?;
            steps += taken;
            result.episodes.push(steps);
            debug!(episode = result.episodes.len() - 1, taken, "sarsa episode");
            if taken == 0 {
                warn!("episode ended without a single step, stopping early");
                break;
            }
        }
        Ok(result)
    }

    fn episode<E, G, F>(
        &self,
        q: &mut SparseMatrix<E::State, A>,
        environment: &mut E,
        agent: &mut G,
        on_step: &mut F,
        max_steps: usize,
    ) -> Result<usize>
    where
        E: SarsaEnvironment<Action = A>,
        G: Agent<E::State, A>,
        F: FnMut(),
    {
        let mut state = environment.start();
        let mut action = act(&*q, &self.actions, &state, &*environment, agent)?;
        let mut steps = 0;
        while steps < max_steps && !environment.done(&state) {
            let next_state = environment.step(&state, &action);
            let next_action = act(&*q, &self.actions, &next_state, &*environment, agent)?;
            let target = q.peek(&next_state, &next_action);
            let q_sa = q.value_mut(state, action);
            *q_sa += *self.alpha * (-1. + target - *q_sa);
            state = next_state;
            action = next_action;
            steps += 1;
            on_step();
        }
        Ok(steps)
    }
}

fn act<E, G>(
    q: &SparseMatrix<E::State, E::Action>,
    actions: &[E::Action],
    state: &E::State,
    environment: &E,
    agent: &mut G,
) -> Result<E::Action>
where
    E: SarsaEnvironment,
    G: Agent<E::State, E::Action>,
{
    let valid = environment.valid(actions, state);
    agent
        .act(q, state, &valid)
        .ok_or_else(|| Error::InvalidArgument("no valid action available".to_owned()))
}

/// Plays one episode of at most `max_steps` steps and returns the visited states.
pub fn demo<E, G>(
    actions: &[E::Action],
    q: &SparseMatrix<E::State, E::Action>,
    environment: &mut E,
    agent: &mut G,
    max_steps: StepCount,
) -> Result<Vec<E::State>>
where
    E: SarsaEnvironment,
    G: Agent<E::State, E::Action>,
{
    let mut state = environment.start();
    let mut path = vec![state.clone()];
    let mut action = act(q, actions, &state, &*environment, agent)?;
    for _ in 0..*max_steps {
        if environment.done(&state) {
            break;
        }
        state = environment.step(&state, &action);
        action = act(q, actions, &state, &*environment, agent)?;
        path.push(state.clone());
    }
    Ok(path)
}
