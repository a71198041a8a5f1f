use candle_core::{Device, Tensor};
use irl_core::{
    Error, Result,
    math::gather,
    tensors::{ActionIndices, StateValue},
    types::{ActionCount, StateCount},
};

/// Expected returns of the gambler's problem.
///
/// State index `s` holds `s + 1` dollars and action index `i` stakes `i + 1`. Reaching the goal is
/// worth 1 and going broke 0, so the value of a state is the probability of winning from it.
/// Stakes larger than `min(capital, goal - capital)` are invalid and score `-inf`.
pub struct GamblersExpecter {
    p_heads: f64,
    n_states: usize,
    n_actions: usize,
    /// `s * n_actions` per state, shape `(n_states, 1)`.
    rows: Tensor,
    /// Padded value index after losing, flat over `(state, action)`.
    lose: Tensor,
    win: Tensor,
    /// `0` for valid stakes, `-inf` otherwise.
    penalty: Tensor,
}

impl GamblersExpecter {
    pub fn new(p_heads: f64, n_states: StateCount, device: &Device) -> Result<Self> {
        if !(0. ..=1.).contains(&p_heads) {
            return Err(Error::InvalidArgument(format!(
                "the probability of heads must lie in [0, 1], got {p_heads}"
            )));
        }
        let n_states = *n_states;
        if n_states == 0 {
            return Err(Error::InvalidArgument(
                "the gambler needs at least one state".to_owned(),
            ));
        }
        let n_actions = (n_states + 1) / 2;
        let goal = n_states + 1;

        let mut lose = Vec::with_capacity(n_states * n_actions);
        let mut win = Vec::with_capacity(n_states * n_actions);
        let mut penalty = Vec::with_capacity(n_states * n_actions);
        for capital in 1..=n_states {
            let limit = capital.min(goal - capital);
            for index in 0..n_actions {
                let stake = Self::stake(index as u32) as usize;
                let wager = stake.min(limit);
                lose.push((capital - wager) as u32);
                win.push((capital + wager) as u32);
                penalty.push(if stake > limit { f64::NEG_INFINITY } else { 0. });
            }
        }
        let rows: Vec<u32> = (0..n_states).map(|s| (s * n_actions) as u32).collect();

        Ok(Self {
            p_heads,
            n_states,
            n_actions,
            rows: Tensor::from_vec(rows, (n_states, 1), device)?,
            lose: Tensor::from_vec(lose, n_states * n_actions, device)?,
            win: Tensor::from_vec(win, n_states * n_actions, device)?,
            penalty: Tensor::from_vec(penalty, n_states * n_actions, device)?,
        })
    }

    pub fn state_count(&self) -> StateCount {
        StateCount(self.n_states)
    }

    pub fn action_count(&self) -> ActionCount {
        ActionCount(self.n_actions)
    }

    pub fn stake(index: u32) -> u32 {
        index + 1
    }

    pub fn expected_return(
        &self,
        actions: &ActionIndices,
        state_value: &StateValue,
    ) -> Result<Tensor> {
        let dtype = state_value.dtype();
        let device = state_value.device();
        let positions = self.rows.broadcast_add(actions)?;
        let padded = Tensor::cat(
            &[
                &Tensor::zeros(1, dtype, device)?,
                &state_value.0,
                &Tensor::ones(1, dtype, device)?,
            ],
            0,
        )?;
        let lost = gather(&padded, &gather(&self.lose, &positions)?)?;
        let won = gather(&padded, &gather(&self.win, &positions)?)?;
        let expected = (lost.affine(1. - self.p_heads, 0.)? + won.affine(self.p_heads, 0.)?)?;
        let penalty = gather(&self.penalty.to_dtype(dtype)?, &positions)?;
        Ok((expected + penalty)?)
    }
}
