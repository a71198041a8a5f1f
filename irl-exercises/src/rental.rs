use anyhow::ensure;
use candle_core::{DType, Device, Tensor};
use irl_core::{
    math::gather,
    tensors::{ActionIndices, StateValue},
    types::{ActionCount, StateCount},
};
use statrs::distribution::{Discrete, Poisson};

/// Jack's car rental with the nonlinear costs of the exercise.
#[derive(Debug, Clone)]
pub struct RentalModel {
    /// Cars a lot can hold plus one, i.e. the number of occupancy states per lot.
    pub lot_size: usize,
    pub max_moves: usize,
    /// Requests and returns are counted up to `deal_size - 1`; the tail mass is dropped.
    pub deal_size: usize,
    pub expected_requests: [f64; 2],
    pub expected_returns: [f64; 2],
    pub rental_reward: f64,
    pub discount: f64,
    pub move_cost: f64,
    pub free_moves_a_to_b: usize,
    pub free_moves_b_to_a: usize,
    pub hold_cost: f64,
    pub hold_limit: usize,
}

impl Default for RentalModel {
    fn default() -> Self {
        Self {
            lot_size: 21,
            max_moves: 5,
            deal_size: 11,
            expected_requests: [3., 4.],
            expected_returns: [3., 2.],
            rental_reward: 10.,
            discount: 0.9,
            move_cost: 2.,
            free_moves_a_to_b: 1,
            free_moves_b_to_a: 0,
            hold_cost: 4.,
            hold_limit: 10,
        }
    }
}

impl RentalModel {
    pub fn state_count(&self) -> StateCount {
        StateCount(self.lot_size * self.lot_size)
    }

    pub fn action_count(&self) -> ActionCount {
        ActionCount(2 * self.max_moves + 1)
    }

    /// Cars moved from A to B by an action index, negative for moves from B to A.
    pub fn cars_moved(&self, index: u32) -> i64 {
        index as i64 - self.max_moves as i64
    }

    /// Lot occupancy of a state index as `(a, b)`.
    pub fn lots(&self, state: usize) -> (usize, usize) {
        (state % self.lot_size, state / self.lot_size)
    }

    /// Occupancy after the overnight moves, clamped to the lots.
    pub fn after_moves(&self, a: usize, b: usize, moved: i64) -> (usize, usize) {
        let moved = moved.clamp(-(b as i64), a as i64);
        let last = self.lot_size as i64 - 1;
        (
            (a as i64 - moved).clamp(0, last) as usize,
            (b as i64 + moved).clamp(0, last) as usize,
        )
    }

    /// Moving and parking costs of an action, `None` if there are not enough cars to move.
    pub fn immediate_cost(&self, a: usize, b: usize, moved: i64) -> Option<f64> {
        if moved > a as i64 || -moved > b as i64 {
            return None;
        }
        let paid_a_to_b = (moved - self.free_moves_a_to_b as i64).max(0);
        let paid_b_to_a = (-moved - self.free_moves_b_to_a as i64).max(0);
        let (post_a, post_b) = self.after_moves(a, b, moved);
        let crowded = (post_a > self.hold_limit) as u32 + (post_b > self.hold_limit) as u32;
        Some((paid_a_to_b + paid_b_to_a) as f64 * self.move_cost + crowded as f64 * self.hold_cost)
    }
}

/// One day of rentals at a single lot, summarised per morning occupancy.
struct LotDay {
    /// `transitions[c][n]`: probability mass of ending the day with `n` cars after starting with `c`.
    transitions: Vec<f32>,
    /// Expected cars rented out per morning occupancy.
    rented: Vec<f32>,
    /// Total probability mass of the truncated request and return distributions.
    mass: f32,
}

impl LotDay {
    fn new(lot_size: usize, deal_size: usize, requests: f64, returns: f64) -> anyhow::Result<Self> {
        let requests = Poisson::new(requests)?;
        let returns = Poisson::new(returns)?;
        let last = lot_size - 1;
        let mut transitions = vec![0f32; lot_size * lot_size];
        let mut rented = vec![0f32; lot_size];
        let mut mass = 0f32;
        for requested in 0..deal_size {
            for returned in 0..deal_size {
                let p = (requests.pmf(requested as u64) * returns.pmf(returned as u64)) as f32;
                mass += p;
                for cars in 0..lot_size {
                    let out = cars.min(requested);
                    let evening = (cars - out + returned).min(last);
                    transitions[cars * lot_size + evening] += p;
                    rented[cars] += p * out as f32;
                }
            }
        }
        Ok(Self {
            transitions,
            rented,
            mass,
        })
    }
}

/// Expected returns of [`RentalModel`] for policy iteration.
///
/// State index `b * lot_size + a`; action index `i` moves `i - max_moves` cars from A to B.
/// The four Poisson processes are independent, so the expectation over the next morning's
/// values factors into `T_B * V * T_A^T` over the per lot transition matrices.
pub struct RentalExpecter {
    lot_size: usize,
    rental_reward: f64,
    discount: f64,
    transitions_a_t: Tensor,
    transitions_b: Tensor,
    /// Expected rental income per morning occupancy `(b, a)`, flattened.
    income: Tensor,
    rows: Tensor,
    /// Post move state index, flat over `(state, action)`.
    post_moves: Tensor,
    /// Negated immediate cost, `-inf` for impossible moves.
    costs: Tensor,
}

impl RentalExpecter {
    pub fn new(model: &RentalModel, device: &Device) -> anyhow::Result<Self> {
        ensure!(model.lot_size > 0, "lots need room for at least one state");
        ensure!(model.deal_size > 0, "deals need at least one outcome");
        let lot_size = model.lot_size;
        let lot_a = LotDay::new(
            lot_size,
            model.deal_size,
            model.expected_requests[0],
            model.expected_returns[0],
        )?;
        let lot_b = LotDay::new(
            lot_size,
            model.deal_size,
            model.expected_requests[1],
            model.expected_returns[1],
        )?;

        let transitions_a = Tensor::from_vec(lot_a.transitions, (lot_size, lot_size), device)?;
        let transitions_b = Tensor::from_vec(lot_b.transitions, (lot_size, lot_size), device)?;
        let rented_a = Tensor::from_vec(lot_a.rented, (1, lot_size), device)?;
        let rented_b = Tensor::from_vec(lot_b.rented, (lot_size, 1), device)?;
        // E[rented_a + rented_b] over the joint distribution
        let income = rented_a
            .affine(lot_b.mass as f64, 0.)?
            .broadcast_add(&rented_b.affine(lot_a.mass as f64, 0.)?)?
            .flatten_all()?;

        let n_states = *model.state_count();
        let n_actions = *model.action_count();
        let mut post_moves = Vec::with_capacity(n_states * n_actions);
        let mut costs = Vec::with_capacity(n_states * n_actions);
        for state in 0..n_states {
            let (a, b) = model.lots(state);
            for index in 0..n_actions {
                let moved = model.cars_moved(index as u32);
                let (post_a, post_b) = model.after_moves(a, b, moved);
                post_moves.push((post_b * lot_size + post_a) as u32);
                costs.push(
                    model
                        .immediate_cost(a, b, moved)
                        .map_or(f32::NEG_INFINITY, |cost| -cost as f32),
                );
            }
        }
        let rows: Vec<u32> = (0..n_states).map(|s| (s * n_actions) as u32).collect();

        Ok(Self {
            lot_size,
            rental_reward: model.rental_reward,
            discount: model.discount,
            transitions_a_t: transitions_a.t()?.contiguous()?,
            transitions_b,
            income,
            rows: Tensor::from_vec(rows, (n_states, 1), device)?,
            post_moves: Tensor::from_vec(post_moves, n_states * n_actions, device)?,
            costs: Tensor::from_vec(costs, n_states * n_actions, device)?,
        })
    }

    /// Value of waking up to each occupancy, before any cars are moved.
    pub fn morning_value(&self, state_value: &StateValue) -> irl_core::Result<Tensor> {
        let dtype = state_value.dtype();
        let grid = state_value.reshape((self.lot_size, self.lot_size))?;
        let future = self
            .transitions_b
            .to_dtype(dtype)?
            .matmul(&grid)?
            .matmul(&self.transitions_a_t.to_dtype(dtype)?)?
            .flatten_all()?;
        let income = self.income.to_dtype(dtype)?;
        Ok((income.affine(self.rental_reward, 0.)? + future.affine(self.discount, 0.)?)?)
    }

    pub fn expected_return(
        &self,
        actions: &ActionIndices,
        state_value: &StateValue,
    ) -> irl_core::Result<Tensor> {
        let positions = self.rows.broadcast_add(actions)?;
        let morning = self.morning_value(state_value)?;
        let after = gather(&morning, &gather(&self.post_moves, &positions)?)?;
        let costs = gather(&self.costs.to_dtype(state_value.dtype())?, &positions)?;
        Ok((after + costs)?)
    }
}

/// Zero values in the layout the engines expect, for probing the model.
pub fn zero_values(model: &RentalModel, device: &Device) -> irl_core::Result<StateValue> {
    Ok(StateValue(Tensor::zeros(
        *model.state_count(),
        DType::F32,
        device,
    )?))
}
