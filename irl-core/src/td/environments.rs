use super::{nstep::NStepEnvironment, sarsa::SarsaEnvironment};
use crate::{Error, Result, sparse::StateValues};
use rand::{Rng, rngs::StdRng};

/// Random walk over `n_states` non terminal states with terminals at `0` and `n_states + 1`.
#[derive(Debug, Clone, Copy)]
pub struct Walk {
    n_states: usize,
}

impl Walk {
    pub fn new(n_states: usize) -> Result<Self> {
        if n_states < 3 || n_states % 2 == 0 {
            return Err(Error::InvalidArgument(format!(
                "a walk needs an odd number of at least 3 states, got {n_states}"
            )));
        }
        Ok(Self { n_states })
    }

    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Exact values of the non terminal states under the coin flip policy.
    pub fn true_values(&self) -> StateValues<usize> {
        let half = ((self.n_states + 1) / 2) as f64;
        (1..=self.n_states)
            .map(|state| (state, state as f64 / half - 1.))
            .collect()
    }
}

impl NStepEnvironment for Walk {
    type State = usize;

    fn start(&self) -> usize {
        1 + self.n_states / 2
    }

    fn step(&self, state: &usize, action: bool) -> usize {
        if action { state + 1 } else { state - 1 }
    }

    fn reward(&self, state: &usize) -> f64 {
        if *state == self.n_states + 1 {
            1.
        } else if *state == 0 {
            -1.
        } else {
            0.
        }
    }

    fn done(&self, state: &usize) -> bool {
        *state == 0 || *state == self.n_states + 1
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridState {
    pub x: usize,
    pub y: usize,
}

impl GridState {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridAction {
    pub dx: i32,
    pub dy: i32,
}

impl GridAction {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn compass() -> Vec<Self> {
        vec![
            Self::new(0, -1),
            Self::new(1, 0),
            Self::new(0, 1),
            Self::new(-1, 0),
        ]
    }

    pub fn kings() -> Vec<Self> {
        let mut moves = Self::compass();
        moves.extend([
            Self::new(1, -1),
            Self::new(1, 1),
            Self::new(-1, 1),
            Self::new(-1, -1),
        ]);
        moves
    }

    pub fn kings_and_wait() -> Vec<Self> {
        let mut moves = Self::kings();
        moves.push(Self::default());
        moves
    }
}

/// Grid world where each column pushes the agent along `y` by its wind strength.
///
/// With gusts enabled, every non zero wind varies uniformly by one in either direction.
#[derive(Debug, Clone)]
pub struct Windy {
    width: usize,
    height: usize,
    start: GridState,
    goal: GridState,
    wind: Vec<i32>,
    gusts: Option<StdRng>,
}

impl Windy {
    pub fn new(
        width: usize,
        height: usize,
        start: GridState,
        goal: GridState,
        wind: Vec<i32>,
    ) -> Result<Self> {
        if wind.len() != width {
            return Err(Error::InvalidArgument(format!(
                "expected one wind strength per column ({width}), got {}",
                wind.len()
            )));
        }
        let inside = |s: &GridState| s.x < width && s.y < height;
        if !inside(&start) || !inside(&goal) {
            return Err(Error::InvalidArgument(format!(
                "start {start:?} and goal {goal:?} must lie on the {width}x{height} grid"
            )));
        }
        Ok(Self {
            width,
            height,
            start,
            goal,
            wind,
            gusts: None,
        })
    }

    /// The stochastic wind variant.
    pub fn with_gusts(mut self, generator: StdRng) -> Self {
        self.gusts = Some(generator);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn goal(&self) -> GridState {
        self.goal
    }

    pub fn wind(&self, column: usize) -> i32 {
        self.wind[column]
    }

    fn allows(&self, state: &GridState, action: &GridAction) -> bool {
        let x = state.x as i64 + action.dx as i64;
        let y = state.y as i64 + action.dy as i64;
        x >= 0 && x < self.width as i64 && y >= 0 && y < self.height as i64
    }

    fn blow(&mut self, y: i64, wind: i32) -> usize {
        let push = match (&mut self.gusts, wind) {
            (_, 0) => 0,
            (Some(generator), wind) => wind + generator.random_range(-1..=1),
            (None, wind) => wind,
        };
        (y + push as i64).clamp(0, self.height as i64 - 1) as usize
    }
}

impl SarsaEnvironment for Windy {
    type State = GridState;
    type Action = GridAction;

    fn start(&self) -> GridState {
        self.start
    }

    fn valid(&self, actions: &[GridAction], state: &GridState) -> Vec<GridAction> {
        actions
            .iter()
            .filter(|action| self.allows(state, action))
            .copied()
            .collect()
    }

    fn step(&mut self, state: &GridState, action: &GridAction) -> GridState {
        let x = (state.x as i64 + action.dx as i64).clamp(0, self.width as i64 - 1) as usize;
        let y = state.y as i64 + action.dy as i64;
        let wind = self.wind[state.x];
        GridState {
            x,
            y: self.blow(y, wind),
        }
    }

    fn done(&self, state: &GridState) -> bool {
        *state == self.goal
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::SeedableRng;

    fn actions() -> Vec<GridAction> {
        GridAction::kings()
    }

    #[test]
    fn corners_only_allow_inward_moves() -> Result<()> {
        let world = Windy::new(3, 3, GridState::default(), GridState::default(), vec![0; 3])?;
        let mut top_left = world.valid(&actions(), &GridState::new(0, 0));
        top_left.sort();
        assert_eq!(
            top_left,
            vec![
                GridAction::new(0, 1),
                GridAction::new(1, 0),
                GridAction::new(1, 1)
            ]
        );
        assert_eq!(world.valid(&actions(), &GridState::new(1, 1)).len(), 8);
        assert_eq!(world.valid(&actions(), &GridState::new(1, 2)).len(), 5);
        Ok(())
    }

    #[test]
    fn wind_of_the_starting_column_applies() -> Result<()> {
        let origin = GridState::default();
        let mut down = Windy::new(3, 2, origin, origin, vec![0, 1, 0])?;
        let mut up = Windy::new(3, 2, origin, origin, vec![0, -1, 0])?;
        let right = GridAction::new(1, 0);

        assert_eq!(down.step(&GridState::new(0, 0), &right), GridState::new(1, 0));
        assert_eq!(down.step(&GridState::new(1, 0), &right), GridState::new(2, 1));
        assert_eq!(down.step(&GridState::new(1, 1), &right), GridState::new(2, 1));
        assert_eq!(up.step(&GridState::new(1, 1), &right), GridState::new(2, 0));
        assert_eq!(up.step(&GridState::new(1, 0), &right), GridState::new(2, 0));
        Ok(())
    }

    #[test]
    fn gusts_stay_within_one_of_the_wind() -> Result<()> {
        let origin = GridState::default();
        let mut world = Windy::new(2, 7, origin, origin, vec![0, -1])?
            .with_gusts(StdRng::seed_from_u64(3));
        for _ in 0..100 {
            let next = world.step(&GridState::new(1, 3), &GridAction::default());
            assert!((1..=3).contains(&next.y), "gust pushed to {next:?}");
        }
        let calm = world.step(&GridState::new(0, 3), &GridAction::default());
        assert_eq!(calm, GridState::new(0, 3));
        Ok(())
    }

    #[test]
    fn walk_rejects_even_sizes() {
        assert!(Walk::new(4).is_err());
        assert!(Walk::new(1).is_err());
        assert!(Walk::new(5).is_ok());
    }

    #[test]
    fn walk_true_values_are_linear() -> Result<()> {
        let walk = Walk::new(5)?;
        let values = walk.true_values();
        assert_eq!(values.len(), 5);
        assert!((values.peek(&1) + 2. / 3.).abs() < 1e-12);
        assert!(values.peek(&3).abs() < 1e-12);
        assert!((values.peek(&5) - 2. / 3.).abs() < 1e-12);
        assert_eq!(walk.start(), 3);
        Ok(())
    }
}
