// Every sampler in the crate draws from this thread local generator unless it is handed its own.
// The seed is zero until someone calls `set_seed`.

use rand::{Rng, SeedableRng, rngs::StdRng};
use std::cell::RefCell;

thread_local! {
    pub static RNG: RefCell<StdRng> = RefCell::new(StdRng::seed_from_u64(0));
}

pub fn set_seed(seed: u64) {
    RNG.with_borrow_mut(|rng| *rng = StdRng::seed_from_u64(seed));
}

/// A fresh generator seeded from the thread local one, for code that wants to own its randomness.
pub fn fork() -> StdRng {
    let seed = RNG.with_borrow_mut(|rng| rng.random::<u64>());
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::RngCore;

    #[test]
    fn same_seed_same_fork() {
        set_seed(7);
        let first = fork().next_u64();
        set_seed(7);
        let second = fork().next_u64();
        assert_eq!(first, second);
    }
}
