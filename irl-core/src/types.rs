use derive_more::{Deref, Display, From, Into};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct ActionCount(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct StateCount(pub usize);

/// The `N` in n-step TD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct StepCount(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct EpisodeCount(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into, Deref)]
pub struct RunCount(pub usize);

/// Learning rate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Into, Deref)]
pub struct Alpha(pub f64);

impl Alpha {
    pub fn ratio(numerator: u32, denominator: u32) -> Self {
        Self(numerator as f64 / denominator as f64)
    }
}

/// Exploration probability of an epsilon greedy agent.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display, From, Into, Deref)]
pub struct Epsilon(pub f64);
