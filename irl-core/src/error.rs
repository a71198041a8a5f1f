use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    /// Policy improvement kept changing the policy until the outer iteration cap.
    #[error("policy was still changing after {iterations} policy iterations")]
    PolicyUnstable { iterations: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
