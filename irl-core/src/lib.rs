pub mod error;
pub mod iteration;
pub mod math;
pub mod ring;
pub mod rng;
pub mod sparse;
pub mod td;
pub mod tensors;
pub mod types;

pub use error::{Error, Result};
