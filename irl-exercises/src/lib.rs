pub mod cli;
pub mod gambler;
pub mod plotters;
pub mod progress;
pub mod rental;
pub mod runners;
