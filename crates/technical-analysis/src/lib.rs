pub mod drawdown;
pub mod indicators;


pub use drawdown::*;
pub use indicators::*;
