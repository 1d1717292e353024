pub mod calculator;
pub mod ranking;

pub use calculator::{evaluate, Valuation};
pub use ranking::{rank, FilterStats, Ranking};
