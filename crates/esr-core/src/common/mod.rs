pub mod constants;
pub mod units;
