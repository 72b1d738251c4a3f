//! Cost accrual: pure functions from a price snapshot and an instant to a cost.

pub mod cost;

pub use cost::{
    billable_minutes, compute_final_cost, compute_running_cost, elapsed_minutes, round_currency,
    whole_minutes,
};
