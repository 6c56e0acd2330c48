pub mod diff;

pub use diff::{Baseline, Delta, compute_delta};
