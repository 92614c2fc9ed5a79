//! Type definitions shared across retarget crates

mod retry_policy;

pub use retry_policy::*;
