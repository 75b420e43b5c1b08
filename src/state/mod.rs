//! State module for tracking dispatch progress
//!
//! # Components
//!
//! - `DomainState`: per-domain delay, last request time and consecutive
//!   rate-limit count used by the rate limiter
//! - `TaskState`: lifecycle of a single fetch task inside the dispatcher

mod domain_state;
mod task_state;

// Re-export main types
pub use domain_state::DomainState;
pub use task_state::TaskState;
