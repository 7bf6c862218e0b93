//! CPM scheduling engine.
//!
//! The forward pass computes earliest start/finish times, the backward pass
//! computes latest start/finish times against the project length, and the
//! zero-slack tasks form the critical path. [`CpmScheduler`] wraps the passes
//! in a dirty-tracked cache so repeated reads are free until the graph
//! changes.

mod passes;
mod scheduler;
mod types;

pub use passes::{compute_schedule, ScheduleError};
pub use scheduler::CpmScheduler;
pub use types::{Schedule, TaskTiming};
