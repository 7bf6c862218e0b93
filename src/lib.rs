//! Critical path method (CPM) scheduling over task dependency graphs.
//!
//! Tasks carry a duration; a directed edge `a -> b` is a precedence
//! constraint meaning `b` cannot start before `a` finishes. From those the
//! scheduler derives each task's earliest/latest start and finish times, the
//! minimum project duration, and the ordered chain of zero-slack tasks that
//! bounds it.
//!
//! [`CpmScheduler`] is the main entry point: it owns a [`DependencyGraph`],
//! marks its cached [`Schedule`] dirty on every mutation, and recomputes
//! lazily when `critical_path_length` or `critical_path` is read.
//!
//! ```
//! use critpath::CpmScheduler;
//!
//! let mut scheduler = CpmScheduler::new();
//! scheduler.add_tasks_from([("design", 3.0), ("build", 5.0), ("test", 2.0)]);
//! scheduler.add_dependencies_from([("design", "build"), ("build", "test")]);
//!
//! assert_eq!(scheduler.critical_path_length().unwrap(), 10.0);
//! assert_eq!(scheduler.critical_path().unwrap(), ["design", "build", "test"]);
//! ```

pub mod graph;
pub mod schedule;

pub use graph::{CycleError, DependencyGraph, GraphError, TaskNode};
pub use schedule::{compute_schedule, CpmScheduler, Schedule, ScheduleError, TaskTiming};
