//! Forward and backward scheduling passes and critical path extraction.

use std::cmp::Ordering;

use petgraph::stable_graph::NodeIndex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use crate::graph::{CycleError, DependencyGraph};

use super::types::{Schedule, TaskTiming};

/// Errors from schedule recomputation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// The graph is not acyclic, so no visiting order exists.
    #[error(transparent)]
    Cycle(#[from] CycleError),
    /// A task lacks the duration the forward pass needs.
    #[error("task {0:?} has no duration")]
    MissingDuration(String),
}

/// Compute a full CPM schedule for the current graph state.
///
/// Runs the forward pass (earliest times), records the project length,
/// runs the backward pass (latest times), and extracts the zero-slack
/// critical path ordered by earliest start.
///
/// # Errors
/// * [`ScheduleError::Cycle`] if the graph has no topological order.
/// * [`ScheduleError::MissingDuration`] if any task has no duration set.
pub fn compute_schedule(graph: &DependencyGraph) -> Result<Schedule, ScheduleError> {
    let order = graph.topological_order()?;

    // Forward pass: predecessors are visited before their successors, so
    // every earliest finish this pass reads has already been computed.
    let mut timings: FxHashMap<NodeIndex, TaskTiming> =
        FxHashMap::with_capacity_and_hasher(order.len(), Default::default());
    let mut critical_path_length: f64 = 0.0;
    let mut total_work = 0.0;

    for &ix in &order {
        let node = match graph.task(ix) {
            Some(n) => n,
            None => continue,
        };
        let duration = node
            .duration
            .ok_or_else(|| ScheduleError::MissingDuration(node.id.clone()))?;
        total_work += duration;

        let mut earliest_start: f64 = 0.0;
        for pred in graph.predecessor_indices(ix) {
            if let Some(timing) = timings.get(&pred) {
                if timing.earliest_finish > earliest_start {
                    earliest_start = timing.earliest_finish;
                }
            }
        }

        let earliest_finish = earliest_start + duration;
        if earliest_finish > critical_path_length {
            critical_path_length = earliest_finish;
        }

        timings.insert(
            ix,
            TaskTiming {
                earliest_start,
                earliest_finish,
                latest_start: 0.0,
                latest_finish: 0.0,
                slack: 0.0,
            },
        );
    }

    // Backward pass in reverse order. Sinks anchor to the project length so
    // every chain shares the same finish line.
    for &ix in order.iter().rev() {
        let mut latest_finish = f64::MAX;
        for succ in graph.successor_indices(ix) {
            if let Some(timing) = timings.get(&succ) {
                if timing.latest_start < latest_finish {
                    latest_finish = timing.latest_start;
                }
            }
        }
        if latest_finish == f64::MAX {
            latest_finish = critical_path_length;
        }

        let duration = graph.task(ix).and_then(|n| n.duration).unwrap_or(0.0);
        if let Some(timing) = timings.get_mut(&ix) {
            timing.latest_finish = latest_finish;
            timing.latest_start = latest_finish - duration;
            timing.slack = timing.latest_start - timing.earliest_start;
        }
    }

    // Zero-slack extraction. The sort is stable, so tasks with equal earliest
    // starts keep their topological visit order.
    let mut critical: Vec<(f64, &str)> = Vec::new();
    for &ix in &order {
        if let (Some(node), Some(timing)) = (graph.task(ix), timings.get(&ix)) {
            if timing.is_critical() {
                critical.push((timing.earliest_start, node.id.as_str()));
            }
        }
    }
    critical.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    let critical_path: Vec<String> = critical.into_iter().map(|(_, id)| id.to_string()).collect();

    let timings: FxHashMap<String, TaskTiming> = timings
        .into_iter()
        .filter_map(|(ix, timing)| graph.task(ix).map(|node| (node.id.clone(), timing)))
        .collect();

    debug!(
        tasks = timings.len(),
        critical = critical_path.len(),
        length = critical_path_length,
        "recomputed schedule"
    );

    Ok(Schedule {
        timings,
        critical_path,
        critical_path_length,
        total_work,
    })
}
