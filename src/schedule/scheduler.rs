//! Dirty-tracked CPM scheduler.

use tracing::debug;

use crate::graph::{DependencyGraph, GraphError};

use super::passes::{compute_schedule, ScheduleError};
use super::types::{Schedule, TaskTiming};

/// CPM scheduler with lazy, cached recomputation.
///
/// Owns a [`DependencyGraph`] and a cached [`Schedule`]. Every mutation marks
/// the cache dirty before delegating to the graph, unconditionally: even a
/// re-add of identical data forces the next read to recompute. Reads rerun
/// the passes only when the flag is set.
///
/// If a recompute fails, the flag stays set and the stale cache is never
/// served; the next read retries from scratch.
#[derive(Clone, Debug)]
pub struct CpmScheduler {
    graph: DependencyGraph,
    dirty: bool,
    cache: Schedule,
}

impl Default for CpmScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CpmScheduler {
    /// Create a scheduler over an empty graph.
    pub fn new() -> Self {
        Self {
            graph: DependencyGraph::new(),
            dirty: true,
            cache: Schedule::default(),
        }
    }

    /// Create a scheduler over an existing graph.
    pub fn from_graph(graph: DependencyGraph) -> Self {
        Self {
            graph,
            dirty: true,
            cache: Schedule::default(),
        }
    }

    /// Insert a task, or overwrite the duration of an existing one.
    pub fn add_task(&mut self, id: &str, duration: f64) {
        self.dirty = true;
        self.graph.add_task(id, duration);
    }

    /// Insert or update several tasks from `(id, duration)` pairs.
    pub fn add_tasks_from<I, S>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        self.dirty = true;
        self.graph.add_tasks_from(tasks);
    }

    /// Remove a task and every dependency touching it.
    pub fn remove_task(&mut self, id: &str) -> Result<(), GraphError> {
        self.dirty = true;
        self.graph.remove_task(id)
    }

    /// Remove several tasks; fails without removing anything if any id is
    /// missing.
    pub fn remove_tasks_from<I, S>(&mut self, ids: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.dirty = true;
        self.graph.remove_tasks_from(ids)
    }

    /// Add a precedence edge `from -> to`, creating missing endpoints.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        self.dirty = true;
        self.graph.add_dependency(from, to);
    }

    /// Add several precedence edges from `(from, to)` pairs.
    pub fn add_dependencies_from<I, S>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        self.dirty = true;
        self.graph.add_dependencies_from(edges);
    }

    /// Remove the precedence edge `from -> to`.
    pub fn remove_dependency(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.dirty = true;
        self.graph.remove_dependency(from, to)
    }

    /// Remove several precedence edges; fails without removing anything if
    /// any edge is missing.
    pub fn remove_dependencies_from<I, S>(&mut self, edges: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        self.dirty = true;
        self.graph.remove_dependencies_from(edges)
    }

    /// Minimum project duration: the max earliest finish over all tasks.
    pub fn critical_path_length(&mut self) -> Result<f64, ScheduleError> {
        Ok(self.ensure_fresh()?.critical_path_length)
    }

    /// Zero-slack tasks ordered by ascending earliest start.
    pub fn critical_path(&mut self) -> Result<&[String], ScheduleError> {
        Ok(self.ensure_fresh()?.critical_path.as_slice())
    }

    /// The full computed schedule.
    pub fn schedule(&mut self) -> Result<&Schedule, ScheduleError> {
        self.ensure_fresh()
    }

    /// Timing for one task, or `None` if the task is not in the graph.
    pub fn timing(&mut self, id: &str) -> Result<Option<&TaskTiming>, ScheduleError> {
        Ok(self.ensure_fresh()?.timings.get(id))
    }

    /// Read-only view of the underlying graph. Queries through this view
    /// never touch the dirty flag.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Whether the cache is stale relative to the latest mutation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn ensure_fresh(&mut self) -> Result<&Schedule, ScheduleError> {
        if self.dirty {
            debug!(
                tasks = self.graph.task_count(),
                dependencies = self.graph.dependency_count(),
                "schedule cache stale, recomputing"
            );
            self.cache = compute_schedule(&self.graph)?;
            self.dirty = false;
        }
        Ok(&self.cache)
    }
}
