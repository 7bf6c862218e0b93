//! Task dependency graph storage.
//!
//! A thin wrapper around a petgraph [`StableDiGraph`] that addresses tasks by
//! string id instead of node index. The stable variant keeps the indices of
//! remaining nodes valid across removals, so the scheduling passes can key
//! per-node work by `NodeIndex`.

use std::collections::VecDeque;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// Error returned when no topological order exists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dependency cycle detected in task graph")]
pub struct CycleError;

/// Errors from graph mutations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("task not found: {0:?}")]
    TaskNotFound(String),
    #[error("dependency not found: {0:?} -> {1:?}")]
    DependencyNotFound(String, String),
}

/// A task stored in the graph.
///
/// `duration` is `None` only for tasks created implicitly as dependency
/// endpoints; scheduling requires every task to carry one.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskNode {
    pub id: String,
    pub duration: Option<f64>,
}

/// Directed graph of tasks and precedence edges.
///
/// An edge `a -> b` means `b` cannot start before `a` finishes. Acyclicity is
/// not enforced on insertion; it surfaces as [`CycleError`] whenever a
/// topological order is requested.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    graph: StableDiGraph<TaskNode, ()>,
    index: FxHashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task with the given duration, or overwrite the duration of an
    /// existing one. Returns the task's node index.
    pub fn add_task(&mut self, id: &str, duration: f64) -> NodeIndex {
        let ix = self.ensure_task(id);
        if let Some(node) = self.graph.node_weight_mut(ix) {
            node.duration = Some(duration);
        }
        debug!(task = id, duration, "upserted task");
        ix
    }

    /// Insert or update several tasks from `(id, duration)` pairs.
    pub fn add_tasks_from<I, S>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        for (id, duration) in tasks {
            self.add_task(id.as_ref(), duration);
        }
    }

    /// Remove a task and every dependency touching it.
    pub fn remove_task(&mut self, id: &str) -> Result<(), GraphError> {
        let ix = self
            .index
            .remove(id)
            .ok_or_else(|| GraphError::TaskNotFound(id.to_string()))?;
        self.graph.remove_node(ix);
        debug!(task = id, "removed task");
        Ok(())
    }

    /// Remove several tasks. The batch is validated up front so a missing id
    /// fails the whole call with the graph left unchanged.
    pub fn remove_tasks_from<I, S>(&mut self, ids: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: Vec<S> = ids.into_iter().collect();
        for id in &ids {
            if !self.index.contains_key(id.as_ref()) {
                return Err(GraphError::TaskNotFound(id.as_ref().to_string()));
            }
        }
        for id in &ids {
            // The if-let tolerates duplicate ids within the batch.
            if let Some(ix) = self.index.remove(id.as_ref()) {
                self.graph.remove_node(ix);
            }
        }
        Ok(())
    }

    /// Add a precedence edge `from -> to`.
    ///
    /// Endpoints that do not exist yet are created without a duration, and
    /// re-adding an existing edge is a no-op, both matching the usual
    /// adjacency-store semantics.
    pub fn add_dependency(&mut self, from: &str, to: &str) {
        let a = self.ensure_task(from);
        let b = self.ensure_task(to);
        self.graph.update_edge(a, b, ());
    }

    /// Add several precedence edges from `(from, to)` pairs.
    pub fn add_dependencies_from<I, S>(&mut self, edges: I)
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        for (from, to) in edges {
            self.add_dependency(from.as_ref(), to.as_ref());
        }
    }

    /// Remove the precedence edge `from -> to`.
    pub fn remove_dependency(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        let edge = self
            .index
            .get(from)
            .zip(self.index.get(to))
            .and_then(|(&a, &b)| self.graph.find_edge(a, b))
            .ok_or_else(|| GraphError::DependencyNotFound(from.to_string(), to.to_string()))?;
        self.graph.remove_edge(edge);
        Ok(())
    }

    /// Remove several precedence edges. Validated up front like
    /// [`remove_tasks_from`](Self::remove_tasks_from).
    pub fn remove_dependencies_from<I, S>(&mut self, edges: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = (S, S)>,
        S: AsRef<str>,
    {
        let edges: Vec<(S, S)> = edges.into_iter().collect();
        for (from, to) in &edges {
            let found = self
                .index
                .get(from.as_ref())
                .zip(self.index.get(to.as_ref()))
                .and_then(|(&a, &b)| self.graph.find_edge(a, b));
            if found.is_none() {
                return Err(GraphError::DependencyNotFound(
                    from.as_ref().to_string(),
                    to.as_ref().to_string(),
                ));
            }
        }
        for (from, to) in &edges {
            if let Some(edge) = self
                .index
                .get(from.as_ref())
                .zip(self.index.get(to.as_ref()))
                .and_then(|(&a, &b)| self.graph.find_edge(a, b))
            {
                self.graph.remove_edge(edge);
            }
        }
        Ok(())
    }

    /// Whether a task with this id exists.
    pub fn contains_task(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// The task's duration, if the task exists and one has been set.
    pub fn duration(&self, id: &str) -> Option<f64> {
        self.index
            .get(id)
            .and_then(|&ix| self.graph.node_weight(ix))
            .and_then(|node| node.duration)
    }

    /// Whether the precedence edge `from -> to` exists.
    pub fn contains_dependency(&self, from: &str, to: &str) -> bool {
        self.index
            .get(from)
            .zip(self.index.get(to))
            .and_then(|(&a, &b)| self.graph.find_edge(a, b))
            .is_some()
    }

    /// Ids of tasks that must finish before `id` can start.
    pub fn predecessors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> {
        self.neighbor_ids(id, Direction::Incoming)
    }

    /// Ids of tasks that cannot start before `id` finishes.
    pub fn successors<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a str> {
        self.neighbor_ids(id, Direction::Outgoing)
    }

    /// All task ids in insertion order.
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.graph
            .node_indices()
            .filter_map(move |ix| self.graph.node_weight(ix).map(|node| node.id.as_str()))
    }

    /// Number of tasks.
    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of precedence edges.
    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The task stored at a node index.
    pub fn task(&self, ix: NodeIndex) -> Option<&TaskNode> {
        self.graph.node_weight(ix)
    }

    /// Node indices of the direct predecessors of `ix`.
    pub fn predecessor_indices(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Incoming)
    }

    /// Node indices of the direct successors of `ix`.
    pub fn successor_indices(&self, ix: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(ix, Direction::Outgoing)
    }

    /// Topological order of all tasks (Kahn's algorithm).
    ///
    /// Sources are dequeued in insertion order, so the result is deterministic
    /// for a given mutation history. Fails with [`CycleError`] if the graph is
    /// not acyclic.
    pub fn topological_order(&self) -> Result<Vec<NodeIndex>, CycleError> {
        let n = self.graph.node_count();
        let mut in_degree: FxHashMap<NodeIndex, usize> =
            FxHashMap::with_capacity_and_hasher(n, Default::default());
        for ix in self.graph.node_indices() {
            in_degree.insert(
                ix,
                self.graph.neighbors_directed(ix, Direction::Incoming).count(),
            );
        }

        let mut queue: VecDeque<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|ix| in_degree[ix] == 0)
            .collect();

        let mut order: Vec<NodeIndex> = Vec::with_capacity(n);
        while let Some(ix) = queue.pop_front() {
            order.push(ix);
            for succ in self.graph.neighbors_directed(ix, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&succ) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(succ);
                    }
                }
            }
        }

        if order.len() != n {
            return Err(CycleError);
        }
        Ok(order)
    }

    fn neighbor_ids<'a>(&'a self, id: &str, dir: Direction) -> impl Iterator<Item = &'a str> {
        self.index
            .get(id)
            .copied()
            .into_iter()
            .flat_map(move |ix| self.graph.neighbors_directed(ix, dir))
            .filter_map(move |ix| self.graph.node_weight(ix).map(|node| node.id.as_str()))
    }

    fn ensure_task(&mut self, id: &str) -> NodeIndex {
        if let Some(&ix) = self.index.get(id) {
            return ix;
        }
        let ix = self.graph.add_node(TaskNode {
            id: id.to_string(),
            duration: None,
        });
        self.index.insert(id.to_string(), ix);
        ix
    }
}
