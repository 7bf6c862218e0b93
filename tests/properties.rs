//! Property-based tests for CPM scheduling invariants.
//!
//! Random DAGs are generated by only allowing dependencies on earlier-indexed
//! tasks, so acyclicity holds by construction. The tests check the behavioral
//! contracts of the schedule:
//! - forward/backward symmetry (finish - start == duration in both passes)
//! - source/sink boundary conditions
//! - project length equals the max earliest finish
//! - zero slack exactly characterizes critical path membership
//! - the critical path is ordered by earliest start

use std::collections::HashSet;

use critpath::{CpmScheduler, ScheduleError};
use proptest::prelude::*;

/// A generated task: `(id, duration, predecessor indices)`.
type GenTask = (String, f64, Vec<usize>);

/// Generate a DAG with 1..=`max_tasks` tasks. Dependencies only point at
/// earlier tasks, which rules out cycles by construction.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<GenTask>> {
    (1..=max_tasks).prop_flat_map(|task_count| {
        let task_strategies: Vec<BoxedStrategy<GenTask>> = (0..task_count)
            .map(|i| {
                let deps = if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    proptest::collection::vec(0..i, 0..=i.min(3))
                        .prop_map(|deps| {
                            let unique: HashSet<usize> = deps.into_iter().collect();
                            unique.into_iter().collect()
                        })
                        .boxed()
                };
                // Integer-valued durations keep the assertions free of float fuzz.
                (0..=10u32, deps)
                    .prop_map(move |(duration, deps)| {
                        (format!("task_{i}"), f64::from(duration), deps)
                    })
                    .boxed()
            })
            .collect();
        task_strategies
    })
}

fn build_scheduler(tasks: &[GenTask]) -> CpmScheduler {
    let mut scheduler = CpmScheduler::new();
    for (id, duration, _) in tasks {
        scheduler.add_task(id, *duration);
    }
    for (id, _, deps) in tasks {
        for &dep in deps {
            scheduler.add_dependency(&tasks[dep].0, id);
        }
    }
    scheduler
}

proptest! {
    #[test]
    fn schedule_invariants(tasks in dag_strategy(12)) {
        let mut scheduler = build_scheduler(&tasks);
        let schedule = scheduler.schedule().unwrap().clone();

        let mut max_finish: f64 = 0.0;
        for (id, duration, deps) in &tasks {
            let timing = &schedule.timings[id];

            prop_assert!((timing.earliest_finish - timing.earliest_start - duration).abs() < 1e-9);
            prop_assert!((timing.latest_finish - timing.latest_start - duration).abs() < 1e-9);
            prop_assert!(timing.slack >= -1e-9);

            // Source boundary: no predecessors means starting at zero.
            if deps.is_empty() {
                prop_assert_eq!(timing.earliest_start, 0.0);
            }

            max_finish = max_finish.max(timing.earliest_finish);
        }
        prop_assert!((schedule.critical_path_length - max_finish).abs() < 1e-9);

        // Sink boundary: tasks with no successors anchor to the project end.
        for (id, _, _) in &tasks {
            if scheduler.graph().successors(id).count() == 0 {
                let timing = &schedule.timings[id];
                prop_assert!((timing.latest_finish - schedule.critical_path_length).abs() < 1e-9);
            }
        }

        // Zero slack exactly characterizes critical path membership.
        let critical: HashSet<&str> = schedule.critical_path.iter().map(String::as_str).collect();
        for (id, _, _) in &tasks {
            prop_assert_eq!(critical.contains(id.as_str()), schedule.timings[id].is_critical());
        }

        // The path reads left to right by earliest start.
        let starts: Vec<f64> = schedule
            .critical_path
            .iter()
            .map(|id| schedule.timings[id].earliest_start)
            .collect();
        for pair in starts.windows(2) {
            prop_assert!(pair[0] <= pair[1] + 1e-9);
        }
    }

    #[test]
    fn crashing_a_critical_task_extends_the_project(
        tasks in dag_strategy(10),
        bump in 1..=5u32,
    ) {
        let mut scheduler = build_scheduler(&tasks);
        let old_length = scheduler.critical_path_length().unwrap();

        // Every non-empty project has a critical task. Lengthening one
        // lengthens the project by exactly the same amount, and the cache
        // must pick the edit up.
        let id = scheduler.critical_path().unwrap()[0].clone();
        let duration = scheduler.graph().duration(&id).unwrap();
        scheduler.add_task(&id, duration + f64::from(bump));

        let new_length = scheduler.critical_path_length().unwrap();
        prop_assert!((new_length - old_length - f64::from(bump)).abs() < 1e-9);
    }

    #[test]
    fn rings_are_rejected(n in 2..6usize) {
        let mut scheduler = CpmScheduler::new();
        for i in 0..n {
            scheduler.add_task(&format!("task_{i}"), 1.0);
        }
        for i in 0..n {
            scheduler.add_dependency(&format!("task_{i}"), &format!("task_{}", (i + 1) % n));
        }

        prop_assert!(matches!(
            scheduler.critical_path_length(),
            Err(ScheduleError::Cycle(_))
        ));

        // Breaking the ring restores a valid schedule of the full chain.
        scheduler
            .remove_dependency(&format!("task_{}", n - 1), "task_0")
            .unwrap();
        prop_assert_eq!(scheduler.critical_path_length().unwrap(), n as f64);
    }
}
