//! Cooperative, budgeted round-robin task scheduling.
//!
//! The scheduler is driven from the outside: a frame loop calls
//! [`TaskScheduler::tick`] once per frame, and the scheduler never spawns a
//! thread or timer of its own. Each tick services eligible tasks one member
//! at a time in round-robin order until the time budget runs out, then
//! yields. A member is never preempted: the budget is only checked between
//! members.
//!
//! Panics raised by a task's processing function are deliberately not
//! caught: a panicking processor is a programming error the caller's
//! function must handle itself (retry or drop the member) before returning.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::task::{Task, TaskId};

/// Scheduler tuning knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Wall-clock time the scheduler may spend per tick, checked between
    /// members.
    pub tick_budget: Duration,

    /// Optional hard cap on members executed per tick. Gives deterministic
    /// slicing for tests and for callers that pace by count instead of time.
    pub max_members_per_tick: Option<usize>,

    /// Drop a task after its condition has failed this many consecutive
    /// ticks, marking it complete so dependents cannot wedge. `None`
    /// disables the reaper and parked tasks live forever.
    pub stale_after_ticks: Option<u32>,
}

impl SchedulerConfig {
    /// Default per-tick time budget.
    pub const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(50);

    /// Default number of condition-failed ticks before a task is reaped.
    pub const DEFAULT_STALE_AFTER_TICKS: u32 = 600;
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_budget: Self::DEFAULT_TICK_BUDGET,
            max_members_per_tick: None,
            stale_after_ticks: Some(Self::DEFAULT_STALE_AFTER_TICKS),
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Members executed this tick.
    pub executed: usize,
    /// Tasks that drained their members this tick.
    pub completed_tasks: usize,
    /// Tasks dropped by the stale reaper this tick.
    pub reaped_tasks: usize,
}

/// Owner of the pending task list and the completion registry.
pub struct TaskScheduler {
    config: SchedulerConfig,
    tasks: Vec<Task>,
    completed: HashSet<TaskId>,
    next_id: u64,
    completed_percent: f64,
}

impl TaskScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tasks: Vec::new(),
            completed: HashSet::new(),
            next_id: 1,
            completed_percent: 0.0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SchedulerConfig::default())
    }

    /// Register a task and assign its id.
    ///
    /// The returned id is what dependent tasks reference.
    pub fn add(&mut self, mut task: Task) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        task.id = id;
        trace!(
            id = %id,
            label = task.label(),
            members = task.total_members(),
            deps = task.dependencies.len(),
            "task registered"
        );
        self.tasks.push(task);
        id
    }

    /// Whether a task id is marked complete in the registry.
    pub fn is_done(&self, id: TaskId) -> bool {
        self.completed.contains(&id)
    }

    /// Whether no tasks remain. An idle scheduler stays idle until the
    /// caller adds new tasks.
    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks still registered (eligible or not).
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Progress over the tasks serviced by the most recent tick, in
    /// percent. Task-set relative, not cumulative across history.
    pub fn completed_percent(&self) -> f64 {
        self.completed_percent
    }

    /// Run one scheduling cycle within the configured budget.
    pub fn tick(&mut self) -> TickReport {
        let start = Instant::now();
        let mut report = TickReport::default();

        // Gate by condition; track consecutive failures for the reaper.
        let mut eligible: Vec<usize> = Vec::new();
        for (ix, task) in self.tasks.iter_mut().enumerate() {
            if task.condition.passes() {
                task.stale_ticks = 0;
                eligible.push(ix);
            } else {
                task.stale_ticks = task.stale_ticks.saturating_add(1);
            }
        }

        if !eligible.is_empty() {
            let mut cursor = 0;
            let mut skipped_in_row = 0;
            loop {
                if start.elapsed() >= self.config.tick_budget {
                    break;
                }
                if let Some(cap) = self.config.max_members_per_tick {
                    if report.executed >= cap {
                        break;
                    }
                }
                // A full pass with no executable member means everything is
                // drained or dependency-blocked; spinning the budget down
                // would gain nothing.
                if skipped_in_row >= eligible.len() {
                    break;
                }

                let ix = eligible[cursor % eligible.len()];
                cursor += 1;

                if self.tasks[ix].remaining_members() == 0 {
                    skipped_in_row += 1;
                    continue;
                }
                let deps_met = self.tasks[ix]
                    .dependencies
                    .iter()
                    .all(|dep| self.completed.contains(dep));
                if !deps_met {
                    skipped_in_row += 1;
                    continue;
                }

                skipped_in_row = 0;
                self.tasks[ix].exec_next();
                report.executed += 1;
            }

            // Progress over the tasks eligible at tick start.
            let total: usize = eligible.iter().map(|&ix| self.tasks[ix].total_members()).sum();
            let remaining: usize = eligible
                .iter()
                .map(|&ix| self.tasks[ix].remaining_members())
                .sum();
            if total > 0 {
                self.completed_percent = (total - remaining) as f64 / total as f64 * 100.0;
            }
        }

        // Mark drained tasks complete and drop them.
        for task in &self.tasks {
            if task.remaining_members() == 0 {
                self.completed.insert(task.id);
                report.completed_tasks += 1;
                debug!(id = %task.id, label = task.label(), "task complete");
            }
        }
        self.tasks.retain(|task| task.remaining_members() > 0);

        // Reap tasks whose condition has been false for too long. Their ids
        // are marked complete so dependents do not wedge forever.
        if let Some(stale_after) = self.config.stale_after_ticks {
            for task in &self.tasks {
                if task.stale_ticks >= stale_after {
                    self.completed.insert(task.id);
                    report.reaped_tasks += 1;
                    debug!(
                        id = %task.id,
                        label = task.label(),
                        stale_ticks = task.stale_ticks,
                        "stale task reaped"
                    );
                }
            }
            self.tasks
                .retain(|task| task.stale_ticks < stale_after);
        }

        report
    }
}
