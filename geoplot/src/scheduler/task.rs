//! Tasks: time-sliced, member-by-member units of work.
//!
//! A task pairs an ordered list of members with a processing function that
//! the scheduler applies to one member at a time. Execution is gated by a
//! [`Condition`] and by the completion of any declared dependencies.

use std::collections::VecDeque;
use std::fmt;

/// Unique task identifier, assigned monotonically by the scheduler at
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// Gate deciding whether a task may be serviced this tick.
///
/// The gate applies to the whole task per tick, not per member: a task whose
/// condition fails is simply not serviced and may resume on a later tick.
pub enum Condition {
    /// Run whenever members remain.
    Always,
    /// Never run (parks the task until replaced or reaped).
    Never,
    /// Run while the predicate holds.
    Predicate(Box<dyn Fn() -> bool + Send>),
}

impl Condition {
    /// Build a predicate condition from a closure.
    pub fn predicate(f: impl Fn() -> bool + Send + 'static) -> Self {
        Condition::Predicate(Box::new(f))
    }

    /// Evaluate the gate.
    pub fn passes(&self) -> bool {
        match self {
            Condition::Always => true,
            Condition::Never => false,
            Condition::Predicate(f) => f(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "Always"),
            Condition::Never => write!(f, "Never"),
            Condition::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

/// Erased member list + processing function.
///
/// Keeps [`Task`] homogeneous while letting each task carry its own member
/// type.
trait TaskWork: Send {
    fn remaining(&self) -> usize;
    fn total(&self) -> usize;
    fn exec_next(&mut self);
}

struct MemberWork<M, F>
where
    F: FnMut(M),
{
    members: VecDeque<M>,
    total: usize,
    process: F,
}

impl<M: Send, F: FnMut(M) + Send> TaskWork for MemberWork<M, F> {
    fn remaining(&self) -> usize {
        self.members.len()
    }

    fn total(&self) -> usize {
        self.total
    }

    fn exec_next(&mut self) {
        if let Some(member) = self.members.pop_front() {
            (self.process)(member);
        }
    }
}

/// A schedulable unit of work.
///
/// Members are owned by the task (no external mutable aliasing), consumed
/// front-to-back, one per service. The task is complete when no members
/// remain.
pub struct Task {
    pub(crate) id: TaskId,
    label: String,
    pub(crate) condition: Condition,
    pub(crate) dependencies: Vec<TaskId>,
    work: Box<dyn TaskWork>,
    /// Consecutive ticks the condition has failed; used by the reaper.
    pub(crate) stale_ticks: u32,
}

impl Task {
    /// Create a task over `members`, applying `process` to one member per
    /// service. Runs unconditionally unless a condition is attached.
    pub fn new<M, F>(label: impl Into<String>, members: Vec<M>, process: F) -> Self
    where
        M: Send + 'static,
        F: FnMut(M) + Send + 'static,
    {
        let total = members.len();
        Self {
            id: TaskId(0), // assigned at registration
            label: label.into(),
            condition: Condition::Always,
            dependencies: Vec::new(),
            work: Box::new(MemberWork {
                members: VecDeque::from(members),
                total,
                process,
            }),
            stale_ticks: 0,
        }
    }

    /// Attach a run condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    /// Declare tasks that must complete before this one is serviced.
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Human-readable label for logging.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Members not yet processed.
    pub fn remaining_members(&self) -> usize {
        self.work.remaining()
    }

    /// Members the task was created with.
    pub fn total_members(&self) -> usize {
        self.work.total()
    }

    pub(crate) fn exec_next(&mut self) {
        self.work.exec_next();
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("condition", &self.condition)
            .field("dependencies", &self.dependencies)
            .field("remaining", &self.work.remaining())
            .field("total", &self.work.total())
            .finish()
    }
}
