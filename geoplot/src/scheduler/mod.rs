//! Cooperative task scheduling.
//!
//! Large imports are broken into [`Task`]s — member lists consumed one at a
//! time — and drained by the [`TaskScheduler`] under a per-tick time budget
//! so the frame loop never stalls. Tasks gate on a [`Condition`] and on the
//! completion of dependency tasks.

#[allow(clippy::module_inception)]
mod scheduler;
mod task;

pub use scheduler::{SchedulerConfig, TaskScheduler, TickReport};
pub use task::{Condition, Task, TaskId};
