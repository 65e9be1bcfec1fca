//! Task layer for the colony act engine.
//!
//! A [`Task`] describes a unit of work and knows how to build the act script an agent runs to
//! do it. The [`TaskManager`] owns the pending pool and the [`Creature`]s, matches tasks to idle
//! creatures by feasibility and cost, steps every creature once per tick, and settles finished
//! scripts into completion, retry or discard.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod category;
pub mod config;
pub mod creature;
pub mod error;
pub mod manager;
pub mod task;

pub use category::{Feasibility, TaskCategory, TaskPriority};
pub use config::SchedulerConfig;
pub use creature::{Creature, CreatureStep};
pub use error::TaskError;
pub use manager::{Assignment, DiscardReason, TaskEvent, TaskManager, TaskState, TickReport};
pub use task::{FnTask, Task, TaskId};
