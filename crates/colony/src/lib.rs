//! Umbrella crate that re-exports the `colony-*` building blocks.
//!
//! `core` carries the status, blackboard and reservation primitives, `act` the act tree runtime,
//! `task` the task pool and creature scheduler, and `tools` the trace event plumbing.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use colony_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use colony_tools as tools;

#[cfg(feature = "act")]
#[cfg_attr(docsrs, doc(cfg(feature = "act")))]
pub use colony_act as act;

#[cfg(feature = "task")]
#[cfg_attr(docsrs, doc(cfg(feature = "task")))]
pub use colony_task as task;

/// Commonly used names in one import.
#[cfg(feature = "task")]
#[cfg_attr(docsrs, doc(cfg(feature = "task")))]
pub mod prelude {
    pub use colony_act::builder::*;
    pub use colony_act::Act;
    pub use colony_core::{ActError, Blackboard, BbKey, Status, TickContext, WorldMut, WorldView};
    pub use colony_task::{
        Creature, Feasibility, FnTask, SchedulerConfig, Task, TaskCategory, TaskManager,
        TaskPriority,
    };
}
