use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Kinds of work. A task has exactly one; a creature accepts a set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
    pub struct TaskCategory: u16 {
        const DIG      = 1 << 0;
        const CHOP     = 1 << 1;
        const HARVEST  = 1 << 2;
        const BUILD    = 1 << 3;
        const CRAFT    = 1 << 4;
        const HAUL     = 1 << 5;
        const ATTACK   = 1 << 6;
        const GUARD    = 1 << 7;
        const RESEARCH = 1 << 8;
        const COOK     = 1 << 9;
        const FARM     = 1 << 10;
        const OTHER    = 1 << 11;
    }
}

impl TaskCategory {
    /// Whether a creature with this category mask accepts work of `category`.
    pub fn accepts(self, category: TaskCategory) -> bool {
        !category.is_empty() && self.contains(category)
    }
}

/// How urgently a task should be picked up. Higher sorts first in an assignment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskPriority {
    Eventually,
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Answer to "can this agent do this task right now?".
///
/// Only `Feasible` tasks are assigned. `Unknown` is treated as not yet feasible: the task is
/// skipped for this agent on this pass and asked again on the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Feasibility {
    Feasible,
    Infeasible,
    Unknown,
}

impl Feasibility {
    pub fn is_feasible(self) -> bool {
        matches!(self, Feasibility::Feasible)
    }
}

impl From<bool> for Feasibility {
    fn from(value: bool) -> Self {
        if value {
            Feasibility::Feasible
        } else {
            Feasibility::Infeasible
        }
    }
}
