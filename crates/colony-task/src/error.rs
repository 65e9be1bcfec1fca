use colony_core::ActError;
use thiserror::Error;

use crate::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("agent {agent} is already running {task}")]
    AgentBusy { agent: u64, task: TaskId },

    #[error("unknown agent {0}")]
    UnknownAgent(u64),

    #[error("{task} is already held by agent {agent}")]
    NotPending { task: TaskId, agent: u64 },

    #[error("agent {agent} cannot take {task} right now")]
    Rejected { task: TaskId, agent: u64 },

    #[error("script for {task} failed")]
    Script {
        task: TaskId,
        #[source]
        source: ActError,
    },
}
