use colony_act::Act;
use colony_core::{AgentId, Blackboard, Status, TickContext, WorldMut, FAILURE_REASON};

use crate::{TaskCategory, TaskError, TaskId};

/// Outcome of stepping one creature for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatureStep {
    /// No task; the idle behaviour (if any) was stepped.
    Idle,
    Running(TaskId),
    Finished { task: TaskId, status: Status },
}

/// Agent-side runtime: the agent's blackboard, at most one task script, and an optional idle
/// behaviour that fills the gaps between tasks.
pub struct Creature<W>
where
    W: WorldMut + 'static,
{
    agent: W::Agent,
    categories: TaskCategory,
    blackboard: Blackboard,
    current: Option<(TaskId, Act<W>)>,
    idle: Option<Act<W>>,
    last_failure: Option<String>,
}

impl<W> Creature<W>
where
    W: WorldMut + 'static,
{
    pub fn new(agent: W::Agent, categories: TaskCategory) -> Self {
        Self {
            agent,
            categories,
            blackboard: Blackboard::new(),
            current: None,
            idle: None,
            last_failure: None,
        }
    }

    /// Behaviour run whenever the creature has no task (wandering, say). It restarts after it
    /// finishes and is cancelled as soon as a task is assigned.
    pub fn with_idle(mut self, idle: Act<W>) -> Self {
        self.idle = Some(idle);
        self
    }

    pub fn agent(&self) -> W::Agent {
        self.agent
    }

    pub fn categories(&self) -> TaskCategory {
        self.categories
    }

    pub fn set_categories(&mut self, categories: TaskCategory) {
        self.categories = categories;
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.current.as_ref().map(|(task, _)| *task)
    }

    pub fn script(&self) -> Option<&Act<W>> {
        self.current.as_ref().map(|(_, script)| script)
    }

    pub fn idle_behaviour(&self) -> Option<&Act<W>> {
        self.idle.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    /// Why the most recent task script failed.
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub(crate) fn begin(&mut self, ctx: &TickContext, world: &mut W, task: TaskId, script: Act<W>) {
        if let Some(idle) = self.idle.as_mut() {
            idle.cancel(ctx, self.agent, world, &mut self.blackboard);
            idle.initialize();
        }
        self.blackboard.remove(FAILURE_REASON);
        self.current = Some((task, script));
    }

    /// Abandon the current script, cancelling it top-down.
    pub(crate) fn cancel_task(&mut self, ctx: &TickContext, world: &mut W) -> Option<TaskId> {
        let (task, mut script) = self.current.take()?;
        script.cancel(ctx, self.agent, world, &mut self.blackboard);
        tracing::debug!(agent = self.agent.stable_id(), %task, "task script cancelled");
        Some(task)
    }

    pub fn step(&mut self, ctx: &TickContext, world: &mut W) -> Result<CreatureStep, TaskError> {
        let agent = self.agent;
        let Some((task, script)) = self.current.as_mut() else {
            self.step_idle(ctx, world);
            return Ok(CreatureStep::Idle);
        };
        let task = *task;

        match script.step(ctx, agent, world, &mut self.blackboard) {
            Ok(Status::Running) => Ok(CreatureStep::Running(task)),
            Ok(status) => {
                if status.is_fail() {
                    let reason = self
                        .blackboard
                        .remove(FAILURE_REASON)
                        .unwrap_or_else(|| format!("{} failed", script.name()));
                    self.last_failure = Some(reason);
                }
                self.current = None;
                Ok(CreatureStep::Finished { task, status })
            }
            Err(source) => {
                script.cancel(ctx, agent, world, &mut self.blackboard);
                self.last_failure = Some(source.to_string());
                self.current = None;
                Err(TaskError::Script { task, source })
            }
        }
    }

    fn step_idle(&mut self, ctx: &TickContext, world: &mut W) {
        let Some(idle) = self.idle.as_mut() else {
            return;
        };
        if idle.is_terminated() {
            idle.initialize();
        }
        if let Err(err) = idle.step(ctx, self.agent, world, &mut self.blackboard) {
            tracing::warn!(agent = self.agent.stable_id(), %err, "idle behaviour failed");
            idle.cancel(ctx, self.agent, world, &mut self.blackboard);
            idle.initialize();
        }
    }
}

impl<W> std::fmt::Debug for Creature<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Creature")
            .field("agent", &self.agent)
            .field("categories", &self.categories)
            .field("current", &self.current_task())
            .field("last_failure", &self.last_failure)
            .finish_non_exhaustive()
    }
}
