use core::fmt::{self, Display};
use std::borrow::Cow;

use colony_act::Act;
use colony_core::{TickContext, WorldMut, WorldView};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Feasibility, TaskCategory, TaskPriority};

/// Identifier handed out by [`TaskManager::enqueue`](crate::TaskManager::enqueue).
///
/// Ids increase monotonically, so ordering by id is ordering by enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TaskId(pub u64);

impl Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// A unit of work the colony wants done.
///
/// The manager asks a task whether an agent can do it and at what cost, then asks it for a
/// script bound to the chosen agent. When the script fails the task decides whether it is worth
/// retrying or should be dropped.
pub trait Task<W>: 'static
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str;

    fn category(&self) -> TaskCategory;

    fn priority(&self) -> TaskPriority {
        TaskPriority::Medium
    }

    /// Re-checked every time the task is considered for an agent.
    fn feasibility(&self, agent: W::Agent, world: &W) -> Feasibility;

    /// Lower is better. Only compared between agents for the same task.
    fn cost(&self, agent: W::Agent, world: &W) -> f32;

    /// Build the script `agent` will run. `None` means the agent cannot start it right now.
    fn create_script(&mut self, ctx: &TickContext, agent: W::Agent, world: &W) -> Option<Act<W>>;

    /// Whether a failed attempt goes back to the pending pool.
    fn should_retry(&self, _agent: W::Agent, _world: &W) -> bool {
        false
    }

    /// Whether the task is obsolete and must be dropped after a failure.
    fn should_delete(&self, _world: &W) -> bool {
        false
    }

    /// Whether the goal is already satisfied. Complete tasks are dropped before assignment.
    fn is_complete(&self, _world: &W) -> bool {
        false
    }

    /// Runs once when the task enters the manager (mark designations).
    fn on_enqueued(&mut self, _world: &mut W) {}

    /// Runs once when the task leaves the manager for any reason (clear designations).
    fn on_dequeued(&mut self, _world: &mut W) {}
}

type AgentFn<W, T> = Box<dyn Fn(<W as WorldView>::Agent, &W) -> T>;
type WorldFn<W, T> = Box<dyn Fn(&W) -> T>;
type ScriptFn<W> = Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &W) -> Option<Act<W>>>;
type HookFn<W> = Box<dyn FnMut(&mut W)>;

/// A [`Task`] assembled from closures.
///
/// Handy for content that does not warrant its own type, and for tests.
pub struct FnTask<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    category: TaskCategory,
    priority: TaskPriority,
    feasibility: AgentFn<W, Feasibility>,
    cost: AgentFn<W, f32>,
    script: ScriptFn<W>,
    retry: AgentFn<W, bool>,
    delete: WorldFn<W, bool>,
    complete: WorldFn<W, bool>,
    enqueued: Option<HookFn<W>>,
    dequeued: Option<HookFn<W>>,
}

impl<W> FnTask<W>
where
    W: WorldMut + 'static,
{
    /// Always feasible, zero cost, never retried.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        category: TaskCategory,
        script: impl FnMut(&TickContext, W::Agent, &W) -> Option<Act<W>> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            priority: TaskPriority::default(),
            feasibility: Box::new(|_, _| Feasibility::Feasible),
            cost: Box::new(|_, _| 0.0),
            script: Box::new(script),
            retry: Box::new(|_, _| false),
            delete: Box::new(|_| false),
            complete: Box::new(|_| false),
            enqueued: None,
            dequeued: None,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_feasibility(mut self, f: impl Fn(W::Agent, &W) -> Feasibility + 'static) -> Self {
        self.feasibility = Box::new(f);
        self
    }

    pub fn with_cost(mut self, f: impl Fn(W::Agent, &W) -> f32 + 'static) -> Self {
        self.cost = Box::new(f);
        self
    }

    pub fn with_retry(mut self, f: impl Fn(W::Agent, &W) -> bool + 'static) -> Self {
        self.retry = Box::new(f);
        self
    }

    /// Retry every failed attempt.
    pub fn always_retry(self) -> Self {
        self.with_retry(|_, _| true)
    }

    pub fn with_delete(mut self, f: impl Fn(&W) -> bool + 'static) -> Self {
        self.delete = Box::new(f);
        self
    }

    pub fn with_complete(mut self, f: impl Fn(&W) -> bool + 'static) -> Self {
        self.complete = Box::new(f);
        self
    }

    pub fn on_enqueued(mut self, f: impl FnMut(&mut W) + 'static) -> Self {
        self.enqueued = Some(Box::new(f));
        self
    }

    pub fn on_dequeued(mut self, f: impl FnMut(&mut W) + 'static) -> Self {
        self.dequeued = Some(Box::new(f));
        self
    }
}

impl<W> Task<W> for FnTask<W>
where
    W: WorldMut + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> TaskCategory {
        self.category
    }

    fn priority(&self) -> TaskPriority {
        self.priority
    }

    fn feasibility(&self, agent: W::Agent, world: &W) -> Feasibility {
        (self.feasibility)(agent, world)
    }

    fn cost(&self, agent: W::Agent, world: &W) -> f32 {
        (self.cost)(agent, world)
    }

    fn create_script(&mut self, ctx: &TickContext, agent: W::Agent, world: &W) -> Option<Act<W>> {
        (self.script)(ctx, agent, world)
    }

    fn should_retry(&self, agent: W::Agent, world: &W) -> bool {
        (self.retry)(agent, world)
    }

    fn should_delete(&self, world: &W) -> bool {
        (self.delete)(world)
    }

    fn is_complete(&self, world: &W) -> bool {
        (self.complete)(world)
    }

    fn on_enqueued(&mut self, world: &mut W) {
        if let Some(hook) = self.enqueued.as_mut() {
            hook(world);
        }
    }

    fn on_dequeued(&mut self, world: &mut W) {
        if let Some(hook) = self.dequeued.as_mut() {
            hook(world);
        }
    }
}
