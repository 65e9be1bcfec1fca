//! Task pool and the assignment pass that hands pending tasks to idle creatures.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use colony_core::{AgentId, Status, TickContext, WorldMut};
use colony_tools::{emit, install_log, TraceEvent};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Creature, CreatureStep, SchedulerConfig, Task, TaskError, TaskId, TaskPriority};

/// Where a task is in its lifecycle. Finished tasks leave the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskState<A> {
    Pending,
    /// Script handed to the agent, not stepped yet.
    Assigned(A),
    Running(A),
}

impl<A: Copy> TaskState<A> {
    pub fn agent(self) -> Option<A> {
        match self {
            TaskState::Pending => None,
            TaskState::Assigned(agent) | TaskState::Running(agent) => Some(agent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment<A> {
    pub task: TaskId,
    pub agent: A,
    pub cost: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiscardReason {
    /// The task asked to be deleted after a failure.
    Deleted,
    /// The task declined to retry a failed attempt.
    NoRetry,
    /// Failed more often than `max_retries` allows.
    RetryLimit,
}

/// Something that happened to a task while creatures were stepped.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TaskEvent<A> {
    Completed {
        task: TaskId,
        agent: A,
    },
    /// Back in the pending pool after a failed attempt.
    Retried {
        task: TaskId,
        agent: A,
        failures: u32,
    },
    Discarded {
        task: TaskId,
        agent: Option<A>,
        reason: DiscardReason,
    },
    Cancelled {
        task: TaskId,
        agent: Option<A>,
    },
    /// Returned to the pool without counting as a failure.
    Unassigned {
        task: TaskId,
        agent: A,
    },
    Errored {
        task: TaskId,
        agent: A,
        error: String,
    },
}

impl<A> TaskEvent<A> {
    pub fn task(&self) -> TaskId {
        match self {
            TaskEvent::Completed { task, .. }
            | TaskEvent::Retried { task, .. }
            | TaskEvent::Discarded { task, .. }
            | TaskEvent::Cancelled { task, .. }
            | TaskEvent::Unassigned { task, .. }
            | TaskEvent::Errored { task, .. } => *task,
        }
    }
}

/// Everything one [`TaskManager::tick`] did.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TickReport<A> {
    pub tick: u64,
    /// Pending tasks dropped because their goal was already met.
    pub pruned: Vec<TaskId>,
    pub assignments: Vec<Assignment<A>>,
    pub events: Vec<TaskEvent<A>>,
}

impl<A> TickReport<A> {
    pub fn summary(&self) -> String {
        format!(
            "Tick: {}, Pruned: {}, Assigned: {}, Events: {}",
            self.tick,
            self.pruned.len(),
            self.assignments.len(),
            self.events.len()
        )
    }
}

struct Entry<W>
where
    W: WorldMut + 'static,
{
    task: Box<dyn Task<W>>,
    state: TaskState<W::Agent>,
    failures: u32,
}

/// Owns the task pool and the creatures that work it.
///
/// A task is held by at most one creature at a time and a creature holds at most one task.
/// Everything is iterated in id order, so runs are deterministic.
pub struct TaskManager<W>
where
    W: WorldMut + 'static,
{
    config: SchedulerConfig,
    next_id: u64,
    tasks: BTreeMap<TaskId, Entry<W>>,
    creatures: BTreeMap<W::Agent, Creature<W>>,
}

impl<W> Default for TaskManager<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl<W> TaskManager<W>
where
    W: WorldMut + 'static,
{
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            next_id: 1,
            tasks: BTreeMap::new(),
            creatures: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Register a creature, replacing any previous one with the same agent id.
    pub fn add_creature(&mut self, mut creature: Creature<W>) -> Option<Creature<W>> {
        if self.config.trace {
            install_log(creature.blackboard_mut());
        }
        tracing::debug!(
            agent = creature.agent().stable_id(),
            categories = ?creature.categories(),
            "creature added"
        );
        self.creatures.insert(creature.agent(), creature)
    }

    /// Remove a creature, returning its task (if any) to the pending pool first.
    pub fn remove_creature(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        agent: W::Agent,
    ) -> Option<Creature<W>> {
        if let Err(err) = self.unassign(ctx, world, agent) {
            tracing::debug!(%err, "remove_creature");
        }
        self.creatures.remove(&agent)
    }

    pub fn creature(&self, agent: W::Agent) -> Option<&Creature<W>> {
        self.creatures.get(&agent)
    }

    pub fn creature_mut(&mut self, agent: W::Agent) -> Option<&mut Creature<W>> {
        self.creatures.get_mut(&agent)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature<W>> + '_ {
        self.creatures.values()
    }

    pub fn enqueue(&mut self, world: &mut W, task: impl Task<W>) -> TaskId {
        self.enqueue_boxed(world, Box::new(task))
    }

    pub fn enqueue_boxed(&mut self, world: &mut W, mut task: Box<dyn Task<W>>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        task.on_enqueued(world);
        tracing::debug!(
            %id,
            name = task.name(),
            category = ?task.category(),
            priority = ?task.priority(),
            "task enqueued"
        );
        self.tasks.insert(
            id,
            Entry {
                task,
                state: TaskState::Pending,
                failures: 0,
            },
        );
        id
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&dyn Task<W>> {
        self.tasks.get(&id).map(|entry| entry.task.as_ref())
    }

    pub fn task_state(&self, id: TaskId) -> Option<TaskState<W::Agent>> {
        self.tasks.get(&id).map(|entry| entry.state)
    }

    /// Failed attempts so far.
    pub fn failures(&self, id: TaskId) -> Option<u32> {
        self.tasks.get(&id).map(|entry| entry.failures)
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn pending(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks
            .iter()
            .filter(|(_, entry)| entry.state == TaskState::Pending)
            .map(|(id, _)| *id)
    }

    /// Drop pending tasks whose goal is already met.
    pub fn prune_complete(&mut self, world: &mut W) -> Vec<TaskId> {
        let view: &W = world;
        let done: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|(_, entry)| entry.state == TaskState::Pending && entry.task.is_complete(view))
            .map(|(id, _)| *id)
            .collect();
        for id in &done {
            tracing::debug!(%id, "task already complete");
            self.dequeue(world, *id);
        }
        done
    }

    /// Force a task out of the manager, cancelling its script if a creature is running it.
    pub fn cancel(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        id: TaskId,
    ) -> Result<TaskEvent<W::Agent>, TaskError> {
        let state = self
            .tasks
            .get(&id)
            .map(|entry| entry.state)
            .ok_or(TaskError::UnknownTask(id))?;
        let agent = state.agent();
        if let Some(creature) = agent.and_then(|a| self.creatures.get_mut(&a)) {
            creature.cancel_task(ctx, world);
            let agent_id = creature.agent().stable_id();
            emit(
                creature.blackboard_mut(),
                TraceEvent::new(ctx.tick, "task.cancel")
                    .for_agent(agent_id)
                    .for_task(id.0),
            );
        }
        self.dequeue(world, id);
        tracing::info!(%id, agent = ?agent, "task cancelled");
        Ok(TaskEvent::Cancelled { task: id, agent })
    }

    /// Take `agent`'s task away and return it to the pool. Not counted as a failure.
    pub fn unassign(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        agent: W::Agent,
    ) -> Result<Option<TaskEvent<W::Agent>>, TaskError> {
        let creature = self
            .creatures
            .get_mut(&agent)
            .ok_or(TaskError::UnknownAgent(agent.stable_id()))?;
        let Some(task) = creature.cancel_task(ctx, world) else {
            return Ok(None);
        };
        if let Some(entry) = self.tasks.get_mut(&task) {
            entry.state = TaskState::Pending;
        }
        tracing::info!(%task, agent = agent.stable_id(), "task unassigned");
        Ok(Some(TaskEvent::Unassigned { task, agent }))
    }

    /// Hand a specific pending task to a specific idle creature, bypassing cost ranking.
    ///
    /// The creature must accept the category and the task must be feasible and produce a script.
    pub fn assign_to(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        id: TaskId,
        agent: W::Agent,
    ) -> Result<Assignment<W::Agent>, TaskError> {
        let entry = self.tasks.get_mut(&id).ok_or(TaskError::UnknownTask(id))?;
        if let Some(holder) = entry.state.agent() {
            return Err(TaskError::NotPending {
                task: id,
                agent: holder.stable_id(),
            });
        }
        let creature = self
            .creatures
            .get_mut(&agent)
            .ok_or(TaskError::UnknownAgent(agent.stable_id()))?;
        if let Some(task) = creature.current_task() {
            return Err(TaskError::AgentBusy {
                agent: agent.stable_id(),
                task,
            });
        }

        let rejected = TaskError::Rejected {
            task: id,
            agent: agent.stable_id(),
        };
        if !creature.categories().accepts(entry.task.category())
            || !entry.task.feasibility(agent, world).is_feasible()
        {
            return Err(rejected);
        }
        let cost = entry.task.cost(agent, world);
        let script = entry.task.create_script(ctx, agent, world).ok_or(rejected)?;

        creature.begin(ctx, world, id, script);
        entry.state = TaskState::Assigned(agent);
        let assignment = Assignment {
            task: id,
            agent,
            cost,
        };
        Self::trace_assignment(ctx, creature, &assignment);
        Ok(assignment)
    }

    /// Run one assignment pass, then step every creature once.
    ///
    /// The pass only runs on ticks selected by [`SchedulerConfig::should_assign`].
    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> TickReport<W::Agent> {
        let (pruned, assignments) = if self.config.should_assign(ctx.tick) {
            (self.prune_complete(world), self.assign_tasks(ctx, world))
        } else {
            (Vec::new(), Vec::new())
        };
        let events = self.step_creatures(ctx, world);

        let report = TickReport {
            tick: ctx.tick,
            pruned,
            assignments,
            events,
        };
        if !report.assignments.is_empty() || !report.events.is_empty() {
            tracing::debug!(summary = %report.summary(), "task manager tick");
        }
        report
    }

    /// Match pending tasks to idle creatures.
    ///
    /// Tasks are visited by descending priority, then ascending id. Each task goes to the
    /// cheapest idle creature that accepts its category and for which it is feasible; cost ties
    /// go to the lower stable id. If the cheapest creature gets no script the next one is
    /// tried. A creature takes at most one task per pass.
    pub fn assign_tasks(&mut self, ctx: &TickContext, world: &mut W) -> Vec<Assignment<W::Agent>> {
        self.prune_complete(world);

        let view: &W = world;
        let mut idle: Vec<W::Agent> = self
            .creatures
            .values()
            .filter(|c| c.is_idle() && view.agent_exists(c.agent()))
            .map(Creature::agent)
            .collect();

        let mut order: Vec<(Reverse<TaskPriority>, TaskId)> = self
            .tasks
            .iter()
            .filter(|(_, entry)| entry.state == TaskState::Pending)
            .map(|(id, entry)| (Reverse(entry.task.priority()), *id))
            .collect();
        order.sort();

        let limit = self.config.max_assignments_per_pass.unwrap_or(usize::MAX);
        let mut assignments = Vec::new();

        for (_, id) in order {
            if idle.is_empty() || assignments.len() >= limit {
                break;
            }
            let Some(entry) = self.tasks.get_mut(&id) else {
                continue;
            };

            let category = entry.task.category();
            let view: &W = world;
            let mut candidates: Vec<(f32, W::Agent)> = idle
                .iter()
                .copied()
                .filter(|agent| {
                    self.creatures
                        .get(agent)
                        .is_some_and(|c| c.categories().accepts(category))
                })
                .filter(|agent| entry.task.feasibility(*agent, view).is_feasible())
                .map(|agent| (entry.task.cost(agent, view), agent))
                .collect();
            candidates.sort_by(|(ca, a), (cb, b)| {
                ca.total_cmp(cb)
                    .then_with(|| a.stable_id().cmp(&b.stable_id()))
            });

            for (cost, agent) in candidates {
                let Some(script) = entry.task.create_script(ctx, agent, world) else {
                    tracing::trace!(%id, agent = agent.stable_id(), "no script for candidate");
                    continue;
                };
                let Some(creature) = self.creatures.get_mut(&agent) else {
                    continue;
                };
                creature.begin(ctx, world, id, script);
                entry.state = TaskState::Assigned(agent);
                idle.retain(|a| *a != agent);

                let assignment = Assignment {
                    task: id,
                    agent,
                    cost,
                };
                tracing::info!(
                    %id,
                    name = entry.task.name(),
                    agent = agent.stable_id(),
                    cost,
                    "task assigned"
                );
                Self::trace_assignment(ctx, creature, &assignment);
                assignments.push(assignment);
                break;
            }
        }

        assignments
    }

    /// Step every creature once, in agent order, and settle finished tasks.
    pub fn step_creatures(&mut self, ctx: &TickContext, world: &mut W) -> Vec<TaskEvent<W::Agent>> {
        let mut events = Vec::new();

        let vanished: Vec<W::Agent> = self
            .creatures
            .values()
            .filter(|c| !c.is_idle() && !world.agent_exists(c.agent()))
            .map(Creature::agent)
            .collect();
        for agent in vanished {
            if let Ok(Some(event)) = self.unassign(ctx, world, agent) {
                events.push(event);
            }
        }

        let mut outcomes: Vec<(W::Agent, Result<CreatureStep, TaskError>)> = Vec::new();
        for creature in self.creatures.values_mut() {
            if world.agent_exists(creature.agent()) {
                outcomes.push((creature.agent(), creature.step(ctx, world)));
            }
        }

        for (agent, outcome) in outcomes {
            match outcome {
                Ok(CreatureStep::Idle) => {}
                Ok(CreatureStep::Running(id)) => {
                    if let Some(entry) = self.tasks.get_mut(&id) {
                        entry.state = TaskState::Running(agent);
                    }
                }
                Ok(CreatureStep::Finished { task, status }) => {
                    events.push(self.settle(ctx, world, task, agent, status));
                }
                Err(TaskError::Script { task, source }) => {
                    tracing::error!(
                        %task,
                        agent = agent.stable_id(),
                        error = %source,
                        "task script error"
                    );
                    self.trace(ctx, agent, "task.error", task);
                    self.dequeue(world, task);
                    events.push(TaskEvent::Errored {
                        task,
                        agent,
                        error: source.to_string(),
                    });
                }
                Err(err) => {
                    tracing::error!(agent = agent.stable_id(), %err, "creature step failed");
                }
            }
        }

        events
    }

    fn settle(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        id: TaskId,
        agent: W::Agent,
        status: Status,
    ) -> TaskEvent<W::Agent> {
        if status.is_success() {
            tracing::info!(%id, agent = agent.stable_id(), "task completed");
            self.trace(ctx, agent, "task.complete", id);
            self.dequeue(world, id);
            return TaskEvent::Completed { task: id, agent };
        }

        self.trace(ctx, agent, "task.fail", id);
        let Some(entry) = self.tasks.get_mut(&id) else {
            return TaskEvent::Discarded {
                task: id,
                agent: Some(agent),
                reason: DiscardReason::Deleted,
            };
        };
        entry.failures += 1;
        let failures = entry.failures;

        let verdict = if entry.task.should_delete(world) {
            Err(DiscardReason::Deleted)
        } else if !entry.task.should_retry(agent, world) {
            Err(DiscardReason::NoRetry)
        } else if self.config.max_retries.is_some_and(|max| failures > max) {
            Err(DiscardReason::RetryLimit)
        } else {
            Ok(())
        };

        match verdict {
            Ok(()) => {
                entry.state = TaskState::Pending;
                tracing::info!(%id, agent = agent.stable_id(), failures, "task failed, will retry");
                TaskEvent::Retried {
                    task: id,
                    agent,
                    failures,
                }
            }
            Err(reason) => {
                tracing::info!(%id, agent = agent.stable_id(), ?reason, "task failed, discarded");
                self.dequeue(world, id);
                TaskEvent::Discarded {
                    task: id,
                    agent: Some(agent),
                    reason,
                }
            }
        }
    }

    fn dequeue(&mut self, world: &mut W, id: TaskId) {
        if let Some(mut entry) = self.tasks.remove(&id) {
            entry.task.on_dequeued(world);
        }
    }

    fn trace(&mut self, ctx: &TickContext, agent: W::Agent, tag: &'static str, id: TaskId) {
        if let Some(creature) = self.creatures.get_mut(&agent) {
            emit(
                creature.blackboard_mut(),
                TraceEvent::new(ctx.tick, tag)
                    .for_agent(agent.stable_id())
                    .for_task(id.0),
            );
        }
    }

    fn trace_assignment(
        ctx: &TickContext,
        creature: &mut Creature<W>,
        assignment: &Assignment<W::Agent>,
    ) {
        emit(
            creature.blackboard_mut(),
            TraceEvent::new(ctx.tick, "task.assign")
                .for_agent(assignment.agent.stable_id())
                .for_task(assignment.task.0),
        );
    }
}
