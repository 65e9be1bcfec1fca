//! Composite nodes: [`Sequence`], [`Select`] and [`Parallel`].
//!
//! Children are initialized by the composite right before it first steps them, never earlier.
//! A child that was never entered therefore never sees `initialize`.

use colony_core::{ActError, Blackboard, Status, TickContext, WorldMut};

use crate::Act;

/// Runs children left to right until one fails.
///
/// - `Fail` from a child fails the sequence immediately; later children are not started.
/// - `Running` suspends the sequence; the same child is stepped again next call.
/// - `Success` advances to the next child within the same step.
///
/// An empty sequence succeeds.
pub struct Sequence<W>
where
    W: WorldMut + 'static,
{
    children: Vec<Act<W>>,
    index: usize,
    entered: bool,
}

impl<W> Sequence<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<Act<W>>) -> Self {
        Self {
            children,
            index: 0,
            entered: false,
        }
    }

    pub fn children(&self) -> &[Act<W>] {
        &self.children
    }

    /// Index of the child currently being run.
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub(crate) fn initialize(&mut self) {
        self.index = 0;
        self.entered = false;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        while let Some(child) = self.children.get_mut(self.index) {
            if !self.entered {
                child.initialize();
                self.entered = true;
            }
            match child.step(ctx, agent, world, blackboard)? {
                Status::Running => return Ok(Status::Running),
                Status::Fail => return Ok(Status::Fail),
                Status::Success => {
                    self.index += 1;
                    self.entered = false;
                }
            }
        }
        Ok(Status::Success)
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.cancel(ctx, agent, world, blackboard);
        }
    }
}

/// Runs children left to right until one succeeds: "try A, otherwise B, otherwise give up".
///
/// An empty select fails.
pub struct Select<W>
where
    W: WorldMut + 'static,
{
    children: Vec<Act<W>>,
    index: usize,
    entered: bool,
}

impl<W> Select<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<Act<W>>) -> Self {
        Self {
            children,
            index: 0,
            entered: false,
        }
    }

    pub fn children(&self) -> &[Act<W>] {
        &self.children
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub(crate) fn initialize(&mut self) {
        self.index = 0;
        self.entered = false;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        while let Some(child) = self.children.get_mut(self.index) {
            if !self.entered {
                child.initialize();
                self.entered = true;
            }
            match child.step(ctx, agent, world, blackboard)? {
                Status::Running => return Ok(Status::Running),
                Status::Success => return Ok(Status::Success),
                Status::Fail => {
                    self.index += 1;
                    self.entered = false;
                }
            }
        }
        Ok(Status::Fail)
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(child) = self.children.get_mut(self.index) {
            child.cancel(ctx, agent, world, blackboard);
        }
    }
}

/// How a [`Parallel`] turns its children's results into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelPolicy {
    /// Succeed when every child has succeeded; fail as soon as one fails.
    #[default]
    AllSucceed,
    /// Succeed as soon as one child succeeds; fail when every child has failed.
    AnySucceed,
}

/// Steps every unfinished child once per tick.
///
/// Finished children are skipped on later ticks but their result is kept for the policy. When
/// the policy decides the outcome, children not yet stepped this tick are left alone and every
/// child still running is cancelled.
pub struct Parallel<W>
where
    W: WorldMut + 'static,
{
    children: Vec<Act<W>>,
    policy: ParallelPolicy,
    results: Vec<Option<Status>>,
    started: bool,
}

impl<W> Parallel<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<Act<W>>, policy: ParallelPolicy) -> Self {
        let results = vec![None; children.len()];
        Self {
            children,
            policy,
            results,
            started: false,
        }
    }

    pub fn policy(&self) -> ParallelPolicy {
        self.policy
    }

    pub fn children(&self) -> &[Act<W>] {
        &self.children
    }

    pub(crate) fn initialize(&mut self) {
        self.started = false;
        self.results.iter_mut().for_each(|r| *r = None);
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if !self.started {
            self.children.iter_mut().for_each(Act::initialize);
            self.started = true;
        }

        for i in 0..self.children.len() {
            if self.results[i].is_some() {
                continue;
            }
            let status = self.children[i].step(ctx, agent, world, blackboard)?;
            if status.is_running() {
                continue;
            }
            self.results[i] = Some(status);

            let decided = match (self.policy, status) {
                (ParallelPolicy::AllSucceed, Status::Fail) => Some(Status::Fail),
                (ParallelPolicy::AnySucceed, Status::Success) => Some(Status::Success),
                _ => None,
            };
            if let Some(outcome) = decided {
                self.cancel(ctx, agent, world, blackboard);
                return Ok(outcome);
            }
        }

        if self.results.iter().any(Option::is_none) {
            return Ok(Status::Running);
        }
        Ok(match self.policy {
            ParallelPolicy::AllSucceed => Status::Success,
            ParallelPolicy::AnySucceed => Status::Fail,
        })
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        for (child, result) in self.children.iter_mut().zip(&self.results) {
            if result.is_none() {
                child.cancel(ctx, agent, world, blackboard);
            }
        }
    }
}
