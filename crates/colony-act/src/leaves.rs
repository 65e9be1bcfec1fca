//! Small content leaves used to assemble compounds.

use colony_core::{
    ActError, Action, BbKey, Blackboard, Status, TickContext, WorldMut, FAILURE_REASON,
};

use crate::Predicate;

/// Success when the predicate holds, Fail otherwise.
pub struct Condition<W>
where
    W: WorldMut + 'static,
{
    predicate: Predicate<W>,
}

impl<W> Condition<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        predicate: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }
}

impl<W> Action<W> for Condition<W>
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        Ok(Status::from_bool((self.predicate)(
            ctx,
            agent,
            &*world,
            &*blackboard,
        )))
    }
}

/// Always returns the same status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Always(pub Status);

impl Always {
    pub fn succeed() -> Self {
        Always(Status::Success)
    }

    pub fn fail() -> Self {
        Always(Status::Fail)
    }
}

impl<W> Action<W> for Always
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        Ok(self.0)
    }
}

/// Running for `ticks` steps, then Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    ticks: u32,
    elapsed: u32,
}

impl Wait {
    pub fn new(ticks: u32) -> Self {
        Self { ticks, elapsed: 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.ticks.saturating_sub(self.elapsed)
    }
}

impl<W> Action<W> for Wait
where
    W: WorldMut + 'static,
{
    fn initialize(&mut self) {
        self.elapsed = 0;
    }

    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if self.elapsed >= self.ticks {
            return Ok(Status::Success);
        }
        self.elapsed += 1;
        Ok(Status::Running)
    }
}

/// Writes a clone of `value` under `key`, then succeeds.
pub struct SetValue<T>
where
    T: Clone + 'static,
{
    key: BbKey<T>,
    value: T,
}

impl<T> SetValue<T>
where
    T: Clone + 'static,
{
    pub fn new(key: BbKey<T>, value: T) -> Self {
        Self { key, value }
    }
}

impl<W, T> Action<W> for SetValue<T>
where
    W: WorldMut + 'static,
    T: Clone + 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        blackboard.set(self.key, self.value.clone());
        Ok(Status::Success)
    }
}

/// Removes `key` (present or not), then succeeds.
pub struct ClearValue<T: 'static> {
    key: BbKey<T>,
}

impl<T: 'static> ClearValue<T> {
    pub fn new(key: BbKey<T>) -> Self {
        Self { key }
    }
}

impl<W, T> Action<W> for ClearValue<T>
where
    W: WorldMut + 'static,
    T: 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        blackboard.remove(self.key);
        Ok(Status::Success)
    }
}

/// Records a failure reason on the blackboard and fails.
///
/// The creature running the script copies the reason out when the script ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailWith {
    reason: String,
}

impl FailWith {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl<W> Action<W> for FailWith
where
    W: WorldMut + 'static,
{
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        blackboard.set(FAILURE_REASON, self.reason.clone());
        Ok(Status::Fail)
    }
}
