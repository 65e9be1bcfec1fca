//! Single-child nodes: the [`Domain`] guard and the [`ForLoop`] / [`WhileLoop`] loops.

use colony_core::{ActError, Blackboard, Status, TickContext, WorldMut};

use crate::{Act, Predicate};

/// Runs its child only while a predicate holds.
///
/// The predicate is evaluated at the start of every step. When it is false the child is not
/// stepped (and, if it was never entered, never initialized); a running child is cancelled.
pub struct Domain<W>
where
    W: WorldMut + 'static,
{
    predicate: Predicate<W>,
    child: Box<Act<W>>,
    on_false: Status,
    entered: bool,
}

impl<W> Domain<W>
where
    W: WorldMut + 'static,
{
    /// Fails when the predicate is false.
    pub fn new(
        predicate: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
        child: Act<W>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            child: Box::new(child),
            on_false: Status::Fail,
            entered: false,
        }
    }

    /// Succeeds instead of failing when the predicate is false.
    pub fn or_succeed(mut self) -> Self {
        self.on_false = Status::Success;
        self
    }

    pub fn child(&self) -> &Act<W> {
        &self.child
    }

    pub(crate) fn initialize(&mut self) {
        self.entered = false;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if !(self.predicate)(ctx, agent, &*world, &*blackboard) {
            self.child.cancel(ctx, agent, world, blackboard);
            return Ok(self.on_false);
        }
        if !self.entered {
            self.child.initialize();
            self.entered = true;
        }
        self.child.step(ctx, agent, world, blackboard)
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.child.cancel(ctx, agent, world, blackboard);
    }
}

/// Bounded loop over one child.
///
/// With `reset_on_fail` (the default for [`ForLoop::retry`]) this is a bounded retry: a failed
/// attempt re-initializes the child and tries again, the first success ends the loop, and
/// running out of attempts fails it. Without it the loop is a counted repeat: every success
/// re-initializes the child for another pass, any failure ends the loop, and completing
/// `max_iterations` passes succeeds.
///
/// Attempts that finish within one step chain straight into the next attempt.
pub struct ForLoop<W>
where
    W: WorldMut + 'static,
{
    child: Box<Act<W>>,
    max_iterations: u32,
    reset_on_fail: bool,
    iteration: u32,
    entered: bool,
}

impl<W> ForLoop<W>
where
    W: WorldMut + 'static,
{
    pub fn new(child: Act<W>, max_iterations: u32, reset_on_fail: bool) -> Self {
        Self {
            child: Box::new(child),
            max_iterations,
            reset_on_fail,
            iteration: 0,
            entered: false,
        }
    }

    /// Retry a flaky child up to `max_attempts` times.
    pub fn retry(child: Act<W>, max_attempts: u32) -> Self {
        Self::new(child, max_attempts, true)
    }

    /// Run the child `times` times in a row.
    pub fn repeat(child: Act<W>, times: u32) -> Self {
        Self::new(child, times, false)
    }

    pub fn child(&self) -> &Act<W> {
        &self.child
    }

    /// Completed attempts (retry mode) or passes (repeat mode).
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub(crate) fn initialize(&mut self) {
        self.iteration = 0;
        self.entered = false;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        loop {
            if self.iteration >= self.max_iterations {
                return Ok(if self.reset_on_fail {
                    Status::Fail
                } else {
                    Status::Success
                });
            }
            if !self.entered {
                self.child.initialize();
                self.entered = true;
            }

            match self.child.step(ctx, agent, world, blackboard)? {
                Status::Running => return Ok(Status::Running),
                Status::Success if self.reset_on_fail => return Ok(Status::Success),
                Status::Fail if !self.reset_on_fail => return Ok(Status::Fail),
                Status::Success | Status::Fail => {
                    self.iteration += 1;
                    self.entered = false;
                    tracing::trace!(
                        iteration = self.iteration,
                        max = self.max_iterations,
                        "loop iteration finished"
                    );
                }
            }
        }
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.child.cancel(ctx, agent, world, blackboard);
    }
}

/// Repeats a body for as long as a condition holds.
///
/// The condition is checked at the start of every step; once it is false the loop succeeds and
/// a running body is cancelled. A failing body fails the loop. A body that succeeds is
/// re-initialized on the next step, so at most one iteration completes per step.
pub struct WhileLoop<W>
where
    W: WorldMut + 'static,
{
    body: Box<Act<W>>,
    condition: Predicate<W>,
    entered: bool,
    iterations: u64,
}

impl<W> WhileLoop<W>
where
    W: WorldMut + 'static,
{
    pub fn new(
        body: Act<W>,
        condition: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
    ) -> Self {
        Self {
            body: Box::new(body),
            condition: Box::new(condition),
            entered: false,
            iterations: 0,
        }
    }

    pub fn body(&self) -> &Act<W> {
        &self.body
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub(crate) fn initialize(&mut self) {
        self.entered = false;
        self.iterations = 0;
    }

    pub(crate) fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if !(self.condition)(ctx, agent, &*world, &*blackboard) {
            self.body.cancel(ctx, agent, world, blackboard);
            return Ok(Status::Success);
        }
        if !self.entered {
            self.body.initialize();
            self.entered = true;
        }

        match self.body.step(ctx, agent, world, blackboard)? {
            Status::Running => Ok(Status::Running),
            Status::Fail => Ok(Status::Fail),
            Status::Success => {
                self.iterations += 1;
                self.entered = false;
                Ok(Status::Running)
            }
        }
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.body.cancel(ctx, agent, world, blackboard);
    }
}
