use std::fmt::Debug;

use colony_core::{ActError, Action, AgentId, Blackboard, ReservationWorld, Status, TickContext};
use colony_tools::{emit, TraceEvent};

use crate::Act;

/// Holds a reservation on `resource` for as long as the inner act runs.
///
/// The reservation is taken on the first tick of every run and released exactly once: when the
/// inner act finishes, or when the guard is cancelled. Reserving a resource that another agent
/// holds is a programming error; guard the subtree with a `Domain` on availability first.
pub struct ReserveGuard<K, W>
where
    K: Ord + Debug + Clone + 'static,
    W: ReservationWorld<K> + 'static,
{
    resource: K,
    inner: Box<Act<W>>,
    held: Option<W::Agent>,
}

impl<K, W> ReserveGuard<K, W>
where
    K: Ord + Debug + Clone + 'static,
    W: ReservationWorld<K> + 'static,
{
    pub fn new(resource: K, inner: Act<W>) -> Self {
        Self {
            resource,
            inner: Box::new(inner),
            held: None,
        }
    }

    pub fn resource(&self) -> &K {
        &self.resource
    }

    /// Whether the guard currently holds its reservation.
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    fn release(
        &mut self,
        ctx: &TickContext,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<(), ActError> {
        let Some(agent) = self.held.take() else {
            return Ok(());
        };
        world.reservations_mut().release(&self.resource, agent)?;
        tracing::debug!(resource = ?self.resource, agent = agent.stable_id(), "released");
        emit(
            blackboard,
            TraceEvent::new(ctx.tick, "reserve.release")
                .for_agent(agent.stable_id())
                .with_detail(format!("{:?}", self.resource)),
        );
        Ok(())
    }
}

impl<K, W> Action<W> for ReserveGuard<K, W>
where
    K: Ord + Debug + Clone + 'static,
    W: ReservationWorld<K> + 'static,
{
    fn initialize(&mut self) {
        self.inner.initialize();
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if self.held.is_none() {
            world
                .reservations_mut()
                .reserve(self.resource.clone(), agent)?;
            self.held = Some(agent);
            tracing::debug!(resource = ?self.resource, agent = agent.stable_id(), "reserved");
            emit(
                blackboard,
                TraceEvent::new(ctx.tick, "reserve.acquire")
                    .for_agent(agent.stable_id())
                    .with_detail(format!("{:?}", self.resource)),
            );
        }

        let status = match self.inner.step(ctx, agent, world, blackboard) {
            Ok(status) => status,
            Err(err) => {
                self.release(ctx, world, blackboard)?;
                return Err(err);
            }
        };
        if status.is_terminal() {
            self.release(ctx, world, blackboard)?;
        }
        Ok(status)
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        self.inner.cancel(ctx, agent, world, blackboard);
        if let Err(err) = self.release(ctx, world, blackboard) {
            tracing::warn!(resource = ?self.resource, %err, "release on cancel failed");
        }
    }
}
