use crate::{ActError, Blackboard, Status, TickContext, WorldMut};

/// A leaf behaviour: the open-ended half of an act tree.
///
/// Implementations are explicit resumable state machines. Whatever progress a leaf needs to
/// resume next tick lives in its own fields; `initialize` puts those fields back to the starting
/// state.
///
/// `tick` returns `Err` only for programming errors in composed content (a missing required
/// blackboard entry, a double reservation). Ordinary "could not do it" outcomes are
/// `Ok(Status::Fail)`.
pub trait Action<W>: 'static
where
    W: WorldMut + 'static,
{
    /// Reset all progress. Called once before the first tick of every run.
    fn initialize(&mut self) {}

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError>;

    /// Called when an ancestor abandons this leaf while it is running.
    ///
    /// Leaves that reserved something in the world must release it here.
    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: W::Agent,
        _world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
    }
}
