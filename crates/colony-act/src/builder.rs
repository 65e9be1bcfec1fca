//! Helper functions for assembling act trees.
//!
//! `sequence("haul", vec![go_to(..), wait(..)])` instead of
//! `Act::new("haul", Sequence::new(vec![...]))`.

use std::borrow::Cow;
use std::fmt::Debug;

use colony_core::{
    ActError, Action, BbKey, Blackboard, ReservationWorld, Status, TickContext, WorldMut,
};

use crate::{
    Act, Always, ClearValue, Compound, Condition, Domain, FailWith, ForLoop, GoTo, Parallel,
    ParallelPolicy, PathWorld, ReserveGuard, Select, Sequence, SetValue, Wait, WhileLoop, Wrap,
};

type Name = Cow<'static, str>;

#[inline]
pub fn sequence<W: WorldMut + 'static>(name: impl Into<Name>, children: Vec<Act<W>>) -> Act<W> {
    Act::new(name, Sequence::new(children))
}

#[inline]
pub fn select<W: WorldMut + 'static>(name: impl Into<Name>, children: Vec<Act<W>>) -> Act<W> {
    Act::new(name, Select::new(children))
}

/// Parallel with the default [`ParallelPolicy::AllSucceed`].
#[inline]
pub fn parallel<W: WorldMut + 'static>(name: impl Into<Name>, children: Vec<Act<W>>) -> Act<W> {
    Act::new(name, Parallel::new(children, ParallelPolicy::AllSucceed))
}

#[inline]
pub fn parallel_any<W: WorldMut + 'static>(
    name: impl Into<Name>,
    children: Vec<Act<W>>,
) -> Act<W> {
    Act::new(name, Parallel::new(children, ParallelPolicy::AnySucceed))
}

#[inline]
pub fn domain<W: WorldMut + 'static>(
    name: impl Into<Name>,
    predicate: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
    child: Act<W>,
) -> Act<W> {
    Act::new(name, Domain::new(predicate, child))
}

/// Bounded retry: up to `max_attempts` attempts, first success wins.
#[inline]
pub fn for_loop<W: WorldMut + 'static>(
    name: impl Into<Name>,
    child: Act<W>,
    max_attempts: u32,
) -> Act<W> {
    Act::new(name, ForLoop::retry(child, max_attempts))
}

/// Counted repeat: `times` successful passes, any failure fails.
#[inline]
pub fn repeat<W: WorldMut + 'static>(name: impl Into<Name>, child: Act<W>, times: u32) -> Act<W> {
    Act::new(name, ForLoop::repeat(child, times))
}

#[inline]
pub fn while_loop<W: WorldMut + 'static>(
    name: impl Into<Name>,
    condition: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
    body: Act<W>,
) -> Act<W> {
    Act::new(name, WhileLoop::new(body, condition))
}

#[inline]
pub fn wrap<W, F, S>(name: impl Into<Name>, make: F) -> Act<W>
where
    W: WorldMut + 'static,
    F: FnMut() -> S + 'static,
    S: FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) -> Result<Status, ActError> + 'static,
{
    Act::new(name, Wrap::new(make))
}

/// Compound whose tree is built per agent on first step.
#[inline]
pub fn compound<W: WorldMut + 'static>(
    name: impl Into<Name>,
    factory: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> Option<Act<W>> + 'static,
) -> Act<W> {
    Act::new(name, Compound::deferred(factory))
}

#[inline]
pub fn leaf<W: WorldMut + 'static>(name: impl Into<Name>, action: impl Action<W>) -> Act<W> {
    Act::leaf(name, action)
}

#[inline]
pub fn condition<W: WorldMut + 'static>(
    name: impl Into<Name>,
    predicate: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> bool + 'static,
) -> Act<W> {
    Act::leaf(name, Condition::new(predicate))
}

#[inline]
pub fn succeed<W: WorldMut + 'static>() -> Act<W> {
    Act::leaf("succeed", Always::succeed())
}

#[inline]
pub fn fail<W: WorldMut + 'static>() -> Act<W> {
    Act::leaf("fail", Always::fail())
}

#[inline]
pub fn fail_with<W: WorldMut + 'static>(reason: impl Into<String>) -> Act<W> {
    Act::leaf("fail_with", FailWith::new(reason))
}

#[inline]
pub fn wait<W: WorldMut + 'static>(ticks: u32) -> Act<W> {
    Act::leaf("wait", Wait::new(ticks))
}

#[inline]
pub fn set_value<W: WorldMut + 'static, T: Clone + 'static>(key: BbKey<T>, value: T) -> Act<W> {
    Act::leaf(key.name(), SetValue::new(key, value))
}

#[inline]
pub fn clear_value<W: WorldMut + 'static, T: 'static>(key: BbKey<T>) -> Act<W> {
    Act::leaf(key.name(), ClearValue::new(key))
}

#[inline]
pub fn go_to<W: PathWorld + 'static>(goal: W::Location) -> Act<W> {
    Act::leaf("go_to", GoTo::to(goal))
}

#[inline]
pub fn go_to_key<W: PathWorld + 'static>(key: BbKey<W::Location>) -> Act<W> {
    Act::leaf("go_to", GoTo::from_blackboard(key))
}

/// Run `inner` while holding a reservation on `resource`.
#[inline]
pub fn reserved<K, W>(name: impl Into<Name>, resource: K, inner: Act<W>) -> Act<W>
where
    K: Ord + Debug + Clone + 'static,
    W: ReservationWorld<K> + 'static,
{
    Act::leaf(name, ReserveGuard::new(resource, inner))
}
