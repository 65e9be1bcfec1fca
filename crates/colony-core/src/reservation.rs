use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::{AgentId, ReservationError, WorldMut};

/// "Reserved by" bookkeeping for shared world objects (an anvil, a stockpile slot, a build site).
///
/// The engine does no locking of its own. Scripts check [`is_available_for`] before committing
/// and reserve explicitly; the act guard in `colony-act` releases on completion and on cancel.
///
/// [`is_available_for`]: ReservationTable::is_available_for
#[derive(Debug, Clone)]
pub struct ReservationTable<K, A>
where
    K: Ord + Debug,
    A: AgentId,
{
    holders: BTreeMap<K, A>,
}

impl<K, A> Default for ReservationTable<K, A>
where
    K: Ord + Debug,
    A: AgentId,
{
    fn default() -> Self {
        Self {
            holders: BTreeMap::new(),
        }
    }
}

impl<K, A> ReservationTable<K, A>
where
    K: Ord + Debug,
    A: AgentId,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn is_reserved(&self, resource: &K) -> bool {
        self.holders.contains_key(resource)
    }

    pub fn reserved_by(&self, resource: &K) -> Option<A> {
        self.holders.get(resource).copied()
    }

    /// Free, or already held by `agent`.
    pub fn is_available_for(&self, resource: &K, agent: A) -> bool {
        match self.holders.get(resource) {
            None => true,
            Some(holder) => *holder == agent,
        }
    }

    /// Reserve `resource` for `agent`. Re-reserving by the same agent is a no-op.
    pub fn reserve(&mut self, resource: K, agent: A) -> Result<(), ReservationError> {
        match self.holders.get(&resource) {
            Some(holder) if *holder != agent => Err(ReservationError::AlreadyReserved {
                resource: format!("{resource:?}"),
                holder: holder.stable_id(),
            }),
            Some(_) => Ok(()),
            None => {
                self.holders.insert(resource, agent);
                Ok(())
            }
        }
    }

    pub fn release(&mut self, resource: &K, agent: A) -> Result<(), ReservationError> {
        match self.holders.get(resource) {
            Some(holder) if *holder == agent => {
                self.holders.remove(resource);
                Ok(())
            }
            _ => Err(ReservationError::NotHeld {
                resource: format!("{resource:?}"),
                agent: agent.stable_id(),
            }),
        }
    }

    /// Drop every reservation held by `agent`, returning how many were released.
    pub fn release_all(&mut self, agent: A) -> usize {
        let before = self.holders.len();
        self.holders.retain(|_, holder| *holder != agent);
        before - self.holders.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, A)> + '_ {
        self.holders.iter().map(|(k, a)| (k, *a))
    }
}

/// Worlds that keep a reservation table for resources keyed by `K`.
///
/// A world can implement this once per resource kind.
pub trait ReservationWorld<K>: WorldMut
where
    K: Ord + Debug,
{
    fn reservations(&self) -> &ReservationTable<K, Self::Agent>;
    fn reservations_mut(&mut self) -> &mut ReservationTable<K, Self::Agent>;
}
