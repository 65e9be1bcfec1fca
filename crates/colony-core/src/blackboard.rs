use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::BlackboardError;

/// Typed handle to a blackboard slot.
///
/// Slots are addressed by `(name, T)`: two keys with the same name but different value types
/// never alias, so a lookup can never observe a value of the wrong type.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BbKey<T: 'static> {
    name: &'static str,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: 'static> Copy for BbKey<T> {}

impl<T: 'static> Clone for BbKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static> BbKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _phantom: PhantomData,
        }
    }

    pub fn name(self) -> &'static str {
        self.name
    }

    fn slot(self) -> (&'static str, TypeId) {
        (self.name, TypeId::of::<T>())
    }
}

/// Reason the last task script failed, written by leaves that know why.
pub const FAILURE_REASON: BbKey<String> = BbKey::new("colony.failure_reason");

/// Per-agent scratch memory shared by the nodes of one act tree.
///
/// A node that computes something (a target cell, a chosen item) writes it here and a sibling
/// stepped later reads it back. Missing entries are an ordinary condition: use [`get`] and
/// handle `None`. [`require`] is for entries whose absence means the tree was composed wrong.
///
/// [`get`]: Blackboard::get
/// [`require`]: Blackboard::require
#[derive(Default)]
pub struct Blackboard {
    values: BTreeMap<(&'static str, TypeId), Box<dyn Any>>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains<T: 'static>(&self, key: BbKey<T>) -> bool {
        self.values.contains_key(&key.slot())
    }

    /// Store `value`, returning the previous value under the same key.
    pub fn set<T: 'static>(&mut self, key: BbKey<T>, value: T) -> Option<T> {
        self.values
            .insert(key.slot(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|b| *b)
    }

    pub fn get<T: 'static>(&self, key: BbKey<T>) -> Option<&T> {
        self.values.get(&key.slot())?.downcast_ref::<T>()
    }

    pub fn get_mut<T: 'static>(&mut self, key: BbKey<T>) -> Option<&mut T> {
        self.values.get_mut(&key.slot())?.downcast_mut::<T>()
    }

    /// Like [`Blackboard::get`], but a missing entry is an error.
    pub fn require<T: 'static>(&self, key: BbKey<T>) -> Result<&T, BlackboardError> {
        self.get(key).ok_or(BlackboardError::Missing {
            key: key.name,
            type_name: std::any::type_name::<T>(),
        })
    }

    pub fn require_mut<T: 'static>(&mut self, key: BbKey<T>) -> Result<&mut T, BlackboardError> {
        self.get_mut(key).ok_or(BlackboardError::Missing {
            key: key.name,
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Returns the entry, or inserts the result of `make` first.
    pub fn get_or_insert_with<T: 'static>(
        &mut self,
        key: BbKey<T>,
        make: impl FnOnce() -> T,
    ) -> &mut T {
        let slot = self
            .values
            .entry(key.slot())
            .or_insert_with(|| Box::new(make()));
        match slot.downcast_mut::<T>() {
            Some(value) => value,
            None => unreachable!("slot type is part of the key"),
        }
    }

    pub fn remove<T: 'static>(&mut self, key: BbKey<T>) -> Option<T> {
        let value = self.values.remove(&key.slot())?;
        value.downcast::<T>().ok().map(|b| *b)
    }

    /// Names of all occupied slots, in key order. Intended for debugging views.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().map(|(name, _)| *name)
    }
}
