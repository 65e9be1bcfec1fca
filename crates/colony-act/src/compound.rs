//! [`Compound`]: a named behaviour that delegates to a private tree.

use colony_core::{ActError, Blackboard, Status, TickContext, WorldMut, WorldView};

use crate::Act;

/// Builds a compound's tree for one agent at its first step.
pub type TreeFactory<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &W, &Blackboard) -> Option<Act<W>>>;

/// Runs after the inner tree has been cancelled.
pub type CancelHook<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &mut W, &mut Blackboard)>;

enum Source<W>
where
    W: WorldMut + 'static,
{
    Static,
    Deferred(TreeFactory<W>),
}

/// Delegates entirely to an internally built tree.
///
/// A static compound owns a prebuilt tree that is re-initialized with the compound. A deferred
/// compound drops its tree on initialize and asks its factory for a new one at the next step, so
/// the tree can depend on the agent, the world and the blackboard. A factory that produces no tree
/// is a programming error ([`ActError::NoTree`]).
pub struct Compound<W>
where
    W: WorldMut + 'static,
{
    source: Source<W>,
    tree: Option<Box<Act<W>>>,
    on_cancel: Option<CancelHook<W>>,
}

impl<W> Compound<W>
where
    W: WorldMut + 'static,
{
    pub fn with_tree(tree: Act<W>) -> Self {
        Self {
            source: Source::Static,
            tree: Some(Box::new(tree)),
            on_cancel: None,
        }
    }

    pub fn deferred(
        factory: impl FnMut(&TickContext, W::Agent, &W, &Blackboard) -> Option<Act<W>> + 'static,
    ) -> Self {
        Self {
            source: Source::Deferred(Box::new(factory)),
            tree: None,
            on_cancel: None,
        }
    }

    /// Hook run after the inner tree is cancelled, typically to release reservations.
    pub fn on_cancel(
        mut self,
        hook: impl FnMut(&TickContext, W::Agent, &mut W, &mut Blackboard) + 'static,
    ) -> Self {
        self.on_cancel = Some(Box::new(hook));
        self
    }

    /// The inner tree, once built.
    pub fn tree(&self) -> Option<&Act<W>> {
        self.tree.as_deref()
    }

    pub(crate) fn initialize(&mut self) {
        match self.source {
            Source::Static => {
                if let Some(tree) = self.tree.as_mut() {
                    tree.initialize();
                }
            }
            Source::Deferred(_) => self.tree = None,
        }
    }

    pub(crate) fn tick(
        &mut self,
        name: &str,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if self.tree.is_none() {
            let Source::Deferred(factory) = &mut self.source else {
                return Err(ActError::NoTree {
                    name: name.to_owned(),
                });
            };
            let mut tree = factory(ctx, agent, &*world, &*blackboard).ok_or_else(|| {
                ActError::NoTree {
                    name: name.to_owned(),
                }
            })?;
            tracing::debug!(compound = name, root = tree.name(), "built compound tree");
            tree.initialize();
            self.tree = Some(Box::new(tree));
        }

        match self.tree.as_mut() {
            Some(tree) => tree.step(ctx, agent, world, blackboard),
            None => Err(ActError::NoTree {
                name: name.to_owned(),
            }),
        }
    }

    pub(crate) fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if let Some(tree) = self.tree.as_mut() {
            tree.cancel(ctx, agent, world, blackboard);
        }
        if let Some(hook) = self.on_cancel.as_mut() {
            hook(ctx, agent, world, blackboard);
        }
    }
}
