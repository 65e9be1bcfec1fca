use std::borrow::Cow;
use std::fmt::Write as _;

use colony_core::{ActError, Action, Blackboard, Status, TickContext, WorldMut, WorldView};

use crate::{Compound, Domain, ForLoop, Parallel, Select, Sequence, WhileLoop, Wrap};

/// Guard predicate evaluated against the world and the agent's blackboard.
pub type Predicate<W> =
    Box<dyn FnMut(&TickContext, <W as WorldView>::Agent, &W, &Blackboard) -> bool>;

/// Lifecycle of a single act node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActState {
    /// Constructed, never initialized.
    Fresh,
    /// Initialized, not stepped yet.
    Ready,
    Running,
    Succeeded,
    Failed,
    /// Abandoned by an ancestor while running.
    Cancelled,
}

impl ActState {
    /// The status a terminated node keeps reporting, if it has terminated.
    pub fn terminal_status(self) -> Option<Status> {
        match self {
            ActState::Succeeded => Some(Status::Success),
            ActState::Failed | ActState::Cancelled => Some(Status::Fail),
            ActState::Fresh | ActState::Ready | ActState::Running => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ActState::Fresh => "fresh",
            ActState::Ready => "ready",
            ActState::Running => "running",
            ActState::Succeeded => "succeeded",
            ActState::Failed => "failed",
            ActState::Cancelled => "cancelled",
        }
    }
}

/// What an act node does when stepped.
pub enum ActKind<W>
where
    W: WorldMut + 'static,
{
    Sequence(Sequence<W>),
    Select(Select<W>),
    Parallel(Parallel<W>),
    Domain(Domain<W>),
    ForLoop(ForLoop<W>),
    WhileLoop(WhileLoop<W>),
    Wrap(Wrap<W>),
    Compound(Compound<W>),
    Leaf(Box<dyn Action<W>>),
}

macro_rules! impl_from_kind {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<W> From<$ty<W>> for ActKind<W>
            where
                W: WorldMut + 'static,
            {
                fn from(value: $ty<W>) -> Self {
                    ActKind::$ty(value)
                }
            }
        )*
    };
}

impl_from_kind!(Sequence, Select, Parallel, Domain, ForLoop, WhileLoop, Wrap, Compound);

impl<W> ActKind<W>
where
    W: WorldMut + 'static,
{
    fn initialize(&mut self) {
        match self {
            ActKind::Sequence(n) => n.initialize(),
            ActKind::Select(n) => n.initialize(),
            ActKind::Parallel(n) => n.initialize(),
            ActKind::Domain(n) => n.initialize(),
            ActKind::ForLoop(n) => n.initialize(),
            ActKind::WhileLoop(n) => n.initialize(),
            ActKind::Wrap(n) => n.initialize(),
            ActKind::Compound(n) => n.initialize(),
            ActKind::Leaf(a) => a.initialize(),
        }
    }

    fn tick(
        &mut self,
        name: &str,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        match self {
            ActKind::Sequence(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::Select(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::Parallel(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::Domain(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::ForLoop(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::WhileLoop(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::Wrap(n) => n.tick(ctx, agent, world, blackboard),
            ActKind::Compound(n) => n.tick(name, ctx, agent, world, blackboard),
            ActKind::Leaf(a) => a.tick(ctx, agent, world, blackboard),
        }
    }

    fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        match self {
            ActKind::Sequence(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::Select(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::Parallel(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::Domain(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::ForLoop(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::WhileLoop(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::Wrap(_) => {}
            ActKind::Compound(n) => n.cancel(ctx, agent, world, blackboard),
            ActKind::Leaf(a) => a.cancel(ctx, agent, world, blackboard),
        }
    }

    fn children(&self) -> Vec<&Act<W>> {
        match self {
            ActKind::Sequence(n) => n.children().iter().collect(),
            ActKind::Select(n) => n.children().iter().collect(),
            ActKind::Parallel(n) => n.children().iter().collect(),
            ActKind::Domain(n) => vec![n.child()],
            ActKind::ForLoop(n) => vec![n.child()],
            ActKind::WhileLoop(n) => vec![n.body()],
            ActKind::Compound(n) => n.tree().into_iter().collect(),
            ActKind::Wrap(_) | ActKind::Leaf(_) => Vec::new(),
        }
    }
}

/// One node of an act tree.
///
/// Parents own their children exclusively; a tree is dropped as a unit. The node tracks its own
/// lifecycle so the protocol holds for every kind:
///
/// - stepping a `Fresh` node initializes it first;
/// - stepping a terminated node returns its terminal status again without touching children
///   (a cancelled node reports `Fail`);
/// - cancelling a node that is not running is a no-op.
pub struct Act<W>
where
    W: WorldMut + 'static,
{
    name: Cow<'static, str>,
    state: ActState,
    kind: ActKind<W>,
}

impl<W> Act<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<Cow<'static, str>>, kind: impl Into<ActKind<W>>) -> Self {
        Self {
            name: name.into(),
            state: ActState::Fresh,
            kind: kind.into(),
        }
    }

    pub fn leaf(name: impl Into<Cow<'static, str>>, action: impl Action<W>) -> Self {
        Self::new(name, ActKind::Leaf(Box::new(action)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ActState {
        self.state
    }

    pub fn kind(&self) -> &ActKind<W> {
        &self.kind
    }

    pub fn is_running(&self) -> bool {
        self.state == ActState::Running
    }

    pub fn is_terminated(&self) -> bool {
        self.state.terminal_status().is_some()
    }

    /// Reset all progress. Children are initialized by their parent when it first enters them.
    pub fn initialize(&mut self) {
        self.state = ActState::Ready;
        self.kind.initialize();
    }

    pub fn step(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        match self.state {
            ActState::Fresh => self.initialize(),
            ActState::Ready | ActState::Running => {}
            terminated => {
                let status = terminated.terminal_status().unwrap_or(Status::Fail);
                tracing::trace!(act = %self.name, ?status, "step after termination");
                return Ok(status);
            }
        }

        let status = match self.kind.tick(&self.name, ctx, agent, world, blackboard) {
            Ok(status) => status,
            Err(err) => {
                // Children entered this step may hold resources; keep the chain cancellable.
                self.state = ActState::Running;
                return Err(err);
            }
        };
        self.state = match status {
            Status::Running => ActState::Running,
            Status::Success => ActState::Succeeded,
            Status::Fail => ActState::Failed,
        };
        Ok(status)
    }

    /// Abandon this node, top-down through the running chain.
    pub fn cancel(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) {
        if self.state != ActState::Running {
            return;
        }
        tracing::trace!(act = %self.name, "cancel");
        self.kind.cancel(ctx, agent, world, blackboard);
        self.state = ActState::Cancelled;
    }

    pub fn children(&self) -> Vec<&Act<W>> {
        self.kind.children()
    }

    /// Indented `name [state]` listing of the tree, for debug overlays and logs.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        let _ = writeln!(
            out,
            "{:indent$}{} [{}]",
            "",
            self.name,
            self.state.label(),
            indent = depth * 2
        );
        for child in self.children() {
            child.describe_into(out, depth + 1);
        }
    }
}

impl<W> std::fmt::Debug for Act<W>
where
    W: WorldMut + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Act")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
