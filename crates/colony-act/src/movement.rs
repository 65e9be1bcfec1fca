//! Movement leaf over an external path planner.

use std::fmt::Debug;

use colony_core::{
    ActError, Action, AgentId, BbKey, Blackboard, Status, TickContext, WorldMut, FAILURE_REASON,
};
use colony_tools::{emit, TraceEvent};

/// Result of polling the planner for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPoll<L> {
    /// Still searching; poll again next tick.
    Pending,
    /// Waypoints from the agent's position to the goal. A leading waypoint equal to the current
    /// location is skipped.
    Ready(Vec<L>),
    /// No path exists.
    Failed,
}

/// Worlds with a (possibly asynchronous) path planner.
pub trait PathWorld: WorldMut {
    type Location: Copy + PartialEq + Debug + 'static;

    fn location(&self, agent: Self::Agent) -> Option<Self::Location>;

    /// Start or poll a path request. Repeated calls with the same goal poll the same request.
    fn request_path(
        &mut self,
        agent: Self::Agent,
        goal: Self::Location,
    ) -> PathPoll<Self::Location>;

    /// Move one waypoint. `false` means the step is blocked.
    fn advance(&mut self, agent: Self::Agent, next: Self::Location) -> bool;

    /// Drop an outstanding request for `agent`.
    fn cancel_path(&mut self, _agent: Self::Agent) {}
}

#[derive(Debug, Clone, Copy)]
enum Goal<L: 'static> {
    Fixed(L),
    Key(BbKey<L>),
}

#[derive(Debug, Clone)]
enum Phase<L> {
    Start,
    Planning,
    Following { path: Vec<L>, next: usize },
}

/// Walks the agent to a location.
///
/// Planning returns Running until the planner answers, following returns Running once per
/// waypoint, and arrival succeeds. A failed plan or a blocked step fails and records a reason
/// under [`FAILURE_REASON`].
#[derive(Debug, Clone)]
pub struct GoTo<L: 'static> {
    goal: Goal<L>,
    phase: Phase<L>,
}

impl<L> GoTo<L>
where
    L: Copy + PartialEq + Debug + 'static,
{
    pub fn to(goal: L) -> Self {
        Self {
            goal: Goal::Fixed(goal),
            phase: Phase::Start,
        }
    }

    /// Read the goal from the blackboard on the first tick. A missing entry is an error.
    pub fn from_blackboard(key: BbKey<L>) -> Self {
        Self {
            goal: Goal::Key(key),
            phase: Phase::Start,
        }
    }

    fn fail<A: AgentId>(
        &mut self,
        ctx: &TickContext,
        agent: A,
        blackboard: &mut Blackboard,
        reason: &'static str,
    ) -> Result<Status, ActError> {
        tracing::debug!(agent = agent.stable_id(), reason, "goto failed");
        blackboard.set(FAILURE_REASON, reason.to_owned());
        emit(
            blackboard,
            TraceEvent::new(ctx.tick, "goto.fail")
                .for_agent(agent.stable_id())
                .with_detail(reason),
        );
        self.phase = Phase::Start;
        Ok(Status::Fail)
    }
}

impl<W, L> Action<W> for GoTo<L>
where
    W: PathWorld<Location = L> + 'static,
    L: Copy + PartialEq + Debug + 'static,
{
    fn initialize(&mut self) {
        self.phase = Phase::Start;
    }

    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        let goal = match self.goal {
            Goal::Fixed(goal) => goal,
            Goal::Key(key) => *blackboard.require(key)?,
        };
        let Some(here) = world.location(agent) else {
            return self.fail(ctx, agent, blackboard, "agent has no location");
        };
        if here == goal {
            return Ok(Status::Success);
        }

        if matches!(self.phase, Phase::Start | Phase::Planning) {
            match world.request_path(agent, goal) {
                PathPoll::Pending => {
                    self.phase = Phase::Planning;
                    return Ok(Status::Running);
                }
                PathPoll::Failed => return self.fail(ctx, agent, blackboard, "no path"),
                PathPoll::Ready(path) => {
                    tracing::trace!(agent = agent.stable_id(), len = path.len(), "path ready");
                    self.phase = Phase::Following { path, next: 0 };
                }
            }
        }

        let Phase::Following { path, next } = &mut self.phase else {
            return Ok(Status::Running);
        };
        while path.get(*next) == Some(&here) {
            *next += 1;
        }
        let Some(&waypoint) = path.get(*next) else {
            return self.fail(ctx, agent, blackboard, "path ended short of goal");
        };
        if !world.advance(agent, waypoint) {
            return self.fail(ctx, agent, blackboard, "path blocked");
        }
        *next += 1;

        if world.location(agent) == Some(goal) {
            Ok(Status::Success)
        } else {
            Ok(Status::Running)
        }
    }

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        agent: W::Agent,
        world: &mut W,
        _blackboard: &mut Blackboard,
    ) {
        if matches!(self.phase, Phase::Planning) {
            world.cancel_path(agent);
        }
        self.phase = Phase::Start;
    }
}
