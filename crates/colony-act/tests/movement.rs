use std::collections::{BTreeMap, BTreeSet};

use colony_act::builder::{go_to, go_to_key};
use colony_act::{PathPoll, PathWorld};
use colony_core::{
    ActError, BbKey, Blackboard, Status, TickContext, WorldMut, WorldView, FAILURE_REASON,
};

type Cell = (i32, i32);

/// Straight-line planner along x that takes `think_ticks` polls to answer.
#[derive(Debug, Default)]
struct Corridor {
    positions: BTreeMap<u64, Cell>,
    walls: BTreeSet<Cell>,
    think_ticks: u32,
    polls: BTreeMap<u64, u32>,
    cancelled: Vec<u64>,
}

impl WorldView for Corridor {
    type Agent = u64;
}

impl WorldMut for Corridor {}

impl PathWorld for Corridor {
    type Location = Cell;

    fn location(&self, agent: u64) -> Option<Cell> {
        self.positions.get(&agent).copied()
    }

    fn request_path(&mut self, agent: u64, goal: Cell) -> PathPoll<Cell> {
        let polls = self.polls.entry(agent).or_default();
        if *polls < self.think_ticks {
            *polls += 1;
            return PathPoll::Pending;
        }
        self.polls.remove(&agent);

        let Some(&(x, y)) = self.positions.get(&agent) else {
            return PathPoll::Failed;
        };
        if y != goal.1 {
            return PathPoll::Failed;
        }
        let step = if goal.0 >= x { 1 } else { -1 };
        let mut path = Vec::new();
        let mut cx = x;
        while cx != goal.0 {
            cx += step;
            path.push((cx, y));
        }
        PathPoll::Ready(path)
    }

    fn advance(&mut self, agent: u64, next: Cell) -> bool {
        if self.walls.contains(&next) {
            return false;
        }
        self.positions.insert(agent, next);
        true
    }

    fn cancel_path(&mut self, agent: u64) {
        self.polls.remove(&agent);
        self.cancelled.push(agent);
    }
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1)
}

#[test]
fn walks_one_waypoint_per_step() {
    let mut world = Corridor::default();
    world.positions.insert(1, (0, 0));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((3, 0));

    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(world.positions[&1], (1, 0));
    assert_eq!(walk.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(walk.step(&ctx(2), 1, &mut world, &mut bb), Ok(Status::Success));
    assert_eq!(world.positions[&1], (3, 0));
}

#[test]
fn already_there_succeeds_immediately() {
    let mut world = Corridor::default();
    world.positions.insert(1, (2, 2));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((2, 2));
    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Success));
}

#[test]
fn waits_for_planner_while_pending() {
    let mut world = Corridor {
        think_ticks: 2,
        ..Default::default()
    };
    world.positions.insert(1, (0, 0));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((1, 0));

    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(walk.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(world.positions[&1], (0, 0));
    assert_eq!(walk.step(&ctx(2), 1, &mut world, &mut bb), Ok(Status::Success));
}

#[test]
fn cancel_while_planning_drops_request() {
    let mut world = Corridor {
        think_ticks: 5,
        ..Default::default()
    };
    world.positions.insert(1, (0, 0));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((4, 0));

    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    walk.cancel(&ctx(1), 1, &mut world, &mut bb);
    assert_eq!(world.cancelled, vec![1]);
}

#[test]
fn planner_failure_fails_with_reason() {
    let mut world = Corridor::default();
    world.positions.insert(1, (0, 0));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((3, 3));

    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Fail));
    assert_eq!(bb.get(FAILURE_REASON).map(String::as_str), Some("no path"));
}

#[test]
fn blocked_step_fails() {
    let mut world = Corridor::default();
    world.positions.insert(1, (0, 0));
    world.walls.insert((2, 0));
    let mut bb = Blackboard::new();
    let mut walk = go_to::<Corridor>((4, 0));

    assert_eq!(walk.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(walk.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Fail));
    assert_eq!(world.positions[&1], (1, 0));
    assert_eq!(bb.get(FAILURE_REASON).map(String::as_str), Some("path blocked"));
}

const DESTINATION: BbKey<Cell> = BbKey::new("destination");

#[test]
fn goal_from_blackboard_is_required() {
    let mut world = Corridor::default();
    world.positions.insert(1, (0, 0));
    let mut bb = Blackboard::new();

    let mut walk = go_to_key::<Corridor>(DESTINATION);
    assert!(matches!(
        walk.step(&ctx(0), 1, &mut world, &mut bb),
        Err(ActError::Blackboard(_))
    ));

    bb.set(DESTINATION, (1, 0));
    let mut walk = go_to_key::<Corridor>(DESTINATION);
    assert_eq!(walk.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Success));
}
