//! Dig and haul tasks for the demo grid.

use colony::act::builder::{go_to, leaf, reserved, sequence, wait, wrap};
use colony::act::{Act, Compound, PathWorld};
use colony::core::{ActError, Action, BbKey, Blackboard, Status, TickContext, FAILURE_REASON};
use colony::task::{Feasibility, FnTask, TaskCategory, TaskPriority};

use crate::world::{Cell, GridWorld};

/// Ticks spent hacking at a rock face before it breaks.
pub const DIG_TICKS: u32 = 3;

/// Where the stone a creature is carrying was picked up.
const CARRYING: BbKey<Cell> = BbKey::new("demo.carrying");

struct Mine {
    rock: Cell,
}

impl Action<GridWorld> for Mine {
    fn tick(
        &mut self,
        ctx: &TickContext,
        agent: u64,
        world: &mut GridWorld,
        blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        if world.mine(self.rock) {
            tracing::debug!(tick = ctx.tick, agent, rock = ?self.rock, "rock mined");
            Ok(Status::Success)
        } else {
            blackboard.set(FAILURE_REASON, "rock already gone".to_owned());
            Ok(Status::Fail)
        }
    }
}

/// Walk next to `rock`, dig it out and leave a stone behind.
///
/// Only feasible once a neighbouring cell is reachable, so the block is dug from the face
/// inwards. A failed attempt is retried while the rock is still there.
pub fn dig(rock: Cell) -> FnTask<GridWorld> {
    FnTask::<GridWorld>::new(
        "dig",
        TaskCategory::DIG,
        move |_: &TickContext, agent: u64, world: &GridWorld| {
            let stand = *world.dig_spot(agent, rock)?.last()?;
            let work = sequence(
                "dig",
                vec![go_to(stand), wait(DIG_TICKS), leaf("mine", Mine { rock })],
            );
            Some(reserved("dig", rock, work))
        },
    )
    .with_feasibility(move |agent: u64, world: &GridWorld| {
        Feasibility::from(world.dig_spot(agent, rock).is_some())
    })
    .with_cost(move |agent: u64, world: &GridWorld| {
        world
            .dig_spot(agent, rock)
            .map_or(f32::INFINITY, |path| path.len() as f32)
    })
    .with_retry(move |_: u64, world: &GridWorld| world.is_rock(rock))
    .with_complete(move |world: &GridWorld| !world.is_rock(rock))
}

fn pick_up(pile: Cell) -> Act<GridWorld> {
    wrap("pick up", move || {
        move |_: &TickContext, _: u64, world: &mut GridWorld, blackboard: &mut Blackboard| {
            if world.take_stone(pile) {
                blackboard.set(CARRYING, pile);
                Ok(Status::Success)
            } else {
                blackboard.set(FAILURE_REASON, "nothing to pick up".to_owned());
                Ok(Status::Fail)
            }
        }
    })
}

fn put_down() -> Act<GridWorld> {
    wrap("put down", || {
        |_: &TickContext, agent: u64, world: &mut GridWorld, blackboard: &mut Blackboard| {
            let here = world.location(agent);
            match (blackboard.remove(CARRYING), here) {
                (Some(_), Some(here)) => {
                    world.drop_stone(here);
                    Ok(Status::Success)
                }
                _ => Ok(Status::Fail),
            }
        }
    })
}

/// Carry one stone from `pile` to the stockpile. A creature interrupted on the way drops what
/// it carries where it stands.
pub fn haul(pile: Cell) -> FnTask<GridWorld> {
    FnTask::<GridWorld>::new(
        "haul",
        TaskCategory::HAUL,
        move |_: &TickContext, _: u64, world: &GridWorld| {
            let tree = sequence(
                "haul",
                vec![go_to(pile), pick_up(pile), go_to(world.stockpile()), put_down()],
            );
            let compound = Compound::with_tree(tree).on_cancel(
                |_: &TickContext, agent: u64, world: &mut GridWorld, blackboard: &mut Blackboard| {
                    let here = world.location(agent);
                    if let (Some(_), Some(here)) = (blackboard.remove(CARRYING), here) {
                        world.drop_stone(here);
                    }
                },
            );
            Some(Act::new("haul", compound))
        },
    )
    .with_priority(TaskPriority::High)
    .with_feasibility(move |agent: u64, world: &GridWorld| {
        Feasibility::from(world.path_between(agent, pile).is_some())
    })
    .with_cost(move |agent: u64, world: &GridWorld| {
        world
            .path_between(agent, pile)
            .map_or(f32::INFINITY, |path| path.len() as f32)
    })
    .with_retry(move |_: u64, world: &GridWorld| world.stone_at(pile) > 0)
    .with_complete(move |world: &GridWorld| world.stone_at(pile) == 0)
    .on_enqueued(move |world: &mut GridWorld| world.designate_haul(pile))
    .on_dequeued(move |world: &mut GridWorld| world.clear_haul(pile))
}
