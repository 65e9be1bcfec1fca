use std::cell::Cell;
use std::rc::Rc;

use colony_act::builder::{parallel, reserved, sequence, wait, wrap};
use colony_act::{Act, ActState, Compound};
use colony_core::{
    ActError, Blackboard, ReservationError, ReservationTable, ReservationWorld, Status,
    TickContext, WorldMut, WorldView,
};
use colony_tools::{install_log, take_log};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Station {
    Anvil,
}

#[derive(Debug, Default)]
struct Workshop {
    stations: ReservationTable<Station, u64>,
}

impl WorldView for Workshop {
    type Agent = u64;
}

impl WorldMut for Workshop {}

impl ReservationWorld<Station> for Workshop {
    fn reservations(&self) -> &ReservationTable<Station, u64> {
        &self.stations
    }

    fn reservations_mut(&mut self) -> &mut ReservationTable<Station, u64> {
        &mut self.stations
    }
}

fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1)
}

fn smithing() -> Act<Workshop> {
    sequence(
        "smith",
        vec![wait(0), reserved("use anvil", Station::Anvil, wait(5))],
    )
}

#[test]
fn cancel_releases_reservation_exactly_once() {
    let mut world = Workshop::default();
    let mut bb = Blackboard::new();
    install_log(&mut bb);

    let mut root = smithing();
    assert_eq!(root.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(root.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Running));
    assert_eq!(world.stations.reserved_by(&Station::Anvil), Some(1));

    root.cancel(&ctx(2), 1, &mut world, &mut bb);
    assert!(world.stations.is_empty());
    assert_eq!(root.state(), ActState::Cancelled);

    root.cancel(&ctx(3), 1, &mut world, &mut bb);
    let log = take_log(&mut bb);
    assert_eq!(log.tags(), vec!["reserve.acquire", "reserve.release"]);
    assert_eq!(log.events[0].detail.as_deref(), Some("Anvil"));

    // A cancelled node keeps reporting Fail.
    assert_eq!(root.step(&ctx(4), 1, &mut world, &mut bb), Ok(Status::Fail));
}

#[test]
fn completion_releases_reservation() {
    let mut world = Workshop::default();
    let mut bb = Blackboard::new();
    let mut root = reserved("quick", Station::Anvil, wait(1));

    assert_eq!(root.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    assert!(world.stations.is_reserved(&Station::Anvil));
    assert_eq!(root.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Success));
    assert!(world.stations.is_empty());

    // Cancel after termination is a no-op; nothing left to release.
    root.cancel(&ctx(2), 1, &mut world, &mut bb);
    assert!(world.stations.is_empty());
}

#[test]
fn reserving_a_held_resource_is_an_error() {
    let mut world = Workshop::default();
    world.stations.reserve(Station::Anvil, 2).unwrap();
    let mut bb = Blackboard::new();
    let mut root = reserved("contested", Station::Anvil, wait(1));

    let err = root.step(&ctx(0), 1, &mut world, &mut bb).unwrap_err();
    assert_eq!(
        err,
        ActError::Reservation(ReservationError::AlreadyReserved {
            resource: "Anvil".to_owned(),
            holder: 2,
        })
    );
    assert_eq!(world.stations.reserved_by(&Station::Anvil), Some(2));
}

#[test]
fn compound_cancel_hook_runs_after_inner_tree() {
    let hook_calls = Rc::new(Cell::new(0));
    let calls = hook_calls.clone();
    let compound = Compound::with_tree(reserved("hold", Station::Anvil, wait(3))).on_cancel(
        move |_ctx: &TickContext, _agent: u64, world: &mut Workshop, _bb: &mut Blackboard| {
            // The inner guard has already released.
            assert!(world.stations.is_empty());
            calls.set(calls.get() + 1);
        },
    );
    let mut root = Act::new("work", compound);

    let mut world = Workshop::default();
    let mut bb = Blackboard::new();
    assert_eq!(root.step(&ctx(0), 1, &mut world, &mut bb), Ok(Status::Running));
    root.cancel(&ctx(1), 1, &mut world, &mut bb);
    root.cancel(&ctx(2), 1, &mut world, &mut bb);
    assert_eq!(hook_calls.get(), 1);
}

#[test]
fn cancel_before_first_step_is_a_noop() {
    let mut world = Workshop::default();
    let mut bb = Blackboard::new();
    let mut root = smithing();
    root.cancel(&ctx(0), 1, &mut world, &mut bb);
    assert_eq!(root.state(), ActState::Fresh);
    assert_eq!(root.step(&ctx(1), 1, &mut world, &mut bb), Ok(Status::Running));
}

#[test]
fn errored_step_leaves_the_active_chain_cancellable() {
    let mut world = Workshop::default();
    let mut bb = Blackboard::new();
    let mut root: Act<Workshop> = parallel(
        "work",
        vec![
            reserved("use anvil", Station::Anvil, wait(5)),
            wrap("stoke", || {
                |_: &TickContext, _: u64, _: &mut Workshop, _: &mut Blackboard| {
                    Err(ActError::invalid("stoke", "forge is cold"))
                }
            }),
        ],
    );

    assert!(root.step(&ctx(0), 1, &mut world, &mut bb).is_err());
    assert_eq!(root.state(), ActState::Running);
    assert_eq!(world.stations.reserved_by(&Station::Anvil), Some(1));

    root.cancel(&ctx(0), 1, &mut world, &mut bb);
    assert!(world.stations.is_empty());
    assert_eq!(root.state(), ActState::Cancelled);
}
