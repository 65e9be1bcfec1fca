use std::collections::BTreeSet;

use colony_act::builder::{fail, fail_with, parallel, reserved, sequence, succeed, wait, wrap};
use colony_act::Act;
use colony_core::{
    ActError, Action, BbKey, Blackboard, ReservationTable, ReservationWorld, Status, TickContext,
    WorldMut, WorldView, FAILURE_REASON,
};
use colony_task::{
    Creature, DiscardReason, FnTask, SchedulerConfig, TaskCategory, TaskError, TaskEvent,
    TaskManager, TaskState,
};
use colony_tools::TRACE_LOG;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Station {
    Anvil,
}

#[derive(Debug, Default)]
struct Camp {
    hooks: Vec<&'static str>,
    stations: ReservationTable<Station, u64>,
    gone: BTreeSet<u64>,
    paces: u32,
    idle_cancels: u32,
}

impl WorldView for Camp {
    type Agent = u64;

    fn agent_exists(&self, agent: u64) -> bool {
        !self.gone.contains(&agent)
    }
}

impl WorldMut for Camp {}

impl ReservationWorld<Station> for Camp {
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

fn task(script: fn() -> Act<Camp>) -> FnTask<Camp> {
    FnTask::new("chore", TaskCategory::HAUL, move |_, _, _| Some(script()))
        .on_enqueued(|world: &mut Camp| world.hooks.push("enqueued"))
        .on_dequeued(|world: &mut Camp| world.hooks.push("dequeued"))
}

fn one_hauler(config: SchedulerConfig) -> TaskManager<Camp> {
    let mut manager = TaskManager::new(config);
    manager.add_creature(Creature::new(1, TaskCategory::HAUL));
    manager
}

#[test]
fn success_completes_task_and_runs_hooks_once() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(|| wait(1)));

    let first = manager.tick(&ctx(0), &mut world);
    assert_eq!(first.assignments.len(), 1);
    assert!(first.events.is_empty());
    assert_eq!(manager.task_state(id), Some(TaskState::Running(1)));

    let second = manager.tick(&ctx(1), &mut world);
    assert_eq!(second.events, vec![TaskEvent::Completed { task: id, agent: 1 }]);
    assert!(!manager.contains(id));
    assert_eq!(world.hooks, vec!["enqueued", "dequeued"]);
    assert!(manager.creature(1).unwrap().is_idle());
}

#[test]
fn failed_attempt_is_retried_when_task_allows() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig {
        max_retries: None,
        ..Default::default()
    });
    let id = manager.enqueue(&mut world, task(fail).always_retry());

    let report = manager.tick(&ctx(0), &mut world);
    assert_eq!(
        report.events,
        vec![TaskEvent::Retried {
            task: id,
            agent: 1,
            failures: 1
        }]
    );
    assert_eq!(manager.task_state(id), Some(TaskState::Pending));

    let report = manager.tick(&ctx(1), &mut world);
    assert_eq!(report.assignments.len(), 1);
    assert_eq!(manager.failures(id), Some(2));
    assert_eq!(world.hooks, vec!["enqueued"]);
}

#[test]
fn failed_attempt_is_discarded_without_retry() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(fail));

    let report = manager.tick(&ctx(0), &mut world);
    assert_eq!(
        report.events,
        vec![TaskEvent::Discarded {
            task: id,
            agent: Some(1),
            reason: DiscardReason::NoRetry
        }]
    );
    assert!(!manager.contains(id));
    assert_eq!(world.hooks, vec!["enqueued", "dequeued"]);
}

#[test]
fn should_delete_overrides_retry() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(fail).always_retry().with_delete(|_| true));

    let report = manager.tick(&ctx(0), &mut world);
    assert!(matches!(
        report.events.as_slice(),
        [TaskEvent::Discarded {
            reason: DiscardReason::Deleted,
            ..
        }]
    ));
    assert!(!manager.contains(id));
}

#[test]
fn retry_cap_discards_after_too_many_failures() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig {
        max_retries: Some(2),
        ..Default::default()
    });
    let id = manager.enqueue(&mut world, task(fail).always_retry());

    let reasons: Vec<_> = (0..3)
        .flat_map(|t| manager.tick(&ctx(t), &mut world).events)
        .collect();
    assert_eq!(
        reasons,
        vec![
            TaskEvent::Retried {
                task: id,
                agent: 1,
                failures: 1
            },
            TaskEvent::Retried {
                task: id,
                agent: 1,
                failures: 2
            },
            TaskEvent::Discarded {
                task: id,
                agent: Some(1),
                reason: DiscardReason::RetryLimit
            },
        ]
    );
}

fn smith() -> Act<Camp> {
    reserved("use anvil", Station::Anvil, wait(10))
}

#[test]
fn cancel_stops_script_and_releases_reservations() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(smith));

    manager.tick(&ctx(0), &mut world);
    assert_eq!(world.stations.reserved_by(&Station::Anvil), Some(1));

    let event = manager.cancel(&ctx(1), &mut world, id).unwrap();
    assert_eq!(
        event,
        TaskEvent::Cancelled {
            task: id,
            agent: Some(1)
        }
    );
    assert!(world.stations.is_empty());
    assert!(manager.creature(1).unwrap().is_idle());
    assert_eq!(world.hooks, vec!["enqueued", "dequeued"]);

    assert_eq!(
        manager.cancel(&ctx(2), &mut world, id),
        Err(TaskError::UnknownTask(id))
    );
}

#[test]
fn unassign_returns_task_to_pool_without_counting_failure() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(smith));
    manager.tick(&ctx(0), &mut world);

    let event = manager.unassign(&ctx(1), &mut world, 1).unwrap();
    assert_eq!(event, Some(TaskEvent::Unassigned { task: id, agent: 1 }));
    assert_eq!(manager.task_state(id), Some(TaskState::Pending));
    assert_eq!(manager.failures(id), Some(0));
    assert!(world.stations.is_empty());
    assert_eq!(world.hooks, vec!["enqueued"]);

    // Idle agents have nothing to give back.
    assert_eq!(manager.unassign(&ctx(2), &mut world, 1), Ok(None));
    assert_eq!(
        manager.unassign(&ctx(2), &mut world, 9),
        Err(TaskError::UnknownAgent(9))
    );
}

#[test]
fn vanished_agent_gives_its_task_back() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    manager.add_creature(Creature::new(2, TaskCategory::HAUL));
    let id = manager.enqueue(&mut world, task(smith));
    manager.tick(&ctx(0), &mut world);
    assert_eq!(manager.task_state(id), Some(TaskState::Running(1)));

    world.gone.insert(1);
    let report = manager.tick(&ctx(1), &mut world);
    assert_eq!(report.events, vec![TaskEvent::Unassigned { task: id, agent: 1 }]);
    assert!(world.stations.is_empty());

    let report = manager.tick(&ctx(2), &mut world);
    assert_eq!(report.assignments.len(), 1);
    assert_eq!(manager.task_state(id), Some(TaskState::Running(2)));
}

const ORE: BbKey<u32> = BbKey::new("ore");

fn needs_ore() -> Act<Camp> {
    wrap("smelt", || {
        |_ctx: &TickContext,
         _agent: u64,
         _world: &mut Camp,
         bb: &mut Blackboard|
         -> Result<Status, ActError> {
            let ore = *bb.require(ORE)?;
            Ok(Status::from_bool(ore > 0))
        }
    })
}

#[test]
fn script_error_discards_task() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(needs_ore).always_retry());

    let report = manager.tick(&ctx(0), &mut world);
    assert!(matches!(
        report.events.as_slice(),
        [TaskEvent::Errored { task, agent: 1, .. }] if *task == id
    ));
    assert!(!manager.contains(id));
    let failure = manager.creature(1).unwrap().last_failure().unwrap();
    assert!(failure.contains("ore"), "{failure}");
}

fn cold_forge() -> Act<Camp> {
    wrap("stoke", || {
        |_: &TickContext, _: u64, _: &mut Camp, _: &mut Blackboard| {
            Err(ActError::invalid("stoke", "forge is cold"))
        }
    })
}

fn smith_with_cold_forge() -> Act<Camp> {
    sequence(
        "smith",
        vec![
            succeed(),
            parallel(
                "work",
                vec![reserved("use anvil", Station::Anvil, wait(10)), cold_forge()],
            ),
        ],
    )
}

#[test]
fn script_error_releases_reservations_of_running_siblings() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let id = manager.enqueue(&mut world, task(smith_with_cold_forge));

    let report = manager.tick(&ctx(0), &mut world);
    assert!(matches!(
        report.events.as_slice(),
        [TaskEvent::Errored { task, agent: 1, .. }] if *task == id
    ));
    assert_eq!(world.stations.reserved_by(&Station::Anvil), None);
    assert!(world.stations.is_empty());
    assert!(manager.creature(1).unwrap().is_idle());
}

#[test]
fn failure_reason_is_recorded_on_creature() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    manager.enqueue(&mut world, task(|| fail_with("no ore in reach")));
    manager.tick(&ctx(0), &mut world);

    let creature = manager.creature(1).unwrap();
    assert_eq!(creature.last_failure(), Some("no ore in reach"));
    assert!(!creature.blackboard().contains(FAILURE_REASON));
}

/// Paces around forever; counts cancellations in the world.
struct Pace;

impl Action<Camp> for Pace {
    fn tick(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut Camp,
        _blackboard: &mut Blackboard,
    ) -> Result<Status, ActError> {
        world.paces += 1;
        Ok(Status::Running)
    }

    fn cancel(
        &mut self,
        _ctx: &TickContext,
        _agent: u64,
        world: &mut Camp,
        _blackboard: &mut Blackboard,
    ) {
        world.idle_cancels += 1;
    }
}

#[test]
fn idle_behaviour_runs_between_tasks_and_yields_to_work() {
    let mut world = Camp::default();
    let mut manager: TaskManager<Camp> = TaskManager::default();
    manager.add_creature(Creature::new(1, TaskCategory::HAUL).with_idle(Act::leaf("pace", Pace)));

    manager.tick(&ctx(0), &mut world);
    manager.tick(&ctx(1), &mut world);
    assert_eq!(world.paces, 2);

    let id = manager.enqueue(&mut world, task(|| wait(1)));
    manager.tick(&ctx(2), &mut world);
    assert_eq!(world.idle_cancels, 1);
    assert_eq!(world.paces, 2);
    assert_eq!(manager.task_state(id), Some(TaskState::Running(1)));

    manager.tick(&ctx(3), &mut world);
    assert!(!manager.contains(id));
    manager.tick(&ctx(4), &mut world);
    assert_eq!(world.paces, 3);
}

#[test]
fn trace_records_task_lifecycle_on_blackboard() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig {
        trace: true,
        ..Default::default()
    });
    manager.enqueue(&mut world, task(succeed));
    manager.tick(&ctx(0), &mut world);

    let log = manager.creature(1).unwrap().blackboard().get(TRACE_LOG).unwrap();
    assert_eq!(log.tags(), vec!["task.assign", "task.complete"]);
    assert_eq!(log.events[0].task, Some(1));
}

#[test]
fn manual_assignment_checks_agent_and_task() {
    let mut world = Camp::default();
    let mut manager = one_hauler(SchedulerConfig::default());
    let first = manager.enqueue(&mut world, task(smith));
    let second = manager.enqueue(&mut world, task(|| wait(3)));

    let assignment = manager.assign_to(&ctx(0), &mut world, second, 1).unwrap();
    assert_eq!(assignment.task, second);

    assert_eq!(
        manager.assign_to(&ctx(0), &mut world, first, 1),
        Err(TaskError::AgentBusy {
            agent: 1,
            task: second
        })
    );
    assert_eq!(
        manager.assign_to(&ctx(0), &mut world, second, 1),
        Err(TaskError::NotPending {
            task: second,
            agent: 1
        })
    );
    assert!(matches!(
        manager.assign_to(&ctx(0), &mut world, first, 7),
        Err(TaskError::UnknownAgent(7))
    ));
}
