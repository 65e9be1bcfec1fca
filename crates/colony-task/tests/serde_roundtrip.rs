#![cfg(feature = "serde")]

use colony_task::{
    Assignment, DiscardReason, TaskCategory, TaskEvent, TaskId, TaskState, TickReport,
};

#[test]
fn task_state_json_roundtrip() {
    for state in [TaskState::Pending, TaskState::Assigned(2u64), TaskState::Running(2)] {
        let json = serde_json::to_string(&state).expect("serialize");
        let roundtrip: TaskState<u64> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(roundtrip, state);
    }
}

#[test]
fn category_json_roundtrip() {
    let categories = TaskCategory::DIG | TaskCategory::HAUL;
    let json = serde_json::to_string(&categories).expect("serialize");
    let roundtrip: TaskCategory = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, categories);
}

#[test]
fn tick_report_json_roundtrip() {
    let report = TickReport {
        tick: 12,
        pruned: vec![TaskId(1)],
        assignments: vec![Assignment {
            task: TaskId(2),
            agent: 5u64,
            cost: 3.5,
        }],
        events: vec![
            TaskEvent::Completed {
                task: TaskId(3),
                agent: 5,
            },
            TaskEvent::Discarded {
                task: TaskId(4),
                agent: None,
                reason: DiscardReason::RetryLimit,
            },
            TaskEvent::Errored {
                task: TaskId(6),
                agent: 4,
                error: "missing blackboard entry".to_owned(),
            },
        ],
    };

    let json = serde_json::to_string(&report).expect("serialize");
    let roundtrip: TickReport<u64> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, report);
}
