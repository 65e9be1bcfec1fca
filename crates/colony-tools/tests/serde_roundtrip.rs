#![cfg(feature = "serde")]

use colony_tools::{TraceEvent, TraceLog};

#[test]
fn trace_log_json_roundtrip() {
    let log = TraceLog {
        events: vec![
            TraceEvent::new(1, "task.assign").for_agent(3).for_task(10),
            TraceEvent::new(2, "reserve.acquire").for_agent(3).with_detail("Anvil"),
            TraceEvent::new(3, "goto.fail").with_detail("no path"),
        ],
    };

    let json = serde_json::to_string(&log).expect("serialize");
    let roundtrip: TraceLog = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, log);
}
