use std::{collections::HashSet, sync::Arc, thread};

use serde_json::json;
use traceforge::{
    correlator::{CorrelatorConfig, EndPayload, EventCorrelator, StartPayload},
    trace::AgentInfo,
};

#[test]
fn given_parallel_tool_calls_when_correlated_then_every_step_lands_exactly_once() {
    let correlator = Arc::new(
        EventCorrelator::new(CorrelatorConfig::for_agent(AgentInfo::named("test-agent")))
            .expect("default config is valid"),
    );

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let correlator = Arc::clone(&correlator);
            thread::spawn(move || {
                let run_id = format!("tool-{i}");
                correlator
                    .on_start(
                        &run_id,
                        None,
                        StartPayload::Tool {
                            tool_name: format!("tool_{i}"),
                            arguments: json!({"i": i}),
                        },
                    )
                    .expect("start should succeed");
                correlator
                    .on_end(
                        &run_id,
                        EndPayload::Tool {
                            result: Some(json!({"i": i})),
                            success: Some(true),
                            resource_impact: None,
                        },
                    )
                    .expect("end should succeed");
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread must not panic");
    }

    let correlator = Arc::try_unwrap(correlator)
        .unwrap_or_else(|_| panic!("correlator must have no remaining owners"));
    let trace = correlator.finish().expect("finish should succeed");

    assert_eq!(trace.steps.len(), 16);
    let ids: HashSet<&str> = trace.steps.iter().map(|step| step.step_id()).collect();
    assert_eq!(ids.len(), 16, "step ids must be unique");
    trace.validate().expect("trace invariants must hold");
}

#[test]
fn given_racing_on_end_calls_when_correlated_then_only_one_wins() {
    let correlator = Arc::new(
        EventCorrelator::new(CorrelatorConfig::for_agent(AgentInfo::named("test-agent")))
            .expect("default config is valid"),
    );
    correlator
        .on_start(
            "tool-1",
            None,
            StartPayload::Tool {
                tool_name: "search".to_string(),
                arguments: json!({}),
            },
        )
        .expect("start should succeed");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let correlator = Arc::clone(&correlator);
            thread::spawn(move || {
                correlator
                    .on_end(
                        "tool-1",
                        EndPayload::Tool {
                            result: None,
                            success: Some(true),
                            resource_impact: None,
                        },
                    )
                    .is_ok()
            })
        })
        .collect();
    let wins: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker thread must not panic"))
        .filter(|won| *won)
        .count();
    assert_eq!(wins, 1, "exactly one finalization may claim the run");

    let correlator = Arc::try_unwrap(correlator)
        .unwrap_or_else(|_| panic!("correlator must have no remaining owners"));
    let trace = correlator.finish().expect("finish should succeed");
    assert_eq!(trace.steps.len(), 1);
}
