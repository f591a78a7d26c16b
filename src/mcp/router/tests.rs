use super::*;
use serde_json::json;

fn listing(tools: Value) -> Value {
    json!({"jsonrpc": "2.0", "result": {"tools": tools}})
}

fn listing_with_id(id: u64, tools: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": {"tools": tools}})
}

#[test]
fn tool_names_are_listed_with_count_and_intent_resets() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolNames);

    let output = correlator.route(json!({"result": {"tools": [{"name": "a"}, {"name": "b"}]}}));

    assert_eq!(
        output,
        RoutedOutput::ToolNames {
            id: None,
            names: vec!["a".to_string(), "b".to_string()],
        }
    );
    let rendered = output.to_string();
    assert!(rendered.contains("• a\n• b"));
    assert!(rendered.ends_with("Total: 2 tools"));
    assert_eq!(correlator.pending_intent(), &PendingIntent::None);
}

#[test]
fn tool_info_not_found_is_reported_and_intent_resets() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolInfo("x".to_string()));

    let output = correlator.route(listing(json!([{"name": "a"}, {"name": "b"}])));

    assert_eq!(
        output,
        RoutedOutput::ToolInfo {
            id: None,
            name: "x".to_string(),
            descriptor: None,
        }
    );
    assert_eq!(output.to_string(), "Tool 'x' not found.");
    assert_eq!(correlator.pending_intent(), &PendingIntent::None);
}

#[test]
fn tool_info_prints_the_matching_descriptor() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolInfo("pods_get".to_string()));
    let descriptor = json!({"name": "pods_get", "inputSchema": {"type": "object"}});

    let output = correlator.route(listing(json!([{"name": "pods_list"}, descriptor.clone()])));

    assert_eq!(
        output,
        RoutedOutput::ToolInfo {
            id: None,
            name: "pods_get".to_string(),
            descriptor: Some(descriptor),
        }
    );
    assert!(output
        .to_string()
        .starts_with("--- Tool Info for 'pods_get' ---"));
}

#[test]
fn listing_without_intent_prints_raw_payload() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    let payload = listing(json!([{"name": "a"}]));

    assert_eq!(
        correlator.route(payload.clone()),
        RoutedOutput::Payload(payload)
    );
    assert_eq!(correlator.pending_intent(), &PendingIntent::None);
}

#[test]
fn non_listing_payload_leaves_intent_unchanged() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    let call_result = json!({"id": 2, "result": {"content": []}});

    assert_eq!(
        correlator.route(call_result.clone()),
        RoutedOutput::Payload(call_result)
    );
    assert_eq!(correlator.pending_intent(), &PendingIntent::ExpectToolNames);
}

#[test]
fn intent_mode_last_writer_wins() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    correlator.expect(2, PendingIntent::ExpectToolInfo("a".to_string()));

    let first = correlator.route(listing_with_id(1, json!([{"name": "a"}])));
    let second = correlator.route(listing_with_id(2, json!([{"name": "a"}])));

    assert!(matches!(first, RoutedOutput::ToolInfo { .. }));
    assert!(matches!(second, RoutedOutput::Payload(_)));
}

#[test]
fn intent_mode_ignores_call_and_plain_list_intents() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    correlator.expect(2, PendingIntent::ExpectToolResult("pods_list".to_string()));
    correlator.expect(3, PendingIntent::None);

    assert_eq!(correlator.pending_intent(), &PendingIntent::ExpectToolNames);
}

#[test]
fn by_id_resolves_overlapping_listings_in_any_order() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    correlator.expect(2, PendingIntent::ExpectToolInfo("b".to_string()));
    let tools = json!([{"name": "a"}, {"name": "b"}]);

    let second = correlator.route(listing_with_id(2, tools.clone()));
    let first = correlator.route(listing_with_id(1, tools));

    assert_eq!(
        second,
        RoutedOutput::ToolInfo {
            id: Some(2),
            name: "b".to_string(),
            descriptor: Some(json!({"name": "b"})),
        }
    );
    assert_eq!(
        first,
        RoutedOutput::ToolNames {
            id: Some(1),
            names: vec!["a".to_string(), "b".to_string()],
        }
    );
    assert_eq!(correlator.outstanding(), 0);
}

#[test]
fn by_id_plain_listing_prints_payload() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::None);
    let payload = listing_with_id(1, json!([{"name": "a"}]));

    assert_eq!(
        correlator.route(payload.clone()),
        RoutedOutput::Payload(payload)
    );
    assert_eq!(correlator.outstanding(), 0);
}

#[test]
fn by_id_routes_tool_results_to_their_call() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(4, PendingIntent::ExpectToolResult("pods_list".to_string()));
    let payload = json!({
        "jsonrpc": "2.0",
        "id": 4,
        "result": {"content": [{"type": "text", "text": "pod-a Running"}]}
    });

    let output = correlator.route(payload.clone());

    assert_eq!(
        output,
        RoutedOutput::ToolResult {
            id: 4,
            name: "pods_list".to_string(),
            payload,
        }
    );
    assert_eq!(
        output.to_string(),
        "--- Result of 'pods_list' (request 4) ---\npod-a Running"
    );
}

#[test]
fn by_id_renders_error_objects_for_tool_calls() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(5, PendingIntent::ExpectToolResult("nope".to_string()));

    let output = correlator.route(json!({
        "jsonrpc": "2.0",
        "id": 5,
        "error": {"code": -32602, "message": "Unknown tool: nope"}
    }));

    assert!(output
        .to_string()
        .ends_with("MCP error -32602: Unknown tool: nope"));
}

#[test]
fn by_id_listing_error_prints_payload_and_clears_entry() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    let error = json!({"id": 1, "error": {"code": -32603, "message": "boom"}});

    assert_eq!(correlator.route(error.clone()), RoutedOutput::Payload(error));
    assert_eq!(correlator.outstanding(), 0);
}

#[test]
fn by_id_falls_back_to_oldest_listing_when_id_is_missing() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::ExpectToolResult("pods_list".to_string()));
    correlator.expect(2, PendingIntent::ExpectToolNames);
    correlator.expect(3, PendingIntent::ExpectToolInfo("a".to_string()));

    let output = correlator.route(listing(json!([{"name": "a"}])));

    assert_eq!(
        output,
        RoutedOutput::ToolNames {
            id: Some(2),
            names: vec!["a".to_string()],
        }
    );
    assert_eq!(correlator.outstanding(), 2);
}

#[test]
fn withdrawn_listing_is_skipped_by_the_shape_fallback() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    correlator.expect(2, PendingIntent::ExpectToolInfo("a".to_string()));

    assert_eq!(correlator.handle(SessionEvent::Withdraw(1)), None);
    assert_eq!(correlator.outstanding(), 1);

    let output = correlator.route(listing(json!([{"name": "a"}])));
    assert_eq!(
        output,
        RoutedOutput::ToolInfo {
            id: Some(2),
            name: "a".to_string(),
            descriptor: Some(json!({"name": "a"})),
        }
    );
    assert_eq!(correlator.outstanding(), 0);
}

#[test]
fn intent_mode_withdraw_keeps_the_slot() {
    let mut correlator = Correlator::new(RoutingMode::Intent);
    correlator.expect(4, PendingIntent::ExpectToolNames);

    correlator.withdraw(4);

    assert_eq!(correlator.pending_intent(), &PendingIntent::ExpectToolNames);
}

#[test]
fn by_id_unknown_id_prints_payload() {
    let mut correlator = Correlator::new(RoutingMode::ById);
    correlator.expect(1, PendingIntent::ExpectToolNames);
    let payload = listing_with_id(9, json!([]));

    assert_eq!(
        correlator.route(payload.clone()),
        RoutedOutput::Payload(payload)
    );
    assert_eq!(correlator.outstanding(), 1);
}

#[test]
fn handle_maps_session_events() {
    let mut correlator = Correlator::new(RoutingMode::ById);

    assert_eq!(
        correlator.handle(SessionEvent::SessionEstablished("abc".to_string())),
        Some(RoutedOutput::Session("abc".to_string()))
    );
    assert_eq!(
        correlator.handle(SessionEvent::Expect {
            id: 1,
            intent: PendingIntent::ExpectToolNames,
        }),
        None
    );
    assert_eq!(
        correlator.handle(SessionEvent::RawEvent("oops".to_string())),
        Some(RoutedOutput::Raw("oops".to_string()))
    );
    assert_eq!(
        correlator.handle(SessionEvent::StreamClosed(None)),
        Some(RoutedOutput::Closed(None))
    );
}

#[test]
fn answers_matches_ids_and_id_less_listings() {
    let names = RoutedOutput::ToolNames {
        id: None,
        names: Vec::new(),
    };
    assert!(names.answers(3));

    let payload = RoutedOutput::Payload(json!({"id": 3, "result": {}}));
    assert!(payload.answers(3));
    assert!(!payload.answers(4));
    assert!(!RoutedOutput::Raw("x".to_string()).answers(3));
}

#[test]
fn routing_mode_parses_aliases() {
    assert_eq!("by-id".parse::<RoutingMode>(), Ok(RoutingMode::ById));
    assert_eq!("Intent".parse::<RoutingMode>(), Ok(RoutingMode::Intent));
    assert!("fifo".parse::<RoutingMode>().is_err());
}

#[tokio::test]
async fn correlator_task_forwards_outputs_in_order() {
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (output_tx, mut output_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_correlator(
        Correlator::new(RoutingMode::ById),
        event_rx,
        output_tx,
    ));

    event_tx
        .send(SessionEvent::Expect {
            id: 1,
            intent: PendingIntent::ExpectToolNames,
        })
        .unwrap();
    event_tx
        .send(SessionEvent::RawEvent("not json".to_string()))
        .unwrap();
    event_tx
        .send(SessionEvent::Message(listing_with_id(1, json!([{"name": "a"}]))))
        .unwrap();
    drop(event_tx);

    assert_eq!(
        output_rx.recv().await,
        Some(RoutedOutput::Raw("not json".to_string()))
    );
    assert_eq!(
        output_rx.recv().await,
        Some(RoutedOutput::ToolNames {
            id: Some(1),
            names: vec!["a".to_string()],
        })
    );
    task.await.expect("correlator task should finish");
    assert_eq!(output_rx.recv().await, None);
}
