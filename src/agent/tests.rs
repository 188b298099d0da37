// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Cumulus-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Cumulus and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde_json::{json, Value};

use super::{
    run_session, tool_output, ChatMessage, Controller, ControllerState, SessionError,
    SessionOutcome, SessionRequest,
};
use crate::config::{AgentConfig, FINAL_TURN_ADVISORY};
use crate::llm::scripted::{
    args_delta, completed, created, message_done, named_call, reasoning_done, text_delta,
    tool_call, Script, ScriptedModel,
};
use crate::llm::{InputItem, LlmError, ModelClient, ModelStream, ResponsesRequest, StreamEvent};
use crate::model::fixtures::{architecture_graph, nid};
use crate::model::Graph;
use crate::ops::apply_batch;
use crate::stream::{channel, ErrorKind, OutboundEvent};
use crate::tool::decode_batch_update;

struct Run {
    result: Result<SessionOutcome, SessionError>,
    events: Vec<OutboundEvent>,
    requests: Vec<ResponsesRequest>,
}

async fn run_scripted(scripts: Vec<Script>, config: AgentConfig, request: SessionRequest) -> Run {
    let model = Arc::new(ScriptedModel::new(scripts));
    let (sink, mut receiver) = channel(256);
    let result = run_session(model.clone(), Arc::new(config), request, sink).await;
    let mut events = Vec::new();
    while let Some(event) = receiver.recv().await {
        events.push(event);
    }
    Run { result, events, requests: model.requests() }
}

fn draw(prompt: &str) -> SessionRequest {
    SessionRequest::new(vec![ChatMessage::user(prompt)])
}

fn add_node_args(node_id: &str) -> Value {
    json!({"operations": [{
        "name": "add_node",
        "nodename": node_id,
        "parentId": "root",
        "data": {"label": node_id, "icon": "aws-ec2"}
    }]})
}

fn final_answer(response_id: &str) -> Script {
    vec![created(response_id), message_done("done"), completed(response_id)]
}

fn tool_outputs(events: &[OutboundEvent]) -> Vec<(&str, Value)> {
    events
        .iter()
        .filter_map(|event| match event {
            OutboundEvent::ToolOutput { call_id, output } => Some((
                call_id.as_str(),
                serde_json::from_str(output).expect("tool output is json"),
            )),
            _ => None,
        })
        .collect()
}

fn terminal_error(events: &[OutboundEvent]) -> (ErrorKind, &str) {
    match events.last() {
        Some(OutboundEvent::Error { kind, message }) => (*kind, message.as_str()),
        other => panic!("expected trailing error event, got {other:?}"),
    }
}

#[tokio::test]
async fn text_only_response_completes_in_one_turn() {
    let script =
        vec![created("resp_1"), text_delta("Hello"), message_done("Hello"), completed("resp_1")];
    let run = run_scripted(vec![script], AgentConfig::default(), draw("hi")).await;

    let outcome = run.result.expect("session");
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.response_id.as_deref(), Some("resp_1"));
    assert!(outcome.graph.is_empty());

    assert_eq!(run.events.len(), 5);
    assert!(run.events[..4].iter().all(|event| matches!(event, OutboundEvent::Upstream(_))));
    let OutboundEvent::Done { turns, response_id, graph } = &run.events[4] else {
        panic!("expected done");
    };
    assert_eq!(*turns, 1);
    assert_eq!(response_id.as_deref(), Some("resp_1"));
    assert_eq!(graph, &Graph::new().snapshot());

    assert_eq!(run.requests.len(), 1);
    let request = &run.requests[0];
    assert!(request.stream);
    assert_eq!(request.previous_response_id, None);
    assert_eq!(request.input, vec![InputItem::message("user", "hi")]);
    assert_eq!(request.tools.len(), 1);
    assert_eq!(request.tools[0].name, "batch_update");
}

#[tokio::test]
async fn tool_output_follows_its_call_item() {
    let first =
        vec![created("resp_1"), tool_call("call_1", &add_node_args("web")), completed("resp_1")];
    let run = run_scripted(vec![first, final_answer("resp_2")], AgentConfig::default(), draw("web"))
        .await;

    let outcome = run.result.expect("session");
    assert_eq!(outcome.turns, 2);
    assert_eq!(outcome.response_id.as_deref(), Some("resp_2"));
    assert!(outcome.graph.contains_node(&nid("web")));
    assert_eq!(outcome.graph.rev(), 1);

    // created, call item, tool output, completed: the output is emitted before the stream moves on
    assert!(matches!(run.events[1], OutboundEvent::Upstream(ref data) if data.contains("call_1")));
    assert!(matches!(
        run.events[2],
        OutboundEvent::ToolOutput { ref call_id, .. } if call_id == "call_1"
    ));
    assert!(matches!(
        run.events[3],
        OutboundEvent::Upstream(ref data) if data.contains("response.completed")
    ));
    assert!(matches!(run.events.last(), Some(OutboundEvent::Done { turns: 2, .. })));

    let outputs = tool_outputs(&run.events);
    assert_eq!(outputs.len(), 1);
    let (_, output) = &outputs[0];
    assert_eq!(output["status"], "ok");
    assert_eq!(output["applied"], 1);
    assert_eq!(output["rev"], 1);
    assert_eq!(output["delta"]["added"], json!(["node:web"]));
    assert_eq!(output["graph"]["children"][0]["id"], "web");
}

#[tokio::test]
async fn continuation_sends_only_tool_outputs_with_previous_response_id() {
    let first = vec![
        created("resp_1"),
        reasoning_done(),
        tool_call("call_1", &add_node_args("web")),
        completed("resp_1"),
    ];
    let run = run_scripted(vec![first, final_answer("resp_2")], AgentConfig::default(), draw("web"))
        .await;
    run.result.expect("session");

    assert_eq!(run.requests.len(), 2);
    let second = &run.requests[1];
    assert_eq!(second.previous_response_id.as_deref(), Some("resp_1"));
    assert_eq!(second.input.len(), 1);
    let InputItem::FunctionCallOutput { call_id, output } = &second.input[0] else {
        panic!("expected function_call_output");
    };
    assert_eq!(call_id, "call_1");
    assert!(output.contains("\"status\":\"ok\""));
}

#[tokio::test]
async fn full_history_mode_replays_calls_without_reasoning() {
    let first = vec![
        created("resp_1"),
        reasoning_done(),
        tool_call("call_1", &add_node_args("web")),
        completed("resp_1"),
    ];
    let config = AgentConfig { continuation: false, ..AgentConfig::default() };
    let run = run_scripted(vec![first, final_answer("resp_2")], config, draw("web")).await;
    run.result.expect("session");

    let second = &run.requests[1];
    assert_eq!(second.previous_response_id, None);
    assert_eq!(second.input.len(), 3);
    assert_eq!(second.input[0], InputItem::message("user", "web"));
    assert!(matches!(
        second.input[1],
        InputItem::FunctionCall { ref call_id, .. } if call_id == "call_1"
    ));
    assert!(matches!(
        second.input[2],
        InputItem::FunctionCallOutput { ref call_id, .. } if call_id == "call_1"
    ));
}

#[tokio::test]
async fn streamed_argument_deltas_are_reassembled() {
    let arguments = add_node_args("cache").to_string();
    let (head, tail) = arguments.split_at(arguments.len() / 2);
    let first = vec![
        created("resp_1"),
        args_delta("fc_1", head),
        args_delta("fc_1", tail),
        named_call("fc_1", "call_1", "batch_update", ""),
        completed("resp_1"),
    ];
    let run =
        run_scripted(vec![first, final_answer("resp_2")], AgentConfig::default(), draw("cache"))
            .await;

    let outcome = run.result.expect("session");
    assert!(outcome.graph.contains_node(&nid("cache")));
}

#[tokio::test]
async fn duplicate_call_ids_execute_once() {
    let first = vec![
        created("resp_1"),
        tool_call("call_1", &add_node_args("web")),
        tool_call("call_1", &add_node_args("other")),
        completed("resp_1"),
    ];
    let run = run_scripted(vec![first, final_answer("resp_2")], AgentConfig::default(), draw("web"))
        .await;

    let outcome = run.result.expect("session");
    assert!(outcome.graph.contains_node(&nid("web")));
    assert!(!outcome.graph.contains_node(&nid("other")));
    assert_eq!(tool_outputs(&run.events).len(), 1);
}

#[tokio::test]
async fn several_calls_in_one_response_apply_in_order() {
    let edge = json!({"operations": [
        {"name": "add_edge", "edgeId": "web-db", "sourceId": "web", "targetId": "db"}
    ]});
    let first = vec![
        created("resp_1"),
        tool_call("call_1", &add_node_args("web")),
        tool_call("call_2", &add_node_args("db")),
        tool_call("call_3", &edge),
        completed("resp_1"),
    ];
    let run = run_scripted(vec![first, final_answer("resp_2")], AgentConfig::default(), draw("app"))
        .await;

    let outcome = run.result.expect("session");
    assert_eq!(outcome.graph.rev(), 3);
    assert_eq!(outcome.graph.edge_count(), 1);
    let ids =
        tool_outputs(&run.events).into_iter().map(|(id, _)| id.to_owned()).collect::<Vec<_>>();
    assert_eq!(ids, ["call_1", "call_2", "call_3"]);
    assert_eq!(run.requests[1].input.len(), 3);
}

#[tokio::test]
async fn malformed_arguments_end_with_decode_error() {
    let first = vec![
        created("resp_1"),
        named_call("fc_1", "call_1", "batch_update", r#"{"operations": {"name": "add_node"}}"#),
        completed("resp_1"),
    ];
    let run = run_scripted(vec![first], AgentConfig::default(), draw("web")).await;

    assert!(matches!(
        run.result,
        Err(SessionError::Decode { ref call_id, .. }) if call_id == "call_1"
    ));
    let (kind, message) = terminal_error(&run.events);
    assert_eq!(kind, ErrorKind::Decode);
    assert!(message.contains("call_1"));
    assert!(tool_outputs(&run.events).is_empty());
    assert!(!run.events.iter().any(|event| matches!(event, OutboundEvent::Done { .. })));
}

#[tokio::test]
async fn unknown_tool_is_a_decode_error() {
    let first = vec![
        created("resp_1"),
        named_call("fc_1", "call_1", "draw_picture", "{}"),
        completed("resp_1"),
    ];
    let run = run_scripted(vec![first], AgentConfig::default(), draw("web")).await;

    assert!(matches!(run.result, Err(SessionError::Decode { .. })));
    let (kind, message) = terminal_error(&run.events);
    assert_eq!(kind, ErrorKind::Decode);
    assert!(message.contains("draw_picture"));
}

#[tokio::test]
async fn rejected_batch_ends_with_validation_error() {
    let args = json!({"operations": [
        {"name": "add_node", "nodename": "cache", "parentId": "vpc"},
        {"name": "delete_node", "nodeId": "missing"}
    ]});
    let first = vec![created("resp_1"), tool_call("call_1", &args), completed("resp_1")];
    let request = SessionRequest { graph: architecture_graph(), ..draw("add a cache") };
    let run = run_scripted(vec![first], AgentConfig::default(), request).await;

    let Err(SessionError::Validation { call_id, source }) = &run.result else {
        panic!("expected validation error, got {:?}", run.result.as_ref().map(|_| ()));
    };
    assert_eq!(call_id, "call_1");
    assert_eq!(source.index, 1);

    let (kind, message) = terminal_error(&run.events);
    assert_eq!(kind, ErrorKind::Validation);
    assert!(message.contains("operation #1 (delete_node) failed"));
    assert!(tool_outputs(&run.events).is_empty());
}

#[tokio::test]
async fn final_turn_advisory_is_added_without_stopping_the_loop() {
    let config = AgentConfig { max_turns: 2, ..AgentConfig::default() };
    let scripts = vec![
        vec![created("resp_1"), tool_call("call_1", &add_node_args("a")), completed("resp_1")],
        vec![created("resp_2"), tool_call("call_2", &add_node_args("b")), completed("resp_2")],
        final_answer("resp_3"),
    ];
    let run = run_scripted(scripts, config, draw("two nodes")).await;

    let outcome = run.result.expect("session");
    assert_eq!(outcome.turns, 3);
    assert_eq!(outcome.graph.node_count(), 2);

    let advised = run
        .requests
        .iter()
        .map(|request| {
            request.instructions.as_deref().is_some_and(|text| text.contains(FINAL_TURN_ADVISORY))
        })
        .collect::<Vec<_>>();
    assert_eq!(advised, [false, true, true]);
}

#[tokio::test]
async fn existing_graph_and_previous_response_are_forwarded() {
    let request = SessionRequest {
        messages: vec![ChatMessage::user("add a cache")],
        graph: architecture_graph(),
        previous_response_id: Some("resp_0".to_owned()),
    };
    let run = run_scripted(vec![final_answer("resp_1")], AgentConfig::default(), request).await;

    let outcome = run.result.expect("session");
    assert_eq!(outcome.graph.node_count(), architecture_graph().node_count());

    let first = &run.requests[0];
    assert_eq!(first.previous_response_id.as_deref(), Some("resp_0"));
    assert_eq!(first.input.len(), 2);
    let InputItem::Message { content, .. } = &first.input[0] else {
        panic!("expected graph context message");
    };
    assert!(content.contains("\"id\":\"db\""));
}

#[tokio::test]
async fn upstream_stream_error_is_a_transport_error() {
    let script = vec![created("resp_1"), Err("connection reset".to_owned())];
    let run = run_scripted(vec![script], AgentConfig::default(), draw("hi")).await;

    assert!(matches!(run.result, Err(SessionError::Transport(LlmError::Upstream(_)))));
    let (kind, message) = terminal_error(&run.events);
    assert_eq!(kind, ErrorKind::Transport);
    assert!(message.contains("connection reset"));
}

#[tokio::test]
async fn failed_response_is_a_transport_error() {
    let failed = Ok(json!({
        "type": "response.failed",
        "response": {"id": "resp_1", "error": {"code": "server_error", "message": "overloaded"}}
    }));
    let run =
        run_scripted(vec![vec![created("resp_1"), failed]], AgentConfig::default(), draw("hi"))
            .await;

    let (kind, message) = terminal_error(&run.events);
    assert_eq!(kind, ErrorKind::Transport);
    assert!(message.contains("overloaded"));
}

#[tokio::test]
async fn stream_without_completion_is_a_protocol_error() {
    let script = vec![created("resp_1"), text_delta("partial")];
    let run = run_scripted(vec![script], AgentConfig::default(), draw("hi")).await;

    assert!(matches!(run.result, Err(SessionError::Protocol(_))));
    assert_eq!(terminal_error(&run.events).0, ErrorKind::Protocol);
}

/// Emits `prefix` and then never yields again.
struct StalledModel {
    prefix: Vec<String>,
}

#[async_trait]
impl ModelClient for StalledModel {
    async fn stream(&self, _request: &ResponsesRequest) -> Result<ModelStream, LlmError> {
        let events = self.prefix.iter().map(|data| StreamEvent::parse(data)).collect::<Vec<_>>();
        Ok(stream::iter(events).chain(stream::pending()).boxed())
    }
}

#[tokio::test]
async fn idle_upstream_times_out() {
    let client = Arc::new(StalledModel { prefix: Vec::new() });
    let config = AgentConfig { idle_timeout: Duration::from_millis(20), ..AgentConfig::default() };
    let (sink, receiver) = channel(8);

    let result = run_session(client, Arc::new(config), draw("hi"), sink).await;
    assert!(matches!(result, Err(SessionError::Transport(LlmError::IdleTimeout(_)))));

    let log = receiver.into_frame_log().await;
    assert!(log.contains(r#""kind":"transport""#));
}

#[tokio::test]
async fn dropped_receiver_cancels_the_session() {
    let opened = r#"{"type":"response.created","response":{"id":"resp_1"}}"#;
    let client = Arc::new(StalledModel { prefix: vec![opened.to_owned()] });
    let (sink, mut receiver) = channel(8);

    let config = Arc::new(AgentConfig::default());
    let session = tokio::spawn(run_session(client, config, draw("hi"), sink));
    let first = receiver.recv().await.expect("first event");
    assert_eq!(first, OutboundEvent::Upstream(opened.to_owned()));
    drop(receiver);

    let result = tokio::time::timeout(Duration::from_secs(5), session)
        .await
        .expect("session stops promptly")
        .expect("join");
    assert!(matches!(result, Err(SessionError::Cancelled)));
}

#[test]
fn new_controller_awaits_the_model() {
    let (sink, _receiver) = channel(1);
    let controller = Controller::new(
        Arc::new(ScriptedModel::default()),
        Arc::new(AgentConfig::default()),
        draw("hi"),
        sink,
    );
    assert_eq!(controller.state(), ControllerState::AwaitingModel);
}

#[test]
fn tool_output_reports_delta_and_graph() {
    let mut graph = architecture_graph();
    let ops = decode_batch_update(r#"{"operations":[{"name":"delete_node","nodeId":"db"}]}"#)
        .expect("decode");
    let result = apply_batch(&mut graph, &ops).expect("apply");

    let output: Value = serde_json::from_str(&tool_output(&result, &graph)).expect("json");
    assert_eq!(output["status"], "ok");
    assert_eq!(output["rev"], 1);
    assert_eq!(output["delta"]["removed"], json!(["node:db", "edge:app-db"]));
    assert_eq!(output["graph"], serde_json::to_value(graph.snapshot()).expect("snapshot"));
}
