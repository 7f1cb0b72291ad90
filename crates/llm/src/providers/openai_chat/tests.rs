//! Unit tests for the OpenAI chat-completions provider.

use bytes::Bytes;
use futures::{stream, StreamExt};
use serde_json::json;

use mammoth_tool_runtime::{
    AssistantContent, ConversationMessage, FinishReason, LlmError, StreamEvent, ToolCall,
    ToolDefinition, ToolResult,
};

use super::sse::{parse_data, parse_line, LineBuffer, SseData};
use super::streaming::{sse_event_stream, status_error, OpenAiChatProvider};
use super::translate::{build_messages, message_to_openai, tool_definition_to_openai};

fn events(data: &str) -> Vec<StreamEvent> {
    match parse_data(data).unwrap() {
        SseData::Events(events) => events,
        SseData::Done => panic!("unexpected [DONE]"),
    }
}

async fn collect(body: Vec<&'static str>) -> Vec<Result<StreamEvent, LlmError>> {
    let chunks = body
        .into_iter()
        .map(|s| Ok::<_, std::io::Error>(Bytes::from(s)));
    sse_event_stream(stream::iter(chunks)).collect().await
}

#[test]
fn test_tool_definition_translation() {
    let def = ToolDefinition {
        name: "fetchCandidateProfile".to_string(),
        description: "Fetch a profile".to_string(),
        parameters: json!({
            "type": "object",
            "properties": { "firstName": { "type": "string" } },
            "required": ["firstName"]
        }),
    };

    let out = tool_definition_to_openai(&def);
    assert_eq!(out["type"], "function");
    assert_eq!(out["function"]["name"], "fetchCandidateProfile");
    assert_eq!(out["function"]["parameters"]["required"][0], "firstName");
}

#[test]
fn test_assistant_tool_calls_translation() {
    let msg = ConversationMessage::Assistant(AssistantContent {
        text: None,
        tool_calls: vec![ToolCall {
            id: "call_1".to_string(),
            name: "fetchCandidateProfile".to_string(),
            arguments: r#"{"firstName":"Jason"}"#.to_string(),
        }],
    });
    let out = message_to_openai(&msg);

    assert_eq!(out["role"], "assistant");
    assert!(out["content"].is_null());
    assert_eq!(out["tool_calls"][0]["id"], "call_1");
    assert_eq!(out["tool_calls"][0]["type"], "function");
    assert_eq!(
        out["tool_calls"][0]["function"]["arguments"],
        r#"{"firstName":"Jason"}"#
    );
}

#[test]
fn test_tool_result_translation() {
    let msg = ConversationMessage::ToolResult(ToolResult {
        tool_call_id: "call_1".to_string(),
        content: "Jason is great.".to_string(),
        is_error: false,
    });
    let out = message_to_openai(&msg);
    assert_eq!(out["role"], "tool");
    assert_eq!(out["tool_call_id"], "call_1");
    assert_eq!(out["content"], "Jason is great.");
}

#[test]
fn test_system_prompt_leads_messages() {
    let msgs = build_messages(
        Some("You are the Oracle."),
        &[ConversationMessage::User("Hi".into())],
    );
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0]["role"], "system");
    assert_eq!(msgs[1]["content"], "Hi");

    assert_eq!(build_messages(None, &[]).len(), 0);
}

#[test]
fn test_parse_content_delta() {
    let evts = events(r#"{"choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#);
    assert_eq!(
        evts,
        vec![StreamEvent::ContentDelta {
            text: "Hello".into()
        }]
    );
}

#[test]
fn test_parse_tool_call_fragments() {
    let first = events(
        r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":null,"tool_calls":[{"index":0,"id":"call_abc","type":"function","function":{"name":"fetchCandidateProfile","arguments":""}}]},"finish_reason":null}]}"#,
    );
    assert_eq!(
        first,
        vec![StreamEvent::ToolCallDelta {
            index: 0,
            id: Some("call_abc".into()),
            name: Some("fetchCandidateProfile".into()),
            arguments_delta: Some(String::new()),
        }]
    );

    let next = events(
        r#"{"choices":[{"index":0,"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"firstName\""}}]},"finish_reason":null}]}"#,
    );
    assert_eq!(
        next,
        vec![StreamEvent::ToolCallDelta {
            index: 0,
            id: None,
            name: None,
            arguments_delta: Some("{\"firstName\"".into()),
        }]
    );
}

#[test]
fn test_parse_finish_reason() {
    let evts = events(r#"{"choices":[{"index":0,"delta":{},"finish_reason":"tool_calls"}]}"#);
    assert_eq!(
        evts,
        vec![StreamEvent::Finish {
            reason: FinishReason::ToolCalls
        }]
    );
}

#[test]
fn test_parse_done_and_noise() {
    assert_eq!(parse_data("[DONE]").unwrap(), SseData::Done);
    assert!(parse_line(": keep-alive").is_none());
    assert!(parse_line("").is_none());
    assert!(parse_line("event: message").is_none());
    assert!(events(r#"{"choices":[],"usage":{"total_tokens":12}}"#).is_empty());
}

#[test]
fn test_parse_error_payload() {
    let err = parse_data(r#"{"error":{"message":"The server had an error"}}"#).unwrap_err();
    match err {
        LlmError::StreamError(msg) => assert_eq!(msg, "The server had an error"),
        other => panic!("expected StreamError, got {:?}", other),
    }
    assert!(matches!(
        parse_data("{not json").unwrap_err(),
        LlmError::InvalidResponse(_)
    ));
}

#[test]
fn test_line_buffer_keeps_split_utf8() {
    let text = "data: {\"x\":\"é\"}\n";
    let bytes = text.as_bytes();
    let split = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;

    let mut buf = LineBuffer::new();
    buf.push(&bytes[..split]);
    assert!(buf.next_line().is_none());
    buf.push(&bytes[split..]);
    assert_eq!(buf.next_line().unwrap(), "data: {\"x\":\"é\"}");
    assert!(buf.take_rest().is_none());
}

#[tokio::test]
async fn test_stream_across_chunk_boundaries() {
    let out = collect(vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi",
        "ces\":[{\"delta\":{\"content\":\"lo\"}}]}\r\n\r\n",
        "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
        "data: [DONE]\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
    ])
    .await;

    let out: Vec<StreamEvent> = out.into_iter().map(|r| r.unwrap()).collect();
    assert_eq!(
        out,
        vec![
            StreamEvent::ContentDelta { text: "Hel".into() },
            StreamEvent::ContentDelta { text: "lo".into() },
            StreamEvent::Finish {
                reason: FinishReason::Stop
            },
        ]
    );
}

#[tokio::test]
async fn test_stream_without_trailing_newline() {
    let out = collect(vec!["data: {\"choices\":[{\"delta\":{\"content\":\"tail\"}}]}"]).await;
    assert_eq!(out.len(), 1);
    assert_eq!(
        out[0].as_ref().unwrap(),
        &StreamEvent::ContentDelta {
            text: "tail".into()
        }
    );
}

#[tokio::test]
async fn test_stream_stops_after_error() {
    let out = collect(vec![
        "data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n",
        "data: {\"error\":{\"message\":\"overloaded\"}}\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n",
    ])
    .await;
    assert_eq!(out.len(), 2);
    assert!(out[0].is_ok());
    assert!(matches!(out[1], Err(LlmError::StreamError(_))));
}

#[tokio::test]
async fn test_transport_error_surfaces() {
    let chunks = vec![
        Ok(Bytes::from("data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n")),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
    ];
    let out: Vec<_> = sse_event_stream(stream::iter(chunks)).collect().await;
    assert_eq!(out.len(), 2);
    assert!(matches!(out[1], Err(LlmError::StreamError(_))));
}

#[test]
fn test_status_errors() {
    assert!(matches!(status_error(401, None, String::new()), LlmError::AuthError));
    assert!(matches!(
        status_error(429, Some(7), String::new()),
        LlmError::RateLimited { retry_after_secs: 7 }
    ));
    match status_error(400, None, r#"{"error":{"message":"bad model"}}"#.into()) {
        LlmError::ApiError { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "bad model");
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
}

#[test]
fn test_provider_name() {
    use mammoth_tool_runtime::ToolAwareLlmProvider;
    let provider = OpenAiChatProvider::new(
        "sk-test".into(),
        "gpt-4.1-nano-2025-04-14".into(),
        "https://api.openai.com".into(),
    );
    assert_eq!(provider.provider_name(), "openai");
    assert_eq!(provider.model(), "gpt-4.1-nano-2025-04-14");
}
