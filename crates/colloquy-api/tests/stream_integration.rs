//! Integration tests for the byte-stream → ChatStream → StreamEvent pipeline.
//!
//! These tests simulate realistic streaming responses by feeding complete
//! `data:` line sequences through ChatStream, in whole and in chunked form,
//! and verifying the emitted events.

use colloquy_api::ChatStream;
use colloquy_types::{StreamEvent, StreamFinal};
use futures_util::StreamExt;

/// Create a ChatStream from raw SSE text (simulating a complete response).
fn stream_from_sse(sse_text: &str) -> ChatStream {
    let bytes = bytes::Bytes::from(sse_text.to_owned());
    let byte_stream = futures_util::stream::iter(vec![Ok::<_, reqwest::Error>(bytes)]);
    ChatStream::new(byte_stream)
}

/// Create a ChatStream from multiple byte chunks (simulating chunked transfer).
fn stream_from_chunks(chunks: Vec<&str>) -> ChatStream {
    let byte_stream = futures_util::stream::iter(
        chunks
            .into_iter()
            .map(|s| Ok::<_, reqwest::Error>(bytes::Bytes::from(s.to_owned())))
            .collect::<Vec<_>>(),
    );
    ChatStream::new(byte_stream)
}

/// Collect all events from a ChatStream.
async fn collect_events(mut stream: ChatStream) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(result) = stream.next().await {
        events.push(result.expect("stream event should decode successfully"));
    }
    events
}

fn final_event(events: &[StreamEvent]) -> &StreamFinal {
    match events.last().expect("stream should emit events") {
        StreamEvent::Done(f) => f,
        other => panic!("Expected terminal event last, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Test: plain text response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_text_deltas_concatenate_to_final_content() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"lo \"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"world \"},\"finish_reason\":\"stop\"}],\"usage\":{\"prompt_tokens\":12,\"completion_tokens\":3,\"total_tokens\":15}}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;

    // Three deltas plus one terminal event
    assert_eq!(events.len(), 4);

    let mut concatenated = String::new();
    for event in &events[..3] {
        match event {
            StreamEvent::Delta(d) => {
                concatenated.push_str(d.content.as_deref().unwrap_or_default());
                assert_eq!(d.accumulated_content, concatenated);
            }
            other => panic!("Expected delta, got {other:?}"),
        }
    }

    let done = final_event(&events);
    assert_eq!(done.content, concatenated.trim());
    assert_eq!(done.content, "Hello world");
    assert!(done.reasoning.is_none());
    assert_eq!(done.usage.total_tokens, 15);
    assert_eq!(done.finish_reason.as_deref(), Some("stop"));
    assert_eq!(done.message.text().as_deref(), Some("Hello world "));
}

// ---------------------------------------------------------------------------
// Test: reasoning deltas via the alternate field name
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reasoning_content_deltas() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"reasoning_content\":\"step 1. \"}}]}\n\
data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"step 2.\"}}]}\n\
data: {\"choices\":[{\"delta\":{\"content\":\"42\"},\"finish_reason\":\"stop\"}]}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;
    assert_eq!(events.len(), 4);

    match &events[0] {
        StreamEvent::Delta(d) => {
            assert_eq!(d.reasoning.as_deref(), Some("step 1. "));
            assert!(d.content.is_none());
        }
        other => panic!("Expected delta, got {other:?}"),
    }

    let done = final_event(&events);
    assert_eq!(done.reasoning.as_deref(), Some("step 1. step 2."));
    assert_eq!(done.content, "42");
}

// ---------------------------------------------------------------------------
// Test: tool-call fragments merge by positional index
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_tool_call_delta_merging() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"foo\"}}]}}]}\n\
data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"a\\\"\"}}]}}]}\n\
data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\":1}\"}}]}},\"finish_reason\":\"tool_calls\"}]}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;

    // No content deltas, just the terminal event
    assert_eq!(events.len(), 1);
    let done = final_event(&events);

    let calls = done.message.tool_calls.as_ref().expect("tool calls");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].id, "call_1");
    assert_eq!(calls[0].function.name, "foo");
    assert_eq!(calls[0].function.arguments, "{\"a\":1}");

    // Tool-call-only message has null content
    assert!(done.message.content.is_none());
    assert_eq!(done.finish_reason.as_deref(), Some("tool_calls"));
}

#[tokio::test]
async fn test_parallel_tool_calls_by_index() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_a\",\"function\":{\"name\":\"first\",\"arguments\":\"{}\"}}]}}]}\n\
data: {\"choices\":[{\"delta\":{\"tool_calls\":[{\"index\":1,\"id\":\"call_b\",\"function\":{\"name\":\"second\",\"arguments\":\"{}\"}}]}}]}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;
    let done = final_event(&events);

    let calls = done.message.tool_calls.as_ref().expect("tool calls");
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].function.name, "first");
    assert_eq!(calls[1].function.name, "second");
}

// ---------------------------------------------------------------------------
// Test: chunked delivery (lines split across TCP chunks)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_chunked_delivery() {
    let stream = stream_from_chunks(vec![
        "data: {\"choices\":[{\"delta\":{\"role\":\"assis",
        "tant\",\"content\":\"Hi\"}}]}\ndata: {\"choices\":[{\"delta\"",
        ":{\"content\":\" there\"}}]}\n",
        "data: [DONE]\n",
    ]);

    let events = collect_events(stream).await;
    assert_eq!(events.len(), 3);
    let done = final_event(&events);
    assert_eq!(done.content, "Hi there");
}

// ---------------------------------------------------------------------------
// Test: malformed records are dropped without aborting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_record_skipped() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"content\":\"ok\"}}]}\n\
data: {not valid json at all\n\
data: {\"choices\":[{\"delta\":{\"content\":\" fine\"}}]}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;
    assert_eq!(events.len(), 3);
    let done = final_event(&events);
    assert_eq!(done.content, "ok fine");
}

// ---------------------------------------------------------------------------
// Test: stream end without a terminator still finalizes once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_end_without_done_line() {
    let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n";

    let events = collect_events(stream_from_sse(sse)).await;
    assert_eq!(events.len(), 2);
    let done = final_event(&events);
    assert_eq!(done.content, "partial");
}

#[tokio::test]
async fn test_exactly_one_terminal_event() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;
    let terminals = events
        .iter()
        .filter(|e| matches!(e, StreamEvent::Done(_)))
        .count();
    assert_eq!(terminals, 1);
}

// ---------------------------------------------------------------------------
// Test: usage arriving only on the last frame is captured
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_usage_on_terminal_frame() {
    let sse = "\
data: {\"choices\":[{\"delta\":{\"content\":\"hey\"}}]}\n\
data: {\"choices\":[],\"usage\":{\"prompt_tokens\":5,\"completion_tokens\":1,\"total_tokens\":6}}\n\
data: [DONE]\n";

    let events = collect_events(stream_from_sse(sse)).await;
    let done = final_event(&events);
    assert_eq!(done.usage.prompt_tokens, 5);
    assert_eq!(done.usage.completion_tokens, 1);
}
