use bytes::Bytes;
use futures_util::StreamExt;
use nimgate_rs::stream::{ReasoningMode, TranscodeStream};
use serde_json::{json, Value};

fn frame(delta: &Value) -> String {
    let frame = json!({
        "id": "chatcmpl-x",
        "object": "chat.completion.chunk",
        "created": 1,
        "model": "qwen/qwen3-next-80b-a3b-thinking",
        "choices": [{"index": 0, "delta": delta, "finish_reason": null}],
    });
    format!("data: {frame}\n\n")
}

fn upstream_body() -> Vec<u8> {
    let mut body = String::new();
    body.push_str(&frame(&json!({"role": "assistant", "content": ""})));
    for word in ["Ich ", "denke ", "über ", "Ärger ", "nach 🤔"] {
        body.push_str(&frame(&json!({"reasoning_content": word, "content": null})));
    }
    body.push_str(": keep-alive\r\n\r\n");
    for word in ["Die ", "Antwort ", "ist ", "42."] {
        body.push_str(&frame(&json!({"content": word})));
    }
    body.push_str("data: [DONE]\n\n");
    body.into_bytes()
}

async fn transcode(chunks: Vec<Vec<u8>>, mode: ReasoningMode) -> Vec<u8> {
    let upstream = futures_util::stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, std::io::Error>(Bytes::from(chunk))),
    );
    let mut out = Vec::new();
    let mut stream = TranscodeStream::new(upstream, mode);
    while let Some(item) = stream.next().await {
        out.extend_from_slice(&item.unwrap());
    }
    out
}

fn random_split(body: &[u8], rng: &mut fastrand::Rng) -> Vec<Vec<u8>> {
    let mut chunks = Vec::new();
    let mut rest = body;
    while !rest.is_empty() {
        let take = rng.usize(1..=rest.len().min(48));
        let (head, tail) = rest.split_at(take);
        chunks.push(head.to_vec());
        rest = tail;
    }
    chunks
}

fn content_of(output: &[u8]) -> String {
    std::str::from_utf8(output)
        .unwrap()
        .lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter(|p| *p != "[DONE]")
        .filter_map(|p| serde_json::from_str::<Value>(p).ok())
        .filter_map(|v| v["choices"][0]["delta"]["content"].as_str().map(str::to_owned))
        .collect()
}

#[tokio::test]
async fn test_output_independent_of_chunking() {
    let body = upstream_body();
    for mode in [ReasoningMode::Merge, ReasoningMode::Suppress] {
        let expected = transcode(vec![body.clone()], mode).await;
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..64 {
            let chunks = random_split(&body, &mut rng);
            assert_eq!(transcode(chunks, mode).await, expected);
        }
        let bytewise: Vec<Vec<u8>> = body.iter().map(|b| vec![*b]).collect();
        assert_eq!(transcode(bytewise, mode).await, expected);
    }
}

#[tokio::test]
async fn test_merge_round_trip() {
    let output = transcode(vec![upstream_body()], ReasoningMode::Merge).await;
    assert_eq!(
        content_of(&output),
        "<think>\nIch denke über Ärger nach 🤔</think>\n\nDie Antwort ist 42."
    );
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains(": keep-alive\n"));
    assert!(text.ends_with("data: [DONE]\n\n"));
    assert_eq!(text.matches("<think>").count(), 1);
    assert_eq!(text.matches("</think>").count(), 1);
}

#[tokio::test]
async fn test_suppress_round_trip() {
    let output = transcode(vec![upstream_body()], ReasoningMode::Suppress).await;
    assert_eq!(content_of(&output), "Die Antwort ist 42.");
    let text = String::from_utf8(output).unwrap();
    assert!(!text.contains("reasoning_content"));
    assert!(!text.contains("denke"));
}
