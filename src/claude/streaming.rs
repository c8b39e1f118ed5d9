// Claude SSE line reader and chunk pipeline
// Author: kelexine (https://github.com/kelexine)

use crate::error::{ProxyError, Result};
use crate::models::openai::{ChatCompletionChunk, Usage};
use crate::translation::streaming::{StreamStep, StreamTranslator};
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Raw upstream body, one line per item
pub type LineStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// What the producer hands to the client writer.
///
/// Exactly one of `Closed` or `Failed` ends every pipeline; both carry the
/// final usage so accounting reaches the caller without shared state.
#[derive(Debug)]
pub enum StreamSignal {
    Chunk(ChatCompletionChunk),
    Closed(Usage),
    Failed { error: ProxyError, usage: Usage },
}

/// Split a byte stream into lines (LF or CRLF). A trailing unterminated line is flushed at EOF.
pub fn split_lines<S, E>(byte_stream: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<ProxyError> + Send + 'static,
{
    async_stream::stream! {
        // Bytes, not String: a multi-byte character may straddle two chunks
        let mut buffer: Vec<u8> = Vec::new();
        let mut failed = false;

        futures::pin_mut!(byte_stream);

        while let Some(chunk_result) = byte_stream.next().await {
            match chunk_result {
                Ok(chunk) => {
                    buffer.extend_from_slice(&chunk);

                    while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buffer.drain(..=pos).collect();
                        yield Ok(decode_line(&line));
                    }
                }
                Err(e) => {
                    let error: ProxyError = e.into();
                    warn!("Stream error: {}", error);
                    yield Err(error);
                    failed = true;
                    break;
                }
            }
        }

        if !failed && !buffer.is_empty() {
            debug!("Flushing unterminated final line ({} bytes)", buffer.len());
            yield Ok(decode_line(&buffer));
        }

        debug!("Claude SSE body ended");
    }
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Spawn the producer task and return the consumer end of the bounded hand-off queue.
///
/// `usage` is the caller's accumulator; it is moved into the producer and
/// returned inside the terminal signal.
pub fn spawn_chunk_pipeline<S>(
    lines: S,
    translator: StreamTranslator,
    usage: Usage,
    capacity: usize,
) -> mpsc::Receiver<StreamSignal>
where
    S: Stream<Item = Result<String>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(run_chunk_pipeline(lines, translator, usage, tx));
    rx
}

/// Feed lines through the translator into `tx` until a terminal condition.
///
/// Stops reading (and drops the upstream body) as soon as the receiver is gone.
pub async fn run_chunk_pipeline<S>(
    lines: S,
    mut translator: StreamTranslator,
    mut usage: Usage,
    tx: mpsc::Sender<StreamSignal>,
) where
    S: Stream<Item = Result<String>> + Send,
{
    futures::pin_mut!(lines);
    let mut chunk_count = 0usize;

    loop {
        // Also wakes while the upstream is idle between lines
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Client disconnected after {} chunks, releasing upstream", chunk_count);
                return;
            }
            line = lines.next() => line,
        };

        let Some(line) = next else {
            break;
        };

        let line = match line {
            Ok(line) => line,
            Err(error) => {
                let _ = tx.send(StreamSignal::Failed { error, usage }).await;
                return;
            }
        };

        match translator.translate_line(&line, &mut usage) {
            Ok(StreamStep::Skip) => {}
            Ok(StreamStep::Chunk(chunk)) => {
                chunk_count += 1;
                if tx.send(StreamSignal::Chunk(chunk)).await.is_err() {
                    debug!("Client disconnected after {} chunks, releasing upstream", chunk_count);
                    return;
                }
            }
            Ok(StreamStep::Done) => {
                debug!("Stream closed after {} chunks, usage: {:?}", chunk_count, usage);
                let _ = tx.send(StreamSignal::Closed(usage)).await;
                return;
            }
            Err(error) => {
                warn!("Stream terminated after {} chunks: {}", chunk_count, error);
                let _ = tx.send(StreamSignal::Failed { error, usage }).await;
                return;
            }
        }
    }

    warn!("Claude stream ended without message_stop after {} chunks", chunk_count);
    let error = ProxyError::Decode("stream ended before message_stop".to_string());
    let _ = tx.send(StreamSignal::Failed { error, usage }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const MESSAGE_START: &str = r#"data: {"type":"message_start","message":{"id":"msg_1","role":"assistant","usage":{"input_tokens":10,"output_tokens":1}}}"#;
    const TEXT_DELTA: &str = r#"data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}"#;
    const MESSAGE_DELTA: &str = r#"data: {"type":"message_delta","delta":{"stop_reason":"end_turn"},"usage":{"output_tokens":3}}"#;
    const MESSAGE_STOP: &str = r#"data: {"type":"message_stop"}"#;

    fn bytes_stream(chunks: Vec<&'static [u8]>) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        futures::stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from_static(c))))
    }

    fn line_stream(lines: Vec<&'static str>) -> impl Stream<Item = Result<String>> + Send + 'static {
        futures::stream::iter(lines.into_iter().map(|l| Ok(l.to_string())))
    }

    async fn collect(mut rx: mpsc::Receiver<StreamSignal>) -> Vec<StreamSignal> {
        let mut signals = Vec::new();
        while let Some(signal) = rx.recv().await {
            signals.push(signal);
        }
        signals
    }

    #[tokio::test]
    async fn test_split_lines_across_chunks() {
        let stream = split_lines(bytes_stream(vec![&b"event: ping\r\nda"[..], &b"ta: {}\n\n"[..], &b"tail"[..]]));
        let lines: Vec<String> = stream.map(|l| l.unwrap()).collect().await;

        assert_eq!(lines, vec!["event: ping", "data: {}", "", "tail"]);
    }

    #[tokio::test]
    async fn test_split_lines_keeps_split_utf8_intact() {
        // "é" is 0xC3 0xA9
        let stream = split_lines(bytes_stream(vec![&b"caf\xC3"[..], &b"\xA9\n"[..]]));
        let lines: Vec<String> = stream.map(|l| l.unwrap()).collect().await;

        assert_eq!(lines, vec!["café"]);
    }

    #[tokio::test]
    async fn test_split_lines_stops_on_error() {
        let chunks: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"one\npartial")),
            Err(ProxyError::Internal("connection reset".to_string())),
            Ok(Bytes::from_static(b"never\n")),
        ];
        let items: Vec<Result<String>> = split_lines(futures::stream::iter(chunks)).collect().await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "one");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_pipeline_full_stream() {
        let lines = line_stream(vec![
            "event: message_start",
            MESSAGE_START,
            "",
            ": keep-alive",
            "event: content_block_delta",
            TEXT_DELTA,
            MESSAGE_DELTA,
            MESSAGE_STOP,
            TEXT_DELTA,
        ]);

        let rx = spawn_chunk_pipeline(lines, StreamTranslator::new("m".to_string()), Usage::default(), 4);
        let signals = collect(rx).await;

        assert_eq!(signals.len(), 4);
        assert!(signals[..3].iter().all(|s| matches!(s, StreamSignal::Chunk(_))));
        match &signals[1] {
            StreamSignal::Chunk(chunk) => assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi")),
            other => panic!("Expected chunk, got {:?}", other),
        }
        match &signals[2] {
            StreamSignal::Chunk(chunk) => assert!(chunk.choices[0].finish_reason.is_some()),
            other => panic!("Expected chunk, got {:?}", other),
        }
        match &signals[3] {
            StreamSignal::Closed(usage) => assert_eq!(*usage, Usage::new(10, 3)),
            other => panic!("Expected Closed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pipeline_mid_stream_error() {
        let lines = line_stream(vec![
            MESSAGE_START,
            r#"data: {"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
            TEXT_DELTA,
            MESSAGE_STOP,
        ]);

        let rx = spawn_chunk_pipeline(lines, StreamTranslator::new("m".to_string()), Usage::default(), 4);
        let signals = collect(rx).await;

        assert_eq!(signals.len(), 2);
        match &signals[1] {
            StreamSignal::Failed { error: ProxyError::Provider(e), usage } => {
                assert_eq!(e.error.message, "Overloaded");
                assert_eq!(usage.prompt_tokens, 10);
            }
            other => panic!("Expected provider failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pipeline_eof_without_stop() {
        let lines = line_stream(vec![MESSAGE_START, TEXT_DELTA]);

        let rx = spawn_chunk_pipeline(lines, StreamTranslator::new("m".to_string()), Usage::default(), 4);
        let signals = collect(rx).await;

        assert_eq!(signals.len(), 3);
        assert!(matches!(
            signals[2],
            StreamSignal::Failed { error: ProxyError::Decode(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_pipeline_transport_error() {
        let lines = futures::stream::iter(vec![
            Ok(MESSAGE_START.to_string()),
            Err(ProxyError::Internal("reset".to_string())),
        ]);

        let rx = spawn_chunk_pipeline(lines, StreamTranslator::new("m".to_string()), Usage::default(), 4);
        let signals = collect(rx).await;

        assert_eq!(signals.len(), 2);
        assert!(matches!(
            signals[1],
            StreamSignal::Failed { error: ProxyError::Internal(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_pipeline_does_not_read_for_absent_client() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = pulled.clone();
        let lines = futures::stream::iter(0..).map(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(TEXT_DELTA.to_string())
        });

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        run_chunk_pipeline(lines, StreamTranslator::new("m".to_string()), Usage::default(), tx).await;

        assert_eq!(pulled.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pipeline_stops_while_upstream_is_idle() {
        let lines = futures::stream::iter(vec![Ok(TEXT_DELTA.to_string())]).chain(futures::stream::pending());
        let (tx, mut rx) = mpsc::channel(4);

        let handle = tokio::spawn(run_chunk_pipeline(
            lines,
            StreamTranslator::new("m".to_string()),
            Usage::default(),
            tx,
        ));

        assert!(matches!(rx.recv().await, Some(StreamSignal::Chunk(_))));
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("pipeline should stop without waiting for the next upstream line")
            .unwrap();
    }

    #[tokio::test]
    async fn test_pipeline_stops_after_client_disconnect() {
        let lines = futures::stream::iter(0..).map(|_| Ok(TEXT_DELTA.to_string()));
        let (tx, mut rx) = mpsc::channel(1);

        let handle = tokio::spawn(run_chunk_pipeline(
            lines,
            StreamTranslator::new("m".to_string()),
            Usage::default(),
            tx,
        ));

        assert!(matches!(rx.recv().await, Some(StreamSignal::Chunk(_))));
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("pipeline should stop once the client is gone")
            .unwrap();
    }
}
