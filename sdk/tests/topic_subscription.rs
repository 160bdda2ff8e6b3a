//! Topic subscription tests: reassembly over a live stream, reconnects,
//! cancellation, and terminal errors.

mod common;

use std::time::Duration;

use tokio::sync::mpsc;

use ledger_sdk::wire::{ChunkInfo, ConsensusTopicResponse};
use ledger_sdk::{
    AccountId, Error, Timestamp, TopicId, TopicMessage, TopicMessageQuery, TransactionId,
    TransportError,
};

use common::{client, MockTransport};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn notification(at: i64, body: &[u8], chunk: Option<(u32, u32)>) -> ConsensusTopicResponse {
    ConsensusTopicResponse {
        consensus_timestamp: Timestamp::new(at, 0),
        message: body.to_vec(),
        running_hash: vec![at as u8; 8],
        sequence_number: at as u64,
        chunk_info: chunk.map(|(number, total)| ChunkInfo {
            initial_transaction_id: TransactionId::with_valid_start(
                AccountId::from(2),
                Timestamp::new(1_700_000_000, 0),
            ),
            number,
            total,
        }),
    }
}

fn topic_query() -> TopicMessageQuery {
    let mut query = TopicMessageQuery::new();
    query.set_topic_id(TopicId::from(9));
    query
}

/// Subscribes with a handler that forwards every message into a channel.
fn subscribe_into(
    query: &TopicMessageQuery,
    client: &ledger_sdk::Client,
) -> (ledger_sdk::SubscriptionHandle, mpsc::UnboundedReceiver<TopicMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = query
        .subscribe(client, move |message| {
            let _ = tx.send(message);
        })
        .unwrap();
    (handle, rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<TopicMessage>) -> Vec<TopicMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chunked_messages_are_delivered_whole() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(
        vec![
            Ok(notification(11, b"world", Some((2, 2)))),
            Ok(notification(12, b"solo", None)),
            Ok(notification(13, b"hello ", Some((1, 2)))),
        ],
        false,
    );

    let (handle, mut rx) = subscribe_into(&topic_query(), &client);
    handle.join().await;

    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].contents, b"solo");
    assert!(messages[0].chunks.is_none());

    let chunked = &messages[1];
    assert_eq!(chunked.contents, b"hello world");
    assert_eq!(chunked.consensus_timestamp, Timestamp::new(13, 0));
    assert_eq!(chunked.chunks.as_ref().map(Vec::len), Some(2));
}

#[tokio::test(start_paused = true)]
async fn broken_stream_resumes_after_the_last_timestamp() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(
        vec![
            Ok(notification(10, b"first", None)),
            Err(TransportError::StreamReset("rst".into())),
        ],
        false,
    );
    transport.push_stream(vec![Ok(notification(20, b"second", None))], false);

    let mut query = topic_query();
    query.set_limit(5).set_start_time(Timestamp::new(1, 0));
    let (handle, mut rx) = subscribe_into(&query, &client);
    handle.join().await;

    let contents: Vec<Vec<u8>> = drain(&mut rx).into_iter().map(|m| m.contents).collect();
    assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec()]);

    let queries = transport.topic_queries.lock().clone();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0].consensus_start_time, Some(Timestamp::new(1, 0)));
    assert_eq!(queries[0].limit, 5);
    assert_eq!(queries[1].consensus_start_time, Some(Timestamp::new(10, 1)));
    assert_eq!(queries[1].limit, 4);
}

#[tokio::test(start_paused = true)]
async fn partial_message_survives_a_reconnect() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(
        vec![
            Ok(notification(10, b"ab", Some((1, 2)))),
            Err(TransportError::Unavailable("gone".into())),
        ],
        false,
    );
    transport.push_stream(vec![Ok(notification(11, b"cd", Some((2, 2))))], false);

    let (handle, mut rx) = subscribe_into(&topic_query(), &client);
    handle.join().await;

    let messages = drain(&mut rx);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].contents, b"abcd");
}

#[tokio::test]
async fn unsubscribe_stops_an_open_stream() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(vec![Ok(notification(10, b"only", None))], true);

    let (handle, mut rx) = subscribe_into(&topic_query(), &client);
    let first = rx.recv().await.unwrap();
    assert_eq!(first.contents, b"only");

    handle.unsubscribe();
    tokio::time::timeout(Duration::from_secs(5), handle.join())
        .await
        .expect("subscription should stop after unsubscribe");
    assert_eq!(transport.topic_queries.lock().len(), 1);
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_subscription() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(vec![Ok(notification(10, b"only", None))], true);

    let (handle, mut rx) = subscribe_into(&topic_query(), &client);
    assert!(rx.recv().await.is_some());

    drop(handle);
    // The handler (and its sender) is dropped when the task exits.
    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
    assert!(matches!(closed, Ok(None)));
}

#[tokio::test]
async fn non_retryable_stream_error_reaches_the_error_handler() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    transport.push_stream(vec![Err(TransportError::Internal("boom".into()))], false);

    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    let mut query = topic_query();
    query.set_error_handler(move |error: &Error| {
        let _ = err_tx.send(error.to_string());
    });
    let (handle, _rx) = subscribe_into(&query, &client);
    handle.join().await;

    let reported = err_rx.try_recv().unwrap();
    assert!(reported.contains("boom"));
    assert_eq!(transport.topic_queries.lock().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn reconnects_give_up_after_max_attempts() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);
    for _ in 0..3 {
        transport.push_stream(vec![Err(TransportError::Unavailable("down".into()))], false);
    }

    let (err_tx, mut err_rx) = mpsc::unbounded_channel();
    let mut query = topic_query();
    query
        .set_max_attempts(2)
        .set_max_backoff(Duration::from_millis(500))
        .set_error_handler(move |error: &Error| {
            let _ = err_tx.send(matches!(error, Error::Stream { .. }));
        });
    let (handle, _rx) = subscribe_into(&query, &client);
    handle.join().await;

    assert_eq!(err_rx.try_recv(), Ok(true));
    assert_eq!(transport.topic_queries.lock().len(), 3);
}

#[tokio::test]
async fn subscribing_needs_a_topic() {
    let transport = MockTransport::new();
    let (client, _) = client(&transport, &[3]);

    let err = TopicMessageQuery::new().subscribe(&client, |_| {}).unwrap_err();
    assert!(err.is_configuration());
}
