// Integration tests for `StreamManager` against a wiremock SSE endpoint.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use filmdeck_api::{BackendClient, Error, StreamManager, StreamMessage, StreamSubscription};

async fn setup() -> (MockServer, StreamManager) {
    let server = MockServer::start().await;
    let client = BackendClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, StreamManager::new(&client))
}

async fn collect(mut handle: filmdeck_api::StreamHandle) -> Vec<StreamMessage> {
    let mut messages = Vec::new();
    while let Some(message) = tokio::time::timeout(Duration::from_secs(5), handle.recv())
        .await
        .unwrap()
    {
        messages.push(message);
    }
    messages
}

#[tokio::test]
async fn test_events_arrive_in_order_then_end() {
    let (server, manager) = setup().await;

    let body = "event: current_frame_index\ndata: 120\n\n\
                event: current_frame_index\ndata: 121\n\n\
                event: time_remaining\ndata: 0:01:02\n\n";

    Mock::given(method("GET"))
        .and(path("/dashboard-sse"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let handle = manager.open(StreamSubscription::new("dashboard-sse")).unwrap();
    let messages = collect(handle).await;

    let events: Vec<(String, String)> = messages
        .iter()
        .filter_map(|m| match m {
            StreamMessage::Event(e) => Some((e.name.clone(), e.data.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        events,
        vec![
            ("current_frame_index".to_owned(), "120".to_owned()),
            ("current_frame_index".to_owned(), "121".to_owned()),
            ("time_remaining".to_owned(), "0:01:02".to_owned()),
        ]
    );
    assert!(matches!(messages.last(), Some(StreamMessage::Ended)));
    assert!(!manager.is_open("dashboard-sse"));
}

#[tokio::test]
async fn test_per_resource_stream_names_events() {
    let (server, manager) = setup().await;

    Mock::given(method("GET"))
        .and(path("/light-stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("data: False \n\ndata: True \n\n", "text/event-stream"),
        )
        .mount(&server)
        .await;

    let handle = manager
        .open(StreamSubscription::new("light-stream").unnamed_as("light_active"))
        .unwrap();
    let messages = collect(handle).await;

    let names: Vec<&str> = messages
        .iter()
        .filter_map(|m| match m {
            StreamMessage::Event(e) => Some(e.name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["light_active", "light_active"]);
}

#[tokio::test]
async fn test_missing_endpoint_fails_and_closes() {
    let (server, manager) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dashboard-sse"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut handle = manager.open(StreamSubscription::new("dashboard-sse")).unwrap();
    let message = tokio::time::timeout(Duration::from_secs(5), handle.recv())
        .await
        .unwrap();

    assert!(matches!(
        message,
        Some(StreamMessage::Failed(Error::StreamConnect(_)))
    ));
    assert!(handle.is_closed());
    assert!(!handle.close());
    assert!(!manager.is_open("dashboard-sse"));
}

#[tokio::test]
async fn test_close_before_connect_is_safe() {
    let (server, manager) = setup().await;

    Mock::given(method("GET"))
        .and(path("/dashboard-sse"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("event: is_scanning\ndata: True\n\n", "text/event-stream")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut handle = manager.open(StreamSubscription::new("dashboard-sse")).unwrap();
    assert!(handle.close());
    assert!(!handle.close());

    // The reader task exits without delivering anything.
    let next = tokio::time::timeout(Duration::from_secs(5), handle.recv())
        .await
        .unwrap();
    assert!(next.is_none());
}
