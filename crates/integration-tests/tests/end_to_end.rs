//! Full path: QueueService -> SQLite store -> Dispatcher -> reqwest -> webhook

mod common;

use bytes::Bytes;
use common::Harness;
use hookq_core::application::shutdown_channel;
use hookq_core::domain::NewSubscriber;
use hookq_core::port::QueueStoreProvider;
use hookq_infra_http::HttpWebhookNotifier;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_message_is_posted_exactly_once() {
    let server = MockServer::start().await;
    let h = Harness::new().await;
    let queue = h.create_queue(1, "Q").await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(body_string("hello"))
        .and(header("x-hookq-queue-id", queue.id.to_string().as_str()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    h.service
        .send_message(queue.id, Bytes::from("hello"), Duration::ZERO)
        .await
        .unwrap();
    h.service
        .add_subscriber(
            queue.id,
            NewSubscriber::new(format!("{}/hook", server.uri())),
        )
        .await
        .unwrap();

    let dispatcher = h.dispatcher(Arc::new(HttpWebhookNotifier::with_defaults().unwrap()));
    let (_tx, token) = shutdown_channel();
    let report = dispatcher.tick(&token).await.unwrap();
    assert_eq!(report.deliveries_started, 1);

    let store = h.registry.open(queue.store_key()).await.unwrap();
    assert_eq!(store.count().await.unwrap().total(), 0);

    // A second sweep finds nothing to send
    dispatcher.tick(&token).await.unwrap();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while server.received_requests().await.unwrap_or_default().is_empty() {
        assert!(tokio::time::Instant::now() < deadline, "webhook never called");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    server.verify().await;
}

#[tokio::test]
async fn test_rejecting_endpoint_loses_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let h = Harness::new().await;
    let queue = h.create_queue(1, "Q").await;
    h.service
        .add_subscriber(queue.id, NewSubscriber::new(server.uri()))
        .await
        .unwrap();
    h.service
        .send_message(queue.id, Bytes::from("x"), Duration::ZERO)
        .await
        .unwrap();

    let dispatcher = h.dispatcher(Arc::new(HttpWebhookNotifier::with_defaults().unwrap()));
    let (_tx, token) = shutdown_channel();
    dispatcher.tick(&token).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    dispatcher.tick(&token).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    server.verify().await;
    let store = h.registry.open(queue.store_key()).await.unwrap();
    assert_eq!(store.count().await.unwrap().total(), 0);
}

#[tokio::test]
async fn test_deleted_queue_is_never_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = Harness::new().await;
    let queue = h.create_queue(1, "Q").await;
    h.service
        .add_subscriber(queue.id, NewSubscriber::new(server.uri()))
        .await
        .unwrap();
    h.service
        .send_message(queue.id, Bytes::from("x"), Duration::ZERO)
        .await
        .unwrap();
    h.service.delete_queue(queue.id).await.unwrap();

    let dispatcher = h.dispatcher(Arc::new(HttpWebhookNotifier::with_defaults().unwrap()));
    let (_tx, token) = shutdown_channel();
    let report = dispatcher.tick(&token).await.unwrap();
    assert_eq!(report.queues_scanned, 0);

    tokio::time::sleep(Duration::from_millis(100)).await;
    server.verify().await;
}
