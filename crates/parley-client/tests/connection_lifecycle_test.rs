//! Integration tests for the shared connection and its manager.
//!
//! # Oracle Pattern
//!
//! Tests end with oracle checks that verify:
//! - Exactly one physical connection exists per manager
//! - Subscriber registrations never outlive their views
//! - Emitted requests reach the transport queue unchanged

use std::sync::{Arc, Mutex};

use parley_client::{
    ClientConfig, Connection, ConnectionManager, Connector, Message, OutboundQueue, Scope,
    SendMessage,
};
use parley_proto::Envelope;

/// Connector that hands out in-process connections and keeps their queues.
#[derive(Clone, Default)]
struct LoopbackConnector {
    queues: Arc<Mutex<Vec<OutboundQueue>>>,
}

impl Connector for LoopbackConnector {
    fn connect(&self, _config: &ClientConfig) -> Connection {
        let (connection, queue) = Connection::new();
        self.queues.lock().unwrap().push(queue);
        connection
    }
}

fn manager() -> (ConnectionManager<LoopbackConnector>, LoopbackConnector) {
    let config = ClientConfig::new(ClientConfig::parse_url("http://localhost:3000").unwrap());
    let connector = LoopbackConnector::default();
    (ConnectionManager::new(config, connector.clone()), connector)
}

fn pushed(scope: &str, body: &str) -> Message {
    serde_json::from_value(serde_json::json!({
        "slug": scope,
        "name": "mina",
        "message": body,
        "createdAt": "2024-03-12T12:00:00Z",
    }))
    .unwrap()
}

#[test]
fn views_share_one_connection() {
    let (manager, connector) = manager();

    let handles: Vec<_> = (0..5).map(|_| manager.get_connection()).collect();

    assert!(handles.windows(2).all(|pair| pair[0].same_as(&pair[1])));
    assert_eq!(connector.queues.lock().unwrap().len(), 1);
}

#[test]
fn repeated_open_close_does_not_leak_subscribers() {
    let (manager, _connector) = manager();
    let connection = manager.get_connection();
    let baseline = connection.subscriber_count();

    for _ in 0..100 {
        let subscription = manager.get_connection().subscribe();
        assert_eq!(connection.subscriber_count(), baseline + 1);
        drop(subscription);
    }

    assert_eq!(connection.subscriber_count(), baseline);
}

#[test]
fn emitted_request_reaches_transport() {
    let (manager, connector) = manager();
    let request = SendMessage::new(Scope::new("demo"), "mina", " hello ", None).unwrap();

    manager.get_connection().emit(request.clone()).unwrap();

    let mut queues = connector.queues.lock().unwrap();
    assert_eq!(queues[0].try_recv(), Some(Envelope::SendMessage(request)));
}

#[tokio::test]
async fn subscriber_wakes_on_dispatch() {
    let (connection, _queue) = Connection::new();
    let mut subscription = connection.subscribe();

    let transport = connection.clone();
    tokio::spawn(async move {
        transport.dispatch(Envelope::NewMessage(pushed("demo", "hello")));
    });

    let message = subscription.recv().await.unwrap();
    assert_eq!(message.body, "hello");
}

#[tokio::test]
async fn closed_subscription_receives_nothing_more() {
    let (connection, _queue) = Connection::new();
    let mut kept = connection.subscribe();
    let dropped = connection.subscribe();
    drop(dropped);

    connection.dispatch(Envelope::NewMessage(pushed("demo", "after close")));

    assert_eq!(connection.subscriber_count(), 1);
    assert_eq!(kept.recv().await.map(|m| m.body), Some("after close".to_string()));
}
