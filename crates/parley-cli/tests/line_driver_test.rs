//! Integration tests for the line driver under the real runtime.

use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use parley_app::{Runtime, ViewConfig};
use parley_cli::LineDriver;
use parley_client::{
    ClientConfig, Connection, ConnectionManager, Connector, HistoryLoader, LoadError, Message,
    OutboundQueue, Scope,
};
use parley_proto::Envelope;
use tokio::io::AsyncBufReadExt;

/// Writer shared with the test after the runtime consumes the driver.
#[derive(Clone, Default)]
struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

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

struct EmptyLoader;

#[async_trait]
impl HistoryLoader for EmptyLoader {
    async fn fetch(&self, _scope: &Scope) -> Result<Vec<Message>, LoadError> {
        Ok(vec![])
    }
}

async fn run(input: &'static str) -> (SharedOutput, LoopbackConnector) {
    let config = ClientConfig::new(ClientConfig::parse_url("http://localhost:3000").unwrap());
    let connector = LoopbackConnector::default();
    let connections = Arc::new(ConnectionManager::new(config, connector.clone()));
    let output = SharedOutput::default();

    let driver = LineDriver::new(input.as_bytes().lines(), output.clone());
    Runtime::new(driver, connections, Arc::new(EmptyLoader), ViewConfig::default())
        .run()
        .await
        .unwrap();

    (output, connector)
}

#[tokio::test]
async fn typed_line_is_sent() {
    let (output, connector) = run("/open demo\n  hello  \n").await;

    let mut queues = connector.queues.lock().unwrap();
    let Some(Envelope::SendMessage(request)) = queues[0].try_recv() else {
        panic!("expected a send request");
    };
    assert_eq!(request.scope, Scope::new("demo"));
    assert_eq!(request.author, "Anonymous");
    assert_eq!(request.body, "hello");
    assert!(output.text().contains("== demo == (as Anonymous)"));
}

#[tokio::test]
async fn unknown_command_is_reported_and_ignored() {
    let (output, connector) = run("/bogus\n/quit\nnever sent\n").await;

    assert!(output.text().contains("unknown command /bogus (try /help)"));
    assert!(connector.queues.lock().unwrap().is_empty(), "no view opened, no connection made");
}

#[tokio::test]
async fn renamed_author_is_used_for_sends() {
    let (_, connector) = run("/name  Kim Mina \n/open demo\nhi\n").await;

    let mut queues = connector.queues.lock().unwrap();
    let Some(Envelope::SendMessage(request)) = queues[0].try_recv() else {
        panic!("expected a send request");
    };
    assert_eq!(request.author, "Kim Mina");
}
