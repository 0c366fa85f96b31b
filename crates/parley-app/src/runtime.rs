//! Generic runtime for conversation orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Conversations`]: view state machines
//! - [`ConnectionManager`]: the process-wide live channel
//! - [`HistoryLoader`]: history fetches, run as spawned tasks
//! - [`Driver`]: user-facing I/O
//!
//! Only the loop task touches view state. History results come back through a
//! channel tagged with the view token they were requested for.

use std::{sync::Arc, time::Duration};

use parley_client::{ConnectionManager, ConnectionStatus, Connector, HistoryLoader, Subscription};
use parley_proto::{Message, Scope};
use tokio::{
    sync::{mpsc, watch},
    time::{self, MissedTickBehavior},
};

use crate::{
    ConversationView, Conversations, Driver, UserInput, ViewAction, ViewConfig, ViewEvent,
    ViewToken,
};

/// How often delivery deadlines are checked.
const TICK_PERIOD: Duration = Duration::from_millis(500);

/// The open conversation and its push subscription.
struct Active {
    token: ViewToken,
    subscription: Subscription,
}

/// Generic runtime that orchestrates views, the shared connection and a
/// driver.
///
/// # Type Parameters
///
/// - `D`: User-facing I/O driver
/// - `C`: Connector the shared connection is created with
pub struct Runtime<D, C>
where
    D: Driver,
    C: Connector,
{
    driver: D,
    connections: Arc<ConnectionManager<C>>,
    loader: Arc<dyn HistoryLoader>,
    conversations: Conversations,
    active: Option<Active>,
    status: Option<watch::Receiver<ConnectionStatus>>,
    results_tx: mpsc::UnboundedSender<(ViewToken, ViewEvent)>,
    results_rx: mpsc::UnboundedReceiver<(ViewToken, ViewEvent)>,
    tick_period: Duration,
}

impl<D, C> Runtime<D, C>
where
    D: Driver,
    C: Connector,
{
    /// Create a runtime. No connection is made until a view opens.
    pub fn new(
        driver: D,
        connections: Arc<ConnectionManager<C>>,
        loader: Arc<dyn HistoryLoader>,
        config: ViewConfig,
    ) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            driver,
            connections,
            loader,
            conversations: Conversations::new(config),
            active: None,
            status: None,
            results_tx,
            results_rx,
            tick_period: TICK_PERIOD,
        }
    }

    /// Override how often delivery deadlines are checked.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Run the event loop until the driver runs out of input or the user
    /// quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to read input or render.
    pub async fn run(mut self) -> Result<(), D::Error> {
        self.render()?;

        let mut ticks = time::interval(self.tick_period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                input = self.driver.next_input() => {
                    let Some(input) = input? else { break };
                    if self.handle_input(input)? {
                        break;
                    }
                },
                Some(message) = next_push(&mut self.active) => {
                    self.handle_push(message)?;
                },
                Ok(()) = status_changed(&mut self.status) => {
                    self.render()?;
                },
                Some((token, event)) = self.results_rx.recv() => {
                    let actions = self.conversations.handle(token, event);
                    self.execute(token, actions)?;
                },
                _ = ticks.tick() => {
                    let now = self.driver.now();
                    for (token, action) in self.conversations.tick(now) {
                        self.execute(token, vec![action])?;
                    }
                },
            }
        }

        self.close();
        self.driver.stop();
        Ok(())
    }

    /// Apply one user intent.
    ///
    /// Returns `true` if the runtime should stop.
    fn handle_input(&mut self, input: UserInput) -> Result<bool, D::Error> {
        let now = self.driver.now();
        match input {
            UserInput::Quit => return Ok(true),
            UserInput::Open(scope) => self.open(scope)?,
            UserInput::Close => {
                self.close();
                self.render()?;
            },
            UserInput::SetAuthorName(name) => {
                self.conversations.set_author_name(&name);
                self.render()?;
            },
            UserInput::Draft(text) => self.on_active(|view| view.set_draft(text))?,
            UserInput::Submit => self.on_active(|view| view.submit(now))?,
            UserInput::Retry => self.on_active(|view| view.retry(now))?,
            UserInput::DismissFailed => self.on_active(ConversationView::dismiss_failed)?,
        }
        Ok(false)
    }

    /// Close the active view, if any, and open one for `scope`.
    ///
    /// The push subscription is registered before the history request goes
    /// out, so nothing sent in between is missed.
    fn open(&mut self, scope: Scope) -> Result<(), D::Error> {
        self.close();

        let connection = self.connections.get_connection();
        if self.status.is_none() {
            self.status = Some(connection.status_changes());
        }
        let subscription = connection.subscribe();
        let (token, actions) = self.conversations.open(scope);
        self.active = Some(Active { token, subscription });
        self.execute(token, actions)
    }

    /// Close the active view. Its subscription is released first, then the
    /// view itself; in-flight loads for it are discarded on arrival.
    fn close(&mut self) {
        if let Some(Active { token, subscription }) = self.active.take() {
            drop(subscription);
            self.conversations.close(token);
        }
    }

    fn handle_push(&mut self, message: Message) -> Result<(), D::Error> {
        let Some(token) = self.active.as_ref().map(|a| a.token) else {
            return Ok(());
        };
        let actions = self.conversations.handle(token, ViewEvent::MessagePushed(message));
        self.execute(token, actions)
    }

    fn on_active(
        &mut self,
        f: impl FnOnce(&mut ConversationView) -> Vec<ViewAction>,
    ) -> Result<(), D::Error> {
        let Some(token) = self.active.as_ref().map(|a| a.token) else {
            tracing::debug!("no conversation open, ignoring input");
            return Ok(());
        };
        let actions = self.conversations.view_mut(token).map(f).unwrap_or_default();
        self.execute(token, actions)
    }

    /// Execute actions produced by the view with `token`, feeding follow-up
    /// events back into it.
    fn execute(&mut self, token: ViewToken, actions: Vec<ViewAction>) -> Result<(), D::Error> {
        let mut pending = actions;

        while !pending.is_empty() {
            for action in std::mem::take(&mut pending) {
                match action {
                    ViewAction::Render => self.render()?,
                    ViewAction::LoadHistory { scope, ticket } => {
                        let loader = Arc::clone(&self.loader);
                        let results = self.results_tx.clone();
                        tokio::spawn(async move {
                            let event = match loader.load_history(&scope).await {
                                Ok(messages) => ViewEvent::HistoryLoaded { ticket, messages },
                                Err(error) => ViewEvent::HistoryFailed { ticket, error },
                            };
                            if results.send((token, event)).is_err() {
                                tracing::debug!(%token, "runtime gone, dropping history result");
                            }
                        });
                    },
                    ViewAction::Emit(request) => {
                        let request_id = request.request_id;
                        let result = self.connections.get_connection().emit(request);
                        pending.extend(
                            self.conversations
                                .handle(token, ViewEvent::SendDispatched { request_id, result }),
                        );
                    },
                }
            }
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), D::Error> {
        let view = self.active.as_ref().and_then(|a| self.conversations.view(a.token));
        let status = self.status.as_ref().map(|rx| *rx.borrow());
        self.driver.render(view, status)
    }

    /// Open views.
    pub fn conversations(&self) -> &Conversations {
        &self.conversations
    }

    /// The active view, if one is open.
    pub fn active_view(&self) -> Option<&ConversationView> {
        self.active.as_ref().and_then(|a| self.conversations.view(a.token))
    }
}

/// Resolves when the connection status changes. Pends forever until a
/// connection exists.
async fn status_changed(
    status: &mut Option<watch::Receiver<ConnectionStatus>>,
) -> Result<(), watch::error::RecvError> {
    match status {
        Some(rx) => rx.changed().await,
        None => std::future::pending().await,
    }
}

/// Next push for the active view. Pends forever while no view is open.
async fn next_push(active: &mut Option<Active>) -> Option<Message> {
    match active {
        Some(active) => active.subscription.recv().await,
        None => std::future::pending().await,
    }
}
