//! Periodic results polling
//!
//! The poller fetches once up front, then ticks on a fixed interval. Every
//! tick spawns its own request, so slow responses can overlap and land out of
//! order; whichever arrives last wins.

use std::any::Any;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::api::{ApiResult, ResultsSnapshot, VoteChoice, VoteClient};

/// Outcome of a background request, applied by the app on its own loop
#[derive(Debug)]
pub enum ClientEvent {
    Results(ApiResult<ResultsSnapshot>),
    VoteCast {
        choice: VoteChoice,
        result: ApiResult<()>,
    },
    /// A background task panicked before it could report
    TaskFailed(String),
}

/// Owned handle to the polling task
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn send(events: &UnboundedSender<ClientEvent>, event: ClientEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Event dropped, the app already shut down");
    }
}

fn panic_text(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "background task panicked".to_string()
    }
}

/// Spawn `work` and turn a panic inside it into a `TaskFailed` event
pub fn spawn_reported<F>(events: UnboundedSender<ClientEvent>, work: F) -> JoinHandle<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(work);
    tokio::spawn(async move {
        match task.await {
            Ok(()) => {}
            Err(e) if e.is_panic() => {
                let text = panic_text(e.into_panic());
                tracing::error!("Background task panicked: {}", text);
                send(&events, ClientEvent::TaskFailed(text));
            }
            Err(e) => tracing::debug!("Background task cancelled: {}", e),
        }
    })
}

/// Fetch results once in the background and report them
pub fn spawn_refresh(client: VoteClient, events: UnboundedSender<ClientEvent>) -> JoinHandle<()> {
    let reply = events.clone();
    spawn_reported(events, async move {
        let result = client.fetch_results().await;
        send(&reply, ClientEvent::Results(result));
    })
}

/// Cast a vote in the background and report the outcome
pub fn spawn_vote(
    client: VoteClient,
    choice: VoteChoice,
    events: UnboundedSender<ClientEvent>,
) -> JoinHandle<()> {
    let reply = events.clone();
    spawn_reported(events, async move {
        let result = client.submit_vote(choice).await;
        send(&reply, ClientEvent::VoteCast { choice, result });
    })
}

/// Run the initial fetch to completion, then start the repeating poll.
pub async fn start(
    client: VoteClient,
    events: UnboundedSender<ClientEvent>,
    every: Duration,
) -> PollerHandle {
    let initial = client.fetch_results().await;
    send(&events, ClientEvent::Results(initial));

    tracing::info!(
        "Polling {} every {}ms",
        client.base_url(),
        every.as_millis()
    );

    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately; the initial fetch already covered it
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if events.is_closed() {
                tracing::debug!("Event channel closed, poller exiting");
                break;
            }

            spawn_refresh(client.clone(), events.clone());
        }
    });

    PollerHandle { task }
}
