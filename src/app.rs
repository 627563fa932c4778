use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::api::{VoteChoice, VoteClient};
use crate::display::DisplayState;
use crate::poller::{self, ClientEvent, PollerHandle};
use crate::status::StatusReporter;

/// How long a status message stays on screen
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
}

pub struct App {
    pub popup: Popup,

    /// Choice highlighted in the vote bar (Enter casts it)
    pub selected: VoteChoice,

    // Latest rendered results; None until the first successful fetch
    pub display: Option<DisplayState>,
    pub status: StatusReporter,

    client: VoteClient,
    events_tx: UnboundedSender<ClientEvent>,
    events_rx: UnboundedReceiver<ClientEvent>,
    poller: Option<PollerHandle>,
}

impl App {
    pub fn new(client: VoteClient) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            popup: Popup::None,
            selected: VoteChoice::Dogs,
            display: None,
            status: StatusReporter::default(),
            client,
            events_tx,
            events_rx,
            poller: None,
        }
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url().as_str()
    }

    /// Fetch and render once, then keep polling in the background
    pub async fn start_polling(&mut self, every: Duration) {
        let handle = poller::start(self.client.clone(), self.events_tx.clone(), every).await;
        self.poller = Some(handle);
        self.drain_events();
    }

    pub fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| p.is_running())
    }

    pub fn submit_vote(&mut self, choice: VoteChoice) {
        self.selected = choice;
        self.status.info(format!("Voting for {}...", choice));
        poller::spawn_vote(self.client.clone(), choice, self.events_tx.clone());
    }

    pub fn refresh_now(&mut self) {
        poller::spawn_refresh(self.client.clone(), self.events_tx.clone());
    }

    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Results(Ok(snapshot)) => {
                self.display = Some(DisplayState::from_snapshot(&snapshot, Local::now()));
            }
            ClientEvent::Results(Err(e)) => {
                self.status.warning(format!("Cannot connect to API: {}", e));
            }
            ClientEvent::VoteCast { choice, result: Ok(()) } => {
                self.status.success(format!("Vote recorded for {}!", choice));
                self.refresh_now();
            }
            ClientEvent::VoteCast { choice, result: Err(e) } => {
                self.status.error(format!("Vote for {} failed: {}", choice, e));
            }
            ClientEvent::TaskFailed(reason) => {
                self.status.error(format!("Unexpected error: {}", reason));
            }
        }
    }

    /// Apply every background result that has arrived so far
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    pub fn tick(&mut self) {
        self.drain_events();
        self.status.expire(STATUS_TIMEOUT);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup != Popup::None {
            self.handle_popup_key(key);
        } else {
            self.handle_normal_key(key);
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                self.selected = self.selected.other();
            }
            KeyCode::Char('h') => self.selected = VoteChoice::Dogs,
            KeyCode::Char('l') => self.selected = VoteChoice::Cats,

            KeyCode::Char(' ') | KeyCode::Enter => self.submit_vote(self.selected),
            KeyCode::Char('d') | KeyCode::Char('1') => self.submit_vote(VoteChoice::Dogs),
            KeyCode::Char('c') | KeyCode::Char('2') => self.submit_vote(VoteChoice::Cats),

            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.status.info("Refreshing results...");
                self.refresh_now();
            }

            KeyCode::Char('?') => self.popup = Popup::Help,

            _ => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        match self.popup {
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
            }
            Popup::None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ResultsSnapshot};
    use crate::config::ApiBaseUrl;
    use crate::status::Severity;
    use crossterm::event::KeyModifiers;
    use mockito::Server;
    use reqwest::StatusCode;
    use tokio::time::timeout;

    fn app_for(url: String) -> App {
        App::new(VoteClient::new(ApiBaseUrl::new(url), Duration::from_secs(5)).unwrap())
    }

    async fn next_event(app: &mut App) -> ClientEvent {
        timeout(Duration::from_secs(5), app.events_rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_failed_vote_keeps_display_and_shows_error() {
        let mut app = app_for("http://127.0.0.1:9".to_string());
        app.handle_event(ClientEvent::Results(Ok(ResultsSnapshot::new(3, 1))));
        let before = app.display.clone();

        app.handle_event(ClientEvent::VoteCast {
            choice: VoteChoice::Cats,
            result: Err(ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        });

        assert_eq!(app.display, before);
        let error = app.status.error_line().expect("error should be visible");
        assert!(error.text.contains("500"));
        assert!(app.status.status_line().is_none());
    }

    #[tokio::test]
    async fn test_successful_vote_triggers_one_extra_fetch() {
        let mut server = Server::new_async().await;
        let results = server
            .mock("GET", "/results")
            .with_status(200)
            .with_body(r#"{"dogs": 4, "cats": 1}"#)
            .expect(1)
            .create_async()
            .await;
        let mut app = app_for(server.url());

        app.handle_event(ClientEvent::VoteCast {
            choice: VoteChoice::Dogs,
            result: Ok(()),
        });
        assert_eq!(app.status.current().unwrap().severity, Severity::Success);

        let event = next_event(&mut app).await;
        app.handle_event(event);

        // Nothing else should follow
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(app.drain_events(), 0);

        results.assert_async().await;
        assert_eq!(app.display.as_ref().unwrap().total, 5);
    }

    #[tokio::test]
    async fn test_vote_key_posts_then_refreshes() {
        let mut server = Server::new_async().await;
        let vote = server
            .mock("POST", "/vote")
            .with_status(200)
            .with_body(r#"{"success": true}"#)
            .expect(1)
            .create_async()
            .await;
        let _results = server
            .mock("GET", "/results")
            .with_status(200)
            .with_body(r#"{"dogs": 0, "cats": 1}"#)
            .create_async()
            .await;
        let mut app = app_for(server.url());

        app.handle_key(key(KeyCode::Char('c')));
        assert_eq!(app.selected, VoteChoice::Cats);
        assert_eq!(app.status.current().unwrap().text, "Voting for cats...");

        let event = next_event(&mut app).await;
        assert!(matches!(event, ClientEvent::VoteCast { choice: VoteChoice::Cats, result: Ok(()) }));
        app.handle_event(event);

        let event = next_event(&mut app).await;
        app.handle_event(event);

        vote.assert_async().await;
        let display = app.display.as_ref().unwrap();
        assert_eq!(display.row(VoteChoice::Cats).percent_text(), "100.0%");
    }

    #[tokio::test]
    async fn test_poll_failure_warns_and_keeps_display() {
        let mut app = app_for("http://127.0.0.1:9".to_string());
        app.handle_event(ClientEvent::Results(Ok(ResultsSnapshot::new(2, 2))));
        let before = app.display.clone();

        app.handle_event(ClientEvent::Results(Err(ApiError::Network("connection refused".to_string()))));

        assert_eq!(app.display, before);
        let status = app.status.status_line().unwrap();
        assert_eq!(status.severity, Severity::Warning);
        assert!(status.text.starts_with("Cannot connect to API"));
    }

    #[tokio::test]
    async fn test_start_polling_renders_before_returning() {
        let mut server = Server::new_async().await;
        let _results = server
            .mock("GET", "/results")
            .with_status(200)
            .with_body(r#"{"dogs": 3, "cats": 1}"#)
            .create_async()
            .await;
        let mut app = app_for(server.url());

        app.start_polling(Duration::from_secs(3600)).await;

        assert_eq!(app.display.as_ref().unwrap().total, 4);
        assert!(app.is_polling());
        app.stop_polling();
        assert!(!app.is_polling());
    }

    #[tokio::test]
    async fn test_panicked_refresh_lands_on_error_line() {
        let mut app = app_for("http://127.0.0.1:9".to_string());
        app.handle_event(ClientEvent::Results(Ok(ResultsSnapshot::new(1, 1))));
        let before = app.display.clone();

        poller::spawn_reported(app.events_tx.clone(), async {
            panic!("index out of bounds");
        });
        let event = next_event(&mut app).await;
        app.handle_event(event);

        assert_eq!(app.display, before);
        assert_eq!(
            app.status.error_line().unwrap().text,
            "Unexpected error: index out of bounds"
        );
        assert!(app.status.status_line().is_none());
    }

    #[tokio::test]
    async fn test_selection_and_help_keys() {
        let mut app = app_for("http://127.0.0.1:9".to_string());

        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.selected, VoteChoice::Cats);
        app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(app.selected, VoteChoice::Dogs);

        app.handle_key(key(KeyCode::Char('?')));
        assert_eq!(app.popup, Popup::Help);
        // Vote keys are ignored while help is open
        app.handle_key(key(KeyCode::Char('d')));
        assert!(app.status.current().is_none());
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.popup, Popup::None);
    }
}
