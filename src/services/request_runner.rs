//! Background request runner
//!
//! Runs blocking API calls on worker threads and hands results back to the
//! event loop through a channel that is polled on every tick.

use crate::model::conversation::RequestId;
use crate::model::response::AgentResponse;
use crate::services::api::{ApiClient, ApiError, AuthStatus, DeviceCode, SavedQuery};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Result of a background request
#[derive(Debug)]
pub enum JobMessage {
    /// Answer to a chat prompt or a saved query, tagged with its request id
    Answer {
        id: RequestId,
        result: Result<AgentResponse, ApiError>,
    },
    AuthStatus(Result<AuthStatus, ApiError>),
    DeviceCode(Result<DeviceCode, ApiError>),
    Queries(Result<Vec<SavedQuery>, ApiError>),
}

pub struct RequestRunner {
    client: Arc<ApiClient>,
    sender: Sender<JobMessage>,
    receiver: Receiver<JobMessage>,
    pending: usize,
    /// Start of the oldest outstanding request
    started: Option<Instant>,
}

impl RequestRunner {
    pub fn new(client: ApiClient) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            client: Arc::new(client),
            sender,
            receiver,
            pending: 0,
            started: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    pub fn start_instant(&self) -> Option<Instant> {
        self.started
    }

    /// Run `job` on a worker thread
    pub fn spawn<F>(&mut self, job: F)
    where
        F: FnOnce(&ApiClient) -> JobMessage + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        let tx = self.sender.clone();

        thread::spawn(move || {
            let message = job(&client);
            let _ = tx.send(message);
        });

        self.pending += 1;
        self.started.get_or_insert_with(Instant::now);
    }

    /// Ask a chat question
    pub fn ask(&mut self, id: RequestId, prompt: String) {
        self.spawn(move |client| JobMessage::Answer {
            id,
            result: client.run_details(&prompt),
        });
    }

    pub fn run_query(&mut self, id: RequestId, alias: String) {
        self.spawn(move |client| JobMessage::Answer {
            id,
            result: client.execute_query(&alias),
        });
    }

    pub fn check_auth(&mut self) {
        self.spawn(|client| JobMessage::AuthStatus(client.auth_status()));
    }

    pub fn start_auth(&mut self) {
        self.spawn(|client| JobMessage::DeviceCode(client.start_auth()));
    }

    pub fn load_queries(&mut self) {
        self.spawn(|client| JobMessage::Queries(client.available_queries()));
    }

    /// Drain finished requests
    pub fn poll(&mut self) -> Vec<JobMessage> {
        let mut messages = Vec::new();

        loop {
            match self.receiver.try_recv() {
                Ok(message) => {
                    self.pending = self.pending.saturating_sub(1);
                    messages.push(message);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if self.pending == 0 {
            self.started = None;
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn runner() -> RequestRunner {
        RequestRunner::new(ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap())
    }

    fn wait_for(runner: &mut RequestRunner, count: usize) -> Vec<JobMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut messages = Vec::new();
        while messages.len() < count && Instant::now() < deadline {
            messages.extend(runner.poll());
            thread::sleep(Duration::from_millis(10));
        }
        messages
    }

    #[test]
    fn test_spawn_and_poll() {
        let mut runner = runner();
        assert!(!runner.is_busy());

        runner.spawn(|_| JobMessage::Answer {
            id: 7,
            result: Ok(AgentResponse::RawMarkdown("hi".into())),
        });
        assert!(runner.is_busy());
        assert!(runner.start_instant().is_some());

        let messages = wait_for(&mut runner, 1);
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            JobMessage::Answer { id, result } => {
                assert_eq!(*id, 7);
                assert!(result.is_ok());
            }
            other => panic!("unexpected message: {:?}", other),
        }
        assert!(!runner.is_busy());
        assert!(runner.start_instant().is_none());
    }

    #[test]
    fn test_multiple_jobs_tracked() {
        let mut runner = runner();
        runner.spawn(|_| JobMessage::Queries(Ok(vec![])));
        runner.spawn(|_| JobMessage::AuthStatus(Ok(AuthStatus::default())));

        let messages = wait_for(&mut runner, 2);
        assert_eq!(messages.len(), 2);
        assert!(!runner.is_busy());
    }

    #[test]
    fn test_unreachable_backend_reports_transport_error() {
        let mut runner = runner();
        runner.ask(1, "anything".into());

        let messages = wait_for(&mut runner, 1);
        match &messages[..] {
            [JobMessage::Answer { result: Err(ApiError::Transport(_)), .. }] => {}
            other => panic!("unexpected messages: {:?}", other),
        }
    }
}
