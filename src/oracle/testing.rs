//! Mock oracle for testing
//!
//! Replies are queued up front; every request is recorded. A gated mock holds
//! each reply until the test releases it, which lets tests dispatch while a
//! round trip is still in flight.

use super::{OracleClient, OracleError, OracleReply, OracleRequest};
use crate::thread::ConversationThread;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Mock oracle that returns queued replies
pub struct MockOracle {
    replies: Mutex<VecDeque<Result<OracleReply, OracleError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<OracleRequest>>,
    gate: Option<Semaphore>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            gate: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// A mock whose replies wait for [`MockOracle::release`]
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, response: &str, conversation_id: &str, message_id: &str) {
        self.replies.lock().unwrap().push_back(Ok(OracleReply {
            response: response.to_string(),
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
        }));
    }

    /// Queue a transport error
    pub fn queue_error(&self, error: OracleError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Let `n` held requests complete
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn recorded(&self) -> Vec<OracleRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Highest number of requests ever in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` requests have arrived
    pub async fn wait_for_requests(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while self.request_count() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} oracle requests (saw {})",
                self.request_count()
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OracleClient for MockOracle {
    async fn send(
        &self,
        prompt: &str,
        thread: &ConversationThread,
    ) -> Result<OracleReply, OracleError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push(OracleRequest::new(prompt, thread));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        } else {
            tokio::task::yield_now().await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::network("No mock reply queued")));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn endpoint(&self) -> &str {
        "mock://oracle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_oracle_records_and_replies() {
        let mock = MockOracle::new();
        mock.queue_reply("{}", "c1", "m1");

        let reply = mock.send("hello", &ConversationThread::default()).await.unwrap();

        assert_eq!(reply.message_id, "m1");
        assert_eq!(mock.recorded()[0].prompt, "hello");
        assert!(mock.send("again", &ConversationThread::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_gated_mock_holds_until_released() {
        let mock = std::sync::Arc::new(MockOracle::gated());
        mock.queue_reply("{}", "c1", "m1");

        let task = {
            let mock = mock.clone();
            tokio::spawn(async move { mock.send("held", &ConversationThread::default()).await })
        };
        mock.wait_for_requests(1).await;
        assert!(!task.is_finished());

        mock.release(1);
        assert!(task.await.unwrap().is_ok());
    }
}
