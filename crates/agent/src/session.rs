//! Per-run session state.
//!
//! A [`Session`] is created for each `chat()` or delegation, owned
//! exclusively by one orchestration loop, and dropped when the run
//! returns. Nothing here needs synchronization.

use loopsmith_core::message::Message;
use loopsmith_core::tool::ToolRecord;
use std::time::{Duration, Instant};

pub struct Session {
    pub id: String,
    pub history: Vec<Message>,
    /// Append-only dispatch outcomes, indexed by `${tool_result.N}`
    pub result_history: Vec<ToolRecord>,
    pub iterations: u32,
    pub started_at: Instant,
    last_request_at: Option<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>, history: Vec<Message>) -> Self {
        Self {
            id: id.into(),
            history,
            result_history: Vec::new(),
            iterations: 0,
            started_at: Instant::now(),
            last_request_at: None,
        }
    }

    /// Enforce a minimum wall-clock gap between model requests.
    ///
    /// Suspends the task instead of blocking the thread, so concurrent
    /// sessions on the same runtime keep making progress.
    pub async fn rate_limit(&mut self, min_gap: Duration) {
        if let Some(last) = self.last_request_at {
            let elapsed = last.elapsed();
            if elapsed < min_gap {
                tokio::time::sleep(min_gap - elapsed).await;
            }
        }
        self.last_request_at = Some(Instant::now());
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_not_delayed() {
        let mut session = Session::new("s", vec![]);
        let before = tokio::time::Instant::now();
        session.rate_limit(Duration::from_millis(500)).await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_request_waits_out_the_gap() {
        let mut session = Session::new("s", vec![]);
        session.rate_limit(Duration::from_millis(500)).await;

        let before = tokio::time::Instant::now();
        session.rate_limit(Duration::from_millis(500)).await;
        // Paused clock only advances across await points, so the whole
        // gap shows up as sleep time.
        assert!(before.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn result_history_starts_empty() {
        let session = Session::new("s", vec![Message::user("hi")]);
        assert!(session.result_history.is_empty());
        assert_eq!(session.iterations, 0);
        assert_eq!(session.history.len(), 1);
    }
}
