use crate::mcp::error::McpError;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Read side of the session state plus the process-wide stop signal.
///
/// The SSE listener is the only writer of the session id; everything else
/// holds a clone of this handle.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    session: watch::Receiver<Option<String>>,
    stop: CancellationToken,
}

impl SessionHandle {
    pub fn new(session: watch::Receiver<Option<String>>, stop: CancellationToken) -> Self {
        Self { session, stop }
    }

    /// Builds a handle together with the sender the listener writes to.
    pub fn channel() -> (watch::Sender<Option<String>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self::new(rx, CancellationToken::new()))
    }

    pub fn current(&self) -> Option<String> {
        self.session.borrow().clone()
    }

    pub fn is_established(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Suspends until the listener publishes a session id.
    ///
    /// Without a timeout this waits until the stop signal fires.
    pub async fn wait_established(&self, timeout: Option<Duration>) -> Result<String, McpError> {
        let mut session = self.session.clone();
        let stop = self.stop.clone();
        let wait = async move {
            tokio::select! {
                biased;
                established = session.wait_for(Option::is_some) => established
                    .ok()
                    .and_then(|value| value.clone())
                    .ok_or_else(|| McpError::Connection("SSE listener exited".to_string())),
                _ = stop.cancelled() => Err(McpError::Connection(
                    "SSE listener stopped before a session was established".to_string(),
                )),
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| McpError::Timeout("session establishment".to_string()))?,
            None => wait.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_returns_once_session_is_published() {
        let (tx, handle) = SessionHandle::channel();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.wait_established(None).await })
        };

        tx.send_replace(Some("abc123".to_string()));

        let session_id = waiter.await.expect("join").expect("session");
        assert_eq!(session_id, "abc123");
        assert_eq!(handle.current().as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn wait_fails_when_stop_signal_fires() {
        let (_tx, handle) = SessionHandle::channel();
        handle.stop();

        let err = handle.wait_established(None).await.expect_err("stopped");
        assert!(matches!(err, McpError::Connection(_)));
    }

    #[tokio::test]
    async fn wait_honors_timeout() {
        let (_tx, handle) = SessionHandle::channel();

        let err = handle
            .wait_established(Some(Duration::from_millis(20)))
            .await
            .expect_err("no session");
        assert!(matches!(err, McpError::Timeout(_)));
    }

    #[test]
    fn handle_starts_unestablished() {
        let (_tx, handle) = SessionHandle::channel();
        assert!(!handle.is_established());
        assert!(!handle.is_stopped());
    }
}
