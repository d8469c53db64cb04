//! Shared helpers for unit tests

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{ClientConfig, RetryPolicy, Sleeper};
use crate::session::Session;

/// Sleeper that records requested pauses and returns immediately
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
    }
}

/// Config pointing at `server` with no real waiting between retries
pub(crate) fn mock_config(server: &MockServer) -> ClientConfig {
    let sleeper = Arc::new(RecordingSleeper::default());
    let mut config = ClientConfig::with_base(&server.uri());
    config.session_retry = RetryPolicy::new(0, Duration::ZERO).with_sleeper(sleeper.clone());
    config.public_retry = RetryPolicy::new(0, Duration::ZERO).with_sleeper(sleeper);
    config
}

/// Mounts a login page that accepts any credentials
pub(crate) async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/secure/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>welcome</html>"))
        .mount(server)
        .await;
}

/// Session logged in against `server`
pub(crate) async fn logged_in_session(server: &MockServer) -> Session {
    mount_login_ok(server).await;
    let session = Session::with_config(mock_config(server)).unwrap();
    session.login("user@example.com", "secret").await.unwrap();
    session
}

/// Number of requests `server` received for `path`
pub(crate) async fn count_requests(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == request_path)
        .count()
}
