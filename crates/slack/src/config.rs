use std::time::Duration;

use secrecy::Secret;

/// Credentials and endpoint for one Slack workspace.
#[derive(Clone)]
pub struct SlackAccountConfig {
    /// Bot user OAuth token (`xoxb-...`), used for Web API calls.
    pub bot_token: Secret<String>,
    /// App-level token (`xapp-...`), used to open Socket Mode connections.
    pub app_token: Secret<String>,
    pub api_base_url: String,
    /// Upper bound on the Socket Mode reconnect delay.
    pub max_reconnect_backoff: Duration,
}

impl SlackAccountConfig {
    pub fn new(bot_token: Secret<String>, app_token: Secret<String>) -> Self {
        Self {
            bot_token,
            app_token,
            api_base_url: "https://slack.com/api".into(),
            max_reconnect_backoff: Duration::from_secs(30),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_max_reconnect_backoff(mut self, max: Duration) -> Self {
        self.max_reconnect_backoff = max;
        self
    }
}

impl std::fmt::Debug for SlackAccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAccountConfig")
            .field("bot_token", &"[REDACTED]")
            .field("app_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("max_reconnect_backoff", &self.max_reconnect_backoff)
            .finish()
    }
}
