use std::time::Duration;

/// Transport configuration for bot API requests.
#[derive(Debug, Clone)]
pub struct BotApiConfig {
    /// Base URL for the bot backend.
    pub base_url: String,
    /// Bearer token passed to `Authorization`.
    pub auth_token: String,
    /// Optional `User-Agent` override.
    pub user_agent: Option<String>,
    /// Optional timeout applied per request to session creation only;
    /// chat-stream requests run without one so long streams are never cut
    /// off.
    pub timeout: Option<Duration>,
}

impl BotApiConfig {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: auth_token.into(),
            user_agent: None,
            timeout: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
