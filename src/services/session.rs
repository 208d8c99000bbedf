//! Client identity used for all outgoing requests.

use std::fmt;

use crate::models::{AuthConfig, HttpConfig};

/// Identity established before the harvest starts.
///
/// Without a session cookie requests are anonymous; posts that need a login
/// then resolve as `LOGIN_REQUIRED`.
#[derive(Clone)]
pub struct Session {
    user_agent: String,
    session_id: Option<String>,
}

impl Session {
    pub fn from_config(http: &HttpConfig, auth: &AuthConfig) -> Self {
        Self {
            user_agent: http.user_agent.trim().to_string(),
            session_id: auth
                .session_id
                .as_ref()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        }
    }

    /// Anonymous session with the given user agent.
    pub fn anonymous(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            session_id: None,
        }
    }

    /// Identity string sent as the `User-Agent` of media fetches.
    pub fn identity(&self) -> &str {
        &self.user_agent
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_id.is_some()
    }

    /// `Cookie` header value, if a session is present.
    pub fn cookie(&self) -> Option<String> {
        self.session_id
            .as_ref()
            .map(|id| format!("sessionid={id}"))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_agent", &self.user_agent)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
