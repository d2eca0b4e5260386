use std::fmt;

/// Identity the backend calls are made for. Created on login, dropped on
/// logout; never looked up from ambient storage.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: String,
    pub token: String,
}

impl AuthSession {
    pub fn new(
        user_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("AuthSession").field("user_id", &self.user_id).field("token", &"***").finish()
    }
}
