//! Notifications published by the session.
//!
//! Surfaces subscribe through `Session::notifications` and render these as
//! toasts or redirects.

use std::fmt;

/// User-facing outcome of an asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// transient success message
    Success(String),
    /// transient error message
    Error(String),
    /// a save or run needs credentials; the surface sends the user to its
    /// sign-in entry point
    AuthRequired,
    /// the whole graph was replaced by a load, import or new document
    DocumentReplaced,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Notification::Success(message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notification::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_) | Notification::AuthRequired)
    }
}

impl fmt::Display for Notification {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Notification::Success(message) | Notification::Error(message) => write!(f, "{}", message),
            Notification::AuthRequired => write!(f, "please sign in to continue"),
            Notification::DocumentReplaced => write!(f, "document replaced"),
        }
    }
}
