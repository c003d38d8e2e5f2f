//! Side-channel session state shared with the hosting application.
//!
//! Successful authenticated calls may carry the current user's role and id in
//! the envelope `header`. The [`SessionContext`] caches that pair for display
//! purposes and broadcasts [`SessionEvent`]s (header updates and redirect
//! requests) to whoever hosts the pipeline. It is never an authorisation
//! source.

use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 32;

/// Role and id of the signed-in user as last reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHeader {
    /// Role name such as `admin`, `editor` or `superadmin`.
    pub user_type: String,
    /// Backend user identifier, stringified.
    pub user_id: String,
}

impl SessionHeader {
    /// Whether both fields are blank.
    pub fn is_empty(&self) -> bool {
        self.user_type.is_empty() && self.user_id.is_empty()
    }
}

/// Why the host is asked to navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectReason {
    /// The backend answered HTTP 401; the credential has been discarded.
    AuthExpired,
    /// The user logged out explicitly.
    LoggedOut,
}

/// Notifications emitted by the pipeline for the hosting application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The cached header changed.
    HeaderUpdated(SessionHeader),
    /// The host should navigate to `target`, discarding in-flight UI state.
    Redirect {
        /// Path to navigate to.
        target: String,
        /// Cause of the redirect.
        reason: RedirectReason,
    },
}

/// Injectable session state owned by the dispatcher.
///
/// Updates are last-write-wins; the lock is held only for the copy.
///
/// # Examples
/// ```
/// use chatbot_console::domain::{SessionContext, SessionEvent, SessionHeader};
///
/// let session = SessionContext::new();
/// let mut events = session.subscribe();
/// session.publish_header(SessionHeader {
///     user_type: "admin".into(),
///     user_id: "7".into(),
/// });
/// assert_eq!(session.header().user_type, "admin");
/// assert!(matches!(events.try_recv(), Ok(SessionEvent::HeaderUpdated(_))));
/// ```
#[derive(Debug)]
pub struct SessionContext {
    header: RwLock<SessionHeader>,
    events: broadcast::Sender<SessionEvent>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Empty session with no subscribers.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            header: RwLock::new(SessionHeader::default()),
            events,
        }
    }

    /// Snapshot of the cached header.
    pub fn header(&self) -> SessionHeader {
        self.header
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the cached header and notify subscribers.
    pub fn publish_header(&self, header: SessionHeader) {
        {
            let mut guard = self.header.write().unwrap_or_else(PoisonError::into_inner);
            guard.clone_from(&header);
        }
        self.emit(SessionEvent::HeaderUpdated(header));
    }

    /// Reset the cached header without notifying subscribers.
    pub fn clear(&self) {
        let mut guard = self.header.write().unwrap_or_else(PoisonError::into_inner);
        *guard = SessionHeader::default();
    }

    /// Ask the host to navigate to `target`.
    pub fn request_redirect(&self, target: impl Into<String>, reason: RedirectReason) {
        self.emit(SessionEvent::Redirect {
            target: target.into(),
            reason,
        });
    }

    /// Receive events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("session event dropped: no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn header(user_type: &str, user_id: &str) -> SessionHeader {
        SessionHeader {
            user_type: user_type.to_owned(),
            user_id: user_id.to_owned(),
        }
    }

    #[test]
    fn later_publish_wins() {
        let session = SessionContext::new();
        session.publish_header(header("editor", "3"));
        session.publish_header(header("admin", "9"));
        assert_eq!(session.header(), header("admin", "9"));
    }

    #[test]
    fn clear_resets_both_fields() {
        let session = SessionContext::new();
        session.publish_header(header("admin", "9"));
        session.clear();
        assert!(session.header().is_empty());
    }

    #[test]
    fn redirect_reaches_every_subscriber_once() {
        let session = SessionContext::new();
        let mut first = session.subscribe();
        let mut second = session.subscribe();

        session.request_redirect("/", RedirectReason::AuthExpired);

        for receiver in [&mut first, &mut second] {
            assert_eq!(
                receiver.try_recv(),
                Ok(SessionEvent::Redirect {
                    target: "/".to_owned(),
                    reason: RedirectReason::AuthExpired,
                })
            );
            assert_eq!(receiver.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[test]
    fn emitting_without_subscribers_is_harmless() {
        let session = SessionContext::new();
        session.request_redirect("/login", RedirectReason::LoggedOut);
        session.publish_header(header("admin", "1"));
        assert_eq!(session.header().user_id, "1");
    }
}
