//! Session record and its read-only view.

use serde::Serialize;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// In-memory session state. Only the session manager writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub is_authenticated: bool,
    /// True only until the first `initialize` resolves
    pub loading: bool,
    /// Empty when unauthenticated
    pub user_email: String,
    /// Empty when no error is pending
    pub error: String,
}

impl Default for SessionRecord {
    fn default() -> Self {
        Self {
            is_authenticated: false,
            loading: true,
            user_email: String::new(),
            error: String::new(),
        }
    }
}

impl SessionRecord {
    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// Read-only, observable projection of the session record.
///
/// Cloning a view yields another independent observer.
#[derive(Debug, Clone)]
pub struct SessionView {
    rx: watch::Receiver<SessionRecord>,
}

impl SessionView {
    pub(crate) fn new(rx: watch::Receiver<SessionRecord>) -> Self {
        Self { rx }
    }

    /// Current state, marking it as seen by this observer.
    pub fn snapshot(&mut self) -> SessionRecord {
        self.rx.borrow_and_update().clone()
    }

    /// Current state without touching the change marker.
    pub fn current(&self) -> SessionRecord {
        self.rx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated
    }

    pub fn loading(&self) -> bool {
        self.rx.borrow().loading
    }

    pub fn user_email(&self) -> String {
        self.rx.borrow().user_email.clone()
    }

    pub fn error(&self) -> String {
        self.rx.borrow().error.clone()
    }

    /// Wait until some field changes, then return the new state.
    ///
    /// Fails once the session manager is gone.
    pub async fn changed(&mut self) -> Result<SessionRecord> {
        self.rx
            .changed()
            .await
            .map_err(|_| Error::Other("session manager dropped".to_string()))?;
        Ok(self.snapshot())
    }

    /// Resolve once the initial resolution window has closed.
    pub async fn wait_until_loaded(&mut self) -> Result<SessionRecord> {
        let record = self
            .rx
            .wait_for(|record| !record.loading)
            .await
            .map_err(|_| Error::Other("session manager dropped".to_string()))?;
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_loading() {
        let record = SessionRecord::default();
        assert!(record.loading);
        assert!(!record.is_authenticated);
        assert!(record.user_email.is_empty());
        assert!(!record.has_error());
    }

    #[test]
    fn test_serializes_camel_case() {
        let value = serde_json::to_value(SessionRecord::default()).unwrap();
        assert_eq!(value["isAuthenticated"], false);
        assert_eq!(value["loading"], true);
        assert_eq!(value["userEmail"], "");
    }

    #[test]
    fn test_view_tracks_sender() {
        let (tx, rx) = watch::channel(SessionRecord::default());
        let mut view = SessionView::new(rx);

        tx.send_modify(|record| {
            record.loading = false;
            record.user_email = "u@x.com".to_string();
        });

        assert!(!view.loading());
        assert_eq!(view.user_email(), "u@x.com");
        assert_eq!(view.snapshot().user_email, "u@x.com");
    }

    #[test]
    fn test_changed_fails_after_sender_dropped() {
        let (tx, rx) = watch::channel(SessionRecord::default());
        let mut view = SessionView::new(rx);
        drop(tx);

        let result = tokio_test::block_on(view.changed());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wait_until_loaded() {
        let (tx, rx) = watch::channel(SessionRecord::default());
        let mut view = SessionView::new(rx);

        let waiter = tokio::spawn(async move { view.wait_until_loaded().await });
        tx.send_modify(|record| record.loading = false);

        let record = waiter.await.unwrap().unwrap();
        assert!(!record.loading);
    }
}
