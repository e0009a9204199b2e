//! Session context: the one place the client's notion of "who is signed in" lives.
//!
//! A single listener task applies `AuthEvent`s from the auth service to a
//! `watch` channel. Everything else reads. Dropping the context aborts the
//! listener.

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::client::backend::{AuthEvent, AuthService, AuthSession, User};
use crate::client::ClientError;

pub struct SessionContext {
    state: watch::Receiver<Option<AuthSession>>,
    listener: JoinHandle<()>,
}

impl SessionContext {
    /// Starts listening to `events`. Must be called inside a tokio runtime.
    pub fn attach(initial: Option<AuthSession>, mut events: broadcast::Receiver<AuthEvent>) -> Self {
        let (tx, state) = watch::channel(initial);

        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_event(&tx, event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Session listener lagged behind auth events");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Auth event stream closed");
        });

        Self { state, listener }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// A receiver for components that want to react to changes themselves.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.state.clone()
    }

    /// Waits until the signed-in state equals `signed_in`. Returns at once if it already does.
    pub async fn wait_until(&mut self, signed_in: bool) -> Option<AuthSession> {
        let settled = self
            .state
            .wait_for(|s| s.is_some() == signed_in)
            .await
            .map(|state| (*state).clone());
        // Listener gone: report whatever we last saw.
        settled.unwrap_or_else(|_| self.current())
    }

    /// Asks `auth` whether the current session is still accepted. A rejected
    /// token makes the service publish `SignedOut`; this waits for that to land
    /// so callers can check `is_signed_in` straight after.
    pub async fn confirm_session(
        &mut self,
        auth: &dyn AuthService,
    ) -> Result<Option<User>, ClientError> {
        let current = self.current();
        let user = auth.get_current_user(current.as_ref()).await?;
        if user.is_none() && current.is_some() {
            debug!("Stored session no longer accepted");
            self.wait_until(false).await;
        }
        Ok(user)
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

fn apply_event(tx: &watch::Sender<Option<AuthSession>>, event: AuthEvent) {
    match event {
        AuthEvent::SignedIn(session) => {
            debug!(user_id = %session.user.id, "Session started");
            tx.send_replace(Some(session));
        }
        AuthEvent::SignedOut => {
            debug!("Session cleared");
            tx.send_replace(None);
        }
        AuthEvent::UserUpdated(user) => {
            tx.send_modify(|state| {
                if let Some(session) = state {
                    session.user = user;
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use uuid::Uuid;

    use super::*;

    /// Auth service that either accepts or rejects every token.
    struct FixedAuth {
        accepts: bool,
        lookups: AtomicUsize,
        events: broadcast::Sender<AuthEvent>,
    }

    impl FixedAuth {
        fn new(accepts: bool) -> Self {
            let (events, _) = broadcast::channel(4);
            Self {
                accepts,
                lookups: AtomicUsize::new(0),
                events,
            }
        }
    }

    #[async_trait]
    impl AuthService for FixedAuth {
        async fn sign_up(&self, _email: &str, _password: &str) -> Result<(), ClientError> {
            Ok(())
        }

        async fn sign_in_with_password(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<AuthSession, ClientError> {
            let session = session(email);
            let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
            Ok(session)
        }

        async fn sign_out(&self, _session: &AuthSession) -> Result<(), ClientError> {
            let _ = self.events.send(AuthEvent::SignedOut);
            Ok(())
        }

        async fn get_current_user(
            &self,
            session: Option<&AuthSession>,
        ) -> Result<Option<User>, ClientError> {
            let Some(session) = session else {
                return Ok(None);
            };
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.accepts {
                Ok(Some(session.user.clone()))
            } else {
                let _ = self.events.send(AuthEvent::SignedOut);
                Ok(None)
            }
        }

        fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
            self.events.subscribe()
        }
    }

    fn session(email: &str) -> AuthSession {
        AuthSession {
            access_token: "token".to_string(),
            user: User {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_starts_signed_out() {
        let (_tx, rx) = broadcast::channel(4);
        let context = SessionContext::attach(None, rx);
        assert!(!context.is_signed_in());
        assert!(context.current_user().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_then_out() {
        let (tx, rx) = broadcast::channel(4);
        let mut context = SessionContext::attach(None, rx);

        let owner = session("owner@example.com");
        tx.send(AuthEvent::SignedIn(owner.clone())).unwrap();
        let current = context.wait_until(true).await;
        assert_eq!(current, Some(owner.clone()));
        assert_eq!(context.current_user(), Some(owner.user));

        tx.send(AuthEvent::SignedOut).unwrap();
        assert_eq!(context.wait_until(false).await, None);
        assert!(!context.is_signed_in());
    }

    #[tokio::test]
    async fn test_user_update_keeps_token() {
        let (tx, rx) = broadcast::channel(4);
        let mut context = SessionContext::attach(Some(session("old@example.com")), rx);
        let mut watcher = context.subscribe();

        let mut updated = context.current_user().unwrap();
        updated.email = Some("new@example.com".to_string());
        tx.send(AuthEvent::UserUpdated(updated.clone())).unwrap();

        watcher.changed().await.unwrap();
        let current = context.wait_until(true).await.unwrap();
        assert_eq!(current.user, updated);
        assert_eq!(current.access_token, "token");
    }

    #[tokio::test]
    async fn test_user_update_while_signed_out_is_ignored() {
        let (tx, rx) = broadcast::channel(4);
        let context = SessionContext::attach(None, rx);
        let mut watcher = context.subscribe();

        tx.send(AuthEvent::UserUpdated(session("x@example.com").user)).unwrap();
        watcher.changed().await.unwrap();
        assert!(!context.is_signed_in());
    }

    #[tokio::test]
    async fn test_drop_tears_down_listener() {
        let (tx, rx) = broadcast::channel(4);
        let context = SessionContext::attach(None, rx);
        assert_eq!(tx.receiver_count(), 1);

        drop(context);
        for _ in 0..10 {
            if tx.receiver_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(tx.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_token_signs_out() {
        let auth = FixedAuth::new(false);
        let mut context = SessionContext::attach(None, auth.on_auth_state_change());
        auth.sign_in_with_password("owner@example.com", "pw").await.unwrap();
        context.wait_until(true).await;

        let user = context.confirm_session(&auth).await.unwrap();

        assert!(user.is_none());
        assert!(!context.is_signed_in());
        assert_eq!(auth.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_accepted_token_stays_signed_in() {
        let auth = FixedAuth::new(true);
        let mut context = SessionContext::attach(None, auth.on_auth_state_change());
        let signed_in = auth.sign_in_with_password("owner@example.com", "pw").await.unwrap();
        context.wait_until(true).await;

        let user = context.confirm_session(&auth).await.unwrap();

        assert_eq!(user, Some(signed_in.user));
        assert!(context.is_signed_in());
    }

    #[tokio::test]
    async fn test_confirm_without_session_skips_lookup() {
        let auth = FixedAuth::new(true);
        let mut context = SessionContext::attach(None, auth.on_auth_state_change());

        assert!(context.confirm_session(&auth).await.unwrap().is_none());
        assert_eq!(auth.lookups.load(Ordering::SeqCst), 0);
    }
}
