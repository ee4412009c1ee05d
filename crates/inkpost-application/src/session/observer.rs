use inkpost_core::error::Result;
use inkpost_core::gateway::{AuthGateway, SessionChanges};
use inkpost_core::session::{SessionState, SessionUser};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A change of authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTransition {
    pub previous: SessionState,
    pub current: SessionState,
}

struct Inner {
    state: SessionState,
    subscribers: HashMap<u64, mpsc::UnboundedSender<SessionTransition>>,
    next_id: u64,
}

struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    fn current(&self) -> SessionState {
        self.inner
            .lock()
            .map(|inner| inner.state.clone())
            .unwrap_or_default()
    }

    /// Moves to `next` and notifies every live subscriber, unless the
    /// state did not actually change.
    fn transition(&self, next: SessionState) {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };
        if inner.state == next {
            return;
        }

        let previous = std::mem::replace(&mut inner.state, next.clone());
        let transition = SessionTransition {
            previous,
            current: next,
        };
        tracing::debug!(
            authenticated = transition.current.is_authenticated(),
            "Session transition"
        );
        inner
            .subscribers
            .retain(|_, sender| sender.send(transition.clone()).is_ok());
    }

    fn close_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.subscribers.clear();
        }
    }
}

/// Owner of the client's session state.
///
/// Started once with [`SessionObserver::start`]; from then on it follows
/// the gateway's session-change stream. Token refreshes for the same user
/// are not transitions and are not forwarded. Each transition reaches
/// every subscription that existed when it happened, exactly once and in
/// order.
///
/// # Lifecycle
///
/// [`SessionObserver::shutdown`] (or dropping the observer) stops the
/// forwarding task and closes every subscription.
pub struct SessionObserver {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionObserver {
    /// Reads the current session and starts following changes.
    ///
    /// The change stream is opened before the current session is read so
    /// that a sign-in racing with start-up is not lost.
    pub async fn start(auth: Arc<dyn AuthGateway>) -> Result<Self> {
        let changes = auth.session_changes();
        let initial = SessionState::from_session(auth.current_session().await?.as_ref());

        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: initial,
                subscribers: HashMap::new(),
                next_id: 0,
            }),
        });
        let task = tokio::spawn(forward(changes, Arc::clone(&shared)));

        Ok(Self {
            shared,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn current(&self) -> SessionState {
        self.shared.current()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<SessionUser> {
        self.current().user().cloned()
    }

    /// Registers for future transitions.
    pub fn subscribe(&self) -> SessionSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = match self.shared.inner.lock() {
            Ok(mut inner) => {
                inner.next_id += 1;
                let id = inner.next_id;
                inner.subscribers.insert(id, sender);
                id
            }
            // Sender dropped here, so the subscription starts closed.
            Err(_) => 0,
        };

        SessionSubscription {
            id,
            receiver,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared
            .inner
            .lock()
            .map(|inner| inner.subscribers.len())
            .unwrap_or_default()
    }

    /// Stops following the gateway and closes every subscription.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.task.lock()
            && let Some(task) = slot.take()
        {
            task.abort();
            tracing::debug!("Session observer stopped");
        }
        self.shared.close_all();
    }
}

impl Drop for SessionObserver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn forward(mut changes: SessionChanges, shared: Arc<Shared>) {
    while let Some(session) = changes.recv().await {
        shared.transition(SessionState::from_session(session.as_ref()));
    }
    shared.close_all();
}

/// Receiving end of [`SessionObserver::subscribe`]. Dropping it
/// unsubscribes.
pub struct SessionSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<SessionTransition>,
    shared: Weak<Shared>,
}

impl SessionSubscription {
    /// Waits for the next transition. `None` once the observer shut down.
    pub async fn recv(&mut self) -> Option<SessionTransition> {
        self.receiver.recv().await
    }

    /// Next transition if one is already queued.
    pub fn try_recv(&mut self) -> Option<SessionTransition> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade()
            && let Ok(mut inner) = shared.inner.lock()
        {
            inner.subscribers.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkpost_core::gateway::AuthGateway;
    use inkpost_infrastructure::MemoryGateway;

    async fn gateway_with_account() -> Arc<MemoryGateway> {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.register("ada@example.com", "secret", Some("Ada"));
        gateway
    }

    #[tokio::test]
    async fn test_start_reads_current_session() {
        let gateway = gateway_with_account().await;
        gateway.sign_in("ada@example.com", "secret").await.unwrap();

        let observer = SessionObserver::start(gateway.clone()).await.unwrap();

        assert_eq!(
            observer.user().map(|u| u.display_name),
            Some("Ada".to_string())
        );
    }

    #[tokio::test]
    async fn test_transitions_are_delivered_in_order() {
        let gateway = gateway_with_account().await;
        let observer = SessionObserver::start(gateway.clone()).await.unwrap();
        let mut first = observer.subscribe();
        let mut second = observer.subscribe();

        gateway.sign_in("ada@example.com", "secret").await.unwrap();
        gateway.refresh_session();
        gateway.sign_out().await.unwrap();

        for subscription in [&mut first, &mut second] {
            let signed_in = subscription.recv().await.unwrap();
            assert_eq!(signed_in.previous, SessionState::Unauthenticated);
            assert!(signed_in.current.is_authenticated());

            let signed_out = subscription.recv().await.unwrap();
            assert!(signed_out.previous.is_authenticated());
            assert_eq!(signed_out.current, SessionState::Unauthenticated);

            assert_eq!(subscription.try_recv(), None);
        }
        assert!(!observer.current().is_authenticated());
    }

    #[tokio::test]
    async fn test_dropped_subscription_unsubscribes() {
        let gateway = gateway_with_account().await;
        let observer = SessionObserver::start(gateway.clone()).await.unwrap();

        let subscription = observer.subscribe();
        assert_eq!(observer.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(observer.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_subscriptions() {
        let gateway = gateway_with_account().await;
        let observer = SessionObserver::start(gateway.clone()).await.unwrap();
        let mut subscription = observer.subscribe();

        observer.shutdown();

        assert_eq!(subscription.recv().await, None);
        gateway.sign_in("ada@example.com", "secret").await.unwrap();
        assert!(!observer.current().is_authenticated());
    }
}
