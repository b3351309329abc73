use tokio::sync::watch;
use tracing::info;

/// Source of the acting user's identity
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;

    /// Receiver that wakes whenever the acting user changes
    fn subscribe(&self) -> watch::Receiver<Option<String>>;
}

/// Identity held in a `watch` channel; sign-in and sign-out notify subscribers
#[derive(Debug)]
pub struct WatchIdentity {
    tx: watch::Sender<Option<String>>,
}

impl WatchIdentity {
    pub fn new(initial: Option<String>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user = %user_id, "Signed in");
        self.tx.send_replace(Some(user_id));
    }

    pub fn sign_out(&self) {
        info!("Signed out");
        self.tx.send_replace(None);
    }
}

impl IdentityProvider for WatchIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_observe_sign_in() {
        let identity = WatchIdentity::anonymous();
        let mut rx = identity.subscribe();
        assert!(identity.current_user_id().is_none());

        identity.sign_in("u-1");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_deref(), Some("u-1"));
        assert_eq!(identity.current_user_id().as_deref(), Some("u-1"));

        identity.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
