/// Session change subscriptions.

use futures::stream::{self, Stream};
use tokio::sync::watch;

use super::User;

/// Live view of the signed-in user.
/// Dropping it unsubscribes.
#[derive(Debug, Clone)]
pub struct SessionSubscription {
    rx: watch::Receiver<Option<User>>,
}

impl SessionSubscription {
    pub fn new(rx: watch::Receiver<Option<User>>) -> Self {
        Self { rx }
    }

    /// The user as of the last observed change
    #[cfg(test)]
    pub fn current(&self) -> Option<User> {
        self.rx.borrow().clone()
    }

    /// Wait for the next sign-in/sign-out.
    /// Returns `None` once the provider is gone.
    pub async fn changed(&mut self) -> Option<Option<User>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Every future session change as a stream
    pub fn into_stream(self) -> impl Stream<Item = Option<User>> + Send + 'static {
        stream::unfold(self, |mut subscription| async move {
            let user = subscription.changed().await?;
            Some((user, subscription))
        })
    }
}
