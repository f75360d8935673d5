use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{Preferences, StoreError};

pub(crate) type State = Result<Preferences, StoreError>;

/// A subscription to the state of a [`DataStore`](crate::DataStore).
///
/// The first call to [`Subscription::next`] returns the current state; each later call waits
/// for the next committed change. Changes are conflated: a subscriber that falls behind only
/// observes the latest state. A failed read is delivered as an `Err` item and does not end
/// the subscription. The subscription ends once the store is shut down or dropped.
#[derive(Debug)]
pub struct Subscription {
    receiver: watch::Receiver<State>,
    started: bool,
    finished: bool,
}

impl Subscription {
    pub(crate) fn new(receiver: watch::Receiver<State>) -> Self {
        Self {
            receiver,
            started: false,
            finished: false,
        }
    }

    /// Wait for the next state. Returns `None` once the store is closed.
    pub async fn next(&mut self) -> Option<State> {
        if self.finished {
            return None;
        }

        if self.started && self.receiver.changed().await.is_err() {
            self.finished = true;
            return None;
        }
        self.started = true;

        let state = self.receiver.borrow_and_update().clone();
        match state {
            Err(StoreError::Closed) => {
                self.finished = true;
                None
            }
            state => Some(state),
        }
    }

    /// Like [`Subscription::next`], but gives up with [`StoreError::Cancelled`] when `token`
    /// is cancelled first. A cancelled call does not consume a state.
    pub async fn next_with_cancellation(&mut self, token: &CancellationToken) -> Option<State> {
        tokio::select! {
            biased;
            _ = token.cancelled() => Some(Err(StoreError::Cancelled)),
            state = self.next() => state,
        }
    }

    /// The current state, consuming the subscription.
    pub async fn first(mut self) -> Option<State> {
        self.next().await
    }
}
