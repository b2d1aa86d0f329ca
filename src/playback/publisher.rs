use tokio::sync::watch;

use crate::playback::PlaybackState;

/// Coalescing publisher for playback snapshots.
///
/// Observers hold a `watch` receiver and only ever see the latest value.
/// Publishing an unchanged snapshot does not wake them.
#[derive(Debug)]
pub struct StatePublisher {
    tx: watch::Sender<PlaybackState>,
    published: u64,
}

impl StatePublisher {
    #[must_use]
    pub fn new(initial: PlaybackState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx, published: 0 }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.tx.subscribe()
    }

    /// Publishes `state` if it differs from the last published value.
    pub fn publish(&mut self, state: &PlaybackState) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
        if changed {
            self.published += 1;
        }
        changed
    }

    /// Number of snapshots actually sent.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published
    }

    #[must_use]
    pub fn latest(&self) -> PlaybackState {
        self.tx.borrow().clone()
    }
}
