//! Progress notifications for the indexing worker.
//!
//! The worker communicates with its host purely through one-way typed
//! messages; it never waits for acknowledgement. Production code posts on
//! an unbounded tokio channel, tests record messages in memory.

use tokio::sync::mpsc;

/// One-way progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexingMessage {
    /// The collection is being refreshed (removal phase found work).
    Refreshing,
    /// Running count of added tracks with completion percentage.
    AddingTracks { count: usize, percent: u32 },
    /// The update phase found outdated tracks.
    UpdatingTracks,
    /// An artwork phase found work.
    UpdatingAlbumArtwork,
    /// The pass is over; any progress display can be dismissed.
    Dismiss,
}

/// Fire-and-forget sink for progress messages.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: IndexingMessage);
}

/// Production sink posting on an unbounded channel. Dropping the receiver
/// silently discards further messages, which is fine: progress is advisory.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<IndexingMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<IndexingMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, message: IndexingMessage) {
        let _ = self.tx.send(message);
    }
}

/// Recording sink for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingSink {
    messages: std::sync::Mutex<Vec<IndexingMessage>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<IndexingMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl NotificationSink for RecordingSink {
    fn notify(&self, message: IndexingMessage) {
        self.messages.lock().unwrap().push(message);
    }
}
