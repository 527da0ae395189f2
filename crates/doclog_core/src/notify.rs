//! Version notifications.
//!
//! A [`VersionUpdated`] event is emitted after every commit that appends a
//! document. Observers either subscribe for a stream of future events or
//! poll the bounded history with a sequence cursor.
//!
//! ```
//! use doclog_core::{VersionFeed, VersionUpdated, DocumentId, SequenceNumber, Ticks};
//!
//! let feed = VersionFeed::new();
//! let rx = feed.subscribe();
//!
//! feed.emit(VersionUpdated {
//!     document_id: DocumentId::new(),
//!     ticks: Ticks::new(638_000_000_000_000_000),
//!     sequence: SequenceNumber::new(1),
//! });
//!
//! assert_eq!(rx.recv().unwrap().sequence, SequenceNumber::new(1));
//! assert_eq!(feed.poll(SequenceNumber::new(0), 10).len(), 1);
//! ```

use crate::document::DocumentId;
use crate::time::Ticks;
use crate::types::SequenceNumber;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// The store gained a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionUpdated {
    /// The appended document.
    pub document_id: DocumentId,
    /// Its creation time in ticks.
    pub ticks: Ticks,
    /// Sequence number of the commit.
    pub sequence: SequenceNumber,
}

/// Distributes version notifications to subscribers.
pub struct VersionFeed {
    subscribers: RwLock<Vec<Sender<VersionUpdated>>>,
    history: RwLock<Vec<VersionUpdated>>,
    max_history: usize,
}

impl VersionFeed {
    /// Creates a feed with the default history limit.
    pub fn new() -> Self {
        Self::with_max_history(1024)
    }

    /// Creates a feed keeping at most `max_history` events for polling.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Returns a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<VersionUpdated> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Records an event and sends it to every live subscriber.
    pub fn emit(&self, event: VersionUpdated) {
        {
            let mut history = self.history.write();
            history.push(event);
            if history.len() > self.max_history {
                let excess = history.len() - self.max_history;
                history.drain(0..excess);
            }
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Events with a sequence greater than `cursor`, oldest first, at most `limit`.
    pub fn poll(&self, cursor: SequenceNumber, limit: usize) -> Vec<VersionUpdated> {
        self.history
            .read()
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .copied()
            .collect()
    }

    /// Sequence of the newest event, or zero.
    pub fn latest_sequence(&self) -> SequenceNumber {
        self.history
            .read()
            .last()
            .map_or(SequenceNumber::new(0), |e| e.sequence)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for VersionFeed {
    fn default() -> Self {
        Self::new()
    }
}
