//! Event types for the Shelfmark event system
//!
//! Provides shared event definitions and the EventBus used to deliver book
//! synchronization traffic to the consumer. The bus is the in-process
//! stand-in for an external point-to-point delivery mechanism: publishers do
//! not wait for consumers, redelivery is the publisher's concern, and slow
//! subscribers observe lag instead of blocking producers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Platform event types
///
/// Events are broadcast via EventBus; all carry enough context for a consumer
/// to act without further lookups against the publisher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlatformEvent {
    /// A book was referenced somewhere in the platform and canonical metadata
    /// should exist for it
    ///
    /// Triggers:
    /// - Synchronization consumer: validate, deduplicate, fetch, upsert
    BookReferenced {
        /// Raw ISBN as supplied by the referencing system (not yet validated)
        isbn: String,
        /// Delivery attempt, starting at 1; bumped on redelivery
        attempt: u32,
    },

    /// A book record was created from canonical catalog metadata
    BookSynchronized {
        /// Store-assigned book id
        book_id: Uuid,
        /// Canonical ISBN of the new record
        isbn: String,
        /// When the record was written
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A review passed quality checks and was persisted
    ReviewCreated {
        /// Store-assigned review id
        review_id: Uuid,
        /// Book the review is bound to
        book_id: Uuid,
        /// When the review was written
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A review was removed by a moderator
    ReviewDeleted {
        /// Id of the removed review
        review_id: Uuid,
        /// When the review was removed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlatformEvent {
    /// Build a first-delivery synchronization request event
    pub fn book_referenced(isbn: impl Into<String>) -> Self {
        PlatformEvent::BookReferenced {
            isbn: isbn.into(),
            attempt: 1,
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlatformEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// Capacity bounds how many undelivered events are buffered before the
    /// oldest are dropped for lagging subscribers.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscriber is listening (the event is lost).
    pub fn emit(
        &self,
        event: PlatformEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<PlatformEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of currently attached subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit(PlatformEvent::book_referenced("1234567891234"))
            .expect("one subscriber attached");

        match rx.recv().await.expect("event delivered") {
            PlatformEvent::BookReferenced { isbn, attempt } => {
                assert_eq!(isbn, "1234567891234");
                assert_eq!(attempt, 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(16);
        assert!(bus.emit(PlatformEvent::book_referenced("42")).is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json =
            serde_json::to_value(PlatformEvent::book_referenced("1234567891234")).unwrap();
        assert_eq!(json["type"], "BookReferenced");
        assert_eq!(json["isbn"], "1234567891234");
    }
}
