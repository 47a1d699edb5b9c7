//! Remote document mirror port.
//!
//! The local store is authoritative for reads. A [`DocumentMirror`] receives
//! a copy of every write (last writer wins) and can push remote edits back
//! through a [`Subscription`].
//!
//! Mirrors offer no transaction across calls; each put or delete stands
//! alone.

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

/// Collection holding point documents.
pub const POIS_COLLECTION: &str = "pois";
/// Collection holding route documents.
pub const ROUTES_COLLECTION: &str = "routes";

/// Field map of a single document.
pub type Fields = Map<String, Value>;

/// Errors raised by a [`DocumentMirror`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// The remote store could not be reached.
    #[error("remote store unavailable while writing {collection}/{id}: {message}")]
    Unavailable {
        collection: String,
        id: String,
        message: String,
    },
    /// The remote store refused the write.
    #[error("remote store rejected {collection}/{id}: {message}")]
    Rejected {
        collection: String,
        id: String,
        message: String,
    },
    /// An entity could not be turned into a document.
    #[error("failed to encode document {id}: {message}")]
    Encode { id: String, message: String },
}

/// Remote change delivered through a [`Subscription`].
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    /// A document was created or overwritten.
    Upserted { id: String, fields: Fields },
    /// A document was deleted.
    Removed { id: String },
}

/// Write access to a remote document store.
///
/// Implementations must treat deleting a missing document as success.
#[async_trait]
pub trait DocumentMirror: Send + Sync {
    /// Create or overwrite `collection/id`.
    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), MirrorError>;

    /// Delete `collection/id`.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), MirrorError>;

    /// Start receiving changes made to `collection` by other writers.
    fn subscribe(&self, collection: &str) -> Subscription;
}

/// Stream of remote changes for one collection.
///
/// Changes queue up until drained with [`Subscription::try_next`]. Cancelling
/// or dropping the subscription closes the channel; the mirror stops
/// delivering to it on its next write.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    changes: UnboundedReceiver<DocumentChange>,
}

impl Subscription {
    /// Wrap the receiving half of a change channel.
    pub fn new(collection: impl Into<String>, changes: UnboundedReceiver<DocumentChange>) -> Self {
        Self {
            collection: collection.into(),
            changes,
        }
    }

    /// Collection this subscription follows.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Next pending change, without waiting.
    pub fn try_next(&mut self) -> Option<DocumentChange> {
        match self.changes.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next change. Returns `None` once the channel is closed
    /// and drained.
    pub async fn next(&mut self) -> Option<DocumentChange> {
        self.changes.recv().await
    }

    /// Stop receiving changes. Already queued changes remain readable.
    pub fn cancel(&mut self) {
        self.changes.close();
    }
}

/// Encode an entity as document fields.
pub fn to_fields<T: Serialize>(id: &str, entity: &T) -> Result<Fields, MirrorError> {
    let encode_error = |message: String| MirrorError::Encode {
        id: id.to_owned(),
        message,
    };
    match serde_json::to_value(entity).map_err(|err| encode_error(err.to_string()))? {
        Value::Object(fields) => Ok(fields),
        other => Err(encode_error(format!("expected an object, found {other}"))),
    }
}

/// Decode document fields into an entity.
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn point_fields_round_trip() {
        let point = Point::new("1", "Museum", "Closed on Mondays");
        let fields = to_fields(point.id(), &point).expect("encode");
        assert_eq!(fields.get("name"), Some(&Value::from("Museum")));
        let decoded: Point = from_fields(fields).expect("decode");
        assert_eq!(decoded, point);
    }

    #[test]
    fn scalars_are_not_documents() {
        let err = to_fields("x", &42).expect_err("scalar should be rejected");
        assert!(matches!(err, MirrorError::Encode { .. }));
    }

    #[tokio::test]
    async fn next_waits_for_changes_until_the_sender_is_gone() {
        let (sender, receiver) = unbounded_channel();
        let mut subscription = Subscription::new(ROUTES_COLLECTION, receiver);
        let writer = tokio::spawn(async move {
            sender
                .send(DocumentChange::Removed { id: "r".into() })
                .expect("channel open");
        });

        assert_eq!(
            subscription.next().await,
            Some(DocumentChange::Removed { id: "r".into() })
        );
        writer.await.expect("writer finished");
        assert_eq!(subscription.next().await, None);
    }

    #[test]
    fn cancelled_subscription_keeps_queued_changes() {
        let (sender, receiver) = unbounded_channel();
        let mut subscription = Subscription::new(POIS_COLLECTION, receiver);
        sender
            .send(DocumentChange::Removed { id: "1".into() })
            .expect("channel open");
        subscription.cancel();

        assert!(sender.send(DocumentChange::Removed { id: "2".into() }).is_err());
        assert_eq!(
            subscription.try_next(),
            Some(DocumentChange::Removed { id: "1".into() })
        );
        assert_eq!(subscription.try_next(), None);
    }
}
