//! In-memory `DocumentMirror` used by unit and behaviour tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::mirror::{DocumentChange, DocumentMirror, Fields, MirrorError, Subscription};

/// A write observed by [`MemoryMirror`], in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorCall {
    /// `put_document(collection, id, ..)`.
    Put { collection: String, id: String },
    /// `delete_document(collection, id)`.
    Delete { collection: String, id: String },
}

#[derive(Debug, Default)]
struct MirrorState {
    documents: HashMap<(String, String), Fields>,
    calls: Vec<MirrorCall>,
    subscribers: Vec<(String, UnboundedSender<DocumentChange>)>,
}

/// Recording mirror that keeps documents in a map.
///
/// A failing mirror records every call and then rejects it with
/// [`MirrorError::Unavailable`], leaving its documents unchanged. Like a real
/// store, a put whose `id` field names another document is refused with
/// [`MirrorError::Rejected`].
#[derive(Debug, Default)]
pub struct MemoryMirror {
    state: Mutex<MirrorState>,
    failing: bool,
}

impl MemoryMirror {
    /// Mirror whose every write fails.
    pub fn failing() -> Self {
        Self {
            state: Mutex::default(),
            failing: true,
        }
    }

    /// Writes seen so far.
    pub fn calls(&self) -> Vec<MirrorCall> {
        self.lock().calls.clone()
    }

    /// Stored document as a JSON object.
    pub fn document(&self, collection: &str, id: &str) -> Option<Value> {
        self.lock()
            .documents
            .get(&(collection.to_owned(), id.to_owned()))
            .cloned()
            .map(Value::Object)
    }

    /// Whether `collection/id` is stored.
    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.document(collection, id).is_some()
    }

    /// Simulate a change made by another writer and notify subscribers.
    pub fn push_remote(&self, collection: &str, change: DocumentChange) {
        let mut state = self.lock();
        let key = |id: &str| (collection.to_owned(), id.to_owned());
        match &change {
            DocumentChange::Upserted { id, fields } => {
                state.documents.insert(key(id), fields.clone());
            }
            DocumentChange::Removed { id } => {
                state.documents.remove(&key(id));
            }
        }
        notify(&mut state, collection, &change);
    }

    fn lock(&self) -> MutexGuard<'_, MirrorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn unavailable(collection: &str, id: &str) -> MirrorError {
        MirrorError::Unavailable {
            collection: collection.to_owned(),
            id: id.to_owned(),
            message: "memory mirror configured to fail".to_owned(),
        }
    }
}

fn notify(state: &mut MirrorState, collection: &str, change: &DocumentChange) {
    state
        .subscribers
        .retain(|(followed, sender)| followed != collection || sender.send(change.clone()).is_ok());
}

#[async_trait]
impl DocumentMirror for MemoryMirror {
    async fn put_document(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), MirrorError> {
        let mut state = self.lock();
        state.calls.push(MirrorCall::Put {
            collection: collection.to_owned(),
            id: id.to_owned(),
        });
        if self.failing {
            return Err(Self::unavailable(collection, id));
        }
        if let Some(stored_id) = fields.get("id").filter(|value| value.as_str() != Some(id)) {
            return Err(MirrorError::Rejected {
                collection: collection.to_owned(),
                id: id.to_owned(),
                message: format!("document carries id {stored_id}"),
            });
        }
        state
            .documents
            .insert((collection.to_owned(), id.to_owned()), fields);
        Ok(())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), MirrorError> {
        let mut state = self.lock();
        state.calls.push(MirrorCall::Delete {
            collection: collection.to_owned(),
            id: id.to_owned(),
        });
        if self.failing {
            return Err(Self::unavailable(collection, id));
        }
        state
            .documents
            .remove(&(collection.to_owned(), id.to_owned()));
        Ok(())
    }

    fn subscribe(&self, collection: &str) -> Subscription {
        let (sender, receiver) = unbounded_channel();
        self.lock().subscribers.push((collection.to_owned(), sender));
        Subscription::new(collection, receiver)
    }
}
