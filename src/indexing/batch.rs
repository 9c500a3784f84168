use serde_json::{json, Value};

/// Ordered action/document pairs awaiting one `_bulk` call
#[derive(Debug, Clone)]
pub struct BulkBatch {
    entries: Vec<Value>,
    capacity: usize,
}

impl BulkBatch {
    /// Create an empty batch holding up to `capacity` documents
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity * 2),
            capacity,
        }
    }

    /// Queue an index action for `document` under `id`
    pub fn push(&mut self, index: &str, id: &str, document: Value) {
        self.entries.push(json!({ "index": { "_index": index, "_id": id } }));
        self.entries.push(document);
    }

    /// Documents queued
    pub fn len(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    pub fn entries(&self) -> &[Value] {
        &self.entries
    }

    /// Take the queued entries, leaving the batch empty
    pub fn take(&mut self) -> Vec<Value> {
        std::mem::replace(&mut self.entries, Vec::with_capacity(self.capacity * 2))
    }
}
