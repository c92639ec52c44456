//! The play queue: an ordered list of media ids with a cursor.
//!
//! Duplicates are allowed. The cursor is `None` exactly when the queue is
//! empty, otherwise it is a valid index.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub media_id: String,
    /// Insertion counter, unique per queue.
    pub order: u64,
}

#[derive(Debug, Default)]
pub struct QueueManager {
    items: Vec<QueueItem>,
    cursor: Option<usize>,
    next_order: u64,
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn append(&mut self, media_id: impl Into<String>) -> &QueueItem {
        let item = QueueItem {
            media_id: media_id.into(),
            order: self.next_order,
        };
        self.next_order += 1;
        self.items.push(item);
        if self.cursor.is_none() {
            self.cursor = Some(0);
        }
        let last = self.items.len() - 1;
        &self.items[last]
    }

    /// Remove the first entry for `media_id`. Returns whether anything was removed.
    pub fn remove(&mut self, media_id: &str) -> bool {
        let Some(pos) = self.items.iter().position(|i| i.media_id == media_id) else {
            return false;
        };
        self.items.remove(pos);

        // The index is kept as-is and only wrapped when it falls off the end.
        self.cursor = match self.cursor {
            _ if self.items.is_empty() => None,
            Some(c) if c >= self.items.len() => Some(c % self.items.len()),
            other => other,
        };
        true
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.cursor.and_then(|c| self.items.get(c))
    }

    /// Advance the cursor, wrapping to the first item after the last one.
    pub fn next(&mut self) -> Option<&QueueItem> {
        let c = self.cursor?;
        self.cursor = Some((c + 1) % self.items.len());
        self.current()
    }

    /// Step the cursor back, wrapping to the last item from the first one.
    pub fn previous(&mut self) -> Option<&QueueItem> {
        let c = self.cursor?;
        self.cursor = Some(if c > 0 { c - 1 } else { self.items.len() - 1 });
        self.current()
    }

    pub fn position_of(&self, media_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.media_id == media_id)
    }

    /// Move the cursor to `index`. Out-of-range indices are ignored.
    pub fn select(&mut self, index: usize) -> Option<&QueueItem> {
        if index >= self.items.len() {
            return None;
        }
        self.cursor = Some(index);
        self.current()
    }
}
