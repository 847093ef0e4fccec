use std::collections::VecDeque;
use std::sync::Arc;
use std::time::SystemTime;

use content_dom::Document;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use soulbrowser_core_types::BlockId;
use tracing::{debug, warn};

/// Attribute set on the document element while a block runs with
/// on-page feedback enabled.
pub const EXECUTING_BLOCK_ATTR: &str = "soul-executing-block";

/// Default number of mark events kept for diagnostics.
pub const DEFAULT_HISTORY: usize = 256;

/// One live in-progress mark.
#[derive(Clone, Debug)]
pub struct MarkEntry {
    pub name: String,
    /// Concurrent instances currently holding the mark
    pub holders: usize,
    pub show_on_page: bool,
    pub since: SystemTime,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MarkEventKind {
    Acquired,
    Released,
}

#[derive(Clone, Debug)]
pub struct MarkEvent {
    pub block: BlockId,
    pub name: String,
    pub kind: MarkEventKind,
    pub recorded_at: SystemTime,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MarkStats {
    pub acquired: u64,
    pub released: u64,
}

#[derive(Debug)]
struct BoundedRing<T> {
    capacity: usize,
    data: VecDeque<T>,
}

impl<T> BoundedRing<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            data: VecDeque::new(),
        }
    }
}

impl<T: Clone> BoundedRing<T> {
    fn push(&mut self, item: T) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }
}

/// Registry of blocks currently executing in this document context.
///
/// Marks are keyed by block identity. Concurrent instances of the same
/// block share one entry and the mark clears when the last holder leaves.
pub struct InProgressMarks {
    marks: DashMap<BlockId, MarkEntry>,
    events: Mutex<BoundedRing<MarkEvent>>,
    stats: Mutex<MarkStats>,
    document: Option<Arc<dyn Document>>,
}

impl InProgressMarks {
    pub fn new(history: usize) -> Self {
        Self {
            marks: DashMap::new(),
            events: Mutex::new(BoundedRing::new(history)),
            stats: Mutex::new(MarkStats::default()),
            document: None,
        }
    }

    /// Marks that can reflect `show_on_page` blocks onto the document.
    pub fn with_document(history: usize, document: Arc<dyn Document>) -> Self {
        Self {
            document: Some(document),
            ..Self::new(history)
        }
    }

    /// Mark a block as in progress until the returned guard drops.
    pub fn acquire(
        self: &Arc<Self>,
        block: BlockId,
        name: impl Into<String>,
        show_on_page: bool,
    ) -> MarkGuard {
        let name = name.into();
        match self.marks.entry(block.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().holders += 1,
            Entry::Vacant(entry) => {
                entry.insert(MarkEntry {
                    name: name.clone(),
                    holders: 1,
                    show_on_page,
                    since: SystemTime::now(),
                });
            }
        }
        if show_on_page {
            self.set_indicator(&name);
        }
        self.record(&block, &name, MarkEventKind::Acquired);
        debug!(block = %block, name = %name, "Block marked in progress");

        MarkGuard {
            marks: Arc::clone(self),
            block,
            name,
            show_on_page,
        }
    }

    pub fn is_marked(&self, block: &BlockId) -> bool {
        self.marks.contains_key(block)
    }

    pub fn holders(&self, block: &BlockId) -> usize {
        self.marks.get(block).map(|entry| entry.holders).unwrap_or(0)
    }

    pub fn active(&self) -> Vec<(BlockId, MarkEntry)> {
        self.marks
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn history(&self) -> Vec<MarkEvent> {
        self.events.lock().snapshot()
    }

    pub fn stats(&self) -> MarkStats {
        self.stats.lock().clone()
    }

    fn release(&self, block: &BlockId, name: &str, show_on_page: bool) {
        if let Entry::Occupied(mut entry) = self.marks.entry(block.clone()) {
            let holders = &mut entry.get_mut().holders;
            *holders = holders.saturating_sub(1);
            if *holders == 0 {
                entry.remove();
            }
        }
        if show_on_page {
            self.clear_indicator(name);
        }
        self.record(block, name, MarkEventKind::Released);
        debug!(block = %block, name = %name, "Block mark released");
    }

    fn record(&self, block: &BlockId, name: &str, kind: MarkEventKind) {
        {
            let mut stats = self.stats.lock();
            match kind {
                MarkEventKind::Acquired => stats.acquired += 1,
                MarkEventKind::Released => stats.released += 1,
            }
        }
        self.events.lock().push(MarkEvent {
            block: block.clone(),
            name: name.to_string(),
            kind,
            recorded_at: SystemTime::now(),
        });
    }

    fn set_indicator(&self, name: &str) {
        let Some(document) = &self.document else {
            return;
        };
        let Some(root) = document.document_element() else {
            return;
        };
        if let Err(err) = document.set_attribute(root, EXECUTING_BLOCK_ATTR, name) {
            warn!("Failed to set executing-block indicator: {}", err);
        }
    }

    fn clear_indicator(&self, name: &str) {
        let Some(document) = &self.document else {
            return;
        };
        let Some(root) = document.document_element() else {
            return;
        };
        // Only the block currently shown clears the indicator.
        match document.get_attribute(root, EXECUTING_BLOCK_ATTR) {
            Ok(Some(current)) if current == name => {
                if let Err(err) = document.remove_attribute(root, EXECUTING_BLOCK_ATTR) {
                    warn!("Failed to clear executing-block indicator: {}", err);
                }
            }
            Ok(_) => {}
            Err(err) => warn!("Failed to read executing-block indicator: {}", err),
        }
    }
}

impl Default for InProgressMarks {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

/// Scoped in-progress mark.
///
/// Released on drop, so the mark clears on success, failure, panic unwind
/// and when the owning future is dropped mid-flight.
#[must_use = "the mark is released as soon as the guard is dropped"]
pub struct MarkGuard {
    marks: Arc<InProgressMarks>,
    block: BlockId,
    name: String,
    show_on_page: bool,
}

impl MarkGuard {
    pub fn block(&self) -> &BlockId {
        &self.block
    }
}

impl Drop for MarkGuard {
    fn drop(&mut self) {
        self.marks
            .release(&self.block, &self.name, self.show_on_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use content_dom::{DocumentFixture, ElementFixture, MemoryDocument, Viewport};
    use std::time::Duration;

    fn document() -> Arc<MemoryDocument> {
        Arc::new(MemoryDocument::from_fixture(&DocumentFixture::new(
            Viewport::default(),
            ElementFixture::new("html").child(ElementFixture::new("body")),
        )))
    }

    fn indicator(doc: &MemoryDocument) -> Option<String> {
        let root = doc.document_element().unwrap();
        doc.get_attribute(root, EXECUTING_BLOCK_ATTR).unwrap()
    }

    #[test]
    fn guard_clears_mark_on_drop() {
        let marks = Arc::new(InProgressMarks::default());
        let block = BlockId::new("block-1");
        {
            let _guard = marks.acquire(block.clone(), "eventClick", false);
            assert!(marks.is_marked(&block));
        }
        assert!(!marks.is_marked(&block));
        assert_eq!(
            marks.stats(),
            MarkStats {
                acquired: 1,
                released: 1
            }
        );
        let kinds: Vec<_> = marks.history().into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![MarkEventKind::Acquired, MarkEventKind::Released]);
    }

    #[test]
    fn concurrent_holders_share_one_mark() {
        let marks = Arc::new(InProgressMarks::default());
        let block = BlockId::new("block-2");
        let first = marks.acquire(block.clone(), "getText", false);
        let second = marks.acquire(block.clone(), "getText", false);
        assert_eq!(marks.holders(&block), 2);
        drop(first);
        assert!(marks.is_marked(&block));
        drop(second);
        assert!(!marks.is_marked(&block));
        assert!(marks.active().is_empty());
    }

    #[test]
    fn history_is_bounded() {
        let marks = Arc::new(InProgressMarks::new(3));
        for i in 0..5 {
            let _guard = marks.acquire(BlockId::new(format!("b{i}")), "x", false);
        }
        assert_eq!(marks.history().len(), 3);
        assert_eq!(marks.stats().acquired, 5);
    }

    #[test]
    fn indicator_follows_show_on_page_blocks() {
        let doc = document();
        let marks = Arc::new(InProgressMarks::with_document(16, doc.clone()));

        let hidden = marks.acquire(BlockId::new("quiet"), "getText", false);
        assert_eq!(indicator(&doc), None);
        drop(hidden);

        let shown = marks.acquire(BlockId::new("loud"), "eventClick", true);
        assert_eq!(indicator(&doc).as_deref(), Some("eventClick"));
        drop(shown);
        assert_eq!(indicator(&doc), None);
    }

    #[tokio::test]
    async fn cancelled_future_releases_mark() {
        let marks = Arc::new(InProgressMarks::default());
        let block = BlockId::new("slow");
        let task_marks = marks.clone();
        let task_block = block.clone();
        let work = async move {
            let _guard = task_marks.acquire(task_block, "delay", false);
            std::future::pending::<()>().await;
        };

        let outcome = tokio::time::timeout(Duration::from_millis(20), work).await;
        assert!(outcome.is_err());
        assert!(!marks.is_marked(&block));
    }
}
