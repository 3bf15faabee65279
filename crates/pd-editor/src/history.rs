//! Snapshot undo/redo log.
//!
//! Every committed mutation stores a full copy of the page list and the
//! current page index, encoded as MessagePack so a stored snapshot is an
//! immutable byte buffer that later edits cannot alias. The log is linear:
//! committing after an undo discards the redo tail.

use crate::error::EditorResult;
use pd_core::model::Page;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SnapshotRef<'a> {
    pages: &'a [Page],
    current: usize,
}

/// A decoded snapshot, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Snapshot {
    pub pages: Vec<Page>,
    pub current: usize,
}

pub struct History {
    snapshots: Vec<Vec<u8>>,
    /// Index of the snapshot matching the live document.
    cursor: Option<usize>,
    /// Maximum number of stored snapshots.
    max_depth: usize,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: None,
            max_depth: max_depth.max(1),
        }
    }

    /// Record the document state. Drops any redo tail, then the oldest
    /// snapshot if the log is over its depth limit.
    pub fn commit(&mut self, pages: &[Page], current: usize) -> EditorResult<()> {
        let bytes = rmp_serde::to_vec_named(&SnapshotRef { pages, current })?;

        let keep = self.cursor.map_or(0, |c| c + 1);
        self.snapshots.truncate(keep);
        self.snapshots.push(bytes);
        if self.snapshots.len() > self.max_depth {
            self.snapshots.remove(0);
        }
        self.cursor = Some(self.snapshots.len() - 1);

        log::debug!(
            "history: commit #{} ({} pages, current {})",
            self.snapshots.len() - 1,
            pages.len(),
            current
        );
        Ok(())
    }

    /// Step back one snapshot. `None` at the oldest snapshot.
    pub fn undo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor?;
        if cursor == 0 {
            return None;
        }
        self.step_to(cursor - 1)
    }

    /// Step forward one snapshot. `None` at the newest snapshot.
    pub fn redo(&mut self) -> Option<Snapshot> {
        let cursor = self.cursor?;
        if cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.step_to(cursor + 1)
    }

    fn step_to(&mut self, index: usize) -> Option<Snapshot> {
        match rmp_serde::from_slice::<Snapshot>(&self.snapshots[index]) {
            Ok(snapshot) => {
                self.cursor = Some(index);
                log::debug!("history: restore #{index}");
                Some(snapshot)
            }
            Err(e) => {
                log::warn!("history: snapshot #{index} is unreadable, skipping: {e}");
                None
            }
        }
    }

    /// Forget every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = None;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.snapshots.len())
    }

    #[cfg(test)]
    fn corrupt(&mut self, index: usize) {
        self.snapshots[index] = vec![0xc1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::id::PageId;

    fn pages(n: u64) -> Vec<Page> {
        (0..n).map(|i| Page::blank(PageId(i), 794.0, 1123.0)).collect()
    }

    #[test]
    fn undo_and_redo_walk_the_log() {
        let mut h = History::new(10);
        h.commit(&pages(1), 0).unwrap();
        h.commit(&pages(2), 1).unwrap();
        h.commit(&pages(3), 2).unwrap();

        let s = h.undo().unwrap();
        assert_eq!((s.pages.len(), s.current), (2, 1));
        let s = h.undo().unwrap();
        assert_eq!(s.pages.len(), 1);
        assert!(h.undo().is_none());
        assert_eq!(h.cursor(), Some(0));

        let s = h.redo().unwrap();
        assert_eq!(s.pages.len(), 2);
        h.redo().unwrap();
        assert!(h.redo().is_none());
        assert_eq!(h.cursor(), Some(2));
    }

    #[test]
    fn commit_after_undo_discards_redo_tail() {
        let mut h = History::new(10);
        for n in 1..=4 {
            h.commit(&pages(n), 0).unwrap();
        }
        h.undo();
        h.undo();
        h.commit(&pages(9), 0).unwrap();
        assert_eq!(h.len(), 3);
        assert!(!h.can_redo());
        assert_eq!(h.undo().unwrap().pages.len(), 2);
    }

    #[test]
    fn depth_limit_drops_oldest() {
        let mut h = History::new(3);
        for n in 1..=5 {
            h.commit(&pages(n), 0).unwrap();
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.undo().unwrap().pages.len(), 4);
        assert_eq!(h.undo().unwrap().pages.len(), 3);
        assert!(h.undo().is_none());
    }

    #[test]
    fn empty_log_is_inert() {
        let mut h = History::new(5);
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert!(!h.can_undo());
        assert!(h.is_empty());
    }

    #[test]
    fn unreadable_snapshot_is_skipped() {
        let mut h = History::new(5);
        h.commit(&pages(1), 0).unwrap();
        h.commit(&pages(2), 0).unwrap();
        h.corrupt(0);
        assert!(h.undo().is_none());
        assert_eq!(h.cursor(), Some(1));
    }

    #[test]
    fn stored_snapshots_do_not_alias_live_pages() {
        let mut h = History::new(5);
        let mut live = pages(1);
        h.commit(&live, 0).unwrap();
        live[0].background = "#000".into();
        h.commit(&live, 0).unwrap();
        assert_eq!(h.undo().unwrap().pages[0].background, "#ffffff");
    }
}
