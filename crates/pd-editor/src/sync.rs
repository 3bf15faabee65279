//! Sync engine: page model ↔ live surface.
//!
//! The surface only ever shows the current page. Edits land on the
//! surface first; `capture` writes them back into the page list, `show`
//! rebuilds the surface from a page. Everything that reads the page list
//! (history, save, export) captures first.

use crate::history::Snapshot;
use pd_core::id::{ElementId, PageId};
use pd_core::model::{Document, Page};
use pd_core::render::render_page;
use pd_core::serialize::serialize_page;
use pd_core::surface::LiveSurface;

pub struct SyncEngine {
    /// The persisted model (authoritative for every page but the current one).
    pub document: Document,

    /// The editable view of the current page.
    pub surface: LiveSurface,
}

impl SyncEngine {
    /// Build an engine and show the document's current page.
    pub fn new(document: Document) -> Self {
        let mut engine = Self {
            surface: LiveSurface::new(0.0, 0.0),
            document,
        };
        engine.show_current();
        engine
    }

    pub fn current(&self) -> usize {
        self.document.current
    }

    pub fn pages(&self) -> &[Page] {
        &self.document.pages
    }

    /// Serialize the surface into the current page slot. `fresh_id` is used
    /// only when that slot does not exist yet.
    pub fn capture(&mut self, fresh_id: PageId) {
        let current = self.document.current;
        let page = serialize_page(
            &self.surface,
            self.document.pages.get(current),
            fresh_id,
        );
        match self.document.pages.get_mut(current) {
            Some(slot) => *slot = page,
            None => {
                self.document.pages.push(page);
                self.document.current = self.document.pages.len() - 1;
            }
        }
        log::trace!("sync: captured page {}", self.document.current);
    }

    /// Make `index` current and render it. Returns false if out of range.
    pub fn show(&mut self, index: usize) -> bool {
        if index >= self.document.pages.len() {
            return false;
        }
        self.document.current = index;
        self.show_current();
        true
    }

    /// Re-render the current page, dropping any uncaptured surface edits.
    pub fn show_current(&mut self) -> Vec<ElementId> {
        match self.document.current_page() {
            Some(page) => {
                log::debug!("sync: show page {}", self.document.current);
                render_page(&mut self.surface, page)
            }
            None => {
                self.surface.clear_elements();
                Vec::new()
            }
        }
    }

    /// Replace the page list with a history snapshot and show it.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let last = snapshot.pages.len().saturating_sub(1);
        self.document.pages = snapshot.pages;
        self.document.current = snapshot.current.min(last);
        self.show_current();
    }

    /// Replace the whole document and show its current page.
    pub fn replace(&mut self, document: Document) {
        self.document = document;
        self.show_current();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::model::{Content, Element, ElementKind};
    use pd_core::Rect;

    fn doc(pages: usize) -> Document {
        let mut d = Document::new("Test");
        for i in 0..pages {
            let mut p = Page::blank(PageId(i as u64 + 1), 794.0, 1123.0);
            p.elements.push(Element::new(
                ElementKind::Box,
                Content::markup(format!("<p>page {i}</p>")),
                Rect::new(10.0, 10.0, 110.0, 60.0),
            ));
            d.pages.push(p);
        }
        d
    }

    #[test]
    fn capture_writes_surface_edits_back() {
        let mut sync = SyncEngine::new(doc(2));
        let id = sync.surface.element_ids()[0];
        sync.surface.element_mut(id).unwrap().left = 300.0;
        sync.capture(PageId(99));
        assert_eq!(sync.pages()[0].elements[0].left, 300.0);
        assert_eq!(sync.pages()[0].id, PageId(1));
    }

    #[test]
    fn show_discards_uncaptured_edits() {
        let mut sync = SyncEngine::new(doc(2));
        let id = sync.surface.element_ids()[0];
        sync.surface.element_mut(id).unwrap().left = 300.0;
        assert!(sync.show(1));
        assert!(sync.show(0));
        let id = sync.surface.element_ids()[0];
        assert_eq!(sync.surface.element(id).unwrap().left, 10.0);
        assert!(!sync.show(5));
    }

    #[test]
    fn capture_into_empty_document_appends() {
        let mut sync = SyncEngine::new(Document::new("Empty"));
        sync.capture(PageId(7));
        assert_eq!(sync.pages().len(), 1);
        assert_eq!(sync.pages()[0].id, PageId(7));
    }

    #[test]
    fn restore_clamps_current() {
        let mut sync = SyncEngine::new(doc(1));
        sync.restore(Snapshot {
            pages: doc(2).pages,
            current: 4,
        });
        assert_eq!(sync.current(), 1);
        assert_eq!(sync.surface.len(), 1);
    }
}
