//! The editor: the single owned application state.
//!
//! Every discrete mutation ends in exactly one `commit`, which captures
//! the surface into the current page and snapshots the page list. Pointer
//! gestures mutate the surface frame by frame and commit once on release;
//! text edits commit after a quiet period polled through `tick`.

use crate::config::EditorConfig;
use crate::error::{EditorError, EditorResult};
use crate::hit::{CursorHint, HandleMetrics, HitTarget, cursor_at, drags_anywhere, hit_test, near_edge};
use crate::history::History;
use crate::input::{InputEvent, Modifiers};
use crate::selection::{Selection, ToolbarState};
use crate::services::{
    Clock, DocumentImager, ExportRequest, FormatCommand, Rasterizer, RichTextEditor, TextRange,
};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::sync::SyncEngine;
use crate::transform::{ResizeLimits, TransformEngine, TransformMode, Viewport};
use pd_core::format::{load_document, save_document};
use pd_core::gallery::{GalleryItem, TEXT_BOX_HTML, Template, parse_table_dimension, table_html};
use pd_core::id::{ElementId, PageId};
use pd_core::model::{BorderStyle, Content, Document, Element, ElementKind, Page, PagePreset};
use pd_core::surface::{HeaderCapture, LiveSurface, SurfaceView};
use pd_core::units::{Dim, format_px, parse_positive_length};
use pd_core::{Point, Rect};
use serde::Serialize;

/// Rasterization work for the current page's thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailJob {
    pub page_index: usize,
    pub page_id: PageId,
    /// Capture copy with affordances, guides and selection stripped.
    pub capture: LiveSurface,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: PageId,
    pub thumbnail: Option<String>,
}

/// Everything the host needs to draw the editor chrome and paper.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorView {
    pub title: String,
    pub zoom: f64,
    pub current_page: usize,
    pub pages: Vec<PageSummary>,
    pub surface: SurfaceView,
    pub toolbar: ToolbarState,
    pub cursor: &'static str,
    pub editing_text: bool,
    pub headers_visible: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub struct Editor {
    config: EditorConfig,
    clock: Box<dyn Clock>,
    sync: SyncEngine,
    history: History,
    selection: Selection,
    transform: TransformEngine,
    rich_text: Option<Box<dyn RichTextEditor>>,
    zoom: f64,
    /// Screen position of the paper's top-left corner.
    paper_origin: Point,
    headers_visible: bool,
    clipboard: Option<Element>,
    cursor: CursorHint,
    /// Deadline for committing pending text edits.
    text_commit_due: Option<f64>,
    thumbnail_stale: bool,
}

impl Editor {
    /// A fresh editor holding one blank page, with that state committed.
    pub fn new(config: EditorConfig, clock: Box<dyn Clock>) -> EditorResult<Self> {
        let mut document = Document::default();
        document.pages.push(Page::blank(
            PageId::from_clock(clock.now_ms(), None),
            config.page_width,
            config.page_height,
        ));
        let mut editor = Self {
            zoom: config.zoom.clamp(config.zoom.initial),
            history: History::new(config.history_limit),
            sync: SyncEngine::new(document),
            selection: Selection::new(),
            transform: TransformEngine::new(),
            rich_text: None,
            paper_origin: Point::ZERO,
            headers_visible: false,
            clipboard: None,
            cursor: CursorHint::Default,
            text_commit_due: None,
            thumbnail_stale: true,
            clock,
            config,
        };
        editor.sync.surface.set_headers_visible(editor.headers_visible);
        editor.commit()?;
        Ok(editor)
    }

    pub fn set_rich_text_editor(&mut self, rich: Box<dyn RichTextEditor>) {
        self.rich_text = Some(rich);
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.sync.document
    }

    pub fn surface(&self) -> &LiveSurface {
        &self.sync.surface
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selection.selected()
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn transform_mode(&self) -> TransformMode {
        self.transform.mode()
    }

    pub fn cursor(&self) -> CursorHint {
        self.cursor
    }

    pub fn headers_visible(&self) -> bool {
        self.headers_visible
    }

    pub fn current_page(&self) -> usize {
        self.sync.current()
    }

    pub fn page_count(&self) -> usize {
        self.sync.pages().len()
    }

    pub fn title(&self) -> &str {
        &self.sync.document.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.sync.document.title = title.into();
    }

    /// Report where the host laid out the paper on screen.
    pub fn set_paper_origin(&mut self, origin: Point) {
        self.paper_origin = origin;
        self.refresh_toolbar();
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.paper_origin, self.zoom)
    }

    pub fn view(&self) -> EditorView {
        EditorView {
            title: self.sync.document.title.clone(),
            zoom: self.zoom,
            current_page: self.sync.current(),
            pages: self
                .sync
                .pages()
                .iter()
                .map(|p| PageSummary {
                    id: p.id,
                    thumbnail: p.thumbnail.clone(),
                })
                .collect(),
            surface: self.sync.surface.to_view(),
            toolbar: self.selection.toolbar().clone(),
            cursor: self.cursor.css(),
            editing_text: self.selection.is_editing_text(),
            headers_visible: self.headers_visible,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    // ─── Commit & history ────────────────────────────────────────────────

    fn fresh_page_id(&self) -> PageId {
        PageId::from_clock(self.clock.now_ms(), self.sync.document.last_page_id())
    }

    fn capture(&mut self) {
        let id = self.fresh_page_id();
        self.sync.capture(id);
    }

    /// Capture the surface and snapshot the document.
    pub fn commit(&mut self) -> EditorResult<()> {
        self.capture();
        self.history
            .commit(&self.sync.document.pages, self.sync.document.current)?;
        self.text_commit_due = None;
        self.thumbnail_stale = true;
        Ok(())
    }

    /// Reset per-surface state after the surface was rebuilt.
    fn after_render(&mut self) {
        self.selection.reset();
        self.transform.cancel();
        self.sync.surface.set_headers_visible(self.headers_visible);
        self.thumbnail_stale = true;
    }

    fn flush_text_edit(&mut self) -> EditorResult<()> {
        if self.text_commit_due.is_some() {
            self.commit()?;
        }
        Ok(())
    }

    /// Step back one snapshot. A pending text edit is committed first so
    /// it can be undone like any other change.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.flush_text_edit()?;
        match self.history.undo() {
            Some(snapshot) => {
                self.sync.restore(snapshot);
                self.after_render();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn redo(&mut self) -> EditorResult<bool> {
        self.flush_text_edit()?;
        match self.history.redo() {
            Some(snapshot) => {
                self.sync.restore(snapshot);
                self.after_render();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn schedule_text_commit(&mut self) {
        self.text_commit_due = Some(self.clock.now_ms() + self.config.text_edit_quiet_ms);
    }

    pub fn text_commit_pending(&self) -> bool {
        self.text_commit_due.is_some()
    }

    /// Commit pending text edits once their quiet period has passed.
    pub fn tick(&mut self) -> EditorResult<bool> {
        match self.text_commit_due {
            Some(due) if self.clock.now_ms() >= due => {
                log::debug!("editor: text edit quiet period elapsed");
                self.commit()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select(&mut self, id: ElementId) -> bool {
        let viewport = self.viewport();
        self.selection.select(
            &mut self.sync.surface,
            id,
            viewport,
            &self.config.toolbar,
            self.rich_text.as_deref(),
        )
    }

    pub fn deselect(&mut self) {
        self.selection.deselect(&mut self.sync.surface);
    }

    /// Select the first element on the page.
    pub fn select_all(&mut self) -> Option<ElementId> {
        let first = self.sync.surface.element_ids().into_iter().next()?;
        self.select(first);
        Some(first)
    }

    fn refresh_toolbar(&mut self) {
        let viewport = self.viewport();
        self.selection.show_toolbar(
            &self.sync.surface,
            viewport,
            &self.config.toolbar,
            self.rich_text.as_deref(),
        );
    }

    /// Cache the host's current text selection for formatting replays.
    pub fn remember_text_range(&mut self, range: Option<TextRange>) {
        self.selection.remember_range(range);
    }

    fn require_selected(&self, err: EditorError) -> EditorResult<ElementId> {
        self.selection.selected().ok_or(err)
    }

    fn cropping_element(&self) -> Option<ElementId> {
        self.sync.surface.elements().find(|el| el.cropping).map(|el| el.id)
    }

    // ─── Pointer & keyboard ──────────────────────────────────────────────

    /// Dispatch one host event. Returns whether the view changed.
    pub fn handle_event(&mut self, event: &InputEvent) -> EditorResult<bool> {
        match event {
            InputEvent::PointerDown { x, y, .. } => Ok(self.pointer_down(Point::new(*x, *y))),
            InputEvent::PointerMove { x, y, .. } => Ok(self.pointer_move(Point::new(*x, *y))),
            InputEvent::PointerUp { .. } => self.pointer_up(),
            InputEvent::DoubleClick { x, y } => Ok(self.double_click(Point::new(*x, *y))),
            InputEvent::Wheel { delta_y, modifiers } => Ok(self.wheel(*delta_y, *modifiers)),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, *modifiers),
            InputEvent::KeyUp { in_editable, .. } => {
                if *in_editable {
                    self.schedule_text_commit();
                }
                Ok(false)
            }
        }
    }

    fn metrics(&self) -> HandleMetrics {
        HandleMetrics {
            size: self.config.handle_size,
            rotate_offset: self.config.rotate_handle_offset,
        }
    }

    fn limits(&self) -> ResizeLimits {
        ResizeLimits {
            min_extent: self.config.min_extent,
            crop_min_extent: self.config.crop_min_extent,
        }
    }

    fn pointer_down(&mut self, screen: Point) -> bool {
        let p = self.viewport().to_page(screen);
        let target = hit_test(&self.sync.surface, p, self.selection.selected(), self.metrics());
        log::trace!("editor: pointer down at {p:?} on {target:?}");

        if let Some(cropping) = self.cropping_element() {
            match target {
                HitTarget::ResizeHandle { id, dir } if id == cropping => {
                    self.transform.begin_resize(&self.sync.surface, id, dir, screen);
                    self.selection.hide_toolbar();
                    return true;
                }
                HitTarget::Element { id } if id == cropping => {
                    if self.transform.begin_pan(&self.sync.surface, id, screen) {
                        self.selection.hide_toolbar();
                        return true;
                    }
                }
                other if other.element() != Some(cropping) => {
                    if let Some(el) = self.sync.surface.element_mut(cropping) {
                        el.cropping = false;
                    }
                    log::debug!("editor: crop mode off for {cropping:?}");
                }
                _ => {}
            }
        }

        match target {
            HitTarget::Outside => false,
            HitTarget::Paper => {
                self.deselect();
                true
            }
            HitTarget::RotateHandle { id } => {
                self.transform.begin_rotate(&self.sync.surface, id);
                self.selection.hide_toolbar();
                true
            }
            HitTarget::ResizeHandle { id, dir } => {
                self.transform.begin_resize(&self.sync.surface, id, dir, screen);
                self.selection.hide_toolbar();
                true
            }
            HitTarget::Element { id } => {
                if self.selection.selected() != Some(id) {
                    self.select(id);
                }
                let band = self.config.edge_grab_band / self.zoom;
                let surface = &self.sync.surface;
                let drags = match (surface.element(id), surface.content(id)) {
                    (Some(el), Some(content)) => {
                        drags_anywhere(el.kind, content)
                            || near_edge(el, p, band)
                            || !self.selection.is_editing_text()
                    }
                    _ => false,
                };
                if drags {
                    self.transform.begin_drag(&self.sync.surface, id, screen);
                    self.selection.hide_toolbar();
                }
                true
            }
        }
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        if self.transform.is_active() {
            let (viewport, limits) = (self.viewport(), self.limits());
            return self
                .transform
                .update(&mut self.sync.surface, screen, viewport, limits);
        }
        let p = self.viewport().to_page(screen);
        let band = self.config.edge_grab_band / self.zoom;
        let cursor = cursor_at(&self.sync.surface, p, band);
        let changed = cursor != self.cursor;
        self.cursor = cursor;
        changed
    }

    fn pointer_up(&mut self) -> EditorResult<bool> {
        match self.transform.end() {
            Some(_) => {
                self.commit()?;
                self.refresh_toolbar();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn double_click(&mut self, screen: Point) -> bool {
        let p = self.viewport().to_page(screen);
        let Some(id) = hit_test(&self.sync.surface, p, self.selection.selected(), self.metrics()).element()
        else {
            return false;
        };
        if self.selection.selected() != Some(id) {
            self.select(id);
        }
        self.selection.begin_edit(&self.sync.surface, id);
        true
    }

    fn wheel(&mut self, delta_y: f64, modifiers: Modifiers) -> bool {
        if !modifiers.command() {
            return false;
        }
        let step = if delta_y > 0.0 {
            -self.config.zoom.step
        } else {
            self.config.zoom.step
        };
        self.set_zoom(self.zoom + step);
        true
    }

    fn key_down(&mut self, key: &str, modifiers: Modifiers) -> EditorResult<bool> {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return Ok(false);
        };
        if action.yields_to_text_edit() && self.selection.is_editing_text() {
            return Ok(false);
        }
        log::debug!("editor: shortcut {action:?}");
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Copy => Ok(self.copy()),
            ShortcutAction::Paste => Ok(self.paste()?.is_some()),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                Ok(true)
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                Ok(true)
            }
            ShortcutAction::ZoomReset => {
                self.set_zoom(1.0);
                Ok(true)
            }
            ShortcutAction::Deselect => {
                self.deselect();
                Ok(true)
            }
        }
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    /// Set the zoom, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        let rounded = (zoom * 100.0).round() / 100.0;
        self.zoom = self.config.zoom.clamp(rounded);
        log::debug!("editor: zoom {:.2}", self.zoom);
        if self.selection.toolbar().visible {
            self.refresh_toolbar();
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.config.zoom.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.config.zoom.step);
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    /// Append a blank page and make it current.
    pub fn add_new_page(&mut self) -> EditorResult<usize> {
        self.capture();
        let page = Page::blank(
            self.fresh_page_id(),
            self.config.page_width,
            self.config.page_height,
        );
        self.sync.document.pages.push(page);
        let index = self.sync.pages().len() - 1;
        self.sync.show(index);
        self.after_render();
        self.commit()?;
        Ok(index)
    }

    /// Show another page. Not an undoable change.
    pub fn switch_page(&mut self, index: usize) -> EditorResult<()> {
        if index >= self.page_count() {
            return Err(EditorError::NoSuchPage(index));
        }
        if index == self.sync.current() {
            return Ok(());
        }
        self.capture();
        self.sync.show(index);
        self.after_render();
        Ok(())
    }

    /// Delete a page. Deleting the last remaining page leaves a fresh blank one.
    pub fn delete_page(&mut self, index: usize) -> EditorResult<()> {
        if index >= self.page_count() {
            return Err(EditorError::NoSuchPage(index));
        }
        self.capture();
        let pages = &mut self.sync.document.pages;
        pages.remove(index);
        let mut current = self.sync.document.current;
        if index < current {
            current -= 1;
        }
        if self.sync.document.pages.is_empty() {
            let id = self.fresh_page_id();
            self.sync.document.pages.push(Page::blank(
                id,
                self.config.page_width,
                self.config.page_height,
            ));
        }
        let last = self.sync.document.pages.len() - 1;
        self.sync.show(current.min(last));
        self.after_render();
        self.commit()
    }

    /// Drop the document and its history; start over with one blank page.
    pub fn new_document(&mut self) -> EditorResult<()> {
        self.history.clear();
        let mut document = Document::default();
        document.pages.push(Page::blank(
            PageId::from_clock(self.clock.now_ms(), self.sync.document.last_page_id()),
            self.config.page_width,
            self.config.page_height,
        ));
        self.sync.replace(document);
        self.after_render();
        log::debug!("editor: new document");
        self.commit()
    }

    // ─── Page setup ──────────────────────────────────────────────────────

    pub fn set_background(&mut self, background: &str) -> EditorResult<()> {
        self.sync.surface.paper_mut().background = background.to_string();
        self.commit()
    }

    pub fn set_border(&mut self, style: BorderStyle) -> EditorResult<()> {
        self.sync.surface.set_border(style);
        self.commit()
    }

    pub fn set_border_tag(&mut self, tag: &str) -> EditorResult<()> {
        let style = BorderStyle::from_tag(tag).ok_or_else(|| EditorError::UnknownBorder(tag.to_string()))?;
        self.set_border(style)
    }

    pub fn set_page_size(&mut self, preset: PagePreset) -> EditorResult<()> {
        let (width, height) = preset.size();
        self.sync.surface.set_size(width, height);
        self.commit()
    }

    /// Parse `"<width>,<height>"` with any supported length unit.
    pub fn set_custom_page_size(&mut self, input: &str) -> EditorResult<()> {
        let invalid = || EditorError::InvalidPageSize(input.to_string());
        let (w, h) = input.split_once(',').ok_or_else(invalid)?;
        let width = parse_positive_length(w, "page width").map_err(|_| invalid())?;
        let height = parse_positive_length(h, "page height").map_err(|_| invalid())?;
        self.sync.surface.set_size(width, height);
        self.commit()
    }

    /// Swap page width and height.
    pub fn toggle_orientation(&mut self) -> EditorResult<()> {
        let paper = self.sync.surface.paper();
        let (width, height) = (paper.width, paper.height);
        self.sync.surface.set_size(height, width);
        self.commit()
    }

    pub fn toggle_header_footer(&mut self) -> bool {
        self.headers_visible = !self.headers_visible;
        self.sync.surface.set_headers_visible(self.headers_visible);
        self.headers_visible
    }

    pub fn toggle_margins(&mut self) -> bool {
        let visible = !self.sync.surface.guides_visible();
        self.sync.surface.set_guides_visible(visible);
        visible
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Place an element, select it and commit.
    pub fn insert_element(&mut self, element: Element) -> EditorResult<ElementId> {
        check_insertable(&element)?;
        let id = self.sync.surface.add_element(&element);
        log::debug!("editor: inserted {} {id:?}", element.kind.tag());
        self.select(id);
        self.commit()?;
        Ok(id)
    }

    pub fn insert_text_box(&mut self) -> EditorResult<ElementId> {
        self.insert_element(Element::new(
            ElementKind::Box,
            Content::markup(TEXT_BOX_HTML),
            self.config.new_element_frame(),
        ))
    }

    pub fn insert_table(&mut self, rows: usize, cols: usize) -> EditorResult<ElementId> {
        if rows == 0 || cols == 0 {
            return Err(EditorError::InvalidTableSize);
        }
        self.insert_element(Element::new(
            ElementKind::Table,
            Content::markup(table_html(rows, cols)),
            self.config.new_element_frame(),
        ))
    }

    /// Insert a table from free-form row and column prompts.
    pub fn insert_table_from_prompt(&mut self, rows: &str, cols: &str) -> EditorResult<ElementId> {
        match (parse_table_dimension(rows), parse_table_dimension(cols)) {
            (Some(rows), Some(cols)) => self.insert_table(rows, cols),
            _ => Err(EditorError::InvalidTableSize),
        }
    }

    pub fn insert_shape(&mut self, clip_path: &str, fill: &str) -> EditorResult<ElementId> {
        let [left, top, ..] = self.config.new_element;
        let size = self.config.shape_size;
        self.insert_element(Element::new(
            ElementKind::Shape,
            Content::shape(clip_path, fill),
            Rect::new(left, top, left + size, top + size),
        ))
    }

    pub fn insert_image(&mut self, src: &str) -> EditorResult<ElementId> {
        self.insert_element(Element::new(
            ElementKind::Image,
            Content::image(src),
            self.config.new_element_frame(),
        ))
    }

    pub fn insert_gallery_item(&mut self, item: GalleryItem) -> EditorResult<ElementId> {
        let element = item.into_element(self.config.new_element_frame());
        self.insert_element(element)
    }

    /// Replace the current page with a template layout, keeping the page id.
    pub fn load_template(&mut self, template: &Template) -> EditorResult<()> {
        let elements = template.to_elements();
        elements.iter().try_for_each(check_insertable)?;
        self.capture();
        let current = self.sync.current();
        let Some(previous) = self.sync.document.pages.get(current) else {
            return Err(EditorError::NoSuchPage(current));
        };
        let (width, height) = PagePreset::A4.size();
        let mut page = Page::blank(previous.id, width, height);
        page.thumbnail = previous.thumbnail.clone();
        page.header = "Header".to_string();
        page.footer = "Footer".to_string();
        if let Some(background) = &template.background {
            page.background = background.clone();
        }
        page.elements = elements;
        self.sync.document.pages[current] = page;
        self.sync.show_current();
        self.after_render();
        log::debug!("editor: template `{}` applied", template.name);
        self.commit()
    }

    pub fn delete_selected(&mut self) -> EditorResult<bool> {
        let Some(id) = self.selection.selected() else {
            return Ok(false);
        };
        self.deselect();
        self.sync.surface.remove_element(id);
        self.commit()?;
        Ok(true)
    }

    pub fn copy(&mut self) -> bool {
        let Some(mut element) = self
            .selection
            .selected()
            .and_then(|id| self.sync.surface.element_model(id))
        else {
            return false;
        };
        element.crop_mode = false;
        self.clipboard = Some(element);
        true
    }

    /// Paste a copy of the clipboard, offset from the original.
    pub fn paste(&mut self) -> EditorResult<Option<ElementId>> {
        let Some(mut element) = self.clipboard.clone() else {
            return Ok(None);
        };
        element.left += self.config.paste_offset;
        element.top += self.config.paste_offset;
        self.insert_element(element).map(Some)
    }

    pub fn bring_to_front(&mut self) -> EditorResult<()> {
        let id = self.require_selected(EditorError::NothingSelected)?;
        let top = self
            .sync
            .surface
            .elements()
            .map(|el| el.z_index)
            .max()
            .unwrap_or(self.config.default_z_index);
        if let Some(el) = self.sync.surface.element_mut(id) {
            el.z_index = top + 1;
        }
        self.commit()
    }

    pub fn send_to_back(&mut self) -> EditorResult<()> {
        let id = self.require_selected(EditorError::NothingSelected)?;
        let bottom = self
            .sync
            .surface
            .elements()
            .map(|el| el.z_index)
            .min()
            .unwrap_or(self.config.default_z_index);
        if let Some(el) = self.sync.surface.element_mut(id) {
            el.z_index = (bottom - 1).max(1);
        }
        self.commit()
    }

    pub fn rotate_selected_90(&mut self) -> EditorResult<()> {
        let id = self.require_selected(EditorError::NothingToRotate)?;
        if let Some(el) = self.sync.surface.element_mut(id) {
            el.rotation = el.rotation.rotated_by(90.0);
        }
        self.refresh_toolbar();
        self.commit()
    }

    /// Set a CSS filter on the selected image. Empty clears it.
    pub fn apply_image_filter(&mut self, filter: &str) -> EditorResult<()> {
        let id = self.require_selected(EditorError::NotAnImage)?;
        match self.sync.surface.content_mut(id) {
            Some(Content::Image { style, .. }) => {
                let filter = filter.trim();
                style.filter = (!filter.is_empty()).then(|| filter.to_string());
            }
            _ => return Err(EditorError::NotAnImage),
        }
        self.commit()
    }

    /// Enter or leave crop mode on the selected image. Entering pins the
    /// image to its current rendered size so the box can clip it.
    pub fn toggle_crop(&mut self) -> EditorResult<bool> {
        if let Some(id) = self.cropping_element() {
            if let Some(el) = self.sync.surface.element_mut(id) {
                el.cropping = false;
            }
            log::debug!("editor: crop mode off for {id:?}");
            return Ok(false);
        }
        let id = self.require_selected(EditorError::NothingToCrop)?;
        let Some(el) = self.sync.surface.element(id) else {
            return Err(EditorError::NothingToCrop);
        };
        let (width, height) = (el.width, el.height);
        match self.sync.surface.content_mut(id) {
            Some(Content::Image { style, .. }) => {
                let w = style.width.unwrap_or(Dim::Auto).resolve(width);
                let h = style.height.unwrap_or(Dim::Auto).resolve(height);
                style.width = Some(Dim::Px(w));
                style.height = Some(Dim::Px(h));
                style.max_width = Some(Dim::None);
                style.max_height = Some(Dim::None);
                style.position = Some("absolute".to_string());
                style.left.get_or_insert(0.0);
                style.top.get_or_insert(0.0);
            }
            _ => return Err(EditorError::NotCroppable),
        }
        if let Some(el) = self.sync.surface.element_mut(id) {
            el.cropping = true;
        }
        self.selection.hide_toolbar();
        log::debug!("editor: crop mode on for {id:?}");
        Ok(true)
    }

    // ─── Live text edits ─────────────────────────────────────────────────

    /// Mirror the host's edited markup into an element. Committed after the
    /// quiet period.
    pub fn update_markup(&mut self, id: ElementId, html: &str) -> bool {
        match self.sync.surface.content_mut(id) {
            Some(Content::Markup { html: current }) => {
                *current = html.to_string();
                self.schedule_text_commit();
                true
            }
            _ => false,
        }
    }

    pub fn set_header_html(&mut self, html: &str) {
        self.sync.surface.header_mut().html = html.to_string();
        self.schedule_text_commit();
    }

    pub fn set_footer_html(&mut self, html: &str) {
        self.sync.surface.footer_mut().html = html.to_string();
        self.schedule_text_commit();
    }

    // ─── Formatting ──────────────────────────────────────────────────────

    /// Run a formatting command. A text color on a selected shape recolors
    /// its fill instead. Returns whether anything changed.
    pub fn exec_format(&mut self, command: FormatCommand) -> EditorResult<bool> {
        if let FormatCommand::ForeColor(color) = &command {
            let shape_fill = self
                .selection
                .selected()
                .and_then(|id| self.sync.surface.content_mut(id))
                .and_then(|content| match content {
                    Content::Shape { fill, .. } => Some(fill),
                    _ => None,
                });
            if let Some(fill) = shape_fill {
                *fill = color.clone();
                self.commit()?;
                return Ok(true);
            }
        }

        let Some(rich) = self.rich_text.as_mut() else {
            return Ok(false);
        };
        let range = self.selection.last_range().cloned();
        let outcome = self
            .selection
            .programmatic(|_| rich.exec(range.as_ref(), &command));
        if outcome.range.is_some() {
            self.selection.set_range(outcome.range.clone());
        }

        let Some(html) = outcome.html else {
            return Ok(false);
        };
        let target = outcome
            .range
            .as_ref()
            .or(range.as_ref())
            .map(|r| r.element)
            .or(self.selection.selected());
        if let Some(Content::Markup { html: current }) =
            target.and_then(|id| self.sync.surface.content_mut(id))
        {
            *current = html;
        }
        self.commit()?;
        self.refresh_toolbar();
        Ok(true)
    }

    pub fn set_font_family(&mut self, family: &str) -> EditorResult<bool> {
        self.exec_format(FormatCommand::FontName(family.to_string()))
    }

    pub fn set_font_size(&mut self, px: f64) -> EditorResult<bool> {
        self.exec_format(FormatCommand::FontSize(format_px(px)))
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_json(&mut self) -> EditorResult<String> {
        self.capture();
        Ok(save_document(&self.sync.document)?)
    }

    /// Replace the document with a saved one. On error nothing changes.
    pub fn load_json(&mut self, json: &str) -> EditorResult<()> {
        let mut document = load_document(json, self.clock.now_ms())?;
        document.current = 0;
        log::debug!("editor: loaded {} pages", document.pages.len());
        self.sync.replace(document);
        self.after_render();
        self.commit()
    }

    // ─── Thumbnails & export ─────────────────────────────────────────────

    /// Whether the current page changed since its thumbnail was requested.
    pub fn needs_thumbnail(&self) -> bool {
        self.thumbnail_stale
    }

    pub fn request_thumbnail(&mut self) -> ThumbnailJob {
        self.capture();
        self.thumbnail_stale = false;
        let headers = if self.headers_visible {
            HeaderCapture::ShowAll
        } else {
            HeaderCapture::HideEmpty
        };
        let index = self.sync.current();
        ThumbnailJob {
            page_index: index,
            page_id: self.sync.pages()[index].id,
            capture: self.sync.surface.stripped_for_capture(headers),
            scale: self.config.thumbnail_scale,
        }
    }

    /// Store a finished thumbnail. Results for pages that no longer sit at
    /// the job's index, and rasterizer failures, are dropped.
    pub fn complete_thumbnail(&mut self, job: &ThumbnailJob, result: Result<String, String>) -> bool {
        let url = match result {
            Ok(url) => url,
            Err(e) => {
                log::debug!("editor: thumbnail failed: {e}");
                return false;
            }
        };
        match self.sync.document.pages.get_mut(job.page_index) {
            Some(page) if page.id == job.page_id => {
                page.thumbnail = Some(url);
                true
            }
            _ => {
                log::debug!("editor: stale thumbnail for page {}", job.page_id);
                false
            }
        }
    }

    pub fn refresh_thumbnail(&mut self, rasterizer: &mut dyn Rasterizer) -> bool {
        let job = self.request_thumbnail();
        let result = rasterizer.rasterize(&job.capture, job.scale);
        self.complete_thumbnail(&job, result)
    }

    /// Capture the current page for printing: no selection, guides hidden,
    /// header and footer dropped unless shown.
    pub fn prepare_export(&mut self) -> ExportRequest {
        self.deselect();
        self.capture();
        let headers = if self.headers_visible {
            HeaderCapture::ShowAll
        } else {
            HeaderCapture::HideAll
        };
        let surface = self.sync.surface.stripped_for_capture(headers);
        let paper = surface.paper();
        let (width, height, background) = (paper.width, paper.height, paper.background.clone());
        ExportRequest {
            title: self.sync.document.title.clone(),
            surface,
            width,
            height,
            scale: self.config.export_scale,
            background,
        }
    }

    /// Export the current page. Returns the file name and document bytes.
    pub fn export_pdf(&mut self, imager: &mut dyn DocumentImager) -> EditorResult<(String, Vec<u8>)> {
        let request = self.prepare_export();
        let bytes = imager.image(&request).map_err(EditorError::Export)?;
        log::debug!("editor: exported {} bytes", bytes.len());
        Ok((request.file_name(), bytes))
    }
}

/// Reject elements that would not survive a save and reload: sizes must
/// be positive, and image or shape content needs its source.
fn check_insertable(element: &Element) -> EditorResult<()> {
    let (width, height) = (element.width, element.height);
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(EditorError::InvalidElementSize { width, height });
    }
    match &element.content {
        Content::Image { src, .. } if src.trim().is_empty() => Err(EditorError::EmptyImageSource),
        Content::Shape { clip_path, .. } if clip_path.trim().is_empty() => {
            Err(EditorError::EmptyClipPath)
        }
        _ => Ok(()),
    }
}
