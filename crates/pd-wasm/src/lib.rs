//! WASM bridge for Paperdesk: exposes the editor core to the page script.
//!
//! Compiled via `wasm-pack build --target web`. The script forwards DOM
//! events here, redraws from [`PubCanvas::view_json`] whenever a call
//! reports a change, and runs the rasterizer and PDF imaging itself.

mod host;

use host::{JsClock, JsRichText, install_logger};
use pd_core::{ElementId, GalleryItem, PagePreset, Point, Template, load_document};
use pd_editor::{
    Clock, Editor, EditorConfig, EditorResult, FormatCommand, InputEvent, Modifiers, TextRange,
    ThumbnailJob,
};
use serde_json::json;
use wasm_bindgen::prelude::*;

/// The WASM-facing editor controller.
///
/// Owns the editor and the thumbnail job currently out with the script.
#[wasm_bindgen]
pub struct PubCanvas {
    editor: Editor,
    pending_thumbnail: Option<ThumbnailJob>,
}

#[wasm_bindgen]
impl PubCanvas {
    /// Create an editor with one blank page. `config_json` may be empty
    /// for the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PubCanvas, JsValue> {
        console_error_panic_hook_setup();
        install_logger(log::LevelFilter::Info);

        let config = if config_json.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config_json).map_err(to_js)?
        };
        Self::with_clock(config, Box::new(JsClock)).map_err(to_js)
    }

    /// Everything needed to redraw the chrome and the page, as JSON.
    pub fn view_json(&self) -> String {
        serde_json::to_string(&self.editor.view()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Screen position of the paper's top-left corner.
    pub fn set_paper_origin(&mut self, x: f64, y: f64) -> bool {
        self.editor.set_paper_origin(Point::new(x, y));
        true
    }

    pub fn set_title(&mut self, title: &str) {
        self.editor.set_title(title);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let modifiers = modifiers(shift, ctrl, alt, meta);
        self.dispatch(InputEvent::PointerDown { x, y, modifiers })
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.dispatch(InputEvent::pointer_move(x, y))
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.dispatch(InputEvent::pointer_up(x, y))
    }

    pub fn handle_double_click(&mut self, x: f64, y: f64) -> bool {
        self.dispatch(InputEvent::DoubleClick { x, y })
    }

    /// Returns `true` when the wheel zoomed; the script then cancels the
    /// browser's own zoom.
    pub fn handle_wheel(&mut self, delta_y: f64, ctrl: bool, meta: bool) -> bool {
        let modifiers = modifiers(false, ctrl, false, meta);
        self.dispatch(InputEvent::Wheel { delta_y, modifiers })
    }

    /// Returns `true` when a shortcut was consumed.
    pub fn handle_key_down(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.dispatch(InputEvent::key(key, modifiers(shift, ctrl, alt, meta)))
    }

    pub fn handle_key_up(&mut self, key: &str, in_editable: bool) -> bool {
        self.dispatch(InputEvent::KeyUp {
            key: key.to_string(),
            in_editable,
        })
    }

    /// Drive the text-edit debounce; call from a timer.
    pub fn tick(&mut self) -> bool {
        let result = self.editor.tick();
        report(result)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        let result = self.editor.undo();
        report(result)
    }

    pub fn redo(&mut self) -> bool {
        let result = self.editor.redo();
        report(result)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn select_by_id(&mut self, id: &str) -> bool {
        ElementId::lookup(id).is_some_and(|id| self.editor.select(id))
    }

    pub fn deselect(&mut self) {
        self.editor.deselect();
    }

    /// Select the first element. Returns its id, or an empty string.
    pub fn select_all(&mut self) -> String {
        self.editor
            .select_all()
            .map(|id| id.to_string())
            .unwrap_or_default()
    }

    /// Cache the caret range reported by `selectionchange`.
    pub fn remember_text_range(&mut self, element: &str, start: u32, end: u32) {
        let range = ElementId::lookup(element).map(|element| TextRange {
            element,
            start,
            end,
        });
        self.editor.remember_text_range(range);
    }

    /// Install the script's `contenteditable` callbacks.
    pub fn set_rich_text_bridge(&mut self, exec: js_sys::Function, computed_font: js_sys::Function) {
        self.editor
            .set_rich_text_editor(Box::new(JsRichText::new(exec, computed_font)));
    }

    // ─── Zoom ────────────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.editor.zoom()
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.editor.set_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.editor.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.editor.zoom_out();
    }

    // ─── Pages ───────────────────────────────────────────────────────────

    /// Append a blank page and switch to it. Returns its index, or -1.
    pub fn add_page(&mut self) -> i32 {
        match self.editor.add_new_page() {
            Ok(index) => index as i32,
            Err(e) => {
                log::warn!("pd-wasm: add page failed: {e}");
                -1
            }
        }
    }

    pub fn switch_page(&mut self, index: usize) -> bool {
        let result = self.editor.switch_page(index);
        report(result.map(|()| true))
    }

    pub fn delete_page(&mut self, index: usize) -> bool {
        let result = self.editor.delete_page(index);
        report(result.map(|()| true))
    }

    pub fn new_document(&mut self) -> bool {
        let result = self.editor.new_document();
        report(result.map(|()| true))
    }

    // ─── Page setup ──────────────────────────────────────────────────────

    pub fn set_background(&mut self, background: &str) -> bool {
        let result = self.editor.set_background(background);
        report(result.map(|()| true))
    }

    pub fn set_border(&mut self, tag: &str) -> bool {
        let result = self.editor.set_border_tag(tag);
        report(result.map(|()| true))
    }

    /// `"A4"` or `"Letter"`.
    pub fn set_page_size(&mut self, preset: &str) -> bool {
        let Some(preset) = parse_preset(preset) else {
            log::warn!("pd-wasm: unknown page size `{preset}`");
            return false;
        };
        let result = self.editor.set_page_size(preset);
        report(result.map(|()| true))
    }

    /// Apply a `"width,height"` custom size. Returns `{"ok":true}` or
    /// `{"ok":false,"error":"..."}` so the script can alert.
    pub fn set_custom_page_size(&mut self, input: &str) -> String {
        outcome_json(self.editor.set_custom_page_size(input))
    }

    pub fn toggle_orientation(&mut self) -> bool {
        let result = self.editor.toggle_orientation();
        report(result.map(|()| true))
    }

    pub fn toggle_header_footer(&mut self) -> bool {
        self.editor.toggle_header_footer()
    }

    pub fn toggle_margins(&mut self) -> bool {
        self.editor.toggle_margins()
    }

    // ─── Elements ────────────────────────────────────────────────────────

    /// Each insert returns the new element's id, or an empty string.
    pub fn insert_text_box(&mut self) -> String {
        id_or_empty(self.editor.insert_text_box())
    }

    /// Insert a table from the two prompt answers. Returns `{"ok":true,"id":...}`
    /// or `{"ok":false,"error":"..."}`.
    pub fn insert_table(&mut self, rows: &str, cols: &str) -> String {
        match self.editor.insert_table_from_prompt(rows, cols) {
            Ok(id) => json!({ "ok": true, "id": id.to_string() }).to_string(),
            Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
        }
    }

    pub fn insert_shape(&mut self, clip_path: &str, fill: &str) -> String {
        id_or_empty(self.editor.insert_shape(clip_path, fill))
    }

    pub fn insert_image(&mut self, src: &str) -> String {
        id_or_empty(self.editor.insert_image(src))
    }

    pub fn insert_word_art(&mut self, style: u32) -> String {
        id_or_empty(self.editor.insert_gallery_item(GalleryItem::word_art(style)))
    }

    pub fn insert_clipart(&mut self, url: &str) -> String {
        id_or_empty(self.editor.insert_gallery_item(GalleryItem::clipart(url)))
    }

    pub fn insert_badge(&mut self, text: &str, color: &str, text_color: &str, clip_path: &str) -> String {
        let item = GalleryItem::badge(text, color, text_color, clip_path);
        id_or_empty(self.editor.insert_gallery_item(item))
    }

    /// Replace the current page's content with a template given as JSON.
    pub fn load_template(&mut self, template_json: &str) -> bool {
        let template: Template = match serde_json::from_str(template_json) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("pd-wasm: bad template: {e}");
                return false;
            }
        };
        let result = self.editor.load_template(&template);
        report(result.map(|()| true))
    }

    pub fn delete_selected(&mut self) -> bool {
        let result = self.editor.delete_selected();
        report(result)
    }

    pub fn copy(&mut self) -> bool {
        self.editor.copy()
    }

    pub fn paste(&mut self) -> String {
        match self.editor.paste() {
            Ok(id) => id.map(|id| id.to_string()).unwrap_or_default(),
            Err(e) => {
                log::warn!("pd-wasm: paste failed: {e}");
                String::new()
            }
        }
    }

    pub fn bring_to_front(&mut self) -> bool {
        let result = self.editor.bring_to_front();
        report(result.map(|()| true))
    }

    pub fn send_to_back(&mut self) -> bool {
        let result = self.editor.send_to_back();
        report(result.map(|()| true))
    }

    pub fn rotate_selected_90(&mut self) -> bool {
        let result = self.editor.rotate_selected_90();
        report(result.map(|()| true))
    }

    pub fn apply_image_filter(&mut self, filter: &str) -> bool {
        let result = self.editor.apply_image_filter(filter);
        report(result.map(|()| true))
    }

    /// Toggle crop mode on the selected image. Returns the new state.
    pub fn toggle_crop(&mut self) -> bool {
        let result = self.editor.toggle_crop();
        report(result)
    }

    // ─── Text ────────────────────────────────────────────────────────────

    /// Mirror typed markup from a `contenteditable` element.
    pub fn update_markup(&mut self, id: &str, html: &str) -> bool {
        ElementId::lookup(id).is_some_and(|id| self.editor.update_markup(id, html))
    }

    pub fn set_header_html(&mut self, html: &str) {
        self.editor.set_header_html(html);
    }

    pub fn set_footer_html(&mut self, html: &str) {
        self.editor.set_footer_html(html);
    }

    pub fn exec_format(&mut self, name: &str, value: Option<String>) -> bool {
        let command = FormatCommand::from_name(name, value.as_deref());
        let result = self.editor.exec_format(command);
        report(result)
    }

    pub fn set_font_family(&mut self, family: &str) -> bool {
        let result = self.editor.set_font_family(family);
        report(result)
    }

    pub fn set_font_size(&mut self, px: f64) -> bool {
        let result = self.editor.set_font_size(px);
        report(result)
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    pub fn save_json(&mut self) -> Result<String, JsValue> {
        self.editor.save_json().map_err(to_js)
    }

    /// Replace the document. On error the editor is left untouched.
    pub fn load_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.pending_thumbnail = None;
        self.editor.load_json(json).map_err(to_js)
    }

    // ─── Thumbnails & export ─────────────────────────────────────────────

    pub fn needs_thumbnail(&self) -> bool {
        self.editor.needs_thumbnail()
    }

    /// Capture the current page for the rasterizer. Returns JSON
    /// `{"pageIndex", "pageId", "scale", "surface"}`; answer with
    /// [`PubCanvas::complete_thumbnail`].
    pub fn request_thumbnail(&mut self) -> String {
        let job = self.editor.request_thumbnail();
        let body = json!({
            "pageIndex": job.page_index,
            "pageId": job.page_id,
            "scale": job.scale,
            "surface": job.capture.to_view(),
        });
        self.pending_thumbnail = Some(job);
        body.to_string()
    }

    /// Deliver the rasterizer's data URL, or its error message.
    pub fn complete_thumbnail(&mut self, data_url: Option<String>, error: Option<String>) -> bool {
        let Some(job) = self.pending_thumbnail.take() else {
            return false;
        };
        let result = data_url.ok_or_else(|| error.unwrap_or_else(|| "no image".to_string()));
        self.editor.complete_thumbnail(&job, result)
    }

    /// Capture the current page for PDF export as JSON: file name, page
    /// size, background, scale and the surface to image.
    pub fn prepare_export(&mut self) -> String {
        let request = self.editor.prepare_export();
        json!({
            "fileName": request.file_name(),
            "title": request.title,
            "width": request.width,
            "height": request.height,
            "scale": request.scale,
            "background": request.background,
            "surface": request.surface.to_view(),
        })
        .to_string()
    }
}

impl PubCanvas {
    fn with_clock(config: EditorConfig, clock: Box<dyn Clock>) -> EditorResult<Self> {
        Ok(Self {
            editor: Editor::new(config, clock)?,
            pending_thumbnail: None,
        })
    }

    fn dispatch(&mut self, event: InputEvent) -> bool {
        let result = self.editor.handle_event(&event);
        report(result)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Log a failed editor call and collapse it to "nothing changed".
fn report(result: EditorResult<bool>) -> bool {
    result.unwrap_or_else(|e| {
        log::warn!("pd-wasm: {e}");
        false
    })
}

fn id_or_empty(result: EditorResult<ElementId>) -> String {
    match result {
        Ok(id) => id.to_string(),
        Err(e) => {
            log::warn!("pd-wasm: insert failed: {e}");
            String::new()
        }
    }
}

fn outcome_json(result: EditorResult<()>) -> String {
    match result {
        Ok(()) => json!({ "ok": true }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}

fn parse_preset(name: &str) -> Option<PagePreset> {
    match name.trim().to_ascii_lowercase().as_str() {
        "a4" => Some(PagePreset::A4),
        "letter" => Some(PagePreset::Letter),
        _ => None,
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Paperdesk WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

// ─── Standalone validation (no editor needed) ────────────────────────────

/// Check a saved document before loading it. Returns JSON
/// `{"ok":true,"pages":n}` or `{"ok":false,"error":"..."}`.
#[wasm_bindgen]
pub fn validate(json: &str) -> String {
    match load_document(json, 0.0) {
        Ok(doc) => json!({ "ok": true, "pages": doc.pages.len() }).to_string(),
        Err(e) => json!({ "ok": false, "error": e.to_string() }).to_string(),
    }
}
