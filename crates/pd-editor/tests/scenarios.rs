//! Integration tests: end-to-end editing sessions with fake collaborators.

use pd_core::gallery::{GalleryItem, Template};
use pd_core::model::{BorderStyle, Content, ElementKind, PagePreset};
use pd_core::surface::LiveSurface;
use pd_core::units::Rotation;
use pd_core::{PageId, Point};
use pd_editor::{
    Clock, ComputedFont, DocumentImager, Editor, EditorConfig, EditorError, ExportRequest,
    FormatCommand, FormatOutcome, InputEvent, Modifiers, Rasterizer, RichTextEditor, TextRange,
};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

// ─── Fakes ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<f64>>);

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

#[derive(Default)]
struct RecordingRasterizer {
    calls: Vec<(usize, f64)>,
    fail: bool,
}

impl Rasterizer for RecordingRasterizer {
    fn rasterize(&mut self, capture: &LiveSurface, scale: f64) -> Result<String, String> {
        self.calls.push((capture.len(), scale));
        if self.fail {
            Err("canvas tainted".into())
        } else {
            Ok(format!("data:image/png;base64,{}", capture.len()))
        }
    }
}

#[derive(Default)]
struct RecordingImager {
    requests: Vec<ExportRequest>,
}

impl DocumentImager for RecordingImager {
    fn image(&mut self, request: &ExportRequest) -> Result<Vec<u8>, String> {
        self.requests.push(request.clone());
        Ok(b"%PDF-1.7".to_vec())
    }
}

/// Bolds by wrapping the whole markup; reports a fixed font.
struct WrappingRichText;

impl RichTextEditor for WrappingRichText {
    fn exec(&mut self, range: Option<&TextRange>, command: &FormatCommand) -> FormatOutcome {
        match (range, command) {
            (Some(range), FormatCommand::Bold) => FormatOutcome {
                html: Some("<div><b>Click to edit text</b></div>".into()),
                range: Some(range.clone()),
            },
            _ => FormatOutcome::default(),
        }
    }

    fn computed_font(&self, _: &TextRange) -> Option<ComputedFont> {
        Some(ComputedFont {
            family: ComputedFont::primary_family("'Roboto', sans-serif"),
            size_px: 16.0,
        })
    }
}

fn make_editor() -> (Editor, ManualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::default();
    clock.0.set(1_712_000_000_000.0);
    let ed = Editor::new(EditorConfig::default(), Box::new(clock.clone())).unwrap();
    (ed, clock)
}

const CTRL: Modifiers = Modifiers {
    ctrl: true,
    ..Modifiers::NONE
};

// ─── Sessions ────────────────────────────────────────────────────────────

#[test]
fn new_document_page_text_box_undo_save_load() {
    let (mut ed, clock) = make_editor();
    ed.new_document().unwrap();
    clock.0.set(clock.0.get() + 5_000.0);
    ed.add_new_page().unwrap();
    ed.insert_text_box().unwrap();
    ed.undo().unwrap();

    assert_eq!(ed.page_count(), 2);
    assert_eq!(ed.current_page(), 1);
    assert!(ed.surface().is_empty());

    ed.set_title("Newsletter");
    let json = ed.save_json().unwrap();
    let ids: Vec<PageId> = ed.document().pages.iter().map(|p| p.id).collect();
    assert_ne!(ids[0], ids[1]);

    let (mut other, _) = make_editor();
    other.load_json(&json).unwrap();
    assert_eq!(other.title(), "Newsletter");
    assert_eq!(other.current_page(), 0);
    let loaded: Vec<PageId> = other.document().pages.iter().map(|p| p.id).collect();
    assert_eq!(loaded, ids);
    assert_eq!(other.document().pages, ed.document().pages);
}

#[test]
fn failed_load_leaves_the_document_untouched() {
    let (mut ed, _) = make_editor();
    ed.insert_text_box().unwrap();
    let commits = ed.history().len();

    let err = ed.load_json(r#"{"title": "x", "pages": []}"#).unwrap_err();
    assert!(matches!(err, EditorError::Document(_)));
    assert!(err.to_string().starts_with("Error opening file:"));
    assert!(ed.load_json("not json").is_err());

    assert_eq!(ed.surface().len(), 1);
    assert_eq!(ed.history().len(), commits);
}

#[test]
fn copy_paste_and_delete_from_the_keyboard() {
    let (mut ed, _) = make_editor();
    let original = ed.insert_text_box().unwrap();

    ed.handle_event(&InputEvent::key("c", CTRL)).unwrap();
    assert!(ed.handle_event(&InputEvent::key("v", CTRL)).unwrap());
    let pasted = ed.selected().unwrap();
    assert_ne!(pasted, original);
    let el = ed.surface().element(pasted).unwrap();
    assert_eq!((el.left, el.top), (70.0, 70.0));

    ed.handle_event(&InputEvent::key("Delete", Modifiers::NONE))
        .unwrap();
    assert_eq!(ed.surface().len(), 1);
    assert_eq!(ed.selected(), None);
}

#[test]
fn delete_key_is_ignored_while_editing_text() {
    let (mut ed, _) = make_editor();
    ed.set_zoom(1.0);
    let id = ed.insert_text_box().unwrap();
    let center = ed.viewport().to_screen(Point::new(150.0, 100.0));
    ed.handle_event(&InputEvent::DoubleClick {
        x: center.x,
        y: center.y,
    })
    .unwrap();

    assert!(!ed.handle_event(&InputEvent::key("Delete", Modifiers::NONE)).unwrap());
    assert!(ed.surface().contains(id));

    ed.handle_event(&InputEvent::key("Escape", Modifiers::NONE))
        .unwrap();
    assert_eq!(ed.selected(), None);
    assert!(!ed.selection().is_editing_text());
}

#[test]
fn keyboard_zoom_steps_and_resets() {
    let (mut ed, _) = make_editor();
    ed.handle_event(&InputEvent::key("=", CTRL)).unwrap();
    assert_eq!(ed.zoom(), 0.7);
    ed.handle_event(&InputEvent::key("-", CTRL)).unwrap();
    ed.handle_event(&InputEvent::key("-", CTRL)).unwrap();
    assert_eq!(ed.zoom(), 0.5);
    ed.handle_event(&InputEvent::key("0", CTRL)).unwrap();
    assert_eq!(ed.zoom(), 1.0);
}

#[test]
fn page_setup_commands() {
    let (mut ed, _) = make_editor();
    ed.set_page_size(PagePreset::Letter).unwrap();
    ed.toggle_orientation().unwrap();
    let paper = ed.surface().paper();
    assert_eq!((paper.width, paper.height), (1056.0, 816.0));

    ed.set_border_tag("fancy-double").unwrap();
    assert_eq!(ed.surface().border(), BorderStyle::FancyDouble);
    assert!(matches!(
        ed.set_border_tag("sparkly"),
        Err(EditorError::UnknownBorder(_))
    ));

    assert!(!ed.toggle_margins());
    assert!(ed.toggle_header_footer());
    assert!(ed.surface().header().visible);

    let page = &ed.document().pages[0];
    assert_eq!((page.width, page.height), (1056.0, 816.0));
    assert_eq!(page.border, BorderStyle::FancyDouble);
}

#[test]
fn template_replaces_the_page_but_keeps_its_id() {
    let (mut ed, _) = make_editor();
    ed.insert_text_box().unwrap();
    ed.set_page_size(PagePreset::Letter).unwrap();
    let id = ed.document().pages[0].id;

    let template: Template = serde_json::from_str(
        r##"{"name": "Flyer", "bg": "#fdf2f0",
            "els": [{"l": 50, "t": 60, "w": 300, "h": 80, "html": "<h1>Grand Opening</h1>"},
                    {"l": 50, "t": 200, "w": 700, "h": 400, "html": "<p>Details</p>"}]}"##,
    )
    .unwrap();
    ed.load_template(&template).unwrap();

    let page = &ed.document().pages[0];
    assert_eq!(page.id, id);
    assert_eq!((page.width, page.height), (794.0, 1123.0));
    assert_eq!(page.background, "#fdf2f0");
    assert_eq!((page.header.as_str(), page.footer.as_str()), ("Header", "Footer"));
    assert_eq!(page.border, BorderStyle::None);
    assert_eq!(page.elements.len(), 2);
    assert_eq!(page.elements[0].left, 50.0);

    ed.undo().unwrap();
    assert_eq!(ed.surface().len(), 1);
}

#[test]
fn gallery_items_and_image_tools() {
    let (mut ed, _) = make_editor();
    let badge = ed
        .insert_gallery_item(GalleryItem::badge("SALE", "#e74c3c", "#fff", "circle(50%)"))
        .unwrap();
    let el = ed.surface().element(badge).unwrap();
    assert_eq!((el.width, el.height), (150.0, 150.0));

    let clip = ed
        .insert_gallery_item(GalleryItem::clipart("https://example.com/star.svg"))
        .unwrap();
    assert_eq!(ed.surface().element(clip).unwrap().kind, ElementKind::Clipart);
    assert!(!ed.selection().toolbar().visible);

    let photo = ed.insert_image("data:image/png;base64,AAAA").unwrap();
    ed.apply_image_filter("sepia(100%)").unwrap();
    match ed.surface().content(photo) {
        Some(Content::Image { style, .. }) => {
            assert_eq!(style.filter.as_deref(), Some("sepia(100%)"))
        }
        other => panic!("expected image, got {other:?}"),
    }
    ed.rotate_selected_90().unwrap();
    ed.rotate_selected_90().unwrap();
    assert_eq!(
        ed.surface().element(photo).unwrap().rotation,
        Rotation::degrees(180.0)
    );
}

#[test]
fn tables_validate_their_dimensions() {
    let (mut ed, _) = make_editor();
    let id = ed.insert_table_from_prompt("3", "2 columns").unwrap();
    assert!(ed.surface().content(id).is_some_and(Content::is_table));
    assert!(matches!(
        ed.insert_table_from_prompt("0", "2"),
        Err(EditorError::InvalidTableSize)
    ));
    assert!(matches!(
        ed.insert_table(2, 0),
        Err(EditorError::InvalidTableSize)
    ));
}

#[test]
fn inserts_that_would_not_reload_are_rejected() {
    let (mut ed, _) = make_editor();
    let commits = ed.history().len();

    assert!(matches!(ed.insert_image(""), Err(EditorError::EmptyImageSource)));
    assert!(matches!(
        ed.insert_gallery_item(GalleryItem::clipart("  ")),
        Err(EditorError::EmptyImageSource)
    ));
    assert!(matches!(ed.insert_shape("", "#000"), Err(EditorError::EmptyClipPath)));
    assert!(matches!(
        ed.insert_gallery_item(GalleryItem::word_art(1).sized(0.0, 40.0)),
        Err(EditorError::InvalidElementSize { .. })
    ));

    let flat: Template = serde_json::from_str(
        r#"{"els": [{"l": 0, "t": 0, "w": 300, "h": 80, "html": "ok"},
                    {"l": 0, "t": 100, "w": 0, "h": 80, "html": "flat"}]}"#,
    )
    .unwrap();
    assert!(matches!(
        ed.load_template(&flat),
        Err(EditorError::InvalidElementSize { width, .. }) if width == 0.0
    ));

    assert!(ed.surface().is_empty());
    assert_eq!(ed.history().len(), commits);
}

#[test]
fn inserted_content_keeps_its_type_through_save_and_load() {
    let (mut ed, _) = make_editor();
    ed.insert_image("data:image/png;base64,AAAA").unwrap();
    ed.insert_shape("circle(50%)", "#3498db").unwrap();
    let json = ed.save_json().unwrap();

    let (mut reloaded, _) = make_editor();
    reloaded.load_json(&json).unwrap();
    let kinds: Vec<(ElementKind, bool, bool)> = reloaded.document().pages[0]
        .elements
        .iter()
        .map(|el| {
            (
                el.kind,
                matches!(el.content, Content::Image { .. }),
                matches!(el.content, Content::Shape { .. }),
            )
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            (ElementKind::Image, true, false),
            (ElementKind::Shape, false, true)
        ]
    );
}

#[test]
fn formatting_replays_the_cached_range() {
    let (mut ed, _) = make_editor();
    ed.set_rich_text_editor(Box::new(WrappingRichText));
    let id = ed.insert_text_box().unwrap();
    let commits = ed.history().len();

    // nothing to format without a cached range
    assert!(!ed.exec_format(FormatCommand::Bold).unwrap());

    ed.remember_text_range(Some(TextRange {
        element: id,
        start: 0,
        end: 5,
    }));
    assert!(ed.exec_format(FormatCommand::from_name("bold", None)).unwrap());
    assert_eq!(
        ed.surface().content(id),
        Some(&Content::markup("<div><b>Click to edit text</b></div>"))
    );
    assert_eq!(ed.history().len(), commits + 1);
    assert_eq!(ed.selection().toolbar().font_family.as_deref(), Some("Roboto"));
    assert_eq!(ed.selection().toolbar().font_size, Some(16.0));
}

#[test]
fn toolbar_sits_above_the_selection_on_screen() {
    let (mut ed, _) = make_editor();
    ed.set_zoom(1.0);
    ed.set_paper_origin(Point::new(300.0, 100.0));
    ed.insert_text_box().unwrap();
    let toolbar = ed.selection().toolbar();
    assert!(toolbar.visible);
    // element box on screen starts at (350, 150)
    assert_eq!((toolbar.left, toolbar.top), (350.0, 70.0));

    ed.set_paper_origin(Point::new(300.0, 0.0));
    // 50 - 80 would leave the screen, so it flips below the box (150 + 20)
    assert_eq!(ed.selection().toolbar().top, 170.0);
}

// ─── Thumbnails & export ─────────────────────────────────────────────────

#[test]
fn thumbnails_apply_to_the_page_they_were_taken_of() {
    let (mut ed, _) = make_editor();
    ed.insert_text_box().unwrap();
    assert!(ed.needs_thumbnail());

    let mut raster = RecordingRasterizer::default();
    assert!(ed.refresh_thumbnail(&mut raster));
    assert_eq!(raster.calls, vec![(1, 0.2)]);
    assert!(!ed.needs_thumbnail());
    assert_eq!(
        ed.document().pages[0].thumbnail.as_deref(),
        Some("data:image/png;base64,1")
    );

    // a job that outlives its page is discarded
    let job = ed.request_thumbnail();
    ed.add_new_page().unwrap();
    ed.delete_page(0).unwrap();
    assert!(!ed.complete_thumbnail(&job, Ok("data:stale".into())));
    assert_eq!(ed.document().pages[0].thumbnail, None);

    // rasterizer failures are swallowed
    raster.fail = true;
    assert!(!ed.refresh_thumbnail(&mut raster));
}

#[test]
fn thumbnail_capture_strips_editing_affordances() {
    let (mut ed, _) = make_editor();
    ed.insert_text_box().unwrap();
    let job = ed.request_thumbnail();
    let capture = &job.capture;
    assert!(!capture.guides_visible());
    assert_eq!(capture.selected(), None);
    let id = capture.element_ids()[0];
    assert!(capture.handles(id).is_empty());
    assert!(!capture.has_rotate_handle(id));
    // the live surface keeps its selection
    assert!(ed.surface().selected().is_some());
}

#[test]
fn export_captures_the_current_page_at_full_size() {
    let (mut ed, _) = make_editor();
    ed.set_title("Menu");
    ed.insert_text_box().unwrap();
    ed.set_background("#fef9e7").unwrap();

    let mut imager = RecordingImager::default();
    let (name, bytes) = ed.export_pdf(&mut imager).unwrap();
    assert_eq!(name, "Menu.pdf");
    assert_eq!(bytes, b"%PDF-1.7".to_vec());

    let request = &imager.requests[0];
    assert_eq!((request.width, request.height), (794.0, 1123.0));
    assert_eq!(request.scale, 2.0);
    assert_eq!(request.background, "#fef9e7");
    assert!(!request.surface.guides_visible());
    assert!(!request.surface.header().visible);
    assert_eq!(request.surface.len(), 1);

    assert_eq!(ed.selected(), None);
    assert!(ed.surface().guides_visible());
}
