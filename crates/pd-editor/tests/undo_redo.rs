//! Integration tests: snapshot history through the editor.
//!
//! Verifies that committed mutations can be undone and redone, that the
//! log branches linearly, and that view-only changes stay out of it.

use pd_core::gallery::TEXT_BOX_HTML;
use pd_core::model::Content;
use pd_editor::{Clock, Editor, EditorConfig, InputEvent, Modifiers};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct ManualClock(Rc<Cell<f64>>);

impl ManualClock {
    fn advance(&self, ms: f64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

fn make_editor(config: EditorConfig) -> (Editor, ManualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::default();
    clock.0.set(1_712_000_000_000.0);
    let ed = Editor::new(config, Box::new(clock.clone())).unwrap();
    (ed, clock)
}

const CTRL: Modifiers = Modifiers {
    ctrl: true,
    ..Modifiers::NONE
};

#[test]
fn undo_removes_then_redo_restores_an_insert() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    let id = ed.insert_text_box().unwrap();
    assert_eq!(ed.surface().len(), 1);

    let len = ed.history().len();
    let cursor = ed.history().cursor();
    assert!(ed.undo().unwrap());
    assert!(ed.surface().is_empty());
    assert!(!ed.surface().contains(id));
    assert_eq!(ed.history().len(), len);
    assert_eq!(ed.history().cursor(), cursor.map(|c| c - 1));

    assert!(ed.redo().unwrap());
    assert_eq!(ed.surface().len(), 1);
    let restored = ed.surface().element_ids()[0];
    assert_eq!(
        ed.surface().content(restored),
        Some(&Content::markup(TEXT_BOX_HTML))
    );
}

#[test]
fn history_bounds_are_silent() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    assert!(!ed.undo().unwrap());
    assert!(!ed.redo().unwrap());
    assert_eq!(ed.page_count(), 1);

    ed.insert_text_box().unwrap();
    assert!(!ed.redo().unwrap());
    assert!(ed.undo().unwrap());
    assert!(!ed.undo().unwrap());
}

#[test]
fn commit_after_undo_discards_redo_branch() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    ed.insert_text_box().unwrap();
    ed.insert_image("data:image/png;base64,AAAA").unwrap();
    ed.undo().unwrap();
    ed.undo().unwrap();
    assert!(ed.history().can_redo());

    ed.insert_shape("inset(0)", "#000").unwrap();
    assert!(!ed.history().can_redo());
    assert!(!ed.redo().unwrap());
    assert_eq!(ed.history().len(), 2);
}

#[test]
fn undo_clears_selection_and_gestures() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    ed.insert_text_box().unwrap();
    ed.insert_text_box().unwrap();
    assert!(ed.selected().is_some());

    ed.undo().unwrap();
    assert_eq!(ed.selected(), None);
    assert_eq!(ed.surface().selected(), None);
    assert!(!ed.selection().toolbar().visible);
}

#[test]
fn depth_limit_comes_from_config() {
    let config = EditorConfig::from_json(r#"{"history_limit": 3}"#).unwrap();
    let (mut ed, _) = make_editor(config);
    for _ in 0..5 {
        ed.insert_text_box().unwrap();
    }
    assert_eq!(ed.history().len(), 3);
    assert!(ed.undo().unwrap());
    assert!(ed.undo().unwrap());
    assert!(!ed.undo().unwrap());
    assert_eq!(ed.surface().len(), 3);
}

#[test]
fn switching_pages_is_not_undoable() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    ed.add_new_page().unwrap();
    let commits = ed.history().len();
    ed.switch_page(0).unwrap();
    assert_eq!(ed.history().len(), commits);
    assert_eq!(ed.current_page(), 0);

    // undo goes back past the page add, not the switch
    ed.undo().unwrap();
    assert_eq!(ed.page_count(), 1);
}

#[test]
fn switching_to_the_current_page_keeps_the_selection() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    let id = ed.insert_text_box().unwrap();
    ed.switch_page(0).unwrap();
    assert_eq!(ed.selected(), Some(id));
    assert!(ed.surface().contains(id));
    assert!(ed.selection().toolbar().visible);
}

#[test]
fn undo_restores_the_page_that_was_current() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    ed.add_new_page().unwrap();
    ed.insert_text_box().unwrap();
    ed.switch_page(0).unwrap();
    ed.set_background("#fdf2f0").unwrap();

    ed.undo().unwrap();
    assert_eq!(ed.current_page(), 1);
    assert_eq!(ed.surface().len(), 1);
    assert_eq!(ed.document().pages[0].background, "#ffffff");
}

#[test]
fn keyboard_undo_folds_pending_text_edit_into_history() {
    let (mut ed, clock) = make_editor(EditorConfig::default());
    let id = ed.insert_text_box().unwrap();
    ed.update_markup(id, "<div>Typed</div>");
    ed.handle_event(&InputEvent::KeyUp {
        key: "d".into(),
        in_editable: true,
    })
    .unwrap();
    assert!(ed.text_commit_pending());

    clock.advance(200.0);
    ed.handle_event(&InputEvent::key("z", CTRL)).unwrap();

    // the text edit is undone, the box is still there
    assert!(!ed.text_commit_pending());
    let restored = ed.surface().element_ids()[0];
    assert_eq!(
        ed.surface().content(restored),
        Some(&Content::markup(TEXT_BOX_HTML))
    );

    ed.handle_event(&InputEvent::key("y", CTRL)).unwrap();
    let restored = ed.surface().element_ids()[0];
    assert_eq!(
        ed.surface().content(restored),
        Some(&Content::markup("<div>Typed</div>"))
    );
}

#[test]
fn new_document_clears_history() {
    let (mut ed, _) = make_editor(EditorConfig::default());
    ed.insert_text_box().unwrap();
    ed.add_new_page().unwrap();
    ed.new_document().unwrap();
    assert_eq!(ed.history().len(), 1);
    assert_eq!(ed.page_count(), 1);
    assert!(!ed.undo().unwrap());
}
