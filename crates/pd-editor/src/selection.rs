//! Selection & floating toolbar controller.
//!
//! At most one element is selected. Selecting another element first runs
//! the full deselect path (crop mode off, inline edits reverted, toolbar
//! hidden). The toolbar is shown only for text-bearing elements and is
//! positioned in screen space above the element's bounding box.

use crate::config::ToolbarConfig;
use crate::services::{RichTextEditor, TextRange};
use crate::transform::Viewport;
use pd_core::id::ElementId;
use pd_core::model::{Content, ElementKind};
use pd_core::surface::{ElementNode, LiveSurface};
use pd_core::{Point, Rect, Vec2};
use serde::Serialize;

/// Inline editing state of the selected element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    None,
    /// Rich text inside a box or table is editable.
    Text,
    /// The word-art text span is editable.
    WordArt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    pub visible: bool,
    pub top: f64,
    pub left: f64,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
}

/// Whether the text toolbar applies to an element.
pub fn toolbar_applies(kind: ElementKind, content: &Content) -> bool {
    let shape = kind == ElementKind::Shape;
    let word_art = content.is_word_art();
    if content.is_image() || (shape && !word_art && !content.is_table()) {
        return false;
    }
    !(content.is_svg() && !word_art && !shape)
}

/// Axis-aligned page-space bounds of a possibly rotated element.
pub fn rotated_bounds(el: &ElementNode) -> Rect {
    let frame = el.frame();
    let angle = el.rotation.angle();
    if angle == 0.0 {
        return frame;
    }
    let center = frame.center();
    let (sin, cos) = angle.to_radians().sin_cos();
    let corners = [
        Point::new(frame.x0, frame.y0),
        Point::new(frame.x1, frame.y0),
        Point::new(frame.x1, frame.y1),
        Point::new(frame.x0, frame.y1),
    ]
    .map(|p| {
        let d = p - center;
        center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
    });
    corners
        .iter()
        .skip(1)
        .fold(Rect::from_points(corners[0], corners[0]), |r, &p| {
            r.union_pt(p)
        })
}

/// Toolbar top-left for an element occupying `screen` on the screen.
pub fn toolbar_position(screen: Rect, config: &ToolbarConfig) -> Point {
    let mut top = screen.y0 - config.above;
    if top < config.min_top {
        top = screen.y1 + config.below;
    }
    Point::new(screen.x0.max(config.min_left), top)
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: Option<ElementId>,
    edit: EditMode,
    last_range: Option<TextRange>,
    toolbar: ToolbarState,
    programmatic: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn edit_mode(&self) -> EditMode {
        self.edit
    }

    pub fn is_editing_text(&self) -> bool {
        self.edit != EditMode::None
    }

    pub fn toolbar(&self) -> &ToolbarState {
        &self.toolbar
    }

    pub fn last_range(&self) -> Option<&TextRange> {
        self.last_range.as_ref()
    }

    /// Select `id`, deselecting any other element first.
    pub fn select(
        &mut self,
        surface: &mut LiveSurface,
        id: ElementId,
        viewport: Viewport,
        config: &ToolbarConfig,
        rich: Option<&dyn RichTextEditor>,
    ) -> bool {
        if self.selected.is_some_and(|prev| prev != id) {
            self.deselect(surface);
        }
        if !surface.select(id) {
            return false;
        }
        self.selected = Some(id);
        log::debug!("selection: {id:?}");
        self.show_toolbar(surface, viewport, config, rich);
        true
    }

    /// Clear the selection: crop mode off, inline edits reverted, toolbar hidden.
    pub fn deselect(&mut self, surface: &mut LiveSurface) {
        if let Some(id) = self.selected.take() {
            log::debug!("selection: cleared {id:?}");
        }
        surface.clear_selection();
        self.edit = EditMode::None;
        self.toolbar.visible = false;
    }

    /// Forget everything after a render replaced the surface elements.
    pub fn reset(&mut self) {
        self.selected = None;
        self.edit = EditMode::None;
        self.last_range = None;
        self.toolbar.visible = false;
    }

    /// Enter inline editing on double-click. Word-art edits its text span;
    /// other markup (boxes, tables) becomes editable rich text.
    pub fn begin_edit(&mut self, surface: &LiveSurface, id: ElementId) -> EditMode {
        let Some(content) = surface.content(id) else {
            return self.edit;
        };
        self.edit = if content.is_word_art() {
            EditMode::WordArt
        } else if matches!(content, Content::Markup { .. }) && !content.is_svg() {
            EditMode::Text
        } else {
            return self.edit;
        };
        log::debug!("selection: editing {id:?} as {:?}", self.edit);
        self.edit
    }

    pub fn hide_toolbar(&mut self) {
        self.toolbar.visible = false;
    }

    /// Show and place the toolbar for the selection, when it applies.
    pub fn show_toolbar(
        &mut self,
        surface: &LiveSurface,
        viewport: Viewport,
        config: &ToolbarConfig,
        rich: Option<&dyn RichTextEditor>,
    ) {
        let Some(id) = self.selected else {
            self.toolbar.visible = false;
            return;
        };
        let (Some(el), Some(content)) = (surface.element(id), surface.content(id)) else {
            self.toolbar.visible = false;
            return;
        };
        if !toolbar_applies(el.kind, content) {
            self.toolbar.visible = false;
            return;
        }
        let pos = toolbar_position(viewport.rect_to_screen(rotated_bounds(el)), config);
        self.toolbar.visible = true;
        self.toolbar.top = pos.y;
        self.toolbar.left = pos.x;

        let font = rich
            .zip(self.last_range.as_ref())
            .and_then(|(rich, range)| rich.computed_font(range));
        if let Some(font) = font {
            self.toolbar.font_family = Some(font.family);
            self.toolbar.font_size = Some(font.size_px);
        }
    }

    /// Cache the host's text selection. Ignored while a formatting command
    /// is replaying the cached range.
    pub fn remember_range(&mut self, range: Option<TextRange>) {
        if self.programmatic {
            return;
        }
        if let Some(range) = range {
            self.last_range = Some(range);
        }
    }

    /// Run `f` with selection-change notifications suppressed.
    pub fn programmatic<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.programmatic = true;
        let out = f(self);
        self.programmatic = false;
        out
    }

    pub fn is_programmatic(&self) -> bool {
        self.programmatic
    }

    pub fn set_range(&mut self, range: Option<TextRange>) {
        self.last_range = range;
    }
}
