//! Hit testing: page point → surface target.
//!
//! Points are in page space. Elements are tested in their own rotated
//! frame, topmost (highest z, then latest in list) first. Resize and
//! rotate handles are live only on the selected element.

use pd_core::id::ElementId;
use pd_core::model::{Content, ElementKind};
use pd_core::surface::{ElementNode, HandleDir, LiveSurface};
use pd_core::{Point, Rect, Vec2};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Off the paper entirely.
    Outside,
    /// Empty paper or margin guides.
    Paper,
    ResizeHandle { id: ElementId, dir: HandleDir },
    RotateHandle { id: ElementId },
    Element { id: ElementId },
}

impl HitTarget {
    pub fn element(&self) -> Option<ElementId> {
        match *self {
            HitTarget::ResizeHandle { id, .. }
            | HitTarget::RotateHandle { id }
            | HitTarget::Element { id } => Some(id),
            HitTarget::Outside | HitTarget::Paper => None,
        }
    }
}

/// Pointer cursor suggested for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorHint {
    Default,
    Move,
    Text,
}

impl CursorHint {
    pub fn css(&self) -> &'static str {
        match self {
            CursorHint::Default => "default",
            CursorHint::Move => "move",
            CursorHint::Text => "text",
        }
    }
}

/// Handle geometry in page units.
#[derive(Debug, Clone, Copy)]
pub struct HandleMetrics {
    pub size: f64,
    /// Distance of the rotate handle above the top edge.
    pub rotate_offset: f64,
}

/// Map a page point into the element's unrotated frame.
pub fn to_local(el: &ElementNode, p: Point) -> Point {
    let center = el.center();
    let angle = el.rotation.angle();
    if angle == 0.0 {
        return p;
    }
    let (sin, cos) = (-angle.to_radians()).sin_cos();
    let d = p - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

fn within(p: Point, target: Point, half: f64) -> bool {
    (p.x - target.x).abs() <= half && (p.y - target.y).abs() <= half
}

fn rotate_handle_position(frame: Rect, offset: f64) -> Point {
    Point::new((frame.x0 + frame.x1) / 2.0, frame.y0 - offset)
}

/// Elements whose rotated box contains `p`, topmost first.
pub fn elements_at(surface: &LiveSurface, p: Point) -> SmallVec<[ElementId; 4]> {
    surface
        .paint_order()
        .into_iter()
        .rev()
        .filter(|&id| {
            surface
                .element(id)
                .is_some_and(|el| el.frame().contains(to_local(el, p)))
        })
        .collect()
}

/// Find what lies under `p`.
pub fn hit_test(
    surface: &LiveSurface,
    p: Point,
    selected: Option<ElementId>,
    metrics: HandleMetrics,
) -> HitTarget {
    if let Some(el) = selected.and_then(|id| surface.element(id)) {
        let local = to_local(el, p);
        let frame = el.frame();
        let half = metrics.size / 2.0;
        if surface.has_rotate_handle(el.id)
            && within(local, rotate_handle_position(frame, metrics.rotate_offset), half)
        {
            return HitTarget::RotateHandle { id: el.id };
        }
        if let Some(dir) = surface
            .handles(el.id)
            .into_iter()
            .find(|dir| within(local, dir.position(frame), half))
        {
            return HitTarget::ResizeHandle { id: el.id, dir };
        }
    }

    if let Some(&id) = elements_at(surface, p).first() {
        return HitTarget::Element { id };
    }

    let paper = surface.paper();
    if Rect::new(0.0, 0.0, paper.width, paper.height).contains(p) {
        HitTarget::Paper
    } else {
        HitTarget::Outside
    }
}

/// Elements that drag from anywhere: images, svg clipart and shapes.
/// Everything else holds editable text and drags only from its border band.
pub fn drags_anywhere(kind: ElementKind, content: &Content) -> bool {
    kind == ElementKind::Shape || content.is_image() || content.is_svg()
}

/// Whether `p` lies within `band` of the element's edge.
pub fn near_edge(el: &ElementNode, p: Point, band: f64) -> bool {
    let local = to_local(el, p);
    let f = el.frame();
    local.x < f.x0 + band || local.x > f.x1 - band || local.y < f.y0 + band || local.y > f.y1 - band
}

/// Cursor for hovering `p` while no gesture is active.
pub fn cursor_at(surface: &LiveSurface, p: Point, band: f64) -> CursorHint {
    let Some(&id) = elements_at(surface, p).first() else {
        return CursorHint::Default;
    };
    let (Some(el), Some(content)) = (surface.element(id), surface.content(id)) else {
        return CursorHint::Default;
    };
    if drags_anywhere(el.kind, content) || near_edge(el, p, band) {
        CursorHint::Move
    } else {
        CursorHint::Text
    }
}
