//! Pointer-driven transforms: drag, resize, rotate, crop and image pan.
//!
//! A gesture records the element state at pointer-down; every move is
//! applied relative to that start so that intermediate frames never
//! accumulate error. Screen deltas are divided by the zoom factor before
//! they reach page space.

use pd_core::id::ElementId;
use pd_core::model::Content;
use pd_core::surface::{HandleDir, LiveSurface};
use pd_core::units::{Rotation, Scale};
use pd_core::{Point, Rect, Vec2};

// ─── Viewport ────────────────────────────────────────────────────────────

/// Mapping between screen pixels and page units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Screen position of the paper's top-left corner.
    pub origin: Point,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(origin: Point, zoom: f64) -> Self {
        Self { origin, zoom }
    }

    pub fn to_page(&self, screen: Point) -> Point {
        ((screen - self.origin) / self.zoom).to_point()
    }

    pub fn to_screen(&self, page: Point) -> Point {
        self.origin + page.to_vec2() * self.zoom
    }

    pub fn rect_to_screen(&self, page: Rect) -> Rect {
        Rect::from_points(self.to_screen(page.origin()), self.to_screen(Point::new(page.x1, page.y1)))
    }

    /// Screen delta expressed in page units.
    pub fn delta_to_page(&self, delta: Vec2) -> Vec2 {
        delta / self.zoom
    }
}

// ─── Pure transform math ─────────────────────────────────────────────────

pub fn drag_position(start: Point, delta: Vec2) -> Point {
    start + delta
}

/// One axis of a normal resize. Returns the new `(min, max)` span and
/// whether the moving edge crossed the anchor.
fn resize_axis(
    lo: f64,
    hi: f64,
    moves_lo: bool,
    moves_hi: bool,
    delta: f64,
    min_extent: f64,
) -> (f64, f64, bool) {
    let (anchor, moving, crossed) = if moves_hi {
        let moving = hi + delta;
        (lo, moving, moving < lo)
    } else if moves_lo {
        let moving = lo + delta;
        (hi, moving, moving > hi)
    } else {
        return (lo, hi, false);
    };
    let extent = (moving - anchor).abs().max(min_extent);
    if moving >= anchor {
        (anchor, anchor + extent, crossed)
    } else {
        (anchor - extent, anchor, crossed)
    }
}

/// Resize a box from one handle. When the moving edge passes the opposite
/// edge the box is re-anchored there and the content scale on that axis
/// flips sign relative to the scale at gesture start.
pub fn resize(
    start: Rect,
    start_scale: Scale,
    dir: HandleDir,
    delta: Vec2,
    min_extent: f64,
) -> (Rect, Scale) {
    let (x0, x1, flip_x) = resize_axis(
        start.x0,
        start.x1,
        dir.moves_west(),
        dir.moves_east(),
        delta.x,
        min_extent,
    );
    let (y0, y1, flip_y) = resize_axis(
        start.y0,
        start.y1,
        dir.moves_north(),
        dir.moves_south(),
        delta.y,
        min_extent,
    );
    let scale = Scale::new(
        if flip_x { -start_scale.x } else { start_scale.x },
        if flip_y { -start_scale.y } else { start_scale.y },
    );
    (Rect::new(x0, y0, x1, y1), scale)
}

/// Resize the crop window. The box never mirrors and keeps at least
/// `min_extent` on each axis; the image offset moves opposite to the
/// box's top-left so the image stays still on the page.
pub fn crop_resize(
    start: Rect,
    start_offset: Point,
    dir: HandleDir,
    delta: Vec2,
    min_extent: f64,
) -> (Rect, Point) {
    let mut frame = start;
    if dir.moves_east() {
        frame.x1 = (start.x1 + delta.x).max(start.x0 + min_extent);
    }
    if dir.moves_west() {
        frame.x0 = (start.x0 + delta.x).min(start.x1 - min_extent);
    }
    if dir.moves_south() {
        frame.y1 = (start.y1 + delta.y).max(start.y0 + min_extent);
    }
    if dir.moves_north() {
        frame.y0 = (start.y0 + delta.y).min(start.y1 - min_extent);
    }
    let shift = frame.origin() - start.origin();
    (frame, start_offset - shift)
}

/// Rotation that points the element's top at `pointer`.
pub fn rotation_degrees(center: Point, pointer: Point) -> f64 {
    let d = pointer - center;
    d.y.atan2(d.x).to_degrees() + 90.0
}

pub fn pan_offset(start_offset: Point, delta: Vec2) -> Point {
    start_offset + delta
}

// ─── Gesture state ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMode {
    Idle,
    Dragging,
    Resizing,
    Rotating,
    PanningImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging {
        id: ElementId,
        pointer: Point,
        origin: Point,
    },
    Resizing {
        id: ElementId,
        dir: HandleDir,
        pointer: Point,
        frame: Rect,
        scale: Scale,
        image_offset: Point,
        cropping: bool,
    },
    Rotating {
        id: ElementId,
        center: Point,
    },
    PanningImage {
        id: ElementId,
        pointer: Point,
        image_offset: Point,
    },
}

/// Minimum box extents applied while resizing.
#[derive(Debug, Clone, Copy)]
pub struct ResizeLimits {
    pub min_extent: f64,
    pub crop_min_extent: f64,
}

fn image_offset(surface: &LiveSurface, id: ElementId) -> Point {
    match surface.content(id) {
        Some(Content::Image { style, .. }) => style.offset(),
        _ => Point::ZERO,
    }
}

fn set_image_offset(surface: &mut LiveSurface, id: ElementId, offset: Point) {
    if let Some(Content::Image { style, .. }) = surface.content_mut(id) {
        style.set_offset(offset);
    }
}

fn set_frame(surface: &mut LiveSurface, id: ElementId, frame: Rect) {
    if let Some(el) = surface.element_mut(id) {
        el.left = frame.x0;
        el.top = frame.y0;
        el.width = frame.width();
        el.height = frame.height();
    }
}

/// The in-flight pointer gesture.
#[derive(Debug, Clone)]
pub struct TransformEngine {
    gesture: Gesture,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self {
            gesture: Gesture::Idle,
        }
    }
}

impl TransformEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn mode(&self) -> TransformMode {
        match self.gesture {
            Gesture::Idle => TransformMode::Idle,
            Gesture::Dragging { .. } => TransformMode::Dragging,
            Gesture::Resizing { .. } => TransformMode::Resizing,
            Gesture::Rotating { .. } => TransformMode::Rotating,
            Gesture::PanningImage { .. } => TransformMode::PanningImage,
        }
    }

    pub fn is_active(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    /// Element under transformation, if any.
    pub fn target(&self) -> Option<ElementId> {
        match self.gesture {
            Gesture::Idle => None,
            Gesture::Dragging { id, .. }
            | Gesture::Resizing { id, .. }
            | Gesture::Rotating { id, .. }
            | Gesture::PanningImage { id, .. } => Some(id),
        }
    }

    // ── Begin ──

    pub fn begin_drag(&mut self, surface: &LiveSurface, id: ElementId, pointer: Point) -> bool {
        let Some(el) = surface.element(id) else {
            return false;
        };
        self.gesture = Gesture::Dragging {
            id,
            pointer,
            origin: Point::new(el.left, el.top),
        };
        log::debug!("transform: drag {id:?}");
        true
    }

    pub fn begin_resize(
        &mut self,
        surface: &LiveSurface,
        id: ElementId,
        dir: HandleDir,
        pointer: Point,
    ) -> bool {
        let Some(el) = surface.element(id) else {
            return false;
        };
        self.gesture = Gesture::Resizing {
            id,
            dir,
            pointer,
            frame: el.frame(),
            scale: surface.scale(id).unwrap_or_default(),
            image_offset: image_offset(surface, id),
            cropping: el.cropping,
        };
        log::debug!("transform: resize {id:?} from {}", dir.tag());
        true
    }

    pub fn begin_rotate(&mut self, surface: &LiveSurface, id: ElementId) -> bool {
        let Some(el) = surface.element(id) else {
            return false;
        };
        self.gesture = Gesture::Rotating {
            id,
            center: el.center(),
        };
        log::debug!("transform: rotate {id:?}");
        true
    }

    pub fn begin_pan(&mut self, surface: &LiveSurface, id: ElementId, pointer: Point) -> bool {
        if !surface.content(id).is_some_and(Content::is_image) {
            return false;
        }
        self.gesture = Gesture::PanningImage {
            id,
            pointer,
            image_offset: image_offset(surface, id),
        };
        log::debug!("transform: pan image in {id:?}");
        true
    }

    // ── Update ──

    /// Apply the gesture for the pointer at `pointer` (screen px).
    /// Returns false when idle or when the target no longer exists.
    pub fn update(
        &self,
        surface: &mut LiveSurface,
        pointer: Point,
        viewport: Viewport,
        limits: ResizeLimits,
    ) -> bool {
        match self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging {
                id,
                pointer: start,
                origin,
            } => {
                let pos = drag_position(origin, viewport.delta_to_page(pointer - start));
                log::trace!("transform: drag {id:?} to ({:.1}, {:.1})", pos.x, pos.y);
                let Some(el) = surface.element_mut(id) else {
                    return false;
                };
                el.left = pos.x;
                el.top = pos.y;
                true
            }
            Gesture::Resizing {
                id,
                dir,
                pointer: start,
                frame,
                scale,
                image_offset,
                cropping,
            } => {
                if !surface.contains(id) {
                    return false;
                }
                let delta = viewport.delta_to_page(pointer - start);
                if cropping {
                    let (next, offset) =
                        crop_resize(frame, image_offset, dir, delta, limits.crop_min_extent);
                    log::trace!("transform: crop {id:?} to {next:?}, image at {offset:?}");
                    set_frame(surface, id, next);
                    set_image_offset(surface, id, offset);
                } else {
                    let (next, next_scale) = resize(frame, scale, dir, delta, limits.min_extent);
                    log::trace!("transform: resize {id:?} to {next:?}, {}", next_scale.css());
                    set_frame(surface, id, next);
                    surface.set_scale(id, next_scale);
                }
                true
            }
            Gesture::Rotating { id, center } => {
                let deg = rotation_degrees(center, viewport.to_page(pointer));
                log::trace!("transform: rotate {id:?} to {deg:.1}deg");
                let Some(el) = surface.element_mut(id) else {
                    return false;
                };
                el.rotation = Rotation::degrees(deg);
                true
            }
            Gesture::PanningImage {
                id,
                pointer: start,
                image_offset,
            } => {
                if !surface.contains(id) {
                    return false;
                }
                let offset = pan_offset(image_offset, viewport.delta_to_page(pointer - start));
                log::trace!("transform: pan {id:?} image to {offset:?}");
                set_image_offset(surface, id, offset);
                true
            }
        }
    }

    /// Finish the gesture. Returns the mode that just ended, or `None`
    /// when nothing was in progress.
    pub fn end(&mut self) -> Option<TransformMode> {
        let mode = self.mode();
        self.gesture = Gesture::Idle;
        match mode {
            TransformMode::Idle => None,
            other => {
                log::debug!("transform: {other:?} done");
                Some(other)
            }
        }
    }

    /// Drop the gesture without reporting completion.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }
}
