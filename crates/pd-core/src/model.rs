//! Document model: pages and the elements placed on them.
//!
//! A document is an ordered list of pages. A page carries its own size,
//! background, header/footer markup, border style and elements. Element
//! geometry is absolute and never recomputed by a layout pass.

use crate::id::PageId;
use crate::units::{Dim, Rotation, Scale};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Default stacking index for new elements.
pub const DEFAULT_Z_INDEX: i32 = 10;

// ─── Element ─────────────────────────────────────────────────────────────

/// The element's type tag, as stored in the `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ElementKind {
    /// Generic rich-content box (text boxes, ads, template blocks).
    #[default]
    Box,
    Image,
    Shape,
    Table,
    WordArt,
    Clipart,
}

impl ElementKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Box => "box",
            ElementKind::Image => "image",
            ElementKind::Shape => "shape",
            ElementKind::Table => "table",
            ElementKind::WordArt => "wordart",
            ElementKind::Clipart => "clipart",
        }
    }

    /// Parse a stored tag. Unknown or empty tags fall back to `Box`.
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim() {
            "image" => ElementKind::Image,
            "shape" => ElementKind::Shape,
            "table" => ElementKind::Table,
            "wordart" | "word-art" => ElementKind::WordArt,
            "clipart" | "clipart-svg" => ElementKind::Clipart,
            _ => ElementKind::Box,
        }
    }
}

/// Styling of an image inside its element. Every field is optional; unset
/// fields take their render defaults (`100%` size, offset 0, no filter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageStyle {
    pub width: Option<Dim>,
    pub height: Option<Dim>,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub position: Option<String>,
    pub filter: Option<String>,
    pub max_width: Option<Dim>,
    pub max_height: Option<Dim>,
}

impl ImageStyle {
    /// Offset of the image within the element box.
    pub fn offset(&self) -> Point {
        Point::new(self.left.unwrap_or(0.0), self.top.unwrap_or(0.0))
    }

    pub fn set_offset(&mut self, offset: Point) {
        self.left = Some(offset.x);
        self.top = Some(offset.y);
    }
}

/// The payload of an element. Exactly one variant exists per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Content {
    /// Rich HTML fragment (boxes, tables, word-art, svg clipart).
    Markup { html: String },
    /// Raster or data-URL image with its crop/filter styling.
    Image { src: String, style: ImageStyle },
    /// Clip-path shape with a fill (solid color or gradient).
    Shape { clip_path: String, fill: String },
}

impl Content {
    pub fn markup(html: impl Into<String>) -> Self {
        Content::Markup { html: html.into() }
    }

    pub fn image(src: impl Into<String>) -> Self {
        Content::Image {
            src: src.into(),
            style: ImageStyle::default(),
        }
    }

    pub fn shape(clip_path: impl Into<String>, fill: impl Into<String>) -> Self {
        Content::Shape {
            clip_path: clip_path.into(),
            fill: fill.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Content::Image { .. })
    }

    /// Best-effort detection of the word-art text span inside markup.
    pub fn is_word_art(&self) -> bool {
        matches!(self, Content::Markup { html } if html.contains("wa-text"))
    }

    pub fn is_table(&self) -> bool {
        matches!(self, Content::Markup { html } if html.contains("<table"))
    }

    pub fn is_svg(&self) -> bool {
        matches!(self, Content::Markup { html } if html.contains("<svg"))
    }
}

/// One placed object on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
    pub z_index: i32,
    pub kind: ElementKind,
    pub content: Content,
    /// Content-layer scale; negative factors mirror the content.
    pub scale: Scale,
    /// True only while the user is cropping this element.
    pub crop_mode: bool,
}

impl Element {
    pub fn new(kind: ElementKind, content: Content, frame: Rect) -> Self {
        Self {
            left: frame.x0,
            top: frame.y0,
            width: frame.width(),
            height: frame.height(),
            rotation: Rotation::NONE,
            z_index: DEFAULT_Z_INDEX,
            kind,
            content,
            scale: Scale::IDENTITY,
            crop_mode: false,
        }
    }

    /// Unrotated bounding box in page space.
    pub fn frame(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.frame().center()
    }
}

// ─── Page ────────────────────────────────────────────────────────────────

/// Decorative page border, stored as its tag (`none`, `solid`, `fancy-cert`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BorderStyle {
    #[default]
    None,
    Solid,
    Dashed,
    Dotted,
    Double,
    Groove,
    Ridge,
    Inset,
    Outset,
    FancyDeco,
    FancyCert,
    FancyDouble,
    FancyAntique,
    FancyModern,
    FancyFloral,
}

impl BorderStyle {
    pub const ALL: [BorderStyle; 15] = [
        BorderStyle::None,
        BorderStyle::Solid,
        BorderStyle::Dashed,
        BorderStyle::Dotted,
        BorderStyle::Double,
        BorderStyle::Groove,
        BorderStyle::Ridge,
        BorderStyle::Inset,
        BorderStyle::Outset,
        BorderStyle::FancyDeco,
        BorderStyle::FancyCert,
        BorderStyle::FancyDouble,
        BorderStyle::FancyAntique,
        BorderStyle::FancyModern,
        BorderStyle::FancyFloral,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            BorderStyle::None => "none",
            BorderStyle::Solid => "solid",
            BorderStyle::Dashed => "dashed",
            BorderStyle::Dotted => "dotted",
            BorderStyle::Double => "double",
            BorderStyle::Groove => "groove",
            BorderStyle::Ridge => "ridge",
            BorderStyle::Inset => "inset",
            BorderStyle::Outset => "outset",
            BorderStyle::FancyDeco => "fancy-deco",
            BorderStyle::FancyCert => "fancy-cert",
            BorderStyle::FancyDouble => "fancy-double",
            BorderStyle::FancyAntique => "fancy-antique",
            BorderStyle::FancyModern => "fancy-modern",
            BorderStyle::FancyFloral => "fancy-floral",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Some(BorderStyle::None);
        }
        Self::ALL.iter().copied().find(|b| b.tag() == tag)
    }

    /// CSS decoration drawn by the border container for this style.
    pub fn decoration(&self) -> BorderDecoration {
        let mut d = BorderDecoration::default();
        match self {
            BorderStyle::None => {}
            BorderStyle::FancyDeco => {
                d.border = Some("15px solid #333".into());
                d.outline = Some("2px dashed #333".into());
                d.outline_offset = Some(-20.0);
            }
            BorderStyle::FancyCert => {
                d.border = Some("20px solid #d4af37".into());
                d.border_image =
                    Some("linear-gradient(to bottom right, #b8860b, #ffd700, #b8860b) 1".into());
                d.inner_frame = Some("inset: 5px; border: 2px solid #b8860b".into());
            }
            BorderStyle::FancyDouble => {
                d.border = Some("double 10px #000".into());
                d.outline = Some("double 4px #000".into());
                d.outline_offset = Some(-15.0);
            }
            BorderStyle::FancyAntique => {
                d.border = Some("10px double #5d4037".into());
                d.inner_frame =
                    Some("inset: 5px; border: 2px solid #5d4037; border-radius: 10px".into());
            }
            BorderStyle::FancyModern => {
                d.border = Some("20px solid #2c3e50".into());
                d.border_bottom = Some("40px solid #2c3e50".into());
            }
            BorderStyle::FancyFloral => {
                d.border = Some("5px solid green".into());
                d.corner_ornament = Some("🌿".into());
            }
            plain => d.border = Some(format!("5px {} #333", plain.tag())),
        }
        d
    }
}

/// Resolved CSS for a page border. Unset fields are not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BorderDecoration {
    pub border: Option<String>,
    pub border_bottom: Option<String>,
    pub border_image: Option<String>,
    pub outline: Option<String>,
    pub outline_offset: Option<f64>,
    /// Inline style of a nested frame drawn inside the border.
    pub inner_frame: Option<String>,
    /// Glyph placed on all four corners, mirrored per corner.
    pub corner_ornament: Option<String>,
}

impl BorderDecoration {
    pub fn is_empty(&self) -> bool {
        *self == BorderDecoration::default()
    }
}

/// Named page-size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePreset {
    A4,
    Letter,
}

impl PagePreset {
    /// Size in CSS pixels (portrait).
    pub fn size(&self) -> (f64, f64) {
        match self {
            PagePreset::A4 => (794.0, 1123.0),
            PagePreset::Letter => (816.0, 1056.0),
        }
    }
}

/// One canvas surface with its own background, header/footer, border and elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub width: f64,
    pub height: f64,
    /// CSS color or gradient descriptor.
    pub background: String,
    pub header: String,
    pub footer: String,
    pub border: BorderStyle,
    pub elements: Vec<Element>,
    /// Cached thumbnail data URL; purely a view cache.
    pub thumbnail: Option<String>,
}

impl Page {
    /// A blank page with the standard placeholders.
    pub fn blank(id: PageId, width: f64, height: f64) -> Self {
        Self {
            id,
            width,
            height,
            background: "#ffffff".to_string(),
            header: "Header (Type here)".to_string(),
            footer: "Footer (Type here)".to_string(),
            border: BorderStyle::None,
            elements: Vec::new(),
            thumbnail: None,
        }
    }

    /// Element indices in paint order: ascending z-index, ties by list order.
    pub fn paint_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.elements.len()).collect();
        order.sort_by_key(|&i| self.elements[i].z_index);
        order
    }
}

// ─── Document ────────────────────────────────────────────────────────────

/// An ordered sequence of pages with exactly one current page.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub pages: Vec<Page>,
    pub current: usize,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: Vec::new(),
            current: 0,
        }
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn current_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.get_mut(self.current)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Most recently minted page id, used to keep new ids monotonic.
    pub fn last_page_id(&self) -> Option<PageId> {
        self.pages.iter().map(|p| p.id).max()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("Publication")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(z: i32) -> Element {
        let mut el = Element::new(
            ElementKind::Box,
            Content::markup("<p>x</p>"),
            Rect::new(0.0, 0.0, 10.0, 10.0),
        );
        el.z_index = z;
        el
    }

    #[test]
    fn kind_tags_roundtrip_and_default_to_box() {
        for kind in [
            ElementKind::Box,
            ElementKind::Image,
            ElementKind::Shape,
            ElementKind::Table,
            ElementKind::WordArt,
            ElementKind::Clipart,
        ] {
            assert_eq!(ElementKind::from_tag(kind.tag()), kind);
        }
        assert_eq!(ElementKind::from_tag(""), ElementKind::Box);
        assert_eq!(ElementKind::from_tag("mystery"), ElementKind::Box);
    }

    #[test]
    fn border_tags_roundtrip() {
        for style in BorderStyle::ALL {
            assert_eq!(BorderStyle::from_tag(style.tag()), Some(style));
        }
        assert_eq!(BorderStyle::from_tag(""), Some(BorderStyle::None));
        assert_eq!(BorderStyle::from_tag("zigzag"), None);
    }

    #[test]
    fn border_decorations() {
        assert!(BorderStyle::None.decoration().is_empty());
        assert_eq!(
            BorderStyle::Dashed.decoration().border.as_deref(),
            Some("5px dashed #333")
        );
        let modern = BorderStyle::FancyModern.decoration();
        assert_eq!(modern.border_bottom.as_deref(), Some("40px solid #2c3e50"));
        assert!(BorderStyle::FancyCert.decoration().inner_frame.is_some());
        assert_eq!(BorderStyle::FancyDeco.decoration().outline_offset, Some(-20.0));
    }

    #[test]
    fn paint_order_uses_z_then_list_order() {
        let mut page = Page::blank(PageId(1), 794.0, 1123.0);
        page.elements = vec![element(12), element(10), element(12), element(3)];
        assert_eq!(page.paint_order(), vec![3, 1, 0, 2]);
    }

    #[test]
    fn content_detection() {
        assert!(Content::markup("<span class=\"wa-text\">Hi</span>").is_word_art());
        assert!(Content::markup("<table><tr></tr></table>").is_table());
        assert!(Content::markup("<svg viewBox=\"0 0 1 1\"></svg>").is_svg());
        assert!(Content::image("data:image/png;base64,AA").is_image());
    }

    #[test]
    fn element_frame_and_center() {
        let el = Element::new(
            ElementKind::Shape,
            Content::shape("circle(50%)", "red"),
            Rect::new(50.0, 50.0, 150.0, 250.0),
        );
        assert_eq!(el.width, 100.0);
        assert_eq!(el.height, 200.0);
        assert_eq!(el.center(), Point::new(100.0, 150.0));
    }
}
