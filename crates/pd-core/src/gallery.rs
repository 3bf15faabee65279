//! Inputs from galleries and templates.
//!
//! Galleries (clipart, word-art, ads, shapes) and templates are static data
//! owned by the host. They reach the document only as a [`GalleryItem`]
//! ("insert this element") or a [`Template`] ("replace the current page").

use crate::model::{Content, Element, ElementKind, ImageStyle};
use crate::units::Dim;
use kurbo::Rect;
use serde::Deserialize;

/// Placeholder markup for a new text box.
pub const TEXT_BOX_HTML: &str = "<div style=\"padding:10px; height:100%; word-wrap:break-word;\" contenteditable=\"true\">Click to edit text</div>";

/// Fixed-layout table with editable cells. Borders are drawn on the top and
/// left of the table and the right and bottom of each cell so lines stay
/// crisp at every zoom level.
pub fn table_html(rows: usize, cols: usize) -> String {
    const CELL: &str = "<td style=\"border-right:1px solid #000; border-bottom:1px solid #000; border-top:none; border-left:none; min-width:20px; height:20px; outline:none;\" contenteditable=\"true\">&nbsp;</td>";
    let mut html = String::from(
        "<table style=\"width:100%; height:100%; border-spacing:0; table-layout:fixed; border-collapse:separate; border-top:1px solid #000; border-left:1px solid #000;\">",
    );
    for _ in 0..rows {
        html.push_str("<tr>");
        for _ in 0..cols {
            html.push_str(CELL);
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Parse a row/column count typed into a prompt. Leading digits are read
/// (`"5 rows"` → 5); anything below 1 is rejected.
pub fn parse_table_dimension(input: &str) -> Option<usize> {
    let trimmed = input.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse::<usize>().ok().filter(|&n| n >= 1)
}

/// Word-art markup for one of the numbered gallery styles.
pub fn word_art_html(style: u32, text: &str) -> String {
    format!("<div class=\"wa-wrapper\"><div class=\"wa-text wa-style-{style}\">{text}</div></div>")
}

// ─── Gallery items ───────────────────────────────────────────────────────

/// One insertable gallery entry.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub kind: ElementKind,
    pub content: Content,
    /// Overrides the default element size when set.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl GalleryItem {
    pub fn markup(kind: ElementKind, html: impl Into<String>) -> Self {
        Self {
            kind,
            content: Content::markup(html),
            width: None,
            height: None,
        }
    }

    /// Clipart is a vector image pinned to fill its box.
    pub fn clipart(url: impl Into<String>) -> Self {
        let style = ImageStyle {
            width: Some(Dim::Percent(100.0)),
            height: Some(Dim::Percent(100.0)),
            left: Some(0.0),
            top: Some(0.0),
            position: Some("absolute".into()),
            ..ImageStyle::default()
        };
        Self {
            kind: ElementKind::Clipart,
            content: Content::Image {
                src: url.into(),
                style,
            },
            width: None,
            height: None,
        }
    }

    pub fn word_art(style: u32) -> Self {
        Self::markup(ElementKind::WordArt, word_art_html(style, "Word Art"))
    }

    /// Promotional badge: centered text over a clipped colored block.
    pub fn badge(text: &str, color: &str, text_color: &str, clip_path: &str) -> Self {
        let html = format!(
            "<div style=\"width:100%; height:100%; display:flex; align-items:center; justify-content:center; background:{color}; color:{text_color}; font-family:Impact; font-size:24px; text-align:center; clip-path:{clip_path};\">{text}</div>"
        );
        Self::markup(ElementKind::Box, html).sized(150.0, 150.0)
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Build the element placed at `frame` (size overridden by the item).
    pub fn into_element(self, frame: Rect) -> Element {
        let width = self.width.unwrap_or(frame.width());
        let height = self.height.unwrap_or(frame.height());
        let frame = Rect::new(frame.x0, frame.y0, frame.x0 + width, frame.y0 + height);
        Element::new(self.kind, self.content, frame)
    }
}

// ─── Templates ───────────────────────────────────────────────────────────

/// One positioned block of a template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateBlock {
    #[serde(alias = "l")]
    pub left: f64,
    #[serde(alias = "t")]
    pub top: f64,
    #[serde(alias = "w")]
    pub width: f64,
    #[serde(alias = "h")]
    pub height: f64,
    pub html: String,
}

/// A whole-page layout: background plus ordered content blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "bg")]
    pub background: Option<String>,
    #[serde(alias = "els")]
    pub elements: Vec<TemplateBlock>,
}

impl Template {
    /// Template blocks as box elements at the default z-index.
    pub fn to_elements(&self) -> Vec<Element> {
        self.elements
            .iter()
            .map(|b| {
                Element::new(
                    ElementKind::Box,
                    Content::markup(b.html.clone()),
                    Rect::new(b.left, b.top, b.left + b.width, b.top + b.height),
                )
            })
            .collect()
    }
}
