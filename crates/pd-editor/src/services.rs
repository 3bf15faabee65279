//! Collaborators the editor delegates to: time, rasterization, document
//! imaging and rich-text formatting.
//!
//! The browser host implements these; tests use in-memory fakes.

use pd_core::id::ElementId;
use pd_core::surface::LiveSurface;
use std::time::{SystemTime, UNIX_EPOCH};

// ─── Clock ───────────────────────────────────────────────────────────────

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> f64;
}

/// Wall clock for native builds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }
}

// ─── Rasterizer ──────────────────────────────────────────────────────────

/// Turns a captured surface into an image data URL.
pub trait Rasterizer {
    fn rasterize(&mut self, capture: &LiveSurface, scale: f64) -> Result<String, String>;
}

// ─── Document imaging ────────────────────────────────────────────────────

/// Everything the imaging service needs to produce a printable page.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub title: String,
    /// Capture of the current page at zoom 1.0, guides hidden.
    pub surface: LiveSurface,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    pub background: String,
}

impl ExportRequest {
    /// Suggested file name for the exported document.
    pub fn file_name(&self) -> String {
        let title = self.title.trim();
        let stem = if title.is_empty() { "Publication" } else { title };
        format!("{stem}.pdf")
    }
}

pub trait DocumentImager {
    fn image(&mut self, request: &ExportRequest) -> Result<Vec<u8>, String>;
}

// ─── Rich text ───────────────────────────────────────────────────────────

/// A text selection inside one element, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    pub element: ElementId,
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    StrikeThrough,
    ForeColor(String),
    HiliteColor(String),
    FontName(String),
    /// CSS font size, e.g. `"24px"`.
    FontSize(String),
    JustifyLeft,
    JustifyCenter,
    JustifyRight,
    JustifyFull,
    InsertUnorderedList,
    InsertOrderedList,
    Other { name: String, value: Option<String> },
}

impl FormatCommand {
    /// Map a host command name and optional value onto a command.
    pub fn from_name(name: &str, value: Option<&str>) -> Self {
        let owned = || value.unwrap_or_default().to_string();
        match name {
            "bold" => FormatCommand::Bold,
            "italic" => FormatCommand::Italic,
            "underline" => FormatCommand::Underline,
            "strikeThrough" => FormatCommand::StrikeThrough,
            "foreColor" => FormatCommand::ForeColor(owned()),
            "hiliteColor" | "backColor" => FormatCommand::HiliteColor(owned()),
            "fontName" => FormatCommand::FontName(owned()),
            "fontSize" => FormatCommand::FontSize(owned()),
            "justifyLeft" => FormatCommand::JustifyLeft,
            "justifyCenter" => FormatCommand::JustifyCenter,
            "justifyRight" => FormatCommand::JustifyRight,
            "justifyFull" => FormatCommand::JustifyFull,
            "insertUnorderedList" => FormatCommand::InsertUnorderedList,
            "insertOrderedList" => FormatCommand::InsertOrderedList,
            other => FormatCommand::Other {
                name: other.to_string(),
                value: value.map(str::to_string),
            },
        }
    }

    /// Host command name and value, the inverse of [`FormatCommand::from_name`].
    pub fn parts(&self) -> (&str, Option<&str>) {
        match self {
            FormatCommand::Bold => ("bold", None),
            FormatCommand::Italic => ("italic", None),
            FormatCommand::Underline => ("underline", None),
            FormatCommand::StrikeThrough => ("strikeThrough", None),
            FormatCommand::ForeColor(v) => ("foreColor", Some(v)),
            FormatCommand::HiliteColor(v) => ("hiliteColor", Some(v)),
            FormatCommand::FontName(v) => ("fontName", Some(v)),
            FormatCommand::FontSize(v) => ("fontSize", Some(v)),
            FormatCommand::JustifyLeft => ("justifyLeft", None),
            FormatCommand::JustifyCenter => ("justifyCenter", None),
            FormatCommand::JustifyRight => ("justifyRight", None),
            FormatCommand::JustifyFull => ("justifyFull", None),
            FormatCommand::InsertUnorderedList => ("insertUnorderedList", None),
            FormatCommand::InsertOrderedList => ("insertOrderedList", None),
            FormatCommand::Other { name, value } => (name, value.as_deref()),
        }
    }
}

/// What the rich-text editor did with a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormatOutcome {
    /// Markup of the target element after the command, if it changed.
    pub html: Option<String>,
    /// The selection after the command.
    pub range: Option<TextRange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedFont {
    pub family: String,
    pub size_px: f64,
}

impl ComputedFont {
    /// First family of a CSS `font-family` list, unquoted.
    pub fn primary_family(css: &str) -> String {
        css.split(',')
            .next()
            .unwrap_or_default()
            .replace(['\'', '"'], "")
            .trim()
            .to_string()
    }
}

pub trait RichTextEditor {
    fn exec(&mut self, range: Option<&TextRange>, command: &FormatCommand) -> FormatOutcome;
    fn computed_font(&self, range: &TextRange) -> Option<ComputedFont>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_parts_round_trip_host_names() {
        let cmd = FormatCommand::from_name("fontSize", Some("24px"));
        assert_eq!(cmd.parts(), ("fontSize", Some("24px")));
        assert_eq!(FormatCommand::JustifyCenter.parts(), ("justifyCenter", None));
    }

    #[test]
    fn command_names_map() {
        assert_eq!(FormatCommand::from_name("bold", None), FormatCommand::Bold);
        assert_eq!(
            FormatCommand::from_name("foreColor", Some("#f00")),
            FormatCommand::ForeColor("#f00".into())
        );
        assert_eq!(
            FormatCommand::from_name("subscript", None),
            FormatCommand::Other {
                name: "subscript".into(),
                value: None
            }
        );
    }

    #[test]
    fn primary_family_is_unquoted() {
        assert_eq!(
            ComputedFont::primary_family("\"Times New Roman\", serif"),
            "Times New Roman"
        );
        assert_eq!(ComputedFont::primary_family("Arial"), "Arial");
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000.0);
    }
}
